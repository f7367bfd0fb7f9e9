//! Defines the core data models and database queries for transactions.

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    database_id::TransactionId,
    transaction::{
        TransactionDirection, TransactionSource,
        taxonomy::{classify, classify_direction},
    },
    user::UserID,
};

// ============================================================================
// MODELS
// ============================================================================

/// A movement of money into or out of a user's account.
///
/// Serializing a `Transaction` produces the full record, including the
/// internal fields. Use [Transaction::to_external] for anything sent to a
/// client.
///
/// To create a new `Transaction`, use [Transaction::build] for internal code
/// or [TransactionBuilder::from_external] for client input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money that moved, in currency units.
    pub amount: f64,
    /// Whether money entered or left the account.
    pub direction: TransactionDirection,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// A text description of what the transaction was for.
    pub narrative: String,
    /// The payment rail or origin of the transaction.
    pub source: TransactionSource,
    /// Whether the transaction has been archived by a back-office process.
    pub is_archived: bool,
    /// A back-office note about the transaction.
    pub internal_narrative: Option<String>,
    /// A back-office correction to the amount.
    pub internal_amount: Option<f64>,
    /// The user that owns the transaction.
    pub user_id: Option<UserID>,
}

impl Transaction {
    /// Create a new transaction through the internal path, which may also set
    /// the archive flag and the internal fields.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        direction: TransactionDirection,
        source: TransactionSource,
        created: OffsetDateTime,
        narrative: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            id: None,
            amount,
            direction,
            source,
            created,
            narrative: narrative.to_owned(),
            is_archived: false,
            internal_narrative: None,
            internal_amount: None,
            user_id: None,
        }
    }

    /// The client-facing view of the transaction, without the internal
    /// fields.
    pub fn to_external(&self) -> ExternalTransactionView {
        ExternalTransactionView {
            id: self.id,
            amount: self.amount,
            direction: self.direction,
            created: self.created,
            narrative: self.narrative.clone(),
            source: self.source,
        }
    }
}

/// A transaction as sent by a client.
///
/// Directions and sources are kept as strings so that they can be classified
/// with [TransactionBuilder::from_external], which reports unknown codes with
/// a dedicated error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalTransaction {
    /// An existing ID, for re-submitting previously exported transactions.
    #[serde(default)]
    pub id: Option<TransactionId>,
    /// The amount of money that moved, in currency units.
    pub amount: f64,
    /// The direction code, e.g. "OUTBOUND".
    pub direction: String,
    /// When the transaction happened as an RFC 3339 timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// A text description of what the transaction was for.
    pub narrative: String,
    /// The source code, e.g. "MASTER_CARD". Defaults to
    /// [TransactionSource::DEFAULT] when missing.
    #[serde(default)]
    pub source: Option<String>,
}

/// The fields of a [Transaction] that are shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalTransactionView {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money that moved, in currency units.
    pub amount: f64,
    /// Whether money entered or left the account.
    pub direction: TransactionDirection,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// A text description of what the transaction was for.
    pub narrative: String,
    /// The payment rail or origin of the transaction.
    pub source: TransactionSource,
}

/// A builder for creating [Transaction] instances.
///
/// Value fields are fixed once the transaction is inserted. The archive flag
/// and the internal fields can be changed afterwards with [set_archived] and
/// [set_internal_annotation].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    id: Option<TransactionId>,
    amount: f64,
    direction: TransactionDirection,
    source: TransactionSource,
    created: OffsetDateTime,
    narrative: String,
    is_archived: bool,
    internal_narrative: Option<String>,
    internal_amount: Option<f64>,
    user_id: Option<UserID>,
}

impl TransactionBuilder {
    /// Validate a transaction sent by a client.
    ///
    /// The result is not archived, has no internal fields and no owner; the
    /// caller attaches the owner with [TransactionBuilder::user_id]. If the
    /// client supplied an ID it is kept, so that exported transactions can be
    /// imported again with the same IDs.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::UnknownDirection] if the direction is not a known code,
    /// - or [Error::UnknownSource] if a source was given and is not a known code.
    pub fn from_external(input: ExternalTransaction) -> Result<Self, Error> {
        let direction = classify_direction(&input.direction)?;
        let source = match input.source.as_deref() {
            Some(code) => classify(code)?,
            None => TransactionSource::DEFAULT,
        };

        Ok(Self {
            id: input.id,
            amount: input.amount,
            direction,
            source,
            created: input.created,
            narrative: input.narrative,
            is_archived: false,
            internal_narrative: None,
            internal_amount: None,
            user_id: None,
        })
    }

    /// Set the ID to insert the transaction with, or `None` to let the
    /// database choose.
    pub fn id(mut self, id: Option<TransactionId>) -> Self {
        self.id = id;
        self
    }

    /// Set the user that owns the transaction.
    pub fn user_id(mut self, user_id: Option<UserID>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Set whether the transaction is archived.
    pub fn archived(mut self, is_archived: bool) -> Self {
        self.is_archived = is_archived;
        self
    }

    /// Set the back-office note for the transaction.
    pub fn internal_narrative(mut self, internal_narrative: Option<String>) -> Self {
        self.internal_narrative = internal_narrative;
        self
    }

    /// Set the back-office amount for the transaction.
    pub fn internal_amount(mut self, internal_amount: Option<f64>) -> Self {
        self.internal_amount = internal_amount;
        self
    }

    /// The direction the transaction will be created with.
    pub fn direction(&self) -> TransactionDirection {
        self.direction
    }

    /// The source the transaction will be created with.
    pub fn source(&self) -> TransactionSource {
        self.source
    }

    /// Whether the transaction will be created archived.
    pub fn is_archived(&self) -> bool {
        self.is_archived
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str = "id, amount, direction, created, narrative, source, \
    is_archived, internal_narrative, internal_amount, user_id";

type RowsAffected = usize;

/// Create a new transaction in the database from a builder.
///
/// Timestamps are stored in UTC.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateTransactionId] if the builder has an ID that is already in use,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\" ({TRANSACTION_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            (
                builder.id,
                builder.amount,
                builder.direction.as_str(),
                builder.created.to_offset(UtcOffset::UTC),
                builder.narrative,
                builder.source.as_str(),
                builder.is_archived,
                builder.internal_narrative,
                builder.internal_amount,
                builder.user_id.map(|user_id| user_id.as_i64()),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_user_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" \
             WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id.as_i64())],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transactions owned by `user_id`, oldest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_for_user(
    user_id: UserID,
    include_archived: bool,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" \
             WHERE user_id = :user_id AND (:include_archived OR is_archived = 0) \
             ORDER BY created ASC, id ASC"
        ))?
        .query_map(
            rusqlite::named_params! {
                ":user_id": user_id.as_i64(),
                ":include_archived": include_archived,
            },
            map_transaction_row,
        )?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Delete the transaction `id` if it is owned by `user_id`.
///
/// Returns the number of rows deleted, which is zero if there was no such
/// transaction.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
            &[(":id", &id), (":user_id", &user_id.as_i64())],
        )
        .map_err(|err| err.into())
}

/// Archive or un-archive a transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn set_archived(
    id: TransactionId,
    is_archived: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET is_archived = ?1 WHERE id = ?2",
        (is_archived, id),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Replace the back-office note and amount of a transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn set_internal_annotation(
    id: TransactionId,
    internal_narrative: Option<&str>,
    internal_amount: Option<f64>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET internal_narrative = ?1, internal_amount = ?2 WHERE id = ?3",
        (internal_narrative, internal_amount, id),
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                amount REAL NOT NULL,
                direction TEXT NOT NULL,
                created TEXT NOT NULL,
                narrative TEXT NOT NULL,
                source TEXT NOT NULL,
                is_archived INTEGER NOT NULL DEFAULT 0,
                internal_narrative TEXT,
                internal_amount REAL,
                user_id INTEGER,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Add composite index used when listing and summarising a user's transactions.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_created ON \"transaction\"(user_id, created);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The columns must be in the order of `TRANSACTION_COLUMNS`.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let raw_direction: String = row.get(2)?;
    let created = row.get(3)?;
    let narrative = row.get(4)?;
    let raw_source: String = row.get(5)?;
    let is_archived = row.get(6)?;
    let internal_narrative = row.get(7)?;
    let internal_amount = row.get(8)?;
    let user_id: Option<i64> = row.get(9)?;

    let direction = classify_direction(&raw_direction)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(error)))?;
    let source = classify(&raw_source)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error)))?;

    Ok(Transaction {
        id,
        amount,
        direction,
        created,
        narrative,
        source,
        is_archived,
        internal_narrative,
        internal_amount,
        user_id: user_id.map(UserID::new),
    })
}

// ============================================================================
// TESTS
// ============================================================================
