//! Defines the endpoints for listing a user's transactions and fetching a single transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::TransactionId,
    transaction::{
        ExternalTransactionView,
        core::{get_transactions_for_user, get_user_transaction},
    },
    user::UserID,
};

/// The state needed to get transactions.
#[derive(Debug, Clone)]
pub struct GetTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that lists the user's transactions, oldest first.
///
/// Archived transactions are left out.
pub async fn get_transactions_endpoint(
    State(state): State<GetTransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<ExternalTransactionView>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions_for_user(user_id, false, &connection)?
        .iter()
        .map(|transaction| transaction.to_external())
        .collect();

    Ok(Json(transactions))
}

/// A route handler that returns a single transaction owned by the user.
///
/// # Errors
/// Responds with `404 Not Found` if the transaction does not exist or belongs
/// to another user.
pub async fn get_transaction_endpoint(
    State(state): State<GetTransactionState>,
    Extension(user_id): Extension<UserID>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<ExternalTransactionView>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_user_transaction(transaction_id, user_id, &connection)
        .map(|transaction| Json(transaction.to_external()))
}
