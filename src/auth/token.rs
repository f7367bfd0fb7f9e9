//! Bearer tokens for authenticating API clients.
//!
//! Tokens are random alphanumeric strings. Only a SHA-256 hash of each token
//! is stored, so the raw token is returned exactly once, when it is issued.

use rand::{Rng, distributions::Alphanumeric};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::{Error, database_id::DatabaseId, user::UserID};

/// The number of characters in a raw token.
pub const TOKEN_LENGTH: usize = 32;

/// A token that authenticates requests as a user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Token {
    /// The ID of the token in the database.
    pub id: DatabaseId,
    /// The user that the token authenticates as.
    pub user_id: UserID,
    /// When the token was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

/// Create the token table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_token_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS token (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                token_hash TEXT NOT NULL UNIQUE,
                created TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Issue a new token for `user_id`.
///
/// Returns the stored token and the raw token string to hand to the client.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn issue_token(user_id: UserID, connection: &Connection) -> Result<(Token, String), Error> {
    let raw_token = generate_raw_token();
    let created = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO token (user_id, token_hash, created) VALUES (?1, ?2, ?3)",
        (user_id.as_i64(), hash_token(&raw_token), created),
    )?;

    let token = Token {
        id: connection.last_insert_rowid(),
        user_id,
        created,
    };

    Ok((token, raw_token))
}

/// Get the ID of the user that `raw_token` was issued to.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidToken] if the token was never issued,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn get_user_id_by_token(raw_token: &str, connection: &Connection) -> Result<UserID, Error> {
    connection
        .prepare("SELECT user_id FROM token WHERE token_hash = :token_hash")?
        .query_row(&[(":token_hash", &hash_token(raw_token))], |row| {
            row.get(0).map(UserID::new)
        })
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::InvalidToken,
            error => error.into(),
        })
}

fn generate_raw_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

fn hash_token(raw_token: &str) -> String {
    hex::encode(Sha256::digest(raw_token.as_bytes()))
}
