//! Moneybox is a small backend for personal finances.
//!
//! It stores bank transactions for users, exposes them as JSON over a REST
//! API authenticated with per-user bearer tokens, and summarises them into
//! weeks, months and pay cycles.
//!
//! The heart of the library is the transaction taxonomy in
//! [transaction] (directions, sources and the rules for building a
//! transaction from client input) and the timezone-aware [Calendar] used for
//! reporting.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
pub mod calendar;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod register_user;
mod routing;
pub mod transaction;
mod user;

pub use app_state::AppState;
pub use auth::{Token, get_user_id_by_token, issue_token};
pub use calendar::{Calendar, SearchDirection};
pub use database_id::{DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use user::{User, UserID, create_user, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The string is not one of the fixed transaction source codes, e.g.
    /// "MASTER_CARD".
    ///
    /// Source codes are case-sensitive.
    #[error("\"{0}\" is not a valid transaction source")]
    UnknownSource(String),

    /// The string is not one of "NONE", "OUTBOUND" or "INBOUND".
    #[error("\"{0}\" is not a valid transaction direction")]
    UnknownDirection(String),

    /// An error occurred while getting a timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The pay day for a pay cycle summary must be between 1 and 28 so that it
    /// exists in every month.
    #[error("{0} is not a valid pay day, it must be between 1 and 28")]
    InvalidPayDay(u8),

    /// The bearer token is missing from the request or does not belong to a
    /// user.
    #[error("the bearer token is missing or invalid")]
    InvalidToken,

    /// An empty string was used as a user's name.
    #[error("user name cannot be empty")]
    EmptyUserName,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A transaction was created with an ID that is already in use.
    #[error("a transaction with the same ID already exists")]
    DuplicateTransactionId,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if (sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE)
                    && desc.ends_with("transaction.id") =>
            {
                Error::DuplicateTransactionId
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            // Stored directions and sources are decoded with the same rules
            // as client input, so surface the inner error.
            rusqlite::Error::FromSqlConversionFailure(column, column_type, inner) => {
                match inner.downcast::<Error>() {
                    Ok(error) => *error,
                    Err(inner) => {
                        let error =
                            rusqlite::Error::FromSqlConversionFailure(column, column_type, inner);
                        tracing::error!("an unhandled SQL error occurred: {}", error);
                        Error::SqlError(error)
                    }
                }
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::UnknownSource(_)
            | Error::UnknownDirection(_)
            | Error::InvalidPayDay(_)
            | Error::EmptyUserName => StatusCode::BAD_REQUEST,
            Error::InvalidToken => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::DuplicateTransactionId => StatusCode::CONFLICT,
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);

                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "An unexpected error occurred, check the server logs for more details."
                    })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use rusqlite::types::Type;

    use crate::Error;

    #[test]
    fn query_returned_no_rows_is_not_found() {
        assert_eq!(
            Error::from(rusqlite::Error::QueryReturnedNoRows),
            Error::NotFound
        );
    }

    #[test]
    fn conversion_failure_unwraps_taxonomy_error() {
        let sql_error = rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            Box::new(Error::UnknownSource("CHEQUE".to_owned())),
        );

        assert_eq!(
            Error::from(sql_error),
            Error::UnknownSource("CHEQUE".to_owned())
        );
    }

    #[test]
    fn client_errors_map_to_status_codes() {
        let cases = [
            (Error::UnknownSource("X".to_owned()), StatusCode::BAD_REQUEST),
            (Error::UnknownDirection("X".to_owned()), StatusCode::BAD_REQUEST),
            (Error::InvalidPayDay(31), StatusCode::BAD_REQUEST),
            (Error::EmptyUserName, StatusCode::BAD_REQUEST),
            (Error::InvalidToken, StatusCode::UNAUTHORIZED),
            (Error::NotFound, StatusCode::NOT_FOUND),
            (Error::DuplicateTransactionId, StatusCode::CONFLICT),
            (Error::DatabaseLockError, StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, want_status) in cases {
            let description = error.to_string();
            let got_status = error.into_response().status();

            assert_eq!(want_status, got_status, "unexpected status for {description}");
        }
    }
}
