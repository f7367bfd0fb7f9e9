//! The endpoint for registering a new user and issuing their bearer token.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::issue_token,
    user::{UserID, create_user},
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for creating users and tokens.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data for registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterForm {
    /// The user's display name.
    pub name: String,
}

/// A newly registered user and the only copy of their bearer token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    /// The new user's ID.
    pub id: UserID,
    /// The new user's display name.
    pub name: String,
    /// The token to send in the `Authorization: Bearer` header.
    pub token: String,
}

/// A route handler for creating a new user.
///
/// The user and their token are created together, so a failure leaves no
/// user without a token.
///
/// # Errors
/// Responds with `400 Bad Request` if the name is empty.
pub async fn register_user(
    State(state): State<RegistrationState>,
    Json(form): Json<RegisterForm>,
) -> Result<(StatusCode, Json<Registration>), Error> {
    let mut connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = connection.transaction()?;
    let user = create_user(&form.name, &transaction)?;
    let (_, token) = issue_token(user.id, &transaction)?;
    transaction.commit()?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(Registration {
            id: user.id,
            name: user.name,
            token,
        }),
    ))
}
