//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    transaction::{
        ExternalTransaction, ExternalTransactionView, TransactionBuilder,
        core::create_transaction,
    },
    user::UserID,
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new transaction from client input.
///
/// The transaction is owned by the user that made the request. Responds with
/// `201 Created` and the client-facing view of the stored transaction.
///
/// # Errors
/// Responds with:
/// - `400 Bad Request` if the direction or source is not a known code,
/// - `409 Conflict` if the client supplied an ID that is already in use.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(user_id): Extension<UserID>,
    Json(input): Json<ExternalTransaction>,
) -> Result<(StatusCode, Json<ExternalTransactionView>), Error> {
    let builder = TransactionBuilder::from_external(input)?.user_id(Some(user_id));

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(builder, &connection)?;
    tracing::debug!(
        "Created transaction {} for user {user_id}",
        transaction.id
    );

    Ok((StatusCode::CREATED, Json(transaction.to_external())))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Json, extract::State, http::StatusCode};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        transaction::{
            ExternalTransaction, TransactionDirection, TransactionSource,
            core::get_transaction,
            create_transaction_endpoint::{CreateTransactionState, create_transaction_endpoint},
        },
        user::{UserID, create_user},
    };

    fn get_test_state() -> (CreateTransactionState, UserID) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let user = create_user("Attila", &conn).unwrap();

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
        };

        (state, user.id)
    }

    fn card_payment(source: Option<&str>) -> ExternalTransaction {
        ExternalTransaction {
            id: None,
            amount: 12.3,
            direction: "OUTBOUND".to_owned(),
            created: datetime!(2024-06-01 12:00 +1),
            narrative: "Coffee".to_owned(),
            source: source.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user_id) = get_test_state();

        let (status, Json(view)) = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(card_payment(Some("MASTER_CARD"))),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view.amount, 12.3);
        assert_eq!(view.direction, TransactionDirection::Outbound);
        assert_eq!(view.source, TransactionSource::MasterCard);
        assert_eq!(view.created, datetime!(2024-06-01 11:00 UTC));

        let connection = state.db_connection.lock().unwrap();
        let stored = get_transaction(view.id, &connection).unwrap();
        assert_eq!(stored.user_id, Some(user_id));
        assert!(!stored.is_archived);
        assert_eq!(stored.internal_narrative, None);
        assert_eq!(stored.internal_amount, None);
    }

    #[tokio::test]
    async fn missing_source_defaults_to_faster_payments_out() {
        let (state, user_id) = get_test_state();

        let (_, Json(view)) = create_transaction_endpoint(
            State(state),
            Extension(user_id),
            Json(card_payment(None)),
        )
        .await
        .unwrap();

        assert_eq!(view.source, TransactionSource::FasterPaymentsOut);
    }

    #[tokio::test]
    async fn unknown_source_is_rejected() {
        let (state, user_id) = get_test_state();

        let result = create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(card_payment(Some("CHEQUE"))),
        )
        .await;

        assert_eq!(result.err(), Some(Error::UnknownSource("CHEQUE".to_owned())));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_transaction(1, &connection), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn unknown_direction_is_rejected() {
        let (state, user_id) = get_test_state();
        let mut input = card_payment(None);
        input.direction = "SIDEWAYS".to_owned();

        let result =
            create_transaction_endpoint(State(state), Extension(user_id), Json(input)).await;

        assert_eq!(result.err(), Some(Error::UnknownDirection("SIDEWAYS".to_owned())));
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let (state, user_id) = get_test_state();
        let mut input = card_payment(None);
        input.id = Some(7);

        create_transaction_endpoint(
            State(state.clone()),
            Extension(user_id),
            Json(input.clone()),
        )
        .await
        .unwrap();
        let result =
            create_transaction_endpoint(State(state), Extension(user_id), Json(input)).await;

        assert_eq!(result.err(), Some(Error::DuplicateTransactionId));
    }
}
