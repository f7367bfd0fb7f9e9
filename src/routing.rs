//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use crate::{
    AppState,
    auth::auth_guard,
    endpoints,
    register_user::register_user,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_summary_endpoint,
        get_transaction_endpoint, get_transactions_endpoint,
    },
    user::get_current_user,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::USERS, post(register_user));

    let protected_routes = Router::new()
        .route(endpoints::CURRENT_USER, get(get_current_user))
        .route(
            endpoints::TRANSACTIONS,
            get(get_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(endpoints::TRANSACTION_SUMMARY, get(get_summary_endpoint))
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (
        StatusCode::IM_A_TEAPOT,
        Json(json!({ "error": "I'm a teapot" })),
    )
        .into_response()
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "the requested resource could not be found" })),
    )
        .into_response()
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState, Calendar,
        endpoints::{self, format_endpoint},
        register_user::Registration,
        routing::build_router,
        transaction::{ExternalTransactionView, PeriodSummary, TransactionSource},
    };

    fn get_test_server() -> TestServer {
        let state = AppState::new(Connection::open_in_memory().unwrap(), Calendar::default())
            .expect("Could not create app state.");

        TestServer::try_new(build_router(state)).expect("Could not create test server.")
    }

    async fn register(server: &TestServer, name: &str) -> Registration {
        let response = server
            .post(endpoints::USERS)
            .json(&json!({ "name": name }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.json::<Registration>()
    }

    #[tokio::test]
    async fn coffee_is_a_teapot() {
        let server = get_test_server();

        let response = server.get(endpoints::COFFEE).await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
        response.assert_json(&json!({ "error": "I'm a teapot" }));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        server
            .get("/api/nope")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn protected_routes_need_token() {
        let server = get_test_server();

        for path in [
            endpoints::CURRENT_USER,
            endpoints::TRANSACTIONS,
            endpoints::TRANSACTION_SUMMARY,
        ] {
            server
                .get(path)
                .await
                .assert_status(StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn get_current_user_with_token() {
        let server = get_test_server();
        let registration = register(&server, "Attila").await;

        let response = server
            .get(endpoints::CURRENT_USER)
            .authorization_bearer(&registration.token)
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "id": registration.id, "name": "Attila" }));
    }

    #[tokio::test]
    async fn create_then_list_transactions() {
        let server = get_test_server();
        let registration = register(&server, "Attila").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&registration.token)
            .json(&json!({
                "amount": 9.99,
                "direction": "OUTBOUND",
                "created": "2024-05-10T08:30:00+01:00",
                "narrative": "Sandwich"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created = response.json::<ExternalTransactionView>();
        assert_eq!(created.source, TransactionSource::FasterPaymentsOut);

        let body = response.json::<Value>();
        assert!(body.get("is_archived").is_none());
        assert!(body.get("internal_narrative").is_none());
        assert!(body.get("internal_amount").is_none());

        let listed = server
            .get(endpoints::TRANSACTIONS)
            .authorization_bearer(&registration.token)
            .await
            .json::<Vec<ExternalTransactionView>>();
        assert_eq!(listed, vec![created.clone()]);

        server
            .get(&format_endpoint(endpoints::TRANSACTION, created.id))
            .authorization_bearer(&registration.token)
            .await
            .assert_json(&created);
    }

    #[tokio::test]
    async fn create_transaction_with_unknown_source_is_bad_request() {
        let server = get_test_server();
        let registration = register(&server, "Attila").await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&registration.token)
            .json(&json!({
                "amount": 9.99,
                "direction": "OUTBOUND",
                "created": "2024-05-10T08:30:00Z",
                "narrative": "Cheque",
                "source": "CHEQUE"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "\"CHEQUE\" is not a valid transaction source" }));
    }

    #[tokio::test]
    async fn users_cannot_see_each_others_transactions() {
        let server = get_test_server();
        let owner = register(&server, "Attila").await;
        let other = register(&server, "Bela").await;

        let created = server
            .post(endpoints::TRANSACTIONS)
            .authorization_bearer(&owner.token)
            .json(&json!({
                "amount": 100.0,
                "direction": "INBOUND",
                "created": "2024-05-10T08:30:00Z",
                "narrative": "Refund",
                "source": "FASTER_PAYMENTS_IN"
            }))
            .await
            .json::<ExternalTransactionView>();
        let path = format_endpoint(endpoints::TRANSACTION, created.id);

        server
            .get(&path)
            .authorization_bearer(&other.token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&path)
            .authorization_bearer(&other.token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .delete(&path)
            .authorization_bearer(&owner.token)
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn summary_by_week() {
        let server = get_test_server();
        let registration = register(&server, "Attila").await;

        for (created, amount) in [
            ("2024-05-06T09:00:00+01:00", 10.0),
            ("2024-05-12T22:00:00+01:00", 5.0),
            ("2024-05-13T09:00:00+01:00", 1.0),
        ] {
            server
                .post(endpoints::TRANSACTIONS)
                .authorization_bearer(&registration.token)
                .json(&json!({
                    "amount": amount,
                    "direction": "OUTBOUND",
                    "created": created,
                    "narrative": "Lunch",
                    "source": "MASTER_CARD"
                }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let summaries = server
            .get(endpoints::TRANSACTION_SUMMARY)
            .add_query_param("period", "week")
            .authorization_bearer(&registration.token)
            .await
            .json::<Vec<PeriodSummary>>();

        let outbound: Vec<f64> = summaries.iter().map(|s| s.outbound).collect();
        assert_eq!(outbound, vec![15.0, 1.0]);
    }

    #[tokio::test]
    async fn summary_with_invalid_pay_day_is_bad_request() {
        let server = get_test_server();
        let registration = register(&server, "Attila").await;

        server
            .get(endpoints::TRANSACTION_SUMMARY)
            .add_query_param("period", "cycle")
            .add_query_param("pay_day", 31)
            .authorization_bearer(&registration.token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
