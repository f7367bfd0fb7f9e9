//! Defines the endpoint for summarising transactions into periods.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, Query, State},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    calendar::Calendar,
    transaction::{
        core::get_transactions_for_user,
        report::{Period, PeriodPreset, PeriodSummary, summarise},
    },
    user::UserID,
};

/// The state needed to summarise transactions.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The calendar that decides where weeks, months and pay cycles start.
    pub calendar: Calendar,
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            calendar: state.calendar,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for the summary endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryQuery {
    /// How to group transactions. Defaults to calendar months.
    pub period: Option<PeriodPreset>,
    /// The day of the month that pay cycles start on, only used with the
    /// `cycle` period.
    pub pay_day: Option<u8>,
}

/// A route handler that totals the user's transactions per week, month or
/// pay cycle.
///
/// # Errors
/// Responds with `400 Bad Request` if the pay day is outside of 1 to 28.
pub async fn get_summary_endpoint(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Vec<PeriodSummary>>, Error> {
    let preset = query.period.unwrap_or_else(PeriodPreset::default_preset);
    let period = Period::from_preset(preset, query.pay_day)?;

    let transactions = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_transactions_for_user(user_id, false, &connection)?
    };

    Ok(Json(summarise(&transactions, period, &state.calendar)))
}
