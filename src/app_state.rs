//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, calendar::Calendar, db::initialize};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The calendar used to group transactions into weeks, months and pay
    /// cycles.
    pub calendar: Calendar,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, calendar: Calendar) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            calendar,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
