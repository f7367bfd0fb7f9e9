//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a transaction, assigned by the database unless the client
/// supplies one.
pub type TransactionId = DatabaseId;
