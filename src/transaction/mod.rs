//! Transactions and the rules for classifying them.
//!
//! This module contains everything related to transactions:
//! - The fixed taxonomy of directions and sources, and [classify] for decoding source codes
//! - The `Transaction` model and `TransactionBuilder` for creating transactions
//! - Database functions for storing, querying, and managing transactions
//! - Week, month and pay cycle summaries
//! - Route handlers for the transaction API

mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod get_transaction_endpoint;
mod report;
mod summary_endpoint;
mod taxonomy;

pub use core::{
    ExternalTransaction, ExternalTransactionView, Transaction, TransactionBuilder,
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    get_transactions_for_user, get_user_transaction, map_transaction_row, set_archived,
    set_internal_annotation,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use delete_transaction_endpoint::delete_transaction_endpoint;
pub use get_transaction_endpoint::{get_transaction_endpoint, get_transactions_endpoint};
pub use report::{MAX_PAY_DAY, Period, PeriodPreset, PeriodSummary, summarise};
pub use summary_endpoint::get_summary_endpoint;
pub use taxonomy::{TransactionDirection, TransactionSource, classify, classify_direction};
