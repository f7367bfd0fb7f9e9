use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use moneybox_rs::{
    create_user, initialize_db, issue_token,
    transaction::{
        Transaction, TransactionDirection, TransactionSource, create_transaction,
    },
};

/// A utility for creating a test database for the REST API server of moneybox_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating test user...");
    let user = create_user("Test User", &conn)?;
    let (_, token) = issue_token(user.id, &conn)?;

    println!("Creating test transactions...");
    let now = OffsetDateTime::now_utc();
    let samples = [
        (
            2500.0,
            TransactionDirection::Inbound,
            TransactionSource::ExternalRegularInbound,
            Duration::days(40),
            "Salary",
        ),
        (
            850.0,
            TransactionDirection::Outbound,
            TransactionSource::DirectDebit,
            Duration::days(38),
            "Rent",
        ),
        (
            42.17,
            TransactionDirection::Outbound,
            TransactionSource::MasterCard,
            Duration::days(20),
            "Groceries",
        ),
        (
            15.0,
            TransactionDirection::None,
            TransactionSource::MasterCard,
            Duration::days(12),
            "Declined card payment",
        ),
        (
            0.42,
            TransactionDirection::Inbound,
            TransactionSource::InterestPayment,
            Duration::days(9),
            "Interest",
        ),
        (
            2500.0,
            TransactionDirection::Inbound,
            TransactionSource::ExternalRegularInbound,
            Duration::days(10),
            "Salary",
        ),
        (
            200.0,
            TransactionDirection::Outbound,
            TransactionSource::ExternalOutbound,
            Duration::days(2),
            "Transfer to savings",
        ),
    ];

    for (amount, direction, source, age, narrative) in samples {
        create_transaction(
            Transaction::build(amount, direction, source, now - age, narrative)
                .user_id(Some(user.id)),
            &conn,
        )?;
    }

    create_transaction(
        Transaction::build(
            19.99,
            TransactionDirection::Outbound,
            TransactionSource::FasterPaymentsReversal,
            now - Duration::days(30),
            "Reversed payment",
        )
        .user_id(Some(user.id))
        .archived(true)
        .internal_narrative(Some("Reversed by bank".to_owned()))
        .internal_amount(Some(0.0)),
        &conn,
    )?;

    println!("Success! Use this bearer token to log in as {}: {token}", user.name);

    Ok(())
}
