//! Database initialization.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, budget::create_budget_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the application tables if they do not exist yet.
///
/// Runs inside an exclusive transaction so that two processes racing on a
/// fresh database cannot interleave their schema statements.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Must run outside the transaction, SQLite ignores it mid-transaction.
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
