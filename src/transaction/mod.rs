//! Transaction management: the core model, month arithmetic, the per-month
//! summary, and the route handlers for the `/api/transactions` endpoints.

pub(crate) mod core;
mod create_transaction_endpoint;
mod delete_transaction_endpoint;
mod get_transactions_endpoint;
pub(crate) mod month;
mod summary;
mod update_transaction_endpoint;

pub use core::{
    NewTransaction, Transaction, TransactionKind, create_transaction, create_transaction_table,
    delete_transaction, get_transactions_for_user, get_transactions_in_range,
    map_transaction_row, update_transaction,
};
pub use create_transaction_endpoint::create_transaction_endpoint;
pub use delete_transaction_endpoint::delete_transaction_endpoint;
pub use get_transactions_endpoint::get_transactions_endpoint;
pub use month::{DateRange, MonthKey};
pub use summary::{MonthlySummary, final_balance, summarize, totals};
pub use update_transaction_endpoint::update_transaction_endpoint;
