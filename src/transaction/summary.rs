//! The per-month financial summary for one user.

use rusqlite::Connection;
use serde::Serialize;

use crate::{
    Error,
    budget::get_budget,
    transaction::{
        core::{Transaction, TransactionKind, get_transactions_in_range},
        month::MonthKey,
    },
    user::UserId,
};

/// The month-filtered transactions of a user together with the budget and
/// computed totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    /// The transactions of the month, newest first.
    pub transactions: Vec<Transaction>,
    /// The base amount assigned to the month, 0 when no budget was set.
    #[serde(rename = "budget")]
    pub base_amount: f64,
    /// The sum of all income amounts.
    pub income_total: f64,
    /// The sum of all expense amounts.
    pub expense_total: f64,
    /// `base_amount + income_total - expense_total`.
    pub final_balance: f64,
}

/// Compute the financial summary of `user_id` for the given calendar month.
///
/// Pure read: loads the month's transactions (newest first) and the
/// `(owner, month)` budget, then sums by kind. A missing budget counts as a
/// base amount of 0.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn summarize(
    user_id: UserId,
    month: MonthKey,
    connection: &Connection,
) -> Result<MonthlySummary, Error> {
    let transactions = get_transactions_in_range(user_id, month.date_range(), connection)?;

    let base_amount = get_budget(user_id, month, connection)?
        .map(|budget| budget.base_amount)
        .unwrap_or(0.0);

    let (income_total, expense_total) = totals(&transactions);

    Ok(MonthlySummary {
        final_balance: final_balance(base_amount, income_total, expense_total),
        transactions,
        base_amount,
        income_total,
        expense_total,
    })
}

/// Sum the amounts of `transactions` into `(income_total, expense_total)`.
///
/// Shared with the Excel report so the two can never disagree on the totals
/// for the same underlying data.
pub fn totals(transactions: &[Transaction]) -> (f64, f64) {
    let mut income_total = 0.0;
    let mut expense_total = 0.0;

    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => income_total += transaction.amount,
            TransactionKind::Expense => expense_total += transaction.amount,
        }
    }

    (income_total, expense_total)
}

/// The balance formula used everywhere a balance is shown.
pub fn final_balance(base_amount: f64, income_total: f64, expense_total: f64) -> f64 {
    base_amount + income_total - expense_total
}
