//! Defines the core data model and database queries for transactions.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::{
    Error,
    database_id::TransactionId,
    transaction::month::DateRange,
    user::UserId,
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether a transaction brought money in or took money out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned ("ingreso").
    Income,
    /// Money spent ("egreso").
    Expense,
}

impl TransactionKind {
    /// The value stored in the database and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// The uppercase Spanish label used in the Excel report.
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "INGRESO",
            Self::Expense => "EGRESO",
        }
    }
}

impl ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(FromSqlError::Other(
                format!("invalid transaction kind \"{other}\"").into(),
            )),
        }
    }
}

/// An income or expense movement recorded by a user.
///
/// Dates are normalized to UTC on creation; only the date component is
/// semantically meaningful but the full precision is kept as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The ID of the user who recorded the transaction.
    pub user_id: UserId,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// Whether this is an income or an expense.
    pub kind: TransactionKind,
    /// The amount of money moved. Always non-negative, the direction is
    /// carried by `kind`.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// A free-text category label, e.g. "Comida".
    pub category: String,
    /// The public path of the stored receipt image, if one was uploaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

/// The validated fields for creating a transaction, or fully replacing the
/// editable fields of an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// When the transaction happened, normalized to UTC.
    pub date: OffsetDateTime,
    /// Whether this is an income or an expense.
    pub kind: TransactionKind,
    /// The non-negative amount of money moved.
    pub amount: f64,
    /// A non-empty text description.
    pub description: String,
    /// A free-text category label.
    pub category: String,
    /// The public path of the stored receipt image, if one was uploaded.
    pub receipt_url: Option<String>,
}

impl NewTransaction {
    /// Validate the fields for a new transaction.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if `amount` is negative or not finite,
    /// - or [Error::EmptyDescription] if `description` is blank.
    pub fn new(
        date: OffsetDateTime,
        kind: TransactionKind,
        amount: f64,
        description: String,
        category: String,
        receipt_url: Option<String>,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount);
        }

        if description.trim().is_empty() {
            return Err(Error::EmptyDescription);
        }

        Ok(Self {
            date: date.to_offset(UtcOffset::UTC),
            kind,
            amount,
            description,
            category,
            receipt_url,
        })
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new transaction in the database owned by `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, date, kind, amount, description, category, receipt_url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, date, kind, amount, description, category, receipt_url",
        )?
        .query_row(
            (
                user_id.as_i64(),
                encode_date(new_transaction.date),
                new_transaction.kind,
                new_transaction.amount,
                new_transaction.description,
                new_transaction.category,
                new_transaction.receipt_url,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transactions of `user_id` whose date falls within `range`,
/// ordered newest first.
///
/// Filtering and ordering compare the parsed UTC date-times, not the stored
/// text, so the result does not depend on how many sub-second digits a stored
/// date carries.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_in_range(
    user_id: UserId,
    range: DateRange,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut transactions = get_transactions_for_user(user_id, connection)?;
    transactions.retain(|transaction| range.contains(transaction.date));
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

    Ok(transactions)
}

/// Retrieve the full transaction history of `user_id`, ordered oldest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transactions_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut transactions: Vec<Transaction> = connection
        .prepare(
            "SELECT id, user_id, date, kind, amount, description, category, receipt_url
             FROM \"transaction\" WHERE user_id = :user_id",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect::<Result<_, _>>()?;

    transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    Ok(transactions)
}

/// Replace the editable fields of the transaction `id` owned by `user_id`.
///
/// The stored receipt is kept as-is, uploads cannot be replaced through an
/// update.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by
///   `user_id` (whether the transaction is missing or belongs to someone else
///   is deliberately not revealed),
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserId,
    fields: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "UPDATE \"transaction\"
             SET date = ?1, kind = ?2, amount = ?3, description = ?4, category = ?5
             WHERE id = ?6 AND user_id = ?7
             RETURNING id, user_id, date, kind, amount, description, category, receipt_url",
        )?
        .query_row(
            (
                encode_date(fields.date),
                fields.kind,
                fields.amount,
                fields.description,
                fields.category,
                id,
                user_id.as_i64(),
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete the transaction `id` owned by `user_id`, returning the deleted row.
///
/// The caller is responsible for cleaning up the receipt file referenced by
/// the returned row, if any.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by
///   `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "DELETE FROM \"transaction\"
             WHERE id = ?1 AND user_id = ?2
             RETURNING id, user_id, date, kind, amount, description, category, receipt_url",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)?;

    Ok(transaction)
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                category TEXT NOT NULL,
                receipt_url TEXT,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Index used by the per-user history and month queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Transaction].
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let raw_date: String = row.get(2)?;
    let date = OffsetDateTime::parse(&raw_date, &Rfc3339).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(error))
    })?;
    let kind = row.get(3)?;
    let amount = row.get(4)?;
    let description = row.get(5)?;
    let category = row.get(6)?;
    let receipt_url = row.get(7)?;

    Ok(Transaction {
        id,
        user_id,
        date,
        kind,
        amount,
        description,
        category,
        receipt_url,
    })
}

/// Parse a transaction date sent by a client.
///
/// Accepts a full RFC 3339 date-time, or a plain `YYYY-MM-DD` date which is
/// taken to mean midnight UTC of that day.
pub(crate) fn parse_date(text: &str) -> Result<OffsetDateTime, Error> {
    if let Ok(date) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(date.to_offset(UtcOffset::UTC));
    }

    let day_only = format_description!("[year]-[month]-[day]");
    Date::parse(text, &day_only)
        .map(|date| date.midnight().assume_utc())
        .map_err(|_| Error::InvalidDate(text.to_string()))
}

/// Encode a date-time as the RFC 3339 text stored in the database.
///
/// Dates are normalized to UTC before formatting so that every stored value
/// shares the `Z` suffix.
fn encode_date(date: OffsetDateTime) -> String {
    date.to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .expect("RFC 3339 formatting of a UTC date-time cannot fail")
}

// ============================================================================
// TESTS
// ============================================================================
