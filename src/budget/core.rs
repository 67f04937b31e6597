//! The monthly base budget and its database queries.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{
    Error,
    database_id::BudgetId,
    transaction::MonthKey,
    user::UserId,
};

/// The fixed base amount a user assigned to one calendar month.
///
/// Uniqueness is enforced on the `(user_id, month)` pair, so two users can
/// each hold a budget for the same month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget record.
    pub id: BudgetId,
    /// The ID of the user the budget belongs to.
    pub user_id: UserId,
    /// The calendar month the budget applies to.
    pub month: MonthKey,
    /// The resolved base amount, see [resolve_base_amount].
    pub base_amount: f64,
}

/// Resolve the base amount from the two columns it may live in.
///
/// Older databases stored the amount as `base_income`; the current schema
/// uses `base_amount`. The first column holding a finite number wins,
/// otherwise the amount is 0.
pub(crate) fn resolve_base_amount(base_amount: Option<f64>, base_income: Option<f64>) -> f64 {
    base_amount
        .filter(|amount| amount.is_finite())
        .or(base_income.filter(|amount| amount.is_finite()))
        .unwrap_or(0.0)
}

/// Create or replace the budget for `(user_id, month)`.
///
/// The upsert is idempotent: repeated calls with the same inputs converge to
/// the same stored record, and concurrent calls race on last-write-wins
/// without a conflict error. The legacy `base_income` column is cleared on
/// every write.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn upsert_budget(
    user_id: UserId,
    month: MonthKey,
    amount: f64,
    connection: &Connection,
) -> Result<Budget, Error> {
    let budget = connection
        .prepare(
            "INSERT INTO budget (user_id, month, base_amount, base_income)
             VALUES (?1, ?2, ?3, NULL)
             ON CONFLICT(user_id, month)
             DO UPDATE SET base_amount = excluded.base_amount, base_income = NULL
             RETURNING id, user_id, month, base_amount, base_income",
        )?
        .query_row((user_id.as_i64(), month, amount), map_budget_row)?;

    Ok(budget)
}

/// Retrieve the budget for `(user_id, month)`, or `None` when no budget has
/// been set for that pair.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_budget(
    user_id: UserId,
    month: MonthKey,
    connection: &Connection,
) -> Result<Option<Budget>, Error> {
    let result = connection
        .prepare(
            "SELECT id, user_id, month, base_amount, base_income
             FROM budget WHERE user_id = ?1 AND month = ?2",
        )?
        .query_row((user_id.as_i64(), month), map_budget_row);

    match result {
        Ok(budget) => Ok(Some(budget)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                month TEXT NOT NULL,
                base_amount REAL,
                base_income REAL,
                UNIQUE(user_id, month),
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Map a database row to a [Budget], resolving the amount across the two
/// legacy columns.
fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserId::new(row.get(1)?);
    let month = row.get(2)?;
    let base_amount: Option<f64> = row.get(3)?;
    let base_income: Option<f64> = row.get(4)?;

    Ok(Budget {
        id,
        user_id,
        month,
        base_amount: resolve_base_amount(base_amount, base_income),
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        db::initialize,
        transaction::MonthKey,
        user::{User, create_user},
    };

    use super::{get_budget, resolve_base_amount, upsert_budget};

    fn get_test_connection() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let user = create_user(
            "tester",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        (connection, user)
    }

    fn count_budgets(connection: &Connection) -> u32 {
        connection
            .query_row("SELECT COUNT(id) FROM budget", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn upsert_creates_and_returns_the_budget() {
        let (connection, user) = get_test_connection();
        let month: MonthKey = "2026-01".parse().unwrap();

        let budget = upsert_budget(user.id, month, 500.0, &connection).unwrap();

        assert_eq!(budget.user_id, user.id);
        assert_eq!(budget.month, month);
        assert_eq!(budget.base_amount, 500.0);
    }

    #[test]
    fn upsert_is_idempotent_on_owner_and_month() {
        let (connection, user) = get_test_connection();
        let month: MonthKey = "2026-01".parse().unwrap();

        let first = upsert_budget(user.id, month, 500.0, &connection).unwrap();
        let second = upsert_budget(user.id, month, 500.0, &connection).unwrap();

        assert_eq!(first, second);
        assert_eq!(count_budgets(&connection), 1);
    }

    #[test]
    fn upsert_replaces_the_amount() {
        let (connection, user) = get_test_connection();
        let month: MonthKey = "2026-01".parse().unwrap();
        upsert_budget(user.id, month, 500.0, &connection).unwrap();

        let replaced = upsert_budget(user.id, month, 750.0, &connection).unwrap();

        assert_eq!(replaced.base_amount, 750.0);
        assert_eq!(count_budgets(&connection), 1);
        assert_eq!(
            get_budget(user.id, month, &connection).unwrap().unwrap(),
            replaced
        );
    }

    #[test]
    fn different_owners_can_budget_the_same_month() {
        let (connection, user) = get_test_connection();
        let other_user = create_user(
            "someone_else",
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        )
        .unwrap();
        let month: MonthKey = "2026-01".parse().unwrap();

        upsert_budget(user.id, month, 500.0, &connection).unwrap();
        upsert_budget(other_user.id, month, 900.0, &connection).unwrap();

        assert_eq!(count_budgets(&connection), 2);
        assert_eq!(
            get_budget(user.id, month, &connection)
                .unwrap()
                .unwrap()
                .base_amount,
            500.0
        );
        assert_eq!(
            get_budget(other_user.id, month, &connection)
                .unwrap()
                .unwrap()
                .base_amount,
            900.0
        );
    }

    #[test]
    fn missing_budget_resolves_to_none() {
        let (connection, user) = get_test_connection();
        let month: MonthKey = "2026-01".parse().unwrap();

        assert_eq!(get_budget(user.id, month, &connection).unwrap(), None);
    }

    #[test]
    fn legacy_amount_column_is_accepted() {
        let (connection, user) = get_test_connection();

        // A row written by an older revision, amount under base_income only.
        connection
            .execute(
                "INSERT INTO budget (user_id, month, base_amount, base_income)
                 VALUES (?1, '2026-01', NULL, 321.0)",
                (user.id.as_i64(),),
            )
            .unwrap();

        let month: MonthKey = "2026-01".parse().unwrap();
        let budget = get_budget(user.id, month, &connection).unwrap().unwrap();

        assert_eq!(budget.base_amount, 321.0);
    }

    #[test]
    fn either_column_resolves_to_the_same_amount() {
        assert_eq!(resolve_base_amount(Some(321.0), None), 321.0);
        assert_eq!(resolve_base_amount(None, Some(321.0)), 321.0);
    }

    #[test]
    fn current_column_wins_over_legacy() {
        assert_eq!(resolve_base_amount(Some(100.0), Some(200.0)), 100.0);
    }

    #[test]
    fn unparseable_amounts_resolve_to_zero() {
        assert_eq!(resolve_base_amount(None, None), 0.0);
        assert_eq!(resolve_base_amount(Some(f64::NAN), None), 0.0);
        assert_eq!(resolve_base_amount(Some(f64::NAN), Some(50.0)), 50.0);
    }
}
