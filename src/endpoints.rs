//! The API endpoint URIs.

/// The liveness probe used by deployment checks.
pub const HEALTH: &str = "/health";
/// The route for registering a new user.
pub const REGISTER: &str = "/api/auth/register";
/// The route for signing in and receiving an access token.
pub const LOG_IN: &str = "/api/auth/login";
/// The route for listing (month-filtered) and creating transactions.
pub const TRANSACTIONS: &str = "/api/transactions";
/// The route for updating or deleting a single transaction.
pub const TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route for setting the monthly base budget.
pub const BUDGET: &str = "/api/transactions/budget";
/// The route for downloading the Excel report.
pub const EXCEL_REPORT: &str = "/api/reports/excel";
/// The route uploaded receipt images are served from.
pub const UPLOADS: &str = "/uploads";
