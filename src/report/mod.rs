//! The Excel report: grouping a user's history by calendar month and writing
//! one styled worksheet per month.

pub(crate) mod excel;
mod excel_report_endpoint;

pub use excel::{build_report, report_filename};
pub use excel_report_endpoint::excel_report_endpoint;
