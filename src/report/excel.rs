//! Builds the multi-sheet Excel report of a user's transaction history.
//!
//! One worksheet per calendar month (grouped by UTC components), each with a
//! styled header, one row per transaction, and a summary block whose final
//! balance comes from the same formula the monthly summary endpoint uses.

use rusqlite::Connection;
use rust_xlsxwriter::{
    Color, DocProperties, ExcelDateTime, Format, FormatAlign, Workbook, Worksheet, XlsxError,
};
use time::{Month, UtcOffset};

use crate::{
    Error,
    budget::get_budget,
    transaction::{
        MonthKey, Transaction, TransactionKind, final_balance, get_transactions_for_user, totals,
    },
    user::User,
};

const COL_DATE: u16 = 0;
const COL_KIND: u16 = 1;
const COL_CATEGORY: u16 = 2;
const COL_DESCRIPTION: u16 = 3;
const COL_AMOUNT: u16 = 4;
const COL_RECEIPT: u16 = 5;

const CURRENCY_FORMAT: &str = "\"$\"#,##0.00";
const HEADER_BACKGROUND: u32 = 0x003366;
const INCOME_COLOR: u32 = 0x008000;
const EXPENSE_COLOR: u32 = 0xFF0000;
const BALANCE_HIGHLIGHT: u32 = 0xFFF2CC;

/// One calendar month of a user's history.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MonthGroup {
    /// The month the transactions fall in, by their UTC components.
    pub month: MonthKey,
    /// The month's transactions, oldest first.
    pub transactions: Vec<Transaction>,
}

/// Partition a date-ordered transaction history into calendar-month groups.
///
/// Grouping uses UTC year/month components exclusively; transactions near
/// midnight must not drift into the adjacent month on servers in other time
/// zones.
pub(crate) fn group_by_month(transactions: &[Transaction]) -> Vec<MonthGroup> {
    let mut groups: Vec<MonthGroup> = Vec::new();

    for transaction in transactions {
        let month = MonthKey::from_date(transaction.date);

        match groups.last_mut() {
            Some(group) if group.month == month => group.transactions.push(transaction.clone()),
            _ => groups.push(MonthGroup {
                month,
                transactions: vec![transaction.clone()],
            }),
        }
    }

    groups
}

/// Build the full report workbook for `user` and return it as bytes.
///
/// Each month group looks up its own `(owner, month)` budget; a user with no
/// transactions gets a single informational sheet instead of an error.
///
/// # Errors
/// This function will return a:
/// - [Error::SqlError] if the history or a budget cannot be loaded,
/// - or [Error::ExcelError] if the workbook cannot be written.
pub fn build_report(user: &User, connection: &Connection) -> Result<Vec<u8>, Error> {
    let transactions = get_transactions_for_user(user.id, connection)?;
    let groups = group_by_month(&transactions);

    let mut workbook = Workbook::new();
    workbook.set_properties(
        &DocProperties::new()
            .set_author("Cuentas")
            .set_title(&format!("Contabilidad de {}", user.username)),
    );

    if groups.is_empty() {
        write_empty_sheet(workbook.add_worksheet())?;
    } else {
        for group in &groups {
            let base_amount = get_budget(user.id, group.month, connection)?
                .map(|budget| budget.base_amount)
                .unwrap_or(0.0);

            write_month_sheet(workbook.add_worksheet(), group, base_amount)?;
        }
    }

    workbook.save_to_buffer().map_err(Error::from)
}

/// The attachment file name for a user's report, e.g. `Reporte_maria.xlsx`.
pub fn report_filename(username: &str) -> String {
    let sanitized = sanitize_filename_component(username);

    if sanitized.is_empty() {
        "Reporte.xlsx".to_string()
    } else {
        format!("Reporte_{sanitized}.xlsx")
    }
}

fn write_empty_sheet(worksheet: &mut Worksheet) -> Result<(), XlsxError> {
    worksheet.set_name("Sin movimientos")?;
    worksheet.set_column_width(0, 40.0)?;
    worksheet.write_string_with_format(
        0,
        0,
        "No hay movimientos registrados.",
        &Format::new().set_bold(),
    )?;

    Ok(())
}

fn write_month_sheet(
    worksheet: &mut Worksheet,
    group: &MonthGroup,
    base_amount: f64,
) -> Result<(), XlsxError> {
    worksheet.set_name(sheet_title(group.month))?;

    for (col, width) in [
        (COL_DATE, 12.0),
        (COL_KIND, 10.0),
        (COL_CATEGORY, 20.0),
        (COL_DESCRIPTION, 35.0),
        (COL_AMOUNT, 15.0),
        (COL_RECEIPT, 12.0),
    ] {
        worksheet.set_column_width(col, width)?;
    }

    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_BACKGROUND))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);

    for (col, title) in [
        (COL_DATE, "Fecha"),
        (COL_KIND, "Tipo"),
        (COL_CATEGORY, "Categoría"),
        (COL_DESCRIPTION, "Descripción"),
        (COL_AMOUNT, "Monto"),
        (COL_RECEIPT, "Soporte"),
    ] {
        worksheet.write_string_with_format(0, col, title, &header_format)?;
    }
    worksheet.autofilter(0, COL_DATE, 0, COL_RECEIPT)?;

    let date_format = Format::new()
        .set_num_format("dd/mm/yyyy")
        .set_align(FormatAlign::Center);
    let placeholder_format = Format::new().set_align(FormatAlign::Center);
    let link_label_format = Format::new().set_font_color(Color::Blue).set_underline(
        rust_xlsxwriter::FormatUnderline::Single,
    );

    for (index, transaction) in group.transactions.iter().enumerate() {
        let row = (index + 1) as u32;
        let kind_color = match transaction.kind {
            TransactionKind::Income => Color::RGB(INCOME_COLOR),
            TransactionKind::Expense => Color::RGB(EXPENSE_COLOR),
        };
        let kind_format = Format::new()
            .set_bold()
            .set_font_color(kind_color)
            .set_align(FormatAlign::Center);
        let amount_format = Format::new()
            .set_font_color(kind_color)
            .set_num_format(CURRENCY_FORMAT);

        let date = transaction.date.to_offset(UtcOffset::UTC);
        let excel_date =
            ExcelDateTime::from_ymd(date.year() as u16, u8::from(date.month()), date.day())?;
        worksheet.write_datetime_with_format(row, COL_DATE, excel_date, &date_format)?;

        worksheet.write_string_with_format(
            row,
            COL_KIND,
            transaction.kind.label(),
            &kind_format,
        )?;
        worksheet.write_string(
            row,
            COL_CATEGORY,
            normalize_category(&transaction.category),
        )?;
        worksheet.write_string(row, COL_DESCRIPTION, &transaction.description)?;
        worksheet.write_number_with_format(row, COL_AMOUNT, transaction.amount, &amount_format)?;

        match &transaction.receipt_url {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                worksheet.write_url_with_text(row, COL_RECEIPT, url.as_str(), "Ver foto")?;
            }
            // Site-relative uploads have no absolute address to link to, so
            // the label goes in as styled text.
            Some(_) => {
                worksheet.write_string_with_format(
                    row,
                    COL_RECEIPT,
                    "Ver foto",
                    &link_label_format,
                )?;
            }
            None => {
                worksheet.write_string_with_format(row, COL_RECEIPT, "-", &placeholder_format)?;
            }
        }
    }

    write_summary_block(worksheet, group, base_amount)?;

    Ok(())
}

/// The trailing summary of a month sheet: base, income, expense, and the
/// highlighted final balance, separated from the rows by a blank line.
fn write_summary_block(
    worksheet: &mut Worksheet,
    group: &MonthGroup,
    base_amount: f64,
) -> Result<(), XlsxError> {
    let (income_total, expense_total) = totals(&group.transactions);
    let balance = final_balance(base_amount, income_total, expense_total);

    let label_format = Format::new().set_bold().set_align(FormatAlign::Right);
    let value_format = Format::new().set_num_format(CURRENCY_FORMAT);

    // One blank separator row after the last transaction row.
    let mut row = group.transactions.len() as u32 + 2;

    for (label, value) in [
        ("Base del mes:", base_amount),
        ("Total ingresos:", income_total),
        ("Total egresos:", expense_total),
    ] {
        worksheet.write_string_with_format(row, COL_DESCRIPTION, label, &label_format)?;
        worksheet.write_number_with_format(row, COL_AMOUNT, value, &value_format)?;
        row += 1;
    }

    let balance_color = if balance >= 0.0 {
        Color::RGB(INCOME_COLOR)
    } else {
        Color::RGB(EXPENSE_COLOR)
    };
    let balance_format = Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(balance_color)
        .set_background_color(Color::RGB(BALANCE_HIGHLIGHT))
        .set_num_format(CURRENCY_FORMAT);

    worksheet.write_string_with_format(row, COL_DESCRIPTION, "BALANCE FINAL:", &label_format)?;
    worksheet.write_number_with_format(row, COL_AMOUNT, balance, &balance_format)?;

    Ok(())
}

/// The worksheet title for a month, e.g. "Enero 2026".
fn sheet_title(month: MonthKey) -> String {
    format!("{} {}", spanish_month_name(month.month()), month.year())
}

fn spanish_month_name(month: Month) -> &'static str {
    match month {
        Month::January => "Enero",
        Month::February => "Febrero",
        Month::March => "Marzo",
        Month::April => "Abril",
        Month::May => "Mayo",
        Month::June => "Junio",
        Month::July => "Julio",
        Month::August => "Agosto",
        Month::September => "Septiembre",
        Month::October => "Octubre",
        Month::November => "Noviembre",
        Month::December => "Diciembre",
    }
}

/// Uppercase the first letter of a category, defaulting blanks to "General".
fn normalize_category(category: &str) -> String {
    let trimmed = category.trim();

    let mut chars = trimmed.chars();
    match chars.next() {
        None => "General".to_string(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

fn sanitize_filename_component(name: &str) -> String {
    name.chars()
        .map(|c| if c == ' ' { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}
