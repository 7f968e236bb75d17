use std::collections::HashSet;
use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::io::layout::{self, LEDGER_COLUMNS, ROSTER_COLUMNS};
use crate::model::values::format_date;
use crate::model::{MonthKey, MonthLedger};
use crate::store::ReconciliationStore;

const MONEY_FORMAT: &str = "#,##0.00";

/// Serialises the store into `.xlsx` bytes laid out like the source workbook:
/// the roster sheet followed by one sheet per tracked month, each month closed
/// by its income, expense, and balance totals.
///
/// The store is only read. The last-payment column is recomputed from the
/// ledgers rather than copied from the cached field.
#[instrument(level = "info", skip_all, fields(students = store.roster().len()))]
pub fn export_workbook(store: &ReconciliationStore) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let mut sheet_names = SheetNameRegistry::default();
    let styles = Styles::new();

    let roster_sheet = sheet_names.assign(&store.settings().roster_sheet);
    write_roster(workbook.add_worksheet(), &roster_sheet, store, &styles)?;

    for (key, ledger) in store.calendar().iter() {
        let default_name = layout::month_sheet_name(key, store.settings().active_year);
        let raw_name = ledger.sheet.as_deref().unwrap_or(&default_name);
        let sheet_name = sheet_names.assign(raw_name);
        write_month(
            workbook.add_worksheet(),
            &sheet_name,
            key,
            ledger,
            store.settings().ledger_header_row,
            &styles,
        )?;
    }

    let bytes = workbook.save_to_buffer()?;
    info!(bytes = bytes.len(), "workbook exported");
    Ok(bytes)
}

/// Exports the store and writes the workbook to `path`. Nothing is written
/// when serialisation fails.
#[instrument(level = "info", skip(store), fields(path = %path.display()))]
pub fn export_to_path(store: &ReconciliationStore, path: &Path) -> Result<()> {
    let bytes = export_workbook(store)?;
    fs::write(path, bytes)?;
    Ok(())
}

struct Styles {
    header: Format,
    money: Format,
    total: Format,
}

impl Styles {
    fn new() -> Self {
        Self {
            header: Format::new().set_bold(),
            money: Format::new().set_num_format(MONEY_FORMAT),
            total: Format::new().set_bold().set_num_format(MONEY_FORMAT),
        }
    }
}

fn write_roster(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    store: &ReconciliationStore,
    styles: &Styles,
) -> Result<()> {
    worksheet.set_name(sheet_name)?;
    let header_row = store.settings().roster_header_row;
    if header_row > 0 {
        worksheet.write_string_with_format(0, 0, layout::ROSTER_TITLE, &styles.header)?;
    }

    for (col_idx, header) in ROSTER_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(header_row, col_idx as u16, *header, &styles.header)?;
    }

    for (offset, student) in store.roster().iter().enumerate() {
        let row = header_row + 1 + offset as u32;
        let last_payment = store
            .recomputed_last_payment(student)
            .or(student.last_payment);

        write_text(worksheet, row, 0, &student.name)?;
        write_text(worksheet, row, 1, &student.contact)?;
        worksheet.write_string(row, 2, student.due_day.label())?;
        write_money(worksheet, row, 3, student.monthly_fee, &styles.money)?;
        write_optional_date(worksheet, row, 4, student.enrollment_date)?;
        write_money(worksheet, row, 5, student.enrollment_fee, &styles.money)?;
        worksheet.write_string(row, 6, student.scholarship.as_deref().unwrap_or("--"))?;
        worksheet.write_string(row, 7, student.pending_document.label())?;
        write_text(worksheet, row, 8, &student.pending_document_note)?;
        write_optional_date(worksheet, row, 9, last_payment)?;
    }

    worksheet.set_column_width(0, 32)?;
    debug!(sheet = sheet_name, rows = store.roster().len(), "roster sheet written");
    Ok(())
}

fn write_month(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    key: &MonthKey,
    ledger: &MonthLedger,
    header_row: u32,
    styles: &Styles,
) -> Result<()> {
    worksheet.set_name(sheet_name)?;
    if header_row > 0 {
        worksheet.write_string_with_format(0, 0, key.to_string(), &styles.header)?;
    }

    for (col_idx, header) in LEDGER_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(header_row, col_idx as u16, *header, &styles.header)?;
    }

    let mut row = header_row + 1;
    for entry in &ledger.entries {
        write_text(worksheet, row, 0, &entry.date)?;
        write_text(worksheet, row, 1, &entry.description)?;
        write_money(worksheet, row, 2, entry.amount, &styles.money)?;
        write_text(worksheet, row, 3, &entry.method)?;
        if let Some(balance) = entry.balance {
            write_money(worksheet, row, 4, balance, &styles.money)?;
        }
        row += 1;
    }

    let totals = ledger.totals();
    for (label, amount) in [
        (layout::TOTAL_INCOME_LABEL, totals.income),
        (layout::TOTAL_EXPENSE_LABEL, totals.expense),
        (layout::NET_BALANCE_LABEL, totals.balance),
    ] {
        worksheet.write_string_with_format(row, 1, label, &styles.header)?;
        write_money(worksheet, row, 2, amount, &styles.total)?;
        row += 1;
    }

    worksheet.set_column_width(1, 40)?;
    debug!(sheet = sheet_name, entries = ledger.entries.len(), "month sheet written");
    Ok(())
}

// Empty strings are left as blank cells.
fn write_text(worksheet: &mut Worksheet, row: u32, col: u16, text: &str) -> Result<()> {
    if !text.is_empty() {
        worksheet.write_string(row, col, text)?;
    }
    Ok(())
}

fn write_money(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    amount: Decimal,
    format: &Format,
) -> Result<()> {
    let value = amount.to_f64().unwrap_or_default();
    worksheet.write_number_with_format(row, col, value, format)?;
    Ok(())
}

fn write_optional_date(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    date: Option<chrono::NaiveDate>,
) -> Result<()> {
    if let Some(date) = date {
        worksheet.write_string(row, col, format_date(date))?;
    }
    Ok(())
}

/// Hands out valid, unique worksheet names.
#[derive(Debug, Default)]
struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut counter = 1;
        loop {
            let suffix = format!("_{counter}");
            let prefix: String = base.chars().take(31 - suffix.len()).collect();
            let candidate = format!("{prefix}{suffix}");
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

// Excel rejects these characters and names longer than 31 characters.
fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let sanitized = sanitized.trim().trim_matches('\'');
    if sanitized.is_empty() {
        return "Sheet".to_string();
    }
    sanitized.chars().take(31).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_suffixes_case_insensitive_duplicates() {
        let mut registry = SheetNameRegistry::default();
        assert_eq!(registry.assign("JANEIRO"), "JANEIRO");
        assert_eq!(registry.assign("janeiro"), "janeiro_1");
        assert_eq!(registry.assign("JANEIRO"), "JANEIRO_2");
    }

    #[test]
    fn sanitizes_invalid_names() {
        assert_eq!(sanitize_sheet_name("Jan/26"), "Jan_26");
        assert_eq!(sanitize_sheet_name("   "), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40)).len(), 31);
    }
}
