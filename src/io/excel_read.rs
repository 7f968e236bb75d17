use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::config::Settings;
use crate::error::{Result, TuitionError};
use crate::io::layout::{self, LEDGER_REQUIRED, ROSTER_COLUMNS};
use crate::io::sheet_locator;
use crate::model::values::{
    amount_from_f64, excel_serial_to_date, format_date, normalize_label, parse_amount, parse_date,
};
use crate::model::{
    Calendar, DueDay, LedgerEntry, MonthLedger, PendingDocument, Roster, Student, StudentKey,
};

/// Roster and ledgers read from a workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedWorkbook {
    pub roster: Roster,
    pub calendar: Calendar,
}

impl LoadedWorkbook {
    /// An empty roster with an empty ledger for every tracked month.
    pub fn empty(settings: &Settings) -> Self {
        Self {
            roster: Roster::new(),
            calendar: Calendar::new(&settings.tracked_years()),
        }
    }
}

/// Reads the roster and every tracked month from the workbook at `path`.
#[instrument(level = "info", skip(settings), fields(path = %path.display()))]
pub fn load_from_path(path: &Path, settings: &Settings) -> Result<LoadedWorkbook> {
    if !path.exists() {
        return Err(TuitionError::MissingInput(path.to_path_buf()));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    read_workbook(&mut workbook, settings)
}

/// Reads the roster and every tracked month from in-memory workbook bytes.
#[instrument(level = "info", skip_all, fields(len = bytes.len()))]
pub fn load_from_bytes(bytes: &[u8], settings: &Settings) -> Result<LoadedWorkbook> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    read_workbook(&mut workbook, settings)
}

fn read_workbook<R: Read + Seek>(
    workbook: &mut Xlsx<R>,
    settings: &Settings,
) -> Result<LoadedWorkbook> {
    let available: Vec<String> = workbook.sheet_names().to_vec();
    debug!(sheets = ?available, "workbook opened");

    let roster_sheet = available
        .iter()
        .find(|name| **name == settings.roster_sheet)
        .or_else(|| {
            available
                .iter()
                .find(|name| normalize_label(name) == normalize_label(&settings.roster_sheet))
        })
        .cloned()
        .ok_or_else(|| {
            TuitionError::InvalidWorkbook(format!(
                "missing roster sheet '{}'",
                settings.roster_sheet
            ))
        })?;
    let roster_range = read_sheet(workbook, &roster_sheet)?;
    let roster = parse_roster(&roster_range, settings);

    let mut calendar = Calendar::new(&settings.tracked_years());
    let keys: Vec<_> = calendar.keys().collect();
    for key in keys {
        let allow_bare = key.year == settings.active_year;
        let Some(sheet) =
            sheet_locator::locate(key.month.label(), key.year, &available, allow_bare)
        else {
            debug!(month = %key, "no sheet for month; using an empty ledger");
            continue;
        };

        match read_sheet(workbook, &sheet) {
            Ok(range) => {
                let entries = parse_ledger(&range, &sheet, settings);
                calendar.set(key, MonthLedger::from_sheet(sheet, entries));
            }
            Err(error) => {
                warn!(month = %key, %sheet, %error, "month sheet unreadable; using an empty ledger");
            }
        }
    }

    info!(
        students = roster.len(),
        entries = calendar.entry_count(),
        "workbook loaded"
    );
    Ok(LoadedWorkbook { roster, calendar })
}

fn read_sheet<R: Read + Seek>(workbook: &mut Xlsx<R>, name: &str) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| TuitionError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(TuitionError::from)?;
    Ok(range)
}

fn parse_roster(range: &Range<DataType>, settings: &Settings) -> Roster {
    let table = RawTable::from_range(range, settings.roster_header_row);
    let missing = table.missing(&ROSTER_COLUMNS);
    if !missing.is_empty() {
        debug!(?missing, "synthesising missing roster columns");
    }

    let mut roster = Roster::new();
    for row in &table.rows {
        let name = cell_to_string(table.cell(row, layout::ROSTER_NAME))
            .trim()
            .to_string();
        if name.is_empty() {
            continue;
        }

        let due_day_cell = cell_to_string(table.cell(row, layout::ROSTER_DUE_DAY));
        let due_day = DueDay::parse(&due_day_cell).unwrap_or_else(|| {
            if !due_day_cell.trim().is_empty() {
                debug!(%name, value = %due_day_cell, "unknown due day; using default");
            }
            settings.default_due_day
        });

        let monthly_fee = cell_to_amount(table.cell(row, layout::ROSTER_MONTHLY_FEE))
            .unwrap_or_else(|| {
                debug!(%name, "unreadable monthly fee; using default");
                settings.default_monthly_fee
            });

        let scholarship = cell_to_string(table.cell(row, layout::ROSTER_SCHOLARSHIP));
        let key = StudentKey::for_name(&name);

        roster.push(Student {
            contact: cell_to_string(table.cell(row, layout::ROSTER_CONTACT))
                .trim()
                .to_string(),
            due_day,
            monthly_fee,
            enrollment_date: cell_to_date(table.cell(row, layout::ROSTER_ENROLLMENT_DATE)),
            enrollment_fee: cell_to_amount(table.cell(row, layout::ROSTER_ENROLLMENT_FEE))
                .unwrap_or(Decimal::ZERO),
            scholarship: scholarship_tier(&scholarship),
            pending_document: cell_to_pending(table.cell(row, layout::ROSTER_PENDING_DOCUMENT)),
            pending_document_note: cell_to_string(table.cell(row, layout::ROSTER_PENDING_NOTE))
                .trim()
                .to_string(),
            last_payment: cell_to_date(table.cell(row, layout::ROSTER_LAST_PAYMENT)),
            key,
            name,
        });
    }
    roster
}

fn parse_ledger(range: &Range<DataType>, sheet: &str, settings: &Settings) -> Vec<LedgerEntry> {
    let table = RawTable::from_range(range, settings.ledger_header_row);
    let missing = table.missing(&LEDGER_REQUIRED);
    if !missing.is_empty() {
        debug!(%sheet, ?missing, "synthesising missing ledger columns");
    }

    let mut entries = Vec::new();
    for row in &table.rows {
        let date = cell_to_string(table.cell(row, layout::LEDGER_DATE))
            .trim()
            .to_string();
        let description = cell_to_string(table.cell(row, layout::LEDGER_DESCRIPTION))
            .trim()
            .to_string();
        let amount_cell = table.cell(row, layout::LEDGER_AMOUNT);
        let method = cell_to_string(table.cell(row, layout::LEDGER_METHOD))
            .trim()
            .to_string();

        if date.is_empty() && description.is_empty() && is_blank(amount_cell) {
            continue;
        }
        if date.is_empty() && layout::is_summary_label(&description) {
            continue;
        }

        let amount = cell_to_amount(amount_cell).unwrap_or_else(|| {
            if !is_blank(amount_cell) {
                debug!(%sheet, %description, "unreadable amount; counting it as zero");
            }
            Decimal::ZERO
        });

        entries.push(LedgerEntry {
            date,
            description,
            amount,
            method,
            balance: cell_to_amount(table.cell(row, layout::LEDGER_BALANCE)),
        });
    }
    entries
}

/// Data rows below a header row, addressed by header name.
///
/// Rows are aligned on absolute sheet columns because calamine ranges start
/// at the first used cell, not at A1.
struct RawTable {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<DataType>>,
}

impl RawTable {
    fn from_range(range: &Range<DataType>, header_row: u32) -> Self {
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut columns = HashMap::new();
        let mut rows = Vec::new();

        for (offset, row) in range.rows().enumerate() {
            let absolute = start_row + offset as u32;
            if absolute < header_row {
                continue;
            }

            let mut cells = vec![DataType::Empty; start_col as usize];
            cells.extend(row.iter().cloned());

            if absolute == header_row {
                for (idx, cell) in cells.iter().enumerate() {
                    let header = normalize_label(&cell_to_string(Some(cell)));
                    if !header.is_empty() {
                        columns.entry(header).or_insert(idx);
                    }
                }
            } else {
                rows.push(cells);
            }
        }

        Self { columns, rows }
    }

    fn cell<'a>(&self, row: &'a [DataType], column: &str) -> Option<&'a DataType> {
        let idx = *self.columns.get(&normalize_label(column))?;
        row.get(idx)
    }

    fn missing<'c>(&self, required: &[&'c str]) -> Vec<&'c str> {
        required
            .iter()
            .copied()
            .filter(|column| !self.columns.contains_key(&normalize_label(column)))
            .collect()
    }
}

fn is_blank(cell: Option<&DataType>) -> bool {
    cell_to_string(cell).trim().is_empty()
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::DateTime(serial)) => excel_serial_to_date(*serial)
            .map(format_date)
            .unwrap_or_else(|| serial.to_string()),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn cell_to_amount(cell: Option<&DataType>) -> Option<Decimal> {
    match cell {
        Some(DataType::Float(value)) => amount_from_f64(*value),
        Some(DataType::Int(value)) => Some(Decimal::from(*value)),
        Some(DataType::String(value)) => parse_amount(value),
        _ => None,
    }
}

fn cell_to_date(cell: Option<&DataType>) -> Option<NaiveDate> {
    match cell {
        Some(DataType::DateTime(serial)) => excel_serial_to_date(*serial),
        Some(DataType::String(value)) => parse_date(value),
        _ => None,
    }
}

fn cell_to_pending(cell: Option<&DataType>) -> PendingDocument {
    match cell {
        Some(DataType::Bool(value)) => PendingDocument::from(*value),
        Some(DataType::Int(value)) => PendingDocument::from(*value != 0),
        Some(DataType::Float(value)) => PendingDocument::from(*value != 0.0),
        Some(DataType::String(value)) => PendingDocument::parse(value),
        _ => PendingDocument::No,
    }
}

fn scholarship_tier(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    match normalize_label(trimmed).as_str() {
        "" | "--" | "-" | "NAO" | "N" | "0" | "FALSE" => None,
        _ => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_cells_accept_portuguese_yes() {
        let pending = |cell: DataType| cell_to_pending(Some(&cell));
        assert_eq!(pending(DataType::String(" sim ".into())), PendingDocument::Yes);
        assert_eq!(pending(DataType::Bool(true)), PendingDocument::Yes);
        assert_eq!(pending(DataType::String("--".into())), PendingDocument::No);
        assert_eq!(
            pending(DataType::String("Cursando".into())),
            PendingDocument::Other("Cursando".into())
        );
        assert_eq!(cell_to_pending(None), PendingDocument::No);
    }

    #[test]
    fn scholarship_placeholders_mean_none() {
        assert_eq!(scholarship_tier("--"), None);
        assert_eq!(scholarship_tier("Não"), None);
        assert_eq!(scholarship_tier(" 50% "), Some("50%".to_string()));
    }

    #[test]
    fn numeric_cells_render_without_trailing_zeros() {
        assert_eq!(cell_to_string(Some(&DataType::Float(200.0))), "200");
        assert_eq!(
            cell_to_amount(Some(&DataType::String("R$ 200,50".into()))),
            Some(Decimal::new(20050, 2))
        );
    }
}
