use std::fs;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::matcher::MatchMode;
use crate::model::DueDay;

/// Workbook layout conventions and operational defaults.
///
/// Every field has a default, so a settings file only needs the keys it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the roster sheet.
    pub roster_sheet: String,
    /// Zero-based row holding the roster header; the rows above are skipped.
    pub roster_header_row: u32,
    /// Zero-based row holding each month sheet's header.
    pub ledger_header_row: u32,
    pub historical_year: i32,
    /// Year assumed by month labels that carry no year.
    pub active_year: i32,
    /// Fee used when a student's tuition cell cannot be read.
    pub default_monthly_fee: Decimal,
    pub default_due_day: DueDay,
    pub match_mode: MatchMode,
    /// Prefix of the description generated for tuition payments.
    pub payment_label: String,
    /// Prefix of the description generated for expenses.
    pub expense_label: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            roster_sheet: "Alunos".to_string(),
            roster_header_row: 3,
            ledger_header_row: 1,
            historical_year: 2025,
            active_year: 2026,
            default_monthly_fee: Decimal::from(200),
            default_due_day: DueDay::Day15,
            match_mode: MatchMode::FirstName,
            payment_label: "Mensalidade".to_string(),
            expense_label: "DESPESA".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file, filling absent keys with defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&data)?;
        debug!(path = %path.display(), ?settings, "loaded settings");
        Ok(settings)
    }

    /// Tracked years, oldest first, without duplicates.
    pub fn tracked_years(&self) -> Vec<i32> {
        let mut years = vec![self.historical_year, self.active_year];
        years.sort_unstable();
        years.dedup();
        years
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"active_year": 2027, "match_mode": "keyed"}"#).unwrap();
        assert_eq!(settings.active_year, 2027);
        assert_eq!(settings.match_mode, MatchMode::Keyed);
        assert_eq!(settings.roster_sheet, "Alunos");
        assert_eq!(settings.default_due_day, DueDay::Day15);
    }

    #[test]
    fn tracked_years_are_sorted_and_unique() {
        let settings = Settings {
            historical_year: 2026,
            active_year: 2026,
            ..Settings::default()
        };
        assert_eq!(settings.tracked_years(), vec![2026]);
        assert_eq!(Settings::default().tracked_years(), vec![2025, 2026]);
    }
}
