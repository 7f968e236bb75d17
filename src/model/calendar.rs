use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::MonthLedger;
use super::values::normalize_label;

/// Calendar month, labelled the way the school's workbook names its sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Canonical sheet label, e.g. `JANEIRO` or `MARÇO`.
    pub fn label(self) -> &'static str {
        match self {
            Month::January => "JANEIRO",
            Month::February => "FEVEREIRO",
            Month::March => "MARÇO",
            Month::April => "ABRIL",
            Month::May => "MAIO",
            Month::June => "JUNHO",
            Month::July => "JULHO",
            Month::August => "AGOSTO",
            Month::September => "SETEMBRO",
            Month::October => "OUTUBRO",
            Month::November => "NOVEMBRO",
            Month::December => "DEZEMBRO",
        }
    }

    pub fn number(self) -> u32 {
        self as u32 + 1
    }

    /// Resolves a month name regardless of case and accents.
    pub fn from_label(label: &str) -> Option<Month> {
        let wanted = normalize_label(label);
        Month::ALL
            .into_iter()
            .find(|month| normalize_label(month.label()) == wanted)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A tracked calendar slot. Orders by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: Month,
}

impl MonthKey {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// Parses `JANEIRO`, `janeiro/2025`, `JANEIRO.2025` or `Janeiro_25`.
    ///
    /// A label without a year refers to `default_year`. Two-digit years are
    /// read as 20YY.
    pub fn parse(label: &str, default_year: i32) -> Option<MonthKey> {
        let trimmed = label.trim();
        let (name, year) = match trimmed.find(['/', '.', '_', ' ', '-']) {
            Some(idx) => (&trimmed[..idx], Some(trimmed[idx + 1..].trim())),
            None => (trimmed, None),
        };

        let month = Month::from_label(name)?;
        let year = match year {
            None => default_year,
            Some(digits) if digits.len() == 4 => digits.parse().ok()?,
            Some(digits) if digits.len() == 2 => 2000 + digits.parse::<i32>().ok()?,
            Some(_) => return None,
        };
        Some(MonthKey { year, month })
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.month.label(), self.year)
    }
}

/// Every tracked month of the historical and active years, each mapped to its
/// ledger. A calendar is always complete: months without a source sheet hold
/// an empty ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    ledgers: BTreeMap<MonthKey, MonthLedger>,
}

impl Calendar {
    pub fn new(years: &[i32]) -> Self {
        let ledgers = years
            .iter()
            .flat_map(|&year| Month::ALL.into_iter().map(move |month| MonthKey::new(year, month)))
            .map(|key| (key, MonthLedger::default()))
            .collect();
        Self { ledgers }
    }

    pub fn contains(&self, key: &MonthKey) -> bool {
        self.ledgers.contains_key(key)
    }

    pub fn get(&self, key: &MonthKey) -> Option<&MonthLedger> {
        self.ledgers.get(key)
    }

    pub fn get_mut(&mut self, key: &MonthKey) -> Option<&mut MonthLedger> {
        self.ledgers.get_mut(key)
    }

    /// Replaces the ledger of a tracked month. Untracked months are ignored.
    pub fn set(&mut self, key: MonthKey, ledger: MonthLedger) {
        if let Some(slot) = self.ledgers.get_mut(&key) {
            *slot = ledger;
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.ledgers.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MonthKey, &MonthLedger)> {
        self.ledgers.iter()
    }

    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }

    /// Total number of ledger entries across all months.
    pub fn entry_count(&self) -> usize {
        self.ledgers.values().map(|ledger| ledger.entries.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_month_labels() {
        assert_eq!(
            MonthKey::parse("JANEIRO", 2026),
            Some(MonthKey::new(2026, Month::January))
        );
        assert_eq!(
            MonthKey::parse("marco/2025", 2026),
            Some(MonthKey::new(2025, Month::March))
        );
        assert_eq!(
            MonthKey::parse("Outubro_25", 2026),
            Some(MonthKey::new(2025, Month::October))
        );
        assert_eq!(MonthKey::parse("JANEIRO.20265", 2026), None);
        assert_eq!(MonthKey::parse("Brumário", 2026), None);
    }

    #[test]
    fn calendar_covers_both_years_in_order() {
        let calendar = Calendar::new(&[2025, 2026]);
        assert_eq!(calendar.len(), 24);
        let keys: Vec<MonthKey> = calendar.keys().collect();
        assert_eq!(keys.first(), Some(&MonthKey::new(2025, Month::January)));
        assert_eq!(keys.last(), Some(&MonthKey::new(2026, Month::December)));
    }
}
