//! In-memory owner of the roster and every monthly ledger.
//!
//! All queries and mutations the presentation layer needs go through
//! [`ReconciliationStore`]. Payment status is never stored: it is recomputed
//! from the ledgers by [`matcher::find_payment`] on every call.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use crate::config::Settings;
use crate::error::{Result, TuitionError};
use crate::io::excel_read::LoadedWorkbook;
use crate::matcher::{self, MatchMode};
use crate::model::values::parse_date;
use crate::model::{
    Calendar, LedgerEntry, MonthKey, MonthLedger, MonthTotals, PaymentStatus, Roster, Student,
    StudentFields,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationStore {
    settings: Settings,
    roster: Roster,
    calendar: Calendar,
}

impl ReconciliationStore {
    pub fn new(settings: Settings, loaded: LoadedWorkbook) -> Self {
        Self {
            settings,
            roster: loaded.roster,
            calendar: loaded.calendar,
        }
    }

    /// A store with no students and an empty ledger for every tracked month.
    pub fn empty(settings: Settings) -> Self {
        let loaded = LoadedWorkbook::empty(&settings);
        Self::new(settings, loaded)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn active_year(&self) -> i32 {
        self.settings.active_year
    }

    pub fn match_mode(&self) -> MatchMode {
        self.settings.match_mode
    }

    pub fn set_match_mode(&mut self, mode: MatchMode) {
        self.settings.match_mode = mode;
    }

    /// Tracked months in calendar order.
    pub fn months(&self) -> Vec<MonthKey> {
        self.calendar.keys().collect()
    }

    /// Resolves a month label (`JANEIRO`, `JANEIRO/2025`, ...) to a tracked month.
    pub fn resolve_month(&self, label: &str) -> Result<MonthKey> {
        MonthKey::parse(label, self.settings.active_year)
            .filter(|key| self.calendar.contains(key))
            .ok_or_else(|| TuitionError::MonthNotFound(label.trim().to_string()))
    }

    pub fn ledger(&self, month: &str) -> Result<&MonthLedger> {
        let key = self.resolve_month(month)?;
        self.calendar
            .get(&key)
            .ok_or_else(|| TuitionError::MonthNotFound(key.to_string()))
    }

    fn ledger_mut(&mut self, month: &str) -> Result<(MonthKey, &mut MonthLedger)> {
        let key = self.resolve_month(month)?;
        let ledger = self
            .calendar
            .get_mut(&key)
            .ok_or_else(|| TuitionError::MonthNotFound(key.to_string()))?;
        Ok((key, ledger))
    }

    /// Students whose name contains `filter`, ignoring case, in roster order.
    pub fn list_students(&self, filter: Option<&str>) -> Vec<&Student> {
        let needle = filter
            .map(|text| text.trim().to_lowercase())
            .filter(|text| !text.is_empty());
        self.roster
            .iter()
            .filter(|student| match &needle {
                Some(needle) => student.name.to_lowercase().contains(needle),
                None => true,
            })
            .collect()
    }

    /// First student whose full name equals `name`.
    pub fn student(&self, name: &str) -> Result<&Student> {
        let idx = self.student_index(name)?;
        Ok(&self.roster[idx])
    }

    fn student_index(&self, name: &str) -> Result<usize> {
        let wanted = name.trim();
        self.roster
            .iter()
            .position(|student| student.name == wanted)
            .ok_or_else(|| TuitionError::StudentNotFound(wanted.to_string()))
    }

    /// Enrolls a new student. Duplicate names are accepted.
    #[instrument(level = "info", skip_all)]
    pub fn add_student(&mut self, fields: StudentFields) -> Result<Student> {
        let name = fields
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if name.is_empty() {
            return Err(TuitionError::InvalidStudent(
                "student name must not be empty".into(),
            ));
        }
        if self.roster.iter().any(|student| student.name == name) {
            warn!(%name, "enrolling a student whose name is already on the roster");
        }

        let mut student = Student::new(
            name,
            self.settings.default_monthly_fee,
            self.settings.default_due_day,
        );
        student.enrollment_date = Some(Local::now().date_naive());
        fields.apply_to(&mut student);

        info!(name = %student.name, key = %student.key, "student enrolled");
        self.roster.push(student.clone());
        Ok(student)
    }

    /// Merges `fields` into the student called `name`. Renaming only changes
    /// the field; callers holding the old name must switch to the new one.
    #[instrument(level = "info", skip(self, fields))]
    pub fn update_student(&mut self, name: &str, fields: StudentFields) -> Result<Student> {
        if fields
            .name
            .as_deref()
            .is_some_and(|new_name| new_name.trim().is_empty())
        {
            return Err(TuitionError::InvalidStudent(
                "student name must not be empty".into(),
            ));
        }

        let idx = self.student_index(name)?;
        let student = &mut self.roster[idx];
        fields.apply_to(student);
        debug!(name = %student.name, "student updated");
        Ok(student.clone())
    }

    /// Paid with the first matching entry, or Pending.
    pub fn month_status(&self, name: &str, month: &str) -> Result<PaymentStatus> {
        let student = self.student(name)?;
        let ledger = self.ledger(month)?;
        Ok(self.status_in(student, ledger))
    }

    fn status_in(&self, student: &Student, ledger: &MonthLedger) -> PaymentStatus {
        match matcher::find_payment(student, &ledger.entries, self.settings.match_mode) {
            Some((_, entry)) => PaymentStatus::Paid(entry.clone()),
            None => PaymentStatus::Pending,
        }
    }

    /// Status of the student in every tracked month, in calendar order.
    pub fn student_history(&self, name: &str) -> Result<Vec<(MonthKey, PaymentStatus)>> {
        let student = self.student(name)?;
        Ok(self
            .calendar
            .iter()
            .map(|(key, ledger)| (*key, self.status_in(student, ledger)))
            .collect())
    }

    /// Appends a tuition payment for the student. An existing payment in the
    /// same month is not checked for, so repeated calls add repeated entries.
    #[instrument(level = "info", skip(self, amount), fields(%amount))]
    pub fn record_payment(
        &mut self,
        name: &str,
        month: &str,
        amount: Decimal,
        date: &str,
        method: &str,
    ) -> Result<LedgerEntry> {
        if amount <= Decimal::ZERO {
            return Err(TuitionError::InvalidAmount {
                amount: amount.to_string(),
                reason: "payments must be positive",
            });
        }

        let idx = self.student_index(name)?;
        let description = self.payment_description(&self.roster[idx]);
        let entry = LedgerEntry {
            date: date.trim().to_string(),
            description,
            amount,
            method: method.trim().to_string(),
            balance: None,
        };

        let (key, ledger) = self.ledger_mut(month)?;
        ledger.entries.push(entry.clone());
        info!(month = %key, description = %entry.description, "payment recorded");

        if let Some(paid_on) = parse_date(&entry.date) {
            let student = &mut self.roster[idx];
            if student.last_payment.is_none_or(|previous| previous < paid_on) {
                student.last_payment = Some(paid_on);
            }
        }
        Ok(entry)
    }

    fn payment_description(&self, student: &Student) -> String {
        match self.settings.match_mode {
            MatchMode::FirstName => format!("{} {}", self.settings.payment_label, student.name),
            MatchMode::Keyed => format!(
                "{} {} {}",
                self.settings.payment_label,
                student.name,
                student.key.tag()
            ),
        }
    }

    /// Removes the first entry matching the student in `month`. When the
    /// month holds duplicate payments the student stays Paid.
    #[instrument(level = "info", skip(self))]
    pub fn undo_payment(&mut self, name: &str, month: &str) -> Result<LedgerEntry> {
        let idx = self.student_index(name)?;
        let key = self.resolve_month(month)?;
        let mode = self.settings.match_mode;
        let student = &self.roster[idx];

        let ledger = self
            .calendar
            .get_mut(&key)
            .ok_or_else(|| TuitionError::MonthNotFound(key.to_string()))?;
        let position = matcher::find_payment(student, &ledger.entries, mode)
            .map(|(position, _)| position)
            .ok_or_else(|| TuitionError::PaymentNotFound {
                student: student.name.clone(),
                month: key.to_string(),
            })?;

        let removed = ledger.entries.remove(position);
        info!(month = %key, description = %removed.description, "payment removed");
        Ok(removed)
    }

    /// Appends an expense. `amount` is the positive cost; it is stored negated.
    #[instrument(level = "info", skip(self, amount), fields(%amount))]
    pub fn record_expense(
        &mut self,
        month: &str,
        description: &str,
        amount: Decimal,
        date: &str,
    ) -> Result<LedgerEntry> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(TuitionError::InvalidAmount {
                amount: amount.to_string(),
                reason: "expenses are given as positive costs",
            });
        }

        let entry = LedgerEntry {
            date: date.trim().to_string(),
            description: format!("{} - {}", self.settings.expense_label, description.trim()),
            amount: if amount.is_zero() { Decimal::ZERO } else { -amount },
            method: String::new(),
            balance: None,
        };

        let (key, ledger) = self.ledger_mut(month)?;
        ledger.entries.push(entry.clone());
        info!(month = %key, description = %entry.description, "expense recorded");
        Ok(entry)
    }

    /// Students without a matching entry in `month`, in roster order.
    pub fn pending_students(&self, month: &str) -> Result<Vec<&Student>> {
        let ledger = self.ledger(month)?;
        Ok(self
            .roster
            .iter()
            .filter(|student| !self.status_in(student, ledger).is_paid())
            .collect())
    }

    pub fn month_totals(&self, month: &str) -> Result<MonthTotals> {
        Ok(self.ledger(month)?.totals())
    }

    /// Latest payment date found in the ledgers for `student`.
    pub fn recomputed_last_payment(&self, student: &Student) -> Option<NaiveDate> {
        self.calendar
            .iter()
            .filter_map(|(_, ledger)| {
                matcher::find_payment(student, &ledger.entries, self.settings.match_mode)
            })
            .filter_map(|(_, entry)| entry.parsed_date())
            .max()
    }

    /// Rewrites every student's last-payment cache from the ledgers.
    pub fn refresh_last_payments(&mut self) {
        let refreshed: Vec<Option<NaiveDate>> = self
            .roster
            .iter()
            .map(|student| self.recomputed_last_payment(student))
            .collect();
        for (student, last_payment) in self.roster.iter_mut().zip(refreshed) {
            student.last_payment = last_payment;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ReconciliationStore {
        ReconciliationStore::empty(Settings::default())
    }

    #[test]
    fn unknown_month_is_reported() {
        let store = store();
        assert!(matches!(
            store.ledger("BRUMARIO"),
            Err(TuitionError::MonthNotFound(_))
        ));
        assert!(matches!(
            store.ledger("JANEIRO/2019"),
            Err(TuitionError::MonthNotFound(_))
        ));
        assert!(store.ledger("janeiro/2025").is_ok());
    }

    #[test]
    fn enrollment_requires_a_name() {
        let mut store = store();
        let result = store.add_student(StudentFields {
            name: Some("   ".into()),
            ..StudentFields::default()
        });
        assert!(matches!(result, Err(TuitionError::InvalidStudent(_))));
        assert!(store.roster().is_empty());
    }

    #[test]
    fn payment_updates_last_payment_cache() {
        let mut store = store();
        store
            .add_student(StudentFields {
                name: Some("Maria Silva".into()),
                ..StudentFields::default()
            })
            .unwrap();
        store
            .record_payment("Maria Silva", "FEVEREIRO", Decimal::from(200), "10/02/2026", "PIX")
            .unwrap();
        store
            .record_payment("Maria Silva", "JANEIRO", Decimal::from(200), "10/01/2026", "PIX")
            .unwrap();

        let expected = NaiveDate::from_ymd_opt(2026, 2, 10);
        assert_eq!(store.student("Maria Silva").unwrap().last_payment, expected);
        let student = store.student("Maria Silva").unwrap().clone();
        assert_eq!(store.recomputed_last_payment(&student), expected);
    }
}
