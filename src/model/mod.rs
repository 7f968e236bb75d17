use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod calendar;
pub mod values;

pub use calendar::{Calendar, Month, MonthKey};

/// Ordered collection of every student, keyed logically by full name.
pub type Roster = Vec<Student>;

/// Day of the month a student's tuition is due. The school only offers a
/// fixed set of due days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DueDay {
    #[serde(rename = "DIA 05")]
    Day05,
    #[serde(rename = "DIA 10")]
    Day10,
    #[default]
    #[serde(rename = "DIA 15")]
    Day15,
    #[serde(rename = "DIA 20")]
    Day20,
    #[serde(rename = "DIA 30")]
    Day30,
}

impl DueDay {
    pub const ALL: [DueDay; 5] = [
        DueDay::Day05,
        DueDay::Day10,
        DueDay::Day15,
        DueDay::Day20,
        DueDay::Day30,
    ];

    pub fn day(self) -> u32 {
        match self {
            DueDay::Day05 => 5,
            DueDay::Day10 => 10,
            DueDay::Day15 => 15,
            DueDay::Day20 => 20,
            DueDay::Day30 => 30,
        }
    }

    pub fn label(self) -> String {
        format!("DIA {:02}", self.day())
    }

    /// Accepts `DIA 15`, `dia 5`, or a bare day number.
    pub fn parse(raw: &str) -> Option<DueDay> {
        let normalized = values::normalize_label(raw);
        let digits = normalized.strip_prefix("DIA").unwrap_or(&normalized).trim();
        let day: u32 = digits.parse().ok()?;
        DueDay::ALL.into_iter().find(|due| due.day() == day)
    }
}

impl fmt::Display for DueDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Short stable identifier derived from a student's full name.
///
/// The workbook never stored identifiers, so the key is a name-based UUIDv5
/// truncated to eight hex characters. It is minted when the student is loaded
/// or enrolled and kept across renames for the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentKey(String);

impl StudentKey {
    pub fn for_name(name: &str) -> Self {
        let normalized = name.trim().to_lowercase();
        let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, normalized.as_bytes());
        let mut simple = uuid.simple().to_string();
        simple.truncate(8);
        Self(simple)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Marker embedded in payment descriptions, e.g. `#1a2b3c4d`.
    pub fn tag(&self) -> String {
        format!("#{}", self.0)
    }
}

impl fmt::Display for StudentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of a student's missing paperwork as kept in the roster's
/// `Pendência Doc` column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PendingDocument {
    #[default]
    No,
    Yes,
    /// Any other text typed in the column, e.g. `Cursando`. Kept verbatim.
    Other(String),
}

impl PendingDocument {
    /// Reads the column's text. Blank cells and `--` mean nothing is pending.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match values::normalize_label(trimmed).as_str() {
            "" | "--" | "-" | "NAO" | "N" | "0" | "FALSE" | "NO" => Self::No,
            "SIM" | "S" | "X" | "TRUE" | "YES" | "1" => Self::Yes,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Text written back to the roster column.
    pub fn label(&self) -> &str {
        match self {
            Self::No => "--",
            Self::Yes => "SIM",
            Self::Other(text) => text,
        }
    }

    /// Whether the student still owes paperwork. Free-text states count.
    pub fn is_pending(&self) -> bool {
        !matches!(self, Self::No)
    }
}

impl From<bool> for PendingDocument {
    fn from(pending: bool) -> Self {
        if pending { Self::Yes } else { Self::No }
    }
}

impl fmt::Display for PendingDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A student on the roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Full name; the roster's effective primary key.
    pub name: String,
    pub contact: String,
    pub due_day: DueDay,
    pub monthly_fee: Decimal,
    pub enrollment_date: Option<NaiveDate>,
    pub enrollment_fee: Decimal,
    /// Scholarship tier label. `None` means no scholarship.
    pub scholarship: Option<String>,
    pub pending_document: PendingDocument,
    pub pending_document_note: String,
    /// Display cache only; the ledgers are authoritative.
    pub last_payment: Option<NaiveDate>,
    pub key: StudentKey,
}

impl Student {
    /// Creates a student with the given name and default values elsewhere.
    pub fn new(name: impl Into<String>, monthly_fee: Decimal, due_day: DueDay) -> Self {
        let name = name.into();
        let key = StudentKey::for_name(&name);
        Self {
            name,
            contact: String::new(),
            due_day,
            monthly_fee,
            enrollment_date: None,
            enrollment_fee: Decimal::ZERO,
            scholarship: None,
            pending_document: PendingDocument::No,
            pending_document_note: String::new(),
            last_payment: None,
            key,
        }
    }

    /// Lower-cased first token of the full name.
    pub fn first_name(&self) -> Option<String> {
        self.name.split_whitespace().next().map(str::to_lowercase)
    }

    pub fn has_scholarship(&self) -> bool {
        self.scholarship.is_some()
    }
}

/// Field values supplied when enrolling or editing a student. `None` leaves
/// the field at its default (enrolment) or unchanged (edit).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentFields {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub due_day: Option<DueDay>,
    pub monthly_fee: Option<Decimal>,
    pub enrollment_date: Option<NaiveDate>,
    pub enrollment_fee: Option<Decimal>,
    /// An empty string clears the scholarship.
    pub scholarship: Option<String>,
    pub pending_document: Option<PendingDocument>,
    pub pending_document_note: Option<String>,
}

impl StudentFields {
    /// Merges the supplied fields into `student`.
    pub fn apply_to(self, student: &mut Student) {
        if let Some(name) = self.name {
            student.name = name.trim().to_string();
        }
        if let Some(contact) = self.contact {
            student.contact = contact;
        }
        if let Some(due_day) = self.due_day {
            student.due_day = due_day;
        }
        if let Some(fee) = self.monthly_fee {
            student.monthly_fee = fee;
        }
        if let Some(date) = self.enrollment_date {
            student.enrollment_date = Some(date);
        }
        if let Some(fee) = self.enrollment_fee {
            student.enrollment_fee = fee;
        }
        if let Some(tier) = self.scholarship {
            let tier = tier.trim();
            student.scholarship = (!tier.is_empty()).then(|| tier.to_string());
        }
        if let Some(pending) = self.pending_document {
            student.pending_document = pending;
        }
        if let Some(note) = self.pending_document_note {
            student.pending_document_note = note;
        }
    }
}

/// A single financial movement. Positive amounts are income, negative amounts
/// are expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: String,
    pub description: String,
    pub amount: Decimal,
    pub method: String,
    /// Running balance as typed in the sheet; informational only.
    pub balance: Option<Decimal>,
}

impl LedgerEntry {
    pub fn is_income(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_expense(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        values::parse_date(&self.date)
    }
}

/// Ordered entries of one calendar month.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthLedger {
    /// Sheet the ledger was read from, if the workbook had one.
    pub sheet: Option<String>,
    pub entries: Vec<LedgerEntry>,
}

impl MonthLedger {
    pub fn from_sheet(sheet: impl Into<String>, entries: Vec<LedgerEntry>) -> Self {
        Self {
            sheet: Some(sheet.into()),
            entries,
        }
    }

    pub fn totals(&self) -> MonthTotals {
        MonthTotals::from_entries(&self.entries)
    }
}

/// Aggregate cash flow of a month. `expense` is kept negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MonthTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

impl MonthTotals {
    pub fn from_entries(entries: &[LedgerEntry]) -> Self {
        let income: Decimal = entries
            .iter()
            .filter(|entry| entry.is_income())
            .map(|entry| entry.amount)
            .sum();
        let expense: Decimal = entries
            .iter()
            .filter(|entry| entry.is_expense())
            .map(|entry| entry.amount)
            .sum();
        Self {
            income,
            expense,
            balance: income + expense,
        }
    }
}

/// Tuition status of one student in one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "entry", rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid(LedgerEntry),
    Pending,
}

impl PaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::Paid(_))
    }

    pub fn entry(&self) -> Option<&LedgerEntry> {
        match self {
            PaymentStatus::Paid(entry) => Some(entry),
            PaymentStatus::Pending => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(amount: i64) -> LedgerEntry {
        LedgerEntry {
            date: "05/01/2026".into(),
            description: "movimento".into(),
            amount: Decimal::from(amount),
            method: "PIX".into(),
            balance: None,
        }
    }

    #[test]
    fn pending_document_keeps_free_text() {
        assert_eq!(PendingDocument::parse(" -- "), PendingDocument::No);
        assert_eq!(PendingDocument::parse("NÃO"), PendingDocument::No);
        assert_eq!(PendingDocument::parse("sim"), PendingDocument::Yes);
        let studying = PendingDocument::parse(" Cursando ");
        assert_eq!(studying, PendingDocument::Other("Cursando".into()));
        assert_eq!(studying.label(), "Cursando");
        assert!(studying.is_pending());
        assert!(!PendingDocument::No.is_pending());
    }

    #[test]
    fn due_day_parses_labels_and_numbers() {
        assert_eq!(DueDay::parse("DIA 15"), Some(DueDay::Day15));
        assert_eq!(DueDay::parse("dia 5"), Some(DueDay::Day05));
        assert_eq!(DueDay::parse("30"), Some(DueDay::Day30));
        assert_eq!(DueDay::parse("DIA 12"), None);
        assert_eq!(DueDay::Day05.label(), "DIA 05");
    }

    #[test]
    fn totals_keep_expense_negative() {
        let totals = MonthTotals::from_entries(&[entry(200), entry(-150), entry(0), entry(50)]);
        assert_eq!(totals.income, Decimal::from(250));
        assert_eq!(totals.expense, Decimal::from(-150));
        assert_eq!(totals.balance, Decimal::from(100));
    }

    #[test]
    fn student_key_is_stable_and_case_insensitive() {
        let key = StudentKey::for_name("Maria Silva");
        assert_eq!(key, StudentKey::for_name("  maria silva "));
        assert_eq!(key.as_str().len(), 8);
        assert_ne!(key, StudentKey::for_name("Maria Souza"));
    }

    #[test]
    fn clearing_scholarship_with_empty_tier() {
        let mut student = Student::new("Ana Lima", Decimal::from(200), DueDay::Day10);
        StudentFields {
            scholarship: Some("50%".into()),
            ..StudentFields::default()
        }
        .apply_to(&mut student);
        assert_eq!(student.scholarship.as_deref(), Some("50%"));

        StudentFields {
            scholarship: Some(String::new()),
            ..StudentFields::default()
        }
        .apply_to(&mut student);
        assert!(!student.has_scholarship());
    }
}
