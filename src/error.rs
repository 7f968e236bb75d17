use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, TuitionError>;

/// Error type covering the failure cases of loading, reconciling, and
/// exporting the tuition workbook.
#[derive(Debug, Error)]
pub enum TuitionError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the settings file cannot be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the Excel writer while exporting.
    #[error("export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the workbook path does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when an operation names a student absent from the roster.
    #[error("student not found: {0}")]
    StudentNotFound(String),

    /// Raised when a month label does not resolve to a tracked month.
    #[error("month not found: {0}")]
    MonthNotFound(String),

    /// Raised when undoing a payment that was never recorded.
    #[error("no payment from {student} recorded in {month}")]
    PaymentNotFound { student: String, month: String },

    /// Raised when student fields break the roster invariants.
    #[error("invalid student: {0}")]
    InvalidStudent(String),

    /// Raised when an amount has the wrong sign for the operation.
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount { amount: String, reason: &'static str },

    /// Raised when saving would replace a workbook that failed to load.
    #[error("refusing to overwrite {path}: it could not be loaded ({reason})")]
    UnsafeOverwrite { path: PathBuf, reason: String },

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
