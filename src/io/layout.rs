//! Sheet and column names of the school's workbook.

use crate::model::MonthKey;
use crate::model::values::normalize_label;

pub const ROSTER_NAME: &str = "Aluno";
pub const ROSTER_CONTACT: &str = "Contato";
pub const ROSTER_DUE_DAY: &str = "Vencimento";
pub const ROSTER_MONTHLY_FEE: &str = "Mensalidade";
pub const ROSTER_ENROLLMENT_DATE: &str = "Data Matrícula";
pub const ROSTER_ENROLLMENT_FEE: &str = "Taxa Matrícula";
pub const ROSTER_SCHOLARSHIP: &str = "Bolsa";
pub const ROSTER_PENDING_DOCUMENT: &str = "Pendência Doc";
pub const ROSTER_PENDING_NOTE: &str = "Descrição Pendência";
pub const ROSTER_LAST_PAYMENT: &str = "Último Pagamento";

/// Roster columns in the order they are written.
pub const ROSTER_COLUMNS: [&str; 10] = [
    ROSTER_NAME,
    ROSTER_CONTACT,
    ROSTER_DUE_DAY,
    ROSTER_MONTHLY_FEE,
    ROSTER_ENROLLMENT_DATE,
    ROSTER_ENROLLMENT_FEE,
    ROSTER_SCHOLARSHIP,
    ROSTER_PENDING_DOCUMENT,
    ROSTER_PENDING_NOTE,
    ROSTER_LAST_PAYMENT,
];

pub const LEDGER_DATE: &str = "Data";
pub const LEDGER_DESCRIPTION: &str = "Lançamento";
pub const LEDGER_AMOUNT: &str = "Valor";
pub const LEDGER_METHOD: &str = "Forma de Pagamento";
pub const LEDGER_BALANCE: &str = "Saldo";

/// Columns every month sheet must provide; missing ones are synthesised empty.
pub const LEDGER_REQUIRED: [&str; 4] = [LEDGER_DATE, LEDGER_DESCRIPTION, LEDGER_AMOUNT, LEDGER_METHOD];

/// Month sheet columns in the order they are written.
pub const LEDGER_COLUMNS: [&str; 5] = [
    LEDGER_DATE,
    LEDGER_DESCRIPTION,
    LEDGER_AMOUNT,
    LEDGER_METHOD,
    LEDGER_BALANCE,
];

pub const TOTAL_INCOME_LABEL: &str = "TOTAL ENTRADAS";
pub const TOTAL_EXPENSE_LABEL: &str = "TOTAL SAÍDAS";
pub const NET_BALANCE_LABEL: &str = "SALDO DO MÊS";

pub const ROSTER_TITLE: &str = "CADASTRO DE ALUNOS";

/// True for the summary rows appended below each month on export.
pub fn is_summary_label(description: &str) -> bool {
    let normalized = normalize_label(description);
    [TOTAL_INCOME_LABEL, TOTAL_EXPENSE_LABEL, NET_BALANCE_LABEL]
        .iter()
        .any(|label| normalize_label(label) == normalized)
}

/// Default sheet name of a month: the bare label in the active year,
/// `LABEL.YEAR` otherwise.
pub fn month_sheet_name(key: &MonthKey, active_year: i32) -> String {
    if key.year == active_year {
        key.month.label().to_string()
    } else {
        format!("{}.{}", key.month.label(), key.year)
    }
}
