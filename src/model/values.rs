use std::str::FromStr;

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%Y-%m-%d", "%d/%m/%y", "%d-%m-%Y"];

/// Display format used for dates written back into the workbook.
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

/// Parses an amount typed by hand in a cell: `200`, `200,50`, `R$ 1.234,50`.
///
/// When a comma is present it is taken as the decimal separator and dots are
/// treated as thousands separators.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') || is_thousands_grouped(&cleaned) {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned
    };
    Decimal::from_str(&normalized).ok()
}

// `1.500` and `12.345.678`: every dot is followed by exactly three digits.
fn is_thousands_grouped(text: &str) -> bool {
    let mut grouped = false;
    for group in text.split('.').skip(1) {
        if group.len() != 3 || !group.chars().all(|ch| ch.is_ascii_digit()) {
            return false;
        }
        grouped = true;
    }
    grouped
}

/// Converts a numeric cell into a decimal rounded to cents.
pub fn amount_from_f64(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|amount| amount.round_dp(2).normalize())
}

/// Parses the date layouts found in the workbook's free-text date cells.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    // Timestamps exported by other tools carry a time suffix.
    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
}

/// Converts an Excel serial date (1900 date system) into a calendar date.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Formats an amount as Brazilian reais, e.g. `R$ 1.234,50` or `-R$ 150,00`.
pub fn format_brl(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (integer, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, digit) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}R$ {grouped},{cents}")
}

/// Strips the Portuguese diacritics that show up in sheet names and headers.
pub fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'É' | 'È' | 'Ê' | 'Ë' => 'E',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
            'ç' => 'c',
            'Ç' => 'C',
            other => other,
        })
        .collect()
}

/// Normalises a label for tolerant comparisons: trimmed, accent-free, upper case.
pub fn normalize_label(text: &str) -> String {
    fold_accents(text.trim()).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_brazilian_amounts() {
        assert_eq!(parse_amount("R$ 1.234,50"), Some(Decimal::new(123450, 2)));
        assert_eq!(parse_amount("200"), Some(Decimal::from(200)));
        assert_eq!(parse_amount("-150,00"), Some(Decimal::from(-150)));
        assert_eq!(parse_amount("1.500"), Some(Decimal::from(1500)));
        assert_eq!(parse_amount("R$ 12.345.678"), Some(Decimal::from(12_345_678)));
        assert_eq!(parse_amount("200.5"), Some(Decimal::new(2005, 1)));
        assert_eq!(parse_amount("200.50"), Some(Decimal::new(20050, 2)));
        assert_eq!(parse_amount("   "), None);
        assert_eq!(parse_amount("duzentos"), None);
    }

    #[test]
    fn converts_excel_serials() {
        assert_eq!(
            excel_serial_to_date(46032.0),
            NaiveDate::from_ymd_opt(2026, 1, 10)
        );
        assert_eq!(excel_serial_to_date(-1.0), None);
    }

    #[test]
    fn parses_common_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 10);
        assert_eq!(parse_date("10/01/2026"), expected);
        assert_eq!(parse_date("2026-01-10 00:00:00"), expected);
        assert_eq!(parse_date("ontem"), None);
    }

    #[test]
    fn formats_reais() {
        assert_eq!(format_brl(Decimal::new(123450, 2)), "R$ 1.234,50");
        assert_eq!(format_brl(Decimal::from(-150)), "-R$ 150,00");
        assert_eq!(format_brl(Decimal::ZERO), "R$ 0,00");
        assert_eq!(format_brl(Decimal::from(1_000_000)), "R$ 1.000.000,00");
    }

    #[test]
    fn folds_accents() {
        assert_eq!(normalize_label(" Lançamento "), "LANCAMENTO");
        assert_eq!(fold_accents("MARÇO"), "MARCO");
    }
}
