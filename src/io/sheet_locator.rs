//! Resolves canonical month labels to the sheet names a workbook actually
//! uses. The naming convention drifted between releases of the spreadsheet
//! (`JANEIRO`, `JANEIRO.2026`, `Janeiro_26`), so several spellings are tried.

use crate::model::values::fold_accents;

/// Spellings tried for `label` in `year`, most specific convention last.
///
/// Bare spellings (no year) are only produced when `allow_bare` is set; the
/// loader reserves them for the active year so a historical month never
/// claims the current year's sheet.
pub fn candidates(label: &str, year: i32, allow_bare: bool) -> Vec<String> {
    let upper = label.to_uppercase();
    let capitalized = capitalize(label);
    let short_year = year.rem_euclid(100);

    let mut spellings = Vec::new();
    if allow_bare {
        spellings.extend([label.to_string(), upper.clone(), capitalized.clone()]);
    }
    spellings.extend([
        format!("{label}.{year}"),
        format!("{upper}.{year}"),
        format!("{label}_{year}"),
        format!("{capitalized}_{short_year:02}"),
        format!("{upper}_{short_year:02}"),
    ]);

    let mut ordered: Vec<String> = Vec::with_capacity(spellings.len() * 2);
    for spelling in spellings {
        let folded = fold_accents(&spelling);
        for variant in [spelling, folded] {
            if !ordered.contains(&variant) {
                ordered.push(variant);
            }
        }
    }
    ordered
}

/// Returns the first candidate spelling present, case-exact, in `available`.
pub fn locate(label: &str, year: i32, available: &[String], allow_bare: bool) -> Option<String> {
    candidates(label, year, allow_bare)
        .into_iter()
        .find(|candidate| available.iter().any(|name| name == candidate))
}

fn capitalize(label: &str) -> String {
    let lower = label.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
