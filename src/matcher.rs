//! Links students to ledger entries.
//!
//! The workbook has no foreign key between a student and the rows that pay
//! their tuition: the bookkeeper types a free-text description. Matching is
//! therefore recomputed on every query from the description text.

use serde::{Deserialize, Serialize};

use crate::model::{LedgerEntry, Student};

/// Strategy used to decide which entry pays a student's tuition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMode {
    /// First entry whose description contains the student's first name,
    /// ignoring case. Students sharing a first name collide and both resolve
    /// to whichever entry comes first.
    #[default]
    FirstName,
    /// Entries tagged with the student's key (`#1a2b3c4d`) win. Without a
    /// tagged entry the lookup falls back to first-name matching over
    /// untagged rows only, so hand-typed legacy rows still count.
    Keyed,
}

/// Returns the first entry paying `student`'s tuition, with its position in
/// the ledger.
pub fn find_payment<'a>(
    student: &Student,
    entries: &'a [LedgerEntry],
    mode: MatchMode,
) -> Option<(usize, &'a LedgerEntry)> {
    let first_name = student.first_name()?;

    match mode {
        MatchMode::FirstName => entries
            .iter()
            .enumerate()
            .find(|(_, entry)| mentions(&entry.description, &first_name)),
        MatchMode::Keyed => {
            let tag = student.key.tag();
            entries
                .iter()
                .enumerate()
                .find(|(_, entry)| mentions(&entry.description, &tag))
                .or_else(|| {
                    entries.iter().enumerate().find(|(_, entry)| {
                        !has_key_tag(&entry.description)
                            && mentions(&entry.description, &first_name)
                    })
                })
        }
    }
}

/// True when `description` carries a `#` followed by eight hex digits.
pub fn has_key_tag(description: &str) -> bool {
    description.match_indices('#').any(|(idx, _)| {
        description[idx + 1..]
            .get(..8)
            .is_some_and(|candidate| candidate.bytes().all(|byte| byte.is_ascii_hexdigit()))
    })
}

// `needle` is expected lower-cased already.
fn mentions(description: &str, needle: &str) -> bool {
    !description.trim().is_empty() && description.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::model::DueDay;

    fn student(name: &str) -> Student {
        Student::new(name, Decimal::from(200), DueDay::Day15)
    }

    fn entry(description: &str) -> LedgerEntry {
        LedgerEntry {
            date: String::new(),
            description: description.to_string(),
            amount: Decimal::from(200),
            method: String::new(),
            balance: None,
        }
    }

    #[test]
    fn first_name_match_ignores_case() {
        let entries = vec![entry("Luz"), entry("MENSALIDADE MARIA SILVA")];
        let found = find_payment(&student("Maria Silva"), &entries, MatchMode::FirstName);
        assert_eq!(found.map(|(idx, _)| idx), Some(1));
    }

    #[test]
    fn blank_descriptions_and_blank_names_never_match() {
        let entries = vec![entry(""), entry("   ")];
        assert!(find_payment(&student("Maria"), &entries, MatchMode::FirstName).is_none());
        assert!(find_payment(&student("   "), &[entry("Maria")], MatchMode::FirstName).is_none());
    }

    #[test]
    fn keyed_mode_prefers_tagged_entries() {
        let souza = student("Joao Souza");
        let pereira = student("Joao Pereira");
        let entries = vec![entry(&format!("Mensalidade Joao Souza {}", souza.key.tag()))];

        assert!(find_payment(&pereira, &entries, MatchMode::FirstName).is_some());
        assert!(find_payment(&pereira, &entries, MatchMode::Keyed).is_none());
        assert!(find_payment(&souza, &entries, MatchMode::Keyed).is_some());
    }

    #[test]
    fn keyed_mode_falls_back_to_legacy_rows() {
        let entries = vec![entry("mensalidade joao")];
        let found = find_payment(&student("Joao Pereira"), &entries, MatchMode::Keyed);
        assert_eq!(found.map(|(idx, _)| idx), Some(0));
    }

    #[test]
    fn detects_key_tags() {
        assert!(has_key_tag("Mensalidade Ana #0a1b2c3d"));
        assert!(!has_key_tag("Recibo #12"));
        assert!(!has_key_tag("Mensalidade Ana"));
    }
}
