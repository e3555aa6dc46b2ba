// 📅 Date Repair - known defect patterns as data
// Loan dates arrive as free text in day/month/year order. Two literal defects
// exist in the source extract; each is one entry in an ordered patch table.
// Anything else is left to the parser and degrades to an absent date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day/month/year ordering used by the loan extract
pub const DATE_FORMAT: &str = "%d/%m/%Y";

// ============================================================================
// DEFECTS & PATCH TABLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateDefect {
    /// Year typed as 2063 instead of 2023
    FutureYear2063,
    /// Day-of-month 32
    DayOverflow32,
}

impl DateDefect {
    /// Stable reason code reported by the quality analyzer
    pub fn reason(&self) -> &'static str {
        match self {
            DateDefect::FutureYear2063 => "future-year-2063",
            DateDefect::DayOverflow32 => "day-32-overflow",
        }
    }
}

/// One literal repair: a matcher plus the rewrite applied when it matches
pub struct DatePatch {
    pub defect: DateDefect,
    pub matches: fn(&str) -> bool,
    pub rewrite: fn(&str) -> String,
}

fn has_year_2063(text: &str) -> bool {
    text.contains("2063")
}

fn fix_year_2063(text: &str) -> String {
    text.replace("2063", "2023")
}

fn has_day_32(text: &str) -> bool {
    text.starts_with("32/")
}

fn fix_day_32(text: &str) -> String {
    format!("31/{}", &text[3..])
}

/// Applied in order; the day fix sees the output of the year fix
pub const DATE_PATCHES: [DatePatch; 2] = [
    DatePatch {
        defect: DateDefect::FutureYear2063,
        matches: has_year_2063,
        rewrite: fix_year_2063,
    },
    DatePatch {
        defect: DateDefect::DayOverflow32,
        matches: has_day_32,
        rewrite: fix_day_32,
    },
];

// ============================================================================
// NORMALIZATION, DETECTION, REPAIR
// ============================================================================

/// Trim whitespace and strip one layer of enclosing double quotes.
/// Returns None when nothing is left.
pub fn normalize_date_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let unquoted = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let unquoted = unquoted.strip_suffix('"').unwrap_or(unquoted);

    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

/// Which known defects the text exhibits. Read-only; shared by the quality
/// analyzer and the loan cleaner.
pub fn detect_defects(text: &str) -> Vec<DateDefect> {
    DATE_PATCHES
        .iter()
        .filter(|patch| (patch.matches)(text))
        .map(|patch| patch.defect)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateRepair {
    pub text: String,
    pub applied: Vec<DateDefect>,
}

impl DateRepair {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Run the patch table over normalized date text
pub fn repair_date_text(text: &str) -> DateRepair {
    let mut current = text.to_string();
    let mut applied = Vec::new();

    for patch in DATE_PATCHES.iter() {
        if (patch.matches)(&current) {
            current = (patch.rewrite)(&current);
            applied.push(patch.defect);
        }
    }

    DateRepair {
        text: current,
        applied,
    }
}

/// Parse day/month/year text; any failure is an absent date
pub fn parse_dmy(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

// ============================================================================
// CLEANED DATE FIELD
// ============================================================================

/// Result of normalizing, repairing and parsing one raw date cell
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedDate {
    /// Text before the patch table ran (normalized only)
    pub original: Option<String>,
    /// Text after the patch table ran
    pub text: Option<String>,
    pub date: Option<NaiveDate>,
    pub applied: Vec<DateDefect>,
}

impl CleanedDate {
    pub fn from_raw(raw: Option<&str>) -> Self {
        let original = raw.and_then(normalize_date_text);

        match original {
            Some(normalized) => {
                let repair = repair_date_text(&normalized);
                let date = parse_dmy(&repair.text);
                CleanedDate {
                    original: Some(normalized),
                    text: Some(repair.text),
                    date,
                    applied: repair.applied,
                }
            }
            None => CleanedDate {
                original: None,
                text: None,
                date: None,
                applied: Vec::new(),
            },
        }
    }

    /// Text was present but did not parse
    pub fn is_unparseable(&self) -> bool {
        self.text.is_some() && self.date.is_none()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_year_2063_scenario() {
        let cleaned = CleanedDate::from_raw(Some("01/01/2063"));
        assert_eq!(cleaned.text.as_deref(), Some("01/01/2023"));
        assert_eq!(cleaned.date, Some(ymd(2023, 1, 1)));
        assert_eq!(cleaned.applied, vec![DateDefect::FutureYear2063]);
    }

    #[test]
    fn test_day_32_scenario() {
        let cleaned = CleanedDate::from_raw(Some("32/01/2023"));
        assert_eq!(cleaned.text.as_deref(), Some("31/01/2023"));
        assert_eq!(cleaned.date, Some(ymd(2023, 1, 31)));
        assert_eq!(cleaned.applied, vec![DateDefect::DayOverflow32]);
    }

    #[test]
    fn test_both_defects_in_one_value() {
        let repair = repair_date_text("32/03/2063");
        assert_eq!(repair.text, "31/03/2023");
        assert_eq!(
            repair.applied,
            vec![DateDefect::FutureYear2063, DateDefect::DayOverflow32]
        );
    }

    #[test]
    fn test_other_day_values_pass_through() {
        for text in ["00/01/2023", "33/01/2023", "29/02/2023"] {
            let repair = repair_date_text(text);
            assert_eq!(repair.text, text);
            assert!(!repair.changed());
            assert_eq!(parse_dmy(text), None);
        }
    }

    #[test]
    fn test_repair_is_idempotent() {
        let samples = [
            "01/01/2063",
            "32/01/2023",
            "32/12/2063",
            "20632063",
            "2063/32/",
            "32/",
            "15/06/2022",
            "not a date",
            "",
        ];

        for sample in samples {
            let once = repair_date_text(sample);
            let twice = repair_date_text(&once.text);
            assert_eq!(once.text, twice.text, "repair not stable for {:?}", sample);
            assert!(!twice.changed(), "second pass changed {:?}", sample);
        }
    }

    #[test]
    fn test_normalize_strips_one_quote_layer() {
        assert_eq!(normalize_date_text("  \"02/01/2023\" ").as_deref(), Some("02/01/2023"));
        assert_eq!(normalize_date_text("\"\"x\"\"").as_deref(), Some("\"x\""));
        assert_eq!(normalize_date_text("   "), None);
        assert_eq!(normalize_date_text("\"\""), None);
    }

    #[test]
    fn test_detect_matches_repair() {
        assert_eq!(detect_defects("01/01/2063"), vec![DateDefect::FutureYear2063]);
        assert_eq!(detect_defects("32/01/2023"), vec![DateDefect::DayOverflow32]);
        assert!(detect_defects("01/01/2023").is_empty());
        assert_eq!(DateDefect::DayOverflow32.reason(), "day-32-overflow");
    }

    #[test]
    fn test_unparseable_and_absent() {
        let garbage = CleanedDate::from_raw(Some("yesterday"));
        assert!(garbage.is_unparseable());
        assert_eq!(garbage.date, None);

        let absent = CleanedDate::from_raw(None);
        assert!(!absent.is_unparseable());
        assert_eq!(absent.text, None);

        println!("✅ Date repair tests PASSED");
    }
}
