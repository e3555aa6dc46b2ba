// 📚 Records - raw and cleaned shapes of the loan and member tables
// Raw rows mirror the source CSV headers; every cell is optional because the
// extract has blank cells and fully empty rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// SOURCE COLUMNS
// ============================================================================

pub const COL_LOAN_ID: &str = "Id";
pub const COL_BOOK_TITLE: &str = "Books";
pub const COL_CHECKOUT: &str = "Book checkout";
pub const COL_RETURNED: &str = "Book Returned";
pub const COL_ALLOWED_PERIOD: &str = "Days allowed to borrow";
pub const COL_CUSTOMER_ID: &str = "Customer ID";
pub const COL_CUSTOMER_NAME: &str = "Customer Name";

pub const DEFAULT_LOAN_PERIOD: i64 = 14;

// ============================================================================
// RAW ROWS
// ============================================================================

/// One loan row as loaded
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawLoan {
    #[serde(rename = "Id")]
    pub id: Option<String>,

    #[serde(rename = "Books")]
    pub item_title: Option<String>,

    #[serde(rename = "Book checkout")]
    pub checkout_date_raw: Option<String>,

    #[serde(rename = "Book Returned")]
    pub return_date_raw: Option<String>,

    #[serde(rename = "Days allowed to borrow")]
    pub allowed_period_label: Option<String>,

    #[serde(rename = "Customer ID")]
    pub member_id: Option<String>,
}

impl RawLoan {
    pub fn is_empty(&self) -> bool {
        [
            &self.id,
            &self.item_title,
            &self.checkout_date_raw,
            &self.return_date_raw,
            &self.allowed_period_label,
            &self.member_id,
        ]
        .iter()
        .all(|cell| is_blank(cell))
    }

    pub fn loan_id(&self) -> Option<i64> {
        self.id.as_deref().and_then(parse_identifier)
    }

    pub fn customer_id(&self) -> Option<i64> {
        self.member_id.as_deref().and_then(parse_identifier)
    }

    pub fn title(&self) -> Option<&str> {
        present(&self.item_title)
    }
}

/// One member row as loaded
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawMember {
    #[serde(rename = "Customer ID")]
    pub member_id: Option<String>,

    #[serde(rename = "Customer Name")]
    pub member_name: Option<String>,
}

impl RawMember {
    pub fn is_empty(&self) -> bool {
        is_blank(&self.member_id) && is_blank(&self.member_name)
    }

    pub fn customer_id(&self) -> Option<i64> {
        self.member_id.as_deref().and_then(parse_identifier)
    }

    pub fn name(&self) -> Option<&str> {
        present(&self.member_name)
    }
}

// ============================================================================
// CLEANED RECORDS
// ============================================================================

/// Loan status derived from the two dates and the loan period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanStatus {
    pub days_borrowed: Option<i64>,
    pub days_allowed: i64,
    pub is_overdue: bool,
    pub days_overdue: i64,
}

impl LoanStatus {
    pub fn derive(
        checkout: Option<NaiveDate>,
        returned: Option<NaiveDate>,
        days_allowed: i64,
    ) -> Self {
        let days_borrowed = match (checkout, returned) {
            (Some(out), Some(back)) => Some((back - out).num_days()),
            _ => None,
        };

        let (is_overdue, days_overdue) = match days_borrowed {
            Some(days) => (days > days_allowed, (days - days_allowed).max(0)),
            None => (false, 0),
        };

        LoanStatus {
            days_borrowed,
            days_allowed,
            is_overdue,
            days_overdue,
        }
    }
}

/// Cleaned loan; `id`, `item_title` and `member_id` are always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub id: i64,
    pub item_title: String,
    /// Date text after normalization and repair
    pub checkout_text: Option<String>,
    pub return_text: Option<String>,
    pub allowed_period_label: Option<String>,
    pub member_id: i64,
    pub checkout_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl LoanRecord {
    pub fn days_borrowed(&self) -> Option<i64> {
        self.status.days_borrowed
    }

    pub fn days_allowed(&self) -> i64 {
        self.status.days_allowed
    }

    pub fn is_overdue(&self) -> bool {
        self.status.is_overdue
    }

    pub fn days_overdue(&self) -> i64 {
        self.status.days_overdue
    }
}

/// Cleaned member; also the row shape of the cleaned members file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "Customer ID")]
    pub member_id: i64,

    #[serde(rename = "Customer Name")]
    pub member_name: String,
}

impl Member {
    pub fn new(member_id: i64, member_name: impl Into<String>) -> Self {
        Member {
            member_id,
            member_name: member_name.into(),
        }
    }

    pub fn placeholder(member_id: i64) -> Self {
        Member::new(member_id, placeholder_name(member_id))
    }

    pub fn is_placeholder(&self) -> bool {
        self.member_name == placeholder_name(self.member_id)
    }
}

pub fn placeholder_name(member_id: i64) -> String {
    format!("Unknown Customer {}", member_id)
}

// ============================================================================
// CELL HELPERS
// ============================================================================

fn is_blank(cell: &Option<String>) -> bool {
    present(cell).is_none()
}

fn present(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().filter(|value| !value.trim().is_empty())
}

/// Coerce an identifier cell to an integer, truncating fractions ("3.0" -> 3).
/// Non-numeric text is treated as absent.
pub fn parse_identifier(cell: &str) -> Option<i64> {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.abs() < i64::MAX as f64 {
        Some(value.trunc() as i64)
    } else {
        None
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_parse_identifier() {
        assert_eq!(parse_identifier("5"), Some(5));
        assert_eq!(parse_identifier(" 5.0 "), Some(5));
        assert_eq!(parse_identifier("7.9"), Some(7));
        assert_eq!(parse_identifier("-2.5"), Some(-2));
        assert_eq!(parse_identifier("abc"), None);
        assert_eq!(parse_identifier("NaN"), None);
        assert_eq!(parse_identifier(""), None);
    }

    #[test]
    fn test_empty_row_detection() {
        assert!(RawLoan::default().is_empty());

        let whitespace = RawLoan {
            item_title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(whitespace.is_empty());

        let partial = RawLoan {
            allowed_period_label: Some("2 weeks".to_string()),
            ..Default::default()
        };
        assert!(!partial.is_empty());

        assert!(RawMember::default().is_empty());
    }

    #[test]
    fn test_status_overdue() {
        let status = LoanStatus::derive(ymd(2023, 1, 1), ymd(2023, 1, 20), 14);
        assert_eq!(status.days_borrowed, Some(19));
        assert!(status.is_overdue);
        assert_eq!(status.days_overdue, 5);
    }

    #[test]
    fn test_status_on_boundary_is_not_overdue() {
        let status = LoanStatus::derive(ymd(2023, 1, 1), ymd(2023, 1, 15), 14);
        assert_eq!(status.days_borrowed, Some(14));
        assert!(!status.is_overdue);
        assert_eq!(status.days_overdue, 0);
    }

    #[test]
    fn test_status_negative_duration() {
        // return before checkout
        let status = LoanStatus::derive(ymd(2023, 2, 10), ymd(2023, 2, 1), 14);
        assert_eq!(status.days_borrowed, Some(-9));
        assert!(!status.is_overdue);
        assert_eq!(status.days_overdue, 0);
    }

    #[test]
    fn test_status_missing_date() {
        let status = LoanStatus::derive(ymd(2023, 1, 1), None, 21);
        assert_eq!(status.days_borrowed, None);
        assert_eq!(status.days_allowed, 21);
        assert!(!status.is_overdue);
        assert_eq!(status.days_overdue, 0);
    }

    #[test]
    fn test_placeholder_member() {
        let member = Member::placeholder(5);
        assert_eq!(member.member_name, "Unknown Customer 5");
        assert!(member.is_placeholder());
        assert!(!Member::new(5, "Alice").is_placeholder());
    }
}
