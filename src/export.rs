// 💾 Flat-file Writer - cleaned tables as CSV
// Column order is a contract: the report view and downstream consumers read
// these files by header name.

use crate::records::{LoanRecord, Member};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const LOAN_COLUMNS: [&str; 9] = [
    "Id",
    "Books",
    "Book checkout",
    "Book Returned",
    "Days allowed to borrow",
    "Customer ID",
    "days_borrowed",
    "is_overdue",
    "days_overdue",
];

pub const MEMBER_COLUMNS: [&str; 2] = ["Customer ID", "Customer Name"];

/// One row of the cleaned loans file; field order is column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRow {
    #[serde(rename = "Id")]
    pub id: i64,

    #[serde(rename = "Books")]
    pub item_title: String,

    #[serde(rename = "Book checkout")]
    pub checkout: Option<String>,

    #[serde(rename = "Book Returned")]
    pub returned: Option<String>,

    #[serde(rename = "Days allowed to borrow")]
    pub allowed_period: Option<String>,

    #[serde(rename = "Customer ID")]
    pub member_id: i64,

    pub days_borrowed: Option<i64>,

    pub is_overdue: bool,

    pub days_overdue: i64,
}

impl From<&LoanRecord> for LoanRow {
    fn from(loan: &LoanRecord) -> Self {
        LoanRow {
            id: loan.id,
            item_title: loan.item_title.clone(),
            checkout: loan.checkout_text.clone(),
            returned: loan.return_text.clone(),
            allowed_period: loan.allowed_period_label.clone(),
            member_id: loan.member_id,
            days_borrowed: loan.days_borrowed(),
            is_overdue: loan.is_overdue(),
            days_overdue: loan.days_overdue(),
        }
    }
}

pub fn write_cleaned_loans(path: &Path, loans: &[LoanRecord]) -> Result<usize> {
    write_rows(path, &LOAN_COLUMNS, loans.iter().map(LoanRow::from))
}

pub fn write_cleaned_members(path: &Path, members: &[Member]) -> Result<usize> {
    write_rows(path, &MEMBER_COLUMNS, members.iter())
}

pub fn read_cleaned_loans(path: &Path) -> Result<Vec<LoanRow>> {
    read_rows(path)
}

pub fn read_cleaned_members(path: &Path) -> Result<Vec<Member>> {
    read_rows(path)
}

/// Header names of a CSV file, in file order
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row: {}", path.display()))?;

    Ok(headers.iter().map(str::to_string).collect())
}

/// Header row is written explicitly so empty tables keep their columns
fn write_rows<T, I>(path: &Path, columns: &[&str], rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer
        .write_record(columns)
        .with_context(|| format!("Failed to write header row to {}", path.display()))?;

    let mut written = 0;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row {} to {}", written + 1, path.display()))?;
        written += 1;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {}", path.display()))?;

    Ok(written)
}

fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let mut rows = Vec::new();
    for (line_num, result) in reader.deserialize::<T>().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
        })?;
        rows.push(row);
    }

    Ok(rows)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::LoanStatus;
    use chrono::NaiveDate;

    fn sample_loan(id: i64, returned: Option<&str>) -> LoanRecord {
        let checkout_date = NaiveDate::from_ymd_opt(2023, 1, 1);
        let return_date = returned.and_then(crate::dates::parse_dmy);
        LoanRecord {
            id,
            item_title: format!("Book, Vol. {}", id),
            checkout_text: Some("01/01/2023".to_string()),
            return_text: returned.map(str::to_string),
            allowed_period_label: Some("2 weeks".to_string()),
            member_id: id,
            checkout_date,
            return_date,
            status: LoanStatus::derive(checkout_date, return_date, 14),
        }
    }

    #[test]
    fn test_loans_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loans.csv");
        let loans = vec![sample_loan(1, Some("20/01/2023")), sample_loan(2, None)];

        let written = write_cleaned_loans(&path, &loans).unwrap();
        let rows = read_cleaned_loans(&path).unwrap();

        assert_eq!(written, 2);
        assert_eq!(rows.len(), loans.len());
        assert_eq!(read_headers(&path).unwrap(), LOAN_COLUMNS);
        assert_eq!(rows[0], LoanRow::from(&loans[0]));
        assert_eq!(rows[0].days_borrowed, Some(19));
        assert!(rows[0].is_overdue);
        assert_eq!(rows[1].returned, None);
        assert_eq!(rows[1].days_borrowed, None);
    }

    #[test]
    fn test_members_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.csv");
        let members = vec![Member::new(1, "Alice"), Member::placeholder(5)];

        write_cleaned_members(&path, &members).unwrap();

        assert_eq!(read_headers(&path).unwrap(), MEMBER_COLUMNS);
        assert_eq!(read_cleaned_members(&path).unwrap(), members);
    }

    #[test]
    fn test_empty_tables_still_get_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("members.csv");

        write_cleaned_members(&path, &[]).unwrap();

        assert_eq!(read_headers(&path).unwrap(), MEMBER_COLUMNS);
        assert!(read_cleaned_members(&path).unwrap().is_empty());

        println!("✅ Flat-file writer tests PASSED");
    }
}
