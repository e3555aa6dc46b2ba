// ✅ Data Quality Analyzer - diagnose the as-loaded tables
// Read-only pass. Reports the defects the cleaners will repair; never gates
// or changes what happens downstream.

use crate::audit::{AuditLog, Stage};
use crate::dates::{detect_defects, normalize_date_text};
use crate::records::{
    RawLoan, RawMember, COL_BOOK_TITLE, COL_CHECKOUT, COL_CUSTOMER_ID, COL_CUSTOMER_NAME,
    COL_LOAN_ID, COL_RETURNED,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// ISSUES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Table {
    Loans,
    Members,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Loans => "books",
            Table::Members => "customers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    MissingField {
        table: Table,
        field: String,
        count: usize,
    },
    EmptyRow {
        table: Table,
        count: usize,
    },
    InvalidDate {
        /// Zero-based position in the loaded loan table
        row_id: usize,
        field: String,
        raw_value: String,
        reason: String,
    },
    ReferentialGap {
        member_ids: BTreeSet<i64>,
    },
}

impl Issue {
    pub fn describe(&self) -> String {
        match self {
            Issue::MissingField { table, field, count } => {
                format!("Rows with missing {} in {} table: {}", field, table.name(), count)
            }
            Issue::EmptyRow { table, count } => {
                format!("Completely empty rows in {} table: {}", table.name(), count)
            }
            Issue::InvalidDate {
                row_id,
                field,
                raw_value,
                reason,
            } => format!("Invalid {} in row {}: '{}' ({})", field, row_id, raw_value, reason),
            Issue::ReferentialGap { member_ids } => format!(
                "Customer IDs in books but not in customers table: {:?}",
                member_ids
            ),
        }
    }
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub loan_rows: usize,
    pub member_rows: usize,
    pub issues: Vec<Issue>,
}

impl QualityReport {
    pub fn invalid_dates(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| matches!(i, Issue::InvalidDate { .. }))
    }

    pub fn referential_gap(&self) -> Option<&BTreeSet<i64>> {
        self.issues.iter().find_map(|i| match i {
            Issue::ReferentialGap { member_ids } => Some(member_ids),
            _ => None,
        })
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Quality check: {} loan rows, {} member rows, {} issues ({} invalid dates)",
            self.loan_rows,
            self.member_rows,
            self.issues.len(),
            self.invalid_dates().count()
        )
    }

    /// Surface the report through the audit log
    pub fn record(&self, audit: &mut AuditLog) {
        audit.info(
            Stage::Analyze,
            format!("Total rows in books table: {}", self.loan_rows),
        );
        audit.info(
            Stage::Analyze,
            format!("Total rows in customers table: {}", self.member_rows),
        );

        for issue in &self.issues {
            let data = serde_json::to_value(issue).unwrap_or(serde_json::Value::Null);
            audit.warn_with(Stage::Analyze, issue.describe(), data);
        }

        audit.info(Stage::Analyze, self.summary());
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

pub fn analyze(loans: &[RawLoan], members: &[RawMember]) -> QualityReport {
    let mut issues = Vec::new();

    // Loan table completeness
    let loan_fields: [(&str, fn(&RawLoan) -> bool); 3] = [
        (COL_LOAN_ID, |r: &RawLoan| r.loan_id().is_none()),
        (COL_BOOK_TITLE, |r: &RawLoan| r.title().is_none()),
        (COL_CUSTOMER_ID, |r: &RawLoan| r.customer_id().is_none()),
    ];
    for (field, missing) in loan_fields {
        push_missing(&mut issues, Table::Loans, field, loans.iter().filter(|r| missing(r)).count());
    }
    push_empty(&mut issues, Table::Loans, loans.iter().filter(|r| r.is_empty()).count());

    // Known date defects, by row then field
    for (row_id, row) in loans.iter().enumerate() {
        for (field, raw) in [
            (COL_CHECKOUT, &row.checkout_date_raw),
            (COL_RETURNED, &row.return_date_raw),
        ] {
            let Some(text) = raw.as_deref().and_then(normalize_date_text) else {
                continue;
            };
            for defect in detect_defects(&text) {
                issues.push(Issue::InvalidDate {
                    row_id,
                    field: field.to_string(),
                    raw_value: text.clone(),
                    reason: defect.reason().to_string(),
                });
            }
        }
    }

    // Member table completeness
    let member_fields: [(&str, fn(&RawMember) -> bool); 2] = [
        (COL_CUSTOMER_ID, |r: &RawMember| r.customer_id().is_none()),
        (COL_CUSTOMER_NAME, |r: &RawMember| r.name().is_none()),
    ];
    for (field, missing) in member_fields {
        push_missing(&mut issues, Table::Members, field, members.iter().filter(|r| missing(r)).count());
    }
    push_empty(&mut issues, Table::Members, members.iter().filter(|r| r.is_empty()).count());

    // Referential integrity
    let known: BTreeSet<i64> = members.iter().filter_map(RawMember::customer_id).collect();
    let gap: BTreeSet<i64> = loans
        .iter()
        .filter_map(RawLoan::customer_id)
        .filter(|id| !known.contains(id))
        .collect();
    if !gap.is_empty() {
        issues.push(Issue::ReferentialGap { member_ids: gap });
    }

    QualityReport {
        loan_rows: loans.len(),
        member_rows: members.len(),
        issues,
    }
}

fn push_missing(issues: &mut Vec<Issue>, table: Table, field: &str, count: usize) {
    if count > 0 {
        issues.push(Issue::MissingField {
            table,
            field: field.to_string(),
            count,
        });
    }
}

fn push_empty(issues: &mut Vec<Issue>, table: Table, count: usize) {
    if count > 0 {
        issues.push(Issue::EmptyRow { table, count });
    }
}

// ============================================================================
// TESTS
// ============================================================================
