// 🧹 Loan Table Cleaner
// Drops structurally invalid rows, repairs known date defects and derives the
// loan status fields. Never fails: malformed dates degrade to absent values.

use crate::audit::{AuditLog, Stage};
use crate::dates::CleanedDate;
use crate::records::{LoanRecord, LoanStatus, RawLoan, COL_CHECKOUT, COL_RETURNED};

/// Clean the loan table. Surviving rows keep their input order.
pub fn clean_loans(raw: &[RawLoan], days_allowed: i64, audit: &mut AuditLog) -> Vec<LoanRecord> {
    let non_empty: Vec<&RawLoan> = raw.iter().filter(|row| !row.is_empty()).collect();
    audit.info(
        Stage::CleanLoans,
        format!("Removed {} empty rows from books data", raw.len() - non_empty.len()),
    );

    let complete: Vec<(i64, &str, i64, &RawLoan)> = non_empty
        .iter()
        .copied()
        .filter_map(|row| Some((row.loan_id()?, row.title()?, row.customer_id()?, row)))
        .collect();
    audit.info(
        Stage::CleanLoans,
        format!(
            "Removed {} rows with missing Id, Books or Customer ID",
            non_empty.len() - complete.len()
        ),
    );

    let mut unparsed_checkout = 0usize;
    let mut unparsed_return = 0usize;

    let loans: Vec<LoanRecord> = complete
        .into_iter()
        .map(|(id, title, member_id, row)| {
            let checkout = CleanedDate::from_raw(row.checkout_date_raw.as_deref());
            let returned = CleanedDate::from_raw(row.return_date_raw.as_deref());

            for (field, date) in [(COL_CHECKOUT, &checkout), (COL_RETURNED, &returned)] {
                record_repair(audit, id, field, date);
            }
            unparsed_checkout += usize::from(checkout.is_unparseable());
            unparsed_return += usize::from(returned.is_unparseable());

            derive_record(id, title, member_id, row, checkout, returned, days_allowed)
        })
        .collect();

    for (field, count) in [(COL_CHECKOUT, unparsed_checkout), (COL_RETURNED, unparsed_return)] {
        if count > 0 {
            audit.warn(
                Stage::CleanLoans,
                format!("{} {} values could not be parsed", count, field),
            );
        }
    }

    let overdue = loans.iter().filter(|loan| loan.is_overdue()).count();
    audit.info_with(
        Stage::CleanLoans,
        format!("Found {} overdue loans", overdue),
        serde_json::json!({ "overdue": overdue, "days_allowed": days_allowed }),
    );
    audit.info(
        Stage::CleanLoans,
        format!("Books data cleaned: {} of {} rows kept", loans.len(), raw.len()),
    );

    loans
}

fn record_repair(audit: &mut AuditLog, id: i64, field: &str, date: &CleanedDate) {
    if date.applied.is_empty() {
        return;
    }

    let before = date.original.as_deref().unwrap_or_default();
    let after = date.text.as_deref().unwrap_or_default();
    let reasons: Vec<&str> = date.applied.iter().map(|d| d.reason()).collect();

    audit.info_with(
        Stage::CleanLoans,
        format!("Fixed invalid {} for loan {}: '{}' -> '{}'", field, id, before, after),
        serde_json::json!({ "loan_id": id, "field": field, "reasons": reasons }),
    );
}

/// Pure derivation of one cleaned record
fn derive_record(
    id: i64,
    title: &str,
    member_id: i64,
    row: &RawLoan,
    checkout: CleanedDate,
    returned: CleanedDate,
    days_allowed: i64,
) -> LoanRecord {
    let status = LoanStatus::derive(checkout.date, returned.date, days_allowed);

    LoanRecord {
        id,
        item_title: title.to_string(),
        checkout_text: checkout.text,
        return_text: returned.text,
        allowed_period_label: row.allowed_period_label.clone(),
        member_id,
        checkout_date: checkout.date,
        return_date: returned.date,
        status,
    }
}

// ============================================================================
// TESTS
// ============================================================================
