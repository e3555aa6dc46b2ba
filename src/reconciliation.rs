// ⚖️ Reconciliation - no loan may reference an unknown member
// Every member id used by a cleaned loan is guaranteed a member record;
// gaps are filled with placeholder members.

use crate::audit::{AuditLog, Stage};
use crate::records::{LoanRecord, Member};
use std::collections::BTreeSet;

/// Member ids referenced by loans but absent from the member table, ascending
pub fn missing_member_ids(members: &[Member], loans: &[LoanRecord]) -> BTreeSet<i64> {
    let known: BTreeSet<i64> = members.iter().map(|m| m.member_id).collect();

    loans
        .iter()
        .map(|loan| loan.member_id)
        .filter(|id| !known.contains(id))
        .collect()
}

/// Add a placeholder member for every dangling loan reference, then order
/// the member table by id (stable, so duplicate ids keep input order).
pub fn reconcile(
    mut members: Vec<Member>,
    loans: &[LoanRecord],
    audit: &mut AuditLog,
) -> Vec<Member> {
    let missing = missing_member_ids(&members, loans);

    if missing.is_empty() {
        audit.info(Stage::Reconcile, "All customer IDs are valid!");
    } else {
        audit.warn_with(
            Stage::Reconcile,
            format!("Found {} missing customer IDs: {:?}", missing.len(), missing),
            serde_json::json!({ "missing_ids": missing }),
        );

        for id in &missing {
            members.push(Member::placeholder(*id));
            audit.info(Stage::Reconcile, format!("Added placeholder customer {}", id));
        }
    }

    members.sort_by_key(|m| m.member_id);
    members
}

// ============================================================================
// TESTS
// ============================================================================
