// 🧹 Member Table Cleaner
// Structural checks only; member data has no known repairable defects.

use crate::audit::{AuditLog, Stage};
use crate::records::{Member, RawMember};

pub fn clean_members(raw: &[RawMember], audit: &mut AuditLog) -> Vec<Member> {
    let non_empty: Vec<&RawMember> = raw.iter().filter(|row| !row.is_empty()).collect();
    audit.info(
        Stage::CleanMembers,
        format!("Removed {} empty rows from customers data", raw.len() - non_empty.len()),
    );

    let members: Vec<Member> = non_empty
        .iter()
        .filter_map(|row| Some(Member::new(row.customer_id()?, row.name()?)))
        .collect();
    audit.info(
        Stage::CleanMembers,
        format!(
            "Removed {} rows with missing Customer ID or Customer Name",
            non_empty.len() - members.len()
        ),
    );
    audit.info(
        Stage::CleanMembers,
        format!("Customers data cleaned: {} of {} rows kept", members.len(), raw.len()),
    );

    members
}
