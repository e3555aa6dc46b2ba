// 🗄️ Relational Store - full replace of members, catalog items and loans
// One transaction per run. Nothing is kept between runs: the previous
// contents are deleted before the current run's rows go in.

use crate::audit::{AuditLog, Stage};
use crate::dates::parse_dmy;
use crate::error::StoreError;
use crate::records::{LoanRecord, Member};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Store date format for checkout/return columns
const STORE_DATE_FORMAT: &str = "%Y-%m-%d";

/// A distinct book title; exists only at persistence time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub item_id: i64,
    pub title: String,
}

/// Rows written by one full replace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreSummary {
    pub members: usize,
    pub catalog_items: usize,
    pub loans: usize,
}

pub fn open_store(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path).map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<(), StoreError> {
    // WAL for crash recovery; in-memory databases report "memory"
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(StoreError::Schema)?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(StoreError::Schema)?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS members (
            member_id INTEGER PRIMARY KEY,
            member_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS catalog_items (
            item_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS loans (
            loan_id INTEGER PRIMARY KEY,
            item_id INTEGER NOT NULL REFERENCES catalog_items(item_id),
            member_id INTEGER NOT NULL REFERENCES members(member_id),
            checkout_date TEXT,
            return_date TEXT,
            days_allowed INTEGER DEFAULT 14,
            days_borrowed INTEGER,
            is_overdue INTEGER DEFAULT 0,
            days_overdue INTEGER DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_loans_member ON loans(member_id);
        CREATE INDEX IF NOT EXISTS idx_loans_item ON loans(item_id);",
    )
    .map_err(StoreError::Schema)?;

    Ok(())
}

/// Distinct titles in first-occurrence order of the cleaned loan table,
/// numbered from 1
pub fn catalog_items(loans: &[LoanRecord]) -> Vec<CatalogItem> {
    let mut seen: HashMap<&str, i64> = HashMap::new();
    let mut items = Vec::new();

    for loan in loans {
        if seen.contains_key(loan.item_title.as_str()) {
            continue;
        }
        let item_id = items.len() as i64 + 1;
        seen.insert(loan.item_title.as_str(), item_id);
        items.push(CatalogItem {
            item_id,
            title: loan.item_title.clone(),
        });
    }

    items
}

/// Replace the whole store with this run's tables. On any failure the
/// transaction rolls back and the previous contents remain.
pub fn replace_all(
    conn: &mut Connection,
    loans: &[LoanRecord],
    members: &[Member],
    audit: &mut AuditLog,
) -> Result<StoreSummary, StoreError> {
    let tx = conn.transaction().map_err(StoreError::Begin)?;

    // Dependents before dependencies
    for table in ["loans", "catalog_items", "members"] {
        tx.execute(&format!("DELETE FROM {}", table), [])
            .map_err(|source| StoreError::Clear { table, source })?;
    }

    {
        let mut stmt = tx
            .prepare("INSERT INTO members (member_id, member_name) VALUES (?1, ?2)")
            .map_err(|source| StoreError::Insert { table: "members", source })?;
        for member in members {
            stmt.execute(params![member.member_id, member.member_name])
                .map_err(|source| StoreError::Insert { table: "members", source })?;
        }
    }

    let items = catalog_items(loans);
    let item_ids: HashMap<&str, i64> = items
        .iter()
        .map(|item| (item.title.as_str(), item.item_id))
        .collect();

    {
        let mut stmt = tx
            .prepare("INSERT INTO catalog_items (item_id, title) VALUES (?1, ?2)")
            .map_err(|source| StoreError::Insert { table: "catalog_items", source })?;
        for item in &items {
            stmt.execute(params![item.item_id, item.title])
                .map_err(|source| StoreError::Insert { table: "catalog_items", source })?;
        }
    }

    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO loans (
                    loan_id, item_id, member_id, checkout_date, return_date,
                    days_allowed, days_borrowed, is_overdue, days_overdue
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(|source| StoreError::Insert { table: "loans", source })?;

        for loan in loans {
            let item_id = *item_ids
                .get(loan.item_title.as_str())
                .ok_or_else(|| StoreError::UnknownTitle(loan.item_title.clone()))?;

            stmt.execute(params![
                loan.id,
                item_id,
                loan.member_id,
                store_date(loan.checkout_text.as_deref()),
                store_date(loan.return_text.as_deref()),
                loan.days_allowed(),
                loan.days_borrowed(),
                loan.is_overdue(),
                loan.days_overdue(),
            ])
            .map_err(|source| StoreError::Insert { table: "loans", source })?;
        }
    }

    tx.commit().map_err(StoreError::Commit)?;

    let summary = StoreSummary {
        members: members.len(),
        catalog_items: items.len(),
        loans: loans.len(),
    };

    audit.info(
        Stage::WriteStore,
        format!("Inserted {} customers into database", summary.members),
    );
    audit.info(
        Stage::WriteStore,
        format!("Inserted {} books into database", summary.catalog_items),
    );
    audit.info_with(
        Stage::WriteStore,
        format!("Inserted {} loans into database", summary.loans),
        serde_json::to_value(summary).unwrap_or(serde_json::Value::Null),
    );

    Ok(summary)
}

/// Re-derive a store date from cleaned text; unparseable text becomes NULL
fn store_date(text: Option<&str>) -> Option<String> {
    text.and_then(parse_dmy)
        .map(|date| date.format(STORE_DATE_FORMAT).to_string())
}

/// Row counts of the three tables
pub fn table_counts(conn: &Connection) -> Result<StoreSummary, StoreError> {
    let count = |table: &'static str| -> Result<usize, StoreError> {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get::<_, i64>(0)
        })
        .map(|n| n as usize)
        .map_err(|source| StoreError::Query { table, source })
    };

    Ok(StoreSummary {
        members: count("members")?,
        catalog_items: count("catalog_items")?,
        loans: count("loans")?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::LoanStatus;

    fn create_test_loan(id: i64, title: &str, member_id: i64, checkout: &str, returned: &str) -> LoanRecord {
        let checkout_date = parse_dmy(checkout);
        let return_date = parse_dmy(returned);
        LoanRecord {
            id,
            item_title: title.to_string(),
            checkout_text: Some(checkout.to_string()),
            return_text: Some(returned.to_string()),
            allowed_period_label: Some("2 weeks".to_string()),
            member_id,
            checkout_date,
            return_date,
            status: LoanStatus::derive(checkout_date, return_date, 14),
        }
    }

    fn test_store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn sample() -> (Vec<LoanRecord>, Vec<Member>) {
        let loans = vec![
            create_test_loan(1, "Dune", 1, "01/01/2023", "20/01/2023"),
            create_test_loan(2, "Emma", 2, "05/01/2023", "not returned"),
            create_test_loan(3, "Dune", 2, "10/01/2023", "12/01/2023"),
        ];
        let members = vec![Member::new(1, "Alice"), Member::new(2, "Bob")];
        (loans, members)
    }

    #[test]
    fn test_catalog_first_occurrence_order() {
        let (loans, _) = sample();
        let items = catalog_items(&loans);

        assert_eq!(
            items,
            vec![
                CatalogItem { item_id: 1, title: "Dune".to_string() },
                CatalogItem { item_id: 2, title: "Emma".to_string() },
            ]
        );
    }

    #[test]
    fn test_replace_all_inserts_everything() {
        let mut conn = test_store();
        let (loans, members) = sample();
        let mut audit = AuditLog::new();

        let summary = replace_all(&mut conn, &loans, &members, &mut audit).unwrap();

        assert_eq!(summary, StoreSummary { members: 2, catalog_items: 2, loans: 3 });
        assert_eq!(table_counts(&conn).unwrap(), summary);

        let (item_id, checkout, returned, overdue): (i64, Option<String>, Option<String>, bool) = conn
            .query_row(
                "SELECT item_id, checkout_date, return_date, is_overdue FROM loans WHERE loan_id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(item_id, 1);
        assert_eq!(checkout.as_deref(), Some("2023-01-01"));
        assert_eq!(returned.as_deref(), Some("2023-01-20"));
        assert!(overdue);

        // unparseable return text is stored as NULL
        let returned: Option<String> = conn
            .query_row("SELECT return_date FROM loans WHERE loan_id = 2", [], |row| row.get(0))
            .unwrap();
        assert_eq!(returned, None);

        assert!(audit
            .messages(Stage::WriteStore)
            .contains(&"Inserted 3 loans into database"));
    }

    #[test]
    fn test_replace_all_discards_previous_contents() {
        let mut conn = test_store();
        let (loans, members) = sample();
        replace_all(&mut conn, &loans, &members, &mut AuditLog::new()).unwrap();

        let second_loans = vec![create_test_loan(9, "Ulysses", 3, "01/02/2023", "03/02/2023")];
        let second_members = vec![Member::new(3, "Cara")];
        replace_all(&mut conn, &second_loans, &second_members, &mut AuditLog::new()).unwrap();

        assert_eq!(
            table_counts(&conn).unwrap(),
            StoreSummary { members: 1, catalog_items: 1, loans: 1 }
        );
        let item_id: i64 = conn
            .query_row("SELECT item_id FROM catalog_items WHERE title = 'Ulysses'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(item_id, 1);
    }

    #[test]
    fn test_failure_rolls_back_everything() {
        let mut conn = test_store();
        let (loans, members) = sample();
        replace_all(&mut conn, &loans, &members, &mut AuditLog::new()).unwrap();

        // duplicate loan id violates the primary key on the last insert
        let bad_loans = vec![
            create_test_loan(7, "Dune", 1, "01/01/2023", "02/01/2023"),
            create_test_loan(7, "Emma", 1, "01/01/2023", "02/01/2023"),
        ];
        let result = replace_all(&mut conn, &bad_loans, &[Member::new(1, "Alice")], &mut AuditLog::new());

        assert!(matches!(result, Err(StoreError::Insert { table: "loans", .. })));
        assert_eq!(
            table_counts(&conn).unwrap(),
            StoreSummary { members: 2, catalog_items: 2, loans: 3 }
        );
    }

    #[test]
    fn test_dangling_member_is_rejected() {
        let mut conn = test_store();
        let loans = vec![create_test_loan(1, "Dune", 42, "01/01/2023", "02/01/2023")];

        let result = replace_all(&mut conn, &loans, &[Member::new(1, "Alice")], &mut AuditLog::new());

        assert!(result.is_err());
        assert_eq!(table_counts(&conn).unwrap(), StoreSummary::default());

        println!("✅ Store rollback test PASSED");
    }
}
