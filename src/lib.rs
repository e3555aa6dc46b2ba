// Library Data Cleaning - Core Library
// Pipeline stages, store writer and report view, shared by the CLI and tests

pub mod audit;          // Audit Log - event sink for every stage
pub mod config;
pub mod data_quality;   // Data Quality Analyzer
pub mod dates;          // Date defect patches
pub mod db;             // Relational Store - SQLite + WAL
pub mod error;
pub mod export;         // Flat-file Writer
pub mod loader;
pub mod loans;          // Loan Table Cleaner
pub mod members;        // Member Table Cleaner
pub mod pipeline;
pub mod reconciliation; // Referential Reconciler
pub mod records;
pub mod report;         // Report View - log metrics + dataset summary

#[cfg(feature = "tui")]
pub mod ui;

// Re-export commonly used types
pub use audit::{AuditEvent, AuditLog, Level, Stage};
pub use config::PipelineConfig;
pub use data_quality::{analyze, Issue, QualityReport, Table};
pub use dates::{detect_defects, parse_dmy, repair_date_text, CleanedDate, DateDefect};
pub use db::{catalog_items, open_store, replace_all, setup_database, table_counts, CatalogItem, StoreSummary};
pub use error::StoreError;
pub use export::{read_cleaned_loans, read_cleaned_members, write_cleaned_loans, write_cleaned_members, LoanRow};
pub use loader::{load_loans, load_members, LoadedTable};
pub use loans::clean_loans;
pub use members::clean_members;
pub use pipeline::{process, run, CleanedTables, PipelineOutcome};
pub use reconciliation::{missing_member_ids, reconcile};
pub use records::{LoanRecord, LoanStatus, Member, RawLoan, RawMember};
pub use report::{DatasetSummary, ReportMetrics};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
