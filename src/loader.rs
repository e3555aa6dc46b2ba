// 📂 Loader - source CSV files into raw rows

use crate::records::{RawLoan, RawMember};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Rows of one source file plus provenance
#[derive(Debug, Clone)]
pub struct LoadedTable<T> {
    pub rows: Vec<T>,
    pub source: PathBuf,
    /// SHA-256 of the file bytes, hex encoded
    pub sha256: String,
}

impl<T> LoadedTable<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn load_loans(path: &Path) -> Result<LoadedTable<RawLoan>> {
    load_table(path)
}

pub fn load_members(path: &Path) -> Result<LoadedTable<RawMember>> {
    load_table(path)
}

/// Parse CSV text with a header row. Missing columns load as absent cells and
/// extra columns are ignored.
pub fn parse_rows<T: DeserializeOwned>(bytes: &[u8], label: &str) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for (line_num, result) in reader.deserialize::<T>().enumerate() {
        let row = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, label)
        })?;
        rows.push(row);
    }

    Ok(rows)
}

fn load_table<T: DeserializeOwned>(path: &Path) -> Result<LoadedTable<T>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let sha256 = format!("{:x}", Sha256::digest(&bytes));
    let rows = parse_rows(&bytes, &path.display().to_string())?;

    Ok(LoadedTable {
        rows,
        source: path.to_path_buf(),
        sha256,
    })
}

// ============================================================================
// TESTS
// ============================================================================
