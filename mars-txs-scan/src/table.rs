//! In-memory result table and its CSV file.
//!
//! The table only grows. Every write replaces the whole file through a
//! temp file and rename, so a crash never leaves a half-written CSV.

use std::path::Path;

use alloy::primitives::U256;
use anyhow::{Context, Result, bail};
use mars_txs::AggregateRow;

use crate::tasks::ScanTask;

/// Ordered rows of one scan task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    header: [&'static str; 5],
    rows: Vec<AggregateRow>,
}

impl ResultTable {
    /// Empty table with `task`'s header.
    #[must_use]
    pub const fn new(task: &ScanTask) -> Self {
        Self {
            header: task.header(),
            rows: Vec::new(),
        }
    }

    /// Load a table previously written for `task`.
    ///
    /// Returns an empty table if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, its header differs from
    /// the task's, or a row is malformed.
    pub fn read(path: &Path, task: &ScanTask) -> Result<Self> {
        let mut table = Self::new(task);
        if !path.exists() {
            return Ok(table);
        }

        let mut reader =
            csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;
        let found = reader
            .headers()
            .with_context(|| format!("reading header of {}", path.display()))?;
        if found.iter().ne(table.header) {
            bail!(
                "{} has header {:?}, expected {:?}",
                path.display(),
                found,
                table.header
            );
        }

        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("reading {}", path.display()))?;
            let row = parse_row(&record)
                .with_context(|| format!("{}: row {}", path.display(), line + 1))?;
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Append a row.
    pub fn push(&mut self, row: AggregateRow) {
        self.rows.push(row);
    }

    /// Drop rows beyond `len`.
    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in insertion order.
    #[must_use]
    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    /// Labels of the two amount columns.
    #[must_use]
    pub const fn amount_columns(&self) -> [&'static str; 2] {
        [self.header[3], self.header[4]]
    }

    /// Rewrite `path` with the full table.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("csv.tmp");
        let mut writer =
            csv::Writer::from_path(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        writer.write_record(self.header)?;
        for row in &self.rows {
            let height = row.height.to_string();
            let amount_a = row.amount_a.to_string();
            let amount_b = row.amount_b.to_string();
            writer.write_record([
                row.txhash.as_str(),
                height.as_str(),
                row.sender.as_str(),
                amount_a.as_str(),
                amount_b.as_str(),
            ])?;
        }
        writer
            .flush()
            .with_context(|| format!("flushing {}", tmp.display()))?;
        drop(writer);

        std::fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    }
}

fn parse_row(record: &csv::StringRecord) -> Result<AggregateRow> {
    let [txhash, height, sender, a, b] = [0, 1, 2, 3, 4].map(|i| record.get(i));
    let (Some(txhash), Some(height), Some(sender), Some(a), Some(b)) = (txhash, height, sender, a, b)
    else {
        bail!("expected 5 columns, found {}", record.len());
    };
    Ok(AggregateRow {
        txhash: txhash.to_owned(),
        height: height.parse().with_context(|| format!("block height {height:?}"))?,
        sender: sender.to_owned(),
        amount_a: parse_u256(a)?,
        amount_b: parse_u256(b)?,
    })
}

fn parse_u256(value: &str) -> Result<U256> {
    U256::from_str_radix(value, 10).with_context(|| format!("amount {value:?}"))
}
