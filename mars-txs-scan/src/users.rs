//! Distinct user export.
//!
//! Collapses a task's CSV into one entry per user address (first-seen
//! order) with summed amounts, the input for later balance snapshots.

use std::collections::HashMap;
use std::path::Path;

use alloy::primitives::U256;
use anyhow::{Context, Result};
use serde::{Serialize, Serializer};

use crate::table::ResultTable;
use crate::tasks::ScanTask;

fn as_decimal<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// Totals of one user across all their rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserTotal {
    /// User address.
    pub address: String,
    /// Number of rows attributed to the user.
    pub txs: usize,
    /// Sum of the first amount column.
    #[serde(serialize_with = "as_decimal")]
    pub amount_a: U256,
    /// Sum of the second amount column.
    #[serde(serialize_with = "as_decimal")]
    pub amount_b: U256,
}

/// Contents of `<task>_users.json`.
#[derive(Debug, Clone, Serialize)]
pub struct UsersFile {
    /// Task name.
    pub task: &'static str,
    /// Labels of `amount_a` and `amount_b`.
    pub columns: [&'static str; 2],
    /// One entry per distinct address.
    pub users: Vec<UserTotal>,
}

/// Group `table`'s rows by sender, keeping first-seen order.
///
/// # Errors
///
/// Returns an error if a user's total exceeds 256 bits.
pub fn collect(table: &ResultTable) -> Result<Vec<UserTotal>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut users: Vec<UserTotal> = Vec::new();

    for row in table.rows() {
        let slot = *index.entry(row.sender.as_str()).or_insert_with(|| {
            users.push(UserTotal {
                address: row.sender.clone(),
                txs: 0,
                amount_a: U256::ZERO,
                amount_b: U256::ZERO,
            });
            users.len() - 1
        });
        let Some(user) = users.get_mut(slot) else {
            continue;
        };
        user.txs += 1;
        user.amount_a = user
            .amount_a
            .checked_add(row.amount_a)
            .with_context(|| format!("total overflow for {}", row.sender))?;
        user.amount_b = user
            .amount_b
            .checked_add(row.amount_b)
            .with_context(|| format!("total overflow for {}", row.sender))?;
    }
    Ok(users)
}

/// Read `task`'s CSV from `data_dir` and write its users JSON next to it.
///
/// Returns the number of distinct users.
///
/// # Errors
///
/// Returns an error if the CSV is missing or malformed, or the JSON cannot
/// be written.
pub fn export(task: &ScanTask, data_dir: &Path) -> Result<usize> {
    let csv_path = task.csv_path(data_dir);
    if !csv_path.exists() {
        anyhow::bail!("{} not found, run `scan --task {}` first", csv_path.display(), task.name);
    }
    let table = ResultTable::read(&csv_path, task)?;
    let file = UsersFile {
        task: task.name,
        columns: table.amount_columns(),
        users: collect(&table)?,
    };

    let path = task.users_path(data_dir);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_string_pretty(&file)?)
        .with_context(|| format!("writing {}", tmp.display()))?;
    std::fs::rename(&tmp, &path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;

    tracing::info!(
        task = task.name,
        rows = table.len(),
        users = file.users.len(),
        path = %path.display(),
        "users exported"
    );
    Ok(file.users.len())
}
