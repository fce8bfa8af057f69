//! Static table of scan tasks.
//!
//! Each entry pairs a [`RuleSet`] from [`mars_txs::presets`] with the
//! account whose history is paged and the CSV it produces.

use std::path::{Path, PathBuf};

use mars_txs::RuleSet;
use mars_txs::contracts::{APOLLO_MARS_UST_STRATEGY, MARS_STAKING, SPECTRUM_MARS_UST_FARM};
use mars_txs::presets;

/// Leading CSV columns shared by every task.
pub const KEY_COLUMNS: [&str; 3] = ["TxHash", "Block Height", "User Address"];

/// One scanning job.
#[derive(Debug, Clone, Copy)]
pub struct ScanTask {
    /// Short name used on the command line and in file names.
    pub name: &'static str,
    /// Account whose transaction history is paged.
    pub account: &'static str,
    /// CSV file name inside the data directory.
    pub output: &'static str,
    /// Labels of the two amount columns.
    pub columns: [&'static str; 2],
    /// How transactions are matched.
    pub rules: &'static RuleSet,
}

impl ScanTask {
    /// Full CSV header.
    #[must_use]
    pub const fn header(&self) -> [&'static str; 5] {
        let [tx, height, user] = KEY_COLUMNS;
        let [a, b] = self.columns;
        [tx, height, user, a, b]
    }

    /// Path of the result CSV.
    #[must_use]
    pub fn csv_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.output)
    }

    /// Path of the resume cursor.
    #[must_use]
    pub fn cursor_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.cursor.json", self.name))
    }

    /// Path of the distinct-users export.
    #[must_use]
    pub fn users_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}_users.json", self.name))
    }
}

/// All known scan tasks (single source of truth).
pub const ALL: &[ScanTask] = &[
    ScanTask {
        name: "staking",
        account: MARS_STAKING,
        output: "mars_staking_txs.csv",
        columns: ["MARS Claimed", "MARS Claimable"],
        rules: &presets::STAKING,
    },
    ScanTask {
        name: "apollo",
        account: APOLLO_MARS_UST_STRATEGY,
        output: "mars_apollocompounder_txs.csv",
        columns: ["LP token deposited", "LP token Withdrawn"],
        rules: &presets::APOLLO,
    },
    ScanTask {
        name: "spectrum",
        account: SPECTRUM_MARS_UST_FARM,
        output: "mars_speccompounder_txs.csv",
        columns: ["LP token deposited", "LP token Withdrawn"],
        rules: &presets::SPECTRUM,
    },
];

/// Look up a task by name.
#[must_use]
pub fn by_name(name: &str) -> Option<&'static ScanTask> {
    ALL.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_outputs_are_unique() {
        for (i, a) in ALL.iter().enumerate() {
            for b in ALL.iter().skip(i + 1) {
                assert_ne!(a.name, b.name, "duplicate task name");
                assert_ne!(a.output, b.output, "duplicate output file");
            }
        }
    }

    #[test]
    fn lookup_and_header() {
        let task = by_name("staking").unwrap();
        assert_eq!(
            task.header(),
            ["TxHash", "Block Height", "User Address", "MARS Claimed", "MARS Claimable"],
            "staking header"
        );
        assert!(by_name("unknown").is_none(), "unknown task");
        assert_eq!(
            task.cursor_path(Path::new("data")),
            Path::new("data/staking.cursor.json"),
            "cursor path"
        );
    }
}
