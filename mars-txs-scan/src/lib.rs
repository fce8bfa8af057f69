//! Mars transaction scanner library.
//!
//! Pages through the FCD transaction history of the Mars staking contract
//! and the MARS-UST compounders, folds each transaction into per-task
//! totals and stores them as CSV files with a resume cursor.

pub mod config;
pub mod cursor;
pub mod fetcher;
pub mod table;
pub mod tasks;
pub mod users;
