//! Decoding and aggregation of Mars-related Terra Classic transactions.
//!
//! Transactions come from the FCD `/v1/txs` endpoint ([`types`]). Contract
//! calls are matched against a declarative [`rules::RuleSet`] and each
//! transaction is folded into at most one [`aggregate::AggregateRow`].

pub mod aggregate;
pub mod contracts;
pub mod error;
pub mod presets;
pub mod rules;
pub mod types;

pub use aggregate::{AggregateRow, aggregate};
pub use error::{AggregateError, DecodeError};
pub use rules::RuleSet;
pub use types::{TxPage, TxRecord};
