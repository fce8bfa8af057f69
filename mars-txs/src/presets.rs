//! Rule sets for the Mars staking contract and the MARS-UST compounders.

use crate::contracts::{
    APOLLO_ENTRY, APOLLO_MARS_UST_STRATEGY_ID, ASTROPORT_MARS_UST_LP, MARS_STAKING, SPECTRUM_ENTRY,
    SPECTRUM_MARS_UST_FARM, XMARS_TOKEN,
};
use crate::rules::{AmountSource, Bucket, Condition, EXECUTE_CONTRACT, FROM_CONTRACT, Rule, RuleSet};

/// Staking: `A` = MARS claimed, `B` = MARS that became claimable by burning xMARS.
pub const STAKING: RuleSet = RuleSet {
    execute_kind: EXECUTE_CONTRACT,
    event_type: FROM_CONTRACT,
    rules: &[
        Rule {
            operation: "claim",
            contract: Some(MARS_STAKING),
            conditions: &[],
            bucket: Bucket::A,
            source: AmountSource::Event {
                attribute: "mars_claimed",
            },
        },
        Rule {
            operation: "send",
            contract: Some(XMARS_TOKEN),
            conditions: &[Condition::str("contract", MARS_STAKING)],
            bucket: Bucket::B,
            source: AmountSource::Event {
                attribute: "mars_claimable",
            },
        },
    ],
    report_unmatched: false,
    quiet: &[],
};

/// Apollo MARS-UST strategy: `A` = LP shares deposited, `B` = LP withdrawn.
pub const APOLLO: RuleSet = RuleSet {
    execute_kind: EXECUTE_CONTRACT,
    event_type: FROM_CONTRACT,
    rules: &[
        Rule {
            operation: "withdraw_from_strategy",
            contract: Some(APOLLO_ENTRY),
            conditions: &[Condition::int("strategy_id", APOLLO_MARS_UST_STRATEGY_ID)],
            bucket: Bucket::B,
            source: AmountSource::Payload { field: "amount" },
        },
        Rule {
            operation: "zap_into_strategy",
            contract: Some(APOLLO_ENTRY),
            conditions: &[Condition::int("strategy_id", APOLLO_MARS_UST_STRATEGY_ID)],
            bucket: Bucket::A,
            source: AmountSource::Event { attribute: "share" },
        },
        Rule {
            operation: "send",
            contract: Some(ASTROPORT_MARS_UST_LP),
            conditions: &[Condition::str("contract", APOLLO_ENTRY)],
            bucket: Bucket::A,
            source: AmountSource::Payload { field: "amount" },
        },
    ],
    report_unmatched: false,
    quiet: &[],
};

/// Spectrum MARS-UST farm: `A` = LP deposited, `B` = LP withdrawn.
///
/// Unmatched calls are reported, except routine farm maintenance.
pub const SPECTRUM: RuleSet = RuleSet {
    execute_kind: EXECUTE_CONTRACT,
    event_type: FROM_CONTRACT,
    rules: &[
        Rule {
            operation: "unbond",
            contract: Some(SPECTRUM_MARS_UST_FARM),
            conditions: &[],
            bucket: Bucket::B,
            source: AmountSource::Payload { field: "amount" },
        },
        Rule {
            operation: "zap_to_bond",
            contract: Some(SPECTRUM_ENTRY),
            conditions: &[Condition::str("contract", SPECTRUM_MARS_UST_FARM)],
            bucket: Bucket::A,
            source: AmountSource::Event { attribute: "share" },
        },
        Rule {
            operation: "bond",
            contract: Some(SPECTRUM_ENTRY),
            conditions: &[Condition::str("contract", SPECTRUM_MARS_UST_FARM)],
            bucket: Bucket::A,
            source: AmountSource::Event { attribute: "share" },
        },
        Rule {
            operation: "send",
            contract: Some(ASTROPORT_MARS_UST_LP),
            conditions: &[Condition::str("contract", SPECTRUM_MARS_UST_FARM)],
            bucket: Bucket::A,
            source: AmountSource::Payload { field: "amount" },
        },
    ],
    report_unmatched: true,
    quiet: &["withdraw", "mint", "compound", "increase_allowance"],
};
