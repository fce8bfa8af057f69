//! Declarative matching rules for contract calls.
//!
//! A [`RuleSet`] is an ordered list of [`Rule`]s. The first rule whose
//! operation, target contract and body conditions all hold decides which
//! running total the message feeds and where its amount comes from.

use alloy::primitives::U256;
use serde_json::Value;

use crate::error::DecodeError;
use crate::types::Payload;

/// Message kind of a CosmWasm contract execution.
pub const EXECUTE_CONTRACT: &str = "wasm/MsgExecuteContract";

/// Event type carrying attributes emitted by contracts.
pub const FROM_CONTRACT: &str = "from_contract";

/// Which of the two running totals a rule feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// First amount column (claimed, deposited).
    A,
    /// Second amount column (claimable, withdrawn).
    B,
}

/// Where a matched message's amount is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSource {
    /// A field of the operation body, e.g. `send.amount`.
    Payload {
        /// Field name inside the operation body.
        field: &'static str,
    },
    /// An attribute of the message's log entry, e.g. minted `share`.
    Event {
        /// Attribute key inside the rule set's event type.
        attribute: &'static str,
    },
}

/// Expected value of an operation body field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Exact string equality.
    Str(&'static str),
    /// Integer equality; the field may be a JSON number or a numeric string.
    Int(u64),
}

/// A condition on one field of the operation body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    /// Field name inside the operation body.
    pub field: &'static str,
    /// Expected value.
    pub expect: Expect,
}

impl Condition {
    /// `body[field] == value` as strings.
    #[must_use]
    pub const fn str(field: &'static str, value: &'static str) -> Self {
        Self {
            field,
            expect: Expect::Str(value),
        }
    }

    /// `body[field] == value` as integers.
    #[must_use]
    pub const fn int(field: &'static str, value: u64) -> Self {
        Self {
            field,
            expect: Expect::Int(value),
        }
    }

    fn holds(&self, body: &Value) -> bool {
        let Some(actual) = body.get(self.field) else {
            return false;
        };
        match (self.expect, actual) {
            (Expect::Str(want), Value::String(s)) => s == want,
            (Expect::Int(want), Value::Number(n)) => n.as_u64() == Some(want),
            (Expect::Int(want), Value::String(s)) => s.parse::<u64>().ok() == Some(want),
            _ => false,
        }
    }
}

/// One recognised operation shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Top-level payload key, e.g. `"claim"`.
    pub operation: &'static str,
    /// Required value of the message's `contract` field, if any.
    pub contract: Option<&'static str>,
    /// Conditions on the operation body.
    pub conditions: &'static [Condition],
    /// Total fed by this rule.
    pub bucket: Bucket,
    /// Amount extraction.
    pub source: AmountSource,
}

impl Rule {
    /// Return the operation body if this rule matches a call to `contract`.
    ///
    /// A `null` body counts as an absent operation.
    #[must_use]
    pub fn matches<'a>(&self, contract: &str, payload: &'a Payload) -> Option<&'a Value> {
        let body = self.target(contract, payload)?;
        self.conditions.iter().all(|c| c.holds(body)).then_some(body)
    }

    /// Operation body if `payload` calls this rule's operation on its
    /// contract, ignoring body conditions.
    fn target<'a>(&self, contract: &str, payload: &'a Payload) -> Option<&'a Value> {
        if self.contract.is_some_and(|c| c != contract) {
            return None;
        }
        payload.operation(self.operation).filter(|body| !body.is_null())
    }
}

/// An ordered rule list plus how unmatched calls are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet {
    /// Message kind considered at all.
    pub execute_kind: &'static str,
    /// Event type searched by [`AmountSource::Event`] rules.
    pub event_type: &'static str,
    /// Rules in priority order.
    pub rules: &'static [Rule],
    /// Log calls that match no rule.
    pub report_unmatched: bool,
    /// Operations never reported even when `report_unmatched` is set.
    pub quiet: &'static [&'static str],
}

impl RuleSet {
    /// First rule matching a call to `contract` with `payload`, and its body.
    #[must_use]
    pub fn find<'a>(&self, contract: &str, payload: &'a Payload) -> Option<(&Rule, &'a Value)> {
        self.rules
            .iter()
            .find_map(|rule| rule.matches(contract, payload).map(|body| (rule, body)))
    }

    /// Whether an unmatched call to `contract` should be surfaced in the log.
    ///
    /// Quiet operations are never reported, nor are calls that hit a rule's
    /// operation and contract but fail its body conditions.
    #[must_use]
    pub fn reports(&self, contract: &str, payload: &Payload) -> bool {
        self.report_unmatched
            && !self.quiet.iter().any(|op| payload.operation(op).is_some())
            && !self.rules.iter().any(|rule| rule.target(contract, payload).is_some())
    }
}

/// Parse an unsigned decimal amount from a string.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidAmount`] for anything but decimal digits.
pub fn parse_amount(field: &str, value: &str) -> Result<U256, DecodeError> {
    let invalid = || DecodeError::InvalidAmount {
        field: field.to_owned(),
        value: value.to_owned(),
    };
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    U256::from_str_radix(value, 10).map_err(|_| invalid())
}

/// Parse an amount from a JSON string or non-negative integer.
///
/// # Errors
///
/// Returns [`DecodeError::InvalidAmount`] if the value is missing or not an
/// unsigned integer.
pub fn parse_amount_value(field: &str, value: Option<&Value>) -> Result<U256, DecodeError> {
    match value {
        Some(Value::String(s)) => parse_amount(field, s),
        Some(Value::Number(n)) => parse_amount(field, &n.to_string()),
        other => Err(DecodeError::InvalidAmount {
            field: field.to_owned(),
            value: other.map_or_else(|| "<missing>".to_owned(), Value::to_string),
        }),
    }
}
