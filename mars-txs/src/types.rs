//! Transaction records as served by the Terra FCD `/v1/txs` endpoint.
//!
//! Only the fields the aggregator needs are modelled. Messages other than
//! contract executions keep their `value` as raw JSON.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::DecodeError;

/// Read a `u64` out of a JSON number or a numeric string.
///
/// Goes through [`Value`] rather than an untagged enum so numbers survive
/// serde_json's `arbitrary_precision` representation.
fn u64_from_value<E: serde::de::Error>(value: Value) -> Result<u64, E> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| E::custom(format!("{n} is not an unsigned 64-bit integer"))),
        Value::String(s) => s.parse::<u64>().map_err(E::custom),
        other => Err(E::custom(format!("expected number or string, got {other}"))),
    }
}

/// Deserialize a `u64` from either a JSON number or a JSON string.
fn deserialize_u64_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    u64_from_value(Value::deserialize(deserializer)?)
}

/// Same as [`deserialize_u64_or_string`], but `null` maps to `None`.
fn deserialize_opt_u64_or_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        value => u64_from_value(value).map(Some),
    }
}

/// One page of `/v1/txs?offset=..&account=..&limit=..`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxPage {
    /// Transactions on this page, newest first.
    #[serde(default)]
    pub txs: Vec<TxRecord>,

    /// Pagination token for the following page.
    #[serde(default, deserialize_with = "deserialize_opt_u64_or_string")]
    pub next: Option<u64>,
}

impl TxPage {
    /// Offset of the following page, or `None` when this is the last one.
    ///
    /// A zero token would restart the listing, so it also ends pagination.
    #[must_use]
    pub fn next_offset(&self) -> Option<u64> {
        self.next.filter(|n| *n != 0)
    }
}

/// A single indexed transaction.
#[derive(Debug, Clone, Deserialize)]
pub struct TxRecord {
    /// Transaction hash.
    pub txhash: String,

    /// Block height the transaction was included in.
    #[serde(deserialize_with = "deserialize_u64_or_string")]
    pub height: u64,

    /// Per-message execution logs. Absent for failed transactions.
    #[serde(default)]
    pub logs: Option<Vec<TxLog>>,

    /// The signed transaction body.
    pub tx: StdTx,
}

impl TxRecord {
    /// Logs of a successful transaction; `None` when absent or empty.
    #[must_use]
    pub fn success_logs(&self) -> Option<&[TxLog]> {
        self.logs.as_deref().filter(|logs| !logs.is_empty())
    }

    /// Messages in execution order.
    #[must_use]
    pub fn messages(&self) -> &[Msg] {
        &self.tx.value.msg
    }
}

/// Amino-style `core/StdTx` wrapper.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StdTx {
    /// Transaction contents.
    #[serde(default)]
    pub value: StdTxValue,
}

/// Contents of a [`StdTx`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StdTxValue {
    /// Messages in execution order.
    #[serde(default)]
    pub msg: Vec<Msg>,
}

/// A transaction message tagged by its amino type.
#[derive(Debug, Clone, Deserialize)]
pub struct Msg {
    /// Message kind, e.g. `"wasm/MsgExecuteContract"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Kind-specific body.
    #[serde(default)]
    pub value: Value,
}

impl Msg {
    /// Interpret the body as a contract execution.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Message`] if the body lacks the execution fields.
    pub fn execute_contract(&self) -> Result<MsgExecuteContract, DecodeError> {
        MsgExecuteContract::deserialize(&self.value).map_err(|source| DecodeError::Message {
            kind: self.kind.clone(),
            source,
        })
    }
}

/// Body of a `wasm/MsgExecuteContract` message.
#[derive(Debug, Clone, Deserialize)]
pub struct MsgExecuteContract {
    /// Account that signed the message.
    pub sender: String,

    /// Contract being executed.
    pub contract: String,

    /// Funds attached to the call.
    #[serde(default)]
    pub coins: Vec<Coin>,

    /// The call payload.
    pub execute_msg: ExecuteMsg,
}

/// A native coin amount.
#[derive(Debug, Clone, Deserialize)]
pub struct Coin {
    /// Denomination, e.g. `uusd`.
    pub denom: String,
    /// Amount in the smallest unit.
    pub amount: String,
}

/// The two encodings FCD uses for `execute_msg`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExecuteMsg {
    /// Already-decoded JSON object.
    Inline(Map<String, Value>),
    /// Base64 of the JSON object.
    Encoded(String),
}

impl ExecuteMsg {
    /// Decode into a [`Payload`] regardless of representation.
    ///
    /// # Errors
    ///
    /// Returns an error if an encoded payload is not base64 of a JSON object.
    pub fn decode(&self) -> Result<Payload, DecodeError> {
        match self {
            Self::Inline(map) => Ok(Payload(map.clone())),
            Self::Encoded(text) => {
                let bytes = BASE64.decode(text.trim())?;
                let map = serde_json::from_slice(&bytes).map_err(DecodeError::Json)?;
                Ok(Payload(map))
            }
        }
    }
}

/// A decoded contract call: a JSON object keyed by operation name,
/// e.g. `{"bond": {"contract": "terra1..."}}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload(pub Map<String, Value>);

impl Payload {
    /// Body of `operation`, if the payload invokes it.
    #[must_use]
    pub fn operation(&self, operation: &str) -> Option<&Value> {
        self.0.get(operation)
    }

    /// Name of the first operation key.
    #[must_use]
    pub fn operation_name(&self) -> Option<&str> {
        self.0.keys().next().map(String::as_str)
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Execution log of one message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TxLog {
    /// Position of the message this log belongs to.
    #[serde(default)]
    pub msg_index: Option<u64>,

    /// Events emitted while executing the message.
    #[serde(default)]
    pub events: Vec<Event>,
}

impl TxLog {
    /// Value of the first `key` attribute across all events of `event_type`.
    #[must_use]
    pub fn attribute(&self, event_type: &str, key: &str) -> Option<&str> {
        self.events
            .iter()
            .filter(|e| e.kind == event_type)
            .flat_map(|e| &e.attributes)
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// A typed group of attributes.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event type, e.g. `from_contract`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Key/value pairs in emission order.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

/// A single event attribute.
#[derive(Debug, Clone, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value (always a string on the wire).
    #[serde(default)]
    pub value: String,
}
