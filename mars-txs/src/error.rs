//! Error types for transaction decoding and aggregation.

/// Why a single message could not be decoded or accounted for.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The message body does not have the shape its kind promises.
    #[error("malformed {kind} message")]
    Message {
        /// Message kind.
        kind: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// An encoded `execute_msg` is not valid base64.
    #[error("execute_msg is not valid base64")]
    Base64(#[from] base64::DecodeError),

    /// A decoded `execute_msg` is not a JSON object.
    #[error("execute_msg is not a JSON object")]
    Json(#[source] serde_json::Error),

    /// An amount field is missing or not an unsigned integer.
    #[error("`{field}` is not an unsigned integer: {value}")]
    InvalidAmount {
        /// Payload field or event attribute that was read.
        field: String,
        /// The offending value as found.
        value: String,
    },

    /// A running total exceeded 256 bits.
    #[error("amount overflow")]
    Overflow,

    /// The transaction has no log entry at the matched message's position.
    #[error("no log entry for message")]
    MissingLog,
}

/// A [`DecodeError`] located within a transaction.
#[derive(Debug, thiserror::Error)]
#[error("tx {txhash}, message {index}")]
pub struct AggregateError {
    /// Hash of the offending transaction.
    pub txhash: String,
    /// Zero-based message position.
    pub index: usize,
    /// What went wrong.
    #[source]
    pub source: DecodeError,
}
