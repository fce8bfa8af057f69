//! Per-transaction amount aggregation.
//!
//! [`aggregate`] folds a transaction's messages into two running totals
//! using a [`RuleSet`]. Each message is paired with the log entry at the
//! same position; the sender of the last matching message is kept.

use alloy::primitives::U256;

use crate::error::{AggregateError, DecodeError};
use crate::rules::{AmountSource, Bucket, RuleSet, parse_amount, parse_amount_value};
use crate::types::{Msg, TxLog, TxRecord};

/// One output row: a transaction with at least one nonzero total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    /// Transaction hash.
    pub txhash: String,
    /// Block height.
    pub height: u64,
    /// Sender of the last matching message.
    pub sender: String,
    /// Sum of amounts routed to [`Bucket::A`].
    pub amount_a: U256,
    /// Sum of amounts routed to [`Bucket::B`].
    pub amount_b: U256,
}

/// Fold state over a transaction's messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    /// Running total for [`Bucket::A`].
    pub a: U256,
    /// Running total for [`Bucket::B`].
    pub b: U256,
    /// Sender of the latest matching message.
    pub sender: Option<String>,
}

impl Totals {
    /// Add `amount` to `bucket` and record `sender` as the latest match.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Overflow`] if the total exceeds 256 bits.
    pub fn add(self, bucket: Bucket, amount: U256, sender: String) -> Result<Self, DecodeError> {
        let (a, b) = match bucket {
            Bucket::A => (self.a.checked_add(amount).ok_or(DecodeError::Overflow)?, self.b),
            Bucket::B => (self.a, self.b.checked_add(amount).ok_or(DecodeError::Overflow)?),
        };
        Ok(Self {
            a,
            b,
            sender: Some(sender),
        })
    }

    /// Whether both totals are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.a.is_zero() && self.b.is_zero()
    }

    fn into_row(self, tx: &TxRecord) -> Option<AggregateRow> {
        if self.is_zero() {
            return None;
        }
        Some(AggregateRow {
            txhash: tx.txhash.clone(),
            height: tx.height,
            sender: self.sender?,
            amount_a: self.a,
            amount_b: self.b,
        })
    }
}

/// Reduce one transaction to at most one [`AggregateRow`].
///
/// Returns `Ok(None)` for failed transactions (no logs), for transactions
/// without matching messages, and when every matched amount is zero.
///
/// # Errors
///
/// Returns an [`AggregateError`] if a contract call cannot be decoded, a
/// matched amount is malformed, or a matched message has no log entry.
pub fn aggregate(tx: &TxRecord, rules: &RuleSet) -> Result<Option<AggregateRow>, AggregateError> {
    let Some(logs) = tx.success_logs() else {
        return Ok(None);
    };

    let totals = tx
        .messages()
        .iter()
        .enumerate()
        .try_fold(Totals::default(), |totals, (index, msg)| {
            step(totals, msg, logs.get(index), rules, &tx.txhash).map_err(|source| {
                AggregateError {
                    txhash: tx.txhash.clone(),
                    index,
                    source,
                }
            })
        })?;

    Ok(totals.into_row(tx))
}

fn step(
    totals: Totals,
    msg: &Msg,
    log: Option<&TxLog>,
    rules: &RuleSet,
    txhash: &str,
) -> Result<Totals, DecodeError> {
    if msg.kind != rules.execute_kind {
        return Ok(totals);
    }

    let call = msg.execute_contract()?;
    let payload = call.execute_msg.decode()?;

    let Some((rule, body)) = rules.find(&call.contract, &payload) else {
        if rules.reports(&call.contract, &payload) {
            tracing::info!(
                txhash,
                contract = %call.contract,
                operation = payload.operation_name().unwrap_or_default(),
                %payload,
                "unrecognized operation"
            );
        }
        return Ok(totals);
    };

    let amount = match rule.source {
        AmountSource::Payload { field } => parse_amount_value(field, body.get(field))?,
        AmountSource::Event { attribute } => {
            let log = log.ok_or(DecodeError::MissingLog)?;
            match log.attribute(rules.event_type, attribute) {
                Some(value) => parse_amount(attribute, value)?,
                None => U256::ZERO,
            }
        }
    };

    tracing::debug!(txhash, operation = rule.operation, %amount, "matched");
    totals.add(rule.bucket, amount, call.sender)
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use serde_json::{Value, json};

    use super::*;
    use crate::contracts::{
        APOLLO_ENTRY, ASTROPORT_MARS_UST_LP, MARS_STAKING, SPECTRUM_ENTRY, SPECTRUM_MARS_UST_FARM,
        XMARS_TOKEN,
    };
    use crate::presets::{APOLLO, SPECTRUM, STAKING};

    fn exec(sender: &str, contract: &str, execute_msg: Value) -> Value {
        json!({
            "type": "wasm/MsgExecuteContract",
            "value": {
                "sender": sender,
                "contract": contract,
                "coins": [],
                "execute_msg": execute_msg
            }
        })
    }

    fn log(attributes: &[(&str, &str)]) -> Value {
        let attributes: Vec<Value> = attributes
            .iter()
            .map(|(k, v)| json!({"key": k, "value": v}))
            .collect();
        json!({"events": [{"type": "from_contract", "attributes": attributes}]})
    }

    fn tx(msgs: Vec<Value>, logs: Option<Vec<Value>>) -> TxRecord {
        let mut value = json!({
            "txhash": "A1B2",
            "height": "7000000",
            "tx": {"type": "core/StdTx", "value": {"msg": msgs}}
        });
        if let Some(logs) = logs {
            value["logs"] = Value::Array(logs);
        }
        serde_json::from_value(value).unwrap()
    }

    fn claim(sender: &str) -> Value {
        exec(sender, MARS_STAKING, json!({"claim": {}}))
    }

    #[test]
    fn no_logs_means_no_row() {
        let record = tx(vec![claim("terra1user")], None);
        assert_eq!(aggregate(&record, &STAKING).unwrap(), None, "failed tx is skipped");
    }

    #[test]
    fn single_claim() {
        let record = tx(vec![claim("terra1user")], Some(vec![log(&[("mars_claimed", "1000")])]));
        let row = aggregate(&record, &STAKING).unwrap().unwrap();
        assert_eq!(row.txhash, "A1B2", "txhash");
        assert_eq!(row.height, 7_000_000, "height");
        assert_eq!(row.sender, "terra1user", "sender");
        assert_eq!(row.amount_a, U256::from(1000u64), "claimed");
        assert_eq!(row.amount_b, U256::ZERO, "claimable");
    }

    #[test]
    fn matching_messages_are_summed_into_one_row() {
        let record = tx(
            vec![claim("terra1user"), claim("terra1user")],
            Some(vec![
                log(&[("mars_claimed", "500")]),
                log(&[("mars_claimed", "300")]),
            ]),
        );
        let row = aggregate(&record, &STAKING).unwrap().unwrap();
        assert_eq!(row.amount_a, U256::from(800u64), "summed");
    }

    #[test]
    fn event_amount_comes_from_the_message_position() {
        let record = tx(
            vec![
                exec("terra1user", "terra1unrelated", json!({"transfer": {}})),
                claim("terra1user"),
            ],
            Some(vec![
                log(&[("mars_claimed", "999")]),
                log(&[("mars_claimed", "5")]),
            ]),
        );
        let row = aggregate(&record, &STAKING).unwrap().unwrap();
        assert_eq!(row.amount_a, U256::from(5u64), "second log entry used");
    }

    #[test]
    fn unrecognized_kinds_yield_nothing() {
        let record = tx(
            vec![json!({
                "type": "bank/MsgSend",
                "value": {"from_address": "a", "to_address": "b", "amount": []}
            })],
            Some(vec![log(&[("mars_claimed", "1000")])]),
        );
        assert_eq!(aggregate(&record, &STAKING).unwrap(), None, "bank send ignored");
    }

    #[test]
    fn inline_and_encoded_payloads_agree() {
        let body = json!({"send": {"contract": MARS_STAKING, "amount": "10", "msg": "e30="}});
        let encoded = json!(BASE64.encode(body.to_string()));
        let logs = Some(vec![log(&[("mars_claimable", "77")])]);

        let inline = aggregate(&tx(vec![exec("terra1u", XMARS_TOKEN, body)], logs.clone()), &STAKING);
        let encoded = aggregate(&tx(vec![exec("terra1u", XMARS_TOKEN, encoded)], logs), &STAKING);
        let inline = inline.unwrap().unwrap();
        assert_eq!(inline, encoded.unwrap().unwrap(), "identical rows");
        assert_eq!(inline.amount_b, U256::from(77u64), "claimable from event");
    }

    #[test]
    fn latest_matching_sender_wins() {
        let record = tx(
            vec![claim("terra1first"), claim("terra1second")],
            Some(vec![
                log(&[("mars_claimed", "1")]),
                log(&[("mars_claimed", "2")]),
            ]),
        );
        let row = aggregate(&record, &STAKING).unwrap().unwrap();
        assert_eq!(row.sender, "terra1second", "last match");
    }

    #[test]
    fn unmatched_sender_is_not_recorded() {
        let record = tx(
            vec![
                claim("terra1claimer"),
                exec("terra1other", XMARS_TOKEN, json!({"transfer": {"amount": "1"}})),
            ],
            Some(vec![log(&[("mars_claimed", "3")]), log(&[])]),
        );
        let row = aggregate(&record, &STAKING).unwrap().unwrap();
        assert_eq!(row.sender, "terra1claimer", "only matching messages set sender");
    }

    #[test]
    fn zero_totals_yield_nothing() {
        let record = tx(vec![claim("terra1user")], Some(vec![log(&[("mars_claimed", "0")])]));
        assert_eq!(aggregate(&record, &STAKING).unwrap(), None, "zero claim");

        let record = tx(vec![claim("terra1user")], Some(vec![log(&[("other", "5")])]));
        assert_eq!(aggregate(&record, &STAKING).unwrap(), None, "attribute absent");
    }

    #[test]
    fn apollo_strategy_filter() {
        let withdraw = |id: Value| {
            exec(
                "terra1user",
                APOLLO_ENTRY,
                json!({"withdraw_from_strategy": {"strategy_id": id, "amount": "250"}}),
            )
        };
        let record = tx(vec![withdraw(json!(50))], Some(vec![log(&[])]));
        let row = aggregate(&record, &APOLLO).unwrap().unwrap();
        assert_eq!(row.amount_b, U256::from(250u64), "withdrawn from payload");

        let record = tx(vec![withdraw(json!("49"))], Some(vec![log(&[])]));
        assert_eq!(aggregate(&record, &APOLLO).unwrap(), None, "other strategy ignored");
    }

    #[test]
    fn apollo_deposits() {
        let record = tx(
            vec![
                exec(
                    "terra1user",
                    ASTROPORT_MARS_UST_LP,
                    json!({"send": {"contract": APOLLO_ENTRY, "amount": "40", "msg": "e30="}}),
                ),
                exec(
                    "terra1user",
                    APOLLO_ENTRY,
                    json!({"zap_into_strategy": {"strategy_id": "50"}}),
                ),
            ],
            Some(vec![log(&[("share", "999")]), log(&[("share", "60")])]),
        );
        let row = aggregate(&record, &APOLLO).unwrap().unwrap();
        assert_eq!(row.amount_a, U256::from(100u64), "direct send + zap shares");
        assert_eq!(row.amount_b, U256::ZERO, "nothing withdrawn");
    }

    #[test]
    fn spectrum_bond_and_unbond() {
        let record = tx(
            vec![
                exec(
                    "terra1user",
                    SPECTRUM_ENTRY,
                    json!({"bond": {"contract": SPECTRUM_MARS_UST_FARM, "compound_rate": "1"}}),
                ),
                exec("terra1user", SPECTRUM_MARS_UST_FARM, json!({"unbond": {"amount": "12"}})),
            ],
            Some(vec![log(&[("share", "30")]), log(&[])]),
        );
        let row = aggregate(&record, &SPECTRUM).unwrap().unwrap();
        assert_eq!(row.amount_a, U256::from(30u64), "bonded shares");
        assert_eq!(row.amount_b, U256::from(12u64), "unbonded");
    }

    #[test]
    fn apollo_zap_into_other_strategy_is_ignored() {
        let record = tx(
            vec![exec(
                "terra1user",
                APOLLO_ENTRY,
                json!({"zap_into_strategy": {"strategy_id": 49}}),
            )],
            Some(vec![log(&[("share", "60")])]),
        );
        assert_eq!(aggregate(&record, &APOLLO).unwrap(), None, "strategy 49");
    }

    #[test]
    fn spectrum_zap_to_bond() {
        let zap = |farm: &str| {
            exec(
                "terra1user",
                SPECTRUM_ENTRY,
                json!({"zap_to_bond": {"contract": farm, "provide_asset": {}}}),
            )
        };
        let logs = Some(vec![log(&[("share", "45")])]);

        let record = tx(vec![zap(SPECTRUM_MARS_UST_FARM)], logs.clone());
        let row = aggregate(&record, &SPECTRUM).unwrap().unwrap();
        assert_eq!(row.amount_a, U256::from(45u64), "zapped shares");

        let record = tx(vec![zap("terra1otherfarm")], logs);
        assert_eq!(aggregate(&record, &SPECTRUM).unwrap(), None, "other farm");
    }

    #[test]
    fn spectrum_lp_send() {
        let send = |token: &str, farm: &str| {
            exec(
                "terra1user",
                token,
                json!({"send": {"contract": farm, "amount": "18", "msg": "e30="}}),
            )
        };
        let logs = Some(vec![log(&[("share", "999")])]);

        let record = tx(vec![send(ASTROPORT_MARS_UST_LP, SPECTRUM_MARS_UST_FARM)], logs.clone());
        let row = aggregate(&record, &SPECTRUM).unwrap().unwrap();
        assert_eq!(row.amount_a, U256::from(18u64), "sent amount from payload");

        let record = tx(vec![send(ASTROPORT_MARS_UST_LP, "terra1otherfarm")], logs.clone());
        assert_eq!(aggregate(&record, &SPECTRUM).unwrap(), None, "sent to other farm");

        let record = tx(vec![send(XMARS_TOKEN, SPECTRUM_MARS_UST_FARM)], logs);
        assert_eq!(aggregate(&record, &SPECTRUM).unwrap(), None, "other token");
    }

    #[test]
    fn null_operation_body_is_skipped() {
        let record = tx(
            vec![exec("terra1user", MARS_STAKING, json!({"claim": null}))],
            Some(vec![log(&[("mars_claimed", "5")])]),
        );
        assert_eq!(aggregate(&record, &STAKING).unwrap(), None, "null claim");
    }

    #[test]
    fn large_numeric_amount_from_response_text() {
        let text = format!(
            r#"{{
                "txhash": "C3D4",
                "height": 7000001,
                "logs": [{{"events": []}}],
                "tx": {{"value": {{"msg": [{{
                    "type": "wasm/MsgExecuteContract",
                    "value": {{
                        "sender": "terra1whale",
                        "contract": "{SPECTRUM_MARS_UST_FARM}",
                        "coins": [],
                        "execute_msg": {{"unbond": {{"amount": 1180591620717411303424}}}}
                    }}
                }}]}}}}
            }}"#
        );
        let record: TxRecord = serde_json::from_str(&text).unwrap();
        let row = aggregate(&record, &SPECTRUM).unwrap().unwrap();
        assert_eq!(row.amount_b.to_string(), "1180591620717411303424", "2^70 unbonded exactly");
    }

    #[test]
    fn malformed_amount_is_fatal() {
        let record = tx(vec![claim("terra1user")], Some(vec![log(&[("mars_claimed", "lots")])]));
        let err = aggregate(&record, &STAKING).unwrap_err();
        assert_eq!(err.index, 0, "error locates the message");
        assert!(
            matches!(err.source, DecodeError::InvalidAmount { .. }),
            "invalid amount"
        );
    }

    #[test]
    fn missing_log_entry_is_fatal() {
        let record = tx(
            vec![exec("terra1u", "terra1x", json!({"noop": {}})), claim("terra1user")],
            Some(vec![log(&[])]),
        );
        let err = aggregate(&record, &STAKING).unwrap_err();
        assert_eq!(err.index, 1, "second message");
        assert!(matches!(err.source, DecodeError::MissingLog), "missing log");
    }

    #[test]
    fn totals_overflow_is_reported() {
        let totals = Totals {
            a: U256::MAX,
            ..Totals::default()
        };
        assert!(
            matches!(
                totals.add(Bucket::A, U256::from(1u64), "s".to_owned()),
                Err(DecodeError::Overflow)
            ),
            "overflow"
        );
    }
}
