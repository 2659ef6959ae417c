//! Request validation: the gate every body passes before any backend call.
//!
//! Bodies arrive as untyped JSON so the checks can tell "missing" from
//! "malformed" from "over the limit" and report each distinctly.

use crate::domain::error::ValidationError;
use crate::domain::types::{Address, AfterCursor, HistoryQuery, TxHash};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use std::collections::HashSet;

/// Parse a raw request body. An empty body is `None`, not an error.
pub fn parse_body(raw: &[u8]) -> Result<Option<Value>, ValidationError> {
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(None);
    }
    serde_json::from_slice(raw)
        .map(Some)
        .map_err(|e| ValidationError::MalformedJson(e.to_string()))
}

/// Address-set check shared by the UTXO, usage-filter, sum and history
/// endpoints.
///
/// Accepts a non-empty array of strings of at most `limit` elements.
pub fn validate_addresses(raw: Option<&Value>, limit: usize) -> Result<Vec<Address>, ValidationError> {
    let items = match raw {
        None | Some(Value::Null) => return Err(ValidationError::MissingAddresses),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::AddressesNotStrings),
    };

    if items.is_empty() {
        return Err(ValidationError::MissingAddresses);
    }

    if items.len() > limit {
        return Err(ValidationError::TooManyAddresses {
            count: items.len(),
            limit,
        });
    }

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or(ValidationError::AddressesNotStrings)
        })
        .collect()
}

/// Addresses from a `{addresses: [...]}` body.
pub fn validate_address_body(body: Option<&Value>, limit: usize) -> Result<Vec<Address>, ValidationError> {
    let body = body.ok_or(ValidationError::MissingAddresses)?;
    validate_addresses(body.get("addresses"), limit)
}

/// Validate a `/v2/txs/history` body.
pub fn validate_history_request(
    body: Option<&Value>,
    address_limit: usize,
    response_limit: usize,
) -> Result<HistoryQuery, ValidationError> {
    let body = match body {
        None | Some(Value::Null) => return Err(ValidationError::MissingBody),
        Some(body) => body,
    };

    let addresses = validate_addresses(body.get("addresses"), address_limit)?;

    let limit = match body.get("limit") {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let requested = raw.as_u64().ok_or(ValidationError::InvalidLimit)?;
            if requested == 0 {
                return Err(ValidationError::InvalidLimit);
            }
            if requested > response_limit as u64 {
                return Err(ValidationError::LimitExceeded {
                    requested,
                    limit: response_limit,
                });
            }
            Some(requested as usize)
        }
    };

    let after = match body.get("after") {
        None | Some(Value::Null) => None,
        Some(raw) => {
            let tx = raw.get("tx").and_then(Value::as_str);
            let block = raw.get("block").and_then(Value::as_str);
            match (tx, block) {
                (Some(tx), Some(block)) => Some(AfterCursor {
                    tx: tx.to_owned(),
                    block: block.to_owned(),
                }),
                _ => return Err(ValidationError::MalformedCursor),
            }
        }
    };

    let until_block = body
        .get("untilBlock")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingUntilBlock)?
        .to_owned();

    Ok(HistoryQuery {
        addresses,
        after,
        until_block,
        limit,
    })
}

/// Validate a `/txs/txBodies` body. Duplicate hashes are collapsed, keeping
/// first-seen order.
pub fn validate_tx_hashes(body: Option<&Value>, limit: usize) -> Result<Vec<TxHash>, ValidationError> {
    let items = body
        .and_then(|b| b.get("txsHashes"))
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingTxHashes)?;

    if items.is_empty() || items.len() > limit {
        return Err(ValidationError::TxHashesOutOfRange {
            count: items.len(),
            limit,
        });
    }

    let mut seen = HashSet::with_capacity(items.len());
    let mut hashes = Vec::with_capacity(items.len());
    for item in items {
        let hash = item.as_str().ok_or(ValidationError::MissingTxHashes)?;
        if seen.insert(hash) {
            hashes.push(hash.to_owned());
        }
    }
    Ok(hashes)
}

/// Decode the base64 `signedTx` field of a `/txs/signed` body.
pub fn decode_signed_tx(body: Option<&Value>) -> Result<Vec<u8>, ValidationError> {
    let encoded = body
        .and_then(|b| b.get("signedTx"))
        .and_then(Value::as_str)
        .ok_or(ValidationError::InvalidSignedTx)?;

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| ValidationError::InvalidSignedTx)?;

    if bytes.is_empty() {
        return Err(ValidationError::InvalidSignedTx);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn addresses(n: usize) -> Value {
        Value::Array((0..n).map(|i| json!(format!("addr{}", i))).collect())
    }

    #[test]
    fn test_empty_and_missing_addresses() {
        assert_eq!(
            validate_addresses(None, 50),
            Err(ValidationError::MissingAddresses)
        );
        assert_eq!(
            validate_addresses(Some(&json!([])), 50),
            Err(ValidationError::MissingAddresses)
        );
    }

    #[test]
    fn test_fifty_one_addresses_exceed_limit() {
        let err = validate_addresses(Some(&addresses(51)), 50).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooManyAddresses {
                count: 51,
                limit: 50
            }
        );
        assert!(err.to_string().contains("exceeds limit"));
    }

    #[test]
    fn test_non_string_addresses_rejected() {
        assert_eq!(
            validate_addresses(Some(&json!(["addr1", 7])), 50),
            Err(ValidationError::AddressesNotStrings)
        );
        assert_eq!(
            validate_addresses(Some(&json!("addr1")), 50),
            Err(ValidationError::AddressesNotStrings)
        );
    }

    proptest! {
        #[test]
        fn prop_address_count_within_limit_is_accepted(limit in 1usize..64, extra in 0usize..64) {
            let n = extra % limit + 1;
            let raw = addresses(n);
            let validated = validate_addresses(Some(&raw), limit).unwrap();
            prop_assert_eq!(validated.len(), n);
            prop_assert_eq!(validated[0].as_str(), "addr0");
        }

        #[test]
        fn prop_address_count_over_limit_is_rejected(limit in 1usize..64, over in 1usize..32) {
            let raw = addresses(limit + over);
            let is_too_many = matches!(
                validate_addresses(Some(&raw), limit),
                Err(ValidationError::TooManyAddresses { .. })
            );
            prop_assert!(is_too_many);
        }
    }

    #[test]
    fn test_history_minimal_body() {
        let body = json!({ "addresses": ["addr1"], "untilBlock": "cafe01" });
        let query = validate_history_request(Some(&body), 50, 50).unwrap();
        assert_eq!(query.addresses, vec!["addr1".to_string()]);
        assert_eq!(query.until_block, "cafe01");
        assert!(query.after.is_none());
        assert!(query.limit.is_none());
    }

    #[test]
    fn test_history_full_body() {
        let body = json!({
            "addresses": ["addr1"],
            "after": { "tx": "deadbeef", "block": "feedface" },
            "untilBlock": "cafe01",
            "limit": 20
        });
        let query = validate_history_request(Some(&body), 50, 50).unwrap();
        assert_eq!(
            query.after,
            Some(AfterCursor {
                tx: "deadbeef".into(),
                block: "feedface".into()
            })
        );
        assert_eq!(query.limit, Some(20));
    }

    #[test]
    fn test_history_rejections() {
        assert_eq!(
            validate_history_request(None, 50, 50),
            Err(ValidationError::MissingBody)
        );
        assert_eq!(
            validate_history_request(Some(&json!({ "untilBlock": "x" })), 50, 50),
            Err(ValidationError::MissingAddresses)
        );
        assert_eq!(
            validate_history_request(Some(&json!({ "addresses": ["a"] })), 50, 50),
            Err(ValidationError::MissingUntilBlock)
        );
        assert_eq!(
            validate_history_request(
                Some(&json!({ "addresses": ["a"], "untilBlock": "x", "limit": 51 })),
                50,
                50
            ),
            Err(ValidationError::LimitExceeded {
                requested: 51,
                limit: 50
            })
        );
        assert_eq!(
            validate_history_request(
                Some(&json!({ "addresses": ["a"], "untilBlock": "x", "limit": 0 })),
                50,
                50
            ),
            Err(ValidationError::InvalidLimit)
        );
        assert_eq!(
            validate_history_request(
                Some(&json!({ "addresses": ["a"], "untilBlock": "x", "after": { "tx": "t" } })),
                50,
                50
            ),
            Err(ValidationError::MalformedCursor)
        );
    }

    #[test]
    fn test_tx_hashes_bounds() {
        let exactly_max = json!({ "txsHashes": (0..150).map(|i| format!("h{}", i)).collect::<Vec<_>>() });
        assert_eq!(validate_tx_hashes(Some(&exactly_max), 150).unwrap().len(), 150);

        let empty = json!({ "txsHashes": [] });
        assert!(matches!(
            validate_tx_hashes(Some(&empty), 150),
            Err(ValidationError::TxHashesOutOfRange { count: 0, .. })
        ));

        let over = json!({ "txsHashes": (0..151).map(|i| format!("h{}", i)).collect::<Vec<_>>() });
        assert!(matches!(
            validate_tx_hashes(Some(&over), 150),
            Err(ValidationError::TxHashesOutOfRange { count: 151, .. })
        ));

        assert_eq!(
            validate_tx_hashes(Some(&json!({ "txsHashes": "h1" })), 150),
            Err(ValidationError::MissingTxHashes)
        );
        assert_eq!(validate_tx_hashes(None, 150), Err(ValidationError::MissingTxHashes));
    }

    #[test]
    fn test_tx_hashes_deduplicated() {
        let body = json!({ "txsHashes": ["a", "b", "a"] });
        assert_eq!(validate_tx_hashes(Some(&body), 150).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_decode_signed_tx() {
        let body = json!({ "signedTx": STANDARD.encode([0x84, 0xa4, 0x00]) });
        assert_eq!(decode_signed_tx(Some(&body)).unwrap(), vec![0x84, 0xa4, 0x00]);

        assert_eq!(
            decode_signed_tx(Some(&json!({ "signedTx": "" }))),
            Err(ValidationError::InvalidSignedTx)
        );
        assert_eq!(
            decode_signed_tx(Some(&json!({ "signedTx": "not base64!" }))),
            Err(ValidationError::InvalidSignedTx)
        );
        assert_eq!(decode_signed_tx(None), Err(ValidationError::InvalidSignedTx));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b""), Ok(None));
        assert_eq!(parse_body(b"  \n"), Ok(None));
        assert_eq!(parse_body(b"{\"a\":1}"), Ok(Some(json!({ "a": 1 }))));
        assert!(matches!(parse_body(b"{oops"), Err(ValidationError::MalformedJson(_))));
    }
}
