//! Leaderboard entries as reported by the external leaderboard service.
//!
//! The service is not under our control, so parsing is lenient: every field
//! has a default, and a body that is neither an array nor a `{ "data": [...] }`
//! envelope yields an empty leaderboard instead of an error.

use crate::{tail_chars, UNKNOWN};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Leaderboard entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// 1-based position; ties are broken by the upstream service.
    pub rank: u32,
    pub name: String,
    pub wallet: String,
    pub score: u64,
}

impl Default for LeaderboardEntry {
    fn default() -> Self {
        Self {
            rank: 1,
            name: UNKNOWN.to_string(),
            wallet: UNKNOWN.to_string(),
            score: 0,
        }
    }
}

impl LeaderboardEntry {
    /// Build an entry from one element of the service response.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(fields) = value else {
            return Self::default();
        };
        Self {
            rank: fields
                .get("rank")
                .and_then(as_u64)
                .and_then(|rank| u32::try_from(rank).ok())
                .filter(|rank| *rank > 0)
                .unwrap_or(1),
            name: fields
                .get("username")
                .and_then(as_text)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            wallet: fields
                .get("walletAddress")
                .and_then(as_text)
                .unwrap_or_else(|| UNKNOWN.to_string()),
            score: fields.get("score").and_then(as_u64).unwrap_or(0),
        }
    }

    /// Wallet formatted as `0x1234...abcd`.
    pub fn short_wallet(&self) -> String {
        if self.wallet.is_empty() || self.wallet == UNKNOWN {
            return UNKNOWN.to_string();
        }
        if self.wallet.chars().count() <= 10 {
            return self.wallet.clone();
        }
        let head: String = self.wallet.chars().take(6).collect();
        format!("{head}...{}", tail_chars(&self.wallet, 4))
    }
}

/// Parse a leaderboard response body, preserving the service's ordering.
pub fn parse_leaderboard(body: &Value) -> Vec<LeaderboardEntry> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(fields) => match fields.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items.iter().map(LeaderboardEntry::from_value).collect()
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.is_finite())
                .map(|n| if n <= 0.0 { 0 } else { n as u64 })
        }),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<u64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(|n| if n <= 0.0 { 0 } else { n as u64 })
            })
        }
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_array() {
        let body = json!([
            {"rank": 1, "username": "alice", "walletAddress": "0xabc", "score": 1300},
            {"rank": 2, "username": "bob", "walletAddress": "0xdef", "score": 400},
        ]);
        let entries = parse_leaderboard(&body);
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            LeaderboardEntry {
                rank: 1,
                name: "alice".to_string(),
                wallet: "0xabc".to_string(),
                score: 1300,
            }
        );
        assert_eq!(entries[1].name, "bob");
    }

    #[test]
    fn test_parse_data_envelope() {
        let body = json!({"data": [{"rank": 3, "username": "carol", "score": 100}]});
        let entries = parse_leaderboard(&body);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rank, 3);
        assert_eq!(entries[0].wallet, UNKNOWN);
    }

    #[test]
    fn test_null_data_is_empty() {
        assert!(parse_leaderboard(&json!({"data": null})).is_empty());
        assert!(parse_leaderboard(&json!({"data": {"rank": 1}})).is_empty());
        assert!(parse_leaderboard(&json!({"error": "boom"})).is_empty());
        assert!(parse_leaderboard(&json!("nope")).is_empty());
        assert!(parse_leaderboard(&Value::Null).is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let entries = parse_leaderboard(&json!([{}, null, 7]));
        assert_eq!(entries, vec![LeaderboardEntry::default(); 3]);
    }

    #[test]
    fn test_non_numeric_score_defaults_to_zero() {
        let entries = parse_leaderboard(&json!([
            {"score": "lots"},
            {"score": "250"},
            {"score": -5},
            {"score": 99.7},
            {"score": [1]},
        ]));
        let scores: Vec<u64> = entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![0, 250, 0, 99, 0]);
    }

    #[test]
    fn test_invalid_rank_defaults_to_one() {
        let entries = parse_leaderboard(&json!([{"rank": 0}, {"rank": "4"}, {"rank": "x"}]));
        let ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 4, 1]);
    }

    #[test]
    fn test_short_wallet() {
        let mut entry = LeaderboardEntry {
            wallet: "0x1234567890abcdef".to_string(),
            ..Default::default()
        };
        assert_eq!(entry.short_wallet(), "0x1234...cdef");
        entry.wallet = UNKNOWN.to_string();
        assert_eq!(entry.short_wallet(), UNKNOWN);
        entry.wallet = String::new();
        assert_eq!(entry.short_wallet(), UNKNOWN);
    }

    proptest! {
        #[test]
        fn prop_numeric_fields_clamped(rank in any::<i64>(), score in any::<i64>()) {
            let entry = LeaderboardEntry::from_value(&json!({"rank": rank, "score": score}));
            prop_assert_eq!(entry.score, score.max(0) as u64);
            if rank > 0 && rank <= i64::from(u32::MAX) {
                prop_assert_eq!(i64::from(entry.rank), rank);
            } else {
                prop_assert_eq!(entry.rank, 1);
            }
        }
    }
}
