//! Wire types for the score submission service.

use crate::tail_chars;
use serde::{Deserialize, Serialize};

/// Body of a score submission request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScoreRequest {
    pub player_address: String,
    pub score_amount: u64,
}

/// Body of a score submission response.
///
/// Success is `{ "success": true, "transactionHash": ... }`, failure is
/// `{ "success": false, "error": ... }`. Missing fields deserialize to their
/// defaults so that a malformed body reads as a failure rather than an error.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveScoreResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveScoreResponse {
    pub fn recorded(transaction_hash: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_hash: Some(transaction_hash.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_hash: None,
            error: Some(error.into()),
        }
    }

    /// Convert into a receipt for `score`, or the reason the service gave for
    /// not recording it.
    pub fn into_receipt(self, score: u64) -> Result<SubmissionReceipt, String> {
        match (self.success, self.transaction_hash) {
            (true, Some(transaction_hash)) if !transaction_hash.is_empty() => {
                Ok(SubmissionReceipt {
                    score,
                    transaction_hash,
                })
            }
            (true, _) => Err("response missing transaction hash".to_string()),
            (false, _) => Err(self
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "Failed to save score".to_string())),
        }
    }
}

/// Confirmation that the external service recorded a score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub score: u64,
    pub transaction_hash: String,
}

impl SubmissionReceipt {
    /// Transaction hash formatted as `0x1234...abcd`.
    pub fn short_hash(&self) -> String {
        if self.transaction_hash.chars().count() <= 10 {
            return self.transaction_hash.clone();
        }
        let head: String = self.transaction_hash.chars().take(6).collect();
        format!("{head}...{}", tail_chars(&self.transaction_hash, 4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_names() {
        let request = SaveScoreRequest {
            player_address: "0xabc".to_string(),
            score_amount: 1300,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"playerAddress": "0xabc", "scoreAmount": 1300})
        );
    }

    #[test]
    fn test_success_response() {
        let response: SaveScoreResponse =
            serde_json::from_value(json!({"success": true, "transactionHash": "0xfeedbeef00"}))
                .unwrap();
        let receipt = response.into_receipt(400).unwrap();
        assert_eq!(receipt.score, 400);
        assert_eq!(receipt.transaction_hash, "0xfeedbeef00");
    }

    #[test]
    fn test_failure_response() {
        let response: SaveScoreResponse =
            serde_json::from_value(json!({"success": false, "error": "rate limited"})).unwrap();
        assert_eq!(response.into_receipt(400), Err("rate limited".to_string()));

        let response: SaveScoreResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(
            response.into_receipt(400),
            Err("Failed to save score".to_string())
        );
    }

    #[test]
    fn test_success_without_hash_is_failure() {
        let response: SaveScoreResponse =
            serde_json::from_value(json!({"success": true})).unwrap();
        assert!(response.into_receipt(100).is_err());
    }

    #[test]
    fn test_short_hash() {
        let receipt = SubmissionReceipt {
            score: 1,
            transaction_hash: "0xabcdef0123456789".to_string(),
        };
        assert_eq!(receipt.short_hash(), "0xabcd...6789");
    }
}
