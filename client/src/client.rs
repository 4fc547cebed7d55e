use crate::{Error, Result};
use dice_execution::ScoreSubmitter;
use dice_types::{
    parse_leaderboard, LeaderboardEntry, SaveScoreRequest, SaveScoreResponse, SubmissionReceipt,
};
use serde_json::Value;
use std::{future::Future, time::Duration};
use tracing::{debug, info, warn};
use url::Url;

const LEADERBOARD_PATH: &str = "api/leaderboard";
const SAVE_SCORE_PATH: &str = "api/save-score";

/// Timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Paging and sort parameters forwarded to the leaderboard service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderboardQuery {
    pub page: u32,
    pub limit: u32,
    pub game_id: Option<u64>,
    pub sort_by: String,
    pub sort_order: String,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            game_id: None,
            sort_by: "scores".to_string(),
            sort_order: "desc".to_string(),
        }
    }
}

impl LeaderboardQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(game_id) = self.game_id {
            params.push(("gameId", game_id.to_string()));
        }
        params.push(("sortBy", self.sort_by.clone()));
        params.push(("sortOrder", self.sort_order.clone()));
        params
    }
}

/// Client for the leaderboard and score submission services.
#[derive(Clone, Debug)]
pub struct Client {
    pub base_url: Url,
    http_client: reqwest::Client,
    leaderboard_query: LeaderboardQuery,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        match base_url.scheme() {
            "http" | "https" => {}
            scheme => return Err(Error::InvalidScheme(scheme.to_string())),
        }
        // Paths are joined relative to the base, which must end in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            http_client,
            leaderboard_query: LeaderboardQuery::default(),
        })
    }

    pub fn with_leaderboard_query(mut self, query: LeaderboardQuery) -> Self {
        self.leaderboard_query = query;
        self
    }

    pub fn leaderboard_query(&self) -> &LeaderboardQuery {
        &self.leaderboard_query
    }

    /// Fetch the current leaderboard.
    ///
    /// Transport failures and non-2xx statuses are errors. A body that is not
    /// a list of entries (bare or under `data`) yields an empty leaderboard.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let url = self.base_url.join(LEADERBOARD_PATH)?;
        let response = self
            .http_client
            .get(url)
            .query(&self.leaderboard_query.params())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.is_empty() {
                return Err(Error::Failed(status));
            }
            return Err(Error::FailedWithBody { status, body });
        }

        let bytes = response.bytes().await?;
        let body: Value = match serde_json::from_slice(&bytes) {
            Ok(body) => body,
            Err(err) => {
                warn!(?err, "leaderboard response is not JSON");
                return Ok(Vec::new());
            }
        };
        let entries = parse_leaderboard(&body);
        debug!(count = entries.len(), "fetched leaderboard");
        Ok(entries)
    }

    /// Record `score` for `player`.
    pub async fn save_score(&self, player: &str, score: u64) -> Result<SubmissionReceipt> {
        let url = self.base_url.join(SAVE_SCORE_PATH)?;
        let request = SaveScoreRequest {
            player_address: player.to_string(),
            score_amount: score,
        };
        let response = self.http_client.post(url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed: SaveScoreResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(Error::FailedWithBody { status, body });
            }
            Err(err) => {
                warn!(?err, "malformed save score response");
                return Err(Error::UnexpectedResponse);
            }
        };
        if parsed.success && !status.is_success() {
            return Err(Error::Failed(status));
        }

        let receipt = parsed.into_receipt(score).map_err(Error::Rejected)?;
        info!(player, score, tx = %receipt.transaction_hash, "score recorded");
        Ok(receipt)
    }
}

impl ScoreSubmitter for Client {
    type Error = Error;

    fn submit_score(
        &self,
        player: &str,
        score: u64,
    ) -> impl Future<Output = Result<SubmissionReceipt>> + Send {
        self.save_score(player, score)
    }
}
