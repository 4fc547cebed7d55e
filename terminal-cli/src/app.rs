use crate::commands::Command;
use chrono::Local;
use dice_client::Client;
use dice_execution::{
    BestScoreStore, Phase, RandomSource, RoundOutcome, SessionEngine, SessionSnapshot,
};
use dice_types::{LeaderboardEntry, SubmissionReceipt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

const MAX_LOGS: usize = 300;

/// Results of background work, delivered back to the UI loop.
#[derive(Debug)]
pub enum UiEvent {
    Rolled(Option<RoundOutcome>),
    Submitted(Result<SubmissionReceipt, String>),
    Leaderboard(Result<Vec<LeaderboardEntry>, String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaderboardView {
    Loading,
    Loaded(Vec<LeaderboardEntry>),
    Failed(String),
}

pub struct App<R, S> {
    engine: Arc<SessionEngine<R, S>>,
    client: Option<Client>,
    player: Option<String>,
    pub snapshot: SessionSnapshot,
    pub logs: Vec<String>,
    pub leaderboard: Option<LeaderboardView>,
    pub saving: bool,
    events: mpsc::UnboundedSender<UiEvent>,
}

impl<R, S> App<R, S> {
    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }
}

impl<R, S> App<R, S>
where
    R: RandomSource + Send + 'static,
    S: BestScoreStore + Send + 'static,
{
    pub fn new(
        engine: Arc<SessionEngine<R, S>>,
        client: Option<Client>,
        player: Option<String>,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        let snapshot = engine.snapshot();
        Self {
            engine,
            client,
            player,
            snapshot,
            logs: Vec::new(),
            leaderboard: None,
            saving: false,
            events,
        }
    }

    /// Apply a command. Returns `true` when the app should exit.
    pub fn handle(&mut self, command: Command) -> bool {
        debug!(?command, "command");
        match command {
            Command::Choose(face) => {
                if !self.engine.choose_face(face) {
                    self.push_log("Wait for the dice to settle before changing face");
                }
            }
            Command::Roll => self.roll(),
            Command::NewGame => {
                self.engine.new_session();
                self.push_log("New game");
            }
            Command::Save => self.save(),
            Command::Leaderboard => self.toggle_leaderboard(),
            Command::Quit => return true,
        }
        self.snapshot = self.engine.snapshot();
        false
    }

    fn roll(&mut self) {
        let Some(pending) = self.engine.request_roll() else {
            let reason = match self.engine.state().phase() {
                Phase::Idle => "Pick a face (1-6) first",
                Phase::Resolving => "Dice are still rolling",
                Phase::Exhausted => "No rounds left; press n for a new game",
                Phase::Ready => "Roll not accepted",
            };
            self.push_log(reason);
            return;
        };
        self.push_log(format!("Rolling for {}...", pending.face()));
        let events = self.events.clone();
        tokio::spawn(async move {
            let _ = events.send(UiEvent::Rolled(pending.await));
        });
    }

    fn save(&mut self) {
        let Some(client) = self.client.clone() else {
            self.push_log("No score service configured");
            return;
        };
        if self.saving {
            self.push_log("Already saving");
            return;
        }
        self.saving = true;
        self.push_log("Saving score...");
        let engine = Arc::clone(&self.engine);
        let player = self.player.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = engine
                .submit_score(&client, player.as_deref())
                .await
                .map_err(|err| err.to_string());
            let _ = events.send(UiEvent::Submitted(result));
        });
    }

    fn toggle_leaderboard(&mut self) {
        if self.leaderboard.take().is_some() {
            return;
        }
        let Some(client) = self.client.clone() else {
            self.leaderboard = Some(LeaderboardView::Failed(
                "No leaderboard service configured".to_string(),
            ));
            return;
        };
        self.leaderboard = Some(LeaderboardView::Loading);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.leaderboard().await.map_err(|err| err.to_string());
            let _ = events.send(UiEvent::Leaderboard(result));
        });
    }

    pub fn on_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Rolled(Some(outcome)) => {
                self.push_log(format!(
                    "Rolled {}: {} hit(s) on {}, +{}",
                    outcome.roll, outcome.hits, outcome.face, outcome.award
                ));
                if outcome.new_best {
                    self.push_log(format!("New best score: {}", outcome.best_score));
                }
            }
            UiEvent::Rolled(None) => self.push_log("Roll cancelled"),
            UiEvent::Submitted(result) => {
                self.saving = false;
                match result {
                    Ok(receipt) => self.push_log(format!(
                        "Score {} saved (tx {})",
                        receipt.score,
                        receipt.short_hash()
                    )),
                    Err(err) => self.push_log(err),
                }
            }
            UiEvent::Leaderboard(result) => {
                // Closed while loading.
                if self.leaderboard.is_none() {
                    return;
                }
                self.leaderboard = Some(match result {
                    Ok(entries) => LeaderboardView::Loaded(entries),
                    Err(err) => LeaderboardView::Failed(err),
                });
            }
        }
        self.snapshot = self.engine.snapshot();
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        let ts = Local::now().format("%H:%M:%S");
        self.logs.push(format!("{ts} {}", line.into()));
        if self.logs.len() > MAX_LOGS {
            let excess = self.logs.len() - MAX_LOGS;
            self.logs.drain(0..excess);
        }
    }
}
