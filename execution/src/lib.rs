//! Dice wager session engine.
//!
//! A player picks a target face, rolls three dice up to ten times per session,
//! and accumulates a score from the number of dice matching the chosen face.
//!
//! The crate is split along the seams the front end talks to:
//! - [`RandomSource`] produces die faces.
//! - [`scoring`] maps a hit count to a point award.
//! - [`SessionState`] is the pure round state machine.
//! - [`SessionEngine`] drives the state machine with a delayed, cancellable roll
//!   resolution, persists new best scores through a [`BestScoreStore`], and gates
//!   score submissions through a [`SubmissionGate`].
//!
//! ## Invariants
//! - `rounds_played` never exceeds [`MAX_ROUNDS`](dice_types::MAX_ROUNDS) and grows by one per
//!   resolved roll.
//! - `cumulative_score` is the sum of every round award in the session.
//! - `best_score >= cumulative_score`, and the persisted best never decreases.
//! - A roll cancelled by a new session or by teardown never applies.
//!
//! ## Example
//! ```rust,ignore
//! use dice_execution::{DiceRng, EngineConfig, MemoryBestScore, SessionEngine};
//! use dice_types::DieFace;
//!
//! # async fn example() {
//! let engine = SessionEngine::new(
//!     EngineConfig::default(),
//!     DiceRng::from_entropy(),
//!     MemoryBestScore::default(),
//! );
//! engine.choose_face(DieFace::FOUR);
//! if let Some(pending) = engine.request_roll() {
//!     if let Some(outcome) = pending.await {
//!         println!("rolled {} for {} points", outcome.roll, outcome.award);
//!     }
//! }
//! # }
//! ```

pub mod engine;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod store;
pub mod submission;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use engine::{
    EngineConfig, PendingRoll, SessionEngine, SessionSnapshot, DEFAULT_RESOLVE_DELAY,
};
pub use rng::{DiceRng, RandomSource};
pub use session::{Phase, RoundOutcome, SessionState};
pub use store::{BestScoreStore, FileBestScore, MemoryBestScore, SqliteBestScore, BEST_SCORE_KEY};
pub use submission::{ScoreSubmitter, SubmissionGate, SubmitError};
