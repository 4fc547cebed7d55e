//! Round state machine for one play session.
//!
//! This module is free of timers and I/O: [`SessionState::begin_roll`] marks a
//! roll in flight and [`SessionState::resolve`] applies a drawn [`RollResult`].
//! The engine sequences the two across the resolution delay.
//!
//! ## Phases
//!
//! - **Idle** - no face chosen yet
//! - **Ready** - face chosen, rounds remaining, no roll in flight
//! - **Resolving** - roll accepted, waiting for resolution
//! - **Exhausted** - every round played; face selection is still allowed

use crate::scoring;
use dice_types::{DieFace, RollResult, MAX_ROUNDS};

/// Observable phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Ready,
    Resolving,
    Exhausted,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Ready => "ready",
            Phase::Resolving => "resolving",
            Phase::Exhausted => "exhausted",
        }
    }
}

/// Result of one resolved round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Face the roll was wagered on (captured when the roll was accepted).
    pub face: DieFace,
    pub roll: RollResult,
    pub hits: u8,
    pub award: u64,
    pub cumulative_score: u64,
    pub rounds_played: u8,
    /// Best score after this round.
    pub best_score: u64,
    /// Whether this round strictly raised the best score.
    pub new_best: bool,
}

/// The face and dice of the most recent round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Round {
    face: DieFace,
    roll: RollResult,
}

/// Mutable state of one play session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    chosen_face: Option<DieFace>,
    last_round: Option<Round>,
    cumulative_score: u64,
    best_score: u64,
    rounds_played: u8,
    /// Face captured by the roll in flight; `Some` exactly while resolving.
    pending_face: Option<DieFace>,
}

impl SessionState {
    /// Fresh session carrying the persisted best score.
    pub fn new(best_score: u64) -> Self {
        Self {
            chosen_face: None,
            last_round: None,
            cumulative_score: 0,
            best_score,
            rounds_played: 0,
            pending_face: None,
        }
    }

    /// Discard the session, keeping only `best_score`.
    pub fn reset(&mut self, best_score: u64) {
        *self = Self::new(best_score);
    }

    pub fn phase(&self) -> Phase {
        if self.is_resolving() {
            Phase::Resolving
        } else if self.rounds_played >= MAX_ROUNDS {
            Phase::Exhausted
        } else if self.chosen_face.is_none() {
            Phase::Idle
        } else {
            Phase::Ready
        }
    }

    pub fn chosen_face(&self) -> Option<DieFace> {
        self.chosen_face
    }

    pub fn last_roll(&self) -> Option<RollResult> {
        self.last_round.map(|round| round.roll)
    }

    /// Dice of the last roll matching the face it was wagered on.
    pub fn hit_count(&self) -> u8 {
        self.last_round
            .map_or(0, |round| scoring::hit_count(Some(round.face), &round.roll))
    }

    /// Points gained in the most recent round.
    pub fn last_round_award(&self) -> u64 {
        scoring::award(self.hit_count())
    }

    pub fn cumulative_score(&self) -> u64 {
        self.cumulative_score
    }

    pub fn best_score(&self) -> u64 {
        self.best_score
    }

    pub fn rounds_played(&self) -> u8 {
        self.rounds_played
    }

    pub fn rounds_remaining(&self) -> u8 {
        MAX_ROUNDS.saturating_sub(self.rounds_played)
    }

    pub fn is_resolving(&self) -> bool {
        self.pending_face.is_some()
    }

    /// Select the face to wager on. Ignored (returns `false`) while a roll is
    /// in flight.
    pub fn choose_face(&mut self, face: DieFace) -> bool {
        if self.is_resolving() {
            return false;
        }
        self.chosen_face = Some(face);
        true
    }

    /// Accept a roll request, returning the face it is wagered on.
    ///
    /// Returns `None` (and changes nothing) unless a face is chosen, rounds
    /// remain, and no roll is already in flight.
    pub fn begin_roll(&mut self) -> Option<DieFace> {
        if self.phase() != Phase::Ready {
            return None;
        }
        let face = self.chosen_face?;
        self.pending_face = Some(face);
        Some(face)
    }

    /// Apply the dice of the roll in flight.
    ///
    /// Returns `None` if no roll is in flight.
    pub fn resolve(&mut self, roll: RollResult) -> Option<RoundOutcome> {
        let face = self.pending_face.take()?;
        let round = Round { face, roll };
        self.last_round = Some(round);

        let hits = self.hit_count();
        let award = scoring::award(hits);
        self.cumulative_score = self.cumulative_score.saturating_add(award);
        self.rounds_played += 1;

        let new_best = self.cumulative_score > self.best_score;
        if new_best {
            self.best_score = self.cumulative_score;
        }

        Some(RoundOutcome {
            face,
            roll,
            hits,
            award,
            cumulative_score: self.cumulative_score,
            rounds_played: self.rounds_played,
            best_score: self.best_score,
            new_best,
        })
    }
}
