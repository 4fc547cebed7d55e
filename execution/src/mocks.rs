//! Deterministic collaborators for tests.

use crate::{rng::RandomSource, submission::ScoreSubmitter};
use dice_types::{DieFace, SubmissionReceipt};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};
use thiserror::Error;

/// Replays a fixed sequence of faces, cycling when it runs out.
#[derive(Clone, Debug)]
pub struct ScriptedDice {
    faces: Vec<DieFace>,
    next: usize,
}

impl ScriptedDice {
    pub fn new(faces: Vec<DieFace>) -> Self {
        assert!(!faces.is_empty(), "scripted dice need at least one face");
        Self { faces, next: 0 }
    }

    /// Every die lands on `face`.
    pub fn repeat(face: DieFace) -> Self {
        Self::new(vec![face])
    }

    /// Build from raw values, panicking on anything outside `1..=6`.
    pub fn from_values(values: &[u8]) -> Self {
        Self::new(
            values
                .iter()
                .map(|&value| DieFace::new(value).expect("scripted face out of range"))
                .collect(),
        )
    }
}

impl RandomSource for ScriptedDice {
    fn roll_die(&mut self) -> DieFace {
        let face = self.faces[self.next % self.faces.len()];
        self.next += 1;
        face
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct MockSubmitError(pub String);

/// Score service that records calls and answers according to a switch.
#[derive(Debug, Default)]
pub struct MockSubmitter {
    fail: AtomicBool,
    calls: AtomicUsize,
    submitted: Mutex<Vec<(String, u64)>>,
}

impl MockSubmitter {
    pub fn failing() -> Self {
        let submitter = Self::default();
        submitter.set_failing(true);
        submitter
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(String, u64)> {
        self.submitted
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ScoreSubmitter for MockSubmitter {
    type Error = MockSubmitError;

    fn submit_score(
        &self,
        player: &str,
        score: u64,
    ) -> impl Future<Output = Result<SubmissionReceipt, Self::Error>> + Send {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.fail.load(Ordering::SeqCst) {
            Err(MockSubmitError("service unavailable".to_string()))
        } else {
            self.submitted
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push((player.to_string(), score));
            Ok(SubmissionReceipt {
                score,
                transaction_hash: format!("0x{call:064x}"),
            })
        };
        async move { result }
    }
}
