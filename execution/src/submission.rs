//! Score submission deduplication.
//!
//! The gate is a client-side guard: it keeps one session from submitting a
//! zero, stale or duplicate score. The recording service stays the authority.

use dice_types::SubmissionReceipt;
use std::{error::Error as StdError, future::Future};
use thiserror::Error;

/// Reasons a submission was refused or failed.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no player address; log in to save your score")]
    MissingPlayer,
    #[error("score is zero; play and earn some points before saving")]
    ZeroScore,
    #[error("score {score} already saved (last saved {last_submitted}); try to get a higher score")]
    AlreadySaved { score: u64, last_submitted: u64 },
    #[error("a submission for score {0} is already in flight")]
    InFlight(u64),
    #[error("failed to save score: {0}")]
    Failed(#[source] Box<dyn StdError + Send + Sync>),
}

/// External service that records scores.
pub trait ScoreSubmitter {
    type Error: StdError + Send + Sync + 'static;

    /// Record `score` for `player`, resolving once the service confirms.
    fn submit_score(
        &self,
        player: &str,
        score: u64,
    ) -> impl Future<Output = Result<SubmissionReceipt, Self::Error>> + Send;
}

/// Tracks the last confirmed submission of the current session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionGate {
    last_submitted: u64,
    in_flight: Option<u64>,
}

impl SubmissionGate {
    pub fn last_submitted_score(&self) -> u64 {
        self.last_submitted
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Check whether `score` may be submitted now.
    pub fn check(&self, score: u64) -> Result<(), SubmitError> {
        if score == 0 {
            return Err(SubmitError::ZeroScore);
        }
        if score <= self.last_submitted {
            return Err(SubmitError::AlreadySaved {
                score,
                last_submitted: self.last_submitted,
            });
        }
        if let Some(outstanding) = self.in_flight {
            return Err(SubmitError::InFlight(outstanding));
        }
        Ok(())
    }

    pub fn can_submit(&self, score: u64) -> bool {
        self.check(score).is_ok()
    }

    /// Mark a submission of `score` as outstanding.
    pub fn begin(&mut self, score: u64) -> Result<(), SubmitError> {
        self.check(score)?;
        self.in_flight = Some(score);
        Ok(())
    }

    /// Clear the outstanding submission of `score`, whatever its outcome.
    /// Returns `false` if `score` is not the one in flight.
    pub fn finish(&mut self, score: u64) -> bool {
        if self.in_flight != Some(score) {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Record a submission the service confirmed. The record never moves
    /// backwards.
    pub fn record_submission(&mut self, score: u64) {
        self.last_submitted = self.last_submitted.max(score);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_score_never_submits() {
        let gate = SubmissionGate::default();
        assert!(!gate.can_submit(0));
        assert!(matches!(gate.check(0), Err(SubmitError::ZeroScore)));
    }

    #[test]
    fn test_record_blocks_same_and_lower() {
        let mut gate = SubmissionGate::default();
        assert!(gate.can_submit(250));

        gate.record_submission(250);
        assert!(!gate.can_submit(250));
        assert!(!gate.can_submit(100));
        assert!(gate.can_submit(251));
        assert!(gate.can_submit(260));
        assert!(matches!(
            gate.check(200),
            Err(SubmitError::AlreadySaved {
                score: 200,
                last_submitted: 250
            })
        ));
    }

    #[test]
    fn test_in_flight_blocks_duplicate() {
        let mut gate = SubmissionGate::default();
        gate.begin(400).unwrap();
        assert!(matches!(gate.begin(400), Err(SubmitError::InFlight(400))));
        assert!(!gate.can_submit(300));
        assert!(matches!(gate.begin(500), Err(SubmitError::InFlight(400))));

        assert!(!gate.finish(500));
        assert_eq!(gate.in_flight(), Some(400));
        assert!(gate.finish(400));
        assert!(gate.can_submit(500));
    }

    #[test]
    fn test_late_confirmation_never_lowers_record() {
        let mut gate = SubmissionGate::default();
        gate.record_submission(200);
        gate.record_submission(100);
        assert_eq!(gate.last_submitted_score(), 200);
        assert!(!gate.can_submit(200));
    }

    #[test]
    fn test_failed_submission_leaves_record_untouched() {
        let mut gate = SubmissionGate::default();
        gate.record_submission(100);
        gate.begin(400).unwrap();
        assert!(gate.finish(400));
        assert_eq!(gate.last_submitted_score(), 100);
        assert!(gate.can_submit(400));
    }

    #[test]
    fn test_reset() {
        let mut gate = SubmissionGate::default();
        gate.record_submission(900);
        gate.begin(1_000).unwrap();
        gate.reset();
        assert_eq!(gate, SubmissionGate::default());
        assert!(gate.can_submit(100));
    }
}
