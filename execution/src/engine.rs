//! Session engine: drives [`SessionState`] with a delayed, cancellable roll.
//!
//! An accepted roll moves the session into `Resolving` immediately and spawns a
//! task that sleeps for [`EngineConfig::resolve_delay`] before drawing the dice.
//! The delay only paces the front end's rolling animation.
//!
//! Every spawned resolution carries the session generation it was accepted in.
//! [`SessionEngine::new_session`] and teardown bump the generation and abort the
//! task, so a resolution that still fires finds a newer generation and does
//! nothing.
//!
//! The state lives behind a mutex only because the resolution task and the
//! caller are separate tasks. The lock is never held across an await, and the
//! best-score store is written after it is released.

use crate::{
    rng::RandomSource,
    session::{RoundOutcome, SessionState},
    store::BestScoreStore,
    submission::{ScoreSubmitter, SubmissionGate, SubmitError},
};
use dice_types::{DieFace, SubmissionReceipt};
use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
    time::Duration,
};
use tokio::{
    runtime::Handle,
    sync::{oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

/// Default time between accepting a roll and resolving it.
pub const DEFAULT_RESOLVE_DELAY: Duration = Duration::from_millis(2_500);

/// Engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Delay between accepting a roll and drawing its dice.
    pub resolve_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolve_delay: DEFAULT_RESOLVE_DELAY,
        }
    }
}

/// Everything a front end renders after a state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub last_submitted_score: u64,
    /// Whether the current score may be submitted now.
    pub can_submit: bool,
}

/// A roll that has been accepted but not yet resolved.
///
/// Resolves to `None` if the roll was cancelled by a new session or teardown.
#[derive(Debug)]
pub struct PendingRoll {
    face: DieFace,
    receiver: oneshot::Receiver<RoundOutcome>,
}

impl PendingRoll {
    /// Face the roll is wagered on.
    pub fn face(&self) -> DieFace {
        self.face
    }
}

impl Future for PendingRoll {
    type Output = Option<RoundOutcome>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(Result::ok)
    }
}

struct Inner<R, S> {
    state: SessionState,
    gate: SubmissionGate,
    rng: R,
    store: Arc<Mutex<S>>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
    closed: bool,
    updates: watch::Sender<SessionSnapshot>,
}

impl<R, S> Inner<R, S> {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            last_submitted_score: self.gate.last_submitted_score(),
            can_submit: self.gate.can_submit(self.state.cumulative_score()),
        }
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }

    fn cancel_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.pending.take() {
            handle.abort();
            debug!(generation = self.generation, "cancelled pending roll");
        }
    }
}

impl<R: RandomSource, S> Inner<R, S> {
    fn resolve(&mut self, generation: u64) -> Option<RoundOutcome> {
        if self.closed || generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale roll");
            return None;
        }
        self.pending = None;

        let roll = self.rng.roll();
        let outcome = self.state.resolve(roll)?;
        info!(
            face = %outcome.face,
            roll = %outcome.roll,
            hits = outcome.hits,
            award = outcome.award,
            score = outcome.cumulative_score,
            rounds = outcome.rounds_played,
            "round resolved"
        );
        self.publish();
        Some(outcome)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the in-flight mark of a submission dropped before the service
/// answered.
struct InFlight<'a, R, S> {
    inner: &'a Mutex<Inner<R, S>>,
    score: u64,
    generation: u64,
    armed: bool,
}

impl<R, S> Drop for InFlight<'_, R, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = lock(self.inner);
        if inner.generation == self.generation && inner.gate.finish(self.score) {
            debug!(score = self.score, "submission abandoned");
            inner.publish();
        }
    }
}

/// Round-by-round engine for a single player's sessions.
pub struct SessionEngine<R, S> {
    config: EngineConfig,
    inner: Arc<Mutex<Inner<R, S>>>,
}

impl<R, S> SessionEngine<R, S>
where
    R: RandomSource + Send + 'static,
    S: BestScoreStore + Send + 'static,
{
    /// Create an engine with a fresh session, loading the best score from `store`.
    pub fn new(config: EngineConfig, rng: R, store: S) -> Self {
        let best_score = store.load();
        let state = SessionState::new(best_score);
        let gate = SubmissionGate::default();
        let (updates, _) = watch::channel(SessionSnapshot {
            state: state.clone(),
            last_submitted_score: 0,
            can_submit: false,
        });
        info!(best_score, delay = ?config.resolve_delay, "session engine started");
        Self {
            config,
            inner: Arc::new(Mutex::new(Inner {
                state,
                gate,
                rng,
                store: Arc::new(Mutex::new(store)),
                generation: 0,
                pending: None,
                closed: false,
                updates,
            })),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.inner).snapshot()
    }

    pub fn state(&self) -> SessionState {
        lock(&self.inner).state.clone()
    }

    /// Receive a snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        lock(&self.inner).updates.subscribe()
    }

    pub fn last_submitted_score(&self) -> u64 {
        lock(&self.inner).gate.last_submitted_score()
    }

    /// Whether the current score may be submitted.
    pub fn can_submit(&self) -> bool {
        let inner = lock(&self.inner);
        inner.gate.can_submit(inner.state.cumulative_score())
    }

    /// Select the face to wager on. Returns `false` if ignored because a roll
    /// is in flight.
    pub fn choose_face(&self, face: DieFace) -> bool {
        let mut inner = lock(&self.inner);
        if !inner.state.choose_face(face) {
            debug!(%face, "face selection ignored while resolving");
            return false;
        }
        inner.publish();
        true
    }

    /// Request a roll.
    ///
    /// Returns `None` without changing anything unless a face is chosen,
    /// rounds remain, no roll is in flight, and the engine runs inside a tokio
    /// runtime.
    pub fn request_roll(&self) -> Option<PendingRoll> {
        let mut inner = lock(&self.inner);
        if inner.closed {
            debug!("roll ignored after shutdown");
            return None;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("roll requested outside a tokio runtime");
            return None;
        };
        let Some(face) = inner.state.begin_roll() else {
            debug!(phase = inner.state.phase().as_str(), "roll ignored");
            return None;
        };

        let generation = inner.generation;
        let delay = self.config.resolve_delay;
        let shared = Arc::clone(&self.inner);
        let store = Arc::clone(&inner.store);
        let (sender, receiver) = oneshot::channel();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut engine = lock(&shared);
            let Some(outcome) = engine.resolve(generation) else {
                return;
            };
            // The store is claimed before the engine is released so a new
            // session cannot load the previous best in between.
            let best = outcome.new_best.then(|| lock(&store));
            drop(engine);
            if let Some(best) = best {
                best.save(outcome.best_score);
                info!(best_score = outcome.best_score, "new best score");
            }
            let _ = sender.send(outcome);
        });
        inner.pending = Some(handle);
        inner.publish();
        debug!(%face, generation, "roll accepted");

        Some(PendingRoll { face, receiver })
    }

    /// Start a new session: cancel any pending roll, reload the best score,
    /// and reset the submission record.
    pub fn new_session(&self) {
        let mut inner = lock(&self.inner);
        inner.cancel_pending();
        let best_score = lock(&inner.store).load();
        inner.state.reset(best_score);
        inner.gate.reset();
        inner.publish();
        info!(best_score, "new session");
    }

    /// Submit the current score through `submitter`.
    ///
    /// The submission record only advances once the service confirms.
    pub async fn submit_score<T: ScoreSubmitter>(
        &self,
        submitter: &T,
        player: Option<&str>,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let player = player
            .filter(|player| !player.is_empty())
            .ok_or(SubmitError::MissingPlayer)?;

        let (score, generation) = {
            let mut inner = lock(&self.inner);
            let score = inner.state.cumulative_score();
            if let Err(err) = inner.gate.begin(score) {
                debug!(score, %err, "submission refused");
                return Err(err);
            }
            inner.publish();
            (score, inner.generation)
        };

        let mut in_flight = InFlight {
            inner: &self.inner,
            score,
            generation,
            armed: true,
        };
        info!(player, score, "submitting score");
        let result = submitter.submit_score(player, score).await;
        in_flight.armed = false;

        let mut inner = lock(&self.inner);
        if inner.generation != generation {
            // The session this score belongs to is gone; its gate was reset.
            return match result {
                Ok(receipt) => {
                    info!(score, tx = %receipt.transaction_hash, "score saved for a previous session");
                    Ok(receipt)
                }
                Err(err) => Err(SubmitError::Failed(Box::new(err))),
            };
        }
        inner.gate.finish(score);
        let outcome = match result {
            Ok(receipt) => {
                inner.gate.record_submission(score);
                info!(score, tx = %receipt.transaction_hash, "score saved");
                Ok(receipt)
            }
            Err(err) => {
                warn!(score, %err, "score submission failed");
                Err(SubmitError::Failed(Box::new(err)))
            }
        };
        inner.publish();
        outcome
    }
}

impl<R, S> SessionEngine<R, S> {
    /// Tear the engine down. A pending roll is cancelled and later requests
    /// are ignored.
    pub fn shutdown(&self) {
        let mut inner = lock(&self.inner);
        if !inner.closed {
            inner.closed = true;
            inner.cancel_pending();
        }
    }
}

impl<R, S> Drop for SessionEngine<R, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
