//! Simulated remote writes with optimistic apply and rollback on failure.
//!
//! `attempt_write` applies a mutation synchronously, then settles on a tokio
//! task after a fixed delay. The outcome comes from an [`OutcomeSource`], so
//! callers can swap the production random draw for a fixed or scripted one.
//! Failures are outcome values, never errors, and a started write always
//! settles exactly once.

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use tokio::{runtime::Handle, task::JoinHandle, time::Instant};

use crate::config::WriteConfig;

pub const DEFAULT_FAILURE_MESSAGE: &str = "The remote write failed.";

pub type WriteId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WriteOutcome {
    Succeeded,
    Failed { message: String },
}

impl WriteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Decides whether a simulated write succeeds. `true` means success.
pub trait OutcomeSource: Send + Sync {
    fn draw(&self) -> bool;
}

#[derive(Debug, Clone, Copy)]
pub struct RandomOutcome {
    success_probability: f64,
}

impl RandomOutcome {
    pub fn new(success_probability: f64) -> Self {
        let success_probability = if success_probability.is_finite() {
            success_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            success_probability,
        }
    }

    pub fn success_probability(&self) -> f64 {
        self.success_probability
    }
}

impl OutcomeSource for RandomOutcome {
    fn draw(&self) -> bool {
        rand::thread_rng().gen_bool(self.success_probability)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedOutcome(pub bool);

impl FixedOutcome {
    pub fn success() -> Self {
        Self(true)
    }

    pub fn failure() -> Self {
        Self(false)
    }
}

impl OutcomeSource for FixedOutcome {
    fn draw(&self) -> bool {
        self.0
    }
}

/// Hands out queued outcomes in order, then `fallback` once the queue is empty.
#[derive(Debug)]
pub struct ScriptedOutcomes {
    queue: Mutex<VecDeque<bool>>,
    fallback: bool,
}

impl ScriptedOutcomes {
    pub fn new(outcomes: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            queue: Mutex::new(outcomes.into_iter().collect()),
            fallback,
        }
    }

    pub fn push(&self, outcome: bool) {
        self.queue.lock().push_back(outcome);
    }
}

impl OutcomeSource for ScriptedOutcomes {
    fn draw(&self) -> bool {
        self.queue.lock().pop_front().unwrap_or(self.fallback)
    }
}

/// Handle to a write that has been applied but may not have settled yet.
/// Dropping it does not cancel the write.
#[derive(Debug)]
pub struct PendingWrite {
    id: WriteId,
    handle: JoinHandle<WriteOutcome>,
}

impl PendingWrite {
    pub fn id(&self) -> WriteId {
        self.id
    }

    pub fn is_settled(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn settled(self) -> WriteOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(write_id = self.id, error = %e, "write settlement task failed");
                WriteOutcome::Failed {
                    message: format!("Write {} did not settle: {e}", self.id),
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct WriteSimulator {
    delay: Duration,
    outcomes: Arc<dyn OutcomeSource>,
    runtime: Handle,
    failure_message: String,
    write_counter: Arc<AtomicU64>,
}

impl WriteSimulator {
    pub fn new(delay: Duration, outcomes: Arc<dyn OutcomeSource>, runtime: Handle) -> Self {
        Self {
            delay,
            outcomes,
            runtime,
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            write_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn from_config(config: &WriteConfig, runtime: Handle) -> Self {
        Self::new(
            config.delay(),
            Arc::new(RandomOutcome::new(config.success_probability)),
            runtime,
        )
    }

    pub fn with_outcomes(mut self, outcomes: Arc<dyn OutcomeSource>) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_failure_message(mut self, message: impl Into<String>) -> Self {
        self.failure_message = message.into();
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `apply` now, then settles after the configured delay: `rollback`
    /// runs only on failure, and `on_settled` runs once with the outcome.
    pub fn attempt_write<A, R, S>(&self, apply: A, rollback: R, on_settled: S) -> PendingWrite
    where
        A: FnOnce(),
        R: FnOnce() + Send + 'static,
        S: FnOnce(&WriteOutcome) + Send + 'static,
    {
        let id = self.write_counter.fetch_add(1, Ordering::Relaxed) + 1;
        apply();

        let deadline = Instant::now() + self.delay;
        let outcomes = Arc::clone(&self.outcomes);
        let failure_message = self.failure_message.clone();
        tracing::debug!(write_id = id, delay_ms = self.delay.as_millis() as u64, "write applied optimistically");

        let settlement = Settlement {
            id,
            callbacks: Some((rollback, on_settled)),
        };
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let success = outcomes.draw();
            settlement.finish(success, failure_message)
        });

        PendingWrite { id, handle }
    }
}

/// Rollback and settle callbacks of one write. If the settle task is dropped
/// before it finishes (runtime shutdown, panic in the outcome source) the
/// write settles as failed on drop, so locks held by the caller are released.
struct Settlement<R, S>
where
    R: FnOnce(),
    S: FnOnce(&WriteOutcome),
{
    id: WriteId,
    callbacks: Option<(R, S)>,
}

impl<R, S> Settlement<R, S>
where
    R: FnOnce(),
    S: FnOnce(&WriteOutcome),
{
    fn finish(mut self, success: bool, failure_message: String) -> WriteOutcome {
        let outcome = if success {
            WriteOutcome::Succeeded
        } else {
            WriteOutcome::Failed {
                message: failure_message,
            }
        };
        self.settle(&outcome);
        outcome
    }

    fn settle(&mut self, outcome: &WriteOutcome) {
        let Some((rollback, on_settled)) = self.callbacks.take() else {
            return;
        };
        if !outcome.is_success() {
            rollback();
        }
        tracing::debug!(write_id = self.id, success = outcome.is_success(), "write settled");
        on_settled(outcome);
    }
}

impl<R, S> Drop for Settlement<R, S>
where
    R: FnOnce(),
    S: FnOnce(&WriteOutcome),
{
    fn drop(&mut self) {
        if self.callbacks.is_some() {
            tracing::warn!(write_id = self.id, "write abandoned before settling, rolling back");
            let outcome = WriteOutcome::Failed {
                message: format!("Write {} was abandoned before settling", self.id),
            };
            self.settle(&outcome);
        }
    }
}

impl std::fmt::Debug for WriteSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteSimulator")
            .field("delay", &self.delay)
            .field("failure_message", &self.failure_message)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn simulator(outcome: bool) -> WriteSimulator {
        WriteSimulator::new(
            Duration::from_millis(1000),
            Arc::new(FixedOutcome(outcome)),
            Handle::current(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn apply_runs_before_attempt_returns() {
        let value = Arc::new(Mutex::new(0));
        let applied = Arc::clone(&value);
        let pending = simulator(true).attempt_write(|| *applied.lock() = 1, || {}, |_| {});
        assert_eq!(*value.lock(), 1);
        assert!(!pending.is_settled());
        assert_eq!(pending.settled().await, WriteOutcome::Succeeded);
    }

    #[tokio::test(start_paused = true)]
    async fn success_skips_rollback() {
        let value = Arc::new(Mutex::new(0));
        let (applied, rolled_back) = (Arc::clone(&value), Arc::clone(&value));
        let seen = Arc::new(Mutex::new(None));
        let seen_in_settle = Arc::clone(&seen);

        let outcome = simulator(true)
            .attempt_write(
                move || *applied.lock() = 5,
                move || *rolled_back.lock() = 0,
                move |outcome| *seen_in_settle.lock() = Some(outcome.clone()),
            )
            .settled()
            .await;

        assert!(outcome.is_success());
        assert_eq!(*value.lock(), 5);
        assert_eq!(*seen.lock(), Some(WriteOutcome::Succeeded));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_rolls_back_once_then_reports() {
        let value = Arc::new(Mutex::new(1));
        let rollbacks = Arc::new(AtomicUsize::new(0));
        let (applied, rolled_back) = (Arc::clone(&value), Arc::clone(&value));
        let counter = Arc::clone(&rollbacks);
        let value_at_settle = Arc::new(Mutex::new(None));
        let observed = Arc::clone(&value_at_settle);
        let observed_value = Arc::clone(&value);

        let outcome = simulator(false)
            .with_failure_message("nope")
            .attempt_write(
                move || *applied.lock() = 2,
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    *rolled_back.lock() = 1;
                },
                move |_| *observed.lock() = Some(*observed_value.lock()),
            )
            .settled()
            .await;

        assert_eq!(
            outcome,
            WriteOutcome::Failed {
                message: "nope".to_string()
            }
        );
        assert_eq!(rollbacks.load(Ordering::SeqCst), 1);
        assert_eq!(*value.lock(), 1);
        // rollback has already happened when the settle callback runs
        assert_eq!(*value_at_settle.lock(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn outcome_waits_for_full_delay() {
        let pending = simulator(true).attempt_write(|| {}, || {}, |_| {});
        tokio::time::advance(Duration::from_millis(999)).await;
        tokio::task::yield_now().await;
        assert!(!pending.is_settled());
        let started = Instant::now();
        pending.settled().await;
        assert!(Instant::now() - started <= Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_still_settles() {
        let settled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&settled);
        drop(simulator(false).attempt_write(
            || {},
            || {},
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        ));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(settled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn runtime_shutdown_settles_abandoned_write() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime");
        let simulator = WriteSimulator::new(
            Duration::from_secs(60),
            Arc::new(FixedOutcome::success()),
            runtime.handle().clone(),
        );
        let value = Arc::new(Mutex::new(1));
        let (applied, rolled_back) = (Arc::clone(&value), Arc::clone(&value));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_settle = Arc::clone(&seen);

        let pending = simulator.attempt_write(
            move || *applied.lock() = 2,
            move || *rolled_back.lock() = 1,
            move |outcome| seen_in_settle.lock().push(outcome.is_success()),
        );
        assert_eq!(*value.lock(), 2);

        drop(simulator);
        drop(runtime);
        assert_eq!(*value.lock(), 1);
        assert_eq!(*seen.lock(), vec![false]);
        drop(pending);
    }

    #[test]
    fn scripted_outcomes_fall_back_when_exhausted() {
        let script = ScriptedOutcomes::new([false, true], false);
        assert!(!script.draw());
        assert!(script.draw());
        assert!(!script.draw());
        script.push(true);
        assert!(script.draw());
    }

    #[test]
    fn random_outcome_respects_extremes() {
        let always = RandomOutcome::new(1.0);
        let never = RandomOutcome::new(0.0);
        for _ in 0..100 {
            assert!(always.draw());
            assert!(!never.draw());
        }
        assert_eq!(RandomOutcome::new(3.0).success_probability(), 1.0);
        assert_eq!(RandomOutcome::new(f64::NAN).success_probability(), 0.0);
    }
}
