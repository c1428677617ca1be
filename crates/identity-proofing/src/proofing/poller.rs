use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use super::store::{ResultId, ResultStore, StoreError};
use super::vendor_result::VendorResult;

/// What a single poll observed. `Absent` covers never-written, still-running and expired ids
/// alike; callers cannot and need not tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Ready(VendorResult),
    Absent,
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Backoff used by [`ResultPoller::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub ceiling: Duration,
}

impl PollPolicy {
    pub fn with_ceiling(ceiling: Duration) -> Self {
        Self {
            ceiling,
            ..Self::default()
        }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_delay)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            ceiling: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("no result for '{result_id}' after {waited:?}")]
    TimedOut { result_id: ResultId, waited: Duration },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Read side of the result store. Never writes and never blocks on a job.
pub struct ResultPoller<S> {
    store: Arc<S>,
    policy: PollPolicy,
}

impl<S> ResultPoller<S>
where
    S: ResultStore + 'static,
{
    pub fn new(store: Arc<S>, policy: PollPolicy) -> Self {
        Self { store, policy }
    }

    pub fn load(&self, result_id: &ResultId) -> Result<PollOutcome, StoreError> {
        Ok(match self.store.load(result_id)? {
            Some(entry) => PollOutcome::Ready(entry.result),
            None => PollOutcome::Absent,
        })
    }

    /// Poll with exponential backoff until a result appears or the ceiling elapses.
    pub async fn wait(&self, result_id: &ResultId) -> Result<VendorResult, PollError> {
        let started = Instant::now();
        let mut delay = self.policy.initial_delay;
        loop {
            if let PollOutcome::Ready(result) = self.load(result_id)? {
                return Ok(result);
            }

            let waited = started.elapsed();
            if waited >= self.policy.ceiling {
                return Err(PollError::TimedOut {
                    result_id: result_id.clone(),
                    waited,
                });
            }

            let remaining = self.policy.ceiling - waited;
            debug!(%result_id, ?delay, "proofing result not ready");
            sleep(delay.min(remaining)).await;
            delay = self.policy.next_delay(delay);
        }
    }
}
