use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::TaskHandle;
use crate::error::WorkError;
use crate::shutdown::ShutdownSignal;

/// The unit of work run for each execution attempt.
///
/// Implementations may watch `shutdown` and return [`WorkError::Cancelled`]
/// to abort early; the core imposes no timeout of its own.
#[async_trait]
pub trait Work: Send + Sync {
    async fn perform(
        &self,
        task: &TaskHandle,
        shutdown: &mut ShutdownSignal,
    ) -> Result<(), WorkError>;
}

/// Stand-in workload: sleeps 100..=400ms in 100ms steps, then fails with
/// `failure_rate` probability.
pub struct SimulatedWork {
    failure_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedWork {
    pub const DEFAULT_FAILURE_RATE: f64 = 0.2;

    const STEP: Duration = Duration::from_millis(100);

    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic durations and outcomes, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            failure_rate: Self::DEFAULT_FAILURE_RATE,
            rng: Mutex::new(rng),
        }
    }

    /// Clamped to `0.0..=1.0`.
    pub fn with_failure_rate(mut self, failure_rate: f64) -> Self {
        self.failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        self
    }

    fn roll(&self) -> (Duration, bool) {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let steps: u32 = rng.gen_range(0..4);
        let fails = rng.gen_bool(self.failure_rate);
        (Self::STEP + Self::STEP * steps, fails)
    }
}

impl Default for SimulatedWork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Work for SimulatedWork {
    async fn perform(
        &self,
        _task: &TaskHandle,
        shutdown: &mut ShutdownSignal,
    ) -> Result<(), WorkError> {
        let (duration, fails) = self.roll();

        tokio::select! {
            _ = shutdown.cancelled() => return Err(WorkError::Cancelled),
            _ = tokio::time::sleep(duration) => {}
        }

        if fails {
            return Err(WorkError::Failed("simulated processing failed".to_string()));
        }
        Ok(())
    }
}
