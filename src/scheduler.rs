use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

use crate::comparison::{windows_for, Calculator};
use crate::exposition::PublishedResults;
use crate::metrics;
use crate::models::{ComparisonConfig, ComparisonResult};
use crate::store::ConfigStore;

/// Clears the in-flight flag when a pass ends, however it ends.
struct PassGuard(Arc<AtomicBool>);

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives calculation passes on a fixed interval, at most one at a time.
pub struct Scheduler {
    store: Arc<ConfigStore>,
    published: Arc<PublishedResults>,
    calculator: Calculator,
    interval: Duration,
    in_flight: Arc<AtomicBool>,
    /// What each config published on the last pass, in config order.
    last_outputs: Mutex<Vec<(ComparisonConfig, Vec<ComparisonResult>)>>,
}

impl Scheduler {
    pub fn new(
        store: Arc<ConfigStore>,
        published: Arc<PublishedResults>,
        calculator: Calculator,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            published,
            calculator,
            interval,
            in_flight: Arc::new(AtomicBool::new(false)),
            last_outputs: Mutex::new(Vec::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Starts a pass in the background unless one is already running.
    /// Returns whether a pass was started.
    pub fn try_spawn_pass(self: &Arc<Self>) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("previous pass still running, dropping tick");
            metrics::record_skipped_pass();
            return false;
        }

        let guard = PassGuard(self.in_flight.clone());
        let this = Arc::clone(self);
        let span = tracing::info_span!("pass", id = %Uuid::new_v4());
        tokio::spawn(
            async move {
                let _guard = guard;
                this.run_pass().await;
            }
            .instrument(span),
        );
        true
    }

    /// Computes every configured comparison and publishes the combined set.
    ///
    /// A config that fails keeps whatever it published last time. Carry-over
    /// follows the config itself, so configs sharing an output name never
    /// pick up each other's results.
    pub async fn run_pass(&self) {
        let configs = self.store.read().await;
        let mut previous = std::mem::take(&mut *self.last_outputs.lock());
        let mut outputs: Vec<(ComparisonConfig, Vec<ComparisonResult>)> = Vec::with_capacity(configs.len());

        for config in configs.iter() {
            let outcome = match windows_for(config, &Local::now()) {
                Ok(windows) => self.calculator.run(config, &windows).await,
                Err(e) => Err(e),
            };
            let results = match outcome {
                Ok(results) => results,
                Err(e) => {
                    warn!(name = %config.prom_expr, error = %e, "comparison failed, keeping previous results");
                    metrics::record_config_failure(e.reason());
                    // Removing the slot lets identical configs each claim their own.
                    previous
                        .iter()
                        .position(|(prev, _)| prev == config)
                        .map(|i| previous.remove(i).1)
                        .unwrap_or_default()
                }
            };
            outputs.push((config.clone(), results));
        }

        let next: Vec<ComparisonResult> = outputs
            .iter()
            .flat_map(|(_, results)| results.iter().cloned())
            .collect();
        debug!(configs = configs.len(), published = next.len(), "pass complete");
        self.published.replace(next);
        *self.last_outputs.lock() = outputs;
        metrics::record_pass();
    }

    /// Fires a pass every interval until `shutdown` resolves.
    pub async fn run<F>(self: Arc<Self>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(interval_secs = self.interval.as_secs(), "starting comparison scheduler");
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("comparison scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.try_spawn_pass();
                }
            }
        }
    }
}
