use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::detector::{ChangeDetector, ScenarioChange};
use crate::errors::CacheError;

#[derive(Clone, Copy, Debug)]
pub struct MonitorOptions {
    pub poll_interval: Duration,
    /// Quiet period after a change is seen before the batch is delivered.
    pub debounce: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            debounce: Duration::from_millis(500),
        }
    }
}

/// Polls a [`ChangeDetector`] and hands debounced change batches to a
/// callback until cancelled.
pub struct ScenarioMonitor {
    detector: ChangeDetector,
    options: MonitorOptions,
    delivered: HashMap<PathBuf, String>,
}

impl ScenarioMonitor {
    pub fn new(detector: ChangeDetector, options: MonitorOptions) -> Self {
        Self {
            detector,
            options,
            delivered: HashMap::new(),
        }
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// `on_change` returns `true` when the batch ran and should be marked in
    /// the cache. Unmarked batches are not redelivered until their content
    /// changes again.
    pub async fn run<F, Fut>(
        mut self,
        cancel: CancellationToken,
        mut on_change: F,
    ) -> Result<ChangeDetector, CacheError>
    where
        F: FnMut(Vec<ScenarioChange>) -> Fut + Send,
        Fut: Future<Output = bool> + Send,
    {
        let mut ticker = interval(self.options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            dir = %self.detector.scenario_dir().display(),
            poll_ms = millis(self.options.poll_interval),
            debounce_ms = millis(self.options.debounce),
            "watching scenarios"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if self.fresh_changes()?.is_empty() {
                continue;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = sleep(self.options.debounce) => {}
            }
            let batch = self.fresh_changes()?;
            if batch.is_empty() {
                continue;
            }

            debug!(files = batch.len(), "delivering change batch");
            for change in &batch {
                self.delivered.insert(change.file.clone(), change.hash.clone());
            }
            let files: Vec<PathBuf> = batch.iter().map(|change| change.file.clone()).collect();
            if on_change(batch).await {
                self.detector.mark_run(&files)?;
            } else {
                warn!(files = files.len(), "change batch not marked as run");
            }
        }

        info!("scenario watch stopped");
        Ok(self.detector)
    }

    fn fresh_changes(&self) -> Result<Vec<ScenarioChange>, CacheError> {
        let changes = self.detector.get_changed_tests()?;
        Ok(changes
            .into_iter()
            .filter(|change| self.delivered.get(&change.file) != Some(&change.hash))
            .collect())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
