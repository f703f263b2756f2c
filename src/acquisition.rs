use crate::opensky::{OpenSkyError, StateProvider};
use crate::scheduler::SteppableTask;
use crate::store::FlatStore;
use crate::types::BoundingBox;

use chrono::Timelike;

/// The acquisition loop: one step is one poll cycle. Every failure mode is
/// logged and skipped; the next cycle runs at the scheduler's fixed period
/// with no retry or backoff in between.
pub struct Collector<P: StateProvider> {
    provider: P,
    store: FlatStore,
    bounding_box: BoundingBox,
}

impl<P: StateProvider> Collector<P> {
    #[must_use]
    pub fn new(provider: P, store: FlatStore, bounding_box: BoundingBox) -> Self {
        Collector {
            provider,
            store,
            bounding_box,
        }
    }

    /// Runs one poll cycle. Returns the number of rows appended; failures
    /// are logged and count as zero.
    pub fn run_cycle(&mut self) -> usize {
        let now = chrono::Local::now().naive_local();
        let captured_at = now.with_nanosecond(0).unwrap_or(now);

        let observations = match self.provider.fetch(captured_at) {
            Ok(observations) => observations,
            Err(OpenSkyError::Status(code)) => {
                log::error!("API Error: {code}");
                return 0;
            }
            Err(err) => {
                log::error!("{err}. Retrying next cycle...");
                return 0;
            }
        };

        // In-box rows only ever reach the store; the dashboard re-checks the
        // same predicate at read time.
        let in_box: Vec<_> = observations
            .into_iter()
            .filter(|observation| self.bounding_box.contains(observation.lat, observation.long))
            .collect();

        if in_box.is_empty() {
            log::info!("[{}] No aircraft detected in the box right now.", captured_at);
            return 0;
        }

        match self.store.append(&in_box) {
            Ok(written) => {
                log::info!("[{captured_at}] Successfully saved {written} aircraft.");
                written
            }
            Err(err) => {
                log::error!("Failed to append to store: {err}");
                0
            }
        }
    }
}

impl<P: StateProvider + Send + 'static> SteppableTask for Collector<P> {
    fn step(&mut self) -> bool {
        self.run_cycle();
        true
    }
}
