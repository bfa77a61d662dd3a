#![allow(dead_code)]

use glacier_drain::adapters::SimulatedGlacier;
use glacier_drain::config::AppConfig;
use glacier_drain::context::AppContext;
use glacier_drain::core::{ProgressEvent, ProgressReporter};
use glacier_drain::db;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Keeps every reported event for assertions.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Records events and cancels `token` as soon as the first archive is deleted.
pub struct CancelOnFirstDelete {
    pub recorder: RecordingReporter,
    pub token: CancellationToken,
}

impl CancelOnFirstDelete {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            recorder: RecordingReporter::default(),
            token,
        }
    }
}

impl ProgressReporter for CancelOnFirstDelete {
    fn report(&self, event: ProgressEvent) {
        if matches!(event, ProgressEvent::ArchiveDeleted { .. }) {
            self.token.cancel();
        }
        self.recorder.report(event);
    }
}

/// Config with millisecond pauses so tests never wait on real cadences.
pub fn fast_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.polling.interval_secs = 1;
    config.throttle.pause_ms = 0;
    config.logging.file = None;
    config
}

pub async fn context(
    config: AppConfig,
    glacier: Arc<SimulatedGlacier>,
    reporter: Arc<dyn ProgressReporter>,
) -> AppContext {
    let conn = db::init_in_memory().await.unwrap();
    AppContext::new(config, conn, glacier, reporter)
}
