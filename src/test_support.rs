//! Helpers shared by unit tests.

use std::sync::{Arc, Mutex};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};

const CRATE_TARGET: &str = "textgen_client";

/// Records the level of every event emitted by this crate.
#[derive(Clone, Default)]
pub(crate) struct LevelRecorder {
    levels: Arc<Mutex<Vec<Level>>>,
}

impl LevelRecorder {
    pub(crate) fn levels(&self) -> Vec<Level> {
        self.levels.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub(crate) fn count(&self, level: Level) -> usize {
        self.levels().into_iter().filter(|l| *l == level).count()
    }
}

impl<S: Subscriber> Layer<S> for LevelRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !meta.target().starts_with(CRATE_TARGET) {
            return;
        }
        if let Ok(mut levels) = self.levels.lock() {
            levels.push(*meta.level());
        }
    }
}

/// Run `f` with a recording subscriber and return the levels it logged.
pub(crate) fn capture_logs<F, R>(f: F) -> (R, Vec<Level>)
where
    F: FnOnce() -> R,
{
    let recorder = LevelRecorder::default();
    let subscriber = Registry::default().with(recorder.clone());
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, recorder.levels())
}

/// Install a recording subscriber for the current thread until the guard is dropped.
///
/// Meant for `#[tokio::test]` bodies, which run on a single thread.
pub(crate) fn record_logs() -> (LevelRecorder, DefaultGuard) {
    let recorder = LevelRecorder::default();
    let subscriber = Registry::default().with(recorder.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (recorder, guard)
}
