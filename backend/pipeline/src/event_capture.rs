//! Records the `fare_events` journal of the current thread.

use std::fmt;
use std::sync::{Arc, Mutex};

use logging::FARE_EVENTS_TARGET;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Clone, Default)]
pub(crate) struct EventCapture {
    events: Arc<Mutex<Vec<String>>>,
}

impl EventCapture {
    /// Start recording; events are kept until the guard is dropped.
    pub(crate) fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        (capture, tracing::subscriber::set_default(subscriber))
    }

    /// Number of recorded events of the given `type` tag.
    pub(crate) fn count(&self, kind: &str) -> usize {
        let tag = format!("\"type\":\"{kind}\"");
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|json| json.contains(&tag))
            .count()
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != FARE_EVENTS_TARGET {
            return;
        }
        let mut field = EventField(None);
        event.record(&mut field);
        if let Some(json) = field.0 {
            self.events.lock().unwrap().push(json);
        }
    }
}

struct EventField(Option<String>);

impl Visit for EventField {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "event" {
            self.0 = Some(value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "event" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}
