//! Structured logging emitted by the fit controller.
//!
//! Captures events through a `tracing-subscriber` layer and checks that each
//! completed pass is logged once with its outcome, and that detach is logged.

use std::cell::Cell;
use std::fmt::Debug;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use domfit_runtime::{FitCallbacks, FitConfig, FitController, ScrollMetrics, TriggerSource};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

#[derive(Debug, Default, Clone)]
struct Captured {
    message: String,
    outcome: Option<String>,
}

impl Visit for Captured {
    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "outcome" {
            self.outcome = Some(value.to_string());
        }
    }
}

#[derive(Clone, Default)]
struct CaptureLayer {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S: tracing::Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut captured = Captured::default();
        event.record(&mut captured);
        self.events.lock().unwrap().push(captured);
    }
}

#[test]
fn pass_completion_and_detach_are_logged() {
    let layer = CaptureLayer::default();
    let events = Arc::clone(&layer.events);
    let subscriber = tracing_subscriber::registry().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        let extents = Rc::new(Cell::new(ScrollMetrics::new(130, 100)));
        let target = Rc::clone(&extents);
        let callbacks = FitCallbacks::new(
            || false,
            move || {
                let m = target.get();
                target.set(ScrollMetrics::new(m.scroll_width - 10, m.client_width));
                true
            },
        );
        let mut ctl =
            FitController::attach(Rc::clone(&extents), callbacks, FitConfig::default(), vec![]);
        ctl.request(TriggerSource::Manual);
        while ctl.is_running() {
            ctl.on_tick();
        }
        ctl.detach();
    });

    let events = events.lock().unwrap();
    let completions: Vec<_> = events
        .iter()
        .filter(|e| e.message == "fit pass complete")
        .collect();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].outcome.as_deref(), Some("fit"));
    assert!(events.iter().any(|e| e.message == "fit controller attached"));
    assert!(events.iter().any(|e| e.message == "fit controller detached"));
}
