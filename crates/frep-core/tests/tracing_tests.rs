#![forbid(unsafe_code)]

//! Structured logging integration tests.
//!
//! Verify that structural changes log at `debug` with their fields and that
//! mount/populate run inside named spans.
//!
//!   cargo test -p frep-core --features tracing --test tracing_tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use frep_core::{Markup, MemoryModel, MemorySurface, RepeaterTree};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// A captured event with its fields and enclosing span.
#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    span: Option<String>,
}

/// A tracing Layer that records every event and span name.
#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
    spans: Arc<Mutex<Vec<String>>>,
}

impl EventCapture {
    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn spans(&self) -> Vec<String> {
        self.spans.lock().unwrap().clone()
    }

    fn find(&self, message: &str) -> Option<CapturedEvent> {
        self.events()
            .into_iter()
            .find(|event| event.message == message)
    }
}

/// Visitor that extracts event fields.
struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        self.spans
            .lock()
            .unwrap()
            .push(attrs.metadata().name().to_string());
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.remove("message").unwrap_or_default();
        let span = ctx
            .event_span(event)
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            span,
        });
    }
}

fn with_capture<T>(run: impl FnOnce() -> T) -> (T, EventCapture) {
    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let out = tracing::subscriber::with_default(subscriber, run);
    (out, capture)
}

fn tree() -> (RepeaterTree<MemorySurface, MemoryModel>, frep_core::ViewId) {
    let markup = Markup::block(vec![Markup::repeat("item", vec![Markup::text("name")])]);
    let (surface, root) = MemorySurface::from_markup(&markup).unwrap();
    let tree = RepeaterTree::new(surface).with_model(MemoryModel::with_values([("item", "2")]));
    (tree, root)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn mount_and_populate_run_in_spans() {
    let ((), capture) = with_capture(|| {
        let (mut tree, root) = tree();
        tree.attach(root);
    });

    let spans = capture.spans();
    assert!(spans.contains(&"mount".to_string()), "spans: {spans:?}");
    assert!(spans.contains(&"populate".to_string()), "spans: {spans:?}");

    let mounted = capture.find("mounted").expect("mounted event");
    assert_eq!(mounted.span.as_deref(), Some("mount"));
    assert_eq!(mounted.fields.get("groups").map(String::as_str), Some("1"));

    let populated = capture.find("populated").expect("populated event");
    assert_eq!(populated.span.as_deref(), Some("populate"));
    assert_eq!(populated.fields.get("nodes").map(String::as_str), Some("2"));
}

#[test]
fn add_logs_index_and_origin() {
    let (mut tree, root) = tree();
    tree.attach(root);
    let first = tree.root_instances("item")[0];

    let (_, capture) = with_capture(|| tree.add(first, true));

    let added = capture.find("added instance").expect("added event");
    assert_eq!(added.level, tracing::Level::DEBUG);
    assert_eq!(added.fields.get("index").map(String::as_str), Some("1"));
    assert_eq!(
        added.fields.get("user_initiated").map(String::as_str),
        Some("true")
    );
}

#[test]
fn refused_and_completed_removals_are_logged() {
    let (mut tree, root) = tree();
    tree.attach(root);
    let items = tree.root_instances("item").to_vec();

    let (_, capture) = with_capture(|| {
        tree.remove(items[0]);
        tree.remove(items[1])
    });

    let removed = capture.find("removed instance").expect("removed event");
    assert_eq!(removed.fields.get("key").map(String::as_str), Some("item"));
    assert_eq!(removed.fields.get("suffix").map(String::as_str), Some("[0]"));

    let refused = capture
        .find("refused removal of last instance")
        .expect("refused event");
    assert_eq!(refused.level, tracing::Level::DEBUG);
}

#[test]
fn dispatch_traces_each_signal() {
    let (mut tree, root) = tree();
    tree.attach(root);
    let first = tree.root_instances("item")[0];

    let (_, capture) = with_capture(|| tree.add(first, true));

    let signals: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|event| event.message == "dispatch")
        .filter_map(|event| event.fields.get("signal").cloned())
        .collect();
    assert_eq!(signals, ["rename", "persist", "clear"]);
}
