//! Log assertions for persistence: migrations at `info`, corrupt data at
//! `warn`, both under the `flexdock.persist` target.

use std::sync::{Arc, Mutex};

use flexdock_runtime::{DockShell, MemoryStorage, ShellConfig};
use tracing::Level;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: Level,
    target: String,
    message: String,
}

#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }
}

struct MessageVisitor(String);

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.0,
        });
    }
}

fn capture(f: impl FnOnce()) -> Vec<CapturedEvent> {
    let layer = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    tracing::subscriber::with_default(subscriber, f);
    layer.events()
}

#[test]
fn migration_logs_at_info() {
    let events = capture(|| {
        let storage = MemoryStorage::with_entries([(
            "layout",
            r#"{"layout": {"type": "row", "children": [
                {"type": "tabset", "children": [{"id": "chat", "name": "Chat"}]}
            ]}}"#,
        )]);
        DockShell::open(ShellConfig::default(), storage).unwrap();
    });

    let migrated = events
        .iter()
        .find(|event| event.message.contains("migrated legacy layout"))
        .expect("migration event");
    assert_eq!(migrated.level, Level::INFO);
    assert_eq!(migrated.target, "flexdock.persist");
    assert!(!events.iter().any(|event| event.level == Level::WARN));
}

#[test]
fn corrupt_record_logs_a_warning() {
    let events = capture(|| {
        let storage = MemoryStorage::with_entries([("dock-layout", "not json at all")]);
        let shell = DockShell::open(ShellConfig::default(), storage).unwrap();
        assert_eq!(shell.load_summary().corrupt, vec!["record"]);
    });

    let warnings: Vec<&CapturedEvent> = events
        .iter()
        .filter(|event| event.level == Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert_eq!(warnings[0].target, "flexdock.persist");
    assert!(warnings[0].message.contains("corrupt"));
}

#[test]
fn shell_toggles_log_under_shell_target() {
    let events = capture(|| {
        let mut shell = DockShell::open(ShellConfig::default(), MemoryStorage::new()).unwrap();
        shell.toggle(flexdock_runtime::Zone::Bottom, web_time::Instant::now());
    });
    assert!(events.iter().any(|event| {
        event.target == "flexdock.shell" && event.message.contains("zone toggled")
    }));
}
