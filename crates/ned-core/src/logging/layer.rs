//! Custom tracing layer for JSONL output.
//!
//! This layer produces machine-parseable JSONL logs on stderr while
//! keeping stdout clean for report payloads.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

/// Correlation fields recorded on spans.
#[derive(Debug, Clone, Default)]
struct SpanContext {
    run_id: Option<String>,
    host_id: Option<String>,
    stage: Option<String>,
    system: Option<String>,
    lambda: Option<f64>,
}

/// Collects event fields into a JSON map; `message` is kept apart.
#[derive(Default)]
struct FieldCollector {
    fields: serde_json::Map<String, Value>,
    message: Option<String>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            ("message", Value::String(text)) => self.message = Some(text),
            (name, value) => {
                self.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON form
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.put(field, Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}

impl Visit for SpanContext {
    fn record_str(&mut self, field: &Field, value: &str) {
        let slot = match field.name() {
            "run_id" => &mut self.run_id,
            "host_id" => &mut self.host_id,
            "stage" => &mut self.stage,
            "system" => &mut self.system,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `%value` fields arrive here with their Display output
        self.record_str(field, &format!("{:?}", value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if field.name() == "lambda" {
            self.lambda = Some(value);
        }
    }
}

impl SpanContext {
    /// Fill unset fields from an outer span.
    fn inherit(&mut self, outer: &SpanContext) {
        fn fill<T: Clone>(slot: &mut Option<T>, from: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(from);
            }
        }
        fill(&mut self.run_id, &outer.run_id);
        fill(&mut self.host_id, &outer.host_id);
        fill(&mut self.stage, &outer.stage);
        fill(&mut self.system, &outer.system);
        fill(&mut self.lambda, &outer.lambda);
    }
}

/// JSONL tracing layer that outputs to stderr.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer {
            writer: Mutex::new(io::stderr()),
        }
    }
}

impl<W: Write> JsonlLayer<W> {
    /// Create a new JSONL layer with a custom writer.
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut context = SpanContext::default();
        attrs.record(&mut context);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(context);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let ts = Utc::now();

        // Innermost span wins for every correlation field
        let mut merged = SpanContext::default();
        for span in ctx.event_scope(event).into_iter().flatten() {
            if let Some(outer) = span.extensions().get::<SpanContext>() {
                merged.inherit(outer);
            }
        }

        let mut visitor = FieldCollector::default();
        event.record(&mut visitor);

        let level: Level = (*event.metadata().level()).into();
        let mut obj = serde_json::Map::new();

        obj.insert("ts".to_string(), serde_json::json!(ts.to_rfc3339()));
        obj.insert("level".to_string(), serde_json::json!(level));
        obj.insert(
            "event".to_string(),
            serde_json::json!(event.metadata().target()),
        );

        // Event fields override span context of the same name
        for (key, value) in [
            ("run_id", merged.run_id),
            ("host_id", merged.host_id),
            ("stage", merged.stage),
            ("system", merged.system),
        ] {
            if let Some(v) = visitor.fields.remove(key) {
                obj.insert(key.to_string(), v);
            } else if let Some(v) = value {
                obj.insert(key.to_string(), serde_json::json!(v));
            }
        }
        if let Some(v) = visitor.fields.remove("lambda") {
            obj.insert("lambda".to_string(), v);
        } else if let Some(l) = merged.lambda {
            obj.insert("lambda".to_string(), serde_json::json!(l));
        }
        if let Some(msg) = visitor.message {
            obj.insert("message".to_string(), serde_json::json!(msg));
        }

        if !visitor.fields.is_empty() {
            obj.insert("fields".to_string(), Value::Object(visitor.fields));
        }

        let json = serde_json::to_string(&Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    struct BufWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for BufWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Value> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let layer = JsonlLayer::new(BufWriter(buffer.clone()));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);

        let output = buffer.lock().unwrap();
        String::from_utf8_lossy(&output)
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid JSON line"))
            .collect()
    }

    #[test]
    fn layer_writes_level_message_and_target() {
        let lines = capture(|| {
            tracing::warn!(target: "sample.timeout", message = "ran out of time");
        });
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["level"], "warn");
        assert_eq!(lines[0]["event"], "sample.timeout");
        assert_eq!(lines[0]["message"], "ran out of time");
        assert!(lines[0]["ts"].is_string());
    }

    #[test]
    fn layer_records_extra_fields() {
        let lines = capture(|| {
            tracing::info!(target: "count.finished", task_total = 42u64, timed_out = false, message = "hi");
        });
        assert_eq!(lines[0]["fields"]["task_total"], 42);
        assert_eq!(lines[0]["fields"]["timed_out"], false);
    }

    #[test]
    fn layer_promotes_correlation_fields() {
        let lines = capture(|| {
            tracing::info!(target: "run.started", run_id = "run-1", stage = "init", system = "3", message = "go");
        });
        assert_eq!(lines[0]["run_id"], "run-1");
        assert_eq!(lines[0]["stage"], "init");
        assert_eq!(lines[0]["system"], "3");
        assert!(lines[0].get("fields").is_none());
    }

    #[test]
    fn layer_inherits_span_context() {
        let lines = capture(|| {
            let span = tracing::info_span!("lambda", system = "2.1", lambda = 0.5);
            let _guard = span.enter();
            tracing::info!(target: "generate.finished", message = "padded");
        });
        assert_eq!(lines[0]["system"], "2.1");
        assert_eq!(lines[0]["lambda"], 0.5);
    }
}
