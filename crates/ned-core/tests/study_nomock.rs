//! No-mock integration tests for the study coordinator.
//!
//! Every test runs the full load → generate → count → sample → match →
//! estimate pipeline over an in-memory trace store.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use ned_config::{ConfigPaths, ConfigSnapshot, InteractionSelector, LambdaSpec, StudyConfig, SystemConfig};
use ned_core::estimate::Estimate;
use ned_core::events::{event_names, EventBus, ProgressEmitter};
use ned_core::logging::{JsonlLayer, LogContext};
use tracing_subscriber::layer::SubscriberExt;
use ned_core::{MemorySystem, MemoryTraceSource, Study, StudyOptions, StudyReport};

// ============================================================================
// Fixtures
// ============================================================================

/// Genuine events with irregular gaps of 1 to 6 seconds.
fn jittered_events(count: usize) -> Vec<f64> {
    let mut state: u64 = 0x2545_f491;
    let mut t = 1_000.0;
    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        events.push(t);
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        t += 1.0 + ((state >> 33) % 6) as f64;
    }
    events
}

/// One interaction every 50 seconds across the trace.
fn interactions(events: &[f64]) -> Vec<f64> {
    let first = events[0];
    let last = events[events.len() - 1];
    (1..)
        .map(|k| first + 50.0 * k as f64 + 0.5)
        .take_while(|&t| t < last)
        .collect()
}

fn store() -> MemoryTraceSource {
    let events = jittered_events(1_500);
    let interactions = interactions(&events);
    MemoryTraceSource::new().with_system(
        "1",
        MemorySystem {
            description: Some("jittered".into()),
            events,
            interactions,
        },
    )
}

fn system(id: &str) -> SystemConfig {
    SystemConfig {
        id: id.to_string(),
        source: None,
        from: None,
        to: None,
        description: None,
        outage_threshold: 1_000,
        precision: 1.0,
        interactions: InteractionSelector::all(),
    }
}

fn config(systems: Vec<SystemConfig>) -> StudyConfig {
    StudyConfig {
        sample_duration_secs: 10.0,
        sample_count: 20,
        sample_timeout_secs: 30,
        chunk_size: 100,
        workers: Some(2),
        seed: Some(42),
        lambdas: vec![
            LambdaSpec::new(-1.0, "none"),
            LambdaSpec::new(0.5, "every two seconds"),
        ],
        systems,
        ..Default::default()
    }
}

fn run(config: &StudyConfig, source: &MemoryTraceSource, options: StudyOptions) -> StudyReport {
    let snapshot = ConfigSnapshot::new(config, &ConfigPaths::default());
    Study::new(config, &snapshot, options)
        .run(source)
        .expect("study should not abort")
}

fn options() -> StudyOptions {
    StudyOptions::new(LogContext::new("run-test", "host-test"))
}

// ============================================================================
// Happy path
// ============================================================================

#[test]
fn seeded_study_estimates_every_lambda() {
    let config = config(vec![system("1")]);
    let report = run(&config, &store(), options());

    assert_eq!(report.systems.len(), 1);
    assert!(!report.has_failures());
    let system = &report.systems[0];
    assert_eq!(system.genuine_events, 1_500);
    assert!(system.interactions > 0);
    assert_eq!(system.lambdas.len(), 2);

    let passthrough = &system.lambdas[0];
    assert_eq!(passthrough.dummy_events, 0);
    assert_eq!(passthrough.padded_events, 1_500);
    assert_eq!(passthrough.traffic_increase, 0.0);

    let padded = &system.lambdas[1];
    assert!(padded.dummy_events > 0);
    assert_eq!(padded.padded_events, 1_500 + padded.dummy_events);

    for lambda in &system.lambdas {
        assert!(lambda.error.is_none(), "lambda {} failed", lambda.lambda);
        assert!(lambda.totals.task > 0 && lambda.totals.notask > 0);
        assert_eq!(lambda.samples.achieved, 20);
        assert_eq!(lambda.samples.task + lambda.samples.notask, 20);
        assert!(!lambda.samples.timed_out);
        match &lambda.estimate {
            Estimate::Defined { epsilon, delta } => {
                assert!(*epsilon >= 0.0);
                assert!((0.0..=1.0).contains(delta));
            }
            other => panic!("expected a defined estimate, got {:?}", other),
        }
    }
}

#[test]
fn seeded_study_is_reproducible() {
    let config = config(vec![system("1")]);
    let source = store();
    let first = run(&config, &source, options());
    let second = run(&config, &source, options());

    for (a, b) in first.systems[0].lambdas.iter().zip(&second.systems[0].lambdas) {
        assert_eq!(a.padded_events, b.padded_events);
        assert_eq!(a.totals, b.totals);
        assert_eq!(a.samples.task, b.samples.task);
        assert_eq!(a.samples.notask, b.samples.notask);
        assert_eq!(a.estimate, b.estimate);
    }
}

#[test]
fn padding_does_not_depend_on_worker_count() {
    let mut narrow = config(vec![system("1")]);
    narrow.workers = Some(1);
    let mut wide = config(vec![system("1")]);
    wide.workers = Some(4);

    let source = store();
    let a = run(&narrow, &source, options());
    let b = run(&wide, &source, options());
    assert_eq!(
        a.systems[0].lambdas[1].padded_events,
        b.systems[0].lambdas[1].padded_events
    );
    assert_eq!(a.systems[0].lambdas[1].totals, b.systems[0].lambdas[1].totals);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[test]
fn unknown_system_is_isolated() {
    let config = config(vec![system("1"), system("9")]);
    let report = run(&config, &store(), options());

    assert_eq!(report.systems.len(), 2);
    assert!(report.systems[0].error.is_none());
    let error = report.systems[1].error.as_ref().expect("system 9 fails");
    assert_eq!(error.code, 21);
    assert!(report.systems[1].lambdas.is_empty());
    assert_eq!(report.failure_count(), 1);
}

#[test]
fn unordered_trace_fails_its_system_only() {
    let source = store().with_system(
        "2",
        MemorySystem {
            description: None,
            events: vec![10.0, 30.0, 20.0, 40.0],
            interactions: vec![],
        },
    );
    let config = config(vec![system("2"), system("1")]);
    let report = run(&config, &source, options());

    let error = report.systems[0].error.as_ref().expect("system 2 fails");
    assert_eq!(error.code, 30);
    assert!(report.systems[1].error.is_none());
    assert_eq!(report.systems[1].lambdas.len(), 2);
}

#[test]
fn short_trace_is_reported_empty() {
    let source = MemoryTraceSource::new().with_system(
        "1",
        MemorySystem {
            description: None,
            events: vec![100.0, 104.0],
            interactions: vec![101.0],
        },
    );
    let report = run(&config(vec![system("1")]), &source, options());
    let error = report.systems[0].error.as_ref().expect("span is too short");
    assert_eq!(error.code, 31);
}

#[test]
fn single_event_system_is_reported_empty() {
    let source = MemoryTraceSource::new().with_system(
        "1",
        MemorySystem {
            description: None,
            events: vec![100.0],
            interactions: vec![100.0],
        },
    );
    let report = run(&config(vec![system("1")]), &source, options());
    let error = report.systems[0].error.as_ref().expect("one event cannot be sampled");
    assert_eq!(error.code, 31);
    assert_eq!(report.systems[0].genuine_events, 1);
}

#[test]
fn missing_interactions_give_zero_denominator() {
    let source = MemoryTraceSource::new().with_system(
        "1",
        MemorySystem {
            description: None,
            events: jittered_events(500),
            interactions: vec![],
        },
    );
    let report = run(&config(vec![system("1")]), &source, options());

    let system = &report.systems[0];
    assert!(system.error.is_none());
    assert_eq!(system.lambdas.len(), 2);
    for lambda in &system.lambdas {
        let error = lambda.error.as_ref().expect("task total is zero");
        assert_eq!(error.code, 40);
        assert_eq!(lambda.totals.task, 0);
        assert!(!lambda.estimate.is_defined());
        // fails before the sampler runs
        assert_eq!(lambda.samples.achieved, 0);
        assert_eq!(lambda.samples.draws, 0);
        assert!(!lambda.samples.timed_out);
    }
    assert_eq!(report.failure_count(), 2);
}

// ============================================================================
// Progress events
// ============================================================================

#[test]
fn progress_events_bracket_the_study() {
    let bus = EventBus::new();
    let rx = bus.subscribe();
    let emitter: Arc<dyn ProgressEmitter> = Arc::new(bus);
    let config = config(vec![system("1")]);
    let _report = run(&config, &store(), options().with_emitter(emitter));

    let events: Vec<String> = rx.try_iter().map(|e| e.event).collect();
    assert_eq!(events.first().map(String::as_str), Some(event_names::STUDY_STARTED));
    assert_eq!(events.last().map(String::as_str), Some(event_names::STUDY_COMPLETE));
    let estimates = events
        .iter()
        .filter(|e| e.as_str() == event_names::ESTIMATE_READY)
        .count();
    assert_eq!(estimates, 2);
    assert!(events.iter().any(|e| e == event_names::TRACE_LOADED));
}

// ============================================================================
// Structured logs
// ============================================================================

struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn generation_is_bracketed_in_logs() {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let subscriber =
        tracing_subscriber::registry().with(JsonlLayer::new(SharedBuf(Arc::clone(&buffer))));
    let config = config(vec![system("1")]);
    tracing::subscriber::with_default(subscriber, || {
        run(&config, &store(), options());
    });

    let output = buffer.lock().unwrap();
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let of = |event: &str| lines.iter().filter(|l| l["event"] == event).count();
    assert_eq!(of("generate.started"), config.lambdas.len());
    assert_eq!(of("generate.finished"), config.lambdas.len());

    let started = lines
        .iter()
        .find(|l| l["event"] == "generate.started")
        .unwrap();
    assert_eq!(started["system"], "1");
    assert_eq!(started["stage"], "generate");
    assert_eq!(started["lambda"], -1.0);
}
