//! Study coordinator.
//!
//! Runs every configured system through load, and every configured lambda
//! through generate, count, sample, match and estimate. A failing system
//! or lambda is recorded in the report and the study moves on; only errors
//! that are not recoverable (worker pool failures) abort the run.

use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use ned_common::{Error, Result, SystemView};
use ned_config::{ConfigSnapshot, LambdaSpec, StudyConfig, SystemConfig};
use ned_math::{duration_units, to_units};
use tracing::info_span;

use crate::estimate::PrivacyAccumulator;
use crate::events::{event_names as progress, Phase, ProgressEmitter, ProgressEvent};
use crate::log_event;
use crate::logging::{event_names, LogContext, Stage};
use crate::matching::{count_window_totals, Matcher};
use crate::padding::{pad_trace, PaddingParams};
use crate::pool::build_pool;
use crate::report::{LambdaReport, StudyReport, SystemReport};
use crate::rng::StreamSeed;
use crate::sampling::{SampleCollector, SamplerParams};
use crate::source::TraceSource;
use crate::trace::{EventTrace, InteractionSet};

/// Accepted samples between two sampling progress events.
const PROGRESS_EVERY: usize = 100;

/// Runtime options that are not part of the study configuration.
#[derive(Clone)]
pub struct StudyOptions {
    pub log: LogContext,
    pub emitter: Option<Arc<dyn ProgressEmitter>>,
}

impl StudyOptions {
    pub fn new(log: LogContext) -> Self {
        Self { log, emitter: None }
    }

    pub fn with_emitter(mut self, emitter: Arc<dyn ProgressEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }
}

/// One system's inputs, scaled to units.
struct LoadedSystem {
    id: String,
    trace: EventTrace,
    interactions: Arc<InteractionSet>,
    from: u64,
    to: u64,
    duration: u64,
    outage_threshold: u64,
    precision: f64,
}

pub struct Study<'a> {
    config: &'a StudyConfig,
    snapshot: &'a ConfigSnapshot,
    options: StudyOptions,
}

impl<'a> Study<'a> {
    pub fn new(config: &'a StudyConfig, snapshot: &'a ConfigSnapshot, options: StudyOptions) -> Self {
        Self {
            config,
            snapshot,
            options,
        }
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(emitter) = &self.options.emitter {
            emitter.emit(event);
        }
    }

    pub fn run(&self, source: &dyn TraceSource) -> Result<StudyReport> {
        let started = Instant::now();
        let seed = StreamSeed::from_option(self.config.seed);
        self.emit(
            ProgressEvent::new(progress::STUDY_STARTED, Phase::Study)
                .with_progress(0, Some(self.config.systems.len() as u64))
                .with_detail("seeded", seed.is_fixed()),
        );

        let mut systems = Vec::with_capacity(self.config.systems.len());
        for system in &self.config.systems {
            systems.push(self.run_system(source, system, seed.derive_label(&system.id))?);
        }

        let report = StudyReport {
            schema_version: ned_common::SCHEMA_VERSION.to_string(),
            run_id: self.options.log.run_id.clone(),
            host_id: self.options.log.host_id.clone(),
            generated_at: Utc::now(),
            sample_duration_secs: self.config.sample_duration_secs,
            config: self.snapshot.clone(),
            systems,
        };
        self.emit(
            ProgressEvent::new(progress::STUDY_COMPLETE, Phase::Study)
                .with_elapsed_ms(started.elapsed().as_millis() as u64)
                .with_detail("failures", report.failure_count()),
        );
        Ok(report)
    }

    fn run_system(
        &self,
        source: &dyn TraceSource,
        system: &SystemConfig,
        seed: StreamSeed,
    ) -> Result<SystemReport> {
        let view = system.view();
        let ctx = self.options.log.with_system(view.id().as_str());
        let mut report = SystemReport::new(view.clone());

        let loaded = match self.load(source, system, &view, &mut report) {
            Ok(loaded) => loaded,
            Err(err) if err.is_recoverable() => {
                log_event!(
                    ctx,
                    WARN,
                    event_names::SYSTEM_FAILED,
                    Stage::Load,
                    format!("skipping {}: {}", view, err),
                    code = err.code()
                );
                self.emit(
                    ProgressEvent::new(progress::SYSTEM_FAILED, Phase::Load)
                        .with_system(view.id().as_str())
                        .with_detail("error", err.to_string()),
                );
                report.fail(&err);
                return Ok(report);
            }
            Err(err) => return Err(err),
        };

        log_event!(
            ctx,
            INFO,
            event_names::LOAD_FINISHED,
            Stage::Load,
            format!("loaded {}", view),
            events = loaded.trace.len(),
            interactions = loaded.interactions.len(),
            duration_units = loaded.duration
        );
        self.emit(
            ProgressEvent::new(progress::TRACE_LOADED, Phase::Load)
                .with_system(loaded.id.as_str())
                .with_detail("events", loaded.trace.len())
                .with_detail("interactions", loaded.interactions.len()),
        );

        for (idx, spec) in self.config.lambdas.iter().enumerate() {
            let mut lambda = LambdaReport::new(spec, self.config.sample_count);
            match self.run_lambda(&ctx, &loaded, spec, seed.derive(idx as u64), &mut lambda) {
                Ok(()) => {}
                Err(err) if err.is_recoverable() => {
                    log_event!(
                        ctx,
                        WARN,
                        event_names::LAMBDA_FAILED,
                        Stage::Estimate,
                        format!("lambda {} failed: {}", spec.lambda, err),
                        lambda = spec.lambda,
                        code = err.code()
                    );
                    self.emit(
                        ProgressEvent::new(progress::LAMBDA_FAILED, Phase::Estimate)
                            .with_system(loaded.id.as_str())
                            .with_lambda(spec.lambda)
                            .with_detail("error", err.to_string()),
                    );
                    lambda.fail(&err);
                }
                Err(err) => return Err(err),
            }
            report.lambdas.push(lambda);
        }

        Ok(report)
    }

    fn load(
        &self,
        source: &dyn TraceSource,
        system: &SystemConfig,
        view: &SystemView,
        report: &mut SystemReport,
    ) -> Result<LoadedSystem> {
        let id = view.id().to_string();
        let precision = system.precision;

        let raw = source.genuine_events(view)?;
        let trace = EventTrace::from_raw(&raw, precision).map_err(|e| e.in_system(&id))?;
        report.genuine_events = trace.len();
        if trace.len() < 2 {
            return Err(Error::EmptyTrace {
                system: id,
                reason: format!("{} genuine events, need at least two", trace.len()),
            });
        }

        let raw = source.interaction_events(view, &system.interactions)?;
        let interactions =
            InteractionSet::from_raw(&raw, precision).map_err(|e| e.in_system(&id))?;
        report.interactions = interactions.len();

        let (first, last) = source.timespan(view)?;
        report.timespan = Some((first, last));
        let unit = |raw: f64| {
            to_units(raw, precision)
                .ok_or_else(|| Error::Source(format!("timespan bound {} is not a valid time", raw)))
        };
        let (from, to) = (unit(first)?, unit(last)?);

        let duration = duration_units(self.config.sample_duration_secs, precision);
        if to < duration || to - duration < from.saturating_add(1) {
            return Err(Error::EmptyTrace {
                system: id,
                reason: format!(
                    "timespan of {} units is shorter than one window of {} units",
                    to.saturating_sub(from),
                    duration
                ),
            });
        }

        Ok(LoadedSystem {
            id,
            trace,
            interactions: Arc::new(interactions),
            from,
            to,
            duration,
            outage_threshold: system.outage_threshold,
            precision,
        })
    }

    fn run_lambda(
        &self,
        ctx: &LogContext,
        system: &LoadedSystem,
        spec: &LambdaSpec,
        seed: StreamSeed,
        report: &mut LambdaReport,
    ) -> Result<()> {
        let id = system.id.as_str();
        let _span = info_span!("lambda", system = id, lambda = spec.lambda).entered();
        let pool = build_pool(self.config.workers, "lambda")?;

        // generate
        self.emit(
            ProgressEvent::new(progress::GENERATION_STARTED, Phase::Generate)
                .with_system(id)
                .with_lambda(spec.lambda),
        );
        log_event!(
            ctx,
            DEBUG,
            event_names::GENERATE_STARTED,
            Stage::Generate,
            format!(
                "padding {} events at lambda {}",
                system.trace.len(),
                spec.lambda
            ),
            lambda = spec.lambda,
            chunk_size = self.config.chunk_size
        );
        let params = PaddingParams {
            lambda: spec.lambda,
            outage_threshold: system.outage_threshold,
            precision: system.precision,
        };
        let started = Instant::now();
        let padded = Arc::new(pad_trace(
            id,
            &system.trace,
            &params,
            self.config.chunk_size,
            seed.derive_label("generate"),
            &pool,
        )?);
        report.padded_events = padded.len();
        report.dummy_events = padded.dummy_count();
        report.traffic_increase = padded.traffic_increase();
        log_event!(
            ctx,
            INFO,
            event_names::GENERATE_FINISHED,
            Stage::Generate,
            format!(
                "lambda {}: {} events ({} dummies)",
                spec.lambda,
                padded.len(),
                padded.dummy_count()
            ),
            lambda = spec.lambda,
            traffic_increase = padded.traffic_increase(),
            elapsed_ms = started.elapsed().as_millis() as u64
        );
        self.emit(
            ProgressEvent::new(progress::GENERATION_COMPLETE, Phase::Generate)
                .with_system(id)
                .with_lambda(spec.lambda)
                .with_elapsed_ms(started.elapsed().as_millis() as u64)
                .with_detail("padded_events", padded.len()),
        );

        // count
        let totals = count_window_totals(
            &padded,
            &system.interactions,
            system.to,
            system.duration,
            system.outage_threshold,
        );
        report.totals = totals;
        log_event!(
            ctx,
            DEBUG,
            event_names::COUNT_FINISHED,
            Stage::Count,
            "window totals counted",
            lambda = spec.lambda,
            task_total = totals.task,
            notask_total = totals.notask
        );
        self.emit(
            ProgressEvent::new(progress::TOTALS_COUNTED, Phase::Count)
                .with_system(id)
                .with_lambda(spec.lambda)
                .with_detail("totals", totals),
        );
        let mut accumulator = PrivacyAccumulator::new(totals, id, spec.lambda)?;

        // sample and match
        let matcher = Arc::new(Matcher::new(
            Arc::clone(&padded),
            Arc::clone(&system.interactions),
            system.duration,
            system.outage_threshold,
        ));
        let sampler = SamplerParams {
            from: system.from,
            to: system.to,
            duration: system.duration,
            outage_threshold: system.outage_threshold,
            sample_count: self.config.sample_count,
            timeout: Duration::from_secs(self.config.sample_timeout_secs),
            quota: self.config.quota,
        };
        let mut collector = SampleCollector::new(id, &padded, &system.interactions, sampler)?;
        let mut rng = seed.derive_label("sample").rng();
        log_event!(
            ctx,
            DEBUG,
            event_names::SAMPLE_STARTED,
            Stage::Sample,
            "sampling windows",
            lambda = spec.lambda,
            target = self.config.sample_count
        );

        let (tx, rx) = mpsc::channel();
        let target = self.config.sample_count as u64;
        let run = collector.collect(&mut rng, |sample| {
            let tx = tx.clone();
            let matcher = Arc::clone(&matcher);
            pool.spawn(move || {
                let _ = tx.send(matcher.count(&sample.deltas));
            });
        });
        drop(tx);

        if run.timed_out {
            log_event!(
                ctx,
                WARN,
                event_names::SAMPLE_TIMEOUT,
                Stage::Sample,
                format!(
                    "sampling timed out with {} of {} samples",
                    run.dispatched, self.config.sample_count
                ),
                lambda = spec.lambda,
                draws = run.draws
            );
        }
        log_event!(
            ctx,
            INFO,
            event_names::SAMPLE_FINISHED,
            Stage::Sample,
            format!(
                "{} samples ({} task, {} non-task) from {} draws",
                run.dispatched, run.task_samples, run.notask_samples, run.draws
            ),
            lambda = spec.lambda,
            outage_rejections = run.rejections.outage,
            quota_rejections = run.rejections.quota,
            duplicate_rejections = run.rejections.duplicate
        );
        self.emit(
            ProgressEvent::new(progress::SAMPLING_COMPLETE, Phase::Sample)
                .with_system(id)
                .with_lambda(spec.lambda)
                .with_progress(run.dispatched as u64, Some(target))
                .with_elapsed_ms(run.elapsed.as_millis() as u64)
                .with_detail("timed_out", run.timed_out),
        );
        report.samples.record(&run);

        let matching = Instant::now();
        for counts in rx {
            accumulator.observe(counts);
            let observed = accumulator.observed();
            if observed as usize % PROGRESS_EVERY == 0 {
                self.emit(
                    ProgressEvent::new(progress::SAMPLING_PROGRESS, Phase::Match)
                        .with_system(id)
                        .with_lambda(spec.lambda)
                        .with_progress(observed, Some(run.dispatched as u64)),
                );
            }
        }
        log_event!(
            ctx,
            DEBUG,
            event_names::MATCH_FINISHED,
            Stage::Match,
            "matching drained",
            lambda = spec.lambda,
            observed = accumulator.observed(),
            elapsed_ms = matching.elapsed().as_millis() as u64
        );
        self.emit(
            ProgressEvent::new(progress::MATCHING_COMPLETE, Phase::Match)
                .with_system(id)
                .with_lambda(spec.lambda)
                .with_progress(accumulator.observed(), Some(run.dispatched as u64)),
        );

        let estimate = accumulator.estimate();
        log_event!(
            ctx,
            INFO,
            event_names::ESTIMATE_FINISHED,
            Stage::Estimate,
            format!("lambda {} estimated", spec.lambda),
            lambda = spec.lambda,
            epsilon = estimate.epsilon().unwrap_or(f64::NAN),
            delta = estimate.delta().unwrap_or(f64::NAN)
        );
        self.emit(
            ProgressEvent::new(progress::ESTIMATE_READY, Phase::Estimate)
                .with_system(id)
                .with_lambda(spec.lambda)
                .with_detail("estimate", &estimate),
        );
        report.estimate = estimate;
        Ok(())
    }
}
