//! ned core library
//!
//! This library estimates how well dummy traffic hides user interactions
//! from a timing-correlation observer:
//! - Trace sources (SQLite store, in-memory)
//! - Dummy traffic generation over chunked traces
//! - Window sampling, pattern matching and (ε, δ) estimation
//! - The study coordinator and its reports
//! - Exit codes, logging and progress events for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod estimate;
pub mod events;
pub mod exit_codes;
pub mod logging;
pub mod matching;
pub mod padding;
pub mod pool;
pub mod report;
pub mod rng;
pub mod sampling;
pub mod source;
pub mod study;
pub mod trace;

pub use estimate::{Estimate, PrivacyAccumulator};
pub use report::{LambdaReport, StudyReport, SystemReport};
pub use source::{MemorySystem, MemoryTraceSource, SqliteTraceSource, TraceSource};
pub use study::{Study, StudyOptions};
