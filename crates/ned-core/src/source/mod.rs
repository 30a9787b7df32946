//! Trace stores.
//!
//! A [`TraceSource`] answers three questions about a [`SystemView`]: which
//! genuine events it has, which of them are user interactions, and which
//! timespan it covers. Timestamps are raw store values in seconds; scaling
//! to units happens in the study.

pub mod memory;
pub mod sqlite;

pub use memory::{MemorySystem, MemoryTraceSource};
pub use sqlite::SqliteTraceSource;

use ned_common::{Result, SystemId, SystemView};
use ned_config::InteractionSelector;
use serde::Serialize;

/// A system as stored, for listings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSystem {
    pub id: SystemId,
    pub description: Option<String>,
    pub messages: u64,
}

pub trait TraceSource {
    /// Genuine event timestamps of the view, ascending.
    fn genuine_events(&self, view: &SystemView) -> Result<Vec<f64>>;

    /// Timestamps of messages selected as user interactions, ascending and
    /// distinct.
    fn interaction_events(
        &self,
        view: &SystemView,
        selector: &InteractionSelector,
    ) -> Result<Vec<f64>>;

    /// First and last actual event timestamp inside the view's bounds.
    fn timespan(&self, view: &SystemView) -> Result<(f64, f64)>;

    /// Systems present in the store.
    fn systems(&self) -> Result<Vec<StoredSystem>>;
}
