//! In-memory trace source for tests and embedding.

use std::collections::BTreeMap;

use ned_common::{Error, Result, SystemId, SystemView};
use ned_config::InteractionSelector;

use super::{StoredSystem, TraceSource};

/// One stored system held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySystem {
    pub description: Option<String>,
    pub events: Vec<f64>,
    pub interactions: Vec<f64>,
}

/// In-memory trace store.
///
/// Events are returned in insertion order, unsorted. The interaction
/// selector is only checked for emptiness; every stored interaction inside
/// the view's bounds is returned.
#[derive(Debug, Clone, Default)]
pub struct MemoryTraceSource {
    systems: BTreeMap<SystemId, MemorySystem>,
}

impl MemoryTraceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(mut self, id: impl Into<SystemId>, system: MemorySystem) -> Self {
        self.insert(id, system);
        self
    }

    pub fn insert(&mut self, id: impl Into<SystemId>, system: MemorySystem) {
        self.systems.insert(id.into(), system);
    }

    fn stored(&self, view: &SystemView) -> Result<&MemorySystem> {
        self.systems
            .get(view.base())
            .ok_or_else(|| Error::SystemNotFound {
                system: view.base().to_string(),
            })
    }
}

impl TraceSource for MemoryTraceSource {
    fn genuine_events(&self, view: &SystemView) -> Result<Vec<f64>> {
        let stored = self.stored(view)?;
        Ok(stored
            .events
            .iter()
            .copied()
            .filter(|&ts| view.contains(ts))
            .collect())
    }

    fn interaction_events(
        &self,
        view: &SystemView,
        selector: &InteractionSelector,
    ) -> Result<Vec<f64>> {
        let stored = self.stored(view)?;
        if selector.is_empty() {
            return Ok(Vec::new());
        }
        Ok(stored
            .interactions
            .iter()
            .copied()
            .filter(|&ts| view.contains(ts))
            .collect())
    }

    fn timespan(&self, view: &SystemView) -> Result<(f64, f64)> {
        let inside = self.genuine_events(view)?;
        let first = inside.iter().copied().reduce(f64::min);
        let last = inside.iter().copied().reduce(f64::max);
        match (first, last) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(Error::EmptyTrace {
                system: view.id().to_string(),
                reason: "no events inside the view's bounds".to_string(),
            }),
        }
    }

    fn systems(&self) -> Result<Vec<StoredSystem>> {
        Ok(self
            .systems
            .iter()
            .map(|(id, system)| StoredSystem {
                id: id.clone(),
                description: system.description.clone(),
                messages: system.events.len() as u64,
            })
            .collect())
    }
}
