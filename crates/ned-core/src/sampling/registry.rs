//! Deduplication of accepted samples.

use std::collections::HashSet;
use std::sync::Arc;

/// Accepted sample tuples of one lambda run.
#[derive(Debug, Default)]
pub struct SampleRegistry {
    seen: HashSet<Arc<[u64]>>,
}

impl SampleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sample; returns the shared tuple, or `None` if already seen.
    pub fn register(&mut self, deltas: &[u64]) -> Option<Arc<[u64]>> {
        if self.seen.contains(deltas) {
            return None;
        }
        let shared: Arc<[u64]> = Arc::from(deltas);
        self.seen.insert(Arc::clone(&shared));
        Some(shared)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_registration_is_rejected() {
        let mut registry = SampleRegistry::new();
        assert!(registry.register(&[1, 2]).is_some());
        assert!(registry.register(&[1, 2]).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_sample_is_a_tuple_too() {
        let mut registry = SampleRegistry::new();
        assert!(registry.register(&[]).is_some());
        assert!(registry.register(&[]).is_none());
    }
}
