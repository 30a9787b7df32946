//! System identity types.
//!
//! A stored system is identified by its id in the trace store. Derived
//! sub-systems (for example a system split at a reconfiguration date) are
//! expressed as a [`SystemView::Bounded`] over a base system rather than as a
//! separate stored system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a system, as used in reports and configuration.
///
/// Stored systems use their numeric store id ("1", "3"); derived views use
/// a dotted suffix ("2.1").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemId(pub String);

impl SystemId {
    pub fn new(id: impl Into<String>) -> Self {
        SystemId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SystemId {
    fn from(id: &str) -> Self {
        SystemId(id.to_string())
    }
}

impl From<i64> for SystemId {
    fn from(id: i64) -> Self {
        SystemId(id.to_string())
    }
}

/// A system as seen by the analysis: either a whole stored system or a
/// time-bounded slice of one.
///
/// Bounds are raw store timestamps (seconds), inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SystemView {
    Unbounded {
        id: SystemId,
    },
    Bounded {
        id: SystemId,
        base: SystemId,
        from: Option<f64>,
        to: Option<f64>,
    },
}

impl SystemView {
    pub fn unbounded(id: impl Into<SystemId>) -> Self {
        SystemView::Unbounded { id: id.into() }
    }

    /// Identifier reported for this view.
    pub fn id(&self) -> &SystemId {
        match self {
            SystemView::Unbounded { id } | SystemView::Bounded { id, .. } => id,
        }
    }

    /// Identifier of the stored system the view reads from.
    pub fn base(&self) -> &SystemId {
        match self {
            SystemView::Unbounded { id } => id,
            SystemView::Bounded { base, .. } => base,
        }
    }

    /// Raw time bounds of the view, `None` meaning open-ended.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            SystemView::Unbounded { .. } => (None, None),
            SystemView::Bounded { from, to, .. } => (*from, *to),
        }
    }

    /// Whether a raw timestamp lies inside the view's bounds.
    pub fn contains(&self, timestamp: f64) -> bool {
        let (from, to) = self.bounds();
        from.map_or(true, |f| timestamp >= f) && to.map_or(true, |t| timestamp <= t)
    }
}

impl fmt::Display for SystemView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemView::Unbounded { id } => write!(f, "system {}", id),
            SystemView::Bounded { id, base, from, to } => {
                write!(f, "system {} (system {}", id, base)?;
                if let Some(from) = from {
                    write!(f, " from {}", from)?;
                }
                if let Some(to) = to {
                    write!(f, " to {}", to)?;
                }
                write!(f, ")")
            }
        }
    }
}
