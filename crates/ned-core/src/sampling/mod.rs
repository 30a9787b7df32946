//! Monte-Carlo sampling of observation windows.

pub mod collector;
pub mod registry;
pub mod window;

pub use collector::{Rejections, SampleCollector, SamplerParams, SamplingRun};
pub use registry::SampleRegistry;
pub use window::{build_window, crosses_outage, Sample};
