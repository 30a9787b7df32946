//! ned math utilities.

pub mod math;

pub use math::ratio::*;
pub use math::scale::*;
pub use math::search::*;
pub use math::seed::*;
