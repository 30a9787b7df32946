//! Numeric primitives shared by the generator, sampler and matcher.

pub mod ratio;
pub mod scale;
pub mod search;
pub mod seed;
