//! Dummy traffic generation.
//!
//! The genuine trace is cut into overlapping chunks, each chunk is padded
//! with exponentially spaced dummy events on its own random stream, and the
//! chunk outputs are joined back in chunk order.

pub mod generator;
pub mod pipeline;

pub use generator::{generate_chunk, PaddingParams};
pub use pipeline::{pad_trace, split_chunks};
