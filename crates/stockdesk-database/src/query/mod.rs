//! Query building blocks beyond plain filters.

pub mod eval;
pub mod pipeline;

pub use pipeline::{Accumulator, FindOptions, Pipeline, Stage};
