//! Batch pipeline: load, resolve, score

mod runner;

pub use runner::{BatchRunner, PipelineResult};
