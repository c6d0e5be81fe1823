//! Vulnerability Index - composite regional vulnerability scoring
//!
//! This library provides:
//! - Indicator loading for housing, sewer, social and rainfall sources
//! - Ordinal grading with configurable thresholds
//! - Key resolution between boundary units and indicator rows, with
//!   province-average and global-default fallbacks
//! - Weighted composite scoring and regional aggregation
//! - Enriched GeoJSON and CSV/JSON summary output

pub mod error;
pub mod stats;
pub mod grading;
pub mod geography;
pub mod indicators;
pub mod resolve;
pub mod scoring;
pub mod aggregate;
pub mod config;
pub mod pipeline;
pub mod output;

// Re-export commonly used types
pub use error::{IndexError, Result};
pub use grading::{Grade, GradeScale, GradeScales, classify};
pub use geography::{GeographicUnit, load_boundaries};
pub use indicators::{Indicator, IndicatorRecord, IndicatorTables};
pub use resolve::{KeyResolver, MatchStrategy, Resolution, ResolutionCascade};
pub use scoring::{CompositeRecord, CompositeScorer, WeightScheme};
pub use aggregate::{Metric, RankOrder, RegionScope, RegionSummary, summarize, top_k};
pub use config::PipelineConfig;
pub use pipeline::{BatchRunner, PipelineResult};
