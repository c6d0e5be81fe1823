//! Key resolution: matching geographic units to indicator rows
//!
//! Each indicator table implements `KeyResolver` through an ordered chain of
//! strategies. A `ResolutionCascade` wraps a resolver with the province
//! average and global default fallbacks, so every unit receives a value.

pub mod aliases;
mod strategy;
mod cascade;
mod diagnostics;

pub use strategy::{
    CODE_CHAIN, DISTRICT_CHAIN, KeyResolver, Match, MatchStrategy, PROVINCE_CHAIN, STATION_CHAIN, Strategy,
};
pub use cascade::{GlobalDefault, ProvinceAverage, Resolution, ResolutionCascade, ResolvedValue};
pub use diagnostics::{DistrictCoverage, IndicatorDiagnostics, ResolutionDiagnostics};
