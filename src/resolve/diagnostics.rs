//! Resolution counters per indicator plus sewer coverage per municipality

use std::collections::{BTreeMap, HashMap};

use log::{info, warn};
use serde::Serialize;

use super::aliases::canonical_province;
use super::cascade::Resolution;
use super::strategy::MatchStrategy;
use crate::geography::GeographicUnit;
use crate::indicators::Indicator;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndicatorDiagnostics {
    pub success: usize,
    pub failure: usize,
    pub province_average_used: usize,
    pub global_default_used: usize,
    pub by_strategy: BTreeMap<MatchStrategy, usize>,
}

impl IndicatorDiagnostics {
    pub fn record(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Matched(strategy) => {
                self.success += 1;
                *self.by_strategy.entry(strategy).or_insert(0) += 1;
            }
            Resolution::ProvinceAverage => {
                self.failure += 1;
                self.province_average_used += 1;
            }
            Resolution::GlobalDefault => {
                self.failure += 1;
                self.global_default_used += 1;
            }
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.failure
    }

    /// Share of units matched by a strategy, 0 when nothing was resolved
    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.success as f64 / self.total() as f64
        }
    }
}

/// Sewer match counts for one municipality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictCoverage {
    pub province: String,
    pub municipality: String,
    pub success: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionDiagnostics {
    pub indicators: BTreeMap<Indicator, IndicatorDiagnostics>,
    pub district_coverage: Vec<DistrictCoverage>,
    #[serde(skip)]
    coverage_index: HashMap<(String, String), usize>,
}

impl ResolutionDiagnostics {
    pub fn record(&mut self, indicator: Indicator, resolution: Resolution) {
        self.indicators.entry(indicator).or_default().record(resolution);
    }

    /// Track a sewer resolution under the unit's municipality, in first-seen order
    pub fn record_district(&mut self, unit: &GeographicUnit, resolution: Resolution) {
        let key = (canonical_province(&unit.province_name).to_string(), unit.municipality());
        let i = match self.coverage_index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.district_coverage.len();
                self.district_coverage.push(DistrictCoverage {
                    province: key.0.clone(),
                    municipality: key.1.clone(),
                    success: 0,
                    total: 0,
                });
                self.coverage_index.insert(key, i);
                i
            }
        };
        let coverage = &mut self.district_coverage[i];
        coverage.total += 1;
        if resolution.is_success() {
            coverage.success += 1;
        }
    }

    pub fn get(&self, indicator: Indicator) -> Option<&IndicatorDiagnostics> {
        self.indicators.get(&indicator)
    }

    /// Municipalities where no unit matched a sewer row
    pub fn unmatched_municipalities(&self) -> impl Iterator<Item = &DistrictCoverage> {
        self.district_coverage
            .iter()
            .filter(|c| c.success == 0 && c.total > 0)
    }

    pub fn log_summary(&self) {
        for (indicator, diag) in &self.indicators {
            info!(
                "{}: {} matched, {} unmatched ({:.1}% success)",
                indicator,
                diag.success,
                diag.failure,
                diag.success_rate() * 100.0
            );
            if diag.failure > 0 {
                warn!(
                    "{}: {} units used a province average, {} the global default",
                    indicator, diag.province_average_used, diag.global_default_used
                );
            }
        }
        let unmatched = self.unmatched_municipalities().count();
        if unmatched > 0 {
            warn!("{} municipalities have no sewer match", unmatched);
        }
    }
}
