//! Regional roll-ups: per-scope means, top-K rankings and indicator correlations

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::indicators::Indicator;
use crate::resolve::aliases::canonical_province;
use crate::scoring::CompositeRecord;
use crate::stats::{mean, pearson};

/// Label of the all-units summary row
pub const NATIONWIDE: &str = "nationwide";

/// A rankable per-unit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Indicator(Indicator),
    Composite,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Indicator(Indicator::Housing),
        Metric::Indicator(Indicator::Sewer),
        Metric::Indicator(Indicator::Social),
        Metric::Indicator(Indicator::Rainfall),
        Metric::Composite,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::Indicator(indicator) => indicator.name(),
            Metric::Composite => "composite",
        }
    }

    /// Direction in which the metric means "more vulnerable". Sewer measures
    /// infrastructure coverage, so its low values are the vulnerable ones.
    pub fn natural_order(&self) -> RankOrder {
        match self {
            Metric::Indicator(Indicator::Sewer) => RankOrder::LowerIsWorse,
            _ => RankOrder::HigherIsWorse,
        }
    }
}

/// Ranking direction for `top_k`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    /// Descending values
    HigherIsWorse,
    /// Ascending values
    LowerIsWorse,
}

/// Selection of units to summarize
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegionScope {
    Nationwide,
    /// Canonical or short province name
    Province(String),
}

impl RegionScope {
    fn includes(&self, record: &CompositeRecord) -> bool {
        match self {
            RegionScope::Nationwide => true,
            RegionScope::Province(name) => {
                canonical_province(&record.unit.province_name) == canonical_province(name)
            }
        }
    }

    fn label(&self) -> String {
        match self {
            RegionScope::Nationwide => NATIONWIDE.to_string(),
            RegionScope::Province(name) => canonical_province(name).to_string(),
        }
    }
}

/// Mean indicator and composite values over a set of units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub region: String,
    pub units: usize,
    pub housing: f64,
    pub sewer: f64,
    pub social: f64,
    pub rainfall: f64,
    pub composite: f64,
}

impl RegionSummary {
    pub fn indicator(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::Housing => self.housing,
            Indicator::Sewer => self.sewer,
            Indicator::Social => self.social,
            Indicator::Rainfall => self.rainfall,
        }
    }
}

/// Arithmetic means over the units in `scope`; `None` when none match
pub fn summarize(records: &[CompositeRecord], scope: &RegionScope) -> Option<RegionSummary> {
    let selected: Vec<&CompositeRecord> = records.iter().filter(|r| scope.includes(r)).collect();
    summary_of(scope.label(), &selected)
}

fn summary_of(region: String, records: &[&CompositeRecord]) -> Option<RegionSummary> {
    let column = |metric: Metric| -> Option<f64> {
        let values: Vec<f64> = records.iter().map(|r| r.metric(metric)).collect();
        mean(&values)
    };

    Some(RegionSummary {
        region,
        units: records.len(),
        housing: column(Metric::Indicator(Indicator::Housing))?,
        sewer: column(Metric::Indicator(Indicator::Sewer))?,
        social: column(Metric::Indicator(Indicator::Social))?,
        rainfall: column(Metric::Indicator(Indicator::Rainfall))?,
        composite: column(Metric::Composite)?,
    })
}

/// One summary per canonical province, in first-seen order
pub fn province_summaries(records: &[CompositeRecord]) -> Vec<RegionSummary> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&CompositeRecord>> = HashMap::new();

    for record in records {
        let province = canonical_province(&record.unit.province_name);
        groups
            .entry(province)
            .or_insert_with(|| {
                order.push(province);
                Vec::new()
            })
            .push(record);
    }

    order
        .into_iter()
        .filter_map(|province| summary_of(province.to_string(), &groups[province]))
        .collect()
}

/// The `k` most vulnerable units by `metric`. The sort is stable, so ties
/// keep their input order.
pub fn top_k(records: &[CompositeRecord], metric: Metric, k: usize, order: RankOrder) -> Vec<&CompositeRecord> {
    let mut ranked: Vec<&CompositeRecord> = records.iter().collect();
    ranked.sort_by(|a, b| {
        let (a, b) = (a.metric(metric), b.metric(metric));
        match order {
            RankOrder::HigherIsWorse => b.total_cmp(&a),
            RankOrder::LowerIsWorse => a.total_cmp(&b),
        }
    });
    ranked.truncate(k);
    ranked
}

/// Pearson correlations between indicator means across regions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub indicators: [Indicator; 4],
    pub values: [[f64; 4]; 4],
}

impl CorrelationMatrix {
    pub fn get(&self, a: Indicator, b: Indicator) -> f64 {
        let position = |i: Indicator| self.indicators.iter().position(|x| *x == i);
        match (position(a), position(b)) {
            (Some(i), Some(j)) => self.values[i][j],
            _ => f64::NAN,
        }
    }
}

/// Zero-variance columns correlate as NaN
pub fn correlation_matrix(summaries: &[RegionSummary]) -> CorrelationMatrix {
    let columns: Vec<Vec<f64>> = Indicator::ALL
        .iter()
        .map(|&indicator| summaries.iter().map(|s| s.indicator(indicator)).collect())
        .collect();

    let mut values = [[f64::NAN; 4]; 4];
    for (i, row) in values.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = pearson(&columns[i], &columns[j]);
        }
    }

    CorrelationMatrix {
        indicators: Indicator::ALL,
        values,
    }
}

/// Orders regions by a summary column, most vulnerable first
pub fn rank_summaries(summaries: &mut [RegionSummary], metric: Metric) {
    let key = |s: &RegionSummary| match metric {
        Metric::Indicator(indicator) => s.indicator(indicator),
        Metric::Composite => s.composite,
    };
    summaries.sort_by(|a, b| match metric.natural_order() {
        RankOrder::HigherIsWorse => key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal),
        RankOrder::LowerIsWorse => key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal),
    });
}
