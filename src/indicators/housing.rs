//! Housing vulnerability index from disaster-risk and aged-housing components

use serde::Deserialize;

use crate::stats::{min_max_normalize, parse_value};

/// Component weights: total risk districts, high-risk districts, aged housing ratio
const TOTAL_RISK_WEIGHT: f64 = 0.4;
const HIGH_RISK_WEIGHT: f64 = 0.3;
const AGED_HOUSING_WEIGHT: f64 = 0.3;

/// Raw component row; Korean headers of the original exports are accepted as aliases
#[derive(Debug, Clone, Deserialize)]
pub struct HousingComponents {
    #[serde(alias = "지역")]
    pub region: String,
    #[serde(default, alias = "전체위험지구")]
    pub total_risk: Option<String>,
    #[serde(default, alias = "고위험지구")]
    pub high_risk: Option<String>,
    #[serde(default, alias = "노후주택비율")]
    pub aged_housing_ratio: Option<String>,
}

/// Weighted raw score min-max scaled to 0-100.
///
/// Returns `(region, index)` pairs plus the number of rows dropped for a
/// missing or unparsable component.
pub fn derive_housing_index(rows: &[HousingComponents]) -> (Vec<(String, f64)>, usize) {
    let mut regions = Vec::with_capacity(rows.len());
    let mut raw_scores = Vec::with_capacity(rows.len());
    let mut incomplete = 0;

    for row in rows {
        let parts = (
            parse_value(row.total_risk.as_deref()),
            parse_value(row.high_risk.as_deref()),
            parse_value(row.aged_housing_ratio.as_deref()),
        );
        let (Some(total), Some(high), Some(aged)) = parts else {
            incomplete += 1;
            continue;
        };
        regions.push(row.region.trim().to_string());
        raw_scores.push(total * TOTAL_RISK_WEIGHT + high * HIGH_RISK_WEIGHT + aged * AGED_HOUSING_WEIGHT);
    }

    let scaled = min_max_normalize(&raw_scores);
    (regions.into_iter().zip(scaled).collect(), incomplete)
}
