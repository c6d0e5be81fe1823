//! Sewer infrastructure index from coverage-rate components
//!
//! Rows are cleaned (missing fields, rates outside 0-100, implausible
//! population density) before the weighted index is computed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::stats::{min_max_normalize, parse_value};

const INSTALLATION_WEIGHT: f64 = 0.3;
const PUBLIC_TREATMENT_WEIGHT: f64 = 0.3;
const ADVANCED_TREATMENT_WEIGHT: f64 = 0.2;
const DENSITY_WEIGHT: f64 = 0.2;

/// People per km² above which a row is treated as a data error
pub const MAX_POPULATION_DENSITY: f64 = 50_000.0;

/// Raw coverage row; Korean headers of the original exports are accepted as aliases
#[derive(Debug, Clone, Deserialize)]
pub struct SewerComponents {
    #[serde(alias = "시도")]
    pub province: String,
    #[serde(alias = "행정구역명")]
    pub district: String,
    #[serde(default, alias = "총인구(명)")]
    pub population: Option<String>,
    #[serde(default, alias = "총면적")]
    pub area: Option<String>,
    #[serde(default, alias = "하수도설치율")]
    pub installation_rate: Option<String>,
    #[serde(default, alias = "공공하수처리구역 인구보급률")]
    pub public_treatment_rate: Option<String>,
    #[serde(default, alias = "고도처리인구 보급률")]
    pub advanced_treatment_rate: Option<String>,
}

/// Derived index rows plus cleaning counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct SewerDerivation {
    #[serde(skip)]
    pub rows: Vec<(String, String, f64)>,
    pub incomplete: usize,
    pub out_of_range: usize,
    pub density_outliers: usize,
    pub duplicates: usize,
}

struct CleanRow {
    province: String,
    district: String,
    installation: f64,
    public_treatment: f64,
    advanced_treatment: f64,
    density: f64,
}

/// Weighted index: installation 0.3, public 0.3, advanced 0.2, normalized density 0.2
pub fn derive_sewer_index(rows: &[SewerComponents]) -> SewerDerivation {
    let mut result = SewerDerivation::default();
    let mut seen = HashSet::new();
    let mut clean = Vec::with_capacity(rows.len());

    for row in rows {
        let fields = (
            parse_value(row.population.as_deref()),
            parse_value(row.area.as_deref()),
            parse_value(row.installation_rate.as_deref()),
            parse_value(row.public_treatment_rate.as_deref()),
            parse_value(row.advanced_treatment_rate.as_deref()),
        );
        let (Some(population), Some(area), Some(installation), Some(public), Some(advanced)) = fields else {
            result.incomplete += 1;
            continue;
        };
        if row.province.trim().is_empty() || row.district.trim().is_empty() || area <= 0.0 {
            result.incomplete += 1;
            continue;
        }
        if [installation, public, advanced].iter().any(|r| !(0.0..=100.0).contains(r)) {
            result.out_of_range += 1;
            continue;
        }
        let density = population / area;
        if density > MAX_POPULATION_DENSITY {
            result.density_outliers += 1;
            continue;
        }
        let key = (row.province.trim().to_string(), row.district.trim().to_string());
        if !seen.insert(key.clone()) {
            result.duplicates += 1;
            continue;
        }
        clean.push(CleanRow {
            province: key.0,
            district: key.1,
            installation,
            public_treatment: public,
            advanced_treatment: advanced,
            density,
        });
    }

    let densities: Vec<f64> = clean.iter().map(|r| r.density).collect();
    let normalized = min_max_normalize(&densities);

    result.rows = clean
        .into_iter()
        .zip(normalized)
        .map(|(row, density_norm)| {
            let index = row.installation * INSTALLATION_WEIGHT
                + row.public_treatment * PUBLIC_TREATMENT_WEIGHT
                + row.advanced_treatment * ADVANCED_TREATMENT_WEIGHT
                + density_norm * DENSITY_WEIGHT;
            (row.province, row.district, index)
        })
        .collect();

    result
}
