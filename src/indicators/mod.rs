//! Indicator datasets: records, keyed tables, loaders and index derivation

mod table;
mod housing;
mod sewer;
pub mod loader;

pub use table::{CodeTable, DistrictTable, ProvinceTable, StationTable};
pub use housing::{HousingComponents, derive_housing_index};
pub use sewer::{SewerComponents, SewerDerivation, derive_sewer_index};
pub use loader::{IndicatorTables, LoadReport};

use serde::{Deserialize, Serialize};

use crate::grading::Grade;

/// The four independently sourced vulnerability measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Housing,
    Sewer,
    Social,
    Rainfall,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::Housing,
        Indicator::Sewer,
        Indicator::Social,
        Indicator::Rainfall,
    ];

    /// Name used in output property keys and file names
    pub fn name(&self) -> &'static str {
        match self {
            Indicator::Housing => "housing",
            Indicator::Sewer => "sewer",
            Indicator::Social => "social",
            Indicator::Rainfall => "rainfall",
        }
    }
}

impl std::fmt::Display for Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Lookup key of a source row; the shape differs per indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKey {
    Province(String),
    District { province: String, district: String },
    AdminCode(String),
    Station(String),
}

impl RecordKey {
    /// District component of a (province, district) key
    pub fn district(&self) -> Option<&str> {
        match self {
            RecordKey::District { district, .. } => Some(district),
            _ => None,
        }
    }
}

/// One source row after grading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRecord {
    pub key: RecordKey,

    /// Canonical province of the row, when the source carries one
    pub province: Option<String>,

    /// Indicator value on the 0-100 scale
    pub raw_value: f64,

    pub grade: Grade,
}

/// Values outside 0..=100 (or NaN) are excluded at ingestion
pub fn in_value_domain(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}
