//! Composite vulnerability scoring
//!
//! The composite is a dot product of the four indicator values with a weight
//! vector. The rainfall-free variant is the same computation with a zero
//! rainfall weight.

use serde::{Deserialize, Serialize};

use crate::aggregate::Metric;
use crate::error::{IndexError, Result};
use crate::geography::GeographicUnit;
use crate::grading::{Grade, GradeScale};
use crate::indicators::Indicator;
use crate::resolve::ResolvedValue;

/// Tolerance on the weight sum
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Weights in indicator order: housing, sewer, social, rainfall
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightScheme {
    #[default]
    WithRainfall,
    WithoutRainfall,
    Custom([f64; 4]),
}

impl WeightScheme {
    pub const WITH_RAINFALL: [f64; 4] = [0.3, 0.2, 0.2, 0.3];
    pub const WITHOUT_RAINFALL: [f64; 4] = [0.4, 0.3, 0.3, 0.0];

    pub fn weights(&self) -> [f64; 4] {
        match self {
            WeightScheme::WithRainfall => Self::WITH_RAINFALL,
            WeightScheme::WithoutRainfall => Self::WITHOUT_RAINFALL,
            WeightScheme::Custom(weights) => *weights,
        }
    }

    /// Whether the rainfall table is needed at all
    pub fn uses_rainfall(&self) -> bool {
        self.weights()[3] > 0.0
    }

    pub fn name(&self) -> &'static str {
        match self {
            WeightScheme::WithRainfall => "with_rainfall",
            WeightScheme::WithoutRainfall => "without_rainfall",
            WeightScheme::Custom(_) => "custom",
        }
    }

    /// Weights must be finite, non-negative and sum to 1
    pub fn validate(&self) -> Result<()> {
        let weights = self.weights();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(IndexError::Config(format!(
                "weights must be non-negative: {:?}",
                weights
            )));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(IndexError::Config(format!(
                "weights must sum to 1.0, got {} ({:?})",
                sum, weights
            )));
        }
        Ok(())
    }
}

/// Weighted fusion of indicator values into a composite value and grade
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    weights: [f64; 4],
    scale: GradeScale,
}

impl CompositeScorer {
    pub fn new(scheme: &WeightScheme, scale: GradeScale) -> Result<Self> {
        scheme.validate()?;
        Ok(Self {
            weights: scheme.weights(),
            scale,
        })
    }

    pub fn weights(&self) -> [f64; 4] {
        self.weights
    }

    /// Inputs are expected on 0-100 and are not rescaled
    pub fn score(&self, housing: f64, sewer: f64, social: f64, rainfall: f64) -> (f64, Grade) {
        let values = [housing, sewer, social, rainfall];
        let value: f64 = values.iter().zip(self.weights.iter()).map(|(v, w)| v * w).sum();
        (value, self.scale.classify(value))
    }
}

/// Fully populated result for one geographic unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositeRecord {
    pub unit: GeographicUnit,
    pub housing: ResolvedValue,
    pub sewer: ResolvedValue,
    pub social: ResolvedValue,
    pub rainfall: ResolvedValue,
    pub composite_value: f64,
    pub composite_grade: Grade,
}

impl CompositeRecord {
    pub fn indicator(&self, indicator: Indicator) -> &ResolvedValue {
        match indicator {
            Indicator::Housing => &self.housing,
            Indicator::Sewer => &self.sewer,
            Indicator::Social => &self.social,
            Indicator::Rainfall => &self.rainfall,
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Indicator(indicator) => self.indicator(indicator).value,
            Metric::Composite => self.composite_value,
        }
    }

    pub fn grade(&self, metric: Metric) -> &Grade {
        match metric {
            Metric::Indicator(indicator) => &self.indicator(indicator).grade,
            Metric::Composite => &self.composite_grade,
        }
    }
}
