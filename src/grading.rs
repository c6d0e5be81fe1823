//! Ordinal grade buckets for indicator and composite values
//!
//! A scale is an ascending list of bin boundaries from 0 to 100 plus one
//! label per bucket. Unclassifiable input (NaN) always lands in the lowest
//! grade.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Label set shared by every scale, truncated to the scale's bucket count
pub const GRADE_LABELS: [&str; 5] = ["very low", "low", "medium", "high", "very high"];

/// Default inner thresholds per indicator
pub const HOUSING_THRESHOLDS: [f64; 4] = [10.0, 30.0, 50.0, 70.0];
pub const SEWER_THRESHOLDS: [f64; 3] = [40.0, 60.0, 80.0];
pub const SOCIAL_THRESHOLDS: [f64; 3] = [25.0, 50.0, 75.0];
pub const RAINFALL_THRESHOLDS: [f64; 3] = [30.0, 60.0, 80.0];
pub const COMPOSITE_THRESHOLDS: [f64; 4] = [30.0, 50.0, 70.0, 85.0];

const SCALE_FLOOR: f64 = 0.0;
const SCALE_CEILING: f64 = 100.0;

/// A classified grade: 1-based level plus its label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub level: u8,
    pub label: String,
}

/// Classify `value` against `bins`, returning the 1-based grade index and its label.
///
/// `labels.len()` must equal `bins.len() - 1`.
pub fn classify<'a>(value: f64, bins: &[f64], labels: &[&'a str]) -> (usize, &'a str) {
    let index = grade_index(value, bins);
    (index, labels[index - 1])
}

/// Smallest `i >= 1` with `value < bins[i]`, else the last grade. NaN maps to 1.
fn grade_index(value: f64, bins: &[f64]) -> usize {
    let last = bins.len().saturating_sub(1).max(1);
    if value.is_nan() {
        return 1;
    }
    bins.iter()
        .enumerate()
        .skip(1)
        .find(|(_, bound)| value < **bound)
        .map(|(i, _)| i)
        .unwrap_or(last)
}

/// Bin boundaries and labels for one indicator
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    bins: Vec<f64>,
    labels: Vec<String>,
}

impl GradeScale {
    /// Build a scale from full bin boundaries and labels
    pub fn new(bins: Vec<f64>, labels: Vec<String>) -> Result<Self> {
        if bins.len() < 2 {
            return Err(IndexError::Config(format!(
                "grade scale needs at least two bin boundaries, got {}",
                bins.len()
            )));
        }
        if labels.len() != bins.len() - 1 {
            return Err(IndexError::Config(format!(
                "grade scale has {} bins but {} labels",
                bins.len(),
                labels.len()
            )));
        }
        if bins.iter().any(|b| b.is_nan()) || bins.windows(2).any(|w| w[0] >= w[1]) {
            return Err(IndexError::Config(format!(
                "grade bins must be strictly ascending: {:?}",
                bins
            )));
        }
        Ok(Self { bins, labels })
    }

    /// Build a scale from inner thresholds, framed by 0 and 100
    pub fn from_thresholds(thresholds: &[f64]) -> Result<Self> {
        let buckets = thresholds.len() + 1;
        if buckets > GRADE_LABELS.len() {
            return Err(IndexError::Config(format!(
                "at most {} grade buckets are supported, got {}",
                GRADE_LABELS.len(),
                buckets
            )));
        }

        let mut bins = Vec::with_capacity(thresholds.len() + 2);
        bins.push(SCALE_FLOOR);
        bins.extend_from_slice(thresholds);
        bins.push(SCALE_CEILING);

        let labels = GRADE_LABELS[..buckets].iter().map(|l| l.to_string()).collect();
        Self::new(bins, labels)
    }

    /// Housing age: 5 grades
    pub fn housing() -> Self {
        Self::preset(&HOUSING_THRESHOLDS)
    }

    /// Sewer infrastructure: 4 grades
    pub fn sewer() -> Self {
        Self::preset(&SEWER_THRESHOLDS)
    }

    /// Social vulnerability: 4 grades
    pub fn social() -> Self {
        Self::preset(&SOCIAL_THRESHOLDS)
    }

    /// Rainfall percentile: 4 grades
    pub fn rainfall() -> Self {
        Self::preset(&RAINFALL_THRESHOLDS)
    }

    /// Composite score: 5 grades
    pub fn composite() -> Self {
        Self::preset(&COMPOSITE_THRESHOLDS)
    }

    fn preset(thresholds: &[f64]) -> Self {
        let mut bins = vec![SCALE_FLOOR];
        bins.extend_from_slice(thresholds);
        bins.push(SCALE_CEILING);
        let labels = GRADE_LABELS[..thresholds.len() + 1]
            .iter()
            .map(|l| l.to_string())
            .collect();
        Self { bins, labels }
    }

    /// Number of buckets
    pub fn grade_count(&self) -> u8 {
        self.labels.len() as u8
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    /// Classify a raw value
    pub fn classify(&self, value: f64) -> Grade {
        let level = grade_index(value, &self.bins);
        Grade {
            level: level as u8,
            label: self.labels[level - 1].clone(),
        }
    }

    /// Grade for an externally computed level, clamped into range
    pub fn label_for(&self, level: u8) -> Grade {
        let level = level.clamp(1, self.grade_count());
        Grade {
            level,
            label: self.labels[level as usize - 1].clone(),
        }
    }
}

/// One scale per indicator plus the composite scale
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScales {
    pub housing: GradeScale,
    pub sewer: GradeScale,
    pub social: GradeScale,
    pub rainfall: GradeScale,
    pub composite: GradeScale,
}

impl Default for GradeScales {
    fn default() -> Self {
        Self {
            housing: GradeScale::housing(),
            sewer: GradeScale::sewer(),
            social: GradeScale::social(),
            rainfall: GradeScale::rainfall(),
            composite: GradeScale::composite(),
        }
    }
}
