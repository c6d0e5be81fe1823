//! Pipeline configuration
//!
//! Loaded from a JSON file in which every field is optional. Relative input
//! paths are resolved against `data_dir`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::grading::{
    COMPOSITE_THRESHOLDS, GradeScale, GradeScales, HOUSING_THRESHOLDS, RAINFALL_THRESHOLDS, SEWER_THRESHOLDS,
    SOCIAL_THRESHOLDS,
};
use crate::indicators::loader::{DEFAULT_DATA_PATH, IndicatorSource, SourceFormat};
use crate::resolve::GlobalDefault;
use crate::scoring::WeightScheme;

/// Inner grade thresholds per indicator; 0 and 100 are implied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeThresholds {
    pub housing: Vec<f64>,
    pub sewer: Vec<f64>,
    pub social: Vec<f64>,
    pub rainfall: Vec<f64>,
    pub composite: Vec<f64>,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            housing: HOUSING_THRESHOLDS.to_vec(),
            sewer: SEWER_THRESHOLDS.to_vec(),
            social: SOCIAL_THRESHOLDS.to_vec(),
            rainfall: RAINFALL_THRESHOLDS.to_vec(),
            composite: COMPOSITE_THRESHOLDS.to_vec(),
        }
    }
}

impl GradeThresholds {
    pub fn scales(&self) -> Result<GradeScales> {
        Ok(GradeScales {
            housing: GradeScale::from_thresholds(&self.housing)?,
            sewer: GradeScale::from_thresholds(&self.sewer)?,
            social: GradeScale::from_thresholds(&self.social)?,
            rainfall: GradeScale::from_thresholds(&self.rainfall)?,
            composite: GradeScale::from_thresholds(&self.composite)?,
        })
    }
}

/// Configuration for one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Base directory for relative input paths
    pub data_dir: PathBuf,

    pub housing: IndicatorSource,
    pub sewer: IndicatorSource,
    pub social: PathBuf,

    /// Omitted when the batch has no rainfall data
    pub rainfall: Option<PathBuf>,

    /// One GeoJSON FeatureCollection per province
    pub boundaries: Vec<PathBuf>,

    pub output_dir: PathBuf,

    pub weights: WeightScheme,
    pub grades: GradeThresholds,
    pub global_default: GlobalDefault,

    /// Rows per top-K ranking file
    pub top_k: usize,

    /// Resolve units on the rayon thread pool
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_PATH),
            housing: IndicatorSource {
                path: PathBuf::from("housing_vulnerability.csv"),
                format: SourceFormat::Index,
            },
            sewer: IndicatorSource {
                path: PathBuf::from("sewer_infrastructure.csv"),
                format: SourceFormat::Index,
            },
            social: PathBuf::from("social_vulnerability.csv"),
            rainfall: Some(PathBuf::from("rainfall_percentile.csv")),
            boundaries: vec![PathBuf::from("boundaries.geojson")],
            output_dir: PathBuf::from("output"),
            weights: WeightScheme::WithRainfall,
            grades: GradeThresholds::default(),
            global_default: GlobalDefault::default(),
            top_k: 10,
            parallel: false,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
        Self::from_reader(BufReader::new(file), path)
    }

    pub fn from_reader<R: Read>(reader: R, origin: &Path) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|e| IndexError::json(origin, e))
    }

    /// Path with relative entries placed under `data_dir`
    pub fn input_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }

    pub fn housing_source(&self) -> IndicatorSource {
        IndicatorSource {
            path: self.input_path(&self.housing.path),
            format: self.housing.format,
        }
    }

    pub fn sewer_source(&self) -> IndicatorSource {
        IndicatorSource {
            path: self.input_path(&self.sewer.path),
            format: self.sewer.format,
        }
    }

    pub fn social_path(&self) -> PathBuf {
        self.input_path(&self.social)
    }

    /// Rainfall input to load; `None` when the weights ignore rainfall
    pub fn rainfall_path(&self) -> Option<PathBuf> {
        if !self.weights.uses_rainfall() {
            return None;
        }
        self.rainfall.as_deref().map(|p| self.input_path(p))
    }

    pub fn boundary_paths(&self) -> Vec<PathBuf> {
        self.boundaries.iter().map(|p| self.input_path(p)).collect()
    }

    /// Check everything that can be checked before any data is read
    pub fn validate(&self) -> Result<GradeScales> {
        self.weights.validate()?;
        let scales = self.grades.scales()?;

        if self.weights.uses_rainfall() && self.rainfall.is_none() {
            return Err(IndexError::Config(format!(
                "weight scheme '{}' needs rainfall data but no rainfall source is configured",
                self.weights.name()
            )));
        }
        if self.boundaries.is_empty() {
            return Err(IndexError::Config("no boundary files configured".to_string()));
        }
        if self.top_k == 0 {
            return Err(IndexError::Config("top_k must be at least 1".to_string()));
        }
        let default = self.global_default;
        if !(0.0..=100.0).contains(&default.value) || default.level == 0 {
            return Err(IndexError::Config(format!(
                "global default must be within 0-100 with a positive grade, got {:?}",
                default
            )));
        }

        Ok(scales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("config.json")
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        let scales = config.validate().unwrap();
        assert_eq!(scales, GradeScales::default());
        assert_eq!(config.social_path(), PathBuf::from("data/processed/social_vulnerability.csv"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "data_dir": "/srv/data",
            "weights": "without_rainfall",
            "rainfall": null,
            "sewer": {"path": "sewer_components.csv", "format": "components"},
            "grades": {"sewer": [30, 50, 70]},
            "top_k": 5
        }"#;
        let config = PipelineConfig::from_reader(json.as_bytes(), origin()).unwrap();
        assert_eq!(config.weights, WeightScheme::WithoutRainfall);
        assert_eq!(config.sewer_source().format, SourceFormat::Components);
        assert_eq!(config.sewer_source().path, PathBuf::from("/srv/data/sewer_components.csv"));
        assert_eq!(config.grades.housing, HOUSING_THRESHOLDS.to_vec());
        assert_eq!(config.top_k, 5);
        assert!(config.rainfall_path().is_none());

        let scales = config.validate().unwrap();
        assert_eq!(scales.sewer.classify(65.0).level, 3);
    }

    #[test]
    fn test_rainfall_path_skipped_without_rainfall_weight() {
        let mut config = PipelineConfig::default();
        assert!(config.rainfall_path().is_some());

        config.weights = WeightScheme::WithoutRainfall;
        assert!(config.rainfall.is_some());
        assert!(config.rainfall_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
        fn test_rainfall_weight_requires_source() {
        let config = PipelineConfig {
            rainfall: None,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(IndexError::Config(_))));
    }

    #[test]
    fn test_bad_weights_and_bins_rejected() {
        let config = PipelineConfig {
            weights: WeightScheme::Custom([0.5, 0.5, 0.5, 0.5]),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.grades.social = vec![60.0, 20.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json_reports_origin() {
        let err = PipelineConfig::from_reader("{ not json".as_bytes(), origin()).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }
}
