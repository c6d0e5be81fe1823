//! Batch runner: tables are loaded once, then any number of unit sets can be
//! resolved and scored against them.

use log::info;
use rayon::prelude::*;

use crate::config::PipelineConfig;
use crate::error::{IndexError, Result};
use crate::geography::GeographicUnit;
use crate::grading::GradeScales;
use crate::indicators::{Indicator, IndicatorTables};
use crate::resolve::{GlobalDefault, Resolution, ResolutionCascade, ResolutionDiagnostics, ResolvedValue};
use crate::scoring::{CompositeRecord, CompositeScorer, WeightScheme};

/// Scored units plus how their indicator values were obtained
#[derive(Debug, Clone, Default)]
pub struct PipelineResult {
    pub records: Vec<CompositeRecord>,
    pub diagnostics: ResolutionDiagnostics,
}

/// Pre-loaded batch runner
///
/// # Example
/// ```ignore
/// let runner = BatchRunner::from_config(&config)?;
/// let boundaries = load_boundaries(&config.boundary_paths())?;
/// let result = runner.run(&boundaries.units);
/// ```
#[derive(Debug, Clone)]
pub struct BatchRunner {
    tables: IndicatorTables,
    scales: GradeScales,
    scheme: WeightScheme,
    scorer: CompositeScorer,
    global_default: GlobalDefault,
    parallel: bool,
}

/// The four cascades of one run, built before any unit is resolved
struct Cascades<'a> {
    housing: ResolutionCascade<'a>,
    sewer: ResolutionCascade<'a>,
    social: ResolutionCascade<'a>,
    rainfall: Option<ResolutionCascade<'a>>,
}

impl BatchRunner {
    /// Create a runner over already loaded tables
    pub fn new(
        tables: IndicatorTables,
        scales: GradeScales,
        scheme: WeightScheme,
        global_default: GlobalDefault,
    ) -> Result<Self> {
        if scheme.uses_rainfall() && tables.rainfall.is_none() {
            return Err(IndexError::Config(format!(
                "weight scheme '{}' needs a rainfall table",
                scheme.name()
            )));
        }
        let scorer = CompositeScorer::new(&scheme, scales.composite.clone())?;
        Ok(Self {
            tables,
            scales,
            scheme,
            scorer,
            global_default,
            parallel: false,
        })
    }

    /// Validate the configuration, then load every indicator table it names
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let scales = config.validate()?;
        let rainfall = config.rainfall_path();
        let tables = IndicatorTables::load(
            &config.housing_source(),
            &config.sewer_source(),
            &config.social_path(),
            rainfall.as_deref(),
            &scales,
        )?;
        Ok(Self::new(tables, scales, config.weights.clone(), config.global_default)?.with_parallel(config.parallel))
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn tables(&self) -> &IndicatorTables {
        &self.tables
    }

    pub fn scheme(&self) -> &WeightScheme {
        &self.scheme
    }

    fn cascades(&self) -> Cascades<'_> {
        Cascades {
            housing: ResolutionCascade::new(&self.tables.housing, &self.scales.housing, self.global_default),
            sewer: ResolutionCascade::new(&self.tables.sewer, &self.scales.sewer, self.global_default),
            social: ResolutionCascade::new(&self.tables.social, &self.scales.social, self.global_default),
            rainfall: self
                .tables
                .rainfall
                .as_ref()
                .map(|table| ResolutionCascade::new(table, &self.scales.rainfall, self.global_default)),
        }
    }

    fn score_unit(&self, unit: &GeographicUnit, cascades: &Cascades<'_>) -> CompositeRecord {
        let housing = cascades.housing.resolve(unit);
        let sewer = cascades.sewer.resolve(unit);
        let social = cascades.social.resolve(unit);
        let rainfall = match &cascades.rainfall {
            Some(cascade) => cascade.resolve(unit),
            None => ResolvedValue {
                value: self.global_default.value,
                grade: self.scales.rainfall.label_for(self.global_default.level),
                resolution: Resolution::GlobalDefault,
            },
        };

        let (composite_value, composite_grade) =
            self.scorer.score(housing.value, sewer.value, social.value, rainfall.value);

        CompositeRecord {
            unit: unit.clone(),
            housing,
            sewer,
            social,
            rainfall,
            composite_value,
            composite_grade,
        }
    }

    /// Resolve and score every unit. Output order equals input order.
    pub fn run(&self, units: &[GeographicUnit]) -> PipelineResult {
        let cascades = self.cascades();
        info!(
            "Scoring {} units with '{}' weights{}",
            units.len(),
            self.scheme.name(),
            if self.parallel { " (parallel)" } else { "" }
        );

        let records: Vec<CompositeRecord> = if self.parallel {
            units.par_iter().map(|unit| self.score_unit(unit, &cascades)).collect()
        } else {
            units.iter().map(|unit| self.score_unit(unit, &cascades)).collect()
        };

        let mut diagnostics = ResolutionDiagnostics::default();
        for record in &records {
            diagnostics.record(Indicator::Housing, record.housing.resolution);
            diagnostics.record(Indicator::Sewer, record.sewer.resolution);
            diagnostics.record(Indicator::Social, record.social.resolution);
            if cascades.rainfall.is_some() {
                diagnostics.record(Indicator::Rainfall, record.rainfall.resolution);
            }
            diagnostics.record_district(&record.unit, record.sewer.resolution);
        }
        diagnostics.log_summary();

        PipelineResult { records, diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{CodeTable, DistrictTable, ProvinceTable, StationTable};
    use crate::resolve::MatchStrategy;
    use approx::assert_abs_diff_eq;

    fn tables(scales: &GradeScales) -> IndicatorTables {
        IndicatorTables {
            housing: ProvinceTable::from_rows(vec![("서울특별시".to_string(), 62.0)], &scales.housing),
            sewer: DistrictTable::from_rows(
                vec![
                    ("서울특별시".to_string(), "종로구".to_string(), 80.0),
                    ("부산광역시".to_string(), "중구".to_string(), 30.0),
                ],
                &scales.sewer,
            ),
            social: CodeTable::from_rows(
                vec![
                    ("1111053000".to_string(), Some("서울특별시".to_string()), 40.0),
                    ("11053000".to_string(), Some("부산광역시".to_string()), 90.0),
                ],
                &scales.social,
            ),
            rainfall: Some(StationTable::from_rows(vec![("서울(108)".to_string(), 45.0)], &scales.rainfall)),
            reports: Vec::new(),
        }
    }

    fn units() -> Vec<GeographicUnit> {
        vec![
            GeographicUnit::new("1111053000", "서울특별시 종로구 사직동", "서울특별시"),
            GeographicUnit::new("1114055000", "서울특별시 중구 소공동", "서울특별시"),
            GeographicUnit::new("2611053000", "부산광역시 중구 중앙동", "부산광역시"),
        ]
    }

    fn runner() -> BatchRunner {
        let scales = GradeScales::default();
        BatchRunner::new(tables(&scales), scales, WeightScheme::WithRainfall, GlobalDefault::default()).unwrap()
    }

    #[test]
    fn test_three_unit_round_trip() {
        let result = runner().run(&units());
        assert_eq!(result.records.len(), 3);

        // Matched unit
        let first = &result.records[0];
        assert_eq!(first.sewer.resolution, Resolution::Matched(MatchStrategy::StrippedSubstring));
        assert_eq!(first.sewer.value, 80.0);

        // Unmatched unit in a province with one source row takes that row's average
        let second = &result.records[1];
        assert_eq!(second.sewer.resolution, Resolution::ProvinceAverage);
        assert_eq!(second.sewer.value, 80.0);
        assert_eq!(second.sewer.grade.level, 4);
        assert_eq!(second.social.resolution, Resolution::ProvinceAverage);
        assert_eq!(second.social.value, 40.0);

        // Province without housing or rainfall rows takes the global default
        let third = &result.records[2];
        assert_eq!(third.housing.resolution, Resolution::GlobalDefault);
        assert_eq!(third.housing.value, 50.0);
        assert_eq!(third.housing.grade.level, 3);
        assert_eq!(third.rainfall.resolution, Resolution::GlobalDefault);

        // Composite follows the weighted formula
        assert_abs_diff_eq!(first.composite_value, 0.3 * 62.0 + 0.2 * 80.0 + 0.2 * 40.0 + 0.3 * 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(second.composite_value, first.composite_value, epsilon = 1e-9);
        assert_abs_diff_eq!(third.composite_value, 0.3 * 50.0 + 0.2 * 30.0 + 0.2 * 90.0 + 0.3 * 50.0, epsilon = 1e-9);
        for record in &result.records {
            assert_eq!(record.composite_grade.level, 3);
        }
    }

    #[test]
    fn test_short_code_counts_as_success() {
        let result = runner().run(&units());
        assert_eq!(
            result.records[2].social.resolution,
            Resolution::Matched(MatchStrategy::ShortAdminCode)
        );

        let social = result.diagnostics.get(Indicator::Social).unwrap();
        assert_eq!(social.success, 2);
        assert_eq!(social.failure, 1);
        assert_eq!(social.by_strategy[&MatchStrategy::ShortAdminCode], 1);

        let housing = result.diagnostics.get(Indicator::Housing).unwrap();
        assert_eq!(housing.global_default_used, 1);
    }

    #[test]
    fn test_parallel_run_matches_sequential() {
        let units = units();
        let sequential = runner().run(&units);
        let parallel = runner().with_parallel(true).run(&units);
        assert_eq!(sequential.records, parallel.records);
    }

    #[test]
    fn test_from_config_without_rainfall_file() {
        let dir = std::env::temp_dir().join(format!("vulnerability_index_runner_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("housing_vulnerability.csv"), "region,vulnerability_normalized\n서울특별시,62.0\n").unwrap();
        std::fs::write(dir.join("sewer_infrastructure.csv"), "province,district,sewer_index\n서울특별시,종로구,80.0\n").unwrap();
        std::fs::write(dir.join("social_vulnerability.csv"), "admin_code,province,social_index\n1111053000,서울특별시,40.0\n").unwrap();

        let mut config = PipelineConfig {
            data_dir: dir.clone(),
            ..PipelineConfig::default()
        };
        assert!(BatchRunner::from_config(&config).is_err());

        config.weights = WeightScheme::WithoutRainfall;
        let runner = BatchRunner::from_config(&config).unwrap();
        assert!(runner.tables().rainfall.is_none());

        let result = runner.run(&units()[..1]);
        assert_abs_diff_eq!(
            result.records[0].composite_value,
            0.4 * 62.0 + 0.3 * 80.0 + 0.3 * 40.0,
            epsilon = 1e-9
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_without_rainfall_table() {
        let scales = GradeScales::default();
        let mut tables = tables(&scales);
        tables.rainfall = None;

        assert!(BatchRunner::new(tables.clone(), scales.clone(), WeightScheme::WithRainfall, GlobalDefault::default()).is_err());

        let runner = BatchRunner::new(tables, scales, WeightScheme::WithoutRainfall, GlobalDefault::default()).unwrap();
        let result = runner.run(&units());
        assert!(result.diagnostics.get(Indicator::Rainfall).is_none());
        assert_abs_diff_eq!(
            result.records[0].composite_value,
            0.4 * 62.0 + 0.3 * 80.0 + 0.3 * 40.0,
            epsilon = 1e-9
        );
    }
}
