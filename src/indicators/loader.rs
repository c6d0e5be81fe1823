//! CSV-based indicator loaders
//!
//! Every loader has a path-based entry point and a reader-based variant.
//! Rows whose value is missing or outside 0-100 are dropped and counted in
//! the returned `LoadReport`; only structural read failures are errors.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::housing::{HousingComponents, derive_housing_index};
use super::sewer::{SewerComponents, derive_sewer_index};
use super::{CodeTable, DistrictTable, Indicator, ProvinceTable, StationTable, in_value_domain};
use crate::error::{IndexError, Result};
use crate::grading::GradeScales;
use crate::stats::parse_value;

/// Default directory for processed indicator files
pub const DEFAULT_DATA_PATH: &str = "data/processed";

/// Shape of a housing or sewer source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Precomputed 0-100 index per key
    #[default]
    Index,
    /// Raw components from which the index is derived
    Components,
}

/// Location and shape of one indicator source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSource {
    pub path: PathBuf,
    #[serde(default)]
    pub format: SourceFormat,
}

impl IndicatorSource {
    pub fn index(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), format: SourceFormat::Index }
    }
}

/// Ingestion counters for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub indicator: Indicator,
    pub source: String,
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Missing or unparsable value
    pub incomplete: usize,
    /// Value outside 0-100, or implausible component data
    pub out_of_range: usize,
    pub duplicates: usize,
}

impl LoadReport {
    fn new(indicator: Indicator, origin: &Path) -> Self {
        Self {
            indicator,
            source: origin.display().to_string(),
            total_rows: 0,
            kept_rows: 0,
            incomplete: 0,
            out_of_range: 0,
            duplicates: 0,
        }
    }

    fn log(&self) {
        info!(
            "{} source {}: {} rows read, {} kept",
            self.indicator, self.source, self.total_rows, self.kept_rows
        );
        let dropped = self.incomplete + self.out_of_range + self.duplicates;
        if dropped > 0 {
            warn!(
                "{} source {}: dropped {} incomplete, {} out of range, {} duplicate rows",
                self.indicator, self.source, self.incomplete, self.out_of_range, self.duplicates
            );
        }
    }
}

#[derive(Debug, Deserialize)]
struct HousingIndexRow {
    #[serde(alias = "지역")]
    region: String,
    #[serde(default, alias = "주거취약지수")]
    vulnerability_normalized: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SewerIndexRow {
    #[serde(alias = "시도")]
    province: String,
    #[serde(alias = "행정구역명")]
    district: String,
    #[serde(default, alias = "하수도_인프라_지수")]
    sewer_index: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SocialRow {
    #[serde(alias = "행정동코드")]
    admin_code: String,
    #[serde(default, alias = "시도명")]
    province: Option<String>,
    #[serde(default, alias = "사회취약지수")]
    social_index: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RainfallRow {
    #[serde(alias = "지점정보")]
    station: String,
    #[serde(default, alias = "백분위(강수량 0.5, 호우 * 0.5)")]
    rainfall_percentile: Option<String>,
}

fn read_rows<T: DeserializeOwned, R: Read>(reader: R, origin: &Path) -> Result<Vec<T>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for result in csv_reader.deserialize() {
        let row: T = result.map_err(|e| IndexError::csv(origin, e))?;
        rows.push(row);
    }
    Ok(rows)
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| IndexError::io(path, e))
}

/// Parse a value and check its domain, counting rejects in `report`
fn checked_value(raw: Option<&str>, report: &mut LoadReport) -> Option<f64> {
    match parse_value(raw) {
        None => {
            report.incomplete += 1;
            None
        }
        Some(v) if !in_value_domain(v) => {
            report.out_of_range += 1;
            None
        }
        Some(v) => Some(v),
    }
}

/// Housing table from a source of either format
pub fn load_housing(source: &IndicatorSource, scales: &GradeScales) -> Result<(ProvinceTable, LoadReport)> {
    let file = open(&source.path)?;
    match source.format {
        SourceFormat::Index => housing_index_from_reader(file, &source.path, scales),
        SourceFormat::Components => housing_components_from_reader(file, &source.path, scales),
    }
}

pub fn housing_index_from_reader<R: Read>(
    reader: R,
    origin: &Path,
    scales: &GradeScales,
) -> Result<(ProvinceTable, LoadReport)> {
    let rows: Vec<HousingIndexRow> = read_rows(reader, origin)?;
    let mut report = LoadReport::new(Indicator::Housing, origin);
    report.total_rows = rows.len();

    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(value) = checked_value(row.vulnerability_normalized.as_deref(), &mut report) {
            kept.push((row.region, value));
        }
    }

    Ok(finish_province(kept, report, scales))
}

pub fn housing_components_from_reader<R: Read>(
    reader: R,
    origin: &Path,
    scales: &GradeScales,
) -> Result<(ProvinceTable, LoadReport)> {
    let rows: Vec<HousingComponents> = read_rows(reader, origin)?;
    let mut report = LoadReport::new(Indicator::Housing, origin);
    report.total_rows = rows.len();

    let (derived, incomplete) = derive_housing_index(&rows);
    report.incomplete = incomplete;

    Ok(finish_province(derived, report, scales))
}

fn finish_province(
    rows: Vec<(String, f64)>,
    mut report: LoadReport,
    scales: &GradeScales,
) -> (ProvinceTable, LoadReport) {
    let table = ProvinceTable::from_rows(rows, &scales.housing);
    report.duplicates += table.duplicates();
    report.kept_rows = table.len();
    report.log();
    (table, report)
}

/// Sewer table from a source of either format
pub fn load_sewer(source: &IndicatorSource, scales: &GradeScales) -> Result<(DistrictTable, LoadReport)> {
    let file = open(&source.path)?;
    match source.format {
        SourceFormat::Index => sewer_index_from_reader(file, &source.path, scales),
        SourceFormat::Components => sewer_components_from_reader(file, &source.path, scales),
    }
}

pub fn sewer_index_from_reader<R: Read>(
    reader: R,
    origin: &Path,
    scales: &GradeScales,
) -> Result<(DistrictTable, LoadReport)> {
    let rows: Vec<SewerIndexRow> = read_rows(reader, origin)?;
    let mut report = LoadReport::new(Indicator::Sewer, origin);
    report.total_rows = rows.len();

    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(value) = checked_value(row.sewer_index.as_deref(), &mut report) {
            kept.push((row.province, row.district, value));
        }
    }

    Ok(finish_district(kept, report, scales))
}

pub fn sewer_components_from_reader<R: Read>(
    reader: R,
    origin: &Path,
    scales: &GradeScales,
) -> Result<(DistrictTable, LoadReport)> {
    let rows: Vec<SewerComponents> = read_rows(reader, origin)?;
    let mut report = LoadReport::new(Indicator::Sewer, origin);
    report.total_rows = rows.len();

    let derived = derive_sewer_index(&rows);
    report.incomplete = derived.incomplete;
    report.out_of_range = derived.out_of_range + derived.density_outliers;
    report.duplicates = derived.duplicates;

    Ok(finish_district(derived.rows, report, scales))
}

fn finish_district(
    rows: Vec<(String, String, f64)>,
    mut report: LoadReport,
    scales: &GradeScales,
) -> (DistrictTable, LoadReport) {
    let table = DistrictTable::from_rows(rows, &scales.sewer);
    report.duplicates += table.duplicates();
    report.kept_rows = table.len();
    report.log();
    (table, report)
}

/// Social vulnerability table keyed by administrative code
pub fn load_social(path: &Path, scales: &GradeScales) -> Result<(CodeTable, LoadReport)> {
    social_from_reader(open(path)?, path, scales)
}

pub fn social_from_reader<R: Read>(
    reader: R,
    origin: &Path,
    scales: &GradeScales,
) -> Result<(CodeTable, LoadReport)> {
    let rows: Vec<SocialRow> = read_rows(reader, origin)?;
    let mut report = LoadReport::new(Indicator::Social, origin);
    report.total_rows = rows.len();

    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(value) = checked_value(row.social_index.as_deref(), &mut report) {
            let province = row.province.filter(|p| !p.trim().is_empty());
            kept.push((row.admin_code, province, value));
        }
    }

    let table = CodeTable::from_rows(kept, &scales.social);
    report.duplicates += table.duplicates();
    report.kept_rows = table.len();
    report.log();
    Ok((table, report))
}

/// Rainfall percentile table keyed by station name
pub fn load_rainfall(path: &Path, scales: &GradeScales) -> Result<(StationTable, LoadReport)> {
    rainfall_from_reader(open(path)?, path, scales)
}

pub fn rainfall_from_reader<R: Read>(
    reader: R,
    origin: &Path,
    scales: &GradeScales,
) -> Result<(StationTable, LoadReport)> {
    let rows: Vec<RainfallRow> = read_rows(reader, origin)?;
    let mut report = LoadReport::new(Indicator::Rainfall, origin);
    report.total_rows = rows.len();

    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if let Some(value) = checked_value(row.rainfall_percentile.as_deref(), &mut report) {
            kept.push((row.station, value));
        }
    }

    let table = StationTable::from_rows(kept, &scales.rainfall);
    report.kept_rows = table.len();
    report.log();
    Ok((table, report))
}

/// All indicator tables for one batch, loaded once and read-only afterwards
#[derive(Debug, Clone, Default)]
pub struct IndicatorTables {
    pub housing: ProvinceTable,
    pub sewer: DistrictTable,
    pub social: CodeTable,
    /// Absent when the batch runs without rainfall data
    pub rainfall: Option<StationTable>,
    pub reports: Vec<LoadReport>,
}

impl IndicatorTables {
    /// Load every configured source. Any missing or unreadable file is fatal.
    pub fn load(
        housing: &IndicatorSource,
        sewer: &IndicatorSource,
        social: &Path,
        rainfall: Option<&Path>,
        scales: &GradeScales,
    ) -> Result<Self> {
        let (housing, housing_report) = load_housing(housing, scales)?;
        let (sewer, sewer_report) = load_sewer(sewer, scales)?;
        let (social, social_report) = load_social(social, scales)?;
        let mut reports = vec![housing_report, sewer_report, social_report];

        let rainfall = match rainfall {
            Some(path) => {
                let (table, report) = load_rainfall(path, scales)?;
                reports.push(report);
                Some(table)
            }
            None => None,
        };

        Ok(Self {
            housing,
            sewer,
            social,
            rainfall,
            reports,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn test_housing_index_filters_domain() {
        let csv = "region,vulnerability_normalized\n\
                   서울,62.5\n\
                   부산광역시,140\n\
                   대구광역시,\n\
                   인천광역시,12\n";
        let (table, report) = housing_index_from_reader(csv.as_bytes(), origin(), &GradeScales::default()).unwrap();
        assert_eq!(report.total_rows, 4);
        assert_eq!(report.kept_rows, 2);
        assert_eq!(report.out_of_range, 1);
        assert_eq!(report.incomplete, 1);
        assert_eq!(table.get("서울특별시").unwrap().grade.level, 4);
    }

    #[test]
    fn test_korean_headers_accepted() {
        let csv = "시도,행정구역명,하수도_인프라_지수\n\
                   경기도,수원시 장안구,72.4\n\
                   경기도,수원시 장안구,10.0\n";
        let (table, report) = sewer_index_from_reader(csv.as_bytes(), origin(), &GradeScales::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(table.get("경기도", "수원시 장안구").unwrap().grade.label, "medium");
    }

    #[test]
    fn test_sewer_components_source() {
        let csv = "province,district,population,area,installation_rate,public_treatment_rate,advanced_treatment_rate\n\
                   경기도,수원시 장안구,1000,10,90,80,70\n\
                   경기도,성남시 분당구,3000,10,50,50,50\n\
                   경기도,안양시 만안구,1000,10,120,50,50\n";
        let (table, report) = sewer_components_from_reader(csv.as_bytes(), origin(), &GradeScales::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(report.out_of_range, 1);
        assert!((table.get("경기도", "성남시 분당구").unwrap().raw_value - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_social_rows() {
        let csv = "admin_code,province,social_index\n\
                   1111053000,서울특별시,55\n\
                   11110540,,30\n";
        let (table, report) = social_from_reader(csv.as_bytes(), origin(), &GradeScales::default()).unwrap();
        assert_eq!(report.kept_rows, 2);
        assert_eq!(table.get("1111053000").unwrap().province.as_deref(), Some("서울특별시"));
        assert_eq!(table.get("11110540").unwrap().province, None);
    }

    #[test]
    fn test_rainfall_rows() {
        let csv = "station,rainfall_percentile\n서울(108),45\n부산(159),81\n";
        let (table, _) = rainfall_from_reader(csv.as_bytes(), origin(), &GradeScales::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[1].grade.level, 4);
    }

    #[test]
    fn test_missing_required_column_is_fatal() {
        let csv = "name,value\n서울,10\n";
        let err = housing_index_from_reader(csv.as_bytes(), origin(), &GradeScales::default()).unwrap_err();
        assert!(matches!(err, IndexError::Csv { .. }));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let source = IndicatorSource::index("no/such/housing.csv");
        let err = load_housing(&source, &GradeScales::default()).unwrap_err();
        assert!(err.to_string().contains("no/such/housing.csv"));
    }
}
