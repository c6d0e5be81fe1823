//! Output artifacts for the external map and report renderer
//!
//! - `integrated_vulnerability.geojson`: boundary features with index, grade
//!   and label properties per indicator and for the composite
//! - `province_summary.csv`: nationwide row, then one row per province
//! - `top_{metric}.csv`: most vulnerable units per metric
//! - `run_summary.json`: weights, diagnostics and load reports of the run

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{
    CorrelationMatrix, Metric, RegionScope, RegionSummary, correlation_matrix, province_summaries, summarize, top_k,
};
use crate::error::{IndexError, Result};
use crate::geography::FeatureCollection;
use crate::indicators::LoadReport;
use crate::pipeline::PipelineResult;
use crate::resolve::ResolutionDiagnostics;
use crate::scoring::{CompositeRecord, WeightScheme};
use crate::stats::round2;

pub const GEOJSON_FILE: &str = "integrated_vulnerability.geojson";
pub const PROVINCE_SUMMARY_FILE: &str = "province_summary.csv";
pub const RUN_SUMMARY_FILE: &str = "run_summary.json";

pub fn ranking_file(metric: Metric) -> String {
    format!("top_{}.csv", metric.name())
}

/// Copy of `collection` with score properties added to each feature.
/// Features and records are paired by position.
pub fn enrich_features(collection: &FeatureCollection, records: &[CompositeRecord]) -> FeatureCollection {
    let mut enriched = collection.clone();
    for (feature, record) in enriched.features.iter_mut().zip(records) {
        for metric in Metric::ALL {
            let name = metric.name();
            let grade = record.grade(metric);
            feature
                .properties
                .insert(format!("{}_index", name), Value::from(round2(record.metric(metric))));
            feature
                .properties
                .insert(format!("{}_grade", name), Value::from(grade.level));
            feature
                .properties
                .insert(format!("{}_grade_label", name), Value::from(grade.label.clone()));
        }
    }
    enriched
}

/// One row of a top-K file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingRow {
    pub rank: usize,
    pub admin_code: String,
    pub name: String,
    pub province: String,
    pub value: f64,
    pub grade: u8,
    pub grade_label: String,
}

/// Top-K rows for a metric in its natural vulnerability order
pub fn ranking_rows(records: &[CompositeRecord], metric: Metric, k: usize) -> Vec<RankingRow> {
    top_k(records, metric, k, metric.natural_order())
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let grade = record.grade(metric);
            RankingRow {
                rank: i + 1,
                admin_code: record.unit.admin_code.clone(),
                name: record.unit.display_name.clone(),
                province: record.unit.province_name.clone(),
                value: round2(record.metric(metric)),
                grade: grade.level,
                grade_label: grade.label.clone(),
            }
        })
        .collect()
}

fn rounded(summary: &RegionSummary) -> RegionSummary {
    RegionSummary {
        region: summary.region.clone(),
        units: summary.units,
        housing: round2(summary.housing),
        sewer: round2(summary.sewer),
        social: round2(summary.social),
        rainfall: round2(summary.rainfall),
        composite: round2(summary.composite),
    }
}

/// Nationwide row followed by per-province rows, rounded for publication
pub fn summary_rows(records: &[CompositeRecord]) -> Vec<RegionSummary> {
    summarize(records, &RegionScope::Nationwide)
        .into_iter()
        .chain(province_summaries(records))
        .map(|s| rounded(&s))
        .collect()
}

/// Run metadata written next to the data outputs
#[derive(Debug, Serialize)]
pub struct RunSummary<'a> {
    pub generated_at: DateTime<Local>,
    pub weight_scheme: &'static str,
    pub weights: [f64; 4],
    pub units: usize,
    pub nationwide: Option<RegionSummary>,
    pub correlation: CorrelationMatrix,
    pub diagnostics: &'a ResolutionDiagnostics,
    pub load_reports: &'a [LoadReport],
}

impl<'a> RunSummary<'a> {
    pub fn new(scheme: &WeightScheme, result: &'a PipelineResult, load_reports: &'a [LoadReport]) -> Self {
        Self {
            generated_at: Local::now(),
            weight_scheme: scheme.name(),
            weights: scheme.weights(),
            units: result.records.len(),
            nationwide: summarize(&result.records, &RegionScope::Nationwide).map(|s| rounded(&s)),
            correlation: correlation_matrix(&province_summaries(&result.records)),
            diagnostics: &result.diagnostics,
            load_reports,
        }
    }
}

/// Serialize rows as CSV with a header line
pub fn write_csv_to<W: Write, T: Serialize>(writer: W, rows: &[T], origin: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row).map_err(|e| IndexError::csv(origin, e))?;
    }
    wtr.flush().map_err(|e| IndexError::io(origin, e))?;
    Ok(())
}

pub fn write_json_to<W: Write, T: Serialize>(writer: W, value: &T, origin: &Path) -> Result<()> {
    serde_json::to_writer_pretty(writer, value).map_err(|e| IndexError::json(origin, e))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| IndexError::io(path, e))
}

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    write_csv_to(create(path)?, rows, path)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut writer = create(path)?;
    write_json_to(&mut writer, value, path)?;
    writer.flush().map_err(|e| IndexError::io(path, e))
}

/// Write every artifact into `output_dir`, returning the paths written
pub fn write_all(
    output_dir: &Path,
    collection: &FeatureCollection,
    result: &PipelineResult,
    summary: &RunSummary<'_>,
    k: usize,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|e| IndexError::io(output_dir, e))?;
    let mut written = Vec::new();

    let path = output_dir.join(GEOJSON_FILE);
    write_json(&path, &enrich_features(collection, &result.records))?;
    written.push(path);

    let path = output_dir.join(PROVINCE_SUMMARY_FILE);
    write_csv(&path, &summary_rows(&result.records))?;
    written.push(path);

    for metric in Metric::ALL {
        let path = output_dir.join(ranking_file(metric));
        write_csv(&path, &ranking_rows(&result.records, metric, k))?;
        written.push(path);
    }

    let path = output_dir.join(RUN_SUMMARY_FILE);
    write_json(&path, summary)?;
    written.push(path);

    info!("Wrote {} files to {}", written.len(), output_dir.display());
    Ok(written)
}
