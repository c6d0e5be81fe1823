//! Default-resolution cascade: resolver chain, then province average, then a
//! global default. A cascade never fails to produce a value.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::aliases::canonical_province;
use super::strategy::{KeyResolver, MatchStrategy};
use crate::geography::GeographicUnit;
use crate::grading::{Grade, GradeScale};
use crate::indicators::Indicator;

/// Provenance of a resolved indicator value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Matched(MatchStrategy),
    ProvinceAverage,
    GlobalDefault,
}

impl Resolution {
    /// Only a strategy match counts as a successful resolution
    pub fn is_success(&self) -> bool {
        matches!(self, Resolution::Matched(_))
    }
}

/// Value used when neither a match nor a province average exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalDefault {
    pub value: f64,
    pub level: u8,
}

impl Default for GlobalDefault {
    fn default() -> Self {
        Self { value: 50.0, level: 3 }
    }
}

/// Value, grade and provenance for one indicator of one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedValue {
    pub value: f64,
    pub grade: Grade,
    pub resolution: Resolution,
}

/// Mean value and rounded mean grade of a province's source rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvinceAverage {
    pub value: f64,
    pub grade: Grade,
    pub rows: usize,
}

/// Per-indicator cascade. Province averages are computed once at construction,
/// so a built cascade is read-only and can be shared across threads.
pub struct ResolutionCascade<'a> {
    resolver: &'a dyn KeyResolver,
    province_averages: HashMap<String, ProvinceAverage>,
    global_default: GlobalDefault,
    scale: GradeScale,
}

impl<'a> ResolutionCascade<'a> {
    pub fn new(resolver: &'a dyn KeyResolver, scale: &GradeScale, global_default: GlobalDefault) -> Self {
        let province_averages = province_averages(resolver, scale);
        Self {
            resolver,
            province_averages,
            global_default,
            scale: scale.clone(),
        }
    }

    pub fn indicator(&self) -> Indicator {
        self.resolver.indicator()
    }

    /// Average for a canonical province name
    pub fn province_average(&self, province: &str) -> Option<&ProvinceAverage> {
        self.province_averages.get(province)
    }

    pub fn province_averages(&self) -> &HashMap<String, ProvinceAverage> {
        &self.province_averages
    }

    /// Resolve a unit, falling back as needed
    pub fn resolve(&self, unit: &GeographicUnit) -> ResolvedValue {
        if let Some(found) = self.resolver.resolve(unit) {
            return ResolvedValue {
                value: found.record.raw_value,
                grade: found.record.grade,
                resolution: Resolution::Matched(found.strategy),
            };
        }
        self.fallback(&unit.province_name)
    }

    /// The caller-level fallback for a province with no matched row
    pub fn fallback(&self, province: &str) -> ResolvedValue {
        match self.province_averages.get(canonical_province(province)) {
            Some(avg) => ResolvedValue {
                value: avg.value,
                grade: avg.grade.clone(),
                resolution: Resolution::ProvinceAverage,
            },
            None => ResolvedValue {
                value: self.global_default.value,
                grade: self.scale.label_for(self.global_default.level),
                resolution: Resolution::GlobalDefault,
            },
        }
    }
}

fn province_averages(resolver: &dyn KeyResolver, scale: &GradeScale) -> HashMap<String, ProvinceAverage> {
    // (value sum, level sum, rows), accumulated per canonical province
    let mut sums: HashMap<&str, (f64, f64, usize)> = HashMap::new();
    for record in resolver.records() {
        if let Some(province) = record.province.as_deref() {
            let entry = sums.entry(province).or_insert((0.0, 0.0, 0));
            entry.0 += record.raw_value;
            entry.1 += f64::from(record.grade.level);
            entry.2 += 1;
        }
    }

    sums.into_iter()
        .map(|(province, (value_sum, level_sum, rows))| {
            let n = rows as f64;
            let level = (level_sum / n).round_ties_even() as u8;
            (
                province.to_string(),
                ProvinceAverage {
                    value: value_sum / n,
                    grade: scale.label_for(level),
                    rows,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{CodeTable, DistrictTable, StationTable};
    use approx::assert_abs_diff_eq;

    fn sewer_table() -> DistrictTable {
        DistrictTable::from_rows(
            vec![
                ("경기도".to_string(), "수원시 장안구".to_string(), 70.0), // grade 3
                ("경기도".to_string(), "성남시 분당구".to_string(), 90.0), // grade 4
                ("경기도".to_string(), "안양시 만안구".to_string(), 50.0), // grade 2
                ("서울특별시".to_string(), "종로구".to_string(), 20.0),   // grade 1
                ("서울특별시".to_string(), "중구".to_string(), 45.0),     // grade 2
            ],
            &GradeScale::sewer(),
        )
    }

    #[test]
    fn test_province_averages() {
        let table = sewer_table();
        let cascade = ResolutionCascade::new(&table, &GradeScale::sewer(), GlobalDefault::default());

        let gyeonggi = cascade.province_average("경기도").unwrap();
        assert_abs_diff_eq!(gyeonggi.value, 70.0);
        assert_eq!(gyeonggi.grade.level, 3);
        assert_eq!(gyeonggi.rows, 3);

        // Mean level 1.5 rounds half to even
        let seoul = cascade.province_average("서울특별시").unwrap();
        assert_eq!(seoul.grade.level, 2);
        assert_eq!(seoul.grade.label, "low");
    }

    #[test]
    fn test_miss_falls_back_to_province_average() {
        let table = sewer_table();
        let cascade = ResolutionCascade::new(&table, &GradeScale::sewer(), GlobalDefault::default());
        let unit = GeographicUnit::new("3182025000", "경기도 가평군 청평면", "경기");

        assert!(table.resolve(&unit).is_none());
        let resolved = cascade.resolve(&unit);
        let average = cascade.province_average("경기도").unwrap();
        assert_eq!(resolved.resolution, Resolution::ProvinceAverage);
        assert_eq!(resolved.value, average.value);
        assert_eq!(resolved.grade, average.grade);
    }

    #[test]
    fn test_province_without_rows_uses_global_default() {
        let table = sewer_table();
        let cascade = ResolutionCascade::new(&table, &GradeScale::sewer(), GlobalDefault::default());
        let unit = GeographicUnit::new("5011025000", "제주특별자치도 제주시 일도1동", "제주특별자치도");

        let resolved = cascade.resolve(&unit);
        assert_eq!(resolved.resolution, Resolution::GlobalDefault);
        assert_eq!(resolved.value, 50.0);
        assert_eq!(resolved.grade.level, 3);
        assert_eq!(resolved.grade.label, "medium");
    }

    #[test]
    fn test_match_reports_strategy() {
        let table = sewer_table();
        let cascade = ResolutionCascade::new(&table, &GradeScale::sewer(), GlobalDefault::default());
        let unit = GeographicUnit::new("1111051500", "서울특별시 종로구", "서울특별시");

        let resolved = cascade.resolve(&unit);
        assert_eq!(resolved.resolution, Resolution::Matched(MatchStrategy::Exact));
        assert!(resolved.resolution.is_success());
        assert_eq!(resolved.value, 20.0);
    }

    #[test]
    fn test_rows_without_province_have_no_average() {
        let social = CodeTable::from_rows(vec![("1111053000".to_string(), None, 80.0)], &GradeScale::social());
        let cascade = ResolutionCascade::new(&social, &GradeScale::social(), GlobalDefault::default());
        assert!(cascade.province_averages().is_empty());

        let rainfall = StationTable::from_rows(vec![("서울(108)".to_string(), 40.0)], &GradeScale::rainfall());
        let cascade = ResolutionCascade::new(&rainfall, &GradeScale::rainfall(), GlobalDefault { value: 35.0, level: 2 });
        let resolved = cascade.resolve(&GeographicUnit::new("2611053000", "부산광역시 중구 중앙동", "부산광역시"));
        assert_eq!(resolved.resolution, Resolution::GlobalDefault);
        assert_eq!(resolved.value, 35.0);
        assert_eq!(resolved.grade.label, "low");
    }
}
