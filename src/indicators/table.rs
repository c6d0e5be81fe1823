//! Keyed, read-only indicator tables
//!
//! Each table grades its rows on construction and keeps the first row for a
//! duplicated key. Province names are canonicalized so that lookups compare
//! like with like; the source spelling of each kept key is indexed as well
//! for exact lookups.

use std::collections::HashMap;

use super::{IndicatorRecord, RecordKey};
use crate::grading::GradeScale;
use crate::resolve::aliases::canonical_province;

/// Rows keyed by province (housing)
#[derive(Debug, Clone, Default)]
pub struct ProvinceTable {
    records: Vec<IndicatorRecord>,
    index: HashMap<String, usize>,
    raw_index: HashMap<String, usize>,
    duplicates: usize,
}

impl ProvinceTable {
    pub fn from_rows<I>(rows: I, scale: &GradeScale) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut table = Self::default();
        for (raw, value) in rows {
            let raw = raw.trim().to_string();
            let province = canonical_province(&raw).to_string();
            if table.index.contains_key(&province) {
                table.duplicates += 1;
                continue;
            }
            table.raw_index.insert(raw, table.records.len());
            table.index.insert(province.clone(), table.records.len());
            table.records.push(IndicatorRecord {
                key: RecordKey::Province(province.clone()),
                province: Some(province),
                raw_value: value,
                grade: scale.classify(value),
            });
        }
        table
    }

    /// Lookup by canonical province name
    pub fn get(&self, province: &str) -> Option<&IndicatorRecord> {
        self.index.get(province).map(|&i| &self.records[i])
    }

    /// Lookup by the key exactly as a source spelled it, or as stored
    pub fn get_exact(&self, province: &str) -> Option<&IndicatorRecord> {
        self.raw_index
            .get(province)
            .or_else(|| self.index.get(province))
            .map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[IndicatorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Rows keyed by (province, district) (sewer)
#[derive(Debug, Clone, Default)]
pub struct DistrictTable {
    records: Vec<IndicatorRecord>,
    index: HashMap<(String, String), usize>,
    raw_index: HashMap<(String, String), usize>,
    by_province: HashMap<String, Vec<usize>>,
    duplicates: usize,
}

impl DistrictTable {
    pub fn from_rows<I>(rows: I, scale: &GradeScale) -> Self
    where
        I: IntoIterator<Item = (String, String, f64)>,
    {
        let mut table = Self::default();
        for (raw, district, value) in rows {
            let raw = raw.trim().to_string();
            let province = canonical_province(&raw).to_string();
            let district = district.trim().to_string();
            let key = (province.clone(), district.clone());
            if table.index.contains_key(&key) {
                table.duplicates += 1;
                continue;
            }
            let i = table.records.len();
            table.raw_index.insert((raw, district.clone()), i);
            table.index.insert(key, i);
            table.by_province.entry(province.clone()).or_default().push(i);
            table.records.push(IndicatorRecord {
                key: RecordKey::District {
                    province: province.clone(),
                    district,
                },
                province: Some(province),
                raw_value: value,
                grade: scale.classify(value),
            });
        }
        table
    }

    /// Lookup by canonical province and district
    pub fn get(&self, province: &str, district: &str) -> Option<&IndicatorRecord> {
        self.index
            .get(&(province.to_string(), district.to_string()))
            .map(|&i| &self.records[i])
    }

    /// Lookup by the key exactly as a source spelled it, or as stored
    pub fn get_exact(&self, province: &str, district: &str) -> Option<&IndicatorRecord> {
        let key = (province.to_string(), district.to_string());
        self.raw_index
            .get(&key)
            .or_else(|| self.index.get(&key))
            .map(|&i| &self.records[i])
    }

    /// Rows of one province, in source order
    pub fn in_province<'a>(&'a self, province: &str) -> impl Iterator<Item = &'a IndicatorRecord> + 'a {
        self.by_province
            .get(province)
            .into_iter()
            .flatten()
            .map(move |&i| &self.records[i])
    }

    pub fn records(&self) -> &[IndicatorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Rows keyed by administrative code (social)
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    records: Vec<IndicatorRecord>,
    index: HashMap<String, usize>,
    duplicates: usize,
}

impl CodeTable {
    pub fn from_rows<I>(rows: I, scale: &GradeScale) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>, f64)>,
    {
        let mut table = Self::default();
        for (code, province, value) in rows {
            let code = code.trim().to_string();
            if table.index.contains_key(&code) {
                table.duplicates += 1;
                continue;
            }
            table.index.insert(code.clone(), table.records.len());
            table.records.push(IndicatorRecord {
                key: RecordKey::AdminCode(code),
                province: province.map(|p| canonical_province(&p).to_string()),
                raw_value: value,
                grade: scale.classify(value),
            });
        }
        table
    }

    pub fn get(&self, code: &str) -> Option<&IndicatorRecord> {
        self.index.get(code).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[IndicatorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }
}

/// Rows keyed by weather-station name (rainfall); several rows may share a station
#[derive(Debug, Clone)]
pub struct StationTable {
    records: Vec<IndicatorRecord>,
    scale: GradeScale,
}

impl StationTable {
    pub fn from_rows<I>(rows: I, scale: &GradeScale) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let records = rows
            .into_iter()
            .map(|(station, value)| IndicatorRecord {
                key: RecordKey::Station(station.trim().to_string()),
                province: None,
                raw_value: value,
                grade: scale.classify(value),
            })
            .collect();
        Self {
            records,
            scale: scale.clone(),
        }
    }

    /// Scale used to grade averaged station values
    pub fn scale(&self) -> &GradeScale {
        &self.scale
    }

    /// Rows whose station name contains `fragment` (case-sensitive)
    pub fn containing<'a>(&'a self, fragment: &'a str) -> impl Iterator<Item = &'a IndicatorRecord> + 'a {
        self.records.iter().filter(move |r| match &r.key {
            RecordKey::Station(name) => name.contains(fragment),
            _ => false,
        })
    }

    pub fn records(&self) -> &[IndicatorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_province_table_canonicalizes_and_dedupes() {
        let table = ProvinceTable::from_rows(
            vec![
                ("서울".to_string(), 62.0),
                ("서울특별시".to_string(), 10.0),
                ("경기도".to_string(), 35.0),
            ],
            &GradeScale::housing(),
        );
        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicates(), 1);

        let seoul = table.get("서울특별시").unwrap();
        assert_eq!(seoul.raw_value, 62.0);
        assert_eq!(seoul.grade.level, 4);
    }

    #[test]
    fn test_district_table_groups_by_province() {
        let table = DistrictTable::from_rows(
            vec![
                ("경기".to_string(), "수원시 장안구".to_string(), 71.0),
                ("경기도".to_string(), "성남시 분당구".to_string(), 88.0),
                ("서울특별시".to_string(), "종로구".to_string(), 93.0),
            ],
            &GradeScale::sewer(),
        );
        assert!(table.get("경기도", "수원시 장안구").is_some());
        assert!(table.get("경기", "수원시 장안구").is_none());

        let gyeonggi: Vec<_> = table.in_province("경기도").map(|r| r.raw_value).collect();
        assert_eq!(gyeonggi, vec![71.0, 88.0]);
        assert_eq!(table.in_province("제주특별자치도").count(), 0);
    }

    #[test]
    fn test_exact_lookup_keeps_source_spelling() {
        let table = DistrictTable::from_rows(
            vec![
                ("서울".to_string(), "종로구".to_string(), 93.0),
                ("서울특별시".to_string(), "종로구".to_string(), 10.0),
            ],
            &GradeScale::sewer(),
        );
        assert_eq!(table.duplicates(), 1);
        assert_eq!(table.get_exact("서울", "종로구").unwrap().raw_value, 93.0);
        assert_eq!(table.get_exact("서울특별시", "종로구").unwrap().raw_value, 93.0);
        assert!(table.get("서울", "종로구").is_none());

        let housing = ProvinceTable::from_rows(vec![("서울".to_string(), 62.0)], &GradeScale::housing());
        assert_eq!(housing.get_exact("서울").unwrap().raw_value, 62.0);
        assert_eq!(housing.get_exact("서울특별시").unwrap().raw_value, 62.0);
        assert!(housing.get_exact("부산").is_none());
    }

    #[test]
    fn test_station_table_substring_scan() {
        let table = StationTable::from_rows(
            vec![
                ("서울(108)".to_string(), 40.0),
                ("부산(159)".to_string(), 70.0),
                ("북부산(940)".to_string(), 80.0),
            ],
            &GradeScale::rainfall(),
        );
        assert_eq!(table.containing("부산").count(), 2);
        assert_eq!(table.containing("북부산").count(), 1);
        assert_eq!(table.containing("대구").count(), 0);
    }
}
