//! Match strategies and the per-table strategy chains
//!
//! Every strategy is a plain function from a unit and a table to an optional
//! record. A chain is an ordered list of tagged strategies; the first one
//! that returns a record wins and later ones are never consulted.

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};

use super::aliases::{
    CAPITAL_REGION, CAPITAL_REGION_ALIAS, canonical_province, district_alias, province_stations,
    strip_particles, tokens,
};
use crate::geography::GeographicUnit;
use crate::indicators::{
    CodeTable, DistrictTable, Indicator, IndicatorRecord, ProvinceTable, RecordKey, StationTable,
};
use crate::stats::mean;

/// How a record was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Raw key as given by the boundary source
    Exact,
    /// Short province name expanded to its full form
    ProvinceAlias,
    /// Known irregular district spelling
    DistrictAlias,
    /// Particle-stripped names contain one another
    StrippedSubstring,
    /// Informal capital-region name found anywhere in the table
    CapitalRegionAlias,
    /// District names share a token
    CommonToken,
    /// Administrative code equality
    AdminCode,
    /// 10-digit code retried in its 8-digit form
    ShortAdminCode,
    /// Mean of the stations matching a province's first productive fragment
    StationAverage,
}

/// A resolved record and the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub record: IndicatorRecord,
    pub strategy: MatchStrategy,
}

/// Locates the indicator row belonging to a geographic unit
pub trait KeyResolver: Sync {
    fn indicator(&self) -> Indicator;

    /// First hit of the strategy chain, or `None` when every strategy misses
    fn resolve(&self, unit: &GeographicUnit) -> Option<Match>;

    /// Source rows, used to build province averages
    fn records(&self) -> &[IndicatorRecord];
}

/// One step of a chain
pub type Strategy<T> = fn(&GeographicUnit, &T) -> Option<IndicatorRecord>;

fn run_chain<T>(
    indicator: Indicator,
    unit: &GeographicUnit,
    table: &T,
    chain: &[(MatchStrategy, Strategy<T>)],
) -> Option<Match> {
    chain.iter().find_map(|(tag, strategy)| {
        strategy(unit, table).map(|record| {
            debug!("{} {}: matched via {:?}", indicator, unit.admin_code, tag);
            Match {
                record,
                strategy: *tag,
            }
        })
    })
}

// Province-keyed (housing)

pub const PROVINCE_CHAIN: &[(MatchStrategy, Strategy<ProvinceTable>)] = &[
    (MatchStrategy::Exact, province_exact),
    (MatchStrategy::ProvinceAlias, province_alias),
];

pub fn province_exact(unit: &GeographicUnit, table: &ProvinceTable) -> Option<IndicatorRecord> {
    table.get_exact(&unit.province_name).cloned()
}

pub fn province_alias(unit: &GeographicUnit, table: &ProvinceTable) -> Option<IndicatorRecord> {
    let canonical = canonical_province(&unit.province_name);
    if canonical == unit.province_name {
        return None;
    }
    table.get(canonical).cloned()
}

impl KeyResolver for ProvinceTable {
    fn indicator(&self) -> Indicator {
        Indicator::Housing
    }

    fn resolve(&self, unit: &GeographicUnit) -> Option<Match> {
        run_chain(Indicator::Housing, unit, self, PROVINCE_CHAIN)
    }

    fn records(&self) -> &[IndicatorRecord] {
        ProvinceTable::records(self)
    }
}

// District-keyed (sewer)

pub const DISTRICT_CHAIN: &[(MatchStrategy, Strategy<DistrictTable>)] = &[
    (MatchStrategy::Exact, district_exact),
    (MatchStrategy::ProvinceAlias, district_province_alias),
    (MatchStrategy::DistrictAlias, district_name_alias),
    (MatchStrategy::StrippedSubstring, district_stripped_substring),
    (MatchStrategy::CapitalRegionAlias, district_capital_region),
    (MatchStrategy::CommonToken, district_common_token),
];

fn district_of(record: &IndicatorRecord) -> &str {
    record.key.district().unwrap_or_default()
}

pub fn district_exact(unit: &GeographicUnit, table: &DistrictTable) -> Option<IndicatorRecord> {
    table.get_exact(&unit.province_name, &unit.district_name).cloned()
}

pub fn district_province_alias(unit: &GeographicUnit, table: &DistrictTable) -> Option<IndicatorRecord> {
    let canonical = canonical_province(&unit.province_name);
    if canonical == unit.province_name {
        return None;
    }
    table.get(canonical, &unit.district_name).cloned()
}

pub fn district_name_alias(unit: &GeographicUnit, table: &DistrictTable) -> Option<IndicatorRecord> {
    let alias = district_alias(&unit.district_name)?;
    table.get(canonical_province(&unit.province_name), alias).cloned()
}

/// Particle-stripped containment in either direction, or raw mutual substrings.
/// Empty names never match.
pub fn district_stripped_substring(unit: &GeographicUnit, table: &DistrictTable) -> Option<IndicatorRecord> {
    let query = unit.district_name.as_str();
    let query_clean = strip_particles(query);

    table
        .in_province(canonical_province(&unit.province_name))
        .find(|record| {
            let name = district_of(record);
            if name.is_empty() {
                return false;
            }
            let clean = strip_particles(name);
            let stripped_hit = !query_clean.is_empty()
                && !clean.is_empty()
                && (clean.contains(&query_clean) || query_clean.contains(&clean));
            stripped_hit || name.contains(query) || query.contains(name)
        })
        .cloned()
}

pub fn district_capital_region(unit: &GeographicUnit, table: &DistrictTable) -> Option<IndicatorRecord> {
    if canonical_province(&unit.province_name) != CAPITAL_REGION {
        return None;
    }
    table
        .records()
        .iter()
        .find(|record| district_of(record).contains(CAPITAL_REGION_ALIAS))
        .cloned()
}

pub fn district_common_token(unit: &GeographicUnit, table: &DistrictTable) -> Option<IndicatorRecord> {
    let query: HashSet<String> = tokens(&unit.district_name).into_iter().collect();
    if query.is_empty() {
        return None;
    }
    table
        .in_province(canonical_province(&unit.province_name))
        .find(|record| tokens(district_of(record)).iter().any(|t| query.contains(t)))
        .cloned()
}

impl KeyResolver for DistrictTable {
    fn indicator(&self) -> Indicator {
        Indicator::Sewer
    }

    fn resolve(&self, unit: &GeographicUnit) -> Option<Match> {
        if unit.district_name.is_empty() {
            return None;
        }
        run_chain(Indicator::Sewer, unit, self, DISTRICT_CHAIN)
    }

    fn records(&self) -> &[IndicatorRecord] {
        DistrictTable::records(self)
    }
}

// Code-keyed (social)

pub const CODE_CHAIN: &[(MatchStrategy, Strategy<CodeTable>)] = &[
    (MatchStrategy::AdminCode, code_exact),
    (MatchStrategy::ShortAdminCode, code_short_form),
];

const LONG_CODE_DIGITS: usize = 10;
const SHORT_CODE_OFFSET: usize = 2;

pub fn code_exact(unit: &GeographicUnit, table: &CodeTable) -> Option<IndicatorRecord> {
    table.get(unit.admin_code.trim()).cloned()
}

/// Retry a 10-digit code without its leading two digits
pub fn code_short_form(unit: &GeographicUnit, table: &CodeTable) -> Option<IndicatorRecord> {
    let code = unit.admin_code.trim();
    if code.len() != LONG_CODE_DIGITS || !code.is_ascii() {
        return None;
    }
    table.get(&code[SHORT_CODE_OFFSET..]).cloned()
}

impl KeyResolver for CodeTable {
    fn indicator(&self) -> Indicator {
        Indicator::Social
    }

    fn resolve(&self, unit: &GeographicUnit) -> Option<Match> {
        run_chain(Indicator::Social, unit, self, CODE_CHAIN)
    }

    fn records(&self) -> &[IndicatorRecord] {
        CodeTable::records(self)
    }
}

// Station-keyed (rainfall)

pub const STATION_CHAIN: &[(MatchStrategy, Strategy<StationTable>)] =
    &[(MatchStrategy::StationAverage, station_average)];

/// Average every station containing the first fragment of the unit's
/// province that matches anything at all
pub fn station_average(unit: &GeographicUnit, table: &StationTable) -> Option<IndicatorRecord> {
    let province = canonical_province(&unit.province_name);

    province_stations(province).iter().find_map(|fragment| {
        let values: Vec<f64> = table.containing(fragment).map(|r| r.raw_value).collect();
        let value = mean(&values)?;
        Some(IndicatorRecord {
            key: RecordKey::Station(fragment.to_string()),
            province: Some(province.to_string()),
            raw_value: value,
            grade: table.scale().classify(value),
        })
    })
}

impl KeyResolver for StationTable {
    fn indicator(&self) -> Indicator {
        Indicator::Rainfall
    }

    fn resolve(&self, unit: &GeographicUnit) -> Option<Match> {
        run_chain(Indicator::Rainfall, unit, self, STATION_CHAIN)
    }

    fn records(&self) -> &[IndicatorRecord] {
        StationTable::records(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::GradeScale;
    use approx::assert_abs_diff_eq;

    fn unit(code: &str, display: &str, province: &str) -> GeographicUnit {
        GeographicUnit::new(code, display, province)
    }

    fn sewer_table() -> DistrictTable {
        DistrictTable::from_rows(
            vec![
                ("경기도".to_string(), "수원시 장안구".to_string(), 71.0),
                ("경기도".to_string(), "성남시 분당구".to_string(), 88.0),
                ("서울특별시".to_string(), "종로구".to_string(), 93.0),
                ("충청남도".to_string(), "세종시".to_string(), 55.0),
            ],
            &GradeScale::sewer(),
        )
    }

    fn strategy_for(table: &DistrictTable, u: &GeographicUnit) -> Option<(MatchStrategy, f64)> {
        table.resolve(u).map(|m| (m.strategy, m.record.raw_value))
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let table = sewer_table();
        let u = unit("1111051500", "서울특별시 종로구", "서울특별시");
        assert_eq!(strategy_for(&table, &u), Some((MatchStrategy::Exact, 93.0)));

        // Every later strategy would also find this row; the exact one must win
        for (tag, strategy) in &DISTRICT_CHAIN[1..] {
            if *tag == MatchStrategy::StrippedSubstring || *tag == MatchStrategy::CommonToken {
                assert!(strategy(&u, &table).is_some());
            }
        }
    }

    #[test]
    fn test_district_chain_steps() {
        let table = sewer_table();

        let short_province = unit("1111051500", "서울 종로구", "서울");
        assert_eq!(strategy_for(&table, &short_province), Some((MatchStrategy::ProvinceAlias, 93.0)));

        let unsplit = unit("3101100000", "경기도 수원시장안구", "경기도");
        assert_eq!(strategy_for(&table, &unsplit), Some((MatchStrategy::DistrictAlias, 71.0)));

        let neighborhood = unit("1111053000", "서울특별시 종로구 사직동", "서울특별시");
        assert_eq!(strategy_for(&table, &neighborhood), Some((MatchStrategy::StrippedSubstring, 93.0)));

        let capital = unit("3611025000", "세종특별자치시 조치원읍", "세종특별자치시");
        assert_eq!(strategy_for(&table, &capital), Some((MatchStrategy::CapitalRegionAlias, 55.0)));

        let shared_token = unit("3102300000", "경기도 성남시 판교", "경기도");
        assert_eq!(strategy_for(&table, &shared_token), Some((MatchStrategy::CommonToken, 88.0)));
    }

    #[test]
    fn test_total_miss_returns_none() {
        let table = sewer_table();
        let u = unit("3182025000", "경기도 가평군 청평면", "경기도");
        assert_eq!(table.resolve(&u), None);

        let no_district = unit("9900000000", "", "경기도");
        assert_eq!(table.resolve(&no_district), None);
    }

    #[test]
    fn test_empty_stripped_names_do_not_match() {
        let table = DistrictTable::from_rows(
            vec![("대구광역시".to_string(), "동구".to_string(), 40.0)],
            &GradeScale::sewer(),
        );
        let u = unit("2723000000", "대구광역시 북구", "대구광역시");
        assert_eq!(district_stripped_substring(&u, &table), None);
    }

    #[test]
    fn test_housing_province_chain() {
        let table = ProvinceTable::from_rows(vec![("서울특별시".to_string(), 62.0)], &GradeScale::housing());

        let full = unit("1111053000", "서울특별시 종로구 사직동", "서울특별시");
        assert_eq!(table.resolve(&full).unwrap().strategy, MatchStrategy::Exact);

        let short = unit("1111053000", "서울 종로구 사직동", "서울");
        assert_eq!(table.resolve(&short).unwrap().strategy, MatchStrategy::ProvinceAlias);

        let elsewhere = unit("2611053000", "부산광역시 중구 중앙동", "부산광역시");
        assert_eq!(table.resolve(&elsewhere), None);
    }

    #[test]
    fn test_short_source_keys_match_exactly() {
        let sewer = DistrictTable::from_rows(
            vec![("서울".to_string(), "종로구".to_string(), 93.0)],
            &GradeScale::sewer(),
        );
        let housing = ProvinceTable::from_rows(vec![("서울".to_string(), 62.0)], &GradeScale::housing());

        let short = unit("1111051500", "서울 종로구", "서울");
        assert_eq!(strategy_for(&sewer, &short), Some((MatchStrategy::Exact, 93.0)));
        assert_eq!(housing.resolve(&short).unwrap().strategy, MatchStrategy::Exact);

        let full = unit("1111051500", "서울특별시 종로구", "서울특별시");
        assert_eq!(strategy_for(&sewer, &full), Some((MatchStrategy::Exact, 93.0)));
        assert_eq!(housing.resolve(&full).unwrap().strategy, MatchStrategy::Exact);
    }

    #[test]
    fn test_social_code_forms() {
        let table = CodeTable::from_rows(
            vec![
                ("1111053000".to_string(), None, 55.0),
                ("11054000".to_string(), None, 30.0),
            ],
            &GradeScale::social(),
        );

        let exact = table.resolve(&unit("1111053000", "서울특별시 종로구 사직동", "서울특별시")).unwrap();
        assert_eq!(exact.strategy, MatchStrategy::AdminCode);

        let long = table.resolve(&unit("1111054000", "서울특별시 종로구 삼청동", "서울특별시")).unwrap();
        assert_eq!(long.strategy, MatchStrategy::ShortAdminCode);
        assert_eq!(long.record.raw_value, 30.0);

        let short = table.resolve(&unit("11054000", "서울특별시 종로구 삼청동", "서울특별시")).unwrap();
        assert_eq!(short.strategy, MatchStrategy::AdminCode);

        assert_eq!(table.resolve(&unit("9999999999", "어딘가", "어딘가")), None);
    }

    #[test]
    fn test_station_average() {
        let table = StationTable::from_rows(
            vec![
                ("서울(108)".to_string(), 40.0),
                ("부산(159)".to_string(), 70.0),
                ("북부산(940)".to_string(), 80.0),
            ],
            &GradeScale::rainfall(),
        );

        let busan = table.resolve(&unit("2611053000", "부산광역시 중구 중앙동", "부산")).unwrap();
        assert_eq!(busan.strategy, MatchStrategy::StationAverage);
        assert_abs_diff_eq!(busan.record.raw_value, 75.0);
        assert_eq!(busan.record.grade.level, 3);
        assert_eq!(busan.record.province.as_deref(), Some("부산광역시"));

        let seoul = table.resolve(&unit("1111053000", "서울특별시 종로구 사직동", "서울특별시")).unwrap();
        assert_eq!(seoul.record.raw_value, 40.0);

        assert_eq!(table.resolve(&unit("2711053000", "대구광역시 중구 동인동", "대구광역시")), None);
    }
}
