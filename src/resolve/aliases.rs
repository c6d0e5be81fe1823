//! Static naming tables used during key resolution
//!
//! Built once on first use and read-only afterwards.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Short or renamed province names mapped to the boundary dataset's names
static PROVINCE_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("서울", "서울특별시"),
        ("부산", "부산광역시"),
        ("대구", "대구광역시"),
        ("인천", "인천광역시"),
        ("광주", "광주광역시"),
        ("대전", "대전광역시"),
        ("울산", "울산광역시"),
        ("세종", "세종특별자치시"),
        ("경기", "경기도"),
        ("강원", "강원도"),
        ("충북", "충청북도"),
        ("충남", "충청남도"),
        ("전북", "전라북도"),
        ("전남", "전라남도"),
        ("경북", "경상북도"),
        ("경남", "경상남도"),
        ("제주", "제주특별자치도"),
        // Post-2023 official names still absent from the boundary files
        ("강원특별자치도", "강원도"),
        ("전북특별자치도", "전라북도"),
    ])
});

/// District names written without the city/ward separator in some sources
static DISTRICT_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("수원시장안구", "수원시 장안구"),
        ("수원시권선구", "수원시 권선구"),
        ("수원시팔달구", "수원시 팔달구"),
        ("수원시영통구", "수원시 영통구"),
        ("성남시수정구", "성남시 수정구"),
        ("성남시중원구", "성남시 중원구"),
        ("성남시분당구", "성남시 분당구"),
        ("안양시만안구", "안양시 만안구"),
        ("안양시동안구", "안양시 동안구"),
        ("부천시원미구", "부천시 원미구"),
        ("부천시소사구", "부천시 소사구"),
        ("부천시오정구", "부천시 오정구"),
        ("안산시상록구", "안산시 상록구"),
        ("안산시단원구", "안산시 단원구"),
        ("고양시덕양구", "고양시 덕양구"),
        ("고양시일산동구", "고양시 일산동구"),
        ("고양시일산서구", "고양시 일산서구"),
        ("용인시처인구", "용인시 처인구"),
        ("용인시기흥구", "용인시 기흥구"),
        ("용인시수지구", "용인시 수지구"),
        ("세종시", "세종특별자치시"),
    ])
});

/// Representative weather-station fragments per province, in priority order
static PROVINCE_STATIONS: &[(&str, &[&str])] = &[
    ("서울특별시", &["서울"]),
    ("부산광역시", &["부산", "북부산"]),
    ("대구광역시", &["대구"]),
    ("인천광역시", &["인천", "강화"]),
    ("광주광역시", &["광주"]),
    ("대전광역시", &["대전"]),
    ("울산광역시", &["울산"]),
    ("세종특별자치시", &["세종"]),
    ("경기도", &["수원", "파주", "동두천", "이천", "양평"]),
    (
        "강원도",
        &["춘천", "북춘천", "원주", "강릉", "북강릉", "동해", "태백", "속초", "홍천", "영월", "대관령"],
    ),
    ("충청북도", &["충주", "청주", "서청주", "제천", "보은"]),
    ("충청남도", &["천안", "서산", "보령", "홍성"]),
    ("전라북도", &["전주", "군산", "정읍", "남원", "순창군", "장수", "임실", "부안"]),
    (
        "전라남도",
        &["순천", "여수", "광양시", "목포", "해남", "고흥", "거창", "장흥", "영광군", "진도군"],
    ),
    (
        "경상북도",
        &[
            "영주", "봉화", "밀양", "상주", "의령군", "정선군", "합천", "태백", "고산", "의성", "문경",
            "구미", "안동", "경주시", "영천", "청송군", "울진", "영덕", "울릉도",
        ],
    ),
    (
        "경상남도",
        &[
            "산청", "거제", "통영", "창원", "북창원", "부여", "양산시", "김해시", "성산", "진주", "밀양",
            "포항", "남해",
        ],
    ),
    ("제주특별자치도", &["제주", "서귀포", "고산", "흑산도", "백령도"]),
];

/// Capital-region unit whose sources may use an informal short name
pub const CAPITAL_REGION: &str = "세종특별자치시";
pub const CAPITAL_REGION_ALIAS: &str = "세종";

/// Administrative particles removed before substring comparison
pub const ADMIN_PARTICLES: [char; 6] = ['시', '구', '군', '읍', '면', '동'];

/// Particles treated as token boundaries for common-token matching
pub const TOKEN_BOUNDARIES: [char; 3] = ['시', '구', '군'];

/// Canonical province name; unknown names pass through trimmed
pub fn canonical_province(name: &str) -> &str {
    let name = name.trim();
    PROVINCE_ALIASES.get(name).copied().unwrap_or(name)
}

/// Alias for an irregularly split district name, if one is known
pub fn district_alias(name: &str) -> Option<&'static str> {
    DISTRICT_ALIASES.get(name.trim()).copied()
}

/// Station fragments for a canonical province name
pub fn province_stations(province: &str) -> &'static [&'static str] {
    PROVINCE_STATIONS
        .iter()
        .find(|(name, _)| *name == province)
        .map(|(_, stations)| *stations)
        .unwrap_or(&[])
}

/// Remove administrative particles and whitespace
pub fn strip_particles(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !ADMIN_PARTICLES.contains(c))
        .collect()
}

/// Split into tokens on whitespace and the city/ward/county particles
pub fn tokens(name: &str) -> Vec<String> {
    name.split(|c: char| c.is_whitespace() || TOKEN_BOUNDARIES.contains(&c))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_province() {
        assert_eq!(canonical_province("서울"), "서울특별시");
        assert_eq!(canonical_province(" 경기 "), "경기도");
        assert_eq!(canonical_province("전북특별자치도"), "전라북도");
        assert_eq!(canonical_province("경기도"), "경기도");
        assert_eq!(canonical_province("Atlantis"), "Atlantis");
    }

    #[test]
    fn test_district_alias() {
        assert_eq!(district_alias("수원시장안구"), Some("수원시 장안구"));
        assert_eq!(district_alias("종로구"), None);
    }

    #[test]
    fn test_strip_and_tokens() {
        assert_eq!(strip_particles("수원시 장안구"), "수원장안");
        assert_eq!(strip_particles("동구"), "");
        assert_eq!(tokens("수원시 장안구 파장동"), vec!["수원", "장안", "파장동"]);
    }

    #[test]
    fn test_every_station_province_is_canonical() {
        for (province, _) in PROVINCE_STATIONS {
            assert_eq!(canonical_province(province), *province);
        }
        assert!(province_stations("경기도").contains(&"수원"));
        assert!(province_stations("nowhere").is_empty());
    }
}
