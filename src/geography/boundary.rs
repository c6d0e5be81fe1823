//! Boundary GeoJSON loading
//!
//! Boundaries arrive as one FeatureCollection per province. They are merged
//! into a single nationwide collection, and each Feature yields exactly one
//! `GeographicUnit` at the same index.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::GeographicUnit;
use crate::error::{IndexError, Result};

/// Property holding the 10-digit administrative code
pub const CODE_PROPERTY: &str = "adm_cd2";
/// Older boundary files only carry the 8-digit code
pub const LEGACY_CODE_PROPERTY: &str = "adm_cd";
pub const NAME_PROPERTY: &str = "adm_nm";
pub const PROVINCE_PROPERTY: &str = "sidonm";

/// GeoJSON FeatureCollection; geometry is carried through untouched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }
}

/// GeoJSON Feature
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Value,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    fn text_property(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Build the unit described by this feature's properties
    pub fn to_unit(&self) -> Option<GeographicUnit> {
        let code = self
            .text_property(CODE_PROPERTY)
            .or_else(|| self.text_property(LEGACY_CODE_PROPERTY))?;
        let name = self.text_property(NAME_PROPERTY)?;
        let province = self
            .text_property(PROVINCE_PROPERTY)
            .or_else(|| GeographicUnit::province_from_display(&name).map(str::to_string))?;
        Some(GeographicUnit::new(code, name, province))
    }
}

/// Merged boundary features plus the unit parsed from each
#[derive(Debug, Clone)]
pub struct Boundaries {
    pub collection: FeatureCollection,
    pub units: Vec<GeographicUnit>,
}

impl Boundaries {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Load and concatenate every boundary file. All files are required.
pub fn load_boundaries(paths: &[PathBuf]) -> Result<Boundaries> {
    if paths.is_empty() {
        return Err(IndexError::Config("no boundary files configured".to_string()));
    }

    let mut features = Vec::new();
    let mut units = Vec::new();

    for path in paths {
        let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
        let loaded = load_boundaries_from_reader(BufReader::new(file), path)?;
        info!("{}: {} units", path.display(), loaded.len());
        features.extend(loaded.collection.features);
        units.extend(loaded.units);
    }

    info!("Boundary load complete: {} units from {} files", units.len(), paths.len());
    Ok(Boundaries {
        collection: FeatureCollection::new(features),
        units,
    })
}

/// Parse one FeatureCollection; `origin` names the source in errors
pub fn load_boundaries_from_reader<R: Read>(reader: R, origin: &Path) -> Result<Boundaries> {
    let collection: FeatureCollection =
        serde_json::from_reader(reader).map_err(|e| IndexError::json(origin, e))?;

    let units = collection
        .features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            feature.to_unit().ok_or_else(|| IndexError::Boundary {
                path: origin.to_path_buf(),
                message: format!(
                    "feature {} lacks an administrative code or display name",
                    i
                ),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Boundaries { collection, units })
}
