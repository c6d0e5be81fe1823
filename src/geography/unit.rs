//! Geographic unit: the smallest administrative area in the boundary data

use serde::{Deserialize, Serialize};

/// One administrative sub-district (neighborhood / township)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographicUnit {
    /// Administrative code, 8- or 10-digit form
    pub admin_code: String,

    /// Full display name, e.g. "서울특별시 종로구 사직동"
    pub display_name: String,

    /// Province as given by the boundary source
    pub province_name: String,

    /// Display name with the leading province token removed
    pub district_name: String,
}

impl GeographicUnit {
    /// Create a unit, deriving the district name from the display name
    pub fn new(
        admin_code: impl Into<String>,
        display_name: impl Into<String>,
        province_name: impl Into<String>,
    ) -> Self {
        let display_name = display_name.into();
        let district_name = district_from_display(&display_name);
        Self {
            admin_code: admin_code.into(),
            display_name,
            province_name: province_name.into(),
            district_name,
        }
    }

    /// City/county/ward part of the district name, without the trailing
    /// neighborhood token. Used to group units for coverage reporting.
    pub fn municipality(&self) -> String {
        let parts: Vec<&str> = self.district_name.split_whitespace().collect();
        if parts.len() >= 2 {
            parts[..parts.len() - 1].join(" ")
        } else {
            self.district_name.clone()
        }
    }

    /// Province token of the display name, used when the source omits it
    pub fn province_from_display(display_name: &str) -> Option<&str> {
        display_name.split_whitespace().next()
    }
}

/// Strip the leading province token. Single-token names are returned as-is.
pub fn district_from_display(display_name: &str) -> String {
    let parts: Vec<&str> = display_name.split_whitespace().collect();
    if parts.len() >= 2 {
        parts[1..].join(" ")
    } else {
        display_name.trim().to_string()
    }
}
