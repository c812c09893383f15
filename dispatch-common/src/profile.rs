//! Lessee and document profile
//!
//! Values printed on every trip sheet that the QR payload does not carry:
//! lessee details, lease location, default driver and vehicle, plus the pick
//! lists offered when editing a slip.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// Scalar profile keys (wire names) and their defaults
pub const PROFILE_DEFAULTS: &[(&str, &str)] = &[
    ("lesseeName", "Nicholas"),
    ("lesseeAddress", "No.76, Gonkulam New Street, Pudupattinam, Thanjavur district"),
    ("mineralClassification", "Porampoke Land"),
    ("leasePeriod", "23-09-2025 to 22-09-2026"),
    ("taluk", "Badalur"),
    ("village", "Veeramarasanpettai"),
    ("sfNo", "96, /00001.00.00"),
    ("hsnCode", "0002271"),
    ("bulkPermitNo", "TNJ2500000017"),
    ("vehicleType", "TIPPER"),
    ("driverName", "MADHAN"),
    ("driverLicense", "TN4222035355426"),
    ("driverPhone", "9876543210"),
    ("routeVia", "Pattukottai"),
    ("authPerson", "Nicholas"),
    ("destinationAddress", "Kattumavadi"),
    ("deliveredTo", ""),
    ("mineCode", ""),
    ("withinTN", "Yes"),
];

/// Default value for a scalar profile key, `None` if the key is unknown
pub fn default_value(key: &str) -> Option<&'static str> {
    PROFILE_DEFAULTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

pub fn is_profile_key(key: &str) -> bool {
    default_value(key).is_some()
}

/// Scalar profile with defaults filled in for keys never set
pub fn merged_profile(stored: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    PROFILE_DEFAULTS
        .iter()
        .map(|(key, default)| {
            let value = stored
                .get(*key)
                .cloned()
                .unwrap_or_else(|| default.to_string());
            (key.to_string(), value)
        })
        .collect()
}

/// Named pick lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListKind {
    VehicleTypes,
    LandTypes,
    MineralTypes,
}

impl ListKind {
    pub const ALL: [ListKind; 3] = [ListKind::VehicleTypes, ListKind::LandTypes, ListKind::MineralTypes];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::VehicleTypes => "vehicleTypes",
            ListKind::LandTypes => "landTypes",
            ListKind::MineralTypes => "mineralTypes",
        }
    }

    pub fn defaults(&self) -> &'static [&'static str] {
        match self {
            ListKind::VehicleTypes => &["Tipper", "Lorry", "Tractor"],
            ListKind::LandTypes => &["Porampoke Land", "Patta Land", "Leased Land"],
            ListKind::MineralTypes => &["Rough Stone", "Gravel", "Savudu"],
        }
    }
}

impl std::str::FromStr for ListKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ListKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::NotFound(format!("List {}", s)))
    }
}

/// Normalize a pick-list entry; empty entries are rejected
pub fn normalize_list_item(item: &str) -> Result<String> {
    let item = item.trim();
    if item.is_empty() {
        return Err(Error::InvalidInput("List item cannot be empty".to_string()));
    }
    Ok(item.to_string())
}

/// Driver registered for quick selection when filling trip sheets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub vehicle_no: String,
    #[serde(default)]
    pub vehicle_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lookup() {
        assert_eq!(default_value("hsnCode"), Some("0002271"));
        assert_eq!(default_value("withinTN"), Some("Yes"));
        assert_eq!(default_value("deliveredTo"), Some(""));
        assert_eq!(default_value("nope"), None);
    }

    #[test]
    fn test_merged_profile_prefers_stored() {
        let mut stored = BTreeMap::new();
        stored.insert("taluk".to_string(), "Orathanadu".to_string());

        let merged = merged_profile(&stored);
        assert_eq!(merged.len(), PROFILE_DEFAULTS.len());
        assert_eq!(merged["taluk"], "Orathanadu");
        assert_eq!(merged["village"], "Veeramarasanpettai");
    }

    #[test]
    fn test_merged_profile_drops_unknown_keys() {
        let mut stored = BTreeMap::new();
        stored.insert("legacyKey".to_string(), "x".to_string());
        assert!(!merged_profile(&stored).contains_key("legacyKey"));
    }

    #[test]
    fn test_list_kind_round_trip_names() {
        for kind in ListKind::ALL {
            assert_eq!(kind.as_str().parse::<ListKind>().unwrap(), kind);
        }
        assert!("drivers".parse::<ListKind>().is_err());
    }

    #[test]
    fn test_normalize_list_item() {
        assert_eq!(normalize_list_item("  Gravel ").unwrap(), "Gravel");
        assert!(normalize_list_item("   ").is_err());
    }
}
