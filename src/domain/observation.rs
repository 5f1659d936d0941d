//! User-logged sightings, sessions and equipment
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Planet,
    #[serde(alias = "deep-sky")]
    Dso,
    Moon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Equipment {
    NakedEye,
    Binoculars,
    Telescope,
}

/// A logged sighting. Append-only; several entries per object are expected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Client-generated id
    pub id: String,
    pub device_id: String,
    pub object_type: ObjectKind,
    /// Stable object id: `planet-mars`, `dso-M31`, `moon`
    pub object_id: String,
    pub object_name: String,
    #[serde(default)]
    pub object_details: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub place_name: Option<String>,
    pub equipment: Equipment,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Distinct object ids seen across an observation log.
pub fn observed_ids<'a>(
    observations: impl IntoIterator<Item = &'a Observation>,
) -> HashSet<String> {
    observations
        .into_iter()
        .map(|o| o.object_id.clone())
        .collect()
}

/// Optical equipment owned by the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentProfile {
    pub id: String,
    pub name: String,
    pub aperture_mm: f64,
    #[serde(flatten)]
    pub kind: EquipmentKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EquipmentKind {
    Binoculars {
        magnification: f64,
    },
    Telescope {
        focal_length_mm: f64,
        #[serde(default)]
        mount: Option<String>,
    },
}

impl EquipmentProfile {
    /// Faintest visual magnitude reachable with this aperture.
    ///
    /// Apertures of zero or below are not rejected; the result is then not finite.
    pub fn limiting_magnitude(&self) -> f64 {
        2.7 + 5.0 * self.aperture_mm.log10()
    }
}

/// Per-night observing metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub conditions: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub observation_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_accepts_deep_sky_alias() {
        let obs: Observation = serde_json::from_value(serde_json::json!({
            "id": "obs-1",
            "device_id": "dev-1",
            "object_type": "deep-sky",
            "object_id": "dso-M31",
            "object_name": "Andromeda Galaxy",
            "timestamp": "2025-01-15T22:30:00Z",
            "lat": 40.7,
            "lon": -74.0,
            "equipment": "naked-eye"
        }))
        .unwrap();
        assert_eq!(obs.object_type, ObjectKind::Dso);
        assert_eq!(obs.equipment, Equipment::NakedEye);
        assert!(obs.photos.is_empty());
    }

    #[test]
    fn test_equipment_profile_kind_tag() {
        let profile: EquipmentProfile = serde_json::from_value(serde_json::json!({
            "id": "eq-1",
            "name": "Dob 8\"",
            "aperture_mm": 200.0,
            "type": "telescope",
            "focal_length_mm": 1200.0
        }))
        .unwrap();
        assert!(matches!(profile.kind, EquipmentKind::Telescope { .. }));
        assert!((profile.limiting_magnitude() - 14.2).abs() < 0.01);
    }
}
