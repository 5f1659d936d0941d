//! Nightly sky report, as delivered by the report API
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Snapshot of the sky for one location and date.
///
/// Reports are replaced wholesale on refresh and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkyReport {
    pub date: DateTime<Utc>,
    pub location: Location,
    pub sun: SunTimes,
    pub moon: MoonInfo,
    #[serde(default)]
    pub weather: Option<Weather>,
    #[serde(default)]
    pub planets: Vec<PlanetInfo>,
    #[serde(default)]
    pub iss_passes: Vec<IssPass>,
    #[serde(default)]
    pub meteors: Vec<MeteorShower>,
    #[serde(default)]
    pub deep_sky: Vec<DeepSkyObject>,
    #[serde(default)]
    pub events: Vec<AstroEvent>,
    #[serde(default)]
    pub aurora: Option<Value>,
    #[serde(default)]
    pub satellites: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Sun boundaries for the current night window
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
    /// Evening boundary: astronomical night begins.
    #[serde(rename = "astronomical_twilight_start")]
    pub twilight_start: DateTime<Utc>,
    /// Morning boundary: astronomical night ends.
    #[serde(rename = "astronomical_twilight_end")]
    pub twilight_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoonInfo {
    pub phase_name: String,
    /// Percent lit, 0-100
    pub illumination: f64,
    #[serde(default)]
    pub darkness_quality: String,
    #[serde(default)]
    pub moonrise: Option<DateTime<Utc>>,
    #[serde(default)]
    pub moonset: Option<DateTime<Utc>>,
}

/// Sky darkness implied by moon illumination.
pub fn darkness_quality(illumination: f64) -> &'static str {
    if illumination < 25.0 {
        "Excellent"
    } else if illumination < 50.0 {
        "Good"
    } else if illumination < 75.0 {
        "Fair"
    } else {
        "Poor"
    }
}

/// Current weather. Each numeric field is -1 when the upstream lookup failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weather {
    pub cloud_cover: f64,
    pub humidity: f64,
    /// km
    pub visibility: f64,
    /// km/h
    pub wind_speed: f64,
    pub temperature: f64,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl Weather {
    pub fn is_known(&self) -> bool {
        self.cloud_cover >= 0.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanetInfo {
    pub name: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub azimuth: f64,
    pub altitude: f64,
    #[serde(default)]
    pub rise_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub set_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssPass {
    pub start_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub max_altitude: f64,
    pub start_direction: String,
    pub end_direction: String,
    pub brightness: Brightness,
    #[serde(default)]
    pub magnitude: Option<f64>,
}

/// Visual brightness bucket of a satellite pass.
///
/// Unrecognized labels fall into `Moderate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Brightness {
    VeryBright,
    Bright,
    Moderate,
    Faint,
}

impl Brightness {
    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryBright => "Very Bright",
            Self::Bright => "Bright",
            Self::Moderate => "Moderate",
            Self::Faint => "Faint",
        }
    }
}

impl From<&str> for Brightness {
    fn from(s: &str) -> Self {
        match s.trim() {
            "Very Bright" | "Brilliant!" => Self::VeryBright,
            "Bright" | "Bright!" => Self::Bright,
            "Faint" => Self::Faint,
            _ => Self::Moderate,
        }
    }
}

impl From<String> for Brightness {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Brightness> for String {
    fn from(b: Brightness) -> Self {
        b.label().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteorShower {
    pub name: String,
    /// Zenithal hourly rate
    pub zhr: u32,
    pub peak_date: String,
    pub radiant_constellation: String,
    pub is_peak: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeepSkyObject {
    /// Catalog id, e.g. "M31"
    pub id: String,
    pub name: String,
    pub constellation: String,
    pub mag: f64,
    /// Angular size in arcminutes
    #[serde(default)]
    pub size: f64,
    #[serde(rename = "type")]
    pub kind: String,
    /// Recommended equipment
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub tip: String,
    pub altitude: f64,
    #[serde(default)]
    pub azimuth: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AstroEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: DateTime<Utc>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bodies: Vec<String>,
}
