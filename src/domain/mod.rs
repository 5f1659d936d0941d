//! Domain models for the application
mod observation;
mod report;

pub use observation::{
    observed_ids, Equipment, EquipmentKind, EquipmentProfile, ObjectKind, Observation, Session,
};
pub use report::{
    darkness_quality, AstroEvent, Brightness, DeepSkyObject, IssPass, Location, MeteorShower,
    MoonInfo, PlanetInfo, SkyReport, SunTimes, Weather,
};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response
#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
    pub now: DateTime<Utc>,
}
