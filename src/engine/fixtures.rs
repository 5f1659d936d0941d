//! Report builders shared by engine tests
use crate::domain::{
    Brightness, DeepSkyObject, IssPass, Location, MeteorShower, MoonInfo, PlanetInfo, SkyReport,
    SunTimes,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 8, 12, 22, 0, 0).unwrap()
}

pub fn empty_report() -> SkyReport {
    let day = Utc.with_ymd_and_hms(2025, 8, 12, 0, 0, 0).unwrap();
    SkyReport {
        date: day,
        location: Location {
            lat: 40.71,
            lon: -74.01,
        },
        sun: SunTimes {
            sunrise: day + Duration::hours(6),
            sunset: day + Duration::hours(20),
            twilight_start: day + Duration::hours(21) + Duration::minutes(30),
            twilight_end: day + Duration::hours(4) + Duration::minutes(30),
        },
        moon: MoonInfo {
            phase_name: "First Quarter".to_string(),
            illumination: 50.0,
            darkness_quality: "Fair".to_string(),
            moonrise: None,
            moonset: None,
        },
        weather: None,
        planets: vec![],
        iss_passes: vec![],
        meteors: vec![],
        deep_sky: vec![],
        events: vec![],
        aurora: None,
        satellites: None,
    }
}

pub fn planet(name: &str, altitude: f64) -> PlanetInfo {
    PlanetInfo {
        name: name.to_string(),
        direction: "S".to_string(),
        azimuth: 180.0,
        altitude,
        rise_time: None,
        set_time: None,
        description: String::new(),
    }
}

pub fn iss_pass(start_time: DateTime<Utc>, brightness: &str) -> IssPass {
    IssPass {
        start_time,
        duration_minutes: 6,
        max_altitude: 55.0,
        start_direction: "W".to_string(),
        end_direction: "E".to_string(),
        brightness: Brightness::from(brightness),
        magnitude: Some(-3.2),
    }
}

pub fn shower(name: &str, zhr: u32, is_peak: bool) -> MeteorShower {
    MeteorShower {
        name: name.to_string(),
        zhr,
        peak_date: "Aug 12".to_string(),
        radiant_constellation: "Perseus".to_string(),
        is_peak,
    }
}

pub fn dso(id: &str, mag: f64, altitude: f64) -> DeepSkyObject {
    DeepSkyObject {
        id: id.to_string(),
        name: format!("Object {}", id),
        constellation: "Sagittarius".to_string(),
        mag,
        size: 10.0,
        kind: "globular cluster".to_string(),
        equipment: "binoculars".to_string(),
        tip: String::new(),
        altitude,
        azimuth: 200.0,
    }
}
