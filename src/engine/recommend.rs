use super::countdown::time_until;
use crate::domain::{
    Brightness, DeepSkyObject, Equipment, IssPass, MeteorShower, MoonInfo, PlanetInfo, SkyReport,
};
use crate::utils::compass_direction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

pub const MAX_RECOMMENDATIONS: usize = 5;
pub const NAKED_EYE_LIMIT: f64 = 6.0;

const DSO_CONSIDERED: usize = 5;
const DSO_KEEP_ALWAYS: usize = 2;
const DSO_MIN_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CandidateKind {
    Planet,
    Iss,
    MeteorShower,
    DeepSky,
    Moon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Now,
    Soon,
    Tonight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Difficulty {
    Easy,
    Moderate,
    Challenging,
}

/// Difficulty from the headroom between equipment reach and object brightness.
pub fn difficulty_for(limiting_magnitude: f64, magnitude: Option<f64>) -> Difficulty {
    let Some(mag) = magnitude else {
        return Difficulty::Easy;
    };
    let headroom = limiting_magnitude - mag;
    if headroom > 3.0 {
        Difficulty::Easy
    } else if headroom > 1.0 {
        Difficulty::Moderate
    } else {
        Difficulty::Challenging
    }
}

/// Something worth pointing at tonight. Rebuilt on every recompute.
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub kind: CandidateKind,
    pub score: f64,
    pub urgency: Urgency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    pub reasons: Vec<String>,
    pub difficulty: Difficulty,
    pub equipment: Equipment,
    pub altitude: f64,
    pub azimuth: f64,
    pub magnitude: Option<f64>,
    pub constellation: Option<String>,
    pub has_observed: bool,
}

/// Typical visual magnitude of the naked-eye and telescopic planets
pub fn planet_magnitude(name: &str) -> Option<f64> {
    match name {
        "Mercury" => Some(0.0),
        "Venus" => Some(-4.2),
        "Mars" => Some(0.7),
        "Jupiter" => Some(-2.4),
        "Saturn" => Some(0.6),
        "Uranus" => Some(5.7),
        "Neptune" => Some(7.8),
        _ => None,
    }
}

pub fn planet_id(name: &str) -> String {
    format!("planet-{}", name.to_lowercase())
}

pub fn dso_id(catalog_id: &str) -> String {
    format!("dso-{}", catalog_id)
}

fn slug(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

fn urgency_within(
    now: DateTime<Utc>,
    at: DateTime<Utc>,
    now_within_secs: i64,
    soon_within_secs: i64,
) -> Urgency {
    let until = time_until(now, at);
    if until.is_past {
        Urgency::Tonight
    } else if until.total_seconds < now_within_secs {
        Urgency::Now
    } else if until.total_seconds < soon_within_secs {
        Urgency::Soon
    } else {
        Urgency::Tonight
    }
}

fn in_words(now: DateTime<Utc>, at: DateTime<Utc>) -> String {
    let t = time_until(now, at);
    if t.hours > 0 {
        format!("{}h {}m", t.hours, t.minutes)
    } else {
        format!("{} min", t.minutes)
    }
}

fn parse_equipment(label: &str) -> Equipment {
    let label = label.to_lowercase();
    if label.contains("telescope") {
        Equipment::Telescope
    } else if label.contains("naked") {
        Equipment::NakedEye
    } else {
        Equipment::Binoculars
    }
}

pub fn planet_candidate(
    planet: &PlanetInfo,
    now: DateTime<Utc>,
    observed: &HashSet<String>,
) -> Candidate {
    let id = planet_id(&planet.name);
    let has_observed = observed.contains(&id);
    let mut reasons = Vec::new();
    let mut score = 50.0 + planet.altitude.min(60.0) * 0.5;

    match planet.name.as_str() {
        "Venus" | "Jupiter" => {
            score += 20.0;
            reasons.push("One of the brightest objects in the sky".to_string());
        }
        "Saturn" | "Mars" => {
            score += 10.0;
            reasons.push("Bright and easy to spot".to_string());
        }
        _ => {}
    }

    let where_ = if planet.direction.is_empty() {
        "horizon".to_string()
    } else {
        planet.direction.clone()
    };
    reasons.push(format!("{:.0}° up in the {}", planet.altitude, where_));

    if !has_observed {
        score += 15.0;
        reasons.push("Not in your log yet".to_string());
    }

    let urgency = planet
        .set_time
        .map(|set| urgency_within(now, set, 3600, 7200))
        .unwrap_or(Urgency::Tonight);
    match urgency {
        Urgency::Now => score += 25.0,
        Urgency::Soon => score += 10.0,
        Urgency::Tonight => {}
    }
    if let (Urgency::Now | Urgency::Soon, Some(set)) = (urgency, planet.set_time) {
        reasons.push(format!("Sets in {}", in_words(now, set)));
    }

    let equipment = match planet.name.as_str() {
        "Uranus" => Equipment::Binoculars,
        "Neptune" => Equipment::Telescope,
        _ => Equipment::NakedEye,
    };
    let magnitude = planet_magnitude(&planet.name);

    Candidate {
        id,
        name: planet.name.clone(),
        kind: CandidateKind::Planet,
        score,
        urgency,
        priority: None,
        reasons,
        difficulty: difficulty_for(NAKED_EYE_LIMIT, magnitude),
        equipment,
        altitude: planet.altitude,
        azimuth: planet.azimuth,
        magnitude,
        constellation: None,
        has_observed,
    }
}

pub fn iss_candidate(pass: &IssPass, now: DateTime<Utc>) -> Candidate {
    let mut score = 70.0;
    let mut reasons = Vec::new();

    let urgency = urgency_within(now, pass.start_time, 1800, 3600);
    match urgency {
        Urgency::Now => score += 40.0,
        Urgency::Soon => score += 20.0,
        Urgency::Tonight => {}
    }
    if urgency == Urgency::Tonight {
        reasons.push(format!("Rises at {} UTC", pass.start_time.format("%H:%M")));
    } else {
        reasons.push(format!("Passes in {}", in_words(now, pass.start_time)));
    }

    match pass.brightness {
        Brightness::VeryBright => {
            score += 15.0;
            reasons.push("Very bright pass".to_string());
        }
        Brightness::Bright => {
            score += 10.0;
            reasons.push("Bright pass".to_string());
        }
        Brightness::Moderate | Brightness::Faint => {}
    }
    reasons.push(format!(
        "{} to {}, {} min, max {:.0}°",
        pass.start_direction, pass.end_direction, pass.duration_minutes, pass.max_altitude
    ));

    Candidate {
        id: format!("iss-{}", pass.start_time.timestamp()),
        name: "International Space Station".to_string(),
        kind: CandidateKind::Iss,
        score,
        urgency,
        priority: None,
        reasons,
        difficulty: difficulty_for(NAKED_EYE_LIMIT, pass.magnitude),
        equipment: Equipment::NakedEye,
        altitude: pass.max_altitude,
        azimuth: 0.0,
        magnitude: pass.magnitude,
        constellation: None,
        has_observed: false,
    }
}

pub fn meteor_candidate(shower: &MeteorShower) -> Candidate {
    let mut score = 65.0;
    if shower.zhr > 100 {
        score += 20.0;
    } else if shower.zhr > 50 {
        score += 10.0;
    }

    Candidate {
        id: format!("meteor-{}", slug(&shower.name)),
        name: shower.name.clone(),
        kind: CandidateKind::MeteorShower,
        score,
        urgency: Urgency::Tonight,
        priority: None,
        reasons: vec![
            format!("Peak night, up to {} meteors/hour", shower.zhr),
            format!("Radiant in {}", shower.radiant_constellation),
        ],
        difficulty: Difficulty::Easy,
        equipment: Equipment::NakedEye,
        altitude: 0.0,
        azimuth: 0.0,
        magnitude: None,
        constellation: Some(shower.radiant_constellation.clone()),
        has_observed: false,
    }
}

/// Deep-sky candidate; `rank_penalty` is subtracted after the additive terms.
pub fn deep_sky_candidate(
    dso: &DeepSkyObject,
    rank_penalty: f64,
    observed: &HashSet<String>,
) -> Candidate {
    let id = dso_id(&dso.id);
    let has_observed = observed.contains(&id);
    let mut score = 40.0 + ((10.0 - dso.mag) * 3.0).max(0.0) + dso.altitude.min(60.0) * 0.3;
    let mut reasons = vec![
        format!("{} in {}", dso.kind, dso.constellation),
        format!(
            "Magnitude {:.1}, {:.0}° up toward {}",
            dso.mag,
            dso.altitude,
            compass_direction(dso.azimuth)
        ),
    ];
    if !has_observed {
        score += 20.0;
        reasons.push("Not in your log yet".to_string());
    }
    if !dso.tip.is_empty() {
        reasons.push(dso.tip.clone());
    }
    score -= rank_penalty;

    Candidate {
        id,
        name: format!("{} ({})", dso.name, dso.id),
        kind: CandidateKind::DeepSky,
        score,
        urgency: Urgency::Tonight,
        priority: None,
        reasons,
        difficulty: difficulty_for(NAKED_EYE_LIMIT, Some(dso.mag)),
        equipment: parse_equipment(&dso.equipment),
        altitude: dso.altitude,
        azimuth: dso.azimuth,
        magnitude: Some(dso.mag),
        constellation: Some(dso.constellation.clone()),
        has_observed,
    }
}

/// The Moon only makes the list when it is nearly new or nearly full.
pub fn moon_candidate(moon: &MoonInfo, observed: &HashSet<String>) -> Option<Candidate> {
    let (score, headline) = if moon.illumination < 25.0 {
        (55.0, "Dark sky window")
    } else if moon.illumination > 90.0 {
        (50.0, "Great for lunar observation")
    } else {
        return None;
    };

    Some(Candidate {
        id: "moon".to_string(),
        name: format!("Moon ({})", moon.phase_name),
        kind: CandidateKind::Moon,
        score,
        urgency: Urgency::Tonight,
        priority: None,
        reasons: vec![
            headline.to_string(),
            format!("{:.0}% illuminated", moon.illumination),
        ],
        difficulty: Difficulty::Easy,
        equipment: Equipment::NakedEye,
        altitude: 0.0,
        azimuth: 0.0,
        magnitude: Some(-12.7),
        constellation: None,
        has_observed: observed.contains("moon"),
    })
}

/// Highest first; equal scores keep insertion order.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// "Tonight's Best": at most five targets ranked by score.
pub fn recommend(
    report: &SkyReport,
    now: DateTime<Utc>,
    observed: &HashSet<String>,
) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = report
        .planets
        .iter()
        .map(|p| planet_candidate(p, now, observed))
        .collect();

    if let Some(pass) = report.iss_passes.iter().find(|p| p.start_time > now) {
        candidates.push(iss_candidate(pass, now));
    }

    candidates.extend(
        report
            .meteors
            .iter()
            .filter(|m| m.is_peak)
            .map(meteor_candidate),
    );

    for (index, dso) in report.deep_sky.iter().take(DSO_CONSIDERED).enumerate() {
        let candidate = deep_sky_candidate(dso, index as f64 * 5.0, observed);
        if index > DSO_KEEP_ALWAYS && candidate.score < DSO_MIN_SCORE {
            continue;
        }
        candidates.push(candidate);
    }

    candidates.extend(moon_candidate(&report.moon, observed));

    rank(&mut candidates);
    candidates.truncate(MAX_RECOMMENDATIONS);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{dso, empty_report, iss_pass, now, planet, shower};
    use chrono::Duration;

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_empty_report_gives_empty_list() {
        let report = empty_report();
        assert!(recommend(&report, now(), &HashSet::new()).is_empty());
    }

    #[test]
    fn test_bright_planet_outranks_higher_faint_planet() {
        let mut report = empty_report();
        report.planets = vec![planet("Uranus", 50.0), planet("Jupiter", 40.0)];
        let list = recommend(&report, now(), &HashSet::new());
        assert_eq!(ids(&list), vec!["planet-jupiter", "planet-uranus"]);
        assert_eq!(list[0].score, 105.0);
        assert_eq!(list[1].score, 90.0);
    }

    #[test]
    fn test_planet_setting_soon_gets_urgency_bonus() {
        let mut report = empty_report();
        let mut mars = planet("Mars", 70.0);
        mars.set_time = Some(now() + Duration::minutes(45));
        let mut saturn = planet("Saturn", 20.0);
        saturn.set_time = Some(now() + Duration::minutes(90));
        report.planets = vec![mars, saturn];

        let observed: HashSet<String> = ["planet-mars".to_string()].into();
        let list = recommend(&report, now(), &observed);

        // 50 + 30 (capped) + 10 + 25
        assert_eq!(list[0].id, "planet-mars");
        assert_eq!(list[0].score, 115.0);
        assert_eq!(list[0].urgency, Urgency::Now);
        assert!(list[0].has_observed);
        // 50 + 10 + 10 + 15 + 10
        assert_eq!(list[1].score, 95.0);
        assert_eq!(list[1].urgency, Urgency::Soon);
    }

    #[test]
    fn test_only_first_upcoming_iss_pass() {
        let mut report = empty_report();
        report.iss_passes = vec![
            iss_pass(now() - Duration::minutes(30), "Very Bright"),
            iss_pass(now() + Duration::minutes(20), "Very Bright"),
            iss_pass(now() + Duration::hours(3), "Bright"),
        ];
        let list = recommend(&report, now(), &HashSet::new());
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].kind, CandidateKind::Iss);
        assert_eq!(list[0].urgency, Urgency::Now);
        assert_eq!(list[0].score, 125.0);
    }

    #[test]
    fn test_unknown_brightness_gets_no_bonus() {
        let pass = iss_pass(now() + Duration::minutes(50), "Dazzling");
        let c = iss_candidate(&pass, now());
        assert_eq!(c.urgency, Urgency::Soon);
        assert_eq!(c.score, 90.0);
    }

    #[test]
    fn test_only_peak_showers() {
        let mut report = empty_report();
        report.meteors = vec![
            shower("Perseids", 120, true),
            shower("Kappa Cygnids", 3, false),
            shower("Delta Aquariids", 60, true),
        ];
        let list = recommend(&report, now(), &HashSet::new());
        assert_eq!(ids(&list), vec!["meteor-perseids", "meteor-delta-aquariids"]);
        assert_eq!(list[0].score, 85.0);
        assert_eq!(list[1].score, 75.0);
        assert!(list.iter().all(|c| c.urgency == Urgency::Tonight));
    }

    #[test]
    fn test_late_faint_deep_sky_objects_dropped() {
        let mut report = empty_report();
        report.deep_sky = (0..6).map(|i| dso(&format!("M{}", i), 9.0, 10.0)).collect();
        let observed: HashSet<String> = report.deep_sky.iter().map(|d| dso_id(&d.id)).collect();
        let list = recommend(&report, now(), &observed);
        // 40 + 3 + 3 - index*5; index > 2 falls below 50
        assert_eq!(ids(&list), vec!["dso-M0", "dso-M1", "dso-M2"]);
        assert_eq!(list[2].score, 36.0);
    }

    #[test]
    fn test_moon_window() {
        let mut report = empty_report();
        report.moon.illumination = 10.0;
        assert_eq!(recommend(&report, now(), &HashSet::new())[0].score, 55.0);
        report.moon.illumination = 95.0;
        assert_eq!(recommend(&report, now(), &HashSet::new())[0].score, 50.0);
        report.moon.illumination = 60.0;
        assert!(recommend(&report, now(), &HashSet::new()).is_empty());
    }

    #[test]
    fn test_capped_and_sorted() {
        let mut report = empty_report();
        report.planets = ["Venus", "Mars", "Jupiter", "Saturn", "Uranus", "Neptune"]
            .iter()
            .map(|n| planet(n, 30.0))
            .collect();
        report.meteors = vec![shower("Perseids", 120, true)];
        report.deep_sky = vec![dso("M13", 5.8, 70.0), dso("M92", 6.4, 60.0)];
        report.moon.illumination = 5.0;

        let list = recommend(&report, now(), &HashSet::new());
        assert_eq!(list.len(), MAX_RECOMMENDATIONS);
        assert!(list.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let mut report = empty_report();
        report.planets = vec![planet("Saturn", 30.0), planet("Mars", 30.0)];
        let list = recommend(&report, now(), &HashSet::new());
        assert_eq!(ids(&list), vec!["planet-saturn", "planet-mars"]);
    }

    #[test]
    fn test_bright_iss_pass_later_tonight() {
        let pass = iss_pass(now() + Duration::hours(3), "Bright");
        let c = iss_candidate(&pass, now());
        assert_eq!(c.urgency, Urgency::Tonight);
        // 70 + 10
        assert_eq!(c.score, 80.0);
        assert!(c.reasons.iter().any(|r| r == "Bright pass"));
    }

    #[test]
    fn test_iss_half_hour_out_is_soon() {
        let at_boundary = iss_candidate(&iss_pass(now() + Duration::minutes(30), "Faint"), now());
        assert_eq!(at_boundary.urgency, Urgency::Soon);
        assert_eq!(at_boundary.score, 90.0);

        let just_inside = iss_candidate(
            &iss_pass(now() + Duration::minutes(30) - Duration::seconds(1), "Faint"),
            now(),
        );
        assert_eq!(just_inside.urgency, Urgency::Now);
        assert_eq!(just_inside.score, 110.0);
    }

    #[test]
    fn test_meteor_rate_thresholds_are_exclusive() {
        let score = |zhr| meteor_candidate(&shower("Test", zhr, true)).score;
        assert_eq!(score(101), 85.0);
        assert_eq!(score(100), 75.0);
        assert_eq!(score(51), 75.0);
        assert_eq!(score(50), 65.0);
        assert_eq!(score(0), 65.0);
    }

    #[test]
    fn test_faint_deep_sky_gets_no_negative_brightness_term() {
        let none = HashSet::new();
        let at_ten = deep_sky_candidate(&dso("NGC1", 10.0, 40.0), 0.0, &none);
        let fainter = deep_sky_candidate(&dso("NGC2", 13.5, 40.0), 0.0, &none);
        let brighter = deep_sky_candidate(&dso("NGC3", 9.0, 40.0), 0.0, &none);

        assert_eq!(fainter.score, at_ten.score);
        assert!((brighter.score - at_ten.score - 3.0).abs() < 1e-9);
        // 40 + 0 + 12 + 20
        assert!((fainter.score - 72.0).abs() < 1e-9);
    }

    #[test]
    fn test_difficulty_headroom() {
        assert_eq!(difficulty_for(10.0, Some(6.5)), Difficulty::Easy);
        assert_eq!(difficulty_for(10.0, Some(8.0)), Difficulty::Moderate);
        assert_eq!(difficulty_for(10.0, Some(9.0)), Difficulty::Challenging);
        assert_eq!(difficulty_for(6.0, None), Difficulty::Easy);
    }
}
