use crate::domain::{AstroEvent, Weather};
use chrono::{DateTime, TimeZone};
use serde::Serialize;

const WEATHER_MAX: f64 = 50.0;
const WEATHER_NEUTRAL: u32 = 25;
const MOON_MAX: f64 = 30.0;
const EVENTS_MAX: u32 = 20;
const POINTS_PER_EVENT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Grade {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        if score >= 75 {
            Self::Excellent
        } else if score >= 55 {
            Self::Good
        } else if score >= 35 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Excellent => "🌟",
            Self::Good => "✨",
            Self::Fair => "🌙",
            Self::Poor => "☁️",
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Excellent => "Outstanding night. Go after faint galaxies and nebulae.",
            Self::Good => {
                "Good night for observing. Planets and bright deep-sky objects are in reach."
            }
            Self::Fair => "Fair conditions. Stick to the Moon, planets and bright clusters.",
            Self::Poor => "Poor conditions. Consider planning for another night.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreFactors {
    pub weather: u32,
    pub moon_phase: u32,
    pub events: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservabilityScore {
    pub score: u32,
    pub grade: Grade,
    pub emoji: &'static str,
    pub factors: ScoreFactors,
    pub highlights: Vec<String>,
    pub recommendation: &'static str,
}

/// Weather contribution, 0-50. Missing data is neutral rather than bad.
pub fn weather_factor(weather: Option<&Weather>) -> u32 {
    let Some(w) = weather.filter(|w| w.is_known()) else {
        return WEATHER_NEUTRAL;
    };

    let humidity_penalty = (w.humidity - 80.0).max(0.0) * 0.2;
    let visibility_bonus = if w.visibility > 10.0 { 5.0 } else { 0.0 };
    let raw = WEATHER_MAX - w.cloud_cover * 0.5 - humidity_penalty + visibility_bonus;
    raw.clamp(0.0, WEATHER_MAX).round() as u32
}

/// Moon contribution, 0-30. Linear in illumination; new moon scores highest.
pub fn moon_factor(illumination: f64) -> u32 {
    let lit = illumination.clamp(0.0, 100.0) / 100.0;
    (MOON_MAX * (1.0 - lit)).round() as u32
}

/// Events falling on the same calendar day as `now`, in `now`'s zone.
pub fn events_today<'a, Tz: TimeZone>(
    events: &'a [AstroEvent],
    now: &DateTime<Tz>,
) -> Vec<&'a AstroEvent> {
    let today = now.date_naive();
    events
        .iter()
        .filter(|e| e.date.with_timezone(&now.timezone()).date_naive() == today)
        .collect()
}

/// Score tonight out of 100 from weather, moonlight and today's events.
pub fn score_tonight<Tz: TimeZone>(
    weather: Option<&Weather>,
    moon_illumination: f64,
    events: &[AstroEvent],
    now: &DateTime<Tz>,
) -> ObservabilityScore {
    let today = events_today(events, now);
    let factors = ScoreFactors {
        weather: weather_factor(weather),
        moon_phase: moon_factor(moon_illumination),
        events: (today.len() as u32 * POINTS_PER_EVENT).min(EVENTS_MAX),
    };
    let score = factors.weather + factors.moon_phase + factors.events;
    let grade = Grade::from_score(score);

    let mut highlights = Vec::new();
    if let Some(w) = weather.filter(|w| w.is_known()) {
        if w.cloud_cover < 20.0 {
            highlights.push("Clear skies".to_string());
        }
        if w.humidity >= 0.0 && w.humidity < 60.0 {
            highlights.push("Low humidity".to_string());
        }
    }
    if moon_illumination < 5.0 {
        highlights.push("New moon".to_string());
    } else if moon_illumination < 30.0 {
        highlights.push("Minimal moonlight".to_string());
    }
    highlights.extend(today.iter().take(2).map(|e| e.title.clone()));

    ObservabilityScore {
        score,
        grade,
        emoji: grade.emoji(),
        factors,
        highlights,
        recommendation: grade.recommendation(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn weather(cloud_cover: f64, humidity: f64, visibility: f64) -> Weather {
        Weather {
            cloud_cover,
            humidity,
            visibility,
            wind_speed: 5.0,
            temperature: 12.0,
            condition: None,
            summary: None,
        }
    }

    fn event(date: DateTime<Utc>, title: &str) -> AstroEvent {
        AstroEvent {
            kind: "conjunction".to_string(),
            date,
            title: title.to_string(),
            description: String::new(),
            bodies: vec![],
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 3, 21, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_weather_is_neutral() {
        let s = score_tonight(None, 0.0, &[], &now());
        assert_eq!(
            s.factors,
            ScoreFactors {
                weather: 25,
                moon_phase: 30,
                events: 0
            }
        );
        assert_eq!(s.score, 55);
        assert_eq!(s.grade, Grade::Good);
    }

    #[test]
    fn test_clear_dry_night_clamps_weather() {
        let w = weather(0.0, 40.0, 15.0);
        let s = score_tonight(Some(&w), 0.0, &[], &now());
        assert_eq!(s.factors.weather, 50);
        assert_eq!(s.score, 80);
        assert_eq!(s.grade, Grade::Excellent);
        assert_eq!(s.highlights, vec!["Clear skies", "Low humidity", "New moon"]);
    }

    #[test]
    fn test_unknown_sentinel_weather_is_neutral() {
        let w = weather(-1.0, -1.0, -1.0);
        assert_eq!(weather_factor(Some(&w)), 25);
    }

    #[test]
    fn test_humid_overcast_weather() {
        // 50 - 45 - 3 + 0
        assert_eq!(weather_factor(Some(&weather(90.0, 95.0, 4.0))), 2);
        assert_eq!(weather_factor(Some(&weather(100.0, 100.0, 2.0))), 0);
    }

    #[test]
    fn test_moon_factor_is_linear() {
        assert_eq!(moon_factor(0.0), 30);
        assert_eq!(moon_factor(50.0), 15);
        assert_eq!(moon_factor(100.0), 0);
    }

    #[test]
    fn test_events_only_count_today_and_cap() {
        let events = vec![
            event(now() - Duration::hours(2), "Moon meets Saturn"),
            event(now() + Duration::hours(1), "Mars at opposition"),
            event(now(), "Venus greatest elongation"),
            event(now() + Duration::days(1), "Tomorrow's event"),
        ];
        let s = score_tonight(None, 100.0, &events, &now());
        assert_eq!(s.factors.events, 20);
        assert_eq!(s.score, 45);
        assert_eq!(s.grade, Grade::Fair);
        assert_eq!(s.highlights, vec!["Moon meets Saturn", "Mars at opposition"]);
    }

    #[test]
    fn test_grade_thresholds() {
        assert_eq!(Grade::from_score(75), Grade::Excellent);
        assert_eq!(Grade::from_score(74), Grade::Good);
        assert_eq!(Grade::from_score(55), Grade::Good);
        assert_eq!(Grade::from_score(35), Grade::Fair);
        assert_eq!(Grade::from_score(34), Grade::Poor);
    }
}
