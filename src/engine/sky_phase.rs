use super::countdown::{time_until, TimeUntil};
use crate::domain::SunTimes;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkyPhase {
    Night,
    MorningTwilight,
    Day,
    EveningTwilight,
}

impl SkyPhase {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Night => "Night",
            Self::MorningTwilight => "Morning Twilight",
            Self::Day => "Daytime",
            Self::EveningTwilight => "Evening Twilight",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            Self::Night => "Astronomical darkness, prime time for faint objects",
            Self::MorningTwilight => "The sky is brightening toward sunrise",
            Self::Day => "The Sun is up; plan tonight's session",
            Self::EveningTwilight => "Darkness is falling, planets come out first",
        }
    }

    fn exit_label(&self) -> &'static str {
        match self {
            Self::Night => "Dawn",
            Self::MorningTwilight => "Sunrise",
            Self::Day => "Sunset",
            Self::EveningTwilight => "Full darkness",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseBoundary {
    pub label: &'static str,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkyPhaseStatus {
    pub phase: SkyPhase,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub next_boundary: PhaseBoundary,
    pub countdown: TimeUntil,
}

/// Which part of the day `now` falls in. The first matching rule wins.
///
/// Night spans midnight, so it is tested before the daytime intervals. The
/// twilight pair is assumed to belong to the same night window as the report.
pub fn phase_at(now: DateTime<Utc>, sun: &SunTimes) -> SkyPhase {
    if now >= sun.twilight_start || now < sun.twilight_end {
        SkyPhase::Night
    } else if now >= sun.twilight_end && now < sun.sunrise {
        SkyPhase::MorningTwilight
    } else if now >= sun.sunrise && now < sun.sunset {
        SkyPhase::Day
    } else if now >= sun.sunset && now < sun.twilight_start {
        SkyPhase::EveningTwilight
    } else {
        SkyPhase::Day
    }
}

/// Classify `now` and count down to the phase's own exit boundary.
pub fn classify(now: DateTime<Utc>, sun: &SunTimes) -> SkyPhaseStatus {
    let phase = phase_at(now, sun);
    let at = match phase {
        SkyPhase::Night => sun.twilight_end,
        SkyPhase::MorningTwilight => sun.sunrise,
        SkyPhase::Day => sun.sunset,
        SkyPhase::EveningTwilight => sun.twilight_start,
    };

    SkyPhaseStatus {
        phase,
        title: phase.title(),
        subtitle: phase.subtitle(),
        next_boundary: PhaseBoundary {
            label: phase.exit_label(),
            at,
        },
        countdown: time_until(now, at),
    }
}
