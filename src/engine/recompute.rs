use super::countdown::{time_until, TimeUntil};
use super::observability::{score_tonight, ObservabilityScore};
use super::recommend::{recommend, Candidate};
use super::sky_phase::{classify, SkyPhaseStatus};
use crate::domain::{darkness_quality, observed_ids, Observation, SkyReport};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

/// Everything the dashboard shows for one clock tick.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub now: DateTime<Utc>,
    pub phase: SkyPhaseStatus,
    pub observability: ObservabilityScore,
    pub darkness: &'static str,
    pub next_iss_pass: Option<TimeUntil>,
    pub recommendations: Vec<Candidate>,
}

/// Rebuild the view from scratch. Called on every tick and every report refresh.
pub fn recompute<Tz: TimeZone>(
    now: &DateTime<Tz>,
    report: &SkyReport,
    history: &[Observation],
) -> ViewState {
    let now_utc = now.with_timezone(&Utc);
    let observed = observed_ids(history);

    ViewState {
        now: now_utc,
        phase: classify(now_utc, &report.sun),
        observability: score_tonight(
            report.weather.as_ref(),
            report.moon.illumination,
            &report.events,
            now,
        ),
        darkness: darkness_quality(report.moon.illumination),
        next_iss_pass: report
            .iss_passes
            .iter()
            .find(|p| p.start_time > now_utc)
            .map(|p| time_until(now_utc, p.start_time)),
        recommendations: recommend(report, now_utc, &observed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{empty_report, iss_pass, now, planet};
    use crate::engine::sky_phase::SkyPhase;
    use chrono::Duration;

    #[test]
    fn test_recompute_is_deterministic() {
        let mut report = empty_report();
        report.planets = vec![planet("Saturn", 30.0), planet("Mars", 30.0), planet("Venus", 10.0)];
        report.iss_passes = vec![iss_pass(now() + Duration::minutes(75), "Bright")];

        let a = recompute(&now(), &report, &[]);
        let b = recompute(&now(), &report, &[]);
        let order = |v: &ViewState| {
            v.recommendations
                .iter()
                .map(|c| c.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(order(&a), order(&b));

        assert_eq!(a.phase.phase, SkyPhase::Night);
        assert_eq!(a.observability.score, 40);
        assert_eq!(a.darkness, "Fair");
        let iss = a.next_iss_pass.unwrap();
        assert_eq!((iss.hours, iss.minutes), (1, 15));
    }
}
