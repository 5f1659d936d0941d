use super::recommend::{
    deep_sky_candidate, difficulty_for, iss_candidate, meteor_candidate, moon_candidate,
    planet_candidate, rank, Candidate, CandidateKind, Difficulty, NAKED_EYE_LIMIT,
};
use crate::domain::{EquipmentProfile, SkyReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

pub const MAX_TOP_PICKS: usize = 5;

const MIN_PLANET_ALTITUDE: f64 = 5.0;
const MIN_DSO_ALTITUDE: f64 = 15.0;

/// Best limiting magnitude across the user's equipment; naked eye without any.
pub fn limiting_magnitude(profiles: &[EquipmentProfile]) -> f64 {
    profiles
        .iter()
        .map(EquipmentProfile::limiting_magnitude)
        .reduce(f64::max)
        .unwrap_or(NAKED_EYE_LIMIT)
}

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    pub limiting_magnitude: f64,
    pub observed_ids: HashSet<String>,
    pub include_observed: bool,
    pub max_results: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            limiting_magnitude: NAKED_EYE_LIMIT,
            observed_ids: HashSet::new(),
            include_observed: true,
            max_results: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlanStats {
    pub total_candidates: usize,
    pub not_observed: usize,
    pub easy: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservationPlan {
    pub limiting_magnitude: f64,
    pub top_picks: Vec<Candidate>,
    pub all: Vec<Candidate>,
    pub stats: PlanStats,
}

/// Everything the user's equipment can reach tonight, ranked.
pub fn plan(report: &SkyReport, now: DateTime<Utc>, options: &PlannerOptions) -> ObservationPlan {
    let limit = options.limiting_magnitude;
    let observed = &options.observed_ids;

    let mut candidates: Vec<Candidate> = report
        .planets
        .iter()
        .filter(|p| p.altitude > MIN_PLANET_ALTITUDE)
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

    candidates.extend(
        report
            .deep_sky
            .iter()
            .filter(|d| d.altitude > MIN_DSO_ALTITUDE && d.mag <= limit)
            .map(|d| deep_sky_candidate(d, 0.0, observed)),
    );

    candidates.extend(moon_candidate(&report.moon, observed));

    for candidate in candidates.iter_mut() {
        candidate.difficulty = difficulty_for(limit, candidate.magnitude);
    }
    if !options.include_observed {
        candidates.retain(|c| !c.has_observed);
    }

    rank(&mut candidates);

    let stats = PlanStats {
        total_candidates: candidates.len(),
        not_observed: candidates.iter().filter(|c| !c.has_observed).count(),
        easy: candidates
            .iter()
            .filter(|c| c.difficulty == Difficulty::Easy)
            .count(),
    };
    let top_picks = top_picks(&candidates);
    candidates.truncate(options.max_results);

    ObservationPlan {
        limiting_magnitude: limit,
        top_picks,
        all: candidates,
        stats,
    }
}

/// Pick up to five from an already ranked list.
///
/// The first pass takes the best unobserved candidate of each kind; the second
/// fills remaining slots by score regardless of kind.
pub fn top_picks(ranked: &[Candidate]) -> Vec<Candidate> {
    let mut kinds: HashSet<CandidateKind> = HashSet::new();
    let mut chosen: Vec<usize> = Vec::new();

    for (i, c) in ranked.iter().enumerate() {
        if chosen.len() >= MAX_TOP_PICKS {
            break;
        }
        if !c.has_observed && kinds.insert(c.kind) {
            chosen.push(i);
        }
    }
    for i in 0..ranked.len() {
        if chosen.len() >= MAX_TOP_PICKS {
            break;
        }
        if !chosen.contains(&i) {
            chosen.push(i);
        }
    }

    chosen
        .into_iter()
        .enumerate()
        .map(|(slot, i)| Candidate {
            priority: Some(slot as u8 + 1),
            ..ranked[i].clone()
        })
        .collect()
}
