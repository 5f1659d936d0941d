use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tier {
    Easy,
    Medium,
    Hard,
}

/// How a challenge counts observed object ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule", content = "ids")]
pub enum Rule {
    ObservePlanets,
    ObserveDeepSky,
    ObserveMessier,
    ObserveMoon,
    ObserveAnything,
    ObserveAnyOf(&'static [&'static str]),
}

impl Rule {
    fn matches(&self, object_id: &str) -> bool {
        match self {
            Self::ObservePlanets => object_id.starts_with("planet-"),
            Self::ObserveDeepSky => object_id.starts_with("dso-"),
            Self::ObserveMessier => object_id.starts_with("dso-M"),
            Self::ObserveMoon => object_id == "moon",
            Self::ObserveAnything => true,
            Self::ObserveAnyOf(ids) => ids.contains(&object_id),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub tier: Tier,
    pub rule: Rule,
    pub target: u32,
    pub xp: u32,
}

impl Challenge {
    /// Distinct matching ids, capped at the target.
    pub fn progress(&self, observed: &HashSet<String>) -> u32 {
        let count = observed.iter().filter(|id| self.rule.matches(id)).count() as u32;
        count.min(self.target)
    }
}

const fn challenge(
    id: &'static str,
    title: &'static str,
    description: &'static str,
    tier: Tier,
    rule: Rule,
    target: u32,
    xp: u32,
) -> Challenge {
    Challenge {
        id,
        title,
        description,
        tier,
        rule,
        target,
        xp,
    }
}

pub static EASY_POOL: &[Challenge] = &[
    challenge("moon-gazer", "Moon Gazer", "Observe the Moon", Tier::Easy, Rule::ObserveMoon, 1, 50),
    challenge(
        "planet-spotter",
        "Planet Spotter",
        "Observe any planet",
        Tier::Easy,
        Rule::ObservePlanets,
        1,
        50,
    ),
    challenge(
        "first-light",
        "First Light",
        "Log any two objects",
        Tier::Easy,
        Rule::ObserveAnything,
        2,
        50,
    ),
    challenge(
        "evening-star",
        "Evening Star",
        "Find Venus",
        Tier::Easy,
        Rule::ObserveAnyOf(&["planet-venus"]),
        1,
        60,
    ),
    challenge(
        "double-take",
        "Double Take",
        "Observe two planets",
        Tier::Easy,
        Rule::ObservePlanets,
        2,
        80,
    ),
];

pub static MEDIUM_POOL: &[Challenge] = &[
    challenge(
        "planet-parade",
        "Planet Parade",
        "Observe three planets",
        Tier::Medium,
        Rule::ObservePlanets,
        3,
        150,
    ),
    challenge(
        "deep-sky-diver",
        "Deep Sky Diver",
        "Observe two deep-sky objects",
        Tier::Medium,
        Rule::ObserveDeepSky,
        2,
        150,
    ),
    challenge(
        "gas-giants",
        "Gas Giants",
        "Observe Jupiter and Saturn",
        Tier::Medium,
        Rule::ObserveAnyOf(&["planet-jupiter", "planet-saturn"]),
        2,
        120,
    ),
    challenge(
        "messier-starter",
        "Messier Starter",
        "Observe three Messier objects",
        Tier::Medium,
        Rule::ObserveMessier,
        3,
        175,
    ),
];

pub static HARD_POOL: &[Challenge] = &[
    challenge(
        "messier-marathon",
        "Messier Marathon",
        "Observe eight Messier objects",
        Tier::Hard,
        Rule::ObserveMessier,
        8,
        400,
    ),
    challenge(
        "galaxy-hunter",
        "Galaxy Hunter",
        "Observe three of M31, M33, M51 and M81",
        Tier::Hard,
        Rule::ObserveAnyOf(&["dso-M31", "dso-M33", "dso-M51", "dso-M81"]),
        3,
        350,
    ),
    challenge(
        "ice-giants",
        "Ice Giants",
        "Observe Uranus and Neptune",
        Tier::Hard,
        Rule::ObserveAnyOf(&["planet-uranus", "planet-neptune"]),
        2,
        300,
    ),
    challenge(
        "sky-tourist",
        "Sky Tourist",
        "Log twelve different objects",
        Tier::Hard,
        Rule::ObserveAnything,
        12,
        350,
    ),
];

/// Monday of the ISO week containing `now`.
pub fn week_start<Tz: TimeZone>(now: &DateTime<Tz>) -> NaiveDate {
    let today = now.date_naive();
    today - Duration::days(today.weekday().num_days_from_monday() as i64)
}

/// One challenge per tier, rotating with the ISO week number.
pub fn active_challenges<Tz: TimeZone>(now: &DateTime<Tz>) -> [&'static Challenge; 3] {
    let week = now.iso_week().week() as usize;
    [
        &EASY_POOL[week % EASY_POOL.len()],
        &MEDIUM_POOL[week % MEDIUM_POOL.len()],
        &HARD_POOL[week % HARD_POOL.len()],
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeProgress {
    pub challenge_id: String,
    pub progress: u32,
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Persisted weekly progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeState {
    pub week_start: Option<NaiveDate>,
    pub progress: Vec<ChallengeProgress>,
    pub total_xp: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveChallenge {
    #[serde(flatten)]
    pub challenge: Challenge,
    pub progress: u32,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChallengeUpdate {
    pub state: ChallengeState,
    pub challenges: Vec<ActiveChallenge>,
    pub newly_completed: Vec<&'static str>,
    pub xp_awarded: u32,
}

/// Recompute this week's progress from the observed ids.
///
/// Returns the new state for the caller to persist. XP for a challenge is
/// awarded only on its `completed` false to true transition.
pub fn refresh<Tz: TimeZone>(
    state: &ChallengeState,
    now: &DateTime<Tz>,
    observed: &HashSet<String>,
) -> ChallengeUpdate {
    let current_week = week_start(now);
    let mut next = if state.week_start == Some(current_week) {
        state.clone()
    } else {
        ChallengeState {
            week_start: Some(current_week),
            progress: Vec::new(),
            total_xp: state.total_xp,
        }
    };

    let mut challenges = Vec::new();
    let mut newly_completed = Vec::new();
    let mut xp_awarded = 0;

    for challenge in active_challenges(now) {
        let index = match next
            .progress
            .iter()
            .position(|p| p.challenge_id == challenge.id)
        {
            Some(index) => index,
            None => {
                next.progress.push(ChallengeProgress {
                    challenge_id: challenge.id.to_string(),
                    progress: 0,
                    completed: false,
                    completed_at: None,
                });
                next.progress.len() - 1
            }
        };
        let entry = &mut next.progress[index];

        entry.progress = challenge.progress(observed);
        if !entry.completed && entry.progress >= challenge.target {
            entry.completed = true;
            entry.completed_at = Some(now.with_timezone(&Utc));
            xp_awarded += challenge.xp;
            newly_completed.push(challenge.id);
        }

        challenges.push(ActiveChallenge {
            challenge: challenge.clone(),
            progress: entry.progress,
            completed: entry.completed,
        });
    }
    next.total_xp += xp_awarded;

    ChallengeUpdate {
        state: next,
        challenges,
        newly_completed,
        xp_awarded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn tuesday() -> DateTime<Utc> {
        // ISO week 33
        Utc.with_ymd_and_hms(2025, 8, 12, 21, 0, 0).unwrap()
    }

    #[test]
    fn test_weekly_selection_rotates_by_iso_week() {
        let active = active_challenges(&tuesday());
        assert_eq!(active[0].id, EASY_POOL[33 % EASY_POOL.len()].id);
        assert_eq!(active[1].id, MEDIUM_POOL[33 % MEDIUM_POOL.len()].id);
        assert_eq!(active[2].id, HARD_POOL[33 % HARD_POOL.len()].id);
        assert_eq!(active.map(|c| c.tier), [Tier::Easy, Tier::Medium, Tier::Hard]);

        let sunday = tuesday() + Duration::days(5);
        assert_eq!(active_challenges(&sunday).map(|c| c.id), active.map(|c| c.id));
        assert_eq!(week_start(&sunday), NaiveDate::from_ymd_opt(2025, 8, 11).unwrap());
    }

    #[test]
    fn test_rules_count_distinct_ids() {
        let observed = ids(&["planet-mars", "planet-venus", "dso-M31", "dso-NGC7000", "moon"]);
        let planets = challenge("p", "", "", Tier::Easy, Rule::ObservePlanets, 5, 0);
        let messier = challenge("m", "", "", Tier::Easy, Rule::ObserveMessier, 5, 0);
        let deep = challenge("d", "", "", Tier::Easy, Rule::ObserveDeepSky, 1, 0);
        assert_eq!(planets.progress(&observed), 2);
        assert_eq!(messier.progress(&observed), 1);
        assert_eq!(deep.progress(&observed), 1);
    }

    #[test]
    fn test_completion_awards_xp_once() {
        let observed: HashSet<String> = ids(&[
            "moon", "planet-venus", "planet-mars", "planet-jupiter", "planet-saturn",
            "planet-uranus", "planet-neptune", "dso-M31", "dso-M33", "dso-M51", "dso-M81",
            "dso-M13", "dso-M42", "dso-M45", "dso-M57",
        ]);
        let first = refresh(&ChallengeState::default(), &tuesday(), &observed);
        assert_eq!(first.newly_completed.len(), 3);
        assert!(first.xp_awarded > 0);
        assert_eq!(first.state.total_xp, first.xp_awarded);

        let second = refresh(&first.state, &tuesday(), &observed);
        assert!(second.newly_completed.is_empty());
        assert_eq!(second.xp_awarded, 0);
        assert_eq!(second.state, first.state);
    }

    #[test]
    fn test_week_rollover_resets_progress_keeps_xp() {
        let observed = ids(&["moon", "planet-mars"]);
        let mut previous = refresh(&ChallengeState::default(), &tuesday(), &observed).state;
        previous.total_xp = 500;

        let next_week = tuesday() + Duration::days(7);
        let update = refresh(&previous, &next_week, &HashSet::new());
        assert_eq!(update.state.total_xp, 500);
        assert_eq!(update.state.week_start, Some(week_start(&next_week)));
        assert_eq!(update.state.progress.len(), 3);
        assert!(update.state.progress.iter().all(|p| p.progress == 0 && !p.completed));
    }
}
