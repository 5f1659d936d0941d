use crate::domain::{Equipment, Observation};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const MONTHS_SHOWN: i32 = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipmentShare {
    pub equipment: Equipment,
    pub count: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    /// `YYYY-MM`
    pub month: String,
    pub label: String,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObservingStats {
    pub total_observations: usize,
    pub hourly: Vec<u32>,
    pub equipment: Vec<EquipmentShare>,
    pub monthly: Vec<MonthCount>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub observing_days: usize,
    pub peak_hour: Option<u32>,
}

/// Observing habits over the whole log, bucketed in `now`'s time zone.
pub fn analyze<Tz: TimeZone>(observations: &[Observation], now: &DateTime<Tz>) -> ObservingStats {
    let tz = now.timezone();
    let local: Vec<DateTime<Tz>> = observations
        .iter()
        .map(|o| o.timestamp.with_timezone(&tz))
        .collect();

    let mut hourly = vec![0u32; 24];
    for t in &local {
        hourly[t.hour() as usize] += 1;
    }

    let mut by_day: Vec<NaiveDate> = local
        .iter()
        .map(|t| t.date_naive())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    by_day.reverse();

    ObservingStats {
        total_observations: observations.len(),
        peak_hour: peak_hour(&hourly),
        hourly,
        equipment: equipment_distribution(observations),
        monthly: monthly_counts(&local, now.date_naive()),
        current_streak: current_streak(&by_day, now.date_naive()),
        longest_streak: longest_streak(&by_day),
        observing_days: by_day.len(),
    }
}

/// First hour with the highest count.
fn peak_hour(hourly: &[u32]) -> Option<u32> {
    let mut best: Option<(u32, u32)> = None;
    for (hour, &count) in hourly.iter().enumerate() {
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((hour as u32, count));
        }
    }
    best.map(|(hour, _)| hour)
}

fn equipment_distribution(observations: &[Observation]) -> Vec<EquipmentShare> {
    let mut counts: BTreeMap<Equipment, u32> = BTreeMap::new();
    for o in observations {
        *counts.entry(o.equipment).or_default() += 1;
    }

    let total = observations.len() as f64;
    let mut shares: Vec<EquipmentShare> = counts
        .into_iter()
        .map(|(equipment, count)| EquipmentShare {
            equipment,
            count,
            percentage: (count as f64 * 100.0 / total).round() as u32,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares
}

fn monthly_counts<Tz: TimeZone>(local: &[DateTime<Tz>], today: NaiveDate) -> Vec<MonthCount> {
    let current = today.year() * 12 + today.month0() as i32;

    ((current - MONTHS_SHOWN + 1)..=current)
        .map(|index| {
            let (year, month) = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
            let count = local
                .iter()
                .filter(|t| t.year() == year && t.month() == month)
                .count() as u32;
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%b").to_string())
                .unwrap_or_default();
            MonthCount {
                month: format!("{:04}-{:02}", year, month),
                label,
                count,
            }
        })
        .collect()
}

/// Run of consecutive days ending today or yesterday. `days` is newest first.
pub fn current_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let Some(&latest) = days.first() else {
        return 0;
    };
    if latest != today && latest != today - Duration::days(1) {
        return 0;
    }

    let mut streak = 1;
    for pair in days.windows(2) {
        if (pair[0] - pair[1]).num_days() != 1 {
            break;
        }
        streak += 1;
    }
    streak
}

/// Longest run of consecutive days anywhere in the log. `days` is newest first.
pub fn longest_streak(days: &[NaiveDate]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    for (i, day) in days.iter().enumerate() {
        if i > 0 && (days[i - 1] - *day).num_days() == 1 {
            run += 1;
        } else {
            longest = longest.max(run);
            run = 1;
        }
    }
    longest.max(run)
}
