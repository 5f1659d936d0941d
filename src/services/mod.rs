/// Business logic services layer
use crate::domain::{
    observed_ids, Equipment, EquipmentProfile, ObjectKind, Observation, Session, SkyReport,
};
use crate::engine::challenges::{refresh, week_start, ChallengeUpdate};
use crate::engine::planner::{limiting_magnitude, plan, ObservationPlan, PlannerOptions};
use crate::engine::streaks::{analyze, ObservingStats};
use crate::engine::{recompute, ViewState};
use crate::errors::{ApiError, ApiResult};
use crate::repo::cache::ReportCache;
use crate::repo::{ChallengeRepo, EquipmentRepo, ObservationRepo, SessionRepo};
use crate::utils::haversine_km;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Look-back limit for nearby queries, roughly a century
const MAX_NEARBY_DAYS: i64 = 36_500;

fn require_device(device_id: &str) -> ApiResult<()> {
    if device_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("device_id is required".to_string()));
    }
    Ok(())
}

fn require_coordinates(lat: f64, lon: f64) -> ApiResult<()> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(ApiError::InvalidInput(format!(
            "coordinates out of range: {}, {}",
            lat, lon
        )));
    }
    Ok(())
}

/// Shift `now` into the caller's fixed UTC offset
pub fn local_now(now: DateTime<Utc>, offset_minutes: i32) -> ApiResult<DateTime<FixedOffset>> {
    let offset = offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            ApiError::InvalidInput(format!("tz_offset_minutes out of range: {}", offset_minutes))
        })?;
    Ok(now.with_timezone(&offset))
}

fn newest_first(mut observations: Vec<Observation>) -> Vec<Observation> {
    observations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    observations
}

#[derive(Debug, Serialize)]
pub struct SyncResult {
    pub synced: usize,
    pub device_observations: Vec<Observation>,
}

/// Per-object aggregate of other observers' activity near a location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyStats {
    pub object_id: String,
    pub object_name: String,
    pub object_type: ObjectKind,
    pub observation_count: u32,
    pub latest_observation: DateTime<Utc>,
    pub equipment_breakdown: BTreeMap<Equipment, u32>,
}

/// Observation log and observing session service
pub struct ObservationService {
    repo: ObservationRepo,
    sessions: SessionRepo,
}

impl ObservationService {
    pub fn new(repo: ObservationRepo, sessions: SessionRepo) -> Self {
        Self { repo, sessions }
    }

    /// Upsert a device's observations and return its whole log
    pub fn sync(&self, device_id: &str, observations: Vec<Observation>) -> ApiResult<SyncResult> {
        require_device(device_id)?;
        if let Some(foreign) = observations.iter().find(|o| o.device_id != device_id) {
            return Err(ApiError::InvalidInput(format!(
                "observation {} belongs to another device",
                foreign.id
            )));
        }

        let received = observations.len();
        let synced = self.repo.upsert(device_id, observations)?;
        info!(device_id, received, synced, "Observations synced");

        Ok(SyncResult {
            synced,
            device_observations: self.mine(device_id)?,
        })
    }

    /// A device's log, newest first
    pub fn mine(&self, device_id: &str) -> ApiResult<Vec<Observation>> {
        require_device(device_id)?;
        Ok(newest_first(self.repo.list(device_id)?))
    }

    /// Aggregated activity within `radius_km` since midnight UTC `days` ago.
    /// Most observed objects first.
    pub fn nearby(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        days: i64,
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<NearbyStats>> {
        require_coordinates(lat, lon)?;
        if radius_km.is_nan() || radius_km <= 0.0 {
            return Err(ApiError::InvalidInput("radius_km must be positive".to_string()));
        }
        if !(0..=MAX_NEARBY_DAYS).contains(&days) {
            return Err(ApiError::InvalidInput(format!(
                "days must be between 0 and {}",
                MAX_NEARBY_DAYS
            )));
        }

        let cutoff = now
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
            .checked_sub_signed(Duration::days(days))
            .ok_or_else(|| ApiError::InvalidInput(format!("days out of range: {}", days)))?;
        let mut by_object: BTreeMap<String, NearbyStats> = BTreeMap::new();

        for obs in self.repo.all()? {
            if obs.timestamp < cutoff || haversine_km(lat, lon, obs.lat, obs.lon) > radius_km {
                continue;
            }
            let stats = by_object
                .entry(obs.object_id.clone())
                .or_insert_with(|| NearbyStats {
                    object_id: obs.object_id.clone(),
                    object_name: obs.object_name.clone(),
                    object_type: obs.object_type,
                    observation_count: 0,
                    latest_observation: obs.timestamp,
                    equipment_breakdown: BTreeMap::new(),
                });
            stats.observation_count += 1;
            stats.latest_observation = stats.latest_observation.max(obs.timestamp);
            *stats.equipment_breakdown.entry(obs.equipment).or_insert(0) += 1;
        }

        let mut stats: Vec<NearbyStats> = by_object.into_values().collect();
        stats.sort_by(|a, b| b.observation_count.cmp(&a.observation_count));
        debug!(lat, lon, radius_km, days, objects = stats.len(), "Nearby query");
        Ok(stats)
    }

    /// Delete one of the device's own observations
    pub fn delete(&self, device_id: &str, observation_id: &str) -> ApiResult<()> {
        require_device(device_id)?;
        if !self.repo.delete(device_id, observation_id)? {
            return Err(ApiError::NotFound("Observation not found".to_string()));
        }
        info!(device_id, observation_id, "Observation deleted");
        Ok(())
    }

    /// Sessions, most recently started first
    pub fn sessions(&self, device_id: &str) -> ApiResult<Vec<Session>> {
        require_device(device_id)?;
        let mut sessions = self.sessions.list(device_id)?;
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    pub fn save_session(&self, device_id: &str, session: Session) -> ApiResult<Session> {
        require_device(device_id)?;
        if let Some(ended_at) = session.ended_at {
            if ended_at < session.started_at {
                return Err(ApiError::InvalidInput(
                    "session cannot end before it starts".to_string(),
                ));
            }
        }
        self.sessions.upsert(device_id, session.clone())?;
        Ok(session)
    }
}

/// Sky report intake and the views computed from it
pub struct SkyService {
    cache: Arc<ReportCache>,
    observations: ObservationRepo,
    equipment: EquipmentRepo,
}

impl SkyService {
    pub fn new(
        cache: Arc<ReportCache>,
        observations: ObservationRepo,
        equipment: EquipmentRepo,
    ) -> Self {
        Self {
            cache,
            observations,
            equipment,
        }
    }

    /// Cache a freshly computed report under its rounded location
    pub fn store_report(&self, report: SkyReport, now: DateTime<Utc>) -> ApiResult<String> {
        require_coordinates(report.location.lat, report.location.lon)?;
        let key = self.cache.put(report, now);
        info!(key = %key, cached = self.cache.len(), "Sky report stored");
        Ok(key)
    }

    pub fn report(&self, lat: f64, lon: f64, now: DateTime<Utc>) -> ApiResult<Arc<SkyReport>> {
        require_coordinates(lat, lon)?;
        self.cache.get(lat, lon, now).ok_or_else(|| {
            ApiError::NotFound(format!("no current report for {}", self.cache.key(lat, lon)))
        })
    }

    /// Dashboard state for tonight at a location
    pub fn tonight(
        &self,
        device_id: &str,
        lat: f64,
        lon: f64,
        now: DateTime<FixedOffset>,
    ) -> ApiResult<ViewState> {
        require_device(device_id)?;
        let report = self.report(lat, lon, now.with_timezone(&Utc))?;
        let history = self.observations.list(device_id)?;
        Ok(recompute(&now, &report, &history))
    }

    /// Plan limited by the device's best equipment
    pub fn plan(
        &self,
        device_id: &str,
        lat: f64,
        lon: f64,
        include_observed: bool,
        max_results: Option<usize>,
        now: DateTime<Utc>,
    ) -> ApiResult<ObservationPlan> {
        require_device(device_id)?;
        let report = self.report(lat, lon, now)?;
        let history = self.observations.list(device_id)?;
        let equipment = self.equipment.list(device_id)?;

        let defaults = PlannerOptions::default();
        let options = PlannerOptions {
            limiting_magnitude: limiting_magnitude(&equipment),
            observed_ids: observed_ids(&history),
            include_observed,
            max_results: max_results.unwrap_or(defaults.max_results),
        };
        Ok(plan(&report, now, &options))
    }

    /// Drop stale reports; returns how many went
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        if self.cache.is_empty() {
            return 0;
        }
        self.cache.sweep(now)
    }

    pub fn cached_reports(&self) -> usize {
        self.cache.len()
    }
}

/// Observing statistics and weekly challenges
pub struct ProgressService {
    observations: ObservationRepo,
    challenges: ChallengeRepo,
}

impl ProgressService {
    pub fn new(observations: ObservationRepo, challenges: ChallengeRepo) -> Self {
        Self {
            observations,
            challenges,
        }
    }

    pub fn stats(&self, device_id: &str, now: DateTime<FixedOffset>) -> ApiResult<ObservingStats> {
        require_device(device_id)?;
        let history = self.observations.list(device_id)?;
        Ok(analyze(&history, &now))
    }

    /// Refresh this week's challenges from observations made since Monday
    /// and persist the result.
    pub fn challenges(
        &self,
        device_id: &str,
        now: DateTime<FixedOffset>,
    ) -> ApiResult<ChallengeUpdate> {
        require_device(device_id)?;
        let monday = week_start(&now);
        let tz = now.timezone();
        let history = self.observations.list(device_id)?;
        let observed: HashSet<String> = observed_ids(
            history
                .iter()
                .filter(|o| o.timestamp.with_timezone(&tz).date_naive() >= monday),
        );

        let stored = self.challenges.get(device_id)?;
        let update = refresh(&stored, &now, &observed);
        if update.state != stored {
            self.challenges.save(device_id, &update.state)?;
        }
        if !update.newly_completed.is_empty() {
            info!(
                device_id,
                completed = ?update.newly_completed,
                xp = update.xp_awarded,
                "Challenges completed"
            );
        }
        Ok(update)
    }
}

/// Per-device equipment profiles
pub struct EquipmentService {
    repo: EquipmentRepo,
}

impl EquipmentService {
    pub fn new(repo: EquipmentRepo) -> Self {
        Self { repo }
    }

    pub fn list(&self, device_id: &str) -> ApiResult<Vec<EquipmentProfile>> {
        require_device(device_id)?;
        self.repo.list(device_id)
    }

    /// Replace the whole equipment list
    pub fn replace(
        &self,
        device_id: &str,
        equipment: Vec<EquipmentProfile>,
    ) -> ApiResult<Vec<EquipmentProfile>> {
        require_device(device_id)?;
        let mut ids = HashSet::new();
        for profile in &equipment {
            if profile.aperture_mm.is_nan() || profile.aperture_mm <= 0.0 {
                return Err(ApiError::InvalidInput(format!(
                    "{}: aperture_mm must be positive",
                    profile.id
                )));
            }
            if !ids.insert(profile.id.as_str()) {
                return Err(ApiError::InvalidInput(format!(
                    "duplicate equipment id {}",
                    profile.id
                )));
            }
        }
        self.repo.replace(device_id, &equipment)?;
        Ok(equipment)
    }
}
