/// HTTP request handlers
use crate::domain::{EquipmentProfile, Health, Observation, Session, SkyReport};
use crate::engine::challenges::ChallengeUpdate;
use crate::engine::planner::ObservationPlan;
use crate::engine::streaks::ObservingStats;
use crate::engine::ViewState;
use crate::errors::ApiError;
use crate::services::{
    local_now, EquipmentService, ObservationService, ProgressService, SkyService, SyncResult,
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub observation_service: Arc<ObservationService>,
    pub sky_service: Arc<SkyService>,
    pub progress_service: Arc<ProgressService>,
    pub equipment_service: Arc<EquipmentService>,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LocalQuery {
    pub device_id: String,
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct SkyQuery {
    pub device_id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub tz_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct PlanQuery {
    pub device_id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_true")]
    pub include_observed: bool,
    pub max_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    #[serde(default = "default_days")]
    pub days: i64,
}

#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    pub device_id: String,
    pub observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
pub struct EquipmentRequest {
    pub equipment: Vec<EquipmentProfile>,
}

fn default_true() -> bool {
    true
}

fn default_radius_km() -> f64 {
    50.0
}

fn default_days() -> i64 {
    30
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        now: Utc::now(),
    })
}

/// Upsert a device's observations
pub async fn sync_observations(
    State(state): State<AppState>,
    Json(request): Json<SyncRequest>,
) -> Result<Json<SuccessResponse<SyncResult>>, ApiError> {
    let result = state
        .observation_service
        .sync(&request.device_id, request.observations)?;
    Ok(Json(SuccessResponse::new(result)))
}

/// List a device's observations
pub async fn my_observations(
    Query(query): Query<DeviceQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let observations = state.observation_service.mine(&query.device_id)?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "observations": observations
        })
    ))))
}

/// Aggregated observations near a location
pub async fn nearby_observations(
    Query(query): Query<NearbyQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let objects = state.observation_service.nearby(
        query.lat,
        query.lon,
        query.radius_km,
        query.days,
        Utc::now(),
    )?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "objects": objects
        })
    ))))
}

/// Delete one of the device's observations
pub async fn delete_observation(
    Path(observation_id): Path<String>,
    Query(query): Query<DeviceQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    state
        .observation_service
        .delete(&query.device_id, &observation_id)?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "deleted": true
        })
    ))))
}

/// Accept a freshly computed sky report
pub async fn put_report(
    State(state): State<AppState>,
    Json(report): Json<SkyReport>,
) -> Result<Json<Value>, ApiError> {
    let key = state.sky_service.store_report(report, Utc::now())?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "key": key
        })
    ))))
}

/// Dashboard view for tonight
pub async fn get_tonight(
    Query(query): Query<SkyQuery>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<ViewState>>, ApiError> {
    let now = local_now(Utc::now(), query.tz_offset_minutes)?;
    let view = state
        .sky_service
        .tonight(&query.device_id, query.lat, query.lon, now)?;
    Ok(Json(SuccessResponse::new(view)))
}

/// Equipment-aware observation plan
pub async fn get_plan(
    Query(query): Query<PlanQuery>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<ObservationPlan>>, ApiError> {
    let plan = state.sky_service.plan(
        &query.device_id,
        query.lat,
        query.lon,
        query.include_observed,
        query.max_results,
        Utc::now(),
    )?;
    Ok(Json(SuccessResponse::new(plan)))
}

/// Observing statistics in the caller's time zone
pub async fn get_stats(
    Query(query): Query<LocalQuery>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<ObservingStats>>, ApiError> {
    let now = local_now(Utc::now(), query.tz_offset_minutes)?;
    let stats = state.progress_service.stats(&query.device_id, now)?;
    Ok(Json(SuccessResponse::new(stats)))
}

/// This week's challenges, refreshed against the log
pub async fn get_challenges(
    Query(query): Query<LocalQuery>,
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<ChallengeUpdate>>, ApiError> {
    let now = local_now(Utc::now(), query.tz_offset_minutes)?;
    let update = state.progress_service.challenges(&query.device_id, now)?;
    Ok(Json(SuccessResponse::new(update)))
}

pub async fn get_equipment(
    Query(query): Query<DeviceQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let equipment = state.equipment_service.list(&query.device_id)?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "equipment": equipment
        })
    ))))
}

pub async fn put_equipment(
    Query(query): Query<DeviceQuery>,
    State(state): State<AppState>,
    Json(request): Json<EquipmentRequest>,
) -> Result<Json<Value>, ApiError> {
    let equipment = state
        .equipment_service
        .replace(&query.device_id, request.equipment)?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "equipment": equipment
        })
    ))))
}

pub async fn list_sessions(
    Query(query): Query<DeviceQuery>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let sessions = state.observation_service.sessions(&query.device_id)?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "sessions": sessions
        })
    ))))
}

pub async fn save_session(
    Query(query): Query<DeviceQuery>,
    State(state): State<AppState>,
    Json(session): Json<Session>,
) -> Result<Json<Value>, ApiError> {
    let session = state
        .observation_service
        .save_session(&query.device_id, session)?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "session": session
        })
    ))))
}
