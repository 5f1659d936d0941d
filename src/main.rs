/// Main application entry point with clean architecture
mod config;
mod domain;
mod engine;
mod errors;
mod handlers;
mod repo;
mod routes;
mod services;
mod utils;

use crate::config::AppConfig;
use crate::handlers::AppState;
use crate::repo::cache::{ReportCache, TtlCapacityPolicy};
use crate::repo::{
    ChallengeRepo, EquipmentRepo, KeyValueStore, MemoryStore, ObservationRepo, SessionRepo,
};
use crate::routes::build_router;
use crate::services::{EquipmentService, ObservationService, ProgressService, SkyService};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    // Load configuration
    let config = AppConfig::from_env()?;
    info!("Configuration loaded successfully");

    // Initialize storage
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let cache_config = &config.report_cache;
    let cache = Arc::new(ReportCache::new(
        cache_config.coord_precision,
        TtlCapacityPolicy {
            ttl: cache_config.ttl(),
            max_entries: cache_config.max_entries,
        },
    ));
    info!(
        "Report cache ready (ttl: {}s, max entries: {})",
        cache_config.ttl_seconds, cache_config.max_entries
    );

    // Initialize repositories
    let observation_repo = ObservationRepo::new(store.clone());
    let equipment_repo = EquipmentRepo::new(store.clone());
    let challenge_repo = ChallengeRepo::new(store.clone());
    let session_repo = SessionRepo::new(store);

    // Initialize services
    let observation_service = Arc::new(ObservationService::new(
        observation_repo.clone(),
        session_repo,
    ));
    let sky_service = Arc::new(SkyService::new(
        cache,
        observation_repo.clone(),
        equipment_repo.clone(),
    ));
    let progress_service = Arc::new(ProgressService::new(observation_repo, challenge_repo));
    let equipment_service = Arc::new(EquipmentService::new(equipment_repo));

    // Initialize application state
    let state = AppState {
        observation_service,
        sky_service: sky_service.clone(),
        progress_service,
        equipment_service,
    };

    // Start background tasks
    start_background_tasks(config.clone(), sky_service);

    // Build router
    let app = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("astrosky service listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Start background maintenance tasks
fn start_background_tasks(config: AppConfig, sky_service: Arc<SkyService>) {
    // Background task: report cache sweep
    let interval = config.report_cache.sweep_seconds.max(1);
    tokio::spawn(async move {
        info!("Starting report cache sweep task (interval: {}s)", interval);
        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            let dropped = sky_service.sweep(Utc::now());
            if dropped > 0 {
                info!(
                    "Swept {} stale reports, {} cached",
                    dropped,
                    sky_service.cached_reports()
                );
            } else {
                debug!("Report cache sweep found nothing stale");
            }
        }
    });

    info!("All background tasks started successfully");
}
