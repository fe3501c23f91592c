pub mod common;
pub mod inventory;
pub mod jobs;
pub mod reports;
pub mod room_types;
pub mod snapshots;
pub mod statistics;

use crate::{
    config::AppConfig,
    db::DbPool,
    services::{
        channel_manager::InventorySource,
        comparison::ComparisonService,
        hotels::HotelDirectory,
        inventory_fetch::InventoryFetchService,
        reports::ReportService,
        room_types::RoomTypeService,
        snapshots::SnapshotService,
        weekly_statistics::WeeklyStatisticsService,
        weekly_update::{WeeklyUpdateJobs, WeeklyUpdateOrchestrator},
    },
};
use axum::Router;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub room_types: Arc<RoomTypeService>,
    pub fetcher: Arc<InventoryFetchService>,
    pub statistics: Arc<WeeklyStatisticsService>,
    pub snapshots: Arc<SnapshotService>,
    pub comparison: Arc<ComparisonService>,
    pub reports: Arc<ReportService>,
    pub orchestrator: Arc<WeeklyUpdateOrchestrator>,
    pub jobs: Arc<WeeklyUpdateJobs>,
}

impl AppServices {
    /// Wires every service onto one pool and one inventory source.
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig, source: Arc<dyn InventorySource>) -> Self {
        let hotels = HotelDirectory::new(config.hotels.clone());

        let room_types = Arc::new(RoomTypeService::new(db_pool.clone(), hotels.clone()));
        let fetcher = Arc::new(InventoryFetchService::new(
            db_pool.clone(),
            source,
            room_types.clone(),
        ));
        let statistics = Arc::new(WeeklyStatisticsService::new(
            db_pool.clone(),
            hotels.clone(),
        ));
        let snapshots = Arc::new(SnapshotService::new(db_pool.clone()));
        let comparison = Arc::new(ComparisonService::new(db_pool.clone(), hotels.clone()));
        let reports = Arc::new(ReportService::new(db_pool, hotels));

        let orchestrator = Arc::new(WeeklyUpdateOrchestrator::new(
            snapshots.clone(),
            fetcher.clone(),
            room_types.clone(),
            statistics.clone(),
            config.weekly_update.clone(),
        ));
        let jobs = Arc::new(WeeklyUpdateJobs::new(orchestrator.clone()));

        Self {
            room_types,
            fetcher,
            statistics,
            snapshots,
            comparison,
            reports,
            orchestrator,
            jobs,
        }
    }
}

/// Every domain endpoint, mounted at the root like the dashboard expects
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(room_types::room_type_routes())
        .merge(inventory::inventory_routes())
        .merge(statistics::statistics_routes())
        .merge(snapshots::snapshot_routes())
        .merge(jobs::job_routes())
        .merge(reports::report_routes())
}
