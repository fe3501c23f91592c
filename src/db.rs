use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub type DbPool = DatabaseConnection;

/// Pool tuning taken from the `db_*` configuration keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl From<&AppConfig> for PoolSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections.min(cfg.db_max_connections),
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

impl PoolSettings {
    fn is_sqlite(&self) -> bool {
        self.url.starts_with("sqlite:")
    }

    fn connect_options(&self) -> ConnectOptions {
        let mut opt = ConnectOptions::new(self.url.clone());
        opt.max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(self.connect_timeout)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .sqlx_logging(false);
        opt
    }
}

/// Opens the pool described by `settings`
pub async fn connect(settings: &PoolSettings) -> Result<DbPool, ServiceError> {
    if settings.is_sqlite() && settings.url.contains(":memory:") && settings.max_connections > 1 {
        // each pooled connection would see its own empty in-memory database
        warn!(
            max_connections = settings.max_connections,
            "In-memory SQLite with more than one pooled connection"
        );
    }
    debug!(
        max_connections = settings.max_connections,
        min_connections = settings.min_connections,
        sqlite = settings.is_sqlite(),
        "Opening database pool"
    );

    gauge!("hotel_inventory.db.max_connections", settings.max_connections as f64);

    let pool = Database::connect(settings.connect_options())
        .await
        .map_err(|e| {
            error!(error = %e, "Could not open database pool");
            counter!("hotel_inventory.db.connection_failures", 1);
            ServiceError::DatabaseError(e)
        })?;

    info!("Database pool ready");
    Ok(pool)
}

pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    connect(&PoolSettings::from(cfg)).await
}

/// Applies pending migrations; already applied ones are skipped
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    let started = Instant::now();
    let result = crate::migrator::Migrator::up(pool, None).await;
    let elapsed = started.elapsed();

    match result {
        Ok(()) => {
            info!(elapsed_ms = elapsed.as_millis() as u64, "Migrations applied");
            Ok(())
        }
        Err(e) => {
            error!(elapsed_ms = elapsed.as_millis() as u64, error = %e, "Migrations failed");
            Err(ServiceError::DatabaseError(e))
        }
    }
}

/// Round trip to the database, returning its latency
pub async fn check_connection(pool: &DbPool) -> Result<Duration, ServiceError> {
    let started = Instant::now();
    match pool.ping().await {
        Ok(()) => {
            let elapsed = started.elapsed();
            histogram!("hotel_inventory.db.ping", elapsed);
            Ok(elapsed)
        }
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            counter!("hotel_inventory.db.connection_failures", 1);
            Err(ServiceError::DatabaseError(e))
        }
    }
}

pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database pool");
    pool.close().await.map_err(ServiceError::DatabaseError)
}
