//! Explicitly constructed process resources and the service bundle built on them.

use std::sync::Arc;
use std::time::Duration;

use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tracing::info;

use configs::AppConfig;

use crate::batch_delete::BatchDeleter;
use crate::blob::BlobStore;
use crate::calendar::Calendar;
use crate::errors::ServiceError;
use crate::health::{DownstreamTargets, HealthAggregator};
use crate::ledger::TaskLedger;
use crate::store::seaorm::SeaOrmStore;
use crate::store::{CalendarStore, LedgerStore};

/// Pool and HTTP client shared by every request. Owned by the composition root.
pub struct AppContext {
    pub db: DatabaseConnection,
    pub http: reqwest::Client,
    pub targets: DownstreamTargets,
    pub probe_timeout: Duration,
}

impl AppContext {
    /// Connect, migrate (unless disabled) and verify the database answers.
    pub async fn init(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let db = models::db::connect_with_config(&cfg.database).await?;
        if cfg.database.run_migrations {
            migration::Migrator::up(&db, None).await.map_err(ServiceError::store)?;
            info!(service = "context", event = "migrations_applied");
        }
        db.ping().await.map_err(ServiceError::store)?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        Ok(Self {
            db,
            http,
            targets: DownstreamTargets {
                compressor_url: cfg.services.compressor_url.clone(),
                schedule_url: cfg.services.schedule_url.clone(),
            },
            probe_timeout: cfg.services.probe_timeout(),
        })
    }

    /// Services wired to the Postgres store.
    pub fn services(&self) -> Services {
        let store = Arc::new(SeaOrmStore::new(self.db.clone()));
        Services::new(store.clone(), store, self.http.clone(), self.targets.clone(), self.probe_timeout)
    }

    pub async fn teardown(self) -> Result<(), ServiceError> {
        self.db.close().await.map_err(ServiceError::store)?;
        info!(service = "context", event = "pool_closed");
        Ok(())
    }
}

/// Every component the HTTP layer calls into.
#[derive(Clone)]
pub struct Services {
    pub ledger: TaskLedger,
    pub blobs: BlobStore,
    pub batch: BatchDeleter,
    pub health: HealthAggregator,
    pub calendar: Calendar,
}

impl Services {
    pub fn new(
        ledger_store: Arc<dyn LedgerStore>,
        calendar_store: Arc<dyn CalendarStore>,
        http: reqwest::Client,
        targets: DownstreamTargets,
        probe_timeout: Duration,
    ) -> Self {
        let blobs = BlobStore::new(ledger_store.clone());
        let calendar = Calendar::new(calendar_store);
        Self {
            ledger: TaskLedger::new(ledger_store.clone()),
            batch: BatchDeleter::new(ledger_store.clone(), blobs.clone()),
            health: HealthAggregator::new(ledger_store, calendar.clone(), http, targets, probe_timeout),
            blobs,
            calendar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn services_share_one_store() {
        let mem = MemoryStore::new();
        let svc = Services::new(
            Arc::new(mem.clone()),
            Arc::new(mem.clone()),
            reqwest::Client::new(),
            DownstreamTargets { compressor_url: "http://127.0.0.1:9".into(), schedule_url: "http://127.0.0.1:9".into() },
            Duration::from_secs(1),
        );
        let id = mem.put_blob(b"abc", 2).await;
        assert_eq!(svc.blobs.lookup_size(id).await.unwrap(), Some(3));
        assert_eq!(svc.ledger.statistics().await.unwrap().storage_used_bytes, 3);
    }

    #[tokio::test]
    async fn init_and_teardown_against_postgres() -> Result<(), anyhow::Error> {
        if !crate::test_support::db_tests_enabled() { return Ok(()); }
        let mut cfg = AppConfig::default();
        cfg.database.url = models::db::DATABASE_URL.to_string();
        cfg.database.min_connections = 1;
        let ctx = AppContext::init(&cfg).await?;
        ctx.services().ledger.liveness().await?;
        ctx.teardown().await?;
        Ok(())
    }
}
