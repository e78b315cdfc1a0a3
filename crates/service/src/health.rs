//! Composite health report.
//!
//! The database probe and both downstream HTTP probes run concurrently. A
//! failing probe only marks its own section unhealthy; computing the report
//! never fails.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use models::task::TaskStatus;

use crate::calendar::Calendar;
use crate::errors::ServiceError;
use crate::ledger::{bytes_to_mb, round2};
use crate::metrics::{HEALTH_REPORTS_TOTAL, PROBE_DURATION, PROBE_FAILURES_TOTAL};
use crate::store::{LedgerStore, TaskFilter};

const COMPRESSOR: &str = "compressor";
const SCHEDULE: &str = "schedule";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DatabaseHealth {
    pub status: ProbeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tasks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_tasks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waiting_tasks: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_today: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holidays_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_size_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collections_count: Option<u64>,
}

impl DatabaseHealth {
    fn unhealthy(message: String) -> Self {
        Self {
            status: ProbeStatus::Unhealthy,
            message,
            total_tasks: None,
            processing_tasks: None,
            waiting_tasks: None,
            completed_today: None,
            holidays_count: None,
            db_size_mb: None,
            collections_count: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ServiceHealth {
    pub status: ProbeStatus,
    pub message: String,
    /// Absent when no response arrived (timeout or transport error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<f64>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ServicesHealth {
    pub compressor: ServiceHealth,
    pub schedule: ServiceHealth,
}

/// Body of the compressor's `/storage-stats`.
#[derive(Debug, Clone, Deserialize)]
struct CompressorStorageStats {
    #[serde(default)]
    used_space_mb: f64,
    #[serde(default = "default_total_mb")]
    total_space_mb: f64,
    #[serde(default)]
    available_mb: f64,
    #[serde(default)]
    usage_percent: f64,
    #[serde(default)]
    file_count: u64,
    #[serde(default = "default_warning_level")]
    warning_level: String,
}

fn default_total_mb() -> f64 { 512.0 }
fn default_warning_level() -> String { "normal".to_string() }

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StorageUsage {
    pub used_mb: f64,
    pub total_mb: f64,
    pub available_mb: f64,
    pub usage_percent: f64,
    pub file_count: u64,
    pub warning_level: String,
}

impl From<CompressorStorageStats> for StorageUsage {
    fn from(s: CompressorStorageStats) -> Self {
        Self {
            used_mb: s.used_space_mb,
            total_mb: s.total_space_mb,
            available_mb: s.available_mb,
            usage_percent: s.usage_percent,
            file_count: s.file_count,
            warning_level: s.warning_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HealthReport {
    pub timestamp: DateTime<Local>,
    pub overall_status: OverallStatus,
    pub database: DatabaseHealth,
    pub services: ServicesHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageUsage>,
}

/// Base URLs of the probed services, without trailing slash.
#[derive(Debug, Clone)]
pub struct DownstreamTargets {
    pub compressor_url: String,
    pub schedule_url: String,
}

#[derive(Clone)]
pub struct HealthAggregator {
    ledger: Arc<dyn LedgerStore>,
    calendar: Calendar,
    http: reqwest::Client,
    targets: DownstreamTargets,
    timeout: Duration,
}

impl HealthAggregator {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        calendar: Calendar,
        http: reqwest::Client,
        targets: DownstreamTargets,
        timeout: Duration,
    ) -> Self {
        Self { ledger, calendar, http, targets, timeout }
    }

    #[instrument(skip(self))]
    pub async fn compute(&self) -> HealthReport {
        let compressor_url = format!("{}/storage-stats", self.targets.compressor_url);
        let (database, (compressor, body), (schedule, _)) = tokio::join!(
            self.probe_database(),
            self.probe_http(COMPRESSOR, &compressor_url, &self.targets.compressor_url),
            self.probe_http(SCHEDULE, &self.targets.schedule_url, &self.targets.schedule_url),
        );

        let storage = body.and_then(|b| match serde_json::from_slice::<CompressorStorageStats>(&b) {
            Ok(s) => Some(StorageUsage::from(s)),
            Err(e) => {
                warn!(service = "health", event = "storage_stats_unparseable", error = %e);
                None
            }
        });

        let all_healthy = database.status == ProbeStatus::Healthy
            && compressor.status == ProbeStatus::Healthy
            && schedule.status == ProbeStatus::Healthy;
        let overall_status = if all_healthy { OverallStatus::Healthy } else { OverallStatus::Degraded };
        HEALTH_REPORTS_TOTAL
            .with_label_values(&[if all_healthy { "healthy" } else { "degraded" }])
            .inc();
        info!(service = "health", event = "report_computed", healthy = all_healthy);

        HealthReport {
            timestamp: Local::now(),
            overall_status,
            database,
            services: ServicesHealth { compressor, schedule },
            storage,
        }
    }

    async fn probe_database(&self) -> DatabaseHealth {
        match self.collect_database().await {
            Ok(h) => h,
            Err(e) => {
                warn!(service = "health", event = "database_probe_failed", error = %e);
                DatabaseHealth::unhealthy(e.to_string())
            }
        }
    }

    async fn collect_database(&self) -> Result<DatabaseHealth, ServiceError> {
        self.ledger.ping().await?;
        self.calendar.ping().await?;
        let total_tasks = self.ledger.count_tasks(&TaskFilter::all()).await?;
        let processing_tasks = self.ledger.count_tasks(&TaskFilter::status(TaskStatus::Processing)).await?;
        let waiting_tasks = self.ledger.count_tasks(&TaskFilter::status(TaskStatus::Waiting)).await?;
        let completed_today = self
            .ledger
            .count_tasks(&TaskFilter::status(TaskStatus::Completed).since(local_midnight_utc()))
            .await?;
        let holidays_count = self.calendar.count().await?;
        let stats = self.ledger.database_stats().await?;
        Ok(DatabaseHealth {
            status: ProbeStatus::Healthy,
            message: "connected".to_string(),
            total_tasks: Some(total_tasks),
            processing_tasks: Some(processing_tasks),
            waiting_tasks: Some(waiting_tasks),
            completed_today: Some(completed_today),
            holidays_count: Some(holidays_count),
            db_size_mb: Some(bytes_to_mb(stats.data_size_bytes)),
            collections_count: Some(stats.collections),
        })
    }

    /// GET `target`; returns the entry plus the body when the status was 200.
    async fn probe_http(&self, name: &str, target: &str, base: &str) -> (ServiceHealth, Option<Vec<u8>>) {
        let started = Instant::now();
        let result = self.http.get(target).timeout(self.timeout).send().await;
        let elapsed = started.elapsed();
        PROBE_DURATION.with_label_values(&[name]).observe(elapsed.as_secs_f64());
        let latency = round2(elapsed.as_secs_f64() * 1000.0);

        let (entry, body) = match result {
            Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                let body = match resp.bytes().await {
                    Ok(b) => Some(b.to_vec()),
                    Err(e) => {
                        warn!(service = "health", event = "probe_body_unreadable", target = name, error = %e);
                        None
                    }
                };
                (service_entry(ProbeStatus::Healthy, "service is up".to_string(), Some(latency), base), body)
            }
            Ok(resp) => (
                service_entry(ProbeStatus::Unhealthy, format!("HTTP {}", resp.status().as_u16()), Some(latency), base),
                None,
            ),
            Err(e) if e.is_timeout() => {
                (service_entry(ProbeStatus::Unhealthy, "connection timed out".to_string(), None, base), None)
            }
            Err(e) => (service_entry(ProbeStatus::Unhealthy, e.to_string(), None, base), None),
        };

        if entry.status == ProbeStatus::Unhealthy {
            PROBE_FAILURES_TOTAL.with_label_values(&[name]).inc();
            warn!(service = "health", event = "probe_unhealthy", target = name, message = %entry.message);
        }
        (entry, body)
    }
}

fn service_entry(status: ProbeStatus, message: String, response_time_ms: Option<f64>, url: &str) -> ServiceHealth {
    ServiceHealth { status, message, response_time_ms, url: url.to_string() }
}

/// Start of the current local day, as UTC.
pub fn local_midnight_utc() -> DateTime<Utc> {
    let now = Local::now();
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|m| m.and_local_timezone(Local).earliest())
        .map(|m| m.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}
