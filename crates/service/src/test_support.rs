#![cfg(test)]
use axum::Router;
use chrono::{DateTime, Utc};
use migration::MigratorTrait;
use sea_orm::DatabaseConnection;
use tokio::sync::OnceCell;
use uuid::Uuid;

use configs::DatabaseConfig;
use models::blob_file::DEFAULT_CHUNK_SIZE;
use models::db::{connect_with_config, DATABASE_URL};
use models::task::{TaskStatus, KIND_COMPRESS};
use models::value::{FieldValue, Fields};

use crate::store::memory::MemoryStore;
use crate::store::TaskRecord;

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<()> = OnceCell::const_new();

pub fn db_tests_enabled() -> bool {
    std::env::var("DATABASE_URL").is_ok() && std::env::var("SKIP_DB_TESTS").is_err()
}

fn test_db_config() -> DatabaseConfig {
    DatabaseConfig { url: DATABASE_URL.to_string(), min_connections: 1, max_connections: 10, ..DatabaseConfig::default() }
}

pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    MIGRATED
        .get_or_init(|| async {
            let db = connect_with_config(&test_db_config()).await.expect("connect db for migration");
            migration::Migrator::up(&db, None).await.expect("migrate up");
            drop(db);
        })
        .await;

    // Fresh connection for the current test's runtime
    Ok(connect_with_config(&test_db_config()).await?)
}

pub fn task_at(status: TaskStatus, created_at: DateTime<Utc>) -> TaskRecord {
    TaskRecord {
        id: Uuid::new_v4(),
        kind: KIND_COMPRESS.to_string(),
        status,
        created_at,
        params: Fields::new(),
        result_filename: None,
        result_file_id: None,
        ip_address: None,
    }
}

/// Completed compress task with a stored result payload of `size` bytes.
pub async fn completed_with_blob(
    mem: &MemoryStore,
    created_at: DateTime<Utc>,
    size: usize,
    result_filename: Option<&str>,
) -> TaskRecord {
    let blob = mem.put_blob(&vec![0u8; size], DEFAULT_CHUNK_SIZE).await;
    let mut t = task_at(TaskStatus::Completed, created_at);
    t.params.insert("raw_filename".into(), FieldValue::from("raw.png"));
    t.result_filename = result_filename.map(str::to_string);
    t.result_file_id = Some(blob);
    mem.insert_task(t.clone()).await;
    t
}

/// Serve `app` on an ephemeral local port and return its base URL.
pub async fn spawn_stub(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Base URL of a port that was just released, so connections are refused.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind probe port");
    let addr = listener.local_addr().expect("probe addr");
    drop(listener);
    format!("http://{addr}")
}
