use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Statement, TransactionTrait,
};

use models::value::fields_from_json;
use models::{blob_chunk, blob_file, holiday, task};

use super::domain::{merge_fields, BlobId, DatabaseStats, HolidayDocument, TaskId, TaskRecord, UpsertOutcome};
use super::repository::{CalendarStore, LedgerStore, TaskFilter};
use crate::errors::ServiceError;

const TOTAL_BLOB_BYTES_SQL: &str = "SELECT COALESCE(SUM(length), 0)::BIGINT AS total FROM blob_file";

const DATABASE_STATS_SQL: &str = "SELECT pg_database_size(current_database())::BIGINT AS data_size, \
     (SELECT COUNT(*) FROM information_schema.tables \
      WHERE table_schema = current_schema() AND table_type = 'BASE TABLE')::BIGINT AS collections";

/// Postgres-backed store for both the ledger and the calendar.
#[derive(Clone)]
pub struct SeaOrmStore {
    pub db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn scalar_i64(&self, sql: &str, col: &str) -> Result<i64, ServiceError> {
        let row = self
            .db
            .query_one(Statement::from_string(DatabaseBackend::Postgres, sql.to_string()))
            .await
            .map_err(ServiceError::store)?
            .ok_or_else(|| ServiceError::store("aggregate returned no row"))?;
        row.try_get::<i64>("", col).map_err(ServiceError::store)
    }
}

fn task_condition(f: &TaskFilter) -> Condition {
    let mut cond = Condition::all();
    if let Some(kind) = &f.kind {
        cond = cond.add(task::Column::Kind.eq(kind.clone()));
    }
    if !f.statuses.is_empty() {
        cond = cond.add(task::Column::Status.is_in(f.statuses.clone()));
    }
    if let Some(since) = f.created_since {
        cond = cond.add(task::Column::CreatedAt.gte(since));
    }
    if f.with_result_file {
        cond = cond.add(task::Column::ResultFileId.is_not_null());
    }
    cond
}

fn to_record(m: task::Model) -> Result<TaskRecord, ServiceError> {
    let params = fields_from_json(m.params).map_err(|e| ServiceError::Corrupt(format!("task {}: {e}", m.id)))?;
    Ok(TaskRecord {
        id: m.id,
        kind: m.kind,
        status: m.status,
        created_at: m.created_at.with_timezone(&Utc),
        params,
        result_filename: m.result_filename,
        result_file_id: m.result_file_id,
        ip_address: m.ip_address,
    })
}

fn to_document(m: holiday::Model) -> Result<HolidayDocument, ServiceError> {
    let id = m.id.clone();
    HolidayDocument::try_from(m).map_err(|e| ServiceError::Corrupt(format!("holiday {id}: {e}")))
}

#[async_trait]
impl LedgerStore for SeaOrmStore {
    async fn ping(&self) -> Result<(), ServiceError> {
        self.db.ping().await.map_err(ServiceError::store)
    }

    async fn count_tasks(&self, filter: &TaskFilter) -> Result<u64, ServiceError> {
        task::Entity::find()
            .filter(task_condition(filter))
            .count(&self.db)
            .await
            .map_err(ServiceError::store)
    }

    async fn find_tasks(&self, filter: &TaskFilter, skip: u64, limit: u64) -> Result<Vec<TaskRecord>, ServiceError> {
        let rows = task::Entity::find()
            .filter(task_condition(filter))
            .order_by_desc(task::Column::CreatedAt)
            .order_by_desc(task::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(ServiceError::store)?;
        rows.into_iter().map(to_record).collect()
    }

    async fn find_tasks_by_ids(&self, ids: &[TaskId]) -> Result<Vec<TaskRecord>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = task::Entity::find()
            .filter(task::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(ServiceError::store)?;
        rows.into_iter().map(to_record).collect()
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool, ServiceError> {
        let res = task::Entity::delete_by_id(id).exec(&self.db).await.map_err(ServiceError::store)?;
        Ok(res.rows_affected > 0)
    }

    async fn blob_length(&self, id: BlobId) -> Result<Option<u64>, ServiceError> {
        let found = blob_file::Entity::find_by_id(id).one(&self.db).await.map_err(ServiceError::store)?;
        Ok(found.map(|f| f.length.max(0) as u64))
    }

    async fn total_blob_bytes(&self) -> Result<u64, ServiceError> {
        Ok(self.scalar_i64(TOTAL_BLOB_BYTES_SQL, "total").await?.max(0) as u64)
    }

    async fn delete_blob(&self, id: BlobId) -> Result<(), ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::store)?;
        blob_chunk::Entity::delete_many()
            .filter(blob_chunk::Column::FilesId.eq(id))
            .exec(&txn)
            .await
            .map_err(ServiceError::store)?;
        blob_file::Entity::delete_by_id(id).exec(&txn).await.map_err(ServiceError::store)?;
        txn.commit().await.map_err(ServiceError::store)
    }

    async fn database_stats(&self) -> Result<DatabaseStats, ServiceError> {
        let row = self
            .db
            .query_one(Statement::from_string(DatabaseBackend::Postgres, DATABASE_STATS_SQL.to_string()))
            .await
            .map_err(ServiceError::store)?
            .ok_or_else(|| ServiceError::store("database stats returned no row"))?;
        let data_size: i64 = row.try_get("", "data_size").map_err(ServiceError::store)?;
        let collections: i64 = row.try_get("", "collections").map_err(ServiceError::store)?;
        Ok(DatabaseStats { data_size_bytes: data_size.max(0) as u64, collections: collections.max(0) as u64 })
    }
}

#[async_trait]
impl CalendarStore for SeaOrmStore {
    async fn ping(&self) -> Result<(), ServiceError> {
        self.db.ping().await.map_err(ServiceError::store)
    }

    async fn find_by_prefix(&self, prefix: &str) -> Result<Vec<HolidayDocument>, ServiceError> {
        let rows = holiday::Entity::find()
            .filter(holiday::Column::Id.starts_with(prefix))
            .order_by_asc(holiday::Column::Id)
            .all(&self.db)
            .await
            .map_err(ServiceError::store)?;
        rows.into_iter().map(to_document).collect()
    }

    async fn upsert_merge(&self, doc: HolidayDocument) -> Result<UpsertOutcome, ServiceError> {
        let txn = self.db.begin().await.map_err(ServiceError::store)?;
        let existing = holiday::Entity::find_by_id(doc.id.clone())
            .one(&txn)
            .await
            .map_err(ServiceError::store)?;

        let outcome = match existing {
            None => {
                holiday::Entity::insert(holiday::active_model(&doc.id, &doc.fields))
                    .exec(&txn)
                    .await
                    .map_err(ServiceError::store)?;
                UpsertOutcome::Created
            }
            Some(row) => {
                let current = to_document(row)?;
                let (merged, changed) = merge_fields(&current.fields, doc.fields);
                if !changed {
                    UpsertOutcome::Unchanged
                } else {
                    holiday::Entity::update(holiday::active_model(&doc.id, &merged))
                        .exec(&txn)
                        .await
                        .map_err(ServiceError::store)?;
                    UpsertOutcome::Modified
                }
            }
        };

        txn.commit().await.map_err(ServiceError::store)?;
        Ok(outcome)
    }

    async fn count(&self) -> Result<u64, ServiceError> {
        holiday::Entity::find().count(&self.db).await.map_err(ServiceError::store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{db_tests_enabled, get_db};
    use models::task::{NewTask, TaskStatus};
    use models::value::{FieldValue, Fields};

    #[tokio::test]
    async fn delete_blob_removes_metadata_and_chunks() -> Result<(), anyhow::Error> {
        if !db_tests_enabled() { return Ok(()); }
        let db = get_db().await?;
        let store = SeaOrmStore::new(db.clone());

        let blob = blob_file::store(&db, Some("a.zip"), &[1u8; 9], 4).await?;
        assert_eq!(store.blob_length(blob.id).await?, Some(9));

        store.delete_blob(blob.id).await?;
        assert_eq!(store.blob_length(blob.id).await?, None);
        let chunks = blob_chunk::Entity::find()
            .filter(blob_chunk::Column::FilesId.eq(blob.id))
            .count(&db)
            .await?;
        assert_eq!(chunks, 0);

        // absent blob is a no-op
        store.delete_blob(blob.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn filters_and_deletes_tasks() -> Result<(), anyhow::Error> {
        if !db_tests_enabled() { return Ok(()); }
        let db = get_db().await?;
        let store = SeaOrmStore::new(db.clone());

        let kind = format!("test-{}", uuid::Uuid::new_v4());
        let created = task::create(&db, NewTask {
            kind: kind.clone(),
            status: TaskStatus::Failed,
            created_at: Utc::now(),
            params: Fields::new(),
            result_filename: None,
            result_file_id: None,
            ip_address: None,
        })
        .await?;

        let filter = TaskFilter { kind: Some(kind.clone()), statuses: vec![TaskStatus::Failed], ..TaskFilter::default() };
        assert_eq!(store.count_tasks(&filter).await?, 1);
        let found = store.find_tasks(&filter, 0, 10).await?;
        assert_eq!(found[0].id, created.id);

        assert!(store.delete_task(created.id).await?);
        assert!(!store.delete_task(created.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_merge_reports_outcomes() -> Result<(), anyhow::Error> {
        if !db_tests_enabled() { return Ok(()); }
        let db = get_db().await?;
        let store = SeaOrmStore::new(db.clone());

        let id = format!("9{:07}", uuid::Uuid::new_v4().as_u128() % 10_000_000);
        let mut fields = Fields::new();
        fields.insert("name".into(), FieldValue::from("Founders Day"));
        let doc = HolidayDocument { id: id.clone(), fields };

        assert_eq!(store.upsert_merge(doc.clone()).await?, UpsertOutcome::Created);
        assert_eq!(store.upsert_merge(doc.clone()).await?, UpsertOutcome::Unchanged);

        let mut extra = Fields::new();
        extra.insert("off".into(), FieldValue::Bool(true));
        let out = store.upsert_merge(HolidayDocument { id: id.clone(), fields: extra }).await?;
        assert_eq!(out, UpsertOutcome::Modified);

        let docs = store.find_by_prefix(&id).await?;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields.len(), 2);

        holiday::Entity::delete_by_id(id).exec(&db).await?;
        Ok(())
    }
}
