use std::sync::Arc;

use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::store::{CalendarStore, HolidayDocument, UpsertOutcome};

/// Validate `year`/`month` and build the six-character id prefix, e.g. `202501`.
pub fn month_prefix(year: Option<&str>, month: Option<&str>) -> Result<String, ServiceError> {
    let (Some(year), Some(month)) = (year.map(str::trim), month.map(str::trim)) else {
        return Err(ServiceError::invalid("year and month are required"));
    };
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ServiceError::invalid(format!("year must be four digits, got {year:?}")));
    }
    let month: u32 = month
        .parse()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ServiceError::invalid(format!("month must be 1..=12, got {month:?}")))?;
    Ok(format!("{year}{month:02}"))
}

/// Holiday records keyed by `YYYYMMDD`.
#[derive(Clone)]
pub struct Calendar {
    store: Arc<dyn CalendarStore>,
}

impl Calendar {
    pub fn new(store: Arc<dyn CalendarStore>) -> Self { Self { store } }

    #[instrument(skip(self))]
    pub async fn query(&self, year: Option<&str>, month: Option<&str>) -> Result<Vec<HolidayDocument>, ServiceError> {
        let prefix = month_prefix(year, month)?;
        self.store.find_by_prefix(&prefix).await
    }

    #[instrument(skip(self, doc), fields(id = %doc.id))]
    pub async fn upsert(&self, doc: HolidayDocument) -> Result<UpsertOutcome, ServiceError> {
        if doc.id.trim().is_empty() {
            return Err(ServiceError::invalid("missing _id"));
        }
        let outcome = self.store.upsert_merge(doc).await?;
        info!(service = "calendar", event = "holiday_upserted", outcome = outcome.as_str());
        Ok(outcome)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> { self.store.count().await }

    pub async fn ping(&self) -> Result<(), ServiceError> { self.store.ping().await }
}

/// Human-readable message for an upsert result.
pub fn outcome_message(outcome: UpsertOutcome) -> &'static str {
    if outcome.changed() { "holiday saved" } else { "no change" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use models::value::{FieldValue, Fields};

    fn doc(id: &str, name: &str) -> HolidayDocument {
        let mut fields = Fields::new();
        fields.insert("name".into(), FieldValue::from(name));
        HolidayDocument { id: id.into(), fields }
    }

    #[test]
    fn prefix_pads_month() {
        assert_eq!(month_prefix(Some("2025"), Some("1")).unwrap(), "202501");
        assert_eq!(month_prefix(Some("2025"), Some("12")).unwrap(), "202512");
        assert_eq!(month_prefix(Some("2025"), Some("03")).unwrap(), "202503");
    }

    #[test]
    fn prefix_rejects_bad_input() {
        for (y, m) in [
            (None, Some("1")),
            (Some("2025"), None),
            (Some("25"), Some("1")),
            (Some("20x5"), Some("1")),
            (Some("2025"), Some("0")),
            (Some("2025"), Some("13")),
            (Some("2025"), Some("jan")),
        ] {
            assert!(month_prefix(y, m).unwrap_err().is_client_error(), "{y:?}/{m:?}");
        }
    }

    #[tokio::test]
    async fn query_returns_only_that_month() {
        let mem = MemoryStore::new();
        let cal = Calendar::new(Arc::new(mem));
        cal.upsert(doc("20250101", "New Year")).await.unwrap();
        cal.upsert(doc("20250129", "Lunar New Year")).await.unwrap();
        cal.upsert(doc("20250201", "other")).await.unwrap();
        cal.upsert(doc("20240101", "last year")).await.unwrap();

        let jan = cal.query(Some("2025"), Some("1")).await.unwrap();
        let ids: Vec<_> = jan.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["20250101", "20250129"]);
        assert_eq!(cal.count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn upsert_reports_created_unchanged_modified() {
        let mem = MemoryStore::new();
        let cal = Calendar::new(Arc::new(mem.clone()));
        assert_eq!(cal.upsert(doc("20250501", "Labour Day")).await.unwrap(), UpsertOutcome::Created);
        assert_eq!(cal.upsert(doc("20250501", "Labour Day")).await.unwrap(), UpsertOutcome::Unchanged);

        let mut extra = Fields::new();
        extra.insert("isOffDay".into(), FieldValue::Bool(true));
        let out = cal.upsert(HolidayDocument { id: "20250501".into(), fields: extra }).await.unwrap();
        assert_eq!(out, UpsertOutcome::Modified);

        let stored = mem.holiday("20250501").await.unwrap();
        assert_eq!(stored.fields["name"], FieldValue::from("Labour Day"));
        assert_eq!(stored.fields["isOffDay"], FieldValue::Bool(true));
    }

    #[tokio::test]
    async fn upsert_requires_id() {
        let cal = Calendar::new(Arc::new(MemoryStore::new()));
        assert!(cal.upsert(doc(" ", "x")).await.unwrap_err().is_client_error());
    }

    #[test]
    fn messages() {
        assert_eq!(outcome_message(UpsertOutcome::Created), "holiday saved");
        assert_eq!(outcome_message(UpsertOutcome::Unchanged), "no change");
    }
}
