use crate::errors::{ApiResult, DomainError, DomainResult};
use crate::types::{Collection, ListQuery, Record};
use async_trait::async_trait;
use chrono::Utc;
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

/// Generic CRUD access to the remote store.
///
/// Implementations translate `ListQuery` into their own filter language and
/// return plain records; typing happens in the entity layer.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// List records matching every equality filter, the optional text search
    /// and the optional ordering.
    async fn list(&self, collection: Collection, query: &ListQuery) -> ApiResult<Vec<Record>>;

    /// Insert a record and return it as stored, with server-assigned fields.
    async fn create(&self, collection: Collection, record: Record) -> ApiResult<Record>;

    /// Patch the record with `id` and return it as stored.
    async fn update(&self, collection: Collection, id: Uuid, patch: Record) -> ApiResult<Record>;

    /// Delete the record with `id`.
    async fn delete(&self, collection: Collection, id: Uuid) -> ApiResult<bool>;

    /// Minimal read to check the store is reachable and the credentials work
    async fn test_connection(&self) -> bool {
        self.list(Collection::Projects, &ListQuery::new().limit(1))
            .await
            .is_ok()
    }
}

/// Set both timestamps on a record about to be inserted
pub fn stamp_created(record: &mut Record) {
    let now = Value::String(Utc::now().to_rfc3339());
    record.insert("created_at".to_string(), now.clone());
    record.insert("updated_at".to_string(), now);
}

/// Refresh `updated_at` on a patch
pub fn stamp_updated(record: &mut Record) {
    record.insert(
        "updated_at".to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
}

/// Decode a single record into a typed entity
pub fn decode_record<T: DeserializeOwned>(collection: Collection, record: Record) -> DomainResult<T> {
    serde_json::from_value(Value::Object(record)).map_err(|e| {
        DomainError::Serialization(format!(
            "Malformed {} record: {}",
            collection.entity_name(),
            e
        ))
    })
}

/// Decode a listing, skipping rows that do not fit the entity shape.
pub fn decode_records<T: DeserializeOwned>(collection: Collection, records: Vec<Record>) -> Vec<T> {
    let total = records.len();
    let decoded: Vec<T> = records
        .into_iter()
        .filter_map(|record| match decode_record(collection, record) {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!("Skipping row from {}: {}", collection, e);
                None
            }
        })
        .collect();

    if decoded.len() < total {
        warn!(
            "{} of {} {} rows could not be decoded",
            total - decoded.len(),
            total,
            collection
        );
    }
    decoded
}

/// List and decode in one step
pub async fn fetch_all<T: DeserializeOwned>(
    repo: &dyn RepositoryClient,
    collection: Collection,
    query: &ListQuery,
) -> ApiResult<Vec<T>> {
    let records = repo.list(collection, query).await?;
    Ok(decode_records(collection, records))
}


#[cfg(test)]
mod tests {
    use super::testing::InMemoryRepository;
    use super::*;
    use crate::types::SortDirection;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Named {
        id: Uuid,
        name: String,
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let repo = InMemoryRepository::new();
        repo.seed(
            Collection::Projects,
            vec![
                json!({"id": Uuid::new_v4(), "name": "Water wells", "responsible": "Awa", "status": "active", "created_at": "2024-01-01"}),
                json!({"id": Uuid::new_v4(), "name": "School meals", "responsible": "Moussa", "status": "active", "created_at": "2024-02-01"}),
                json!({"id": Uuid::new_v4(), "name": "Clinic", "responsible": "Awa", "status": "completed", "created_at": "2024-03-01"}),
            ],
        );

        let query = ListQuery::new()
            .eq("status", "active")
            .search(&["name", "responsible"], "AWA")
            .order_by("created_at", SortDirection::Descending);
        let rows = repo.list(Collection::Projects, &query).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Water wells");

        let all = ListQuery::new().order_by("created_at", SortDirection::Descending);
        let rows = repo.list(Collection::Projects, &all).await.unwrap();
        assert_eq!(rows[0]["name"], "Clinic");
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let repo = InMemoryRepository::new();
        let mut record = Record::new();
        record.insert("name".to_string(), json!("Clinic"));

        let stored = repo.create(Collection::Projects, record).await.unwrap();
        assert!(stored.contains_key("id"));
        assert!(stored.contains_key("created_at"));
        assert!(stored.contains_key("updated_at"));
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let repo = InMemoryRepository::new();
        let result = repo.update(Collection::Projects, Uuid::new_v4(), Record::new()).await;
        assert!(matches!(result, Err(crate::errors::ApiError::NotFound(..))));
    }

    #[tokio::test]
    async fn test_project_delete_cascades() {
        let repo = InMemoryRepository::new();
        let project_id = Uuid::new_v4();
        repo.seed(Collection::Projects, vec![json!({"id": project_id, "name": "Clinic"})]);
        repo.seed(Collection::Activities, vec![json!({"id": Uuid::new_v4(), "project_id": project_id})]);
        repo.seed(Collection::Beneficiaries, vec![json!({"id": Uuid::new_v4(), "project_id": project_id})]);

        assert!(repo.delete(Collection::Projects, project_id).await.unwrap());
        assert!(repo.rows(Collection::Activities).is_empty());
        assert_eq!(repo.rows(Collection::Beneficiaries)[0]["project_id"], Value::Null);
    }

    #[tokio::test]
    async fn test_fetch_all_skips_malformed_rows() {
        let repo = InMemoryRepository::new();
        repo.seed(
            Collection::Projects,
            vec![
                json!({"id": Uuid::new_v4(), "name": "Clinic"}),
                json!({"id": "not-a-uuid", "name": "Broken"}),
            ],
        );

        let rows: Vec<Named> = fetch_all(&repo, Collection::Projects, &ListQuery::new()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Clinic");
        assert!(!rows[0].id.is_nil());
    }

    #[tokio::test]
    async fn test_connection_reflects_failures() {
        let repo = InMemoryRepository::new();
        assert!(repo.test_connection().await);
        repo.fail(Collection::Projects);
        assert!(!repo.test_connection().await);
    }
}
