use crate::domains::core::feedback::{messages, ConfirmPrompt, Confirmer, Notifier};
use crate::domains::core::repository::{decode_record, fetch_all, RepositoryClient};
use crate::domains::export::{export_table, ExportFile, ExportFormat};
use crate::errors::{DomainError, ServiceError, ServiceResult};
use crate::types::{Collection, ListQuery, Record};
use crate::validation::Validate;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// An entity type kept in a remote collection
pub trait ManagedEntity: DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    /// Form-side representation used to create or edit the entity
    type Draft: EntityDraft;

    fn id(&self) -> Uuid;

    /// Short human label, used in prompts
    fn label(&self) -> String;

    /// Query used for the full listing, including its default order
    fn list_query() -> ListQuery;
}

/// Unsaved form values for an entity
pub trait EntityDraft: Validate + Send + Sync {
    /// `Some` when editing an existing record
    fn id(&self) -> Option<Uuid>;

    /// Typed record to send to the store. Only called after `validate` passed.
    fn to_record(&self) -> crate::errors::DomainResult<Record>;
}

/// Local predicate over loaded entities
pub trait EntityFilter<E> {
    fn matches(&self, item: &E) -> bool;
}

/// Emitted after a successful mutation so dependent views can refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Saved { collection: Collection, id: Uuid },
    Removed { collection: Collection, id: Uuid },
}

impl ChangeEvent {
    pub fn collection(&self) -> Collection {
        match self {
            ChangeEvent::Saved { collection, .. } | ChangeEvent::Removed { collection, .. } => *collection,
        }
    }
}

/// Loads, filters and mutates one entity collection.
///
/// Every mutation validates locally first, then calls the store, reloads the
/// listing and publishes a `ChangeEvent`.
pub struct EntityManager<E: ManagedEntity> {
    repo: Arc<dyn RepositoryClient>,
    notifier: Arc<dyn Notifier>,
    events: broadcast::Sender<ChangeEvent>,
    items: Vec<E>,
    loaded: bool,
}

impl<E: ManagedEntity> EntityManager<E> {
    pub fn new(
        repo: Arc<dyn RepositoryClient>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<ChangeEvent>,
    ) -> Self {
        Self {
            repo,
            notifier,
            events,
            items: Vec::new(),
            loaded: false,
        }
    }

    pub fn items(&self) -> &[E] {
        &self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn repository(&self) -> Arc<dyn RepositoryClient> {
        self.repo.clone()
    }

    pub fn notifier(&self) -> Arc<dyn Notifier> {
        self.notifier.clone()
    }

    /// Replace the cached listing with the store's contents.
    /// On failure the previous listing is kept.
    pub async fn load(&mut self) -> ServiceResult<usize> {
        match fetch_all::<E>(self.repo.as_ref(), E::COLLECTION, &E::list_query()).await {
            Ok(items) => {
                debug!("Loaded {} {}", items.len(), E::COLLECTION);
                self.items = items;
                self.loaded = true;
                Ok(self.items.len())
            }
            Err(e) => {
                warn!("Failed to load {}: {}", E::COLLECTION, e);
                self.notifier.error(messages::LOAD_FAILED);
                Err(e.into())
            }
        }
    }

    /// Server-side filtered listing. Does not touch the cache.
    pub async fn query(&self, query: &ListQuery) -> ServiceResult<Vec<E>> {
        Ok(fetch_all::<E>(self.repo.as_ref(), E::COLLECTION, query).await?)
    }

    pub fn filter<F: EntityFilter<E>>(&self, filter: &F) -> Vec<&E> {
        self.items.iter().filter(|item| filter.matches(item)).collect()
    }

    pub fn find(&self, id: Uuid) -> Result<&E, DomainError> {
        self.items
            .iter()
            .find(|item| item.id() == id)
            .ok_or_else(|| DomainError::EntityNotFound(E::COLLECTION.entity_name().to_string(), id))
    }

    /// Validate the draft and create or update the record.
    pub async fn save(&mut self, draft: &E::Draft) -> ServiceResult<E> {
        let record = match draft.validate().and_then(|_| draft.to_record()) {
            Ok(record) => record,
            Err(e) => {
                debug!("Rejected {} draft: {}", E::COLLECTION.entity_name(), e);
                self.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        let result = match draft.id() {
            Some(id) => self.repo.update(E::COLLECTION, id, record).await,
            None => self.repo.create(E::COLLECTION, record).await,
        };
        let stored = match result {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to save {}: {}", E::COLLECTION.entity_name(), e);
                self.notifier.error(messages::SAVE_FAILED);
                return Err(e.into());
            }
        };

        let entity: E = decode_record(E::COLLECTION, stored).map_err(ServiceError::Domain)?;
        let id = entity.id();
        info!("Saved {} {}", E::COLLECTION.entity_name(), id);
        self.notifier.success(if draft.id().is_some() {
            messages::UPDATE_SUCCESS
        } else {
            messages::SAVE_SUCCESS
        });

        if self.load().await.is_err() {
            // Keep the saved row visible even when the reload failed
            self.upsert_local(entity.clone());
        }
        let _ = self.events.send(ChangeEvent::Saved {
            collection: E::COLLECTION,
            id,
        });
        Ok(entity)
    }

    /// Ask for confirmation, then delete. Returns `Ok(false)` when declined.
    pub async fn remove(&mut self, id: Uuid, confirmer: &dyn Confirmer) -> ServiceResult<bool> {
        let label = self.find(id)?.label();
        let prompt = ConfirmPrompt::delete(E::COLLECTION.entity_name(), &label);
        if !confirmer.confirm(&prompt) {
            debug!("Deletion of {} {} cancelled", E::COLLECTION.entity_name(), id);
            return Ok(false);
        }

        match self.repo.delete(E::COLLECTION, id).await {
            Ok(true) => {}
            Ok(false) => {
                self.notifier.error(messages::DELETE_FAILED);
                return Ok(false);
            }
            Err(e) => {
                warn!("Failed to delete {} {}: {}", E::COLLECTION.entity_name(), id, e);
                self.notifier.error(messages::DELETE_FAILED);
                return Err(e.into());
            }
        }

        info!("Deleted {} {}", E::COLLECTION.entity_name(), id);
        self.notifier.success(messages::DELETE_SUCCESS);
        if self.load().await.is_err() {
            self.items.retain(|item| item.id() != id);
        }
        let _ = self.events.send(ChangeEvent::Removed {
            collection: E::COLLECTION,
            id,
        });
        Ok(true)
    }

    /// `<collection>_<date>.csv` from prepared export rows. An empty listing
    /// is refused and reported to the user.
    pub fn export_csv(&self, rows: Vec<Record>, today: NaiveDate) -> ServiceResult<ExportFile> {
        if rows.is_empty() {
            self.notifier.error(messages::NOTHING_TO_EXPORT);
            return Err(ServiceError::Export(format!("No {} to export", E::COLLECTION)));
        }

        match export_table(&rows) {
            Ok(contents) => {
                info!("Exported {} {} rows", rows.len(), E::COLLECTION);
                self.notifier.success(messages::EXPORT_SUCCESS);
                Ok(ExportFile::new(E::COLLECTION.as_str(), today, ExportFormat::Csv, contents))
            }
            Err(e) => {
                warn!("{} export failed: {}", E::COLLECTION.entity_name(), e);
                self.notifier.error(messages::EXPORT_FAILED);
                Err(e)
            }
        }
    }

    fn upsert_local(&mut self, entity: E) {
        match self.items.iter_mut().find(|item| item.id() == entity.id()) {
            Some(slot) => *slot = entity,
            None => self.items.insert(0, entity),
        }
    }
}

#[cfg(test)]
pub mod test_support {
    //! A minimal entity used to exercise the manager in isolation.

    use super::*;
    use crate::errors::DomainResult;
    use crate::validation::common;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Deserialize)]
    pub struct Note {
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Debug, Clone, Default)]
    pub struct NoteDraft {
        pub id: Option<Uuid>,
        pub name: String,
    }

    impl Validate for NoteDraft {
        fn validate(&self) -> DomainResult<()> {
            common::require("name", &self.name)
        }
    }

    impl EntityDraft for NoteDraft {
        fn id(&self) -> Option<Uuid> {
            self.id
        }

        fn to_record(&self) -> DomainResult<Record> {
            let mut record = Record::new();
            record.insert("name".to_string(), json!(self.name.trim()));
            Ok(record)
        }
    }

    impl ManagedEntity for Note {
        const COLLECTION: Collection = Collection::Partners;
        type Draft = NoteDraft;

        fn id(&self) -> Uuid {
            self.id
        }

        fn label(&self) -> String {
            self.name.clone()
        }

        fn list_query() -> ListQuery {
            ListQuery::new().order_by("name", crate::types::SortDirection::Ascending)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{Note, NoteDraft};
    use super::*;
    use crate::domains::core::feedback::{AutoConfirm, NotificationLevel, NotificationQueue};
    use crate::domains::core::repository::testing::InMemoryRepository;
    use crate::errors::ErrorKind;

    fn manager() -> (EntityManager<Note>, Arc<InMemoryRepository>, Arc<NotificationQueue>, broadcast::Receiver<ChangeEvent>) {
        let repo = Arc::new(InMemoryRepository::new());
        let queue = Arc::new(NotificationQueue::new());
        let (tx, rx) = broadcast::channel(16);
        (EntityManager::new(repo.clone(), queue.clone(), tx), repo, queue, rx)
    }

    #[tokio::test]
    async fn test_invalid_draft_never_reaches_the_store() {
        let (mut manager, repo, queue, _rx) = manager();
        let err = manager.save(&NoteDraft::default()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(repo.calls(), 0);
        assert_eq!(queue.drain()[0].level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_save_creates_reloads_and_publishes() {
        let (mut manager, repo, queue, mut rx) = manager();
        let draft = NoteDraft { id: None, name: "  Red Cross ".to_string() };

        let saved = manager.save(&draft).await.unwrap();
        assert_eq!(saved.name, "Red Cross");
        assert_eq!(manager.items().len(), 1);
        assert_eq!(repo.rows(Collection::Partners).len(), 1);
        assert_eq!(queue.drain()[0].message, messages::SAVE_SUCCESS);
        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent::Saved { collection: Collection::Partners, id: saved.id }
        );
    }

    #[tokio::test]
    async fn test_update_keeps_identity() {
        let (mut manager, _repo, queue, _rx) = manager();
        let saved = manager.save(&NoteDraft { id: None, name: "A".to_string() }).await.unwrap();
        queue.drain();

        let updated = manager
            .save(&NoteDraft { id: Some(saved.id), name: "B".to_string() })
            .await
            .unwrap();
        assert_eq!(updated.id, saved.id);
        assert_eq!(manager.find(saved.id).unwrap().name, "B");
        assert_eq!(queue.drain()[0].message, messages::UPDATE_SUCCESS);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_items() {
        let (mut manager, repo, _queue, _rx) = manager();
        manager.save(&NoteDraft { id: None, name: "A".to_string() }).await.unwrap();

        repo.fail(Collection::Partners);
        let err = manager.load().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(manager.items().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_requires_confirmation() {
        let (mut manager, repo, _queue, mut rx) = manager();
        let saved = manager.save(&NoteDraft { id: None, name: "A".to_string() }).await.unwrap();
        let _ = rx.try_recv();

        assert!(!manager.remove(saved.id, &AutoConfirm(false)).await.unwrap());
        assert_eq!(repo.delete_calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        assert!(manager.remove(saved.id, &AutoConfirm(true)).await.unwrap());
        assert!(manager.items().is_empty());
        assert_eq!(
            rx.try_recv().unwrap(),
            ChangeEvent::Removed { collection: Collection::Partners, id: saved.id }
        );
    }

    #[tokio::test]
    async fn test_find_unknown_id() {
        let (manager, _repo, _queue, _rx) = manager();
        assert!(matches!(manager.find(Uuid::new_v4()), Err(DomainError::EntityNotFound(..))));
    }
}
