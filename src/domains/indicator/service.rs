use crate::domains::core::feedback::{Confirmer, Notifier};
use crate::domains::core::manager::{ChangeEvent, EntityManager};
use crate::domains::core::repository::RepositoryClient;
use crate::domains::indicator::types::{Indicator, IndicatorDraft, IndicatorFilter};
use crate::errors::{DomainResult, ServiceResult};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

pub struct IndicatorService {
    manager: EntityManager<Indicator>,
}

impl IndicatorService {
    pub fn new(
        repo: Arc<dyn RepositoryClient>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<ChangeEvent>,
    ) -> Self {
        Self {
            manager: EntityManager::new(repo, notifier, events),
        }
    }

    pub async fn load(&mut self) -> ServiceResult<usize> {
        self.manager.load().await
    }

    pub fn indicators(&self) -> &[Indicator] {
        self.manager.items()
    }

    pub fn list(&self, filter: &IndicatorFilter) -> Vec<&Indicator> {
        self.manager.filter(filter)
    }

    /// Lookup by code, case-insensitive
    pub fn by_code(&self, code: &str) -> Option<&Indicator> {
        self.indicators()
            .iter()
            .find(|i| i.code.eq_ignore_ascii_case(code.trim()))
    }

    pub fn edit_draft(&self, id: Uuid) -> DomainResult<IndicatorDraft> {
        self.manager.find(id).map(IndicatorDraft::from)
    }

    pub async fn save(&mut self, draft: &IndicatorDraft) -> ServiceResult<Indicator> {
        self.manager.save(draft).await
    }

    pub async fn remove(&mut self, id: Uuid, confirmer: &dyn Confirmer) -> ServiceResult<bool> {
        self.manager.remove(id, confirmer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::core::feedback::NotificationQueue;
    use crate::domains::core::repository::testing::InMemoryRepository;

    #[tokio::test]
    async fn test_save_and_lookup_by_code() {
        let repo = Arc::new(InMemoryRepository::new());
        let (tx, _rx) = broadcast::channel(4);
        let mut service = IndicatorService::new(repo, Arc::new(NotificationQueue::new()), tx);

        let draft = IndicatorDraft {
            code: "women_reached".to_string(),
            name: "Women reached".to_string(),
            target_value: "750".to_string(),
            ..Default::default()
        };
        let saved = service.save(&draft).await.unwrap();

        assert_eq!(service.by_code("WOMEN_REACHED").map(|i| i.id), Some(saved.id));
        assert_eq!(service.list(&IndicatorFilter { search: "reach".to_string() }).len(), 1);
        assert_eq!(service.edit_draft(saved.id).unwrap().target_value, "750");
    }
}
