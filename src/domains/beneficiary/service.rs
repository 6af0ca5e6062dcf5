use crate::domains::activity::types::{Activity, MISSING_REFERENCE};
use crate::domains::aggregation::{age_stats, count_by};
use crate::domains::beneficiary::types::{
    export_records, Beneficiary, BeneficiaryDetail, BeneficiaryDraft, BeneficiaryFilter, BeneficiaryListItem, BeneficiaryStats,
};
use crate::domains::core::feedback::{messages, Confirmer, Notifier};
use crate::domains::core::manager::{ChangeEvent, EntityManager, ManagedEntity};
use crate::domains::core::repository::{fetch_all, RepositoryClient};
use crate::domains::export::ExportFile;
use crate::domains::project::types::Project;
use crate::errors::{DomainResult, ServiceError, ServiceResult};
use crate::format::format_optional_date;
use crate::types::{Collection, Fetched, Record};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Beneficiary registry with project and activity names resolved
pub struct BeneficiaryService {
    manager: EntityManager<Beneficiary>,
    project_names: HashMap<Uuid, String>,
    activity_names: HashMap<Uuid, String>,
}

impl BeneficiaryService {
    pub fn new(
        repo: Arc<dyn RepositoryClient>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<ChangeEvent>,
    ) -> Self {
        Self {
            manager: EntityManager::new(repo, notifier, events),
            project_names: HashMap::new(),
            activity_names: HashMap::new(),
        }
    }

    /// Load beneficiaries, projects and activities concurrently. Reference
    /// lookups that fail leave names missing instead of failing the load.
    pub async fn load(&mut self) -> ServiceResult<usize> {
        let repo = self.manager.repository();
        let project_query = Project::list_query();
        let activity_query = Activity::list_query();
        let (beneficiaries, projects, activities) = futures::join!(
            self.manager.load(),
            fetch_all::<Project>(repo.as_ref(), Collection::Projects, &project_query),
            fetch_all::<Activity>(repo.as_ref(), Collection::Activities, &activity_query)
        );

        let mut gaps = 0;
        match Fetched::from(projects) {
            Fetched::Loaded(projects) => {
                self.project_names = projects.into_iter().map(|p| (p.id, p.name)).collect();
            }
            Fetched::Failed(e) => {
                warn!("Project names unavailable for beneficiaries: {}", e);
                self.project_names.clear();
                gaps += 1;
            }
        }
        match Fetched::from(activities) {
            Fetched::Loaded(activities) => {
                self.activity_names = activities.into_iter().map(|a| (a.id, a.name)).collect();
            }
            Fetched::Failed(e) => {
                warn!("Activity names unavailable for beneficiaries: {}", e);
                self.activity_names.clear();
                gaps += 1;
            }
        }
        if gaps > 0 && beneficiaries.is_ok() {
            self.manager.notifier().error(messages::LOAD_FAILED);
        }
        beneficiaries
    }

    pub fn beneficiaries(&self) -> &[Beneficiary] {
        self.manager.items()
    }

    fn lookup(names: &HashMap<Uuid, String>, id: Option<Uuid>) -> String {
        id.and_then(|id| names.get(&id))
            .cloned()
            .unwrap_or_else(|| MISSING_REFERENCE.to_string())
    }

    pub fn project_name(&self, project_id: Option<Uuid>) -> String {
        Self::lookup(&self.project_names, project_id)
    }

    pub fn activity_name(&self, activity_id: Option<Uuid>) -> String {
        Self::lookup(&self.activity_names, activity_id)
    }

    pub fn find(&self, id: Uuid) -> DomainResult<&Beneficiary> {
        self.manager.find(id)
    }

    pub fn list(&self, filter: &BeneficiaryFilter) -> Vec<BeneficiaryListItem> {
        self.manager
            .filter(filter)
            .into_iter()
            .map(|b| BeneficiaryListItem {
                id: b.id,
                code: b.code.clone(),
                sex_label: b.sex.label().to_string(),
                age: b.age.map(|a| a.to_string()).unwrap_or_else(|| MISSING_REFERENCE.to_string()),
                category_label: b.category.label().to_string(),
                project_name: self.project_name(b.project_id),
                activity_name: self.activity_name(b.activity_id),
                support_label: b.support_type.map(|s| s.label().to_string()).unwrap_or_default(),
                enrollment_date: format_optional_date(b.enrollment_date),
                status: b.status,
                status_label: b.status.label().to_string(),
            })
            .collect()
    }

    pub async fn search_remote(&self, filter: &BeneficiaryFilter) -> ServiceResult<Vec<Beneficiary>> {
        self.manager.query(&filter.to_query()).await
    }

    pub fn detail(&self, id: Uuid) -> DomainResult<BeneficiaryDetail> {
        let beneficiary = self.manager.find(id).map_err(|e| {
            debug!("Beneficiary detail unavailable: {}", e);
            e
        })?;
        Ok(BeneficiaryDetail {
            beneficiary: beneficiary.clone(),
            project_name: self.project_name(beneficiary.project_id),
            activity_name: self.activity_name(beneficiary.activity_id),
            category_label: beneficiary.category.label().to_string(),
            support_label: beneficiary.support_type.map(|s| s.label().to_string()).unwrap_or_default(),
            status_label: beneficiary.status.label().to_string(),
        })
    }

    pub fn edit_draft(&self, id: Uuid) -> DomainResult<BeneficiaryDraft> {
        self.manager.find(id).map(BeneficiaryDraft::from)
    }

    pub async fn save(&mut self, draft: &BeneficiaryDraft) -> ServiceResult<Beneficiary> {
        self.manager.save(draft).await
    }

    pub async fn remove(&mut self, id: Uuid, confirmer: &dyn Confirmer) -> ServiceResult<bool> {
        self.manager.remove(id, confirmer).await
    }

    /// Breakdowns by sex, category, status and support type, plus ages
    pub fn stats(&self) -> BeneficiaryStats {
        let items = self.beneficiaries();
        BeneficiaryStats {
            total: items.len(),
            by_sex: count_by(items, |b| Some(b.sex.as_str())),
            by_category: count_by(items, |b| Some(b.category.as_str())),
            by_status: count_by(items, |b| Some(b.status.as_str())),
            by_support_type: count_by(items, |b| b.support_type.map(|s| s.as_str())),
            ages: age_stats(items, |b| b.age),
        }
    }

    /// Rows for the beneficiary CSV export
    pub fn export_rows(&self) -> ServiceResult<Vec<Record>> {
        if self.beneficiaries().is_empty() {
            return Err(ServiceError::Export("No beneficiaries to export".to_string()));
        }

        Ok(export_records(
            self.beneficiaries(),
            |id| self.project_name(id),
            |id| self.activity_name(id),
        ))
    }

    /// Dated CSV file of the loaded beneficiaries
    pub fn export_csv(&self, today: NaiveDate) -> ServiceResult<ExportFile> {
        self.manager.export_csv(export_records(
            self.beneficiaries(),
            |id| self.project_name(id),
            |id| self.activity_name(id),
        ), today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::beneficiary::types::Category;
    use crate::domains::core::feedback::{AutoConfirm, NotificationQueue};
    use crate::domains::core::repository::testing::InMemoryRepository;
    use crate::domains::aggregation::{percentage_of, AgeStats};
    use serde_json::json;

    fn service() -> (BeneficiaryService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        let (tx, _rx) = broadcast::channel(16);
        (BeneficiaryService::new(repo.clone(), Arc::new(NotificationQueue::new()), tx), repo)
    }

    fn draft(code: &str, sex: &str, age: &str, category: &str) -> BeneficiaryDraft {
        BeneficiaryDraft {
            code: code.to_string(),
            sex: sex.to_string(),
            age: age.to_string(),
            category: category.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_women_share() {
        let (mut service, _repo) = service();
        for i in 0..4 {
            service.save(&draft(&format!("F-{}", i), "F", "25", "women")).await.unwrap();
        }
        for i in 0..6 {
            service.save(&draft(&format!("M-{}", i), "M", "30", "youth")).await.unwrap();
        }

        let stats = service.stats();
        assert_eq!(stats.total, 10);
        assert_eq!(stats.by_sex["F"], 4);
        assert_eq!(percentage_of(stats.by_sex["F"], stats.total), 40);
        assert_eq!(stats.by_support_type["undefined"], 10);
        assert_eq!(stats.ages, AgeStats { mean: 28, min: 25, max: 30 });
    }

    #[tokio::test]
    async fn test_project_delete_nullifies_link() {
        let (mut service, repo) = service();
        let project_id = Uuid::new_v4();
        repo.seed(
            Collection::Projects,
            vec![json!({
                "id": project_id,
                "name": "Clinic",
                "start_date": "2024-01-01",
                "end_date": "2024-12-31",
                "responsible": "Awa",
                "planned_budget": 1000
            })],
        );
        let mut with_project = draft("B-1", "F", "40", "migrants");
        with_project.project_id = project_id.to_string();
        let saved = service.save(&with_project).await.unwrap();
        service.load().await.unwrap();
        assert_eq!(service.detail(saved.id).unwrap().project_name, "Clinic");

        repo.delete(Collection::Projects, project_id).await.unwrap();
        service.load().await.unwrap();
        let detail = service.detail(saved.id).unwrap();
        assert_eq!(detail.beneficiary.project_id, None);
        assert_eq!(detail.project_name, MISSING_REFERENCE);
    }

    #[tokio::test]
    async fn test_filter_and_remove() {
        let (mut service, _repo) = service();
        service.save(&draft("B-1", "F", "40", "migrants")).await.unwrap();
        let youth = service.save(&draft("B-2", "M", "18", "youth")).await.unwrap();

        let filter = BeneficiaryFilter { category: Some(Category::Youth), ..Default::default() };
        assert_eq!(service.list(&filter).len(), 1);
        assert_eq!(service.search_remote(&filter).await.unwrap().len(), 1);

        assert!(service.remove(youth.id, &AutoConfirm(true)).await.unwrap());
        assert_eq!(service.beneficiaries().len(), 1);
        assert_eq!(service.export_rows().unwrap()[0]["category"], "Migrants");
    }

    #[tokio::test]
    async fn test_export_csv_file() {
        let queue = Arc::new(NotificationQueue::new());
        let (tx, _rx) = broadcast::channel(16);
        let mut service = BeneficiaryService::new(Arc::new(InMemoryRepository::new()), queue.clone(), tx);
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        assert!(service.export_csv(today).is_err());
        assert_eq!(queue.drain()[0].message, messages::NOTHING_TO_EXPORT);

        service.save(&draft("B-7", "F", "30", "women")).await.unwrap();
        queue.drain();
        let file = service.export_csv(today).unwrap();
        assert_eq!(file.file_name, "beneficiaries_2024-06-30.csv");
        assert!(file.contents.contains("\"B-7\""));
        assert_eq!(queue.drain()[0].message, messages::EXPORT_SUCCESS);
    }
}
