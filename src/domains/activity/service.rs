use crate::domains::activity::types::{
    export_records, Activity, ActivityDetail, ActivityDraft, ActivityFilter, ActivityListItem, MISSING_REFERENCE,
};
use crate::domains::core::feedback::{messages, Confirmer, Notifier};
use crate::domains::core::manager::{ChangeEvent, EntityManager, ManagedEntity};
use crate::domains::core::repository::{fetch_all, RepositoryClient};
use crate::domains::export::ExportFile;
use crate::domains::project::types::Project;
use crate::errors::{DomainResult, ServiceError, ServiceResult};
use crate::format::format_date;
use crate::types::{Collection, Fetched, Record};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Activity listing and editing, with owning-project names resolved
pub struct ActivityService {
    manager: EntityManager<Activity>,
    project_names: HashMap<Uuid, String>,
    projects: Vec<Project>,
}

impl ActivityService {
    pub fn new(
        repo: Arc<dyn RepositoryClient>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<ChangeEvent>,
    ) -> Self {
        Self {
            manager: EntityManager::new(repo, notifier, events),
            project_names: HashMap::new(),
            projects: Vec::new(),
        }
    }

    /// Load activities and the projects they reference, concurrently.
    ///
    /// A failed project fetch keeps the activities; their project names then
    /// show as missing.
    pub async fn load(&mut self) -> ServiceResult<usize> {
        let repo = self.manager.repository();
        let project_query = Project::list_query();
        let (activities, projects) = futures::join!(
            self.manager.load(),
            fetch_all::<Project>(repo.as_ref(), Collection::Projects, &project_query)
        );

        let projects: Fetched<Vec<Project>> = projects.into();
        match projects {
            Fetched::Loaded(projects) => self.set_projects(projects),
            Fetched::Failed(e) => {
                warn!("Project names unavailable for activities: {}", e);
                self.set_projects(Vec::new());
                if activities.is_ok() {
                    self.manager.notifier().error(messages::LOAD_FAILED);
                }
            }
        }
        activities
    }

    fn set_projects(&mut self, projects: Vec<Project>) {
        self.project_names = projects.iter().map(|p| (p.id, p.name.clone())).collect();
        self.projects = projects;
    }

    pub fn activities(&self) -> &[Activity] {
        self.manager.items()
    }

    /// Projects offered in the activity form's project selector
    pub fn project_options(&self) -> Vec<(Uuid, String)> {
        self.projects.iter().map(|p| (p.id, p.name.clone())).collect()
    }

    /// Owning project name, or `N/A` when the project is gone
    pub fn project_name(&self, project_id: Option<Uuid>) -> String {
        project_id
            .and_then(|id| self.project_names.get(&id))
            .cloned()
            .unwrap_or_else(|| MISSING_REFERENCE.to_string())
    }

    pub fn find(&self, id: Uuid) -> DomainResult<&Activity> {
        self.manager.find(id)
    }

    pub fn filter(&self, filter: &ActivityFilter) -> Vec<&Activity> {
        self.manager.filter(filter)
    }

    pub fn list(&self, filter: &ActivityFilter) -> Vec<ActivityListItem> {
        self.manager
            .filter(filter)
            .into_iter()
            .map(|activity| ActivityListItem {
                id: activity.id,
                name: activity.name.clone(),
                project_name: self.project_name(activity.project_id),
                type_label: activity.activity_type.label().to_string(),
                date: format_date(activity.date),
                location: activity.location.clone(),
                beneficiary_count: activity.beneficiaries(),
                status: activity.status,
                status_label: activity.status.label().to_string(),
                has_coordinates: activity.coordinates().is_some(),
            })
            .collect()
    }

    pub async fn search_remote(&self, filter: &ActivityFilter) -> ServiceResult<Vec<Activity>> {
        self.manager.query(&filter.to_query()).await
    }

    pub fn detail(&self, id: Uuid) -> DomainResult<ActivityDetail> {
        let activity = self.manager.find(id).map_err(|e| {
            debug!("Activity detail unavailable: {}", e);
            e
        })?;
        Ok(ActivityDetail {
            activity: activity.clone(),
            project_name: self.project_name(activity.project_id),
            type_label: activity.activity_type.label().to_string(),
            status_label: activity.status.label().to_string(),
        })
    }

    pub fn edit_draft(&self, id: Uuid) -> DomainResult<ActivityDraft> {
        self.manager.find(id).map(ActivityDraft::from)
    }

    pub async fn save(&mut self, draft: &ActivityDraft) -> ServiceResult<Activity> {
        let saved = self.manager.save(draft).await?;
        self.refresh_projects().await;
        Ok(saved)
    }

    pub async fn remove(&mut self, id: Uuid, confirmer: &dyn Confirmer) -> ServiceResult<bool> {
        self.manager.remove(id, confirmer).await
    }

    async fn refresh_projects(&mut self) {
        let repo = self.manager.repository();
        match fetch_all::<Project>(repo.as_ref(), Collection::Projects, &Project::list_query()).await {
            Ok(projects) => self.set_projects(projects),
            Err(e) => warn!("Keeping previous project names: {}", e),
        }
    }

    /// Rows for the activity CSV export
    pub fn export_rows(&self) -> ServiceResult<Vec<Record>> {
        if self.activities().is_empty() {
            return Err(ServiceError::Export("No activities to export".to_string()));
        }

        Ok(export_records(self.activities(), |id| self.project_name(id)))
    }

    /// Dated CSV file of the loaded activities
    pub fn export_csv(&self, today: NaiveDate) -> ServiceResult<ExportFile> {
        self.manager.export_csv(export_records(self.activities(), |id| self.project_name(id)), today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::activity::types::ActivityType;
    use crate::domains::core::feedback::{AutoConfirm, NotificationQueue};
    use crate::domains::core::repository::testing::InMemoryRepository;
    use crate::errors::ErrorKind;
    use serde_json::json;

    fn service() -> (ActivityService, Arc<InMemoryRepository>, Arc<NotificationQueue>) {
        let repo = Arc::new(InMemoryRepository::new());
        let queue = Arc::new(NotificationQueue::new());
        let (tx, _rx) = broadcast::channel(16);
        (ActivityService::new(repo.clone(), queue.clone(), tx), repo, queue)
    }

    fn seed_project(repo: &InMemoryRepository, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        repo.seed(
            Collection::Projects,
            vec![json!({
                "id": id,
                "name": name,
                "start_date": "2024-01-01",
                "end_date": "2024-12-31",
                "responsible": "Awa",
                "planned_budget": 1000
            })],
        );
        id
    }

    fn draft(project_id: Uuid, name: &str, kind: &str) -> ActivityDraft {
        ActivityDraft {
            name: name.to_string(),
            project_id: project_id.to_string(),
            activity_type: kind.to_string(),
            date: "2024-05-10".to_string(),
            location: "Saint-Louis".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_out_of_range_latitude_is_rejected_before_network() {
        let (mut service, repo, _queue) = service();
        let mut draft = draft(Uuid::new_v4(), "Mapping", "support");
        draft.latitude = "95".to_string();
        draft.longitude = "-17.4".to_string();

        let err = service.save(&draft).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.validation().and_then(|v| v.field()), Some("latitude"));
        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_list_resolves_project_names() {
        let (mut service, repo, _queue) = service();
        let project_id = seed_project(&repo, "Water wells");
        service.save(&draft(project_id, "Drilling training", "training")).await.unwrap();

        let rows = service.list(&ActivityFilter::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].project_name, "Water wells");
        assert_eq!(rows[0].type_label, "Training");
    }

    #[tokio::test]
    async fn test_deleted_project_degrades_to_missing_name() {
        let (mut service, repo, _queue) = service();
        let project_id = seed_project(&repo, "Water wells");
        let saved = service.save(&draft(project_id, "Drilling training", "training")).await.unwrap();

        // The store cascades, but a listing already on screen keeps its rows
        repo.delete(Collection::Projects, project_id).await.unwrap();
        service.refresh_projects().await;
        assert_eq!(service.project_name(Some(project_id)), MISSING_REFERENCE);
        assert_eq!(service.detail(saved.id).unwrap().project_name, MISSING_REFERENCE);
        assert_eq!(service.list(&ActivityFilter::default())[0].project_name, MISSING_REFERENCE);

        service.load().await.unwrap();
        assert!(service.activities().is_empty());
    }

    #[tokio::test]
    async fn test_project_fetch_failure_keeps_activities() {
        let (mut service, repo, queue) = service();
        let project_id = seed_project(&repo, "Water wells");
        service.save(&draft(project_id, "Drilling training", "training")).await.unwrap();
        queue.drain();

        repo.fail(Collection::Projects);
        assert_eq!(service.load().await.unwrap(), 1);
        assert_eq!(service.list(&ActivityFilter::default())[0].project_name, MISSING_REFERENCE);
        assert_eq!(queue.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_by_type() {
        let (mut service, repo, _queue) = service();
        let project_id = seed_project(&repo, "Water wells");
        service.save(&draft(project_id, "Course", "training")).await.unwrap();
        service.save(&draft(project_id, "Forum", "workshop")).await.unwrap();

        let filter = ActivityFilter { activity_type: Some(ActivityType::Workshop), ..Default::default() };
        let rows = service.list(&filter);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Forum");
        assert_eq!(service.search_remote(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_declined_keeps_row() {
        let (mut service, repo, _queue) = service();
        let project_id = seed_project(&repo, "Water wells");
        let saved = service.save(&draft(project_id, "Course", "training")).await.unwrap();

        assert!(!service.remove(saved.id, &AutoConfirm(false)).await.unwrap());
        assert_eq!(repo.rows(Collection::Activities).len(), 1);
        assert_eq!(service.export_rows().unwrap()[0]["project"], "Water wells");
    }

    #[tokio::test]
    async fn test_export_csv_file() {
        let (mut service, repo, queue) = service();
        let project_id = seed_project(&repo, "Water wells");
        service.load().await.unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        assert!(service.export_csv(today).is_err());
        assert_eq!(queue.drain()[0].message, messages::NOTHING_TO_EXPORT);

        service.save(&draft(project_id, "Well training", "training")).await.unwrap();
        queue.drain();
        let file = service.export_csv(today).unwrap();
        assert_eq!(file.file_name, "activities_2024-06-30.csv");
        assert!(file.contents.contains("\"Water wells\""));
        assert_eq!(queue.drain()[0].message, messages::EXPORT_SUCCESS);
    }
}
