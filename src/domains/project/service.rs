use crate::domains::aggregation::percentage_of;
use crate::domains::core::feedback::{Confirmer, Notifier};
use crate::domains::core::manager::{ChangeEvent, EntityManager};
use crate::domains::core::repository::RepositoryClient;
use crate::domains::export::ExportFile;
use crate::domains::project::types::{
    export_records, Project, ProjectDetail, ProjectDraft, ProjectFilter, ProjectListItem,
};
use crate::errors::{DomainResult, ServiceError, ServiceResult};
use crate::format::{format_currency, format_date, truncate_text};
use crate::types::Record;
use chrono::NaiveDate;
use log::debug;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Project listing, detail and editing
pub struct ProjectService {
    manager: EntityManager<Project>,
    currency: String,
}

impl ProjectService {
    pub fn new(
        repo: Arc<dyn RepositoryClient>,
        notifier: Arc<dyn Notifier>,
        events: broadcast::Sender<ChangeEvent>,
        currency: &str,
    ) -> Self {
        Self {
            manager: EntityManager::new(repo, notifier, events),
            currency: currency.to_string(),
        }
    }

    pub async fn load(&mut self) -> ServiceResult<usize> {
        self.manager.load().await
    }

    pub fn projects(&self) -> &[Project] {
        self.manager.items()
    }

    pub fn is_loaded(&self) -> bool {
        self.manager.is_loaded()
    }

    pub fn find(&self, id: Uuid) -> DomainResult<&Project> {
        self.manager.find(id)
    }

    /// Listing rows for the current filter, in load order
    pub fn list(&self, filter: &ProjectFilter) -> Vec<ProjectListItem> {
        self.manager
            .filter(filter)
            .into_iter()
            .map(|project| ProjectListItem {
                id: project.id,
                name: project.name.clone(),
                objective_excerpt: project.objective.as_deref().map(|o| truncate_text(o, 50)),
                start_date: format_date(project.start_date),
                end_date: format_date(project.end_date),
                responsible: project.responsible.clone(),
                planned_budget: format_currency(project.planned_budget, &self.currency),
                status: project.status,
                status_label: project.status.label().to_string(),
                progress: project.progress(),
            })
            .collect()
    }

    /// Same filter applied by the store instead of the cache
    pub async fn search_remote(&self, filter: &ProjectFilter) -> ServiceResult<Vec<Project>> {
        self.manager.query(&filter.to_query()).await
    }

    pub fn detail(&self, id: Uuid) -> DomainResult<ProjectDetail> {
        let project = self.manager.find(id).map_err(|e| {
            debug!("Project detail unavailable: {}", e);
            e
        })?;

        Ok(ProjectDetail {
            project: project.clone(),
            status_label: project.status.label().to_string(),
            planned_budget: format_currency(project.planned_budget, &self.currency),
            realized_budget: format_currency(project.realized(), &self.currency),
            budget_execution: percentage_of(project.realized(), project.planned_budget),
            duration_days: (project.end_date - project.start_date).num_days(),
        })
    }

    /// Pre-filled draft for the edit form
    pub fn edit_draft(&self, id: Uuid) -> DomainResult<ProjectDraft> {
        self.manager.find(id).map(ProjectDraft::from)
    }

    pub async fn save(&mut self, draft: &ProjectDraft) -> ServiceResult<Project> {
        self.manager.save(draft).await
    }

    pub async fn remove(&mut self, id: Uuid, confirmer: &dyn Confirmer) -> ServiceResult<bool> {
        self.manager.remove(id, confirmer).await
    }

    /// Rows for the project CSV export, with readable status values
    pub fn export_rows(&self) -> ServiceResult<Vec<Record>> {
        if self.projects().is_empty() {
            return Err(ServiceError::Export("No projects to export".to_string()));
        }

        Ok(export_records(self.projects()))
    }

    /// Dated CSV file of the loaded projects
    pub fn export_csv(&self, today: NaiveDate) -> ServiceResult<ExportFile> {
        self.manager.export_csv(export_records(self.projects()), today)
    }
}
