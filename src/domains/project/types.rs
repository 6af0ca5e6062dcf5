use crate::domains::core::manager::{EntityDraft, EntityFilter, ManagedEntity};
use crate::errors::DomainResult;
use crate::format::{decimal_value, optional_value};
use crate::types::{Collection, ListQuery, Record, SortDirection};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use uuid::Uuid;

/// Project status with string representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 3] = [
        ProjectStatus::Active,
        ProjectStatus::Completed,
        ProjectStatus::Paused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Paused => "paused",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(ProjectStatus::Active),
            "completed" => Some(ProjectStatus::Completed),
            "paused" => Some(ProjectStatus::Paused),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Paused => "Paused",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Project entity as stored in the `projects` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub objective: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub responsible: String,
    #[serde(default)]
    pub partners: Option<String>,
    pub planned_budget: Decimal,
    #[serde(default)]
    pub realized_budget: Option<Decimal>,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub progress: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn realized(&self) -> Decimal {
        self.realized_budget.unwrap_or(Decimal::ZERO)
    }

    pub fn progress(&self) -> i64 {
        self.progress.unwrap_or(0)
    }
}

impl ManagedEntity for Project {
    const COLLECTION: Collection = Collection::Projects;
    type Draft = ProjectDraft;

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn list_query() -> ListQuery {
        ListQuery::new().order_by("created_at", SortDirection::Descending)
    }
}

/// Form values for creating or editing a project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub id: Option<Uuid>,
    pub name: String,
    pub objective: String,
    pub start_date: String,
    pub end_date: String,
    pub responsible: String,
    pub partners: String,
    pub planned_budget: String,
    pub realized_budget: String,
    pub status: String,
    pub progress: String,
}

impl From<&Project> for ProjectDraft {
    fn from(project: &Project) -> Self {
        Self {
            id: Some(project.id),
            name: project.name.clone(),
            objective: project.objective.clone().unwrap_or_default(),
            start_date: project.start_date.to_string(),
            end_date: project.end_date.to_string(),
            responsible: project.responsible.clone(),
            partners: project.partners.clone().unwrap_or_default(),
            planned_budget: project.planned_budget.to_string(),
            realized_budget: project.realized().to_string(),
            status: project.status.as_str().to_string(),
            progress: project.progress().to_string(),
        }
    }
}

impl ProjectDraft {
    fn status(&self) -> ProjectStatus {
        ProjectStatus::from_str(&self.status).unwrap_or_default()
    }
}

impl Validate for ProjectDraft {
    fn validate(&self) -> DomainResult<()> {
        common::require_all(&[
            ("name", self.name.as_str()),
            ("start_date", self.start_date.as_str()),
            ("end_date", self.end_date.as_str()),
            ("responsible", self.responsible.as_str()),
            ("planned_budget", self.planned_budget.as_str()),
        ])?;

        ValidationBuilder::new("name", Some(self.name.trim().to_string()))
            .max_length(200)
            .validate()?;

        let start = common::parse_date("start_date", &self.start_date)?;
        let end = common::parse_date("end_date", &self.end_date)?;
        ValidationBuilder::new("end_date", Some(end))
            .after(start, "start_date")
            .validate()?;

        let planned = common::parse_decimal("planned_budget", &self.planned_budget)?;
        ValidationBuilder::new("planned_budget", Some(planned))
            .greater_than(Decimal::ZERO)
            .validate()?;

        let realized = common::parse_decimal_or_zero("realized_budget", &self.realized_budget)?;
        ValidationBuilder::new("realized_budget", Some(realized))
            .min(Decimal::ZERO)
            .validate()?;

        let statuses: Vec<&str> = ProjectStatus::ALL.iter().map(|s| s.as_str()).collect();
        ValidationBuilder::new("status", Some(self.status.clone()))
            .one_of(&statuses, Some("must be active, completed or paused"))
            .validate()?;

        if let Some(progress) = common::parse_optional_i64("progress", &self.progress)? {
            ValidationBuilder::new("progress", Some(progress))
                .range(0, 100)
                .validate()?;
        }

        Ok(())
    }
}

impl EntityDraft for ProjectDraft {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn to_record(&self) -> DomainResult<Record> {
        let start = common::parse_date("start_date", &self.start_date)?;
        let end = common::parse_date("end_date", &self.end_date)?;
        let planned = common::parse_decimal("planned_budget", &self.planned_budget)?;
        let realized = common::parse_decimal_or_zero("realized_budget", &self.realized_budget)?;
        let progress = common::parse_optional_i64("progress", &self.progress)?.unwrap_or(0);

        let mut record = Record::new();
        record.insert("name".to_string(), json!(self.name.trim()));
        record.insert("objective".to_string(), optional_value(common::optional_text(&self.objective)));
        record.insert("start_date".to_string(), json!(start.to_string()));
        record.insert("end_date".to_string(), json!(end.to_string()));
        record.insert("responsible".to_string(), json!(self.responsible.trim()));
        record.insert("partners".to_string(), optional_value(common::optional_text(&self.partners)));
        record.insert("planned_budget".to_string(), decimal_value(planned));
        record.insert("realized_budget".to_string(), decimal_value(realized));
        record.insert("status".to_string(), json!(self.status().as_str()));
        record.insert("progress".to_string(), json!(progress));
        Ok(record)
    }
}

/// Listing filter: free text over name, owner and objective, AND status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectFilter {
    pub search: String,
    pub status: Option<ProjectStatus>,
}

impl ProjectFilter {
    /// Same filter evaluated by the store
    pub fn to_query(&self) -> ListQuery {
        let mut query = Project::list_query().search(&["name", "responsible", "objective"], &self.search);
        if let Some(status) = self.status {
            query = query.eq("status", status.as_str());
        }
        query
    }
}

impl EntityFilter<Project> for ProjectFilter {
    fn matches(&self, project: &Project) -> bool {
        let term = self.search.trim().to_lowercase();
        let text_match = term.is_empty()
            || project.name.to_lowercase().contains(&term)
            || project.responsible.to_lowercase().contains(&term)
            || project
                .objective
                .as_deref()
                .map_or(false, |o| o.to_lowercase().contains(&term));
        let status_match = self.status.map_or(true, |s| project.status == s);
        text_match && status_match
    }
}

/// Export rows with readable status values, in export column order
pub fn export_records(projects: &[Project]) -> Vec<Record> {
    projects
        .iter()
        .map(|project| {
            let mut row = Record::new();
            row.insert("name".to_string(), json!(project.name));
            row.insert("responsible".to_string(), json!(project.responsible));
            row.insert("start_date".to_string(), json!(project.start_date.to_string()));
            row.insert("end_date".to_string(), json!(project.end_date.to_string()));
            row.insert("status".to_string(), json!(project.status.label()));
            row.insert("planned_budget".to_string(), decimal_value(project.planned_budget));
            row.insert("realized_budget".to_string(), decimal_value(project.realized()));
            row.insert("progress".to_string(), json!(project.progress()));
            row.insert("partners".to_string(), json!(project.partners));
            row.insert("objective".to_string(), json!(project.objective));
            row
        })
        .collect()
}

/// One row of the project listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectListItem {
    pub id: Uuid,
    pub name: String,
    pub objective_excerpt: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub responsible: String,
    pub planned_budget: String,
    pub status: ProjectStatus,
    pub status_label: String,
    pub progress: i64,
}

/// Read-only detail view of a project
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    pub project: Project,
    pub status_label: String,
    pub planned_budget: String,
    pub realized_budget: String,
    /// Realized over planned budget, in percent
    pub budget_execution: i64,
    pub duration_days: i64,
}
