use crate::domains::core::manager::{EntityDraft, EntityFilter, ManagedEntity};
use crate::errors::DomainResult;
use crate::format::optional_value;
use crate::types::{Collection, ListQuery, Record, SortDirection};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use uuid::Uuid;

/// Label shown when a referenced record is missing
pub const MISSING_REFERENCE: &str = "N/A";

/// Activity type with string representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Training,
    Workshop,
    Awareness,
    Support,
    Advocacy,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        ActivityType::Training,
        ActivityType::Workshop,
        ActivityType::Awareness,
        ActivityType::Support,
        ActivityType::Advocacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Training => "training",
            ActivityType::Workshop => "workshop",
            ActivityType::Awareness => "awareness",
            ActivityType::Support => "support",
            ActivityType::Advocacy => "advocacy",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "training" => Some(ActivityType::Training),
            "workshop" => Some(ActivityType::Workshop),
            "awareness" => Some(ActivityType::Awareness),
            "support" => Some(ActivityType::Support),
            "advocacy" => Some(ActivityType::Advocacy),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityType::Training => "Training",
            ActivityType::Workshop => "Workshop",
            ActivityType::Awareness => "Awareness",
            ActivityType::Support => "Support",
            ActivityType::Advocacy => "Advocacy",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Activity status with string representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Planned,
    InProgress,
    Done,
    Cancelled,
}

impl ActivityStatus {
    pub const ALL: [ActivityStatus; 4] = [
        ActivityStatus::Planned,
        ActivityStatus::InProgress,
        ActivityStatus::Done,
        ActivityStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Planned => "planned",
            ActivityStatus::InProgress => "in_progress",
            ActivityStatus::Done => "done",
            ActivityStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "planned" => Some(ActivityStatus::Planned),
            "in_progress" => Some(ActivityStatus::InProgress),
            "done" => Some(ActivityStatus::Done),
            "cancelled" => Some(ActivityStatus::Cancelled),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActivityStatus::Planned => "Planned",
            ActivityStatus::InProgress => "In progress",
            ActivityStatus::Done => "Done",
            ActivityStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Activity entity as stored in the `activities` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub date: NaiveDate,
    pub location: String,
    #[serde(default)]
    pub responsible: Option<String>,
    #[serde(default)]
    pub beneficiary_count: Option<i64>,
    #[serde(default)]
    pub expected_results: Option<String>,
    #[serde(default)]
    pub obtained_results: Option<String>,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Activity {
    pub fn beneficiaries(&self) -> i64 {
        self.beneficiary_count.unwrap_or(0)
    }

    /// `(latitude, longitude)` when both are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Flat record of every field, for exports
    pub fn to_flat_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("id".to_string(), json!(self.id));
        record.insert("name".to_string(), json!(self.name));
        record.insert("project_id".to_string(), json!(self.project_id));
        record.insert("type".to_string(), json!(self.activity_type.as_str()));
        record.insert("date".to_string(), json!(self.date.to_string()));
        record.insert("location".to_string(), json!(self.location));
        record.insert("responsible".to_string(), json!(self.responsible));
        record.insert("beneficiary_count".to_string(), json!(self.beneficiaries()));
        record.insert("expected_results".to_string(), json!(self.expected_results));
        record.insert("obtained_results".to_string(), json!(self.obtained_results));
        record.insert("status".to_string(), json!(self.status.as_str()));
        record.insert("latitude".to_string(), json!(self.latitude));
        record.insert("longitude".to_string(), json!(self.longitude));
        record
    }
}

impl ManagedEntity for Activity {
    const COLLECTION: Collection = Collection::Activities;
    type Draft = ActivityDraft;

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn list_query() -> ListQuery {
        ListQuery::new().order_by("date", SortDirection::Descending)
    }
}

/// Form values for creating or editing an activity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityDraft {
    pub id: Option<Uuid>,
    pub name: String,
    pub project_id: String,
    pub activity_type: String,
    pub date: String,
    pub location: String,
    pub responsible: String,
    pub beneficiary_count: String,
    pub expected_results: String,
    pub obtained_results: String,
    pub status: String,
    pub latitude: String,
    pub longitude: String,
}

impl From<&Activity> for ActivityDraft {
    fn from(activity: &Activity) -> Self {
        Self {
            id: Some(activity.id),
            name: activity.name.clone(),
            project_id: activity.project_id.map(|id| id.to_string()).unwrap_or_default(),
            activity_type: activity.activity_type.as_str().to_string(),
            date: activity.date.to_string(),
            location: activity.location.clone(),
            responsible: activity.responsible.clone().unwrap_or_default(),
            beneficiary_count: activity.beneficiaries().to_string(),
            expected_results: activity.expected_results.clone().unwrap_or_default(),
            obtained_results: activity.obtained_results.clone().unwrap_or_default(),
            status: activity.status.as_str().to_string(),
            latitude: activity.latitude.map(|v| v.to_string()).unwrap_or_default(),
            longitude: activity.longitude.map(|v| v.to_string()).unwrap_or_default(),
        }
    }
}

impl Validate for ActivityDraft {
    fn validate(&self) -> DomainResult<()> {
        common::require_all(&[
            ("name", self.name.as_str()),
            ("project_id", self.project_id.as_str()),
            ("type", self.activity_type.as_str()),
            ("date", self.date.as_str()),
            ("location", self.location.as_str()),
        ])?;

        common::parse_uuid("project_id", &self.project_id)?;

        let types: Vec<&str> = ActivityType::ALL.iter().map(|t| t.as_str()).collect();
        ValidationBuilder::new("type", Some(self.activity_type.clone()))
            .one_of(&types, Some("must be training, workshop, awareness, support or advocacy"))
            .validate()?;

        common::parse_date("date", &self.date)?;

        if let Some(count) = common::parse_optional_i64("beneficiary_count", &self.beneficiary_count)? {
            ValidationBuilder::new("beneficiary_count", Some(count)).min(0).validate()?;
        }

        let statuses: Vec<&str> = ActivityStatus::ALL.iter().map(|s| s.as_str()).collect();
        ValidationBuilder::new("status", Some(self.status.clone()))
            .one_of(&statuses, Some("must be planned, in_progress, done or cancelled"))
            .validate()?;

        if let Some(latitude) = common::parse_optional_f64("latitude", &self.latitude)? {
            ValidationBuilder::new("latitude", Some(latitude))
                .range(-90.0, 90.0)
                .validate()?;
        }
        if let Some(longitude) = common::parse_optional_f64("longitude", &self.longitude)? {
            ValidationBuilder::new("longitude", Some(longitude))
                .range(-180.0, 180.0)
                .validate()?;
        }

        Ok(())
    }
}

impl EntityDraft for ActivityDraft {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn to_record(&self) -> DomainResult<Record> {
        let project_id = common::parse_uuid("project_id", &self.project_id)?;
        let date = common::parse_date("date", &self.date)?;
        let activity_type = ActivityType::from_str(&self.activity_type)
            .map(|t| t.as_str())
            .unwrap_or_default();
        let status = ActivityStatus::from_str(&self.status).unwrap_or_default();
        let count = common::parse_optional_i64("beneficiary_count", &self.beneficiary_count)?.unwrap_or(0);
        let coordinate = |value: Option<f64>| value.map_or(Value::Null, |v| json!(v));

        let mut record = Record::new();
        record.insert("name".to_string(), json!(self.name.trim()));
        record.insert("project_id".to_string(), json!(project_id));
        record.insert("type".to_string(), json!(activity_type));
        record.insert("date".to_string(), json!(date.to_string()));
        record.insert("location".to_string(), json!(self.location.trim()));
        record.insert("responsible".to_string(), optional_value(common::optional_text(&self.responsible)));
        record.insert("beneficiary_count".to_string(), json!(count));
        record.insert("expected_results".to_string(), optional_value(common::optional_text(&self.expected_results)));
        record.insert("obtained_results".to_string(), optional_value(common::optional_text(&self.obtained_results)));
        record.insert("status".to_string(), json!(status.as_str()));
        record.insert(
            "latitude".to_string(),
            coordinate(common::parse_optional_f64("latitude", &self.latitude)?),
        );
        record.insert(
            "longitude".to_string(),
            coordinate(common::parse_optional_f64("longitude", &self.longitude)?),
        );
        Ok(record)
    }
}

/// Listing filter: free text over name, location and owner, AND project, AND type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityFilter {
    pub search: String,
    pub project_id: Option<Uuid>,
    pub activity_type: Option<ActivityType>,
}

impl ActivityFilter {
    pub fn to_query(&self) -> ListQuery {
        let mut query = Activity::list_query().search(&["name", "location", "responsible"], &self.search);
        if let Some(project_id) = self.project_id {
            query = query.eq("project_id", project_id);
        }
        if let Some(activity_type) = self.activity_type {
            query = query.eq("type", activity_type.as_str());
        }
        query
    }
}

impl EntityFilter<Activity> for ActivityFilter {
    fn matches(&self, activity: &Activity) -> bool {
        let term = self.search.trim().to_lowercase();
        let text_match = term.is_empty()
            || activity.name.to_lowercase().contains(&term)
            || activity.location.to_lowercase().contains(&term)
            || activity
                .responsible
                .as_deref()
                .map_or(false, |r| r.to_lowercase().contains(&term));
        let project_match = self.project_id.map_or(true, |id| activity.project_id == Some(id));
        let type_match = self.activity_type.map_or(true, |t| activity.activity_type == t);
        text_match && project_match && type_match
    }
}

/// Export rows; `project_name` resolves the owning project
pub fn export_records<F>(activities: &[Activity], project_name: F) -> Vec<Record>
where
    F: Fn(Option<Uuid>) -> String,
{
    activities
        .iter()
        .map(|activity| {
            let mut row = Record::new();
            row.insert("name".to_string(), json!(activity.name));
            row.insert("project".to_string(), json!(project_name(activity.project_id)));
            row.insert("type".to_string(), json!(activity.activity_type.label()));
            row.insert("date".to_string(), json!(activity.date.to_string()));
            row.insert("location".to_string(), json!(activity.location));
            row.insert("responsible".to_string(), json!(activity.responsible));
            row.insert("beneficiary_count".to_string(), json!(activity.beneficiaries()));
            row.insert("status".to_string(), json!(activity.status.label()));
            row.insert("expected_results".to_string(), json!(activity.expected_results));
            row.insert("obtained_results".to_string(), json!(activity.obtained_results));
            row.insert("latitude".to_string(), json!(activity.latitude));
            row.insert("longitude".to_string(), json!(activity.longitude));
            row
        })
        .collect()
}

/// One row of the activity listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityListItem {
    pub id: Uuid,
    pub name: String,
    pub project_name: String,
    pub type_label: String,
    pub date: String,
    pub location: String,
    pub beneficiary_count: i64,
    pub status: ActivityStatus,
    pub status_label: String,
    pub has_coordinates: bool,
}

/// Read-only detail view of an activity
#[derive(Debug, Clone, Serialize)]
pub struct ActivityDetail {
    pub activity: Activity,
    pub project_name: String,
    pub type_label: String,
    pub status_label: String,
}
