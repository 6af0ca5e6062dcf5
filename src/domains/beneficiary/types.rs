use crate::domains::core::manager::{EntityDraft, EntityFilter, ManagedEntity};
use crate::errors::DomainResult;
use crate::format::optional_value;
use crate::types::{Collection, ListQuery, Record, SortDirection};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Sex as recorded on intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "M" => Some(Sex::Male),
            "F" => Some(Sex::Female),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target group of a beneficiary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Women,
    Youth,
    Migrants,
    Disabled,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Women,
        Category::Youth,
        Category::Migrants,
        Category::Disabled,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Women => "women",
            Category::Youth => "youth",
            Category::Migrants => "migrants",
            Category::Disabled => "disabled",
            Category::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "women" => Some(Category::Women),
            "youth" => Some(Category::Youth),
            "migrants" => Some(Category::Migrants),
            "disabled" => Some(Category::Disabled),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Women => "Women",
            Category::Youth => "Youth",
            Category::Migrants => "Migrants",
            Category::Disabled => "Persons with disabilities",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportType {
    Psychosocial,
    Material,
    Training,
    Accompaniment,
}

impl SupportType {
    pub const ALL: [SupportType; 4] = [
        SupportType::Psychosocial,
        SupportType::Material,
        SupportType::Training,
        SupportType::Accompaniment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SupportType::Psychosocial => "psychosocial",
            SupportType::Material => "material",
            SupportType::Training => "training",
            SupportType::Accompaniment => "accompaniment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "psychosocial" => Some(SupportType::Psychosocial),
            "material" => Some(SupportType::Material),
            "training" => Some(SupportType::Training),
            "accompaniment" => Some(SupportType::Accompaniment),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SupportType::Psychosocial => "Psychosocial",
            SupportType::Material => "Material",
            SupportType::Training => "Training",
            SupportType::Accompaniment => "Accompaniment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeneficiaryStatus {
    #[default]
    Active,
    Inactive,
    Graduated,
}

impl BeneficiaryStatus {
    pub const ALL: [BeneficiaryStatus; 3] = [
        BeneficiaryStatus::Active,
        BeneficiaryStatus::Inactive,
        BeneficiaryStatus::Graduated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BeneficiaryStatus::Active => "active",
            BeneficiaryStatus::Inactive => "inactive",
            BeneficiaryStatus::Graduated => "graduated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(BeneficiaryStatus::Active),
            "inactive" => Some(BeneficiaryStatus::Inactive),
            "graduated" => Some(BeneficiaryStatus::Graduated),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BeneficiaryStatus::Active => "Active",
            BeneficiaryStatus::Inactive => "Inactive",
            BeneficiaryStatus::Graduated => "Graduated",
        }
    }
}

/// Beneficiary entity as stored in the `beneficiaries` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: Uuid,
    /// Anonymized code or name
    pub code: String,
    pub sex: Sex,
    #[serde(default)]
    pub age: Option<i64>,
    pub category: Category,
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub activity_id: Option<Uuid>,
    #[serde(default)]
    pub support_type: Option<SupportType>,
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: BeneficiaryStatus,
    #[serde(default)]
    pub observations: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ManagedEntity for Beneficiary {
    const COLLECTION: Collection = Collection::Beneficiaries;
    type Draft = BeneficiaryDraft;

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        self.code.clone()
    }

    fn list_query() -> ListQuery {
        ListQuery::new().order_by("created_at", SortDirection::Descending)
    }
}

/// Form values for registering or editing a beneficiary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeneficiaryDraft {
    pub id: Option<Uuid>,
    pub code: String,
    pub sex: String,
    pub age: String,
    pub category: String,
    pub project_id: String,
    pub activity_id: String,
    pub support_type: String,
    pub enrollment_date: String,
    pub status: String,
    pub observations: String,
}

impl From<&Beneficiary> for BeneficiaryDraft {
    fn from(beneficiary: &Beneficiary) -> Self {
        Self {
            id: Some(beneficiary.id),
            code: beneficiary.code.clone(),
            sex: beneficiary.sex.as_str().to_string(),
            age: beneficiary.age.map(|a| a.to_string()).unwrap_or_default(),
            category: beneficiary.category.as_str().to_string(),
            project_id: beneficiary.project_id.map(|id| id.to_string()).unwrap_or_default(),
            activity_id: beneficiary.activity_id.map(|id| id.to_string()).unwrap_or_default(),
            support_type: beneficiary.support_type.map(|s| s.as_str().to_string()).unwrap_or_default(),
            enrollment_date: beneficiary.enrollment_date.map(|d| d.to_string()).unwrap_or_default(),
            status: beneficiary.status.as_str().to_string(),
            observations: beneficiary.observations.clone().unwrap_or_default(),
        }
    }
}

impl Validate for BeneficiaryDraft {
    fn validate(&self) -> DomainResult<()> {
        common::require_all(&[
            ("code", self.code.as_str()),
            ("sex", self.sex.as_str()),
            ("age", self.age.as_str()),
            ("category", self.category.as_str()),
        ])?;

        ValidationBuilder::new("sex", Some(self.sex.clone()))
            .one_of(&["M", "F"], Some("must be M or F"))
            .validate()?;

        let age = common::parse_i64("age", &self.age)?;
        ValidationBuilder::new("age", Some(age)).range(0, 120).validate()?;

        let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        ValidationBuilder::new("category", Some(self.category.clone()))
            .one_of(&categories, Some("must be women, youth, migrants, disabled or other"))
            .validate()?;

        common::parse_optional_uuid("project_id", &self.project_id)?;
        common::parse_optional_uuid("activity_id", &self.activity_id)?;

        let supports: Vec<&str> = SupportType::ALL.iter().map(|s| s.as_str()).collect();
        ValidationBuilder::new("support_type", Some(self.support_type.clone()))
            .one_of(&supports, Some("must be psychosocial, material, training or accompaniment"))
            .validate()?;

        common::parse_optional_date("enrollment_date", &self.enrollment_date)?;

        let statuses: Vec<&str> = BeneficiaryStatus::ALL.iter().map(|s| s.as_str()).collect();
        ValidationBuilder::new("status", Some(self.status.clone()))
            .one_of(&statuses, Some("must be active, inactive or graduated"))
            .validate()?;

        Ok(())
    }
}

impl EntityDraft for BeneficiaryDraft {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn to_record(&self) -> DomainResult<Record> {
        let age = common::parse_i64("age", &self.age)?;
        let sex = Sex::from_str(&self.sex).map(|s| s.as_str()).unwrap_or_default();
        let category = Category::from_str(&self.category).map(|c| c.as_str()).unwrap_or_default();
        let project_id = common::parse_optional_uuid("project_id", &self.project_id)?;
        let activity_id = common::parse_optional_uuid("activity_id", &self.activity_id)?;
        let support_type = SupportType::from_str(&self.support_type).map(|s| s.as_str().to_string());
        let enrollment_date = common::parse_optional_date("enrollment_date", &self.enrollment_date)?
            .map(|d| d.to_string());
        let status = BeneficiaryStatus::from_str(&self.status).unwrap_or_default();

        let mut record = Record::new();
        record.insert("code".to_string(), json!(self.code.trim()));
        record.insert("sex".to_string(), json!(sex));
        record.insert("age".to_string(), json!(age));
        record.insert("category".to_string(), json!(category));
        record.insert("project_id".to_string(), json!(project_id));
        record.insert("activity_id".to_string(), json!(activity_id));
        record.insert("support_type".to_string(), optional_value(support_type));
        record.insert("enrollment_date".to_string(), optional_value(enrollment_date));
        record.insert("status".to_string(), json!(status.as_str()));
        record.insert("observations".to_string(), optional_value(common::optional_text(&self.observations)));
        Ok(record)
    }
}

/// Listing filter: free text over code and observations, AND category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeneficiaryFilter {
    pub search: String,
    pub category: Option<Category>,
}

impl BeneficiaryFilter {
    pub fn to_query(&self) -> ListQuery {
        let mut query = Beneficiary::list_query().search(&["code", "observations"], &self.search);
        if let Some(category) = self.category {
            query = query.eq("category", category.as_str());
        }
        query
    }
}

impl EntityFilter<Beneficiary> for BeneficiaryFilter {
    fn matches(&self, beneficiary: &Beneficiary) -> bool {
        let term = self.search.trim().to_lowercase();
        let text_match = term.is_empty()
            || beneficiary.code.to_lowercase().contains(&term)
            || beneficiary
                .observations
                .as_deref()
                .map_or(false, |o| o.to_lowercase().contains(&term));
        let category_match = self.category.map_or(true, |c| beneficiary.category == c);
        text_match && category_match
    }
}

pub fn export_records<P, A>(beneficiaries: &[Beneficiary], project_name: P, activity_name: A) -> Vec<Record>
where
    P: Fn(Option<Uuid>) -> String,
    A: Fn(Option<Uuid>) -> String,
{
    beneficiaries
        .iter()
        .map(|b| {
            let mut row = Record::new();
            row.insert("code".to_string(), json!(b.code));
            row.insert("sex".to_string(), json!(b.sex.label()));
            row.insert("age".to_string(), json!(b.age));
            row.insert("category".to_string(), json!(b.category.label()));
            row.insert("project".to_string(), json!(project_name(b.project_id)));
            row.insert("activity".to_string(), json!(activity_name(b.activity_id)));
            row.insert("support_type".to_string(), json!(b.support_type.map(|s| s.label())));
            row.insert("enrollment_date".to_string(), json!(b.enrollment_date.map(|d| d.to_string())));
            row.insert("status".to_string(), json!(b.status.label()));
            row.insert("observations".to_string(), json!(b.observations));
            row
        })
        .collect()
}

/// One row of the beneficiary listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeneficiaryListItem {
    pub id: Uuid,
    pub code: String,
    pub sex_label: String,
    pub age: String,
    pub category_label: String,
    pub project_name: String,
    pub activity_name: String,
    pub support_label: String,
    pub enrollment_date: String,
    pub status: BeneficiaryStatus,
    pub status_label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BeneficiaryDetail {
    pub beneficiary: Beneficiary,
    pub project_name: String,
    pub activity_name: String,
    pub category_label: String,
    pub support_label: String,
    pub status_label: String,
}

/// Breakdown of the loaded beneficiaries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeneficiaryStats {
    pub total: usize,
    pub by_sex: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
    pub by_support_type: BTreeMap<String, usize>,
    pub ages: crate::domains::aggregation::AgeStats,
}
