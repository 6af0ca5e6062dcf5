use crate::domains::core::manager::{EntityDraft, EntityFilter, ManagedEntity};
use crate::errors::DomainResult;
use crate::format::optional_value;
use crate::types::{Collection, ListQuery, Record, SortDirection};
use crate::validation::{common, Validate, ValidationBuilder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Tracked indicator with an optional target and measured value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub actual_value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ManagedEntity for Indicator {
    const COLLECTION: Collection = Collection::Indicators;
    type Draft = IndicatorDraft;

    fn id(&self) -> Uuid {
        self.id
    }

    fn label(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }

    fn list_query() -> ListQuery {
        ListQuery::new().order_by("code", SortDirection::Ascending)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicatorDraft {
    pub id: Option<Uuid>,
    pub code: String,
    pub name: String,
    pub target_value: String,
    pub actual_value: String,
    pub unit: String,
}

impl From<&Indicator> for IndicatorDraft {
    fn from(indicator: &Indicator) -> Self {
        Self {
            id: Some(indicator.id),
            code: indicator.code.clone(),
            name: indicator.name.clone(),
            target_value: indicator.target_value.map(|v| v.to_string()).unwrap_or_default(),
            actual_value: indicator.actual_value.map(|v| v.to_string()).unwrap_or_default(),
            unit: indicator.unit.clone().unwrap_or_default(),
        }
    }
}

impl Validate for IndicatorDraft {
    fn validate(&self) -> DomainResult<()> {
        common::require_all(&[("code", self.code.as_str()), ("name", self.name.as_str())])?;

        ValidationBuilder::new("code", Some(self.code.trim().to_string()))
            .max_length(50)
            .validate()?;

        if let Some(target) = common::parse_optional_f64("target_value", &self.target_value)? {
            ValidationBuilder::new("target_value", Some(target)).min(0.0).validate()?;
        }
        common::parse_optional_f64("actual_value", &self.actual_value)?;
        Ok(())
    }
}

impl EntityDraft for IndicatorDraft {
    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn to_record(&self) -> DomainResult<Record> {
        let number = |v: Option<f64>| v.map_or(Value::Null, |v| json!(v));

        let mut record = Record::new();
        record.insert("code".to_string(), json!(self.code.trim()));
        record.insert("name".to_string(), json!(self.name.trim()));
        record.insert(
            "target_value".to_string(),
            number(common::parse_optional_f64("target_value", &self.target_value)?),
        );
        record.insert(
            "actual_value".to_string(),
            number(common::parse_optional_f64("actual_value", &self.actual_value)?),
        );
        record.insert("unit".to_string(), optional_value(common::optional_text(&self.unit)));
        Ok(record)
    }
}

/// Free-text filter over code and name
#[derive(Debug, Clone, Default)]
pub struct IndicatorFilter {
    pub search: String,
}

impl EntityFilter<Indicator> for IndicatorFilter {
    fn matches(&self, indicator: &Indicator) -> bool {
        let term = self.search.trim().to_lowercase();
        term.is_empty()
            || indicator.code.to_lowercase().contains(&term)
            || indicator.name.to_lowercase().contains(&term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_validation() {
        let draft = IndicatorDraft {
            code: "trained".to_string(),
            name: "People trained".to_string(),
            target_value: "-1".to_string(),
            ..Default::default()
        };
        assert!(draft.validate().is_err());

        let draft = IndicatorDraft { target_value: "1200".to_string(), ..draft };
        assert!(draft.validate().is_ok());
        assert_eq!(draft.to_record().unwrap()["target_value"], json!(1200.0));
        assert!(IndicatorDraft::default().validate().is_err());
    }
}
