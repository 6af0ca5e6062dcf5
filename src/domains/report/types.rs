use crate::domains::activity::types::Activity;
use crate::domains::aggregation::AgeStats;
use crate::domains::beneficiary::types::Beneficiary;
use crate::domains::indicator::types::Indicator;
use crate::domains::project::types::Project;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Indicator codes that override the configured impact targets
pub mod indicator_codes {
    pub const TRAINED: &str = "trained";
    pub const INSERTION_RATE: &str = "insertion_rate";
    pub const WOMEN_REACHED: &str = "women_reached";
    pub const YOUTH_REACHED: &str = "youth_reached";
}

/// Targets the impact table is measured against
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactTargets {
    pub trained: f64,
    /// Percent
    pub insertion_rate: f64,
    pub women_reached: f64,
    pub youth_reached: f64,
}

impl Default for ImpactTargets {
    fn default() -> Self {
        Self {
            trained: 1000.0,
            insertion_rate: 70.0,
            women_reached: 600.0,
            youth_reached: 800.0,
        }
    }
}

impl ImpactTargets {
    /// Replace targets by those of matching indicator rows
    pub fn with_indicators(mut self, indicators: &[Indicator]) -> Self {
        for indicator in indicators {
            let Some(target) = indicator.target_value else {
                continue;
            };
            match indicator.code.trim().to_lowercase().as_str() {
                indicator_codes::TRAINED => self.trained = target,
                indicator_codes::INSERTION_RATE => self.insertion_rate = target,
                indicator_codes::WOMEN_REACHED => self.women_reached = target,
                indicator_codes::YOUTH_REACHED => self.youth_reached = target,
                _ => {}
            }
        }
        self
    }
}

/// Report kinds with string representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Monthly,
    Impact,
    Annual,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [ReportKind::Monthly, ReportKind::Impact, ReportKind::Annual];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Monthly => "monthly",
            ReportKind::Impact => "impact",
            ReportKind::Annual => "annual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Some(ReportKind::Monthly),
            "impact" => Some(ReportKind::Impact),
            "annual" => Some(ReportKind::Annual),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::Monthly => "Monthly Activity Report",
            ReportKind::Impact => "Impact Report",
            ReportKind::Annual => "Annual Report",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a report is computed from
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub projects: Vec<Project>,
    pub activities: Vec<Activity>,
    pub beneficiaries: Vec<Beneficiary>,
    pub indicators: Vec<Indicator>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneralStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub total_activities: usize,
    pub completed_activities: usize,
    pub cancelled_activities: usize,
    pub total_beneficiaries: usize,
    pub planned_budget: Decimal,
    pub realized_budget: Decimal,
    /// Percent of the planned budget spent
    pub budget_execution: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BeneficiaryBreakdown {
    pub total: usize,
    pub women: usize,
    pub men: usize,
    pub women_percent: i64,
    pub men_percent: i64,
    pub ages: AgeStats,
    /// Up to three largest categories as `(label, count)`
    pub main_categories: Vec<(String, usize)>,
}

/// One line of the impact table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactRow {
    pub indicator: String,
    pub target: f64,
    /// `None` when nothing measures it yet
    pub achieved: Option<f64>,
    pub percent_of_target: Option<i64>,
    pub is_rate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub responsible: String,
    pub period: String,
    pub planned_budget: String,
    pub status_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub name: String,
    pub type_label: String,
    pub date: String,
    pub location: String,
    pub beneficiary_count: i64,
}

/// Per-project activity reach, for the impact report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramSummary {
    pub name: String,
    pub activities: usize,
    pub completed_activities: usize,
    pub people_reached: i64,
    pub budget_execution: i64,
}

/// Figures behind every report kind
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStats {
    pub general: GeneralStats,
    pub beneficiaries: BeneficiaryBreakdown,
    pub activities_by_type: BTreeMap<String, usize>,
    pub beneficiaries_by_category: BTreeMap<String, usize>,
    pub impact: Vec<ImpactRow>,
    pub top_projects: Vec<ProjectSummary>,
    pub recent_activities: Vec<ActivitySummary>,
    pub programs: Vec<ProgramSummary>,
    pub currency: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn indicator(code: &str, target: Option<f64>) -> Indicator {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "code": code,
            "name": code,
            "target_value": target
        }))
        .unwrap()
    }

    #[test]
    fn test_indicator_targets_override_defaults() {
        let targets = ImpactTargets::default().with_indicators(&[
            indicator("TRAINED", Some(1500.0)),
            indicator("youth_reached", None),
            indicator("unrelated", Some(3.0)),
        ]);
        assert_eq!(targets.trained, 1500.0);
        assert_eq!(targets.youth_reached, 800.0);
        assert_eq!(targets.insertion_rate, 70.0);
    }

    #[test]
    fn test_report_kind_names() {
        assert_eq!(ReportKind::from_str(" Impact "), Some(ReportKind::Impact));
        assert_eq!(ReportKind::from_str("weekly"), None);
        assert_eq!(ReportKind::Annual.to_string(), "annual");
    }
}
