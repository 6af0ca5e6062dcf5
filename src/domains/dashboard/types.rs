use crate::domains::activity::types::ActivityStatus;
use crate::domains::aggregation::{ChartSeries, DashboardKpis};
use crate::types::Collection;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Number of projects in the budget chart
pub const BUDGET_CHART_PROJECTS: usize = 5;
/// Months covered by the evolution chart
pub const EVOLUTION_MONTHS: u32 = 6;
/// Rows in the recent activity list
pub const RECENT_ACTIVITIES: usize = 5;

/// Headline KPIs formatted for display
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiCards {
    pub active_projects: String,
    pub completed_activities: String,
    pub total_beneficiaries: String,
    pub total_planned_budget: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub id: Uuid,
    pub name: String,
    pub date: String,
    pub location: String,
    pub status: ActivityStatus,
    pub status_label: String,
}

/// Everything the dashboard page shows, computed from whatever loaded.
/// `gaps` lists the collections that could not be fetched.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub kpis: DashboardKpis,
    pub cards: KpiCards,
    pub activities_by_type: ChartSeries,
    pub beneficiaries_by_category: ChartSeries,
    pub budget_comparison: ChartSeries,
    pub monthly_evolution: ChartSeries,
    pub recent_activities: Vec<RecentActivity>,
    pub gaps: Vec<Collection>,
    pub refreshed_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }

    pub fn has_gap(&self, collection: Collection) -> bool {
        self.gaps.contains(&collection)
    }
}
