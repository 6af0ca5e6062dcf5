use super::types::{
    DashboardSnapshot, KpiCards, RecentActivity, BUDGET_CHART_PROJECTS, EVOLUTION_MONTHS, RECENT_ACTIVITIES,
};
use crate::domains::activity::types::Activity;
use crate::domains::aggregation::{
    activities_by_type, beneficiaries_by_category, budget_comparison, dashboard_kpis, monthly_evolution, top_n,
};
use crate::domains::beneficiary::types::Beneficiary;
use crate::domains::core::feedback::{messages, Notifier};
use crate::domains::core::manager::ManagedEntity;
use crate::domains::core::repository::{fetch_all, RepositoryClient};
use crate::domains::project::types::Project;
use crate::format::{format_currency, format_date, group_thousands};
use crate::types::{Collection, Fetched};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use std::sync::Arc;

pub struct DashboardService {
    repo: Arc<dyn RepositoryClient>,
    notifier: Arc<dyn Notifier>,
    currency: String,
    snapshot: Option<DashboardSnapshot>,
}

impl DashboardService {
    pub fn new(repo: Arc<dyn RepositoryClient>, notifier: Arc<dyn Notifier>, currency: &str) -> Self {
        Self {
            repo,
            notifier,
            currency: currency.to_string(),
            snapshot: None,
        }
    }

    pub fn snapshot(&self) -> Option<&DashboardSnapshot> {
        self.snapshot.as_ref()
    }

    /// Fetch the three collections concurrently and recompute every panel.
    /// A failed fetch contributes nothing and is listed as a gap.
    pub async fn refresh(&mut self, today: NaiveDate) -> &DashboardSnapshot {
        let repo = self.repo.as_ref();
        let project_query = Project::list_query();
        let activity_query = Activity::list_query();
        let beneficiary_query = Beneficiary::list_query();
        let (projects, activities, beneficiaries) = futures::join!(
            fetch_all::<Project>(repo, Collection::Projects, &project_query),
            fetch_all::<Activity>(repo, Collection::Activities, &activity_query),
            fetch_all::<Beneficiary>(repo, Collection::Beneficiaries, &beneficiary_query)
        );
        let projects: Fetched<Vec<Project>> = projects.into();
        let activities: Fetched<Vec<Activity>> = activities.into();
        let beneficiaries: Fetched<Vec<Beneficiary>> = beneficiaries.into();

        let mut gaps = Vec::new();
        for (collection, error) in [
            (Collection::Projects, projects.error()),
            (Collection::Activities, activities.error()),
            (Collection::Beneficiaries, beneficiaries.error()),
        ] {
            if let Some(error) = error {
                warn!("Dashboard without {}: {}", collection, error);
                gaps.push(collection);
            }
        }
        if !gaps.is_empty() {
            self.notifier.error(messages::LOAD_FAILED);
        }

        let snapshot = self.compute(
            &projects.value_or_default(),
            &activities.value_or_default(),
            &beneficiaries.value_or_default(),
            gaps,
            today,
        );
        info!(
            "Dashboard refreshed: {} active projects, {} gaps",
            snapshot.kpis.active_projects,
            snapshot.gaps.len()
        );
        self.snapshot.insert(snapshot)
    }

    fn compute(
        &self,
        projects: &[Project],
        activities: &[Activity],
        beneficiaries: &[Beneficiary],
        gaps: Vec<Collection>,
        today: NaiveDate,
    ) -> DashboardSnapshot {
        let kpis = dashboard_kpis(projects, activities, beneficiaries);
        let cards = KpiCards {
            active_projects: kpis.active_projects.to_string(),
            completed_activities: kpis.completed_activities.to_string(),
            total_beneficiaries: group_thousands(kpis.total_beneficiaries as i64),
            total_planned_budget: format_currency(kpis.total_planned_budget, &self.currency),
        };
        let recent_activities = top_n(activities, |a| a.date, RECENT_ACTIVITIES)
            .into_iter()
            .map(|activity| RecentActivity {
                id: activity.id,
                name: activity.name.clone(),
                date: format_date(activity.date),
                location: activity.location.clone(),
                status: activity.status,
                status_label: activity.status.label().to_string(),
            })
            .collect();

        DashboardSnapshot {
            kpis,
            cards,
            activities_by_type: activities_by_type(activities),
            beneficiaries_by_category: beneficiaries_by_category(beneficiaries),
            budget_comparison: budget_comparison(projects, BUDGET_CHART_PROJECTS),
            monthly_evolution: monthly_evolution(activities, beneficiaries, today, EVOLUTION_MONTHS),
            recent_activities,
            gaps,
            refreshed_at: Utc::now(),
        }
    }
}
