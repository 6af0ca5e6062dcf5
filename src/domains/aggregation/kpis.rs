use super::stats::{count_by, sum_by, top_n, UNDEFINED_KEY};
use crate::domains::activity::types::{Activity, ActivityStatus, ActivityType};
use crate::domains::beneficiary::types::{Beneficiary, Category};
use crate::domains::project::types::{Project, ProjectStatus};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Headline numbers of the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardKpis {
    pub active_projects: usize,
    pub completed_activities: usize,
    pub total_beneficiaries: usize,
    pub total_planned_budget: Decimal,
}

pub fn dashboard_kpis(projects: &[Project], activities: &[Activity], beneficiaries: &[Beneficiary]) -> DashboardKpis {
    DashboardKpis {
        active_projects: projects.iter().filter(|p| p.status == ProjectStatus::Active).count(),
        completed_activities: activities.iter().filter(|a| a.status == ActivityStatus::Done).count(),
        total_beneficiaries: beneficiaries.len(),
        total_planned_budget: sum_by(projects, |p| Some(p.planned_budget)),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataset {
    pub label: String,
    pub values: Vec<f64>,
}

/// Labels plus one or more aligned value series, ready for a chart widget
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<ChartDataset>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn single_series(label: &str, counts: Vec<(String, usize)>) -> ChartSeries {
    let (labels, values): (Vec<String>, Vec<f64>) = counts
        .into_iter()
        .map(|(name, count)| (name, count as f64))
        .unzip();
    ChartSeries {
        labels,
        datasets: vec![ChartDataset {
            label: label.to_string(),
            values,
        }],
    }
}

fn type_label(key: &str) -> String {
    ActivityType::from_str(key)
        .map(|t| t.label().to_string())
        .unwrap_or_else(|| key.to_string())
}

fn category_label(key: &str) -> String {
    Category::from_str(key)
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| key.to_string())
}

/// Bar series of activity counts per type
pub fn activities_by_type(activities: &[Activity]) -> ChartSeries {
    let counts = count_by(activities, |a| Some(a.activity_type.as_str()))
        .into_iter()
        .map(|(key, count)| (type_label(&key), count))
        .collect();
    single_series("Number of activities", counts)
}

/// Doughnut series of beneficiary counts per category
pub fn beneficiaries_by_category(beneficiaries: &[Beneficiary]) -> ChartSeries {
    let counts = count_by(beneficiaries, |b| Some(b.category.as_str()))
        .into_iter()
        .map(|(key, count)| (category_label(&key), count))
        .collect();
    single_series("Beneficiaries", counts)
}

/// Planned against realized budget for the `n` largest projects
pub fn budget_comparison(projects: &[Project], n: usize) -> ChartSeries {
    let top = top_n(projects, |p| p.planned_budget, n);
    let amount = |d: Decimal| d.to_f64().unwrap_or(0.0);
    ChartSeries {
        labels: top.iter().map(|p| p.name.clone()).collect(),
        datasets: vec![
            ChartDataset {
                label: "Planned budget".to_string(),
                values: top.iter().map(|p| amount(p.planned_budget)).collect(),
            },
            ChartDataset {
                label: "Realized budget".to_string(),
                values: top.iter().map(|p| amount(p.realized())).collect(),
            },
        ],
    }
}

/// Cumulative beneficiaries enrolled and activities held, per month, for the
/// `months` months ending with the month of `today`.
pub fn monthly_evolution(
    activities: &[Activity],
    beneficiaries: &[Beneficiary],
    today: NaiveDate,
    months: u32,
) -> ChartSeries {
    let current = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let mut labels = Vec::new();
    let mut enrolled = Vec::new();
    let mut held = Vec::new();

    for back in (0..months).rev() {
        let Some(month_start) = current.checked_sub_months(Months::new(back)) else {
            continue;
        };
        let next_month = month_start
            .checked_add_months(Months::new(1))
            .unwrap_or(month_start);

        labels.push(month_start.format("%b %Y").to_string());
        enrolled.push(
            beneficiaries
                .iter()
                .filter(|b| b.enrollment_date.map_or(false, |d| d < next_month))
                .count() as f64,
        );
        held.push(activities.iter().filter(|a| a.date < next_month).count() as f64);
    }

    ChartSeries {
        labels,
        datasets: vec![
            ChartDataset {
                label: "Beneficiaries".to_string(),
                values: enrolled,
            },
            ChartDataset {
                label: "Activities".to_string(),
                values: held,
            },
        ],
    }
}

/// Count map with human labels, the sentinel bucket kept as is
pub fn labelled_counts<F>(counts: &std::collections::BTreeMap<String, usize>, label: F) -> Vec<(String, usize)>
where
    F: Fn(&str) -> Option<String>,
{
    counts
        .iter()
        .map(|(key, count)| {
            let name = if key == UNDEFINED_KEY {
                key.clone()
            } else {
                label(key).unwrap_or_else(|| key.clone())
            };
            (name, *count)
        })
        .collect()
}
