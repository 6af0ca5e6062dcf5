use super::types::{
    indicator_codes, ActivitySummary, BeneficiaryBreakdown, GeneralStats, ImpactRow, ImpactTargets, ProgramSummary,
    ProjectSummary, ReportData, ReportStats,
};
use crate::domains::activity::types::{ActivityStatus, ActivityType};
use crate::domains::aggregation::{age_stats, count_by, percentage_of, sum_by, top_n};
use crate::domains::beneficiary::types::{Category, Sex};
use crate::domains::project::types::ProjectStatus;
use crate::format::{format_currency, format_date};
use crate::types::Record;
use rust_decimal::Decimal;
use serde_json::json;

/// Projects listed in report documents
pub const TOP_PROJECTS: usize = 5;
/// Completed activities listed in report documents
pub const RECENT_ACTIVITIES: usize = 8;
const MAIN_CATEGORIES: usize = 3;

/// Compute every figure a report needs from the loaded collections.
///
/// Impact targets come from `targets`, overridden by matching rows of the
/// indicators collection. A measured insertion rate is only reported when an
/// `insertion_rate` indicator carries an actual value.
pub fn compute_report_stats(data: &ReportData, targets: &ImpactTargets, currency: &str) -> ReportStats {
    let general = general_stats(data);
    let targets = targets.with_indicators(&data.indicators);

    ReportStats {
        beneficiaries: beneficiary_breakdown(data),
        activities_by_type: count_by(&data.activities, |a| Some(a.activity_type.as_str())),
        beneficiaries_by_category: count_by(&data.beneficiaries, |b| Some(b.category.as_str())),
        impact: impact_rows(data, &targets),
        top_projects: top_n(&data.projects, |p| p.planned_budget, TOP_PROJECTS)
            .into_iter()
            .map(|p| ProjectSummary {
                name: p.name.clone(),
                responsible: p.responsible.clone(),
                period: format!("{} - {}", format_date(p.start_date), format_date(p.end_date)),
                planned_budget: format_currency(p.planned_budget, currency),
                status_label: p.status.label().to_string(),
            })
            .collect(),
        recent_activities: data
            .activities
            .iter()
            .filter(|a| a.status == ActivityStatus::Done)
            .take(RECENT_ACTIVITIES)
            .map(|a| ActivitySummary {
                name: a.name.clone(),
                type_label: a.activity_type.label().to_string(),
                date: format_date(a.date),
                location: a.location.clone(),
                beneficiary_count: a.beneficiaries(),
            })
            .collect(),
        programs: program_summaries(data),
        currency: currency.to_string(),
        general,
    }
}

fn general_stats(data: &ReportData) -> GeneralStats {
    let planned_budget: Decimal = sum_by(&data.projects, |p| Some(p.planned_budget));
    let realized_budget: Decimal = sum_by(&data.projects, |p| p.realized_budget);

    GeneralStats {
        total_projects: data.projects.len(),
        active_projects: data.projects.iter().filter(|p| p.status == ProjectStatus::Active).count(),
        total_activities: data.activities.len(),
        completed_activities: data.activities.iter().filter(|a| a.status == ActivityStatus::Done).count(),
        cancelled_activities: data
            .activities
            .iter()
            .filter(|a| a.status == ActivityStatus::Cancelled)
            .count(),
        total_beneficiaries: data.beneficiaries.len(),
        planned_budget,
        realized_budget,
        budget_execution: percentage_of(realized_budget, planned_budget),
    }
}

fn beneficiary_breakdown(data: &ReportData) -> BeneficiaryBreakdown {
    let total = data.beneficiaries.len();
    let women = data.beneficiaries.iter().filter(|b| b.sex == Sex::Female).count();
    let men = total - women;

    let categories = count_by(&data.beneficiaries, |b| Some(b.category.as_str()));
    let ranked: Vec<(String, usize)> = categories.into_iter().collect();
    let main_categories = top_n(&ranked, |(_, count)| *count, MAIN_CATEGORIES)
        .into_iter()
        .map(|(key, count)| {
            let label = Category::from_str(key).map_or_else(|| key.clone(), |c| c.label().to_string());
            (label, *count)
        })
        .collect();

    BeneficiaryBreakdown {
        total,
        women,
        men,
        women_percent: percentage_of(women, total),
        men_percent: percentage_of(men, total),
        ages: age_stats(&data.beneficiaries, |b| b.age),
        main_categories,
    }
}

fn impact_rows(data: &ReportData, targets: &ImpactTargets) -> Vec<ImpactRow> {
    let trained: i64 = data
        .activities
        .iter()
        .filter(|a| a.activity_type == ActivityType::Training && a.status == ActivityStatus::Done)
        .map(|a| a.beneficiaries())
        .sum();
    let women = data.beneficiaries.iter().filter(|b| b.sex == Sex::Female).count();
    let youth = data.beneficiaries.iter().filter(|b| b.category == Category::Youth).count();
    let insertion = data
        .indicators
        .iter()
        .find(|i| i.code.trim().eq_ignore_ascii_case(indicator_codes::INSERTION_RATE))
        .and_then(|i| i.actual_value);

    let row = |indicator: &str, target: f64, achieved: Option<f64>, is_rate: bool| ImpactRow {
        indicator: indicator.to_string(),
        target,
        achieved,
        percent_of_target: achieved.map(|value| percentage_of(value, target)),
        is_rate,
    };

    vec![
        row("People trained", targets.trained, Some(trained as f64), false),
        row("Employment insertion rate", targets.insertion_rate, insertion, true),
        row("Women supported", targets.women_reached, Some(women as f64), false),
        row("Youth reached", targets.youth_reached, Some(youth as f64), false),
    ]
}

fn program_summaries(data: &ReportData) -> Vec<ProgramSummary> {
    data.projects
        .iter()
        .map(|project| {
            let activities: Vec<_> = data
                .activities
                .iter()
                .filter(|a| a.project_id == Some(project.id))
                .collect();
            ProgramSummary {
                name: project.name.clone(),
                activities: activities.len(),
                completed_activities: activities.iter().filter(|a| a.status == ActivityStatus::Done).count(),
                people_reached: activities.iter().map(|a| a.beneficiaries()).sum(),
                budget_execution: percentage_of(project.realized(), project.planned_budget),
            }
        })
        .collect()
}

/// Indicator/value rows for the statistics sheet of the workbook
pub fn statistics_rows(stats: &ReportStats) -> Vec<Record> {
    let general = &stats.general;
    let entries = vec![
        ("Total projects", json!(general.total_projects)),
        ("Active projects", json!(general.active_projects)),
        ("Total activities", json!(general.total_activities)),
        ("Completed activities", json!(general.completed_activities)),
        ("Total beneficiaries", json!(general.total_beneficiaries)),
        ("Women (%)", json!(stats.beneficiaries.women_percent)),
        ("Men (%)", json!(stats.beneficiaries.men_percent)),
        ("Mean age", json!(stats.beneficiaries.ages.mean)),
        (
            "Planned budget",
            json!(format_currency(general.planned_budget, &stats.currency)),
        ),
        (
            "Realized budget",
            json!(format_currency(general.realized_budget, &stats.currency)),
        ),
        ("Budget execution (%)", json!(general.budget_execution)),
    ];

    entries
        .into_iter()
        .map(|(indicator, value)| {
            let mut row = Record::new();
            row.insert("indicator".to_string(), json!(indicator));
            row.insert("value".to_string(), value);
            row
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::domains::activity::types::Activity;
    use crate::domains::beneficiary::types::Beneficiary;
    use crate::domains::indicator::types::Indicator;
    use crate::domains::project::types::Project;
    use serde_json::Value;
    use uuid::Uuid;

    pub fn project(name: &str, status: &str, planned: i64, realized: i64) -> Project {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": name,
            "start_date": "2024-01-01",
            "end_date": "2024-12-31",
            "responsible": "Awa Ndiaye",
            "planned_budget": planned,
            "realized_budget": realized,
            "status": status
        }))
        .unwrap()
    }

    pub fn activity(project: Option<Uuid>, kind: &str, status: &str, count: i64) -> Activity {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": format!("{} session", kind),
            "project_id": project,
            "type": kind,
            "date": "2024-04-02",
            "location": "Kaolack",
            "beneficiary_count": count,
            "status": status
        }))
        .unwrap()
    }

    pub fn beneficiary(sex: &str, age: Value, category: &str) -> Beneficiary {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "code": "B",
            "sex": sex,
            "age": age,
            "category": category
        }))
        .unwrap()
    }

    pub fn indicator(code: &str, target: Option<f64>, actual: Option<f64>) -> Indicator {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "code": code,
            "name": code,
            "target_value": target,
            "actual_value": actual
        }))
        .unwrap()
    }

    /// Two projects at 50% budget execution, one cancelled activity
    pub fn sample_data() -> ReportData {
        let wells = project("Water wells", "active", 2_000_000, 1_000_000);
        let clinic = project("Clinic", "completed", 1_000_000, 500_000);
        let activities = vec![
            activity(Some(wells.id), "training", "done", 120),
            activity(Some(wells.id), "training", "planned", 40),
            activity(Some(clinic.id), "awareness", "done", 300),
            activity(Some(clinic.id), "workshop", "cancelled", 0),
        ];
        let beneficiaries = vec![
            beneficiary("F", json!(24), "women"),
            beneficiary("F", json!(31), "youth"),
            beneficiary("M", json!(19), "youth"),
            beneficiary("M", Value::Null, "migrants"),
        ];
        ReportData {
            projects: vec![wells, clinic],
            activities,
            beneficiaries,
            indicators: vec![indicator("insertion_rate", None, Some(63.0))],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_general_stats() {
        let stats = compute_report_stats(&sample_data(), &ImpactTargets::default(), "FCFA");
        assert_eq!(stats.general.active_projects, 1);
        assert_eq!(stats.general.completed_activities, 2);
        assert_eq!(stats.general.cancelled_activities, 1);
        assert_eq!(stats.general.planned_budget, dec!(3000000));
        assert_eq!(stats.general.budget_execution, 50);
        assert_eq!(stats.activities_by_type["training"], 2);
    }

    #[test]
    fn test_beneficiary_breakdown() {
        let stats = compute_report_stats(&sample_data(), &ImpactTargets::default(), "FCFA");
        let breakdown = &stats.beneficiaries;
        assert_eq!((breakdown.women, breakdown.men), (2, 2));
        assert_eq!(breakdown.women_percent, 50);
        assert_eq!(breakdown.ages.mean, 25);
        assert_eq!(breakdown.ages.min, 19);
        assert_eq!(breakdown.main_categories[0], ("Youth".to_string(), 2));
    }

    #[test]
    fn test_impact_rows_against_targets() {
        let stats = compute_report_stats(&sample_data(), &ImpactTargets::default(), "FCFA");
        let trained = &stats.impact[0];
        assert_eq!(trained.achieved, Some(120.0));
        assert_eq!(trained.percent_of_target, Some(12));

        let insertion = &stats.impact[1];
        assert_eq!(insertion.achieved, Some(63.0));
        assert_eq!(insertion.percent_of_target, Some(90));

        assert_eq!(stats.impact[3].achieved, Some(2.0));
    }

    #[test]
    fn test_insertion_rate_unmeasured_without_indicator() {
        let mut data = sample_data();
        data.indicators.clear();
        let stats = compute_report_stats(&data, &ImpactTargets::default(), "FCFA");
        assert_eq!(stats.impact[1].achieved, None);
        assert_eq!(stats.impact[1].percent_of_target, None);
    }

    #[test]
    fn test_top_projects_and_programs() {
        let stats = compute_report_stats(&sample_data(), &ImpactTargets::default(), "FCFA");
        assert_eq!(stats.top_projects[0].name, "Water wells");
        assert_eq!(stats.top_projects[0].planned_budget, "2 000 000 FCFA");
        assert_eq!(stats.recent_activities.len(), 2);
        assert_eq!(stats.programs[0].people_reached, 160);
        assert_eq!(stats.programs[1].completed_activities, 1);
    }

    #[test]
    fn test_statistics_rows() {
        let stats = compute_report_stats(&sample_data(), &ImpactTargets::default(), "FCFA");
        let rows = statistics_rows(&stats);
        assert_eq!(rows[0]["indicator"], "Total projects");
        assert_eq!(rows[0]["value"], 2);
        assert_eq!(rows.last().unwrap()["value"], 50);
    }
}
