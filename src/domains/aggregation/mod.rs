//! Pure aggregation over loaded collections. Nothing here performs I/O.

pub mod kpis;
pub mod stats;

pub use kpis::{
    activities_by_type, beneficiaries_by_category, budget_comparison, dashboard_kpis, labelled_counts,
    monthly_evolution, ChartDataset, ChartSeries, DashboardKpis,
};
pub use stats::{age_stats, count_by, percentage_of, sum_by, top_n, AgeStats, UNDEFINED_KEY};
