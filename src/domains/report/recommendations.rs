use super::types::ReportStats;

/// Budget execution below this percent asks for closer financial tracking
pub const BUDGET_EXECUTION_THRESHOLD: i64 = 70;

const STANDING_RECOMMENDATIONS: [&str; 3] = [
    "Keep developing local partnerships",
    "Strengthen monitoring and evaluation data collection",
    "Expand vocational training activities",
];

/// Threshold-driven recommendations first, then the standing ones
pub fn recommendations(stats: &ReportStats) -> Vec<String> {
    let mut items = Vec::new();

    if stats.general.budget_execution < BUDGET_EXECUTION_THRESHOLD {
        items.push("Strengthen budget tracking and financial planning".to_string());
    }
    if stats.general.cancelled_activities > 0 {
        items.push("Analyse why activities were cancelled and put preventive measures in place".to_string());
    }

    items.extend(STANDING_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::report::types::GeneralStats;

    fn stats(budget_execution: i64, cancelled_activities: usize) -> ReportStats {
        ReportStats {
            general: GeneralStats {
                budget_execution,
                cancelled_activities,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_low_execution_and_cancellations() {
        let items = recommendations(&stats(69, 2));
        assert_eq!(items.len(), 5);
        assert!(items[0].contains("budget tracking"));
        assert!(items[1].contains("cancelled"));
    }

    #[test]
    fn test_healthy_figures_only_standing_items() {
        let items = recommendations(&stats(70, 0));
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], STANDING_RECOMMENDATIONS[0]);
    }
}
