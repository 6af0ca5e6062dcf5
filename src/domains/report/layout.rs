//! Paginated report documents.
//!
//! Documents are laid out top-down on A4 pages in millimetres. A section
//! starts on a new page when less than [`SECTION_SPACE`] remains below the
//! cursor, a line when less than [`LINE_SPACE`] remains.

use super::recommendations::recommendations;
use super::types::{ImpactRow, ReportKind, ReportStats};
use crate::domains::beneficiary::types::Category;
use crate::format::{format_currency, format_date};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

pub const PAGE_HEIGHT: f64 = 297.0;
pub const TOP_MARGIN: f64 = 20.0;
pub const SECTION_SPACE: f64 = 50.0;
pub const LINE_SPACE: f64 = 15.0;
/// Height of one project entry: name, two detail lines and the budget line
const PROJECT_ITEM_SPACE: f64 = 21.0;
const LEFT_MARGIN: f64 = 20.0;
const INDENT: f64 = 25.0;
const TABLE_ROW_HEIGHT: f64 = 8.0;
const SECTION_TITLE_HEIGHT: f64 = 15.0;
const NOT_MEASURED: &str = "n/a";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Title,
    Subtitle,
    Caption,
    Section,
    Strong,
    Body,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum Element {
    Text {
        x: f64,
        y: f64,
        style: TextStyle,
        text: String,
    },
    /// First row is the header
    Table { x: f64, y: f64, rows: Vec<Vec<String>> },
}

impl Element {
    pub fn y(&self) -> f64 {
        match self {
            Element::Text { y, .. } | Element::Table { y, .. } => *y,
        }
    }

    /// Lowest point the element reaches on its page
    pub fn bottom(&self) -> f64 {
        match self {
            Element::Text { y, .. } => *y,
            Element::Table { y, rows, .. } => y + table_height(rows),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub kind: ReportKind,
    pub title: String,
    pub file_name: String,
    pub pages: Vec<Page>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text element in reading order, tables flattened row by row
    pub fn lines(&self) -> Vec<String> {
        self.pages
            .iter()
            .flat_map(|page| page.elements.iter())
            .flat_map(|element| match element {
                Element::Text { text, .. } => vec![text.clone()],
                Element::Table { rows, .. } => rows.iter().map(|row| row.join(" | ")).collect(),
            })
            .collect()
    }

    /// Plain-text rendering, one block per page
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (index, page) in self.pages.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            out.push_str(&format!("--- Page {}/{} ---\n", index + 1, self.pages.len()));
            for element in &page.elements {
                match element {
                    Element::Text {
                        style: TextStyle::Section,
                        text,
                        ..
                    } => {
                        let rule = "=".repeat(text.chars().count());
                        out.push_str(&format!("\n{}\n{}\n", text, rule));
                    }
                    Element::Text { text, .. } => out.push_str(&format!("{}\n", text)),
                    Element::Table { rows, .. } => {
                        let widths = column_widths(rows);
                        for row in rows {
                            let cells: Vec<String> = row
                                .iter()
                                .enumerate()
                                .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
                                .collect();
                            out.push_str(cells.join(" | ").trim_end());
                            out.push('\n');
                        }
                    }
                }
            }
        }
        out
    }
}

fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|i| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

/// `report_<kind>_<YYYY-MM-DD>.pdf`
fn table_height(rows: &[Vec<String>]) -> f64 {
    rows.len() as f64 * TABLE_ROW_HEIGHT
}

pub fn document_file_name(kind: ReportKind, date: NaiveDate) -> String {
    format!("report_{}_{}.pdf", kind.as_str(), date.format("%Y-%m-%d"))
}

/// Cursor over a growing list of pages
struct Layout {
    pages: Vec<Page>,
    y: f64,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y: TOP_MARGIN,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = TOP_MARGIN;
    }

    fn ensure_space(&mut self, space: f64) {
        if self.y > PAGE_HEIGHT - space {
            self.new_page();
        }
    }

    fn advance(&mut self, by: f64) {
        self.y += by;
    }

    fn place(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    fn text(&mut self, x: f64, style: TextStyle, text: impl Into<String>, advance: f64) {
        let y = self.y;
        self.place(Element::Text {
            x,
            y,
            style,
            text: text.into(),
        });
        self.advance(advance);
    }

    fn section(&mut self, title: &str) {
        self.ensure_space(SECTION_SPACE);
        self.text(LEFT_MARGIN, TextStyle::Section, title, SECTION_TITLE_HEIGHT);
    }

    /// Section whose body is a single table, kept on the same page as its title
    fn table_section(&mut self, title: &str, rows: Vec<Vec<String>>) {
        let needed = SECTION_TITLE_HEIGHT + table_height(&rows) + LINE_SPACE;
        self.ensure_space(needed.max(SECTION_SPACE));
        self.text(LEFT_MARGIN, TextStyle::Section, title, SECTION_TITLE_HEIGHT);
        self.table(rows);
    }

    fn bullet(&mut self, text: impl AsRef<str>) {
        self.ensure_space(LINE_SPACE);
        self.text(LEFT_MARGIN, TextStyle::Body, format!("• {}", text.as_ref()), 7.0);
    }

    fn table(&mut self, rows: Vec<Vec<String>>) {
        let height = table_height(&rows);
        self.ensure_space(height + LINE_SPACE);
        let y = self.y;
        self.place(Element::Table { x: LEFT_MARGIN, y, rows });
        self.advance(height + 15.0);
    }

    fn finish(self, kind: ReportKind, title: String, date: NaiveDate) -> ReportDocument {
        ReportDocument {
            kind,
            title,
            file_name: document_file_name(kind, date),
            pages: self.pages,
        }
    }
}

/// Lay out a report of the given kind from precomputed figures
pub fn render_document(kind: ReportKind, stats: &ReportStats, organization: &str, today: NaiveDate) -> ReportDocument {
    let mut layout = Layout::new();
    match kind {
        ReportKind::Monthly => monthly(&mut layout, stats, organization, today),
        ReportKind::Impact => impact(&mut layout, stats, organization),
        ReportKind::Annual => annual(&mut layout, stats, organization, today),
    }
    layout.finish(kind, kind.title().to_string(), today)
}

fn generated_on(today: NaiveDate) -> String {
    format!("Generated on {}", format_date(today))
}

fn monthly(layout: &mut Layout, stats: &ReportStats, organization: &str, today: NaiveDate) {
    layout.text(LEFT_MARGIN, TextStyle::Title, organization, 10.0);
    layout.text(LEFT_MARGIN, TextStyle::Subtitle, ReportKind::Monthly.title(), 5.0);
    layout.text(LEFT_MARGIN, TextStyle::Caption, generated_on(today), 20.0);

    summary_section(layout, stats);
    if !stats.top_projects.is_empty() {
        projects_section(layout, stats);
    }
    if stats.general.total_activities > 0 {
        activities_section(layout, stats);
    }
    if stats.beneficiaries.total > 0 {
        beneficiaries_section(layout, stats);
    }
    recommendations_section(layout, stats);
}

fn impact(layout: &mut Layout, stats: &ReportStats, organization: &str) {
    layout.text(LEFT_MARGIN, TextStyle::Title, "IMPACT REPORT", 10.0);
    layout.text(
        LEFT_MARGIN,
        TextStyle::Subtitle,
        format!("Impact analysis of {} programmes", organization),
        20.0,
    );

    layout.table_section("KEY IMPACT INDICATORS", impact_table(&stats.impact));

    if !stats.programs.is_empty() {
        layout.section("PROGRAMME ANALYSIS");
        for program in &stats.programs {
            layout.bullet(format!(
                "{}: {} activities ({} completed), {} people reached, budget execution {}%",
                program.name, program.activities, program.completed_activities, program.people_reached, program.budget_execution
            ));
        }
        layout.advance(10.0);
    }
    recommendations_section(layout, stats);
}

fn annual(layout: &mut Layout, stats: &ReportStats, organization: &str, today: NaiveDate) {
    layout.advance(100.0);
    layout.text(LEFT_MARGIN, TextStyle::Title, organization, 15.0);
    layout.text(
        LEFT_MARGIN,
        TextStyle::Subtitle,
        format!("{} {}", ReportKind::Annual.title(), today.year()),
        10.0,
    );
    layout.text(LEFT_MARGIN, TextStyle::Caption, generated_on(today), 0.0);

    layout.new_page();
    summary_section(layout, stats);
    if stats.beneficiaries.total > 0 {
        beneficiaries_section(layout, stats);
    }

    layout.new_page();
    layout.text(LEFT_MARGIN, TextStyle::Title, "DETAILED ANALYSIS", 15.0);
    if !stats.top_projects.is_empty() {
        projects_section(layout, stats);
    }
    if stats.general.total_activities > 0 {
        activities_section(layout, stats);
    }
    if !stats.beneficiaries_by_category.is_empty() {
        layout.section("BENEFICIARIES BY CATEGORY");
        for (key, count) in &stats.beneficiaries_by_category {
            let label = Category::from_str(key).map_or_else(|| key.clone(), |c| c.label().to_string());
            layout.bullet(format!("{}: {}", label, count));
        }
        layout.advance(10.0);
    }
    layout.table_section("KEY IMPACT INDICATORS", impact_table(&stats.impact));
    recommendations_section(layout, stats);
}

fn summary_section(layout: &mut Layout, stats: &ReportStats) {
    let general = &stats.general;
    layout.section("EXECUTIVE SUMMARY");
    layout.bullet(format!("Active projects: {}", general.active_projects));
    layout.bullet(format!("Completed activities: {}", general.completed_activities));
    layout.bullet(format!("Beneficiaries supported: {}", general.total_beneficiaries));
    layout.bullet(format!(
        "Total budget committed: {}",
        format_currency(general.planned_budget, &stats.currency)
    ));
    layout.bullet(format!("Budget execution rate: {}%", general.budget_execution));
    layout.advance(10.0);
}

fn projects_section(layout: &mut Layout, stats: &ReportStats) {
    layout.section("CURRENT PROJECTS");
    for project in &stats.top_projects {
        layout.ensure_space(PROJECT_ITEM_SPACE);
        layout.text(LEFT_MARGIN, TextStyle::Strong, format!("• {}", project.name), 5.0);
        layout.text(INDENT, TextStyle::Body, format!("  Responsible: {}", project.responsible), 4.0);
        layout.text(INDENT, TextStyle::Body, format!("  Period: {}", project.period), 4.0);
        layout.text(
            INDENT,
            TextStyle::Body,
            format!("  Budget: {} | Status: {}", project.planned_budget, project.status_label),
            8.0,
        );
    }
    layout.advance(5.0);
}

fn activities_section(layout: &mut Layout, stats: &ReportStats) {
    layout.section("RECENT ACTIVITIES");
    for activity in &stats.recent_activities {
        layout.ensure_space(LINE_SPACE);
        layout.text(
            LEFT_MARGIN,
            TextStyle::Body,
            format!("• {} ({})", activity.name, activity.type_label),
            4.0,
        );
        layout.text(
            INDENT,
            TextStyle::Body,
            format!(
                "  {} - {} - {} beneficiaries",
                activity.date, activity.location, activity.beneficiary_count
            ),
            7.0,
        );
    }
    layout.advance(5.0);
}

fn beneficiaries_section(layout: &mut Layout, stats: &ReportStats) {
    let breakdown = &stats.beneficiaries;
    layout.section("BENEFICIARY ANALYSIS");
    layout.bullet(format!(
        "Split by sex: {} women ({}%), {} men ({}%)",
        breakdown.women, breakdown.women_percent, breakdown.men, breakdown.men_percent
    ));
    layout.bullet(format!(
        "Mean age: {} years (from {} to {})",
        breakdown.ages.mean, breakdown.ages.min, breakdown.ages.max
    ));
    let categories: Vec<String> = breakdown
        .main_categories
        .iter()
        .map(|(label, count)| format!("{} ({})", label, count))
        .collect();
    layout.bullet(format!("Main categories: {}", categories.join(", ")));
    layout.advance(10.0);
}

fn recommendations_section(layout: &mut Layout, stats: &ReportStats) {
    layout.section("RECOMMENDATIONS");
    for item in recommendations(stats) {
        layout.bullet(item);
    }
}

fn impact_table(rows: &[ImpactRow]) -> Vec<Vec<String>> {
    let amount = |value: f64, is_rate: bool| {
        if is_rate {
            format!("{}%", value)
        } else {
            value.to_string()
        }
    };

    let mut table = vec![vec![
        "Indicator".to_string(),
        "Target".to_string(),
        "Achieved".to_string(),
        "% of target".to_string(),
    ]];
    for row in rows {
        table.push(vec![
            row.indicator.clone(),
            amount(row.target, row.is_rate),
            row.achieved
                .map(|v| amount(v, row.is_rate))
                .unwrap_or_else(|| NOT_MEASURED.to_string()),
            row.percent_of_target
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| NOT_MEASURED.to_string()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::report::stats::compute_report_stats;
    use crate::domains::report::stats::fixtures::sample_data;
    use crate::domains::report::types::{ActivitySummary, ImpactTargets};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn stats() -> ReportStats {
        compute_report_stats(&sample_data(), &ImpactTargets::default(), "FCFA")
    }

    fn section_titles(document: &ReportDocument) -> Vec<String> {
        document
            .pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| match e {
                Element::Text { style: TextStyle::Section, text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_monthly_section_order() {
        let document = render_document(ReportKind::Monthly, &stats(), "Relief Org", today());
        assert_eq!(
            section_titles(&document),
            vec![
                "EXECUTIVE SUMMARY",
                "CURRENT PROJECTS",
                "RECENT ACTIVITIES",
                "BENEFICIARY ANALYSIS",
                "RECOMMENDATIONS"
            ]
        );
        assert_eq!(document.file_name, "report_monthly_2024-06-30.pdf");
        assert!(document.lines().iter().any(|l| l == "• Budget execution rate: 50%"));
    }

    #[test]
    fn test_recommendations_follow_thresholds() {
        let document = render_document(ReportKind::Monthly, &stats(), "Relief Org", today());
        let lines = document.lines();
        assert!(lines.iter().any(|l| l.contains("budget tracking")));
        assert!(lines.iter().any(|l| l.contains("cancelled")));
    }

    #[test]
    fn test_elements_stay_on_page_and_break() {
        let document = render_document(ReportKind::Monthly, &stats(), "Relief Org", today());
        assert!(document.page_count() >= 2);
        for page in &document.pages {
            for element in &page.elements {
                assert!(element.y() >= TOP_MARGIN && element.y() <= PAGE_HEIGHT);
            }
        }
        for element in document.pages.iter().flat_map(|p| p.elements.iter()) {
            if let Element::Text { style: TextStyle::Section, y, .. } = element {
                assert!(*y <= PAGE_HEIGHT - SECTION_SPACE);
            }
        }
    }

    fn assert_within_pages(document: &ReportDocument) {
        for (index, page) in document.pages.iter().enumerate() {
            for element in &page.elements {
                assert!(
                    element.y() >= TOP_MARGIN && element.bottom() <= PAGE_HEIGHT,
                    "element on page {} spans {} to {}",
                    index + 1,
                    element.y(),
                    element.bottom()
                );
            }
        }
    }

    #[test]
    fn test_annual_tables_never_cross_page_bottom() {
        let base = stats();
        for categories in 0..60 {
            for recent in 0..9 {
                let mut stats = base.clone();
                stats.beneficiaries_by_category = (0..categories).map(|i| (format!("group {}", i), i + 1)).collect();
                stats.recent_activities = (0..recent)
                    .map(|i| ActivitySummary {
                        name: format!("Visit {}", i),
                        type_label: "Training".to_string(),
                        date: "01/03/2024".to_string(),
                        location: "Kolda".to_string(),
                        beneficiary_count: 10,
                    })
                    .collect();
                let document = render_document(ReportKind::Annual, &stats, "Relief Org", today());
                assert_within_pages(&document);
            }
        }
    }

    #[test]
    fn test_table_section_keeps_title_with_table() {
        let mut layout = Layout::new();
        layout.y = PAGE_HEIGHT - SECTION_SPACE - 1.0;
        layout.table_section("KEY IMPACT INDICATORS", impact_table(&stats().impact));

        assert_eq!(layout.pages.len(), 2);
        assert!(layout.pages[0].elements.is_empty());
        assert_eq!(layout.pages[1].elements.len(), 2);
    }

    #[test]
    fn test_project_entries_fit_reserved_space() {
        let mut layout = Layout::new();
        let before = layout.y;
        projects_section(&mut layout, &stats());
        let entries = stats().top_projects.len() as f64;
        assert!(layout.y - before - SECTION_TITLE_HEIGHT - 5.0 <= entries * PROJECT_ITEM_SPACE);
    }

    #[test]
    fn test_line_breaks_to_new_page() {
        let mut layout = Layout::new();
        for i in 0..40 {
            layout.bullet(format!("line {}", i));
        }
        assert_eq!(layout.pages.len(), 2);
        let last_on_first = layout.pages[0].elements.last().map(Element::y).unwrap();
        assert!(last_on_first <= PAGE_HEIGHT - LINE_SPACE);
        assert_eq!(layout.pages[1].elements[0].y(), TOP_MARGIN);
    }

    #[test]
    fn test_impact_table_marks_unmeasured() {
        let mut data = sample_data();
        data.indicators.clear();
        let stats = compute_report_stats(&data, &ImpactTargets::default(), "FCFA");
        let document = render_document(ReportKind::Impact, &stats, "Relief Org", today());

        let table = document
            .pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .find_map(|e| match e {
                Element::Table { rows, .. } => Some(rows.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(table[0][0], "Indicator");
        assert_eq!(table[1], vec!["People trained", "1000", "120", "12%"]);
        assert_eq!(table[2], vec!["Employment insertion rate", "70%", "n/a", "n/a"]);
    }

    #[test]
    fn test_annual_has_cover_and_text_rendering() {
        let document = render_document(ReportKind::Annual, &stats(), "Relief Org", today());
        assert!(document.page_count() >= 3);
        assert_eq!(document.pages[0].elements.len(), 3);

        let text = document.render_text();
        assert!(text.starts_with("--- Page 1/"));
        assert!(text.contains("Annual Report 2024"));
        assert!(text.contains("EXECUTIVE SUMMARY\n================="));
    }
}
