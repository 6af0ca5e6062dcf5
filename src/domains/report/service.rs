use super::layout::{render_document, ReportDocument};
use super::stats::{compute_report_stats, statistics_rows};
use super::types::{ReportData, ReportKind, ReportStats};
use crate::config::ReportSettings;
use crate::domains::activity::types::{self as activity_types, Activity, MISSING_REFERENCE};
use crate::domains::beneficiary::types::{self as beneficiary_types, Beneficiary};
use crate::domains::core::feedback::{messages, Notifier};
use crate::domains::core::manager::ManagedEntity;
use crate::domains::core::repository::{fetch_all, RepositoryClient};
use crate::domains::export::{build_workbook, ExportFile, ExportFormat, Sheet};
use crate::domains::indicator::types::Indicator;
use crate::domains::project::types::{self as project_types, Project};
use crate::errors::{ApiResult, ServiceError, ServiceResult};
use crate::types::{Collection, Fetched};
use chrono::NaiveDate;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Report documents and workbook exports over freshly loaded data
pub struct ReportService {
    repo: Arc<dyn RepositoryClient>,
    notifier: Arc<dyn Notifier>,
    settings: ReportSettings,
}

impl ReportService {
    pub fn new(repo: Arc<dyn RepositoryClient>, notifier: Arc<dyn Notifier>, settings: ReportSettings) -> Self {
        Self {
            repo,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Fetch the four collections concurrently. Projects, activities and
    /// beneficiaries are required; indicators only refine the targets.
    pub async fn load_data(&self) -> ServiceResult<ReportData> {
        let repo = self.repo.as_ref();
        let project_query = Project::list_query();
        let activity_query = Activity::list_query();
        let beneficiary_query = Beneficiary::list_query();
        let indicator_query = Indicator::list_query();
        let (projects, activities, beneficiaries, indicators) = futures::join!(
            fetch_all::<Project>(repo, Collection::Projects, &project_query),
            fetch_all::<Activity>(repo, Collection::Activities, &activity_query),
            fetch_all::<Beneficiary>(repo, Collection::Beneficiaries, &beneficiary_query),
            fetch_all::<Indicator>(repo, Collection::Indicators, &indicator_query)
        );

        let projects = self.required(projects)?;
        let activities = self.required(activities)?;
        let beneficiaries = self.required(beneficiaries)?;

        let indicators = match Fetched::from(indicators) {
            Fetched::Loaded(indicators) => indicators,
            Fetched::Failed(e) => {
                warn!("Indicators unavailable, using configured targets: {}", e);
                Vec::new()
            }
        };

        Ok(ReportData {
            projects,
            activities,
            beneficiaries,
            indicators,
        })
    }

    fn required<T>(&self, result: ApiResult<T>) -> ServiceResult<T> {
        result.map_err(|e| {
            warn!("Report data unavailable: {}", e);
            self.notifier.error(messages::LOAD_FAILED);
            e.into()
        })
    }

    pub fn stats(&self, data: &ReportData) -> ReportStats {
        compute_report_stats(data, &self.settings.impact_targets, &self.settings.currency)
    }

    pub async fn generate(&self, kind: ReportKind, today: NaiveDate) -> ServiceResult<ReportDocument> {
        let data = self.load_data().await?;
        let document = render_document(kind, &self.stats(&data), &self.settings.organization, today);
        info!("Generated {} report over {} pages", kind, document.page_count());
        self.notifier.success(messages::REPORT_SUCCESS);
        Ok(document)
    }

    /// Plain-text file of a rendered document
    pub fn text_file(document: &ReportDocument, date: NaiveDate) -> ExportFile {
        let stem = format!("report_{}", document.kind.as_str());
        ExportFile::new(&stem, date, ExportFormat::Text, document.render_text())
    }

    /// Projects, activities, beneficiaries and statistics as four CSV files
    pub async fn export_workbook(&self, today: NaiveDate) -> ServiceResult<Vec<ExportFile>> {
        let data = self.load_data().await?;
        let sheets = self.workbook_sheets(&data);
        if sheets.iter().take(3).all(|sheet| sheet.rows.is_empty()) {
            self.notifier.error(messages::NOTHING_TO_EXPORT);
            return Err(ServiceError::Export(messages::NOTHING_TO_EXPORT.to_string()));
        }

        match build_workbook(sheets, today) {
            Ok(files) => {
                info!("Workbook exported as {} files", files.len());
                self.notifier.success(messages::EXPORT_SUCCESS);
                Ok(files)
            }
            Err(e) => {
                self.notifier.error(messages::EXPORT_FAILED);
                Err(e)
            }
        }
    }

    fn workbook_sheets(&self, data: &ReportData) -> Vec<Sheet> {
        let project_names: HashMap<Uuid, &str> = data.projects.iter().map(|p| (p.id, p.name.as_str())).collect();
        let activity_names: HashMap<Uuid, &str> = data.activities.iter().map(|a| (a.id, a.name.as_str())).collect();
        vec![
            Sheet::new("projects", project_types::export_records(&data.projects)),
            Sheet::new(
                "activities",
                activity_types::export_records(&data.activities, |id| name_or_missing(&project_names, id)),
            ),
            Sheet::new(
                "beneficiaries",
                beneficiary_types::export_records(
                    &data.beneficiaries,
                    |id| name_or_missing(&project_names, id),
                    |id| name_or_missing(&activity_names, id),
                ),
            ),
            Sheet::new("statistics", statistics_rows(&self.stats(data))),
        ]
    }
}

fn name_or_missing(names: &HashMap<Uuid, &str>, id: Option<Uuid>) -> String {
    id.and_then(|id| names.get(&id).map(|name| name.to_string()))
        .unwrap_or_else(|| MISSING_REFERENCE.to_string())
}
