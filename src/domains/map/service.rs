use super::layer::MapLayer;
use super::types::{MapFilter, MapStats};
use crate::config::MapSettings;
use crate::domains::activity::types::Activity;
use crate::domains::core::feedback::{messages, Notifier};
use crate::domains::core::manager::ManagedEntity;
use crate::domains::core::repository::{fetch_all, RepositoryClient};
use crate::domains::export::{ExportFile, ExportFormat};
use crate::domains::project::types::Project;
use crate::errors::{ServiceError, ServiceResult};
use crate::types::{Collection, Fetched};
use chrono::NaiveDate;
use log::{info, warn};
use std::sync::Arc;

const GEOJSON_FILE_STEM: &str = "activities_map";

/// Loads activities and projects into the map layer
pub struct MapService {
    repo: Arc<dyn RepositoryClient>,
    notifier: Arc<dyn Notifier>,
    layer: MapLayer,
}

impl MapService {
    pub fn new(repo: Arc<dyn RepositoryClient>, notifier: Arc<dyn Notifier>, settings: &MapSettings) -> Self {
        Self {
            repo,
            notifier,
            layer: MapLayer::new(settings),
        }
    }

    /// Fetch activities and projects concurrently, then rebuild markers.
    /// Without activities the layer keeps its previous markers; without
    /// projects popups show the missing-reference label.
    pub async fn load(&mut self) -> ServiceResult<usize> {
        let repo = self.repo.as_ref();
        let activity_query = Activity::list_query();
        let project_query = Project::list_query();
        let (activities, projects) = futures::join!(
            fetch_all::<Activity>(repo, Collection::Activities, &activity_query),
            fetch_all::<Project>(repo, Collection::Projects, &project_query)
        );

        let activities = match activities {
            Ok(activities) => activities,
            Err(e) => {
                warn!("Map activities unavailable: {}", e);
                self.notifier.error(messages::LOAD_FAILED);
                return Err(e.into());
            }
        };
        let projects = match Fetched::from(projects) {
            Fetched::Loaded(projects) => projects,
            Fetched::Failed(e) => {
                warn!("Project names unavailable for map: {}", e);
                self.notifier.error(messages::LOAD_FAILED);
                Vec::new()
            }
        };

        let shown = self.layer.set_data(activities, &projects);
        info!("Map shows {} geocoded activities", shown);
        Ok(shown)
    }

    pub fn layer(&self) -> &MapLayer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut MapLayer {
        &mut self.layer
    }

    pub fn apply_filter(&mut self, filter: MapFilter) -> usize {
        self.layer.set_filter(filter)
    }

    pub fn stats(&self) -> MapStats {
        self.layer.stats()
    }

    /// GeoJSON file of the visible activities
    pub fn export_geojson(&self, today: NaiveDate) -> ServiceResult<ExportFile> {
        let collection = self.layer.geojson();
        if collection.is_empty() {
            self.notifier.error(messages::NOTHING_TO_EXPORT);
            return Err(ServiceError::Export("No geocoded activity to export".to_string()));
        }

        match collection.to_pretty_json() {
            Ok(contents) => {
                self.notifier.success(messages::EXPORT_SUCCESS);
                Ok(ExportFile::new(GEOJSON_FILE_STEM, today, ExportFormat::GeoJson, contents))
            }
            Err(e) => {
                self.notifier.error(messages::EXPORT_FAILED);
                Err(e)
            }
        }
    }
}
