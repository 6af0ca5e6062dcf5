use super::types::{
    directions_url, type_color, BoundingBox, LatLng, MapFilter, MapStats, MapView, Marker, Popup, PopupAction,
    FIT_PADDING,
};
use crate::config::MapSettings;
use crate::domains::activity::types::{Activity, ActivityType, MISSING_REFERENCE};
use crate::domains::aggregation::count_by;
use crate::domains::export::FeatureCollection;
use crate::domains::project::types::Project;
use crate::format::format_date;
use log::debug;
use std::collections::HashMap;
use uuid::Uuid;

/// Geocoded activities as markers, with the current filter and viewport
pub struct MapLayer {
    default_view: MapView,
    view: MapView,
    filter: MapFilter,
    activities: Vec<Activity>,
    projects: Vec<(Uuid, String)>,
    project_names: HashMap<Uuid, String>,
    markers: Vec<Marker>,
}

impl MapLayer {
    pub fn new(settings: &MapSettings) -> Self {
        let default_view = MapView::Centered {
            center: LatLng::from(settings.center),
            zoom: settings.zoom,
        };
        Self {
            default_view,
            view: default_view,
            filter: MapFilter::default(),
            activities: Vec::new(),
            projects: Vec::new(),
            project_names: HashMap::new(),
            markers: Vec::new(),
        }
    }

    /// Replace the data and rebuild markers under the current filter
    pub fn set_data(&mut self, activities: Vec<Activity>, projects: &[Project]) -> usize {
        self.projects = projects.iter().map(|p| (p.id, p.name.clone())).collect();
        self.project_names = self.projects.iter().cloned().collect();
        self.activities = activities;
        self.refresh()
    }

    pub fn set_filter(&mut self, filter: MapFilter) -> usize {
        self.filter = filter;
        self.refresh()
    }

    pub fn filter(&self) -> MapFilter {
        self.filter
    }

    /// Rebuild markers from the layer's own activities
    pub fn refresh(&mut self) -> usize {
        let activities = std::mem::take(&mut self.activities);
        let count = self.refresh_markers(&activities);
        self.activities = activities;
        count
    }

    /// Clear all markers and create one per activity that matches the filter
    /// and has both coordinates. The view is fitted to the new markers with
    /// padding; with no markers the previous view is kept.
    pub fn refresh_markers(&mut self, activities: &[Activity]) -> usize {
        self.markers = activities
            .iter()
            .filter(|activity| self.filter.matches(activity))
            .filter_map(|activity| self.marker_for(activity))
            .collect();

        match BoundingBox::around(self.markers.iter().map(|m| m.position)) {
            Some(bounds) => self.view = MapView::Bounds(bounds.pad(FIT_PADDING)),
            None => debug!("No geocoded activity to show, keeping the current view"),
        }
        self.markers.len()
    }

    fn marker_for(&self, activity: &Activity) -> Option<Marker> {
        let (lat, lng) = activity.coordinates()?;
        let position = LatLng::new(lat, lng);
        Some(Marker {
            activity_id: activity.id,
            position,
            color: type_color(activity.activity_type),
            popup: Popup {
                title: activity.name.clone(),
                type_label: activity.activity_type.label().to_string(),
                project_name: self.project_name(activity.project_id),
                date: format_date(activity.date),
                location: activity.location.clone(),
                beneficiary_count: activity.beneficiaries(),
                status_label: activity.status.label().to_string(),
                responsible: activity.responsible.clone(),
                actions: vec![
                    PopupAction::ViewDetail(activity.id),
                    PopupAction::Directions(directions_url(position)),
                ],
            },
        })
    }

    pub fn project_name(&self, project_id: Option<Uuid>) -> String {
        project_id
            .and_then(|id| self.project_names.get(&id))
            .cloned()
            .unwrap_or_else(|| MISSING_REFERENCE.to_string())
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn view(&self) -> MapView {
        self.view
    }

    pub fn reset_view(&mut self) {
        self.view = self.default_view;
    }

    /// Activities currently shown as markers
    pub fn visible_activities(&self) -> Vec<&Activity> {
        self.activities
            .iter()
            .filter(|a| self.filter.matches(a) && a.coordinates().is_some())
            .collect()
    }

    pub fn stats(&self) -> MapStats {
        let visible: Vec<&Activity> = self.visible_activities();
        MapStats {
            displayed: visible.len(),
            total_beneficiaries: visible.iter().map(|a| a.beneficiaries()).sum(),
            by_type: count_by(&visible, |a| Some(a.activity_type.as_str())),
            by_status: count_by(&visible, |a| Some(a.status.as_str())),
        }
    }

    /// Types present in the loaded activities, in canonical order
    pub fn type_options(&self) -> Vec<ActivityType> {
        ActivityType::ALL
            .iter()
            .copied()
            .filter(|t| self.activities.iter().any(|a| a.activity_type == *t))
            .collect()
    }

    pub fn project_options(&self) -> &[(Uuid, String)] {
        &self.projects
    }

    /// Visible activities as GeoJSON, unknown projects as null
    pub fn geojson(&self) -> FeatureCollection {
        FeatureCollection::from_activities(self.visible_activities(), |activity| {
            activity
                .project_id
                .and_then(|id| self.project_names.get(&id))
                .cloned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project(name: &str) -> Project {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": name,
            "start_date": "2024-01-01",
            "end_date": "2024-12-31",
            "responsible": "Awa",
            "planned_budget": 1000
        }))
        .unwrap()
    }

    fn activity(project: Option<Uuid>, kind: &str, lat: Option<f64>, lng: Option<f64>, count: i64) -> Activity {
        serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "name": format!("{} visit", kind),
            "project_id": project,
            "type": kind,
            "date": "2024-03-15",
            "location": "Tambacounda",
            "beneficiary_count": count,
            "status": "done",
            "latitude": lat,
            "longitude": lng
        }))
        .unwrap()
    }

    fn layer_with_data() -> (MapLayer, Project, Project) {
        let wells = project("Water wells");
        let clinic = project("Clinic");
        let mut layer = MapLayer::new(&MapSettings::default());
        layer.set_data(
            vec![
                activity(Some(wells.id), "training", Some(14.0), Some(-17.0), 10),
                activity(Some(wells.id), "workshop", Some(16.0), Some(-13.0), 5),
                activity(Some(clinic.id), "training", Some(12.5), Some(-12.2), 7),
                activity(Some(clinic.id), "training", None, Some(-12.0), 3),
            ],
            &[wells.clone(), clinic.clone()],
        );
        (layer, wells, clinic)
    }

    #[test]
    fn test_only_geocoded_activities_get_markers() {
        let (layer, _, _) = layer_with_data();
        assert_eq!(layer.markers().len(), 3);
        assert_eq!(layer.stats().total_beneficiaries, 22);
    }

    #[test]
    fn test_filter_is_project_and_type() {
        let (mut layer, wells, _) = layer_with_data();
        let count = layer.set_filter(MapFilter {
            project_id: Some(wells.id),
            activity_type: Some(ActivityType::Training),
        });
        assert_eq!(count, 1);
        assert_eq!(layer.markers()[0].popup.project_name, "Water wells");
        assert_eq!(layer.markers()[0].color, "#3498db");

        let stats = layer.stats();
        assert_eq!(stats.displayed, 1);
        assert_eq!(stats.by_type["training"], 1);
    }

    #[test]
    fn test_view_fits_markers_with_padding() {
        let (layer, _, _) = layer_with_data();
        let MapView::Bounds(bounds) = layer.view() else {
            panic!("expected a fitted view");
        };
        for marker in layer.markers() {
            assert!(bounds.contains(marker.position));
        }
        assert!(bounds.south < 12.5 && bounds.north > 16.0);
    }

    #[test]
    fn test_empty_result_keeps_previous_view() {
        let (mut layer, _, _) = layer_with_data();
        let before = layer.view();
        let count = layer.set_filter(MapFilter {
            project_id: Some(Uuid::new_v4()),
            activity_type: None,
        });
        assert_eq!(count, 0);
        assert_eq!(layer.view(), before);

        layer.reset_view();
        assert_eq!(
            layer.view(),
            MapView::Centered { center: LatLng::new(14.7167, -17.4667), zoom: 7 }
        );
    }

    #[test]
    fn test_popup_actions() {
        let (layer, _, _) = layer_with_data();
        let marker = &layer.markers()[0];
        assert_eq!(marker.popup.actions[0], PopupAction::ViewDetail(marker.activity_id));
        assert_eq!(
            marker.popup.actions[1],
            PopupAction::Directions("https://www.google.com/maps/dir/?api=1&destination=14,-17".to_string())
        );
    }

    #[test]
    fn test_options_and_geojson() {
        let (mut layer, _, clinic) = layer_with_data();
        assert_eq!(layer.type_options(), vec![ActivityType::Training, ActivityType::Workshop]);
        assert_eq!(layer.project_options().len(), 2);

        layer.set_filter(MapFilter { project_id: Some(clinic.id), activity_type: None });
        let geojson = layer.geojson();
        assert_eq!(geojson.len(), 1);
        assert_eq!(geojson.features[0].properties.project.as_deref(), Some("Clinic"));
    }
}
