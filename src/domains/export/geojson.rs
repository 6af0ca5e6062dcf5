use crate::domains::activity::types::Activity;
use crate::errors::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// `[longitude, latitude]`
    Point { coordinates: [f64; 2] },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityProperties {
    pub name: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub project: Option<String>,
    pub date: String,
    pub location: String,
    pub beneficiary_count: i64,
    pub status: String,
    pub responsible: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: ActivityProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// One Point feature per activity with both coordinates.
    /// `project_name` resolves the owning project, `None` when unknown.
    pub fn from_activities<'a, I, F>(activities: I, project_name: F) -> Self
    where
        I: IntoIterator<Item = &'a Activity>,
        F: Fn(&Activity) -> Option<String>,
    {
        let features = activities
            .into_iter()
            .filter_map(|activity| {
                let (lat, lng) = activity.coordinates()?;
                Some(Feature {
                    geometry: Geometry::Point { coordinates: [lng, lat] },
                    properties: ActivityProperties {
                        name: activity.name.clone(),
                        activity_type: activity.activity_type.as_str().to_string(),
                        project: project_name(activity),
                        date: activity.date.to_string(),
                        location: activity.location.clone(),
                        beneficiary_count: activity.beneficiaries(),
                        status: activity.status.as_str().to_string(),
                        responsible: activity.responsible.clone(),
                    },
                })
            })
            .collect();
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_pretty_json(&self) -> ServiceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ServiceError::Export(format!("GeoJSON encoding failed: {}", e)))
    }
}
