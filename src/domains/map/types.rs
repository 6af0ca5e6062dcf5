use crate::domains::activity::types::{Activity, ActivityType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Padding ratio applied when fitting the view to markers
pub const FIT_PADDING: f64 = 0.1;

const DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/?api=1&destination=";

/// Marker color per activity type
pub fn type_color(activity_type: ActivityType) -> &'static str {
    match activity_type {
        ActivityType::Training => "#3498db",
        ActivityType::Workshop => "#9b59b6",
        ActivityType::Awareness => "#e74c3c",
        ActivityType::Support => "#27ae60",
        ActivityType::Advocacy => "#f39c12",
    }
}

/// External directions link built from raw coordinates
pub fn directions_url(position: LatLng) -> String {
    format!("{}{},{}", DIRECTIONS_URL, position.lat, position.lng)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for LatLng {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

/// Geographic rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Smallest box containing every point, `None` for no points
    pub fn around<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => BoundingBox {
                    south: p.lat,
                    west: p.lng,
                    north: p.lat,
                    east: p.lng,
                },
                Some(b) => BoundingBox {
                    south: b.south.min(p.lat),
                    west: b.west.min(p.lng),
                    north: b.north.max(p.lat),
                    east: b.east.max(p.lng),
                },
            })
        })
    }

    /// Grow each side by `ratio` of the box's extent
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buffer = (self.north - self.south).abs() * ratio;
        let lng_buffer = (self.east - self.west).abs() * ratio;
        BoundingBox {
            south: self.south - lat_buffer,
            west: self.west - lng_buffer,
            north: self.north + lat_buffer,
            east: self.east + lng_buffer,
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south && point.lat <= self.north && point.lng >= self.west && point.lng <= self.east
    }
}

/// What the map viewport shows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapView {
    Centered { center: LatLng, zoom: u8 },
    Bounds(BoundingBox),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", content = "target", rename_all = "snake_case")]
pub enum PopupAction {
    ViewDetail(Uuid),
    Directions(String),
}

/// Summary shown when a marker is opened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    pub type_label: String,
    pub project_name: String,
    pub date: String,
    pub location: String,
    pub beneficiary_count: i64,
    pub status_label: String,
    pub responsible: Option<String>,
    pub actions: Vec<PopupAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub activity_id: Uuid,
    pub position: LatLng,
    pub color: &'static str,
    pub popup: Popup,
}

/// Map filter: project AND type, either may be unset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MapFilter {
    pub project_id: Option<Uuid>,
    pub activity_type: Option<ActivityType>,
}

impl MapFilter {
    pub fn matches(&self, activity: &Activity) -> bool {
        self.project_id.map_or(true, |id| activity.project_id == Some(id))
            && self.activity_type.map_or(true, |t| activity.activity_type == t)
    }
}

/// Statistics panel next to the map, over the displayed markers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapStats {
    pub displayed: usize,
    pub total_beneficiaries: i64,
    pub by_type: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_and_padding() {
        let bounds = BoundingBox::around(vec![LatLng::new(14.0, -17.0), LatLng::new(16.0, -13.0)]).unwrap();
        assert_eq!(bounds, BoundingBox { south: 14.0, west: -17.0, north: 16.0, east: -13.0 });

        let padded = bounds.pad(FIT_PADDING);
        assert!((padded.south - 13.8).abs() < 1e-9);
        assert!((padded.east - -12.6).abs() < 1e-9);
        assert!(padded.contains(LatLng::new(14.0, -17.0)));
        assert_eq!(bounds.center(), LatLng::new(15.0, -15.0));

        assert!(BoundingBox::around(Vec::new()).is_none());
    }

    #[test]
    fn test_directions_url_uses_raw_coordinates() {
        assert_eq!(
            directions_url(LatLng::new(14.7167, -17.4667)),
            "https://www.google.com/maps/dir/?api=1&destination=14.7167,-17.4667"
        );
    }

    #[test]
    fn test_type_colors() {
        assert_eq!(type_color(ActivityType::Training), "#3498db");
        assert_eq!(type_color(ActivityType::Advocacy), "#f39c12");
    }
}
