pub mod layer;
pub mod service;
pub mod types;

pub use layer::MapLayer;
pub use service::MapService;
pub use types::{BoundingBox, LatLng, MapFilter, MapStats, MapView, Marker, Popup, PopupAction};
