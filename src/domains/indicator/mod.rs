pub mod service;
pub mod types;

pub use service::IndicatorService;
pub use types::{Indicator, IndicatorDraft, IndicatorFilter};
