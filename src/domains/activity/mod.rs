pub mod service;
pub mod types;

pub use service::ActivityService;
pub use types::{Activity, ActivityDetail, ActivityDraft, ActivityFilter, ActivityListItem, ActivityStatus, ActivityType};
