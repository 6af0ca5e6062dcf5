pub mod service;
pub mod types;

pub use service::ProjectService;
pub use types::{Project, ProjectDetail, ProjectDraft, ProjectFilter, ProjectListItem, ProjectStatus};
