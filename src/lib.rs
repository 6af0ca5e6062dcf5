//! Program monitoring and evaluation core: typed access to projects,
//! activities and beneficiaries held behind a REST data API, with the
//! aggregation, map and report models built on top of them.

// Public modules
pub mod app;
pub mod config;
pub mod domains;
pub mod errors;
pub mod format;
pub mod types;
pub mod validation;

pub use app::{init_logging, AppContext, Navigator, Page};
pub use config::AppConfig;
pub use errors::{ServiceError, ServiceResult};
