//! Report documents computed from the loaded collections.

pub mod layout;
pub mod recommendations;
pub mod service;
pub mod stats;
pub mod types;

pub use layout::{document_file_name, render_document, Element, Page, ReportDocument, TextStyle};
pub use recommendations::recommendations;
pub use service::ReportService;
pub use stats::{compute_report_stats, statistics_rows};
pub use types::{ImpactTargets, ReportData, ReportKind, ReportStats};
