//! Tabular, geographic and workbook exports.

pub mod file;
pub mod geojson;
pub mod table;
pub mod workbook;

pub use file::{dated_file_name, ExportFile, ExportFormat};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use table::export_table;
pub use workbook::{build_workbook, human_header, Sheet};
