use crate::errors::{ServiceError, ServiceResult};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Output formats produced by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    GeoJson,
    /// Plain-text rendering of a report document
    Text,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::GeoJson => "geojson",
            ExportFormat::Text => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::GeoJson => "application/geo+json",
            ExportFormat::Text => "text/plain;charset=utf-8",
        }
    }
}

/// `<stem>_<YYYY-MM-DD>.<ext>`
pub fn dated_file_name(stem: &str, date: NaiveDate, extension: &str) -> String {
    format!("{}_{}.{}", stem, date.format("%Y-%m-%d"), extension)
}

/// A generated file, held in memory until written
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub contents: String,
}

impl ExportFile {
    pub fn new(stem: &str, date: NaiveDate, format: ExportFormat, contents: String) -> Self {
        Self {
            file_name: dated_file_name(stem, date, format.extension()),
            format,
            contents,
        }
    }

    pub fn size(&self) -> usize {
        self.contents.len()
    }

    /// Write into `dir`, creating it when needed. Returns the full path.
    pub async fn write_to(&self, dir: impl AsRef<Path>) -> ServiceResult<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ServiceError::Export(format!("Cannot create {}: {}", dir.display(), e)))?;

        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, self.contents.as_bytes())
            .await
            .map_err(|e| ServiceError::Export(format!("Cannot write {}: {}", path.display(), e)))?;

        info!("Wrote {} ({} bytes)", path.display(), self.size());
        Ok(path)
    }
}
