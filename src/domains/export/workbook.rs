use super::file::{ExportFile, ExportFormat};
use super::table::export_table;
use crate::errors::ServiceResult;
use crate::types::Record;
use chrono::NaiveDate;
use log::debug;

/// One CSV file of the workbook
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: &'static str,
    pub rows: Vec<Record>,
}

impl Sheet {
    pub fn new(name: &'static str, rows: Vec<Record>) -> Self {
        Self { name, rows }
    }
}

/// `planned_budget` -> `Planned budget`
pub fn human_header(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn with_human_headers(rows: Vec<Record>) -> Vec<Record> {
    rows.into_iter()
        .map(|row| row.into_iter().map(|(key, value)| (human_header(&key), value)).collect())
        .collect()
}

/// One dated CSV per non-empty sheet, headers made readable
pub fn build_workbook(sheets: Vec<Sheet>, date: NaiveDate) -> ServiceResult<Vec<ExportFile>> {
    let mut files = Vec::new();
    for sheet in sheets {
        if sheet.rows.is_empty() {
            debug!("Skipping empty sheet {}", sheet.name);
            continue;
        }
        let contents = export_table(&with_human_headers(sheet.rows))?;
        files.push(ExportFile::new(sheet.name, date, ExportFormat::Csv, contents));
    }
    Ok(files)
}
