use chrono::Local;
use mne_core::domains::report::{ReportKind, ReportService};
use mne_core::{init_logging, AppConfig, AppContext};
use std::env;
use std::path::PathBuf;

const DEFAULT_OUTPUT_DIR: &str = "./exports";

/// Usage: mne_report [monthly|impact|annual] [output-dir]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let kind = match args.first() {
        Some(name) => ReportKind::from_str(name).ok_or_else(|| format!("Unknown report kind: {}", name))?,
        None => ReportKind::Monthly,
    };
    let output_dir = PathBuf::from(args.get(1).map(String::as_str).unwrap_or(DEFAULT_OUTPUT_DIR));

    let config = AppConfig::from_env();
    config.validate()?;
    let today = Local::now().date_naive();

    println!("{} for {}", kind.title(), config.report.organization);
    println!("Output directory: {}", output_dir.display());

    let mut context = AppContext::new(config);
    if !context.repository.test_connection().await {
        return Err("Data API unreachable, check MNE_API_URL and MNE_API_KEY".into());
    }

    let mut written = Vec::new();
    match context.reports.export_workbook(today).await {
        Ok(files) => {
            for file in files {
                written.push(file.write_to(&output_dir).await?);
            }
        }
        Err(e) => log::warn!("Workbook skipped: {}", e),
    }

    match context.map.load().await {
        Ok(_) => match context.map.export_geojson(today) {
            Ok(file) => written.push(file.write_to(&output_dir).await?),
            Err(e) => log::warn!("Map export skipped: {}", e),
        },
        Err(e) => log::warn!("Map data unavailable: {}", e),
    }

    let document = context.reports.generate(kind, today).await?;
    let text = ReportService::text_file(&document, today);
    written.push(text.write_to(&output_dir).await?);

    println!(
        "{} ({} pages, document name {})",
        document.title,
        document.page_count(),
        document.file_name
    );
    for path in &written {
        println!("  {}", path.display());
    }
    Ok(())
}
