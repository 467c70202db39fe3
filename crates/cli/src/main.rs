mod seed;

use clap::{Parser, Subcommand};
use report_core::{
    CoreConfig, InMemoryStorage, PaginationParams, Report, ReportDraft, ReportFilterParams,
    ReportPatch, ReportRepository, ReportService, StorageEngine, DEFAULT_DATA_DIR,
    DEFAULT_PERSIST_INTERVAL_MS, REPORTS_FILENAME,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "report")]
#[command(about = "Patient report portal CLI")]
struct Cli {
    /// Directory holding the report snapshot file
    #[arg(long, env = "DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List reports, newest first unless sorted otherwise
    List {
        /// Case-insensitive substring of the patient name
        #[arg(long)]
        patient_name: Option<String>,
        #[arg(long)]
        patient_id: Option<String>,
        /// Report type, e.g. Lab or Radiology
        #[arg(long = "type")]
        report_type: Option<String>,
        /// Earliest report date (YYYY-MM-DD or ISO-8601 UTC)
        #[arg(long)]
        from_date: Option<String>,
        /// Latest report date (YYYY-MM-DD or ISO-8601 UTC)
        #[arg(long)]
        to_date: Option<String>,
        #[arg(long)]
        limit: Option<String>,
        #[arg(long)]
        offset: Option<String>,
        /// date, patientName, type, createdAt or updatedAt
        #[arg(long)]
        sort_by: Option<String>,
        /// asc or desc
        #[arg(long)]
        sort_direction: Option<String>,
    },
    /// Show a single report as JSON
    Show {
        id: String,
    },
    /// Create a report
    Create {
        #[arg(long)]
        patient_name: String,
        #[arg(long)]
        summary: String,
        #[arg(long)]
        patient_id: Option<String>,
        #[arg(long = "type")]
        report_type: Option<String>,
        /// Report date (defaults to now)
        #[arg(long)]
        date: Option<String>,
    },
    /// Update fields of an existing report
    Update {
        id: String,
        #[arg(long)]
        patient_name: Option<String>,
        #[arg(long)]
        patient_id: Option<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long = "type")]
        report_type: Option<String>,
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a report
    Delete {
        id: String,
    },
    /// List reports whose summary mentions a medical alert
    Alerts,
    /// Replace every stored report with random sample data
    Seed {
        #[arg(long, default_value_t = seed::DEFAULT_SEED_COUNT)]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'report --help' for commands");
        return Ok(());
    };

    let cfg = CoreConfig::new(
        cli.data_dir,
        true,
        Duration::from_millis(DEFAULT_PERSIST_INTERVAL_MS),
    )?;
    let storage = Arc::new(InMemoryStorage::new(&cfg, REPORTS_FILENAME));
    let service = ReportService::new(ReportRepository::new(Arc::clone(&storage)));
    service.initialize().await;

    run(command, &service, &storage);

    service.close().await;
    Ok(())
}

fn run(command: Commands, service: &ReportService, storage: &InMemoryStorage<Report>) {
    match command {
        Commands::List {
            patient_name,
            patient_id,
            report_type,
            from_date,
            to_date,
            limit,
            offset,
            sort_by,
            sort_direction,
        } => {
            let filter = ReportFilterParams {
                patient_name,
                patient_id,
                report_type,
                from_date,
                to_date,
            }
            .into_filter();
            let options = PaginationParams {
                limit,
                offset,
                sort_by,
                sort_direction,
            }
            .into_options();

            match filter.and_then(|filter| Ok((filter, options?))) {
                Ok((filter, options)) => {
                    let page = service.get_reports(Some(&filter), Some(&options));
                    if page.data.is_empty() {
                        println!("No reports found.");
                    }
                    for report in &page.data {
                        print_line(report);
                    }
                    println!(
                        "Page {} of {} ({} matching)",
                        page.page, page.total_pages, page.total
                    );
                }
                Err(e) => eprintln!("Error listing reports: {}", e),
            }
        }
        Commands::Show { id } => match service.get_report_by_id(&id) {
            Ok(report) => match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error rendering report: {}", e),
            },
            Err(e) => eprintln!("Error: {}", e),
        },
        Commands::Create {
            patient_name,
            summary,
            patient_id,
            report_type,
            date,
        } => {
            let draft = ReportDraft {
                patient_name: Some(patient_name),
                summary: Some(summary),
                patient_id,
                report_type,
                date,
                ..Default::default()
            };
            match service.create_report(draft) {
                Ok(report) => println!("Created report with ID: {}", report.id),
                Err(e) => eprintln!("Error creating report: {}", e),
            }
        }
        Commands::Update {
            id,
            patient_name,
            patient_id,
            summary,
            report_type,
            date,
        } => {
            let patch = ReportPatch {
                patient_name,
                patient_id,
                date,
                summary,
                report_type,
            };
            if patch.is_empty() {
                println!("Nothing to update.");
                return;
            }
            match service.update_report(&id, patch) {
                Ok(report) => println!("Updated report {} at {}", report.id, report.updated_at),
                Err(e) => eprintln!("Error updating report: {}", e),
            }
        }
        Commands::Delete { id } => match service.delete_report(&id) {
            Ok(()) => println!("Deleted report {}", id),
            Err(e) => eprintln!("Error deleting report: {}", e),
        },
        Commands::Alerts => {
            let alerts = service.get_reports_with_medical_alerts();
            if alerts.is_empty() {
                println!("No reports with medical alerts.");
            }
            for report in &alerts {
                print_line(report);
            }
        }
        Commands::Seed { count } => {
            for existing in storage.get_all() {
                storage.delete(&existing.id);
            }
            let repository = service.repository();
            let drafts = seed::generate_reports(count, chrono::Utc::now(), &mut rand::thread_rng());
            for draft in drafts {
                repository.create(draft);
            }
            println!(
                "Generated {} test reports at {}",
                count,
                storage.snapshot_path().display()
            );
        }
    }
}

fn print_line(report: &Report) {
    println!(
        "ID: {}, Patient: {} ({}), Type: {}, Date: {}",
        report.id, report.patient_name, report.patient_id, report.report_type, report.date
    );
}
