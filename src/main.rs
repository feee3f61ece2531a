use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::Path;

use trainwatch::detect::engine::DetectionWindow;
use trainwatch::detect::thresholds::ThresholdSet;
use trainwatch::detect::DetectionFilter;
use trainwatch::report::Summary;

#[derive(Parser)]
#[command(
    name = "trainwatch",
    about = "Supervision-grade anomaly detection for daily training metrics",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DetectionArgs {
    /// Start of the detection window (YYYY-MM-DD)
    #[arg(long)]
    from: String,

    /// End of the detection window (YYYY-MM-DD)
    #[arg(long)]
    to: String,

    /// Detection types to run: all, cheat, face, learn or problem
    #[arg(long, default_value = "all")]
    types: String,

    /// Threshold overrides as a JSON object, e.g. '{"cheat_rate": 10}'
    #[arg(long)]
    thresholds: Option<String>,

    /// Database path
    #[arg(long, default_value = "data/trainwatch.db")]
    db: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run anomaly detection and print a grouped report
    Detect {
        #[command(flatten)]
        args: DetectionArgs,

        /// JSON output for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Run detection and export the anomaly list to a file
    Export {
        #[command(flatten)]
        args: DetectionArgs,

        /// Output file path (.json or .csv)
        #[arg(long)]
        output: String,
    },

    /// Run detection and dispatch critical/major alerts
    Alert {
        #[command(flatten)]
        args: DetectionArgs,
    },

    /// Record supervision data
    Record {
        #[command(subcommand)]
        action: RecordAction,
    },
}

#[derive(Subcommand)]
enum RecordAction {
    /// Record one supplier-day of metrics
    Metric {
        /// Supplier name
        #[arg(long)]
        supplier: String,

        /// Record date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Daily login count
        #[arg(long, default_value = "0")]
        logins: u64,

        /// Daily learn count
        #[arg(long, default_value = "0")]
        learns: u64,

        /// Daily cheat count
        #[arg(long, default_value = "0")]
        cheats: u64,

        /// Face-recognition successes
        #[arg(long, default_value = "0")]
        face_ok: u64,

        /// Face-recognition failures
        #[arg(long, default_value = "0")]
        face_fail: u64,

        /// Database path
        #[arg(long, default_value = "data/trainwatch.db")]
        db: String,
    },

    /// Track a remediation problem
    Problem {
        /// Problem title
        #[arg(long)]
        title: String,

        /// Responsible person
        #[arg(long)]
        responsible: String,

        /// Correction status
        #[arg(long, default_value = "待整改")]
        status: String,

        /// Discovery date (YYYY-MM-DD)
        #[arg(long)]
        discovered: String,

        /// Correction deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: String,

        /// Database path
        #[arg(long, default_value = "data/trainwatch.db")]
        db: String,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", value))
}

/// Validate detection inputs before anything touches the database.
fn detection_inputs(args: &DetectionArgs) -> Result<(DetectionWindow, DetectionFilter, ThresholdSet)> {
    let start = parse_date(&args.from)?;
    let end = parse_date(&args.to)?;
    let filter: DetectionFilter = args.types.parse()?;
    let thresholds = ThresholdSet::resolve(args.thresholds.as_deref());

    let window = DetectionWindow {
        start,
        end,
        today: Utc::now().date_naive(),
    };
    Ok((window, filter, thresholds))
}

fn render_summary(summary: &Summary) {
    println!("\n=== Training Supervision Anomaly Report ===");
    println!("Total anomalies: {}", summary.total);

    for group in &summary.by_severity {
        println!("\n[{}] {} anomalies", group.severity.label(), group.anomalies.len());
        for anomaly in &group.anomalies {
            println!(" - {} | {} | {}", anomaly.date, anomaly.subject, anomaly.description);
        }
    }

    if !summary.by_type.is_empty() {
        println!("\nBy dimension:");
        for entry in &summary.by_type {
            println!("{:<25} : {}", entry.dimension.key(), entry.count);
        }
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect { args, json } => {
            let (window, filter, thresholds) = detection_inputs(&args)?;
            let anomalies = trainwatch::run_detection(&args.db, &window, filter, &thresholds).await?;
            let summary = trainwatch::report::aggregate(anomalies);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                render_summary(&summary);
            }
        }
        Commands::Export { args, output } => {
            let (window, filter, thresholds) = detection_inputs(&args)?;
            let anomalies = trainwatch::run_detection(&args.db, &window, filter, &thresholds).await?;

            trainwatch::export::export_anomalies(&anomalies, Path::new(&output))?;
            println!("Exported {} anomalies to {}", anomalies.len(), output);
        }
        Commands::Alert { args } => {
            let (window, filter, thresholds) = detection_inputs(&args)?;
            let anomalies = trainwatch::run_detection(&args.db, &window, filter, &thresholds).await?;

            let dispatched = trainwatch::alert::dispatch(&anomalies, &trainwatch::alert::LogNotifier);
            println!("Dispatched {} alerts.", dispatched);
        }
        Commands::Record { action } => match action {
            RecordAction::Metric {
                supplier,
                date,
                logins,
                learns,
                cheats,
                face_ok,
                face_fail,
                db,
            } => {
                let record = trainwatch::metrics::MetricRecord {
                    supplier: supplier.clone(),
                    date: parse_date(&date)?,
                    login_count: logins,
                    learn_count: learns,
                    cheat_count: cheats,
                    face_success_count: face_ok,
                    face_fail_count: face_fail,
                };
                let pool = trainwatch::storage::open_pool(&db)?;
                trainwatch::storage::save_metric_record(&pool, &record)?;
                println!("Recorded metrics for '{}' on {}.", supplier, date);
            }
            RecordAction::Problem {
                title,
                responsible,
                status,
                discovered,
                deadline,
                db,
            } => {
                let pool = trainwatch::storage::open_pool(&db)?;
                let id = trainwatch::storage::save_problem(
                    &pool,
                    &title,
                    &responsible,
                    &status,
                    parse_date(&discovered)?,
                    parse_date(&deadline)?,
                )?;
                println!("Problem #{} tracked: {}", id, title);
            }
        },
    }

    Ok(())
}
