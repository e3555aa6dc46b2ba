use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use library_cleaning::{
    config::PipelineConfig,
    db::{open_store, table_counts},
    export::{read_cleaned_loans, read_cleaned_members},
    pipeline,
    report::{render_text, DatasetSummary, ReportMetrics},
};

#[derive(Parser, Debug)]
#[command(name = "library-cleaning", version, about = "Clean library loan and member CSV exports")]
struct Cli {
    /// Console log level (RUST_LOG takes priority)
    #[arg(long, global = true, default_value = "info", env = "LIBRARY_LOG_LEVEL")]
    log_level: String,

    /// TOML file overriding the built-in defaults
    #[arg(long, global = true, env = "LIBRARY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the cleaning pipeline (default)
    Run(RunArgs),
    /// Show metrics for the last cleaning runs
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    #[arg(long)]
    books: Option<PathBuf>,
    #[arg(long)]
    customers: Option<PathBuf>,
    #[arg(long)]
    books_output: Option<PathBuf>,
    #[arg(long)]
    customers_output: Option<PathBuf>,
    #[arg(long)]
    database: Option<PathBuf>,
    /// Also replace the contents of the SQLite store
    #[arg(long)]
    save_to_db: bool,
    /// Days a loan may run before it is overdue
    #[arg(long)]
    loan_period: Option<i64>,
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Print the data quality report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Default)]
struct ReportArgs {
    /// Plain text instead of the dashboard
    #[arg(long)]
    plain: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut PipelineConfig) {
        let overrides = [
            (&self.books, &mut config.loans_input),
            (&self.customers, &mut config.members_input),
            (&self.books_output, &mut config.loans_output),
            (&self.customers_output, &mut config.members_output),
            (&self.database, &mut config.database),
            (&self.log_file, &mut config.log_file),
        ];
        for (flag, target) in overrides {
            if let Some(path) = flag {
                *target = path.clone();
            }
        }
        if self.save_to_db {
            config.save_to_db = true;
        }
        if let Some(days) = self.loan_period {
            config.loan_period = days;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --log-level CLI arg > default "info"
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_level.clone());
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)))
        .init();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Some(Command::Report(args)) => run_report(&config, &args),
        Some(Command::Run(args)) => {
            args.apply(&mut config);
            run_pipeline(&config, args.json)
        }
        None => run_pipeline(&config, false),
    }
}

fn run_pipeline(config: &PipelineConfig, json: bool) -> Result<()> {
    println!("📚 Library Data Cleaning");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let outcome = pipeline::run(config)?;
    let quality = &outcome.tables.quality;

    if json {
        println!("{}", serde_json::to_string_pretty(quality)?);
    } else {
        println!("\n🔍 {}", quality.summary());
        for issue in &quality.issues {
            println!("   ⚠️  {}", issue.describe());
        }
    }

    println!("\n✓ {} loans -> {}", outcome.tables.loans.len(), config.loans_output.display());
    println!("✓ {} members -> {}", outcome.tables.members.len(), config.members_output.display());

    if outcome.store.is_some() {
        let conn = open_store(&config.database)?;
        let counts = table_counts(&conn)?;
        println!(
            "✓ Database {}: {} members, {} books, {} loans",
            config.database.display(),
            counts.members,
            counts.catalog_items,
            counts.loans
        );
    }

    println!(
        "\n✅ Run {} complete ({} log lines appended to {})",
        outcome.run_id,
        outcome.audit_lines,
        config.log_file.display()
    );

    Ok(())
}

fn run_report(config: &PipelineConfig, args: &ReportArgs) -> Result<()> {
    let log = fs::read_to_string(&config.log_file).with_context(|| {
        format!(
            "Log file not found: {}. Run the cleaning pipeline first",
            config.log_file.display()
        )
    })?;
    let lines: Vec<String> = log.lines().map(str::to_string).collect();
    let metrics = ReportMetrics::from_log_lines(&lines);

    let dataset = match (
        read_cleaned_loans(&config.loans_output),
        read_cleaned_members(&config.members_output),
    ) {
        (Ok(loans), Ok(members)) => Some(DatasetSummary::from_cleaned(&loans, &members)),
        (loans, members) => {
            for e in [loans.err(), members.err()].into_iter().flatten() {
                tracing::warn!("Cleaned data not available: {:#}", e);
            }
            None
        }
    };

    if args.plain {
        print!("{}", render_text(&metrics, dataset.as_ref(), &lines));
        return Ok(());
    }

    show_dashboard(metrics, dataset, lines)
}

#[cfg(feature = "tui")]
fn show_dashboard(
    metrics: ReportMetrics,
    dataset: Option<DatasetSummary>,
    lines: Vec<String>,
) -> Result<()> {
    use library_cleaning::ui;

    let mut app = ui::App::new(metrics, dataset.unwrap_or_default(), lines);
    ui::run_ui(&mut app)?;

    println!("\n✅ Dashboard closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn show_dashboard(
    metrics: ReportMetrics,
    dataset: Option<DatasetSummary>,
    lines: Vec<String>,
) -> Result<()> {
    tracing::info!("Dashboard not available without the tui feature, printing plain report");
    print!("{}", render_text(&metrics, dataset.as_ref(), &lines));
    Ok(())
}
