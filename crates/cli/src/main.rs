use anyhow::{Context, Result};
use civic_core::citizens::{ensure_citizen, Identity};
use civic_core::config::DashboardConfig;
use civic_core::db::{self, SqliteStore};
use civic_core::display::to_display_all;
use civic_core::filter::{
    filter_citizens, filter_officers, filter_reports, PriorityFilter, ReportQuery, StatusFilter,
};
use civic_core::officers::{assign_officer, load_roster};
use civic_core::schema::{Report, ReportStatus};
use civic_core::stats::summarize;
use civic_core::store::{ReportAccessor, ReportStore};
use clap::{Parser, Subcommand};
use schemars::schema_for;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "civic")]
#[command(about = "Civic issue tracking dashboard CLI", long_about = None)]
struct Cli {
    /// SQLite database path (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true, default_value = "civic.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export canonical JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
    /// Print the effective configuration as TOML
    Config,
    Reports {
        #[command(subcommand)]
        command: ReportCommands,
    },
    Citizens {
        #[command(subcommand)]
        command: CitizenCommands,
    },
    Officers {
        #[command(subcommand)]
        command: OfficerCommands,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// List reports newest first, as display rows
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Dashboard counters and derived metrics
    Stats,
    /// Free-text search combined with status/priority filters
    Search {
        #[arg(long)]
        text: Option<String>,
        #[arg(long, default_value = "all")]
        status: String,
        #[arg(long, default_value = "all")]
        priority: String,
    },
    /// Import reports from a JSON array file
    Import { file: PathBuf },
    /// Assign an officer to an open report
    Assign {
        #[arg(long)]
        report: String,
        #[arg(long)]
        officer: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
}

#[derive(Subcommand)]
enum CitizenCommands {
    List {
        #[arg(long)]
        text: Option<String>,
    },
    /// Create the citizen profile for an identity unless it already exists
    Ensure {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Vec<String>,
        #[arg(long)]
        phone: Vec<String>,
    },
}

#[derive(Subcommand)]
enum OfficerCommands {
    List {
        #[arg(long)]
        text: Option<String>,
    },
    /// Load an officer roster YAML (defaults to the configured roster)
    Load { file: Option<PathBuf> },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = DashboardConfig::load(Some(cli.config.as_path()))?;
    if let Some(db) = cli.db {
        config.store.path = db;
    }

    match cli.command {
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Reports { command } => run_reports(command, &config),
        Commands::Citizens { command } => run_citizens(command, &config),
        Commands::Officers { command } => run_officers(command, &config),
    }
}

fn open_store(config: &DashboardConfig) -> Result<SqliteStore> {
    let path = config.store.path.to_string_lossy();
    let store = db::open(&path).with_context(|| format!("opening store {path}"))?;
    Ok(store)
}

fn run_reports(command: ReportCommands, config: &DashboardConfig) -> Result<()> {
    let mut store = open_store(config)?;
    match command {
        ReportCommands::List { status } => {
            let status = status
                .as_deref()
                .map(ReportStatus::parse_strict)
                .transpose()?;
            let accessor = ReportAccessor::new(store);
            let reports = accessor.list_reports(status.as_ref(), None)?;
            print_reports(&reports)
        }
        ReportCommands::Stats => {
            let accessor = ReportAccessor::new(store);
            let reports = accessor.list_all(None)?;
            print_json(&summarize(&reports, config.dashboard.recent_limit))
        }
        ReportCommands::Search {
            text,
            status,
            priority,
        } => {
            let query = ReportQuery {
                text,
                status: StatusFilter::parse(&status)?,
                priority: PriorityFilter::parse(&priority)?,
            };
            let accessor = ReportAccessor::new(store);
            let reports = accessor.list_all(None)?;
            print_reports(&filter_reports(&reports, &query))
        }
        ReportCommands::Import { file } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let reports: Vec<Report> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", file.display()))?;
            let count = store.import_reports(&reports)?;
            println!("Imported {count} reports");
            Ok(())
        }
        ReportCommands::Assign {
            report,
            officer,
            notes,
        } => {
            let assignment = assign_officer(&store, &report, &officer, &notes)?;
            print_json(&assignment)
        }
    }
}

fn run_citizens(command: CitizenCommands, config: &DashboardConfig) -> Result<()> {
    let store = open_store(config)?;
    match command {
        CitizenCommands::List { text } => {
            let citizens = store.select_citizens()?;
            let citizens = filter_citizens(&citizens, text.as_deref().unwrap_or(""));
            print_json(&citizens)
        }
        CitizenCommands::Ensure {
            user_id,
            name,
            first_name,
            last_name,
            email,
            phone,
        } => {
            let identity = Identity {
                user_id,
                full_name: name,
                first_name,
                last_name,
                emails: email,
                phones: phone,
            };
            let outcome = ensure_citizen(&store, Some(&identity))?;
            print_json(&outcome)
        }
    }
}

fn run_officers(command: OfficerCommands, config: &DashboardConfig) -> Result<()> {
    let store = open_store(config)?;
    match command {
        OfficerCommands::List { text } => {
            let officers = store.select_officers()?;
            print_json(&filter_officers(&officers, text.as_deref().unwrap_or("")))
        }
        OfficerCommands::Load { file } => {
            let Some(path) = file.or_else(|| config.officers.roster.clone()) else {
                anyhow::bail!("no roster file given and none configured under [officers]");
            };
            let officers = load_roster(&path)?;
            for officer in &officers {
                store.upsert_officer(officer)?;
            }
            println!("Loaded {} officers from {}", officers.len(), path.display());
            Ok(())
        }
    }
}

fn print_reports(reports: &[Report]) -> Result<()> {
    let (rows, anomalies) = to_display_all(reports);
    if anomalies > 0 {
        tracing::warn!(anomalies, "some reports carry unrecognized values");
    }
    print_json(&rows)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    write_schema(&out_dir, "Report", &schema_for!(civic_core::schema::Report))?;
    write_schema(&out_dir, "Citizen", &schema_for!(civic_core::schema::Citizen))?;
    write_schema(&out_dir, "Officer", &schema_for!(civic_core::schema::Officer))?;
    write_schema(&out_dir, "Assignment", &schema_for!(civic_core::schema::Assignment))?;
    write_schema(&out_dir, "ReportStats", &schema_for!(civic_core::stats::ReportStats))?;
    write_schema(
        &out_dir,
        "DashboardSummary",
        &schema_for!(civic_core::stats::DashboardSummary),
    )?;
    write_schema(
        &out_dir,
        "DisplayReport",
        &schema_for!(civic_core::display::DisplayReport),
    )?;
    write_schema(&out_dir, "ReportQuery", &schema_for!(civic_core::filter::ReportQuery))?;
    write_schema(&out_dir, "Identity", &schema_for!(civic_core::citizens::Identity))?;

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}

fn write_schema(out_dir: &Path, name: &str, schema: &schemars::schema::RootSchema) -> Result<()> {
    let json = serde_json::to_string_pretty(schema)?;
    fs::write(out_dir.join(format!("{name}.schema.json")), json)?;
    Ok(())
}
