// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

// Use library instead of local modules
use bike_rental_reports::{
    db, load_csv_dir, logging, output, seed, OutputFormat, ReportCatalog, ReportConfig, ReportKind,
    Snapshot,
};

#[derive(Parser)]
#[clap(name = "bike-reports", version, about = "Rollup reports over a bike-rental dataset")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, clap::Args)]
struct DbArgs {
    /// SQLite database holding the rental dataset
    #[clap(long, env = "BIKE_REPORTS_DB", default_value = "rentals.db")]
    db: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Import customer/bike/rental/membership_type/membership CSV files.
    Import {
        /// Directory containing the five CSV files
        csv_dir: PathBuf,
        #[clap(flatten)]
        db: DbArgs,
    },
    /// Load the built-in sample dataset.
    Seed {
        #[clap(flatten)]
        db: DbArgs,
    },
    /// List available reports.
    List,
    /// Run one report by name, or `all`.
    Report {
        name: String,
        #[clap(flatten)]
        db: DbArgs,
        /// table, csv or json
        #[clap(long, default_value = "table")]
        format: OutputFormat,
        /// JSON file overriding report parameters
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Show data-quality issues and referential gaps.
    Check {
        #[clap(flatten)]
        db: DbArgs,
    },
    /// Browse every report in a terminal UI.
    Ui {
        #[clap(flatten)]
        db: DbArgs,
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Import { csv_dir, db } => run_import(&csv_dir, &db.db),
        Commands::Seed { db } => run_seed(&db.db),
        Commands::List => {
            run_list();
            Ok(())
        }
        Commands::Report { name, db, format, config } => run_report(&name, &db.db, format, config.as_deref()),
        Commands::Check { db } => run_check(&db.db),
        Commands::Ui { db, config } => run_ui_mode(&db.db, config.as_deref()),
    }
}

fn run_import(csv_dir: &Path, db_path: &Path) -> Result<()> {
    println!("🗄️  Data Import - CSV → SQLite + WAL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load CSV
    println!("\n📂 Loading CSV files from {:?}...", csv_dir);
    let snapshot = load_csv_dir(csv_dir)?;
    for (relation, count) in snapshot.row_counts() {
        println!("✓ {:<16} {} rows", relation, count);
    }

    write_snapshot(&snapshot, db_path)
}

fn run_seed(db_path: &Path) -> Result<()> {
    println!("🌱 Loading sample dataset");
    write_snapshot(&seed::sample_snapshot(), db_path)
}

fn write_snapshot(snapshot: &Snapshot, db_path: &Path) -> Result<()> {
    // 2. Setup database
    println!("\n🔧 Setting up database {:?}...", db_path);
    let conn = db::open_database(db_path)?;
    println!("✓ Database initialized with WAL mode");

    // 3. Insert rows
    println!("\n💾 Inserting rows...");
    let stats = db::insert_snapshot(&conn, snapshot)?;
    println!("✓ Inserted: {} rows", stats.inserted);
    println!("✓ Skipped (existing id or failed constraint): {}", stats.skipped);

    // 4. Verify counts
    println!("\n🔍 Verifying database...");
    for (relation, _) in snapshot.row_counts() {
        println!("✓ {:<16} {} rows", relation, db::count_rows(&conn, relation)?);
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Import complete");
    Ok(())
}

fn run_list() {
    for kind in ReportKind::ALL {
        println!("{:<28} {}", kind.name(), kind.title());
    }
}

fn load_config(path: Option<&Path>) -> Result<ReportConfig> {
    match path {
        Some(path) => ReportConfig::from_file(path),
        None => Ok(ReportConfig::default()),
    }
}

fn open_snapshot(db_path: &Path) -> Result<Snapshot> {
    if !db_path.exists() {
        return Err(anyhow!(
            "database {:?} not found; run `bike-reports import <csv-dir>` or `bike-reports seed` first",
            db_path
        ));
    }
    let conn = db::open_database(db_path)?;
    db::load_snapshot(&conn)
}

fn run_report(name: &str, db_path: &Path, format: OutputFormat, config: Option<&Path>) -> Result<()> {
    let catalog = ReportCatalog::new(load_config(config)?);
    let snapshot = open_snapshot(db_path)?;

    let text = if name == "all" {
        let reports = catalog.run_all(&snapshot)?;
        output::render_all(&reports, format)?
    } else {
        let kind: ReportKind = name.parse()?;
        let report = catalog
            .run(kind, &snapshot)
            .with_context(|| format!("Failed to compute report '{}'", name))?;
        output::render(&report, format)?
    };

    print!("{}", text);
    if format == OutputFormat::Json {
        println!();
    }
    Ok(())
}

fn run_check(db_path: &Path) -> Result<()> {
    let snapshot = open_snapshot(db_path)?;

    println!("🔍 Data quality check");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let issues = snapshot.validate();
    let gaps = snapshot.referential_gaps();

    if issues.is_empty() {
        println!("✓ No invariant violations");
    } else {
        println!("⚠️  {} invariant violations:", issues.len());
        for issue in &issues {
            println!("   {}", issue);
        }
    }

    if gaps.is_empty() {
        println!("✓ No referential gaps");
    } else {
        println!("⚠️  {} referential gaps (reported as NULL in joins):", gaps.len());
        for gap in &gaps {
            println!("   {}", gap);
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(db_path: &Path, config: Option<&Path>) -> Result<()> {
    println!("🖥️  Loading Bike Rental Reports UI...\n");

    let catalog = ReportCatalog::new(load_config(config)?);
    let snapshot = open_snapshot(db_path)?;

    println!("📊 Computing reports...");
    let reports = catalog.run_all(&snapshot)?;
    println!("✓ Computed {} reports\n", reports.len());
    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(reports, &snapshot);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_db_path: &Path, _config: Option<&Path>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the HTTP API: cargo run --bin bike-reports-server --features server");
    std::process::exit(1);
}
