//! Vehicle meta identifier conflict resolution CLI
//!
//! Renumbers siren-setting and modkit identifiers in a `carcols.meta` /
//! `carvariations.meta` pair so they stop colliding with other resources.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vehicle_meta::{create_backup, ChangeSet, ConflictResolver, Document, Inventory, ResolverConfig};

/// Vehicle meta identifier conflict resolution tool
#[derive(Parser)]
#[command(name = "vmeta")]
#[command(version)]
#[command(about = "Resolve identifier conflicts in vehicle meta files", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log every rewritten identifier.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Give siren settings fresh ids and mirror them into the catalog
    #[command(visible_alias = "c")]
    ResolveCatalog {
        #[command(flatten)]
        files: MetaFiles,
        #[command(flatten)]
        scope: Scope,
    },

    /// Give modkits fresh ids and mirror them into the variation file
    #[command(visible_alias = "k")]
    ResolveKits {
        #[command(flatten)]
        files: MetaFiles,
        #[command(flatten)]
        scope: Scope,
    },

    /// List kits, sirens, variation items and duplicate ids without changing anything
    #[command(visible_alias = "i")]
    Inspect {
        #[command(flatten)]
        files: MetaFiles,
    },
}

#[derive(clap::Args)]
struct MetaFiles {
    /// Customization catalog (carcols.meta)
    catalog: PathBuf,
    /// Variation catalog (carvariations.meta)
    variations: PathBuf,
}

#[derive(clap::Args)]
struct Scope {
    /// Only touch entries belonging to this vehicle (case-insensitive substring)
    #[arg(short, long)]
    vehicle: Option<String>,

    /// Skip the timestamped backup copy
    #[arg(long)]
    no_backup: bool,
}

#[derive(Clone, Copy)]
enum Pass {
    Catalog,
    Kits,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ResolverConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ResolverConfig::default(),
    };
    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::ResolveCatalog { files, scope } => {
            run_resolve(Pass::Catalog, &files, &scope, &config)
        }
        Commands::ResolveKits { files, scope } => run_resolve(Pass::Kits, &files, &scope, &config),
        Commands::Inspect { files } => run_inspect(&files),
    }
}

fn init_logging(config: &ResolverConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "debug"
        } else {
            config.log_level.as_str()
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Checks that a file exists and carries one of the two recognized roots.
fn validate_file(path: &Path, what: &str) -> Result<()> {
    let document =
        Document::load(path).with_context(|| format!("reading {} {}", what, path.display()))?;
    if !document.is_expected_kind() {
        anyhow::bail!(
            "invalid {} file {}: unexpected root element <{}>",
            what,
            path.display(),
            document.root_name()
        );
    }
    Ok(())
}

/// Runs one resolution pass and prints the report.
fn run_resolve(pass: Pass, files: &MetaFiles, scope: &Scope, config: &ResolverConfig) -> Result<()> {
    validate_file(&files.catalog, "catalog")?;
    validate_file(&files.variations, "variations")?;

    let backup_dir = if config.backup.enabled && !scope.no_backup {
        let dir = create_backup(
            &[&files.catalog, &files.variations],
            &config.backup.dir,
            &config.backup.prefix,
        )
        .context("creating backup")?;
        Some(dir)
    } else {
        debug!("backup skipped");
        None
    };

    let mut resolver = ConflictResolver::open(&files.catalog, &files.variations, config)?;
    let vehicle = scope.vehicle.as_deref();
    let changes = match pass {
        Pass::Catalog => resolver.resolve_catalog_conflicts(vehicle)?,
        Pass::Kits => resolver.resolve_kit_conflicts(vehicle)?,
    };

    print_report(&changes, backup_dir.as_deref());
    Ok(())
}

fn print_report(changes: &ChangeSet, backup_dir: Option<&Path>) {
    println!("Changes made: {}", changes.len());
    println!();
    print!("{}", changes);
    if let Some(dir) = backup_dir {
        println!();
        println!("Backups created in {}", dir.display());
    }
}

fn run_inspect(files: &MetaFiles) -> Result<()> {
    let catalog = Document::load(&files.catalog)
        .with_context(|| format!("reading catalog {}", files.catalog.display()))?;
    let variations = Document::load(&files.variations)
        .with_context(|| format!("reading variations {}", files.variations.display()))?;

    print!("{}", Inventory::collect(&catalog, &variations));
    Ok(())
}
