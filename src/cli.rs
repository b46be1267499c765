//! Command-line interface for phpvercheck.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::catalog::Catalog;
use crate::config::{self, Config};
use crate::report;
use crate::scan::Runner;
use crate::version::Version;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Config template written by `init`.
const CONFIG_TEMPLATE: &str = include_str!("templates/default.yaml");

/// PHP minimum version checker.
///
/// Scans a PHP project for calls to runtime functions, methods and classes,
/// and looks them up in a function catalog to find the lowest PHP version
/// and the extensions the project needs.
#[derive(Parser)]
#[command(name = "phpvercheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Determine the minimum PHP version a project requires
    Check(CheckArgs),
    /// Write a phpvercheck config file
    Init(InitArgs),
}

/// Arguments for the check command.
#[derive(Parser)]
pub struct CheckArgs {
    /// Project root directory
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Function catalog file (.xml, .json, .yaml)
    #[arg(short = 'C', long)]
    pub catalog: Option<PathBuf>,

    /// Path to config file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty, json, or version
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Highest acceptable PHP version (exit non-zero if exceeded)
    #[arg(short, long)]
    pub target: Option<String>,

    /// File extension to scan (repeatable; replaces the configured list)
    #[arg(short, long = "extension")]
    pub extensions: Vec<String>,

    /// Scan files one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Keep catalog descriptions
    #[arg(long)]
    pub descriptions: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "phpvercheck.yaml")]
    pub output: PathBuf,
}

/// Load the config file named on the command line, or discover one.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => Config::discover(Path::new(".")),
    };

    match path {
        Some(p) => {
            let config = Config::parse_file(&p)
                .map_err(|e| anyhow::anyhow!("parsing config {}: {}", p.display(), e))?;
            tracing::debug!("using config {}", p.display());
            Ok((config, Some(p)))
        }
        None => Ok((Config::default(), None)),
    }
}

/// Apply command-line overrides on top of the config file.
fn apply_overrides(mut config: Config, args: &CheckArgs) -> Config {
    if let Some(catalog) = &args.catalog {
        config.catalog = Some(catalog.clone());
    }
    if !args.extensions.is_empty() {
        config.extensions = args.extensions.clone();
    }
    if let Some(target) = &args.target {
        config.target_version = Some(target.clone());
    }
    if args.sequential {
        config.parallel = Some(false);
    }
    if args.descriptions {
        config.include_descriptions = Some(true);
    }
    config
}

/// Run the check command.
pub fn run_check(args: &CheckArgs) -> anyhow::Result<i32> {
    // Validate format
    if args.format != "pretty" && args.format != "json" && args.format != "version" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty', 'json', or 'version'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let config = match load_config(args.config.as_deref()) {
        Ok((config, _)) => apply_overrides(config, args),
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid configuration: {}", e);
        return Ok(EXIT_ERROR);
    }
    let target: Option<Version> = config.target()?;

    let catalog_path = match &config.catalog {
        Some(p) => p.clone(),
        None => {
            eprintln!("Error: no catalog given (use --catalog or set 'catalog' in the config)");
            eprintln!("Run 'phpvercheck init' to create a config file");
            return Ok(EXIT_ERROR);
        }
    };

    let catalog = match Catalog::load(&catalog_path, config.load_options()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if catalog.is_empty() {
        eprintln!("Warning: catalog {} has no entries", catalog_path.display());
    }

    let runner = Runner::new(&catalog)
        .discovery(config.discovery())
        .ignore_symbols(&config.ignored_symbols)
        .parallel(config.should_run_parallel());

    let result = match runner.run(&args.path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if result.files_scanned == 0 {
        eprintln!("Warning: no files to scan");
    }

    let path_str = args.path.to_string_lossy().to_string();
    let catalog_str = catalog_path.to_string_lossy().to_string();

    match args.format.as_str() {
        "json" => report::write_json(&path_str, &catalog_str, &result, target.as_ref())?,
        "version" => report::write_version(&result),
        _ => report::write_pretty(&path_str, &catalog_str, &result, target.as_ref()),
    }

    if report::passed(&result, target.as_ref()) {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, CONFIG_TEMPLATE) {
        eprintln!("Error: failed to write config: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Point 'catalog' at your function catalog");
    println!("  2. Run: phpvercheck check . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}
