use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use tenant_posture::config::Config;
use tenant_posture::error::PostureError;
use tenant_posture::output::OutputFormat;
use tenant_posture::rules::RuleRegistry;
use tenant_posture::{telemetry, EvaluateOptions, DEFAULT_CONFIG_FILE};

#[derive(Parser)]
#[command(
    name = "tenant-posture",
    about = "Score cloud directory tenant snapshots against risk rules",
    version,
    author
)]
struct Cli {
    /// Log filter (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true, env = "TENANT_POSTURE_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one or more snapshots (paths or glob patterns).
    /// JSON output is an array with one report per snapshot.
    Evaluate {
        #[arg(required = true)]
        snapshots: Vec<String>,

        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,

        /// Write output to file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Store score, maturity level and triggered rules back into each snapshot
        #[arg(long)]
        write_back: bool,
    },

    /// Re-render the report of a previously evaluated snapshot
    Regenerate {
        snapshot: PathBuf,

        /// Output format (console, json)
        #[arg(long, short = 'f', default_value = "console")]
        format: String,
    },

    /// List all risk rules in the catalog
    ListRules {
        /// Apply the overrides of this config file first
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(long, short = 'f', default_value = "table")]
        format: String,
    },

    /// Generate a starter .tenant-posture.toml config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.command {
        Commands::Evaluate {
            snapshots,
            config,
            format,
            output,
            write_back,
        } => cmd_evaluate(snapshots, config, format, output, write_back),
        Commands::Regenerate { snapshot, format } => cmd_regenerate(snapshot, format),
        Commands::ListRules { config, format } => cmd_list_rules(config, format),
        Commands::Init { force } => cmd_init(force),
    };

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

/// Logging is set up before any snapshot is read, from the same config file
/// the first evaluated snapshot uses.
fn init_logging(cli: &Cli) {
    let config_path = match &cli.command {
        Commands::Evaluate { snapshots, config, .. } => {
            let first = snapshots.first().map(Path::new).filter(|p| p.is_file());
            tenant_posture::config_path_for(config.as_deref(), first)
        }
        Commands::Regenerate { snapshot, .. } => {
            tenant_posture::config_path_for(None, Some(snapshot.as_path()))
        }
        Commands::ListRules { config, .. } => {
            tenant_posture::config_path_for(config.as_deref(), None)
        }
        Commands::Init { .. } => PathBuf::from(DEFAULT_CONFIG_FILE),
    };

    let mut logging = Config::load(&config_path)
        .map(|c| c.logging)
        .unwrap_or_default();
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }

    if let Err(e) = telemetry::init(&logging) {
        eprintln!("Warning: {}", e);
    }
}

fn parse_format(format_str: &str) -> OutputFormat {
    OutputFormat::from_str_lenient(format_str).unwrap_or_else(|| {
        eprintln!("Warning: unknown format '{}', using console", format_str);
        OutputFormat::Console
    })
}

fn expand_snapshots(patterns: &[String]) -> Result<Vec<PathBuf>, PostureError> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if Path::new(pattern).exists() {
            paths.push(PathBuf::from(pattern));
            continue;
        }
        let before = paths.len();
        for entry in glob::glob(pattern)? {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => tracing::warn!(error = %e, "unreadable snapshot path, skipping"),
            }
        }
        if paths.len() == before {
            return Err(PostureError::Snapshot {
                file: pattern.clone(),
                message: "no snapshot matches this path or pattern".into(),
            });
        }
    }
    Ok(paths)
}

fn cmd_evaluate(
    patterns: Vec<String>,
    config: Option<PathBuf>,
    format_str: String,
    output_path: Option<PathBuf>,
    write_back: bool,
) -> Result<i32, PostureError> {
    let format = parse_format(&format_str);
    let options = EvaluateOptions {
        config_path: config,
        write_back,
    };

    let mut reports = Vec::new();
    for path in expand_snapshots(&patterns)? {
        reports.push(tenant_posture::evaluate(&path, &options)?);
    }
    let rendered = tenant_posture::output::render_all(&reports, format)?;

    match output_path {
        Some(out) => std::fs::write(&out, &rendered)?,
        None => print!("{}", rendered),
    }

    Ok(0)
}

fn cmd_regenerate(snapshot: PathBuf, format_str: String) -> Result<i32, PostureError> {
    let format = parse_format(&format_str);
    let report = tenant_posture::regenerate(&snapshot)?;
    print!("{}", tenant_posture::render_report(&report, format)?);
    Ok(0)
}

fn cmd_list_rules(config: Option<PathBuf>, format_str: String) -> Result<i32, PostureError> {
    let registry = RuleRegistry::global();

    if let Some(path) = config {
        let config = Config::load(&path)?;
        let report = registry.apply_overrides(&config.custom_rules)?;
        for unknown in &report.unknown {
            match &unknown.suggestion {
                Some(s) => eprintln!("Warning: {} (did you mean {}?)", unknown, s),
                None => eprintln!("Warning: {}", unknown),
            }
        }
    }

    let rules = registry.descriptors()?;

    match format_str.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&rules)?;
            println!("{}", json);
        }
        _ => {
            println!(
                "{:<26} {:>6} {:>8} {:<6} TITLE",
                "ID", "POINTS", "MATURITY", "MITRE"
            );
            println!("{}", "-".repeat(90));
            for rule in &rules {
                println!(
                    "{:<26} {:>6} {:>8} {:<6} {}",
                    rule.risk_id,
                    rule.base_points(),
                    rule.maturity_level,
                    rule.mitre_id.as_deref().unwrap_or("-"),
                    rule.title,
                );
            }
        }
    }

    Ok(0)
}

fn cmd_init(force: bool) -> Result<i32, PostureError> {
    let path = PathBuf::from(DEFAULT_CONFIG_FILE);

    if path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", DEFAULT_CONFIG_FILE);
        return Ok(1);
    }

    std::fs::write(&path, Config::starter_toml())?;
    println!("Created {}", DEFAULT_CONFIG_FILE);

    Ok(0)
}
