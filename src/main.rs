// BirthWindow - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation (debug mode support)
// 3. Reference data loading
// 4. Session script replay, terminal report, and CSV/JSON export

use birthwindow::app::reference_mgr;
use birthwindow::app::script;
use birthwindow::app::session::Session;
use birthwindow::core::export::{export_csv, export_json};
use birthwindow::core::model::Sign;
use birthwindow::platform::config::{load_config, AppConfig, PlatformPaths};
use birthwindow::platform::fs::write_atomic;
use birthwindow::ui::report;
use birthwindow::util;
use birthwindow::util::error::BirthWindowError;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// BirthWindow - narrow an uncertain birth time by elimination.
///
/// Split the birth window at each planetary-hour change, then answer
/// yes/no/maybe questions until only the plausible time slots remain.
#[derive(Parser, Debug)]
#[command(name = "birthwindow", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding config.toml and the default questions.toml.
    #[arg(short = 'c', long = "config-dir", global = true)]
    config_dir: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a session script and print the resulting analysis.
    Run {
        /// Session script (TOML) with the timeline and all answers.
        script: PathBuf,

        /// Question reference file (overrides config.toml).
        #[arg(short = 'r', long = "reference")]
        reference: Option<PathBuf>,

        /// Write the per-slot CSV export here (overrides config.toml).
        #[arg(short = 'e', long = "export")]
        export: Option<PathBuf>,

        /// Write the results as JSON here.
        #[arg(short = 'j', long = "json")]
        json: Option<PathBuf>,
    },

    /// Validate a reference file and check it covers every question for a Mars sign.
    CheckReference {
        /// Question reference file to check.
        path: PathBuf,

        /// Mars sign the reference must fully cover.
        #[arg(short = 'm', long = "mars")]
        mars: Sign,
    },
}

fn main() {
    let cli = Cli::parse();

    // Config first so its [logging] section can shape the subscriber.
    let platform_paths = match cli.config_dir {
        Some(ref dir) => PlatformPaths {
            config_dir: dir.clone(),
        },
        None => PlatformPaths::resolve(),
    };
    let (config, config_warnings) = load_config(&platform_paths.config_dir);

    util::logging::init(
        cli.debug,
        config.log_level.as_deref(),
        config.log_file.as_deref(),
    );

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        config_dir = %platform_paths.config_dir.display(),
        "BirthWindow starting"
    );
    for warning in &config_warnings {
        tracing::warn!(error = %warning, "Configuration warning");
        eprintln!("Warning: {warning}");
    }

    let result = match cli.command {
        Command::Run {
            script,
            reference,
            export,
            json,
        } => {
            let reference = reference
                .or_else(|| config.reference_file.clone())
                .unwrap_or_else(|| platform_paths.default_reference_file());
            run(&script, &reference, export_target(export, &config), json)
        }
        Command::CheckReference { path, mars } => check_reference(&path, mars),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// CSV export path: CLI override > config.toml directory > none.
fn export_target(cli_path: Option<PathBuf>, config: &AppConfig) -> Option<PathBuf> {
    cli_path.or_else(|| config.export_path())
}

fn run(
    script_path: &Path,
    reference_path: &Path,
    export_path: Option<PathBuf>,
    json_path: Option<PathBuf>,
) -> util::error::Result<()> {
    let reference = reference_mgr::load_reference(reference_path)?;
    let script = script::load_script(script_path)?;
    tracing::info!(
        script = %script_path.display(),
        reference = %reference_path.display(),
        "Replaying session script"
    );

    let mut session = Session::new(Arc::new(reference));
    let replayed = script::replay(&script, &mut session);

    // The timeline is shown even when replay stops early, so the user can see
    // which step rejected the script.
    if let Some(timeline) = session.timeline() {
        print!("{}", report::render_timeline(timeline));
    }
    let transcript = replayed?;
    print!("{}", report::render_transcript(&transcript));

    let results = session.results()?;
    print!("{}", report::render_results(&results));

    if let Some(path) = export_path {
        let mut buf = Vec::new();
        let count = export_csv(&session.export_rows(), &mut buf, &path)?;
        write_output(&path, &buf)?;
        tracing::info!(rows = count, path = %path.display(), "CSV export complete");
        println!("\nExported {count} slot(s) to {}", path.display());
    }

    if let Some(path) = json_path {
        let mut buf = Vec::new();
        export_json(&results, &mut buf, &path)?;
        write_output(&path, &buf)?;
        tracing::info!(path = %path.display(), "JSON export complete");
        println!("Results written to {}", path.display());
    }

    Ok(())
}

fn check_reference(path: &Path, mars: Sign) -> util::error::Result<()> {
    let reference = reference_mgr::load_reference(path)?;
    reference.check_coverage(mars)?;
    println!(
        "'{}' covers every question for Mars in {mars}.",
        path.display()
    );
    Ok(())
}

fn write_output(path: &Path, bytes: &[u8]) -> util::error::Result<()> {
    write_atomic(path, bytes).map_err(|e| BirthWindowError::Io {
        path: path.to_path_buf(),
        operation: "export write",
        source: e,
    })
}
