//! Hobbes CLI - filesystem change mirror
//!
//! Usage: hobbes <COMMAND>
//!
//! Commands:
//!   run    Watch the source tree and mirror changes continuously
//!   seed   One-time full copy of the source tree to the destination
//!   check  Validate configuration and print the effective settings

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use hobbes::{
    ChangeEvent, Config, ConfigWarning, EventKind, FileLog, LogSink, MirrorSettings, PathMapper,
    ReplicationEngine, StderrLog, TeeLog, WatchSession,
};

/// Hobbes - mirrors filesystem changes from a source tree to a destination tree
#[derive(Parser, Debug)]
#[command(name = "hobbes")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long, global = true)]
    json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch the source tree and mirror changes continuously
    Run {
        /// Path to hobbes.toml (defaults to ./hobbes.toml, then user config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source root (overrides config)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Destination root (overrides config)
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Comma-separated event kinds to mirror (created,changed,renamed,deleted)
        #[arg(short, long)]
        events: Option<String>,

        /// Full copy of the source tree before watching
        #[arg(long)]
        seed: bool,
    },

    /// One-time full copy of the source tree to the destination
    Seed {
        /// Path to hobbes.toml (defaults to ./hobbes.toml, then user config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source root (overrides config)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Destination root (overrides config)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },

    /// Validate configuration and print the effective settings
    Check {
        /// Path to hobbes.toml (defaults to ./hobbes.toml, then user config)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source root (overrides config)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Destination root (overrides config)
        #[arg(short, long)]
        dest: Option<PathBuf>,

        /// Comma-separated event kinds to mirror (created,changed,renamed,deleted)
        #[arg(short, long)]
        events: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            source,
            dest,
            events,
            seed,
        } => cmd_run(
            config.as_deref(),
            source,
            dest,
            events.as_deref(),
            seed,
            cli.json,
        ),
        Commands::Seed {
            config,
            source,
            dest,
        } => cmd_seed(config.as_deref(), source, dest, cli.json),
        Commands::Check {
            config,
            source,
            dest,
            events,
        } => cmd_check(
            config.as_deref(),
            source,
            dest,
            events.as_deref(),
            cli.json,
            cli.verbose,
        ),
    }
}

/// Config file, environment, then CLI flags, in rising priority.
fn load_settings(
    config_path: Option<&Path>,
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    events: Option<&str>,
) -> Result<(MirrorSettings, Vec<ConfigWarning>, Option<PathBuf>)> {
    let (config, warnings, used) = Config::discover(config_path)?;
    let mut config = config.with_env_overrides();

    if let Some(source) = source {
        config.mirror.source = Some(source);
    }
    if let Some(dest) = dest {
        config.mirror.destination = Some(dest);
    }
    if let Some(events) = events {
        config.mirror.events = events.split(',').filter_map(EventKind::from_name).collect();
    }

    let settings = config.settings()?;
    Ok((settings, warnings, used))
}

fn build_sink(settings: &MirrorSettings) -> Arc<dyn LogSink> {
    match &settings.log_file {
        Some(path) => Arc::new(TeeLog::new(vec![
            Box::new(StderrLog),
            Box::new(FileLog::new(path)),
        ])),
        None => Arc::new(StderrLog),
    }
}

fn print_warnings(warnings: &[ConfigWarning], json: bool) {
    for warning in warnings {
        if json {
            let output = serde_json::json!({
                "event": "config_warning",
                "key": warning.key,
                "file": warning.file.display().to_string(),
                "line": warning.line,
                "suggestion": warning.suggestion,
            });
            println!("{}", output);
        } else {
            let location = match warning.line {
                Some(line) => format!("{}:{}", warning.file.display(), line),
                None => warning.file.display().to_string(),
            };
            match &warning.suggestion {
                Some(suggestion) => println!(
                    "⚠ Unknown config key '{}' in {} (did you mean '{}'?)",
                    warning.key, location, suggestion
                ),
                None => println!("⚠ Unknown config key '{}' in {}", warning.key, location),
            }
        }
    }
}

fn cmd_run(
    config_path: Option<&Path>,
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    events: Option<&str>,
    seed: bool,
    json: bool,
) -> Result<()> {
    let (settings, warnings, _used) = load_settings(config_path, source, dest, events)?;
    print_warnings(&warnings, json);
    let log = build_sink(&settings);

    if seed {
        seed_destination(&settings, Arc::clone(&log))?;
        if !json {
            println!("✓ Seeded destination from source");
        }
    }

    let mut session = WatchSession::new(settings, log)?;

    let running = Arc::new(AtomicBool::new(true));
    let handle = Arc::clone(&running);
    ctrlc::set_handler(move || handle.store(false, Ordering::SeqCst))?;

    if json {
        let output = serde_json::json!({
            "event": "watch_started",
            "source": session.source().display().to_string(),
            "destination": session.destination().display().to_string(),
            "events": session.events().to_string(),
        });
        println!("{}", output);
    } else {
        println!("👀 Hobbes Run");
        println!("Source: {}", session.source().display());
        println!("Destination: {}", session.destination().display());
        println!("Events: {}", session.events());
        println!("Press Ctrl+C to stop\n");
    }

    session.start()?;
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }

    if !json {
        println!("\n👋 Stopping...");
    }
    session.stop();
    // Dropping joins the retired runtime, so pending replications land
    // before the stop event is reported.
    drop(session);

    if json {
        println!("{}", serde_json::json!({ "event": "watch_stopped" }));
    }
    Ok(())
}

fn cmd_seed(
    config_path: Option<&Path>,
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let (settings, warnings, _used) = load_settings(config_path, source, dest, None)?;
    print_warnings(&warnings, json);

    if !json {
        println!("🌱 Hobbes Seed");
        println!("Source: {}", settings.source.display());
        println!("Destination: {}", settings.destination.display());
    }

    let log = build_sink(&settings);
    seed_destination(&settings, log)?;

    if json {
        let output = serde_json::json!({
            "event": "seed",
            "source": settings.source.display().to_string(),
            "destination": settings.destination.display().to_string(),
        });
        println!("{}", output);
    } else {
        println!("\n✓ Seed complete");
    }
    Ok(())
}

/// Full copy as a synthetic Created on the source root, so excludes,
/// retry, and logging behave exactly as they do for live replication.
fn seed_destination(settings: &MirrorSettings, log: Arc<dyn LogSink>) -> Result<()> {
    if !settings.source.is_dir() {
        anyhow::bail!("source directory not found: {}", settings.source.display());
    }
    std::fs::create_dir_all(&settings.destination)?;

    let mapper = PathMapper::new(&settings.source, &settings.destination);
    let engine = ReplicationEngine::new(
        mapper,
        settings.retry,
        Arc::clone(&settings.exclude),
        log,
    );
    engine.apply(&ChangeEvent::created(settings.source.clone()));
    Ok(())
}

fn cmd_check(
    config_path: Option<&Path>,
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    events: Option<&str>,
    json: bool,
    verbose: u8,
) -> Result<()> {
    let (settings, warnings, used) = match load_settings(config_path, source, dest, events) {
        Ok(loaded) => loaded,
        Err(err) => {
            if json {
                let output = serde_json::json!({
                    "event": "check",
                    "status": "error",
                    "message": err.to_string(),
                });
                println!("{}", output);
            } else {
                println!("✗ {}", err);
            }
            std::process::exit(1);
        }
    };
    print_warnings(&warnings, json);

    if json {
        let output = serde_json::json!({
            "event": "check",
            "status": "ok",
            "source": settings.source.display().to_string(),
            "destination": settings.destination.display().to_string(),
            "events": settings.events.to_string(),
            "window_ms": settings.windows.window.as_millis() as u64,
            "attempts": settings.retry.max_attempts,
            "backoff_ms": settings.retry.backoff.as_millis() as u64,
            "workers": settings.workers,
            "exclude": settings.exclude.patterns(),
            "warnings": warnings.len(),
        });
        println!("{}", output);
    } else {
        println!("🩺 Hobbes Check");
        if verbose > 0 {
            match &used {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("Config file: (defaults)"),
            }
        }
        println!();
        println!("Source: {}", settings.source.display());
        println!("Destination: {}", settings.destination.display());
        println!("Events: {}", settings.events);
        println!("Debounce window: {}ms", settings.windows.window.as_millis());
        println!(
            "Retry: {} attempts, {}ms backoff",
            settings.retry.max_attempts,
            settings.retry.backoff.as_millis()
        );
        println!("Workers: {}", settings.workers);
        if settings.exclude.is_empty() {
            println!("Exclude: (none)");
        } else {
            println!("Exclude: {}", settings.exclude.patterns().join(", "));
        }
        match &settings.log_file {
            Some(path) => println!("Log file: {}", path.display()),
            None => println!("Log file: (stderr only)"),
        }
        println!();
        println!("🟢 Configuration OK");
    }
    Ok(())
}
