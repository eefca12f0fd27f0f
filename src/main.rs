//! padmap command-line runtime
//!
//! Runs the binding engine against the console host, or manages profiles.

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::*;
use padmap::action::{ParamSignature, CATALOG};
use padmap::config::ConfigWatcher;
use padmap::device::builtin_models;
use padmap::dispatch::{ConsoleHost, TracingNotifier};
use padmap::input::gamepad::{print_gamepad_diagnostics, GilrsProvider};
use padmap::paths::AppPaths;
use padmap::profile::{CompiledProfile, Context, ProfileStore, TableHandle};
use padmap::{Engine, Runtime};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Map game controller input to application actions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Also write a daily rolling log file
    #[arg(long)]
    log_file: bool,

    /// Context the console host reports
    #[arg(long, default_value = "global")]
    context: Context,

    /// Show detected gamepads and the model each resolves to
    #[arg(long)]
    list_devices: bool,

    /// List the known controller models
    #[arg(long)]
    list_models: bool,

    /// List stored profiles and assignments
    #[arg(long)]
    list_profiles: bool,

    /// List the built-in command catalog
    #[arg(long)]
    list_commands: bool,

    /// Export a profile to a file
    #[arg(long, num_args = 2, value_names = ["NAME", "PATH"])]
    export: Option<Vec<String>>,

    /// Import a profile from a file
    #[arg(long, value_name = "PATH")]
    import: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let paths = match &args.config {
        Some(path) => AppPaths::for_config(path),
        None => AppPaths::detect(),
    };
    paths.ensure_directories()?;

    let _guard = init_logging(&args, &paths)?;
    info!("Starting padmap v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", paths.config_file.display());

    if args.list_models {
        list_models();
        return Ok(());
    }
    if args.list_commands {
        list_commands();
        return Ok(());
    }

    let (watcher, config) = ConfigWatcher::new(&paths.config_file).await?;

    if args.list_devices {
        print_gamepad_diagnostics(config.engine.detect_8bitdo);
        return Ok(());
    }

    let profiles_dir = config.profiles_dir.clone().unwrap_or_else(|| paths.profiles_dir.clone());
    let mut store = ProfileStore::open(&profiles_dir)
        .await
        .with_context(|| format!("Failed to open profiles in {}", profiles_dir.display()))?;

    if args.list_profiles {
        list_profiles(&store);
        return Ok(());
    }
    if let Some(export) = &args.export {
        let (name, path) = (&export[0], &export[1]);
        store.export(name, path).await?;
        println!("{} {} → {}", "Exported".green(), name.bold(), path);
        return Ok(());
    }
    if let Some(path) = &args.import {
        let name = store.import(path).await?;
        println!("{} {}", "Imported as".green(), name.bold());
        return Ok(());
    }

    let settings = config.engine_settings();
    let bounds = settings
        .desktop
        .unwrap_or(padmap::gesture::Rect::new(0, 0, 1920, 1080));
    let host = ConsoleHost::new("console", args.context, bounds);
    let tables = TableHandle::new(CompiledProfile::empty(Arc::new(
        padmap::device::DeviceModel::generic(0, 0, 0),
    )));
    let engine = Engine::new(host, Box::new(TracingNotifier), tables, settings);
    let mut runtime = Runtime::new(engine, store, config.engine.poll_interval_ms);

    let (tx, rx) = mpsc::unbounded_channel();
    let mut provider = GilrsProvider::start(tx)?;

    runtime.run(rx, Some(watcher), shutdown_signal()).await?;

    provider.shutdown();
    info!(
        "padmap shutdown complete ({} actions dispatched)",
        runtime.engine().dispatcher().dispatched()
    );
    Ok(())
}

fn init_logging(args: &Args, paths: &AppPaths) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level));

    let stdout = if args.log_json {
        tracing_subscriber::fmt::layer().json().with_target(false).boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed()
    };

    let (file, guard) = if args.log_file {
        let appender = tracing_appender::rolling::daily(&paths.logs_dir, "padmap.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for CTRL+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn list_models() {
    println!("\n{}", "=== Controller Models ===".bold().cyan());
    for model in builtin_models() {
        println!(
            "\n  {} ({} buttons, {} axes, {} hats)",
            model.name.bright_white().bold(),
            model.button_count(),
            model.axes,
            model.hats
        );
        let signatures: Vec<String> = model.signatures.iter().map(|s| s.to_string()).collect();
        if !signatures.is_empty() {
            println!("    IDs: {}", signatures.join(", ").yellow());
        }
        for (index, name) in model.buttons.iter().enumerate() {
            println!("    {:>2} {}", index.to_string().dimmed(), name);
        }
    }
    println!();
}

fn list_commands() {
    println!("\n{}", "=== Commands ===".bold().cyan());
    for info in CATALOG.iter() {
        let params = match info.params {
            ParamSignature::Fixed => String::new(),
            ParamSignature::OptionalInt { min, max } => format!(" [{}-{}]", min, max),
        };
        let contexts: Vec<&str> = Context::ALL
            .into_iter()
            .filter(|c| info.command.offered_in(*c))
            .map(Context::id)
            .collect();
        println!(
            "  {:<20} {:<22}{} {}",
            info.id.green(),
            info.label,
            params.yellow(),
            contexts.join(",").dimmed()
        );
    }
    println!();
}

fn list_profiles(store: &ProfileStore) {
    println!("\n{}", "=== Profiles ===".bold().cyan());
    println!("  Directory: {}", store.dir().display());
    for name in store.list() {
        let device = store.get(name).map(|p| p.device.clone()).unwrap_or_default();
        println!("  {} {}", name.green(), format!("({})", device).dimmed());
    }
    for name in store.corrupt() {
        println!("  {} {}", name.red(), "(corrupt, skipped)".dimmed());
    }
    println!();
}
