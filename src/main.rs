//! Param Link
//!
//! Bind MIDI knobs, sliders and buttons to typed parameters by moving them.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use param_link::cli::{self, Command};
use param_link::config::{AppConfig, LinksWatcher};
use param_link::engine::{LinkEngine, LinkError};
use param_link::focus::Linkable;
use param_link::input::{self, MidiInputs};
use param_link::params::{ParamNode, ParameterGroup};
use param_link::paths::AppPaths;

/// Param Link - MIDI learn for application parameters
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults to the application data directory)
    #[arg(short, long)]
    config: Option<String>,

    /// Links file, overriding `links.path` from the configuration
    #[arg(long)]
    links: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Also write a daily rolling log file to the logs directory
    #[arg(long)]
    log_file: bool,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let paths = AppPaths::detect();
    paths.ensure_directories()?;

    let log_dir = args.log_file.then_some(paths.logs_dir.as_path());
    let _log_guard = init_logging(&args.log_level, log_dir)?;

    if args.list_ports {
        input::print_ports()?;
        return Ok(());
    }

    let config_path = args
        .config
        .map(PathBuf::from)
        .unwrap_or_else(|| paths.config.clone());

    info!("Starting Param Link...");
    info!("Configuration file: {}", config_path.display());

    let config = AppConfig::load(&config_path.to_string_lossy()).await?;

    // Relative links paths are relative to the config file
    let links_path = match args.links {
        Some(path) => PathBuf::from(path),
        None => config_path
            .parent()
            .map(|dir| dir.join(&config.links.path))
            .unwrap_or_else(|| PathBuf::from(&config.links.path)),
    };

    let root = config.build_parameters();
    for param in root.parameters() {
        param.add_listener(Arc::new(|path, value| debug!("{} = {}", path, value)));
    }
    info!("{} parameters declared", root.parameters().len());

    run_app(config, root, links_path, shutdown_signal()).await?;

    info!("Param Link shutdown complete");
    Ok(())
}

async fn run_app(
    config: AppConfig,
    root: ParameterGroup,
    links_path: PathBuf,
    shutdown: impl std::future::Future<Output = ()>,
) -> Result<()> {
    let (sender, mut engine) = LinkEngine::new();

    if config.links.autoload {
        match engine.load(&root, &links_path).await {
            Ok(_) | Err(LinkError::NotFound { .. }) => {}
            Err(e) => warn!("⚠️  Links not loaded: {}", e),
        }
    }

    let inputs = MidiInputs::connect(&config.midi.input_ports, sender)?;
    info!("Listening on: {}", inputs.port_names().join(", "));

    let mut watcher = if config.links.watch {
        Some(LinksWatcher::new(&links_path)?)
    } else {
        None
    };

    let mut commands = cli::spawn_repl()?;
    println!("{}", "Type 'help' for commands".dimmed());

    let mut tick = tokio::time::interval(Duration::from_millis(config.engine.tick_ms));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut focus: Option<ParamNode> = None;

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let processed = engine.update();
                if config.links.autosave && processed.iter().any(|p| p.learned.is_some()) {
                    save_links(&engine, &links_path).await;
                }
            }

            // Without a console (no terminal) this branch is simply disabled
            Some(command) = commands.recv() => {
                if command == Command::Quit {
                    break;
                }
                handle_command(command, &mut engine, &root, &mut focus, &links_path).await;
            }

            Some(path) = next_reload(&mut watcher) => {
                info!("📝 Links file changed, reloading...");
                if let Err(e) = engine.load(&root, &path).await {
                    warn!("⚠️  Failed to reload links (keeping current links): {}", e);
                }
            }

            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping event loop");
                break;
            }
        }
    }

    info!("Shutting down...");
    if config.links.autosave {
        save_links(&engine, &links_path).await;
    }
    inputs.close();

    Ok(())
}

async fn handle_command(
    command: Command,
    engine: &mut LinkEngine,
    root: &ParameterGroup,
    focus: &mut Option<ParamNode>,
    links_path: &Path,
) {
    match command {
        Command::Params => print_group(root, engine, 0),
        Command::Focus(path) => {
            set_focus(root, focus, &path);
        }
        Command::Learn(path) => {
            if let Some(path) = path {
                if !set_focus(root, focus, &path) {
                    return;
                }
            }
            match engine.link_focused(focus.as_ref().map(|node| node as &dyn Linkable)) {
                Ok(true) => println!("{}", "Move the control to link...".cyan()),
                Ok(false) => println!("{}", "Nothing linkable is focused".yellow()),
                Err(e) => warn!("⚠️  {}", e),
            }
        }
        Command::Pending => {
            let pending = engine.learn_queue().pending_names();
            if pending.is_empty() {
                println!("  {}", "(no pending link requests)".dimmed());
            }
            for (position, path) in pending.iter().enumerate() {
                println!("  {} {}", format!("{}.", position + 1).yellow(), path);
            }
        }
        Command::Links => {
            let links = engine.links().to_names();
            if links.is_empty() {
                println!("  {}", "(no links)".dimmed());
            }
            for (key, path) in links {
                println!("  {} => {}", key.cyan(), path.green());
            }
        }
        Command::Save(path) => {
            let target = path.map(PathBuf::from).unwrap_or_else(|| links_path.to_path_buf());
            save_links(engine, &target).await;
        }
        Command::Load(path) => {
            let target = path.map(PathBuf::from).unwrap_or_else(|| links_path.to_path_buf());
            if let Err(e) = engine.load(root, &target).await {
                warn!("⚠️  Links not loaded: {}", e);
            }
        }
        Command::Help => println!("{}", cli::help_text()),
        Command::Quit => {}
    }
}

/// Focus the node at `path`, returning false if there is none
fn set_focus(root: &ParameterGroup, focus: &mut Option<ParamNode>, path: &str) -> bool {
    match root.node(path) {
        Some(node) => {
            println!("Focused {}", node.path().bold());
            *focus = Some(node.clone());
            true
        }
        None => {
            println!("{}", format!("No parameter or group at '{}'", path).red());
            false
        }
    }
}

fn print_group(group: &ParameterGroup, engine: &LinkEngine, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    if group.is_empty() && depth == 0 {
        println!("{}{}", indent, "(no parameters)".dimmed());
    }

    for child in group.children() {
        match child {
            ParamNode::Group(sub) => {
                println!("{}{}/", indent, sub.name().bold());
                print_group(sub, engine, depth + 1);
            }
            ParamNode::Parameter(param) => {
                let keys = engine.links().keys_for(param.path());
                let linked = if keys.is_empty() {
                    String::new()
                } else {
                    format!(
                        " <- {}",
                        keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
                    )
                };
                println!(
                    "{}{} = {} {}{}",
                    indent,
                    param.name().yellow(),
                    param.value(),
                    format!("[{}]", param.kind()).dimmed(),
                    linked.cyan()
                );
            }
        }
    }
}

async fn save_links(engine: &LinkEngine, path: &Path) {
    if let Err(e) = engine.save(path).await {
        warn!("⚠️  Failed to save links: {}", e);
    }
}

async fn next_reload(watcher: &mut Option<LinksWatcher>) -> Option<PathBuf> {
    match watcher {
        Some(watcher) => watcher.next_change().await,
        None => std::future::pending().await,
    }
}

fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "param-link.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
