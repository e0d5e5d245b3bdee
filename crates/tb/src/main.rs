use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tb_core::BridgeError;
use tb_core::config::{BridgeConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG};
use tb_core::error::ImportError;
use tb_core::types::PushPayload;
use tb_events::bus::EventBus;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const EVENT_BUS_CAPACITY: usize = 1024;

#[derive(Parser)]
#[command(name = "tb", version, about = "GitHub push hook bridge for the ticket store")]
struct Cli {
    /// Config file. Falls back to $TB_CONFIG, then .ticketbridge/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook and redirect server.
    Serve,
    /// Replace the revision map with the contents of a git-svn log.
    ImportRevmap {
        /// Defaults to `svn_revmap` from the config.
        file: Option<PathBuf>,
    },
    /// Resolve `r<N>` or a hash prefix through the revision map.
    Lookup { reference: String },
    /// Apply a push payload read from a file, or stdin with `-`.
    Process { payload: PathBuf },
    /// Print the OpenAPI document.
    Openapi,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), BridgeError> {
    if let Command::Openapi = cli.command {
        println!("{}", tb_serve::openapi::generate_spec());
        return Ok(());
    }

    let config = load_config(cli.config)?;
    match cli.command {
        Command::Serve => serve(config).await,
        Command::ImportRevmap { file } => import_revmap(&config, file),
        Command::Lookup { reference } => lookup(&config, &reference),
        Command::Process { payload } => process(&config, &payload),
        Command::Openapi => Ok(()),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<BridgeConfig, BridgeError> {
    let path = path
        .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = BridgeConfig::load(&path)?;
    config.apply_env();
    Ok(config)
}

fn internal(err: impl std::fmt::Display) -> BridgeError {
    BridgeError::Internal {
        message: err.to_string(),
    }
}

fn app_state(config: BridgeConfig) -> Result<tb_serve::AppState, BridgeError> {
    if let Some(parent) = config.server.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(internal)?;
        }
    }
    Ok(tb_serve::AppState::new(config, EventBus::new(EVENT_BUS_CAPACITY)))
}

async fn serve(config: BridgeConfig) -> Result<(), BridgeError> {
    let state = app_state(config)?;
    startup_import(&state);

    let mut notifications = state.event_bus.subscribe();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => info!(
                    ticket = notification.ticket_id,
                    status = %notification.status,
                    new_ticket = notification.new_ticket,
                    "ticket modified"
                ),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "notification log lagging"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let addr = state.config.listen_addr();
    tb_serve::serve(state, addr).await.map_err(internal)
}

/// Loads the revmap on first start. Problems are logged; serving goes on.
fn startup_import(state: &tb_serve::AppState) {
    let bridge = match tb_serve::build_bridge(state) {
        Ok(bridge) => bridge,
        Err(err) => {
            error!("cannot open ticket store: {err}");
            return;
        }
    };
    match bridge.revmap().needs_import(state.config.github.enable_revmap) {
        Ok(true) => {}
        Ok(false) => return,
        Err(err) => {
            error!("cannot inspect revision map: {err}");
            return;
        }
    }
    let result = state
        .config
        .require_revmap_file()
        .map_err(BridgeError::from)
        .and_then(|path| {
            info!(path = %path.display(), "revision map is empty, importing");
            let file = File::open(&path).map_err(ImportError::from)?;
            bridge.revmap().import(BufReader::new(file))
        });
    match result {
        Ok(report) => info!(inserted = report.inserted, gaps = report.gaps.len(), "revision map ready"),
        Err(err) => error!("revision map import failed: {err}"),
    }
}

fn import_revmap(config: &BridgeConfig, file: Option<PathBuf>) -> Result<(), BridgeError> {
    let path = match file {
        Some(path) => path,
        None => config.require_revmap_file()?,
    };
    let state = app_state(config.clone())?;
    let bridge = tb_serve::build_bridge(&state)?;
    let reader = File::open(&path).map_err(ImportError::from)?;
    let report = bridge.revmap().import(BufReader::new(reader))?;

    println!(
        "{} {} entries from {}",
        "imported".green().bold(),
        report.inserted,
        path.display()
    );
    for gap in &report.gaps {
        println!("  {} r{} -> r{}", "gap".yellow(), gap.newer, gap.older);
    }
    Ok(())
}

fn lookup(config: &BridgeConfig, reference: &str) -> Result<(), BridgeError> {
    let state = app_state(config.clone())?;
    let bridge = tb_serve::build_bridge(&state)?;
    let hits = bridge.revmap().resolve(reference)?;
    if hits.is_empty() {
        println!("{} {reference}", "no match for".yellow());
        return Ok(());
    }
    for hit in hits {
        println!("{} {}  {}", hit.query.dimmed(), hit.hash.cyan(), hit.message);
    }
    Ok(())
}

fn process(config: &BridgeConfig, payload: &Path) -> Result<(), BridgeError> {
    let raw = if payload.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(internal)?;
        buf
    } else {
        fs::read_to_string(payload).map_err(internal)?
    };
    let payload: PushPayload = serde_json::from_str(&raw).map_err(internal)?;

    let state = app_state(config.clone())?;
    let bridge = tb_serve::build_bridge(&state)?;
    let options = config.hook_options(&payload.repository.name);
    let report = bridge.hooks().process_push(&payload, &options);
    let json = serde_json::to_string_pretty(&report).map_err(internal)?;
    println!("{json}");
    Ok(())
}
