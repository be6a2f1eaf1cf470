//! pairchat CLI entry point.
//!
//! See the `pairchat` library for the client itself.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use pairchat::env::{self, Environment};
use pairchat::{events, headless, tui, ws, Config, SessionController, WsConnection};

/// Global allocator configured per M-MIMALLOC-APPS guideline.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Global flag for signal-triggered shutdown (as Arc for signal-hook compatibility)
static SHUTDOWN_FLAG: std::sync::LazyLock<Arc<AtomicBool>> =
    std::sync::LazyLock::new(|| Arc::new(AtomicBool::new(false)));

#[derive(Parser)]
#[command(name = "pairchat")]
#[command(version)]
#[command(about = "Chat with a stranger from your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the relay and start chatting (default)
    Start(StartArgs),
    /// Print the effective configuration as JSON
    Config,
}

#[derive(Args, Default)]
struct StartArgs {
    /// Relay WebSocket URL (overrides config and PAIRCHAT_SERVER_URL)
    #[arg(long)]
    url: Option<String>,
    /// Participant id (overrides config and PAIRCHAT_UID)
    #[arg(long)]
    uid: Option<String>,
    /// Read messages from stdin and print the transcript instead of the TUI
    #[arg(long)]
    headless: bool,
}

fn init_logging() -> Result<()> {
    // Log to a file so output does not tear the TUI.
    let log_path = Config::log_path()?;
    let log_file = std::fs::File::create(&log_path)
        .with_context(|| format!("Failed to create log file at {}", log_path.display()))?;
    let environment = Environment::current();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(environment.default_log_filter()),
    )
    .target(env_logger::Target::Pipe(Box::new(log_file)))
    .format_timestamp_millis()
    .init();

    log::info!(
        "pairchat v{} starting ({environment})",
        env!("CARGO_PKG_VERSION")
    );
    Ok(())
}

fn register_signals() -> Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::flag;
    flag::register(SIGINT, Arc::clone(&SHUTDOWN_FLAG))?;
    flag::register(SIGTERM, Arc::clone(&SHUTDOWN_FLAG))?;
    Ok(())
}

fn start(args: StartArgs) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(url) = args.url {
        config.server_url = url;
    }
    if let Some(uid) = args.uid {
        config.uid = Some(uid);
    }

    let url = ws::relay_url(&config.server_url)?;
    // Keep a generated id across runs, except in test mode.
    let local_id = config.resolve_local_id(&Config::config_dir()?, !env::is_test_mode())?;
    log::info!("Connecting to {url} as {local_id}");
    register_signals()?;

    let (events_tx, events_rx) = events::channel();
    let connection = WsConnection::open(url, events_tx.clone());
    let mut controller = SessionController::new(local_id, connection);

    if args.headless {
        headless::spawn_stdin_reader(events_tx)?;
        let mut stdout = std::io::stdout();
        return headless::run_headless(&mut controller, &events_rx, &SHUTDOWN_FLAG, &mut stdout);
    }

    let guard = tui::TerminalGuard::enter()?;
    let mut terminal = guard.terminal()?;
    let mut app = tui::TuiApp::new(controller);
    tui::run(&mut terminal, &mut app, &events_tx, &events_rx, &SHUTDOWN_FLAG)
}

fn main() -> Result<()> {
    init_logging()?;

    // Log panics and restore the terminal (when the TUI holds it) before the
    // default handler prints.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        log::error!("PANIC: {panic_info:?}");
        tui::restore_terminal();
        default_hook(panic_info);
    }));

    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Start(StartArgs::default())) {
        Commands::Start(args) => start(args)?,
        Commands::Config => {
            let config = Config::load()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
