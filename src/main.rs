use std::sync::Arc;

use clap::{Parser, Subcommand};

use dev_assistant::application::errors::BotError;
use dev_assistant::application::launcher::{launch, FailureMode};
use dev_assistant::application::monitor::SessionMonitor;
use dev_assistant::application::services::{standard_session, Session};
use dev_assistant::domain::traits::Gateway;
use dev_assistant::infrastructure::adapters::{ConsoleGateway, DiscordGateway};
use dev_assistant::infrastructure::config::Config;
use dev_assistant::infrastructure::keepalive;

#[derive(Parser)]
#[command(name = "dev-assistant")]
#[command(about = "Discord dev assistant bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token for the first session (overrides config)
    #[arg(short, long)]
    token: Option<String>,

    /// Start the keep-alive HTTP listener on this port
    #[arg(long)]
    keep_alive: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single bot session
    Run,
    /// Run three bot sessions side by side
    Multi,
    /// Chat with the bot from the terminal (dev mode)
    Console,
    /// Show version
    Version,
    /// Print the default config
    InitConfig,
}

fn main() {
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Run => {
            let config = load_config(&cli.config, Config::load_env);
            run(config, &cli, Arc::new(DiscordGateway::new()))
        }
        Commands::Multi => {
            let config = load_config(&cli.config, Config::multi_env);
            run(config, &cli, Arc::new(DiscordGateway::new()))
        }
        Commands::Console => {
            let mut config = load_config(&cli.config, Config::load_env);
            config.sessions.truncate(1);
            let config = config.with_token_override("console");
            run(config, &cli, Arc::new(ConsoleGateway::new()))
        }
        Commands::Version => {
            println!("dev-assistant v{}", env!("CARGO_PKG_VERSION"));
            0
        }
        Commands::InitConfig => init_config(),
    };

    std::process::exit(code);
}

/// Config file when present, otherwise `fallback` built from the environment
fn load_config(path: &str, fallback: fn() -> Config) -> Config {
    if std::path::Path::new(path).exists() {
        Config::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using environment", e);
            fallback()
        })
    } else {
        fallback()
    }
}

fn run(config: Config, cli: &Cli, gateway: Arc<dyn Gateway>) -> i32 {
    let config = match &cli.token {
        Some(token) => config.with_token_override(token.clone()),
        None => config,
    };

    // Every session and handler shares one cooperative scheduler
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return 1;
        }
    };

    rt.block_on(async {
        match run_sessions(config, cli.keep_alive, gateway).await {
            Ok(()) => 0,
            Err(e) => {
                tracing::error!("{}", e);
                1
            }
        }
    })
}

async fn run_sessions(config: Config, keep_alive_port: Option<u16>, gateway: Arc<dyn Gateway>) -> Result<(), BotError> {
    tracing::info!("Starting {} with {} session(s)", config.bot.name, config.sessions.len());

    let monitor = SessionMonitor::new();
    let sessions = build_sessions(&config, &monitor)?;

    let port = keep_alive_port.or(config.keep_alive.enabled.then_some(config.keep_alive.port));
    if let Some(port) = port {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            if let Err(e) = keepalive::serve(port, monitor).await {
                tracing::error!("Keep-alive server stopped: {}", e);
            }
        });
    }

    let mode = config.launch.failure_mode;
    let report = launch(sessions, gateway, mode).await?;

    for outcome in report.failed() {
        if let Err(e) = &outcome.result {
            tracing::warn!("[{}] ended with error: {}", outcome.session, e);
        }
    }
    if report.all_failed() {
        return Err(BotError::Internal("every session failed".to_string()));
    }
    if mode == FailureMode::Isolated {
        tracing::info!("{} session(s) ended cleanly", report.succeeded().count());
    }
    Ok(())
}

fn build_sessions(config: &Config, monitor: &SessionMonitor) -> Result<Vec<Session>, BotError> {
    config
        .sessions
        .iter()
        .map(|session| {
            let builder = standard_session(session.identity()?, &session.options())?;
            Ok(builder.with_monitor(monitor.clone()).build()?)
        })
        .collect()
}

fn init_config() -> i32 {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
            0
        }
        Err(e) => {
            eprintln!("Failed to render config: {}", e);
            1
        }
    }
}
