use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_interview::api::TokenSource;
use voice_interview::http::load_outline;
use voice_interview::view::begin_interview;
use voice_interview::{create_router, AppState, Config, InterviewContext};

#[derive(Parser)]
#[command(name = "voice-interview", version, about = "Voice interview client core")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voice-interview")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the development backend
    Serve,
    /// Start an interview and print the talk-room URL
    Start {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Fetch connection details for a new room
    ConnectionDetails,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Start { name, email } => start(cfg, &name, &email).await,
        Command::ConnectionDetails => connection_details(cfg).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    let outline = load_outline(cfg.service.outline_path.as_deref())?;
    if cfg.livekit.is_none() {
        info!("No [livekit] section configured; connection details will be unavailable");
    }

    let state = AppState::new(cfg.livekit, outline);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port)
        .parse()
        .context("Invalid HTTP bind address")?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Dev backend listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn start(cfg: Config, name: &str, email: &str) -> Result<()> {
    let backend = cfg.client.backend()?;
    let context = InterviewContext::new();

    let route = begin_interview(&backend, &context, name, email).await?;
    let origin = reqwest::Url::parse(&cfg.client.origin)?;

    if let Some(identity) = context.identity() {
        info!(
            "Interviewee {} / response {}",
            identity.interviewee_id, identity.response_id
        );
    }
    println!("{}", route.url(&origin));

    Ok(())
}

async fn connection_details(cfg: Config) -> Result<()> {
    let source = cfg.client.token_source()?;
    let details = source
        .fetch(&cfg.client.session_options().token_request())
        .await?;

    println!("{}", serde_json::to_string_pretty(&details)?);

    Ok(())
}
