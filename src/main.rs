//! Project Idea Generator - 代理服务入口
//!
//! `serve` 启动 axum 服务；`ask` 向运行中的代理请求一个 idea。

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use idea_proxy::config::AppConfig;
use idea_proxy::create_app;
use idea_proxy::requester::{IdeaRequester, RequestOutcome, DEFAULT_CATEGORY};
use idea_proxy::state::create_shared_state;

#[derive(Debug, Parser)]
#[command(name = "idea-proxy")]
#[command(about = "Gemini-backed project idea proxy")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the proxy server (default)
    Serve {
        /// Listen address, overrides IDEA_PROXY_ADDR
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },
    /// Ask a running proxy for one idea
    Ask {
        /// Proxy endpoint
        #[arg(long, default_value = "http://127.0.0.1:8765/api/get-idea")]
        endpoint: String,
        /// Category to request
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env 需在日志初始化前加载，RUST_LOG 可能来自其中
    let dotenv_result = dotenvy::dotenv();

    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "idea_proxy=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = dotenv_result {
        if !e.not_found() {
            warn!("Failed to load .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(bind).await,
        Command::Ask { endpoint, category } => ask(endpoint, category).await,
    }
}

async fn serve(bind: Option<SocketAddr>) -> Result<()> {
    info!("Starting idea proxy...");

    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    if let Some(bind) = bind {
        config.bind_addr = bind;
    }
    let addr = config.bind_addr;
    info!("Loaded configuration: {:?}", config);

    // 创建共享状态
    let state = create_shared_state(config).context("failed to create upstream client")?;
    let app = create_app(state);

    info!("Server listening on: {}", addr);

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn ask(endpoint: String, category: String) -> Result<()> {
    let requester = IdeaRequester::new(endpoint)?;
    if !requester.select_category(&category) {
        bail!(
            "unknown category '{}', expected one of: {}",
            category,
            requester.categories().join(", ")
        );
    }

    match requester.request_idea().await {
        RequestOutcome::Rendered(view) => {
            println!("{}", view.text);
            if let Some(error) = view.error {
                eprintln!("error: {}", error);
                std::process::exit(1);
            }
            Ok(())
        }
        RequestOutcome::Ignored => bail!("another request is already in flight"),
    }
}
