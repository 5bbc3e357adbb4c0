use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::http::{header, HeaderValue};
use axum::routing::get;
use axum::Router;
use clap::Parser;
use doodle_shared::GameConfig;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

mod handlers;
mod state;

use crate::handlers::{config_handler, ping_handler, root_handler};
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long)]
    public_dir: Option<PathBuf>,
    /// Directory holding model.json and labels.txt, served under /model.
    #[arg(long)]
    model_dir: Option<PathBuf>,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,
    /// Round length in seconds.
    #[arg(long)]
    time_limit: Option<f64>,
    /// Confidence a guess must exceed to win the round.
    #[arg(long)]
    threshold: Option<f32>,
    #[arg(long)]
    interval_ms: Option<u32>,
    #[arg(long)]
    target_size: Option<u32>,
    #[arg(long)]
    invert_colors: bool,
}

impl Args {
    fn game_config(&self) -> anyhow::Result<GameConfig> {
        let mut config = GameConfig::default();
        if let Some(secs) = self.time_limit {
            config.rules.time_limit_secs = secs;
        }
        if let Some(threshold) = self.threshold {
            config.rules.confidence_threshold = threshold;
        }
        if let Some(interval) = self.interval_ms {
            config.rules.inference_interval_ms = interval;
        }
        if let Some(size) = self.target_size {
            config.normalizer.target_size = size;
        }
        config.normalizer.invert_colors = self.invert_colors;
        config.validate().context("invalid game settings")?;
        Ok(config)
    }
}

fn app(state: AppState, public_dir: PathBuf, model_dir: PathBuf) -> Router {
    let index_file = public_dir.join("index.html");
    Router::new()
        .route("/", get(root_handler))
        .route("/ping", get(ping_handler))
        .route("/config.json", get(config_handler))
        .nest_service("/model", ServeDir::new(model_dir))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .layer(axum::Extension(index_file))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.game_config()?;
    let public_dir = args
        .public_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));
    let model_dir = args
        .model_dir
        .clone()
        .unwrap_or_else(|| public_dir.join("model"));
    if !model_dir.join("model.json").is_file() {
        tracing::warn!(dir = %model_dir.display(), "no model.json found, the game will not start");
    }
    tracing::info!(?config, "game settings");

    let app = app(AppState::new(config), public_dir, model_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Doodle game running at http://localhost:{}", args.port);
    axum::serve(listener, app).await.context("server crashed")?;
    Ok(())
}
