use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use dp_cache::CacheHandle;
use dp_core::Config;
use dp_inference::{KokoroClient, RouterClient};
use dp_pipeline::{Pipeline, PipelineOptions};
use dp_scrapers::HfPapersScraper;
use dp_web::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about = "Daily AI papers digest server")]
struct Cli {
    /// Address to bind the HTTP server to (overrides BIND_ADDR).
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let bind_addr = cli.bind.unwrap_or_else(|| config.bind_addr.clone());

    let cache = match config.kv_url.as_deref() {
        Some(url) => CacheHandle::connect(url, config.cache_ttl).await,
        None => {
            warn!("KV_URL is not set, caching disabled");
            CacheHandle::disabled()
        }
    };
    info!(usable = cache.usable(), "💾 cache store initialized");

    let source = Arc::new(HfPapersScraper::new(
        &config.papers_url,
        config.scrape_timeout,
    )?);
    info!(url = %config.papers_url, "📰 content source initialized");

    let generator = Arc::new(RouterClient::new(
        &config.generation_url,
        &config.generation_model,
        config.hf_api_key.clone(),
        config.generation_timeout,
    )?);
    let synthesizer = Arc::new(KokoroClient::new(
        &config.synthesis_url,
        config.deepinfra_api_key.clone(),
        config.synthesis_timeout,
    )?);
    info!(model = %config.generation_model, "🧠 inference clients initialized");

    let pipeline = Pipeline::new(
        source,
        generator,
        synthesizer,
        cache,
        PipelineOptions {
            papers_url: config.papers_url.clone(),
            site_url: config.site_url.clone(),
            max_papers: config.max_papers,
            generation_timeout: config.generation_timeout,
            ..PipelineOptions::default()
        },
    );

    if config.update_key.is_none() {
        warn!("UPDATE_KEY is not set, the refresh trigger is disabled");
    }

    let app = dp_web::create_app(AppState {
        pipeline: Arc::new(pipeline),
        update_key: config.update_key.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "🎙 serving daily papers digest");
    axum::serve(listener, app).await?;
    Ok(())
}
