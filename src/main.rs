//! Dalgurak HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use dalgurak::backend::{
    CorpusRetriever, Embedder, Generator, HashEmbedder, LlmGenerator, Retriever,
    TemplateGenerator,
};
use dalgurak::cache::CacheSweeper;
use dalgurak::config::Config;
use dalgurak::engine::QueryEngine;
use dalgurak::gateway::{HandlerState, create_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        max_concurrent = config.max_concurrent,
        rate_limit = config.rate_limit,
        "Dalgurak starting"
    );

    let retriever: Arc<dyn Retriever> = match &config.corpus_path {
        Some(path) => Arc::new(CorpusRetriever::load(path, config.retrieve_k).await?),
        None => {
            tracing::warn!("No DALGURAK_CORPUS_PATH configured, retrieval returns no passages");
            Arc::new(CorpusRetriever::empty())
        }
    };
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());

    let (generator, generator_mode): (Arc<dyn Generator>, &'static str) = if config.mock_provider
    {
        tracing::warn!("Mock provider enabled, answers come from the local template");
        (Arc::new(TemplateGenerator::new()), "template")
    } else {
        tracing::info!(model = %config.model, "Using chat model generator");
        (
            Arc::new(LlmGenerator::new(config.model.clone(), config.retry_policy())),
            "llm",
        )
    };

    let engine = Arc::new(QueryEngine::new(
        config.engine_config(),
        retriever,
        embedder,
        generator,
    ));

    let sweeper = engine.sweeper();
    let _sweep_task = sweeper.start();

    let app = create_router(HandlerState::new(Arc::clone(&engine), generator_mode));

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&engine), sweeper))
        .await?;

    let stats = engine.performance_stats();
    tracing::info!(
        total_requests = stats.total_requests,
        error_count = stats.error_count,
        cache_hit_rate = stats.cache_hit_rate,
        "Dalgurak shutdown complete"
    );
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("DALGURAK_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(_) => return 1,
    };

    rt.block_on(async {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        {
            Ok(client) => client,
            Err(_) => return 1,
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal(engine: Arc<QueryEngine>, sweeper: CacheSweeper) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }

    sweeper.stop();
    engine.gate().close();
    tracing::info!("Stopped cache sweeper and closed the query gate");
}
