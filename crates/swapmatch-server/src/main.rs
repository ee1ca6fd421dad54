//! Swapmatch HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;

use swapmatch::catalog::{CatalogStore, MySqlCatalog};
use swapmatch::config::Config;
use swapmatch::pipeline::{PipelineOptions, SubstitutionPipeline};
use swapmatch::quota::QuotaGuard;
use swapmatch::ranking::{GeminiBackend, RankingBackend};
use swapmatch::retrieval::{EmbeddingClient, IndexAdmin, QdrantProductIndex, VectorSearch};
use swapmatch_server::gateway::{GatewayState, create_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        model = %config.ranking_model,
        "swapmatch starting"
    );

    let catalog: Arc<dyn CatalogStore> =
        Arc::new(MySqlCatalog::connect(&config.database_url, config.db_max_conns).await?);

    let embedder = EmbeddingClient::new(
        config.embedding_url.clone(),
        config.embedding_model.clone(),
        config.embedding_api_key.clone(),
        config.embedding_dim,
    );

    let index = Arc::new(QdrantProductIndex::new(
        &config.qdrant_url,
        config.collection.clone(),
        embedder,
        catalog.clone(),
    )?);
    let search: Arc<dyn VectorSearch> = index.clone();
    let admin: Arc<dyn IndexAdmin> = index;

    let backend: Arc<dyn RankingBackend> = Arc::new(GeminiBackend::new(config.ranking_model.clone()));

    let pipeline = Arc::new(SubstitutionPipeline::new(
        catalog.clone(),
        search,
        backend,
        PipelineOptions {
            candidate_pool: config.candidate_pool,
            max_substitutes: config.max_substitutes,
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
        },
    ));

    let quota = Arc::new(QuotaGuard::new(config.daily_quota));

    let state = GatewayState {
        pipeline,
        quota,
        catalog,
        index: admin,
    };

    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("swapmatch shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
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
}
