mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use hop_cache::{LayeredCache, MokaRedirectCache, NoopCache, RedisRedirectCache};
use hop_core::LinkStore;
use hop_gateway::{App, AppState};
use hop_generator::GeneratorConfig;
use hop_service::{LinkApi, LinkService, ServiceConfig};
use hop_storage::{InMemoryLinkStore, MySqlLinkStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{CacheBackendArg, LogFormatArg, StorageBackendArg, CLI};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        hit_expiry = %hop_service::HitExpiry::from(config.hit_expiry),
        "starting hop gateway"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            let links = build_links(InMemoryLinkStore::new(), &config).await?;
            serve(&config, links).await?;
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let store = MySqlLinkStore::connect(mysql_dsn, config.mysql_max_connections)
                .await
                .context("failed to connect to mysql")?;
            store
                .ensure_schema()
                .await
                .context("failed to prepare mysql schema")?;

            let links = build_links(store.clone(), &config).await?;
            let served = serve(&config, links).await;

            store.close().await;
            served?;
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

fn service_config(config: &CLI) -> ServiceConfig {
    ServiceConfig::builder()
        .cache_ttl(Duration::from_secs(config.cache_ttl_secs))
        .hit_expiry(config.hit_expiry.into())
        .generator(
            GeneratorConfig::builder()
                .code_length(config.code_length)
                .max_attempts(config.max_attempts)
                .build(),
        )
        .build()
}

fn moka_cache(config: &CLI) -> MokaRedirectCache {
    MokaRedirectCache::builder()
        .max_capacity(config.moka_capacity)
        .default_ttl(Duration::from_secs(config.cache_ttl_secs))
        .build()
        .into()
}

async fn redis_cache(config: &CLI) -> anyhow::Result<RedisRedirectCache> {
    let redis_url = config
        .redis_url
        .as_deref()
        .context("redis url is required for the redis and layered caches")?;
    let cache = RedisRedirectCache::connect(redis_url)
        .await
        .context("failed to connect to redis")?;
    Ok(cache.with_default_ttl(Duration::from_secs(config.cache_ttl_secs)))
}

async fn build_links<S: LinkStore>(store: S, config: &CLI) -> anyhow::Result<Arc<dyn LinkApi>> {
    let service_config = service_config(config);

    let links: Arc<dyn LinkApi> = match config.cache {
        CacheBackendArg::Moka => Arc::new(LinkService::new(store, moka_cache(config), service_config)),
        CacheBackendArg::Redis => Arc::new(LinkService::new(
            store,
            redis_cache(config).await?,
            service_config,
        )),
        CacheBackendArg::Layered => Arc::new(LinkService::new(
            store,
            LayeredCache::new(moka_cache(config), redis_cache(config).await?),
            service_config,
        )),
        CacheBackendArg::None => Arc::new(LinkService::new(store, NoopCache, service_config)),
    };

    Ok(links)
}

async fn serve(config: &CLI, links: Arc<dyn LinkApi>) -> anyhow::Result<()> {
    let app = App::router(AppState::new(links, config.public_base_url.clone()));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server failed")?;

    info!("gateway shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining connections");
}
