//! Shared application state

use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DirectoryMode};
use crate::routing::{
    AccessPolicy, BackgroundTasks, EdgeRouter, HostingCache, HostingDirectory, HostingResolver,
    HttpHostingDirectory, HttpSessionProvider, InMemoryHostingCache, MembershipChecker,
    PgHostingDirectory, RedisHostingCache,
};

/// How often expired in-memory cache entries are swept
const CACHE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub edge: Arc<EdgeRouter>,
    pub directory: Arc<dyn HostingDirectory>,
    /// Present when hostings are served from the database
    pub pool: Option<PgPool>,
    pub background: BackgroundTasks,
}

impl AppState {
    /// Wire every collaborator from configuration
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let timeout = config.upstream_timeout();
        let background = BackgroundTasks::new();

        let (directory, pool): (Arc<dyn HostingDirectory>, Option<PgPool>) = match config.directory_mode {
            DirectoryMode::Database => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the database directory")?;
                let pool = hostedge_shared::create_pool(url, config.database_max_connections)
                    .await
                    .context("Failed to connect to database")?;
                tracing::info!("Hosting directory: database");
                let directory: Arc<dyn HostingDirectory> = Arc::new(PgHostingDirectory::new(pool.clone()));
                (directory, Some(pool))
            }
            DirectoryMode::Http => {
                let base_url = config
                    .internal_api_origin
                    .as_deref()
                    .context("INTERNAL_API_ORIGIN is required for the http directory")?;
                let secret = config
                    .internal_api_secret
                    .as_deref()
                    .context("INTERNAL_API_SECRET is required for the http directory")?;
                tracing::info!(base_url = %base_url, "Hosting directory: internal http");
                let directory: Arc<dyn HostingDirectory> =
                    Arc::new(HttpHostingDirectory::new(base_url, secret, timeout)?);
                (directory, None)
            }
        };

        let cache = Self::build_cache(&config).await;

        let resolver = HostingResolver::new(
            Arc::clone(&directory),
            cache,
            background.clone(),
            &config.hosting_prefix,
            config.hosting_cache_ttl(),
            timeout,
        );

        let sessions = HttpSessionProvider::new(
            Arc::new(config.hostnames.clone()),
            config.session_origin.clone(),
            timeout,
        )
        .context("Failed to build session client")?;

        let policy = AccessPolicy::new(
            Arc::new(sessions),
            MembershipChecker::new(Arc::clone(&directory), timeout),
            &config.hosting_prefix,
            &config.session_cookie_prefix,
        );

        let edge = EdgeRouter::new(&config, resolver, policy);

        Ok(Self {
            config: Arc::new(config),
            edge: Arc::new(edge),
            directory,
            pool,
            background,
        })
    }

    /// Redis when configured and reachable, otherwise an in-process cache
    async fn build_cache(config: &Config) -> Arc<dyn HostingCache> {
        if let Some(url) = &config.redis_url {
            match RedisHostingCache::connect(url).await {
                Ok(cache) => {
                    tracing::info!("Hosting cache: redis");
                    return Arc::new(cache);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable, using in-memory hosting cache");
                }
            }
        }

        let cache = Arc::new(InMemoryHostingCache::new());
        let sweeper = Arc::clone(&cache);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(CACHE_CLEANUP_INTERVAL);
            loop {
                interval.tick().await;
                sweeper.cleanup();
                let stats = sweeper.stats();
                tracing::debug!(active = stats.active_entries, "Hosting cache swept");
            }
        });

        tracing::info!("Hosting cache: in-memory");
        cache
    }
}
