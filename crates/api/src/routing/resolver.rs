//! Request-to-Hosting Resolution
//!
//! Resolves a request to the hosting it targets. Supports:
//! - Domain mode: docs.company.com -> hosting whose domain slug is the host
//! - Path mode: app.agentset.ai/a/<slug>/... -> hosting by slug
//!
//! Lookups go through the hosting cache first; misses hit the directory and
//! populate the cache in a tracked background task.

use hostedge_shared::{Hosting, HostingId, ResolutionMode};
use std::sync::Arc;
use std::time::Duration;

use super::{BackgroundTasks, HostingCache, HostingDirectory, RequestContext};

/// Lookup key derived from a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    pub key: String,
    pub mode: ResolutionMode,
    /// Path (with query) the tenant is asked for, relative to the tenant root
    pub effective_path: String,
}

/// A request that resolved to a hosting
#[derive(Debug, Clone)]
pub struct ResolvedHosting {
    pub hosting: Hosting,
    pub mode: ResolutionMode,
    pub effective_path: String,
}

/// Hosting resolver with caching
#[derive(Clone)]
pub struct HostingResolver {
    directory: Arc<dyn HostingDirectory>,
    cache: Arc<dyn HostingCache>,
    background: BackgroundTasks,
    hosting_prefix: String,
    ttl: Duration,
    timeout: Duration,
}

impl HostingResolver {
    pub fn new(
        directory: Arc<dyn HostingDirectory>,
        cache: Arc<dyn HostingCache>,
        background: BackgroundTasks,
        hosting_prefix: &str,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            directory,
            cache,
            background,
            hosting_prefix: hosting_prefix.to_string(),
            ttl,
            timeout,
        }
    }

    /// Derive the lookup key and effective path for a request
    ///
    /// Returns `None` in path mode when the request has no slug segment.
    pub fn lookup_key(&self, ctx: &RequestContext, mode: ResolutionMode) -> Option<LookupKey> {
        match mode {
            ResolutionMode::Domain => Some(LookupKey {
                key: ctx.domain.clone(),
                mode,
                effective_path: ctx.full_path.clone(),
            }),
            ResolutionMode::Path => {
                let rest = ctx.path.strip_prefix(&self.hosting_prefix)?;
                let slug = rest.split('/').next().unwrap_or("");
                if slug.is_empty() {
                    return None;
                }

                // full_path looks like /a/<slug>/rest?query
                let tenant_root = format!("{}{}", self.hosting_prefix, slug);
                let remainder = ctx
                    .full_path
                    .strip_prefix(&tenant_root)
                    .unwrap_or(&ctx.full_path);

                let effective_path = if remainder.is_empty() {
                    "/".to_string()
                } else if remainder.starts_with('?') {
                    format!("/{}", remainder)
                } else {
                    remainder.to_string()
                };

                Some(LookupKey {
                    key: slug.to_string(),
                    mode,
                    effective_path,
                })
            }
        }
    }

    /// Resolve a request in the given mode
    pub async fn resolve_request(
        &self,
        ctx: &RequestContext,
        mode: ResolutionMode,
    ) -> Option<ResolvedHosting> {
        let lookup = self.lookup_key(ctx, mode)?;
        let hosting = self.resolve(&lookup.key, lookup.mode).await?;

        Some(ResolvedHosting {
            hosting,
            mode: lookup.mode,
            effective_path: lookup.effective_path,
        })
    }

    /// Resolve a key to a hosting
    ///
    /// Returns `None` when nothing matches or the lookup failed; failures are logged.
    pub async fn resolve(&self, key: &str, mode: ResolutionMode) -> Option<Hosting> {
        let cache_key = cache_key(key, mode);

        // Check cache first; a slow or failing cache is a miss
        match tokio::time::timeout(self.timeout, self.cache.get(&cache_key)).await {
            Ok(Ok(Some(hosting))) => {
                tracing::debug!(cache_key = %cache_key, hosting_id = %hosting.id, "Hosting cache hit");
                return Some(hosting);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                tracing::debug!(cache_key = %cache_key, error = %e, "Hosting cache read failed, treating as miss");
            }
            Err(_) => {
                tracing::warn!(cache_key = %cache_key, "Hosting cache read timed out, treating as miss");
            }
        }

        let hosting = match tokio::time::timeout(self.timeout, self.directory.find_hosting(key, mode)).await {
            Ok(Ok(Some(hosting))) => hosting,
            Ok(Ok(None)) => {
                tracing::debug!(key = %key, mode = %mode, "No hosting found");
                return None;
            }
            Ok(Err(e)) => {
                tracing::error!(key = %key, mode = %mode, error = %e, "Failed to fetch hosting config");
                return None;
            }
            Err(_) => {
                tracing::warn!(key = %key, mode = %mode, timeout_ms = self.timeout.as_millis() as u64, "Hosting lookup timed out");
                return None;
            }
        };

        self.populate(cache_key, hosting.clone());
        Some(hosting)
    }

    /// Cache the hosting without holding up the response
    fn populate(&self, cache_key: String, hosting: Hosting) {
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;
        let timeout = self.timeout;

        self.background.spawn("hosting_cache_set", async move {
            let tags = [hosting.cache_tag()];
            match tokio::time::timeout(timeout, cache.set(&cache_key, &hosting, ttl, &tags)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::warn!(cache_key = %cache_key, error = %e, "Failed to cache hosting");
                }
                Err(_) => {
                    tracing::warn!(cache_key = %cache_key, "Hosting cache write timed out");
                }
            }
        });
    }

    /// Invalidate every cached key for a hosting (useful when its settings change)
    pub async fn invalidate_hosting(&self, id: &HostingId) {
        let tag = hostedge_shared::hosting_tag(id);
        match tokio::time::timeout(self.timeout, self.cache.invalidate_tag(&tag)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(hosting_id = %id, error = %e, "Failed to invalidate hosting cache");
            }
            Err(_) => tracing::warn!(hosting_id = %id, "Hosting cache invalidation timed out"),
        }
    }

    /// Invalidate the cache for a single key
    pub async fn invalidate_key(&self, key: &str, mode: ResolutionMode) {
        let cache_key = cache_key(key, mode);
        match tokio::time::timeout(self.timeout, self.cache.invalidate(&cache_key)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(cache_key = %cache_key, error = %e, "Failed to invalidate hosting cache");
            }
            Err(_) => tracing::warn!(cache_key = %cache_key, "Hosting cache invalidation timed out"),
        }
    }
}

/// Mode-qualified cache key: `domain:<host>` or `slug:<slug>`
pub fn cache_key(key: &str, mode: ResolutionMode) -> String {
    format!("{}:{}", mode.cache_prefix(), key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::testing::{context, hosting, FailingCache, FakeDirectory, HangingCache};
    use crate::routing::InMemoryHostingCache;

    fn resolver(directory: Arc<FakeDirectory>, cache: Arc<dyn HostingCache>) -> (HostingResolver, BackgroundTasks) {
        let background = BackgroundTasks::new();
        let resolver = HostingResolver::new(
            directory,
            cache,
            background.clone(),
            "/a/",
            Duration::from_secs(3600),
            Duration::from_millis(200),
        );
        (resolver, background)
    }

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("docs.acme.com", ResolutionMode::Domain), "domain:docs.acme.com");
        assert_eq!(cache_key("docs", ResolutionMode::Path), "slug:docs");
    }

    #[test]
    fn test_lookup_key_domain_mode() {
        let (r, _) = resolver(Arc::new(FakeDirectory::default()), Arc::new(InMemoryHostingCache::new()));
        let key = r
            .lookup_key(&context("docs.acme.com", "/guides?x=1", None), ResolutionMode::Domain)
            .unwrap();
        assert_eq!(key.key, "docs.acme.com");
        assert_eq!(key.effective_path, "/guides?x=1");
    }

    #[test]
    fn test_lookup_key_path_mode() {
        let (r, _) = resolver(Arc::new(FakeDirectory::default()), Arc::new(InMemoryHostingCache::new()));
        let ctx = |uri: &str| context("app.agentset.ai", uri, None);

        let key = r.lookup_key(&ctx("/a/tenant2/reports/q1?x=1"), ResolutionMode::Path).unwrap();
        assert_eq!(key.key, "tenant2");
        assert_eq!(key.effective_path, "/reports/q1?x=1");

        let key = r.lookup_key(&ctx("/a/tenant2"), ResolutionMode::Path).unwrap();
        assert_eq!(key.effective_path, "/");

        let key = r.lookup_key(&ctx("/a/tenant2?tab=1"), ResolutionMode::Path).unwrap();
        assert_eq!(key.effective_path, "/?tab=1");

        let key = r.lookup_key(&ctx("/a/tenant3/login"), ResolutionMode::Path).unwrap();
        assert_eq!(key.effective_path, "/login");

        assert!(r.lookup_key(&ctx("/a/"), ResolutionMode::Path).is_none());
        assert!(r.lookup_key(&ctx("/dashboard"), ResolutionMode::Path).is_none());
    }

    #[tokio::test]
    async fn test_second_resolve_served_from_cache() {
        let directory = Arc::new(FakeDirectory::with_hosting("docs.acme.com", hosting("h1", false)));
        let (r, background) = resolver(Arc::clone(&directory), Arc::new(InMemoryHostingCache::new()));

        let first = r.resolve("docs.acme.com", ResolutionMode::Domain).await.unwrap();
        background.drain().await;
        let second = r.resolve("docs.acme.com", ResolutionMode::Domain).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(directory.hosting_calls(), 1);
    }

    #[tokio::test]
    async fn test_modes_do_not_share_cache_entries() {
        let directory = Arc::new(FakeDirectory::with_hosting("docs", hosting("h1", false)));
        let (r, background) = resolver(Arc::clone(&directory), Arc::new(InMemoryHostingCache::new()));

        assert!(r.resolve("docs", ResolutionMode::Path).await.is_some());
        background.drain().await;
        assert!(r.resolve("docs", ResolutionMode::Domain).await.is_some());
        assert_eq!(directory.hosting_calls(), 2);
    }

    #[tokio::test]
    async fn test_not_found_is_not_cached() {
        let directory = Arc::new(FakeDirectory::default());
        let (r, background) = resolver(Arc::clone(&directory), Arc::new(InMemoryHostingCache::new()));

        assert!(r.resolve("nope.com", ResolutionMode::Domain).await.is_none());
        background.drain().await;
        assert!(r.resolve("nope.com", ResolutionMode::Domain).await.is_none());
        assert_eq!(directory.hosting_calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_errors_fall_back_to_directory() {
        let directory = Arc::new(FakeDirectory::with_hosting("docs", hosting("h1", false)));
        let (r, background) = resolver(Arc::clone(&directory), Arc::new(FailingCache));

        assert!(r.resolve("docs", ResolutionMode::Path).await.is_some());
        background.drain().await;
        assert!(r.resolve("docs", ResolutionMode::Path).await.is_some());
        assert_eq!(directory.hosting_calls(), 2);
    }

    #[tokio::test]
    async fn test_unresponsive_cache_is_a_miss() {
        let directory = Arc::new(FakeDirectory::with_hosting("docs", hosting("h1", false)));
        let (r, background) = resolver(Arc::clone(&directory), Arc::new(HangingCache));

        let resolved = tokio::time::timeout(Duration::from_secs(2), r.resolve("docs", ResolutionMode::Path))
            .await
            .expect("resolve must not wait on the cache");
        assert_eq!(resolved.map(|h| h.id.to_string()), Some("h1".to_string()));
        assert_eq!(directory.hosting_calls(), 1);

        // the background write gives up too, so shutdown is not blocked
        tokio::time::timeout(Duration::from_secs(2), background.shutdown())
            .await
            .expect("cache write must be bounded");

        tokio::time::timeout(Duration::from_secs(2), r.invalidate_hosting(&"h1".into()))
            .await
            .expect("invalidation must be bounded");
    }

    #[tokio::test]
    async fn test_directory_failure_resolves_to_none() {
        let directory = Arc::new(FakeDirectory::failing());
        let (r, _) = resolver(directory, Arc::new(InMemoryHostingCache::new()));
        assert!(r.resolve("docs", ResolutionMode::Path).await.is_none());
    }

    #[tokio::test]
    async fn test_slow_directory_times_out() {
        let directory = Arc::new(
            FakeDirectory::with_hosting("docs", hosting("h1", false)).with_delay(Duration::from_secs(5)),
        );
        let (r, _) = resolver(directory, Arc::new(InMemoryHostingCache::new()));
        assert!(r.resolve("docs", ResolutionMode::Path).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_hosting_forces_lookup() {
        let directory = Arc::new(FakeDirectory::with_hosting("docs", hosting("h1", false)));
        let (r, background) = resolver(Arc::clone(&directory), Arc::new(InMemoryHostingCache::new()));

        r.resolve("docs", ResolutionMode::Path).await;
        background.drain().await;
        r.invalidate_hosting(&"h1".into()).await;
        r.resolve("docs", ResolutionMode::Path).await;
        background.drain().await;
        r.invalidate_key("docs", ResolutionMode::Path).await;
        r.resolve("docs", ResolutionMode::Path).await;

        assert_eq!(directory.hosting_calls(), 3);
    }
}
