//! Test doubles for the routing collaborators

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use hostedge_shared::{
    DirectoryError, Hosting, NamespaceId, ResolutionMode, Session, SessionInfo, SessionUser, UserId,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{
    AccessPolicy, BackgroundTasks, CacheError, EdgeRouter, HostingCache, HostingDirectory,
    HostingResolver, InMemoryHostingCache, MembershipChecker, RequestContext, SessionProvider,
};
use crate::config::{Config, DirectoryMode, HostnameConfig};

/// Shared secret of the internal endpoints in `config()`
pub const INTERNAL_SECRET: &str = "test-secret";

pub fn hostnames() -> HostnameConfig {
    HostnameConfig::new("agentset.ai", 3000, ".vercel.app")
}

pub fn config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".to_string(),
        hostnames: hostnames(),
        hosting_prefix: "/a/".to_string(),
        app_rewrite_prefix: "/app.agentset.ai".to_string(),
        session_cookie_prefix: "better-auth".to_string(),
        directory_mode: DirectoryMode::Database,
        database_url: None,
        database_max_connections: 1,
        redis_url: None,
        internal_api_origin: None,
        internal_api_secret: Some(INTERNAL_SECRET.to_string()),
        session_origin: None,
        upstream_timeout_ms: 200,
        hosting_cache_ttl_secs: 3600,
    }
}

/// Request context for `host` + `uri`, optionally with a raw Cookie header
pub fn context(host: &str, uri: &str, cookie: Option<&str>) -> RequestContext {
    let mut headers = HeaderMap::new();
    headers.insert(header::HOST, HeaderValue::from_str(host).unwrap());
    if let Some(cookie) = cookie {
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
    }
    RequestContext::from_uri_and_headers(&uri.parse().unwrap(), &headers, &hostnames())
}

/// Hosting whose id and slug are both `id`, owned by namespace `ns_1`
pub fn hosting(id: &str, protected: bool) -> Hosting {
    Hosting {
        id: id.into(),
        slug: id.to_string(),
        protected,
        allowed_email_domains: vec![],
        allowed_emails: vec![],
        namespace_id: "ns_1".into(),
    }
}

pub fn session(user_id: &str, email: &str) -> Session {
    Session {
        user: SessionUser {
            id: user_id.into(),
            email: email.to_string(),
            name: None,
        },
        session: SessionInfo::default(),
    }
}

/// In-memory directory with call counters
#[derive(Default)]
pub struct FakeDirectory {
    hostings: HashMap<String, Hosting>,
    members: HashSet<(String, String)>,
    fail_hosting: bool,
    fail_membership: bool,
    delay: Option<Duration>,
    hosting_calls: AtomicUsize,
    member_calls: AtomicUsize,
}

impl FakeDirectory {
    /// Directory answering `key` (in either mode) with `hosting`
    pub fn with_hosting(key: &str, hosting: Hosting) -> Self {
        let mut directory = Self::default();
        directory.hostings.insert(key.to_string(), hosting);
        directory
    }

    pub fn failing() -> Self {
        Self {
            fail_hosting: true,
            ..Self::default()
        }
    }

    pub fn with_member(mut self, user_id: &str, namespace_id: &str) -> Self {
        self.members.insert((user_id.to_string(), namespace_id.to_string()));
        self
    }

    pub fn failing_membership(mut self) -> Self {
        self.fail_membership = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn hosting_calls(&self) -> usize {
        self.hosting_calls.load(Ordering::SeqCst)
    }

    pub fn member_calls(&self) -> usize {
        self.member_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl HostingDirectory for FakeDirectory {
    async fn find_hosting(
        &self,
        key: &str,
        _mode: ResolutionMode,
    ) -> Result<Option<Hosting>, DirectoryError> {
        self.hosting_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_hosting {
            return Err(DirectoryError::Transport("connection refused".to_string()));
        }
        Ok(self.hostings.get(key).cloned())
    }

    async fn is_member(
        &self,
        user_id: &UserId,
        namespace_id: &NamespaceId,
    ) -> Result<bool, DirectoryError> {
        self.member_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if self.fail_membership {
            return Err(DirectoryError::Transport("connection reset".to_string()));
        }
        Ok(self
            .members
            .contains(&(user_id.to_string(), namespace_id.to_string())))
    }
}

/// Session provider returning a fixed session
pub struct FakeSessions {
    session: Option<Session>,
    calls: AtomicUsize,
}

impl FakeSessions {
    pub fn none() -> Self {
        Self {
            session: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(session: Session) -> Self {
        Self {
            session: Some(session),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    async fn get_session(&self, _ctx: &RequestContext) -> Option<Session> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.session.clone()
    }
}

/// Cache whose every operation fails
pub struct FailingCache;

#[async_trait]
impl HostingCache for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<Hosting>, CacheError> {
        Err(CacheError::Poisoned)
    }

    async fn set(
        &self,
        _key: &str,
        _hosting: &Hosting,
        _ttl: Duration,
        _tags: &[String],
    ) -> Result<(), CacheError> {
        Err(CacheError::Poisoned)
    }

    async fn invalidate(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Poisoned)
    }

    async fn invalidate_tag(&self, _tag: &str) -> Result<(), CacheError> {
        Err(CacheError::Poisoned)
    }
}

/// Cache whose calls never complete
pub struct HangingCache;

#[async_trait]
impl HostingCache for HangingCache {
    async fn get(&self, _key: &str) -> Result<Option<Hosting>, CacheError> {
        std::future::pending().await
    }

    async fn set(
        &self,
        _key: &str,
        _hosting: &Hosting,
        _ttl: Duration,
        _tags: &[String],
    ) -> Result<(), CacheError> {
        std::future::pending().await
    }

    async fn invalidate(&self, _key: &str) -> Result<(), CacheError> {
        std::future::pending().await
    }

    async fn invalidate_tag(&self, _tag: &str) -> Result<(), CacheError> {
        std::future::pending().await
    }
}

/// Edge router over fakes, with an in-memory cache
pub fn edge_router(
    directory: FakeDirectory,
    sessions: FakeSessions,
) -> (EdgeRouter, Arc<FakeDirectory>, BackgroundTasks) {
    let config = config();
    let directory = Arc::new(directory);
    let background = BackgroundTasks::new();

    let resolver = HostingResolver::new(
        directory.clone(),
        Arc::new(InMemoryHostingCache::new()),
        background.clone(),
        &config.hosting_prefix,
        config.hosting_cache_ttl(),
        config.upstream_timeout(),
    );
    let policy = AccessPolicy::new(
        Arc::new(sessions),
        MembershipChecker::new(directory.clone(), config.upstream_timeout()),
        &config.hosting_prefix,
        &config.session_cookie_prefix,
    );

    (EdgeRouter::new(&config, resolver, policy), directory, background)
}
