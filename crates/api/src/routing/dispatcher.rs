//! Edge dispatch
//!
//! Top-level routing decision for every request:
//! - API hosts pass through
//! - app hosts serve the dashboard, or a hosting in path mode under `/a/<slug>`
//! - any other host is a hosting custom domain

use hostedge_shared::ResolutionMode;

use super::{has_session_cookie, AccessPolicy, HostingResolver, RequestContext, RoutingDecision};
use crate::config::{Config, HostnameConfig};

/// Path prefixes the edge router never touches
const SKIPPED_PREFIXES: &[&str] = &["/api/", "/_next/", "/_static/", "/_vercel/", "/health/"];

/// Exact paths the edge router never touches
const SKIPPED_PATHS: &[&str] = &["/health", "/favicon.ico", "/robots.txt"];

/// Which surface a host belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    App,
    Api,
    Hosting,
}

#[derive(Clone)]
pub struct EdgeRouter {
    hostnames: HostnameConfig,
    resolver: HostingResolver,
    policy: AccessPolicy,
    hosting_prefix: String,
    app_rewrite_prefix: String,
    session_cookie_prefix: String,
}

impl EdgeRouter {
    pub fn new(config: &Config, resolver: HostingResolver, policy: AccessPolicy) -> Self {
        Self {
            hostnames: config.hostnames.clone(),
            resolver,
            policy,
            hosting_prefix: config.hosting_prefix.clone(),
            app_rewrite_prefix: config.app_rewrite_prefix.clone(),
            session_cookie_prefix: config.session_cookie_prefix.clone(),
        }
    }

    pub fn resolver(&self) -> &HostingResolver {
        &self.resolver
    }

    pub fn classify(&self, domain: &str) -> HostKind {
        if self.hostnames.is_app_host(domain) {
            HostKind::App
        } else if self.hostnames.is_api_host(domain) {
            HostKind::Api
        } else {
            HostKind::Hosting
        }
    }

    /// Produce the routing decision for a request
    #[tracing::instrument(name = "edge_dispatch", skip_all, fields(host = %ctx.domain, path = %ctx.path))]
    pub async fn dispatch(&self, ctx: &RequestContext) -> RoutingDecision {
        let decision = if is_skipped(&ctx.path) {
            RoutingDecision::PassThrough
        } else {
            match self.classify(&ctx.domain) {
                HostKind::Api => RoutingDecision::PassThrough,
                HostKind::App if ctx.path.starts_with(&self.hosting_prefix) => {
                    self.hosting(ctx, ResolutionMode::Path).await
                }
                HostKind::App => self.app(ctx),
                HostKind::Hosting => self.hosting(ctx, ResolutionMode::Domain).await,
            }
        };

        tracing::debug!(decision = decision.kind(), target = decision.target().unwrap_or(""), "Routing decision");
        decision
    }

    async fn hosting(&self, ctx: &RequestContext, mode: ResolutionMode) -> RoutingDecision {
        match self.resolver.resolve_request(ctx, mode).await {
            Some(resolved) => self.policy.evaluate(ctx, &resolved).await,
            // Unknown tenant: let the inner router answer with its 404
            None => RoutingDecision::PassThrough,
        }
    }

    /// Dashboard routing on the app hosts
    fn app(&self, ctx: &RequestContext) -> RoutingDecision {
        let path = ctx.path.as_str();
        let has_cookie = has_session_cookie(ctx, &self.session_cookie_prefix);

        if !has_cookie && !(path.starts_with("/login") || path.starts_with("/invitation")) {
            return RoutingDecision::redirect("/login");
        }

        if has_cookie && path.starts_with("/login") {
            return RoutingDecision::redirect("/");
        }

        RoutingDecision::rewrite(format!("{}{}", self.app_rewrite_prefix, ctx.full_path))
    }
}

fn is_skipped(path: &str) -> bool {
    SKIPPED_PATHS.contains(&path) || SKIPPED_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}
