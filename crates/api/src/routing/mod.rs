//! Tenant-aware edge routing
//!
//! This module decides, per request, which tenant hosting (if any) a request
//! belongs to and whether the caller may see it:
//! - Custom domains: docs.company.com -> hosting by domain
//! - Path hostings: app.agentset.ai/a/<slug> -> hosting by slug
//! - App hosts: dashboard login gating

mod background;
mod cache;
mod decision;
mod directory;
mod dispatcher;
mod membership;
pub mod middleware;
mod origin;
mod policy;
mod redis_cache;
mod request;
mod resolver;
mod session;
#[cfg(test)]
pub(crate) mod testing;

pub use background::BackgroundTasks;
pub use cache::{CacheError, CacheStats, HostingCache, InMemoryHostingCache};
pub use decision::{RoutingDecision, TenantContext};
pub use directory::{
    HostingDirectory, HttpHostingDirectory, PgHostingDirectory, INTERNAL_SECRET_HEADER,
};
pub use dispatcher::{EdgeRouter, HostKind};
pub use membership::MembershipChecker;
pub use middleware::edge_routing_middleware;
pub use origin::safe_origin;
pub use policy::AccessPolicy;
pub use redis_cache::RedisHostingCache;
pub use request::{normalize_host, RequestContext};
pub use resolver::{cache_key, HostingResolver, LookupKey, ResolvedHosting};
pub use session::{
    has_session_cookie, session_cookie_names, HttpSessionProvider, SessionProvider,
    GET_SESSION_PATH,
};
