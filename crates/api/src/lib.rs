//! hostedge API Library
//!
//! Edge routing for tenant hostings: resolves each request to a hosting by
//! custom domain or `/a/<slug>` path, enforces the hosting's access rules, and
//! rewrites or redirects the request. Also serves the internal hosting
//! endpoints used by instances that do not talk to the database directly.

pub mod config;
pub mod error;
pub mod routes;
pub mod routing;
pub mod state;

pub use config::{Config, DirectoryMode, HostnameConfig};
pub use error::{ApiError, ApiResult};
pub use routing::{EdgeRouter, HostingResolver, RequestContext, RoutingDecision, TenantContext};
pub use state::AppState;
