//! Routing decisions produced by the edge router

use hostedge_shared::{HostingId, ResolutionMode};

/// Tenant a rewritten request was resolved to.
///
/// Inserted into the request extensions so downstream handlers can read it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub hosting_id: HostingId,
    pub slug: String,
    pub mode: ResolutionMode,
}

/// The single terminal outcome for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Leave the request untouched
    PassThrough,
    /// Serve the request from another internal path (path may carry a query)
    Rewrite {
        path: String,
        tenant: Option<TenantContext>,
    },
    /// Send the client elsewhere (root-relative location)
    Redirect { location: String },
}

impl RoutingDecision {
    pub fn rewrite(path: impl Into<String>) -> Self {
        RoutingDecision::Rewrite {
            path: path.into(),
            tenant: None,
        }
    }

    pub fn redirect(location: impl Into<String>) -> Self {
        RoutingDecision::Redirect {
            location: location.into(),
        }
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            RoutingDecision::PassThrough => "pass_through",
            RoutingDecision::Rewrite { .. } => "rewrite",
            RoutingDecision::Redirect { .. } => "redirect",
        }
    }

    /// Rewrite or redirect target, if any
    pub fn target(&self) -> Option<&str> {
        match self {
            RoutingDecision::PassThrough => None,
            RoutingDecision::Rewrite { path, .. } => Some(path),
            RoutingDecision::Redirect { location } => Some(location),
        }
    }
}
