//! Safe origin for same-process follow-up calls

use super::RequestContext;
use crate::config::HostnameConfig;

/// Absolute origin for internal calls made on behalf of a request.
///
/// Prefers the request's own origin, then `<protocol>://<host header>`,
/// then the local development origin. Never fails.
pub fn safe_origin(ctx: &RequestContext, hostnames: &HostnameConfig) -> String {
    match ctx.origin.as_deref() {
        Some(origin) if !origin.is_empty() && origin != "null" && origin != "undefined" => {
            origin.to_string()
        }
        _ => {
            // plain HTTP is what this server listens on when no proxy says otherwise
            let protocol = ctx.protocol.as_deref().unwrap_or("http");
            match ctx.host_header.as_deref() {
                Some(host) => format!("{}://{}", protocol, host),
                None => hostnames.local_origin(),
            }
        }
    }
}
