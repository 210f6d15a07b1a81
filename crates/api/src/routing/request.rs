//! Request parsing
//!
//! Reduces an incoming request to the handful of values the edge router
//! decides on: the normalized host, the path, and the path with its query.

use axum::http::{header, HeaderMap, Uri};

use crate::config::HostnameConfig;

/// Immutable view of a request, built once per request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Normalized host (lowercase, no leading `www.`, port kept)
    pub domain: String,
    /// URI path
    pub path: String,
    /// Path plus `?query` when present
    pub full_path: String,
    /// Raw `Host` header value
    pub host_header: Option<String>,
    /// Origin of the request URL when the URI is in absolute form
    pub origin: Option<String>,
    /// Scheme from `x-forwarded-proto` or the request URI
    pub protocol: Option<String>,
    /// `Cookie` header value, with split fields (HTTP/2) joined by `; `
    pub cookie_header: Option<String>,
}

impl RequestContext {
    pub fn from_uri_and_headers(uri: &Uri, headers: &HeaderMap, hostnames: &HostnameConfig) -> Self {
        let host_header = header_str(headers, header::HOST.as_str());
        let raw_host = host_header
            .clone()
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()))
            .unwrap_or_default();

        let path = uri.path().to_string();
        let full_path = match uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.clone(),
        };

        let origin = match (uri.scheme_str(), uri.authority()) {
            (Some(scheme), Some(authority)) => Some(format!("{}://{}", scheme, authority)),
            _ => None,
        };

        let protocol = header_str(headers, "x-forwarded-proto")
            .map(|p| p.split(',').next().unwrap_or(&p).trim().to_string())
            .or_else(|| uri.scheme_str().map(str::to_string));

        Self {
            domain: normalize_host(&raw_host, hostnames),
            path,
            full_path,
            host_header,
            origin,
            protocol,
            cookie_header: cookie_header(headers),
        }
    }

    /// Value of a cookie by name, if the request carries it
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookie_header.as_deref()?.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
    }
}

/// Normalize a host header value for tenant lookups
pub fn normalize_host(host: &str, hostnames: &HostnameConfig) -> String {
    let host = host.trim().to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if hostnames.is_preview_host(&host) {
        return hostnames.short_domain.clone();
    }

    host
}

fn cookie_header(headers: &HeaderMap) -> Option<String> {
    let joined = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join("; ");

    (!joined.is_empty()).then_some(joined)
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn hostnames() -> HostnameConfig {
        HostnameConfig::new("agentset.ai", 3000, ".vercel.app")
    }

    fn context(host: &str, uri: &str) -> RequestContext {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(host).unwrap());
        RequestContext::from_uri_and_headers(&uri.parse().unwrap(), &headers, &hostnames())
    }

    #[test]
    fn test_normalize_host() {
        let h = hostnames();
        assert_eq!(normalize_host("WWW.Tenant1.Example.COM", &h), "tenant1.example.com");
        assert_eq!(normalize_host("www.docs.acme.com", &h), "docs.acme.com");
        assert_eq!(normalize_host("Docs.Acme.com", &h), "docs.acme.com");
        assert_eq!(normalize_host("localhost:3000", &h), "localhost:3000");
        // only a leading www. is stripped
        assert_eq!(normalize_host("docs.www.acme.com", &h), "docs.www.acme.com");
    }

    #[test]
    fn test_preview_hosts_map_to_short_domain() {
        let h = hostnames();
        assert_eq!(normalize_host("agentset-git-feature-x.vercel.app", &h), "agentset.ai");
        assert_eq!(normalize_host("WWW.Preview-123.Vercel.App", &h), "agentset.ai");
        assert_eq!(normalize_host("vercel.app.example.com", &h), "vercel.app.example.com");
    }

    #[test]
    fn test_full_path_includes_query() {
        let ctx = context("docs.acme.com", "/guides/setup?tab=cli&x=1");
        assert_eq!(ctx.domain, "docs.acme.com");
        assert_eq!(ctx.path, "/guides/setup");
        assert_eq!(ctx.full_path, "/guides/setup?tab=cli&x=1");
        assert!(ctx.origin.is_none());

        let ctx = context("docs.acme.com", "/");
        assert_eq!(ctx.full_path, "/");
    }

    #[test]
    fn test_absolute_uri_origin() {
        let ctx = context("docs.acme.com", "https://docs.acme.com/a?b=c");
        assert_eq!(ctx.origin.as_deref(), Some("https://docs.acme.com"));
        assert_eq!(ctx.protocol.as_deref(), Some("https"));
        assert_eq!(ctx.full_path, "/a?b=c");
    }

    #[test]
    fn test_forwarded_proto_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("docs.acme.com"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http, https"));
        let ctx = RequestContext::from_uri_and_headers(&"/".parse().unwrap(), &headers, &hostnames());
        assert_eq!(ctx.protocol.as_deref(), Some("http"));
    }

    #[test]
    fn test_cookie_lookup() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("app.agentset.ai"));
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; better-auth.session_token=abc.def; other=1"),
        );
        let ctx = RequestContext::from_uri_and_headers(&"/".parse().unwrap(), &headers, &hostnames());

        assert_eq!(ctx.cookie("better-auth.session_token"), Some("abc.def"));
        assert_eq!(ctx.cookie("theme"), Some("dark"));
        assert_eq!(ctx.cookie("missing"), None);
    }

    #[test]
    fn test_split_cookie_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("app.agentset.ai"));
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("better-auth.session_token=tok"));
        let ctx = RequestContext::from_uri_and_headers(&"/".parse().unwrap(), &headers, &hostnames());

        assert_eq!(
            ctx.cookie_header.as_deref(),
            Some("theme=dark; better-auth.session_token=tok")
        );
        assert_eq!(ctx.cookie("better-auth.session_token"), Some("tok"));
        assert!(crate::routing::has_session_cookie(&ctx, "better-auth"));
    }
}
