//! Session access for the edge router
//!
//! Two levels: a cookie presence check that never leaves the process, and a
//! full session fetch against the auth subsystem's introspection endpoint.
//! Every failure of the latter degrades to "no session".

use async_trait::async_trait;
use axum::http::header;
use hostedge_shared::Session;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use super::{safe_origin, RequestContext};
use crate::config::HostnameConfig;

/// Path of the session introspection endpoint
pub const GET_SESSION_PATH: &str = "/api/auth/get-session";

/// Session cookie names for a cookie prefix (plain and `__Secure-` variants)
pub fn session_cookie_names(prefix: &str) -> [String; 2] {
    [
        format!("{}.session_token", prefix),
        format!("__Secure-{}.session_token", prefix),
    ]
}

/// Whether the request carries a session cookie. The cookie is not verified.
pub fn has_session_cookie(ctx: &RequestContext, prefix: &str) -> bool {
    session_cookie_names(prefix)
        .iter()
        .any(|name| ctx.cookie(name).is_some_and(|value| !value.is_empty()))
}

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Session of the requesting user, or `None` when absent or unavailable
    async fn get_session(&self, ctx: &RequestContext) -> Option<Session>;
}

/// Fetches sessions from `/api/auth/get-session`, forwarding the request cookies
#[derive(Clone)]
pub struct HttpSessionProvider {
    client: Client,
    hostnames: Arc<HostnameConfig>,
    /// Fixed origin of the auth service; request origin when unset
    origin: Option<String>,
    timeout: Duration,
}

impl HttpSessionProvider {
    pub fn new(
        hostnames: Arc<HostnameConfig>,
        origin: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            hostnames,
            origin: origin.map(|o| o.trim_end_matches('/').to_string()),
            timeout,
        })
    }

    fn session_url(&self, ctx: &RequestContext) -> String {
        let origin = match &self.origin {
            Some(origin) => origin.clone(),
            None => safe_origin(ctx, &self.hostnames),
        };
        format!("{}{}", origin, GET_SESSION_PATH)
    }

    async fn fetch(&self, url: &str, ctx: &RequestContext) -> Result<Option<Session>, reqwest::Error> {
        let response = self
            .client
            .get(url)
            .header(header::COOKIE, ctx.cookie_header.as_deref().unwrap_or(""))
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = %status, "Session endpoint returned non-success");
            return Ok(None);
        }

        response.json::<Option<Session>>().await
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn get_session(&self, ctx: &RequestContext) -> Option<Session> {
        let url = self.session_url(ctx);

        match tokio::time::timeout(self.timeout, self.fetch(&url, ctx)).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                tracing::warn!(url = %url, error = %e, "Failed to fetch session");
                None
            }
            Err(_) => {
                tracing::warn!(url = %url, "Session fetch timed out");
                None
            }
        }
    }
}
