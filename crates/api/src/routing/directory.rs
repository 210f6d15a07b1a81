//! Hosting directory
//!
//! Data access for hosting and membership lookups. The edge router talks to a
//! single directory chosen at startup: Postgres when it runs next to the
//! database, or the internal hosting endpoints when it does not.

use async_trait::async_trait;
use hostedge_shared::{
    db, DirectoryError, Hosting, MembershipResponse, NamespaceId, ResolutionMode, UserId,
};
use reqwest::Client;
use sqlx::PgPool;
use std::time::Duration;

/// Header carrying the shared secret of the internal hosting endpoints
pub const INTERNAL_SECRET_HEADER: &str = "x-internal-secret";

#[async_trait]
pub trait HostingDirectory: Send + Sync {
    /// Hosting for a domain slug (domain mode) or hosting slug (path mode)
    async fn find_hosting(
        &self,
        key: &str,
        mode: ResolutionMode,
    ) -> Result<Option<Hosting>, DirectoryError>;

    /// Whether the user belongs to the organization owning the namespace
    async fn is_member(
        &self,
        user_id: &UserId,
        namespace_id: &NamespaceId,
    ) -> Result<bool, DirectoryError>;
}

/// Directory backed by direct database queries
#[derive(Clone)]
pub struct PgHostingDirectory {
    pool: PgPool,
}

impl PgHostingDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HostingDirectory for PgHostingDirectory {
    async fn find_hosting(
        &self,
        key: &str,
        mode: ResolutionMode,
    ) -> Result<Option<Hosting>, DirectoryError> {
        db::find_hosting(&self.pool, key, mode).await
    }

    async fn is_member(
        &self,
        user_id: &UserId,
        namespace_id: &NamespaceId,
    ) -> Result<bool, DirectoryError> {
        db::is_namespace_member(&self.pool, user_id, namespace_id).await
    }
}

/// Directory backed by the internal hosting endpoints of another instance
#[derive(Clone)]
pub struct HttpHostingDirectory {
    client: Client,
    base_url: String,
    secret: String,
}

impl HttpHostingDirectory {
    pub fn new(base_url: &str, secret: &str, timeout: Duration) -> Result<Self, DirectoryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DirectoryError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .header(INTERNAL_SECRET_HEADER, &self.secret)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DirectoryError::Timeout
                } else {
                    DirectoryError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HostingDirectory for HttpHostingDirectory {
    async fn find_hosting(
        &self,
        key: &str,
        mode: ResolutionMode,
    ) -> Result<Option<Hosting>, DirectoryError> {
        self.get_json(
            "/api/internal/hosting/resolve",
            &[("key", key), ("mode", mode.as_str())],
        )
        .await
    }

    async fn is_member(
        &self,
        user_id: &UserId,
        namespace_id: &NamespaceId,
    ) -> Result<bool, DirectoryError> {
        let body: MembershipResponse = self
            .get_json(
                "/api/internal/hosting/member",
                &[("userId", user_id.as_str()), ("namespaceId", namespace_id.as_str())],
            )
            .await?;

        Ok(body.is_member)
    }
}
