//! Database utilities and hosting queries

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::{str::FromStr, time::Duration};

use crate::{DirectoryError, Hosting, NamespaceId, ResolutionMode, UserId};

/// Create a database connection pool
/// Note: Disables statement cache for PgBouncer compatibility
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    // PgBouncer in transaction mode doesn't support prepared statements
    let options = PgConnectOptions::from_str(database_url)?.statement_cache_capacity(0);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(0)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(300))
        .connect_with(options)
        .await
}

/// Look up a hosting by domain slug (domain mode) or by hosting slug (path mode)
pub async fn find_hosting(
    pool: &PgPool,
    key: &str,
    mode: ResolutionMode,
) -> Result<Option<Hosting>, DirectoryError> {
    let query = match mode {
        ResolutionMode::Domain => {
            r#"
            SELECT h.id, h.slug, h.protected,
                   h."allowedEmailDomains" AS allowed_email_domains,
                   h."allowedEmails" AS allowed_emails,
                   h."namespaceId" AS namespace_id
            FROM "Hosting" h
            JOIN "Domain" d ON d."hostingId" = h.id
            WHERE d.slug = $1
            LIMIT 1
            "#
        }
        ResolutionMode::Path => {
            r#"
            SELECT h.id, h.slug, h.protected,
                   h."allowedEmailDomains" AS allowed_email_domains,
                   h."allowedEmails" AS allowed_emails,
                   h."namespaceId" AS namespace_id
            FROM "Hosting" h
            WHERE h.slug = $1
            LIMIT 1
            "#
        }
    };

    let hosting = sqlx::query_as::<_, Hosting>(query)
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(hosting)
}

/// Whether the user is a member of the organization that owns the namespace
pub async fn is_namespace_member(
    pool: &PgPool,
    user_id: &UserId,
    namespace_id: &NamespaceId,
) -> Result<bool, DirectoryError> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM "Member" m
            JOIN "Namespace" n ON n."organizationId" = m."organizationId"
            WHERE m."userId" = $1
              AND n.id = $2
        )
        "#,
    )
    .bind(user_id)
    .bind(namespace_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}
