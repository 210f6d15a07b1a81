//! Application configuration

use std::collections::HashSet;
use std::env;
use std::time::Duration;

/// Where hosting and membership lookups are served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryMode {
    /// Query Postgres directly (in-process)
    Database,
    /// Call the internal hosting endpoints over HTTP (cross-service)
    Http,
}

/// Host names the edge router recognizes, derived once at startup
#[derive(Debug, Clone)]
pub struct HostnameConfig {
    pub short_domain: String,
    pub local_port: u16,
    pub preview_host_suffix: String,
    pub app_hostnames: HashSet<String>,
    pub api_hostnames: HashSet<String>,
}

impl HostnameConfig {
    pub fn new(short_domain: &str, local_port: u16, preview_host_suffix: &str) -> Self {
        let local_host = format!("localhost:{}", local_port);

        let app_hostnames = [
            format!("app.{}", short_domain),
            format!("staging.{}", short_domain),
            local_host.clone(),
        ]
        .into_iter()
        .collect();

        let api_hostnames = [
            format!("api.{}", short_domain),
            format!("api-staging.{}", short_domain),
            format!("api.{}", local_host),
        ]
        .into_iter()
        .collect();

        Self {
            short_domain: short_domain.to_string(),
            local_port,
            preview_host_suffix: preview_host_suffix.to_string(),
            app_hostnames,
            api_hostnames,
        }
    }

    pub fn is_app_host(&self, host: &str) -> bool {
        self.app_hostnames.contains(host)
    }

    pub fn is_api_host(&self, host: &str) -> bool {
        self.api_hostnames.contains(host)
    }

    /// Ephemeral preview deployments are served as the canonical short domain
    pub fn is_preview_host(&self, host: &str) -> bool {
        !self.preview_host_suffix.is_empty() && host.ends_with(&self.preview_host_suffix)
    }

    /// Origin used when a request carries no usable host at all
    pub fn local_origin(&self) -> String {
        format!("http://localhost:{}", self.local_port)
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Routing
    pub hostnames: HostnameConfig,
    pub hosting_prefix: String,
    pub app_rewrite_prefix: String,
    pub session_cookie_prefix: String,

    // Upstreams
    pub directory_mode: DirectoryMode,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub internal_api_origin: Option<String>,
    /// Shared secret for the internal hosting endpoints (`x-internal-secret`)
    pub internal_api_secret: Option<String>,
    pub session_origin: Option<String>,
    pub upstream_timeout_ms: u64,

    // Cache
    pub hosting_cache_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let local_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        let short_domain = env::var("NEXT_PUBLIC_APP_SHORT_DOMAIN")
            .or_else(|_| env::var("APP_SHORT_DOMAIN"))
            .unwrap_or_else(|_| "agentset.ai".to_string());

        let preview_host_suffix =
            env::var("PREVIEW_HOST_SUFFIX").unwrap_or_else(|_| ".vercel.app".to_string());

        let hosting_prefix = env::var("HOSTING_PREFIX").unwrap_or_else(|_| "/a/".to_string());
        if hosting_prefix.len() < 3 || !hosting_prefix.starts_with('/') || !hosting_prefix.ends_with('/') {
            return Err(ConfigError::Invalid(
                "HOSTING_PREFIX must look like /<segment>/",
            ));
        }

        let directory_mode = match env::var("HOSTING_DIRECTORY")
            .unwrap_or_else(|_| "database".to_string())
            .as_str()
        {
            "database" => DirectoryMode::Database,
            "http" => DirectoryMode::Http,
            _ => {
                return Err(ConfigError::Invalid(
                    "HOSTING_DIRECTORY must be either `database` or `http`",
                ))
            }
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        if directory_mode == DirectoryMode::Database && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let internal_api_origin = env::var("INTERNAL_API_ORIGIN").ok().filter(|v| !v.is_empty());
        let internal_api_secret = env::var("INTERNAL_API_SECRET").ok().filter(|v| !v.is_empty());
        if directory_mode == DirectoryMode::Http {
            // this process does not serve the internal endpoints in http mode
            if internal_api_origin.is_none() {
                return Err(ConfigError::Missing("INTERNAL_API_ORIGIN"));
            }
            if internal_api_secret.is_none() {
                return Err(ConfigError::Missing("INTERNAL_API_SECRET"));
            }
        }

        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS")
                .unwrap_or_else(|_| format!("0.0.0.0:{}", local_port)),

            // Routing
            hostnames: HostnameConfig::new(&short_domain, local_port, &preview_host_suffix),
            hosting_prefix,
            app_rewrite_prefix: env::var("APP_REWRITE_PREFIX")
                .unwrap_or_else(|_| "/app.agentset.ai".to_string()),
            session_cookie_prefix: env::var("SESSION_COOKIE_PREFIX")
                .unwrap_or_else(|_| "better-auth".to_string()),

            // Upstreams
            directory_mode,
            database_url,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.is_empty()),
            internal_api_origin,
            internal_api_secret,
            session_origin: env::var("SESSION_ORIGIN").ok().filter(|v| !v.is_empty()),
            upstream_timeout_ms: env::var("UPSTREAM_TIMEOUT_MS")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),

            // Cache
            hosting_cache_ttl_secs: env::var("HOSTING_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                .parse()
                .unwrap_or(3600),
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn hosting_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.hosting_cache_ttl_secs)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}
