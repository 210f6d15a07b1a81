//! Common types used across hostedge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

// =============================================================================
// ID Wrappers
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Hosting (tenant portal) ID
    HostingId
);
string_id!(
    /// Namespace ID
    NamespaceId
);
string_id!(
    /// User ID
    UserId
);
string_id!(
    /// Organization ID
    OrgId
);

// =============================================================================
// Resolution Mode
// =============================================================================

/// How a request is mapped to a hosting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Keyed by the request host (custom domain)
    Domain,
    /// Keyed by the first path segment after the hosting prefix
    Path,
}

impl ResolutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMode::Domain => "domain",
            ResolutionMode::Path => "path",
        }
    }

    /// Prefix used for cache keys in this mode
    pub fn cache_prefix(&self) -> &'static str {
        match self {
            ResolutionMode::Domain => "domain",
            ResolutionMode::Path => "slug",
        }
    }
}

impl fmt::Display for ResolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResolutionMode {
    type Err = crate::HostedgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "domain" => Ok(ResolutionMode::Domain),
            "path" => Ok(ResolutionMode::Path),
            other => Err(crate::HostedgeError::Validation(format!(
                "unknown resolution mode: {other}"
            ))),
        }
    }
}

// =============================================================================
// Hosting
// =============================================================================

/// Tenant hosting configuration as returned by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Hosting {
    pub id: HostingId,
    pub slug: String,
    pub protected: bool,
    #[serde(default)]
    pub allowed_email_domains: Vec<String>,
    #[serde(default)]
    pub allowed_emails: Vec<String>,
    pub namespace_id: NamespaceId,
}

impl Hosting {
    /// Cache invalidation tag for this hosting
    pub fn cache_tag(&self) -> String {
        hosting_tag(&self.id)
    }

    /// Whether the email is admitted by the allow-lists (exact email or email domain)
    pub fn allows_email(&self, email: &str) -> bool {
        if self.allowed_emails.iter().any(|allowed| allowed == email) {
            return true;
        }

        let domain = email.split('@').nth(1).unwrap_or("");
        self.allowed_email_domains.iter().any(|allowed| allowed == domain)
    }
}

/// Cache tag for a hosting ID
pub fn hosting_tag(id: &HostingId) -> String {
    format!("hosting:{}", id)
}

// =============================================================================
// Session
// =============================================================================

/// Authenticated user as reported by the session endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Session record metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub active_organization_id: Option<OrgId>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Session payload returned by `/api/auth/get-session`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: SessionUser,
    #[serde(default)]
    pub session: SessionInfo,
}

// =============================================================================
// Membership
// =============================================================================

/// Response body of the membership endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub is_member: bool,
}
