//! Hosting access policy
//!
//! Decides what happens to a request that resolved to a hosting:
//! - `/login` on a public hosting, or with a session cookie, goes back home
//! - protected hostings need a session whose email is allow-listed, or whose
//!   user is a member of the owning organization
//! - everything else is rewritten under `/<hostingId>`

use hostedge_shared::ResolutionMode;
use std::sync::Arc;

use super::{
    has_session_cookie, MembershipChecker, RequestContext, ResolvedHosting, RoutingDecision,
    SessionProvider, TenantContext,
};

const LOGIN_PATH: &str = "/login";

#[derive(Clone)]
pub struct AccessPolicy {
    sessions: Arc<dyn SessionProvider>,
    membership: MembershipChecker,
    hosting_prefix: String,
    session_cookie_prefix: String,
}

impl AccessPolicy {
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        membership: MembershipChecker,
        hosting_prefix: &str,
        session_cookie_prefix: &str,
    ) -> Self {
        Self {
            sessions,
            membership,
            hosting_prefix: hosting_prefix.to_string(),
            session_cookie_prefix: session_cookie_prefix.to_string(),
        }
    }

    /// Decide the outcome for a request to a resolved hosting
    pub async fn evaluate(&self, ctx: &RequestContext, resolved: &ResolvedHosting) -> RoutingDecision {
        let hosting = &resolved.hosting;
        let has_cookie = has_session_cookie(ctx, &self.session_cookie_prefix);

        if resolved.effective_path == LOGIN_PATH {
            if !hosting.protected || has_cookie {
                return RoutingDecision::redirect(self.tenant_home(resolved));
            }
            return self.tenant_rewrite(resolved, LOGIN_PATH);
        }

        if hosting.protected {
            let session = if has_cookie {
                self.sessions.get_session(ctx).await
            } else {
                None
            };

            let Some(session) = session else {
                tracing::debug!(hosting_id = %hosting.id, "No session for protected hosting");
                return RoutingDecision::redirect(self.login_location(resolved));
            };

            // allow-lists first, membership only as a last resort
            if !hosting.allows_email(&session.user.email)
                && !self
                    .membership
                    .is_member(&session.user.id, &hosting.namespace_id)
                    .await
            {
                tracing::info!(
                    hosting_id = %hosting.id,
                    user_id = %session.user.id,
                    "User not allowed on protected hosting"
                );
                return self.tenant_rewrite(resolved, "/not-allowed");
            }
        }

        self.tenant_rewrite(resolved, &resolved.effective_path)
    }

    /// Tenant home: `/` on its own domain, `<prefix><slug>` under the app
    pub fn tenant_home(&self, resolved: &ResolvedHosting) -> String {
        match resolved.mode {
            ResolutionMode::Domain => "/".to_string(),
            ResolutionMode::Path => format!("{}{}", self.hosting_prefix, resolved.hosting.slug),
        }
    }

    /// Login redirect, carrying the tenant root as return path in path mode
    fn login_location(&self, resolved: &ResolvedHosting) -> String {
        match resolved.mode {
            ResolutionMode::Domain => LOGIN_PATH.to_string(),
            ResolutionMode::Path => {
                let return_path = self.tenant_home(resolved);
                let encoded: String = url::form_urlencoded::byte_serialize(return_path.as_bytes()).collect();
                format!("{}?r={}", LOGIN_PATH, encoded)
            }
        }
    }

    fn tenant_rewrite(&self, resolved: &ResolvedHosting, path: &str) -> RoutingDecision {
        RoutingDecision::Rewrite {
            path: format!("/{}{}", resolved.hosting.id, path),
            tenant: Some(TenantContext {
                hosting_id: resolved.hosting.id.clone(),
                slug: resolved.hosting.slug.clone(),
                mode: resolved.mode,
            }),
        }
    }
}
