//! Internal hosting endpoints
//!
//! Served to other instances running with the http directory. Every call must
//! carry the shared secret in `x-internal-secret`.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use hostedge_shared::{Hosting, HostingId, MembershipResponse, ResolutionMode};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::{
    error::{ApiError, ApiResult},
    routing::INTERNAL_SECRET_HEADER,
    state::AppState,
};

/// Reject internal calls without the configured shared secret
pub async fn require_internal_secret(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.config.internal_api_secret.as_deref() else {
        return Err(ApiError::Unauthorized);
    };

    let provided = request
        .headers()
        .get(INTERNAL_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !secrets_match(provided, expected) {
        tracing::warn!(path = %request.uri().path(), "Rejected internal hosting call");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Constant-time comparison, also for differing lengths
fn secrets_match(provided: &str, expected: &str) -> bool {
    if provided.len() != expected.len() {
        let _ = expected.as_bytes().ct_eq(expected.as_bytes());
        return false;
    }

    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    pub key: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberQuery {
    pub user_id: Option<String>,
    pub namespace_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidateRequest {
    pub hosting_id: HostingId,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// GET /api/internal/hosting/resolve?key=&mode=domain|path
pub async fn resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> ApiResult<Json<Option<Hosting>>> {
    let (Some(key), Some(mode)) = (required(query.key), required(query.mode)) else {
        return Err(ApiError::BadRequest("Missing key or mode".to_string()));
    };

    let mode: ResolutionMode = mode
        .parse()
        .map_err(|e: hostedge_shared::HostedgeError| ApiError::BadRequest(e.to_string()))?;

    let hosting = state.directory.find_hosting(&key, mode).await?;
    Ok(Json(hosting))
}

/// GET /api/internal/hosting/member?userId=&namespaceId=
pub async fn member(
    State(state): State<AppState>,
    Query(query): Query<MemberQuery>,
) -> ApiResult<Json<MembershipResponse>> {
    let (Some(user_id), Some(namespace_id)) = (required(query.user_id), required(query.namespace_id))
    else {
        return Err(ApiError::BadRequest(
            "Missing userId or namespaceId".to_string(),
        ));
    };

    let is_member = state
        .directory
        .is_member(&user_id.into(), &namespace_id.into())
        .await?;

    Ok(Json(MembershipResponse { is_member }))
}

/// POST /api/internal/hosting/invalidate
///
/// Drops every cached lookup for a hosting after its settings changed.
pub async fn invalidate(
    State(state): State<AppState>,
    Json(request): Json<InvalidateRequest>,
) -> StatusCode {
    state
        .edge
        .resolver()
        .invalidate_hosting(&request.hosting_id)
        .await;

    tracing::info!(hosting_id = %request.hosting_id, "Hosting cache invalidated");
    StatusCode::NO_CONTENT
}
