//! Edge routing middleware
//!
//! Applies the dispatcher's decision to the live request. Must wrap the inner
//! router as a whole (not a route layer) so a rewritten URI is routed again.

use axum::{
    body::Body,
    extract::{OriginalUri, State},
    http::{Request, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::{RequestContext, RoutingDecision};
use crate::state::AppState;

pub async fn edge_routing_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_uri_and_headers(
        request.uri(),
        request.headers(),
        &state.config.hostnames,
    );

    match state.edge.dispatch(&ctx).await {
        RoutingDecision::PassThrough => next.run(request).await,
        RoutingDecision::Redirect { location } => Redirect::temporary(&location).into_response(),
        RoutingDecision::Rewrite { path, tenant } => {
            let uri: Uri = match path.parse() {
                Ok(uri) => uri,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Invalid rewrite target, passing through");
                    return next.run(request).await;
                }
            };

            let original = std::mem::replace(request.uri_mut(), uri);
            let extensions = request.extensions_mut();
            if extensions.get::<OriginalUri>().is_none() {
                extensions.insert(OriginalUri(original));
            }
            if let Some(tenant) = tenant {
                extensions.insert(tenant);
            }

            next.run(request).await
        }
    }
}
