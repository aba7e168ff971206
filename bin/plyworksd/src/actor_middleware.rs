//! Actor resolution middleware.
//!
//! Resolves the caller identity from request headers via the configured
//! [`ActorResolver`] and provides an `Actor` to downstream handlers.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use plyworks_core::{ActorResolver, ServiceError};

/// Middleware that resolves the caller into an [`plyworks_core::Actor`].
///
/// If the request path is in the public list, the middleware passes through.
/// Otherwise, it requires a resolvable identity and stores the Actor in
/// request extensions.
pub async fn actor_middleware(
    State(resolver): State<Arc<dyn ActorResolver>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let path = request.uri().path().to_string();

    // Public endpoints that don't require an identity.
    if is_public_path(&path) {
        return Ok(next.run(request).await);
    }

    let actor = resolver.resolve(request.headers())?;

    // Store the actor in request extensions for handlers to access.
    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

/// Check if a request path is public (no identity required).
fn is_public_path(path: &str) -> bool {
    matches!(path, "/health" | "/version")
}
