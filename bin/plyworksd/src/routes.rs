//! Route registration — collects all module routes + system endpoints.

use std::sync::Arc;

use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use plyworks_core::ActorResolver;

use crate::actor_middleware;

/// Build the complete router with all routes.
pub fn build_router(
    resolver: Arc<dyn ActorResolver>,
    module_routes: Vec<(&str, Router)>,
) -> Router {
    // System endpoints (public, no state needed).
    let mut app: Router<()> = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    // Mount each module's routes under /{module_name}.
    // Module routes are already Router<()> (they called .with_state() internally).
    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }

    // Apply actor resolution middleware to all routes.
    app.layer(middleware::from_fn_with_state(
        resolver,
        actor_middleware::actor_middleware,
    ))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "plyworksd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::extract::Extension;
    use axum::http::{Request, StatusCode};
    use plyworks_core::{Actor, HeaderResolver, Role, StaticResolver};
    use tower::ServiceExt;

    fn echo_router() -> Router {
        Router::new().route(
            "/whoami",
            get(|Extension(actor): Extension<Actor>| async move {
                axum::Json(serde_json::json!({ "id": actor.id }))
            }),
        )
    }

    #[tokio::test]
    async fn health_is_public_modules_are_not() {
        let app = build_router(
            Arc::new(HeaderResolver::default()),
            vec![("echo", echo_router())],
        );

        let resp = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .clone()
            .oneshot(Request::get("/echo/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = app
            .oneshot(
                Request::get("/echo/whoami")
                    .header("x-actor-id", "u1")
                    .header("x-actor-role", "OPERATOR")
                    .header("x-actor-scope", "plant1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn static_resolver_pins_the_actor() {
        let app = build_router(
            Arc::new(StaticResolver(Actor::new("dev1", Role::Owner, "plant1"))),
            vec![("echo", echo_router())],
        );

        let resp = app
            .oneshot(Request::get("/echo/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["id"], "dev1");
    }
}
