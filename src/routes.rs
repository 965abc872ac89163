use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Router};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        auth::auth_handler, bookings::bookings_handler, notifications::notifications_handler,
        reclamations::reclamations_handler, tickets::tickets_handler, users::users_handler,
    },
    ws::handler::ws_upgrade,
    AppState,
};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The socket route authenticates from its query string, so it sits
    // outside the cookie/bearer middleware stack.
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest(
            "/support",
            tickets_handler().layer(middleware::from_fn(crate::middleware::auth)),
        )
        .nest(
            "/booking",
            bookings_handler().layer(middleware::from_fn(crate::middleware::auth)),
        )
        .nest(
            "/reclamation",
            reclamations_handler().layer(middleware::from_fn(crate::middleware::auth)),
        )
        .nest(
            "/account",
            users_handler().layer(middleware::from_fn(crate::middleware::auth)),
        )
        .nest(
            "/notification",
            notifications_handler().layer(middleware::from_fn(crate::middleware::auth)),
        )
        .route("/ws", get(ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .nest("/api", api_route)
        .route("/health", get(health_check))
}

pub async fn health_check() -> &'static str {
    "ok"
}
