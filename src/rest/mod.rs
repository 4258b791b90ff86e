// rest/mod.rs — HTTP JSON API server.
//
// Endpoints:
//   GET    /health
//   GET    /tasks
//   POST   /tasks
//   PATCH  /tasks/{id}
//   DELETE /tasks/{id}
//   POST   /tasks/reorder

pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let addr = format!("{}:{}", ctx.config.bind_address, ctx.config.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP API listening on http://{addr}");
    axum::serve(listener, build_router(ctx)).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/reorder", post(routes::tasks::reorder))
        .route(
            "/tasks/{id}",
            patch(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        // Single-tenant, auth-free board: any origin may call it.
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
