//! Route table. Everything here is mounted under `/api`.

mod auth;
mod cart;
mod contacts;
mod content;
mod menu;
mod orders;

use crate::{api::AppState, errors::Error};
use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

/// All API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(orders::routes())
        .merge(cart::routes())
        .merge(contacts::routes())
        .merge(menu::routes())
        .merge(content::routes())
        .merge(auth::routes())
}

/// `{"message": text}` acknowledgement body.
pub(crate) fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, Error> {
    state.db.ping().await?;
    Ok(Json(json!({ "status": "ok", "database": "connected" })))
}
