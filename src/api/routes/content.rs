//! `/content` endpoints.

use crate::{
    api::{
        AppState,
        extract::{AdminSession, ApiJson, ApiPath},
        routes::message,
    },
    core::{
        auth::Permission,
        content::{self, ContentInput, ContentPatch},
    },
    entities::content::Model as Content,
    errors::{Error, Result},
};
use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/content", get(list).post(upsert))
        .route("/content/:key", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Content>>> {
    content::get_all_content(&state.db).await.map(Json)
}

async fn show(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> Result<Json<Content>> {
    content::get_content_by_key(&state.db, &key)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Content", key))
}

async fn upsert(
    State(state): State<AppState>,
    session: AdminSession,
    ApiJson(input): ApiJson<ContentInput>,
) -> Result<Json<Content>> {
    session.require(Permission::EditContent)?;
    content::upsert_content(&state.db, input).await.map(Json)
}

async fn update(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(key): ApiPath<String>,
    ApiJson(patch): ApiJson<ContentPatch>,
) -> Result<Json<Content>> {
    session.require(Permission::EditContent)?;
    content::update_content(&state.db, &key, patch)
        .await
        .map(Json)
}

async fn remove(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(key): ApiPath<String>,
) -> Result<impl IntoResponse> {
    session.require(Permission::DeleteRecords)?;
    content::delete_content(&state.db, &key).await?;
    Ok(message("Content deleted successfully"))
}
