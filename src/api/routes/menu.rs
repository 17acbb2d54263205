//! `/services` endpoints: the public menu and its admin editor.

use crate::{
    api::{
        AppState,
        extract::{AdminSession, ApiJson, ApiPath},
        routes::message,
    },
    core::{
        auth::Permission,
        menu::{self, MenuItemInput, MenuItemPatch},
    },
    entities::menu_item::Model as MenuItem,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(list_available).post(create))
        .route("/services/all", get(list_all))
        .route("/services/:id", put(update).delete(remove))
}

async fn list_available(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>> {
    menu::get_available_menu(&state.db).await.map(Json)
}

async fn list_all(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<Vec<MenuItem>>> {
    session.require(Permission::ManageMenu)?;
    menu::get_all_menu_items(&state.db).await.map(Json)
}

async fn create(
    State(state): State<AppState>,
    session: AdminSession,
    ApiJson(input): ApiJson<MenuItemInput>,
) -> Result<(StatusCode, Json<MenuItem>)> {
    session.require(Permission::ManageMenu)?;
    let item = menu::create_menu_item(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn update(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<MenuItemPatch>,
) -> Result<Json<MenuItem>> {
    session.require(Permission::ManageMenu)?;
    menu::update_menu_item(&state.db, id, patch).await.map(Json)
}

async fn remove(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    session.require(Permission::ManageMenu)?;
    menu::delete_menu_item(&state.db, id).await?;
    Ok(message("Service deleted successfully"))
}
