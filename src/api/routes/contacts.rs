//! `/contacts` endpoints.

use crate::{
    api::{
        AppState,
        extract::{AdminSession, ApiJson, ApiPath},
        routes::message,
    },
    core::{
        auth::Permission,
        contact::{self, ContactInput},
    },
    entities::contact::Model as Contact,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, patch, post},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    #[serde(default)]
    status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contacts", post(create).get(list))
        .route("/contacts/:id/status", patch(update_status))
        .route("/contacts/:id", delete(remove))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ContactInput>,
) -> Result<(StatusCode, Json<Contact>)> {
    let saved = contact::create_contact(&state.db, &state.notifier, input).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn list(State(state): State<AppState>, session: AdminSession) -> Result<Json<Vec<Contact>>> {
    session.require(Permission::ManageContacts)?;
    contact::list_contacts(&state.db).await.map(Json)
}

async fn update_status(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Contact>> {
    session.require(Permission::ManageContacts)?;
    let status = contact::parse_contact_status(&body.status)?;
    contact::update_contact_status(&state.db, id, status)
        .await
        .map(Json)
}

async fn remove(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    session.require(Permission::DeleteRecords)?;
    contact::delete_contact(&state.db, id).await?;
    Ok(message("Contact deleted successfully"))
}
