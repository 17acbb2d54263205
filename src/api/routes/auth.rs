//! `/auth` endpoints: sign-in, session check, password and staff management.

use crate::{
    api::{
        AppState,
        extract::{AdminSession, ApiJson, ApiPath},
        routes::message,
    },
    core::{
        auth::{self, ChangePasswordRequest, LoginRequest, LoginResponse, Permission},
        user::{self, NewUser, UserPatch},
    },
    entities::user::Model as User,
    errors::Result,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde_json::{Value, json};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify))
        .route("/auth/change-password", post(change_password))
        .route("/auth/users", get(list_users).post(create_user))
        .route("/auth/users/:id", patch(update_user).delete(delete_user))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    auth::login(&state.db, &state.keys, &state.notifier, request)
        .await
        .map(Json)
}

async fn verify(session: AdminSession) -> Json<Value> {
    let AdminSession(session) = session;
    Json(json!({ "user": session.user, "expiresAt": session.claims.exp }))
}

async fn change_password(
    State(state): State<AppState>,
    session: AdminSession,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    auth::change_password(&state.db, &session.0, request).await?;
    Ok(message("Password changed successfully"))
}

async fn list_users(State(state): State<AppState>, session: AdminSession) -> Result<Json<Vec<User>>> {
    session.require(Permission::ManageUsers)?;
    user::list_users(&state.db).await.map(Json)
}

async fn create_user(
    State(state): State<AppState>,
    session: AdminSession,
    ApiJson(new_user): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    session.require(Permission::ManageUsers)?;
    let account = user::create_user(&state.db, new_user).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn update_user(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> Result<Json<User>> {
    session.require(Permission::ManageUsers)?;
    user::update_user(&state.db, id, patch).await.map(Json)
}

async fn delete_user(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    let acting = session.require(Permission::ManageUsers)?;
    user::delete_user(&state.db, acting.user.id, id).await?;
    Ok(message("User deleted successfully"))
}
