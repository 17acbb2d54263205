//! `/orders` endpoints.

use crate::{
    api::{
        AppState,
        extract::{AdminSession, ApiJson, ApiPath},
        routes::message,
    },
    core::{
        auth::Permission,
        invoice::{self, render_invoice_pdf},
        order::{self, OrderDetails, OrderInput, TrackQuery, TrackedOrder},
    },
    errors::{Error, Result},
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;

/// Body of a status change.
#[derive(Debug, Deserialize)]
struct StatusUpdate {
    #[serde(default)]
    status: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create).get(list))
        .route("/orders/track", get(track))
        .route("/orders/:id", get(show).delete(remove))
        .route("/orders/:id/status", patch(update_status))
        .route("/orders/:id/invoice", get(invoice_pdf))
}

async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<OrderInput>,
) -> Result<(StatusCode, Json<OrderDetails>)> {
    let details = order::create_order(&state.db, input).await?;
    Ok((StatusCode::CREATED, Json(details)))
}

async fn track(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackedOrder>> {
    order::track_order(&state.db, query).await.map(Json)
}

async fn list(
    State(state): State<AppState>,
    session: AdminSession,
) -> Result<Json<Vec<OrderDetails>>> {
    session.require(Permission::ManageOrders)?;
    order::list_orders(&state.db).await.map(Json)
}

async fn show(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<OrderDetails>> {
    session.require(Permission::ManageOrders)?;
    order::get_order(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Order", id))
}

async fn update_status(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<OrderDetails>> {
    session.require(Permission::ManageOrders)?;
    let status = order::parse_status(&body.status)?;
    order::update_order_status(&state.db, &id, status)
        .await
        .map(Json)
}

async fn remove(
    State(state): State<AppState>,
    session: AdminSession,
    ApiPath(id): ApiPath<String>,
) -> Result<impl IntoResponse> {
    session.require(Permission::DeleteRecords)?;
    order::delete_order(&state.db, &id).await?;
    Ok(message("Order deleted successfully"))
}

async fn invoice_pdf(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<impl IntoResponse> {
    let details = order::get_order(&state.db, &id)
        .await?
        .ok_or_else(|| Error::not_found("Order", &id))?;
    let pdf = render_invoice_pdf(&details, &state.settings.business)?;
    let disposition = format!(
        "inline; filename=\"invoice-{}.pdf\"",
        invoice::invoice_number(&details.order.id)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    ))
}
