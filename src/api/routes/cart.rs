//! `/cart` endpoints.

use crate::{
    api::{AppState, extract::ApiJson},
    core::cart::{self, Cart, CartQuote},
    errors::Result,
};
use axum::{Json, Router, extract::State, routing::post};

pub fn routes() -> Router<AppState> {
    Router::new().route("/cart/quote", post(quote))
}

async fn quote(
    State(state): State<AppState>,
    ApiJson(cart): ApiJson<Cart>,
) -> Result<Json<CartQuote>> {
    cart::quote_cart(&state.db, cart).await.map(Json)
}
