//! Request extractors.

use crate::{
    api::AppState,
    core::auth::{self, Permission, Session},
    errors::{Error, Result},
};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

/// JSON body whose rejections use the crate's error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejections use the crate's error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// A staff member authenticated by `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl AdminSession {
    /// Fails with 403 unless the session holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<&Session> {
        self.0.require(permission)?;
        Ok(&self.0)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts).ok_or(Error::Unauthorized {
            reason: "missing bearer token",
        })?;
        auth::authorize(&state.db, &state.keys, token)
            .await
            .map(Self)
    }
}
