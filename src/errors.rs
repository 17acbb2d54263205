//! Unified error type for the storefront.
//!
//! Every core operation returns [`Result`]. The API layer maps each variant to
//! an HTTP status in `api::error`.

use crate::entities::order::OrderStatus;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// All errors produced by the storefront.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed validation before touching the database.
    #[error("Validation failed: {message}")]
    Validation {
        /// Human-readable description of the offending field
        message: String,
    },

    /// Requested status change is not an edge of the order state machine.
    #[error("Cannot move order from '{from}' to '{to}'")]
    InvalidTransition {
        /// Current status
        from: OrderStatus,
        /// Requested status
        to: OrderStatus,
    },

    /// Missing, malformed, expired or revoked credential, or wrong password.
    ///
    /// The reason is only logged; callers always see the same message.
    #[error("Invalid credentials")]
    Unauthorized {
        /// Internal reason, never sent to the client
        reason: &'static str,
    },

    /// Authenticated, but the role lacks the required permission.
    #[error("Insufficient permissions")]
    Forbidden,

    /// No record matches the given key.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record (e.g. "Order")
        entity: &'static str,
        /// Identifier that was looked up
        key: String,
    },

    /// The database could not be reached.
    #[error("Database unavailable: {message}")]
    ServiceUnavailable {
        /// Driver message
        message: String,
    },

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(DbErr),

    /// Invalid or missing configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },

    /// Token signing failed.
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failed.
    #[error("Password hashing failed: {message}")]
    PasswordHash {
        /// Message from the hasher
        message: String,
    },

    /// PDF generation failed.
    #[error("Invoice rendering failed: {message}")]
    Invoice {
        /// Message from the PDF backend
        message: String,
    },

    /// Outbound mail could not be built or sent.
    #[error("Mail error: {message}")]
    Mail {
        /// Message from the mail transport
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::ConnectionAcquire(e) => Self::ServiceUnavailable {
                message: e.to_string(),
            },
            DbErr::Conn(e) => Self::ServiceUnavailable {
                message: e.to_string(),
            },
            other => {
                if let Some(SqlErr::UniqueConstraintViolation(detail)) = other.sql_err() {
                    return Self::Validation {
                        message: format!("Duplicate value: {detail}"),
                    };
                }
                Self::Database(other)
            }
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        entities::content::{self, ContentType},
        test_utils::setup_test_db,
    };
    use axum::http::StatusCode;
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, ConnAcquireErr, RuntimeErr, Set};

    #[test]
    fn test_connection_failures_are_unavailable() {
        let acquire: Error = DbErr::ConnectionAcquire(ConnAcquireErr::Timeout).into();
        assert!(matches!(acquire, Error::ServiceUnavailable { .. }));
        assert_eq!(acquire.status(), StatusCode::SERVICE_UNAVAILABLE);

        let refused: Error = DbErr::Conn(RuntimeErr::Internal("connection refused".into())).into();
        assert!(matches!(refused, Error::ServiceUnavailable { .. }));
        assert_eq!(refused.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_other_db_errors_stay_internal() {
        let err: Error = DbErr::Custom("boom".into()).into();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unique_violation_is_validation() -> Result<()> {
        let db = setup_test_db().await?;
        let row = || {
            let now = Utc::now();
            content::ActiveModel {
                key: Set("hero-title".to_string()),
                content_type: Set(ContentType::Text),
                value: Set("Fresh".to_string()),
                label: Set("Hero Title".to_string()),
                description: Set(String::new()),
                page: Set("home".to_string()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
        };
        row().insert(&db).await?;

        let err: Error = row().insert(&db).await.unwrap_err().into();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}
