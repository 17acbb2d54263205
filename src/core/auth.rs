//! Admin session guard.
//!
//! Staff sign in with a username or email and receive an HS256 token. Every
//! administrative request presents that token; [`authorize`] checks its
//! signature and expiry, reloads the account, and rejects tokens minted
//! before the account's last password change. What a role may do is decided
//! by [`Permission::granted_to`].

use crate::{
    core::user,
    entities::{
        User,
        user::{self as user_entity, Role},
    },
    errors::{Error, Result},
    notify::{Notification, Notifier},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{info, instrument, warn};

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Something only some staff may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// List, view and move orders
    ManageOrders,
    /// List inquiries and set their status
    ManageContacts,
    /// Create and edit content rows
    EditContent,
    /// Create, edit and delete menu items
    ManageMenu,
    /// Delete orders, inquiries and content
    DeleteRecords,
    /// Manage staff accounts
    ManageUsers,
}

impl Permission {
    /// Whether `role` holds this permission.
    #[must_use]
    pub const fn granted_to(self, role: Role) -> bool {
        match role {
            Role::Admin => true,
            Role::Subadmin => matches!(
                self,
                Self::ManageOrders | Self::ManageContacts | Self::EditContent
            ),
        }
    }
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Account id
    pub user_id: i64,
    /// Account username
    pub username: String,
    /// Account email
    pub email: Option<String>,
    /// Role at issue time
    pub role: Role,
    /// Password change stamp (ms) the token was minted under
    pub password_stamp: i64,
    /// Issued at, seconds since epoch
    pub iat: i64,
    /// Expires at, seconds since epoch
    pub exp: i64,
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
}

impl TokenKeys {
    /// Keys for an HMAC secret and token lifetime.
    #[must_use]
    pub fn new(secret: &str, ttl: TimeDelta) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Mints a token for `account`.
    pub fn issue(&self, account: &user_entity::Model) -> Result<(String, Claims)> {
        let now = Utc::now();
        let claims = Claims {
            user_id: account.id,
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            password_stamp: account.password_changed_at.timestamp_millis(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok((token, claims))
    }

    /// Checks signature and expiry.
    ///
    /// # Errors
    /// Returns [`Error::Unauthorized`] for any invalid token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                warn!(error = %e, "Rejected session token");
                Error::Unauthorized {
                    reason: "invalid or expired token",
                }
            })
    }
}

/// An authenticated staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Account as currently stored
    pub user: user_entity::Model,
    /// Claims of the presented token
    pub claims: Claims,
}

impl Session {
    /// Fails with [`Error::Forbidden`] unless the account's role holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<()> {
        if permission.granted_to(self.user.role) {
            Ok(())
        } else {
            warn!(user = %self.user.username, ?permission, "Permission denied");
            Err(Error::Forbidden)
        }
    }
}

/// Login payload. Either field identifies the account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username, or an email address
    #[serde(default)]
    pub username: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Plain password
    #[serde(default)]
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token
    pub token: String,
    /// The signed-in account
    pub user: user_entity::Model,
}

/// Password change payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Password in use now
    #[serde(default)]
    pub current_password: String,
    /// Replacement
    #[serde(default)]
    pub new_password: String,
}

/// Verified against when a login names no account.
static MISSING_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("missing-account").ok());

/// Hashes a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::PasswordHash {
            message: e.to_string(),
        })
}

/// Checks a password against a stored hash. Unparseable hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Rejects passwords shorter than [`MIN_PASSWORD_LEN`].
pub fn validate_new_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "New password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Signs in by username or email.
///
/// Unknown accounts and wrong passwords fail identically. On success a login
/// notice is queued for the account's email, if it has one.
///
/// # Errors
/// Returns [`Error::Validation`] if the identifier or password is missing and
/// [`Error::Unauthorized`] if the credentials do not match.
#[instrument(skip_all)]
pub async fn login(
    db: &DatabaseConnection,
    keys: &TokenKeys,
    notifier: &Notifier,
    request: LoginRequest,
) -> Result<LoginResponse> {
    let identifier = [request.username.as_deref(), request.email.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty());
    let Some(identifier) = identifier else {
        return Err(Error::validation("Username/Email and password are required"));
    };
    if request.password.is_empty() {
        return Err(Error::validation("Username/Email and password are required"));
    }

    let Some(account) = user::find_by_identifier(db, identifier).await? else {
        // Same Argon2 cost as a real account
        if let Some(hash) = MISSING_ACCOUNT_HASH.as_deref() {
            let _ = verify_password(&request.password, hash);
        }
        return Err(Error::Unauthorized {
            reason: "unknown account",
        });
    };
    if !verify_password(&request.password, &account.password_hash) {
        return Err(Error::Unauthorized {
            reason: "password mismatch",
        });
    }

    let (token, _) = keys.issue(&account)?;
    info!(user = %account.username, "Login successful");

    if let Some(email) = &account.email {
        notifier.publish(Notification::AdminLogin {
            username: account.username.clone(),
            email: email.clone(),
            at: Utc::now(),
        });
    }

    Ok(LoginResponse {
        token,
        user: account,
    })
}

/// Resolves a bearer token to a live session.
///
/// # Errors
/// Returns [`Error::Unauthorized`] if the token is invalid or expired, the
/// account no longer exists, or the password changed after the token was
/// issued.
pub async fn authorize(db: &DatabaseConnection, keys: &TokenKeys, token: &str) -> Result<Session> {
    let claims = keys.decode(token)?;

    let Some(account) = User::find_by_id(claims.user_id).one(db).await? else {
        return Err(Error::Unauthorized {
            reason: "account no longer exists",
        });
    };
    if account.password_changed_at.timestamp_millis() != claims.password_stamp {
        return Err(Error::Unauthorized {
            reason: "token predates password change",
        });
    }

    Ok(Session {
        user: account,
        claims,
    })
}

/// Changes the signed-in account's password and revokes its older tokens.
///
/// # Errors
/// Returns [`Error::Validation`] if the new password is too short or the
/// current password is missing, and [`Error::Unauthorized`] if the current
/// password is wrong.
#[instrument(skip_all, fields(user = %session.user.username))]
pub async fn change_password(
    db: &DatabaseConnection,
    session: &Session,
    request: ChangePasswordRequest,
) -> Result<()> {
    validate_new_password(&request.new_password)?;
    if request.current_password.is_empty() {
        return Err(Error::validation(
            "Current password and new password are required",
        ));
    }

    let account = User::find_by_id(session.user.id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", session.user.id))?;
    if !verify_password(&request.current_password, &account.password_hash) {
        return Err(Error::Unauthorized {
            reason: "current password is incorrect",
        });
    }

    let now = Utc::now();
    let mut active: user_entity::ActiveModel = account.into();
    active.password_hash = Set(hash_password(&request.new_password)?);
    active.password_changed_at = Set(now);
    active.updated_at = Set(now);
    active.update(db).await?;

    info!("Password changed");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn login_as(identifier: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(identifier.to_string()),
            email: None,
            password: password.to_string(),
        }
    }

    #[test]
    fn test_permission_table() {
        use Permission::{
            DeleteRecords, EditContent, ManageContacts, ManageMenu, ManageOrders, ManageUsers,
        };
        for p in [ManageOrders, ManageContacts, EditContent, ManageMenu, DeleteRecords, ManageUsers] {
            assert!(p.granted_to(Role::Admin));
        }
        for p in [ManageOrders, ManageContacts, EditContent] {
            assert!(p.granted_to(Role::Subadmin));
        }
        for p in [ManageMenu, DeleteRecords, ManageUsers] {
            assert!(!p.granted_to(Role::Subadmin));
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret!").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret!", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("s3cret!", "not-a-hash"));
    }

    #[tokio::test]
    async fn test_login_by_username_and_email() -> Result<()> {
        let db = setup_test_db().await?;
        let (notifier, mut events) = Notifier::channel(8);
        let keys = test_keys();
        create_test_user(&db, "manager", Some("manager@example.com"), Role::Subadmin).await?;

        let by_name = login(&db, &keys, &notifier, login_as("manager", TEST_PASSWORD)).await?;
        assert_eq!(by_name.user.role, Role::Subadmin);

        let by_email = login(
            &db,
            &keys,
            &notifier,
            LoginRequest {
                username: None,
                email: Some("manager@example.com".to_string()),
                password: TEST_PASSWORD.to_string(),
            },
        )
        .await?;
        assert_eq!(by_email.user.username, "manager");

        let claims = keys.decode(&by_email.token)?;
        assert_eq!(claims.role, Role::Subadmin);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);

        assert!(matches!(
            events.try_recv().unwrap(),
            Notification::AdminLogin { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_login_failures_look_identical() -> Result<()> {
        let db = setup_test_db().await?;
        let (notifier, _events) = Notifier::channel(8);
        let keys = test_keys();
        create_test_user(&db, "admin", None, Role::Admin).await?;

        let wrong_password = login(&db, &keys, &notifier, login_as("admin", "nope-nope"))
            .await
            .unwrap_err();
        let unknown = login(&db, &keys, &notifier, login_as("ghost", TEST_PASSWORD))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, Error::Unauthorized { .. }));
        assert!(matches!(unknown, Error::Unauthorized { .. }));
        assert_eq!(wrong_password.to_string(), unknown.to_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_login_skips_blank_username_for_email() -> Result<()> {
        let db = setup_test_db().await?;
        let (notifier, _events) = Notifier::channel(8);
        create_test_user(&db, "manager", Some("manager@example.com"), Role::Subadmin).await?;

        let response = login(
            &db,
            &test_keys(),
            &notifier,
            LoginRequest {
                username: Some("  ".to_string()),
                email: Some("manager@example.com".to_string()),
                password: TEST_PASSWORD.to_string(),
            },
        )
        .await?;
        assert_eq!(response.user.username, "manager");
        Ok(())
    }

    #[test]
    fn test_missing_account_hash_is_a_real_hash() {
        let hash = MISSING_ACCOUNT_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(hash).is_ok());
        assert!(!verify_password(TEST_PASSWORD, hash));
    }

    #[tokio::test]
    async fn test_login_requires_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let (notifier, _events) = Notifier::channel(8);

        let result = login(&db, &test_keys(), &notifier, login_as("  ", "x")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = login(&db, &test_keys(), &notifier, login_as("admin", "")).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_authorize_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let keys = test_keys();
        let account = create_test_user(&db, "admin", None, Role::Admin).await?;

        let (token, _) = keys.issue(&account)?;
        let session = authorize(&db, &keys, &token).await?;
        assert_eq!(session.user.id, account.id);
        assert!(session.require(Permission::ManageUsers).is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_authorize_rejects_bad_tokens() -> Result<()> {
        let db = setup_test_db().await?;
        let keys = test_keys();
        let account = create_test_user(&db, "admin", None, Role::Admin).await?;

        let result = authorize(&db, &keys, "garbage").await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));

        let other = TokenKeys::new("another-secret", TimeDelta::hours(1));
        let (forged, _) = other.issue(&account)?;
        let result = authorize(&db, &keys, &forged).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));

        let expired_keys = TokenKeys::new(TEST_SECRET, TimeDelta::days(-2));
        let (expired, _) = expired_keys.issue(&account)?;
        let result = authorize(&db, &keys, &expired).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_authorize_rejects_deleted_account() -> Result<()> {
        let db = setup_test_db().await?;
        let keys = test_keys();
        let admin = create_test_user(&db, "admin", None, Role::Admin).await?;
        let temp = create_test_user(&db, "temp", None, Role::Subadmin).await?;

        let (token, _) = keys.issue(&temp)?;
        user::delete_user(&db, admin.id, temp.id).await?;

        let result = authorize(&db, &keys, &token).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_subadmin_forbidden_from_user_management() -> Result<()> {
        let db = setup_test_db().await?;
        let keys = test_keys();
        let account = create_test_user(&db, "helper", None, Role::Subadmin).await?;

        let (token, _) = keys.issue(&account)?;
        let session = authorize(&db, &keys, &token).await?;
        assert!(session.require(Permission::ManageOrders).is_ok());
        assert!(matches!(
            session.require(Permission::ManageUsers).unwrap_err(),
            Error::Forbidden
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_short_new_password_fails_regardless_of_current() -> Result<()> {
        let db = setup_test_db().await?;
        let keys = test_keys();
        let account = create_test_user(&db, "admin", None, Role::Admin).await?;
        let (token, _) = keys.issue(&account)?;
        let session = authorize(&db, &keys, &token).await?;

        for current in [TEST_PASSWORD, "wrong-password", ""] {
            let result = change_password(
                &db,
                &session,
                ChangePasswordRequest {
                    current_password: current.to_string(),
                    new_password: "12345".to_string(),
                },
            )
            .await;
            assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_change_password_revokes_old_tokens() -> Result<()> {
        let db = setup_test_db().await?;
        let keys = test_keys();
        let (notifier, _events) = Notifier::channel(8);
        let account = create_test_user(&db, "admin", None, Role::Admin).await?;
        let (old_token, _) = keys.issue(&account)?;
        let session = authorize(&db, &keys, &old_token).await?;

        let wrong = change_password(
            &db,
            &session,
            ChangePasswordRequest {
                current_password: "not-it".to_string(),
                new_password: "brand-new-pass".to_string(),
            },
        )
        .await;
        assert!(matches!(wrong.unwrap_err(), Error::Unauthorized { .. }));

        change_password(
            &db,
            &session,
            ChangePasswordRequest {
                current_password: TEST_PASSWORD.to_string(),
                new_password: "brand-new-pass".to_string(),
            },
        )
        .await?;

        let result = authorize(&db, &keys, &old_token).await;
        assert!(matches!(result.unwrap_err(), Error::Unauthorized { .. }));

        let fresh = login(&db, &keys, &notifier, login_as("admin", "brand-new-pass")).await?;
        assert!(authorize(&db, &keys, &fresh.token).await.is_ok());
        Ok(())
    }
}
