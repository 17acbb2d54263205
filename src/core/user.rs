//! Staff account management.

use crate::{
    config::settings::AdminBootstrap,
    core::auth::{hash_password, validate_new_password},
    entities::{
        User,
        user::{self, Role},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// A new staff account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Login name, unique
    #[serde(default)]
    pub username: String,
    /// Optional email
    #[serde(default)]
    pub email: Option<String>,
    /// Initial password
    #[serde(default)]
    pub password: String,
    /// Defaults to subadmin
    #[serde(default)]
    pub role: Option<Role>,
}

/// Changes to an existing account. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    /// New email; an empty string clears it
    pub email: Option<String>,
    /// New role
    pub role: Option<Role>,
    /// Password reset, revokes the account's tokens
    pub password: Option<String>,
}

fn clean_email(email: Option<String>) -> Option<String> {
    email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty())
}

/// All accounts ordered by username.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Username)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds the account whose username or email equals `identifier`.
pub async fn find_by_identifier(
    db: &DatabaseConnection,
    identifier: &str,
) -> Result<Option<user::Model>> {
    User::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(identifier))
                .add(user::Column::Email.eq(identifier)),
        )
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an account.
///
/// # Errors
/// Returns [`Error::Validation`] if the username is empty or taken, or the
/// password is too short.
#[instrument(skip(db, new_user), fields(username = %new_user.username))]
pub async fn create_user(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    let username = new_user.username.trim();
    if username.is_empty() {
        return Err(Error::validation("Username is required"));
    }
    validate_new_password(&new_user.password)?;

    if User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?
        .is_some()
    {
        return Err(Error::validation(format!(
            "Username '{username}' is already taken"
        )));
    }

    let now = Utc::now();
    let account = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(clean_email(new_user.email)),
        password_hash: Set(hash_password(&new_user.password)?),
        role: Set(new_user.role.unwrap_or(Role::Subadmin)),
        password_changed_at: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = account.id, role = ?account.role, "User created");
    Ok(account)
}

/// Applies a patch to an account.
///
/// # Errors
/// Returns [`Error::NotFound`] if the account does not exist and
/// [`Error::Validation`] if a new password is too short.
#[instrument(skip(db, patch))]
pub async fn update_user(
    db: &DatabaseConnection,
    user_id: i64,
    patch: UserPatch,
) -> Result<user::Model> {
    if let Some(password) = &patch.password {
        validate_new_password(password)?;
    }

    let mut account: user::ActiveModel = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?
        .into();

    let now = Utc::now();
    if patch.email.is_some() {
        account.email = Set(clean_email(patch.email));
    }
    if let Some(role) = patch.role {
        account.role = Set(role);
    }
    if let Some(password) = patch.password {
        account.password_hash = Set(hash_password(&password)?);
        account.password_changed_at = Set(now);
    }
    account.updated_at = Set(now);

    account.update(db).await.map_err(Into::into)
}

/// Deletes an account other than the caller's own.
///
/// # Errors
/// Returns [`Error::Validation`] when `acting_user_id == user_id` and
/// [`Error::NotFound`] if the account does not exist.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, acting_user_id: i64, user_id: i64) -> Result<()> {
    if acting_user_id == user_id {
        return Err(Error::validation("You cannot delete your own account"));
    }
    let result = User::delete_by_id(user_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("User", user_id));
    }
    info!("User deleted");
    Ok(())
}

/// Creates the configured admin account unless one with that username exists.
///
/// Returns whether an account was created.
#[instrument(skip_all, fields(username = %bootstrap.username))]
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    bootstrap: &AdminBootstrap,
) -> Result<bool> {
    if User::find()
        .filter(user::Column::Username.eq(bootstrap.username.as_str()))
        .one(db)
        .await?
        .is_some()
    {
        info!("Admin account already present");
        return Ok(false);
    }

    create_user(
        db,
        NewUser {
            username: bootstrap.username.clone(),
            email: bootstrap.email.clone(),
            password: bootstrap.password.clone(),
            role: Some(Role::Admin),
        },
    )
    .await?;
    info!("Admin account created");
    Ok(true)
}
