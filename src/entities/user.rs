//! User entity - Staff accounts that can sign in to the admin panel.
//!
//! Passwords are stored as Argon2 PHC strings and never serialized.
//! `password_changed_at` revokes tokens issued before the last change.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login name
    #[sea_orm(unique)]
    pub username: String,
    /// Optional email, also accepted as a login identifier
    pub email: Option<String>,
    /// Argon2 PHC hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Authority level
    pub role: Role,
    /// Tokens issued before this instant are rejected
    #[serde(skip_serializing)]
    pub password_changed_at: DateTimeUtc,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

/// `User` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Staff role. See `core::auth::Permission` for what each role may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Day-to-day operations only
    #[sea_orm(string_value = "subadmin")]
    Subadmin,
}
