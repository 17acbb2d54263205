//! Content entity - Editable marketing copy stored as key/value rows.
//! Used for hero titles, banners, logos and similar page text so they can be
//! changed from the admin panel without a deploy.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Content database model - one editable value per unique key
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "content")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Lookup key (e.g., `"hero-title"`)
    #[sea_orm(unique)]
    pub key: String,
    /// How the value is interpreted by the frontend
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// The value itself (text or URL)
    pub value: String,
    /// Label shown in the admin editor
    pub label: String,
    /// Help text shown in the admin editor
    pub description: String,
    /// Page the value belongs to (e.g., `"home"`, `"about"`)
    pub page: String,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    pub updated_at: DateTimeUtc,
}

/// `Content` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Kind of content value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Plain text
    #[sea_orm(string_value = "text")]
    Text,
    /// Image URL
    #[sea_orm(string_value = "image")]
    Image,
    /// Logo URL
    #[sea_orm(string_value = "logo")]
    Logo,
    /// Banner/slider image URL
    #[sea_orm(string_value = "banner")]
    Banner,
    /// Longer section body
    #[sea_orm(string_value = "section")]
    Section,
}
