//! Contact entity - A general or franchise inquiry from the storefront.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Contact database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contacts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the inquiry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sender name
    pub name: String,
    /// Sender email
    pub email: String,
    /// Sender phone
    pub phone: String,
    /// Free-text message body
    pub message: String,
    /// What the inquiry is about
    pub kind: ContactKind,
    /// Staff handling status
    pub status: ContactStatus,
    /// When the inquiry was submitted
    pub created_at: DateTimeUtc,
    /// When the inquiry was last modified
    pub updated_at: DateTimeUtc,
}

/// `Contact` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Inquiry type, set explicitly at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    /// Contact-page message
    #[sea_orm(string_value = "general")]
    General,
    /// Franchise application
    #[sea_orm(string_value = "franchise")]
    Franchise,
}

/// Handling status of an inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ContactStatus {
    /// Not yet opened
    #[sea_orm(string_value = "new")]
    New,
    /// Opened by staff
    #[sea_orm(string_value = "read")]
    Read,
    /// Answered
    #[sea_orm(string_value = "replied")]
    Replied,
}

impl FromStr for ContactStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "read" => Ok(Self::Read),
            "replied" => Ok(Self::Replied),
            _ => Err(()),
        }
    }
}
