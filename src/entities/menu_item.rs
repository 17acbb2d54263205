//! Menu item entity - Something customers can order (a "service" on the storefront).
//!
//! Orders copy name and price from here at checkout, so editing or deleting a
//! menu item never changes past orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the menu item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Veggie Delight")
    pub name: String,
    /// Short description shown on the menu
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Optional image URL
    pub image: Option<String>,
    /// Optional grouping such as "Veg" or "Non-Veg"
    pub category: Option<String>,
    /// Hidden from the public menu when false
    pub available: bool,
    /// When the item was created
    pub created_at: DateTimeUtc,
    /// When the item was last modified
    pub updated_at: DateTimeUtc,
}

/// `MenuItem` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
