//! Order item entity - One line of an order.
//!
//! Each line keeps the name and unit price as they were at checkout and its
//! position within the order so invoices list lines in submission order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    #[serde(skip_serializing)]
    pub id: i64,
    /// ID of the order this line belongs to
    #[serde(skip_serializing)]
    pub order_id: String,
    /// Zero-based position within the order
    #[serde(skip_serializing)]
    pub position: i32,
    /// Item name as shown on the menu at checkout
    pub name: String,
    /// Number of units, at least 1
    pub quantity: i32,
    /// Unit price at checkout
    pub price: f64,
}

/// Defines relationships between `OrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Line amount computed from quantity and unit price.
    #[must_use]
    pub fn amount(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}
