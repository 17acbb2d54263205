//! Menu business logic - Handles all menu item operations.
//!
//! Menu items are what the storefront lists under "services". The public menu
//! only shows available items; staff with menu permission can see and edit
//! everything. Checkout re-prices order lines against this table.

use crate::{
    entities::{MenuItem, menu_item},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Fields for a new menu item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemInput {
    /// Display name
    pub name: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Optional image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Optional category
    #[serde(default)]
    pub category: Option<String>,
    /// Defaults to available
    #[serde(default)]
    pub available: Option<bool>,
}

/// Partial update of a menu item. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New price
    pub price: Option<f64>,
    /// New image URL
    pub image: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New availability
    pub available: Option<bool>,
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::validation("Menu item name cannot be empty"));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(Error::validation(format!(
            "Menu item price must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

/// Retrieves the public menu: available items, newest first.
pub async fn get_available_menu(db: &DatabaseConnection) -> Result<Vec<menu_item::Model>> {
    MenuItem::find()
        .filter(menu_item::Column::Available.eq(true))
        .order_by_desc(menu_item::Column::CreatedAt)
        .order_by_desc(menu_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every menu item including unavailable ones, newest first.
pub async fn get_all_menu_items(db: &DatabaseConnection) -> Result<Vec<menu_item::Model>> {
    MenuItem::find()
        .order_by_desc(menu_item::Column::CreatedAt)
        .order_by_desc(menu_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of stored menu items, available or not.
pub async fn count_menu_items(db: &DatabaseConnection) -> Result<u64> {
    MenuItem::find().count(db).await.map_err(Into::into)
}

/// Creates a new menu item after validating name and price.
///
/// # Errors
/// Returns an error if:
/// - The name is empty or whitespace-only
/// - The price is negative or not finite (NaN, infinity)
/// - The database insert operation fails
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_menu_item(
    db: &DatabaseConnection,
    input: MenuItemInput,
) -> Result<menu_item::Model> {
    validate_name(&input.name)?;
    validate_price(input.price)?;

    let now = chrono::Utc::now();
    let item = menu_item::ActiveModel {
        name: Set(input.name.trim().to_string()),
        description: Set(input.description.trim().to_string()),
        price: Set(input.price),
        image: Set(input.image.filter(|s| !s.trim().is_empty())),
        category: Set(input.category.filter(|s| !s.trim().is_empty())),
        available: Set(input.available.unwrap_or(true)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let item = item.insert(db).await?;
    info!(id = item.id, "Menu item created");
    Ok(item)
}

/// Applies a partial update to a menu item.
///
/// # Errors
/// Returns an error if:
/// - A provided name or price fails validation
/// - The menu item does not exist
/// - The database update operation fails
#[instrument(skip(db, patch))]
pub async fn update_menu_item(
    db: &DatabaseConnection,
    item_id: i64,
    patch: MenuItemPatch,
) -> Result<menu_item::Model> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }

    let mut item: menu_item::ActiveModel = MenuItem::find_by_id(item_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Menu item", item_id))?
        .into();

    if let Some(name) = patch.name {
        item.name = Set(name.trim().to_string());
    }
    if let Some(description) = patch.description {
        item.description = Set(description.trim().to_string());
    }
    if let Some(price) = patch.price {
        item.price = Set(price);
    }
    if let Some(image) = patch.image {
        item.image = Set(Some(image).filter(|s| !s.trim().is_empty()));
    }
    if let Some(category) = patch.category {
        item.category = Set(Some(category).filter(|s| !s.trim().is_empty()));
    }
    if let Some(available) = patch.available {
        item.available = Set(available);
    }
    item.updated_at = Set(chrono::Utc::now());

    item.update(db).await.map_err(Into::into)
}

/// Deletes a menu item. Past orders keep their own copy of name and price.
///
/// # Errors
/// Returns an error if the item does not exist or the delete fails.
#[instrument(skip(db))]
pub async fn delete_menu_item(db: &DatabaseConnection, item_id: i64) -> Result<()> {
    let result = MenuItem::delete_by_id(item_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Menu item", item_id));
    }
    info!("Menu item deleted");
    Ok(())
}
