//! Shared test utilities for the storefront.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

use crate::{
    core::{
        auth::{TokenKeys, hash_password},
        menu::{self, MenuItemInput},
        order::{OrderInput, OrderItemInput},
    },
    entities::user::{self, Role},
    errors::Result,
};
use chrono::{TimeDelta, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Password of every account made by [`create_test_user`].
pub const TEST_PASSWORD: &str = "test-password";

/// Token secret used by [`test_keys`].
pub const TEST_SECRET: &str = "test-secret";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Settings with only the token secret set; everything else at defaults.
pub fn test_settings() -> crate::config::settings::Settings {
    crate::config::settings::Settings::from_lookup(|key| {
        (key == "JWT_SECRET").then(|| TEST_SECRET.to_string())
    })
    .unwrap_or_else(|e| panic!("test settings: {e}"))
}

/// Token keys with the default 7 day lifetime.
pub fn test_keys() -> TokenKeys {
    TokenKeys::new(
        TEST_SECRET,
        TimeDelta::hours(crate::config::settings::DEFAULT_TOKEN_TTL_HOURS),
    )
}

/// Menu item input with an empty description, available by default.
pub fn menu_input(name: &str, price: f64) -> MenuItemInput {
    MenuItemInput {
        name: name.to_string(),
        description: String::new(),
        price,
        image: None,
        category: None,
        available: None,
    }
}

/// Creates an available menu item.
pub async fn create_test_menu_item(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
) -> Result<crate::entities::menu_item::Model> {
    menu::create_menu_item(db, menu_input(name, price)).await
}

/// The checkout from the storefront walkthrough: two sandwiches at 60, cash.
///
/// # Defaults
/// * customer: "Test", address "X", no email
/// * items: Sandwich x2 @ 60.0, total 120.0
pub fn sample_order_input(phone: &str) -> OrderInput {
    OrderInput {
        customer_name: "Test".to_string(),
        phone: phone.to_string(),
        email: None,
        address: "X".to_string(),
        items: vec![OrderItemInput {
            name: "Sandwich".to_string(),
            quantity: 2,
            price: 60.0,
        }],
        total_amount: 120.0,
        payment_method: "cash".to_string(),
    }
}

/// Inserts a staff account with [`TEST_PASSWORD`].
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    email: Option<&str>,
    role: Role,
) -> Result<user::Model> {
    let now = Utc::now();
    let account = user::ActiveModel {
        username: Set(username.to_string()),
        email: Set(email.map(str::to_string)),
        password_hash: Set(hash_password(TEST_PASSWORD)?),
        role: Set(role),
        password_changed_at: Set(now),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(account)
}
