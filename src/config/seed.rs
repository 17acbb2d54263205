//! Seed data loading from config.toml
//!
//! The seed file lists the default menu and the default editable content rows.
//! Menu items are inserted only into an empty menu; content rows are inserted
//! when their key is missing and existing rows are left as the admin edited them.

use crate::{
    core::{content, menu},
    entities::content::ContentType,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, instrument};

/// Configuration structure representing the entire seed file
#[derive(Debug, Deserialize, Default)]
pub struct SeedConfig {
    /// Menu items to create when the menu is empty
    #[serde(default)]
    pub menu: Vec<MenuSeed>,
    /// Content rows to create when their key is missing
    #[serde(default)]
    pub content: Vec<ContentSeed>,
}

/// A single default menu item
#[derive(Debug, Deserialize, Clone)]
pub struct MenuSeed {
    /// Display name
    pub name: String,
    /// Short description
    pub description: String,
    /// Unit price
    pub price: f64,
    /// Optional image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Optional category
    #[serde(default)]
    pub category: Option<String>,
}

/// A single default content row
#[derive(Debug, Deserialize, Clone)]
pub struct ContentSeed {
    /// Unique key
    pub key: String,
    /// Value kind
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Value
    pub value: String,
    /// Admin label
    pub label: String,
    /// Admin help text
    #[serde(default)]
    pub description: Option<String>,
    /// Owning page
    #[serde(default)]
    pub page: Option<String>,
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_seed_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read seed file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file: {e}"),
    })
}

/// Applies seed data to the database.
///
/// Returns `(menu_items_created, content_rows_created)`.
#[instrument(skip_all)]
pub async fn apply_seed(db: &DatabaseConnection, seed: &SeedConfig) -> Result<(usize, usize)> {
    let mut menu_created = 0;
    if menu::count_menu_items(db).await? == 0 {
        for item in &seed.menu {
            menu::create_menu_item(
                db,
                menu::MenuItemInput {
                    name: item.name.clone(),
                    description: item.description.clone(),
                    price: item.price,
                    image: item.image.clone(),
                    category: item.category.clone(),
                    available: Some(true),
                },
            )
            .await?;
            menu_created += 1;
        }
    }

    let mut content_created = 0;
    for row in &seed.content {
        if content::get_content_by_key(db, &row.key).await?.is_some() {
            continue;
        }
        content::upsert_content(
            db,
            content::ContentInput {
                key: row.key.clone(),
                content_type: row.content_type,
                value: row.value.clone(),
                label: row.label.clone(),
                description: row.description.clone(),
                page: row.page.clone(),
            },
        )
        .await?;
        content_created += 1;
    }

    info!(menu_created, content_created, "Seed data applied");
    Ok((menu_created, content_created))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const SEED: &str = r#"
        [[menu]]
        name = "Veggie Delight"
        description = "Fresh vegetables, cheese, and special sauce"
        price = 180.0
        category = "Veg"

        [[menu]]
        name = "Egg Sandwich"
        description = "Scrambled eggs with cheese and herbs"
        price = 150.0

        [[content]]
        key = "hero-title"
        type = "text"
        value = "Fresh Sandwiches, Every Day"
        label = "Hero Title"

        [[content]]
        key = "logo-url"
        type = "logo"
        value = "https://example.com/logo.png"
        label = "Website Logo"
        page = "home"
    "#;

    #[test]
    fn test_parse_seed_config() {
        let config: SeedConfig = toml::from_str(SEED).unwrap();
        assert_eq!(config.menu.len(), 2);
        assert_eq!(config.menu[0].name, "Veggie Delight");
        assert_eq!(config.menu[0].price, 180.0);
        assert_eq!(config.menu[0].category.as_deref(), Some("Veg"));
        assert!(config.menu[1].category.is_none());

        assert_eq!(config.content.len(), 2);
        assert_eq!(config.content[1].content_type, ContentType::Logo);
    }

    #[test]
    fn test_empty_seed_file_is_valid() {
        let config: SeedConfig = toml::from_str("").unwrap();
        assert!(config.menu.is_empty());
        assert!(config.content.is_empty());
    }

    #[tokio::test]
    async fn test_apply_seed_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config: SeedConfig = toml::from_str(SEED).unwrap();

        assert_eq!(apply_seed(&db, &config).await?, (2, 2));
        // Second run finds a non-empty menu and existing keys
        assert_eq!(apply_seed(&db, &config).await?, (0, 0));
        Ok(())
    }

    #[tokio::test]
    async fn test_apply_seed_keeps_edited_content() -> Result<()> {
        let db = setup_test_db().await?;
        let config: SeedConfig = toml::from_str(SEED).unwrap();
        apply_seed(&db, &config).await?;

        content::update_content(
            &db,
            "hero-title",
            content::ContentPatch {
                value: Some("Edited".to_string()),
                ..Default::default()
            },
        )
        .await?;
        apply_seed(&db, &config).await?;

        let row = content::get_content_by_key(&db, "hero-title").await?.unwrap();
        assert_eq!(row.value, "Edited");
        Ok(())
    }
}
