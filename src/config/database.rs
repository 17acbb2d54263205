//! Database configuration module for the storefront.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{Contact, Content, MenuItem, Order, OrderItem, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Used when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.sqlite?mode=rwc";

/// Establishes a connection to the database at `database_url`.
///
/// Connectivity failures surface as [`crate::errors::Error::ServiceUnavailable`].
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the parent directory of a file-backed `SQLite` URL.
///
/// Other URLs, including in-memory databases, are left alone.
pub fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = Path::new(rest.split('?').next().unwrap_or_default());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
        debug!(dir = %parent.display(), "Database directory ready");
    }
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Orders are created before order items so the foreign key target exists.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, Order).await?;
    create_table(db, OrderItem).await?;
    create_table(db, Contact).await?;
    create_table(db, MenuItem).await?;
    create_table(db, Content).await?;
    create_table(db, User).await?;
    info!("Database tables ensured.");
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        contact::Model as ContactModel, content::Model as ContentModel,
        menu_item::Model as MenuItemModel, order::Model as OrderModel,
        order_item::Model as OrderItemModel, user::Model as UserModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<OrderModel> = Order::find().limit(1).all(&db).await?;
        let _: Vec<OrderItemModel> = OrderItem::find().limit(1).all(&db).await?;
        let _: Vec<ContactModel> = Contact::find().limit(1).all(&db).await?;
        let _: Vec<MenuItemModel> = MenuItem::find().limit(1).all(&db).await?;
        let _: Vec<ContentModel> = Content::find().limit(1).all(&db).await?;
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = create_connection("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }

    #[test]
    fn test_ensure_sqlite_dir() -> Result<()> {
        let dir = std::env::temp_dir().join(format!("storefront-{}", uuid::Uuid::new_v4().simple()));
        let url = format!("sqlite://{}/shop.sqlite?mode=rwc", dir.display());

        ensure_sqlite_dir(&url)?;
        assert!(dir.is_dir());
        std::fs::remove_dir_all(&dir)?;

        ensure_sqlite_dir("sqlite::memory:")?;
        Ok(())
    }
}
