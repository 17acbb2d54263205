//! Editable content business logic.
//!
//! Content rows are addressed by their unique key. Reads are public; writes
//! come from the admin content editor.

use crate::{
    entities::{
        Content,
        content::{self, ContentType},
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Full content row as submitted by the editor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInput {
    /// Unique key
    pub key: String,
    /// Value kind
    #[serde(rename = "type")]
    pub content_type: ContentType,
    /// Value
    pub value: String,
    /// Admin label
    pub label: String,
    /// Help text, defaults to empty
    #[serde(default)]
    pub description: Option<String>,
    /// Owning page, defaults to `home`
    #[serde(default)]
    pub page: Option<String>,
}

/// Partial update of an existing row.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentPatch {
    /// New value
    pub value: Option<String>,
    /// New label
    pub label: Option<String>,
    /// New help text
    pub description: Option<String>,
}

/// All content rows ordered by page, then key.
pub async fn get_all_content(db: &DatabaseConnection) -> Result<Vec<content::Model>> {
    Content::find()
        .order_by_asc(content::Column::Page)
        .order_by_asc(content::Column::Key)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks up a row by key.
pub async fn get_content_by_key(
    db: &DatabaseConnection,
    key: &str,
) -> Result<Option<content::Model>> {
    Content::find()
        .filter(content::Column::Key.eq(key))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates the row for `input.key` or replaces every field of the existing one.
///
/// # Errors
/// Returns [`Error::Validation`] if key, value or label is empty.
#[instrument(skip(db, input), fields(key = %input.key))]
pub async fn upsert_content(db: &DatabaseConnection, input: ContentInput) -> Result<content::Model> {
    let key = input.key.trim();
    if key.is_empty() || input.value.trim().is_empty() || input.label.trim().is_empty() {
        return Err(Error::validation("Key, type, value, and label are required"));
    }

    let now = chrono::Utc::now();
    let description = input.description.unwrap_or_default();
    let page = input
        .page
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| "home".to_string());

    let saved = match get_content_by_key(db, key).await? {
        Some(existing) => {
            let mut row: content::ActiveModel = existing.into();
            row.content_type = Set(input.content_type);
            row.value = Set(input.value);
            row.label = Set(input.label);
            row.description = Set(description);
            row.page = Set(page);
            row.updated_at = Set(now);
            row.update(db).await?
        }
        None => {
            content::ActiveModel {
                key: Set(key.to_string()),
                content_type: Set(input.content_type),
                value: Set(input.value),
                label: Set(input.label),
                description: Set(description),
                page: Set(page),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    info!("Content saved");
    Ok(saved)
}

/// Updates value, label and/or description of an existing row.
///
/// # Errors
/// Returns [`Error::NotFound`] if no row has this key, or
/// [`Error::Validation`] if the new value or label is empty.
#[instrument(skip(db, patch))]
pub async fn update_content(
    db: &DatabaseConnection,
    key: &str,
    patch: ContentPatch,
) -> Result<content::Model> {
    if patch.value.as_deref().is_some_and(|v| v.trim().is_empty())
        || patch.label.as_deref().is_some_and(|l| l.trim().is_empty())
    {
        return Err(Error::validation("Value and label cannot be empty"));
    }

    let mut row: content::ActiveModel = get_content_by_key(db, key)
        .await?
        .ok_or_else(|| Error::not_found("Content", key))?
        .into();

    if let Some(value) = patch.value {
        row.value = Set(value);
    }
    if let Some(label) = patch.label {
        row.label = Set(label);
    }
    if let Some(description) = patch.description {
        row.description = Set(description);
    }
    row.updated_at = Set(chrono::Utc::now());

    row.update(db).await.map_err(Into::into)
}

/// Deletes the row with this key.
///
/// # Errors
/// Returns [`Error::NotFound`] if no row has this key.
#[instrument(skip(db))]
pub async fn delete_content(db: &DatabaseConnection, key: &str) -> Result<()> {
    let result = Content::delete_many()
        .filter(content::Column::Key.eq(key))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Content", key));
    }
    info!("Content deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn input(key: &str, page: Option<&str>) -> ContentInput {
        ContentInput {
            key: key.to_string(),
            content_type: ContentType::Text,
            value: format!("value of {key}"),
            label: format!("Label {key}"),
            description: None,
            page: page.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_replaces() -> Result<()> {
        let db = setup_test_db().await?;

        let created = upsert_content(&db, input("hero-title", None)).await?;
        assert_eq!(created.page, "home");
        assert_eq!(created.description, "");

        let mut replacement = input("hero-title", Some("about"));
        replacement.value = "New title".to_string();
        let replaced = upsert_content(&db, replacement).await?;

        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.value, "New title");
        assert_eq!(replaced.page, "about");
        assert_eq!(get_all_content(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_requires_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let mut missing_value = input("hero-title", None);
        missing_value.value = " ".to_string();

        let result = upsert_content(&db, missing_value).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_content_sorted_by_page_then_key() -> Result<()> {
        let db = setup_test_db().await?;
        upsert_content(&db, input("welcome-text", Some("home"))).await?;
        upsert_content(&db, input("about-title", Some("about"))).await?;
        upsert_content(&db, input("hero-title", Some("home"))).await?;

        let keys: Vec<String> = get_all_content(&db)
            .await?
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, ["about-title", "hero-title", "welcome-text"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_content_partial() -> Result<()> {
        let db = setup_test_db().await?;
        let created = upsert_content(&db, input("contact-phone", Some("contact"))).await?;

        let updated = update_content(
            &db,
            "contact-phone",
            ContentPatch {
                value: Some("+91 0000000000".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.value, "+91 0000000000");
        assert_eq!(updated.label, created.label);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_content(&db, "nope", ContentPatch::default()).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        let result = delete_content(&db, "nope").await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        assert!(get_content_by_key(&db, "nope").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_content() -> Result<()> {
        let db = setup_test_db().await?;
        upsert_content(&db, input("banner-image-1", None)).await?;

        delete_content(&db, "banner-image-1").await?;
        assert!(get_content_by_key(&db, "banner-image-1").await?.is_none());
        Ok(())
    }
}
