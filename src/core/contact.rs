//! Contact and franchise inquiries.

use crate::{
    entities::{
        Contact,
        contact::{self, ContactKind, ContactStatus},
    },
    errors::{Error, Result},
    notify::{Notification, Notifier},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Message prefix the storefront's franchise form uses.
const FRANCHISE_PREFIX: &str = "Franchise Enquiry";

/// A submitted inquiry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
    /// Sender name
    #[serde(default)]
    pub name: String,
    /// Sender email
    #[serde(default)]
    pub email: String,
    /// Sender phone
    #[serde(default)]
    pub phone: String,
    /// Message body
    #[serde(default)]
    pub message: String,
    /// Inquiry type; inferred from the message when absent
    #[serde(default)]
    pub kind: Option<ContactKind>,
}

/// Kind for an inquiry that did not state one.
fn infer_kind(message: &str) -> ContactKind {
    if message.trim_start().starts_with(FRANCHISE_PREFIX) {
        ContactKind::Franchise
    } else {
        ContactKind::General
    }
}

/// Stores an inquiry and queues a notice for the staff inbox.
///
/// # Errors
/// Returns [`Error::Validation`] if name, email, phone or message is empty.
#[instrument(skip_all)]
pub async fn create_contact(
    db: &DatabaseConnection,
    notifier: &Notifier,
    input: ContactInput,
) -> Result<contact::Model> {
    let name = input.name.trim();
    let email = input.email.trim();
    let phone = input.phone.trim();
    let message = input.message.trim();
    if name.is_empty() || email.is_empty() || phone.is_empty() || message.is_empty() {
        return Err(Error::validation(
            "Name, email, phone, and message are required",
        ));
    }

    let kind = input.kind.unwrap_or_else(|| infer_kind(message));
    let now = Utc::now();
    let saved = contact::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        phone: Set(phone.to_string()),
        message: Set(message.to_string()),
        kind: Set(kind),
        status: Set(ContactStatus::New),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = saved.id, ?kind, "Inquiry received");
    notifier.publish(Notification::ContactReceived(saved.clone()));
    Ok(saved)
}

/// All inquiries, newest first.
pub async fn list_contacts(db: &DatabaseConnection) -> Result<Vec<contact::Model>> {
    Contact::find()
        .order_by_desc(contact::Column::CreatedAt)
        .order_by_desc(contact::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Parses a status name from an admin request.
///
/// # Errors
/// Returns [`Error::Validation`] unless the value is `new`, `read` or `replied`.
pub fn parse_contact_status(raw: &str) -> Result<ContactStatus> {
    raw.trim()
        .parse()
        .map_err(|()| Error::validation(format!("Unknown contact status '{}'", raw.trim())))
}

/// Sets the handling status of an inquiry.
///
/// # Errors
/// Returns [`Error::NotFound`] if the inquiry does not exist.
#[instrument(skip(db))]
pub async fn update_contact_status(
    db: &DatabaseConnection,
    contact_id: i64,
    status: ContactStatus,
) -> Result<contact::Model> {
    let mut row: contact::ActiveModel = Contact::find_by_id(contact_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Contact", contact_id))?
        .into();
    row.status = Set(status);
    row.updated_at = Set(Utc::now());
    row.update(db).await.map_err(Into::into)
}

/// Deletes an inquiry.
///
/// # Errors
/// Returns [`Error::NotFound`] if the inquiry does not exist.
#[instrument(skip(db))]
pub async fn delete_contact(db: &DatabaseConnection, contact_id: i64) -> Result<()> {
    let result = Contact::delete_by_id(contact_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("Contact", contact_id));
    }
    info!("Inquiry deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn input(message: &str, kind: Option<ContactKind>) -> ContactInput {
        ContactInput {
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "9123456789".to_string(),
            message: message.to_string(),
            kind,
        }
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(
            infer_kind("Franchise Enquiry: Kanpur, 2 outlets"),
            ContactKind::Franchise
        );
        assert_eq!(infer_kind("Do you cater events?"), ContactKind::General);
    }

    #[tokio::test]
    async fn test_create_contact_publishes_notice() -> Result<()> {
        let db = setup_test_db().await?;
        let (notifier, mut events) = Notifier::channel(4);

        let saved = create_contact(&db, &notifier, input("Franchise Enquiry: Agra", None)).await?;
        assert_eq!(saved.kind, ContactKind::Franchise);
        assert_eq!(saved.status, ContactStatus::New);

        match events.try_recv().unwrap() {
            Notification::ContactReceived(contact) => assert_eq!(contact.id, saved.id),
            other => panic!("unexpected event {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_kind_wins() -> Result<()> {
        let db = setup_test_db().await?;
        let (notifier, _events) = Notifier::channel(4);

        let saved = create_contact(
            &db,
            &notifier,
            input("Opening an outlet", Some(ContactKind::Franchise)),
        )
        .await?;
        assert_eq!(saved.kind, ContactKind::Franchise);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_contact_requires_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let (notifier, mut events) = Notifier::channel(4);

        let mut missing = input("Hello", None);
        missing.email = " ".to_string();
        let result = create_contact(&db, &notifier, missing).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        assert!(list_contacts(&db).await?.is_empty());
        assert!(events.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_status_update_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let (notifier, _events) = Notifier::channel(4);
        let first = create_contact(&db, &notifier, input("First", None)).await?;
        let second = create_contact(&db, &notifier, input("Second", None)).await?;

        let listed = list_contacts(&db).await?;
        assert_eq!(listed[0].id, second.id);

        let read = update_contact_status(&db, first.id, parse_contact_status("read")?).await?;
        assert_eq!(read.status, ContactStatus::Read);

        assert!(matches!(
            parse_contact_status("archived").unwrap_err(),
            Error::Validation { .. }
        ));

        delete_contact(&db, first.id).await?;
        let missing = update_contact_status(&db, first.id, ContactStatus::Replied).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
