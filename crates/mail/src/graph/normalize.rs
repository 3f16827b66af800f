//! Remote API response normalization
//!
//! Converts wire messages to domain models.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};

use super::api::{GraphMessage, ItemBody, Recipient};
use crate::models::{ContentType, EmailAddress, Message, MessageBody, MessageId};

/// Normalize a wire message to a domain [`Message`]
pub fn normalize_message(wire: GraphMessage) -> Result<Message> {
    if wire.id.is_empty() {
        bail!("Message has no id");
    }

    let mut builder = Message::builder(MessageId::new(&wire.id))
        .subject(wire.subject.unwrap_or_default())
        .body_preview(wire.body_preview.unwrap_or_default())
        .categories(wire.categories.unwrap_or_default())
        .importance(
            wire.importance
                .as_deref()
                .map(crate::models::Importance::parse)
                .unwrap_or_default(),
        )
        .is_read(wire.is_read.unwrap_or(false))
        .has_attachment(wire.has_attachments.unwrap_or(false));

    if let Some(from) = wire.from.as_ref().and_then(normalize_address) {
        builder = builder.from(from);
    }
    builder = builder
        .to(normalize_address_list(wire.to_recipients))
        .cc(normalize_address_list(wire.cc_recipients))
        .bcc(normalize_address_list(wire.bcc_recipients));

    if let Some(body) = wire.body.and_then(normalize_body) {
        builder = builder.body(body);
    }

    // Unparsable timestamps become None rather than failing the page
    if let Some(received) = wire
        .received_date_time
        .as_deref()
        .and_then(parse_timestamp)
    {
        builder = builder.received_at(received);
    }

    Ok(builder.build())
}

fn normalize_address(recipient: &Recipient) -> Option<EmailAddress> {
    let wire = recipient.email_address.as_ref()?;
    let address = wire.address.clone()?;
    Some(EmailAddress {
        name: wire.name.clone().filter(|n| !n.is_empty()),
        address,
    })
}

fn normalize_address_list(recipients: Option<Vec<Recipient>>) -> Vec<EmailAddress> {
    recipients
        .unwrap_or_default()
        .iter()
        .filter_map(normalize_address)
        .collect()
}

fn normalize_body(body: ItemBody) -> Option<MessageBody> {
    let content = body.content?;
    let content_type = match body.content_type.as_deref() {
        Some(t) if t.eq_ignore_ascii_case("html") => ContentType::Html,
        _ => ContentType::Text,
    };
    Some(MessageBody {
        content,
        content_type,
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(json: &str) -> GraphMessage {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_normalize_full_message() {
        let message = normalize_message(wire(
            r#"{
                "id": "m1",
                "subject": "Status",
                "bodyPreview": "preview",
                "body": {"contentType": "html", "content": "<p>hi</p>"},
                "from": {"emailAddress": {"name": "Alice", "address": "alice@example.com"}},
                "toRecipients": [{"emailAddress": {"address": "bob@example.com"}}],
                "categories": ["Work"],
                "importance": "high",
                "isRead": true,
                "hasAttachments": true,
                "receivedDateTime": "2024-06-15T10:30:00Z"
            }"#,
        ))
        .unwrap();

        assert_eq!(message.id.as_str(), "m1");
        assert_eq!(message.from.address, "alice@example.com");
        assert_eq!(message.from.name.as_deref(), Some("Alice"));
        assert_eq!(message.to.len(), 1);
        assert_eq!(message.body.as_ref().unwrap().content_type, ContentType::Html);
        assert_eq!(message.importance, crate::models::Importance::High);
        assert!(message.is_read);
        assert!(message.has_attachment);
        assert!(message.received_at.is_some());
    }

    #[test]
    fn test_normalize_sparse_message() {
        let message = normalize_message(wire(r#"{"id": "m2"}"#)).unwrap();
        assert_eq!(message.subject, "");
        assert_eq!(message.from.address, "unknown@unknown.com");
        assert!(message.body.is_none());
        assert!(message.received_at.is_none());
    }

    #[test]
    fn test_unparsable_timestamp_becomes_none() {
        let message =
            normalize_message(wire(r#"{"id": "m3", "receivedDateTime": "not-a-date"}"#)).unwrap();
        assert!(message.received_at.is_none());
    }

    #[test]
    fn test_empty_id_fails() {
        assert!(normalize_message(wire(r#"{"id": ""}"#)).is_err());
    }
}
