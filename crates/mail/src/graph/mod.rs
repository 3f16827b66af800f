//! Hosted mail API integration
//!
//! This module provides:
//! - A bearer-token authentication boundary (token acquisition is external)
//! - An HTTP client for the paginated message listing and single-message
//!   fetch endpoints
//! - Response normalization to domain models

mod auth;
mod client;
mod normalize;

pub use auth::GraphAuth;
pub use client::GraphClient;
pub use normalize::normalize_message;

/// Remote API response types
pub mod api {
    use serde::Deserialize;

    /// One page from the message listing endpoint
    #[derive(Debug, Deserialize)]
    pub struct ListMessagesResponse {
        #[serde(default)]
        pub value: Vec<GraphMessage>,
        /// Opaque continuation URL for the next page
        #[serde(rename = "@odata.nextLink")]
        pub next_link: Option<String>,
    }

    /// A message as returned by the remote API
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GraphMessage {
        pub id: String,
        pub subject: Option<String>,
        pub body_preview: Option<String>,
        pub body: Option<ItemBody>,
        pub from: Option<Recipient>,
        pub to_recipients: Option<Vec<Recipient>>,
        pub cc_recipients: Option<Vec<Recipient>>,
        pub bcc_recipients: Option<Vec<Recipient>>,
        pub categories: Option<Vec<String>>,
        pub importance: Option<String>,
        pub is_read: Option<bool>,
        pub has_attachments: Option<bool>,
        pub received_date_time: Option<String>,
    }

    /// Wrapper the remote API uses around every address
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Recipient {
        pub email_address: Option<WireAddress>,
    }

    #[derive(Debug, Deserialize)]
    pub struct WireAddress {
        pub name: Option<String>,
        pub address: Option<String>,
    }

    /// Full body content with its content type
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ItemBody {
        pub content_type: Option<String>,
        pub content: Option<String>,
    }
}
