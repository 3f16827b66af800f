//! Remote mail API HTTP client
//!
//! Provides the paginated message listing and single-message fetch used by
//! the search executor. Uses synchronous HTTP (ureq) to be
//! executor-agnostic.

use anyhow::{Context, Result};
use log::warn;
use url::Url;

use super::api::{GraphMessage, ListMessagesResponse};
use super::{GraphAuth, normalize_message};
use crate::models::MessageId;
use crate::search::{MessagePage, MessageSource, PageRequest};

/// Client for the hosted mail API
pub struct GraphClient {
    auth: GraphAuth,
}

impl GraphClient {
    /// Remote API base URL
    const BASE_URL: &'static str = "https://graph.microsoft.com/v1.0";

    /// Fields requested on every listed message
    const LIST_FIELDS: &'static str = "id,subject,bodyPreview,from,toRecipients,ccRecipients,\
                                       bccRecipients,categories,importance,isRead,hasAttachments,\
                                       receivedDateTime";

    /// Create a new client
    pub fn new(auth: GraphAuth) -> Self {
        Self { auth }
    }

    /// List one page of messages.
    ///
    /// A cursor, when present, is the opaque continuation URL from a
    /// previous page and is fetched verbatim; otherwise the listing URL is
    /// built from the filter/search expressions.
    ///
    /// # Arguments
    /// * `filter` - Structured filter expression
    /// * `search` - Free-text search expression
    /// * `cursor` - Continuation URL from a previous page
    /// * `page_size` - Maximum items per page (1-1000)
    /// * `include_body` - Whether to request full body content
    pub fn list_messages(
        &self,
        filter: Option<&str>,
        search: Option<&str>,
        cursor: Option<&str>,
        page_size: usize,
        include_body: bool,
    ) -> Result<ListMessagesResponse> {
        let access_token = self.auth.access_token()?;

        let url = match cursor {
            Some(link) => Url::parse(link)
                .context("Continuation cursor is not a valid URL")?
                .to_string(),
            None => self.build_list_url(filter, search, page_size, include_body),
        };

        let mut response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .context("Failed to send list messages request")?;

        let list: ListMessagesResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse list messages response")?;

        Ok(list)
    }

    fn build_list_url(
        &self,
        filter: Option<&str>,
        search: Option<&str>,
        page_size: usize,
        include_body: bool,
    ) -> String {
        let select = if include_body {
            format!("{},body", Self::LIST_FIELDS)
        } else {
            Self::LIST_FIELDS.to_string()
        };
        let mut url = format!(
            "{}/me/messages?$top={}&$select={}",
            Self::BASE_URL,
            page_size.min(1000),
            select
        );
        if let Some(filter) = filter {
            url.push_str(&format!("&$filter={}", urlencoding::encode(filter)));
        }
        if let Some(search) = search {
            // The search expression travels inside its own double quotes
            url.push_str(&format!(
                "&$search={}",
                urlencoding::encode(&format!("\"{}\"", search))
            ));
        }
        url
    }

    /// Get a single message by ID, including full body content
    pub fn get_message(&self, id: &MessageId) -> Result<GraphMessage> {
        let access_token = self.auth.access_token()?;

        let url = format!(
            "{}/me/messages/{}?$select={},body",
            Self::BASE_URL,
            id.as_str(),
            Self::LIST_FIELDS
        );

        let mut response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .context("Failed to send get message request")?;

        let message: GraphMessage = response
            .body_mut()
            .read_json()
            .context("Failed to parse message response")?;

        Ok(message)
    }

    /// Check if the client has a token configured
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }
}

impl MessageSource for GraphClient {
    fn fetch_page(&self, request: &PageRequest) -> Result<MessagePage> {
        let response = self.list_messages(
            request.filter.as_deref(),
            request.search.as_deref(),
            request.cursor.as_deref(),
            request.page_size,
            request.include_body,
        )?;

        let mut items = Vec::with_capacity(response.value.len());
        for wire in response.value {
            match normalize_message(wire) {
                Ok(message) => items.push(message),
                Err(e) => warn!("Skipping unnormalizable message: {e}"),
            }
        }

        Ok(MessagePage {
            items,
            next_cursor: response.next_link,
        })
    }
}
