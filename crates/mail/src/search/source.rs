//! Remote page-fetch boundary

use anyhow::Result;

use crate::models::Message;

/// One remote page-fetch request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest {
    /// Structured filter expression; mutually exclusive with `search`
    pub filter: Option<String>,
    /// Free-text search expression; mutually exclusive with `filter`
    pub search: Option<String>,
    /// Opaque remote cursor from a previous page, if resuming
    pub cursor: Option<String>,
    /// Requested raw page size
    pub page_size: usize,
    /// Whether full body content should be included on returned items
    pub include_body: bool,
}

/// One remote page of messages
#[derive(Debug, Clone, Default)]
pub struct MessagePage {
    pub items: Vec<Message>,
    /// Cursor for the page after this one; None when the source is exhausted
    pub next_cursor: Option<String>,
}

/// The paginated remote listing primitive the executor drives.
///
/// Implementations must fetch exactly one page per call and surface remote
/// failures as errors; the executor never retries.
pub trait MessageSource: Send + Sync {
    fn fetch_page(&self, request: &PageRequest) -> Result<MessagePage>;
}
