//! Paginated search execution
//!
//! This module provides:
//! - The continuation token codec
//! - The remote page-fetch boundary trait
//! - The bounded, resumable fetch-and-filter executor

mod executor;
mod source;
pub mod token;

pub use executor::{
    DEFAULT_MAX_ITEMS_SCANNED, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SearchOptions,
    SearchResponse, search_messages,
};
pub use source::{MessagePage, MessageSource, PageRequest};
pub use token::PageToken;
