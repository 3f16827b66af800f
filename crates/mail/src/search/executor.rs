//! Bounded, resumable search execution
//!
//! Drives the compiled query against the remote paginated listing. Queries
//! without full-text intent take the fast path: one remote fetch with the
//! structured filter, remote pagination state passed through. Queries with
//! full-text intent are fetched with the search expression alone and every
//! constraint is re-checked by the client predicate, with hard caps on
//! pages and raw items scanned and a continuation token that can resume
//! mid-page.

use anyhow::Result;
use log::{debug, info};

use super::source::{MessagePage, MessageSource, PageRequest};
use super::token;
use crate::models::{CategoryTable, Message};
use crate::query::{CompiledQuery, Predicate, Query, compile_filter};

/// Remote maximum page size
pub const MAX_PAGE_SIZE: usize = 1000;
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_MAX_PAGES: usize = 10;
pub const DEFAULT_MAX_ITEMS_SCANNED: usize = 5000;

/// Mode tag carried in tokens minted during the structural-filter fallback,
/// so a resumed call re-enters the fallback scan directly
const MODE_FILTER: &str = "filter";

/// Options for one search call
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Requested result page size; clamped to the remote maximum
    pub page_size: usize,
    /// Whether to fetch full bodies; forced on when the query needs
    /// body content client-side
    pub include_body: bool,
    /// Hard cap on remote pages fetched per call
    pub max_pages: usize,
    /// Hard cap on raw items inspected per call
    pub max_items_scanned: usize,
    /// Continuation token from a previous call
    pub page_token: Option<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            include_body: false,
            max_pages: DEFAULT_MAX_PAGES,
            max_items_scanned: DEFAULT_MAX_ITEMS_SCANNED,
            page_token: None,
        }
    }
}

/// Result of one search call
#[derive(Debug, Clone, Default)]
pub struct SearchResponse {
    pub messages: Vec<Message>,
    /// Token to resume from; None when the source is exhausted or a cap was
    /// hit (see `truncated`)
    pub next_page_token: Option<String>,
    /// True when a cap stopped the scan: more data may exist but the call
    /// must not be resumed
    pub truncated: bool,
}

/// Search the mailbox with a structured query.
///
/// Validation failures surface before any remote call; remote fetch errors
/// propagate unchanged and are never retried.
pub fn search_messages(
    source: &dyn MessageSource,
    query: Option<&Query>,
    options: &SearchOptions,
) -> Result<SearchResponse> {
    match query {
        Some(query) => {
            let compiled = CompiledQuery::compile(query)?;
            if compiled.has_full_text {
                full_text_scan(source, query, &compiled, options)
            } else {
                fast_path(source, compiled.filter, options)
            }
        }
        None => fast_path(source, None, options),
    }
}

/// Single remote fetch with the structured filter; the remote filter is
/// trusted to be exact for every field it expresses, so no predicate runs.
fn fast_path(
    source: &dyn MessageSource,
    filter: Option<String>,
    options: &SearchOptions,
) -> Result<SearchResponse> {
    let token = token::decode(options.page_token.as_deref());
    debug!(
        "Fast-path fetch (filter: {}, resume: {})",
        filter.is_some(),
        token.cursor().is_some()
    );
    let page = source.fetch_page(&PageRequest {
        filter,
        search: None,
        cursor: token.cursor().map(str::to_string),
        page_size: clamp_page_size(options.page_size),
        include_body: options.include_body,
    })?;
    let next_page_token = page
        .next_cursor
        .as_deref()
        .map(|cursor| token::encode(Some(cursor), 0, None));
    Ok(SearchResponse {
        messages: page.items,
        next_page_token,
        truncated: false,
    })
}

fn full_text_scan(
    source: &dyn MessageSource,
    query: &Query,
    compiled: &CompiledQuery,
    options: &SearchOptions,
) -> Result<SearchResponse> {
    let page_size = clamp_page_size(options.page_size);
    let include_body = options.include_body || compiled.require_body_client_filter;
    let token = token::decode(options.page_token.as_deref());
    let predicate = Predicate::new(query);
    let caps = ScanCaps {
        max_pages: options.max_pages,
        max_items_scanned: options.max_items_scanned,
    };

    // A token minted during a fallback scan re-enters that scan directly
    if token.mode() == Some(MODE_FILTER) {
        let filter = compile_filter(query, &CategoryTable::standard())?;
        let request = request_template(filter, None, page_size, include_body);
        let scan = run_scan(
            source,
            &request,
            &predicate,
            token.cursor(),
            token.offset(),
            page_size,
            &caps,
            Some(MODE_FILTER),
        )?;
        return Ok(scan.into_response());
    }

    let request = request_template(None, compiled.search.clone(), page_size, include_body);
    let scan = run_scan(
        source,
        &request,
        &predicate,
        token.cursor(),
        token.offset(),
        page_size,
        &caps,
        None,
    )?;

    // Clean exhaustion with nothing accepted: retry exactly once with the
    // structural filter, in case the text index missed everything. Its own
    // exhaustion or cap is final.
    if scan.exhausted
        && scan.accepted.is_empty()
        && let Some(filter) = compile_filter(query, &CategoryTable::standard())?
    {
        info!("Search returned no results; retrying once with structural filter");
        let request = request_template(Some(filter), None, page_size, include_body);
        let fallback = run_scan(
            source,
            &request,
            &predicate,
            None,
            0,
            page_size,
            &caps,
            Some(MODE_FILTER),
        )?;
        return Ok(fallback.into_response());
    }

    Ok(scan.into_response())
}

fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

fn request_template(
    filter: Option<String>,
    search: Option<String>,
    page_size: usize,
    include_body: bool,
) -> PageRequest {
    PageRequest {
        filter,
        search,
        cursor: None,
        page_size,
        include_body,
    }
}

struct ScanCaps {
    max_pages: usize,
    max_items_scanned: usize,
}

struct ScanResult {
    accepted: Vec<Message>,
    next_page_token: Option<String>,
    capped: bool,
    exhausted: bool,
}

impl ScanResult {
    fn capped(accepted: Vec<Message>) -> Self {
        Self {
            accepted,
            next_page_token: None,
            capped: true,
            exhausted: false,
        }
    }

    fn exhausted(accepted: Vec<Message>) -> Self {
        Self {
            accepted,
            next_page_token: None,
            capped: false,
            exhausted: true,
        }
    }

    fn into_response(self) -> SearchResponse {
        SearchResponse {
            messages: self.accepted,
            next_page_token: self.next_page_token,
            truncated: self.capped,
        }
    }
}

/// The bounded scan loop: fetch a page, filter its items in order, repeat.
///
/// Stop conditions in priority order: item cap mid-page (capped, no token),
/// page cap before the next fetch (capped, no token), output buffer full
/// (token pointing at the next unconsumed raw item, or the next page),
/// empty page or missing next cursor (exhausted).
#[allow(clippy::too_many_arguments)]
fn run_scan(
    source: &dyn MessageSource,
    template: &PageRequest,
    predicate: &Predicate,
    start_cursor: Option<&str>,
    start_offset: usize,
    wanted: usize,
    caps: &ScanCaps,
    mode: Option<&str>,
) -> Result<ScanResult> {
    let mut accepted: Vec<Message> = Vec::new();
    let mut cursor: Option<String> = start_cursor.map(str::to_string);
    // The offset only applies to the first page of a resumed call
    let mut page_offset = start_offset;
    let mut pages_fetched = 0usize;
    let mut items_scanned = 0usize;

    loop {
        if pages_fetched >= caps.max_pages {
            debug!("Page cap reached after {pages_fetched} pages");
            return Ok(ScanResult::capped(accepted));
        }

        let mut request = template.clone();
        request.cursor = cursor.clone();
        let page: MessagePage = source.fetch_page(&request)?;
        pages_fetched += 1;

        if page.items.is_empty() {
            return Ok(ScanResult::exhausted(accepted));
        }

        let start = page_offset.min(page.items.len());
        page_offset = 0;

        for (index, item) in page.items.iter().enumerate().skip(start) {
            if items_scanned >= caps.max_items_scanned {
                debug!("Item cap reached after {items_scanned} raw items");
                return Ok(ScanResult::capped(accepted));
            }
            items_scanned += 1;
            if predicate.matches(item) {
                accepted.push(item.clone());
            }
            if accepted.len() >= wanted {
                let next_index = index + 1;
                let next_page_token = if next_index < page.items.len() {
                    // Stopped inside the page: resume on this same page at
                    // the next unconsumed raw item
                    Some(token::encode(cursor.as_deref(), next_index, mode))
                } else {
                    page.next_cursor
                        .as_deref()
                        .map(|next| token::encode(Some(next), 0, mode))
                };
                let exhausted = next_page_token.is_none();
                return Ok(ScanResult {
                    accepted,
                    next_page_token,
                    capped: false,
                    exhausted,
                });
            }
        }

        // An item cap hit at a page boundary only counts when more data exists
        if items_scanned >= caps.max_items_scanned && page.next_cursor.is_some() {
            debug!("Item cap reached at page boundary after {items_scanned} raw items");
            return Ok(ScanResult::capped(accepted));
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => return Ok(ScanResult::exhausted(accepted)),
        }
    }
}
