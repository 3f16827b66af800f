//! Mail crate - Query compilation and paginated mailbox search
//!
//! This crate provides platform-independent mailbox search functionality
//! including:
//! - Domain models (Message, EmailAddress, Category)
//! - A recursive boolean query model with field operators
//! - Compilers targeting the remote structured filter grammar and the
//!   remote full-text search grammar
//! - A client predicate enforcing exact query semantics locally
//! - A bounded, resumable fetch-and-filter executor with opaque
//!   continuation tokens
//! - A hosted mail API client implementing the page-fetch boundary
//!
//! This crate has zero UI dependencies; all remote state lives behind the
//! [`MessageSource`] trait and the only carried state is the caller-held
//! continuation token.

pub mod config;
pub mod graph;
pub mod models;
pub mod query;
pub mod search;

pub use config::GraphCredentials;
pub use graph::{GraphAuth, GraphClient, api::GraphMessage, normalize_message};
pub use models::{
    Category, CategoryError, CategoryTable, ContentType, EmailAddress, Importance, Message,
    MessageBody, MessageId,
};
pub use query::{
    CompiledQuery, CompiledSearch, DateRange, FieldOperator, FieldValue, KqlEscaper, Predicate,
    Query, QueryError, compile_filter, compile_search, has_full_text_intent,
};
pub use search::{
    MessagePage, MessageSource, PageRequest, PageToken, SearchOptions, SearchResponse,
    search_messages,
};
