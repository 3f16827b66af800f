//! Query model and compilers
//!
//! This module provides:
//! - The recursive boolean query model
//! - The structured remote filter compiler
//! - The full-text search compiler with escaping
//! - The client predicate that enforces exact semantics locally

mod filter;
mod kql;
mod model;
mod predicate;

pub use filter::compile_filter;
pub use kql::{CompiledSearch, KQL_SPECIALS, KqlEscaper, compile_search, has_full_text_intent};
pub use model::{CompiledQuery, DateRange, FieldOperator, FieldValue, Query, QueryError};
pub use predicate::Predicate;
