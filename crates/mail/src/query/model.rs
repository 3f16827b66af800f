//! Structured query model
//!
//! A [`Query`] is a recursive boolean tree. A node is either logical
//! (`$and`/`$or`/`$not` wrapping child queries) or a leaf carrying field
//! constraints. When a logical key is present, sibling leaf fields on the
//! same node are ignored; logical composition always wins at a given level.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{CategoryError, CategoryTable, Importance};

/// Validation error raised while compiling a query, before any remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("field '{field}' has an empty value")]
    EmptyValue { field: &'static str },
    #[error("field '{field}' has an operator with no $any/$all/$none values")]
    EmptyOperator { field: &'static str },
    #[error("invalid category: {0}")]
    InvalidCategory(#[from] CategoryError),
}

/// A field constraint: either a single value or a multi-value operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Value(String),
    Op(FieldOperator),
}

impl FieldValue {
    /// Validate shape: scalar values must be non-empty, operators must carry
    /// at least one populated clause with no empty members.
    pub(crate) fn validate(&self, field: &'static str) -> Result<(), QueryError> {
        match self {
            Self::Value(v) => {
                if v.is_empty() {
                    return Err(QueryError::EmptyValue { field });
                }
            }
            Self::Op(op) => {
                let clauses = [&op.any, &op.all, &op.none];
                if clauses.iter().all(|c| c.as_ref().is_none_or(|v| v.is_empty())) {
                    return Err(QueryError::EmptyOperator { field });
                }
                for clause in clauses.into_iter().flatten() {
                    if clause.iter().any(|v| v.is_empty()) {
                        return Err(QueryError::EmptyValue { field });
                    }
                }
            }
        }
        Ok(())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Value(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Value(s)
    }
}

impl From<FieldOperator> for FieldValue {
    fn from(op: FieldOperator) -> Self {
        Self::Op(op)
    }
}

/// Multi-value field operator.
///
/// Clause types may coexist; each present clause is an independent
/// constraint and all of them must hold ($any is an OR over its values,
/// $all an AND, $none matches only when no value matches).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldOperator {
    #[serde(rename = "$any", skip_serializing_if = "Option::is_none")]
    pub any: Option<Vec<String>>,
    #[serde(rename = "$all", skip_serializing_if = "Option::is_none")]
    pub all: Option<Vec<String>>,
    #[serde(rename = "$none", skip_serializing_if = "Option::is_none")]
    pub none: Option<Vec<String>>,
}

impl FieldOperator {
    pub fn any(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            any: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn all(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            all: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn none(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            none: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }
}

/// Half-open date range: inclusive lower bound, exclusive upper bound.
/// Bounds are day boundaries in UTC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gte: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lt: Option<NaiveDate>,
}

/// A recursive mailbox query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Query {
    /// All children must match
    #[serde(rename = "$and", skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<Query>>,
    /// At least one child must match
    #[serde(rename = "$or", skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<Query>>,
    /// Child must not match
    #[serde(rename = "$not", skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<Query>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<FieldValue>,
    /// Exact phrase matched against subject, body and preview together
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_phrase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_attachment: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<FieldValue>,
    /// User-defined label; case-sensitive, never normalized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<Importance>,
    /// Raw search-grammar escape hatch; used verbatim when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kql_query: Option<String>,
}

/// Output of query compilation.
///
/// Invariant: `has_full_text` implies `filter` is None; structural filters
/// are never combined with full-text search, so once search intent exists
/// all constraints fall to the client predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    /// Structured remote filter expression
    pub filter: Option<String>,
    /// Free-text remote search expression
    pub search: Option<String>,
    /// True when a body/text constraint requires body content client-side
    pub require_body_client_filter: bool,
    /// True when the query has full-text intent
    pub has_full_text: bool,
}

impl CompiledQuery {
    /// Compile a query into its remote representations.
    ///
    /// Full-text intent routes the whole query through the search compiler;
    /// otherwise the structured filter compiler runs alone.
    pub fn compile(query: &Query) -> Result<Self, QueryError> {
        let table = CategoryTable::standard();
        validate_query(query, &table)?;
        if super::kql::has_full_text_intent(query) {
            let compiled = super::kql::compile_search(query, &super::kql::KqlEscaper::standard())?;
            Ok(Self {
                filter: None,
                search: compiled.expression,
                require_body_client_filter: compiled.require_body_client_filter,
                has_full_text: true,
            })
        } else {
            Ok(Self {
                filter: super::filter::compile_filter(query, &table)?,
                search: None,
                require_body_client_filter: false,
                has_full_text: false,
            })
        }
    }
}

/// Validate every leaf constraint on the compilers' visit path, so failures
/// surface before any remote call regardless of which compiler runs.
///
/// Follows the same logical-first walk as the compilers: sibling leaf fields
/// of a logical key are never compiled, so they are not validated either.
fn validate_query(query: &Query, table: &CategoryTable) -> Result<(), QueryError> {
    if let Some(children) = &query.and {
        return children.iter().try_for_each(|c| validate_query(c, table));
    }
    if let Some(children) = &query.or {
        return children.iter().try_for_each(|c| validate_query(c, table));
    }
    if let Some(child) = &query.not {
        return validate_query(child, table);
    }

    for (field, value) in [
        ("from", &query.from),
        ("to", &query.to),
        ("cc", &query.cc),
        ("bcc", &query.bcc),
        ("subject", &query.subject),
        ("body", &query.body),
        ("text", &query.text),
        ("label", &query.label),
    ] {
        if let Some(value) = value {
            value.validate(field)?;
        }
    }
    if let Some(value) = &query.categories {
        value.validate("categories")?;
        let check = |terms: &[String]| -> Result<(), QueryError> {
            for term in terms {
                table.normalize(term)?;
            }
            Ok(())
        };
        match value {
            FieldValue::Value(v) => {
                table.normalize(v)?;
            }
            FieldValue::Op(op) => {
                for clause in [&op.any, &op.all, &op.none].into_iter().flatten() {
                    check(clause)?;
                }
            }
        }
    }
    if let Some(phrase) = &query.exact_phrase
        && phrase.is_empty()
    {
        return Err(QueryError::EmptyValue {
            field: "exactPhrase",
        });
    }
    Ok(())
}
