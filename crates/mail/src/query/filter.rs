//! Structured remote filter compiler
//!
//! Translates a [`Query`] into the remote API's boolean filter grammar
//! (property comparisons, collection membership tests, `and`/`or`/`not`
//! composition). Only server-expressible fields emit anything; the rest are
//! left to the client predicate. The executor never uses this output when
//! the query has full-text intent, except for the one zero-result fallback.

use chrono::NaiveDate;

use super::model::{FieldOperator, FieldValue, Query, QueryError};
use crate::models::CategoryTable;

/// Compile a query into a filter expression, or None when no constraint is
/// server-expressible.
pub fn compile_filter(
    query: &Query,
    categories: &CategoryTable,
) -> Result<Option<String>, QueryError> {
    compile_node(query, categories)
}

fn compile_node(query: &Query, table: &CategoryTable) -> Result<Option<String>, QueryError> {
    if let Some(children) = &query.and {
        return compile_group(children, " and ", table);
    }
    if let Some(children) = &query.or {
        return compile_group(children, " or ", table);
    }
    if let Some(child) = &query.not {
        // An empty child negates to nothing
        return Ok(compile_node(child, table)?.map(|expr| format!("not ({expr})")));
    }
    compile_leaf(query, table)
}

fn compile_group(
    children: &[Query],
    joiner: &str,
    table: &CategoryTable,
) -> Result<Option<String>, QueryError> {
    let mut parts = Vec::new();
    for child in children {
        if let Some(expr) = compile_node(child, table)? {
            parts.push(expr);
        }
    }
    Ok(join_exprs(parts, joiner))
}

/// Join expressions, dropping the parens for a singleton group
fn join_exprs(mut exprs: Vec<String>, joiner: &str) -> Option<String> {
    match exprs.len() {
        0 => None,
        1 => exprs.pop(),
        _ => Some(format!("({})", exprs.join(joiner))),
    }
}

fn compile_leaf(query: &Query, table: &CategoryTable) -> Result<Option<String>, QueryError> {
    let mut exprs = Vec::new();

    if let Some(value) = &query.from {
        value.validate("from")?;
        if let Some(expr) = compile_value(value, |v| Ok(sender_expr(v)))? {
            exprs.push(expr);
        }
    }
    for (field, name, property) in [
        (&query.to, "to", "toRecipients"),
        (&query.cc, "cc", "ccRecipients"),
        (&query.bcc, "bcc", "bccRecipients"),
    ] {
        if let Some(value) = field {
            value.validate(name)?;
            if let Some(expr) = compile_value(value, |v| Ok(recipient_expr(property, v)))? {
                exprs.push(expr);
            }
        }
    }
    if let Some(value) = &query.subject {
        value.validate("subject")?;
        if let Some(expr) = compile_value(value, |v| Ok(subject_expr(v)))? {
            exprs.push(expr);
        }
    }
    if let Some(value) = &query.categories {
        value.validate("categories")?;
        if let Some(expr) = compile_value(value, |v| {
            let canonical = table.normalize(v)?;
            Ok(Some(membership_expr(canonical.as_str())))
        })? {
            exprs.push(expr);
        }
    }
    if let Some(value) = &query.label {
        value.validate("label")?;
        if let Some(expr) = compile_value(value, |v| Ok(Some(membership_expr(v))))? {
            exprs.push(expr);
        }
    }
    if let Some(flag) = query.has_attachment {
        exprs.push(format!("hasAttachments eq {flag}"));
    }
    if let Some(range) = &query.date {
        if let Some(gte) = range.gte {
            exprs.push(format!("receivedDateTime ge {}", day_boundary(gte)));
        }
        if let Some(lt) = range.lt {
            exprs.push(format!("receivedDateTime lt {}", day_boundary(lt)));
        }
    }

    // importance, isRead and the content fields have no server-expressible
    // form in this grammar; the client predicate enforces them.
    Ok(join_exprs(exprs, " and "))
}

/// Apply operator semantics over a per-value expression builder.
///
/// The builder may itself decline a value (name-only address tokens), which
/// simply drops that value from the chain.
fn compile_value<F>(value: &FieldValue, build: F) -> Result<Option<String>, QueryError>
where
    F: Fn(&str) -> Result<Option<String>, QueryError>,
{
    match value {
        FieldValue::Value(v) => build(v),
        FieldValue::Op(op) => compile_operator(op, build),
    }
}

fn compile_operator<F>(op: &FieldOperator, build: F) -> Result<Option<String>, QueryError>
where
    F: Fn(&str) -> Result<Option<String>, QueryError>,
{
    let chain = |values: &[String], joiner: &str| -> Result<Option<String>, QueryError> {
        let mut parts = Vec::new();
        for value in values {
            if let Some(expr) = build(value)? {
                parts.push(expr);
            }
        }
        Ok(join_exprs(parts, joiner))
    };

    let mut clauses = Vec::new();
    if let Some(values) = &op.any
        && let Some(expr) = chain(values, " or ")?
    {
        clauses.push(expr);
    }
    if let Some(values) = &op.all
        && let Some(expr) = chain(values, " and ")?
    {
        clauses.push(expr);
    }
    if let Some(values) = &op.none
        && let Some(expr) = chain(values, " or ")?
    {
        clauses.push(format!("not ({expr})"));
    }
    Ok(join_exprs(clauses, " and "))
}

/// Sender comparison. Only address-shaped tokens are expressible; name-only
/// tokens defer to the client predicate.
fn sender_expr(value: &str) -> Option<String> {
    if !value.contains('@') {
        return None;
    }
    let escaped = escape_literal(&value.to_lowercase());
    Some(format!(
        "(from/emailAddress/address eq '{escaped}' or from/emailAddress/name eq '{escaped}')"
    ))
}

/// Collection membership over a recipient list, testing address or name on
/// any element.
fn recipient_expr(property: &str, value: &str) -> Option<String> {
    if !value.contains('@') {
        return None;
    }
    let escaped = escape_literal(&value.to_lowercase());
    Some(format!(
        "{property}/any(r: r/emailAddress/address eq '{escaped}' or r/emailAddress/name eq '{escaped}')"
    ))
}

/// Subject prefix match. The filter grammar has no contains(), and chokes on
/// hyphenated tokens, so short or hyphenated tokens defer to the predicate.
fn subject_expr(value: &str) -> Option<String> {
    if value.chars().count() < 3 || value.contains('-') {
        return None;
    }
    Some(format!("startswith(subject, '{}')", escape_literal(value)))
}

fn membership_expr(value: &str) -> String {
    format!("categories/any(c: c eq '{}')", escape_literal(value))
}

/// Midnight UTC at the given day, ISO-8601
fn day_boundary(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

/// Single-quote doubling for literals embedded in the filter grammar
fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
