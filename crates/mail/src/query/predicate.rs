//! Client-side predicate evaluation
//!
//! Reproduces the exact intended semantics of every query field against a
//! fetched [`Message`], independent of whatever the remote filter or search
//! actually returned. The remote text index is approximate; this is the
//! source of truth during the scan loop.

use log::debug;

use super::model::{FieldValue, Query};
use crate::models::{CategoryTable, EmailAddress, Message};

/// A compiled boolean predicate over one message
#[derive(Debug, Clone)]
pub struct Predicate {
    query: Query,
    categories: CategoryTable,
}

impl Predicate {
    pub fn new(query: &Query) -> Self {
        Self::with_table(query, CategoryTable::standard())
    }

    pub fn with_table(query: &Query, categories: CategoryTable) -> Self {
        Self {
            query: query.clone(),
            categories,
        }
    }

    /// Evaluate the predicate. Pure; a node with no recognized constraint
    /// is vacuously true.
    pub fn matches(&self, message: &Message) -> bool {
        node_matches(&self.query, message, &self.categories)
    }
}

fn node_matches(query: &Query, message: &Message, table: &CategoryTable) -> bool {
    if let Some(children) = &query.and {
        return children.iter().all(|c| node_matches(c, message, table));
    }
    if let Some(children) = &query.or {
        return children.iter().any(|c| node_matches(c, message, table));
    }
    if let Some(child) = &query.not {
        return !node_matches(child, message, table);
    }
    leaf_matches(query, message, table)
}

fn leaf_matches(query: &Query, message: &Message, table: &CategoryTable) -> bool {
    if let Some(value) = &query.from {
        let hay = address_haystack(std::slice::from_ref(&message.from));
        if !eval_terms(value, |term| contains(&hay, term)) {
            return false;
        }
    }
    for (value, recipients) in [
        (&query.to, &message.to),
        (&query.cc, &message.cc),
        (&query.bcc, &message.bcc),
    ] {
        if let Some(value) = value {
            let hay = address_haystack(recipients);
            if !eval_terms(value, |term| contains(&hay, term)) {
                return false;
            }
        }
    }
    if let Some(value) = &query.subject {
        let hay = fold(&message.subject);
        if !eval_terms(value, |term| contains(&hay, term)) {
            return false;
        }
    }
    if let Some(value) = &query.body {
        let hay = body_haystack(message);
        if !eval_terms(value, |term| contains(&hay, term)) {
            return false;
        }
    }
    if let Some(value) = &query.text {
        let hay = full_haystack(message);
        if !eval_terms(value, |term| contains(&hay, term)) {
            return false;
        }
    }
    if let Some(phrase) = &query.exact_phrase {
        if !contains(&full_haystack(message), phrase) {
            return false;
        }
    }
    if let Some(value) = &query.categories {
        // A malformed term must not abort a page scan; it just never matches
        if !eval_terms(value, |term| match table.normalize(term) {
            Ok(canonical) => message
                .categories
                .iter()
                .any(|raw| raw.eq_ignore_ascii_case(canonical.as_str())),
            Err(err) => {
                debug!("Skipping category term during scan: {err}");
                false
            }
        }) {
            return false;
        }
    }
    if let Some(value) = &query.label {
        if !eval_terms(value, |term| message.categories.iter().any(|c| c == term)) {
            return false;
        }
    }
    if let Some(range) = &query.date {
        let Some(received) = message.received_at else {
            // Missing or unparsable timestamps never match a date range
            return false;
        };
        if let Some(gte) = range.gte
            && received < gte.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()).unwrap_or_default()
        {
            return false;
        }
        if let Some(lt) = range.lt
            && received >= lt.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()).unwrap_or_default()
        {
            return false;
        }
    }
    if let Some(importance) = query.importance
        && message.importance != importance
    {
        return false;
    }
    if let Some(is_read) = query.is_read
        && message.is_read != is_read
    {
        return false;
    }
    if let Some(has_attachment) = query.has_attachment
        && message.has_attachment != has_attachment
    {
        return false;
    }
    true
}

/// Apply operator semantics over a per-term test. All present clause types
/// must hold.
fn eval_terms<F>(value: &FieldValue, test: F) -> bool
where
    F: Fn(&str) -> bool,
{
    match value {
        FieldValue::Value(v) => test(v),
        FieldValue::Op(op) => {
            if let Some(terms) = &op.any
                && !terms.iter().any(|t| test(t))
            {
                return false;
            }
            if let Some(terms) = &op.all
                && !terms.iter().all(|t| test(t))
            {
                return false;
            }
            if let Some(terms) = &op.none
                && terms.iter().any(|t| test(t))
            {
                return false;
            }
            true
        }
    }
}

/// Case-insensitive, whitespace-collapsed substring containment
fn contains(haystack: &str, needle: &str) -> bool {
    haystack.contains(&fold(needle))
}

/// Lowercase and collapse runs of whitespace to single spaces
fn fold(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalized addresses and display names, independent of token shape
fn address_haystack(addresses: &[EmailAddress]) -> String {
    let mut parts = Vec::new();
    for addr in addresses {
        parts.push(fold(&addr.address));
        if let Some(name) = &addr.name {
            parts.push(fold(name));
        }
    }
    parts.join(" \u{1f}")
}

fn body_haystack(message: &Message) -> String {
    let mut hay = String::new();
    if let Some(body) = &message.body {
        hay.push_str(&fold(&body.content));
        hay.push(' ');
    }
    hay.push_str(&fold(&message.body_preview));
    hay
}

fn full_haystack(message: &Message) -> String {
    format!("{} {}", fold(&message.subject), body_haystack(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Importance, MessageBody, MessageId};
    use crate::query::model::{DateRange, FieldOperator};
    use chrono::{TimeZone, Utc};

    fn sample() -> Message {
        Message::builder(MessageId::new("m1"))
            .from(EmailAddress::with_name("Alice Smith", "alice@example.com"))
            .to(vec![EmailAddress::with_name("Bob Jones", "bob@example.com")])
            .subject("Quarterly   status report")
            .body(MessageBody::text("The invoice for Q3 is attached."))
            .body_preview("The invoice for Q3")
            .categories(vec!["Work".to_string(), "ProjectX".to_string()])
            .importance(Importance::High)
            .is_read(false)
            .has_attachment(true)
            .received_at(Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap())
            .build()
    }

    fn matches(query: Query) -> bool {
        Predicate::new(&query).matches(&sample())
    }

    #[test]
    fn test_empty_query_is_vacuously_true() {
        assert!(matches(Query::default()));
    }

    #[test]
    fn test_subject_containment_collapses_whitespace() {
        assert!(matches(Query {
            subject: Some("quarterly status".into()),
            ..Default::default()
        }));
        assert!(!matches(Query {
            subject: Some("annual".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_address_matches_name_without_at_sign() {
        // Unlike the remote filter, the predicate tests display names too
        assert!(matches(Query {
            from: Some("alice smith".into()),
            ..Default::default()
        }));
        assert!(matches(Query {
            from: Some("ALICE@EXAMPLE.COM".into()),
            ..Default::default()
        }));
        assert!(!matches(Query {
            from: Some("carol".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_recipient_matching() {
        assert!(matches(Query {
            to: Some("bob jones".into()),
            ..Default::default()
        }));
        assert!(!matches(Query {
            cc: Some("bob".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_body_and_text_fields() {
        assert!(matches(Query {
            body: Some("invoice".into()),
            ..Default::default()
        }));
        assert!(matches(Query {
            text: Some("status".into()),
            ..Default::default()
        }));
        assert!(!matches(Query {
            body: Some("status".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_exact_phrase_spans_sources() {
        assert!(matches(Query {
            exact_phrase: Some("invoice for q3".to_string()),
            ..Default::default()
        }));
        assert!(!matches(Query {
            exact_phrase: Some("invoice q3".to_string()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_operator_semantics() {
        assert!(matches(Query {
            subject: Some(FieldValue::Op(FieldOperator::any(["annual", "status"]))),
            ..Default::default()
        }));
        assert!(matches(Query {
            subject: Some(FieldValue::Op(FieldOperator::all(["quarterly", "report"]))),
            ..Default::default()
        }));
        assert!(!matches(Query {
            subject: Some(FieldValue::Op(FieldOperator::none(["report"]))),
            ..Default::default()
        }));
        // Coexisting clause types are independent AND-ed constraints
        assert!(!matches(Query {
            subject: Some(FieldValue::Op(FieldOperator {
                any: Some(vec!["status".to_string()]),
                none: Some(vec!["quarterly".to_string()]),
                ..Default::default()
            })),
            ..Default::default()
        }));
    }

    #[test]
    fn test_categories_normalized_and_lenient() {
        assert!(matches(Query {
            categories: Some("WORK".into()),
            ..Default::default()
        }));
        // Invalid term never matches but never raises either
        assert!(!matches(Query {
            categories: Some("bogus".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_label_is_case_sensitive() {
        assert!(matches(Query {
            label: Some("ProjectX".into()),
            ..Default::default()
        }));
        assert!(!matches(Query {
            label: Some("projectx".into()),
            ..Default::default()
        }));
    }

    #[test]
    fn test_date_range_bounds() {
        let gte = |y, m, d| DateRange {
            gte: chrono::NaiveDate::from_ymd_opt(y, m, d),
            lt: None,
        };
        let lt = |y, m, d| DateRange {
            gte: None,
            lt: chrono::NaiveDate::from_ymd_opt(y, m, d),
        };
        // Received 2024-06-15: lower bound is inclusive at the day boundary
        assert!(matches(Query {
            date: Some(gte(2024, 6, 15)),
            ..Default::default()
        }));
        assert!(!matches(Query {
            date: Some(gte(2024, 6, 16)),
            ..Default::default()
        }));
        // Upper bound is exclusive
        assert!(!matches(Query {
            date: Some(lt(2024, 6, 15)),
            ..Default::default()
        }));
        assert!(matches(Query {
            date: Some(lt(2024, 6, 16)),
            ..Default::default()
        }));
    }

    #[test]
    fn test_missing_timestamp_never_matches_dates() {
        let mut message = sample();
        message.received_at = None;
        let query = Query {
            date: Some(DateRange {
                gte: chrono::NaiveDate::from_ymd_opt(2000, 1, 1),
                lt: None,
            }),
            ..Default::default()
        };
        assert!(!Predicate::new(&query).matches(&message));
    }

    #[test]
    fn test_flag_equality() {
        assert!(matches(Query {
            importance: Some(Importance::High),
            is_read: Some(false),
            has_attachment: Some(true),
            ..Default::default()
        }));
        assert!(!matches(Query {
            importance: Some(Importance::Low),
            ..Default::default()
        }));
    }

    #[test]
    fn test_logical_composition_mirrors_tree() {
        assert!(matches(Query {
            and: Some(vec![
                Query {
                    subject: Some("report".into()),
                    ..Default::default()
                },
                Query {
                    not: Some(Box::new(Query {
                        categories: Some("travel".into()),
                        ..Default::default()
                    })),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }));
        assert!(!matches(Query {
            or: Some(vec![
                Query {
                    subject: Some("annual".into()),
                    ..Default::default()
                },
                Query {
                    is_read: Some(true),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        }));
    }

    #[test]
    fn test_logical_wins_over_sibling_leaves() {
        // The subject sibling would fail, but $and is present so it is ignored
        assert!(matches(Query {
            and: Some(vec![Query {
                has_attachment: Some(true),
                ..Default::default()
            }]),
            subject: Some("does-not-appear".into()),
            ..Default::default()
        }));
    }
}
