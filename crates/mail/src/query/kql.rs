//! Full-text search compiler
//!
//! Translates the textual parts of a [`Query`] into a free-text search
//! expression for the remote text index. Clauses collected from different
//! logical branches are flattened and OR-joined; per-branch precision is
//! deliberately left to the client predicate, since the remote index is
//! approximate anyway.

use super::model::{FieldOperator, FieldValue, Query, QueryError};

/// Characters that must be backslash-escaped in a search clause
pub const KQL_SPECIALS: &[char] = &[
    '\\', ':', '(', ')', '{', '}', '[', ']', '"', '*', '?', '<', '>', '_',
];

/// Escaping rules for the remote search grammar.
///
/// Held as a value rather than consulted globally so tests can substitute
/// an alternate special-character table.
#[derive(Debug, Clone)]
pub struct KqlEscaper {
    specials: &'static [char],
}

impl KqlEscaper {
    pub fn standard() -> Self {
        Self {
            specials: KQL_SPECIALS,
        }
    }

    pub fn new(specials: &'static [char]) -> Self {
        Self { specials }
    }

    /// Backslash-escape every special character
    pub fn escape(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if self.specials.contains(&c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }

    /// Escape a clause value and quote it when it contains whitespace or
    /// any non-alphanumeric character
    pub fn clause(&self, value: &str) -> String {
        let escaped = self.escape(value);
        if value.chars().any(|c| !c.is_alphanumeric()) {
            format!("\"{escaped}\"")
        } else {
            escaped
        }
    }

    /// An exact phrase is always quoted
    pub fn phrase(&self, value: &str) -> String {
        format!("\"{}\"", self.escape(value))
    }
}

impl Default for KqlEscaper {
    fn default() -> Self {
        Self::standard()
    }
}

/// Compiled search expression plus the flags the executor needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledSearch {
    pub expression: Option<String>,
    /// True when a body/text leaf was visited; the predicate then needs body
    /// content to re-check those constraints
    pub require_body_client_filter: bool,
}

/// Whether the query carries full-text intent anywhere in its visited tree.
///
/// Follows the same visit as the compilers: a logical node recurses into its
/// children only, ignoring sibling leaf fields.
pub fn has_full_text_intent(query: &Query) -> bool {
    if let Some(children) = &query.and {
        return children.iter().any(has_full_text_intent);
    }
    if let Some(children) = &query.or {
        return children.iter().any(has_full_text_intent);
    }
    if let Some(child) = &query.not {
        return has_full_text_intent(child);
    }
    query.kql_query.is_some()
        || query.exact_phrase.is_some()
        || query.subject.is_some()
        || query.text.is_some()
        || query.body.is_some()
}

/// Compile the textual parts of a query into one search expression
pub fn compile_search(query: &Query, escaper: &KqlEscaper) -> Result<CompiledSearch, QueryError> {
    // Raw escape hatch: the first reachable kqlQuery wins verbatim and
    // short-circuits everything else
    if let Some(raw) = find_kql(query) {
        return Ok(CompiledSearch {
            expression: Some(raw.to_string()),
            require_body_client_filter: false,
        });
    }

    let mut clauses = Vec::new();
    let mut require_body = false;
    collect_clauses(query, escaper, &mut clauses, &mut require_body)?;

    Ok(CompiledSearch {
        expression: if clauses.is_empty() {
            None
        } else {
            Some(clauses.join(" OR "))
        },
        require_body_client_filter: require_body,
    })
}

fn find_kql(query: &Query) -> Option<&str> {
    if let Some(children) = &query.and {
        return children.iter().find_map(find_kql);
    }
    if let Some(children) = &query.or {
        return children.iter().find_map(find_kql);
    }
    if let Some(child) = &query.not {
        return find_kql(child);
    }
    query.kql_query.as_deref()
}

fn collect_clauses(
    query: &Query,
    escaper: &KqlEscaper,
    clauses: &mut Vec<String>,
    require_body: &mut bool,
) -> Result<(), QueryError> {
    if let Some(children) = &query.and {
        for child in children {
            collect_clauses(child, escaper, clauses, require_body)?;
        }
        return Ok(());
    }
    if let Some(children) = &query.or {
        for child in children {
            collect_clauses(child, escaper, clauses, require_body)?;
        }
        return Ok(());
    }
    if let Some(child) = &query.not {
        // Negate the whole branch as one clause; the predicate restores the
        // exact semantics
        let mut inner = Vec::new();
        collect_clauses(child, escaper, &mut inner, require_body)?;
        if let Some(group) = or_group(inner) {
            clauses.push(format!("NOT {group}"));
        }
        return Ok(());
    }

    if let Some(value) = &query.subject {
        value.validate("subject")?;
        if let Some(clause) = field_clause(value, escaper) {
            clauses.push(clause);
        }
    }
    if let Some(value) = &query.text {
        value.validate("text")?;
        *require_body = true;
        if let Some(clause) = field_clause(value, escaper) {
            clauses.push(clause);
        }
    }
    if let Some(value) = &query.body {
        value.validate("body")?;
        *require_body = true;
        if let Some(clause) = field_clause(value, escaper) {
            clauses.push(clause);
        }
    }
    if let Some(phrase) = &query.exact_phrase {
        if phrase.is_empty() {
            return Err(QueryError::EmptyValue {
                field: "exactPhrase",
            });
        }
        clauses.push(escaper.phrase(phrase));
    }
    Ok(())
}

fn field_clause(value: &FieldValue, escaper: &KqlEscaper) -> Option<String> {
    match value {
        FieldValue::Value(v) => Some(escaper.clause(v)),
        FieldValue::Op(op) => operator_clause(op, escaper),
    }
}

fn operator_clause(op: &FieldOperator, escaper: &KqlEscaper) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(values) = &op.any
        && let Some(group) = or_group(values.iter().map(|v| escaper.clause(v)).collect())
    {
        parts.push(group);
    }
    if let Some(values) = &op.all {
        let escaped: Vec<String> = values.iter().map(|v| escaper.clause(v)).collect();
        match escaped.len() {
            0 => {}
            1 => parts.push(escaped.into_iter().next().unwrap_or_default()),
            _ => parts.push(format!("({})", escaped.join(" AND "))),
        }
    }
    if let Some(values) = &op.none
        && let Some(group) = or_group(values.iter().map(|v| escaper.clause(v)).collect())
    {
        parts.push(format!("NOT {group}"));
    }
    match parts.len() {
        0 => None,
        1 => parts.into_iter().next(),
        _ => Some(format!("({})", parts.join(" AND "))),
    }
}

/// OR-group a clause list, collapsing singletons
fn or_group(mut clauses: Vec<String>) -> Option<String> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(format!("({})", clauses.join(" OR "))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(query: &Query) -> CompiledSearch {
        compile_search(query, &KqlEscaper::standard()).unwrap()
    }

    #[test]
    fn test_intent_detection() {
        let plain = Query {
            categories: Some("work".into()),
            ..Default::default()
        };
        assert!(!has_full_text_intent(&plain));

        let textual = Query {
            body: Some("invoice".into()),
            ..Default::default()
        };
        assert!(has_full_text_intent(&textual));

        let nested = Query {
            and: Some(vec![
                Query {
                    categories: Some("work".into()),
                    ..Default::default()
                },
                Query {
                    exact_phrase: Some("q3 numbers".to_string()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        assert!(has_full_text_intent(&nested));
    }

    #[test]
    fn test_intent_ignores_leaf_under_logical() {
        // Logical keys win: a subject sibling of $and is never compiled,
        // so it must not flip the query into full-text mode either
        let query = Query {
            and: Some(vec![Query {
                categories: Some("work".into()),
                ..Default::default()
            }]),
            subject: Some("ignored".into()),
            ..Default::default()
        };
        assert!(!has_full_text_intent(&query));
    }

    #[test]
    fn test_simple_subject_clause() {
        let query = Query {
            subject: Some("meeting".into()),
            ..Default::default()
        };
        let compiled = compile(&query);
        assert_eq!(compiled.expression.as_deref(), Some("meeting"));
        assert!(!compiled.require_body_client_filter);
    }

    #[test]
    fn test_body_sets_require_body() {
        let query = Query {
            body: Some("invoice".into()),
            ..Default::default()
        };
        assert!(compile(&query).require_body_client_filter);

        let query = Query {
            text: Some("invoice".into()),
            ..Default::default()
        };
        assert!(compile(&query).require_body_client_filter);
    }

    #[test]
    fn test_exact_phrase_always_quoted() {
        let query = Query {
            exact_phrase: Some("hello".to_string()),
            ..Default::default()
        };
        assert_eq!(compile(&query).expression.as_deref(), Some("\"hello\""));
    }

    #[test]
    fn test_whitespace_clause_quoted() {
        let query = Query {
            subject: Some("status report".into()),
            ..Default::default()
        };
        assert_eq!(
            compile(&query).expression.as_deref(),
            Some("\"status report\"")
        );
    }

    #[test]
    fn test_each_special_character_escaped() {
        let escaper = KqlEscaper::standard();
        for (raw, escaped) in [
            ("\\", "\\\\"),
            (":", "\\:"),
            ("(", "\\("),
            (")", "\\)"),
            ("{", "\\{"),
            ("}", "\\}"),
            ("[", "\\["),
            ("]", "\\]"),
            ("\"", "\\\""),
            ("*", "\\*"),
            ("?", "\\?"),
            ("<", "\\<"),
            (">", "\\>"),
            ("_", "\\_"),
        ] {
            assert_eq!(escaper.escape(raw), escaped, "escaping {raw:?}");
        }
    }

    #[test]
    fn test_special_clause_is_quoted_after_escaping() {
        let escaper = KqlEscaper::standard();
        assert_eq!(escaper.clause("re:plan"), "\"re\\:plan\"");
        assert_eq!(escaper.clause("plain"), "plain");
    }

    #[test]
    fn test_operator_groups() {
        let query = Query {
            subject: Some(FieldValue::Op(FieldOperator::any(["alpha", "beta"]))),
            ..Default::default()
        };
        assert_eq!(
            compile(&query).expression.as_deref(),
            Some("(alpha OR beta)")
        );

        let query = Query {
            body: Some(FieldValue::Op(FieldOperator::all(["alpha", "beta"]))),
            ..Default::default()
        };
        assert_eq!(
            compile(&query).expression.as_deref(),
            Some("(alpha AND beta)")
        );

        let query = Query {
            text: Some(FieldValue::Op(FieldOperator::none(["alpha", "beta"]))),
            ..Default::default()
        };
        assert_eq!(
            compile(&query).expression.as_deref(),
            Some("NOT (alpha OR beta)")
        );

        let query = Query {
            text: Some(FieldValue::Op(FieldOperator::none(["alpha"]))),
            ..Default::default()
        };
        assert_eq!(compile(&query).expression.as_deref(), Some("NOT alpha"));
    }

    #[test]
    fn test_branches_flattened_with_or() {
        let query = Query {
            and: Some(vec![
                Query {
                    subject: Some("alpha".into()),
                    ..Default::default()
                },
                Query {
                    body: Some("beta".into()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        // Precision across $and branches is not preserved here; the client
        // predicate restores it
        assert_eq!(compile(&query).expression.as_deref(), Some("alpha OR beta"));
    }

    #[test]
    fn test_kql_escape_hatch_verbatim() {
        let query = Query {
            and: Some(vec![Query {
                kql_query: Some("subject:(alpha OR beta)".to_string()),
                ..Default::default()
            }]),
            subject: Some("ignored".into()),
            ..Default::default()
        };
        let compiled = compile(&query);
        assert_eq!(
            compiled.expression.as_deref(),
            Some("subject:(alpha OR beta)")
        );
        assert!(!compiled.require_body_client_filter);
    }

    #[test]
    fn test_empty_value_fails() {
        let query = Query {
            subject: Some("".into()),
            ..Default::default()
        };
        assert!(compile_search(&query, &KqlEscaper::standard()).is_err());

        let query = Query {
            exact_phrase: Some(String::new()),
            ..Default::default()
        };
        assert!(compile_search(&query, &KqlEscaper::standard()).is_err());
    }

    #[test]
    fn test_not_branch_negates_group() {
        let query = Query {
            not: Some(Box::new(Query {
                subject: Some("spam".into()),
                ..Default::default()
            })),
            ..Default::default()
        };
        assert_eq!(compile(&query).expression.as_deref(), Some("NOT spam"));
    }

    #[test]
    fn test_compiler_is_deterministic() {
        let query = Query {
            or: Some(vec![
                Query {
                    subject: Some("alpha".into()),
                    ..Default::default()
                },
                Query {
                    exact_phrase: Some("beta gamma".to_string()),
                    ..Default::default()
                },
            ]),
            ..Default::default()
        };
        assert_eq!(compile(&query), compile(&query));
    }
}
