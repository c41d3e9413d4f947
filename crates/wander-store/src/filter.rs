use serde_json::Value;

use crate::backend::Row;

/// Predicate AST for store queries.
///
/// Covers the shapes the app issues: plain equality, "one of a set",
/// case-insensitive prefix search (username lookup), and the OR-of-AND
/// groups used for "either direction" pair checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, String),
    Ne(String, String),
    In(String, Vec<String>),
    PrefixIgnoreCase(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    pub fn ne(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Ne(column.into(), value.into())
    }

    pub fn one_of<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    /// Case-insensitive prefix match on a string column.
    pub fn prefix(column: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::PrefixIgnoreCase(column.into(), prefix.into())
    }

    pub fn and(parts: impl IntoIterator<Item = Filter>) -> Self {
        Self::And(parts.into_iter().collect())
    }

    pub fn or(parts: impl IntoIterator<Item = Filter>) -> Self {
        Self::Or(parts.into_iter().collect())
    }

    /// Evaluate against a row. A missing or non-string column never matches.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq(col, want) => str_col(row, col) == Some(want.as_str()),
            Self::Ne(col, want) => str_col(row, col).is_some_and(|v| v != want),
            Self::In(col, set) => str_col(row, col).is_some_and(|v| set.iter().any(|s| s == v)),
            Self::PrefixIgnoreCase(col, prefix) => str_col(row, col)
                .is_some_and(|v| v.to_lowercase().starts_with(&prefix.to_lowercase())),
            Self::And(parts) => parts.iter().all(|f| f.matches(row)),
            Self::Or(parts) => parts.iter().any(|f| f.matches(row)),
        }
    }
}

fn str_col<'a>(row: &'a Row, col: &str) -> Option<&'a str> {
    row.get(col).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn eq_and_ne() {
        let r = row(serde_json::json!({ "id": "u1", "username": "alice" }));
        assert!(Filter::eq("id", "u1").matches(&r));
        assert!(!Filter::eq("id", "u2").matches(&r));
        assert!(Filter::ne("id", "u2").matches(&r));
        assert!(!Filter::ne("id", "u1").matches(&r));
    }

    #[test]
    fn missing_column_never_matches() {
        let r = row(serde_json::json!({ "id": "u1" }));
        assert!(!Filter::eq("username", "alice").matches(&r));
        assert!(!Filter::ne("username", "alice").matches(&r));
        assert!(!Filter::prefix("username", "a").matches(&r));
    }

    #[test]
    fn prefix_is_case_insensitive() {
        let r = row(serde_json::json!({ "username": "Alice" }));
        assert!(Filter::prefix("username", "al").matches(&r));
        assert!(Filter::prefix("username", "ALI").matches(&r));
        assert!(!Filter::prefix("username", "li").matches(&r));
    }

    #[test]
    fn or_of_and_matches_either_direction() {
        let pair = Filter::or([
            Filter::and([Filter::eq("from", "a"), Filter::eq("to", "b")]),
            Filter::and([Filter::eq("from", "b"), Filter::eq("to", "a")]),
        ]);
        assert!(pair.matches(&row(serde_json::json!({ "from": "a", "to": "b" }))));
        assert!(pair.matches(&row(serde_json::json!({ "from": "b", "to": "a" }))));
        assert!(!pair.matches(&row(serde_json::json!({ "from": "a", "to": "c" }))));
    }

    #[test]
    fn one_of_matches_set_membership() {
        let f = Filter::one_of("id", ["u1", "u3"]);
        assert!(f.matches(&row(serde_json::json!({ "id": "u1" }))));
        assert!(!f.matches(&row(serde_json::json!({ "id": "u2" }))));
    }
}
