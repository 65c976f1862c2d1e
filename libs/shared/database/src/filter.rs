use std::cmp::Ordering;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Equality filter over document fields.
///
/// A document matches when every clause holds and, if alternatives are
/// present, at least one alternative matches as well.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
    any_of: Vec<Filter>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: &str) -> Self {
        Self::new().eq("id", id)
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn any_of(mut self, alternatives: Vec<Filter>) -> Self {
        self.any_of.extend(alternatives);
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn alternatives(&self) -> &[Filter] {
        &self.any_of
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty() && self.any_of.is_empty()
    }

    pub fn matches(&self, document: &Value) -> bool {
        let clauses_hold = self.clauses.iter().all(|(field, expected)| {
            document
                .get(field)
                .map(|actual| loosely_equal(actual, expected))
                .unwrap_or(false)
        });

        clauses_hold
            && (self.any_of.is_empty() || self.any_of.iter().any(|alt| alt.matches(document)))
    }

    /// Render as PostgREST query pairs (`field=eq.value`, `or=(and(...),...)`).
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .clauses
            .iter()
            .map(|(field, value)| (field.clone(), format!("eq.{}", plain_value(value))))
            .collect();

        if !self.any_of.is_empty() {
            let alternatives: Vec<String> = self.any_of.iter().map(Filter::to_logic_tree).collect();
            pairs.push(("or".to_string(), format!("({})", alternatives.join(","))));
        }

        pairs
    }

    fn to_logic_tree(&self) -> String {
        let mut parts: Vec<String> = self
            .clauses
            .iter()
            .map(|(field, value)| format!("{}.eq.{}", field, quoted_value(value)))
            .collect();

        if !self.any_of.is_empty() {
            let alternatives: Vec<String> = self.any_of.iter().map(Filter::to_logic_tree).collect();
            parts.push(format!("or({})", alternatives.join(",")));
        }

        format!("and({})", parts.join(","))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<(String, SortOrder)>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort.push((field.into(), SortOrder::Asc));
        self
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort.push((field.into(), SortOrder::Desc));
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if !self.sort.is_empty() {
            let order: Vec<String> = self
                .sort
                .iter()
                .map(|(field, dir)| format!("{}.{}", field, dir.as_str()))
                .collect();
            pairs.push(("order".to_string(), order.join(",")));
        }
        if let Some(skip) = self.skip {
            pairs.push(("offset".to_string(), skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }

        pairs
    }

    /// Compare two documents by the configured sort keys.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for (field, dir) in &self.sort {
            let ord = compare_values(
                a.get(field).unwrap_or(&Value::Null),
                b.get(field).unwrap_or(&Value::Null),
            );
            let ord = match dir {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCount {
    pub key: Value,
    pub count: u64,
}

/// Equal values, or a number and a string with the same textual form
/// (ids may be numeric in imported catalogs but arrive as path strings).
pub fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => a == b,
    }
}

/// Total order used for in-memory sorting. Missing/null sorts first and
/// RFC 3339 timestamps compare chronologically.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => {
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn plain_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clauses_and_alternatives() {
        let filter = Filter::new().eq("doctor_id", "d1").any_of(vec![
            Filter::new().eq("status", "confirmed"),
            Filter::new().eq("status", "pending"),
        ]);

        assert!(filter.matches(&json!({"doctor_id": "d1", "status": "pending"})));
        assert!(!filter.matches(&json!({"doctor_id": "d1", "status": "cancelled"})));
        assert!(!filter.matches(&json!({"doctor_id": "d2", "status": "confirmed"})));
        assert!(!filter.matches(&json!({"status": "confirmed"})));
    }

    #[test]
    fn numeric_ids_match_string_lookups() {
        assert!(Filter::by_id("7").matches(&json!({"id": 7})));
        assert!(!Filter::by_id("8").matches(&json!({"id": 7})));
    }

    #[test]
    fn renders_postgrest_query() {
        let filter = Filter::new().any_of(vec![
            Filter::new().eq("sender_id", "a").eq("receiver_id", "b"),
            Filter::new().eq("sender_id", "b").eq("receiver_id", "a"),
        ]);
        assert_eq!(
            filter.to_query_pairs(),
            vec![(
                "or".to_string(),
                "(and(sender_id.eq.\"a\",receiver_id.eq.\"b\"),and(sender_id.eq.\"b\",receiver_id.eq.\"a\"))"
                    .to_string()
            )]
        );

        let options = FindOptions::new().sort_desc("timestamp").skip(20).limit(20);
        assert_eq!(
            options.to_query_pairs(),
            vec![
                ("order".to_string(), "timestamp.desc".to_string()),
                ("offset".to_string(), "20".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn timestamps_compare_chronologically() {
        let earlier = json!("2025-01-10T10:00:00Z");
        let later = json!("2025-01-10T10:00:00.5Z");
        assert_eq!(compare_values(&earlier, &later), Ordering::Less);
    }
}
