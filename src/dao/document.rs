use std::cmp::Ordering;

use serde_json::{Map, Value};

/// A schemaless record: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Equality filters, optional ordering, and optional limit applied when
/// listing a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep documents whose `field` equals `value`. Filters combine with AND.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the document satisfies every equality filter.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// Filter, order, and truncate documents in memory.
    ///
    /// Backends without native support for part of a query fall back to this.
    pub fn apply(&self, documents: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut selected: Vec<Document> = documents
            .into_iter()
            .filter(|document| self.matches(document))
            .collect();

        if let Some((field, direction)) = &self.order {
            selected.sort_by(|a, b| {
                let ordering = compare_values(a.get(field), b.get(field));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        selected
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over optional JSON values: missing/null, booleans, numbers,
/// strings, then arrays and objects (which compare equal among themselves).
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn names(documents: &[Document]) -> Vec<&str> {
        documents
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect()
    }

    #[test]
    fn filters_orders_and_limits() {
        let documents = vec![
            doc(json!({"name": "a", "exam": "x", "score": 3})),
            doc(json!({"name": "b", "exam": "y", "score": 9})),
            doc(json!({"name": "c", "exam": "x", "score": 7})),
            doc(json!({"name": "d", "exam": "x"})),
        ];

        let query = Query::new()
            .where_eq("exam", "x")
            .order_by("score", Direction::Descending)
            .limit(2);
        assert_eq!(names(&query.apply(documents.clone())), vec!["c", "a"]);

        let ascending = Query::new().order_by("score", Direction::Ascending);
        assert_eq!(names(&ascending.apply(documents)), vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn ordering_is_stable_for_equal_keys() {
        let documents = vec![
            doc(json!({"name": "first", "score": 1})),
            doc(json!({"name": "second", "score": 1})),
        ];
        let query = Query::new().order_by("score", Direction::Descending);
        assert_eq!(names(&query.apply(documents)), vec!["first", "second"]);
    }

    #[test]
    fn mixed_numbers_compare_numerically() {
        assert_eq!(
            compare_values(Some(&json!(2)), Some(&json!(2.5))),
            Ordering::Less
        );
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!(10))),
            Ordering::Greater
        );
    }
}
