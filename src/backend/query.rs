use std::cmp::Ordering;

use serde_json::Value;

use super::{Document, CREATED_AT_FIELD, UPDATED_AT_FIELD};

/// A single attribute predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Scalar attribute equals one of `values`, or array attribute contains one of them.
    Equal { field: String, values: Vec<Value> },
}

impl Filter {
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::Equal { field, values } => match doc.get(field) {
                Some(Value::Array(items)) => items.iter().any(|item| values.contains(item)),
                Some(value) => values.contains(&value),
                None => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Order {
    Asc(String),
    Desc(String),
}

/// Filters plus an optional ordering, built fluently:
///
/// ```
/// use devfeed::backend::Query;
/// let q = Query::new().equal("tags", ["trend"]).order_desc("shareCount");
/// assert_eq!(q.filters.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equal<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filters.push(Filter::Equal {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order_asc(mut self, field: &str) -> Self {
        self.order = Some(Order::Asc(field.to_string()));
        self
    }

    pub fn order_desc(mut self, field: &str) -> Self {
        self.order = Some(Order::Desc(field.to_string()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Filter then stable-sort `docs`. Ties keep their incoming order and
    /// documents missing the sort attribute go last in either direction.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut matched: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some(order) = &self.order {
            let (field, descending) = match order {
                Order::Asc(field) => (field.as_str(), false),
                Order::Desc(field) => (field.as_str(), true),
            };
            matched.sort_by(|a, b| compare_docs(a, b, field, descending));
        }

        matched
    }
}

fn compare_docs(a: &Document, b: &Document, field: &str, descending: bool) -> Ordering {
    let ordering = match field {
        CREATED_AT_FIELD => a.created_at.cmp(&b.created_at),
        UPDATED_AT_FIELD => a.updated_at.cmp(&b.updated_at),
        _ => match (a.get(field), b.get(field)) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(x), Some(y)) => compare_values(&x, &y),
        },
    };

    if descending {
        ordering.reverse()
    } else {
        ordering
    }
}

/// Values of different types order by type first: numbers, strings, booleans,
/// then everything else.
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Number(_) => 0,
        Value::String(_) => 1,
        Value::Bool(_) => 2,
        Value::Null | Value::Array(_) | Value::Object(_) => 3,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
