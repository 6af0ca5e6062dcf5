use serde::{Deserialize, Serialize};
use std::fmt;

/// A flat keyed row as exchanged with the remote store
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Text form of a record value: null is empty, strings are unquoted
pub fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Named collections in the remote store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Projects,
    Activities,
    Beneficiaries,
    Indicators,
    Partners,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Projects,
        Collection::Activities,
        Collection::Beneficiaries,
        Collection::Indicators,
        Collection::Partners,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Activities => "activities",
            Collection::Beneficiaries => "beneficiaries",
            Collection::Indicators => "indicators",
            Collection::Partners => "partners",
        }
    }

    /// Entity name used in messages and not-found errors
    pub fn entity_name(&self) -> &'static str {
        match self {
            Collection::Projects => "Project",
            Collection::Activities => "Activity",
            Collection::Beneficiaries => "Beneficiary",
            Collection::Indicators => "Indicator",
            Collection::Partners => "Partner",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Equality condition on a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqFilter {
    pub field: String,
    pub value: String,
}

/// Case-insensitive substring match over several text fields, OR-combined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSearch {
    pub fields: Vec<String>,
    pub term: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Query for `RepositoryClient::list`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    pub equals: Vec<EqFilter>,
    pub search: Option<TextSearch>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl ToString) -> Self {
        self.equals.push(EqFilter {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Blank terms are ignored
    pub fn search(mut self, fields: &[&str], term: &str) -> Self {
        let term = term.trim();
        if !term.is_empty() {
            self.search = Some(TextSearch {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                term: term.to_string(),
            });
        }
        self
    }

    pub fn order_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.order = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Outcome of one fetch in a concurrent batch; failures stay local to their slot
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Fetched<T> {
    Loaded(T),
    Failed(String),
}

impl<T> Fetched<T> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Fetched::Loaded(_))
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            Fetched::Loaded(value) => Some(value),
            Fetched::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Fetched::Loaded(_) => None,
            Fetched::Failed(message) => Some(message),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Loaded(value) => Some(value),
            Fetched::Failed(_) => None,
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Fetched<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Fetched::Loaded(value),
            Err(err) => Fetched::Failed(err.to_string()),
        }
    }
}

impl<T: Default + Clone> Fetched<T> {
    /// The loaded value, or an empty default for a gap
    pub fn value_or_default(&self) -> T {
        self.loaded().cloned().unwrap_or_default()
    }
}
