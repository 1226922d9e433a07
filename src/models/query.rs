use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::DbType;

/// Query form payload for `/query/execute`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub db_type: DbType,
}

/// AI optimization suggestion returned alongside query results.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptimizationDetails {
    #[serde(default)]
    pub original_query: String,
    #[serde(default)]
    pub optimized_query: String,
    #[serde(default)]
    pub explanation: String,
}

/// Response from `/query/execute`. Result rows are opaque JSON objects;
/// no local schema validation is performed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Value>,
    #[serde(default)]
    pub optimization_details: Option<OptimizationDetails>,
}

impl QueryResponse {
    /// Column names for the results table, drawn from the first row's
    /// keys. Rows with extra keys lose them in the display.
    pub fn columns(&self) -> Vec<String> {
        match self.results.first().and_then(Value::as_object) {
            Some(obj) => obj.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Cell text for a row/column pair. Strings are shown bare; other
    /// values are JSON-encoded.
    pub fn cell(row: &Value, column: &str) -> String {
        match row.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_payload() {
        let req = QueryRequest {
            query: "SELECT * FROM users".to_string(),
            db_type: DbType::MySql,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["query"], "SELECT * FROM users");
        assert_eq!(json["db_type"], "mysql");
    }

    #[test]
    fn test_response_parses_backend_shape() {
        let json = r#"{
            "results": [
                {"name": "Ada", "age": 36},
                {"name": "Grace", "age": 45}
            ],
            "optimization_details": {
                "original_query": "SELECT * FROM users",
                "optimized_query": "SELECT name, age FROM users",
                "explanation": "Project only the needed columns."
            }
        }"#;
        let resp: QueryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.results.len(), 2);
        let opt = resp.optimization_details.unwrap();
        assert_eq!(opt.optimized_query, "SELECT name, age FROM users");
    }

    #[test]
    fn test_columns_from_first_row() {
        let resp: QueryResponse =
            serde_json::from_str(r#"{"results": [{"a": 1, "b": "x"}]}"#).unwrap();
        let mut cols = resp.columns();
        cols.sort();
        assert_eq!(cols, vec!["a", "b"]);

        let empty = QueryResponse::default();
        assert!(empty.columns().is_empty());
    }

    #[test]
    fn test_cell_rendering() {
        let row: Value = serde_json::from_str(r#"{"s": "text", "n": 7, "o": {"k": 1}}"#).unwrap();
        assert_eq!(QueryResponse::cell(&row, "s"), "text");
        assert_eq!(QueryResponse::cell(&row, "n"), "7");
        assert_eq!(QueryResponse::cell(&row, "o"), "{\"k\":1}");
        assert_eq!(QueryResponse::cell(&row, "missing"), "");
    }
}
