use std::fmt;

use serde::{Deserialize, Serialize};

/// Primitive column types recoverable from a text table dump.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::String => write!(f, "string"),
            ColumnType::Number => write!(f, "number"),
            ColumnType::Boolean => write!(f, "boolean"),
        }
    }
}

/// One column descriptor in a result schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    /// A provisional column: typed string, non-nullable, as every column is
    /// until inference runs.
    pub fn provisional(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column_type: ColumnType::String,
            nullable: false,
        }
    }
}

/// A typed cell value parsed out of the table dump.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Number(n) => write!(f, "{:?}", n),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One result row, positionally aligned with the schema.
pub type Row = Vec<Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_display() {
        assert_eq!(ColumnType::String.to_string(), "string");
        assert_eq!(ColumnType::Number.to_string(), "number");
        assert_eq!(ColumnType::Boolean.to_string(), "boolean");
    }

    #[test]
    fn test_provisional_column() {
        let col = Column::provisional("user_id");
        assert_eq!(col.name, "user_id");
        assert_eq!(col.column_type, ColumnType::String);
        assert!(!col.nullable);
    }

    #[test]
    fn test_column_serde_uses_type_key() {
        let col = Column::provisional("a");
        let json = serde_json::to_value(&col).expect("serialize");
        assert_eq!(json["type"], "string");
        assert_eq!(json["name"], "a");
        assert_eq!(json["nullable"], false);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Text("x".to_string()).to_string(), "x");
        assert_eq!(Value::Number(3.0).to_string(), "3.0");
        assert_eq!(Value::Number(0.5).to_string(), "0.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_value_serializes_untagged() {
        let row: Row = vec![
            Value::Number(1.0),
            Value::Bool(true),
            Value::Text("x".to_string()),
        ];
        let json = serde_json::to_string(&row).expect("serialize");
        assert_eq!(json, r#"[1.0,true,"x"]"#);
    }
}
