//! Data-source descriptors.
//!
//! Connections are not opened. Each kind carries a fixed sample schema that
//! is shown to the model when building insight prompts.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of connected data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataSourceKind {
    /// Uploaded spreadsheet (.xlsx or .csv).
    Excel,
    /// PostgreSQL database.
    Postgres,
    /// MySQL database.
    Mysql,
    /// Google BigQuery dataset.
    BigQuery,
}

/// Unknown data-source kind string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown data source type: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for DataSourceKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EXCEL" => Ok(Self::Excel),
            "POSTGRES" | "POSTGRESQL" => Ok(Self::Postgres),
            "MYSQL" => Ok(Self::Mysql),
            "BIGQUERY" => Ok(Self::BigQuery),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Excel => "EXCEL",
            Self::Postgres => "POSTGRES",
            Self::Mysql => "MYSQL",
            Self::BigQuery => "BIGQUERY",
        };
        f.write_str(name)
    }
}

impl DataSourceKind {
    /// Whether this kind is a database connection rather than a file.
    pub fn is_database(self) -> bool {
        !matches!(self, Self::Excel)
    }

    /// The sample schema used for this kind, as compact JSON.
    pub fn mock_schema(self) -> String {
        let schema = if self.is_database() {
            json!({
                "tables": [
                    {
                        "name": "users",
                        "columns": [
                            {"name": "id", "type": "Integer"},
                            {"name": "email", "type": "String"}
                        ]
                    },
                    {
                        "name": "orders",
                        "columns": [
                            {"name": "id", "type": "Integer"},
                            {"name": "amount", "type": "Decimal"},
                            {"name": "user_id", "type": "Integer"}
                        ]
                    }
                ]
            })
        } else {
            json!({
                "tables": [{
                    "name": "Sheet1",
                    "columns": [
                        {"name": "Date", "type": "Date"},
                        {"name": "Revenue", "type": "Number"},
                        {"name": "Region", "type": "String"},
                        {"name": "Product", "type": "String"}
                    ]
                }]
            })
        };
        schema.to_string()
    }
}

/// A connected data source as seen by the AI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Display name (e.g. "Sales DB Production").
    pub name: String,
    /// Source kind.
    #[serde(rename = "type")]
    pub kind: DataSourceKind,
    /// Schema as a JSON string.
    pub schema: String,
}

impl DataSource {
    /// Creates a data source carrying the sample schema for `kind`.
    pub fn with_mock_schema(name: impl Into<String>, kind: DataSourceKind) -> Self {
        Self { name: name.into(), kind, schema: kind.mock_schema() }
    }
}
