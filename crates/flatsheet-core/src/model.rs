//! Request and response types for sheet operations.
//!
//! Requests are tagged by `op` (`{"op": "set", "cell": "A1", "value": "3"}`);
//! response fields are camelCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One operation against a sheet instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Request {
    View {
        range: Option<String>,
    },
    Get {
        cell: String,
    },
    Set {
        cell: String,
        value: String,
    },
    Add {
        values: BTreeMap<String, String>,
    },
    Remove {
        row: usize,
    },
    Update {
        row: usize,
        values: BTreeMap<String, String>,
    },
    Query {
        #[serde(rename = "where")]
        condition: String,
        limit: Option<usize>,
    },
    Sort {
        column: String,
        #[serde(default)]
        order: SortOrder,
    },
    Fill {
        range: String,
        pattern: String,
    },
    Schema,
    Resize {
        rows: Option<usize>,
        cols: Option<usize>,
    },
    Ingest {
        file: Option<PathBuf>,
        csv: Option<String>,
    },
    Dump {
        file: Option<PathBuf>,
    },
    Clear {
        range: Option<String>,
    },
    Rename {
        column: String,
        name: String,
    },
    Recalculate,
}

impl Request {
    /// Operation name as it appears in the `op` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Request::View { .. } => "view",
            Request::Get { .. } => "get",
            Request::Set { .. } => "set",
            Request::Add { .. } => "add",
            Request::Remove { .. } => "remove",
            Request::Update { .. } => "update",
            Request::Query { .. } => "query",
            Request::Sort { .. } => "sort",
            Request::Fill { .. } => "fill",
            Request::Schema => "schema",
            Request::Resize { .. } => "resize",
            Request::Ingest { .. } => "ingest",
            Request::Dump { .. } => "dump",
            Request::Clear { .. } => "clear",
            Request::Rename { .. } => "rename",
            Request::Recalculate => "recalculate",
        }
    }

    /// Whether the operation changes the sheet (and is therefore saved).
    pub fn is_mutating(&self) -> bool {
        !matches!(
            self,
            Request::View { .. }
                | Request::Get { .. }
                | Request::Query { .. }
                | Request::Schema
                | Request::Dump { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Rendered view of the grid or a range. Also the snapshot returned by every
/// mutating operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    pub table: String,
    pub data: Vec<Vec<String>>,
    pub headers: Vec<String>,
    pub rows: usize,
    pub cols: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetResponse {
    pub cell: String,
    pub value: String,
    pub formula: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub table: String,
    pub data: Vec<Vec<String>>,
    pub headers: Vec<String>,
    /// 1-indexed row numbers of the matches.
    pub rows: Vec<usize>,
    pub match_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Empty,
    Number,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSchema {
    pub column: String,
    pub header: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub non_empty: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DumpResponse {
    Written { message: String, file: PathBuf },
    Csv { csv: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    View(ViewResponse),
    Get(GetResponse),
    Query(QueryResponse),
    Schema(SchemaResponse),
    Dump(DumpResponse),
}

/// Sent to subscribers after a mutating operation has been saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetChange {
    pub instance: String,
    pub operation: String,
}
