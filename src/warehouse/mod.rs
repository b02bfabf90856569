pub mod data_api;
pub mod ddl;
pub mod executor;

use std::error::Error;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WarehouseConfig;

/// Status of a submitted statement as reported by the warehouse service.
/// The service reports several pre-execution states; everything that is not
/// terminal collapses to the same handling in the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryStatus {
    Submitted,
    #[serde(alias = "PICKED", alias = "STARTED")]
    Running,
    Finished,
    Aborted,
    Failed,
}

impl QueryStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryStatus::Finished | QueryStatus::Aborted | QueryStatus::Failed
        )
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryStatus::Submitted => "SUBMITTED",
            QueryStatus::Running => "RUNNING",
            QueryStatus::Finished => "FINISHED",
            QueryStatus::Aborted => "ABORTED",
            QueryStatus::Failed => "FAILED",
        };
        write!(f, "{}", s)
    }
}

/// A single value in a result row, tagged by type the way the warehouse
/// service tags it on the wire (`{"stringValue": "x"}`, `{"longValue": 3}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Cell {
    StringValue(String),
    LongValue(i64),
    DoubleValue(f64),
    BooleanValue(bool),
    IsNull(bool),
}

impl Cell {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::StringValue(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Cell::LongValue(n) => Some(*n),
            _ => None,
        }
    }
}

/// Column names plus rows, as fetched after a statement finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ResultSet {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Looks a cell up by column name rather than position, so a change in
    /// column order in the source query cannot silently shift fields.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

/// A named parameter bound server-side, never interpolated into SQL text.
#[derive(Debug, Clone, Serialize)]
pub struct SqlParameter {
    pub name: String,
    pub value: String,
}

impl SqlParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Everything needed to submit one statement. Immutable once submitted.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub sql: String,
    pub database: String,
    pub workgroup: Option<String>,
    pub cluster_id: Option<String>,
    pub db_user: Option<String>,
    pub secret_arn: String,
    pub parameters: Vec<SqlParameter>,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>, config: &WarehouseConfig) -> Self {
        Self {
            sql: sql.into(),
            database: config.database_name.clone(),
            workgroup: config.workgroup.clone(),
            cluster_id: config.cluster_id.clone(),
            db_user: config.db_user.clone(),
            secret_arn: config.secret_arn.clone(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(SqlParameter::new(name, value));
        self
    }
}

#[derive(Debug)]
pub enum WarehouseError {
    /// The HTTP round trip itself failed.
    Transport(String),
    /// The service answered, but not with anything we could decode.
    Protocol(String),
    /// The statement reached a terminal status other than FINISHED.
    StatementFailed {
        execution_id: String,
        status: QueryStatus,
        detail: String,
    },
}

impl fmt::Display for WarehouseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarehouseError::Transport(msg) => write!(f, "warehouse transport error: {}", msg),
            WarehouseError::Protocol(msg) => write!(f, "warehouse protocol error: {}", msg),
            WarehouseError::StatementFailed {
                execution_id,
                status,
                detail,
            } => write!(
                f,
                "statement {} ended with status {}: {}",
                execution_id, status, detail
            ),
        }
    }
}

impl Error for WarehouseError {}

/// Narrow interface over the warehouse query service. The real client speaks
/// the data API over HTTP; tests substitute an in-memory fake.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Submits a statement and returns the service-assigned execution id.
    async fn submit(&self, request: &QueryRequest) -> Result<String, WarehouseError>;

    async fn status(&self, execution_id: &str) -> Result<QueryStatus, WarehouseError>;

    /// Column labels, valid only once the statement is FINISHED.
    async fn columns(&self, execution_id: &str) -> Result<Vec<String>, WarehouseError>;

    /// All rows in one fetch. Large paginated results are truncated to the
    /// first page, a known limitation.
    async fn rows(&self, execution_id: &str) -> Result<Vec<Vec<Cell>>, WarehouseError>;

    /// Remote error text for a failed statement.
    async fn error_detail(&self, execution_id: &str) -> Result<String, WarehouseError>;
}
