//! Dialect-neutral row types.
//!
//! Capability queries return these flat rows regardless of the backend; the
//! extraction layer groups them into the `schemalens-core` schema model.
//! Dialect-specific query text stays inside each provider implementation.

use schemalens_core::ObjectKind;
use serde::{Deserialize, Serialize};

use crate::ProviderError;

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Microsoft SQL Server
    SqlServer,
    /// PostgreSQL
    Postgres,
    /// MySQL / MariaDB
    Mysql,
    /// SQLite
    Sqlite,
}

impl Dialect {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::SqlServer => "sqlserver",
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Dialect {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlserver" | "mssql" | "sql-server" => Ok(Self::SqlServer),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::Mysql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(ProviderError::UnsupportedDialect(other.to_string())),
        }
    }
}

/// Result of a raw `execute_query` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRows {
    /// Column names in select order
    pub columns: Vec<String>,

    /// Row values; `serde_json::Value` is the neutral cell type
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// One base table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    pub schema: String,
    pub name: String,
}

/// One table column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRow {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// 1-based ordinal position
    pub ordinal: u32,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    pub is_identity: bool,
    pub default_value: Option<String>,
}

/// One column of one index (catalogs report index keys row-wise).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRow {
    pub schema: String,
    pub table: String,
    pub index_name: String,
    pub column_name: String,
    /// 1-based position within the index key
    pub key_ordinal: u32,
    pub is_unique: bool,
    pub is_primary: bool,
}

/// One column pair of one foreign key constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyRow {
    pub schema: String,
    pub table: String,
    pub constraint_name: String,
    pub column_name: String,
    /// 1-based position within the constraint
    pub key_ordinal: u32,
    pub referenced_schema: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// One non-table object (view, procedure, function, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectRow {
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
    /// Body text, when the catalog exposes it
    pub definition: Option<String>,
}

/// One object-to-object reference detected by the backend (dependency view
/// or body parse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub from_schema: String,
    pub from_name: String,
    pub from_kind: ObjectKind,
    pub to_schema: String,
    pub to_name: String,
    pub to_kind: ObjectKind,
    /// Populated for cross-database references
    pub to_database: Option<String>,
}

/// Execution counters for a procedure or function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStatsRow {
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
    pub execution_count: i64,
}

/// Per-object counters from a persisted query-statistics store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryStoreStatsRow {
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
    pub execution_count: i64,
}

/// Table-level read/write counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessStatsRow {
    pub schema: String,
    pub table: String,
    pub reads: i64,
    pub writes: i64,
}

/// Table row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowCountRow {
    pub schema: String,
    pub table: String,
    pub rows: i64,
}

/// One database visible on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseRow {
    pub name: String,
}

/// Server-level information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Server or instance name
    pub server_name: String,

    /// Engine version string
    pub version: String,

    /// Seconds since engine start, when the engine tracks it. Telemetry
    /// signals gate their negative verdicts on this.
    pub uptime_secs: Option<u64>,
}
