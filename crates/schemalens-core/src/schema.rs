//! Schema Model Definitions
//!
//! Dialect-neutral representation of a relational schema as produced by
//! catalog extraction. Objects are immutable once a snapshot is built;
//! everything derived (graphs, usage classifications) is recomputed from a
//! fresh snapshot rather than patched in place.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Object Identity
// ============================================================================

/// Kinds of schema objects tracked by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Base table
    Table,
    /// View
    View,
    /// Stored procedure
    Procedure,
    /// Scalar or table-valued function
    Function,
    /// Trigger
    Trigger,
    /// Synonym / alias object
    Synonym,
    /// Sequence generator
    Sequence,
    /// User-defined type
    UserDefinedType,
    /// Scheduled job
    Job,
}

impl ObjectKind {
    /// Stable string form used in report output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Table => "table",
            ObjectKind::View => "view",
            ObjectKind::Procedure => "procedure",
            ObjectKind::Function => "function",
            ObjectKind::Trigger => "trigger",
            ObjectKind::Synonym => "synonym",
            ObjectKind::Sequence => "sequence",
            ObjectKind::UserDefinedType => "user_defined_type",
            ObjectKind::Job => "job",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a schema object: `(database?, schema, name, kind)`.
///
/// The optional database qualifier is only populated in server mode, where
/// the same `schema.name` may exist in several databases on one server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Database qualifier (server mode only)
    pub database: Option<String>,

    /// Schema (namespace) the object lives in
    pub schema: String,

    /// Object name
    pub name: String,

    /// Object kind
    pub kind: ObjectKind,
}

impl ObjectRef {
    /// Create a reference to an unqualified object.
    pub fn new(schema: impl Into<String>, name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            database: None,
            schema: schema.into(),
            name: name.into(),
            kind,
        }
    }

    /// Convenience constructor for tables.
    pub fn table(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(schema, name, ObjectKind::Table)
    }

    /// Return a copy qualified with a database name.
    pub fn qualified(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Canonical graph/usage key for this object.
    ///
    /// `schema.name` while unqualified, `database.schema.name` once a
    /// database qualifier is present. This is the only key format the graph
    /// and usage engines accept; an unqualified name must never be used as a
    /// key once server mode is active.
    pub fn canonical_key(&self) -> String {
        match &self.database {
            Some(db) => format!("{}.{}.{}", db, self.schema, self.name),
            None => format!("{}.{}", self.schema, self.name),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.canonical_key())
    }
}

// ============================================================================
// Columns, Indexes, Foreign Keys
// ============================================================================

/// Broad type families used for implicit-relationship compatibility checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFamily {
    Integer,
    Decimal,
    Float,
    Text,
    Uuid,
    DateTime,
    Binary,
    Boolean,
    Other,
}

/// A table column in catalog order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// 1-based ordinal position
    pub ordinal: u32,

    /// Raw data type as reported by the dialect (e.g. "bigint", "nvarchar(50)")
    pub data_type: String,

    /// Whether NULLs are allowed
    pub is_nullable: bool,

    /// Whether the column is part of the primary key
    pub is_primary_key: bool,

    /// Whether the column is an identity / auto-increment column
    pub is_identity: bool,

    /// Default expression, if any
    pub default_value: Option<String>,
}

impl Column {
    /// Map the raw dialect type onto a broad family.
    ///
    /// Only the base type name matters; length/precision suffixes are ignored.
    pub fn type_family(&self) -> TypeFamily {
        let base = self
            .data_type
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        match base.as_str() {
            "tinyint" | "smallint" | "int" | "integer" | "bigint" | "serial" | "bigserial" => {
                TypeFamily::Integer
            }
            "decimal" | "numeric" | "money" | "smallmoney" => TypeFamily::Decimal,
            "real" | "float" | "double" => TypeFamily::Float,
            "char" | "varchar" | "nchar" | "nvarchar" | "text" | "ntext" | "clob" => {
                TypeFamily::Text
            }
            "uuid" | "uniqueidentifier" => TypeFamily::Uuid,
            "date" | "time" | "datetime" | "datetime2" | "smalldatetime" | "timestamp"
            | "timestamptz" | "datetimeoffset" => TypeFamily::DateTime,
            "binary" | "varbinary" | "blob" | "image" | "bytea" => TypeFamily::Binary,
            "bit" | "bool" | "boolean" => TypeFamily::Boolean,
            _ => TypeFamily::Other,
        }
    }

    /// Byte width for integer types, used to grade near-miss type matches.
    pub fn integer_width(&self) -> Option<u8> {
        let base = self
            .data_type
            .split('(')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match base.as_str() {
            "tinyint" => Some(1),
            "smallint" => Some(2),
            "int" | "integer" | "serial" => Some(4),
            "bigint" | "bigserial" => Some(8),
            _ => None,
        }
    }
}

/// An index over one or more columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Index {
    /// Index name
    pub name: String,

    /// Indexed columns in key order
    pub columns: Vec<String>,

    /// Whether the index enforces uniqueness
    pub is_unique: bool,

    /// Whether this is the primary key index
    pub is_primary: bool,
}

/// A declared foreign key constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name
    pub name: String,

    /// Referencing columns in constraint order
    pub columns: Vec<String>,

    /// Referenced schema
    pub referenced_schema: String,

    /// Referenced table
    pub referenced_table: String,

    /// Referenced columns in constraint order
    pub referenced_columns: Vec<String>,
}

// ============================================================================
// Tables and Other Objects
// ============================================================================

/// A base table with its structural metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Database qualifier (server mode only)
    pub database: Option<String>,

    /// Schema the table lives in
    pub schema: String,

    /// Table name
    pub name: String,

    /// Columns in ordinal order
    pub columns: Vec<Column>,

    /// Indexes
    pub indexes: Vec<Index>,

    /// Declared foreign keys
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Identity reference for this table.
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            database: self.database.clone(),
            schema: self.schema.clone(),
            name: self.name.clone(),
            kind: ObjectKind::Table,
        }
    }

    /// Look up a column by name (case-insensitive, as identifiers are in
    /// most dialects).
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Primary key columns in ordinal order.
    pub fn primary_key_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_primary_key).collect()
    }

    /// Whether an index exists whose leading column is `column`.
    ///
    /// Only the leading key column can serve a lookup on that column, so a
    /// trailing position does not count as a supporting index.
    pub fn has_supporting_index(&self, column: &str) -> bool {
        self.indexes
            .iter()
            .any(|ix| ix.columns.first().is_some_and(|c| c.eq_ignore_ascii_case(column)))
    }
}

/// A non-table schema object (view, procedure, function, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaObject {
    /// Identity
    pub reference: ObjectRef,

    /// Object body / definition text, when the catalog exposes it
    pub definition: Option<String>,
}

// ============================================================================
// Schema Snapshot
// ============================================================================

/// Errors raised while assembling a schema snapshot.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Two objects mapped onto the same canonical key
    #[error("duplicate object key '{key}' in schema snapshot")]
    DuplicateObject { key: String },
}

/// A validated, immutable snapshot of one database's schema.
///
/// Built once per analysis run by catalog extraction and consumed read-only
/// by every downstream analyzer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    /// Database name, when known
    pub database: Option<String>,

    /// Base tables
    tables: Vec<Table>,

    /// Non-table objects
    objects: Vec<SchemaObject>,

    /// Canonical key → index into `tables`
    #[serde(skip)]
    table_keys: HashMap<String, usize>,
}

impl DatabaseSchema {
    /// Assemble a snapshot, validating key uniqueness.
    pub fn new(
        database: Option<String>,
        tables: Vec<Table>,
        objects: Vec<SchemaObject>,
    ) -> Result<Self, SchemaError> {
        let mut table_keys = HashMap::with_capacity(tables.len());
        for (i, table) in tables.iter().enumerate() {
            let key = table.object_ref().canonical_key();
            if table_keys.insert(key.clone(), i).is_some() {
                return Err(SchemaError::DuplicateObject { key });
            }
        }

        let mut seen = std::collections::HashSet::new();
        for obj in &objects {
            let key = obj.reference.canonical_key();
            if table_keys.contains_key(&key) || !seen.insert(key.clone()) {
                return Err(SchemaError::DuplicateObject { key });
            }
        }

        Ok(Self {
            database,
            tables,
            objects,
            table_keys,
        })
    }

    /// All tables in the snapshot.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// All non-table objects in the snapshot.
    pub fn objects(&self) -> &[SchemaObject] {
        &self.objects
    }

    /// Look up a table by canonical key.
    pub fn table_by_key(&self, key: &str) -> Option<&Table> {
        self.table_keys.get(key).map(|&i| &self.tables[i])
    }

    /// Look up a table by name, ignoring case (single-database mode helper).
    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Identity references for every object in the snapshot.
    pub fn all_refs(&self) -> Vec<ObjectRef> {
        self.tables
            .iter()
            .map(Table::object_ref)
            .chain(self.objects.iter().map(|o| o.reference.clone()))
            .collect()
    }

    /// Total object count (tables plus everything else).
    pub fn object_count(&self) -> usize {
        self.tables.len() + self.objects.len()
    }

    /// Whether object refs carry database qualifiers (server mode).
    pub fn is_qualified(&self) -> bool {
        self.tables
            .first()
            .map(|t| t.database.is_some())
            .or_else(|| self.objects.first().map(|o| o.reference.database.is_some()))
            .unwrap_or(false)
    }

    /// Dependency edges declared via foreign key constraints.
    ///
    /// One edge per distinct referencing/referenced table pair per constraint;
    /// a self-referencing constraint yields a self-loop edge.
    pub fn foreign_key_edges(&self) -> Vec<crate::ObjectDependency> {
        let mut edges = Vec::new();
        for table in &self.tables {
            for fk in &table.foreign_keys {
                let to = ObjectRef {
                    database: table.database.clone(),
                    schema: fk.referenced_schema.clone(),
                    name: fk.referenced_table.clone(),
                    kind: ObjectKind::Table,
                };
                edges.push(crate::ObjectDependency {
                    from: table.object_ref(),
                    to,
                    via: crate::DetectedVia::ForeignKeyConstraint,
                });
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn column(name: &str, data_type: &str) -> Column {
        Column {
            name: name.to_string(),
            ordinal: 1,
            data_type: data_type.to_string(),
            is_nullable: false,
            is_primary_key: false,
            is_identity: false,
            default_value: None,
        }
    }

    fn table(schema: &str, name: &str) -> Table {
        Table {
            database: None,
            schema: schema.to_string(),
            name: name.to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[test]
    fn test_canonical_key_unqualified() {
        let r = ObjectRef::table("dbo", "Order");
        assert_eq!(r.canonical_key(), "dbo.Order");
    }

    #[test]
    fn test_canonical_key_qualified() {
        let r = ObjectRef::table("dbo", "Order").qualified("Sales");
        assert_eq!(r.canonical_key(), "Sales.dbo.Order");
    }

    #[test]
    fn test_type_family_mapping() {
        assert_eq!(column("a", "bigint").type_family(), TypeFamily::Integer);
        assert_eq!(column("a", "nvarchar(50)").type_family(), TypeFamily::Text);
        assert_eq!(
            column("a", "uniqueidentifier").type_family(),
            TypeFamily::Uuid
        );
        assert_eq!(column("a", "datetime2").type_family(), TypeFamily::DateTime);
        assert_eq!(column("a", "geography").type_family(), TypeFamily::Other);
    }

    #[test]
    fn test_integer_width() {
        assert_eq!(column("a", "int").integer_width(), Some(4));
        assert_eq!(column("a", "bigint").integer_width(), Some(8));
        assert_eq!(column("a", "nvarchar(10)").integer_width(), None);
    }

    #[test]
    fn test_supporting_index_leading_column_only() {
        let mut t = table("dbo", "OrderLine");
        t.indexes.push(Index {
            name: "IX_OrderLine_OrderId".to_string(),
            columns: vec!["OrderId".to_string(), "LineNo".to_string()],
            is_unique: false,
            is_primary: false,
        });

        assert!(t.has_supporting_index("orderid"));
        assert!(!t.has_supporting_index("LineNo"));
    }

    #[test]
    fn test_schema_rejects_duplicate_keys() {
        let t1 = table("dbo", "Order");
        let t2 = table("dbo", "Order");
        let err = DatabaseSchema::new(None, vec![t1, t2], Vec::new()).unwrap_err();
        assert!(err.to_string().contains("dbo.Order"));
    }

    #[test]
    fn test_foreign_key_edges() {
        let mut t = table("dbo", "OrderLine");
        t.foreign_keys.push(ForeignKey {
            name: "FK_OrderLine_Order".to_string(),
            columns: vec!["OrderId".to_string()],
            referenced_schema: "dbo".to_string(),
            referenced_table: "Order".to_string(),
            referenced_columns: vec!["Id".to_string()],
        });

        let schema =
            DatabaseSchema::new(None, vec![t, table("dbo", "Order")], Vec::new()).unwrap();
        let edges = schema.foreign_key_edges();

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from.canonical_key(), "dbo.OrderLine");
        assert_eq!(edges[0].to.canonical_key(), "dbo.Order");
    }
}
