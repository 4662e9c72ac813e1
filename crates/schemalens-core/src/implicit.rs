//! Implicit Relationship Inference
//!
//! Derives *candidate* foreign-key-like relationships from naming
//! conventions: a non-key column whose name is an identifier-suffixed table
//! stem (`OrderId`, `customer_id`) pointing at a table with a compatible
//! primary key. Candidates are suggestions with a confidence grade, never
//! asserted facts, and are never merged into the dependency edge set.
//!
//! All stemming and confidence constants live in [`crate::policy`].

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy;
use crate::{Column, DatabaseSchema, ObjectRef, Table, TypeFamily};

/// A heuristically inferred, structurally undeclared relationship candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplicitRelationship {
    /// Referencing table
    pub from_table: ObjectRef,

    /// Referencing column
    pub from_column: String,

    /// Candidate referenced table
    pub to_table: ObjectRef,

    /// Candidate referenced key column
    pub to_column: String,

    /// Confidence in `[0, 1]`
    pub confidence: f64,

    /// Human-readable explanation of the match and any deductions
    pub reason: String,

    /// Ready-to-review constraint DDL
    pub suggested_constraint: String,
}

/// How a column stem matched a table name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StemMatch {
    Exact,
    Plural,
    Fuzzy,
}

impl StemMatch {
    fn base_confidence(self) -> f64 {
        match self {
            StemMatch::Exact => policy::CONFIDENCE_EXACT_STEM,
            StemMatch::Plural => policy::CONFIDENCE_PLURAL_STEM,
            StemMatch::Fuzzy => policy::CONFIDENCE_FUZZY_STEM,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            StemMatch::Exact => "exact stem match",
            StemMatch::Plural => "plural stem match",
            StemMatch::Fuzzy => "fuzzy stem match",
        }
    }
}

/// Infer implicit relationship candidates for every table in the snapshot.
///
/// Candidates are deduplicated against declared foreign keys (a declared
/// constraint always wins) and returned sorted by confidence descending.
pub fn infer_implicit_relationships(schema: &DatabaseSchema) -> Vec<ImplicitRelationship> {
    let mut candidates = Vec::new();

    for table in schema.tables() {
        for column in &table.columns {
            if column.is_primary_key {
                continue;
            }
            // A column already covered by any declared FK never yields a
            // candidate; the explicit constraint shadows it.
            if table
                .foreign_keys
                .iter()
                .any(|fk| fk.columns.iter().any(|c| c.eq_ignore_ascii_case(&column.name)))
            {
                continue;
            }

            let Some(stem) = strip_id_suffix(&column.name) else {
                continue;
            };

            for target in schema.tables() {
                let Some(matched) = match_stem(&stem, &target.name) else {
                    continue;
                };
                if let Some(candidate) = grade_candidate(table, column, target, matched) {
                    candidates.push(candidate);
                }
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.from_table.name.cmp(&b.from_table.name))
            .then_with(|| a.from_column.cmp(&b.from_column))
    });

    debug!("inferred {} implicit relationship candidates", candidates.len());
    candidates
}

/// Strip the longest matching identifier suffix; `None` when nothing matches
/// or the remainder would be empty.
fn strip_id_suffix(column: &str) -> Option<String> {
    let lower = column.to_ascii_lowercase();
    for suffix in policy::ID_SUFFIXES {
        if lower.ends_with(suffix) && lower.len() > suffix.len() {
            return Some(column[..column.len() - suffix.len()].to_string());
        }
    }
    None
}

/// Match a stem against a table name: exact, pluralized, or singularized.
fn match_stem(stem: &str, table_name: &str) -> Option<StemMatch> {
    let stem = stem.to_ascii_lowercase();
    let table = table_name.to_ascii_lowercase();

    if stem == table {
        return Some(StemMatch::Exact);
    }

    // Table name is a plural of the stem: Order → Orders, Status → Statuses,
    // Category → Categories.
    let plurals = pluralize(&stem);
    if plurals.iter().any(|p| *p == table) {
        return Some(StemMatch::Plural);
    }

    // Stem itself is plural and its singular matches: Customers → Customer.
    if let Some(singular) = stem.strip_suffix('s') {
        if !singular.is_empty() && singular == table {
            return Some(StemMatch::Fuzzy);
        }
    }

    None
}

fn pluralize(stem: &str) -> Vec<String> {
    let mut forms = vec![format!("{stem}s"), format!("{stem}es")];
    if let Some(base) = stem.strip_suffix('y') {
        forms.push(format!("{base}ies"));
    }
    forms
}

/// Validate key compatibility and compute the final confidence.
fn grade_candidate(
    from: &Table,
    column: &Column,
    target: &Table,
    matched: StemMatch,
) -> Option<ImplicitRelationship> {
    let key_column = target_key_column(target)?;

    // The families must agree outright; a text column never references an
    // integer key no matter how well the name matches.
    if column.type_family() != key_column.type_family() {
        return None;
    }

    let mut confidence = matched.base_confidence();
    let mut reason = format!(
        "column '{}' resembles primary key '{}' of table '{}' ({})",
        column.name,
        key_column.name,
        target.name,
        matched.describe()
    );

    if column.type_family() == TypeFamily::Integer {
        if let (Some(a), Some(b)) = (column.integer_width(), key_column.integer_width()) {
            if a != b {
                confidence -= policy::PENALTY_INTEGER_WIDTH_MISMATCH;
                reason.push_str(&format!(
                    "; integer width differs ({} vs {})",
                    column.data_type, key_column.data_type
                ));
            }
        }
    }

    if !from.has_supporting_index(&column.name) {
        confidence -= policy::PENALTY_NO_SUPPORTING_INDEX;
        reason.push_str(&format!("; no supporting index on '{}'", column.name));
    }

    if confidence < policy::MIN_CONFIDENCE {
        return None;
    }

    Some(ImplicitRelationship {
        from_table: from.object_ref(),
        from_column: column.name.clone(),
        to_table: target.object_ref(),
        to_column: key_column.name.clone(),
        confidence,
        reason,
        suggested_constraint: format!(
            "ALTER TABLE {}.{} ADD CONSTRAINT FK_{}_{} FOREIGN KEY ({}) REFERENCES {}.{} ({});",
            from.schema,
            from.name,
            from.name,
            column.name,
            column.name,
            target.schema,
            target.name,
            key_column.name
        ),
    })
}

/// The column a candidate may reference: a single-column primary key, or an
/// identity column when no usable primary key exists. Composite keys reject
/// the table as a target.
fn target_key_column(table: &Table) -> Option<&Column> {
    let pk = table.primary_key_columns();
    match pk.len() {
        1 => Some(pk[0]),
        0 => table.columns.iter().find(|c| c.is_identity),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ForeignKey, Index};
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

    fn pk_column(name: &str, data_type: &str) -> Column {
        Column {
            is_primary_key: true,
            is_identity: true,
            ..column(name, data_type)
        }
    }

    fn table(name: &str, columns: Vec<Column>) -> Table {
        Table {
            database: None,
            schema: "dbo".to_string(),
            name: name.to_string(),
            columns,
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    fn schema_of(tables: Vec<Table>) -> DatabaseSchema {
        DatabaseSchema::new(None, tables, Vec::new()).unwrap()
    }

    #[test]
    fn test_exact_stem_with_index_golden() {
        let mut line = table(
            "OrderLine",
            vec![pk_column("Id", "int"), column("OrderId", "int")],
        );
        line.indexes.push(Index {
            name: "IX_OrderLine_OrderId".to_string(),
            columns: vec!["OrderId".to_string()],
            is_unique: false,
            is_primary: false,
        });
        let order = table("Order", vec![pk_column("Id", "int")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![line, order]));

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.from_column, "OrderId");
        assert_eq!(c.to_table.name, "Order");
        assert_eq!(c.to_column, "Id");
        assert_eq!(c.confidence, policy::CONFIDENCE_EXACT_STEM);
        assert!(c.reason.contains("exact stem match"));
        assert!(c
            .suggested_constraint
            .contains("ADD CONSTRAINT FK_OrderLine_OrderId"));
    }

    #[test]
    fn test_missing_index_penalty_golden() {
        let line = table(
            "OrderLine",
            vec![pk_column("Id", "int"), column("OrderId", "int")],
        );
        let order = table("Order", vec![pk_column("Id", "int")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![line, order]));

        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].confidence,
            policy::CONFIDENCE_EXACT_STEM - policy::PENALTY_NO_SUPPORTING_INDEX
        );
        assert!(candidates[0].reason.contains("no supporting index"));
    }

    #[test]
    fn test_plural_stem_golden() {
        let item = table(
            "LineItem",
            vec![pk_column("Id", "int"), column("CategoryId", "int")],
        );
        let categories = table("Categories", vec![pk_column("Id", "int")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![item, categories]));

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].to_table.name, "Categories");
        assert_eq!(
            candidates[0].confidence,
            policy::CONFIDENCE_PLURAL_STEM - policy::PENALTY_NO_SUPPORTING_INDEX
        );
    }

    #[test]
    fn test_snake_case_suffix() {
        let line = table(
            "order_line",
            vec![pk_column("id", "integer"), column("customer_id", "integer")],
        );
        let customer = table("customer", vec![pk_column("id", "integer")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![line, customer]));

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].from_column, "customer_id");
        assert_eq!(candidates[0].to_table.name, "customer");
    }

    #[test]
    fn test_declared_fk_shadows_candidate() {
        let mut line = table(
            "OrderLine",
            vec![pk_column("Id", "int"), column("OrderId", "int")],
        );
        line.foreign_keys.push(ForeignKey {
            name: "FK_OrderLine_Order".to_string(),
            columns: vec!["OrderId".to_string()],
            referenced_schema: "dbo".to_string(),
            referenced_table: "Order".to_string(),
            referenced_columns: vec!["Id".to_string()],
        });
        let order = table("Order", vec![pk_column("Id", "int")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![line, order]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_type_family_mismatch_rejects() {
        let line = table(
            "OrderLine",
            vec![pk_column("Id", "int"), column("OrderId", "nvarchar(20)")],
        );
        let order = table("Order", vec![pk_column("Id", "int")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![line, order]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_integer_width_penalty_golden() {
        let mut line = table(
            "OrderLine",
            vec![pk_column("Id", "int"), column("OrderId", "int")],
        );
        line.indexes.push(Index {
            name: "IX".to_string(),
            columns: vec!["OrderId".to_string()],
            is_unique: false,
            is_primary: false,
        });
        let order = table("Order", vec![pk_column("Id", "bigint")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![line, order]));

        assert_eq!(candidates.len(), 1);
        assert_eq!(
            candidates[0].confidence,
            policy::CONFIDENCE_EXACT_STEM - policy::PENALTY_INTEGER_WIDTH_MISMATCH
        );
        assert!(candidates[0].reason.contains("integer width differs"));
    }

    #[test]
    fn test_composite_primary_key_rejects_target() {
        let line = table(
            "OrderLine",
            vec![pk_column("Id", "int"), column("OrderId", "int")],
        );
        let order = table(
            "Order",
            vec![pk_column("TenantId", "int"), pk_column("Id", "int")],
        );

        let candidates = infer_implicit_relationships(&schema_of(vec![line, order]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_bare_id_column_yields_nothing() {
        let a = table("A", vec![column("Id", "int")]);
        let b = table("B", vec![pk_column("Id", "int")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![a, b]));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_sorted_by_confidence_descending() {
        let mut strong = table(
            "Invoice",
            vec![pk_column("Id", "int"), column("CustomerId", "int")],
        );
        strong.indexes.push(Index {
            name: "IX_Invoice_CustomerId".to_string(),
            columns: vec!["CustomerId".to_string()],
            is_unique: false,
            is_primary: false,
        });
        let weak = table(
            "Payment",
            vec![pk_column("Id", "int"), column("CustomerId", "int")],
        );
        let customer = table("Customer", vec![pk_column("Id", "int")]);

        let candidates = infer_implicit_relationships(&schema_of(vec![strong, weak, customer]));

        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].confidence > candidates[1].confidence);
        assert_eq!(candidates[0].from_table.name, "Invoice");
    }
}
