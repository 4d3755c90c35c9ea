//! SQL query constants
//!
//! Catalog queries used by the introspector.

/// Column definitions for one table, filtered by schema and table name.
///
/// A table that does not exist yet simply returns no rows.
pub const GET_COLUMNS: &str = r#"
    SELECT
        c.table_name,
        c.column_name,
        c.data_type,
        c.is_nullable = 'YES' AS nullable,
        c.column_default,
        c.character_maximum_length,
        c.ordinal_position
    FROM information_schema.columns c
    WHERE c.table_schema = $1
        AND c.table_name = $2
    ORDER BY c.ordinal_position
"#;
