//! Export job entity (database row mapping).

use sqlx::FromRow;

/// Database row mapping for the `export_jobs` table.
///
/// Numeric and free-text columns are cast in SQL so the mapping does not
/// depend on how the web application declared them.
#[derive(Debug, Clone, FromRow)]
pub struct ExportJobEntity {
    pub id: i64,
    pub table_name: String,
    pub status: String,
    pub percent: Option<i64>,
    pub search_values: Option<String>,
    pub file_name: Option<String>,
    pub file_path: Option<String>,
}
