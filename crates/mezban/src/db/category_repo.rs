//! Category repository — lookup operations for the `categories` table.
//!
//! Category lifecycle (naming, hierarchy management) belongs to the wider
//! marketplace; the workflow only validates references and resolves
//! associations, plus seeding for tests and deployments.

use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};

/// A raw category row from the database.
#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

impl CategoryRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
            parent_id: row.get("parent_id")?,
        })
    }
}

/// Inserts a new category, returning its assigned id.
pub fn insert(
    db: &Database,
    name: &str,
    slug: &str,
    parent_id: Option<i64>,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO categories (name, slug, parent_id) VALUES (?1, ?2, ?3)",
            params![name, slug, parent_id],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Fetches every category whose id is in `ids`. Ids absent from the table
/// are simply not returned; the caller computes the difference.
pub fn find_by_ids(db: &Database, ids: &[i64]) -> Result<Vec<CategoryRow>, DatabaseError> {
    db.with_conn(|conn| find_by_ids_tx(conn, ids))
}

/// Connection-level variant of [`find_by_ids`] for use inside transactions.
pub fn find_by_ids_tx(conn: &Connection, ids: &[i64]) -> Result<Vec<CategoryRow>, DatabaseError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (1..=ids.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT * FROM categories WHERE id IN ({}) ORDER BY id",
        placeholders
    );

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        ids.iter().map(|id| id as &dyn rusqlite::types::ToSql).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<CategoryRow> = stmt
        .query_map(params_ref.as_slice(), CategoryRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Lists all categories ordered by id.
pub fn find_all(db: &Database) -> Result<Vec<CategoryRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM categories ORDER BY id")?;
        let rows: Vec<CategoryRow> = stmt
            .query_map([], CategoryRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
