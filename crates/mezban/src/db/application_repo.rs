//! Application repository — storage for the `chef_applications` table and
//! its category and file associations.
//!
//! The `UNIQUE` constraint on `user_id` is the source of truth for the
//! one-application-per-user rule; callers translate its violation rather
//! than trying to prevent the race with a check-then-act.

use rusqlite::{params, Connection, Row};

use crate::application::{FileDescriptor, FileKind, NewApplication};

use super::category_repo::CategoryRow;
use super::user_repo::{self, UserRow};
use super::{Database, DatabaseError};

/// A raw application row from the database.
#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: i64,
    pub user_id: i64,
    pub business_name: String,
    pub description: String,
    pub status: String,
    pub review_notes: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl ApplicationRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            business_name: row.get("business_name")?,
            description: row.get("description")?,
            status: row.get("status")?,
            review_notes: row.get("review_notes")?,
            reviewed_by: row.get("reviewed_by")?,
            reviewed_at: row.get("reviewed_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// An application row hydrated with its owner, category roles and files.
#[derive(Debug, Clone)]
pub struct ApplicationDetails {
    pub row: ApplicationRow,
    pub user: UserRow,
    pub main_categories: Vec<CategoryRow>,
    pub sub_categories: Vec<CategoryRow>,
    pub certificate_files: Vec<FileDescriptor>,
    pub document_files: Vec<FileDescriptor>,
}

/// Inserts an application with both category roles and both file lists in
/// one transaction, returning the assigned id.
///
/// Category id lists must already be deduplicated; a repeated
/// (application, category, role) triple violates the junction primary key.
pub fn insert(db: &Database, new: &NewApplication, now: &str) -> Result<i64, DatabaseError> {
    db.with_tx::<_, _, DatabaseError>(|tx| {
        tx.execute(
            "INSERT INTO chef_applications (user_id, business_name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![new.user_id, new.business_name, new.description, now],
        )?;
        let id = tx.last_insert_rowid();

        insert_category_role(tx, id, &new.main_category_ids, "main")?;
        insert_category_role(tx, id, &new.sub_category_ids, "sub")?;
        insert_files(tx, id, &new.certificate_files, FileKind::Certificate)?;
        insert_files(tx, id, &new.document_files, FileKind::Document)?;

        Ok(id)
    })
}

fn insert_category_role(
    conn: &Connection,
    application_id: i64,
    category_ids: &[i64],
    role: &str,
) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO application_categories (application_id, category_id, role)
         VALUES (?1, ?2, ?3)",
    )?;
    for category_id in category_ids {
        stmt.execute(params![application_id, category_id, role])?;
    }
    Ok(())
}

fn insert_files(
    conn: &Connection,
    application_id: i64,
    files: &[FileDescriptor],
    kind: FileKind,
) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "INSERT INTO application_files (application_id, kind, filename, storage_path, mime_type)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for file in files {
        stmt.execute(params![
            application_id,
            kind.as_str(),
            file.filename,
            file.storage_path,
            file.mime_type,
        ])?;
    }
    Ok(())
}

/// Finds the application owned by `user_id`, if any.
pub fn find_by_user(db: &Database, user_id: i64) -> Result<Option<ApplicationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM chef_applications WHERE user_id = ?1")?;
        let mut rows = stmt.query_map(params![user_id], ApplicationRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Finds an application by id, hydrated with owner, categories and files.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ApplicationDetails>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM chef_applications WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], ApplicationRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(load_details(conn, row)?)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Lists all applications for administrative review, newest first.
pub fn find_all(db: &Database) -> Result<Vec<ApplicationDetails>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM chef_applications ORDER BY created_at DESC, id DESC")?;
        let rows: Vec<ApplicationRow> = stmt
            .query_map([], ApplicationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| load_details(conn, row))
            .collect()
    })
}

fn load_details(
    conn: &Connection,
    row: ApplicationRow,
) -> Result<ApplicationDetails, DatabaseError> {
    let user = user_repo::find_by_id_tx(conn, row.user_id)?.ok_or(DatabaseError::RowMissing {
        table: "users",
        id: row.user_id,
    })?;
    let main_categories = categories_for_role(conn, row.id, "main")?;
    let sub_categories = categories_for_role(conn, row.id, "sub")?;
    let certificate_files = files_of_kind(conn, row.id, FileKind::Certificate)?;
    let document_files = files_of_kind(conn, row.id, FileKind::Document)?;

    Ok(ApplicationDetails {
        row,
        user,
        main_categories,
        sub_categories,
        certificate_files,
        document_files,
    })
}

fn categories_for_role(
    conn: &Connection,
    application_id: i64,
    role: &str,
) -> Result<Vec<CategoryRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, c.slug, c.parent_id
         FROM categories c
         JOIN application_categories ac ON ac.category_id = c.id
         WHERE ac.application_id = ?1 AND ac.role = ?2
         ORDER BY c.id",
    )?;
    let rows = stmt
        .query_map(params![application_id, role], |row| {
            Ok(CategoryRow {
                id: row.get("id")?,
                name: row.get("name")?,
                slug: row.get("slug")?,
                parent_id: row.get("parent_id")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn files_of_kind(
    conn: &Connection,
    application_id: i64,
    kind: FileKind,
) -> Result<Vec<FileDescriptor>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT filename, storage_path, mime_type FROM application_files
         WHERE application_id = ?1 AND kind = ?2
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![application_id, kind.as_str()], |row| {
            Ok(FileDescriptor {
                filename: row.get("filename")?,
                storage_path: row.get("storage_path")?,
                mime_type: row.get("mime_type")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Reads the current status and owner of an application inside an open
/// transaction. Returns `None` when the id is unknown.
pub fn status_tx(conn: &Connection, id: i64) -> Result<Option<(String, i64)>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT status, user_id FROM chef_applications WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], |row| Ok((row.get(0)?, row.get(1)?)))?;
    match rows.next() {
        Some(Ok(pair)) => Ok(Some(pair)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

/// Writes the review fields of an application inside an open transaction.
pub fn update_status_tx(
    conn: &Connection,
    id: i64,
    status: &str,
    review_notes: Option<&str>,
    reviewed_by: i64,
    now: &str,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE chef_applications
         SET status = ?2, review_notes = ?3, reviewed_by = ?4, reviewed_at = ?5, updated_at = ?5
         WHERE id = ?1",
        params![id, status, review_notes, reviewed_by, now],
    )?;
    if updated == 0 {
        return Err(DatabaseError::RowMissing {
            table: "chef_applications",
            id,
        });
    }
    Ok(())
}
