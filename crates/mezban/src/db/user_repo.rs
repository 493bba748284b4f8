//! User repository — the identity collaborator surface.
//!
//! The marketplace's account lifecycle lives elsewhere; this module only
//! covers what the application workflow needs: looking an applicant up and
//! flipping the chef flag on approval.

use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};

/// A raw user row from the database.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub is_chef: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            display_name: row.get("display_name")?,
            is_chef: row.get("is_chef")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Inserts a new user row, returning its assigned id.
pub fn insert(
    db: &Database,
    email: &str,
    display_name: &str,
    now: &str,
) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO users (email, display_name, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![email, display_name, now],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Finds a user by id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<UserRow>, DatabaseError> {
    db.with_conn(|conn| find_by_id_tx(conn, id))
}

/// Connection-level lookup for composing inside transactions.
pub fn find_by_id_tx(conn: &Connection, id: i64) -> Result<Option<UserRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM users WHERE id = ?1")?;
    let mut rows = stmt.query_map(params![id], UserRow::from_row)?;
    match rows.next() {
        Some(Ok(row)) => Ok(Some(row)),
        Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
        None => Ok(None),
    }
}

/// Sets the chef flag on a user. Errors if the user row does not exist,
/// so a transaction wrapping this call rolls back rather than approving
/// an application nobody owns.
pub fn set_is_chef_tx(
    conn: &Connection,
    user_id: i64,
    is_chef: bool,
    now: &str,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE users SET is_chef = ?2, updated_at = ?3 WHERE id = ?1",
        params![user_id, is_chef, now],
    )?;
    if updated == 0 {
        return Err(DatabaseError::RowMissing {
            table: "users",
            id: user_id,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2026-01-01T00:00:00Z";

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let id = insert(&db, "amira@example.com", "Amira", NOW).unwrap();

        let user = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(user.email, "amira@example.com");
        assert_eq!(user.display_name, "Amira");
        assert!(!user.is_chef);
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, 42).unwrap().is_none());
    }

    #[test]
    fn test_email_is_unique() {
        let db = test_db();
        insert(&db, "amira@example.com", "Amira", NOW).unwrap();

        let err = insert(&db, "amira@example.com", "Imposter", NOW).unwrap_err();
        assert!(err.is_unique_violation("users.email"));
    }

    #[test]
    fn test_set_is_chef() {
        let db = test_db();
        let id = insert(&db, "amira@example.com", "Amira", NOW).unwrap();

        db.with_conn(|conn| set_is_chef_tx(conn, id, true, "2026-01-02T00:00:00Z"))
            .unwrap();

        let user = find_by_id(&db, id).unwrap().unwrap();
        assert!(user.is_chef);
        assert_eq!(user.updated_at, "2026-01-02T00:00:00Z");
    }

    #[test]
    fn test_set_is_chef_missing_user() {
        let db = test_db();
        let err = db
            .with_conn(|conn| set_is_chef_tx(conn, 99, true, NOW))
            .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::RowMissing { table: "users", id: 99 }
        ));
    }
}
