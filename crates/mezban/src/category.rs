//! Category domain type and reference validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::db::{category_repo, Database, DatabaseError};

/// A dish category. Owned by the wider marketplace; the application
/// workflow only references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<i64>,
}

impl From<category_repo::CategoryRow> for Category {
    fn from(row: category_repo::CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            parent_id: row.parent_id,
        }
    }
}

/// Result of checking a set of requested category ids against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCheck {
    pub found: BTreeSet<i64>,
    pub missing: BTreeSet<i64>,
}

impl CategoryCheck {
    /// True when every requested id exists.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Confirms every id in `ids` exists in the category store and reports
/// which do not. Read-only; a non-empty `missing` set means the caller
/// must reject the request before any write happens.
pub fn validate_ids(db: &Database, ids: &BTreeSet<i64>) -> Result<CategoryCheck, DatabaseError> {
    let requested: Vec<i64> = ids.iter().copied().collect();
    let found: BTreeSet<i64> = category_repo::find_by_ids(db, &requested)?
        .into_iter()
        .map(|row| row.id)
        .collect();
    let missing: BTreeSet<i64> = ids.difference(&found).copied().collect();
    Ok(CategoryCheck { found, missing })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    #[test]
    fn test_validate_ids_all_present() {
        let db = test_db();
        let a = category_repo::insert(&db, "Mains", "mains", None).unwrap();
        let b = category_repo::insert(&db, "Desserts", "desserts", None).unwrap();

        let check = validate_ids(&db, &BTreeSet::from([a, b])).unwrap();
        assert!(check.is_complete());
        assert_eq!(check.found, BTreeSet::from([a, b]));
    }

    #[test]
    fn test_validate_ids_reports_missing() {
        let db = test_db();
        let a = category_repo::insert(&db, "Mains", "mains", None).unwrap();

        let check = validate_ids(&db, &BTreeSet::from([a, 999, 1000])).unwrap();
        assert!(!check.is_complete());
        assert_eq!(check.found, BTreeSet::from([a]));
        assert_eq!(check.missing, BTreeSet::from([999, 1000]));
    }

    #[test]
    fn test_validate_ids_empty_set() {
        let db = test_db();
        let check = validate_ids(&db, &BTreeSet::new()).unwrap();
        assert!(check.is_complete());
        assert!(check.found.is_empty());
    }
}
