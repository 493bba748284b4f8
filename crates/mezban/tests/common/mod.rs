//! Test harness for isolated workflow execution.
//!
//! The `TestHarness` struct provides a seeded in-memory environment:
//! one applicant, one main and one sub category, and a workflow wired
//! to the same database handle for direct state inspection.

#![allow(dead_code)]

use mezban::db::{category_repo, user_repo, Database};
use mezban::{ApplicationWorkflow, FileDescriptor, NewApplication};

pub const NOW: &str = "2026-01-01T00:00:00Z";

pub struct TestHarness {
    pub db: Database,
    pub workflow: ApplicationWorkflow,
    pub user_id: i64,
    pub main_category_id: i64,
    pub sub_category_id: i64,
}

impl TestHarness {
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create test database");
        let user_id = user_repo::insert(&db, "joe@example.com", "Joe", NOW)
            .expect("Failed to seed user");
        let main_category_id = category_repo::insert(&db, "Mains", "mains", None)
            .expect("Failed to seed main category");
        let sub_category_id = category_repo::insert(&db, "Desserts", "desserts", None)
            .expect("Failed to seed sub category");
        let workflow = ApplicationWorkflow::new(db.clone());

        Self {
            db,
            workflow,
            user_id,
            main_category_id,
            sub_category_id,
        }
    }

    /// Seeds another user and returns their id.
    pub fn add_user(&self, email: &str, display_name: &str) -> i64 {
        user_repo::insert(&self.db, email, display_name, NOW).expect("Failed to seed user")
    }

    /// A valid application request for the seeded user.
    pub fn application(&self) -> NewApplication {
        NewApplication {
            user_id: self.user_id,
            business_name: "Joe's Kitchen".to_string(),
            description: "Ten+ years of home cooking experience".to_string(),
            main_category_ids: vec![self.main_category_id],
            sub_category_ids: vec![self.sub_category_id],
            certificate_files: vec![],
            document_files: vec![],
        }
    }

    pub fn sample_file(&self, filename: &str) -> FileDescriptor {
        FileDescriptor {
            filename: filename.to_string(),
            storage_path: format!("/uploads/{}", filename),
            mime_type: "application/pdf".to_string(),
        }
    }

    /// Reads the chef flag straight from the store.
    pub fn is_chef(&self, user_id: i64) -> bool {
        user_repo::find_by_id(&self.db, user_id)
            .expect("Failed to read user")
            .expect("User missing")
            .is_chef
    }

    /// Reads an application's raw stored status.
    pub fn stored_status(&self, application_id: i64) -> String {
        self.db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT status FROM chef_applications WHERE id = ?1",
                    [application_id],
                    |r| r.get(0),
                )?)
            })
            .expect("Failed to read status")
    }

    /// Counts stored application rows.
    pub fn application_count(&self) -> u32 {
        self.db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT COUNT(*) FROM chef_applications", [], |r| r.get(0))?)
            })
            .expect("Failed to count applications")
    }

    /// Removes a user row with foreign keys disabled, simulating the
    /// owner vanishing underneath an otherwise valid application.
    pub fn delete_user_unchecked(&self, user_id: i64) {
        self.db
            .with_conn(|conn| {
                conn.execute_batch("PRAGMA foreign_keys=OFF;")?;
                conn.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
                conn.execute_batch("PRAGMA foreign_keys=ON;")?;
                Ok(())
            })
            .expect("Failed to delete user");
    }
}
