//! Review workflow orchestration: create, read and status transitions.

use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};

use crate::category;
use crate::db::{application_repo, user_repo, Database, DatabaseError};

use super::error::ApplicationError;
use super::{ApplicationStatus, ChefApplication, NewApplication};

const BUSINESS_NAME_MIN: usize = 3;
const BUSINESS_NAME_MAX: usize = 100;
const DESCRIPTION_MIN: usize = 10;
const DESCRIPTION_MAX: usize = 1000;
const REVIEW_NOTES_MAX: usize = 1000;

/// Orchestrates the chef application lifecycle over the store.
///
/// Cloning is cheap; the inner database handle is shared.
#[derive(Clone)]
pub struct ApplicationWorkflow {
    db: Database,
}

impl ApplicationWorkflow {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates an application for `new.user_id` with status `pending`.
    ///
    /// Validation short-circuits in a fixed order so error causes are
    /// predictable: field bounds, empty category roles, duplicate
    /// application, then unknown category ids. The duplicate check always
    /// wins over category errors — including when a concurrent create
    /// slips past the pre-check and trips the unique constraint instead.
    pub fn create(&self, mut new: NewApplication) -> Result<ChefApplication, ApplicationError> {
        validate_length(
            "business name",
            &new.business_name,
            BUSINESS_NAME_MIN,
            BUSINESS_NAME_MAX,
        )?;
        validate_length(
            "description",
            &new.description,
            DESCRIPTION_MIN,
            DESCRIPTION_MAX,
        )?;
        if new.main_category_ids.is_empty() {
            return Err(ApplicationError::NoMainCategories);
        }
        if new.sub_category_ids.is_empty() {
            return Err(ApplicationError::NoSubCategories);
        }

        // A repeated id within a role would violate the junction primary key.
        new.main_category_ids = dedupe(&new.main_category_ids);
        new.sub_category_ids = dedupe(&new.sub_category_ids);

        let existing = application_repo::find_by_user(&self.db, new.user_id)
            .map_err(|e| log_storage_failure("create", Some(new.user_id), e))?;
        if existing.is_some() {
            return Err(ApplicationError::AlreadyExists);
        }

        let requested: BTreeSet<i64> = new
            .main_category_ids
            .iter()
            .chain(new.sub_category_ids.iter())
            .copied()
            .collect();
        let check = category::validate_ids(&self.db, &requested)
            .map_err(|e| log_storage_failure("create", Some(new.user_id), e))?;
        if !check.is_complete() {
            return Err(ApplicationError::UnknownCategories(
                check.missing.into_iter().collect(),
            ));
        }

        let now = now_rfc3339();
        let id = application_repo::insert(&self.db, &new, &now)
            .map_err(|e| translate_create_error(new.user_id, e))?;

        tracing::info!(application_id = id, user_id = new.user_id, "Chef application created");
        self.load(id)
    }

    /// Lists all applications for administrative review, newest first.
    pub fn find_all(&self) -> Result<Vec<ChefApplication>, ApplicationError> {
        let details = application_repo::find_all(&self.db)
            .map_err(|e| log_storage_failure("list", None, e))?;
        Ok(details.into_iter().map(Into::into).collect())
    }

    /// Fetches one application by id.
    pub fn find_one(&self, id: i64) -> Result<ChefApplication, ApplicationError> {
        self.load(id)
    }

    /// Transitions an application's status, recording the reviewer.
    ///
    /// The terminal-state check and both writes (application row, owner's
    /// chef flag) run inside one transaction: concurrent reviews cannot
    /// both pass the check, and a failed promotion rolls the status write
    /// back.
    pub fn update_status(
        &self,
        id: i64,
        new_status: ApplicationStatus,
        review_notes: Option<String>,
        reviewed_by: i64,
    ) -> Result<ChefApplication, ApplicationError> {
        if let Some(notes) = &review_notes {
            validate_length("review notes", notes, 0, REVIEW_NOTES_MAX)?;
        }

        let now = now_rfc3339();
        let result: Result<(), ApplicationError> = self.db.with_tx(|tx| {
            let (current, user_id) =
                application_repo::status_tx(tx, id)?.ok_or(ApplicationError::NotFound(id))?;
            if ApplicationStatus::parse(&current, id).is_terminal() {
                return Err(ApplicationError::AlreadyApproved);
            }

            application_repo::update_status_tx(
                tx,
                id,
                new_status.as_str(),
                review_notes.as_deref(),
                reviewed_by,
                &now,
            )?;

            if new_status == ApplicationStatus::Approved {
                user_repo::set_is_chef_tx(tx, user_id, true, &now)?;
            }
            Ok(())
        });

        match result {
            Ok(()) => {
                tracing::info!(
                    application_id = id,
                    status = new_status.as_str(),
                    reviewed_by,
                    "Chef application reviewed"
                );
                self.load(id)
            }
            Err(ApplicationError::Storage(e)) => Err(log_storage_failure("update status", Some(id), e)),
            Err(other) => Err(other),
        }
    }

    fn load(&self, id: i64) -> Result<ChefApplication, ApplicationError> {
        let details = application_repo::find_by_id(&self.db, id)
            .map_err(|e| log_storage_failure("load", Some(id), e))?
            .ok_or(ApplicationError::NotFound(id))?;
        Ok(details.into())
    }
}

/// Maps a persistence failure during create to its domain meaning.
///
/// A unique violation on the owning user is authoritative proof an
/// application now exists (the concurrent-create race); an FK violation
/// means a validated category or the user vanished before the write.
fn translate_create_error(user_id: i64, e: DatabaseError) -> ApplicationError {
    if e.is_unique_violation("chef_applications.user_id") {
        ApplicationError::AlreadyExists
    } else if e.is_foreign_key_violation() {
        ApplicationError::InvalidReference
    } else {
        log_storage_failure("create", Some(user_id), e)
    }
}

fn log_storage_failure(
    operation: &str,
    subject_id: Option<i64>,
    e: DatabaseError,
) -> ApplicationError {
    tracing::error!(operation, subject_id, error = %e, "Application storage failure");
    ApplicationError::Storage(e)
}

fn validate_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ApplicationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ApplicationError::InvalidField {
            field,
            reason: format!("must be at least {} characters", min),
        });
    }
    if len > max {
        return Err(ApplicationError::InvalidField {
            field,
            reason: format!("must be at most {} characters", max),
        });
    }
    Ok(())
}

fn dedupe(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
