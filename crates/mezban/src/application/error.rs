//! Application workflow error types.

use thiserror::Error;

use crate::db::DatabaseError;

/// Errors from the chef application workflow.
///
/// Every variant except `Storage` is a domain outcome the caller can act
/// on; `Storage` wraps unclassified persistence failures that have already
/// been logged with context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    /// A field failed its length or format constraint.
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    /// The request carried no main categories.
    #[error("At least one main category is required")]
    NoMainCategories,

    /// The request carried no sub categories.
    #[error("At least one sub category is required")]
    NoSubCategories,

    /// The user already has an application (pre-check or unique-constraint
    /// race — both are reported identically).
    #[error("Application already exists for this user")]
    AlreadyExists,

    /// Referenced category ids that are not in the store.
    #[error("Unknown category ids: {}", format_ids(.0))]
    UnknownCategories(Vec<i64>),

    /// A referenced category or user vanished between validation and
    /// persist.
    #[error("Invalid category or user reference")]
    InvalidReference,

    /// No application with the given id.
    #[error("Application {0} not found")]
    NotFound(i64),

    /// Status update attempted on an already-approved application.
    #[error("Application is already approved")]
    AlreadyApproved,

    /// Unclassified persistence failure.
    #[error("Storage failure: {0}")]
    Storage(#[from] DatabaseError),
}

fn format_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
