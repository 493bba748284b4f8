//! Chef application domain types and review workflow.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::db::application_repo::ApplicationDetails;

pub mod error;
pub mod workflow;

pub use error::ApplicationError;
pub use workflow::ApplicationWorkflow;

/// Review status of a chef application.
///
/// `Approved` is terminal: once an application is approved no further
/// transition is accepted. A rejected application may still be re-reviewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Parses a stored status string. Unknown values fall back to
    /// `Pending` with a warning, matching how other stored enums degrade.
    pub fn parse(s: &str, application_id: i64) -> Self {
        match s {
            "pending" => ApplicationStatus::Pending,
            "approved" => ApplicationStatus::Approved,
            "rejected" => ApplicationStatus::Rejected,
            other => {
                log::warn!(
                    "Unknown application status '{}' for application {}, defaulting to pending",
                    other,
                    application_id
                );
                ApplicationStatus::Pending
            }
        }
    }

    /// Whether the status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Approved)
    }
}

/// Role a stored file plays on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Certificate,
    Document,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Certificate => "certificate",
            FileKind::Document => "document",
        }
    }
}

/// Metadata for one uploaded file. Byte storage happens before the
/// workflow runs; the workflow only records the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub filename: String,
    pub storage_path: String,
    pub mime_type: String,
}

/// The applicant as attached to an application for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: i64,
    pub email: String,
    pub display_name: String,
    pub is_chef: bool,
}

/// A chef application hydrated with its owner, categories and files.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChefApplication {
    pub id: i64,
    pub user: Applicant,
    pub business_name: String,
    pub description: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<String>,
    pub main_categories: Vec<Category>,
    pub sub_categories: Vec<Category>,
    pub certificate_files: Vec<FileDescriptor>,
    pub document_files: Vec<FileDescriptor>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ApplicationDetails> for ChefApplication {
    fn from(details: ApplicationDetails) -> Self {
        let status = ApplicationStatus::parse(&details.row.status, details.row.id);
        Self {
            id: details.row.id,
            user: Applicant {
                id: details.user.id,
                email: details.user.email,
                display_name: details.user.display_name,
                is_chef: details.user.is_chef,
            },
            business_name: details.row.business_name,
            description: details.row.description,
            status,
            review_notes: details.row.review_notes,
            reviewed_by: details.row.reviewed_by,
            reviewed_at: details.row.reviewed_at,
            main_categories: details.main_categories.into_iter().map(Into::into).collect(),
            sub_categories: details.sub_categories.into_iter().map(Into::into).collect(),
            certificate_files: details.certificate_files,
            document_files: details.document_files,
            created_at: details.row.created_at,
            updated_at: details.row.updated_at,
        }
    }
}

/// Input for creating a chef application.
#[derive(Debug, Clone, Default)]
pub struct NewApplication {
    pub user_id: i64,
    pub business_name: String,
    pub description: String,
    pub main_category_ids: Vec<i64>,
    pub sub_category_ids: Vec<i64>,
    pub certificate_files: Vec<FileDescriptor>,
    pub document_files: Vec<FileDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(ApplicationStatus::parse(status.as_str(), 1), status);
        }
    }

    #[test]
    fn test_unknown_status_defaults_to_pending() {
        assert_eq!(
            ApplicationStatus::parse("garbage", 1),
            ApplicationStatus::Pending
        );
    }

    #[test]
    fn test_only_approved_is_terminal() {
        assert!(ApplicationStatus::Approved.is_terminal());
        assert!(!ApplicationStatus::Pending.is_terminal());
        assert!(!ApplicationStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&ApplicationStatus::Approved).unwrap(),
            "\"approved\""
        );
        let parsed: ApplicationStatus = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(parsed, ApplicationStatus::Rejected);
    }
}
