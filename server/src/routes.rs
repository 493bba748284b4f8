use std::sync::Arc;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use mezban::{ApplicationError, ApplicationStatus, ChefApplication, FileDescriptor, NewApplication};

use crate::auth::Identity;
use crate::error::ApiError;
use crate::state::AppState;

/// `PUT /chef-applications/:id/status` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
    pub review_notes: Option<String>,
}

/// `POST /chef-applications` — submit a chef application.
pub async fn create_application_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut business_name = None;
    let mut description = None;
    let mut main_category_ids = None;
    let mut sub_category_ids = None;
    let mut certificate_files = Vec::new();
    let mut document_files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::MalformedPayload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "businessName" => business_name = Some(text(field).await?),
            "description" => description = Some(text(field).await?),
            "mainCategoryIds" => main_category_ids = Some(parse_ids(&name, &text(field).await?)?),
            "subCategoryIds" => sub_category_ids = Some(parse_ids(&name, &text(field).await?)?),
            "certificateFiles" => certificate_files.push(store_file(&state, field).await?),
            "documentFiles" => document_files.push(store_file(&state, field).await?),
            // Unknown fields are ignored, matching a lenient multipart parser.
            _ => {}
        }
    }

    let stored: Vec<String> = certificate_files
        .iter()
        .chain(document_files.iter())
        .map(|f| f.storage_path.clone())
        .collect();

    let new = NewApplication {
        user_id: identity.user_id,
        business_name: business_name
            .ok_or_else(|| ApiError::MalformedPayload("businessName is required".to_string()))?,
        description: description
            .ok_or_else(|| ApiError::MalformedPayload("description is required".to_string()))?,
        main_category_ids: main_category_ids.unwrap_or_default(),
        sub_category_ids: sub_category_ids.unwrap_or_default(),
        certificate_files,
        document_files,
    };

    let workflow = state.workflow.clone();
    match run_blocking(move || workflow.create(new)).await {
        Ok(app) => Ok((StatusCode::CREATED, Json(app))),
        Err(e) => {
            remove_stored_files(&stored);
            Err(e)
        }
    }
}

/// `GET /chef-applications` — list all applications for review.
pub async fn list_applications_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
) -> Result<Json<Vec<ChefApplication>>, ApiError> {
    identity.require_admin()?;

    let workflow = state.workflow.clone();
    let apps = run_blocking(move || workflow.find_all()).await?;
    Ok(Json(apps))
}

/// `GET /chef-applications/:id` — fetch one application.
pub async fn get_application_handler(
    State(state): State<Arc<AppState>>,
    _identity: Identity,
    Path(id): Path<i64>,
) -> Result<Json<ChefApplication>, ApiError> {
    let workflow = state.workflow.clone();
    let app = run_blocking(move || workflow.find_one(id)).await?;
    Ok(Json(app))
}

/// `PUT /chef-applications/:id/status` — review an application.
pub async fn update_status_handler(
    State(state): State<Arc<AppState>>,
    identity: Identity,
    Path(id): Path<i64>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ChefApplication>, ApiError> {
    identity.require_admin()?;

    let workflow = state.workflow.clone();
    let app = run_blocking(move || {
        workflow.update_status(id, request.status, request.review_notes, identity.user_id)
    })
    .await?;
    Ok(Json(app))
}

/// Runs a workflow call on the blocking pool; rusqlite calls must not sit
/// on the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApplicationError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => {
            tracing::error!(error = %e, "Blocking task failed");
            Err(ApiError::Internal)
        }
    }
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::MalformedPayload(e.to_string()))
}

/// Category id fields arrive as JSON array strings inside the multipart
/// form, e.g. `"[1, 2]"`.
fn parse_ids(field: &str, raw: &str) -> Result<Vec<i64>, ApiError> {
    serde_json::from_str(raw).map_err(|_| {
        ApiError::MalformedPayload(format!("{} must be a JSON array of integers", field))
    })
}

async fn store_file(state: &AppState, field: Field<'_>) -> Result<FileDescriptor, ApiError> {
    let filename = field.file_name().unwrap_or("upload").to_string();
    let declared_mime = field.content_type().map(|m| m.to_string());
    let bytes = field
        .bytes()
        .await
        .map_err(|e| ApiError::MalformedPayload(e.to_string()))?;

    Ok(state
        .uploads
        .store(&filename, declared_mime.as_deref(), &bytes)?)
}

/// Best-effort cleanup of files stored for a request the workflow
/// rejected.
fn remove_stored_files(paths: &[String]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = %path, error = %e, "Failed to remove stored upload");
        }
    }
}
