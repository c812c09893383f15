//! Trip sheet documents and the Word template
//!
//! `GET /api/scans/:id/document` renders either the built-in HTML sheet or
//! the uploaded `.docx` template. The template is stored as a single file in
//! the root folder.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dispatch_common::db::TripSheetStatus;
use dispatch_common::time;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::{scans, settings};
use crate::render::{docx, html, Placeholder, TripSheet, PLACEHOLDERS};
use crate::{ApiError, ApiResult, AppState};

/// Largest accepted template upload (10 MB)
const MAX_TEMPLATE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Html,
    Docx,
}

#[derive(Debug, Default, Deserialize)]
pub struct DocumentQuery {
    #[serde(default)]
    pub format: DocumentFormat,
}

/// Whether a template is installed
#[derive(Debug, Serialize)]
pub struct TemplateStatus {
    pub exists: bool,
    pub size: Option<u64>,
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// GET /api/scans/:id/document?format=html|docx
pub async fn render_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DocumentQuery>,
) -> ApiResult<Response> {
    let record = scans::require_scan(&state.db, &id).await?;
    let profile = settings::get_profile(&state.db).await?;
    let sheet = TripSheet::new(&record, &profile);

    let response = match query.format {
        DocumentFormat::Html => {
            let body = html::render(&sheet).into_bytes();
            attachment(html::CONTENT_TYPE, &format!("{}.doc", sheet.file_stem()), body)
        }
        DocumentFormat::Docx => {
            let template = match tokio::fs::read(&state.template_path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Err(ApiError::NotFound(
                        "No Word template uploaded".to_string(),
                    ))
                }
                Err(e) => return Err(e.into()),
            };
            let body = docx::render(&template, &sheet)?;
            attachment(docx::CONTENT_TYPE, &format!("{}.docx", sheet.file_stem()), body)
        }
    };

    if record.trip_sheet_status == TripSheetStatus::Generated {
        scans::set_status(&state.db, &id, TripSheetStatus::Printed, time::now()).await?;
    }

    info!(id = %id, format = ?query.format, "Trip sheet rendered");
    Ok(response)
}

/// GET /api/template
pub async fn template_status(State(state): State<AppState>) -> ApiResult<Json<TemplateStatus>> {
    match tokio::fs::metadata(&state.template_path).await {
        Ok(meta) => Ok(Json(TemplateStatus {
            exists: true,
            size: Some(meta.len()),
        })),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Json(TemplateStatus {
            exists: false,
            size: None,
        })),
        Err(e) => Err(e.into()),
    }
}

/// PUT /api/template (body: the .docx file)
pub async fn upload_template(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<TemplateStatus>> {
    docx::validate_template(&body)?;

    if let Some(parent) = state.template_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&state.template_path, &body).await?;

    info!(path = %state.template_path.display(), size = body.len(), "Word template uploaded");
    Ok(Json(TemplateStatus {
        exists: true,
        size: Some(body.len() as u64),
    }))
}

/// DELETE /api/template
pub async fn delete_template(State(state): State<AppState>) -> ApiResult<Json<TemplateStatus>> {
    match tokio::fs::remove_file(&state.template_path).await {
        Ok(()) => {
            info!("Word template removed");
            Ok(Json(TemplateStatus {
                exists: false,
                size: None,
            }))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Template delete requested but none is installed");
            Err(ApiError::NotFound("No Word template uploaded".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/template/placeholders
pub async fn list_placeholders() -> Json<&'static [Placeholder]> {
    Json(PLACEHOLDERS)
}

/// Build document and template routes
pub fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/api/scans/:id/document", get(render_document))
        .route(
            "/api/template",
            get(template_status)
                .put(upload_template)
                .delete(delete_template)
                .layer(DefaultBodyLimit::max(MAX_TEMPLATE_BYTES)),
        )
        .route("/api/template/placeholders", get(list_placeholders))
}
