use crate::error::{AppError, Result};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cerfa::{map_record, raw_records, ApplicantRecord, CerfaFiller};
use pdf_core::inspect_form_fields;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Default request body cap (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Download name of every filled document
pub const FILLED_FILENAME: &str = "cerfa_13757_rempli.pdf";

/// Response header naming the path that produced the document
static FILL_METHOD_HEADER: HeaderName = HeaderName::from_static("x-fill-method");

/// Shared, read-only state of the service
#[derive(Clone)]
pub struct AppState {
    filler: Arc<CerfaFiller>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(filler: CerfaFiller) -> Self {
        Self {
            filler: Arc::new(filler),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }
}

/// Result of mapping every posted record
#[derive(Debug, Serialize, Deserialize)]
pub struct MappingResponse {
    pub mapping_reussi: bool,
    pub count: usize,
    pub donnees_mappees: Vec<ApplicantRecord>,
}

/// Form fields found in an uploaded PDF
#[derive(Debug, Serialize, Deserialize)]
pub struct DetectFieldsResponse {
    pub filename: String,
    pub has_form_fields: bool,
    pub fields_count: usize,
    pub fields_list: Vec<FieldInfo>,
    /// Set when the upload could not be parsed as a PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub value: String,
    pub index: usize,
}

/// Build the application router with all routes configured
pub fn app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/fill-cerfa", post(fill_cerfa))
        .route("/test-mapping", post(test_mapping))
        .route("/detect-fields", post(detect_fields))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness banner
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "CERFA 13757 Automation API",
        "status": "active",
    }))
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "cerfa-automation",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Fill the CERFA from a JSON body, or from a multipart upload
///
/// JSON: an array of records (the first one is used) or a single record;
/// the configured template is filled. Multipart: a `data` part holding the
/// same JSON and an optional `file` part with the PDF to fill.
pub async fn fill_cerfa(State(state): State<AppState>, request: Request) -> Result<Response> {
    let (upload, data) = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let form = read_form(multipart).await?;
        let data = form
            .data
            .ok_or_else(|| AppError::BadRequest("Missing 'data' part".to_string()))?;
        (form.file.map(|file| file.bytes), Bytes::from(data))
    } else {
        let body = Bytes::from_request(request, &state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        (None, body)
    };

    let record = first_record(&data)?;
    debug!(?record, "mapped record");

    let filler = Arc::clone(&state.filler);
    let outcome =
        tokio::task::spawn_blocking(move || filler.fill(upload.as_deref(), &record)).await??;

    info!(
        method = %outcome.method,
        bytes = outcome.pdf.len(),
        "CERFA generated"
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={FILLED_FILENAME}"),
            ),
            (FILL_METHOD_HEADER.clone(), outcome.method.as_str().to_string()),
        ],
        outcome.pdf,
    )
        .into_response())
}

/// Map every posted record without producing a PDF
pub async fn test_mapping(body: Bytes) -> Result<Json<MappingResponse>> {
    let records = raw_records(parse_json(&body)?)?;
    if records.is_empty() {
        return Err(AppError::BadRequest("No record received".to_string()));
    }

    let mapped: Vec<ApplicantRecord> = records.iter().map(map_record).collect();
    Ok(Json(MappingResponse {
        mapping_reussi: true,
        count: mapped.len(),
        donnees_mappees: mapped,
    }))
}

/// List the interactive form fields of an uploaded PDF
pub async fn detect_fields(request: Request) -> Result<Json<DetectFieldsResponse>> {
    let multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    let file = read_form(multipart)
        .await?
        .file
        .ok_or_else(|| AppError::BadRequest("Missing 'file' part".to_string()))?;

    let bytes = file.bytes;
    let inspection = tokio::task::spawn_blocking(move || inspect_form_fields(&bytes)).await?;
    info!(filename = %file.filename, count = inspection.count, "form fields detected");

    Ok(Json(DetectFieldsResponse {
        filename: file.filename,
        has_form_fields: inspection.has_fields,
        fields_count: inspection.count,
        fields_list: inspection
            .fields
            .into_iter()
            .map(|field| FieldInfo {
                name: field.name,
                field_type: field.field_type,
                value: field.value,
                index: field.index,
            })
            .collect(),
        error: inspection.error,
    }))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

fn is_pdf_filename(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

fn parse_json(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))
}

/// First record of a JSON body, mapped
fn first_record(body: &[u8]) -> Result<ApplicantRecord> {
    raw_records(parse_json(body)?)?
        .first()
        .map(map_record)
        .ok_or_else(|| AppError::BadRequest("No record received".to_string()))
}

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    data: Option<String>,
}

/// Collect the `file` and `data` parts; the file must be a `.pdf`
async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                if !is_pdf_filename(&filename) {
                    return Err(AppError::BadRequest(format!(
                        "'{filename}' is not a PDF file"
                    )));
                }
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file data: {e}"))
                })?;
                if bytes.is_empty() {
                    return Err(AppError::BadRequest(format!("'{filename}' is empty")));
                }
                form.file = Some(UploadedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("data") => {
                let text = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read data part: {e}"))
                })?;
                form.data = Some(text);
            }
            other => debug!(field = ?other, "ignoring multipart field"),
        }
    }

    Ok(form)
}
