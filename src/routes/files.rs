// File routes: path-style parameters and multipart uploads

use axum::response::Json;
use serde_json::{json, Value};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiResult, HttpValidationError};
use crate::extract::{FromParams, Params, RawParams, UploadForm};
use crate::validation::{required, ErrorDetail, Loc, Violations};

pub const FILE_FIELD: &str = "file";

// ===== REQUEST TYPES =====

#[derive(Debug, PartialEq, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct FilePath {
    /// Everything after `/files/`, slashes included
    pub file_path: String,
}

impl FromParams for FilePath {
    fn from_params(params: &RawParams) -> Result<Self, Vec<ErrorDetail>> {
        let mut violations = Violations::new();
        let file_path = violations.check(
            Loc::path("file_path"),
            required(params.path("file_path")).map(str::to_string),
        );
        violations.finish(|| Some(FilePath { file_path: file_path? }))
    }
}

/// Multipart body of the upload routes
#[derive(ToSchema)]
pub struct FileUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

// ===== ROUTE HANDLERS =====

/// GET /files/*file_path
#[utoipa::path(
    get,
    path = "/files/{file_path}",
    params(FilePath),
    responses((status = 200, description = "Successful Response"))
)]
pub async fn read_file(Params(path): Params<FilePath>) -> Json<Value> {
    Json(json!({ "file_path": path.file_path }))
}

/// GET /files/
/// The catch-all route needs a non-empty remainder; an empty one lands here
#[utoipa::path(
    get,
    path = "/files/",
    responses((status = 200, description = "Successful Response"))
)]
pub async fn read_file_root() -> Json<Value> {
    Json(json!({ "file_path": "" }))
}

/// POST /files/
/// Read the `file` field fully and report its size
#[utoipa::path(
    post,
    path = "/files/",
    request_body(content = FileUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Successful Response"),
        (status = 422, description = "Validation Error", body = HttpValidationError),
    )
)]
pub async fn create_file(form: UploadForm) -> ApiResult<Json<Value>> {
    let contents = form.bytes(FILE_FIELD)?;
    debug!(size = contents.len(), "file received");

    Ok(Json(json!({ "file_size": contents.len() })))
}

/// POST /uploadfile/
/// Report the client-side name of the uploaded `file`
#[utoipa::path(
    post,
    path = "/uploadfile/",
    request_body(content = FileUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Successful Response"),
        (status = 422, description = "Validation Error", body = HttpValidationError),
    )
)]
pub async fn create_upload_file(form: UploadForm) -> ApiResult<Json<Value>> {
    let upload = form.file(FILE_FIELD)?;
    debug!(
        filename = ?upload.file_name,
        content_type = ?upload.content_type,
        size = upload.data.len(),
        "upload received"
    );

    Ok(Json(json!({ "filename": upload.file_name })))
}
