// Request extractors that route axum's raw inputs through `validation`
//
// `Params<T>` reads path and query parameters, `ValidJson<T>` reads a JSON
// body and `UploadForm` buffers a multipart form. All of them fail with
// `ApiError`, so every handler reports errors in the same 422 shape.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, Query, RawPathParams, Request},
    http::request::Parts,
};
use serde_json::Value;

use crate::error::ApiError;
use crate::validation::{ErrorDetail, ErrorKind, FromJson, Loc, Violations};

// ===== PATH & QUERY =====

/// Decoded path and query pairs of one request
#[derive(Debug, Default, Clone)]
pub struct RawParams {
    path: Vec<(String, String)>,
    query: Vec<(String, String)>,
}

impl RawParams {
    pub fn new(path: Vec<(String, String)>, query: Vec<(String, String)>) -> Self {
        Self { path, query }
    }

    pub fn path(&self, name: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Repeated query keys resolve to the last occurrence
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// A typed view over path and query parameters
pub trait FromParams: Sized {
    fn from_params(params: &RawParams) -> Result<Self, Vec<ErrorDetail>>;
}

/// Extractor for a `FromParams` type
#[derive(Debug)]
pub struct Params<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Params<T>
where
    T: FromParams,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let path: Vec<(String, String)> = RawPathParams::from_request_parts(parts, state)
            .await?
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        let Query(query) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)?;

        let params = RawParams::new(path, query);
        Ok(Params(T::from_params(&params)?))
    }
}

// ===== JSON BODY =====

/// JSON body decoded through `FromJson`.
///
/// The content type is not enforced; any body that parses as JSON is accepted.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<T: FromJson> ValidJson<T> {
    pub fn from_bytes(bytes: &[u8]) -> Result<T, ApiError> {
        let body = Loc::body();
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(vec![ErrorDetail::new(body, &ErrorKind::Missing)].into());
        }

        let value: Value = serde_json::from_slice(bytes).map_err(|e| {
            ApiError::from(vec![ErrorDetail::new(
                body.clone(),
                &ErrorKind::JsonDecode(e.to_string()),
            )])
        })?;

        let mut violations = Violations::new();
        let decoded = T::from_json(&value, &body, &mut violations);
        Ok(violations.finish(|| decoded)?)
    }
}

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: FromJson,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        Self::from_bytes(&bytes).map(ValidJson)
    }
}

// ===== MULTIPART FORM =====

/// One buffered part of a multipart form
#[derive(Debug, Clone)]
pub struct FormPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// A multipart form read fully into memory.
///
/// Size is bounded by the request body limit applied on the router.
#[derive(Debug, Default)]
pub struct UploadForm {
    parts: Vec<FormPart>,
}

impl UploadForm {
    pub fn new(parts: Vec<FormPart>) -> Self {
        Self { parts }
    }

    /// Last part named `name`, matching the query-string rule
    fn part(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().rev().find(|p| p.name == name)
    }

    /// Contents of field `name`, file or plain value
    pub fn bytes(&self, name: &str) -> Result<&Bytes, ApiError> {
        self.part(name)
            .map(|p| &p.data)
            .ok_or_else(|| missing_body_field(name, ErrorKind::Missing))
    }

    /// Field `name`, which must have been sent as a file
    pub fn file(&self, name: &str) -> Result<&FormPart, ApiError> {
        let part = self
            .part(name)
            .ok_or_else(|| missing_body_field(name, ErrorKind::Missing))?;
        if part.file_name.is_none() {
            return Err(missing_body_field(name, ErrorKind::NotAFile));
        }
        Ok(part)
    }
}

fn missing_body_field(name: &str, kind: ErrorKind) -> ApiError {
    ApiError::Validation(vec![ErrorDetail::new(Loc::body().key(name), &kind)])
}

#[async_trait]
impl<S> FromRequest<S> for UploadForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // A non-multipart body has no parts, so named lookups report "field required"
        let mut multipart = match Multipart::from_request(req, state).await {
            Ok(multipart) => multipart,
            Err(_) => return Ok(UploadForm::default()),
        };

        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await?;
            parts.push(FormPart {
                name,
                file_name,
                content_type,
                data,
            });
        }
        Ok(UploadForm::new(parts))
    }
}
