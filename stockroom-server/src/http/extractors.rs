//! Custom Axum extractors

use axum::extract::{FromRequest, FromRequestParts, Multipart, Path, Request};
use axum::http::{header::CONTENT_TYPE, request::Parts};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::ApiError;
use crate::models::ValidationError;

/// Multipart field carrying an uploaded image
pub const IMAGE_FIELD: &str = "image";

/// Extract and validate a numeric id from path
pub struct ValidId(pub i64);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        let id = id.parse::<i64>().map_err(|_| {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "id",
                reason: "expected an integer id",
            })
        })?;

        Ok(Self(id))
    }
}

/// The `image` part of a multipart upload
#[derive(Debug)]
pub struct ImageUpload {
    /// Client-supplied file name, possibly empty
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let malformed = || {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: IMAGE_FIELD,
                reason: "malformed multipart body",
            })
        };

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|_| malformed())?;

        while let Some(field) = multipart.next_field().await.map_err(|_| malformed())? {
            if field.name() != Some(IMAGE_FIELD) {
                continue;
            }
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(|_| malformed())?;
            if bytes.is_empty() {
                break;
            }
            return Ok(Self {
                file_name,
                bytes: bytes.to_vec(),
            });
        }

        Err(ApiError::Validation(ValidationError::Empty { field: IMAGE_FIELD }))
    }
}

/// Request bodies that may also arrive as multipart form fields.
pub trait FormFields {
    /// Fields whose text is parsed as an integer
    const INTEGER_FIELDS: &'static [&'static str];
}

/// A create or update body, sent either as JSON or as a multipart form
/// with an optional `image` part alongside the text fields.
///
/// Form text is mapped onto the JSON shape: an empty value becomes
/// `null` and integer fields are parsed.
#[derive(Debug)]
pub struct WithImage<T> {
    pub body: T,
    pub image: Option<ImageUpload>,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

fn form_value<T: FormFields>(name: &str, text: String) -> Result<Value, ApiError> {
    if text.is_empty() {
        return Ok(Value::Null);
    }
    let Some(field) = T::INTEGER_FIELDS.iter().copied().find(|f| *f == name) else {
        return Ok(Value::String(text));
    };
    text.trim().parse::<i64>().map(Value::from).map_err(|_| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field,
            reason: "expected an integer",
        })
    })
}

impl<S, T> FromRequest<S> for WithImage<T>
where
    S: Send + Sync,
    T: DeserializeOwned + FormFields + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let Json(body) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self { body, image: None });
        }

        let malformed = || {
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "body",
                reason: "malformed multipart body",
            })
            .into_response()
        };

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|_| malformed())?;

        let mut fields = Map::new();
        let mut image = None;
        while let Some(field) = multipart.next_field().await.map_err(|_| malformed())? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            if name == IMAGE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|_| malformed())?;
                // A file input left blank still sends an empty part
                if !bytes.is_empty() {
                    image = Some(ImageUpload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }
            let text = field.text().await.map_err(|_| malformed())?;
            let value = form_value::<T>(&name, text).map_err(IntoResponse::into_response)?;
            fields.insert(name, value);
        }

        let body = serde_json::from_value(Value::Object(fields)).map_err(|e| {
            tracing::debug!(error = %e, "form fields rejected");
            ApiError::Validation(ValidationError::InvalidFormat {
                field: "body",
                reason: "form fields do not match the expected request",
            })
            .into_response()
        })?;

        Ok(Self { body, image })
    }
}
