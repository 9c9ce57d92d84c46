//! The user-facing JSON web server. Requests are validated by the ingestor,
//! "classified" by the mock classifier and answered with a
//! `ClassificationResult`.

use crate::catalog::Catalog;
use crate::classifier::MockClassifier;
use crate::config::Settings;
use crate::ingest::IngestError;
use actix_multipart::MultipartError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use protocol::ClassificationResult;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

pub mod protocol;
pub mod routes;

pub const NO_IMAGE_PROVIDED: &str = "No image provided";

/// Shared, read-only state handed to every request
#[derive(Debug)]
pub struct AppState {
    pub classifier: MockClassifier,

    /// Sleep this long before answering, to feel like real inference
    pub inference_delay: Duration,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(settings: &Settings, catalog: Arc<Catalog>) -> Self {
        AppState {
            classifier: MockClassifier::new(catalog, settings.sampling_policy()),
            inference_delay: settings.inference_delay(),
            max_upload_bytes: settings.max_upload_bytes,
        }
    }
}

/// Register every route on an actix `App`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::classify_waste).service(routes::health);
}

#[derive(Debug, Error)]
pub enum WebError {
    /// Nothing usable was uploaded
    #[error("{0}")]
    MissingInput(&'static str),

    #[error("{0}")]
    MalformedRequest(String),

    #[error("{0}")]
    InvalidImage(IngestError),

    #[error("Upload exceeds the {0} byte limit")]
    PayloadTooLarge(usize),

    #[error("Server processing failed: {0}")]
    Internal(#[from] anyhow::Error),
}

impl actix_web::error::ResponseError for WebError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{self}");
        } else {
            warn!(%status, "rejected request: {self}");
        }

        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .json(ClassificationResult::failure(self.to_string()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            WebError::MissingInput(_)
            | WebError::MalformedRequest(_)
            | WebError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            WebError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IngestError> for WebError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NoSelectedFile => WebError::MissingInput("No selected file"),
            err => WebError::InvalidImage(err),
        }
    }
}

impl From<MultipartError> for WebError {
    fn from(err: MultipartError) -> Self {
        WebError::MalformedRequest(format!("Malformed multipart body: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;
    use anyhow::anyhow;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebError::MissingInput(NO_IMAGE_PROVIDED).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebError::from(IngestError::InvalidBase64("bad".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebError::PayloadTooLarge(10).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            WebError::from(anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_no_selected_file_is_missing_input() {
        let err = WebError::from(IngestError::NoSelectedFile);
        assert!(matches!(err, WebError::MissingInput("No selected file")));
    }

    #[actix_web::test]
    async fn test_error_body_shape() {
        let res = WebError::from(anyhow!("disk on fire")).error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(res.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Server processing failed: disk on fire");
        assert_eq!(body["total_materials_detected"], 0);
        assert_eq!(body["summary"]["recyclable_items"], 0);
        assert_eq!(body["summary"]["hazardous_items"], 0);
        assert_eq!(body["summary"]["general_waste_items"], 0);
        assert_eq!(body["materials"], serde_json::json!([]));
    }
}
