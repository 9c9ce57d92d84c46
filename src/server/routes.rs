//! HTTP routes. `/classify_waste` accepts an image as a multipart upload, a
//! JSON body or a url-encoded form, and answers with a mock classification.

use super::protocol::{self, ClassificationResult};
use super::{AppState, WebError, NO_IMAGE_PROVIDED};
use crate::ingest::{self, ImageSource};
use actix_multipart::{Field, Multipart};
use actix_web::http::header;
use actix_web::{get, post, web, HttpRequest, HttpResponse, Responder};
use anyhow::anyhow;
use futures_util::StreamExt;
use tracing::*;

type Result<T> = std::result::Result<T, WebError>;

#[post("/classify_waste")]
pub async fn classify_waste(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    // Find the image in whatever shape the client sent it
    let source = read_image_source(&req, payload, state.max_upload_bytes).await?;
    debug!(?source, "received image");

    // Decoding is CPU bound, keep it off the worker thread
    let image = web::block(move || ingest::ingest(source))
        .await
        .map_err(|e| anyhow!("image decoding was aborted: {e}"))??;

    let result = {
        let mut rng = rand::thread_rng();
        ClassificationResult::from(state.classifier.classify(&image, &mut rng))
    };

    if !state.inference_delay.is_zero() {
        tokio::time::sleep(state.inference_delay).await;
    }

    info!(
        width = image.width(),
        height = image.height(),
        success = result.success,
        materials = result.total_materials_detected,
        "finished serving classification request"
    );

    Ok(HttpResponse::Ok().json(result))
}

#[get("/health")]
pub async fn health() -> impl Responder {
    web::Json(protocol::Health::ok())
}

#[instrument(skip_all)]
async fn read_image_source(
    req: &HttpRequest,
    payload: web::Payload,
    limit: usize,
) -> Result<ImageSource> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        return read_multipart(Multipart::new(req.headers(), payload), limit).await;
    }

    let body = read_body(payload, limit).await?;
    let form: protocol::B64Image = if body.is_empty() {
        protocol::B64Image::default()
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        serde_urlencoded::from_bytes(&body)
            .map_err(|e| WebError::MalformedRequest(format!("Invalid form body: {e}")))?
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| WebError::MalformedRequest(format!("Invalid JSON body: {e}")))?
    };

    form.image_base64
        .filter(|s| !s.trim().is_empty())
        .map(ImageSource::Base64)
        .ok_or(WebError::MissingInput(NO_IMAGE_PROVIDED))
}

/// Pick the image out of a multipart form. A named file wins over
/// `image_base64`; an unnamed file only counts when nothing else was sent.
async fn read_multipart(mut multipart: Multipart, limit: usize) -> Result<ImageSource> {
    let mut budget = limit;
    let mut upload: Option<ImageSource> = None;
    let mut encoded: Option<String> = None;

    while let Some(field) = multipart.next().await {
        let mut field = field?;
        let disposition = field.content_disposition().clone();
        let bytes = read_field(&mut field, &mut budget, limit).await?;

        match disposition.get_name().unwrap_or_default() {
            "image" | "file" if upload.as_ref().map_or(true, is_unnamed_upload) => {
                let filename = disposition.get_filename().unwrap_or_default().to_owned();
                upload = Some(ImageSource::Upload { filename, bytes });
            }
            "image_base64" if encoded.is_none() => {
                let text = String::from_utf8(bytes).map_err(|_| {
                    WebError::MalformedRequest("image_base64 is not valid UTF-8".into())
                })?;
                encoded = Some(text).filter(|s| !s.trim().is_empty());
            }
            name => debug!(name, "ignoring multipart field"),
        }
    }

    match (upload, encoded) {
        (Some(ImageSource::Upload { filename, bytes }), _) if !filename.is_empty() => {
            Ok(ImageSource::Upload { filename, bytes })
        }
        (_, Some(encoded)) => Ok(ImageSource::Base64(encoded)),
        (Some(upload), None) => Ok(upload),
        (None, None) => Err(WebError::MissingInput(NO_IMAGE_PROVIDED)),
    }
}

fn is_unnamed_upload(source: &ImageSource) -> bool {
    matches!(source, ImageSource::Upload { filename, .. } if filename.is_empty())
}

async fn read_field(field: &mut Field, budget: &mut usize, limit: usize) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        *budget = budget
            .checked_sub(chunk.len())
            .ok_or(WebError::PayloadTooLarge(limit))?;
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn read_body(mut payload: web::Payload, limit: usize) -> Result<web::BytesMut> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| anyhow!("failed to read request body: {e}"))?;
        if body.len() + chunk.len() > limit {
            return Err(WebError::PayloadTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
