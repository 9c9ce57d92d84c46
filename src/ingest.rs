//! Turns whatever the client uploaded into a decoded image. The pixels are
//! never looked at again; decoding only proves the upload is an image.

use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;
use thiserror::Error;

/// Where the image bytes came from
#[derive(Clone)]
pub enum ImageSource {
    /// A multipart file part
    Upload { filename: String, bytes: Vec<u8> },

    /// A base64 string, optionally a `data:` URL
    Base64(String),
}

impl std::fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSource::Upload { filename, bytes } => write!(
                f,
                "Upload {{ filename: {filename:?}, bytes: <{} bytes> }}",
                bytes.len()
            ),
            ImageSource::Base64(s) => write!(f, "Base64(<{} chars>)", s.len()),
        }
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No selected file")]
    NoSelectedFile,

    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(String),

    #[error("Invalid image content: {0}")]
    InvalidImage(#[from] image::ImageError),
}

/// A successfully decoded upload
pub struct DecodedImage {
    image: DynamicImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DecodedImage {{ {}x{} }}", self.width(), self.height())
    }
}

/// Strip a `data:<mime>;base64,` header if there is one
pub fn strip_data_url(input: &str) -> Result<&str, IngestError> {
    let Some(rest) = input.strip_prefix("data:") else {
        return Ok(input);
    };

    match rest.split_once(',') {
        Some((header, payload)) if header.ends_with(";base64") => Ok(payload),
        _ => Err(IngestError::InvalidBase64(
            "data URL is not base64 encoded".into(),
        )),
    }
}

pub fn decode_base64(input: &str) -> Result<Vec<u8>, IngestError> {
    let payload = strip_data_url(input.trim())?;
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| IngestError::InvalidBase64(e.to_string()))
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, IngestError> {
    let image = image::load_from_memory(bytes)?;
    Ok(DecodedImage { image })
}

/// Validate an upload end to end
pub fn ingest(source: ImageSource) -> Result<DecodedImage, IngestError> {
    let bytes = match source {
        ImageSource::Upload { filename, .. } if filename.is_empty() => {
            return Err(IngestError::NoSelectedFile)
        }
        ImageSource::Upload { bytes, .. } => bytes,
        ImageSource::Base64(encoded) => decode_base64(&encoded)?,
    };

    decode_image(&bytes)
}
