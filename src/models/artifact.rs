use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::GenerationError;

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Sniff an image MIME type from its magic bytes.
pub fn sniff_mime_type(data: &[u8]) -> Option<&'static str> {
    match image::guess_format(data).ok()? {
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        image::ImageFormat::WebP => Some("image/webp"),
        image::ImageFormat::Gif => Some("image/gif"),
        _ => None,
    }
}

/// Raw encoded bytes of one successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedArtifact {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Build an artifact from decoded bytes, trusting the declared MIME type
    /// only when the bytes themselves are not recognisable.
    pub fn from_bytes(data: Vec<u8>, declared_mime: Option<&str>) -> Self {
        let mime_type = sniff_mime_type(&data)
            .or(declared_mime)
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();
        Self { data, mime_type }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    /// `data:` URL usable directly as an image source.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.to_base64())
    }

    pub fn file_extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }

    /// Width and height read from the image header.
    pub fn dimensions(&self) -> Result<(u32, u32), GenerationError> {
        image::ImageReader::new(Cursor::new(&self.data))
            .with_guessed_format()
            .map_err(|e| GenerationError::Decode(e.to_string()))?
            .into_dimensions()
            .map_err(|e| GenerationError::Decode(e.to_string()))
    }
}

/// A previously generated image fed back in for a remix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let mime_type = sniff_mime_type(&data)
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();
        Self { data, mime_type }
    }

    pub fn from_artifact(artifact: &GeneratedArtifact) -> Self {
        Self {
            data: artifact.data.clone(),
            mime_type: artifact.mime_type.clone(),
        }
    }

    /// Accepts `data:image/<png|jpeg|jpg|webp>;base64,...` or bare base64.
    pub fn from_data_url(url: &str) -> Result<Self, GenerationError> {
        let url = url.trim();
        let (declared, payload) = match url.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(";base64,").ok_or_else(|| {
                    GenerationError::InvalidRequest("data URL is not base64 encoded".into())
                })?;
                if !header.starts_with("image/") {
                    return Err(GenerationError::InvalidRequest(format!(
                        "unsupported reference media type: {}",
                        header
                    )));
                }
                (Some(header), payload)
            }
            None => (None, url),
        };

        let data = BASE64
            .decode(payload.as_bytes())
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        let mime_type = sniff_mime_type(&data)
            .or(declared)
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_string();

        Ok(Self { data, mime_type })
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }
}

impl From<&GeneratedArtifact> for ReferenceImage {
    fn from(artifact: &GeneratedArtifact) -> Self {
        ReferenceImage::from_artifact(artifact)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    /// Small 16:9 PNG used throughout the tests.
    pub fn png_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_pixel(16, 9, Rgb([40u8, 90, 160]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .expect("encode test png");
        out.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::png_bytes;
    use super::*;

    #[test]
    fn test_sniff_png() {
        assert_eq!(sniff_mime_type(&png_bytes()), Some("image/png"));
        assert_eq!(sniff_mime_type(b"not an image"), None);
    }

    #[test]
    fn test_artifact_prefers_sniffed_mime() {
        let artifact = GeneratedArtifact::from_bytes(png_bytes(), Some("image/jpeg"));
        assert_eq!(artifact.mime_type, "image/png");
        assert_eq!(artifact.file_extension(), "png");
        assert_eq!(artifact.dimensions().unwrap(), (16, 9));
    }

    #[test]
    fn test_artifact_data_url_round_trips_into_reference() {
        let artifact = GeneratedArtifact::from_bytes(png_bytes(), None);
        let url = artifact.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let reference = ReferenceImage::from_data_url(&url).unwrap();
        assert_eq!(reference.data, artifact.data);
        assert_eq!(reference.mime_type, "image/png");
    }

    #[test]
    fn test_reference_accepts_bare_base64() {
        let encoded = BASE64.encode(png_bytes());
        let reference = ReferenceImage::from_data_url(&encoded).unwrap();
        assert_eq!(reference.mime_type, "image/png");
    }

    #[test]
    fn test_reference_rejects_non_image_data_url() {
        let err = ReferenceImage::from_data_url("data:text/plain;base64,aGVsbG8=").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidRequest(_)));
    }

    #[test]
    fn test_garbage_has_no_dimensions() {
        let artifact = GeneratedArtifact::new(b"garbage".to_vec(), "image/png");
        assert!(matches!(
            artifact.dimensions(),
            Err(GenerationError::Decode(_))
        ));
    }
}
