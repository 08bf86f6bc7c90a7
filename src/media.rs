//! Inline image encoding for post media and avatars.
//!
//! Images travel inside the JSON body as `data:<mime>;base64,<payload>`.
//! Only JPEG, PNG, GIF and WebP are accepted, identified by their magic
//! bytes, and the raw file may not exceed [`MAX_IMAGE_BYTES`].

use crate::error::{Result, YuyuError};
use base64::Engine;
use std::fmt;
use std::fs;
use std::path::Path;

/// Maximum raw image size (2 MB).
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageKind {
    /// MIME type used in the data URI.
    pub fn mime(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::WebP => "image/webp",
        }
    }

    /// Identifies the format from the leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageKind::WebP)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// A validated image, ready to upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    kind: ImageKind,
    size: usize,
    data_uri: String,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .finish()
    }
}

impl ImageData {
    /// Validates and encodes raw image bytes.
    ///
    /// # Errors
    /// Returns a media error if the data is empty, larger than
    /// [`MAX_IMAGE_BYTES`], or not one of the accepted formats.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(YuyuError::media("image is empty"));
        }
        check_size(bytes.len())?;
        let kind = ImageKind::sniff(bytes)
            .ok_or_else(|| YuyuError::media("only JPG, PNG, GIF or WebP images are supported"))?;

        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self {
            kind,
            size: bytes.len(),
            data_uri: format!("data:{};base64,{}", kind.mime(), payload),
        })
    }

    /// Reads, validates and encodes an image file.
    ///
    /// The size limit is checked against file metadata before reading.
    pub fn from_file(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        check_size(usize::try_from(metadata.len()).unwrap_or(usize::MAX))?;
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Raw size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn into_data_uri(self) -> String {
        self.data_uri
    }
}

fn check_size(size: usize) -> Result<()> {
    if size > MAX_IMAGE_BYTES {
        return Err(YuyuError::media(format!(
            "image exceeds maximum size of {} bytes",
            MAX_IMAGE_BYTES
        )));
    }
    Ok(())
}
