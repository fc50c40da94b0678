//! Input documents and conversions between formats.
//!
//! A [`FileFormat`] is an immutable binary payload tagged with its MIME type.
//! Conversions are capability based: callers ask [`FileFormat::can_convert_to`]
//! before calling [`FileFormat::convert_to`], which turns e.g. a PDF into one
//! PNG image per page.

pub(crate) mod pdf;

pub use pdf::{PdfDocument, RENDER_SCALE};

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FormatError;

/// Broad family of a document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// Portable Document Format.
    Pdf,
    /// Single raster image.
    Image,
    /// Plain or markup text.
    Text,
    /// Anything else.
    Other,
}

impl FormatKind {
    /// Classify a MIME type.
    pub fn from_mime(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" => FormatKind::Pdf,
            "application/json" | "application/xml" => FormatKind::Text,
            s if s.starts_with("image/") => FormatKind::Image,
            s if s.starts_with("text/") => FormatKind::Text,
            _ => FormatKind::Other,
        }
    }
}

/// An input document.
#[derive(Debug, Clone)]
pub struct FileFormat {
    binary: Arc<[u8]>,
    mime_type: String,
    kind: FormatKind,
    file_name: Option<String>,
}

impl FileFormat {
    /// Wrap bytes with a declared MIME type.
    pub fn from_binary(binary: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        let mime_type = mime_type.into();
        Self {
            binary: Arc::from(binary.into()),
            kind: FormatKind::from_mime(&mime_type),
            mime_type,
            file_name: None,
        }
    }

    /// Read a file, guessing the MIME type from its extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let binary = std::fs::read(path)?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        debug!("Loaded {} ({}, {} bytes)", path.display(), mime_type, binary.len());

        Ok(Self::from_binary(binary, mime_type)
            .with_file_name(path.file_name().map(|n| n.to_string_lossy().into_owned())))
    }

    fn with_file_name(mut self, file_name: Option<String>) -> Self {
        self.file_name = file_name;
        self
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> FormatKind {
        self.kind
    }

    pub fn binary(&self) -> &[u8] {
        &self.binary
    }

    /// Original file name, or a name derived from the MIME type.
    pub fn file_name(&self) -> String {
        self.file_name.clone().unwrap_or_else(|| {
            let extension = mime_guess::get_mime_extensions_str(&self.mime_type)
                .and_then(|exts| exts.first().copied())
                .unwrap_or("bin");
            format!("document.{}", extension)
        })
    }

    /// File extension matching the MIME type, without the dot.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            _ => mime_guess::get_mime_extensions_str(&self.mime_type)
                .and_then(|exts| exts.first().copied())
                .unwrap_or("bin"),
        }
    }

    /// Check whether a conversion path to `target` exists.
    pub fn can_convert_to(&self, target: FormatKind) -> bool {
        matches!(
            (self.kind, target),
            (FormatKind::Image, FormatKind::Image)
                | (FormatKind::Text, FormatKind::Text)
                | (FormatKind::Pdf, FormatKind::Pdf)
                | (FormatKind::Pdf, FormatKind::Image)
                | (FormatKind::Pdf, FormatKind::Text)
        )
    }

    /// Convert to documents of `target` kind.
    ///
    /// Converting a PDF to images renders each whole page to a PNG, in page
    /// order, so text-only and mixed pages keep all of their content.
    /// Converting to the same kind returns the document itself.
    pub fn convert_to(&self, target: FormatKind) -> Result<Vec<FileFormat>, FormatError> {
        if !self.can_convert_to(target) {
            return Err(FormatError::UnsupportedConversion {
                mime_type: self.mime_type.clone(),
                from: self.kind,
                to: target,
            });
        }

        if self.kind == target {
            return Ok(vec![self.clone()]);
        }

        let pdf = PdfDocument::load(&self.binary)?;
        let stem = self.file_stem();

        match target {
            FormatKind::Text => Ok(vec![
                FileFormat::from_binary(pdf.text()?.into_bytes(), "text/plain")
                    .with_file_name(Some(format!("{}.txt", stem))),
            ]),
            _ => pdf
                .render_pages(RENDER_SCALE)?
                .into_iter()
                .enumerate()
                .map(|(i, image)| -> Result<FileFormat, FormatError> {
                    let mut png = Vec::new();
                    image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
                    Ok(FileFormat::from_binary(png, "image/png")
                        .with_file_name(Some(format!("{}-page-{}.png", stem, i + 1))))
                })
                .collect(),
        }
    }

    /// Decode the payload as UTF-8 text (lossy).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.binary).into_owned()
    }

    fn file_stem(&self) -> String {
        self.file_name
            .as_deref()
            .and_then(|n| Path::new(n).file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }
}
