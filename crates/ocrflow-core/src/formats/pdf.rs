//! PDF loading, page rendering and text layer extraction.
//!
//! lopdf validates and decrypts the document, MuPDF rasterises whole pages
//! (text, vector art and every image on them) and pdf-extract reads the
//! embedded text.

use image::{DynamicImage, RgbImage};
use lopdf::Document;
use mupdf::{Colorspace, Matrix};
use tracing::{debug, trace};

use crate::error::FormatError;

/// Rendering scale relative to 72 dpi; 2.0 renders at 144 dpi.
pub const RENDER_SCALE: f32 = 2.0;

/// A loaded PDF document.
pub struct PdfDocument {
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Parse a PDF from bytes.
    ///
    /// PDFs encrypted with an empty user password are decrypted transparently.
    pub fn load(data: &[u8]) -> Result<Self, FormatError> {
        let mut document = Document::load_mem(data).map_err(|e| FormatError::Pdf(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(FormatError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // The renderer and pdf-extract both read the decrypted bytes
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| FormatError::Pdf(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if document.get_pages().is_empty() {
            return Err(FormatError::NoPages);
        }

        Ok(Self { raw_data })
    }

    /// Embedded text of the whole document.
    pub fn text(&self) -> Result<String, FormatError> {
        pdf_extract::extract_text_from_mem(&self.raw_data).map_err(|e| FormatError::Pdf(e.to_string()))
    }

    /// Render every page to an RGB image, in page order.
    pub fn render_pages(&self, scale: f32) -> Result<Vec<DynamicImage>, FormatError> {
        let document = mupdf::Document::from_bytes(&self.raw_data, "application/pdf").map_err(render_error)?;
        let page_count = document.page_count().map_err(render_error)?;

        let matrix = Matrix::new_scale(scale, scale);
        let colorspace = Colorspace::device_rgb();
        let mut images = Vec::new();

        for index in 0..page_count {
            let page = document.load_page(index).map_err(render_error)?;
            let pixmap = page
                .to_pixmap(&matrix, &colorspace, false, false)
                .map_err(render_error)?;

            let width = u32::try_from(pixmap.width()).ok();
            let height = u32::try_from(pixmap.height()).ok();
            let image = width
                .zip(height)
                .and_then(|(w, h)| pixmap_to_image(pixmap.samples(), w, h, pixmap.n() as usize))
                .ok_or_else(|| FormatError::Render(format!("page {} produced an unusable pixmap", index + 1)))?;

            trace!("Page {}: {}x{}", index + 1, image.width(), image.height());
            images.push(image);
        }

        debug!("Rendered {} pages", images.len());
        Ok(images)
    }
}

fn render_error(e: mupdf::Error) -> FormatError {
    FormatError::Render(e.to_string())
}

/// Build an RGB image from packed pixmap samples with `channels` bytes per pixel.
///
/// Returns `None` when the declared size does not fit in memory or the
/// buffer is shorter than the declared size.
fn pixmap_to_image(samples: &[u8], width: u32, height: u32, channels: usize) -> Option<DynamicImage> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    let data = samples.get(..pixels.checked_mul(channels)?)?;

    let rgb: Vec<u8> = match channels {
        3 => data.to_vec(),
        4 => data.chunks_exact(4).flat_map(|c| [c[0], c[1], c[2]]).collect(),
        1 => data.iter().flat_map(|&g| [g, g, g]).collect(),
        _ => {
            trace!("Unsupported pixmap with {} channels", channels);
            return None;
        }
    };

    RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
}


#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use pretty_assertions::assert_eq;

    fn dark_pixels(image: &DynamicImage) -> usize {
        image.to_luma8().pixels().filter(|p| p.0[0] < 128).count()
    }

    #[test]
    fn test_render_pages_in_order() {
        let pdf = fixtures::image_pdf(&[Some((4, 3)), Some((2, 2))]);
        let doc = PdfDocument::load(&pdf).unwrap();

        let images = doc.render_pages(2.0).unwrap();
        assert_eq!(images.len(), 2);
        for image in &images {
            assert_eq!(image.dimensions(), (200, 200));
        }
        // Page 1 holds a black image, page 2 a gray (40) one
        assert!(images[0].get_pixel(100, 100).0[0] < 10);
        assert!(images[1].get_pixel(100, 100).0[0] < 80);
    }

    #[test]
    fn test_text_only_page_is_rendered() {
        let pdf = fixtures::text_pdf(&["Invoice 42"]);
        let doc = PdfDocument::load(&pdf).unwrap();

        let images = doc.render_pages(2.0).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].dimensions(), (200, 200));
        assert!(dark_pixels(&images[0]) > 0);
    }

    #[test]
    fn test_all_images_on_a_page_are_kept() {
        let pdf = fixtures::two_image_pdf();
        let doc = PdfDocument::load(&pdf).unwrap();

        let images = doc.render_pages(2.0).unwrap();
        assert_eq!(images.len(), 1);

        let page = &images[0];
        assert!(page.get_pixel(50, 100).0[0] < 30);
        let right = page.get_pixel(150, 100).0[0];
        assert!((100..=160).contains(&right), "right half was {}", right);
    }

    #[test]
    fn test_blank_page_is_rendered() {
        let pdf = fixtures::image_pdf(&[Some((2, 2)), None]);
        let doc = PdfDocument::load(&pdf).unwrap();

        let images = doc.render_pages(1.0).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(dark_pixels(&images[1]), 0);
    }

    #[test]
    fn test_load_garbage() {
        assert!(matches!(PdfDocument::load(b"not a pdf"), Err(FormatError::Pdf(_))));
    }

    #[test]
    fn test_pixmap_rgb() {
        let img = pixmap_to_image(&[255, 0, 0, 0, 255, 0], 2, 1, 3).unwrap();
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0, 255]);
    }

    #[test]
    fn test_pixmap_short_buffer() {
        assert!(pixmap_to_image(&[1, 2], 2, 2, 1).is_none());
    }

    #[test]
    fn test_pixmap_oversized_dimensions() {
        assert!(pixmap_to_image(&[0u8; 16], u32::MAX, u32::MAX, 3).is_none());
        assert!(pixmap_to_image(&[0u8; 16], u32::MAX, 2, 4).is_none());
    }
}
