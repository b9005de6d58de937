//! Image to PDF conversion.
//!
//! One raster image file in, one single-page PDF file out. The page size in
//! points equals the source pixel dimensions (72 dpi), so the PDF shows the
//! image at its native size with no margins.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::DynamicImage;
use printpdf::{ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px};
use thiserror::Error;

/// 1 px maps to 1 pt on the page.
const PAGE_DPI: f32 = 72.0;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input is not a decodable raster image.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to encode PDF: {0}")]
    Encode(String),

    /// The destination path could not be created or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Converts the raster image at `image_path` into a single-page PDF at
/// `pdf_path`.
///
/// The PDF image stream carries 8-bit RGB only, so palette, grayscale and
/// alpha inputs are normalized with `to_rgb8` before encoding. Decoding
/// happens before the destination file is created; a decode failure leaves
/// no output behind. The source file is never modified. Single attempt,
/// caller decides remediation.
///
/// The document carries no title or author metadata.
pub fn image_to_pdf(image_path: &Path, pdf_path: &Path) -> Result<(), ConvertError> {
    let decoded = image::open(image_path)?;

    let rgb = match decoded {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    };
    let (width, height) = rgb.dimensions();

    let page_width = Mm::from(Px(width as usize).into_pt(PAGE_DPI));
    let page_height = Mm::from(Px(height as usize).into_pt(PAGE_DPI));
    let (doc, page, layer) = PdfDocument::new("", page_width, page_height, "image");

    let pdf_image = Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: false,
        image_data: rgb.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });
    pdf_image.add_to_layer(
        doc.get_page(page).get_layer(layer),
        ImageTransform {
            dpi: Some(PAGE_DPI),
            ..Default::default()
        },
    );

    let file = File::create(pdf_path)?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ConvertError::Encode(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use lopdf::{Document, Object};
    use tempfile::TempDir;

    /// Parses the output and returns the (width, height) of the single
    /// page's MediaBox in points.
    fn page_size(pdf_path: &Path) -> (f64, f64) {
        let doc = Document::load(pdf_path).expect("output should parse as a PDF");
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 1, "expected exactly one page");
        let (_, page_id) = pages.into_iter().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let value = |o: &Object| match o {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => *r as f64,
            other => panic!("unexpected MediaBox entry: {other:?}"),
        };
        (
            value(&media_box[2]) - value(&media_box[0]),
            value(&media_box[3]) - value(&media_box[1]),
        )
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.5,
            "expected ~{expected}, got {actual}"
        );
    }

    #[test]
    fn test_rgb_png_page_matches_pixel_dimensions() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("photo.png");
        let pdf_path = dir.path().join("out.pdf");
        RgbImage::from_pixel(120, 80, Rgb([200, 40, 40]))
            .save(&image_path)
            .unwrap();

        image_to_pdf(&image_path, &pdf_path).unwrap();

        let header = std::fs::read(&pdf_path).unwrap();
        assert!(header.starts_with(b"%PDF"));
        let (w, h) = page_size(&pdf_path);
        assert_close(w, 120.0);
        assert_close(h, 80.0);
    }

    #[test]
    fn test_grayscale_jpeg_converts() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("scan.jpg");
        let pdf_path = dir.path().join("out.pdf");
        GrayImage::from_pixel(64, 64, Luma([128]))
            .save(&image_path)
            .unwrap();

        image_to_pdf(&image_path, &pdf_path).unwrap();

        let (w, h) = page_size(&pdf_path);
        assert_close(w, 64.0);
        assert_close(h, 64.0);
    }

    #[test]
    fn test_rgba_png_normalizes_to_rgb() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("overlay.png");
        let pdf_path = dir.path().join("out.pdf");
        RgbaImage::from_pixel(32, 48, Rgba([10, 20, 30, 128]))
            .save(&image_path)
            .unwrap();

        image_to_pdf(&image_path, &pdf_path).unwrap();

        let (w, h) = page_size(&pdf_path);
        assert_close(w, 32.0);
        assert_close(h, 48.0);
    }

    #[test]
    fn test_corrupt_input_fails_decode_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("claims-to-be.jpg");
        let pdf_path = dir.path().join("out.pdf");
        std::fs::write(&image_path, b"definitely not a JPEG").unwrap();

        let err = image_to_pdf(&image_path, &pdf_path).unwrap_err();
        assert!(matches!(err, ConvertError::Decode(_)), "got {err:?}");
        assert!(!pdf_path.exists(), "no output file on decode failure");
    }

    #[test]
    fn test_unwritable_destination_fails_io() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("photo.png");
        RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]))
            .save(&image_path)
            .unwrap();
        let pdf_path = dir.path().join("no-such-dir").join("out.pdf");

        let err = image_to_pdf(&image_path, &pdf_path).unwrap_err();
        assert!(matches!(err, ConvertError::Io(_)), "got {err:?}");
    }

    #[test]
    fn test_reconversion_is_stable() {
        let dir = TempDir::new().unwrap();
        let image_path = dir.path().join("photo.png");
        RgbImage::from_pixel(50, 25, Rgb([1, 2, 3]))
            .save(&image_path)
            .unwrap();

        let first = dir.path().join("first.pdf");
        let second = dir.path().join("second.pdf");
        image_to_pdf(&image_path, &first).unwrap();
        image_to_pdf(&image_path, &second).unwrap();

        assert_eq!(page_size(&first), page_size(&second));
        assert!(image_path.exists(), "source is never deleted");
    }
}
