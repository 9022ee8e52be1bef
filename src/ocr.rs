//! Image text extraction for photo messages
//!
//! Fixed preprocessing pipeline (channel scaling, grayscale, contrast,
//! binarization) followed by Tesseract, followed by a normalization step
//! tuned to the photographed fault-list screens this bot receives. The
//! normalization is deliberately heuristic and kept literal; see the unit
//! tests for its exact input/output behavior.

use image::{DynamicImage, GrayImage, RgbImage};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::process::Command;
use thiserror::Error;

/// Channel multipliers that suppress the ink colors on the fault-list
/// screens before grayscale conversion.
const RED_SCALE: f32 = 0.3;
const GREEN_SCALE: f32 = 0.9;
const BLUE_SCALE: f32 = 0.2;

/// Contrast gain applied around the image mean.
const CONTRAST_GAIN: f32 = 2.0;

/// Pixels above this intensity become white, the rest black.
const BINARIZE_THRESHOLD: f32 = 180.0;

/// Recognition languages, in Tesseract's `-l` syntax.
const OCR_LANGUAGES: &str = "nld+eng+fra";

/// The fault-list marker followed by the code digits. Tesseract habitually
/// misreads the leading "F"; `normalize_scan` repairs that before matching.
static FAULT_LIST_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Foutenlijst\s*(\d+)").expect("valid marker pattern"));

const MISREAD_MARKER: &str = "Fgutenlijst";
const MARKER: &str = "Foutenlijst";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Tesseract failed: {0}")]
    Recognition(String),
}

/// Whether the `tesseract` binary is on the path.
pub fn tesseract_available() -> bool {
    Command::new("tesseract")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Extract the module-name-like first word and the fault-list code digits
/// from a photographed screen.
pub fn extract(image_bytes: &[u8]) -> Result<String, OcrError> {
    let image = image::load_from_memory(image_bytes)?;
    let processed = preprocess(&image);
    let text = recognize(&processed)?;
    Ok(normalize_scan(&text))
}

/// The fixed preprocessing pipeline: scale channels, convert to grayscale,
/// boost contrast around the mean, binarize.
fn preprocess(image: &DynamicImage) -> GrayImage {
    let mut rgb: RgbImage = image.to_rgb8();
    for pixel in rgb.pixels_mut() {
        pixel[0] = (f32::from(pixel[0]) * RED_SCALE) as u8;
        pixel[1] = (f32::from(pixel[1]) * GREEN_SCALE) as u8;
        pixel[2] = (f32::from(pixel[2]) * BLUE_SCALE) as u8;
    }

    let gray = DynamicImage::ImageRgb8(rgb).to_luma8();
    let mean = mean_intensity(&gray);

    let mut binary = gray;
    for pixel in binary.pixels_mut() {
        let boosted = mean + (f32::from(pixel[0]) - mean) * CONTRAST_GAIN;
        pixel[0] = if boosted > BINARIZE_THRESHOLD { 255 } else { 0 };
    }
    binary
}

fn mean_intensity(gray: &GrayImage) -> f32 {
    let pixels = gray.pixels().len();
    if pixels == 0 {
        return 0.0;
    }
    let sum: u64 = gray.pixels().map(|p| u64::from(p[0])).sum();
    sum as f32 / pixels as f32
}

/// Run Tesseract over the processed image via a temporary PNG.
fn recognize(image: &GrayImage) -> Result<String, OcrError> {
    let temp = tempfile::Builder::new().suffix(".png").tempfile()?;
    image
        .save(temp.path())
        .map_err(|e| OcrError::Recognition(format!("cannot write temp image: {}", e)))?;

    let output = Command::new("tesseract")
        .arg(temp.path())
        .arg("stdout")
        .arg("-l")
        .arg(OCR_LANGUAGES)
        .output()
        .map_err(|e| OcrError::Recognition(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OcrError::Recognition(stderr.trim().to_string()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Narrow full-page OCR output down to the first word plus the digits that
/// follow the "Foutenlijst" marker.
///
/// The single literal "Fgutenlijst" correction compensates for a known
/// recognition error and must not grow into a general spell pass.
pub fn normalize_scan(text: &str) -> String {
    let corrected = text.replace(MISREAD_MARKER, MARKER);
    let first_word = corrected.split_whitespace().next().unwrap_or("");

    match FAULT_LIST_CODE
        .captures(&corrected)
        .and_then(|caps| caps.get(1))
    {
        Some(digits) => format!("{} {}", first_word, digits.as_str()),
        None => first_word.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_normalize_scan_with_marker() {
        let text = "MotorA bedrijfsklaar\nFoutenlijst 12\noverige regels";
        assert_eq!(normalize_scan(text), "MotorA 12");
    }

    #[test]
    fn test_normalize_scan_repairs_misread_marker() {
        let text = "MotorA status\nFgutenlijst 34";
        assert_eq!(normalize_scan(text), "MotorA 34");
    }

    #[test]
    fn test_normalize_scan_without_marker_keeps_first_word() {
        assert_eq!(normalize_scan("Display zonder codes"), "Display");
    }

    #[test]
    fn test_normalize_scan_marker_with_no_digits() {
        assert_eq!(normalize_scan("MotorA\nFoutenlijst zonder"), "MotorA");
    }

    #[test]
    fn test_normalize_scan_empty_input() {
        assert_eq!(normalize_scan(""), "");
        assert_eq!(normalize_scan("   \n  "), "");
    }

    #[test]
    fn test_normalize_scan_marker_whitespace_variants() {
        assert_eq!(normalize_scan("X Foutenlijst42"), "X 42");
        assert_eq!(normalize_scan("X Foutenlijst   7"), "X 7");
    }

    #[test]
    fn test_preprocess_binarizes_to_two_levels() {
        let mut img = RgbImage::new(4, 1);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));
        img.put_pixel(2, 0, Rgb([255, 255, 255]));
        img.put_pixel(3, 0, Rgb([10, 10, 10]));

        let binary = preprocess(&DynamicImage::ImageRgb8(img));
        for pixel in binary.pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_preprocess_keeps_bright_pixels_white() {
        // A bright half and a dark half: contrast around the mean pushes the
        // bright half above the threshold and the dark half below it.
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));

        let binary = preprocess(&DynamicImage::ImageRgb8(img));
        assert_eq!(binary.get_pixel(0, 0)[0], 255);
        assert_eq!(binary.get_pixel(1, 0)[0], 0);
    }

    #[test]
    fn test_mean_intensity_empty_image() {
        let empty = GrayImage::new(0, 0);
        assert_eq!(mean_intensity(&empty), 0.0);
    }
}
