//! qr_marker - recover an identity token from a photo of a printed marker
//!
//! The marker is a white paper square with a QR code printed inside. A scan
//! runs two stateless stages:
//! - [`locate`]: HSV mask, morphology, contours, square filter, perspective warp
//! - [`decode`]: luminance, Otsu threshold, QR decode to an ASCII [`Token`]
//!
//! Every failure is an ordinary [`ScanError`] value.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Tunable locator thresholds
pub mod config;
/// Payload decoder (Otsu binarization and QR decoding)
pub mod decoder;
/// Front desk conversation and customer balances
pub mod desk;
/// Marker locator (mask, contours, candidates, rectification)
pub mod detector;
/// Scan failures and configuration errors
pub mod error;
/// Core data structures (points, regions, bit matrices, tokens)
pub mod models;
/// End-to-end scanning with logging, batching and deadlines
pub mod scanner;
/// Dataset helpers shared by the CLI and the benches
pub mod tools;
/// Utility functions (grayscale, binarization, color, geometry)
pub mod utils;

pub use config::{MaskBounds, ScanConfig};
pub use error::{ConfigError, ScanError, UnreadableReason};
pub use models::{BitMatrix, CandidateRegion, Point, PointI, RectifiedRoi, RotatedRect, Token};
pub use scanner::Scanner;

use image::RgbImage;

/// Locate the marker in a photo with the default configuration
///
/// # Returns
/// The rectified ROI, or `MarkerNotFound`
pub fn locate(image: &RgbImage) -> Result<RectifiedRoi, ScanError> {
    detector::locate(image, &ScanConfig::default())
}

/// Decode the token inside a rectified ROI
pub fn decode(roi: &RgbImage) -> Result<Token, ScanError> {
    decoder::decode(roi)
}

/// Scan encoded photo bytes (PNG, JPEG, ...) with the default configuration
///
/// # Example
/// ```
/// use qr_marker::{ScanError, scan};
///
/// let err = scan(b"not an image").unwrap_err();
/// assert!(matches!(err, ScanError::InputInvalid(_)));
/// ```
pub fn scan(bytes: &[u8]) -> Result<Token, ScanError> {
    let image = scanner::load_photo(bytes)?;
    scanner::scan_image(&image, &ScanConfig::default())
}
