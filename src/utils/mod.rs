//! Utility functions for image processing
//!
//! This module provides the pixel-level helpers used by the locator and decoder:
//! - Grayscale conversion (RGB to luminance)
//! - Binarization (Otsu's method and threshold-based)
//! - Color (RGB to HSV, color-window masks)
//! - Geometry (perspective transforms, polygon area, rotated rectangles)

/// Otsu and fixed-threshold binarization
pub mod binarization;
/// RGB to HSV and color-window masks
pub mod color;
/// Perspective transforms, polygon area, minimum-area rectangles
pub mod geometry;
/// RGB to luminance
pub mod grayscale;
