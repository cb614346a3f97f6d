//! Payload decoder
//!
//! Turns a rectified ROI into a token:
//! - Luminance conversion
//! - Otsu global threshold
//! - QR symbol search and error-corrected payload extraction
//! - ASCII validation
//!
//! Resampling smears module edges across a pixel, and a threshold at the
//! native pitch can then shift an edge by a whole pixel. When the native pass
//! finds no valid symbol the luminance is upscaled with bilinear weights and
//! thresholded again, which places edges to a fraction of a source pixel.

/// QR symbol reading and payload validation
pub mod payload;

use crate::error::{ScanError, UnreadableReason};
use crate::models::Token;
use crate::utils::binarization::{otsu_threshold, threshold_binarize};
use crate::utils::grayscale::to_luma;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use log::debug;

/// Scale factors tried in order; the first pass that yields a token wins
const UPSCALE_PASSES: [u32; 3] = [1, 2, 4];

/// Upscaled passes stop once the longer side would exceed this
const MAX_UPSCALED_SIDE: u32 = 2048;

/// Decode the token printed in a rectified ROI
pub fn decode(roi: &RgbImage) -> Result<Token, ScanError> {
    decode_gray(&to_luma(roi))
}

/// Decode from an already-computed luminance image
pub fn decode_gray(gray: &GrayImage) -> Result<Token, ScanError> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Err(ScanError::PayloadUnreadable(UnreadableReason::NoSymbol));
    }

    let mut reason = UnreadableReason::NoSymbol;
    for factor in UPSCALE_PASSES {
        let result = if factor == 1 {
            decode_pass(gray)
        } else {
            if width.max(height).saturating_mul(factor) > MAX_UPSCALED_SIDE {
                break;
            }
            let scaled =
                imageops::resize(gray, width * factor, height * factor, FilterType::Triangle);
            decode_pass(&scaled)
        };

        match result {
            Ok(token) => return Ok(token),
            // The symbol itself was read; another scale cannot change its bytes
            Err(r @ (UnreadableReason::NotAscii | UnreadableReason::Empty)) => {
                return Err(ScanError::PayloadUnreadable(r));
            }
            Err(r) => {
                debug!("decoder: pass x{factor} failed: {r}");
                if r == UnreadableReason::Corrupted {
                    reason = r;
                }
            }
        }
    }
    Err(ScanError::PayloadUnreadable(reason))
}

/// One Otsu threshold and symbol read at the image's own pitch
fn decode_pass(gray: &GrayImage) -> Result<Token, UnreadableReason> {
    let (width, height) = (gray.width() as usize, gray.height() as usize);

    // A flat ROI binarizes to all light and cannot hold a symbol
    let threshold = otsu_threshold(gray.as_raw()).unwrap_or(0);
    let binary = threshold_binarize(gray.as_raw(), width, height, threshold);
    debug!(
        "decoder: {}x{}, otsu threshold {}, {} dark pixels",
        width,
        height,
        threshold,
        binary.count_dark()
    );

    let bytes = payload::read_symbol(&binary)?;
    payload::ascii_token(bytes)
}
