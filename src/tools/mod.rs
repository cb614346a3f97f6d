//! Helpers shared by the `markertool` binary and the benches.

use crate::error::ScanError;
use crate::models::Token;
use image::{GenericImageView, RgbImage};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

fn max_dim_from_env() -> Option<u32> {
    match env::var("MARKER_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image file as RGB, downscaling when `MARKER_MAX_DIM` is set.
pub fn load_rgb<P: AsRef<Path>>(path: P) -> Result<RgbImage, ScanError> {
    let img = image::open(path)?;
    let rgb = match max_dim_from_env() {
        Some(max_dim) if img.dimensions().0.max(img.dimensions().1) > max_dim => img
            .resize(max_dim, max_dim, image::imageops::FilterType::Triangle)
            .to_rgb8(),
        _ => img.to_rgb8(),
    };
    Ok(rgb)
}

/// Default dataset root from `MARKER_DATASET_ROOT`.
pub fn dataset_root_from_env() -> PathBuf {
    env::var("MARKER_DATASET_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("benches/images"))
}

/// Default bench limit from `MARKER_BENCH_LIMIT`; `None` (everything) when unset or `0`.
pub fn bench_limit_from_env() -> Option<usize> {
    match env::var("MARKER_BENCH_LIMIT") {
        Ok(value) => value
            .parse::<usize>()
            .ok()
            .and_then(|v| if v == 0 { None } else { Some(v) }),
        Err(_) => None,
    }
}

/// Image paths under `root`, sorted, optionally truncated to `limit`.
pub fn dataset_iter<P: AsRef<Path>>(root: P, limit: Option<usize>) -> impl Iterator<Item = PathBuf> {
    let mut images = collect_images(root.as_ref());
    images.sort();
    if let Some(limit) = limit {
        images.truncate(limit);
    }
    images.into_iter()
}

fn collect_images(root: &Path) -> Vec<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                    images.push(path);
                }
            }
        }
    }

    images
}

/// Expected token for a photo, read from a sibling `.txt` label file.
///
/// The first non-empty line that is not a `#` comment is the token.
pub fn expected_token<P: AsRef<Path>>(image_path: P) -> Option<String> {
    let content = fs::read_to_string(image_path.as_ref().with_extension("txt")).ok()?;
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Outcome of one photo in a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Token decoded and matches the label (or the photo is unlabeled)
    Hit,
    /// Token decoded but differs from the label
    Mismatch {
        /// Label contents
        expected: String,
        /// Decoded token
        found: String,
    },
    /// The scan failed
    Miss(ScanError),
}

impl Outcome {
    /// Classify a scan result against an optional label
    pub fn classify(result: Result<Token, ScanError>, expected: Option<&str>) -> Self {
        match (result, expected) {
            (Err(err), _) => Outcome::Miss(err),
            (Ok(token), Some(expected)) if token.as_str() != expected => Outcome::Mismatch {
                expected: expected.to_string(),
                found: token.into_string(),
            },
            (Ok(_), _) => Outcome::Hit,
        }
    }
}

/// Per-kind tallies for a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadingRate {
    /// Photos scanned
    pub total: usize,
    /// Correct tokens
    pub hits: usize,
    /// Wrong tokens
    pub mismatches: usize,
    /// `InputInvalid` failures
    pub invalid: usize,
    /// `MarkerNotFound` failures
    pub not_found: usize,
    /// `PayloadUnreadable` failures
    pub unreadable: usize,
}

impl ReadingRate {
    /// Count one outcome
    pub fn record(&mut self, outcome: &Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Hit => self.hits += 1,
            Outcome::Mismatch { .. } => self.mismatches += 1,
            Outcome::Miss(ScanError::InputInvalid(_)) => self.invalid += 1,
            Outcome::Miss(ScanError::MarkerNotFound) => self.not_found += 1,
            Outcome::Miss(ScanError::PayloadUnreadable(_)) => self.unreadable += 1,
        }
    }

    /// Hits as a percentage of all photos
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64 * 100.0
        }
    }
}
