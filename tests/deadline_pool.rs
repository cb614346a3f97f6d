//! Deadline scans run on a bounded worker pool.
//!
//! Kept in its own test binary so no other test adds threads while the count
//! is taken.

mod common;

use common::{marker_scene, png_bytes};
use image::{Rgb, RgbImage};
use qr_marker::{ScanConfig, ScanError, Scanner, UnreadableReason};
use std::time::Duration;

const WORKERS: usize = 2;

#[cfg(target_os = "linux")]
fn live_threads() -> usize {
    std::fs::read_to_string("/proc/self/status")
        .unwrap()
        .lines()
        .find_map(|line| line.strip_prefix("Threads:"))
        .and_then(|count| count.trim().parse().ok())
        .unwrap()
}

#[test]
#[cfg(target_os = "linux")]
fn test_expired_deadlines_stay_within_worker_bound() {
    let scanner = Scanner::new(ScanConfig::default())
        .unwrap()
        .with_deadline_workers(WORKERS);

    // Start the pool with a scan that finishes
    let marker = png_bytes(&marker_scene("7", 8, 40));
    let token = scanner
        .scan_with_deadline(marker.clone(), Duration::from_secs(60))
        .unwrap();
    assert_eq!(token.as_str(), "7");
    let baseline = live_threads();

    let big = png_bytes(&RgbImage::from_pixel(2000, 2000, Rgb([250, 250, 250])));
    for _ in 0..16 {
        let result = scanner.scan_with_deadline(big.clone(), Duration::from_nanos(1));
        assert_eq!(result, Err(ScanError::PayloadUnreadable(UnreadableReason::TimedOut)));
        let live = live_threads();
        assert!(
            live <= baseline,
            "{live} threads alive, {baseline} before the expired scans"
        );
    }

    let token = scanner
        .scan_with_deadline(marker, Duration::from_secs(60))
        .unwrap();
    assert_eq!(token.as_str(), "7");
}
