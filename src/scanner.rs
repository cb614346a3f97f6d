//! End-to-end scanning: photo bytes in, token or failure kind out.

use crate::config::ScanConfig;
use crate::decoder;
use crate::detector;
use crate::error::{ConfigError, ScanError, UnreadableReason};
use crate::models::Token;
use image::RgbImage;
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, mpsc};
use std::time::{Duration, Instant};

/// Decode encoded photo bytes (PNG, JPEG, ...) into RGB pixels
pub fn load_photo(bytes: &[u8]) -> Result<RgbImage, ScanError> {
    if bytes.is_empty() {
        return Err(ScanError::InputInvalid("empty upload".to_string()));
    }
    let image = image::load_from_memory(bytes)?.to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        return Err(ScanError::InputInvalid("image has no pixels".to_string()));
    }
    Ok(image)
}

/// Locate then decode a marker with the given configuration
pub fn scan_image(image: &RgbImage, config: &ScanConfig) -> Result<Token, ScanError> {
    let roi = detector::locate(image, config)?;
    decoder::decode(&roi.image)
}

/// Scanner with a validated configuration
///
/// Holds no per-scan state, so a single instance can serve concurrent scans.
/// Deadline scans run on a fixed-size worker pool shared by all clones; it is
/// started on the first deadline scan.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
    deadline_workers: usize,
    deadline_pool: Arc<OnceLock<Option<ThreadPool>>>,
}

impl Scanner {
    /// Create a scanner, rejecting configurations the locator cannot use
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Cap the threads serving [`Scanner::scan_with_deadline`]; `0` means one per CPU
    pub fn with_deadline_workers(self, workers: usize) -> Self {
        Self {
            config: self.config,
            deadline_workers: workers,
            deadline_pool: Arc::default(),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Threads in the deadline pool, starting it if needed; `0` when it could not start
    pub fn deadline_workers(&self) -> usize {
        self.deadline_pool()
            .map_or(0, ThreadPool::current_num_threads)
    }

    /// Scan decoded pixels
    pub fn scan_image(&self, image: &RgbImage) -> Result<Token, ScanError> {
        scan_logged(image, &self.config)
    }

    /// Scan an encoded photo
    pub fn scan_bytes(&self, bytes: &[u8]) -> Result<Token, ScanError> {
        scan_bytes_logged(bytes, &self.config)
    }

    /// Scan many photos in parallel; results keep the input order
    pub fn scan_batch<B>(&self, photos: &[B]) -> Vec<Result<Token, ScanError>>
    where
        B: AsRef<[u8]> + Sync,
    {
        photos
            .par_iter()
            .map(|bytes| self.scan_bytes(bytes.as_ref()))
            .collect()
    }

    /// Scan on the deadline pool, giving up after `timeout`.
    ///
    /// An expired deadline reports `PayloadUnreadable(TimedOut)`. A job that
    /// already started is left to finish and its result is dropped; a job still
    /// queued when its deadline expires is skipped. At most
    /// [`Scanner::deadline_workers`] scans run at once.
    pub fn scan_with_deadline(&self, bytes: Vec<u8>, timeout: Duration) -> Result<Token, ScanError> {
        let Some(pool) = self.deadline_pool() else {
            warn!("scan workers unavailable, scanning inline");
            return self.scan_bytes(&bytes);
        };

        let (tx, rx) = mpsc::channel();
        let abandoned = Arc::new(AtomicBool::new(false));
        let skip = Arc::clone(&abandoned);
        let config = self.config.clone();
        pool.spawn(move || {
            if skip.load(Ordering::Acquire) {
                debug!("deadline expired before the scan started, skipping");
                return;
            }
            // The receiver may already be gone after a timeout
            let _ = tx.send(scan_bytes_logged(&bytes, &config));
        });

        match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                abandoned.store(true, Ordering::Release);
                warn!("scan exceeded deadline of {} ms", timeout.as_millis());
                Err(ScanError::PayloadUnreadable(UnreadableReason::TimedOut))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                warn!("scan worker exited without a result");
                Err(ScanError::InputInvalid(
                    "scan worker exited without a result".to_string(),
                ))
            }
        }
    }

    fn deadline_pool(&self) -> Option<&ThreadPool> {
        self.deadline_pool
            .get_or_init(|| {
                ThreadPoolBuilder::new()
                    .num_threads(self.deadline_workers)
                    .thread_name(|i| format!("marker-scan-{i}"))
                    .panic_handler(|_| warn!("scan worker panicked"))
                    .build()
                    .inspect_err(|err| warn!("could not start scan workers: {err}"))
                    .ok()
            })
            .as_ref()
    }
}

fn scan_logged(image: &RgbImage, config: &ScanConfig) -> Result<Token, ScanError> {
    let start = Instant::now();
    let result = scan_image(image, config);
    log_outcome(&result, image.dimensions(), start.elapsed());
    result
}

fn scan_bytes_logged(bytes: &[u8], config: &ScanConfig) -> Result<Token, ScanError> {
    let image = load_photo(bytes).inspect_err(|err| {
        info!("scan rejected input ({} bytes): {err}", bytes.len());
    })?;
    scan_logged(&image, config)
}

fn log_outcome(result: &Result<Token, ScanError>, dims: (u32, u32), elapsed: Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    match result {
        Ok(token) => info!(
            "scan ok: {}x{} -> token of {} chars in {ms:.1} ms",
            dims.0,
            dims.1,
            token.as_str().len()
        ),
        Err(err) => info!(
            "scan failed ({}): {}x{} in {ms:.1} ms: {err}",
            err.kind(),
            dims.0,
            dims.1
        ),
    }
    debug!("scan outcome: {result:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(image: &RgbImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_rejects_bad_config() {
        let config = ScanConfig {
            kernel_size: 2,
            ..ScanConfig::default()
        };
        assert!(Scanner::new(config).is_err());
        assert_eq!(Scanner::default().config(), &ScanConfig::default());
    }

    #[test]
    fn test_garbage_bytes_are_invalid_input() {
        let scanner = Scanner::default();
        assert!(matches!(
            scanner.scan_bytes(b"\x00\x01not an image"),
            Err(ScanError::InputInvalid(_))
        ));
        assert!(matches!(scanner.scan_bytes(&[]), Err(ScanError::InputInvalid(_))));
    }

    #[test]
    fn test_batch_preserves_order() {
        let scanner = Scanner::default();
        let blank = png_bytes(&RgbImage::from_pixel(32, 32, Rgb([10, 10, 10])));
        let photos = vec![blank.clone(), b"junk".to_vec(), blank];
        let results = scanner.scan_batch(&photos);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Err(ScanError::MarkerNotFound));
        assert!(matches!(results[1], Err(ScanError::InputInvalid(_))));
        assert_eq!(results[2], Err(ScanError::MarkerNotFound));
    }

    #[test]
    fn test_deadline_passes_result_through() {
        let scanner = Scanner::default();
        let blank = png_bytes(&RgbImage::from_pixel(16, 16, Rgb([0, 0, 0])));
        let result = scanner.scan_with_deadline(blank, Duration::from_secs(30));
        assert_eq!(result, Err(ScanError::MarkerNotFound));
    }

    #[test]
    fn test_deadline_expires() {
        let scanner = Scanner::default();
        let big = png_bytes(&RgbImage::from_pixel(2000, 2000, Rgb([250, 250, 250])));
        let result = scanner.scan_with_deadline(big, Duration::from_nanos(1));
        assert_eq!(result, Err(ScanError::PayloadUnreadable(UnreadableReason::TimedOut)));
    }

    #[test]
    fn test_deadline_pool_has_requested_size() {
        let scanner = Scanner::default().with_deadline_workers(2);
        assert_eq!(scanner.deadline_workers(), 2);
        // Clones share the pool
        assert_eq!(scanner.clone().deadline_workers(), 2);
    }

    #[test]
    fn test_expired_deadlines_leave_pool_usable() {
        let scanner = Scanner::default().with_deadline_workers(1);
        let big = png_bytes(&RgbImage::from_pixel(2000, 2000, Rgb([250, 250, 250])));
        for _ in 0..8 {
            let result = scanner.scan_with_deadline(big.clone(), Duration::from_nanos(1));
            assert_eq!(result, Err(ScanError::PayloadUnreadable(UnreadableReason::TimedOut)));
        }

        // Abandoned jobs still queued are skipped, so a later scan gets through
        let blank = png_bytes(&RgbImage::from_pixel(16, 16, Rgb([0, 0, 0])));
        let result = scanner.scan_with_deadline(blank, Duration::from_secs(60));
        assert_eq!(result, Err(ScanError::MarkerNotFound));
    }
}
