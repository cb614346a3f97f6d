use std::fmt;

/// Why a rectified marker did not yield a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreadableReason {
    /// The decoder found no QR symbol in the region.
    NoSymbol,
    /// A symbol grid was found but error correction or payload extraction failed.
    Corrupted,
    /// The payload bytes are not ASCII text.
    NotAscii,
    /// The payload decoded to zero bytes.
    Empty,
    /// An externally imposed deadline expired before the scan finished.
    TimedOut,
}

impl fmt::Display for UnreadableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnreadableReason::NoSymbol => "no symbol",
            UnreadableReason::Corrupted => "corrupted symbol",
            UnreadableReason::NotAscii => "non-ascii payload",
            UnreadableReason::Empty => "empty payload",
            UnreadableReason::TimedOut => "timed out",
        };
        f.write_str(text)
    }
}

/// Outcome of a failed scan. Every variant is an ordinary, expected result.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The bytes do not decode to an image with pixels.
    #[error("input is not a usable image: {0}")]
    InputInvalid(String),
    /// No qualifying square region in the photo.
    #[error("no marker found in photo")]
    MarkerNotFound,
    /// A region was rectified but yielded no valid payload.
    #[error("marker found but payload unreadable: {0}")]
    PayloadUnreadable(UnreadableReason),
}

impl ScanError {
    /// Stable label for logs and for the conversation layer.
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::InputInvalid(_) => "input_invalid",
            ScanError::MarkerNotFound => "marker_not_found",
            ScanError::PayloadUnreadable(_) => "payload_unreadable",
        }
    }
}

impl From<image::ImageError> for ScanError {
    fn from(err: image::ImageError) -> Self {
        ScanError::InputInvalid(err.to_string())
    }
}

/// Errors raised while loading or validating a [`crate::ScanConfig`].
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid JSON for [`crate::ScanConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(ScanError::MarkerNotFound.kind(), "marker_not_found");
        assert_eq!(
            ScanError::PayloadUnreadable(UnreadableReason::NoSymbol).kind(),
            "payload_unreadable"
        );
        assert_eq!(ScanError::InputInvalid("x".into()).kind(), "input_invalid");
    }

    #[test]
    fn test_image_error_maps_to_input_invalid() {
        let err = image::load_from_memory(b"definitely not a png").unwrap_err();
        let scan: ScanError = err.into();
        assert!(matches!(scan, ScanError::InputInvalid(_)));
    }

    #[test]
    fn test_display_mentions_reason() {
        let err = ScanError::PayloadUnreadable(UnreadableReason::Corrupted);
        assert!(err.to_string().contains("corrupted"));
    }
}
