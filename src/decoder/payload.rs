use crate::error::UnreadableReason;
use crate::models::{BitMatrix, Token};
use log::debug;
use rqrr::PreparedImage;

/// Read the raw payload of the first QR symbol found in a binarized ROI
pub fn read_symbol(binary: &BitMatrix) -> Result<Vec<u8>, UnreadableReason> {
    let mut prepared =
        PreparedImage::prepare_from_bitmap(binary.width(), binary.height(), |x, y| binary.get(x, y));
    let grids = prepared.detect_grids();
    debug!("decoder: {} symbol grid(s)", grids.len());

    let grid = grids.first().ok_or(UnreadableReason::NoSymbol)?;
    let mut bytes = Vec::new();
    grid.decode_to(&mut bytes).map_err(|err| {
        debug!("decoder: symbol rejected: {err}");
        UnreadableReason::Corrupted
    })?;
    Ok(bytes)
}

/// Validate payload bytes as a non-empty ASCII token
pub fn ascii_token(bytes: Vec<u8>) -> Result<Token, UnreadableReason> {
    if bytes.is_empty() {
        return Err(UnreadableReason::Empty);
    }
    if !bytes.is_ascii() {
        return Err(UnreadableReason::NotAscii);
    }
    String::from_utf8(bytes)
        .map(Token::new)
        .map_err(|_| UnreadableReason::NotAscii)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrcode::{Color, QrCode};

    fn symbol_bitmap(payload: &[u8], module: usize) -> BitMatrix {
        let code = QrCode::new(payload).unwrap();
        let n = code.width();
        let colors = code.to_colors();
        let quiet = 4 * module;
        let side = n * module + 2 * quiet;
        BitMatrix::from_fn(side, side, |x, y| {
            if x < quiet || y < quiet || x >= quiet + n * module || y >= quiet + n * module {
                return false;
            }
            let (mx, my) = ((x - quiet) / module, (y - quiet) / module);
            colors[my * n + mx] == Color::Dark
        })
    }

    #[test]
    fn test_reads_symbol() {
        let bitmap = symbol_bitmap(b"123456789", 6);
        assert_eq!(read_symbol(&bitmap).unwrap(), b"123456789");
    }

    #[test]
    fn test_damaged_data_is_corrupted() {
        let module = 6;
        let mut bitmap = symbol_bitmap(b"123456789", module);
        // Invert data modules 11..=19 in both axes; finders, timing and format stay intact
        let quiet = 4 * module;
        for y in quiet + 11 * module..quiet + 20 * module {
            for x in quiet + 11 * module..quiet + 20 * module {
                let dark = bitmap.get(x, y);
                bitmap.set(x, y, !dark);
            }
        }
        assert_eq!(read_symbol(&bitmap).unwrap_err(), UnreadableReason::Corrupted);
    }

    #[test]
    fn test_no_symbol() {
        let blank = BitMatrix::new(80, 80);
        assert_eq!(read_symbol(&blank).unwrap_err(), UnreadableReason::NoSymbol);
    }

    #[test]
    fn test_ascii_token() {
        assert_eq!(ascii_token(b"42".to_vec()).unwrap().as_str(), "42");
        assert_eq!(ascii_token(Vec::new()).unwrap_err(), UnreadableReason::Empty);
        assert_eq!(
            ascii_token("знак".as_bytes().to_vec()).unwrap_err(),
            UnreadableReason::NotAscii
        );
    }

    #[test]
    fn test_non_ascii_symbol() {
        let bitmap = symbol_bitmap("café".as_bytes(), 6);
        let bytes = read_symbol(&bitmap).unwrap();
        assert_eq!(ascii_token(bytes).unwrap_err(), UnreadableReason::NotAscii);
    }
}
