//! Image format detection
//!
//! Input formats are detected by examining magic numbers in the file
//! header. Output formats are chosen from the path extension.

use crate::{IoError, IoResult};
use nautilus_core::fpix::serial::{FPIX_MAGIC, UPIX_MAGIC};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Image container formats understood by the reader and writer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Native float grid serialization
    FPix,
    /// Native u32 label grid serialization
    UPix,
    /// Tagged Image File Format
    Tiff,
    /// Portable Network Graphics (input only)
    Png,
}

/// Magic numbers for image format detection
mod magic {
    /// PNG: 89 50 4E 47 0D 0A 1A 0A
    pub const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    /// TIFF little-endian: II 2A 00
    pub const TIFF_LE: &[u8] = &[0x49, 0x49, 0x2A, 0x00];

    /// TIFF big-endian: MM 00 2A
    pub const TIFF_BE: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];
}

/// Bytes examined for magic numbers
const HEADER_LEN: u64 = 16;

/// Detect image format from a file path
pub fn detect_format<P: AsRef<Path>>(path: P) -> IoResult<ImageFormat> {
    let file = File::open(path).map_err(IoError::Io)?;
    detect_format_from_reader(file)
}

/// Detect image format from the first bytes of a reader
///
/// Reads until the header is complete or the reader is exhausted, so
/// short reads do not hide a magic number.
pub fn detect_format_from_reader<R: Read>(reader: R) -> IoResult<ImageFormat> {
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    reader
        .take(HEADER_LEN)
        .read_to_end(&mut header)
        .map_err(IoError::Io)?;
    detect_format_from_bytes(&header)
}

/// Detect image format from bytes
pub fn detect_format_from_bytes(data: &[u8]) -> IoResult<ImageFormat> {
    if data.len() < 4 {
        return Err(IoError::InvalidData(
            "not enough data to detect format".to_string(),
        ));
    }

    if data.starts_with(FPIX_MAGIC) {
        return Ok(ImageFormat::FPix);
    }
    if data.starts_with(UPIX_MAGIC) {
        return Ok(ImageFormat::UPix);
    }

    // Check PNG (needs 8 bytes)
    if data.len() >= 8 && data.starts_with(magic::PNG) {
        return Ok(ImageFormat::Png);
    }

    if data.starts_with(magic::TIFF_LE) || data.starts_with(magic::TIFF_BE) {
        return Ok(ImageFormat::Tiff);
    }

    Err(IoError::UnsupportedFormat(
        "unknown image format".to_string(),
    ))
}

/// Format implied by a path extension, if it names a foreign container
///
/// Returns `None` for every other extension; writers then fall back to the
/// native serialization.
pub fn format_from_extension<P: AsRef<Path>>(path: P) -> Option<ImageFormat> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "tif" | "tiff" => Some(ImageFormat::Tiff),
        "png" => Some(ImageFormat::Png),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader that hands out one byte per call
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((&b, rest)), Some(slot)) => {
                    *slot = b;
                    self.0 = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    #[test]
    fn test_detect_from_reader_with_short_reads() {
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
        assert_eq!(
            detect_format_from_reader(Trickle(&png)).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            detect_format_from_reader(Trickle(b"\nFPix Version 3\nw = 1")).unwrap(),
            ImageFormat::FPix
        );
        assert!(matches!(
            detect_format_from_reader(Trickle(b"II")),
            Err(IoError::InvalidData(_))
        ));
    }

    #[test]
    fn test_detect_native() {
        assert_eq!(
            detect_format_from_bytes(b"\nFPix Version 3\nw = 1").unwrap(),
            ImageFormat::FPix
        );
        assert_eq!(
            detect_format_from_bytes(b"\nUPix Version 1\nw = 1").unwrap(),
            ImageFormat::UPix
        );
    }

    #[test]
    fn test_detect_png() {
        let data = [
            0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x00,
        ];
        assert_eq!(detect_format_from_bytes(&data).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_tiff() {
        let le = [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        let be = [0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];
        assert_eq!(detect_format_from_bytes(&le).unwrap(), ImageFormat::Tiff);
        assert_eq!(detect_format_from_bytes(&be).unwrap(), ImageFormat::Tiff);
    }

    #[test]
    fn test_detect_unknown() {
        assert!(detect_format_from_bytes(b"SIMPLE  =").is_err());
        assert!(detect_format_from_bytes(b"ab").is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(format_from_extension("out.TIF"), Some(ImageFormat::Tiff));
        assert_eq!(format_from_extension("a/b.tiff"), Some(ImageFormat::Tiff));
        assert_eq!(format_from_extension("in.png"), Some(ImageFormat::Png));
        assert_eq!(format_from_extension("out.fpix"), None);
        assert_eq!(format_from_extension("noext"), None);
    }
}
