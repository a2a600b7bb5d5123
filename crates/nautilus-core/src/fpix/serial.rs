//! Serialization for FPix and UPix
//!
//! Mixed text header + binary data format.
//!
//! # FPix format
//!
//! ```text
//! \nFPix Version 3\n
//! w = W, h = H, nbytes = N\n
//! unit = U\n
//! <raw f32 data, little-endian, N bytes>
//! \n
//! ```
//!
//! # UPix format
//!
//! ```text
//! \nUPix Version 1\n
//! w = W, h = H, nbytes = N\n
//! unit = U\n
//! <raw u32 data, little-endian, N bytes>
//! \n
//! ```
//!
//! The unit may be empty. It must not contain a newline.

use crate::error::{Error, Result};
use crate::fpix::{FPix, MAX_PIXELS, UPix};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// FPix format version
const FPIX_VERSION: i32 = 3;

/// UPix format version
const UPIX_VERSION: i32 = 1;

/// Maximum input size in bytes.
const MAX_INPUT_SIZE: u64 = 2_200_000_000;

/// Magic prefix of a serialized FPix, leading newline included
pub const FPIX_MAGIC: &[u8] = b"\nFPix Version";

/// Magic prefix of a serialized UPix, leading newline included
pub const UPIX_MAGIC: &[u8] = b"\nUPix Version";

// ============================================================================
// FPix serialization
// ============================================================================

impl FPix {
    /// Read an FPix from a reader.
    pub fn read_from_reader(reader: &mut impl Read) -> Result<Self> {
        Self::read_from_bytes(&read_bounded(reader)?)
    }

    /// Read an FPix from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read_from_reader(&mut BufReader::new(file))
    }

    /// Read an FPix from a byte slice.
    pub fn read_from_bytes(data: &[u8]) -> Result<Self> {
        let header = parse_header(data, "FPix", FPIX_VERSION)?;
        let binary = header.payload(data, 4, "FPix")?;

        let pixel_data: Vec<f32> = binary
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let mut fpix = FPix::from_data(header.width, header.height, pixel_data)?;
        fpix.set_unit(header.unit);
        Ok(fpix)
    }

    /// Write an FPix to a writer.
    pub fn write_to_writer(&self, writer: &mut impl Write) -> Result<()> {
        write_header(writer, "FPix", FPIX_VERSION, self.dimensions(), 4, self.unit())?;
        for &val in self.data() {
            writer.write_all(&val.to_le_bytes())?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Write an FPix to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write an FPix to a byte vector.
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to_writer(&mut buf)?;
        Ok(buf)
    }
}

// ============================================================================
// UPix serialization
// ============================================================================

impl UPix {
    /// Read a UPix from a reader.
    pub fn read_from_reader(reader: &mut impl Read) -> Result<Self> {
        Self::read_from_bytes(&read_bounded(reader)?)
    }

    /// Read a UPix from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read_from_reader(&mut BufReader::new(file))
    }

    /// Read a UPix from a byte slice.
    pub fn read_from_bytes(data: &[u8]) -> Result<Self> {
        let header = parse_header(data, "UPix", UPIX_VERSION)?;
        let binary = header.payload(data, 4, "UPix")?;

        let pixel_data: Vec<u32> = binary
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let mut upix = UPix::from_data(header.width, header.height, pixel_data)?;
        upix.set_unit(header.unit);
        Ok(upix)
    }

    /// Write a UPix to a writer.
    pub fn write_to_writer(&self, writer: &mut impl Write) -> Result<()> {
        write_header(writer, "UPix", UPIX_VERSION, self.dimensions(), 4, self.unit())?;
        for &val in self.data() {
            writer.write_all(&val.to_le_bytes())?;
        }
        writeln!(writer)?;
        Ok(())
    }

    /// Write a UPix to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write a UPix to a byte vector.
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to_writer(&mut buf)?;
        Ok(buf)
    }
}

// ============================================================================
// Internal helpers
// ============================================================================

struct Header {
    width: u32,
    height: u32,
    nbytes: u64,
    unit: String,
    end: usize,
}

impl Header {
    /// Slice out the binary payload following the text header.
    fn payload<'a>(&self, data: &'a [u8], bytes_per_pixel: u64, type_name: &str) -> Result<&'a [u8]> {
        let npixels = self.width as u64 * self.height as u64;
        if npixels > MAX_PIXELS {
            return Err(Error::DecodeError(format!(
                "{type_name} too large: {npixels} pixels exceeds maximum {MAX_PIXELS}"
            )));
        }
        let expected = npixels * bytes_per_pixel;
        if self.nbytes != expected {
            return Err(Error::DecodeError(format!(
                "{type_name} nbytes mismatch: header says {} but w*h*{bytes_per_pixel} = {expected}",
                self.nbytes
            )));
        }
        let end = self.end + self.nbytes as usize;
        if data.len() < end {
            return Err(Error::DecodeError(format!(
                "{type_name} data truncated: need {end} bytes but only have {}",
                data.len()
            )));
        }
        Ok(&data[self.end..end])
    }
}

fn read_bounded(reader: &mut impl Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(MAX_INPUT_SIZE + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > MAX_INPUT_SIZE {
        return Err(Error::DecodeError(format!(
            "input too large: exceeds maximum allowed size of {MAX_INPUT_SIZE} bytes"
        )));
    }
    Ok(buf)
}

fn write_header(
    writer: &mut impl Write,
    type_name: &str,
    version: i32,
    (width, height): (u32, u32),
    bytes_per_pixel: u64,
    unit: &str,
) -> Result<()> {
    if unit.contains('\n') {
        return Err(Error::InvalidParameter(format!(
            "unit must be a single line: {unit:?}"
        )));
    }
    let nbytes = (width as u64) * (height as u64) * bytes_per_pixel;
    writeln!(writer, "\n{type_name} Version {version}")?;
    writeln!(writer, "w = {width}, h = {height}, nbytes = {nbytes}")?;
    writeln!(writer, "unit = {unit}")?;
    Ok(())
}

/// Parse the three-line text header that precedes the binary payload.
fn parse_header(data: &[u8], type_name: &str, expected_version: i32) -> Result<Header> {
    let end = find_header_end_by_lines(data)?;
    let header_text = std::str::from_utf8(&data[..end])
        .map_err(|e| Error::DecodeError(format!("{type_name} header is not valid UTF-8: {e}")))?;
    let mut lines = header_text.lines().map(str::trim).filter(|l| !l.is_empty());

    let version_prefix = format!("{type_name} Version ");
    let version: i32 = lines
        .next()
        .and_then(|l| l.strip_prefix(&version_prefix))
        .ok_or_else(|| Error::DecodeError(format!("{type_name} version line not found")))?
        .trim()
        .parse()
        .map_err(|e| Error::DecodeError(format!("failed to parse {type_name} version: {e}")))?;
    if version != expected_version {
        return Err(Error::DecodeError(format!(
            "invalid {type_name} version: {version}"
        )));
    }

    let dim_line = lines
        .next()
        .filter(|l| l.starts_with("w = "))
        .ok_or_else(|| Error::DecodeError(format!("{type_name} dimension line not found")))?;
    let (width, height, nbytes) = parse_dim_line(dim_line)?;

    let unit = lines
        .next()
        .and_then(|l| l.strip_prefix("unit ="))
        .ok_or_else(|| Error::DecodeError(format!("{type_name} unit line not found")))?
        .trim()
        .to_string();

    Ok(Header {
        width,
        height,
        nbytes,
        unit,
        end,
    })
}

/// Find the byte offset where binary data begins.
///
/// The header has 3 content lines (version, dimensions, unit), possibly
/// preceded by empty lines. Returns the offset right after the third
/// content line's newline.
fn find_header_end_by_lines(data: &[u8]) -> Result<usize> {
    let scan_limit = data.len().min(1024);
    let mut content_lines_found = 0;
    let mut pos = 0;

    while pos < scan_limit {
        let Some(offset) = data[pos..scan_limit].iter().position(|&b| b == b'\n') else {
            break;
        };
        let line_end = pos + offset;
        if data[pos..line_end].iter().any(|&b| b != b' ' && b != b'\r') {
            content_lines_found += 1;
            if content_lines_found == 3 {
                return Ok(line_end + 1);
            }
        }
        pos = line_end + 1;
    }
    Err(Error::DecodeError(
        "could not find end of text header (expected 3 header lines)".into(),
    ))
}

/// Parse "w = W, h = H, nbytes = N"
fn parse_dim_line(line: &str) -> Result<(u32, u32, u64)> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        return Err(Error::DecodeError(format!("invalid dimension line: '{line}'")));
    }

    let w = parse_key_value(parts[0], "w")?;
    let h = parse_key_value(parts[1], "h")?;
    let nbytes = parse_key_value(parts[2], "nbytes")?;

    if w == 0 || h == 0 {
        return Err(Error::DecodeError(format!("invalid dimensions: w={w}, h={h}")));
    }

    Ok((w, h, nbytes))
}

/// Parse "key = value"
fn parse_key_value<T>(s: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.split('=')
        .nth(1)
        .ok_or_else(|| Error::DecodeError(format!("missing '=' in {key} field")))?
        .trim()
        .parse()
        .map_err(|e| Error::DecodeError(format!("failed to parse {key}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fpix_roundtrip_keeps_unit_and_nan() {
        let mut fpix = FPix::new(4, 3).unwrap();
        fpix.set_pixel(0, 0, 1.5).unwrap();
        fpix.set_pixel(3, 2, f32::NAN).unwrap();
        fpix.set_unit("counts");

        let bytes = fpix.write_to_bytes().unwrap();
        assert!(bytes.starts_with(FPIX_MAGIC));
        let restored = FPix::read_from_bytes(&bytes).unwrap();

        assert_eq!(restored.dimensions(), (4, 3));
        assert_eq!(restored.get_pixel(0, 0).unwrap(), 1.5);
        assert!(restored.get_pixel(3, 2).unwrap().is_nan());
        assert_eq!(restored.unit(), "counts");
    }

    #[test]
    fn test_fpix_empty_unit() {
        let fpix = FPix::new_with_value(2, 2, 3.0).unwrap();
        let restored = FPix::read_from_bytes(&fpix.write_to_bytes().unwrap()).unwrap();
        assert_eq!(restored.unit(), "");
        assert_eq!(restored.data(), &[3.0; 4]);
    }

    #[test]
    fn test_fpix_file_roundtrip() {
        let fpix = FPix::new_with_value(3, 2, 7.5).unwrap();

        let dir = std::env::temp_dir().join("nautilus_test_fpix");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test_fpix.fpix");

        fpix.write_to_file(&path).unwrap();
        let restored = FPix::read_from_file(&path).unwrap();
        assert_eq!(restored, fpix);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fpix_rejects_multiline_unit() {
        let fpix = FPix::new(1, 1).unwrap().with_unit("a\nb");
        assert!(fpix.write_to_bytes().is_err());
    }

    #[test]
    fn test_fpix_invalid_data() {
        assert!(FPix::read_from_bytes(b"not valid data").is_err());
    }

    #[test]
    fn test_fpix_truncated_payload() {
        let fpix = FPix::new(4, 4).unwrap();
        let bytes = fpix.write_to_bytes().unwrap();
        assert!(FPix::read_from_bytes(&bytes[..bytes.len() - 10]).is_err());
    }

    #[test]
    fn test_upix_roundtrip() {
        let upix = UPix::from_data(3, 2, vec![0, 1, 2, 3, 4, u32::MAX]).unwrap();
        let bytes = upix.write_to_bytes().unwrap();
        assert!(bytes.starts_with(UPIX_MAGIC));
        let restored = UPix::read_from_bytes(&bytes).unwrap();
        assert_eq!(restored, upix);
    }

    #[test]
    fn test_type_mismatch_is_rejected() {
        let upix = UPix::new(2, 2).unwrap();
        let bytes = upix.write_to_bytes().unwrap();
        assert!(FPix::read_from_bytes(&bytes).is_err());
    }
}
