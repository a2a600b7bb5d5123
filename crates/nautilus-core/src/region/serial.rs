//! Serialization for Region
//!
//! Text region format, one shape per line:
//!
//! ```text
//! # Region file format: CIAO version 1.0
//! rectangle(X0,Y0,X1,Y1)
//! rectangle(X0,Y0,X1,Y1)
//! ...
//! ```
//!
//! Coordinates are written with the shortest representation that reads
//! back to the same `f64`, so a write/read cycle is lossless. Blank lines
//! and lines starting with `#` are ignored on input.

use crate::error::{Error, Result};
use crate::region::{Region, RegionRect};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// First line written to every region file
pub const REGION_HEADER: &str = "# Region file format: CIAO version 1.0";

/// Maximum input size in bytes
const MAX_INPUT_SIZE: usize = 500_000_000;

impl Region {
    /// Read a Region from a reader.
    pub fn read_from_reader(reader: &mut impl Read) -> Result<Self> {
        let mut buf = String::new();
        reader
            .take(MAX_INPUT_SIZE as u64)
            .read_to_string(&mut buf)?;
        Self::read_from_bytes(buf.as_bytes())
    }

    /// Read a Region from a file.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        Self::read_from_reader(&mut reader)
    }

    /// Read a Region from bytes.
    pub fn read_from_bytes(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::DecodeError(format!("invalid UTF-8: {e}")))?;

        let mut region = Region::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            region.push(parse_rectangle(line).map_err(|e| {
                Error::DecodeError(format!("line {}: {e}", lineno + 1))
            })?);
        }
        Ok(region)
    }

    /// Write a Region to a writer.
    pub fn write_to_writer(&self, writer: &mut impl Write) -> Result<()> {
        writeln!(writer, "{REGION_HEADER}")?;
        for r in &self.rects {
            writeln!(writer, "rectangle({},{},{},{})", r.x0, r.y0, r.x1, r.y1)?;
        }
        Ok(())
    }

    /// Write a Region to a file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        self.write_to_writer(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Write a Region to bytes.
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_to_writer(&mut buf)?;
        Ok(buf)
    }
}

/// Parse `rectangle(x0,y0,x1,y1)`; the shape name is case-insensitive.
fn parse_rectangle(line: &str) -> std::result::Result<RegionRect, String> {
    let open = line
        .find('(')
        .ok_or_else(|| format!("missing '(' in '{line}'"))?;
    let shape = line[..open].trim();
    if !shape.eq_ignore_ascii_case("rectangle") {
        return Err(format!("unsupported shape '{shape}'"));
    }
    let close = line
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| format!("missing ')' in '{line}'"))?;

    let values = line[open + 1..close]
        .split(',')
        .map(|s| s.trim().parse::<f64>().map_err(|e| format!("bad number '{s}': {e}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    match values.as_slice() {
        &[x0, y0, x1, y1] => Ok(RegionRect::from_corners(x0, y0, x1, y1)),
        other => Err(format!("expected 4 coordinates, got {}", other.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_text_layout() {
        let region: Region = [RegionRect::from_corners(-0.5, -0.5, 1.5, 3.5)]
            .into_iter()
            .collect();
        let text = String::from_utf8(region.write_to_bytes().unwrap()).unwrap();
        assert_eq!(
            text,
            format!("{REGION_HEADER}\nrectangle(-0.5,-0.5,1.5,3.5)\n")
        );
    }

    #[test]
    fn test_region_roundtrip_is_exact() {
        let region: Region = [
            RegionRect::from_corners(0.1, 0.2, 0.30000000000000004, 1e-12),
            RegionRect::from_corners(4096.5, -17.25, 1.0 / 3.0, 2.0),
        ]
        .into_iter()
        .collect();
        let restored = Region::read_from_bytes(&region.write_to_bytes().unwrap()).unwrap();
        assert_eq!(restored, region);
    }

    #[test]
    fn test_empty_region() {
        let restored = Region::read_from_bytes(&Region::new().write_to_bytes().unwrap()).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn test_region_reader_tolerates_case_and_spaces() {
        let text = b"# comment\n\n  Rectangle( 1, 2 , 3,4 )\n";
        let region = Region::read_from_bytes(text).unwrap();
        assert_eq!(region.len(), 1);
        assert_eq!(region.get(0), Some(&RegionRect::from_corners(1.0, 2.0, 3.0, 4.0)));
    }

    #[test]
    fn test_region_reader_rejects_other_shapes() {
        assert!(Region::read_from_bytes(b"circle(1,2,3)\n").is_err());
        assert!(Region::read_from_bytes(b"rectangle(1,2,3)\n").is_err());
        assert!(Region::read_from_bytes(b"rectangle(1,2,3,x)\n").is_err());
    }
}
