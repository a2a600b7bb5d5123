//! PNG image format support
//!
//! PNG is accepted as an input format for 8- and 16-bit grayscale counts
//! images. Binning outputs are floats and are never written as PNG.

use crate::input::{InputImage, from_integers};
use crate::{IoError, IoResult};
use nautilus_core::check_dimensions;
use png::{BitDepth, ColorType, Decoder};
use std::io::{BufRead, Seek};

/// Read a grayscale PNG image
pub fn read_png<R: BufRead + Seek>(reader: R, null_value: Option<i64>) -> IoResult<InputImage> {
    let decoder = Decoder::new(reader);
    let mut reader = decoder
        .read_info()
        .map_err(|e| IoError::DecodeError(format!("PNG decode error: {}", e)))?;

    let info = reader.info();
    let width = info.width;
    let height = info.height;
    let color_type = info.color_type;
    let bit_depth = info.bit_depth;
    check_dimensions(width, height)?;

    if color_type != ColorType::Grayscale
        || !matches!(bit_depth, BitDepth::Eight | BitDepth::Sixteen)
    {
        return Err(IoError::UnsupportedFormat(format!(
            "unsupported PNG format: {:?} {:?}",
            color_type, bit_depth
        )));
    }

    let buf_size = reader
        .output_buffer_size()
        .ok_or_else(|| IoError::DecodeError("failed to get output buffer size".to_string()))?;
    let mut buf = vec![0; buf_size];
    let output_info = reader
        .next_frame(&mut buf)
        .map_err(|e| IoError::DecodeError(format!("PNG frame error: {}", e)))?;

    let bytes_per_row = output_info.line_size;
    let data = &buf[..output_info.buffer_size()];
    let npix = width as usize * height as usize;

    match bit_depth {
        BitDepth::Sixteen => {
            let mut samples = Vec::with_capacity(npix);
            for y in 0..height as usize {
                let row = &data[y * bytes_per_row..];
                samples.extend(
                    row[..width as usize * 2]
                        .chunks_exact(2)
                        .map(|b| u16::from_be_bytes([b[0], b[1]])),
                );
            }
            from_integers(width, height, &samples, null_value, "")
        }
        _ => {
            let mut samples = Vec::with_capacity(npix);
            for y in 0..height as usize {
                let row_start = y * bytes_per_row;
                samples.extend_from_slice(&data[row_start..row_start + width as usize]);
            }
            from_integers(width, height, &samples, null_value, "")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use png::Encoder;
    use std::io::Cursor;

    fn encode_gray(width: u32, height: u32, depth: BitDepth, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut encoder = Encoder::new(&mut out, width, height);
            encoder.set_color(ColorType::Grayscale);
            encoder.set_depth(depth);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(data).unwrap();
        }
        out
    }

    #[test]
    fn test_read_png_8bit() {
        let bytes = encode_gray(3, 2, BitDepth::Eight, &[0, 1, 2, 3, 4, 255]);
        let img = read_png(Cursor::new(bytes), Some(255)).unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.pix.get_pixel(2, 0).unwrap(), 2.0);
        assert!(img.nulls.is_null(2, 1));
        assert_eq!(img.nulls.count_null(), 1);
    }

    #[test]
    fn test_read_png_16bit_big_endian() {
        let bytes = encode_gray(2, 1, BitDepth::Sixteen, &[0x01, 0x00, 0xFF, 0xFE]);
        let img = read_png(Cursor::new(bytes), None).unwrap();
        assert_eq!(img.pix.data(), &[256.0, 65534.0]);
    }

    #[test]
    fn test_read_png_rejects_rgb() {
        let mut out = Vec::new();
        {
            let mut encoder = Encoder::new(&mut out, 1, 1);
            encoder.set_color(ColorType::Rgb);
            encoder.set_depth(BitDepth::Eight);
            let mut writer = encoder.write_header().unwrap();
            writer.write_image_data(&[1, 2, 3]).unwrap();
        }
        assert!(matches!(
            read_png(Cursor::new(out), None),
            Err(IoError::UnsupportedFormat(_))
        ));
    }
}
