//! TIFF image format support
//!
//! Reads single-channel TIFF images of any integer or float sample type
//! and writes float grids as 32-bit float gray and label grids as 32-bit
//! unsigned gray. The physical unit travels in the ImageDescription tag.

use crate::input::{InputImage, from_floats, from_integers};
use crate::{IoError, IoResult};
use nautilus_core::{FPix, UPix, check_dimensions};
use std::io::{Read, Seek, Write};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::{Gray32, Gray32Float};
use tiff::tags::Tag;

/// Read the first page of a gray TIFF image
///
/// # Arguments
///
/// * `reader` - Source of the TIFF data
/// * `null_value` - Integer sample value marking null pixels; ignored for
///   float samples, where NaN is null
pub fn read_tiff<R: Read + Seek>(reader: R, null_value: Option<i64>) -> IoResult<InputImage> {
    let mut decoder = Decoder::new(reader)
        .map_err(|e| IoError::DecodeError(format!("TIFF decode error: {}", e)))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| IoError::DecodeError(format!("Failed to get TIFF dimensions: {}", e)))?;
    check_dimensions(width, height)?;
    let color_type = decoder
        .colortype()
        .map_err(|e| IoError::DecodeError(format!("Failed to get TIFF color type: {}", e)))?;

    if !matches!(color_type, ColorType::Gray(_)) {
        return Err(IoError::UnsupportedFormat(format!(
            "only single-channel TIFF images can be binned, got {:?}",
            color_type
        )));
    }

    let unit = decoder
        .get_tag_ascii_string(Tag::ImageDescription)
        .map(|s| s.trim_end_matches('\0').to_string())
        .unwrap_or_default();

    let image_data = decoder
        .read_image()
        .map_err(|e| IoError::DecodeError(format!("Failed to read TIFF image data: {}", e)))?;

    match image_data {
        DecodingResult::U8(data) => from_integers(width, height, &data, null_value, &unit),
        DecodingResult::U16(data) => from_integers(width, height, &data, null_value, &unit),
        DecodingResult::U32(data) => from_integers(width, height, &data, null_value, &unit),
        DecodingResult::I8(data) => from_integers(width, height, &data, null_value, &unit),
        DecodingResult::I16(data) => from_integers(width, height, &data, null_value, &unit),
        DecodingResult::I32(data) => from_integers(width, height, &data, null_value, &unit),
        DecodingResult::F32(data) => from_floats(width, height, &data, &unit),
        DecodingResult::F64(data) => from_floats(width, height, &data, &unit),
        _ => Err(IoError::UnsupportedFormat(
            "unsupported TIFF sample type (64-bit integer or 16-bit float)".to_string(),
        )),
    }
}

/// Write a float grid as a 32-bit float gray TIFF
pub fn write_tiff_fpix<W: Write + Seek>(pix: &FPix, writer: W) -> IoResult<()> {
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| IoError::EncodeError(format!("TIFF encoder error: {}", e)))?;
    let mut image = encoder
        .new_image::<Gray32Float>(pix.width(), pix.height())
        .map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))?;
    if !pix.unit().is_empty() {
        image
            .encoder()
            .write_tag(Tag::ImageDescription, pix.unit())
            .map_err(|e| IoError::EncodeError(format!("TIFF tag error: {}", e)))?;
    }
    image
        .write_data(pix.data())
        .map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))?;
    Ok(())
}

/// Write a label grid as a 32-bit unsigned gray TIFF
pub fn write_tiff_upix<W: Write + Seek>(pix: &UPix, writer: W) -> IoResult<()> {
    let mut encoder = TiffEncoder::new(writer)
        .map_err(|e| IoError::EncodeError(format!("TIFF encoder error: {}", e)))?;
    let mut image = encoder
        .new_image::<Gray32>(pix.width(), pix.height())
        .map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))?;
    if !pix.unit().is_empty() {
        image
            .encoder()
            .write_tag(Tag::ImageDescription, pix.unit())
            .map_err(|e| IoError::EncodeError(format!("TIFF tag error: {}", e)))?;
    }
    image
        .write_data(pix.data())
        .map_err(|e| IoError::EncodeError(format!("TIFF write error: {}", e)))?;
    Ok(())
}
