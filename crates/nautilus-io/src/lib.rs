//! nautilus-io - Image and region I/O for adaptive binning
//!
//! Readers turn a file into an [`InputImage`] (samples, null mask, unit);
//! writers store the binning outputs. Supported formats:
//!
//! | Format | Read | Write |
//! |--------|------|-------|
//! | native FPix / UPix serial | yes | yes |
//! | TIFF (gray, any integer or float sample) | yes | f32 / u32 |
//! | PNG (gray 8 / 16 bit) | yes | no |
//!
//! Input formats are detected from the file contents, output formats from
//! the path extension (`.tif` / `.tiff` select TIFF, anything else the
//! native serialization).

pub mod error;
pub mod format;
pub mod input;
#[cfg(feature = "png-format")]
pub mod png;
#[cfg(feature = "tiff-format")]
pub mod tiff;

pub use error::{IoError, IoResult};
pub use format::{
    ImageFormat, detect_format, detect_format_from_bytes, detect_format_from_reader,
    format_from_extension,
};
pub use input::InputImage;

use nautilus_core::{FPix, NullMask, Region, UPix};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Whether an optional file argument is switched off
///
/// Empty strings and `none` (any case) disable the file.
pub fn is_disabled(name: &str) -> bool {
    let name = name.trim();
    name.is_empty() || name.eq_ignore_ascii_case("none")
}

/// Read an image to be binned
///
/// # Arguments
///
/// * `path` - Image file; the format is detected from its contents
/// * `null_value` - Integer sample value marking null pixels
pub fn read_image<P: AsRef<Path>>(path: P, null_value: Option<i64>) -> IoResult<InputImage> {
    let path = path.as_ref();
    let format = detect_format(path)?;
    debug!(path = %path.display(), ?format, "reading image");

    let image = match format {
        ImageFormat::FPix => InputImage::from_float_pix(FPix::read_from_file(path)?),
        ImageFormat::UPix => {
            let labels = UPix::read_from_file(path)?;
            let (w, h) = labels.dimensions();
            input::from_integers(w, h, labels.data(), null_value, labels.unit())?
        }
        #[cfg(feature = "tiff-format")]
        ImageFormat::Tiff => tiff::read_tiff(BufReader::new(File::open(path)?), null_value)?,
        #[cfg(feature = "png-format")]
        ImageFormat::Png => png::read_png(BufReader::new(File::open(path)?), null_value)?,
        #[allow(unreachable_patterns)]
        other => {
            return Err(IoError::UnsupportedFormat(format!(
                "{:?} support not enabled",
                other
            )));
        }
    };

    debug!(
        width = image.width(),
        height = image.height(),
        nulls = image.nulls.count_null(),
        unit = %image.unit,
        "image decoded"
    );
    Ok(image)
}

/// Read a spatial mask image
///
/// Pixels where the mask is zero, NaN or null are excluded from binning.
/// The mask must have the given dimensions.
pub fn read_mask_image<P: AsRef<Path>>(path: P, dimensions: (u32, u32)) -> IoResult<NullMask> {
    let mask = read_image(path, None)?;
    if mask.dimensions() != dimensions {
        return Err(nautilus_core::Error::DimensionMismatch {
            expected: dimensions,
            actual: mask.dimensions(),
        }
        .into());
    }

    let mut nulls = NullMask::from_predicate(&mask.pix, |v| v == 0.0 || v.is_nan());
    nulls.merge(&mask.nulls)?;
    Ok(nulls)
}

/// Load the per-pixel error grid for `image`
///
/// With no path (or a disabled one) the error is derived from the data as
/// `sqrt(value)` for valid pixels and 0 for null pixels. A supplied error
/// image must match the input dimensions exactly.
pub fn load_error_image(path: Option<&str>, image: &InputImage) -> IoResult<FPix> {
    match path {
        Some(p) if !is_disabled(p) => {
            let errors = read_image(p, None)?;
            image.pix.check_same_size(errors.dimensions())?;
            Ok(errors.pix)
        }
        _ => {
            debug!("deriving errors as sqrt(value)");
            let (w, h) = image.dimensions();
            let mut errors = FPix::new(w, h)?.with_unit(image.unit.clone());
            for y in 0..h {
                for x in 0..w {
                    if !image.nulls.is_null(x, y) {
                        let v = image.pix.get_pixel_unchecked(x, y);
                        errors.set_pixel_unchecked(x, y, v.sqrt());
                    }
                }
            }
            Ok(errors)
        }
    }
}

/// Write a float grid; the format follows the path extension
pub fn write_fpix<P: AsRef<Path>>(path: P, pix: &FPix) -> IoResult<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "writing float grid");
    match format_from_extension(path) {
        #[cfg(feature = "tiff-format")]
        Some(ImageFormat::Tiff) => {
            tiff::write_tiff_fpix(pix, std::io::BufWriter::new(File::create(path)?))
        }
        Some(other) => Err(IoError::UnsupportedFormat(format!(
            "cannot write float grid as {:?}",
            other
        ))),
        None => Ok(pix.write_to_file(path)?),
    }
}

/// Write a label grid; the format follows the path extension
pub fn write_upix<P: AsRef<Path>>(path: P, pix: &UPix) -> IoResult<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "writing label grid");
    match format_from_extension(path) {
        #[cfg(feature = "tiff-format")]
        Some(ImageFormat::Tiff) => {
            tiff::write_tiff_upix(pix, std::io::BufWriter::new(File::create(path)?))
        }
        Some(other) => Err(IoError::UnsupportedFormat(format!(
            "cannot write label grid as {:?}",
            other
        ))),
        None => Ok(pix.write_to_file(path)?),
    }
}

/// Write a region file
pub fn write_region<P: AsRef<Path>>(path: P, region: &Region) -> IoResult<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), shapes = region.len(), "writing region");
    Ok(region.write_to_file(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_disabled() {
        assert!(is_disabled(""));
        assert!(is_disabled("  "));
        assert!(is_disabled("none"));
        assert!(is_disabled("NONE"));
        assert!(!is_disabled("none.fpix"));
        assert!(!is_disabled("err.tif"));
    }

    #[test]
    fn test_derived_errors() {
        let pix = FPix::from_data(2, 2, vec![4.0, f32::NAN, 9.0, 0.0]).unwrap();
        let image = InputImage::from_float_pix(pix);

        let errors = load_error_image(None, &image).unwrap();
        assert_eq!(errors.data(), &[2.0, 0.0, 3.0, 0.0]);

        let errors = load_error_image(Some("None"), &image).unwrap();
        assert_eq!(errors.get_pixel(1, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_missing_error_file() {
        let pix = FPix::new_with_value(1, 1, 1.0).unwrap();
        let image = InputImage::from_float_pix(pix);
        assert!(matches!(
            load_error_image(Some("/nonexistent/err.fpix"), &image),
            Err(IoError::Io(_))
        ));
    }
}
