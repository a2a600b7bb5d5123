//! Core data serialization regression test
//!
//! Stores float grids, label grids and regions through files and checks
//! that NaN samples, units and coordinates survive, and that damaged
//! files are rejected rather than misread.
//!
//! Run with:
//! ```
//! cargo test -p nautilus-core --test serial_reg
//! ```

use nautilus_core::{Box, Error, FPix, NullMask, Region, RegionRect, UPix};
use nautilus_test::{RegParams, scratch_dir};

#[test]
fn serial_reg_grids() {
    let mut rp = RegParams::new("serial_grids");
    let dir = scratch_dir("serial_grids");

    let data = (0..35)
        .map(|i| if i % 9 == 4 { f32::NAN } else { i as f32 * 0.25 - 3.0 })
        .collect();
    let pix = FPix::from_data(7, 5, data).unwrap().with_unit("erg/cm**2/s");
    let path = dir.join("values.fpix");
    pix.write_to_file(&path).unwrap();

    let back = FPix::read_from_file(&path).unwrap();
    rp.compare_fpix(&pix, &back, 0.0);
    rp.compare_strings(pix.unit().as_bytes(), back.unit().as_bytes());
    let nan_count = |p: &FPix| p.data().iter().filter(|v| v.is_nan()).count() as f64;
    rp.compare_values(nan_count(&pix), nan_count(&back), 0.0);
    rp.compare_values(
        NullMask::from_nan(&pix).count_null() as f64,
        NullMask::from_nan(&back).count_null() as f64,
        0.0,
    );

    let mut labels = UPix::from_data(3, 2, vec![1, 1, 2, 0, 3, 3]).unwrap();
    labels.set_unit("id");
    let path = dir.join("labels.upix");
    labels.write_to_file(&path).unwrap();
    let back = UPix::read_from_file(&path).unwrap();
    rp.compare_upix(&labels, &back);
    rp.compare_values(2.0, back.data().iter().filter(|&&v| v == 3).count() as f64, 0.0);

    // Truncated data must not decode
    let bytes = pix.write_to_bytes().unwrap();
    rp.check(
        FPix::read_from_bytes(&bytes[..bytes.len() - 3]).is_err(),
        "truncated float grid rejected",
    );
    // A float grid is not a label grid
    rp.check(
        UPix::read_from_bytes(&bytes).is_err(),
        "float grid rejected as label grid",
    );

    let _ = std::fs::remove_dir_all(&dir);
    assert!(rp.cleanup(), "serial_grids regression test failed");
}

#[test]
fn serial_reg_region() {
    let mut rp = RegParams::new("serial_region");
    let dir = scratch_dir("serial_region");

    let region: Region = [
        RegionRect::from_corners(-0.5, -0.5, 1.5, 1.5),
        RegionRect::from_corners(4095.25, 0.1, 4096.75, 0.30000000000000004),
        RegionRect::from_corners(-1e-7, 2.5, 3.5, 1e12),
    ]
    .into_iter()
    .collect();
    let path = dir.join("bins.reg");
    region.write_to_file(&path).unwrap();

    let back = Region::read_from_file(&path).unwrap();
    rp.check(back == region, "region survives a file round trip");
    rp.compare_values(region.total_area(), back.total_area(), 0.0);

    let text = std::fs::read_to_string(&path).unwrap();
    rp.check(
        text.starts_with("# Region file format: CIAO"),
        "region header line",
    );
    rp.compare_values(4.0, text.lines().count() as f64, 0.0);

    rp.check(
        matches!(
            Region::read_from_bytes(b"circle(1,2,3)\n"),
            Err(Error::DecodeError(_))
        ),
        "unsupported shape rejected",
    );
    rp.check(
        matches!(
            Region::read_from_bytes(b"rectangle(1,2,3)\n"),
            Err(Error::DecodeError(_))
        ),
        "short rectangle rejected",
    );

    let _ = std::fs::remove_dir_all(&dir);
    assert!(rp.cleanup(), "serial_region regression test failed");
}

#[test]
fn serial_reg_masks_and_boxes() {
    let mut rp = RegParams::new("serial_masks");

    let pix = FPix::from_data(3, 2, vec![0.0, 1.0, f32::NAN, 2.0, 0.0, 3.0]).unwrap();
    let mut nulls = NullMask::from_nan(&pix);
    let zeros = NullMask::from_predicate(&pix, |v| v == 0.0);
    nulls.merge(&zeros).unwrap();
    rp.compare_values(3.0, nulls.count_null() as f64, 0.0);
    rp.compare_values(3.0, nulls.count_valid() as f64, 0.0);
    rp.check(!nulls.all_null(), "mask keeps valid pixels");
    rp.check(
        nulls.merge(&NullMask::new(2, 3).unwrap()).is_err(),
        "masks of different size do not merge",
    );

    // Quadrants of odd extents may reach past the image edge
    let node = Box::new_unchecked(2, 1, 2, 2);
    let pixels: Vec<_> = node.clipped_pixels(3, 2).collect();
    rp.check(pixels == [(2, 1)], "footprint clipped to the image");
    rp.check(node.clip(3, 2) == Some(Box::new_unchecked(2, 1, 1, 1)), "clip box");
    rp.check(Box::new_unchecked(5, 5, 1, 1).clip(3, 2).is_none(), "outside box");

    assert!(rp.cleanup(), "serial_masks regression test failed");
}
