//! One binning run, from input files to output files

use crate::error::{RunError, RunResult};
use crate::params::{OutputPaths, RunParams};
use nautilus_binning::{BinningSummary, CoordTransform, IdentityTransform, bin_image};
use nautilus_io::{IoError, is_disabled};
use std::path::Path;
use tracing::{debug, info};

/// Refuse to run when an enabled output exists and clobber is off
///
/// Checked before any input is read, so a refused run writes nothing.
pub fn check_outputs(outputs: &OutputPaths, clobber: bool) -> RunResult<()> {
    if clobber {
        return Ok(());
    }
    match outputs.iter().find(|p| p.exists()) {
        Some(path) => Err(RunError::OutputExists(path.to_path_buf())),
        None => Ok(()),
    }
}

fn read_error(path: &Path) -> impl FnOnce(IoError) -> RunError + '_ {
    move |source| RunError::Read {
        path: path.to_path_buf(),
        source,
    }
}

fn write_error(path: &Path) -> impl FnOnce(IoError) -> RunError + '_ {
    move |source| RunError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Bin the input image and write every enabled output
///
/// Outputs are written in the order value, area, SNR, mask, region.
///
/// # Errors
///
/// Fails on invalid parameters, existing outputs without clobber, and any
/// read or write failure.
pub fn run(params: &RunParams) -> RunResult<BinningSummary> {
    params.validate()?;
    let binning = params.binning_params()?;
    let outputs = params.output_paths();
    check_outputs(&outputs, params.clobber)?;

    info!(
        infile = %params.infile.display(),
        snr = binning.threshold,
        method = %binning.policy,
        "binning"
    );

    let mut image = nautilus_io::read_image(&params.infile, params.null_value)
        .map_err(read_error(&params.infile))?;

    if let Some(maskfile) = params.inmaskfile.as_deref().filter(|m| !is_disabled(m)) {
        let path = Path::new(maskfile);
        let mask = nautilus_io::read_mask_image(path, image.dimensions())
            .map_err(read_error(path))?;
        image.apply_mask(&mask).map_err(read_error(path))?;
        debug!(nulls = image.nulls.count_null(), "mask applied");
    }

    let errfile = params.inerrfile.as_deref().filter(|e| !is_disabled(e));
    let errors = nautilus_io::load_error_image(errfile, &image)
        .map_err(read_error(errfile.map_or(params.infile.as_path(), Path::new)))?;

    let transform: &dyn CoordTransform = match &params.transform {
        Some(t) => t,
        None => &IdentityTransform,
    };
    let binned = bin_image(&image.pix, &errors, &image.nulls, transform, binning)?;

    let path = outputs.value.as_path();
    nautilus_io::write_fpix(path, &binned.value_grid()?).map_err(write_error(path))?;
    if let Some(path) = outputs.area.as_deref() {
        nautilus_io::write_fpix(path, &binned.area_grid()?).map_err(write_error(path))?;
    }
    if let Some(path) = outputs.snr.as_deref() {
        nautilus_io::write_fpix(path, &binned.snr_grid()?).map_err(write_error(path))?;
    }
    if let Some(path) = outputs.mask.as_deref() {
        nautilus_io::write_upix(path, &binned.mask_grid()?).map_err(write_error(path))?;
    }
    if let Some(path) = outputs.region.as_deref() {
        nautilus_io::write_region(path, binned.region()).map_err(write_error(path))?;
    }

    let summary = binned.summary();
    info!(outfile = %outputs.value.display(), "{}", summary);
    Ok(summary)
}
