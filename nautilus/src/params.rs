//! Run parameters
//!
//! [`RunParams`] is the validated description of one binning run.
//! [`RunConfig`] is its loose, all-optional form: what a JSON configuration
//! file or a command line supplies. Configurations are layered with
//! [`RunConfig::merge`] and turned into parameters with
//! [`RunConfig::into_params`].
//!
//! ```json
//! {
//!   "infile": "counts.fpix",
//!   "outfile": "binned.fpix",
//!   "snr": 5.0,
//!   "method": "one-above",
//!   "outmaskfile": "mask.upix",
//!   "transform": {
//!     "x": { "crpix": 1.0, "crval": 3000.5, "cdelt": 0.5 },
//!     "y": { "crpix": 1.0, "crval": 3000.5, "cdelt": 0.5 }
//!   }
//! }
//! ```

use crate::error::{RunError, RunResult};
use nautilus_binning::{BinningParams, LinearTransform, SplitPolicy};
use nautilus_io::is_disabled;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of an autonamed binned image
const VALUE_SUFFIX: &str = "abinimg";
const AREA_SUFFIX: &str = "areaimg";
const SNR_SUFFIX: &str = "snrimg";
const MASK_SUFFIX: &str = "maskimg";

/// Extension appended to the mask path for the default region file
const REGION_EXTENSION: &str = "reg";

/// Validated parameters of one run
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    /// Image to bin
    pub infile: PathBuf,
    /// Binned image
    pub outfile: PathBuf,
    /// SNR threshold
    pub snr: f64,
    /// Split policy
    pub method: SplitPolicy,
    /// Error image; `None`, empty or `none` derives errors from the data
    pub inerrfile: Option<String>,
    /// Spatial mask image; zero or NaN pixels are excluded
    pub inmaskfile: Option<String>,
    /// Integer sample value marking null pixels
    pub null_value: Option<i64>,
    /// Bin id image
    pub outmaskfile: Option<String>,
    /// Bin SNR image
    pub outsnrfile: Option<String>,
    /// Bin area image
    pub outareafile: Option<String>,
    /// Region file; defaults to `<outmaskfile>.reg`
    pub outregfile: Option<String>,
    /// Pixel to physical transform for the region file
    pub transform: Option<LinearTransform>,
    /// Overwrite existing outputs
    pub clobber: bool,
}

/// Resolved output files of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub value: PathBuf,
    pub area: Option<PathBuf>,
    pub snr: Option<PathBuf>,
    pub mask: Option<PathBuf>,
    pub region: Option<PathBuf>,
}

impl OutputPaths {
    /// Every enabled output, value image first
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.value.as_path()).chain(
            [&self.area, &self.snr, &self.mask, &self.region]
                .into_iter()
                .flatten()
                .map(PathBuf::as_path),
        )
    }
}

impl RunParams {
    /// Parameters with every optional output disabled
    pub fn new(infile: impl Into<PathBuf>, outfile: impl Into<PathBuf>, snr: f64) -> Self {
        Self {
            infile: infile.into(),
            outfile: outfile.into(),
            snr,
            method: SplitPolicy::default(),
            inerrfile: None,
            inmaskfile: None,
            null_value: None,
            outmaskfile: None,
            outsnrfile: None,
            outareafile: None,
            outregfile: None,
            transform: None,
            clobber: false,
        }
    }

    /// Threshold and policy for the binning engine
    pub fn binning_params(&self) -> RunResult<BinningParams> {
        Ok(BinningParams::new(self.snr, self.method)?)
    }

    /// Check the parameters without touching the file system
    pub fn validate(&self) -> RunResult<()> {
        if self.infile.as_os_str().is_empty() {
            return Err(RunError::InvalidParameter("infile is empty".to_string()));
        }
        let outfile = self.outfile.to_string_lossy();
        if is_disabled(&outfile) {
            return Err(RunError::InvalidParameter(format!(
                "outfile '{}' does not name a file",
                outfile
            )));
        }
        self.binning_params()?;
        Ok(())
    }

    /// Resolve the output file names
    ///
    /// An output given as `.` or as a directory is named after its base
    /// file: the binned image after the input, the other images after the
    /// binned image.
    pub fn output_paths(&self) -> OutputPaths {
        let value = autoname(&self.infile, &self.outfile, VALUE_SUFFIX);
        let optional = |target: &Option<String>, suffix: &str| {
            target
                .as_deref()
                .filter(|t| !is_disabled(t))
                .map(|t| autoname(&value, Path::new(t), suffix))
        };

        let area = optional(&self.outareafile, AREA_SUFFIX);
        let snr = optional(&self.outsnrfile, SNR_SUFFIX);
        let mask = optional(&self.outmaskfile, MASK_SUFFIX);
        let region = match self.outregfile.as_deref() {
            Some(t) if is_disabled(t) => None,
            Some(t) => Some(PathBuf::from(t)),
            None => mask.as_ref().map(|m| {
                let mut name = OsString::from(m.as_os_str());
                name.push(".");
                name.push(REGION_EXTENSION);
                PathBuf::from(name)
            }),
        };

        OutputPaths {
            value,
            area,
            snr,
            mask,
            region,
        }
    }
}

/// Name `target` after `base` when it is `.` or a directory
fn autoname(base: &Path, target: &Path, suffix: &str) -> PathBuf {
    let is_dir = target.as_os_str() == "."
        || target.to_string_lossy().ends_with('/')
        || target.is_dir();
    if !is_dir {
        return target.to_path_buf();
    }

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let root = stem
        .strip_suffix(&format!("_{VALUE_SUFFIX}"))
        .unwrap_or(&stem);
    let name = match base.extension() {
        Some(ext) => format!("{}_{}.{}", root, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", root, suffix),
    };
    target.join(name)
}

/// All-optional run configuration, as read from JSON or the command line
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub infile: Option<PathBuf>,
    pub outfile: Option<PathBuf>,
    pub snr: Option<f64>,
    pub method: Option<SplitPolicy>,
    pub inerrfile: Option<String>,
    pub inmaskfile: Option<String>,
    pub null_value: Option<i64>,
    pub outmaskfile: Option<String>,
    pub outsnrfile: Option<String>,
    pub outareafile: Option<String>,
    pub outregfile: Option<String>,
    pub transform: Option<LinearTransform>,
    pub clobber: Option<bool>,
}

impl RunConfig {
    /// Load a JSON configuration file
    pub fn load(path: &Path) -> RunResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| RunError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| RunError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Layer `overrides` on top of this configuration
    pub fn merge(self, overrides: RunConfig) -> RunConfig {
        RunConfig {
            infile: overrides.infile.or(self.infile),
            outfile: overrides.outfile.or(self.outfile),
            snr: overrides.snr.or(self.snr),
            method: overrides.method.or(self.method),
            inerrfile: overrides.inerrfile.or(self.inerrfile),
            inmaskfile: overrides.inmaskfile.or(self.inmaskfile),
            null_value: overrides.null_value.or(self.null_value),
            outmaskfile: overrides.outmaskfile.or(self.outmaskfile),
            outsnrfile: overrides.outsnrfile.or(self.outsnrfile),
            outareafile: overrides.outareafile.or(self.outareafile),
            outregfile: overrides.outregfile.or(self.outregfile),
            transform: overrides.transform.or(self.transform),
            clobber: overrides.clobber.or(self.clobber),
        }
    }

    /// Fill in defaults and validate
    ///
    /// # Errors
    ///
    /// `infile`, `outfile` and `snr` are required; see also
    /// [`RunParams::validate`].
    pub fn into_params(self) -> RunResult<RunParams> {
        let required = |name: &str| RunError::InvalidParameter(format!("{name} is required"));
        let params = RunParams {
            infile: self.infile.ok_or_else(|| required("infile"))?,
            outfile: self.outfile.ok_or_else(|| required("outfile"))?,
            snr: self.snr.ok_or_else(|| required("snr"))?,
            method: self.method.unwrap_or_default(),
            inerrfile: self.inerrfile,
            inmaskfile: self.inmaskfile,
            null_value: self.null_value,
            outmaskfile: self.outmaskfile,
            outsnrfile: self.outsnrfile,
            outareafile: self.outareafile,
            outregfile: self.outregfile,
            transform: self.transform,
            clobber: self.clobber.unwrap_or(false),
        };
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nautilus_binning::{AxisTransform, BinningError};

    #[test]
    fn test_validate() {
        assert!(RunParams::new("in.fpix", "out.fpix", 3.0).validate().is_ok());
        assert!(matches!(
            RunParams::new("", "out.fpix", 3.0).validate(),
            Err(RunError::InvalidParameter(_))
        ));
        assert!(matches!(
            RunParams::new("in.fpix", "none", 3.0).validate(),
            Err(RunError::InvalidParameter(_))
        ));
        assert!(matches!(
            RunParams::new("in.fpix", "out.fpix", 0.0).validate(),
            Err(RunError::Binning(BinningError::InvalidThreshold(_)))
        ));
    }

    #[test]
    fn test_output_paths_defaults() {
        let mut params = RunParams::new("in.fpix", "out.fpix", 3.0);
        params.outmaskfile = Some("mask.upix".to_string());
        params.outsnrfile = Some("NONE".to_string());
        params.outareafile = Some("".to_string());

        let paths = params.output_paths();
        assert_eq!(paths.value, PathBuf::from("out.fpix"));
        assert_eq!(paths.mask, Some(PathBuf::from("mask.upix")));
        assert_eq!(paths.region, Some(PathBuf::from("mask.upix.reg")));
        assert_eq!(paths.snr, None);
        assert_eq!(paths.area, None);
        assert_eq!(paths.iter().count(), 3);
    }

    #[test]
    fn test_output_paths_region_override() {
        let mut params = RunParams::new("in.fpix", "out.fpix", 3.0);
        params.outmaskfile = Some("mask.upix".to_string());
        params.outregfile = Some("none".to_string());
        assert_eq!(params.output_paths().region, None);

        params.outmaskfile = None;
        params.outregfile = Some("bins.reg".to_string());
        assert_eq!(params.output_paths().region, Some(PathBuf::from("bins.reg")));
    }

    #[test]
    fn test_autoname() {
        let mut params = RunParams::new("data/counts.tif", ".", 3.0);
        params.outmaskfile = Some(".".to_string());
        params.outareafile = Some("products/".to_string());

        let paths = params.output_paths();
        assert_eq!(paths.value, PathBuf::from("./counts_abinimg.tif"));
        assert_eq!(paths.mask, Some(PathBuf::from("./counts_maskimg.tif")));
        assert_eq!(paths.area, Some(PathBuf::from("products/counts_areaimg.tif")));
        assert_eq!(
            paths.region,
            Some(PathBuf::from("./counts_maskimg.tif.reg"))
        );
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "infile": "in.fpix",
            "outfile": "out.fpix",
            "snr": 5,
            "method": "two-above",
            "null_value": -1,
            "transform": {
                "x": {"crpix": 1, "crval": 100, "cdelt": 2},
                "y": {"crpix": 1, "crval": 200, "cdelt": 2}
            }
        }"#;
        let config: RunConfig = serde_json::from_str(json).unwrap();
        let params = config.into_params().unwrap();
        assert_eq!(params.snr, 5.0);
        assert_eq!(params.method, SplitPolicy::TwoAbove);
        assert_eq!(params.null_value, Some(-1));
        assert_eq!(
            params.transform.map(|t| t.x),
            Some(AxisTransform::new(1.0, 100.0, 2.0))
        );
        assert!(!params.clobber);
    }

    #[test]
    fn test_config_numeric_method_and_unknown_field() {
        let config: RunConfig = serde_json::from_str(r#"{"method": 4}"#).unwrap();
        assert_eq!(config.method, Some(SplitPolicy::AllAbove));
        assert!(serde_json::from_str::<RunConfig>(r#"{"method": 5}"#).is_err());
        assert!(serde_json::from_str::<RunConfig>(r#"{"smr": 5}"#).is_err());
    }

    #[test]
    fn test_merge_and_required() {
        let file = RunConfig {
            infile: Some("a.fpix".into()),
            outfile: Some("b.fpix".into()),
            snr: Some(3.0),
            clobber: Some(true),
            ..RunConfig::default()
        };
        let flags = RunConfig {
            snr: Some(10.0),
            ..RunConfig::default()
        };
        let params = file.merge(flags).into_params().unwrap();
        assert_eq!(params.snr, 10.0);
        assert!(params.clobber);
        assert_eq!(params.infile, PathBuf::from("a.fpix"));

        let missing = RunConfig {
            infile: Some("a.fpix".into()),
            outfile: Some("b.fpix".into()),
            ..RunConfig::default()
        };
        assert!(matches!(
            missing.into_params(),
            Err(RunError::InvalidParameter(msg)) if msg.contains("snr")
        ));
    }
}
