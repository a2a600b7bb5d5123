//! Adaptive quad-tree binning of a 2-D image
//!
//! # Usage
//!
//! ```bash
//! # Bin to SNR 5 with the default policy
//! nautilus counts.fpix binned.fpix --snr 5
//!
//! # Split when at least one quadrant qualifies; write the mask and region
//! nautilus counts.tif binned.tif --snr 5 --method one-above --outmaskfile mask.tif
//!
//! # Read everything from a JSON file, overriding the threshold
//! nautilus --config run.json --snr 8 --clobber
//! ```
//!
//! Log output goes to stderr; `RUST_LOG` takes precedence over `-v`.

use clap::Parser;
use nautilus::{LinearTransform, RunConfig, SplitPolicy, run};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Image to bin
    infile: Option<PathBuf>,

    /// Binned image; `.` or a directory names it after the input
    outfile: Option<PathBuf>,

    /// Target signal-to-noise ratio
    #[arg(short, long)]
    snr: Option<f64>,

    /// Split policy: 0-4 or zero-above, one-above, two-above, three-above, all-above
    #[arg(short, long)]
    method: Option<SplitPolicy>,

    /// Error image (default: sqrt of the data)
    #[arg(long)]
    inerrfile: Option<String>,

    /// Spatial mask image; zero or NaN pixels are excluded
    #[arg(long)]
    inmaskfile: Option<String>,

    /// Integer sample value marking null pixels
    #[arg(long, allow_hyphen_values = true)]
    null_value: Option<i64>,

    /// Bin id image (`none` to disable)
    #[arg(long)]
    outmaskfile: Option<String>,

    /// Bin SNR image (`none` to disable)
    #[arg(long)]
    outsnrfile: Option<String>,

    /// Bin area image (`none` to disable)
    #[arg(long)]
    outareafile: Option<String>,

    /// Region file (default: <outmaskfile>.reg)
    #[arg(long)]
    outregfile: Option<String>,

    /// Reference pixel of the x axis (1-based)
    #[arg(long, allow_hyphen_values = true)]
    crpix1: Option<f64>,
    /// Reference pixel of the y axis (1-based)
    #[arg(long, allow_hyphen_values = true)]
    crpix2: Option<f64>,
    /// Physical x at the reference pixel
    #[arg(long, allow_hyphen_values = true)]
    crval1: Option<f64>,
    /// Physical y at the reference pixel
    #[arg(long, allow_hyphen_values = true)]
    crval2: Option<f64>,
    /// Physical size of a pixel along x
    #[arg(long, allow_hyphen_values = true)]
    cdelt1: Option<f64>,
    /// Physical size of a pixel along y
    #[arg(long, allow_hyphen_values = true)]
    cdelt2: Option<f64>,

    /// Overwrite existing outputs
    #[arg(long)]
    clobber: bool,

    /// JSON run configuration; command-line values take precedence
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> RunConfig {
        RunConfig {
            infile: self.infile.clone(),
            outfile: self.outfile.clone(),
            snr: self.snr,
            method: self.method,
            inerrfile: self.inerrfile.clone(),
            inmaskfile: self.inmaskfile.clone(),
            null_value: self.null_value,
            outmaskfile: self.outmaskfile.clone(),
            outsnrfile: self.outsnrfile.clone(),
            outareafile: self.outareafile.clone(),
            outregfile: self.outregfile.clone(),
            transform: None,
            clobber: self.clobber.then_some(true),
        }
    }

    /// Apply the per-axis flags on top of `base`
    fn transform(&self, base: Option<LinearTransform>) -> Option<LinearTransform> {
        let flags = [
            self.crpix1,
            self.crpix2,
            self.crval1,
            self.crval2,
            self.cdelt1,
            self.cdelt2,
        ];
        if flags.iter().all(Option::is_none) {
            return base;
        }
        let mut t = base.unwrap_or_default();
        t.x.crpix = self.crpix1.unwrap_or(t.x.crpix);
        t.y.crpix = self.crpix2.unwrap_or(t.y.crpix);
        t.x.crval = self.crval1.unwrap_or(t.x.crval);
        t.y.crval = self.crval2.unwrap_or(t.y.crval);
        t.x.cdelt = self.cdelt1.unwrap_or(t.x.cdelt);
        t.y.cdelt = self.cdelt2.unwrap_or(t.y.cdelt);
        Some(t)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: &Cli) -> nautilus::RunResult<()> {
    let base = match &cli.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let mut config = base.merge(cli.overrides());
    config.transform = cli.transform(config.transform);

    let params = config.into_params()?;
    run(&params)?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nautilus::binning::AxisTransform;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("nautilus").chain(args.iter().copied()))
            .expect("parse")
    }

    fn base_config() -> RunConfig {
        serde_json::from_str(
            r#"{
                "snr": 4.0,
                "clobber": true,
                "transform": {
                    "x": {"crpix": 1.0, "crval": 10.0, "cdelt": 2.0},
                    "y": {"crpix": 3.0, "crval": -5.0, "cdelt": 0.5}
                }
            }"#,
        )
        .expect("config")
    }

    #[test]
    fn test_axis_flag_overrides_one_field() {
        let cli = parse(&["in.fpix", "out.fpix", "--crval1", "-7.5"]);
        let base = base_config().transform;
        let t = cli.transform(base).expect("transform");
        assert_eq!(t.x, AxisTransform::new(1.0, -7.5, 2.0));
        assert_eq!(Some(t.y), base.map(|b| b.y));
    }

    #[test]
    fn test_axis_flag_without_base_starts_from_identity() {
        let cli = parse(&["--cdelt2", "3"]);
        let t = cli.transform(None).expect("transform");
        assert_eq!(t.x, LinearTransform::default().x);
        assert_eq!(t.y.cdelt, 3.0);
    }

    #[test]
    fn test_no_axis_flags_keep_base() {
        let cli = parse(&["in.fpix", "out.fpix"]);
        let base = base_config().transform;
        assert_eq!(cli.transform(base), base);
        assert_eq!(cli.transform(None), None);
    }

    #[test]
    fn test_absent_clobber_keeps_config_value() {
        let cli = parse(&["in.fpix", "out.fpix", "-s", "9"]);
        let merged = base_config().merge(cli.overrides());
        assert_eq!(merged.clobber, Some(true));
        assert_eq!(merged.snr, Some(9.0));
        assert_eq!(merged.transform, base_config().transform);

        let cli = parse(&["--clobber"]);
        assert_eq!(cli.overrides().clobber, Some(true));
        assert_eq!(RunConfig::default().merge(parse(&[]).overrides()).clobber, None);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!(parse(&["-m", "one-above"]).method, Some(SplitPolicy::OneAbove));
        assert_eq!(parse(&["-m", "4"]).method, Some(SplitPolicy::AllAbove));
        assert_eq!(parse(&[]).method, None);
        assert!(Cli::try_parse_from(["nautilus", "-m", "7"]).is_err());
        assert!(Cli::try_parse_from(["nautilus", "--method", "most"]).is_err());
    }

    #[test]
    fn test_negative_values_accepted() {
        let cli = parse(&["--null-value", "-32768", "--crpix1", "-1"]);
        assert_eq!(cli.null_value, Some(-32768));
        assert_eq!(cli.crpix1, Some(-1.0));
    }
}
