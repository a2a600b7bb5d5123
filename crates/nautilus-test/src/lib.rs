//! nautilus-test - Regression test framework for nautilus
//!
//! Tracks a sequence of numbered checks for one regression test and
//! reports every failure at the end instead of stopping at the first one.
//! Two modes are supported:
//!
//! - **Compare**: run the checks (default)
//! - **Display**: run the checks and also keep intermediate outputs in the
//!   regout directory for visual inspection
//!
//! # Usage
//!
//! ```ignore
//! use nautilus_test::RegParams;
//!
//! let mut rp = RegParams::new("snr");
//! rp.compare_values(400.0, snr, 1e-6);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" or "display"

mod error;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // nautilus-test is at crates/nautilus-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}

/// Get a unique scratch directory under the system temp dir
///
/// The directory is created if needed. Callers remove it when done.
pub fn scratch_dir(test_name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "nautilus_{}_{}",
        test_name,
        std::process::id()
    ));
    let _ = std::fs::create_dir_all(&dir);
    dir
}
