//! Regression test parameters and operations

use crate::error::{TestError, TestResult};
use crate::regout_dir;
use nautilus_core::{FPix, UPix};
use std::fs;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Run the checks only (default)
    #[default]
    Compare,
    /// Run the checks and keep intermediate outputs
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// This structure tracks the state of a regression test, including
/// the test name, current index, mode, and success status.
pub struct RegParams {
    /// Name of the test (e.g., "partition")
    pub test_name: String,
    /// Current test index (incremented before each check)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// The mode is taken from the `REGTEST_MODE` environment variable.
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) -> bool {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
        false
    }

    /// Compare two floating-point values
    ///
    /// Two NaN values compare equal, so sentinel pixels can be checked
    /// like any other value.
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        if expected.is_nan() && actual.is_nan() {
            return true;
        }
        let diff = (expected - actual).abs();

        if diff > delta || diff.is_nan() {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg)
        } else {
            true
        }
    }

    /// Compare two FPix images pixel by pixel
    ///
    /// NaN pixels must be NaN in both images.
    pub fn compare_fpix(&mut self, expected: &FPix, actual: &FPix, delta: f32) -> bool {
        self.index += 1;

        if expected.dimensions() != actual.dimensions() {
            let msg = format!(
                "Failure in {}_reg: fpix comparison for index {} - dimension mismatch",
                self.test_name, self.index
            );
            return self.fail(msg);
        }

        for y in 0..expected.height() {
            for x in 0..expected.width() {
                let e = expected.get_pixel_unchecked(x, y);
                let a = actual.get_pixel_unchecked(x, y);
                let same = (e.is_nan() && a.is_nan()) || (e - a).abs() <= delta;
                if !same {
                    let msg = format!(
                        "Failure in {}_reg: fpix comparison for index {} - pixel mismatch at ({}, {}): expected {}, actual {}",
                        self.test_name, self.index, x, y, e, a
                    );
                    return self.fail(msg);
                }
            }
        }

        true
    }

    /// Compare two UPix images for exact equality
    pub fn compare_upix(&mut self, expected: &UPix, actual: &UPix) -> bool {
        self.index += 1;

        if expected.dimensions() != actual.dimensions() {
            let msg = format!(
                "Failure in {}_reg: upix comparison for index {} - dimension mismatch",
                self.test_name, self.index
            );
            return self.fail(msg);
        }

        if let Some(i) = expected
            .data()
            .iter()
            .zip(actual.data())
            .position(|(e, a)| e != a)
        {
            let width = expected.width() as usize;
            let msg = format!(
                "Failure in {}_reg: upix comparison for index {} - label mismatch at ({}, {})",
                self.test_name,
                self.index,
                i % width,
                i / width
            );
            return self.fail(msg);
        }

        true
    }

    /// Compare two binary data arrays
    pub fn compare_strings(&mut self, data1: &[u8], data2: &[u8]) -> bool {
        self.index += 1;

        if data1 != data2 {
            let msg = format!(
                "Failure in {}_reg: string comparison for index {}\n\
                 sizes: {} vs {}",
                self.test_name,
                self.index,
                data1.len(),
                data2.len()
            );
            self.fail(msg)
        } else {
            true
        }
    }

    /// Record a boolean check
    pub fn check(&mut self, condition: bool, what: &str) -> bool {
        self.index += 1;
        if condition {
            true
        } else {
            let msg = format!(
                "Failure in {}_reg: check for index {} failed: {}",
                self.test_name, self.index, what
            );
            self.fail(msg)
        }
    }

    /// In display mode, keep `data` in the regout directory
    ///
    /// The file is named `<test>.<index>.<ext>`. Does nothing in compare
    /// mode.
    pub fn write_data_for_display(&mut self, data: &[u8], ext: &str) -> TestResult<()> {
        if !self.display() {
            return Ok(());
        }
        let dir = regout_dir();
        fs::create_dir_all(&dir)?;
        let local_path = format!("{}/{}.{:02}.{}", dir, self.test_name, self.index, ext);
        fs::write(&local_path, data).map_err(|e| TestError::Write {
            path: local_path.clone(),
            message: e.to_string(),
        })?;
        eprintln!("Wrote: {}", local_path);
        Ok(())
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all tests passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_env() {
        let mode = RegTestMode::from_env();
        assert!(matches!(mode, RegTestMode::Compare | RegTestMode::Display));
    }

    #[test]
    fn test_compare_values_success() {
        let mut rp = RegParams::new("test");
        assert!(rp.compare_values(100.0, 100.0, 0.0));
        assert!(rp.compare_values(f64::NAN, f64::NAN, 0.0));
        assert!(rp.is_success());
        assert_eq!(rp.index(), 2);
    }

    #[test]
    fn test_compare_values_within_delta() {
        let mut rp = RegParams::new("test");
        assert!(rp.compare_values(100.0, 100.5, 1.0));
        assert!(rp.is_success());
    }

    #[test]
    fn test_compare_values_failure() {
        let mut rp = RegParams::new("test");
        assert!(!rp.compare_values(100.0, 200.0, 0.0));
        assert!(!rp.compare_values(1.0, f64::NAN, 10.0));
        assert!(!rp.is_success());
        assert_eq!(rp.failures().len(), 2);
    }

    #[test]
    fn test_compare_fpix_nan_aware() {
        let a = FPix::from_data(2, 1, vec![1.0, f32::NAN]).unwrap();
        let b = a.clone();
        let c = FPix::from_data(2, 1, vec![1.0, 0.0]).unwrap();
        let mut rp = RegParams::new("test");
        assert!(rp.compare_fpix(&a, &b, 0.0));
        assert!(!rp.compare_fpix(&a, &c, 0.0));
    }

    #[test]
    fn test_compare_upix() {
        let a = UPix::from_data(2, 2, vec![1, 2, 3, 4]).unwrap();
        let b = UPix::from_data(2, 2, vec![1, 2, 3, 5]).unwrap();
        let mut rp = RegParams::new("test");
        assert!(rp.compare_upix(&a, &a.clone()));
        assert!(!rp.compare_upix(&a, &b));
        assert!(rp.failures()[0].contains("(1, 1)"));
    }
}
