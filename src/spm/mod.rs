//! Self-phase modulation (SPM) spectral measurements.
//!
//! Measurements are tab-separated `(wavelength, power)` files without a
//! header. File names encode the pump wavelength and input power, e.g.
//! `SPM-NA-WG-SERP-L0-D0-1500.0nm-0.23869mW-18dec23.csv`.

use std::path::{Path, PathBuf};

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod plot;

pub use plot::{generate_offset_plots, plan_offset_plots, OffsetPlotParams, WavelengthPlot};

lazy_static! {
    static ref WAVELENGTH_FIELD: Regex = Regex::new(r"^(\d+(?:\.\d+)?)nm$").unwrap();
}

#[derive(Debug, Error)]
pub enum SpmError {
    #[error("invalid measurement file name `{name}`: {reason}")]
    InvalidFileName { name: String, reason: String },

    #[error("invalid file pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("error reading measurement data from {path:?}: {source}")]
    Data {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error drawing plot: {0}")]
    Plot(String),
}

pub type SpmResult<T> = std::result::Result<T, SpmError>;

/// Fields encoded in a measurement file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementName {
    /// Wavelength field as it appears in the file name, e.g. `1500.0nm`.
    pub wavelength_tag: String,
    pub wavelength_nm: f64,
    pub power_mw: f64,
}

impl MeasurementName {
    /// Parses a file name split on `-`.
    ///
    /// The input power is the second-to-last field with its `mW` suffix
    /// removed; the wavelength is the last field before it ending in `nm`.
    pub fn parse(file_name: &str) -> SpmResult<Self> {
        let invalid = |reason: &str| SpmError::InvalidFileName {
            name: file_name.to_string(),
            reason: reason.to_string(),
        };

        let fields = file_name.split('-').collect::<Vec<_>>();
        if fields.len() < 3 {
            return Err(invalid("expected at least 3 `-`-separated fields"));
        }
        let power_field = fields[fields.len() - 2];
        let power_mw = power_field
            .strip_suffix("mW")
            .unwrap_or(power_field)
            .parse::<f64>()
            .map_err(|_| invalid("input power field is not a number of mW"))?;

        let (wavelength_tag, wavelength_nm) = fields[..fields.len() - 2]
            .iter()
            .rev()
            .find_map(|field| {
                let caps = WAVELENGTH_FIELD.captures(field)?;
                let nm = caps[1].parse::<f64>().ok()?;
                Some((field.to_string(), nm))
            })
            .ok_or_else(|| invalid("no wavelength field"))?;

        Ok(Self {
            wavelength_tag,
            wavelength_nm,
            power_mw,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> SpmResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SpmError::InvalidFileName {
                name: path.display().to_string(),
                reason: "not a UTF-8 file name".to_string(),
            })?;
        Self::parse(name)
    }
}

/// A measured spectrum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Series {
    pub fn peak(&self) -> f64 {
        peak(&self.y)
    }
}

/// Reads a headerless, tab-separated two-column file.
pub fn read_series(path: impl AsRef<Path>) -> SpmResult<Series> {
    let path = path.as_ref();
    let data_err = |source: csv::Error| SpmError::Data {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)
        .map_err(data_err)?;

    let mut series = Series::default();
    for record in reader.deserialize() {
        let (x, y): (f64, f64) = record.map_err(data_err)?;
        series.x.push(x);
        series.y.push(y);
    }
    Ok(series)
}

/// Largest value, or 0 for an empty slice.
pub fn peak(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .unwrap_or(0.0)
}

/// Scales `values` so the peak is 1. A zero peak leaves the values unchanged.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let max = peak(values);
    if max != 0.0 {
        values.iter().map(|v| v / max).collect()
    } else {
        values.to_vec()
    }
}

/// Vertical offsets for `n` curves drawn from highest to lowest power.
pub fn offsets(n: usize, step: f64) -> Vec<f64> {
    (0..n).map(|i| -(i as f64) * step).collect()
}

#[inline]
pub fn mw_to_dbm(power_mw: f64) -> f64 {
    10.0 * power_mw.log10()
}

/// Wavelength tags `"{w}.0nm"` for `w` in `start..=end` by `step`.
pub fn wavelength_tags(start: u32, end: u32, step: u32) -> Vec<String> {
    (start..=end)
        .step_by(step.max(1) as usize)
        .map(|w| format!("{w}.0nm"))
        .collect()
}

/// Converts a file pattern to a regex.
///
/// `*` matches any run of characters and `{device}` is replaced by `device`;
/// everything else matches literally.
pub fn pattern_regex(pattern: &str, device: &str) -> SpmResult<Regex> {
    let expanded = pattern.replace("{device}", device);
    let body = expanded.split('*').map(regex::escape).join(".*");
    Regex::new(&format!("^{body}$")).map_err(|source| SpmError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Lists the files in `dir` whose names match `pattern` for `device`, sorted by name.
pub fn collect_measurements(
    dir: impl AsRef<Path>,
    pattern: &str,
    device: &str,
) -> SpmResult<Vec<PathBuf>> {
    let re = pattern_regex(pattern, device)?;
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if re.is_match(name) {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn parse_measurement_name() {
        let name = MeasurementName::parse("SPM-NA-WG-SERP-L0-D0-1500.0nm-0.23869mW-18dec23.csv")
            .unwrap();
        assert_eq!(name.wavelength_tag, "1500.0nm");
        assert_eq!(name.wavelength_nm, 1500.0);
        assert_eq!(name.power_mw, 0.23869);

        let name = MeasurementName::from_path("/data/run/X-1550nm-12mW-a.csv").unwrap();
        assert_eq!(name.wavelength_tag, "1550nm");
        assert_eq!(name.power_mw, 12.0);
    }

    #[test]
    fn malformed_names_are_errors() {
        for bad in [
            "notes.csv",
            "SPM-1500.0nm-abcmW-18dec23.csv",
            "SPM-L0-D0-10mW-18dec23.csv",
        ] {
            assert!(
                matches!(
                    MeasurementName::parse(bad),
                    Err(SpmError::InvalidFileName { .. })
                ),
                "{bad} should not parse"
            );
        }
    }

    #[test]
    fn zero_peak_passes_through() {
        let values = [0.0, 0.0, -0.5, 0.0];
        assert_eq!(normalize(&values), values.to_vec());
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn normalize_scales_to_unit_peak() {
        let normalized = normalize(&[1.0, 4.0, 2.0]);
        assert_eq!(normalized, vec![0.25, 1.0, 0.5]);
    }

    #[test]
    fn offsets_descend_by_step() {
        let offsets = offsets(3, 0.15);
        assert_eq!(offsets[0], 0.0);
        assert_relative_eq!(offsets[1], -0.15);
        assert_relative_eq!(offsets[2], -0.30, epsilon = 1e-12);
    }

    #[test]
    fn dbm_conversion() {
        assert_relative_eq!(mw_to_dbm(1.0), 0.0);
        assert_relative_eq!(mw_to_dbm(10.0), 10.0, epsilon = 1e-12);
        assert_relative_eq!(mw_to_dbm(0.5), -3.0103, epsilon = 1e-4);
    }

    #[test]
    fn wavelength_tag_range() {
        assert_eq!(
            wavelength_tags(1500, 1560, 10),
            vec![
                "1500.0nm", "1510.0nm", "1520.0nm", "1530.0nm", "1540.0nm", "1550.0nm", "1560.0nm"
            ]
        );
        assert_eq!(wavelength_tags(1500, 1500, 0), vec!["1500.0nm"]);
    }

    #[test]
    fn reads_tab_separated_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.csv");
        std::fs::write(&path, "1499.5\t0.1\n1500.0\t0.8\n1500.5\t0.2\n").unwrap();
        let series = read_series(&path).unwrap();
        assert_eq!(series.x, vec![1499.5, 1500.0, 1500.5]);
        assert_eq!(series.y, vec![0.1, 0.8, 0.2]);
        assert_eq!(series.peak(), 0.8);

        std::fs::write(&path, "1499.5\tnot-a-number\n").unwrap();
        assert!(matches!(read_series(&path), Err(SpmError::Data { .. })));
    }

    #[test]
    fn collects_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "SPM-NA-WG-SERP-L0-D0-1500.0nm-1mW-18dec23.csv",
            "SPM-NA-WG-SERP-L0-D0-1510.0nm-5mW-18dec23.csv",
            "SPM-NA-WG-SERP-L1-D0-1500.0nm-1mW-18dec23.csv",
            "SPM-NA-WG-SERP-L0-D0-1500.0nm-1mW-19dec23.csv",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        let files = collect_measurements(
            dir.path(),
            "SPM-NA-WG-SERP-{device}-*.0nm-*-18dec23.csv",
            "L0-D0",
        )
        .unwrap();
        let names = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "SPM-NA-WG-SERP-L0-D0-1500.0nm-1mW-18dec23.csv",
                "SPM-NA-WG-SERP-L0-D0-1510.0nm-5mW-18dec23.csv",
            ]
        );
    }
}
