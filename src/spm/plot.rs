use std::path::{Path, PathBuf};

use itertools::Itertools;
use plotters::prelude::*;

use super::{
    mw_to_dbm, normalize, offsets, read_series, wavelength_tags, MeasurementName, SpmError,
    SpmResult,
};

/// Options for plotting one device's measurements, one image per pump wavelength.
#[derive(Debug, Clone)]
pub struct OffsetPlotParams {
    /// Base directory; plots are written to `<directory>/<device>/`.
    pub directory: PathBuf,
    pub device: String,
    pub files: Vec<PathBuf>,
    pub start_wavelength: u32,
    pub end_wavelength: u32,
    pub step: u32,
    /// Vertical distance between successive curves.
    pub offset_step: f64,
}

/// One normalized, offset spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetCurve {
    pub label: String,
    pub power_mw: f64,
    pub offset: f64,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WavelengthPlot {
    pub wavelength: String,
    pub title: String,
    pub path: PathBuf,
    /// Curves from highest to lowest input power.
    pub curves: Vec<OffsetCurve>,
}

pub fn plot_path(directory: impl AsRef<Path>, device: &str, wavelength: &str) -> PathBuf {
    crate::paths::out_offset_plot(directory.as_ref().join(device), wavelength)
}

/// Reads and arranges the measurements for every wavelength in the sweep.
///
/// Wavelengths without files still get a plot, with no curves.
pub fn plan_offset_plots(params: &OffsetPlotParams) -> SpmResult<Vec<WavelengthPlot>> {
    let mut plots = Vec::new();
    for wavelength in wavelength_tags(
        params.start_wavelength,
        params.end_wavelength,
        params.step,
    ) {
        let needle = format!("-{wavelength}-");
        let mut measured = Vec::new();
        for file in params.files.iter() {
            let matches = file
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.contains(&needle))
                .unwrap_or(false);
            if matches {
                let name = MeasurementName::from_path(file)?;
                measured.push((name.power_mw, read_series(file)?));
            }
        }
        if measured.is_empty() {
            log::warn!(
                "no measurements of device {} at {wavelength}; plot will be empty",
                params.device
            );
        }

        let sorted = measured
            .into_iter()
            .sorted_by(|a, b| a.0.total_cmp(&b.0))
            .rev()
            .collect::<Vec<_>>();
        let curves = sorted
            .iter()
            .zip(offsets(sorted.len(), params.offset_step))
            .map(|((power_mw, series), offset)| {
                let label = format!(
                    "Pin={:.2}dBm Pout={:.2}dBm",
                    mw_to_dbm(*power_mw),
                    mw_to_dbm(series.peak())
                );
                let points = series
                    .x
                    .iter()
                    .copied()
                    .zip(normalize(&series.y).into_iter().map(|y| y + offset))
                    .collect();
                OffsetCurve {
                    label,
                    power_mw: *power_mw,
                    offset,
                    points,
                }
            })
            .collect();

        plots.push(WavelengthPlot {
            title: format!(
                "Spectral Measurements at {wavelength} for Reference {}",
                params.device
            ),
            path: plot_path(&params.directory, &params.device, &wavelength),
            wavelength,
            curves,
        });
    }
    Ok(plots)
}

/// Plots every wavelength of a device, returning `(wavelength, path)` pairs
/// in wavelength order.
pub fn generate_offset_plots(params: &OffsetPlotParams) -> SpmResult<Vec<(String, PathBuf)>> {
    let plots = plan_offset_plots(params)?;
    std::fs::create_dir_all(params.directory.join(&params.device))?;
    let mut saved = Vec::with_capacity(plots.len());
    for plot in plots {
        draw_plot(&plot)?;
        log::info!("saved {:?}", &plot.path);
        saved.push((plot.wavelength, plot.path));
    }
    Ok(saved)
}

fn plot_err(e: impl std::fmt::Display) -> SpmError {
    SpmError::Plot(e.to_string())
}

/// Data range padded by 5% on each side, widened if degenerate.
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    (lo - pad)..(hi + pad)
}

pub fn draw_plot(plot: &WavelengthPlot) -> SpmResult<()> {
    let root = BitMapBackend::new(&plot.path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let all_points = || plot.curves.iter().flat_map(|c| c.points.iter());
    let x_range = padded_range(all_points().map(|p| p.0));
    let y_range = padded_range(all_points().map(|p| p.1));

    let mut chart = ChartBuilder::on(&root)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .margin(10)
        .caption(&plot.title, ("sans-serif", 28.0).into_font())
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Wavelength (nm)")
        .y_desc("Normalized Spectral Power (a.u.)")
        .draw()
        .map_err(plot_err)?;

    for (i, curve) in plot.curves.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        chart
            .draw_series(LineSeries::new(curve.points.iter().copied(), &color))
            .map_err(plot_err)?
            .label(curve.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    if !plot.curves.is_empty() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_err)?;
    }

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn write_measurements(dir: &Path) -> Vec<PathBuf> {
        let data = [
            ("1500.0nm", "1mW", "1500.0\t0.5\n1500.5\t1.0\n"),
            ("1500.0nm", "10mW", "1500.0\t2.0\n1500.5\t4.0\n"),
            ("1500.0nm", "5mW", "1500.0\t0.0\n1500.5\t0.0\n"),
            ("1510.0nm", "5mW", "1510.0\t3.0\n1510.5\t1.5\n"),
        ];
        data.iter()
            .map(|(wl, power, contents)| {
                let path = dir.join(format!("SPM-NA-WG-SERP-L0-D0-{wl}-{power}-18dec23.csv"));
                std::fs::write(&path, contents).unwrap();
                path
            })
            .collect()
    }

    fn params(dir: &Path, files: Vec<PathBuf>) -> OffsetPlotParams {
        OffsetPlotParams {
            directory: dir.to_path_buf(),
            device: "L0-D0".to_string(),
            files,
            start_wavelength: 1500,
            end_wavelength: 1520,
            step: 10,
            offset_step: 0.15,
        }
    }

    #[test]
    fn curves_are_offset_from_highest_power_down() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_measurements(dir.path());
        let plots = plan_offset_plots(&params(dir.path(), files)).unwrap();

        // 1520.0nm has no files but still gets an empty plot.
        assert_eq!(plots.len(), 3);
        assert_eq!(
            plots.iter().map(|p| p.wavelength.as_str()).collect::<Vec<_>>(),
            vec!["1500.0nm", "1510.0nm", "1520.0nm"]
        );
        assert!(plots[2].curves.is_empty());
        assert_eq!(
            plots[2].path,
            dir.path().join("L0-D0").join("offset_plot_1520.0nm.png")
        );
        let plot = &plots[0];
        assert_eq!(plot.wavelength, "1500.0nm");
        assert_eq!(
            plot.path,
            dir.path().join("L0-D0").join("offset_plot_1500.0nm.png")
        );

        let powers = plot.curves.iter().map(|c| c.power_mw).collect::<Vec<_>>();
        assert_eq!(powers, vec![10.0, 5.0, 1.0]);
        assert_eq!(plot.curves[0].offset, 0.0);
        assert_relative_eq!(plot.curves[1].offset, -0.15);
        assert_relative_eq!(plot.curves[2].offset, -0.30, epsilon = 1e-12);

        // Normalized to unit peak, then offset.
        assert_eq!(plot.curves[0].points, vec![(1500.0, 0.5), (1500.5, 1.0)]);
        // The all-zero spectrum passes through unscaled.
        assert_relative_eq!(plot.curves[1].points[1].1, -0.15);
        assert_relative_eq!(plot.curves[2].points[0].1, 0.5 - 0.30, epsilon = 1e-12);

        assert_eq!(plot.curves[0].label, "Pin=10.00dBm Pout=6.02dBm");
        assert_eq!(
            plot.title,
            "Spectral Measurements at 1500.0nm for Reference L0-D0"
        );
    }

    #[test]
    fn device_without_files_plans_every_wavelength() {
        let dir = tempfile::tempdir().unwrap();
        let plots = plan_offset_plots(&params(dir.path(), Vec::new())).unwrap();
        assert_eq!(plots.len(), 3);
        assert!(plots.iter().all(|p| p.curves.is_empty()));
    }

    #[test]
    fn device_folder_is_created_for_an_empty_sweep() {
        let dir = tempfile::tempdir().unwrap();
        let params = OffsetPlotParams {
            start_wavelength: 1530,
            end_wavelength: 1520,
            ..params(dir.path(), Vec::new())
        };
        let saved = generate_offset_plots(&params).unwrap();
        assert!(saved.is_empty());
        assert!(dir.path().join("L0-D0").is_dir());
    }

    #[test]
    fn unreadable_file_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = write_measurements(dir.path());
        files.push(dir.path().join("SPM-NA-WG-SERP-L0-D0-1510.0nm-7mW-18dec23.csv"));
        assert!(plan_offset_plots(&params(dir.path(), files)).is_err());
    }

    #[test]
    fn padded_range_handles_degenerate_data() {
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
        assert_eq!(padded_range([2.0].into_iter()), 1.5..2.5);
        let r = padded_range([0.0, 10.0, f64::NEG_INFINITY].into_iter());
        assert_relative_eq!(r.start, -0.5);
        assert_relative_eq!(r.end, 10.5);
    }

    #[test]
    #[ignore = "requires system fonts"]
    fn writes_plot_images() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_measurements(dir.path());
        let saved = generate_offset_plots(&params(dir.path(), files)).unwrap();
        assert_eq!(saved.len(), 3);
        for (_, path) in saved {
            assert!(path.exists());
        }
    }
}
