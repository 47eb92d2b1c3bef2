use std::fs::canonicalize;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;

use crate::blocks::directional_coupler::{draw_directional_coupler, DirectionalCouplerParams};
use crate::blocks::edge_coupler::{draw_edge_coupler, EdgeCouplerParams};
use crate::cli::args::{Args, Command, PlotSpmArgs};
use crate::cli::progress::{StepContext, TaskKey};
use crate::layout::Library;
use crate::paths::{out_gds, out_params};
use crate::spm::{collect_measurements, generate_offset_plots, OffsetPlotParams};
use crate::Result;

pub mod args;
pub mod progress;

pub const BANNER: &str = r"
        _
 _ __  (_)  ___   __ _   ___  _ __
| '_ \ | | / __| / _` | / _ \| '_ \
| |_) || || (__ | (_| ||  __/| | | |
| .__/ |_| \___| \__, | \___||_| |_|
|_|              |___/

PICGEN v0.1
";

pub fn run() -> Result<()> {
    let args = Args::parse();

    println!("{BANNER}");

    match args.command {
        Command::EdgeCoupler(ref ec) => {
            let params = ec.resolve()?;
            print_edge_coupler_params(&params);
            let work_dir = prepare_work_dir(args.output_dir.as_deref())?;
            generate_edge_coupler(&params, &work_dir)?;
            println!("Artifacts saved to: {:?}\n", &work_dir);
        }
        Command::DirectionalCoupler(ref dc) => {
            let params = dc.resolve()?;
            print_directional_coupler_params(&params);
            let work_dir = prepare_work_dir(args.output_dir.as_deref())?;
            generate_directional_coupler(&params, &work_dir)?;
            println!("Artifacts saved to: {:?}\n", &work_dir);
        }
        Command::PlotSpm(ref spm) => {
            plot_spm(spm, args.output_dir.as_deref())?;
        }
    }

    Ok(())
}

fn prepare_work_dir(output_dir: Option<&Path>) -> Result<PathBuf> {
    let work_dir = output_dir.unwrap_or(Path::new("."));
    std::fs::create_dir_all(work_dir)?;
    Ok(canonicalize(work_dir)?)
}

fn write_params<T: Serialize>(path: impl AsRef<Path>, params: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(params)?;
    std::fs::write(path, contents)?;
    Ok(())
}

fn print_edge_coupler_params(params: &EdgeCouplerParams) {
    let tip = &params.tip;
    let taper = &params.taper;
    println!("Edge coupler parameters:");
    println!("\tName: {}", params.name);
    println!("\tLayer: {}", params.layer);
    println!(
        "\tTip: period {} -> {} um, y span {} -> {} um, duty cycle {} -> {}, span {} um",
        tip.initial_period,
        tip.final_period,
        tip.initial_y_span,
        tip.final_y_span,
        tip.initial_duty_cycle,
        tip.final_duty_cycle,
        tip.span,
    );
    println!(
        "\tTaper: period {} -> {} um, width {} -> {} um, span {} um",
        taper.initial_period, taper.final_period, taper.initial_width, taper.final_width, taper.span,
    );
    println!("\tOutput waveguide length: {} um", params.output_wg_length);
    println!("\tTaper element count: {:?}\n", params.count_policy);
}

fn print_directional_coupler_params(params: &DirectionalCouplerParams) {
    println!("Directional coupler parameters:");
    println!("\tName: {}", params.name);
    println!("\tLayer: {}", params.layer);
    println!("\tWaveguide width: {} um", params.wg_width);
    println!("\tGap: {} um", params.gap);
    println!("\tCoupling length: {} um", params.coupling_length);
    for (label, bend) in [
        ("Top input bend", params.input_bend1),
        ("Bottom input bend", params.input_bend2),
        ("Top output bend", params.output_bend1),
        ("Bottom output bend", params.output_bend2),
    ] {
        println!("\t{label}: {} x {} um", bend.length, bend.offset);
    }
    println!();
}

pub fn generate_edge_coupler(params: &EdgeCouplerParams, work_dir: &Path) -> Result<()> {
    let mut ctx = StepContext::new(&[
        TaskKey::GenerateLayout,
        TaskKey::WriteGds,
        TaskKey::WriteParams,
    ]);

    let ec = ctx.check(draw_edge_coupler(params))?;
    ctx.finish(TaskKey::GenerateLayout);
    match ec.length() {
        Some(length) => log::info!(
            "drew {} grating elements over {:.3} um",
            ec.num_elements(),
            length
        ),
        None => log::warn!("edge coupler is missing its input or output port"),
    }

    let lib = Library::with_cell(params.name.as_str(), ec.cell);
    ctx.check(
        lib.save(out_gds(work_dir, &params.name))
            .map_err(anyhow::Error::from),
    )?;
    ctx.finish(TaskKey::WriteGds);

    ctx.check(write_params(out_params(work_dir, &params.name), params))?;
    ctx.finish(TaskKey::WriteParams);

    Ok(())
}

pub fn generate_directional_coupler(
    params: &DirectionalCouplerParams,
    work_dir: &Path,
) -> Result<()> {
    let mut ctx = StepContext::new(&[
        TaskKey::GenerateLayout,
        TaskKey::WriteGds,
        TaskKey::WriteParams,
    ]);

    let cell = ctx.check(draw_directional_coupler(params))?;
    ctx.finish(TaskKey::GenerateLayout);

    let lib = Library::with_cell(params.name.as_str(), cell);
    ctx.check(
        lib.save(out_gds(work_dir, &params.name))
            .map_err(anyhow::Error::from),
    )?;
    ctx.finish(TaskKey::WriteGds);

    ctx.check(write_params(out_params(work_dir, &params.name), params))?;
    ctx.finish(TaskKey::WriteParams);

    Ok(())
}

/// Plots every configured device. Plots go under `output_dir` if given,
/// otherwise under the measurement directory.
fn plot_spm(args: &PlotSpmArgs, output_dir: Option<&Path>) -> Result<()> {
    let config = args.resolve()?;
    println!("Measurement directory: {:?}", &config.directory);
    println!("File pattern: {}", config.pattern);
    println!(
        "Wavelengths: {}nm to {}nm in steps of {}nm\n",
        config.start_wavelength, config.end_wavelength, config.step
    );

    let plot_dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.directory.clone());

    for device in config.devices.iter() {
        println!("Device: {device}");
        let mut ctx = StepContext::new(&[TaskKey::CollectMeasurements, TaskKey::PlotSpectra]);

        let files = ctx.check(
            collect_measurements(&config.directory, &config.pattern, device)
                .map_err(anyhow::Error::from),
        )?;
        ctx.finish(TaskKey::CollectMeasurements);
        if files.is_empty() {
            log::warn!("no measurement files found for device {device}");
        }

        let saved = ctx.check(
            generate_offset_plots(&OffsetPlotParams {
                directory: plot_dir.clone(),
                device: device.clone(),
                files,
                start_wavelength: config.start_wavelength,
                end_wavelength: config.end_wavelength,
                step: config.step,
                offset_step: config.offset_step,
            })
            .map_err(anyhow::Error::from),
        )?;
        ctx.finish(TaskKey::PlotSpectra);

        for (wavelength, path) in saved {
            println!("Device: {device}, Wavelength: {wavelength}, Saved Path: {path:?}");
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::tests::test_work_dir;

    #[test]
    fn test_generate_edge_coupler_artifacts() {
        let work_dir = test_work_dir("test_generate_edge_coupler_artifacts");
        std::fs::create_dir_all(&work_dir).unwrap();
        let params = EdgeCouplerParams::default();
        generate_edge_coupler(&params, &work_dir).unwrap();

        assert!(out_gds(&work_dir, "EC_SWG").exists());
        let json = std::fs::read_to_string(out_params(&work_dir, "EC_SWG")).unwrap();
        let parsed: EdgeCouplerParams = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, params.name);
        assert_eq!(parsed.count_policy, params.count_policy);
        assert_relative_eq!(parsed.taper.final_width, params.taper.final_width);
    }

    #[test]
    fn test_generate_directional_coupler_artifacts() {
        let work_dir = test_work_dir("test_generate_directional_coupler_artifacts");
        std::fs::create_dir_all(&work_dir).unwrap();
        let params = DirectionalCouplerParams::default();
        generate_directional_coupler(&params, &work_dir).unwrap();

        let gds = gds21::GdsLibrary::load(out_gds(&work_dir, &params.name)).unwrap();
        assert_eq!(gds.structs.len(), 1);
        assert!(out_params(&work_dir, &params.name).exists());
    }

    #[test]
    fn invalid_params_are_reported() {
        let work_dir = test_work_dir("invalid_params_are_reported");
        let params = DirectionalCouplerParams::builder()
            .wg_width(-1.0)
            .build()
            .unwrap();
        assert!(generate_directional_coupler(&params, &work_dir).is_err());
    }
}
