use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::blocks::directional_coupler::DirectionalCouplerParams;
use crate::blocks::edge_coupler::{CountPolicy, EdgeCouplerParams};
use crate::config::{
    parse_directional_coupler_config, parse_edge_coupler_config, parse_spm_config, SpmConfig,
};
use crate::geometry::LayerSpec;
use crate::Result;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about,
    help_template(
        "{before-help}{name} {version}\n{author-with-newline}{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}"
    )
)]
pub struct Args {
    /// Directory to which output files should be saved.
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a subwavelength grating edge coupler layout.
    EdgeCoupler(EdgeCouplerArgs),
    /// Generate a 2x2 directional coupler layout.
    DirectionalCoupler(DirectionalCouplerArgs),
    /// Plot normalized, offset SPM spectra for each device and wavelength.
    PlotSpm(PlotSpmArgs),
}

/// Sets `params.<path>` to each flag that was given on the command line.
macro_rules! override_params {
    ( $params:ident, $args:ident, { $( $flag:ident => $( $path:ident ).+ ),* $(,)? } ) => {
        $(
            if let Some(value) = $args.$flag.clone() {
                $params.$( $path ).+ = value;
            }
        )*
    };
}

fn layer_spec(values: &[i16]) -> Option<LayerSpec> {
    match values {
        [layer, datatype] => Some(LayerSpec(*layer, *datatype)),
        _ => None,
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CountPolicyArg {
    Average,
    Simulated,
}

impl From<CountPolicyArg> for CountPolicy {
    fn from(value: CountPolicyArg) -> Self {
        match value {
            CountPolicyArg::Average => CountPolicy::Average,
            CountPolicyArg::Simulated => CountPolicy::Simulated,
        }
    }
}

/// Edge coupler parameters. Lengths are in microns.
///
/// Flags override values read from `--config`, which override the defaults.
#[derive(clap::Args, Debug, Default)]
pub struct EdgeCouplerArgs {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Name of the top-level cell and output files.
    #[arg(long)]
    pub name: Option<String>,
    /// GDS layer and datatype of the coupler.
    #[arg(long, num_args = 2, value_names = ["LAYER", "DATATYPE"])]
    pub layer: Option<Vec<i16>>,
    #[arg(long)]
    pub min_feature_size: Option<f64>,
    #[arg(long)]
    pub output_wg_length: Option<f64>,

    #[arg(long)]
    pub initial_period_tip: Option<f64>,
    #[arg(long)]
    pub final_period_tip: Option<f64>,
    #[arg(long)]
    pub initial_y_span_tip: Option<f64>,
    #[arg(long)]
    pub final_y_span_tip: Option<f64>,
    #[arg(long)]
    pub initial_duty_cycle_tip: Option<f64>,
    #[arg(long)]
    pub final_duty_cycle_tip: Option<f64>,
    #[arg(long)]
    pub tapering_length_tip: Option<f64>,
    #[arg(long)]
    pub span_tip: Option<f64>,

    #[arg(long)]
    pub initial_period_taper: Option<f64>,
    #[arg(long)]
    pub final_period_taper: Option<f64>,
    #[arg(long)]
    pub initial_y_span_taper: Option<f64>,
    #[arg(long)]
    pub final_y_span_taper: Option<f64>,
    #[arg(long)]
    pub initial_duty_cycle_taper: Option<f64>,
    #[arg(long)]
    pub final_duty_cycle_taper: Option<f64>,
    #[arg(long)]
    pub taper_span: Option<f64>,
    #[arg(long)]
    pub initial_width_taper: Option<f64>,
    #[arg(long)]
    pub final_width_taper: Option<f64>,

    /// How the number of taper grating elements is chosen.
    #[arg(long, value_enum)]
    pub count_policy: Option<CountPolicyArg>,
}

impl EdgeCouplerArgs {
    pub fn resolve(&self) -> Result<EdgeCouplerParams> {
        let mut params = match self.config {
            Some(ref path) => parse_edge_coupler_config(path)?,
            None => EdgeCouplerParams::default(),
        };
        let args = self;
        override_params!(params, args, {
            name => name,
            min_feature_size => min_feature_size,
            output_wg_length => output_wg_length,
            initial_period_tip => tip.initial_period,
            final_period_tip => tip.final_period,
            initial_y_span_tip => tip.initial_y_span,
            final_y_span_tip => tip.final_y_span,
            initial_duty_cycle_tip => tip.initial_duty_cycle,
            final_duty_cycle_tip => tip.final_duty_cycle,
            tapering_length_tip => tip.tapering_length,
            span_tip => tip.span,
            initial_period_taper => taper.initial_period,
            final_period_taper => taper.final_period,
            initial_y_span_taper => taper.initial_y_span,
            final_y_span_taper => taper.final_y_span,
            initial_duty_cycle_taper => taper.initial_duty_cycle,
            final_duty_cycle_taper => taper.final_duty_cycle,
            taper_span => taper.span,
            initial_width_taper => taper.initial_width,
            final_width_taper => taper.final_width,
        });
        if let Some(layer) = self.layer.as_deref().and_then(layer_spec) {
            params.layer = layer;
        }
        if let Some(policy) = self.count_policy {
            params.count_policy = policy.into();
        }
        Ok(params)
    }
}

/// Directional coupler parameters. Lengths are in microns.
///
/// Output bends share the vertical offsets of the input bends on the same arm.
#[derive(clap::Args, Debug, Default)]
pub struct DirectionalCouplerArgs {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Name of the top-level cell and output files.
    #[arg(long)]
    pub name: Option<String>,
    /// GDS layer and datatype of the coupler.
    #[arg(long, num_args = 2, value_names = ["LAYER", "DATATYPE"])]
    pub layer: Option<Vec<i16>>,

    /// Bend size length for the top input S-bend.
    #[arg(long)]
    pub input_length1: Option<f64>,
    /// Vertical offset of the top input and output S-bends.
    #[arg(long)]
    pub input_offset1: Option<f64>,
    /// Bend size length for the bottom input S-bend.
    #[arg(long)]
    pub input_length2: Option<f64>,
    /// Vertical offset of the bottom input and output S-bends.
    #[arg(long)]
    pub input_offset2: Option<f64>,
    /// Bend size length for the top output S-bend.
    #[arg(long)]
    pub output_length1: Option<f64>,
    /// Bend size length for the bottom output S-bend.
    #[arg(long)]
    pub output_length2: Option<f64>,
    /// Length of the coupling region.
    #[arg(long)]
    pub coupling_length: Option<f64>,
    #[arg(long)]
    pub wg_width: Option<f64>,
    /// Gap between the coupled waveguides.
    #[arg(long)]
    pub gap: Option<f64>,
    /// Number of points along each S-bend.
    #[arg(long)]
    pub npoints: Option<usize>,
}

impl DirectionalCouplerArgs {
    pub fn resolve(&self) -> Result<DirectionalCouplerParams> {
        let mut params = match self.config {
            Some(ref path) => parse_directional_coupler_config(path)?,
            None => DirectionalCouplerParams::default(),
        };
        let args = self;
        override_params!(params, args, {
            name => name,
            input_length1 => input_bend1.length,
            input_offset1 => input_bend1.offset,
            input_length2 => input_bend2.length,
            input_offset2 => input_bend2.offset,
            output_length1 => output_bend1.length,
            input_offset1 => output_bend1.offset,
            output_length2 => output_bend2.length,
            input_offset2 => output_bend2.offset,
            coupling_length => coupling_length,
            wg_width => wg_width,
            gap => gap,
            npoints => npoints,
        });
        if let Some(layer) = self.layer.as_deref().and_then(layer_spec) {
            params.layer = layer;
        }
        Ok(params)
    }
}

#[derive(clap::Args, Debug, Default)]
pub struct PlotSpmArgs {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the measurement files.
    #[arg(short, long)]
    pub directory: Option<PathBuf>,
    /// File name pattern; `*` matches anything and `{device}` is the device name.
    #[arg(long)]
    pub pattern: Option<String>,
    /// Device to plot. May be given more than once.
    #[arg(long = "device")]
    pub devices: Vec<String>,
    /// First pump wavelength, in nm.
    #[arg(long)]
    pub start_wavelength: Option<u32>,
    /// Last pump wavelength, in nm.
    #[arg(long)]
    pub end_wavelength: Option<u32>,
    /// Pump wavelength step, in nm.
    #[arg(long)]
    pub step: Option<u32>,
    /// Vertical separation between successive curves.
    #[arg(long)]
    pub offset_step: Option<f64>,
}

impl PlotSpmArgs {
    pub fn resolve(&self) -> Result<SpmConfig> {
        let mut config = match self.config {
            Some(ref path) => parse_spm_config(path)?,
            None => SpmConfig::default(),
        };
        let args = self;
        override_params!(config, args, {
            directory => directory,
            pattern => pattern,
            start_wavelength => start_wavelength,
            end_wavelength => end_wavelength,
            step => step,
            offset_step => offset_step,
        });
        if !self.devices.is_empty() {
            config.devices = self.devices.clone();
        }
        Ok(config)
    }
}
