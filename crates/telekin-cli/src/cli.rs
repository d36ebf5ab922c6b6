use crate::utils::parser;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use telekin::core::models::layer::Thickness;
use telekin::core::models::particle::Nuclide;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Telekin Developers",
    version,
    about = "Telekin CLI - energy-loss and two-body kinematics for dE/E particle telescopes.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress console log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to evaluate sweep samples.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sweep excitation energy for every selected fragment and report the telescope response.
    Run(RunArgs),
    /// Carry one particle through a single layer of material.
    Degrade(DegradeArgs),
    /// Show the scattering angle and incidence of a telescope strip.
    Angle(AngleArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Setup file in TOML format. Repeat to run several setups one after another.
    /// Without any, the built-in default setup is used.
    #[arg(short, long = "config", value_name = "PATH")]
    pub configs: Vec<PathBuf>,

    /// Write every curve sample (points and gaps) to a CSV file.
    #[arg(long, value_name = "PATH")]
    pub curve_csv: Option<PathBuf>,

    /// CSV file of additional mass excesses (columns z, a, mass_excess_kev).
    #[arg(long, value_name = "PATH")]
    pub masses: Option<PathBuf>,

    // --- Overrides ---
    /// Override the beam energy in MeV.
    #[arg(short = 'E', long, value_name = "MEV")]
    pub beam_energy: Option<f64>,

    /// Override the geometry with a telescope strip number.
    #[arg(long, value_name = "N")]
    pub strip: Option<u32>,

    /// Use the backward telescope for `--strip`.
    #[arg(long, requires = "strip")]
    pub backward: bool,

    /// Override the fragments to sweep (e.g., 'p,d,a' or '3:7').
    #[arg(short, long, value_name = "LIST")]
    pub fragments: Option<String>,

    /// Set a specific configuration value, overriding the setup file.
    /// Can be used multiple times. Example: -S target.thickness=2mg/cm2
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `degrade` subcommand.
#[derive(Args, Debug)]
pub struct DegradeArgs {
    /// Projectile as 'Z,A' (e.g., '1,1' for a proton).
    #[arg(short, long, value_name = "Z,A", value_parser = parser::parse_nuclide)]
    pub projectile: Nuclide,

    /// Kinetic energy of the projectile in MeV.
    #[arg(short, long, value_name = "MEV")]
    pub energy: f64,

    /// Layer material as a symbol or an atomic number.
    #[arg(short, long, value_name = "ELEMENT", value_parser = parser::parse_element)]
    pub material: u32,

    /// Layer thickness with its unit (e.g., '130um', '4mg/cm2').
    #[arg(short, long, value_name = "THICKNESS")]
    pub thickness: Thickness,
}

/// Arguments for the `angle` subcommand.
#[derive(Args, Debug)]
pub struct AngleArgs {
    /// Strip number, counted from 1.
    #[arg(short, long, value_name = "N")]
    pub strip: u32,

    /// Mirror the angle for the backward telescope.
    #[arg(short, long)]
    pub backward: bool,
}
