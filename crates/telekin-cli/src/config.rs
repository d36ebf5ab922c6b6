pub mod defaults;
pub mod file;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::utils::parser;
use defaults::{DefaultsConfig, LayerDefaults};
use file::{ElementSpec, ThicknessSpec};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use telekin::core::models::fragment::Fragment;
use telekin::core::models::layer::Layer;
use telekin::core::models::particle::Particle;
use telekin::core::tables::elements;
use telekin::engine::config::{
    ExcitationRange, Geometry, Setup, SetupBuilder, SweepConfig, SweepConfigBuilder,
};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialBeamConfig {
    element: Option<ElementSpec>,
    #[serde(rename = "mass-number")]
    mass_number: Option<u32>,
    energy: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialLayerConfig {
    element: Option<ElementSpec>,
    #[serde(rename = "mass-number")]
    mass_number: Option<u32>,
    thickness: Option<ThicknessSpec>,
    present: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialGeometryConfig {
    angle: Option<f64>,
    incidence: Option<f64>,
    strip: Option<u32>,
    backward: Option<bool>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
struct PartialSweepConfig {
    fragments: Option<Vec<String>>,
    #[serde(rename = "excitation-start")]
    excitation_start: Option<f64>,
    #[serde(rename = "excitation-stop")]
    excitation_stop: Option<f64>,
    #[serde(rename = "excitation-step")]
    excitation_step: Option<f64>,
    scatter: Option<Vec<f64>>,
}

/// A setup file as written by the user; every field may be omitted.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct PartialSetupConfig {
    name: Option<String>,
    beam: Option<PartialBeamConfig>,
    target: Option<PartialLayerConfig>,
    #[serde(rename = "front-foil")]
    front_foil: Option<PartialLayerConfig>,
    #[serde(rename = "back-foil")]
    back_foil: Option<PartialLayerConfig>,
    #[serde(rename = "delta-e")]
    delta_e: Option<PartialLayerConfig>,
    absorber: Option<PartialLayerConfig>,
    #[serde(rename = "e-detector")]
    e_detector: Option<PartialLayerConfig>,
    geometry: Option<PartialGeometryConfig>,
    sweep: Option<PartialSweepConfig>,
}

/// A fully resolved setup ready to be handed to the sweep worker.
#[derive(Debug, Clone)]
pub struct ResolvedSetup {
    pub name: Option<String>,
    pub setup: Setup,
    pub config: SweepConfig,
}

impl PartialSetupConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading setup from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<ResolvedSetup> {
        self.apply_set_values(&args.set_values)?;
        let defaults = DefaultsConfig::default();

        let beam_config = self.beam.take().unwrap_or_default();
        let beam = resolve_beam(&beam_config, args.beam_energy, &defaults)?;

        let setup = SetupBuilder::new()
            .beam(beam)
            .target(resolve_layer(self.target.take(), &defaults.target)?)
            .front_foil(resolve_layer(self.front_foil.take(), &defaults.front_foil)?)
            .back_foil(resolve_layer(self.back_foil.take(), &defaults.back_foil)?)
            .delta_e(resolve_layer(self.delta_e.take(), &defaults.delta_e)?)
            .absorber(resolve_layer(self.absorber.take(), &defaults.absorber)?)
            .e_detector(resolve_layer(self.e_detector.take(), &defaults.e_detector)?)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let geometry = Self::merge_geometry(
            args.strip.map(|strip| (strip, args.backward)),
            self.geometry.take().unwrap_or_default(),
            &defaults,
        )?;

        let sweep = self.sweep.take().unwrap_or_default();
        let fragments = Self::merge_fragments(args.fragments.as_deref(), sweep.fragments, &defaults)?;
        let excitation = ExcitationRange::new(
            sweep.excitation_start.unwrap_or(defaults.excitation_start),
            sweep.excitation_stop.unwrap_or(defaults.excitation_stop),
            sweep.excitation_step.unwrap_or(defaults.excitation_step),
        )
        .map_err(|e| CliError::Config(e.to_string()))?;

        let config = SweepConfigBuilder::new()
            .fragments(fragments)
            .excitation(excitation)
            .scatter_excitations(sweep.scatter.unwrap_or(defaults.scatter_excitations))
            .geometry(geometry)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(ResolvedSetup {
            name: self.name,
            setup,
            config,
        })
    }

    fn merge_geometry(
        cli_strip: Option<(u32, bool)>,
        partial: PartialGeometryConfig,
        defaults: &DefaultsConfig,
    ) -> Result<Geometry> {
        let geometry = if let Some((strip, backward)) = cli_strip {
            Geometry::from_strip(strip, backward)
        } else {
            match (partial.strip, partial.angle) {
                (Some(_), Some(_)) => {
                    return Err(CliError::Config(
                        "`geometry` takes either `strip` or `angle`, not both".to_string(),
                    ));
                }
                (Some(strip), None) => {
                    if partial.incidence.is_some() {
                        return Err(CliError::Config(
                            "`geometry.incidence` is derived from `strip`".to_string(),
                        ));
                    }
                    Geometry::from_strip(strip, partial.backward.unwrap_or(defaults.backward))
                }
                (None, Some(angle)) => Geometry::new(angle, partial.incidence.unwrap_or(0.0)),
                (None, None) => Geometry::from_strip(
                    defaults.strip,
                    partial.backward.unwrap_or(defaults.backward),
                ),
            }
        };
        geometry.map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_fragments(
        cli_list: Option<&str>,
        file_list: Option<Vec<String>>,
        defaults: &DefaultsConfig,
    ) -> Result<Vec<Fragment>> {
        let to_config_error = |e: parser::ParseError| CliError::Config(e.to_string());
        if let Some(list) = cli_list {
            return parser::parse_fragment_list(list).map_err(to_config_error);
        }
        match file_list {
            Some(names) => names
                .iter()
                .map(|name| parser::parse_fragment(name).map_err(to_config_error))
                .collect(),
            None => Ok(defaults.fragments.clone()),
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;
            let (section, field) = key.split_once('.').unwrap_or((key, ""));

            match (section, field) {
                ("name", "") => self.name = Some(value_str.to_string()),
                ("beam", field) => {
                    let beam = self.beam.get_or_insert_with(Default::default);
                    match field {
                        "element" => beam.element = Some(ElementSpec::from(value_str)),
                        "mass-number" => beam.mass_number = Some(parse_value(key, value_str)?),
                        "energy" => beam.energy = Some(parse_value(key, value_str)?),
                        _ => return Err(unsupported_key(key)),
                    }
                }
                ("geometry", field) => {
                    let geometry = self.geometry.get_or_insert_with(Default::default);
                    match field {
                        "angle" => geometry.angle = Some(parse_value(key, value_str)?),
                        "incidence" => geometry.incidence = Some(parse_value(key, value_str)?),
                        "strip" => geometry.strip = Some(parse_value(key, value_str)?),
                        "backward" => geometry.backward = Some(parse_value(key, value_str)?),
                        _ => return Err(unsupported_key(key)),
                    }
                }
                ("sweep", field) => {
                    let sweep = self.sweep.get_or_insert_with(Default::default);
                    match field {
                        "fragments" => {
                            sweep.fragments = Some(
                                value_str
                                    .split(',')
                                    .map(|s| s.trim().replace(':', ","))
                                    .filter(|s| !s.is_empty())
                                    .collect(),
                            )
                        }
                        "excitation-start" => {
                            sweep.excitation_start = Some(parse_value(key, value_str)?)
                        }
                        "excitation-stop" => {
                            sweep.excitation_stop = Some(parse_value(key, value_str)?)
                        }
                        "excitation-step" => {
                            sweep.excitation_step = Some(parse_value(key, value_str)?)
                        }
                        "scatter" => {
                            sweep.scatter = Some(
                                value_str
                                    .split(',')
                                    .filter(|s| !s.trim().is_empty())
                                    .map(|s| parse_value(key, s))
                                    .collect::<Result<_>>()?,
                            )
                        }
                        _ => return Err(unsupported_key(key)),
                    }
                }
                (section, field) => {
                    let layer = self
                        .layer_mut(section)
                        .ok_or_else(|| unsupported_key(key))?
                        .get_or_insert_with(Default::default);
                    match field {
                        "element" => layer.element = Some(ElementSpec::from(value_str)),
                        "mass-number" => layer.mass_number = Some(parse_value(key, value_str)?),
                        "thickness" => {
                            layer.thickness = Some(ThicknessSpec::Compact(value_str.to_string()))
                        }
                        "present" => layer.present = Some(parse_value(key, value_str)?),
                        _ => return Err(unsupported_key(key)),
                    }
                }
            }
        }
        Ok(())
    }

    fn layer_mut(&mut self, section: &str) -> Option<&mut Option<PartialLayerConfig>> {
        match section {
            "target" => Some(&mut self.target),
            "front-foil" => Some(&mut self.front_foil),
            "back-foil" => Some(&mut self.back_foil),
            "delta-e" => Some(&mut self.delta_e),
            "absorber" => Some(&mut self.absorber),
            "e-detector" => Some(&mut self.e_detector),
            _ => None,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        CliError::Config(format!(
            "Invalid {} value for {}: {}",
            std::any::type_name::<T>(),
            key,
            value
        ))
    })
}

fn unsupported_key(key: &str) -> CliError {
    CliError::Config(format!("Unsupported configuration key for --set: '{}'", key))
}

/// Mass number for an element given without one: its most abundant isotope.
fn default_mass_number(z: u32, what: &str) -> Result<u32> {
    elements::lookup(z)
        .map(|record| record.default_mass_number())
        .map_err(|_| {
            CliError::Config(format!(
                "`{what}.mass-number` is required for Z={z}, which has no tabulated isotope"
            ))
        })
}

fn resolve_beam(
    partial: &PartialBeamConfig,
    cli_energy: Option<f64>,
    defaults: &DefaultsConfig,
) -> Result<Particle> {
    let (z, a) = match &partial.element {
        Some(element) => {
            let z = element.resolve()?;
            let a = match partial.mass_number {
                Some(a) => a,
                None => default_mass_number(z, "beam")?,
            };
            (z, a)
        }
        None => (defaults.beam_z, partial.mass_number.unwrap_or(defaults.beam_a)),
    };
    let energy = cli_energy
        .or(partial.energy)
        .unwrap_or(defaults.beam_energy);
    Particle::new(z, a, energy).map_err(|e| CliError::Config(e.to_string()))
}

fn resolve_layer(partial: Option<PartialLayerConfig>, defaults: &LayerDefaults) -> Result<Layer> {
    let Some(partial) = partial else {
        return Ok(Layer::new(defaults.z, defaults.a, defaults.thickness).with_presence(defaults.present));
    };
    let (z, a) = match &partial.element {
        Some(element) => {
            let z = element.resolve()?;
            let a = match partial.mass_number {
                Some(a) => a,
                None => default_mass_number(z, "layer")?,
            };
            (z, a)
        }
        None => (defaults.z, partial.mass_number.unwrap_or(defaults.a)),
    };
    let thickness = match &partial.thickness {
        Some(spec) => spec.resolve()?,
        None => defaults.thickness,
    };
    // Configuring a layer without saying otherwise switches it on.
    let present = partial.present.unwrap_or(true);
    Ok(Layer::new(z, a, thickness).with_presence(present))
}
