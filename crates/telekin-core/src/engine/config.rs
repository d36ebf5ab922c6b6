use crate::core::models::fragment::Fragment;
use crate::core::models::layer::{Layer, Thickness};
use crate::core::models::particle::Particle;
use crate::core::models::stack::TelescopeStack;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

/// Laboratory angles of the detected ejectile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Scattering angle relative to the beam axis.
    pub angle: f64,
    /// Angle between the ejectile path and the telescope normal.
    pub incidence: f64,
}

impl Geometry {
    pub fn new(angle: f64, incidence: f64) -> Result<Self, ConfigError> {
        if !angle.is_finite() || !(0.0..=180.0).contains(&angle) {
            return Err(invalid("angle", format!("{angle} is outside [0, 180] degrees")));
        }
        if !incidence.is_finite() || incidence.abs() >= 90.0 {
            return Err(invalid(
                "incidence",
                format!("{incidence} must be strictly between -90 and 90 degrees"),
            ));
        }
        Ok(Self { angle, incidence })
    }

    /// Geometry of a strip of the segmented telescope.
    ///
    /// Strip `n` sits at `47° + (2n - 7)°` with an incidence of `|2n - 7|°`;
    /// the backward telescope mirrors the angle to `180° - angle`.
    pub fn from_strip(strip: u32, backward: bool) -> Result<Self, ConfigError> {
        let (angle, incidence) = strip_to_angle(strip, backward)?;
        Self::new(angle, incidence)
    }
}

pub fn strip_to_angle(strip: u32, backward: bool) -> Result<(f64, f64), ConfigError> {
    if strip == 0 {
        return Err(invalid("strip", "strips are numbered from 1"));
    }
    let offset = 2.0 * f64::from(strip) - 7.0;
    let forward = 47.0 + offset;
    if !(0.0..90.0).contains(&forward) || offset.abs() >= 90.0 {
        return Err(invalid("strip", format!("strip {strip} lies outside the telescope")));
    }
    let angle = if backward { 180.0 - forward } else { forward };
    Ok((angle, offset.abs()))
}

/// Largest number of excitation energies a single sweep may sample.
pub const MAX_EXCITATION_SAMPLES: usize = 1_000_000;

/// Evenly spaced excitation energies, inclusive of both ends when they align with the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExcitationRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl ExcitationRange {
    pub fn new(start: f64, stop: f64, step: f64) -> Result<Self, ConfigError> {
        if !(start.is_finite() && stop.is_finite() && step.is_finite()) {
            return Err(invalid("excitation", "bounds and step must be finite"));
        }
        if start < 0.0 {
            return Err(invalid("excitation", format!("start {start} is negative")));
        }
        if stop < start {
            return Err(invalid("excitation", format!("stop {stop} is below start {start}")));
        }
        if step <= 0.0 {
            return Err(invalid("excitation", format!("step {step} must be positive")));
        }
        let intervals = (stop - start) / step;
        if !(intervals < MAX_EXCITATION_SAMPLES as f64) {
            return Err(invalid(
                "excitation",
                format!("step {step} gives more than {MAX_EXCITATION_SAMPLES} samples"),
            ));
        }
        Ok(Self { start, stop, step })
    }

    pub fn len(&self) -> usize {
        let intervals = ((self.stop - self.start) / self.step + 1e-9).floor();
        (intervals as usize).min(MAX_EXCITATION_SAMPLES - 1) + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn samples(&self) -> Vec<f64> {
        (0..self.len())
            .map(|i| self.start + i as f64 * self.step)
            .collect()
    }
}

/// Beam and layer stack of one experiment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setup {
    pub beam: Particle,
    pub stack: TelescopeStack,
}

#[derive(Default)]
pub struct SetupBuilder {
    beam: Option<Particle>,
    target: Option<Layer>,
    front_foil: Option<Layer>,
    back_foil: Option<Layer>,
    delta_e: Option<Layer>,
    absorber: Option<Layer>,
    e_detector: Option<Layer>,
}

impl SetupBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn beam(mut self, beam: Particle) -> Self {
        self.beam = Some(beam);
        self
    }
    pub fn target(mut self, layer: Layer) -> Self {
        self.target = Some(layer);
        self
    }
    pub fn front_foil(mut self, layer: Layer) -> Self {
        self.front_foil = Some(layer);
        self
    }
    pub fn back_foil(mut self, layer: Layer) -> Self {
        self.back_foil = Some(layer);
        self
    }
    pub fn delta_e(mut self, layer: Layer) -> Self {
        self.delta_e = Some(layer);
        self
    }
    pub fn absorber(mut self, layer: Layer) -> Self {
        self.absorber = Some(layer);
        self
    }
    pub fn e_detector(mut self, layer: Layer) -> Self {
        self.e_detector = Some(layer);
        self
    }

    pub fn build(self) -> Result<Setup, ConfigError> {
        let beam = self.beam.ok_or(ConfigError::MissingParameter("beam"))?;
        if beam.energy <= 0.0 {
            return Err(invalid("beam", "beam energy must be positive"));
        }
        let target = self.target.ok_or(ConfigError::MissingParameter("target"))?;
        if !target.present {
            return Err(invalid("target", "the target layer cannot be switched off"));
        }
        let delta_e = self.delta_e.ok_or(ConfigError::MissingParameter("delta_e"))?;
        let e = self
            .e_detector
            .ok_or(ConfigError::MissingParameter("e_detector"))?;
        if !delta_e.present || !e.present {
            return Err(invalid("telescope", "dE and E detectors are always present"));
        }

        Ok(Setup {
            beam,
            stack: TelescopeStack {
                front_foil: self.front_foil.unwrap_or_else(absent_layer),
                target,
                back_foil: self.back_foil.unwrap_or_else(absent_layer),
                delta_e,
                absorber: self.absorber.unwrap_or_else(absent_layer),
                e,
            },
        })
    }
}

fn absent_layer() -> Layer {
    Layer::new(13, 27, Thickness::zero()).with_presence(false)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub fragments: Vec<Fragment>,
    pub excitation: ExcitationRange,
    /// Excitation energies at which scatter points with error bars are produced.
    pub scatter_excitations: Vec<f64>,
    pub geometry: Geometry,
}

#[derive(Default)]
pub struct SweepConfigBuilder {
    fragments: Option<Vec<Fragment>>,
    excitation: Option<ExcitationRange>,
    scatter_excitations: Vec<f64>,
    geometry: Option<Geometry>,
}

impl SweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fragments(mut self, fragments: Vec<Fragment>) -> Self {
        self.fragments = Some(fragments);
        self
    }
    pub fn excitation(mut self, range: ExcitationRange) -> Self {
        self.excitation = Some(range);
        self
    }
    pub fn scatter_excitations(mut self, energies: Vec<f64>) -> Self {
        self.scatter_excitations = energies;
        self
    }
    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        let fragments = self
            .fragments
            .filter(|f| !f.is_empty())
            .ok_or(ConfigError::MissingParameter("fragments"))?;
        if let Some(bad) = self
            .scatter_excitations
            .iter()
            .find(|e| !e.is_finite() || **e < 0.0)
        {
            return Err(invalid(
                "scatter_excitations",
                format!("{bad} is not a valid excitation energy"),
            ));
        }
        Ok(SweepConfig {
            fragments,
            excitation: self
                .excitation
                .ok_or(ConfigError::MissingParameter("excitation"))?,
            scatter_excitations: self.scatter_excitations,
            geometry: self
                .geometry
                .ok_or(ConfigError::MissingParameter("geometry"))?,
        })
    }
}
