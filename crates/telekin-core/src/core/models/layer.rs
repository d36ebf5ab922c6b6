use crate::core::tables::elements::ElementRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LayerError {
    #[error("Invalid thickness {0}: must be finite and non-negative")]
    InvalidThickness(f64),
    #[error("Unknown thickness unit '{0}' (expected mg/cm2, g/cm2 or um)")]
    UnknownUnit(String),
    #[error("Cannot parse thickness '{0}'")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ThicknessUnit {
    #[default]
    #[serde(rename = "mg/cm2")]
    MgPerCm2,
    #[serde(rename = "g/cm2")]
    GPerCm2,
    #[serde(rename = "um", alias = "µm")]
    Micrometer,
}

impl ThicknessUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThicknessUnit::MgPerCm2 => "mg/cm2",
            ThicknessUnit::GPerCm2 => "g/cm2",
            ThicknessUnit::Micrometer => "um",
        }
    }
}

impl fmt::Display for ThicknessUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThicknessUnit {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mg/cm2" | "mg/cm^2" => Ok(ThicknessUnit::MgPerCm2),
            "g/cm2" | "g/cm^2" => Ok(ThicknessUnit::GPerCm2),
            "um" | "µm" | "micron" => Ok(ThicknessUnit::Micrometer),
            other => Err(LayerError::UnknownUnit(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thickness {
    pub value: f64,
    pub unit: ThicknessUnit,
}

impl Thickness {
    pub fn new(value: f64, unit: ThicknessUnit) -> Result<Self, LayerError> {
        if !value.is_finite() || value < 0.0 {
            return Err(LayerError::InvalidThickness(value));
        }
        Ok(Self { value, unit })
    }

    pub fn mg_per_cm2(value: f64) -> Result<Self, LayerError> {
        Self::new(value, ThicknessUnit::MgPerCm2)
    }

    pub fn micrometers(value: f64) -> Result<Self, LayerError> {
        Self::new(value, ThicknessUnit::Micrometer)
    }

    pub fn zero() -> Self {
        Self {
            value: 0.0,
            unit: ThicknessUnit::MgPerCm2,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }

    /// Mass thickness in mg/cm², using the element density for linear units.
    pub fn areal_density(&self, material: &ElementRecord) -> f64 {
        match self.unit {
            ThicknessUnit::MgPerCm2 => self.value,
            ThicknessUnit::GPerCm2 => self.value * 1000.0,
            // 1 µm = 1e-4 cm, 1 g = 1000 mg
            ThicknessUnit::Micrometer => self.value * material.density * 0.1,
        }
    }
}

impl fmt::Display for Thickness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Parses compact forms such as `130um`, `4 mg/cm2` or `0.004g/cm2`.
impl FromStr for Thickness {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
            .ok_or_else(|| LayerError::Malformed(trimmed.to_string()))?;
        let (number, unit) = trimmed.split_at(split);
        let value: f64 = number
            .parse()
            .map_err(|_| LayerError::Malformed(trimmed.to_string()))?;
        Thickness::new(value, unit.parse()?)
    }
}

/// Position of a layer in the telescope stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LayerRole {
    FrontFoil,
    Target,
    BackFoil,
    DeltaE,
    Absorber,
    E,
}

impl LayerRole {
    pub fn name(&self) -> &'static str {
        match self {
            LayerRole::FrontFoil => "front foil",
            LayerRole::Target => "target",
            LayerRole::BackFoil => "back foil",
            LayerRole::DeltaE => "dE detector",
            LayerRole::Absorber => "absorber",
            LayerRole::E => "E detector",
        }
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single-element slab of material.
///
/// Layers that are configured but switched off keep their parameters and
/// carry `present = false`; traversal code skips them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub z: u32,
    pub a: u32,
    pub thickness: Thickness,
    pub present: bool,
}

impl Layer {
    pub fn new(z: u32, a: u32, thickness: Thickness) -> Self {
        Self {
            z,
            a,
            thickness,
            present: true,
        }
    }

    pub fn with_presence(mut self, present: bool) -> Self {
        self.present = present;
        self
    }

    pub fn is_active(&self) -> bool {
        self.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::elements::lookup;

    const TOLERANCE: f64 = 1e-12;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn thickness_rejects_negative_and_non_finite_values() {
        assert!(Thickness::mg_per_cm2(-0.1).is_err());
        assert!(Thickness::mg_per_cm2(f64::INFINITY).is_err());
        assert!(Thickness::mg_per_cm2(0.0).is_ok());
    }

    #[test]
    fn areal_density_converts_every_unit_to_mg_per_cm2() {
        let si = lookup(14).unwrap();
        let mg = Thickness::new(4.0, ThicknessUnit::MgPerCm2).unwrap();
        let g = Thickness::new(0.004, ThicknessUnit::GPerCm2).unwrap();
        let um = Thickness::new(100.0, ThicknessUnit::Micrometer).unwrap();

        assert!(f64_approx_equal(mg.areal_density(si), 4.0));
        assert!(f64_approx_equal(g.areal_density(si), 4.0));
        assert!(f64_approx_equal(um.areal_density(si), 100.0 * 2.3212 * 0.1));
    }

    #[test]
    fn micrometers_of_a_degenerate_element_have_no_mass() {
        let tc = lookup(43).unwrap();
        let um = Thickness::micrometers(50.0).unwrap();
        assert_eq!(um.areal_density(tc), 0.0);
    }

    #[test]
    fn thickness_parses_compact_strings() {
        assert_eq!(
            "130um".parse::<Thickness>().unwrap(),
            Thickness::micrometers(130.0).unwrap()
        );
        assert_eq!(
            "4 mg/cm2".parse::<Thickness>().unwrap(),
            Thickness::mg_per_cm2(4.0).unwrap()
        );
        assert_eq!(
            "0.5g/cm2".parse::<Thickness>().unwrap().unit,
            ThicknessUnit::GPerCm2
        );
        assert!(matches!(
            "12 furlongs".parse::<Thickness>(),
            Err(LayerError::UnknownUnit(_))
        ));
        assert!(matches!(
            "130".parse::<Thickness>(),
            Err(LayerError::Malformed(_))
        ));
    }

    #[test]
    fn absent_layers_are_not_active() {
        let foil = Layer::new(13, 27, Thickness::mg_per_cm2(0.5).unwrap()).with_presence(false);
        assert!(!foil.is_active());
    }
}
