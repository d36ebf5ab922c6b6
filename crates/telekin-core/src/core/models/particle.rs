use crate::core::tables::elements;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParticleError {
    #[error("Invalid nuclide Z={z}, A={a}: requires A >= 1 and Z <= A")]
    InvalidNuclide { z: i64, a: i64 },
    #[error("Invalid kinetic energy {0} MeV: must be finite and non-negative")]
    InvalidEnergy(f64),
}

/// A nucleus identified by its charge and mass numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nuclide {
    pub z: u32,
    pub a: u32,
}

impl Nuclide {
    pub fn new(z: u32, a: u32) -> Result<Self, ParticleError> {
        Self::checked(i64::from(z), i64::from(a))
    }

    /// Builds a nuclide from signed numbers, as produced by stoichiometric balancing.
    pub fn checked(z: i64, a: i64) -> Result<Self, ParticleError> {
        if a < 1 || z < 0 || z > a || a > i64::from(u32::MAX) {
            return Err(ParticleError::InvalidNuclide { z, a });
        }
        Ok(Self {
            z: z as u32,
            a: a as u32,
        })
    }

    pub fn symbol(&self) -> &'static str {
        match self.z {
            0 => "n",
            z => elements::symbol(z).unwrap_or("?"),
        }
    }
}

impl fmt::Display for Nuclide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.z == 0 && self.a == 1 {
            write!(f, "n")
        } else {
            write!(f, "{}{}", self.a, self.symbol())
        }
    }
}

/// A nucleus moving with a kinetic energy in MeV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub nuclide: Nuclide,
    pub energy: f64,
}

impl Particle {
    pub fn new(z: u32, a: u32, energy: f64) -> Result<Self, ParticleError> {
        let nuclide = Nuclide::new(z, a)?;
        Self::from_nuclide(nuclide, energy)
    }

    pub fn from_nuclide(nuclide: Nuclide, energy: f64) -> Result<Self, ParticleError> {
        if !energy.is_finite() || energy < 0.0 {
            return Err(ParticleError::InvalidEnergy(energy));
        }
        Ok(Self { nuclide, energy })
    }

    pub fn z(&self) -> u32 {
        self.nuclide.z
    }

    pub fn a(&self) -> u32 {
        self.nuclide.a
    }

    /// Kinetic energy per nucleon in keV/u, the velocity variable of the stopping tables.
    pub fn energy_per_nucleon_kev(&self) -> f64 {
        self.energy * 1000.0 / f64::from(self.nuclide.a)
    }

    pub fn with_energy(&self, energy: f64) -> Self {
        Self {
            nuclide: self.nuclide,
            energy: energy.max(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nuclide_rejects_more_protons_than_nucleons() {
        assert!(Nuclide::new(3, 2).is_err());
        assert!(Nuclide::new(0, 0).is_err());
        assert!(Nuclide::checked(-1, 4).is_err());
        assert_eq!(Nuclide::new(0, 1).unwrap(), Nuclide { z: 0, a: 1 });
    }

    #[test]
    fn nuclide_display_uses_mass_number_and_symbol() {
        assert_eq!(Nuclide::new(14, 28).unwrap().to_string(), "28Si");
        assert_eq!(Nuclide::new(2, 4).unwrap().to_string(), "4He");
        assert_eq!(Nuclide::new(0, 1).unwrap().to_string(), "n");
    }

    #[test]
    fn particle_rejects_negative_or_nan_energy() {
        assert!(matches!(
            Particle::new(1, 1, -1.0),
            Err(ParticleError::InvalidEnergy(_))
        ));
        assert!(Particle::new(1, 1, f64::NAN).is_err());
        assert!(Particle::new(1, 1, 0.0).is_ok());
    }

    #[test]
    fn energy_per_nucleon_is_in_kev() {
        let alpha = Particle::new(2, 4, 8.0).unwrap();
        assert!((alpha.energy_per_nucleon_kev() - 2000.0).abs() < 1e-9);
    }
}
