use crate::core::models::fragment::ReactionChannel;
use crate::core::models::particle::Particle;
use crate::core::tables::masses::{MassTable, UnknownNuclide};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KinematicsError {
    #[error("Reaction is kinematically forbidden at {angle}° for Ex = {excitation} MeV")]
    Unreachable { excitation: f64, angle: f64 },
    #[error(transparent)]
    UnknownNuclide(#[from] UnknownNuclide),
    #[error("Beam energy {0} MeV is not a valid kinetic energy")]
    InvalidBeamEnergy(f64),
}

/// Outgoing energies of a two-body reaction at one lab angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Ejectile kinetic energy at the reaction vertex, MeV.
    pub ejectile_energy: f64,
    /// Residual recoil kinetic energy, MeV.
    pub residual_energy: f64,
    pub q_value: f64,
}

/// Non-relativistic two-body kinematics for one reaction channel.
///
/// Masses are resolved once at construction, so repeated solves across an
/// excitation-energy sweep never touch the mass table.
#[derive(Debug, Clone, Copy)]
pub struct Kinematics {
    channel: ReactionChannel,
    beam_mass: f64,
    ejectile_mass: f64,
    residual_mass: f64,
    ground_q: f64,
}

impl Kinematics {
    pub fn new(channel: &ReactionChannel, masses: &MassTable) -> Result<Self, KinematicsError> {
        let ejectile = channel.ejectile();
        let beam_mass = masses.mass(channel.beam.z, channel.beam.a)?;
        let target_mass = masses.mass(channel.target.z, channel.target.a)?;
        let ejectile_mass = masses.mass(ejectile.z, ejectile.a)?;
        let residual_mass = masses.mass(channel.residual.z, channel.residual.a)?;
        Ok(Self {
            channel: *channel,
            beam_mass,
            ejectile_mass,
            residual_mass,
            ground_q: beam_mass + target_mass - ejectile_mass - residual_mass,
        })
    }

    pub fn channel(&self) -> &ReactionChannel {
        &self.channel
    }

    /// Reaction Q value in MeV leading to a residual state at `excitation` MeV.
    pub fn q_value(&self, excitation: f64) -> f64 {
        self.ground_q - excitation
    }

    /// Solves for the ejectile energy at `angle_deg` in the laboratory frame.
    ///
    /// Of the two roots of the momentum balance the larger one is taken.
    pub fn solve(
        &self,
        beam_energy: f64,
        excitation: f64,
        angle_deg: f64,
    ) -> Result<Solution, KinematicsError> {
        if !beam_energy.is_finite() || beam_energy < 0.0 {
            return Err(KinematicsError::InvalidBeamEnergy(beam_energy));
        }
        let unreachable = KinematicsError::Unreachable {
            excitation,
            angle: angle_deg,
        };

        let q = self.q_value(excitation);
        let m1 = self.beam_mass;
        let m3 = self.ejectile_mass;
        let m4 = self.residual_mass + excitation;
        let cosine = angle_deg.to_radians().cos();

        let b = (m1 * m3 * beam_energy).sqrt() * cosine;
        let discriminant = b * b + (m3 + m4) * (m4 * q + (m4 - m1) * beam_energy);
        if !(discriminant >= 0.0) {
            return Err(unreachable);
        }
        let root = (b + discriminant.sqrt()) / (m3 + m4);
        if !(root > 0.0) {
            return Err(unreachable);
        }

        let ejectile_energy = root * root;
        let residual_energy = beam_energy + q - ejectile_energy;
        if residual_energy < -1e-9 * beam_energy.max(1.0) {
            return Err(unreachable);
        }
        Ok(Solution {
            ejectile_energy,
            residual_energy: residual_energy.max(0.0),
            q_value: q,
        })
    }

    /// Derivative of the ejectile energy with respect to the beam energy at the vertex.
    pub fn beam_energy_sensitivity(
        &self,
        beam_energy: f64,
        excitation: f64,
        angle_deg: f64,
    ) -> Result<f64, KinematicsError> {
        let h = (beam_energy * 1e-4).max(1e-6);
        let upper = self.solve(beam_energy + h, excitation, angle_deg)?;
        match self.solve(beam_energy - h, excitation, angle_deg) {
            Ok(lower) => Ok((upper.ejectile_energy - lower.ejectile_energy) / (2.0 * h)),
            Err(_) => {
                let centre = self.solve(beam_energy, excitation, angle_deg)?;
                Ok((upper.ejectile_energy - centre.ejectile_energy) / h)
            }
        }
    }
}

/// One-shot solve for a degraded beam particle.
pub fn solve(
    beam: &Particle,
    channel: &ReactionChannel,
    excitation: f64,
    angle_deg: f64,
    masses: &MassTable,
) -> Result<Solution, KinematicsError> {
    Kinematics::new(channel, masses)?.solve(beam.energy, excitation, angle_deg)
}
