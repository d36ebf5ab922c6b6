use super::particle::{Nuclide, ParticleError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The detected reaction product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fragment {
    Proton,
    Deuteron,
    Triton,
    Helium3,
    Alpha,
    Other { z: u32, a: u32 },
}

impl Fragment {
    /// The light fragments in the order they are conventionally analysed.
    pub const LIGHT: [Fragment; 5] = [
        Fragment::Proton,
        Fragment::Deuteron,
        Fragment::Triton,
        Fragment::Helium3,
        Fragment::Alpha,
    ];

    pub fn nuclide(&self) -> Nuclide {
        let (z, a) = match *self {
            Fragment::Proton => (1, 1),
            Fragment::Deuteron => (1, 2),
            Fragment::Triton => (1, 3),
            Fragment::Helium3 => (2, 3),
            Fragment::Alpha => (2, 4),
            Fragment::Other { z, a } => (z, a),
        };
        Nuclide { z, a }
    }

    pub fn from_nuclide(nuclide: Nuclide) -> Self {
        match (nuclide.z, nuclide.a) {
            (1, 1) => Fragment::Proton,
            (1, 2) => Fragment::Deuteron,
            (1, 3) => Fragment::Triton,
            (2, 3) => Fragment::Helium3,
            (2, 4) => Fragment::Alpha,
            (z, a) => Fragment::Other { z, a },
        }
    }

    /// Residual nucleus left behind when this fragment is emitted from `beam + target`.
    pub fn residual(&self, beam: Nuclide, target: Nuclide) -> Result<Nuclide, ParticleError> {
        let ejectile = self.nuclide();
        Nuclide::checked(
            i64::from(beam.z) + i64::from(target.z) - i64::from(ejectile.z),
            i64::from(beam.a) + i64::from(target.a) - i64::from(ejectile.a),
        )
    }

    /// Short reaction-notation name (p, d, t, 3He, a), or the nuclide for other fragments.
    pub fn short_name(&self) -> String {
        match self {
            Fragment::Proton => "p".to_string(),
            Fragment::Deuteron => "d".to_string(),
            Fragment::Triton => "t".to_string(),
            Fragment::Helium3 => "3He".to_string(),
            Fragment::Alpha => "a".to_string(),
            Fragment::Other { .. } => self.nuclide().to_string(),
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

/// A balanced two-body reaction `target(beam, ejectile)residual`.
///
/// Construction enforces `beam + target = ejectile + residual` in both charge
/// and mass number, so every value of this type is stoichiometrically valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReactionChannel {
    pub beam: Nuclide,
    pub target: Nuclide,
    pub fragment: Fragment,
    pub residual: Nuclide,
}

impl ReactionChannel {
    pub fn new(beam: Nuclide, target: Nuclide, fragment: Fragment) -> Result<Self, ParticleError> {
        let residual = fragment.residual(beam, target)?;
        Ok(Self {
            beam,
            target,
            fragment,
            residual,
        })
    }

    pub fn ejectile(&self) -> Nuclide {
        self.fragment.nuclide()
    }

    /// Elastic or inelastic scattering of the beam itself.
    pub fn is_scattering(&self) -> bool {
        self.ejectile() == self.beam
    }

    /// Label such as `28Si(p,d)27Si`, or `28Si(p,p')28Si` for inelastic scattering.
    pub fn label(&self) -> String {
        let beam = Fragment::from_nuclide(self.beam).short_name();
        let prime = if self.is_scattering() { "'" } else { "" };
        format!(
            "{}({},{}{}){}",
            self.target, beam, self.fragment, prime, self.residual
        )
    }
}

impl fmt::Display for ReactionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
