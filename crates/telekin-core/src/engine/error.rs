use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::fragment::Fragment;
use crate::core::models::layer::LayerRole;
use crate::core::models::particle::ParticleError;
use crate::core::physics::integrator::IntegratorError;
use crate::core::tables::elements::TableError;
use crate::core::tables::masses::UnknownNuclide;

/// Conditions that abort a whole sweep.
///
/// Problems confined to one excitation-energy sample are recorded in the
/// curve as gaps instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot resolve material of the {role}: {source}")]
    Material {
        role: LayerRole,
        #[source]
        source: TableError,
    },

    #[error("Beam element is not tabulated: {0}")]
    BeamElement(#[source] TableError),

    #[error("Beam or target mass is unknown: {0}")]
    Mass(#[from] UnknownNuclide),

    #[error("Fragment {fragment} is not a valid reaction product: {source}")]
    InvalidChannel {
        fragment: Fragment,
        #[source]
        source: ParticleError,
    },

    #[error("Beam stopped in the {role} before reaching the reaction vertex")]
    BeamStopped { role: LayerRole },

    #[error("Beam transport failed: {0}")]
    Integration(#[from] IntegratorError),

    #[error("Sweep was cancelled")]
    Cancelled,

    #[error("Sweep worker failed: {0}")]
    Worker(String),
}
