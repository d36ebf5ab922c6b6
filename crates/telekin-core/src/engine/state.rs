use crate::core::models::fragment::ReactionChannel;
use crate::core::models::layer::LayerRole;
use crate::core::physics::fit::{CurveFit, FitError};
use crate::core::physics::integrator::IntegratorError;
use crate::core::tables::masses::UnknownNuclide;
use std::fmt;

/// Lifecycle of one fragment sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Sweeping { index: usize, total: usize },
    Done,
    Cancelled,
}

impl SweepState {
    pub fn start(self, total: usize) -> Self {
        match self {
            SweepState::Idle if total == 0 => SweepState::Done,
            SweepState::Idle => SweepState::Sweeping { index: 0, total },
            other => other,
        }
    }

    /// Moves past the sample at the current index.
    pub fn advance(self) -> Self {
        match self {
            SweepState::Sweeping { index, total } if index + 1 >= total => SweepState::Done,
            SweepState::Sweeping { index, total } => SweepState::Sweeping {
                index: index + 1,
                total,
            },
            other => other,
        }
    }

    pub fn cancel(self) -> Self {
        match self {
            SweepState::Done => SweepState::Done,
            _ => SweepState::Cancelled,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SweepState::Done | SweepState::Cancelled)
    }
}

/// Why a curve sample could not be computed.
#[derive(Debug, Clone, PartialEq)]
pub enum GapReason {
    /// No real solution at this angle and excitation energy.
    Unreachable,
    UnknownNuclide(UnknownNuclide),
    /// A layer on the ejectile path has no stopping data for its element.
    MissingMaterial { role: LayerRole, z: u32 },
    Integration(IntegratorError),
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapReason::Unreachable => write!(f, "kinematically unreachable"),
            GapReason::UnknownNuclide(n) => write!(f, "{n}"),
            GapReason::MissingMaterial { role, z } => {
                write!(f, "no stopping data for Z={z} in the {role}")
            }
            GapReason::Integration(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gap {
    pub excitation: f64,
    pub reason: GapReason,
}

/// Energy bookkeeping for one layer crossed by the ejectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerDeposit {
    pub role: LayerRole,
    pub incident: f64,
    pub deposited: f64,
    /// Straggling variance (MeV²) the layer itself adds to the exit energy.
    pub straggling_variance: f64,
    /// S(E_out)/S(E_in) across the layer; zero when the ejectile stopped in it.
    pub spread_gain: f64,
    pub stopped: bool,
    pub degenerate: bool,
}

/// Telescope response for one reachable excitation energy. Energies in MeV.
#[derive(Debug, Clone, PartialEq)]
pub struct KinematicSample {
    pub excitation: f64,
    /// Ejectile energy at the reaction vertex.
    pub ejectile_energy: f64,
    pub residual_energy: f64,
    /// Energy deposited in the dE detector.
    pub delta_e: f64,
    /// Energy deposited in the E detector; zero when the ejectile never reaches it.
    pub e: f64,
    /// Layer in which the ejectile came to rest, if any.
    pub stopped_in: Option<LayerRole>,
    /// The ejectile left the E detector with energy to spare.
    pub punch_through: bool,
    /// A layer with no stopping data was crossed without energy loss.
    pub degenerate: bool,
    pub deposits: Vec<LayerDeposit>,
}

impl KinematicSample {
    /// Total energy seen by the telescope, `E + dE`.
    pub fn total(&self) -> f64 {
        self.delta_e + self.e
    }

    /// The ejectile stopped inside the E detector, so `E + dE` measures its full energy.
    pub fn is_fully_detected(&self) -> bool {
        self.stopped_in == Some(LayerRole::E)
    }

    pub fn deposit(&self, role: LayerRole) -> Option<&LayerDeposit> {
        self.deposits.iter().find(|d| d.role == role)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveSample {
    Point(KinematicSample),
    Gap(Gap),
}

impl CurveSample {
    pub fn excitation(&self) -> f64 {
        match self {
            CurveSample::Point(p) => p.excitation,
            CurveSample::Gap(g) => g.excitation,
        }
    }

    pub fn point(&self) -> Option<&KinematicSample> {
        match self {
            CurveSample::Point(p) => Some(p),
            CurveSample::Gap(_) => None,
        }
    }
}

/// A sample at a chosen excitation energy with straggling uncertainties (1σ, MeV).
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub sample: KinematicSample,
    pub sigma_e: f64,
    pub sigma_delta_e: f64,
    /// Uncertainty of the reconstructed excitation energy, when the local
    /// slope of the locus could be determined.
    pub sigma_excitation: Option<f64>,
}

/// Everything produced for one reaction channel.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentResult {
    pub channel: ReactionChannel,
    pub curve: Vec<CurveSample>,
    pub fit: Result<CurveFit, FitError>,
    pub scatter: Vec<Result<ScatterPoint, Gap>>,
}

impl FragmentResult {
    pub fn points(&self) -> impl Iterator<Item = &KinematicSample> {
        self.curve.iter().filter_map(CurveSample::point)
    }

    pub fn gaps(&self) -> impl Iterator<Item = &Gap> {
        self.curve.iter().filter_map(|s| match s {
            CurveSample::Gap(g) => Some(g),
            CurveSample::Point(_) => None,
        })
    }
}
