use super::cancel::CancelToken;
use super::config::{Setup, SweepConfig};
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter, ProgressThrottle};
use super::state::{
    CurveSample, FragmentResult, Gap, GapReason, KinematicSample, LayerDeposit, ScatterPoint,
    SweepState,
};
use crate::core::models::fragment::{Fragment, ReactionChannel};
use crate::core::models::layer::LayerRole;
use crate::core::models::particle::{Nuclide, Particle};
use crate::core::models::stack::PathSegment;
use crate::core::physics::fit::fit_quadratic;
use crate::core::physics::integrator::{TransitOutcome, degrade_areal};
use crate::core::physics::kinematics::{Kinematics, KinematicsError};
use crate::core::physics::straggling::in_quadrature;
use crate::core::tables::elements::{self, ElementRecord, TableError};
use crate::core::tables::masses::MassTable;
use tracing::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Excitation-energy offset (MeV) used to estimate the local slope of the locus.
const SLOPE_STEP: f64 = 0.05;

/// Beam state at the reaction vertex, shared by every fragment of a setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexBeam {
    pub energy: f64,
    /// Straggling variance accumulated on the way in, MeV².
    pub variance: f64,
}

/// Carries the beam through the front foil and the first half of the target.
///
/// Every layer on this path is needed by every sample, so any failure here is fatal.
pub fn beam_at_vertex(setup: &Setup) -> Result<VertexBeam, EngineError> {
    elements::lookup(setup.beam.z()).map_err(EngineError::BeamElement)?;

    let mut beam = setup.beam;
    let mut variance = 0.0;
    for segment in setup.stack.beam_path() {
        let material = elements::lookup(segment.layer.z).map_err(|source| {
            EngineError::Material {
                role: segment.role,
                source,
            }
        })?;
        let transit = degrade_areal(&beam, segment.areal_density(material), material)?;
        if transit.degenerate {
            warn!(role = %segment.role, z = material.z, "Beam crosses a layer without stopping data");
        }
        match transit.outcome {
            TransitOutcome::Exited { energy } => beam = beam.with_energy(energy),
            TransitOutcome::Stopped { .. } => {
                return Err(EngineError::BeamStopped { role: segment.role });
            }
        }
        variance = variance * transit.spread_gain.powi(2) + transit.straggling_variance;
    }
    debug!(energy = beam.energy, sigma = variance.sqrt(), "Beam at reaction vertex");
    Ok(VertexBeam {
        energy: beam.energy,
        variance,
    })
}

#[derive(Debug, Clone)]
struct ResolvedSegment {
    segment: PathSegment,
    material: Result<&'static ElementRecord, TableError>,
}

impl ResolvedSegment {
    fn new(segment: PathSegment) -> Self {
        let material = elements::lookup(segment.layer.z);
        if material.is_err() {
            warn!(role = %segment.role, z = segment.layer.z, "Samples crossing this layer will be gaps");
        }
        Self { segment, material }
    }
}

/// Pipeline for one reaction channel at a fixed geometry.
#[derive(Debug)]
pub struct Sweep<'a> {
    config: &'a SweepConfig,
    channel: ReactionChannel,
    kinematics: Result<Kinematics, KinematicsError>,
    vertex: VertexBeam,
    path: Vec<ResolvedSegment>,
}

impl<'a> Sweep<'a> {
    pub fn new(
        setup: &Setup,
        config: &'a SweepConfig,
        fragment: Fragment,
        vertex: VertexBeam,
        masses: &MassTable,
    ) -> Result<Self, EngineError> {
        let target = setup.stack.target;
        let target_nuclide = Nuclide::new(target.z, target.a)
            .map_err(|source| EngineError::InvalidChannel { fragment, source })?;
        let channel = ReactionChannel::new(setup.beam.nuclide, target_nuclide, fragment)
            .map_err(|source| EngineError::InvalidChannel { fragment, source })?;

        masses.mass(channel.beam.z, channel.beam.a)?;
        masses.mass(channel.target.z, channel.target.a)?;
        let kinematics = Kinematics::new(&channel, masses);
        if let Err(e) = &kinematics {
            warn!(channel = %channel, error = %e, "Every sample of this channel will be a gap");
        }

        let geometry = config.geometry;
        let path = setup
            .stack
            .exit_path(geometry.angle)
            .into_iter()
            .chain(setup.stack.telescope_path(geometry.incidence))
            .map(ResolvedSegment::new)
            .collect();

        Ok(Self {
            config,
            channel,
            kinematics,
            vertex,
            path,
        })
    }

    pub fn channel(&self) -> &ReactionChannel {
        &self.channel
    }

    /// Computes the telescope response for one excitation energy.
    pub fn evaluate(&self, excitation: f64) -> CurveSample {
        match self.sample(excitation) {
            Ok(point) => CurveSample::Point(point),
            Err(reason) => CurveSample::Gap(Gap { excitation, reason }),
        }
    }

    fn sample(&self, excitation: f64) -> Result<KinematicSample, GapReason> {
        let kinematics = self.kinematics.as_ref().map_err(gap_reason)?;
        let solution = kinematics
            .solve(self.vertex.energy, excitation, self.config.geometry.angle)
            .map_err(|e| gap_reason(&e))?;

        let mut ejectile = Particle::from_nuclide(self.channel.ejectile(), solution.ejectile_energy)
            .map_err(|_| GapReason::Unreachable)?;
        let mut deposits = Vec::with_capacity(self.path.len());
        let mut stopped_in = None;
        let mut degenerate = false;

        for resolved in &self.path {
            let segment = &resolved.segment;
            let material = resolved.material.as_ref().copied().map_err(|_| {
                GapReason::MissingMaterial {
                    role: segment.role,
                    z: segment.layer.z,
                }
            })?;
            let transit = degrade_areal(&ejectile, segment.areal_density(material), material)
                .map_err(GapReason::Integration)?;
            degenerate |= transit.degenerate;
            deposits.push(LayerDeposit {
                role: segment.role,
                incident: ejectile.energy,
                deposited: transit.energy_loss(ejectile.energy),
                straggling_variance: transit.straggling_variance,
                spread_gain: transit.spread_gain,
                stopped: transit.is_stopped(),
                degenerate: transit.degenerate,
            });
            match transit.outcome {
                TransitOutcome::Exited { energy } => ejectile = ejectile.with_energy(energy),
                TransitOutcome::Stopped { .. } => {
                    stopped_in = Some(segment.role);
                    break;
                }
            }
        }

        let deposited_in = |role| {
            deposits
                .iter()
                .find(|d: &&LayerDeposit| d.role == role)
                .map_or(0.0, |d| d.deposited)
        };
        Ok(KinematicSample {
            excitation,
            ejectile_energy: solution.ejectile_energy,
            residual_energy: solution.residual_energy,
            delta_e: deposited_in(LayerRole::DeltaE),
            e: deposited_in(LayerRole::E),
            stopped_in,
            punch_through: stopped_in.is_none(),
            degenerate,
            deposits,
        })
    }

    /// Adds straggling uncertainties to the sample at `excitation`.
    pub fn scatter_point(&self, excitation: f64) -> Result<ScatterPoint, Gap> {
        let sample = match self.evaluate(excitation) {
            CurveSample::Point(sample) => sample,
            CurveSample::Gap(gap) => return Err(gap),
        };

        let spread =
            EnergySpread::propagate(self.vertex_variance(excitation), &sample.deposits);
        let sigma_delta_e = spread.sigma(&[LayerRole::DeltaE]);
        let sigma_e = if sample.deposit(LayerRole::E).is_some() {
            spread.sigma(&[LayerRole::E])
        } else {
            0.0
        };
        let sigma_excitation = self
            .locus_slope(excitation, &sample)
            .map(|slope| slope.abs() * spread.sigma(&[LayerRole::DeltaE, LayerRole::E]));

        Ok(ScatterPoint {
            sample,
            sigma_e,
            sigma_delta_e,
            sigma_excitation,
        })
    }

    /// Beam straggling propagated to the ejectile energy at the vertex.
    fn vertex_variance(&self, excitation: f64) -> f64 {
        let Ok(kinematics) = &self.kinematics else {
            return 0.0;
        };
        kinematics
            .beam_energy_sensitivity(self.vertex.energy, excitation, self.config.geometry.angle)
            .map_or(0.0, |slope| slope * slope * self.vertex.variance)
    }

    /// dEx/d(E + dE) around `excitation`, from neighbouring samples on the locus.
    fn locus_slope(&self, excitation: f64, centre: &KinematicSample) -> Option<f64> {
        let total_at = |ex: f64| match self.evaluate(ex) {
            CurveSample::Point(p) if p.total() > 0.0 => Some((ex, p.total())),
            _ => None,
        };
        let lower = if excitation >= SLOPE_STEP {
            total_at(excitation - SLOPE_STEP)
        } else {
            None
        };
        let upper = total_at(excitation + SLOPE_STEP);
        let centre = (centre.total() > 0.0).then_some((excitation, centre.total()));

        let (a, b) = match (lower, upper) {
            (Some(l), Some(u)) => (l, u),
            (Some(l), None) => (l, centre?),
            (None, Some(u)) => (centre?, u),
            (None, None) => return None,
        };
        let de = b.1 - a.1;
        (de.abs() > f64::EPSILON).then(|| (b.0 - a.0) / de)
    }

    /// Sweeps the configured excitation range, streaming samples to `sink` in order.
    pub fn run(
        &self,
        reporter: &ProgressReporter,
        cancel: &CancelToken,
        sink: &mut dyn FnMut(&ReactionChannel, &CurveSample),
    ) -> Result<FragmentResult, EngineError> {
        let excitations = self.config.excitation.samples();
        let total = excitations.len();
        info!(channel = %self.channel, samples = total, angle = self.config.geometry.angle, "Starting sweep");

        let mut state = SweepState::Idle.start(total);
        let throttle = ProgressThrottle::new(total as u64);
        reporter.report(Progress::TaskStart {
            total_steps: total as u64,
        });

        let mut curve = Vec::with_capacity(total);

        #[cfg(not(feature = "parallel"))]
        for &excitation in &excitations {
            if cancel.is_cancelled() {
                state = state.cancel();
                break;
            }
            let sample = self.evaluate(excitation);
            throttle.advance(reporter);
            sink(&self.channel, &sample);
            curve.push(sample);
            state = state.advance();
        }

        #[cfg(feature = "parallel")]
        {
            let block = rayon::current_num_threads().max(1) * 4;
            for chunk in excitations.chunks(block) {
                if cancel.is_cancelled() {
                    state = state.cancel();
                    break;
                }
                let samples: Vec<CurveSample> = chunk
                    .par_iter()
                    .map(|&excitation| {
                        let sample = self.evaluate(excitation);
                        throttle.advance(reporter);
                        sample
                    })
                    .collect();
                for sample in samples {
                    sink(&self.channel, &sample);
                    curve.push(sample);
                    state = state.advance();
                }
            }
        }

        reporter.report(Progress::TaskFinish);
        if state == SweepState::Cancelled {
            info!(channel = %self.channel, completed = curve.len(), "Sweep cancelled");
            return Err(EngineError::Cancelled);
        }

        let locus: Vec<(f64, f64)> = curve
            .iter()
            .filter_map(CurveSample::point)
            .filter(|p| p.is_fully_detected())
            .map(|p| (p.total(), p.excitation))
            .collect();
        let fit = fit_quadratic(&locus);
        if let Err(e) = &fit {
            debug!(channel = %self.channel, error = %e, "No locus fit");
        }

        let scatter = self
            .config
            .scatter_excitations
            .iter()
            .map(|&excitation| self.scatter_point(excitation))
            .collect();

        Ok(FragmentResult {
            channel: self.channel,
            curve,
            fit,
            scatter,
        })
    }
}

/// Linear propagation of independent energy spreads along the ejectile path.
///
/// Source 0 is the spread at the vertex and every crossed layer adds its own
/// straggling as a further source. Each deposit keeps its sensitivity to every
/// source, so a spread shared by dE and E is counted once in their sum.
#[derive(Debug)]
struct EnergySpread {
    variances: Vec<f64>,
    deposits: Vec<(LayerRole, Vec<f64>)>,
}

impl EnergySpread {
    fn propagate(vertex_variance: f64, deposits: &[LayerDeposit]) -> Self {
        let mut variances = vec![vertex_variance];
        let mut entering = vec![1.0];
        let mut coefficients = Vec::with_capacity(deposits.len());
        for deposit in deposits {
            variances.push(deposit.straggling_variance);
            entering.push(0.0);
            let mut leaving: Vec<f64> = entering
                .iter()
                .map(|c| c * deposit.spread_gain)
                .collect();
            if let Some(own) = leaving.last_mut() {
                *own = if deposit.stopped { 0.0 } else { 1.0 };
            }
            let deposited = entering.iter().zip(&leaving).map(|(i, o)| i - o).collect();
            coefficients.push((deposit.role, deposited));
            entering = leaving;
        }
        Self {
            variances,
            deposits: coefficients,
        }
    }

    /// 1σ spread of the summed energy deposited in `roles`.
    fn sigma(&self, roles: &[LayerRole]) -> f64 {
        let mut combined = vec![0.0; self.variances.len()];
        for (_, coefficients) in self.deposits.iter().filter(|(role, _)| roles.contains(role)) {
            for (total, c) in combined.iter_mut().zip(coefficients) {
                *total += c;
            }
        }
        in_quadrature(
            combined
                .iter()
                .zip(&self.variances)
                .map(|(c, variance)| c * c * variance),
        )
    }
}

fn gap_reason(error: &KinematicsError) -> GapReason {
    match error {
        KinematicsError::UnknownNuclide(n) => GapReason::UnknownNuclide(*n),
        KinematicsError::Unreachable { .. } | KinematicsError::InvalidBeamEnergy(_) => {
            GapReason::Unreachable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::layer::{Layer, Thickness};
    use crate::core::tables::masses::BUILTIN;
    use crate::engine::config::{ExcitationRange, Geometry, SetupBuilder, SweepConfigBuilder};

    fn setup(beam_energy: f64, target_mg: f64) -> Setup {
        SetupBuilder::new()
            .beam(Particle::new(1, 1, beam_energy).unwrap())
            .target(Layer::new(14, 28, Thickness::mg_per_cm2(target_mg).unwrap()))
            .front_foil(Layer::new(13, 27, Thickness::mg_per_cm2(0.5).unwrap()))
            .delta_e(Layer::new(14, 28, Thickness::micrometers(130.0).unwrap()))
            .e_detector(Layer::new(14, 28, Thickness::micrometers(1550.0).unwrap()))
            .build()
            .unwrap()
    }

    fn config(angle: f64) -> SweepConfig {
        SweepConfigBuilder::new()
            .fragments(vec![Fragment::Proton])
            .excitation(ExcitationRange::new(0.0, 2.0, 1.0).unwrap())
            .geometry(Geometry::new(angle, 0.0).unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn beam_loses_energy_in_front_foil_and_half_target() {
        let vertex = beam_at_vertex(&setup(16.0, 4.0)).unwrap();
        assert!(vertex.energy < 16.0);
        assert!(vertex.energy > 15.9);
        assert!(vertex.variance > 0.0);
    }

    #[test]
    fn beam_stopping_before_the_vertex_is_fatal() {
        let result = beam_at_vertex(&setup(0.5, 40.0));
        assert!(matches!(
            result,
            Err(EngineError::BeamStopped {
                role: LayerRole::Target
            })
        ));
    }

    #[test]
    fn untabulated_beam_element_is_fatal() {
        let mut setup = setup(16.0, 4.0);
        setup.beam = Particle::new(100, 250, 100.0).unwrap();
        assert!(matches!(
            beam_at_vertex(&setup),
            Err(EngineError::BeamElement(TableError::OutOfRangeElement(100)))
        ));
    }

    #[test]
    fn grazing_ejectile_stops_in_the_target() {
        let setup = setup(16.0, 4.0);
        let config = config(90.0);
        let vertex = beam_at_vertex(&setup).unwrap();
        let sweep = Sweep::new(&setup, &config, Fragment::Proton, vertex, &BUILTIN).unwrap();
        let sample = sweep.evaluate(0.0);
        let point = sample.point().unwrap();
        assert_eq!(point.stopped_in, Some(LayerRole::Target));
        assert_eq!(point.delta_e, 0.0);
        assert_eq!(point.e, 0.0);
    }

    #[test]
    fn backward_ejectile_deposits_energy_in_the_front_foil() {
        let setup = setup(16.0, 4.0);
        let config = config(132.0);
        let vertex = beam_at_vertex(&setup).unwrap();
        let sweep = Sweep::new(&setup, &config, Fragment::Proton, vertex, &BUILTIN).unwrap();
        let point = sweep.evaluate(0.0);
        let point = point.point().unwrap();
        let foil = point.deposit(LayerRole::FrontFoil).unwrap();
        assert!(foil.deposited > 0.0);
        assert!(point.deposit(LayerRole::BackFoil).is_none());
    }

    #[test]
    fn deposits_account_for_the_whole_vertex_energy_when_stopped() {
        let setup = setup(16.0, 4.0);
        let config = config(48.0);
        let vertex = beam_at_vertex(&setup).unwrap();
        let sweep = Sweep::new(&setup, &config, Fragment::Proton, vertex, &BUILTIN).unwrap();
        let sample = sweep.evaluate(1.0);
        let point = sample.point().unwrap();
        assert!(point.is_fully_detected());
        let total: f64 = point.deposits.iter().map(|d| d.deposited).sum();
        assert!((total - point.ejectile_energy).abs() < 1e-9);
    }

    #[test]
    fn invalid_fragment_is_rejected_when_the_sweep_is_built() {
        let setup = setup(16.0, 4.0);
        let config = config(48.0);
        let vertex = beam_at_vertex(&setup).unwrap();
        let result = Sweep::new(
            &setup,
            &config,
            Fragment::Other { z: 20, a: 40 },
            vertex,
            &BUILTIN,
        );
        assert!(matches!(result, Err(EngineError::InvalidChannel { .. })));
    }

    #[test]
    fn scatter_point_at_unreachable_excitation_is_a_gap() {
        let setup = setup(16.0, 4.0);
        let config = config(48.0);
        let vertex = beam_at_vertex(&setup).unwrap();
        let sweep = Sweep::new(&setup, &config, Fragment::Proton, vertex, &BUILTIN).unwrap();
        let gap = sweep.scatter_point(30.0).unwrap_err();
        assert_eq!(gap.reason, GapReason::Unreachable);
        assert_eq!(gap.excitation, 30.0);
    }

    #[test]
    fn untabulated_detector_layer_turns_every_evaluation_into_a_gap() {
        let mut setup = setup(16.0, 4.0);
        setup.stack.delta_e = Layer::new(110, 270, Thickness::mg_per_cm2(1.0).unwrap());
        let config = config(48.0);
        let vertex = beam_at_vertex(&setup).unwrap();
        let sweep = Sweep::new(&setup, &config, Fragment::Proton, vertex, &BUILTIN).unwrap();
        let expected = GapReason::MissingMaterial {
            role: LayerRole::DeltaE,
            z: 110,
        };
        for _ in 0..2 {
            let sample = sweep.evaluate(0.0);
            assert!(
                matches!(sample, CurveSample::Gap(Gap { ref reason, .. }) if *reason == expected)
            );
        }
    }

    #[test]
    fn scatter_spread_in_delta_e_grows_as_the_ejectile_slows() {
        let setup = setup(16.0, 4.0);
        let config = config(48.0);
        let vertex = beam_at_vertex(&setup).unwrap();
        let sweep = Sweep::new(&setup, &config, Fragment::Proton, vertex, &BUILTIN).unwrap();
        let fast = sweep.scatter_point(0.0).unwrap();
        let slow = sweep.scatter_point(8.0).unwrap();
        assert!(slow.sample.delta_e > fast.sample.delta_e);
        assert!(
            slow.sigma_delta_e > fast.sigma_delta_e,
            "slow {} fast {}",
            slow.sigma_delta_e,
            fast.sigma_delta_e
        );
        assert!(fast.sigma_e > 0.0);
    }

    #[test]
    fn summed_spread_counts_shared_upstream_straggling_once() {
        let deposit = |role, stopped, straggling_variance, spread_gain| LayerDeposit {
            role,
            incident: 10.0,
            deposited: 1.0,
            straggling_variance,
            spread_gain,
            stopped,
            degenerate: false,
        };
        let deposits = [
            deposit(LayerRole::Target, false, 1e-4, 1.0),
            deposit(LayerRole::DeltaE, false, 4e-4, 1.2),
            deposit(LayerRole::E, true, 0.0, 0.0),
        ];
        let spread = EnergySpread::propagate(9e-4, &deposits);

        // Entering dE: vertex and target spreads, 1e-3 in total.
        let delta_e = (0.2f64.powi(2) * 1e-3 + 4e-4).sqrt();
        assert!((spread.sigma(&[LayerRole::DeltaE]) - delta_e).abs() < 1e-12);
        let e = (1.2f64.powi(2) * 1e-3 + 4e-4).sqrt();
        assert!((spread.sigma(&[LayerRole::E]) - e).abs() < 1e-12);
        // The dE straggling only moves energy between dE and E.
        let total = 1e-3f64.sqrt();
        assert!((spread.sigma(&[LayerRole::DeltaE, LayerRole::E]) - total).abs() < 1e-12);
    }

    #[test]
    fn run_reports_task_progress_and_streams_every_sample() {
        let setup = setup(16.0, 4.0);
        let config = config(48.0);
        let vertex = beam_at_vertex(&setup).unwrap();
        let sweep = Sweep::new(&setup, &config, Fragment::Proton, vertex, &BUILTIN).unwrap();

        let events = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|p| {
            events.lock().unwrap().push(p);
        }));
        let mut streamed = Vec::new();
        let result = sweep
            .run(&reporter, &CancelToken::new(), &mut |_, sample| {
                streamed.push(sample.excitation())
            })
            .unwrap();
        drop(reporter);

        assert_eq!(streamed, vec![0.0, 1.0, 2.0]);
        assert_eq!(result.curve.len(), 3);
        assert!(result.fit.is_ok());
        let events = events.into_inner().unwrap();
        assert_eq!(events.first(), Some(&Progress::TaskStart { total_steps: 3 }));
        assert_eq!(events.last(), Some(&Progress::TaskFinish));
    }
}
