use super::straggling::slice_variance;
use super::stopping::mass_stopping;
use crate::core::models::layer::Layer;
use crate::core::models::particle::Particle;
use crate::core::tables::elements::ElementRecord;
use thiserror::Error;
use tracing::trace;

/// Largest fractional energy loss allowed in a single step.
const MAX_STEP_LOSS: f64 = 0.02;
/// Kinetic energy (MeV) below which a particle is considered stopped.
pub const STOP_ENERGY: f64 = 1e-3;
const MAX_STEPS: usize = 200_000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntegratorError {
    #[error("Layer material Z={layer} does not match absorber record Z={absorber}")]
    MaterialMismatch { layer: u32, absorber: u32 },
    #[error("Energy-loss integration did not converge within {0} steps")]
    StepLimit(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitOutcome {
    /// The particle left the layer with `energy` MeV.
    Exited { energy: f64 },
    /// The particle ranged out at `depth` mg/cm² along its path.
    Stopped { depth: f64 },
}

/// Result of carrying one particle through one slab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transit {
    pub outcome: TransitOutcome,
    /// Straggling variance (MeV²) this layer adds to the exit energy.
    pub straggling_variance: f64,
    /// S(E_out)/S(E_in): how much an energy spread entering the layer is
    /// stretched on the way out. Zero once the particle has stopped.
    pub spread_gain: f64,
    /// Mass thickness actually crossed, in mg/cm².
    pub traversed: f64,
    /// The absorber has no stopping data; the energy passed through unchanged.
    pub degenerate: bool,
}

impl Transit {
    fn unchanged(energy: f64, degenerate: bool) -> Self {
        Self {
            outcome: TransitOutcome::Exited { energy },
            straggling_variance: 0.0,
            spread_gain: 1.0,
            traversed: 0.0,
            degenerate,
        }
    }

    pub fn exit_energy(&self) -> Option<f64> {
        match self.outcome {
            TransitOutcome::Exited { energy } => Some(energy),
            TransitOutcome::Stopped { .. } => None,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.outcome, TransitOutcome::Stopped { .. })
    }

    /// Energy deposited in the layer by a particle that entered with `incident` MeV.
    pub fn energy_loss(&self, incident: f64) -> f64 {
        match self.outcome {
            TransitOutcome::Exited { energy } => incident - energy,
            TransitOutcome::Stopped { .. } => incident,
        }
    }
}

/// Carries `particle` through the full normal thickness of `layer`.
pub fn degrade(
    particle: &Particle,
    layer: &Layer,
    absorber: &ElementRecord,
) -> Result<Transit, IntegratorError> {
    if layer.z != absorber.z {
        return Err(IntegratorError::MaterialMismatch {
            layer: layer.z,
            absorber: absorber.z,
        });
    }
    if layer.thickness.is_zero() {
        return Ok(Transit::unchanged(particle.energy, absorber.is_degenerate()));
    }
    degrade_areal(particle, layer.thickness.areal_density(absorber), absorber)
}

/// Carries `particle` through `areal_density` mg/cm² of `absorber`.
///
/// An infinite thickness integrates to the end of the particle range.
pub fn degrade_areal(
    particle: &Particle,
    areal_density: f64,
    absorber: &ElementRecord,
) -> Result<Transit, IntegratorError> {
    let incident = particle.energy;
    if !(areal_density > 0.0) {
        return Ok(Transit::unchanged(incident, absorber.is_degenerate()));
    }
    if absorber.is_degenerate() {
        return Ok(Transit::unchanged(incident, true));
    }
    if incident < STOP_ENERGY {
        return Ok(Transit {
            outcome: TransitOutcome::Stopped { depth: 0.0 },
            straggling_variance: 0.0,
            spread_gain: 0.0,
            traversed: 0.0,
            degenerate: false,
        });
    }

    let (z, a) = (particle.z(), particle.a());
    let loss_rate = |energy: f64| mass_stopping(z, a, energy, absorber);

    let mut energy = incident;
    let mut depth = 0.0;
    let mut variance = 0.0;
    let mut gain = 1.0;
    let mut rate = loss_rate(energy);
    for _ in 0..MAX_STEPS {
        if rate <= 0.0 {
            // Neutral projectiles do not lose energy by ionization.
            return Ok(Transit::unchanged(incident, false));
        }
        let remaining = areal_density - depth;
        let step = remaining.min(MAX_STEP_LOSS * energy / rate);
        let last = step >= remaining;

        let k1 = -rate;
        let k2 = -loss_rate(energy + 0.5 * step * k1);
        let k3 = -loss_rate(energy + 0.5 * step * k2);
        let k4 = -loss_rate(energy + step * k3);
        let next = energy + step / 6.0 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);

        if next < STOP_ENERGY {
            let fraction = ((energy - STOP_ENERGY) / (energy - next)).clamp(0.0, 1.0);
            let stop_depth = depth + step * fraction;
            trace!(depth = stop_depth, "Particle stopped in layer");
            return Ok(Transit {
                outcome: TransitOutcome::Stopped { depth: stop_depth },
                straggling_variance: variance,
                spread_gain: 0.0,
                traversed: stop_depth,
                degenerate: false,
            });
        }

        // Spread picked up so far is stretched as the stopping power changes.
        let next_rate = loss_rate(next);
        let stretch = next_rate / rate;
        variance = variance * stretch * stretch
            + slice_variance(z, a, 0.5 * (energy + next), absorber, step);
        gain *= stretch;

        energy = next;
        rate = next_rate;
        depth += step;
        if last {
            return Ok(Transit {
                outcome: TransitOutcome::Exited { energy },
                straggling_variance: variance,
                spread_gain: gain,
                traversed: areal_density,
                degenerate: false,
            });
        }
    }
    Err(IntegratorError::StepLimit(MAX_STEPS))
}

/// Projected range in mg/cm², or `None` in a degenerate absorber.
pub fn range(particle: &Particle, absorber: &ElementRecord) -> Result<Option<f64>, IntegratorError> {
    let transit = degrade_areal(particle, f64::INFINITY, absorber)?;
    Ok(match transit.outcome {
        TransitOutcome::Stopped { depth } => Some(depth),
        TransitOutcome::Exited { .. } => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::layer::{Thickness, ThicknessUnit};
    use crate::core::tables::elements::lookup;

    fn proton(energy: f64) -> Particle {
        Particle::new(1, 1, energy).unwrap()
    }

    fn silicon(value: f64, unit: ThicknessUnit) -> Layer {
        Layer::new(14, 28, Thickness::new(value, unit).unwrap())
    }

    #[test]
    fn zero_thickness_returns_input_energy_exactly_in_every_unit() {
        let si = lookup(14).unwrap();
        for unit in [
            ThicknessUnit::MgPerCm2,
            ThicknessUnit::GPerCm2,
            ThicknessUnit::Micrometer,
        ] {
            let transit = degrade(&proton(7.123456789), &silicon(0.0, unit), si).unwrap();
            assert_eq!(transit.exit_energy(), Some(7.123456789));
            assert_eq!(transit.straggling_variance, 0.0);
        }
    }

    #[test]
    fn positive_thickness_always_loses_energy_or_stops() {
        let si = lookup(14).unwrap();
        for energy in [0.002, 0.05, 0.5, 2.0, 8.0, 16.0, 60.0] {
            for thickness in [0.01, 1.0, 25.0, 130.0, 1550.0] {
                let layer = silicon(thickness, ThicknessUnit::Micrometer);
                let transit = degrade(&proton(energy), &layer, si).unwrap();
                match transit.outcome {
                    TransitOutcome::Exited { energy: exit } => {
                        assert!(exit < energy, "E={energy} t={thickness} exit={exit}")
                    }
                    TransitOutcome::Stopped { depth } => {
                        assert!(depth >= 0.0 && depth <= layer.thickness.areal_density(si))
                    }
                }
            }
        }
    }

    #[test]
    fn thin_layer_loss_matches_stopping_power_times_thickness() {
        let si = lookup(14).unwrap();
        let transit = degrade(&proton(16.0), &silicon(0.1, ThicknessUnit::MgPerCm2), si).unwrap();
        let expected = mass_stopping(1, 1, 16.0, si) * 0.1;
        let loss = transit.energy_loss(16.0);
        assert!((loss - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn five_mev_proton_stops_in_thick_silicon_near_its_range() {
        let si = lookup(14).unwrap();
        let transit = degrade(&proton(5.0), &silicon(1000.0, ThicknessUnit::Micrometer), si).unwrap();
        let TransitOutcome::Stopped { depth } = transit.outcome else {
            panic!("expected the proton to stop");
        };
        // ~215 µm of silicon
        let microns = depth / (si.density * 0.1);
        assert!(microns > 180.0 && microns < 250.0, "range = {microns} um");
        assert!(transit.straggling_variance > 0.0);
    }

    #[test]
    fn range_agrees_with_stopping_depth() {
        let si = lookup(14).unwrap();
        let range = range(&proton(5.0), si).unwrap().unwrap();
        let transit = degrade_areal(&proton(5.0), range * 2.0, si).unwrap();
        let TransitOutcome::Stopped { depth } = transit.outcome else {
            panic!("expected the proton to stop");
        };
        assert!((depth - range).abs() < 1e-9);
    }

    #[test]
    fn degenerate_absorber_passes_energy_through_and_flags_it() {
        let rn = lookup(86).unwrap();
        let layer = Layer::new(86, 222, Thickness::mg_per_cm2(5.0).unwrap());
        let transit = degrade(&proton(3.0), &layer, rn).unwrap();
        assert!(transit.degenerate);
        assert_eq!(transit.exit_energy(), Some(3.0));
        assert_eq!(range(&proton(3.0), rn).unwrap(), None);
    }

    #[test]
    fn mismatched_absorber_record_is_rejected() {
        let al = lookup(13).unwrap();
        let result = degrade(&proton(3.0), &silicon(1.0, ThicknessUnit::MgPerCm2), al);
        assert!(matches!(
            result,
            Err(IntegratorError::MaterialMismatch { layer: 14, absorber: 13 })
        ));
    }

    #[test]
    fn particle_at_rest_stops_at_the_surface() {
        let si = lookup(14).unwrap();
        let transit = degrade(&proton(0.0), &silicon(1.0, ThicknessUnit::MgPerCm2), si).unwrap();
        assert_eq!(transit.outcome, TransitOutcome::Stopped { depth: 0.0 });
    }

    fn sigma_and_loss(z: u32, a: u32, energy: f64, layer: &Layer) -> (f64, f64) {
        let si = lookup(14).unwrap();
        let transit = degrade(&Particle::new(z, a, energy).unwrap(), layer, si).unwrap();
        (transit.straggling_variance.sqrt(), transit.energy_loss(energy))
    }

    #[test]
    fn straggling_grows_with_energy_loss_for_the_same_particle() {
        let detector = silicon(130.0, ThicknessUnit::Micrometer);
        let (fast_sigma, fast_loss) = sigma_and_loss(1, 1, 16.0, &detector);
        let (slow_sigma, slow_loss) = sigma_and_loss(1, 1, 6.0, &detector);
        assert!(slow_loss > 2.0 * fast_loss);
        assert!(
            slow_sigma > 1.05 * fast_sigma,
            "sigma(6 MeV) = {slow_sigma}, sigma(16 MeV) = {fast_sigma}"
        );
    }

    #[test]
    fn straggling_falls_with_mass_at_equal_energy_loss() {
        let detector = silicon(130.0, ThicknessUnit::Micrometer);
        let (proton_sigma, target_loss) = sigma_and_loss(1, 1, 6.0, &detector);

        let matched = |a: u32| {
            let (mut low, mut high) = (6.0, 40.0);
            for _ in 0..60 {
                let mid = 0.5 * (low + high);
                if sigma_and_loss(1, a, mid, &detector).1 > target_loss {
                    low = mid;
                } else {
                    high = mid;
                }
            }
            sigma_and_loss(1, a, 0.5 * (low + high), &detector)
        };
        let (deuteron_sigma, deuteron_loss) = matched(2);
        let (triton_sigma, triton_loss) = matched(3);
        assert!((deuteron_loss - target_loss).abs() < 1e-4);
        assert!((triton_loss - target_loss).abs() < 1e-4);
        assert!(
            proton_sigma > deuteron_sigma && deuteron_sigma > triton_sigma,
            "p {proton_sigma}, d {deuteron_sigma}, t {triton_sigma}"
        );
    }

    #[test]
    fn spread_gain_is_the_stopping_power_ratio_across_the_layer() {
        let si = lookup(14).unwrap();
        let transit = degrade(&proton(6.0), &silicon(130.0, ThicknessUnit::Micrometer), si).unwrap();
        let exit = transit.exit_energy().unwrap();
        let expected = mass_stopping(1, 1, exit, si) / mass_stopping(1, 1, 6.0, si);
        assert!(expected > 1.2);
        assert!((transit.spread_gain - expected).abs() < 1e-9);

        let stopped = degrade(&proton(5.0), &silicon(1000.0, ThicknessUnit::Micrometer), si).unwrap();
        assert_eq!(stopped.spread_gain, 0.0);
    }
}
