use crate::core::models::particle::Particle;
use crate::core::tables::elements::ElementRecord;

/// Avogadro's number divided by 1e21 (eV/1e15 atoms → MeV conversion folded in).
const AVOGADRO_E21: f64 = 0.602_214_076;
/// Lower bound of the proton high-energy regression, in keV/u.
const PROTON_REGRESSION_FLOOR: f64 = 25.0;
/// Lower bound of the helium effective-charge polynomial, in keV/u.
const HELIUM_REGRESSION_FLOOR: f64 = 1.0;
const HEAVY_ION_YR_MIN: f64 = 0.13;
const HEAVY_ION_VR_MIN: f64 = 1.0;
/// Bohr velocity in units where 25 keV/u corresponds to v = 1.
const BOHR_ENERGY_PER_NUCLEON: f64 = 25.0;

/// Electronic stopping cross-section of one projectile in one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoppingPower {
    /// Stopping cross-section in eV/(1e15 atoms/cm²).
    pub cross_section: f64,
    /// Set when the absorber has no usable density; the cross-section is then zero.
    pub degenerate: bool,
    atomic_weight: f64,
    atomic_density: f64,
}

impl StoppingPower {
    /// Stopping in MeV/(mg/cm²).
    pub fn per_areal_density(&self) -> f64 {
        if self.degenerate {
            return 0.0;
        }
        self.cross_section * AVOGADRO_E21 / self.atomic_weight
    }

    /// Stopping in MeV/µm.
    pub fn per_micrometer(&self) -> f64 {
        // 1e-21 MeV cm² × 1e22 atoms/cm³ × 1e-4 cm/µm
        self.cross_section * self.atomic_density * 1e-3
    }
}

pub fn stopping_power(projectile: &Particle, absorber: &ElementRecord) -> StoppingPower {
    let degenerate = absorber.is_degenerate();
    let cross_section = if degenerate {
        0.0
    } else {
        electronic_cross_section(
            projectile.z(),
            projectile.energy_per_nucleon_kev(),
            absorber,
        )
    };
    StoppingPower {
        cross_section,
        degenerate,
        atomic_weight: absorber.atomic_weight,
        atomic_density: absorber.atomic_density,
    }
}

/// Stopping in MeV/(mg/cm²) for a projectile of charge `z` at `energy` MeV and mass number `a`.
///
/// This is the hot path of the range integrator and skips building a [`Particle`].
#[inline]
pub(crate) fn mass_stopping(z: u32, a: u32, energy: f64, absorber: &ElementRecord) -> f64 {
    if energy <= 0.0 || absorber.is_degenerate() {
        return 0.0;
    }
    let e_per_u = energy * 1000.0 / f64::from(a);
    electronic_cross_section(z, e_per_u, absorber) * AVOGADRO_E21 / absorber.atomic_weight
}

/// Dispatches on the projectile charge, in eV/(1e15 atoms/cm²).
pub fn electronic_cross_section(z: u32, energy_per_nucleon_kev: f64, absorber: &ElementRecord) -> f64 {
    if !(energy_per_nucleon_kev > 0.0) {
        return 0.0;
    }
    match z {
        0 => 0.0,
        1 => proton_cross_section(energy_per_nucleon_kev, absorber),
        2 => helium_cross_section(energy_per_nucleon_kev, absorber),
        _ => heavy_ion_cross_section(f64::from(z), energy_per_nucleon_kev, absorber),
    }
}

/// Proton stopping from the eight-coefficient regression, `e` in keV/u.
pub fn proton_cross_section(e: f64, absorber: &ElementRecord) -> f64 {
    if e <= 0.0 {
        return 0.0;
    }
    let c = &absorber.proton_coefficients;
    let pe = e.max(PROTON_REGRESSION_FLOOR);
    let low = c[0] * pe.powf(c[1]) + c[2] * pe.powf(c[3]);
    let high = c[4] / pe.powf(c[5]) * (c[6] / pe + c[7] * pe).ln();
    let mut stopping = low * high / (low + high);
    if e < PROTON_REGRESSION_FLOOR {
        let velocity_power = if absorber.z <= 6 { 0.25 } else { 0.45 };
        stopping *= (e / PROTON_REGRESSION_FLOOR).powf(velocity_power);
    }
    stopping.max(0.0)
}

/// Helium stopping via the fractional effective charge of He ions.
pub fn helium_cross_section(e: f64, absorber: &ElementRecord) -> f64 {
    if e <= 0.0 {
        return 0.0;
    }
    let he = e.max(HELIUM_REGRESSION_FLOOR);
    let b = he.ln();
    let a = 0.2865 + b * (0.1266 + b * (-0.001429 + b * (0.02402 + b * (-0.01135 + b * 0.001475))));
    let mut charge_fraction = 1.0 - (-a.min(30.0)).exp();
    let shell = 7.6 - he.ln().max(0.0);
    charge_fraction *= 1.0 + (0.007 + 0.00005 * f64::from(absorber.z)) * (-shell * shell).exp();

    let mut stopping = proton_cross_section(he, absorber) * charge_fraction * 4.0;
    if e < HELIUM_REGRESSION_FLOOR {
        stopping *= (e / HELIUM_REGRESSION_FLOOR).sqrt();
    }
    stopping
}

/// Heavy-ion stopping with the Brandt-Kitagawa effective charge, `z1` ≥ 3.
pub fn heavy_ion_cross_section(z1: f64, e: f64, absorber: &ElementRecord) -> f64 {
    if e <= 0.0 {
        return 0.0;
    }
    let z2 = f64::from(absorber.z);
    let v_fermi = absorber.fermi_velocity;
    let z1_third = z1.cbrt();
    let z1_two_thirds = z1_third * z1_third;

    let v = (e / BOHR_ENERGY_PER_NUCLEON).sqrt() / v_fermi;
    let v_rel = if v >= 1.0 {
        v * v_fermi * (1.0 + 1.0 / (5.0 * v * v))
    } else {
        0.75 * v_fermi * (1.0 + 2.0 * v * v / 3.0 - v.powi(4) / 15.0)
    };
    let y_floor = HEAVY_ION_YR_MIN.max(HEAVY_ION_VR_MIN / z1_two_thirds);
    let y_rel = (v_rel / z1_two_thirds).max(y_floor);

    let a = -0.803 * y_rel.powf(0.3) + 1.3167 * y_rel.powf(0.6) + 0.38157 * y_rel
        + 0.008983 * y_rel * y_rel;
    let ionization = (1.0 - (-a.min(50.0)).exp()).clamp(0.0, 1.0);

    let b = (0.12 + 0.025 * z1).clamp(0.32, 0.43) / z1_third;
    let l0 = (0.8 - ionization * (0.6 + z1 / 30.0).min(1.2)) / z1_third;
    let q_mid = (0.9 - 0.025 * z1).max(0.0);
    let q_high = (1.0 - 0.025 * z1.min(16.0)).max(0.0);
    let l1 = if ionization < 0.2 {
        0.0
    } else if ionization < q_mid {
        b * (ionization - 0.2) / (q_mid - 0.2000001).abs()
    } else if ionization < q_high {
        b
    } else {
        b * (1.0 - ionization) / (0.025 * z1.min(16.0))
    };
    let screening = l1.max(l0 * absorber.screening_factor);

    let mut zeta = ionization
        + (1.0 / (2.0 * v_fermi * v_fermi))
            * (1.0 - ionization)
            * (1.0 + (4.0 * screening * v_fermi / 1.919).powi(2)).ln();
    let shell = 7.6 - e.ln().max(0.0);
    zeta *= 1.0 + (0.18 + 0.0015 * z2) * (-shell * shell).exp() / (z1 * z1);
    let effective_charge_sq = (zeta * z1).powi(2);

    if v_rel / z1_two_thirds > y_floor {
        return proton_cross_section(e, absorber) * effective_charge_sq;
    }

    // Below the minimum relative velocity the stopping follows a power law in velocity.
    let vr_min = HEAVY_ION_VR_MIN.max(HEAVY_ION_YR_MIN * z1_two_thirds);
    let v_min = 0.5 * (vr_min + (vr_min * vr_min - 0.8 * v_fermi * v_fermi).max(0.0).sqrt());
    let e_min = BOHR_ENERGY_PER_NUCLEON * v_min * v_min;
    let power = if absorber.z == 6 || ((absorber.z == 14 || absorber.z == 32) && z1 <= 19.0) {
        0.375
    } else {
        0.5
    };
    proton_cross_section(e_min, absorber) * effective_charge_sq * (e / e_min).powf(power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::elements::{MAX_Z, MIN_Z, lookup};

    fn particle(z: u32, a: u32, energy: f64) -> Particle {
        Particle::new(z, a, energy).unwrap()
    }

    #[test]
    fn proton_in_silicon_at_one_mev_matches_tabulated_value() {
        let si = lookup(14).unwrap();
        let s = stopping_power(&particle(1, 1, 1.0), si);
        // ~177 MeV cm²/g
        assert!((s.per_areal_density() - 0.177).abs() < 0.005, "{}", s.per_areal_density());
        assert!((s.per_micrometer() - 0.0412).abs() < 0.001);
    }

    #[test]
    fn deuteron_stops_like_a_proton_of_the_same_velocity() {
        let si = lookup(14).unwrap();
        let p = stopping_power(&particle(1, 1, 2.0), si).cross_section;
        let d = stopping_power(&particle(1, 2, 4.0), si).cross_section;
        assert!((p - d).abs() < 1e-12);
    }

    #[test]
    fn alpha_stopping_approaches_four_times_proton_at_high_velocity() {
        let si = lookup(14).unwrap();
        let p = stopping_power(&particle(1, 1, 10.0), si).cross_section;
        let alpha = stopping_power(&particle(2, 4, 40.0), si).cross_section;
        let ratio = alpha / p;
        assert!(ratio > 3.8 && ratio <= 4.1, "ratio = {ratio}");
    }

    #[test]
    fn heavy_ion_effective_charge_is_below_bare_charge() {
        let si = lookup(14).unwrap();
        let p = proton_cross_section(500.0, si);
        let carbon = heavy_ion_cross_section(6.0, 500.0, si);
        assert!(carbon > p);
        assert!(carbon < 36.0 * p);
    }

    #[test]
    fn stopping_is_non_negative_and_finite_for_every_absorber() {
        let energies = [1e-4, 0.01, 0.1, 1.0, 10.0, 100.0];
        for z2 in MIN_Z..=MAX_Z {
            let absorber = lookup(z2).unwrap();
            for (z1, a1) in [(1, 1), (1, 2), (2, 3), (2, 4), (3, 7), (6, 12), (14, 28)] {
                for energy in energies {
                    let s = stopping_power(&particle(z1, a1, energy), absorber);
                    assert!(
                        s.cross_section.is_finite() && s.cross_section >= 0.0,
                        "Z1={z1} Z2={z2} E={energy}: {}",
                        s.cross_section
                    );
                    if !absorber.is_degenerate() {
                        assert!(s.cross_section > 0.0, "Z1={z1} Z2={z2} E={energy}");
                    }
                }
            }
        }
    }

    #[test]
    fn stopping_is_exactly_zero_without_kinetic_energy() {
        let si = lookup(14).unwrap();
        for (z, a) in [(1, 1), (2, 4), (8, 16)] {
            assert_eq!(stopping_power(&particle(z, a, 0.0), si).cross_section, 0.0);
        }
        assert_eq!(electronic_cross_section(1, -5.0, si), 0.0);
    }

    #[test]
    fn degenerate_absorber_reports_zero_and_flags_it() {
        let tc = lookup(43).unwrap();
        let s = stopping_power(&particle(1, 1, 5.0), tc);
        assert!(s.degenerate);
        assert_eq!(s.cross_section, 0.0);
        assert_eq!(s.per_areal_density(), 0.0);
        assert_eq!(mass_stopping(1, 1, 5.0, tc), 0.0);
    }

    #[test]
    fn low_energy_branch_is_continuous_at_the_regression_floor() {
        let si = lookup(14).unwrap();
        let below = proton_cross_section(PROTON_REGRESSION_FLOOR - 1e-9, si);
        let at = proton_cross_section(PROTON_REGRESSION_FLOOR, si);
        assert!((below - at).abs() / at < 1e-6);
    }
}
