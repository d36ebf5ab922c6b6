use crate::core::tables::elements::ElementRecord;

/// 4π e⁴ in MeV² cm², with e² = 1.439964e-13 MeV cm.
const BOHR_PREFACTOR: f64 = 2.6058e-25;
const AVOGADRO: f64 = 6.022_140_76e23;
/// Kinetic energy per nucleon (keV/u) of a particle moving at the Bohr velocity.
const BOHR_VELOCITY_KEV_PER_U: f64 = 24.8;
/// Above this reduced energy the Bohr limit applies unchanged.
const LINDHARD_SCHARFF_LIMIT: f64 = 3.0;

/// Bohr energy-loss straggling variance in MeV² for `areal_density` mg/cm².
///
/// This is the high-velocity limit: it grows with the square of the projectile
/// charge and linearly with the number of target electrons crossed.
pub fn bohr_variance(z_projectile: u32, absorber: &ElementRecord, areal_density: f64) -> f64 {
    if absorber.is_degenerate() || !(areal_density > 0.0) || !areal_density.is_finite() {
        return 0.0;
    }
    let atoms_per_cm2 = areal_density * 1e-3 * AVOGADRO / absorber.atomic_weight;
    let z1 = f64::from(z_projectile);
    BOHR_PREFACTOR * z1 * z1 * f64::from(absorber.z) * atoms_per_cm2
}

/// Lindhard–Scharff reduction of the Bohr variance for slow projectiles.
///
/// `energy_per_nucleon` is in MeV/u. The factor rises from zero at rest to one
/// once the projectile is a few times faster than the absorber's electrons.
pub fn lindhard_scharff_factor(energy_per_nucleon: f64, absorber_z: u32) -> f64 {
    if !(energy_per_nucleon > 0.0) || absorber_z == 0 {
        return 0.0;
    }
    let chi = energy_per_nucleon * 1000.0 / BOHR_VELOCITY_KEV_PER_U / f64::from(absorber_z);
    if chi >= LINDHARD_SCHARFF_LIMIT {
        return 1.0;
    }
    let l = 1.36 * chi.sqrt() - 0.016 * chi.powf(1.5);
    (0.5 * l).clamp(0.0, 1.0)
}

/// Straggling variance (MeV²) added by a thin slice of `areal_density` mg/cm²
/// crossed at `energy` MeV by a projectile of charge `z` and mass number `a`.
///
/// At equal energy a heavier projectile is slower, so it straggles less.
pub fn slice_variance(
    z: u32,
    a: u32,
    energy: f64,
    absorber: &ElementRecord,
    areal_density: f64,
) -> f64 {
    if a == 0 {
        return 0.0;
    }
    bohr_variance(z, absorber, areal_density)
        * lindhard_scharff_factor(energy / f64::from(a), absorber.z)
}

/// Square root of the summed variances.
pub fn in_quadrature<I: IntoIterator<Item = f64>>(variances: I) -> f64 {
    variances.into_iter().sum::<f64>().max(0.0).sqrt()
}
