use nalgebra::{Matrix3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    #[error("A quadratic fit needs at least 3 points, got {0}")]
    TooFewPoints(usize),
    #[error("Fit points do not determine a quadratic (singular normal matrix)")]
    Singular,
}

/// Locus coefficients `Ex = c0 + c1·e + c2·e²`, with `e = E + dE` in MeV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFit {
    pub coefficients: [f64; 3],
    /// Root-mean-square residual of the fitted excitation energies, MeV.
    pub rms_residual: f64,
    pub points: usize,
}

impl CurveFit {
    pub fn excitation(&self, total_energy: f64) -> f64 {
        let [c0, c1, c2] = self.coefficients;
        c0 + total_energy * (c1 + total_energy * c2)
    }

    /// dEx/de at the given total deposited energy.
    pub fn slope(&self, total_energy: f64) -> f64 {
        let [_, c1, c2] = self.coefficients;
        c1 + 2.0 * c2 * total_energy
    }
}

/// Least-squares quadratic through `(e, Ex)` pairs.
///
/// The abscissa is centred and scaled before solving the normal equations, so
/// the conditioning does not degrade with large deposited energies.
pub fn fit_quadratic(points: &[(f64, f64)]) -> Result<CurveFit, FitError> {
    let n = points.len();
    if n < 3 {
        return Err(FitError::TooFewPoints(n));
    }

    let mean = points.iter().map(|(e, _)| e).sum::<f64>() / n as f64;
    let spread = points
        .iter()
        .map(|(e, _)| (e - mean).abs())
        .fold(0.0_f64, f64::max);
    if spread <= 0.0 {
        return Err(FitError::Singular);
    }

    let mut normal = Matrix3::<f64>::zeros();
    let mut rhs = Vector3::<f64>::zeros();
    for &(e, ex) in points {
        let u = (e - mean) / spread;
        let basis = Vector3::new(1.0, u, u * u);
        normal += basis * basis.transpose();
        rhs += basis * ex;
    }
    let scaled = normal
        .cholesky()
        .ok_or(FitError::Singular)?
        .solve(&rhs);

    // Ex = a0 + a1·u + a2·u² with u = (e - m)/s, expanded back in powers of e.
    let (a0, a1, a2) = (scaled[0], scaled[1], scaled[2]);
    let c2 = a2 / (spread * spread);
    let c1 = a1 / spread - 2.0 * a2 * mean / (spread * spread);
    let c0 = a0 - a1 * mean / spread + a2 * mean * mean / (spread * spread);

    let fit = CurveFit {
        coefficients: [c0, c1, c2],
        rms_residual: 0.0,
        points: n,
    };
    let sum_sq: f64 = points
        .iter()
        .map(|&(e, ex)| (fit.excitation(e) - ex).powi(2))
        .sum();
    Ok(CurveFit {
        rms_residual: (sum_sq / n as f64).sqrt(),
        ..fit
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-8;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn exact_quadratic_is_recovered() {
        let points: Vec<(f64, f64)> = (0..20)
            .map(|i| {
                let e = 2.0 + i as f64 * 0.7;
                (e, 15.3 - 1.02 * e + 0.004 * e * e)
            })
            .collect();
        let fit = fit_quadratic(&points).unwrap();
        assert!(f64_approx_equal(fit.coefficients[0], 15.3));
        assert!(f64_approx_equal(fit.coefficients[1], -1.02));
        assert!(f64_approx_equal(fit.coefficients[2], 0.004));
        assert!(fit.rms_residual < 1e-10);
        assert_eq!(fit.points, 20);
    }

    #[test]
    fn slope_is_derivative_of_the_locus() {
        let fit = CurveFit {
            coefficients: [1.0, 2.0, 3.0],
            rms_residual: 0.0,
            points: 3,
        };
        assert!(f64_approx_equal(fit.excitation(2.0), 17.0));
        assert!(f64_approx_equal(fit.slope(2.0), 14.0));
    }

    #[test]
    fn fewer_than_three_points_are_rejected() {
        assert_eq!(
            fit_quadratic(&[(1.0, 2.0), (2.0, 3.0)]),
            Err(FitError::TooFewPoints(2))
        );
    }

    #[test]
    fn coincident_abscissae_are_singular() {
        let points = [(4.0, 1.0), (4.0, 2.0), (4.0, 3.0)];
        assert_eq!(fit_quadratic(&points), Err(FitError::Singular));
    }

    #[test]
    fn two_distinct_abscissae_are_singular() {
        let points = [(1.0, 1.0), (1.0, 1.5), (3.0, 2.0), (3.0, 2.5)];
        assert_eq!(fit_quadratic(&points), Err(FitError::Singular));
    }
}
