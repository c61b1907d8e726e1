//! Damped least-squares fit of the detection curve.
//!
//! A Levenberg–Marquardt loop over the two parameters, solving the 2×2
//! damped normal equations directly. Both parameters are kept inside
//! `[0, 1]` by projecting each candidate step back into the box.

use log::debug;
use nalgebra::{Matrix2, Vector2};
use serde::Serialize;

use super::DetectionCurve;

const PARAM_MIN: f64 = 0.0;
const PARAM_MAX: f64 = 1.0;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e12;
const GRAD_TOL: f64 = 1e-10;
const STEP_TOL: f64 = 1e-12;
const COST_TOL: f64 = 1e-14;

/// Minimum number of distinct offsets required for a two-parameter fit.
const MIN_DISTINCT_OFFSETS: usize = 2;

/// Tuning knobs for the curve fit.
#[derive(Clone, Copy, Debug)]
pub struct FitOptions {
    pub initial_amplitude: f64,
    pub initial_decay: f64,
    pub max_iterations: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            initial_amplitude: 0.63,
            initial_decay: 0.01,
            max_iterations: 200,
        }
    }
}

/// Reasons why a fit is skipped for one category/field key.
#[derive(Clone, Debug, PartialEq)]
pub enum FitError {
    /// Fewer distinct offsets than fittable parameters.
    DegenerateSamples { distinct: usize, minimum: usize },
    /// The iteration budget ran out while the fit was still improving.
    DidNotConverge { iterations: usize },
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::DegenerateSamples { distinct, minimum } => {
                write!(f, "degenerate sample set ({distinct} distinct offsets, need ≥{minimum})")
            }
            FitError::DidNotConverge { iterations } => {
                write!(f, "fit did not converge within {iterations} iterations")
            }
        }
    }
}

impl std::error::Error for FitError {}

/// A converged fit with parameter variance estimates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurveFit {
    pub curve: DetectionCurve,
    /// Variance of the amplitude estimate, from the diagonal of
    /// `(JᵀJ)⁻¹·s²`. Infinite when the normal equations are singular at
    /// the solution.
    pub amplitude_variance: f64,
    /// Variance of the decay estimate.
    pub decay_variance: f64,
    pub residual_sum_squares: f64,
    pub iterations: usize,
}

/// Fit `P(x) = b·exp(−k·x²)` to (offset, probability) samples.
///
/// Samples are sorted by offset before fitting so the result is
/// deterministic regardless of input order.
pub fn fit_detection_curve(
    samples: &[(f64, f64)],
    options: &FitOptions,
) -> Result<CurveFit, FitError> {
    let mut samples: Vec<(f64, f64)> = samples.to_vec();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));

    let distinct = count_distinct_offsets(&samples);
    if distinct < MIN_DISTINCT_OFFSETS {
        return Err(FitError::DegenerateSamples {
            distinct,
            minimum: MIN_DISTINCT_OFFSETS,
        });
    }

    let mut params = clamp_params(Vector2::new(options.initial_amplitude, options.initial_decay));
    let mut cost = sum_squared_residuals(&samples, &params);
    let mut lambda = LAMBDA_INIT;
    let mut converged = false;
    let mut iterations = 0;

    for iteration in 1..=options.max_iterations {
        iterations = iteration;
        let (jtj, jtr) = normal_equations(&samples, &params);

        if projected_gradient_norm(&params, &jtr) < GRAD_TOL {
            converged = true;
            break;
        }

        let mut stepped = false;
        while lambda <= LAMBDA_MAX {
            let mut damped = jtj;
            damped[(0, 0)] += lambda * jtj[(0, 0)].max(LAMBDA_MIN);
            damped[(1, 1)] += lambda * jtj[(1, 1)].max(LAMBDA_MIN);
            let Some(inverse) = damped.try_inverse() else {
                lambda *= 10.0;
                continue;
            };
            let delta = -(inverse * jtr);
            let candidate = clamp_params(params + delta);
            let candidate_cost = sum_squared_residuals(&samples, &candidate);
            if candidate_cost <= cost {
                let improvement = cost - candidate_cost;
                let step_norm = (candidate - params).norm();
                params = candidate;
                cost = candidate_cost;
                lambda = (lambda * 0.5).max(LAMBDA_MIN);
                stepped = true;
                if improvement <= COST_TOL * cost.max(COST_TOL) || step_norm < STEP_TOL {
                    converged = true;
                }
                break;
            }
            lambda *= 10.0;
        }

        if !stepped {
            // No damping level improves the cost: the iterate is a local
            // minimum, typically pinned at a box bound.
            converged = true;
            break;
        }
        if converged {
            break;
        }
    }

    if !converged {
        return Err(FitError::DidNotConverge { iterations });
    }

    let (amplitude_variance, decay_variance) = parameter_variances(&samples, &params, cost);
    debug!(
        "curve fit converged in {iterations} iterations: b={:.4} k={:.4} ssr={cost:.3e}",
        params[0], params[1]
    );

    Ok(CurveFit {
        curve: DetectionCurve {
            amplitude: params[0],
            decay: params[1],
        },
        amplitude_variance,
        decay_variance,
        residual_sum_squares: cost,
        iterations,
    })
}

fn count_distinct_offsets(sorted: &[(f64, f64)]) -> usize {
    let mut distinct = 0;
    let mut previous: Option<f64> = None;
    for &(x, _) in sorted {
        if previous.map_or(true, |p| p.total_cmp(&x).is_ne()) {
            distinct += 1;
        }
        previous = Some(x);
    }
    distinct
}

fn clamp_params(params: Vector2<f64>) -> Vector2<f64> {
    Vector2::new(
        params[0].clamp(PARAM_MIN, PARAM_MAX),
        params[1].clamp(PARAM_MIN, PARAM_MAX),
    )
}

fn sum_squared_residuals(samples: &[(f64, f64)], params: &Vector2<f64>) -> f64 {
    let (b, k) = (params[0], params[1]);
    samples
        .iter()
        .map(|&(x, p)| {
            let r = b * (-k * x * x).exp() - p;
            r * r
        })
        .sum()
}

/// Accumulate `JᵀJ` and `Jᵀr` for the residuals `b·exp(−k·x²) − p`.
fn normal_equations(samples: &[(f64, f64)], params: &Vector2<f64>) -> (Matrix2<f64>, Vector2<f64>) {
    let (b, k) = (params[0], params[1]);
    let mut jtj = Matrix2::zeros();
    let mut jtr = Vector2::zeros();
    for &(x, p) in samples {
        let e = (-k * x * x).exp();
        let r = b * e - p;
        let db = e;
        let dk = -b * x * x * e;
        jtj[(0, 0)] += db * db;
        jtj[(0, 1)] += db * dk;
        jtj[(1, 0)] += db * dk;
        jtj[(1, 1)] += dk * dk;
        jtr[0] += db * r;
        jtr[1] += dk * r;
    }
    (jtj, jtr)
}

/// Max-norm of the gradient with bound-blocked components zeroed: at a
/// bound, a component pushing further outside the box is not a descent
/// direction.
fn projected_gradient_norm(params: &Vector2<f64>, gradient: &Vector2<f64>) -> f64 {
    let mut norm: f64 = 0.0;
    for i in 0..2 {
        let g = gradient[i];
        let blocked_low = params[i] <= PARAM_MIN && g > 0.0;
        let blocked_high = params[i] >= PARAM_MAX && g < 0.0;
        if !(blocked_low || blocked_high) {
            norm = norm.max(g.abs());
        }
    }
    norm
}

/// Diagonal of `(JᵀJ)⁻¹·s²` with `s² = SSR/(n−2)` (zero when `n ≤ 2`).
fn parameter_variances(samples: &[(f64, f64)], params: &Vector2<f64>, ssr: f64) -> (f64, f64) {
    let n = samples.len();
    let variance_scale = if n > 2 { ssr / (n - 2) as f64 } else { 0.0 };
    let (jtj, _) = normal_equations(samples, params);
    match jtj.try_inverse() {
        Some(inverse) => (
            inverse[(0, 0)] * variance_scale,
            inverse[(1, 1)] * variance_scale,
        ),
        None => (f64::INFINITY, f64::INFINITY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn gaussian_samples(b: f64, k: f64, offsets: &[f64]) -> Vec<(f64, f64)> {
        offsets
            .iter()
            .map(|&x| (x, b * (-k * x * x).exp()))
            .collect()
    }

    #[test]
    fn recovers_noiseless_gaussian_parameters() {
        let offsets: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        let samples = gaussian_samples(0.6, 0.02, &offsets);

        let fit = fit_detection_curve(&samples, &FitOptions::default()).unwrap();
        assert!(
            approx_eq(fit.curve.amplitude, 0.6, 1e-6),
            "amplitude {}",
            fit.curve.amplitude
        );
        assert!(
            approx_eq(fit.curve.decay, 0.02, 1e-6),
            "decay {}",
            fit.curve.decay
        );
        assert!(fit.residual_sum_squares < 1e-12);
        // Noiseless data leaves essentially no residual variance.
        assert!(fit.amplitude_variance < 1e-9);
        assert!(fit.decay_variance < 1e-9);
    }

    #[test]
    fn fit_is_order_independent() {
        let samples = gaussian_samples(0.5, 0.05, &[9.0, 2.0, 6.0, 1.0, 4.0]);
        let mut reversed = samples.clone();
        reversed.reverse();

        let a = fit_detection_curve(&samples, &FitOptions::default()).unwrap();
        let b = fit_detection_curve(&reversed, &FitOptions::default()).unwrap();
        assert!(approx_eq(a.curve.amplitude, b.curve.amplitude, 1e-12));
        assert!(approx_eq(a.curve.decay, b.curve.decay, 1e-12));
    }

    #[test]
    fn parameters_stay_inside_the_unit_box() {
        // Samples pulling the amplitude above 1 and the decay below 0.
        let samples = vec![(1.0, 1.0), (5.0, 1.0), (10.0, 1.0)];
        let fit = fit_detection_curve(&samples, &FitOptions::default()).unwrap();
        assert!(fit.curve.amplitude <= 1.0 + 1e-12);
        assert!(fit.curve.decay >= -1e-12);
        // The best boxed fit of constant-one data is b=1, k=0.
        assert!(approx_eq(fit.curve.amplitude, 1.0, 1e-6));
        assert!(approx_eq(fit.curve.decay, 0.0, 1e-6));
    }

    #[test]
    fn fewer_than_two_distinct_offsets_is_degenerate() {
        let err = fit_detection_curve(&[(3.0, 0.5), (3.0, 0.6)], &FitOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            FitError::DegenerateSamples {
                distinct: 1,
                minimum: 2
            }
        );

        let err = fit_detection_curve(&[], &FitOptions::default()).unwrap_err();
        assert!(matches!(err, FitError::DegenerateSamples { distinct: 0, .. }));
    }

    #[test]
    fn exhausted_iteration_budget_is_reported() {
        let offsets: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        let samples = gaussian_samples(0.6, 0.02, &offsets);
        let options = FitOptions {
            max_iterations: 1,
            ..FitOptions::default()
        };
        assert_eq!(
            fit_detection_curve(&samples, &options),
            Err(FitError::DidNotConverge { iterations: 1 })
        );
    }
}
