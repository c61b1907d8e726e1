//! Detection-curve fitting and sweep-width integration.
//!
//! The two-parameter model `P(x) = b·exp(−k·x²)` is fitted to empirical
//! (offset, probability) samples per category and per (category, field),
//! then integrated over a wide symmetric range to a scalar sweep width.

mod integrate;
mod solver;

pub use solver::{fit_detection_curve, CurveFit, FitError, FitOptions};

use serde::Serialize;

/// Detection-probability model `P(x) = b·exp(−k·x²)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DetectionCurve {
    /// Peak detection probability on the transect line (`b`).
    pub amplitude: f64,
    /// Falloff rate with squared offset (`k`).
    pub decay: f64,
}

impl DetectionCurve {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.amplitude * (-self.decay * x * x).exp()
    }

    /// Sweep width: the integral of the curve over `±half_range`.
    ///
    /// The fitted curve decays to zero well inside the bounds, so this
    /// approximates the full-line integral.
    pub fn sweep_width(&self, half_range: f64, intervals: usize) -> f64 {
        integrate::simpson(|x| self.evaluate(x), -half_range, half_range, intervals)
    }
}

/// Why a weighted-average width could not be produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WidthAverageError {
    /// The total instance count across all fitted categories is zero.
    NoInstances,
}

impl std::fmt::Display for WidthAverageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidthAverageError::NoInstances => {
                write!(f, "no artifact instances to weight widths by")
            }
        }
    }
}

impl std::error::Error for WidthAverageError {}

/// Artifact-count-weighted average of per-category widths.
pub fn weighted_average_width<I>(entries: I) -> Result<f64, WidthAverageError>
where
    I: IntoIterator<Item = (f64, u64)>,
{
    let mut numerator = 0.0;
    let mut total: u64 = 0;
    for (width, count) in entries {
        numerator += width * count as f64;
        total += count;
    }
    if total == 0 {
        return Err(WidthAverageError::NoInstances);
    }
    Ok(numerator / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn sweep_width_matches_gaussian_closed_form() {
        let curve = DetectionCurve {
            amplitude: 0.6,
            decay: 0.02,
        };
        let width = curve.sweep_width(100.0, 4000);
        let closed_form = 0.6 * (std::f64::consts::PI / 0.02).sqrt();
        assert!(
            approx_eq(width, closed_form, 1e-6),
            "width {width} vs closed form {closed_form}"
        );
    }

    #[test]
    fn flat_curve_integrates_to_range_times_amplitude() {
        let curve = DetectionCurve {
            amplitude: 0.5,
            decay: 0.0,
        };
        assert!(approx_eq(curve.sweep_width(100.0, 4000), 100.0, 1e-9));
    }

    #[test]
    fn weighted_average_weights_by_instance_count() {
        let avg = weighted_average_width([(10.0, 3), (20.0, 1)]).unwrap();
        assert!(approx_eq(avg, 12.5, 1e-12));
    }

    #[test]
    fn zero_total_count_is_an_explicit_error() {
        assert_eq!(
            weighted_average_width(std::iter::empty::<(f64, u64)>()),
            Err(WidthAverageError::NoInstances)
        );
        assert_eq!(
            weighted_average_width([(10.0, 0)]),
            Err(WidthAverageError::NoInstances)
        );
    }
}
