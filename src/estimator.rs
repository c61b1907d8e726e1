//! End-to-end sweep-width estimation for one survey location.

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::fit::{self, fit_detection_curve, FitOptions};
use crate::probability;
use crate::registry::{MasterRecord, Registry, WalkCounter};
use crate::report::{FitRecord, FoundRecord, SkippedFit, SurveyReport, WalkRecord};
use crate::resolve::{process_traversal, Traversal};
use crate::tally::TallyTable;

/// Pipeline tuning knobs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepParams {
    /// Initial guess for the curve amplitude.
    pub initial_amplitude: f64,
    /// Initial guess for the curve decay rate.
    pub initial_decay: f64,
    pub max_fit_iterations: usize,
    /// Half-width of the symmetric integration range for sweep widths.
    pub integration_half_range: f64,
    pub integration_intervals: usize,
}

impl Default for SweepParams {
    fn default() -> Self {
        let fit = FitOptions::default();
        Self {
            initial_amplitude: fit.initial_amplitude,
            initial_decay: fit.initial_decay,
            max_fit_iterations: fit.max_iterations,
            integration_half_range: 100.0,
            integration_intervals: 4000,
        }
    }
}

impl SweepParams {
    fn fit_options(&self) -> FitOptions {
        FitOptions {
            initial_amplitude: self.initial_amplitude,
            initial_decay: self.initial_decay,
            max_iterations: self.max_fit_iterations,
        }
    }
}

/// Terminal failures of a survey run. Per-record and per-fit problems are
/// handled locally and never surface here.
#[derive(Clone, Debug, PartialEq)]
pub enum SurveyError {
    /// No ground-truth records were registered.
    NoArtifacts,
    /// No category produced a fitted width, so the weighted average is
    /// undefined.
    NoFittedWidths,
}

impl std::fmt::Display for SurveyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurveyError::NoArtifacts => write!(f, "no ground-truth artifact records"),
            SurveyError::NoFittedWidths => {
                write!(f, "no category produced a fitted width, weighted average undefined")
            }
        }
    }
}

impl std::error::Error for SurveyError {}

/// One-shot batch estimator: registry → matching → tallies →
/// probabilities → curve fits → weighted average.
#[derive(Clone, Debug, Default)]
pub struct SweepEstimator {
    params: SweepParams,
}

impl SweepEstimator {
    pub fn new(params: SweepParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SweepParams {
        &self.params
    }

    /// Run the full pipeline over one survey's master records and
    /// traversal logs.
    pub fn process(
        &self,
        master: &[MasterRecord],
        traversals: &[Traversal],
    ) -> Result<SurveyReport, SurveyError> {
        let mut registry = Registry::new();
        let mut walks = WalkCounter::default();
        for record in master {
            registry.register(record, &mut walks);
        }
        if registry.is_empty() {
            return Err(SurveyError::NoArtifacts);
        }
        debug!(
            "registered {} instances across {} traversals",
            registry.len(),
            traversals.len()
        );

        for traversal in traversals {
            process_traversal(&mut registry, &mut walks, traversal);
        }

        let tallies = TallyTable::build(&registry, &walks);
        let probabilities = probability::estimate(&tallies);

        let options = self.params.fit_options();
        let mut fits = Vec::new();
        let mut skipped_fits = Vec::new();
        let mut category_widths: BTreeMap<String, f64> = BTreeMap::new();

        for (category, samples) in probabilities.pooled_by_category() {
            match fit_detection_curve(&samples, &options) {
                Ok(fit) => {
                    let width = fit
                        .curve
                        .sweep_width(self.params.integration_half_range, self.params.integration_intervals);
                    category_widths.insert(category.to_string(), width);
                    fits.push(fit_record(category, None, &fit, width));
                }
                Err(err) => {
                    warn!("fit skipped for category {category:?}: {err}");
                    skipped_fits.push(SkippedFit {
                        category: category.to_string(),
                        field: None,
                        reason: err.to_string(),
                    });
                }
            }
        }

        for ((category, field), samples) in probabilities.by_category_field() {
            match fit_detection_curve(&samples, &options) {
                Ok(fit) => {
                    let width = fit
                        .curve
                        .sweep_width(self.params.integration_half_range, self.params.integration_intervals);
                    fits.push(fit_record(category, Some(field), &fit, width));
                }
                Err(err) => {
                    warn!("fit skipped for category {category:?} field {field:?}: {err}");
                    skipped_fits.push(SkippedFit {
                        category: category.to_string(),
                        field: Some(field.to_string()),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let weighted_average_width = fit::weighted_average_width(
            category_widths
                .iter()
                .map(|(category, &width)| (width, u64::from(registry.instance_count(category)))),
        )
        .map_err(|_| SurveyError::NoFittedWidths)?;

        Ok(SurveyReport {
            found: registry.instances().map(FoundRecord::from).collect(),
            walk_counts: walks
                .iter()
                .map(|(field, walk_count)| WalkRecord {
                    field: field.to_string(),
                    walk_count,
                })
                .collect(),
            probabilities,
            fits,
            skipped_fits,
            weighted_average_width,
        })
    }
}

fn fit_record(
    category: &str,
    field: Option<&str>,
    fit: &crate::fit::CurveFit,
    width: f64,
) -> FitRecord {
    FitRecord {
        category: category.to_string(),
        field: field.map(str::to_string),
        amplitude: fit.curve.amplitude,
        amplitude_variance: fit.amplitude_variance,
        decay: fit.curve.decay,
        decay_variance: fit.decay_variance,
        width,
    }
}
