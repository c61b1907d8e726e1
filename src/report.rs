//! Serializable survey outputs consumed by the reporting collaborators.

use serde::Serialize;

use crate::probability::ProbabilityTables;
use crate::registry::ArtifactInstance;

/// Per-instance found summary line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FoundRecord {
    /// Fine-grained artifact type.
    pub category: String,
    pub field: String,
    pub segment: i64,
    pub row: i64,
    /// Stored (signed) lateral offset.
    pub offset: f64,
    pub found_count: u32,
}

impl From<&ArtifactInstance> for FoundRecord {
    fn from(instance: &ArtifactInstance) -> Self {
        Self {
            category: instance.category.clone(),
            field: instance.field.clone(),
            segment: instance.segment,
            row: instance.row,
            offset: instance.offset,
            found_count: instance.found_count(),
        }
    }
}

/// Completed-traversal count for one field.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WalkRecord {
    pub field: String,
    pub walk_count: u32,
}

/// Fitted detection curve and sweep width for one category/field key.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FitRecord {
    /// Super-category the fit belongs to.
    pub category: String,
    /// Field the fit is restricted to; `None` pools all fields.
    pub field: Option<String>,
    pub amplitude: f64,
    pub amplitude_variance: f64,
    pub decay: f64,
    pub decay_variance: f64,
    /// Integral of the fitted curve over the configured range.
    pub width: f64,
}

/// A category/field key whose fit was skipped, with the reason.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedFit {
    pub category: String,
    pub field: Option<String>,
    pub reason: String,
}

/// Full output of one survey run.
#[derive(Clone, Debug, Serialize)]
pub struct SurveyReport {
    pub found: Vec<FoundRecord>,
    pub walk_counts: Vec<WalkRecord>,
    pub probabilities: ProbabilityTables,
    pub fits: Vec<FitRecord>,
    pub skipped_fits: Vec<SkippedFit>,
    /// Artifact-count-weighted average of the pooled per-category widths.
    pub weighted_average_width: f64,
}

impl SurveyReport {
    /// Pooled fit records only (`field == None`), in category order.
    pub fn pooled_fits(&self) -> impl Iterator<Item = &FitRecord> {
        self.fits.iter().filter(|fit| fit.field.is_none())
    }
}
