#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod estimator;
pub mod fit;
pub mod registry;
pub mod report;

// Pipeline stages – public for tools and tests, considered internals.
pub mod matching;
pub mod probability;
pub mod resolve;
pub mod tally;

// I/O collaborators around the core.
pub mod config;
pub mod io;

// --- High-level re-exports -------------------------------------------------

// Main entry points: estimator + report.
pub use crate::estimator::{SurveyError, SweepEstimator, SweepParams};
pub use crate::report::SurveyReport;

// Curve model shared by report consumers.
pub use crate::fit::DetectionCurve;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```
/// use sweep_width::prelude::*;
///
/// let estimator = SweepEstimator::new(SweepParams::default());
/// let master = vec![MasterRecord {
///     category: "flake".to_string(),
///     super_category: "lithic".to_string(),
///     field: "meadow".to_string(),
///     segment: 1,
///     row: 1,
///     offset: 2.0,
///     left_side: false,
///     segment_count: 1,
/// }];
/// let walks = vec![Traversal {
///     field_label: "meadow".to_string(),
///     transect_length: 20,
///     sightings: vec![Sighting {
///         category: "flake".to_string(),
///         segment: 1,
///         row: 1,
///         offset: 2.0,
///         direction: None,
///     }],
/// }];
///
/// // A single offset cannot support a two-parameter fit, so the run
/// // reports that no width could be produced.
/// assert!(estimator.process(&master, &walks).is_err());
/// ```
pub mod prelude {
    pub use crate::registry::{MasterRecord, Registry, WalkCounter};
    pub use crate::resolve::{Sighting, Traversal};
    pub use crate::{SurveyError, SurveyReport, SweepEstimator, SweepParams};
}
