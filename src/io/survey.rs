//! Survey-directory orchestration: locate inputs, run the pipeline,
//! write reports.
//!
//! A survey directory holds one master file (`master*.csv`,
//! case-insensitive) and any number of calibration-record logs.
//! Independent directories share no mutable state, so a batch of them is
//! processed in parallel.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;

use crate::estimator::SweepEstimator;
use crate::io::{field_log, master, report};
use crate::report::SurveyReport;
use crate::resolve::Traversal;

/// Located input files for one survey directory.
#[derive(Clone, Debug)]
pub struct SurveyInputs {
    pub master: PathBuf,
    pub logs: Vec<PathBuf>,
}

/// Find the master file and observation logs in a survey directory.
pub fn find_survey_inputs(dir: &Path) -> Result<SurveyInputs, String> {
    let entries = fs::read_dir(dir).map_err(|e| format!("Failed to read {}: {e}", dir.display()))?;

    let mut master_path = None;
    let mut logs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read {}: {e}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !name.ends_with(".csv") {
            continue;
        }
        if name.starts_with("master") {
            master_path.get_or_insert(path);
        } else if name.contains("calibration") && name.contains("records") {
            logs.push(path);
        }
    }

    let master = master_path
        .ok_or_else(|| format!("No master file found in {}", dir.display()))?;
    // Deterministic log order; tallying is commutative per traversal, but
    // stable output ordering helps diffing reports.
    logs.sort();
    Ok(SurveyInputs { master, logs })
}

/// Run the full pipeline over one survey directory.
pub fn run_survey_dir(dir: &Path, estimator: &SweepEstimator) -> Result<SurveyReport, String> {
    let inputs = find_survey_inputs(dir)?;
    let records = master::read_master_file(&inputs.master)?;
    debug!(
        "{}: {} master records, {} log file(s)",
        dir.display(),
        records.len(),
        inputs.logs.len()
    );

    let mut traversals: Vec<Traversal> = Vec::new();
    for log_path in &inputs.logs {
        traversals.extend(field_log::read_log_file(log_path)?);
    }

    estimator
        .process(&records, &traversals)
        .map_err(|e| format!("{}: {e}", dir.display()))
}

/// Run the pipeline over one survey directory and write the report set
/// under `dir/output/`.
pub fn run_and_write(dir: &Path, estimator: &SweepEstimator) -> Result<SurveyReport, String> {
    let survey_report = run_survey_dir(dir, estimator)?;
    report::write_report_set(dir, &survey_report)?;
    info!(
        "{}: weighted average width {:.3}",
        dir.display(),
        survey_report.weighted_average_width
    );
    Ok(survey_report)
}

/// Process many independent survey directories in parallel.
pub fn run_surveys(
    dirs: &[PathBuf],
    estimator: &SweepEstimator,
) -> Vec<(PathBuf, Result<SurveyReport, String>)> {
    dirs.par_iter()
        .map(|dir| (dir.clone(), run_and_write(dir, estimator)))
        .collect()
}

/// Subdirectories of a root, each expected to be one survey.
pub fn survey_dirs(root: &Path) -> Result<Vec<PathBuf>, String> {
    let entries =
        fs::read_dir(root).map_err(|e| format!("Failed to read {}: {e}", root.display()))?;
    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read {}: {e}", root.display()))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}
