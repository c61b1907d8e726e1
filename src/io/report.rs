//! Report writing: CSV summaries plus a JSON dump of the full report.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::report::SurveyReport;

/// Serialize a value as pretty JSON to `path`, creating parent
/// directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

/// Per-instance found counts followed by per-field walk counts.
pub fn write_found_summary(path: &Path, report: &SurveyReport) -> Result<(), String> {
    let mut out = String::from("category,field,segment,row,offset,found_count\n");
    for record in &report.found {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            record.category,
            record.field,
            record.segment,
            record.row,
            record.offset,
            record.found_count
        ));
    }
    out.push_str("\nfield,walk_count\n");
    for walk in &report.walk_counts {
        out.push_str(&format!("{},{}\n", walk.field, walk.walk_count));
    }
    write_text(path, &out)
}

/// Pooled probabilities followed by the per-field view.
pub fn write_probabilities(path: &Path, report: &SurveyReport) -> Result<(), String> {
    let mut out = String::from("category,offset,probability\n");
    for sample in &report.probabilities.pooled {
        out.push_str(&format!(
            "{},{},{}\n",
            sample.category, sample.offset, sample.probability
        ));
    }
    out.push_str("\ncategory,field,offset,probability\n");
    for sample in &report.probabilities.by_field {
        out.push_str(&format!(
            "{},{},{},{}\n",
            sample.category,
            sample.field.as_deref().unwrap_or(""),
            sample.offset,
            sample.probability
        ));
    }
    write_text(path, &out)
}

/// Fit results and the weighted-average width.
pub fn write_widths(path: &Path, report: &SurveyReport) -> Result<(), String> {
    let mut out =
        String::from("category,field,width,amplitude,amplitude_variance,decay,decay_variance\n");
    for fit in &report.fits {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            fit.category,
            fit.field.as_deref().unwrap_or("all"),
            fit.width,
            fit.amplitude,
            fit.amplitude_variance,
            fit.decay,
            fit.decay_variance
        ));
    }
    out.push_str(&format!(
        "weighted_average,all,{}\n",
        report.weighted_average_width
    ));
    write_text(path, &out)
}

/// Write the standard report set under `dir/output/`.
pub fn write_report_set(dir: &Path, report: &SurveyReport) -> Result<(), String> {
    let out = dir.join("output");
    write_found_summary(&out.join("found_summary.csv"), report)?;
    write_probabilities(&out.join("probabilities.csv"), report)?;
    write_widths(&out.join("width.csv"), report)?;
    write_json_file(&out.join("report.json"), report)
}

fn write_text(path: &Path, contents: &str) -> Result<(), String> {
    ensure_parent_dir(path)?;
    fs::write(path, contents).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
