use std::env;
use std::path::PathBuf;

use sweep_width::config;
use sweep_width::io::{report, survey};
use sweep_width::{SweepEstimator, SweepParams};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = env::args().skip(1);
    let (root, output_json, params) = match args.next().as_deref() {
        Some("--config") => {
            let path = args
                .next()
                .ok_or_else(|| "--config requires a path".to_string())?;
            let config = config::load_config(path.as_ref())?;
            (config.survey_root, config.output.json_out, config.params)
        }
        Some(path) => (PathBuf::from(path), None, SweepParams::default()),
        None => {
            return Err(
                "usage: survey_demo <survey-root> | survey_demo --config <config.json>"
                    .to_string(),
            )
        }
    };

    let estimator = SweepEstimator::new(params);
    let dirs = survey::survey_dirs(&root)?;
    if dirs.is_empty() {
        return Err(format!("No survey directories under {}", root.display()));
    }

    let results = survey::run_surveys(&dirs, &estimator);
    let mut failures = 0usize;
    for (dir, result) in &results {
        match result {
            Ok(survey_report) => {
                println!(
                    "{}: weighted average width = {:.3}",
                    dir.display(),
                    survey_report.weighted_average_width
                );
                for fit in survey_report.pooled_fits() {
                    println!(
                        "  {}: width={:.3} b={:.3} k={:.4}",
                        fit.category, fit.width, fit.amplitude, fit.decay
                    );
                }
                for skipped in &survey_report.skipped_fits {
                    if skipped.field.is_none() {
                        println!("  {}: fit skipped ({})", skipped.category, skipped.reason);
                    }
                }
            }
            Err(err) => {
                eprintln!("{}: {err}", dir.display());
                failures += 1;
            }
        }
    }

    if let Some(path) = output_json {
        let reports: Vec<_> = results
            .iter()
            .filter_map(|(dir, result)| {
                result
                    .as_ref()
                    .ok()
                    .map(|survey_report| (dir.display().to_string(), survey_report))
            })
            .collect();
        report::write_json_file(&path, &reports)?;
        println!("JSON report written to {}", path.display());
    }

    if failures == results.len() {
        return Err("every survey directory failed".to_string());
    }
    Ok(())
}
