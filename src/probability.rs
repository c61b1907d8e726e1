//! Empirical detection probabilities from tallies.
//!
//! Two views: per-(category, field) ratios, and a per-category view pooled
//! across fields. Pooling sums found and possible first and divides once,
//! so larger-sample fields dominate appropriately; it is not an average of
//! per-field ratios.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::tally::{OffsetKey, TallyTable};

/// One empirical detection-probability sample.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProbabilitySample {
    /// Super-category the sample belongs to.
    pub category: String,
    /// Field the sample was measured in; `None` for the pooled view.
    pub field: Option<String>,
    pub offset: f64,
    pub probability: f64,
}

/// Both probability views over one survey's tallies.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ProbabilityTables {
    /// Per-(category, field, offset) ratios.
    pub by_field: Vec<ProbabilitySample>,
    /// Per-(category, offset) ratios pooled across fields.
    pub pooled: Vec<ProbabilitySample>,
}

impl ProbabilityTables {
    /// Pooled (offset, probability) samples grouped by category, offsets
    /// ascending within each group.
    pub fn pooled_by_category(&self) -> BTreeMap<&str, Vec<(f64, f64)>> {
        let mut groups: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        for sample in &self.pooled {
            groups
                .entry(sample.category.as_str())
                .or_default()
                .push((sample.offset, sample.probability));
        }
        groups
    }

    /// Per-field (offset, probability) samples grouped by (category,
    /// field), offsets ascending within each group.
    pub fn by_category_field(&self) -> BTreeMap<(&str, &str), Vec<(f64, f64)>> {
        let mut groups: BTreeMap<(&str, &str), Vec<(f64, f64)>> = BTreeMap::new();
        for sample in &self.by_field {
            let Some(field) = sample.field.as_deref() else {
                continue;
            };
            groups
                .entry((sample.category.as_str(), field))
                .or_default()
                .push((sample.offset, sample.probability));
        }
        groups
    }
}

/// Divide found by possible per key, skipping keys with no opportunities
/// (no data, not zero probability), and build the pooled per-category view.
pub fn estimate(tallies: &TallyTable) -> ProbabilityTables {
    let mut by_field = Vec::new();
    let mut pooled_cells: BTreeMap<(String, OffsetKey), (u64, u64)> = BTreeMap::new();

    for (key, cell) in tallies.iter() {
        if cell.possible == 0 {
            continue;
        }
        by_field.push(ProbabilitySample {
            category: key.category.clone(),
            field: Some(key.field.clone()),
            offset: key.offset.0,
            probability: cell.found as f64 / cell.possible as f64,
        });
        let (possible, found) = pooled_cells
            .entry((key.category.clone(), key.offset))
            .or_default();
        *possible += cell.possible;
        *found += cell.found;
    }

    let pooled = pooled_cells
        .into_iter()
        .map(|((category, offset), (possible, found))| ProbabilitySample {
            category,
            field: None,
            offset: offset.0,
            probability: found as f64 / possible as f64,
        })
        .collect();

    ProbabilityTables { by_field, pooled }
}
