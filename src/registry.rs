//! Ground-truth registry: known artifact instances indexed for matching.
//!
//! The registry owns every [`ArtifactInstance`] loaded from a master file
//! and exposes them through non-owning [`InstanceId`] handles. Only the
//! matching engine mutates instances (found counts and per-traversal
//! flags); every other stage reads via lookup.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

/// Fraction of the absolute lateral offset granted as underestimation
/// tolerance when matching observations against an instance.
pub const TOLERANCE_FRACTION: f64 = 0.2;

/// Structured ground-truth record handed over by the master-file reader.
#[derive(Clone, Debug, PartialEq)]
pub struct MasterRecord {
    /// Fine-grained artifact type, lowercased.
    pub category: String,
    /// Broad artifact class, lowercased.
    pub super_category: String,
    /// Field identifier (lowercased unless purely numeric).
    pub field: String,
    /// Segment number within the field.
    pub segment: i64,
    /// Row coordinate along the transect within the segment.
    pub row: i64,
    /// Unsigned lateral distance from the transect centerline.
    pub offset: f64,
    /// Side marker: the offset was measured to the left of the line.
    pub left_side: bool,
    /// Total number of segments in the field.
    pub segment_count: u32,
}

/// One known artifact on the ground.
#[derive(Clone, Debug, Serialize)]
pub struct ArtifactInstance {
    pub category: String,
    pub super_category: String,
    pub field: String,
    pub segment: i64,
    pub row: i64,
    /// Stored lateral offset. The sign encodes the recorded side of the
    /// line; every consumer works with the absolute value.
    pub offset: f64,
    tolerance: f64,
    found_count: u32,
    pub(crate) found_in_traversal: bool,
}

impl ArtifactInstance {
    /// Allowed underestimation band when matching against this instance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// How many times this instance was matched across all traversals.
    pub fn found_count(&self) -> u32 {
        self.found_count
    }

    pub(crate) fn record_found(&mut self) {
        self.found_count += 1;
        self.found_in_traversal = true;
    }
}

/// Non-owning handle into the registry's instance storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId(usize);

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct IndexKey {
    category: String,
    field: String,
    segment: i64,
    row: i64,
}

/// Completed-traversal counts per field.
///
/// A traversal is counted at most once, when the first artifact is found
/// on it; the guard flag lives in the matching engine's traversal scope.
#[derive(Clone, Debug, Default)]
pub struct WalkCounter {
    counts: BTreeMap<String, u32>,
}

impl WalkCounter {
    /// Seed a zero entry for a newly seen field.
    pub fn ensure(&mut self, field: &str) {
        self.counts.entry(field.to_string()).or_insert(0);
    }

    pub(crate) fn increment(&mut self, field: &str) {
        *self.counts.entry(field.to_string()).or_insert(0) += 1;
    }

    pub fn count(&self, field: &str) -> u32 {
        self.counts.get(field).copied().unwrap_or(0)
    }

    /// Fields and their walk counts in sorted field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(f, c)| (f.as_str(), *c))
    }
}

/// Registry of ground-truth artifacts for one survey location.
#[derive(Debug, Default)]
pub struct Registry {
    instances: Vec<ArtifactInstance>,
    index: HashMap<IndexKey, Vec<InstanceId>>,
    categories: BTreeSet<String>,
    /// Field identifier -> number of segments in the field.
    fields: BTreeMap<String, u32>,
    /// Super-category -> number of registered instances across all fields.
    instance_counts: BTreeMap<String, u32>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ground-truth record and return a handle to the stored
    /// instance.
    ///
    /// Side effects: a newly seen field gets a zero walk-count entry and
    /// its segment count recorded; per-super-category instance counts are
    /// maintained for the weighted-average step.
    pub fn register(&mut self, record: &MasterRecord, walks: &mut WalkCounter) -> InstanceId {
        if !self.fields.contains_key(&record.field) {
            walks.ensure(&record.field);
            self.fields
                .insert(record.field.clone(), record.segment_count);
        }
        *self
            .instance_counts
            .entry(record.super_category.clone())
            .or_insert(0) += 1;

        // The side marker flips the stored sign; geometry downstream only
        // ever looks at the magnitude.
        let offset = if record.left_side {
            -record.offset
        } else {
            record.offset
        };
        let instance = ArtifactInstance {
            category: record.category.clone(),
            super_category: record.super_category.clone(),
            field: record.field.clone(),
            segment: record.segment,
            row: record.row,
            offset,
            tolerance: TOLERANCE_FRACTION * record.offset.abs(),
            found_count: 0,
            found_in_traversal: false,
        };

        let id = InstanceId(self.instances.len());
        self.instances.push(instance);
        self.categories.insert(record.category.clone());
        let key = IndexKey {
            category: record.category.clone(),
            field: record.field.clone(),
            segment: record.segment,
            row: record.row,
        };
        self.index.entry(key).or_default().push(id);
        id
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn instance(&self, id: InstanceId) -> &ArtifactInstance {
        &self.instances[id.0]
    }

    pub(crate) fn instance_mut(&mut self, id: InstanceId) -> &mut ArtifactInstance {
        &mut self.instances[id.0]
    }

    /// All instances in registration order.
    pub fn instances(&self) -> impl Iterator<Item = &ArtifactInstance> {
        self.instances.iter()
    }

    /// Instances registered under an exact (category, field, segment, row)
    /// coordinate. Multiple instances of one category can share a row.
    pub(crate) fn candidates(
        &self,
        category: &str,
        field: &str,
        segment: i64,
        row: i64,
    ) -> Vec<InstanceId> {
        let key = IndexKey {
            category: category.to_string(),
            field: field.to_string(),
            segment,
            row,
        };
        self.index.get(&key).cloned().unwrap_or_default()
    }

    /// Stored category names containing `reported` (case-insensitive), in
    /// sorted order so first-match resolution is deterministic.
    pub fn matching_categories(&self, reported: &str) -> Vec<String> {
        let needle = reported.to_lowercase();
        self.categories
            .iter()
            .filter(|c| c.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Registered field identifiers in sorted order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|f| f.as_str())
    }

    pub fn segment_count(&self, field: &str) -> Option<u32> {
        self.fields.get(field).copied()
    }

    /// Number of registered instances for a super-category, summed across
    /// fields. This is the weight used by the weighted-average width.
    pub fn instance_count(&self, super_category: &str) -> u32 {
        self.instance_counts
            .get(super_category)
            .copied()
            .unwrap_or(0)
    }
}
