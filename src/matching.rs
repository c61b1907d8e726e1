//! Observation-to-instance matching with the lenient offset tolerance.
//!
//! The match policy is deliberately asymmetric: a surveyor reporting an
//! artifact closer to the line than it really is (underestimation) is
//! accepted up to the instance's tolerance band; overestimation is never
//! accepted.

use crate::registry::{InstanceId, Registry, WalkCounter};

/// Rounds an absolute lateral offset into its matching bucket: positive
/// values round to the nearest integer with a floor of one, zero stays
/// zero. Sign is ignored, the transect can be walked in either direction.
pub fn offset_bucket(offset: f64) -> f64 {
    let x = offset.abs();
    if x > 0.0 {
        x.round().max(1.0)
    } else {
        0.0
    }
}

/// Decide whether an observed offset is acceptable for an instance with
/// the given stored offset and tolerance. Pure; no state involved.
pub fn offsets_match(observed: f64, stored: f64, tolerance: f64) -> bool {
    let x = offset_bucket(observed);
    let sx = offset_bucket(stored);
    sx == x || (sx > x && sx - x <= tolerance)
}

/// Mutable matching state for one traversal of a field.
///
/// Holds the walk-counted guard and the set of instances flagged during
/// this traversal; [`TraversalScope::finish`] clears the flags so the next
/// traversal starts fresh.
#[derive(Debug, Default)]
pub struct TraversalScope {
    walk_counted: bool,
    found: Vec<InstanceId>,
}

impl TraversalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempt to match one observed offset against one candidate
    /// instance.
    ///
    /// On the first find of the traversal the field's walk counter is
    /// incremented, exactly once regardless of how many instances are
    /// found afterwards. An instance already matched during this traversal
    /// reports no match, so overlapping candidate hypotheses cannot double
    /// count it.
    pub fn try_match(
        &mut self,
        registry: &mut Registry,
        walks: &mut WalkCounter,
        id: InstanceId,
        observed_offset: f64,
    ) -> bool {
        let instance = registry.instance_mut(id);
        if !offsets_match(observed_offset, instance.offset, instance.tolerance()) {
            return false;
        }
        if instance.found_in_traversal {
            return false;
        }
        if !self.walk_counted {
            walks.increment(&instance.field);
            self.walk_counted = true;
        }
        instance.record_found();
        self.found.push(id);
        true
    }

    /// End the traversal: clear every per-traversal flag this scope set.
    pub fn finish(self, registry: &mut Registry) {
        for id in self.found {
            registry.instance_mut(id).found_in_traversal = false;
        }
    }
}
