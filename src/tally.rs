//! Found/possible tallies over the registry after all traversals.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::registry::{Registry, WalkCounter};

/// Lateral offset usable as an ordered map key (total order over floats).
#[derive(Clone, Copy, Debug, Serialize)]
pub struct OffsetKey(pub f64);

impl PartialEq for OffsetKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for OffsetKey {}

impl PartialOrd for OffsetKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OffsetKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Key of one tally cell. Offsets are keyed by absolute value: the stored
/// sign only records which side of the line the artifact sat on.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TallyKey {
    /// Super-category of the artifacts in this cell.
    pub category: String,
    pub field: String,
    pub offset: OffsetKey,
}

/// Detection opportunities and actual finds accumulated for one key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TallyCell {
    pub possible: u64,
    pub found: u64,
}

/// Immutable possible/found table built once after all observations.
#[derive(Debug, Default)]
pub struct TallyTable {
    cells: BTreeMap<TallyKey, TallyCell>,
}

impl TallyTable {
    /// Fold the registry and walk counts into a tally table.
    ///
    /// Every traversal of a field was an opportunity to find each artifact
    /// in it, so each instance contributes its field's walk count to the
    /// possible side and its own found count to the found side.
    pub fn build(registry: &Registry, walks: &WalkCounter) -> Self {
        let mut cells: BTreeMap<TallyKey, TallyCell> = BTreeMap::new();
        for instance in registry.instances() {
            let key = TallyKey {
                category: instance.super_category.clone(),
                field: instance.field.clone(),
                offset: OffsetKey(instance.offset.abs()),
            };
            let cell = cells.entry(key).or_default();
            cell.possible += u64::from(walks.count(&instance.field));
            cell.found += u64::from(instance.found_count());
        }
        Self { cells }
    }

    /// Cells in (category, field, offset) order.
    pub fn iter(&self) -> impl Iterator<Item = (&TallyKey, &TallyCell)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::TraversalScope;
    use crate::registry::MasterRecord;

    fn record(field: &str, row: i64, offset: f64, left_side: bool) -> MasterRecord {
        MasterRecord {
            category: "flake".to_string(),
            super_category: "lithic".to_string(),
            field: field.to_string(),
            segment: 1,
            row,
            offset,
            left_side,
            segment_count: 1,
        }
    }

    #[test]
    fn possible_counts_follow_walks_found_counts_follow_matches() {
        let mut registry = Registry::new();
        let mut walks = WalkCounter::default();
        let near = registry.register(&record("meadow", 1, 2.0, false), &mut walks);
        let far = registry.register(&record("meadow", 2, 9.0, false), &mut walks);

        // Two traversals; the far artifact is only found on the first.
        for observed_far in [true, false] {
            let mut scope = TraversalScope::new();
            assert!(scope.try_match(&mut registry, &mut walks, near, 2.0));
            if observed_far {
                assert!(scope.try_match(&mut registry, &mut walks, far, 9.0));
            }
            scope.finish(&mut registry);
        }

        let table = TallyTable::build(&registry, &walks);
        let cells: Vec<_> = table.iter().collect();
        assert_eq!(cells.len(), 2);

        let (near_key, near_cell) = cells[0];
        assert_eq!(near_key.offset, OffsetKey(2.0));
        assert_eq!(*near_cell, TallyCell { possible: 2, found: 2 });

        let (far_key, far_cell) = cells[1];
        assert_eq!(far_key.offset, OffsetKey(9.0));
        assert_eq!(*far_cell, TallyCell { possible: 2, found: 1 });
    }

    #[test]
    fn opposite_sides_of_the_line_share_a_cell() {
        let mut registry = Registry::new();
        let mut walks = WalkCounter::default();
        registry.register(&record("meadow", 1, 4.0, false), &mut walks);
        registry.register(&record("meadow", 2, 4.0, true), &mut walks);

        let table = TallyTable::build(&registry, &walks);
        assert_eq!(table.len(), 1);
    }
}
