//! Orientation-ambiguity resolution and lenient label matching.
//!
//! A surveyor can walk a field's transect in either direction, so a
//! reported (segment, row) coordinate may be measured from either end.
//! The resolver tries the literal coordinate and its mirror along each
//! axis, in a fixed order, and stops at the first hypothesis that yields a
//! match.

use log::debug;

use crate::matching::TraversalScope;
use crate::registry::{Registry, WalkCounter};

/// One reported sighting within a traversal.
#[derive(Clone, Debug, PartialEq)]
pub struct Sighting {
    /// Reported artifact category, free text.
    pub category: String,
    /// Reported segment number.
    pub segment: i64,
    /// Reported row coordinate along the transect.
    pub row: i64,
    /// Reported lateral offset from the transect line.
    pub offset: f64,
    /// Reported walking direction. Recorded but never used for matching.
    pub direction: Option<i64>,
}

/// One complete walk of a field with every sighting reported on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Traversal {
    /// Free-text field label as written by the surveyor.
    pub field_label: String,
    /// Recorded transect length for the walked field.
    pub transect_length: u32,
    pub sightings: Vec<Sighting>,
}

/// Case-insensitive containment: the registered name must contain the
/// reported one.
pub fn category_matches(stored: &str, reported: &str) -> bool {
    stored.to_lowercase().contains(&reported.to_lowercase())
}

/// Resolve a reported field label against registered identifiers.
///
/// The registered identifier must be a substring of (or equal to) the
/// label; the first satisfying identifier in sorted order wins. Labels are
/// lowercased unless purely numeric, mirroring registration.
pub fn resolve_field<'a>(registry: &'a Registry, label: &str) -> Option<&'a str> {
    let normalized = normalize_label(label);
    registry.field_names().find(|f| normalized.contains(*f))
}

fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.chars().all(|c| c.is_ascii_digit()) && !trimmed.is_empty() {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// The four geometric interpretations of a reported (segment, row)
/// coordinate, in resolution order: literal, mirrored segment, mirrored
/// row, both mirrored.
pub fn hypotheses(segment: i64, row: i64, segment_count: i64, segment_length: i64) -> [(i64, i64); 4] {
    let segment_m = segment_count - segment + 1;
    let row_m = segment_length - row + 1;
    [
        (segment, row),
        (segment_m, row),
        (segment, row_m),
        (segment_m, row_m),
    ]
}

/// Process every sighting of one traversal against the registry.
///
/// An unresolvable field label drops the whole traversal; an unresolvable
/// category drops the sighting. Both are intentional leniency, not errors.
pub fn process_traversal(registry: &mut Registry, walks: &mut WalkCounter, traversal: &Traversal) {
    let Some(field) = resolve_field(registry, &traversal.field_label) else {
        debug!(
            "no registered field matches label {:?}, traversal dropped",
            traversal.field_label
        );
        return;
    };
    let field = field.to_string();
    let Some(segment_count) = registry.segment_count(&field) else {
        return;
    };
    if segment_count == 0 {
        debug!("field {field:?} has zero segments, traversal dropped");
        return;
    }
    let segment_length = i64::from(traversal.transect_length / segment_count);

    let mut scope = TraversalScope::new();
    for sighting in &traversal.sightings {
        attempt_sighting(
            registry,
            walks,
            &mut scope,
            &field,
            i64::from(segment_count),
            segment_length,
            sighting,
        );
    }
    scope.finish(registry);
}

/// Try to match one sighting, walking the four orientation hypotheses in
/// order and, within each, the stored categories containing the reported
/// label. Returns whether a match was recorded.
fn attempt_sighting(
    registry: &mut Registry,
    walks: &mut WalkCounter,
    scope: &mut TraversalScope,
    field: &str,
    segment_count: i64,
    segment_length: i64,
    sighting: &Sighting,
) -> bool {
    let reported = sighting.category.trim();
    if reported.is_empty() {
        return false;
    }
    let categories = registry.matching_categories(reported);
    if categories.is_empty() {
        debug!("no registered category matches {reported:?}, sighting dropped");
        return false;
    }

    for (segment, row) in hypotheses(sighting.segment, sighting.row, segment_count, segment_length)
    {
        for category in &categories {
            for id in registry.candidates(category, field, segment, row) {
                if scope.try_match(registry, walks, id, sighting.offset) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MasterRecord;

    fn record(category: &str, field: &str, segment: i64, row: i64, offset: f64) -> MasterRecord {
        MasterRecord {
            category: category.to_string(),
            super_category: "lithic".to_string(),
            field: field.to_string(),
            segment,
            row,
            offset,
            left_side: false,
            segment_count: 3,
        }
    }

    fn sighting(category: &str, segment: i64, row: i64, offset: f64) -> Sighting {
        Sighting {
            category: category.to_string(),
            segment,
            row,
            offset,
            direction: None,
        }
    }

    #[test]
    fn category_containment_is_case_insensitive() {
        assert!(category_matches("worked flake", "Flake"));
        assert!(category_matches("flake", "flake"));
        assert!(!category_matches("flake", "worked flake"));
    }

    #[test]
    fn field_resolution_requires_identifier_within_label() {
        let mut registry = Registry::new();
        let mut walks = WalkCounter::default();
        registry.register(&record("flake", "meadow", 1, 1, 1.0), &mut walks);
        registry.register(&record("flake", "7", 1, 1, 1.0), &mut walks);

        assert_eq!(resolve_field(&registry, "North Meadow"), Some("meadow"));
        assert_eq!(resolve_field(&registry, "7"), Some("7"));
        assert_eq!(resolve_field(&registry, "ridge"), None);
    }

    #[test]
    fn hypothesis_order_is_literal_then_mirrors() {
        // 3 segments of length 10
        assert_eq!(
            hypotheses(1, 2, 3, 10),
            [(1, 2), (3, 2), (1, 9), (3, 9)]
        );
    }

    #[test]
    fn mirrored_coordinates_still_match() {
        let mut registry = Registry::new();
        let mut walks = WalkCounter::default();
        // Instance at segment 1, row 2 of a 3-segment field.
        let id = registry.register(&record("flake", "meadow", 1, 2, 4.0), &mut walks);

        // Reported from the other end: segment 3, row 9 with transect
        // length 30 -> segment length 10, both axes mirror back to (1, 2).
        let traversal = Traversal {
            field_label: "meadow".to_string(),
            transect_length: 30,
            sightings: vec![sighting("flake", 3, 9, 4.0)],
        };
        process_traversal(&mut registry, &mut walks, &traversal);

        assert_eq!(registry.instance(id).found_count(), 1);
        assert_eq!(walks.count("meadow"), 1);
    }

    #[test]
    fn unknown_field_label_drops_the_traversal() {
        let mut registry = Registry::new();
        let mut walks = WalkCounter::default();
        let id = registry.register(&record("flake", "meadow", 1, 2, 4.0), &mut walks);

        let traversal = Traversal {
            field_label: "ridge".to_string(),
            transect_length: 30,
            sightings: vec![sighting("flake", 1, 2, 4.0)],
        };
        process_traversal(&mut registry, &mut walks, &traversal);

        assert_eq!(registry.instance(id).found_count(), 0);
        assert_eq!(walks.count("meadow"), 0);
    }

    #[test]
    fn unknown_category_drops_only_the_sighting() {
        let mut registry = Registry::new();
        let mut walks = WalkCounter::default();
        let id = registry.register(&record("flake", "meadow", 1, 2, 4.0), &mut walks);

        let traversal = Traversal {
            field_label: "meadow".to_string(),
            transect_length: 30,
            sightings: vec![sighting("arrow", 1, 2, 4.0), sighting("flake", 1, 2, 4.0)],
        };
        process_traversal(&mut registry, &mut walks, &traversal);

        assert_eq!(registry.instance(id).found_count(), 1);
    }

    #[test]
    fn repeated_sightings_in_one_traversal_count_once() {
        let mut registry = Registry::new();
        let mut walks = WalkCounter::default();
        let id = registry.register(&record("flake", "meadow", 1, 2, 4.0), &mut walks);

        let traversal = Traversal {
            field_label: "meadow".to_string(),
            transect_length: 30,
            sightings: vec![
                sighting("flake", 1, 2, 4.0),
                sighting("flake", 1, 2, 4.0),
                sighting("flake", 3, 9, 4.0),
            ],
        };
        process_traversal(&mut registry, &mut walks, &traversal);

        assert_eq!(registry.instance(id).found_count(), 1);
        assert_eq!(walks.count("meadow"), 1);
    }
}
