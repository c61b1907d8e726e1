//! Observation-log parsing: header column resolution and per-row
//! traversals.
//!
//! The header row declares column roles per sighting slot (`TDist 1`,
//! `Segment 1`, `Artifact 1`, `Distance 1`, optional `Direction 1`, …)
//! plus one field-label column (`Ground Cover`) and one transect-length
//! column (`Transect Length`). Every body row is one traversal; each slot
//! with an artifact value and complete coordinates yields one sighting.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::io::table;
use crate::resolve::{Sighting, Traversal};

struct HeaderPatterns {
    trans: Regex,
    seg: Regex,
    art: Regex,
    direct: Regex,
    lat: Regex,
    field: Regex,
    tlen: Regex,
}

impl HeaderPatterns {
    fn new() -> Result<Self, String> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| format!("Bad header pattern {pattern:?}: {e}"))
        };
        Ok(Self {
            trans: compile(r"(?i)TDist\s+(\d+)")?,
            seg: compile(r"(?i)Segment\s+(\d+)")?,
            art: compile(r"(?i)Artifact\s+(\d+)")?,
            direct: compile(r"(?i)Direction\s+(\d+)")?,
            lat: compile(r"(?i)Distance\s+(\d+)")?,
            field: compile(r"(?i)Ground\s+Cover")?,
            tlen: compile(r"(?i)Transect\s+Length")?,
        })
    }
}

/// Resolved column positions: per-slot maps plus the two singleton
/// columns.
#[derive(Debug, Default)]
struct ColumnMap {
    trans: BTreeMap<u32, usize>,
    seg: BTreeMap<u32, usize>,
    art: BTreeMap<u32, usize>,
    direct: BTreeMap<u32, usize>,
    lat: BTreeMap<u32, usize>,
    field: Option<usize>,
    tlen: Option<usize>,
}

fn slot_of(re: &Regex, cell: &str) -> Option<u32> {
    re.captures(cell)?.get(1)?.as_str().parse().ok()
}

fn resolve_columns(header: &[String]) -> Result<ColumnMap, String> {
    let patterns = HeaderPatterns::new()?;
    let mut columns = ColumnMap::default();
    for (position, cell) in header.iter().enumerate() {
        if patterns.field.is_match(cell) {
            columns.field.get_or_insert(position);
        } else if patterns.tlen.is_match(cell) {
            columns.tlen.get_or_insert(position);
        } else if let Some(slot) = slot_of(&patterns.trans, cell) {
            columns.trans.insert(slot, position);
        } else if let Some(slot) = slot_of(&patterns.seg, cell) {
            columns.seg.insert(slot, position);
        } else if let Some(slot) = slot_of(&patterns.art, cell) {
            columns.art.insert(slot, position);
        } else if let Some(slot) = slot_of(&patterns.direct, cell) {
            columns.direct.insert(slot, position);
        } else if let Some(slot) = slot_of(&patterns.lat, cell) {
            columns.lat.insert(slot, position);
        }
    }

    if columns.art.is_empty() {
        return Err("log header declares no artifact columns".to_string());
    }
    if columns.field.is_none() {
        return Err("log header declares no field-label column".to_string());
    }
    if columns.tlen.is_none() {
        return Err("log header declares no transect-length column".to_string());
    }
    Ok(columns)
}

fn cell<'a>(row: &'a [String], position: Option<usize>) -> Option<&'a str> {
    let value = row.get(position?)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parse a resolved log table into traversals. Rows missing the field
/// label or transect length are dropped; slots missing any required value
/// are dropped (a missing direction is tolerated).
pub fn parse_log_table(rows: &[Vec<String>]) -> Result<Vec<Traversal>, String> {
    let header = rows.first().ok_or_else(|| "empty log table".to_string())?;
    let columns = resolve_columns(header)?;

    let mut traversals = Vec::new();
    for row in &rows[1..] {
        let Some(field_label) = cell(row, columns.field) else {
            continue;
        };
        let Some(transect_length) = cell(row, columns.tlen).and_then(|v| v.parse::<u32>().ok())
        else {
            debug!("row without a usable transect length, dropped");
            continue;
        };

        let mut sightings = Vec::new();
        for (&slot, &art_position) in &columns.art {
            let Some(category) = cell(row, Some(art_position)) else {
                continue;
            };
            let coordinates = (
                cell(row, columns.trans.get(&slot).copied())
                    .and_then(|v| v.parse::<i64>().ok()),
                cell(row, columns.seg.get(&slot).copied()).and_then(|v| v.parse::<i64>().ok()),
                cell(row, columns.lat.get(&slot).copied()).and_then(|v| v.parse::<f64>().ok()),
            );
            let (Some(row_coord), Some(segment), Some(offset)) = coordinates else {
                debug!("slot {slot} is missing required values, sighting dropped");
                continue;
            };
            let direction = cell(row, columns.direct.get(&slot).copied())
                .and_then(|v| v.parse::<i64>().ok());

            sightings.push(Sighting {
                category: category.to_lowercase(),
                segment,
                row: row_coord,
                offset,
                direction,
            });
        }

        traversals.push(Traversal {
            field_label: field_label.to_string(),
            transect_length,
            sightings,
        });
    }
    Ok(traversals)
}

/// Read one observation-log CSV into traversals.
pub fn read_log_file(path: &Path) -> Result<Vec<Traversal>, String> {
    let rows = table::read_csv(path)?;
    parse_log_table(&rows).map_err(|e| format!("{}: {e}", path.display()))
}
