//! Master (ground-truth) record parsing.
//!
//! One CSV line per known artifact:
//! `label,segment,row,side,offset,field,super-category,segment-count`.
//! The label carries the fine category plus an optional trailing instance
//! numeral ("Arrow 3"); the numeral is stripped. Lines that do not match
//! the record shape are skipped, not fatal.

use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::registry::MasterRecord;

const RECORD_PATTERN: &str = r"^(.+),(\d+),(\d+),(\S+),(\d+),([^,]+),([^,]+),(\d+)\s*$";
/// Leading non-digit run of the artifact label.
const CATEGORY_PATTERN: &str = r"^([^\d]+)";

/// Compiled master-record parser.
pub struct MasterParser {
    record: Regex,
    category: Regex,
}

impl MasterParser {
    pub fn new() -> Result<Self, String> {
        Ok(Self {
            record: Regex::new(RECORD_PATTERN)
                .map_err(|e| format!("Bad master record pattern: {e}"))?,
            category: Regex::new(CATEGORY_PATTERN)
                .map_err(|e| format!("Bad category pattern: {e}"))?,
        })
    }

    /// Parse one master line; `None` when the line does not carry a
    /// complete record.
    pub fn parse_line(&self, line: &str) -> Option<MasterRecord> {
        let captures = self.record.captures(line)?;
        let label = captures.get(1)?.as_str();
        let category = self
            .category
            .captures(label)?
            .get(1)?
            .as_str()
            .trim()
            .to_lowercase();
        if category.is_empty() {
            return None;
        }

        let segment: i64 = captures.get(2)?.as_str().parse().ok()?;
        let row: i64 = captures.get(3)?.as_str().parse().ok()?;
        let side = captures.get(4)?.as_str();
        let offset: f64 = captures.get(5)?.as_str().parse().ok()?;
        let field = normalize_field(captures.get(6)?.as_str());
        let super_category = captures.get(7)?.as_str().trim().to_lowercase();
        let segment_count: u32 = captures.get(8)?.as_str().parse().ok()?;

        Some(MasterRecord {
            category,
            super_category,
            field,
            segment,
            row,
            offset,
            left_side: side.eq_ignore_ascii_case("l"),
            segment_count,
        })
    }
}

/// Field labels are lowercased unless purely numeric.
fn normalize_field(field: &str) -> String {
    let trimmed = field.trim();
    if trimmed.chars().all(|c| c.is_ascii_digit()) && !trimmed.is_empty() {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Read every parseable record from a master file.
pub fn read_master_file(path: &Path) -> Result<Vec<MasterRecord>, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let parser = MasterParser::new()?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match parser.parse_line(line) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!("{}: skipped {skipped} unparseable line(s)", path.display());
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_complete_record() {
        let parser = MasterParser::new().unwrap();
        let record = parser
            .parse_line("Arrow 3,1,4,l,6,Meadow,Projectile,2")
            .unwrap();

        assert_eq!(record.category, "arrow");
        assert_eq!(record.super_category, "projectile");
        assert_eq!(record.field, "meadow");
        assert_eq!(record.segment, 1);
        assert_eq!(record.row, 4);
        assert_eq!(record.offset, 6.0);
        assert!(record.left_side);
        assert_eq!(record.segment_count, 2);
    }

    #[test]
    fn right_side_marker_is_not_negating() {
        let parser = MasterParser::new().unwrap();
        let record = parser
            .parse_line("Flake,2,10,r,3,7,Lithic,4")
            .unwrap();
        assert!(!record.left_side);
        // Numeric field labels stay verbatim.
        assert_eq!(record.field, "7");
    }

    #[test]
    fn incomplete_lines_are_skipped() {
        let parser = MasterParser::new().unwrap();
        assert!(parser.parse_line("Arrow 3,1,4,l,6,Meadow").is_none());
        assert!(parser.parse_line("a header line").is_none());
        assert!(parser.parse_line("42,1,4,l,6,Meadow,Projectile,2").is_none());
    }
}
