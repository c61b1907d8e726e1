//! Minimal comma-separated table reading for the log collaborators.

use std::fs;
use std::path::Path;

/// Read a comma-separated file into trimmed string cells, one row per
/// non-empty line. No quoting support; the survey exports never quote.
pub fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(parse_csv(&contents))
}

/// Split raw CSV text into trimmed cells.
pub fn parse_csv(contents: &str) -> Vec<Vec<String>> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(',').map(|cell| cell.trim().to_string()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_trims_cells() {
        let rows = parse_csv("a, b ,c\n\n1,2,3\n");
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string(), "c".to_string()],
                vec!["1".to_string(), "2".to_string(), "3".to_string()],
            ]
        );
    }
}
