//! Builders for synthetic master files and observation logs.

/// One filled sighting slot of a log row.
#[derive(Clone, Copy)]
pub struct Slot<'a> {
    pub slot: usize,
    pub row: i64,
    pub segment: i64,
    pub category: &'a str,
    pub direction: Option<i64>,
    pub offset: f64,
}

/// Header row declaring `slots` sighting slots plus the field-label and
/// transect-length columns.
pub fn log_header(slots: usize) -> String {
    let mut header = String::from("Ground Cover,Transect Length");
    for slot in 1..=slots {
        header.push_str(&format!(
            ",TDist {slot},Segment {slot},Artifact {slot},Direction {slot},Distance {slot}"
        ));
    }
    header
}

/// One traversal row with the given slots filled.
pub fn log_row(field: &str, transect_length: u32, slots: usize, filled: &[Slot<'_>]) -> String {
    let mut row = format!("{field},{transect_length}");
    for slot in 1..=slots {
        match filled.iter().find(|s| s.slot == slot) {
            Some(s) => {
                let direction = s
                    .direction
                    .map(|d| d.to_string())
                    .unwrap_or_default();
                row.push_str(&format!(
                    ",{},{},{},{},{}",
                    s.row, s.segment, s.category, direction, s.offset
                ));
            }
            None => row.push_str(",,,,,"),
        }
    }
    row
}

/// A master line for one artifact: `label,segment,row,side,offset,field,
/// super-category,segment-count`.
pub fn master_line(
    label: &str,
    segment: i64,
    row: i64,
    side: &str,
    offset: i64,
    field: &str,
    super_category: &str,
    segment_count: u32,
) -> String {
    format!("{label},{segment},{row},{side},{offset},{field},{super_category},{segment_count}")
}
