//! I/O collaborators around the core pipeline.
//!
//! - [`master`]: parse ground-truth master files into records.
//! - [`field_log`]: resolve observation-log headers and rows into
//!   traversals.
//! - [`table`]: minimal comma-separated table reading.
//! - [`report`]: CSV/JSON report writing.
//! - [`survey`]: locate a survey directory's inputs and run the pipeline.

pub mod field_log;
pub mod master;
pub mod report;
pub mod survey;
pub mod table;
