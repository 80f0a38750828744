//! Report text parsing.
//!
//! Turns the semi-structured text produced by an OCR engine into partner
//! hour records, with a confidence score used to choose between engines.

mod report;

pub use report::{ParsedReport, parse_hours_report};
