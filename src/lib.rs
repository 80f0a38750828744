//! Tip Steward: tip pool distribution for retail stores
//!
//! This crate imports partner hours from photos of a printed Tip Distribution
//! Report using OCR, and splits a tip pool across partners in proportion to
//! their hours, rounded to whole bills with a cash denomination breakdown.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod ocr;
pub mod parsing;
