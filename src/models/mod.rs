//! Core data models for Tip Steward.
//!
//! This module contains all the domain models used throughout the service.

mod distribution;
mod ocr_result;
mod partner;

pub use distribution::DistributionData;
pub use ocr_result::{EngineKind, OcrServiceResult, RecognizedText};
pub use partner::{BillCount, PartnerHours, PartnerPayout};
