//! Request types for the Tip Steward API.
//!
//! This module defines the JSON request structure for the
//! `/api/distributions/calculate` endpoint.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculation::DistributionInput;
use crate::models::PartnerHours;

/// Request body for `POST /api/distributions/calculate`.
///
/// `totalHours` and `hourlyRate` are the figures the client computed; the
/// server recomputes both and only uses them to flag disagreements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateDistributionRequest {
    /// Partners and their tippable hours.
    pub partner_hours: Vec<PartnerHours>,
    /// The tip pool to distribute.
    pub total_amount: Decimal,
    /// Client-side sum of hours.
    #[serde(default)]
    pub total_hours: Option<Decimal>,
    /// Client-side hourly rate.
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
}

impl From<CalculateDistributionRequest> for DistributionInput {
    fn from(req: CalculateDistributionRequest) -> Self {
        DistributionInput {
            partners: req.partner_hours,
            total_amount: req.total_amount,
            claimed_total_hours: req.total_hours,
            claimed_hourly_rate: req.hourly_rate,
        }
    }
}

/// Query string of the OCR endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OcrQuery {
    /// Engine strategy override (`auto`, `azure`, `tesseract`, ...).
    #[serde(default)]
    pub engine: Option<String>,
}
