//! Request validation and canonicalization.
//!
//! Violations are collected and returned as a full list rather than
//! fail-fast: request forms want to show every problem at once, and the
//! pipeline downstream may assume a fully valid request.

use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

use crate::core::error::ValidationIssue;
use crate::core::types::{
    Condition, NormalizedRequest, NormalizedVehicle, RawValuationRequest, TitleStatus,
};

const VIN_LENGTH: usize = 17;
const MAX_MILEAGE: i64 = 500_000;

lazy_static! {
    static ref ZIP_RE: Regex = Regex::new(r"^\d{5}$").unwrap();
}

#[derive(Default)]
pub struct RequestNormalizer;

impl RequestNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(
        &self,
        raw: &RawValuationRequest,
        as_of_year: i32,
    ) -> Result<NormalizedRequest, Vec<ValidationIssue>> {
        let mut issues = Vec::new();

        let vin = raw.vin.trim().to_uppercase();
        if vin.len() != VIN_LENGTH {
            issues.push(ValidationIssue {
                field: "vin",
                message: format!("must be exactly {VIN_LENGTH} characters, got {}", vin.len()),
            });
        }

        let zip = raw.zip_code.trim().to_string();
        if !ZIP_RE.is_match(&zip) {
            issues.push(ValidationIssue {
                field: "zipCode",
                message: "must be a 5-digit ZIP code".to_string(),
            });
        }

        if !(0..=MAX_MILEAGE).contains(&raw.mileage) {
            issues.push(ValidationIssue {
                field: "mileage",
                message: format!("must be between 0 and {MAX_MILEAGE}"),
            });
        }

        let condition = match Condition::from_str(&raw.condition) {
            Ok(c) => Some(c),
            Err(message) => {
                issues.push(ValidationIssue {
                    field: "condition",
                    message,
                });
                None
            }
        };

        let title_status = match TitleStatus::from_str(&raw.title_status) {
            Ok(t) => Some(t),
            Err(message) => {
                issues.push(ValidationIssue {
                    field: "titleStatus",
                    message,
                });
                None
            }
        };

        let vehicle = match &raw.vehicle {
            Some(v) => {
                let make = v.make.trim().to_lowercase();
                let model = v.model.trim().to_lowercase();
                if make.is_empty() {
                    issues.push(ValidationIssue {
                        field: "vehicle.make",
                        message: "must not be empty".to_string(),
                    });
                }
                if model.is_empty() {
                    issues.push(ValidationIssue {
                        field: "vehicle.model",
                        message: "must not be empty".to_string(),
                    });
                }
                if v.year < 1900 || v.year > as_of_year + 1 {
                    issues.push(ValidationIssue {
                        field: "vehicle.year",
                        message: format!("{} is not a plausible model year", v.year),
                    });
                }
                Some(NormalizedVehicle {
                    make,
                    model,
                    year: v.year,
                    trim: v
                        .trim
                        .as_deref()
                        .map(|t| t.trim().to_lowercase())
                        .filter(|t| !t.is_empty()),
                    fuel_type: v
                        .fuel_type
                        .as_deref()
                        .map(|f| f.trim().to_lowercase())
                        .filter(|f| !f.is_empty()),
                })
            }
            None => {
                issues.push(ValidationIssue {
                    field: "vehicle",
                    message: "decoded vehicle attributes are required".to_string(),
                });
                None
            }
        };

        if !issues.is_empty() {
            return Err(issues);
        }

        // All three unwraps are guarded by the emptiness check above.
        Ok(NormalizedRequest {
            vin,
            zip_code: zip,
            mileage: raw.mileage,
            condition: condition.expect("validated"),
            title_status: title_status.expect("validated"),
            vehicle: vehicle.expect("validated"),
            as_of_year,
        })
    }
}
