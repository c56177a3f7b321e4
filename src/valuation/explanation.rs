//! Narrative summary of a finished valuation. Plain string templating over
//! the computed numbers; presentation beyond this string belongs to the UI
//! collaborator.

use crate::core::types::{Condition, NormalizedRequest, StrategyOutcome, ValuationResult};

const HIGH_MILEAGE_CALLOUT: i64 = 100_000;

pub fn narrative(request: &NormalizedRequest, result: &ValuationResult) -> String {
    let vehicle = format!(
        "{} {} {}",
        request.vehicle.year, request.vehicle.make, request.vehicle.model
    );

    let mut text = format!(
        "Your {vehicle} has an estimated market value of ${}. ",
        result.final_value
    );

    match result.outcome {
        StrategyOutcome::BaselineEstimate => {
            text.push_str(
                "No comparable listings were available, so this estimate comes from a \
                 depreciation model rather than live market data. ",
            );
        }
        _ => {
            text.push_str(&format!(
                "This valuation is based on {} comparable listings with a trust-weighted \
                 median of ${}. ",
                result.market_listings.len(),
                result.base_value
            ));
        }
    }

    text.push_str(&format!(
        "The {}% confidence score reflects the quality and quantity of available market data. ",
        result.confidence_score
    ));

    if request.mileage > HIGH_MILEAGE_CALLOUT {
        text.push_str(&format!(
            "The higher mileage ({} miles) has been factored into the valuation. ",
            request.mileage
        ));
    }

    if request.condition != Condition::Excellent {
        text.push_str(&format!(
            "The {} condition has been considered in the final estimate. ",
            request.condition
        ));
    }

    text.push_str(&format!(
        "Regional market conditions for ZIP {} have also been applied.",
        request.zip_code
    ));

    text
}
