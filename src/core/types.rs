use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ----------- Request side -----------------

/// Reported mechanical/cosmetic state of the vehicle being valued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Excellent => "excellent",
            Condition::VeryGood => "very_good",
            Condition::Good => "good",
            Condition::Fair => "fair",
            Condition::Poor => "poor",
        }
    }
}

impl FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "excellent" => Ok(Condition::Excellent),
            "very_good" => Ok(Condition::VeryGood),
            "good" => Ok(Condition::Good),
            "fair" => Ok(Condition::Fair),
            "poor" => Ok(Condition::Poor),
            other => Err(format!("unknown condition '{other}'")),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Legal/insurance classification of the vehicle's title history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TitleStatus {
    Clean,
    Rebuilt,
    Salvage,
    Flood,
    Lemon,
}

impl TitleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleStatus::Clean => "clean",
            TitleStatus::Rebuilt => "rebuilt",
            TitleStatus::Salvage => "salvage",
            TitleStatus::Flood => "flood",
            TitleStatus::Lemon => "lemon",
        }
    }
}

impl FromStr for TitleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clean" => Ok(TitleStatus::Clean),
            "rebuilt" => Ok(TitleStatus::Rebuilt),
            "salvage" => Ok(TitleStatus::Salvage),
            "flood" => Ok(TitleStatus::Flood),
            "lemon" => Ok(TitleStatus::Lemon),
            other => Err(format!("unknown title status '{other}'")),
        }
    }
}

impl fmt::Display for TitleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Vehicle attributes as supplied by the decode collaborator (or the caller).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DecodedVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default, rename = "fuelType")]
    pub fuel_type: Option<String>,
}

/// Untyped valuation request as it arrives from the caller. Field-level
/// validation happens in the normalizer, which reports every violation at
/// once rather than stopping at the first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawValuationRequest {
    pub vin: String,
    #[serde(rename = "zipCode")]
    pub zip_code: String,
    pub mileage: i64,
    pub condition: String,
    #[serde(default = "default_title_status", rename = "titleStatus")]
    pub title_status: String,
    #[serde(default)]
    pub vehicle: Option<DecodedVehicle>,
}

fn default_title_status() -> String {
    "clean".to_string()
}

/// Canonical vehicle attributes after normalization (lower-cased, trimmed).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NormalizedVehicle {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub trim: Option<String>,
    pub fuel_type: Option<String>,
}

/// Fully validated request. Only this form enters the scoring pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NormalizedRequest {
    pub vin: String,
    pub zip_code: String,
    pub mileage: i64,
    pub condition: Condition,
    pub title_status: TitleStatus,
    pub vehicle: NormalizedVehicle,
    /// Calendar year the valuation is performed in. Passed explicitly so the
    /// pipeline stays a pure function of its inputs.
    pub as_of_year: i32,
}

impl NormalizedRequest {
    pub fn vehicle_age(&self) -> i32 {
        (self.as_of_year - self.vehicle.year).max(0)
    }
}

// ----------- Listing side -----------------

/// One observed market price point for a comparable vehicle, as returned by
/// a market search collaborator. Ephemeral: consumed once per valuation run,
/// never persisted by the engine itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawListing {
    pub price: Decimal,
    #[serde(default)]
    pub mileage: Option<i64>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    pub source: String,
    #[serde(default, rename = "sourceTrustWeight")]
    pub source_trust_weight: Option<f64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub vin: Option<String>,
    #[serde(default, rename = "dealerName")]
    pub dealer_name: Option<String>,
}

impl RawListing {
    /// Trust weight used by the weighted statistics; 0.7 when the source
    /// carries no explicit weight.
    pub fn trust_weight(&self) -> f64 {
        self.source_trust_weight.unwrap_or(0.7)
    }
}

/// A RawListing that survived every filter stage. Same shape, with the
/// filter's guarantees attached: sane price, year/mileage inside the
/// comparison windows, price inside the Tukey fence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QualityListing {
    pub listing: RawListing,
}

impl QualityListing {
    pub fn price(&self) -> Decimal {
        self.listing.price
    }

    pub fn trust_weight(&self) -> f64 {
        self.listing.trust_weight()
    }
}

// ----------- Result side -----------------

/// One named value delta applied against the market base value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    pub factor: String,
    pub impact: Decimal,
    pub description: String,
}

/// Per-component confidence contributions. Caps: 30/20/20/10/10/10.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub listing_volume: f64,
    pub listing_variance: f64,
    pub source_trust: f64,
    pub mileage_proximity: f64,
    pub condition_match: f64,
    pub title_status: f64,
}

impl ConfidenceBreakdown {
    pub fn total(&self) -> f64 {
        self.listing_volume
            + self.listing_variance
            + self.source_trust
            + self.mileage_proximity
            + self.condition_match
            + self.title_status
    }
}

/// Which data-source strategy produced a valuation. Each strategy carries
/// its own confidence cap and price-band policy in the service layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyOutcome {
    ExactMatch,
    SimilarVehicles,
    BroaderSearch,
    BaselineEstimate,
}

impl fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyOutcome::ExactMatch => "exact_match",
            StrategyOutcome::SimilarVehicles => "similar_vehicles",
            StrategyOutcome::BroaderSearch => "broader_search",
            StrategyOutcome::BaselineEstimate => "baseline_estimate",
        };
        write!(f, "{s}")
    }
}

/// Finished valuation. Immutable after construction; consumed by the UI and
/// persistence collaborators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValuationResult {
    pub base_value: Decimal,
    pub final_value: Decimal,
    pub price_range: (Decimal, Decimal),
    pub confidence_score: u8,
    pub confidence_breakdown: ConfidenceBreakdown,
    pub adjustments: Vec<AdjustmentEntry>,
    pub market_listings: Vec<QualityListing>,
    pub sources_used: Vec<String>,
    pub outcome: StrategyOutcome,
    pub explanation: String,
}
