pub mod baseline;
pub mod strategies;
pub mod valuation_service;
