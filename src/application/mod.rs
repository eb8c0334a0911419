// Indicators, indicator frames and signal decisions
pub mod market_data;

// Feature construction and the up/not-up classifier
pub mod ml;
