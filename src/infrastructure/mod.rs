// CSV history loading
pub mod market_data;

// Model artifact storage
pub mod persistence;
