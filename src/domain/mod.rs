// OHLCV storage and derived series
pub mod market;

// Feature layout, labels and training examples
pub mod ml;

// Signal types
pub mod trading;

// Domain-specific error types
pub mod errors;
