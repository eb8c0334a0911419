pub mod indicator_frame;
pub mod indicators;
pub mod signal_engine;

pub use indicator_frame::IndicatorFrame;
pub use signal_engine::{DecisionInputs, SignalEngine, fuse};
