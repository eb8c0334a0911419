pub mod indicator_series;
pub mod observation;
pub mod series_buffer;
