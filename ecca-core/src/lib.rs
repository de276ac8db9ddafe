pub mod errors;
pub mod timeseries;
pub mod window;
