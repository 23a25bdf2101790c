//! Thermistor calibration, conversion, and sampling.

pub mod calibration;
pub mod sampler;
pub mod thermistor;

pub use calibration::{CalibrationError, CalibrationPoint, Coefficients};
pub use thermistor::{Reading, Thermistor};
