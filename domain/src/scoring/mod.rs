//! Score harmonization, calibration, and divergence detection.

pub mod calibration;
pub mod divergence;
pub mod harmonize;
pub mod synthesis;
