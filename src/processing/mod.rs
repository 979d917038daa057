//! Processing module for transformations applied during playback
//!
//! Recorded coordinates are corrected into actuator space before replay.

pub mod coordinate_correction;

pub use coordinate_correction::CoordinateCorrection;
