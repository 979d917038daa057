//! Capture-space to actuator-space coordinate correction
//!
//! Hooks report cursor positions in screen pixels while the actuator moves in
//! its own coordinate space. Recorded positions are scaled per axis and then
//! shifted before every replayed move.

use crate::actions::model::Position;
use serde::{Deserialize, Serialize};

/// Default horizontal scale factor
pub const DEFAULT_INACCURACY_X: f64 = 34.2;
/// Default vertical scale factor
pub const DEFAULT_INACCURACY_Y: f64 = 60.8;

/// Per-axis `actuator = recorded * scale + offset` mapping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateCorrection {
    pub scale_x: f64,
    pub scale_y: f64,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

impl Default for CoordinateCorrection {
    fn default() -> Self {
        Self {
            scale_x: DEFAULT_INACCURACY_X,
            scale_y: DEFAULT_INACCURACY_Y,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl CoordinateCorrection {
    /// Leave coordinates untouched
    pub fn identity() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Map a recorded position into actuator space
    pub fn apply(&self, position: Position) -> (f64, f64) {
        (
            f64::from(position.x) * self.scale_x + self.offset_x,
            f64::from(position.y) * self.scale_y + self.offset_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scales_each_axis() {
        let (x, y) = CoordinateCorrection::default().apply(Position::new(10, 2));
        assert!((x - 342.0).abs() < 1e-9);
        assert!((y - 121.6).abs() < 1e-9);
    }

    #[test]
    fn test_identity_keeps_position() {
        assert_eq!(
            CoordinateCorrection::identity().apply(Position::new(-4, 7)),
            (-4.0, 7.0)
        );
    }

    #[test]
    fn test_offset_applies_after_scale() {
        let correction = CoordinateCorrection {
            scale_x: 2.0,
            scale_y: 0.5,
            offset_x: 10.0,
            offset_y: -1.0,
        };
        assert_eq!(correction.apply(Position::new(3, 4)), (16.0, 1.0));
    }

    #[test]
    fn test_deserialize_without_offsets() {
        let correction: CoordinateCorrection =
            serde_json::from_str(r#"{ "scaleX": 1.5, "scaleY": 2.0 }"#).unwrap();
        assert_eq!(correction.offset_x, 0.0);
        assert_eq!(correction.apply(Position::new(2, 2)), (3.0, 4.0));
    }
}
