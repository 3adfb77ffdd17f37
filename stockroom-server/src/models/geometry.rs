//! Region rectangles in image pixel space

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// A point in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Axis-aligned rectangle. No bounds or sign checks: regions are drawn
/// over arbitrary images and the client owns the coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Build a rectangle, rejecting NaN and infinities.
    ///
    /// The center must also be finite: `x = width = 1e308` passes the
    /// field checks but its center overflows.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, ValidationError> {
        for (field, value) in [("x", x), ("y", y), ("width", width), ("height", height)] {
            if !value.is_finite() {
                return Err(ValidationError::OutOfRange {
                    field,
                    value: value.to_string(),
                });
            }
        }

        let rect = Self { x, y, width, height };
        let center = rect.center();
        if !center.x.is_finite() {
            return Err(ValidationError::OutOfRange {
                field: "width",
                value: width.to_string(),
            });
        }
        if !center.y.is_finite() {
            return Err(ValidationError::OutOfRange {
                field: "height",
                value: height.to_string(),
            });
        }
        Ok(rect)
    }

    /// Center point, used to aim the indicator LED.
    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_point() {
        let rect = Rect::new(10.0, 20.0, 40.0, 60.0).unwrap();
        assert_eq!(rect.center(), Point { x: 30.0, y: 50.0 });
    }

    #[test]
    fn center_with_odd_size() {
        let rect = Rect::new(0.0, 0.0, 5.0, 3.0).unwrap();
        assert_eq!(rect.center(), Point { x: 2.5, y: 1.5 });
    }

    #[test]
    fn negative_sizes_allowed() {
        let rect = Rect::new(100.0, 100.0, -20.0, -10.0).unwrap();
        assert_eq!(rect.center(), Point { x: 90.0, y: 95.0 });
    }

    #[test]
    fn rejects_non_finite() {
        let err = Rect::new(f64::NAN, 0.0, 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "x", .. }));
        assert!(Rect::new(0.0, 0.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn rejects_overflowing_center() {
        let err = Rect::new(1e308, 0.0, 1e308, 1.0).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "width", .. }));

        let err = Rect::new(0.0, -1e308, 1.0, -1e308).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { field: "height", .. }));

        // Half the width still fits
        let rect = Rect::new(1e308, 0.0, 1e307, 0.0).unwrap();
        assert!(rect.center().x.is_finite());
    }
}
