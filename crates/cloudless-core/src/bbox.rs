//! Annotated bounding boxes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A rectangular cloud annotation in pixel coordinates.
///
/// Values are signed because annotations come from a browser-side selection
/// tool and may be degenerate; validity against a concrete image is checked
/// with [`BoundingBox::fits_within`] when the box is cropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

/// Errors produced while parsing an `"x,y,width,height"` annotation string.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoundingBoxParseError {
    #[error("expected 4 comma-separated values, got {0}")]
    WrongArity(usize),
    #[error("invalid integer {value:?} in bounding box")]
    InvalidNumber { value: String },
}

impl BoundingBox {
    pub fn new(x: i64, y: i64, width: i64, height: i64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, `None` if it does not fit an `i64`.
    #[inline]
    pub fn right(&self) -> Option<i64> {
        self.x.checked_add(self.width)
    }

    /// Exclusive bottom edge, `None` if it does not fit an `i64`.
    #[inline]
    pub fn bottom(&self) -> Option<i64> {
        self.y.checked_add(self.height)
    }

    /// True if the box has a positive area and lies fully inside an image of
    /// the given size. Boxes whose edges overflow never fit.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x >= 0
            && self.y >= 0
            && self
                .right()
                .is_some_and(|r| r <= i64::from(image_width))
            && self
                .bottom()
                .is_some_and(|b| b <= i64::from(image_height))
    }
}

impl FromStr for BoundingBox {
    type Err = BoundingBoxParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BoundingBoxParseError::WrongArity(parts.len()));
        }
        let mut values = [0i64; 4];
        for (slot, raw) in values.iter_mut().zip(&parts) {
            *slot = raw
                .parse()
                .map_err(|_| BoundingBoxParseError::InvalidNumber {
                    value: (*raw).to_string(),
                })?;
        }
        let [x, y, width, height] = values;
        Ok(Self::new(x, y, width, height))
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_annotation_strings() {
        let b: BoundingBox = "10, 20,30,40".parse().expect("parse");
        assert_eq!(b, BoundingBox::new(10, 20, 30, 40));
        assert_eq!(b.right(), Some(40));
        assert_eq!(b.bottom(), Some(60));
        assert_eq!(b.to_string(), "10,20,30,40");
    }

    #[test]
    fn rejects_malformed_strings() {
        assert_eq!(
            "1,2,3".parse::<BoundingBox>(),
            Err(BoundingBoxParseError::WrongArity(3))
        );
        assert!(matches!(
            "1,2,x,4".parse::<BoundingBox>(),
            Err(BoundingBoxParseError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn fits_within_checks_area_and_extent() {
        assert!(BoundingBox::new(0, 0, 10, 10).fits_within(10, 10));
        assert!(!BoundingBox::new(1, 0, 10, 10).fits_within(10, 10));
        assert!(!BoundingBox::new(0, 0, 0, 5).fits_within(10, 10));
        assert!(!BoundingBox::new(-1, 0, 5, 5).fits_within(10, 10));
        assert!(!BoundingBox::new(2, 2, -1, 3).fits_within(10, 10));
    }

    #[test]
    fn overflowing_edges_never_fit() {
        let b: BoundingBox = "9223372036854775807,0,10,10".parse().expect("parse");
        assert_eq!(b.right(), None);
        assert!(!b.fits_within(100, 100));

        let b = BoundingBox::new(0, 5, 10, i64::MAX);
        assert_eq!(b.bottom(), None);
        assert!(!b.fits_within(u32::MAX, u32::MAX));
    }
}
