//! Minimal 3D placement and range math for spatial extents.

use serde::{Deserialize, Serialize};

/// Smallest edge length a computed element range may have.
const MIN_RANGE_LENGTH: f64 = 1.0e-3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3d {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3d {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation in degrees: yaw about Z, pitch about Y, roll about X.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct YawPitchRoll {
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl YawPitchRoll {
    pub fn is_identity(&self) -> bool {
        self.yaw == 0.0 && self.pitch == 0.0 && self.roll == 0.0
    }

    fn rotate(&self, p: Point3d) -> Point3d {
        if self.is_identity() {
            return p;
        }
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        let (sr, cr) = self.roll.to_radians().sin_cos();

        // Rz(yaw) * Ry(pitch) * Rx(roll)
        let x = cy * cp * p.x + (cy * sp * sr - sy * cr) * p.y + (cy * sp * cr + sy * sr) * p.z;
        let y = sy * cp * p.x + (sy * sp * sr + cy * cr) * p.y + (sy * sp * cr - cy * sr) * p.z;
        let z = -sp * p.x + cp * sr * p.y + cp * cr * p.z;
        Point3d::new(x, y, z)
    }
}

/// Axis-aligned box. A range with `low > high` on any axis is null (empty).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range3d {
    pub low: Point3d,
    pub high: Point3d,
}

impl Default for Range3d {
    fn default() -> Self {
        Self::null()
    }
}

impl Range3d {
    pub fn null() -> Self {
        Self {
            low: Point3d::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            high: Point3d::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn new(low: Point3d, high: Point3d) -> Self {
        let mut range = Self::null();
        range.extend_point(low);
        range.extend_point(high);
        range
    }

    /// Degenerate box at the origin.
    pub fn zero() -> Self {
        Self {
            low: Point3d::default(),
            high: Point3d::default(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.low.x > self.high.x || self.low.y > self.high.y || self.low.z > self.high.z
    }

    pub fn extend_point(&mut self, p: Point3d) {
        self.low.x = self.low.x.min(p.x);
        self.low.y = self.low.y.min(p.y);
        self.low.z = self.low.z.min(p.z);
        self.high.x = self.high.x.max(p.x);
        self.high.y = self.high.y.max(p.y);
        self.high.z = self.high.z.max(p.z);
    }

    pub fn extend_range(&mut self, other: &Range3d) {
        if other.is_null() {
            return;
        }
        self.extend_point(other.low);
        self.extend_point(other.high);
    }

    /// True when `other` lies entirely inside this range. A null `other` is
    /// contained by anything; a null range contains nothing else.
    pub fn contains_range(&self, other: &Range3d) -> bool {
        if other.is_null() {
            return true;
        }
        if self.is_null() {
            return false;
        }
        self.low.x <= other.low.x
            && self.low.y <= other.low.y
            && self.low.z <= other.low.z
            && self.high.x >= other.high.x
            && self.high.y >= other.high.y
            && self.high.z >= other.high.z
    }

    pub fn ensure_min_lengths(&mut self, min: f64) {
        if self.is_null() {
            return;
        }
        for (lo, hi) in [
            (&mut self.low.x, &mut self.high.x),
            (&mut self.low.y, &mut self.high.y),
            (&mut self.low.z, &mut self.high.z),
        ] {
            let length = *hi - *lo;
            if length < min {
                let pad = (min - length) / 2.0;
                *lo -= pad;
                *hi += pad;
            }
        }
    }

    fn corners(&self) -> [Point3d; 8] {
        let (l, h) = (self.low, self.high);
        [
            Point3d::new(l.x, l.y, l.z),
            Point3d::new(h.x, l.y, l.z),
            Point3d::new(l.x, h.y, l.z),
            Point3d::new(h.x, h.y, l.z),
            Point3d::new(l.x, l.y, h.z),
            Point3d::new(h.x, l.y, h.z),
            Point3d::new(l.x, h.y, h.z),
            Point3d::new(h.x, h.y, h.z),
        ]
    }
}

/// Element placement: origin, orientation and local bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement3d {
    pub origin: Point3d,
    pub angles: YawPitchRoll,
    pub bbox: Range3d,
}

impl Default for Placement3d {
    fn default() -> Self {
        Self {
            origin: Point3d::default(),
            angles: YawPitchRoll::default(),
            bbox: Range3d::zero(),
        }
    }
}

impl Placement3d {
    pub fn at(origin: Point3d) -> Self {
        Self {
            origin,
            ..Self::default()
        }
    }

    /// World-space axis-aligned range of the placed box.
    pub fn calculate_range(&self) -> Range3d {
        let mut range = Range3d::null();
        if self.bbox.is_null() {
            return range;
        }
        for corner in self.bbox.corners() {
            let r = self.angles.rotate(corner);
            range.extend_point(Point3d::new(
                r.x + self.origin.x,
                r.y + self.origin.y,
                r.z + self.origin.z,
            ));
        }
        range.ensure_min_lengths(MIN_RANGE_LENGTH);
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_null_range() {
        let r = Range3d::null();
        assert!(r.is_null());
        assert!(!r.contains_range(&Range3d::zero()));
        assert!(Range3d::zero().contains_range(&r));
    }

    #[test]
    fn test_zero_extent_placement_gets_min_length() {
        let range = Placement3d::at(Point3d::new(10.0, 20.0, 3.0)).calculate_range();
        assert!(!range.is_null());
        assert!(close(range.high.x - range.low.x, MIN_RANGE_LENGTH));
        assert!(close((range.high.x + range.low.x) / 2.0, 10.0));
        assert!(close((range.high.z + range.low.z) / 2.0, 3.0));
    }

    #[test]
    fn test_rotated_box_range() {
        let placement = Placement3d {
            origin: Point3d::new(1.0, 0.0, 0.0),
            angles: YawPitchRoll { yaw: 90.0, pitch: 0.0, roll: 0.0 },
            bbox: Range3d::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(2.0, 1.0, 1.0)),
        };
        let range = placement.calculate_range();
        assert!(close(range.low.x, 0.0));
        assert!(close(range.high.x, 1.0));
        assert!(close(range.low.y, 0.0));
        assert!(close(range.high.y, 2.0));
    }

    #[test]
    fn test_extend_and_contain() {
        let mut extents = Range3d::null();
        let a = Range3d::new(Point3d::new(0.0, 0.0, 0.0), Point3d::new(1.0, 1.0, 1.0));
        let b = Range3d::new(Point3d::new(5.0, -2.0, 0.0), Point3d::new(6.0, 0.0, 2.0));
        extents.extend_range(&a);
        extents.extend_range(&b);
        assert!(extents.contains_range(&a));
        assert!(extents.contains_range(&b));
        assert_eq!(extents.low, Point3d::new(0.0, -2.0, 0.0));
        assert_eq!(extents.high, Point3d::new(6.0, 1.0, 2.0));
    }
}
