//! Geometry model: circle placements and the raw measurements of a layout.
//!
//! Objects are identical circles of a fixed radius. A layout is described
//! purely by the circle centers; the two measurements the objective needs are
//! the side of the axis-aligned square enclosing all centers and the pairwise
//! overlap between circles.

use nalgebra::{Point2, Vector2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Added under the square root when measuring center distances.
///
/// Keeps the distance gradient finite when two centers coincide.
pub const DISTANCE_EPSILON: f64 = 1e-6;

/// Axis-aligned bounding box of a set of centers.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Minimum x coordinate.
    pub min_x: f64,
    /// Minimum y coordinate.
    pub min_y: f64,
    /// Maximum x coordinate.
    pub max_x: f64,
    /// Maximum y coordinate.
    pub max_y: f64,
}

impl BoundingBox {
    /// Computes the bounding box of `points`, or `None` if there are none.
    pub fn from_points(points: &[Point2<f64>]) -> Option<Self> {
        let first = points.first()?;
        let init = Self {
            min_x: first.x,
            min_y: first.y,
            max_x: first.x,
            max_y: first.y,
        };

        Some(points.iter().skip(1).fold(init, |b, p| Self {
            min_x: b.min_x.min(p.x),
            min_y: b.min_y.min(p.y),
            max_x: b.max_x.max(p.x),
            max_y: b.max_y.max(p.y),
        }))
    }

    /// Extent along x.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along y.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Side of the smallest axis-aligned square containing the box.
    pub fn side(&self) -> f64 {
        self.width().max(self.height())
    }

    /// Lower-left corner.
    pub fn min(&self) -> Point2<f64> {
        Point2::new(self.min_x, self.min_y)
    }

    /// Upper-right corner.
    pub fn max(&self) -> Point2<f64> {
        Point2::new(self.max_x, self.max_y)
    }
}

/// Side length of the minimal axis-aligned square bounding all centers.
///
/// Zero for empty and single-object layouts.
pub fn enclosure_side(positions: &[Point2<f64>]) -> f64 {
    BoundingBox::from_points(positions).map_or(0.0, |b| b.side())
}

/// Center distance with [`DISTANCE_EPSILON`] added under the root.
#[inline]
pub fn smoothed_distance(a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    ((a - b).norm_squared() + DISTANCE_EPSILON).sqrt()
}

/// Penetration depth of two circles of `radius` at smoothed distance `distance`.
#[inline]
pub fn overlap_depth(distance: f64, radius: f64) -> f64 {
    (2.0 * radius - distance).max(0.0)
}

/// A pair of distinct circles that intersect.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlapPair {
    /// Lower index of the pair.
    pub i: usize,
    /// Higher index of the pair.
    pub j: usize,
    /// Smoothed center distance.
    pub distance: f64,
    /// `2r - distance`, always positive.
    pub overlap: f64,
}

/// Lists every unordered pair `i < j` whose circles overlap.
///
/// Pairs at distance `>= 2r` are omitted; self-pairs never appear.
pub fn pairwise_overlap(positions: &[Point2<f64>], radius: f64) -> Vec<OverlapPair> {
    let mut pairs = Vec::new();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let distance = smoothed_distance(&positions[i], &positions[j]);
            let overlap = overlap_depth(distance, radius);
            if overlap > 0.0 {
                pairs.push(OverlapPair {
                    i,
                    j,
                    distance,
                    overlap,
                });
            }
        }
    }
    pairs
}

/// Sum of squared overlap over all unordered pairs.
pub fn overlap_sum_squares(positions: &[Point2<f64>], radius: f64) -> f64 {
    pairwise_overlap(positions, radius)
        .iter()
        .map(|p| p.overlap * p.overlap)
        .sum()
}

/// Smallest exact center distance, or `None` for fewer than two objects.
pub fn min_pair_distance(positions: &[Point2<f64>]) -> Option<f64> {
    let mut best: Option<f64> = None;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            let d = (positions[i] - positions[j]).norm();
            best = Some(best.map_or(d, |b| b.min(d)));
        }
    }
    best
}

/// Shifts all positions so the minimum x and minimum y become zero.
///
/// Distances and the enclosure side are unchanged.
pub fn translate_to_origin(positions: &mut [Point2<f64>]) {
    if let Some(bbox) = BoundingBox::from_points(positions) {
        let offset = Vector2::new(bbox.min_x, bbox.min_y);
        for p in positions.iter_mut() {
            *p -= offset;
        }
    }
}

/// One circle of a layout.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlacedCircle {
    /// Index within the layout (0..N).
    pub index: usize,
    /// Center.
    pub position: Point2<f64>,
    /// Radius shared by every circle of the layout.
    pub radius: f64,
}

/// An ordered set of N circle centers sharing one radius.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Layout {
    /// Circle radius.
    pub radius: f64,
    /// Centers, indexed 0..N.
    pub positions: Vec<Point2<f64>>,
}

impl Layout {
    /// Creates a layout from centers.
    pub fn new(radius: f64, positions: Vec<Point2<f64>>) -> Self {
        Self { radius, positions }
    }

    /// Number of objects.
    pub fn n(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the layout holds no objects.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates over the circles in index order.
    pub fn objects(&self) -> impl Iterator<Item = PlacedCircle> + '_ {
        self.positions
            .iter()
            .enumerate()
            .map(move |(index, &position)| PlacedCircle {
                index,
                position,
                radius: self.radius,
            })
    }

    /// Bounding box of the centers.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.positions)
    }

    /// Enclosure side over centers.
    pub fn enclosure_side(&self) -> f64 {
        enclosure_side(&self.positions)
    }

    /// Side of the square enclosing the discs themselves (`side + 2r`).
    pub fn padded_side(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.enclosure_side() + 2.0 * self.radius
        }
    }

    /// Overlapping pairs of this layout.
    pub fn overlaps(&self) -> Vec<OverlapPair> {
        pairwise_overlap(&self.positions, self.radius)
    }

    /// Smallest center distance.
    pub fn min_pair_distance(&self) -> Option<f64> {
        min_pair_distance(&self.positions)
    }

    /// True if every pair is at least `2r - tolerance` apart.
    pub fn is_overlap_free(&self, tolerance: f64) -> bool {
        self.min_pair_distance()
            .map_or(true, |d| d >= 2.0 * self.radius - tolerance)
    }

    /// Translates in place so the minimum coordinates are zero.
    pub fn normalize(&mut self) {
        translate_to_origin(&mut self.positions);
    }

    /// Returns a copy translated to non-negative coordinates.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.normalize();
        out
    }
}
