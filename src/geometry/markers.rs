// src/geometry/markers.rs
//! Canonical ordering of the four fiducial marker centroids.
//!
//! The detector hands us four unlabeled pixel points belonging to one
//! marker color. Calibration needs them in a fixed corner order, so we
//! assign corners in closed form: the point with the smallest `x + y` is
//! top-left and the largest is bottom-right; the smallest `x - y` is
//! top-right and the largest is bottom-left. This only holds for the
//! roughly axis-aligned, convex layouts the markers are placed in; it is
//! not a general convex-hull ordering.

use super::PxPoint;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    /// A usable marker cluster must contain exactly four points.
    WrongCount { got: usize },
    /// Coincident points make the corner assignment meaningless.
    AmbiguousCorners,
}

impl std::fmt::Display for MarkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongCount { got } => {
                write!(f, "expected exactly 4 marker points, got {}", got)
            }
            Self::AmbiguousCorners => write!(f, "marker points do not form 4 distinct corners"),
        }
    }
}

impl std::error::Error for MarkerError {}

/// Four detected centroids for a single marker color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    points: [PxPoint; 4],
}

impl MarkerSet {
    pub fn new(points: &[PxPoint]) -> Result<Self, MarkerError> {
        match <[PxPoint; 4]>::try_from(points) {
            Ok(points) => Ok(MarkerSet { points }),
            Err(_) => Err(MarkerError::WrongCount { got: points.len() }),
        }
    }

    pub fn points(&self) -> &[PxPoint; 4] {
        &self.points
    }
}

/// Orders four marker points into `[TL, TR, BR, BL]`.
pub fn order_corners(set: &MarkerSet) -> Result<[PxPoint; 4], MarkerError> {
    let pts = set.points();

    let mut distinct = pts.to_vec();
    distinct.sort_unstable_by_key(|p| (p.x, p.y));
    distinct.dedup();
    if distinct.len() < 4 {
        return Err(MarkerError::AmbiguousCorners);
    }

    let by_sum = |p: &&PxPoint| p.x as i64 + p.y as i64;
    let by_diff = |p: &&PxPoint| p.x as i64 - p.y as i64;

    // min/max over a fixed-size non-empty array cannot fail
    let tl = *pts.iter().min_by_key(by_sum).expect("4 points");
    let br = *pts.iter().max_by_key(by_sum).expect("4 points");
    let tr = *pts.iter().max_by_key(by_diff).expect("4 points");
    let bl = *pts.iter().min_by_key(by_diff).expect("4 points");

    Ok([tl, tr, br, bl])
}

#[cfg(test)]
mod tests {
    use super::*;

    const TL: PxPoint = PxPoint::new(100, 100);
    const TR: PxPoint = PxPoint::new(400, 100);
    const BR: PxPoint = PxPoint::new(400, 300);
    const BL: PxPoint = PxPoint::new(100, 300);

    fn ordered(pts: [PxPoint; 4]) -> [PxPoint; 4] {
        order_corners(&MarkerSet::new(&pts).unwrap()).unwrap()
    }

    #[test]
    fn orders_rectangle_corners_from_any_permutation() {
        let expected = [TL, TR, BR, BL];
        // all 24 permutations of the rectangle corners
        let corners = [TL, TR, BR, BL];
        for a in 0..4 {
            for b in 0..4 {
                for c in 0..4 {
                    for d in 0..4 {
                        let idx = [a, b, c, d];
                        let mut seen = [false; 4];
                        if idx.iter().any(|&i| std::mem::replace(&mut seen[i], true)) {
                            continue;
                        }
                        let perm = [corners[a], corners[b], corners[c], corners[d]];
                        assert_eq!(ordered(perm), expected, "permutation {:?}", idx);
                    }
                }
            }
        }
    }

    #[test]
    fn orders_slightly_skewed_quad() {
        let got = ordered([
            PxPoint::new(390, 110),
            PxPoint::new(95, 305),
            PxPoint::new(105, 98),
            PxPoint::new(405, 290),
        ]);
        assert_eq!(got[0], PxPoint::new(105, 98));
        assert_eq!(got[1], PxPoint::new(390, 110));
        assert_eq!(got[2], PxPoint::new(405, 290));
        assert_eq!(got[3], PxPoint::new(95, 305));
    }

    #[test]
    fn rejects_wrong_count() {
        let err = MarkerSet::new(&[TL, TR, BR]).unwrap_err();
        assert_eq!(err, MarkerError::WrongCount { got: 3 });
        let err = MarkerSet::new(&[TL, TR, BR, BL, TL]).unwrap_err();
        assert_eq!(err, MarkerError::WrongCount { got: 5 });
    }

    #[test]
    fn rejects_duplicate_points() {
        let set = MarkerSet::new(&[TL, TL, BR, BL]).unwrap();
        assert_eq!(order_corners(&set).unwrap_err(), MarkerError::AmbiguousCorners);
    }
}
