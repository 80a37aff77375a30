// src/geometry/fill.rs
//! Boustrophedon area fill over an operator-drawn polygon.
//!
//! Candidate points are laid on a `spacing`-pitch grid over the polygon's
//! bounding box, kept when inside or on the boundary, and emitted row by
//! row with every odd-indexed row reversed so consecutive points stay
//! close across row boundaries. Row parity is counted over *candidate*
//! rows, including rows with no hits; a fully outside row still flips the
//! direction of the rows after it.

use super::PxPoint;

/// Boundary-inclusive point-in-polygon test.
///
/// Even-odd ray cast for the interior, preceded by an exact integer
/// on-segment test so boundary points are always in regardless of the
/// ray's edge-crossing conventions.
pub fn point_in_polygon(p: PxPoint, polygon: &[PxPoint]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut j = n - 1;
    let mut inside = false;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if on_segment(p, a, b) {
            return true;
        }
        let (ax, ay) = (a.x as f64, a.y as f64);
        let (bx, by) = (b.x as f64, b.y as f64);
        let (px, py) = (p.x as f64, p.y as f64);
        if ((ay > py) != (by > py)) && px < (bx - ax) * (py - ay) / (by - ay) + ax {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn on_segment(p: PxPoint, a: PxPoint, b: PxPoint) -> bool {
    let cross = (b.x as i64 - a.x as i64) * (p.y as i64 - a.y as i64)
        - (b.y as i64 - a.y as i64) * (p.x as i64 - a.x as i64);
    cross == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Plans the serpentine fill for `polygon` at the given grid pitch.
///
/// Degenerate polygons (<3 vertices) and non-positive spacing yield an
/// empty plan; vertex-count validation belongs to the session, and a grid
/// with zero interior hits is a legitimate empty result callers must
/// expect. Output is deterministic for identical input.
pub fn plan_fill(polygon: &[PxPoint], spacing: i32) -> Vec<PxPoint> {
    if polygon.len() < 3 || spacing <= 0 {
        return Vec::new();
    }

    let min_x = polygon.iter().map(|p| p.x).min().unwrap_or(0);
    let max_x = polygon.iter().map(|p| p.x).max().unwrap_or(0);
    let min_y = polygon.iter().map(|p| p.y).min().unwrap_or(0);
    let max_y = polygon.iter().map(|p| p.y).max().unwrap_or(0);

    let mut points = Vec::new();
    let mut row_idx = 0usize;
    let mut y = min_y;
    while y <= max_y {
        let mut row: Vec<PxPoint> = Vec::new();
        let mut x = min_x;
        while x <= max_x {
            let candidate = PxPoint::new(x, y);
            if point_in_polygon(candidate, polygon) {
                row.push(candidate);
            }
            x += spacing;
        }
        if row_idx % 2 == 1 {
            row.reverse();
        }
        points.extend(row);
        row_idx += 1;
        y += spacing;
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Vec<PxPoint> {
        vec![
            PxPoint::new(150, 150),
            PxPoint::new(350, 150),
            PxPoint::new(350, 250),
            PxPoint::new(150, 250),
        ]
    }

    #[test]
    fn containment_is_boundary_inclusive() {
        let poly = rect();
        assert!(point_in_polygon(PxPoint::new(250, 200), &poly));
        assert!(point_in_polygon(PxPoint::new(150, 150), &poly)); // vertex
        assert!(point_in_polygon(PxPoint::new(250, 150), &poly)); // edge
        assert!(point_in_polygon(PxPoint::new(350, 250), &poly)); // far vertex
        assert!(!point_in_polygon(PxPoint::new(149, 200), &poly));
        assert!(!point_in_polygon(PxPoint::new(250, 251), &poly));
    }

    #[test]
    fn containment_handles_concave_polygon() {
        // an L shape; the notch is outside
        let poly = vec![
            PxPoint::new(0, 0),
            PxPoint::new(100, 0),
            PxPoint::new(100, 40),
            PxPoint::new(40, 40),
            PxPoint::new(40, 100),
            PxPoint::new(0, 100),
        ];
        assert!(point_in_polygon(PxPoint::new(20, 80), &poly));
        assert!(point_in_polygon(PxPoint::new(80, 20), &poly));
        assert!(!point_in_polygon(PxPoint::new(80, 80), &poly));
    }

    #[test]
    fn reference_rectangle_serpentine_rows() {
        let plan = plan_fill(&rect(), 30);

        // rows at y = 150, 180, 210, 240; columns 150..=330 step 30
        let xs: Vec<i32> = (0..7).map(|i| 150 + 30 * i).collect();
        let mut expected = Vec::new();
        for (row_idx, y) in [150, 180, 210, 240].into_iter().enumerate() {
            let mut row: Vec<PxPoint> = xs.iter().map(|&x| PxPoint::new(x, y)).collect();
            if row_idx % 2 == 1 {
                row.reverse();
            }
            expected.extend(row);
        }
        assert_eq!(plan, expected);
    }

    #[test]
    fn all_planned_points_lie_inside_and_are_unique() {
        let poly = vec![
            PxPoint::new(10, 10),
            PxPoint::new(200, 40),
            PxPoint::new(180, 220),
            PxPoint::new(30, 180),
        ];
        let plan = plan_fill(&poly, 25);
        assert!(!plan.is_empty());
        for p in &plan {
            assert!(point_in_polygon(*p, &poly), "{} escaped the polygon", p);
        }
        let mut dedup = plan.clone();
        dedup.sort_unstable_by_key(|p| (p.y, p.x));
        dedup.dedup();
        assert_eq!(dedup.len(), plan.len(), "duplicate points in plan");
    }

    #[test]
    fn row_direction_alternates_by_candidate_row() {
        let plan = plan_fill(&rect(), 30);
        let row0: Vec<i32> = plan.iter().filter(|p| p.y == 150).map(|p| p.x).collect();
        let row1: Vec<i32> = plan.iter().filter(|p| p.y == 180).map(|p| p.x).collect();
        assert!(row0.windows(2).all(|w| w[0] < w[1]), "even row must ascend");
        assert!(row1.windows(2).all(|w| w[0] > w[1]), "odd row must descend");
    }

    #[test]
    fn empty_candidate_row_still_flips_parity() {
        // dumbbell: two full-width bars joined by a thin connector at
        // x in [4, 6] that dodges every grid column, so the candidate
        // row at y = 10 has zero hits
        let poly = vec![
            PxPoint::new(0, 0),
            PxPoint::new(40, 0),
            PxPoint::new(40, 2),
            PxPoint::new(6, 2),
            PxPoint::new(6, 18),
            PxPoint::new(40, 18),
            PxPoint::new(40, 20),
            PxPoint::new(0, 20),
            PxPoint::new(0, 18),
            PxPoint::new(4, 18),
            PxPoint::new(4, 2),
            PxPoint::new(0, 2),
        ];
        let plan = plan_fill(&poly, 10);

        assert!(plan.iter().all(|p| p.y == 0 || p.y == 20), "y = 10 row must be empty");

        // y = 20 is candidate row 2 (the empty row at y = 10 still
        // counts), so it ascends; counting only non-empty rows would
        // have reversed it
        let top: Vec<i32> = plan.iter().filter(|p| p.y == 20).map(|p| p.x).collect();
        assert_eq!(top, vec![0, 10, 20, 30, 40]);
        let bottom: Vec<i32> = plan.iter().filter(|p| p.y == 0).map(|p| p.x).collect();
        assert_eq!(bottom, vec![0, 10, 20, 30, 40]);
    }

    #[test]
    fn planner_is_idempotent() {
        let poly = vec![
            PxPoint::new(0, 0),
            PxPoint::new(97, 3),
            PxPoint::new(90, 110),
            PxPoint::new(-5, 95),
        ];
        assert_eq!(plan_fill(&poly, 17), plan_fill(&poly, 17));
    }

    #[test]
    fn degenerate_inputs_yield_empty_plans() {
        assert!(plan_fill(&[], 30).is_empty());
        assert!(plan_fill(&[PxPoint::new(0, 0), PxPoint::new(10, 10)], 30).is_empty());
        assert!(plan_fill(&rect(), 0).is_empty());
        // the only grid candidate is the bbox corner, which this triangle misses
        let sliver = vec![
            PxPoint::new(0, 10),
            PxPoint::new(10, 0),
            PxPoint::new(20, 20),
        ];
        assert!(plan_fill(&sliver, 30).is_empty());
    }
}
