// src/geometry/quadrant.rs
//! Quadrant classification around the calibration center.
//!
//! The four quadrants partition the frame around the reference-frame
//! centroid. Each is bound to a fixed actuator orientation (see
//! `config::AngleConfig`), so grouping delivery by quadrant lets the
//! device work one region at a time.

use serde::{Deserialize, Serialize};

use super::PxPoint;

/// Fixed quadrant labels, in delivery priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    /// Quadrant 1, x right of center, y above.
    UpperRight,
    /// Quadrant 2.
    UpperLeft,
    /// Quadrant 3.
    LowerLeft,
    /// Quadrant 4.
    LowerRight,
}

impl Quadrant {
    /// Delivery priority order; batching concatenates partitions in this order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::UpperRight,
        Quadrant::UpperLeft,
        Quadrant::LowerLeft,
        Quadrant::LowerRight,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Quadrant::UpperRight => "Q1 (upper right)",
            Quadrant::UpperLeft => "Q2 (upper left)",
            Quadrant::LowerLeft => "Q3 (lower left)",
            Quadrant::LowerRight => "Q4 (lower right)",
        }
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies a pixel point against the frame center `(cx, cy)`.
///
/// The conditions overlap on the center axes on purpose; evaluating them
/// in this fixed order resolves axis points to the earliest matching
/// quadrant, so the center itself is `UpperRight`. Total for any finite
/// input. Note image y grows downward, hence "upper" pairs with `y <= cy`.
pub fn classify(p: PxPoint, center: [f64; 2]) -> Quadrant {
    let (x, y) = (p.x as f64, p.y as f64);
    let [cx, cy] = center;
    if x >= cx && y <= cy {
        Quadrant::UpperRight
    } else if x <= cx && y <= cy {
        Quadrant::UpperLeft
    } else if x <= cx && y >= cy {
        Quadrant::LowerLeft
    } else {
        Quadrant::LowerRight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: [f64; 2] = [250.0, 200.0];

    #[test]
    fn classifies_interior_points() {
        assert_eq!(classify(PxPoint::new(300, 100), CENTER), Quadrant::UpperRight);
        assert_eq!(classify(PxPoint::new(100, 100), CENTER), Quadrant::UpperLeft);
        assert_eq!(classify(PxPoint::new(100, 300), CENTER), Quadrant::LowerLeft);
        assert_eq!(classify(PxPoint::new(300, 300), CENTER), Quadrant::LowerRight);
    }

    #[test]
    fn center_resolves_to_first_quadrant() {
        assert_eq!(classify(PxPoint::new(250, 200), CENTER), Quadrant::UpperRight);
    }

    #[test]
    fn axis_points_resolve_in_priority_order() {
        // on the vertical axis above center: Q1 wins over Q2
        assert_eq!(classify(PxPoint::new(250, 100), CENTER), Quadrant::UpperRight);
        // on the horizontal axis left of center: Q2 wins over Q3
        assert_eq!(classify(PxPoint::new(100, 200), CENTER), Quadrant::UpperLeft);
        // on the vertical axis below center: Q3 wins over Q4
        assert_eq!(classify(PxPoint::new(250, 300), CENTER), Quadrant::LowerLeft);
        // right of center on the horizontal axis: Q1 (y == cy satisfies y <= cy)
        assert_eq!(classify(PxPoint::new(300, 200), CENTER), Quadrant::UpperRight);
    }

    #[test]
    fn classification_is_total_over_a_grid() {
        for x in (0..500).step_by(7) {
            for y in (0..400).step_by(7) {
                // just must not panic; every point gets exactly one label
                let _ = classify(PxPoint::new(x, y), CENTER);
            }
        }
    }
}
