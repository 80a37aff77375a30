// src/calibration.rs
//! Reference-frame calibration: ordered marker corners plus the known
//! physical rectangle size produce the pixel->mm homography and the
//! frame center used for quadrant classification.

use crate::geometry::homography::{CalibrationError, Homography};
use crate::geometry::PxPoint;

/// The calibrated reference frame. Immutable once installed; replaced
/// wholesale by the next successful calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFrame {
    /// Marker corners in `[TL, TR, BR, BL]` order.
    pub corners: [PxPoint; 4],
    /// Arithmetic mean of the corners. Kept fractional: rounding would
    /// move quadrant ties for frames whose corner sums are not divisible
    /// by four.
    pub center: [f64; 2],
}

#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    pub frame: ReferenceFrame,
    pub homography: Homography,
}

/// Builds the calibration from ordered corners and the physical rectangle
/// `(width_mm, height_mm)`, whose corners correspond in the same order:
/// `[(0,0), (W,0), (W,H), (0,H)]`.
pub fn calibrate(
    corners: [PxPoint; 4],
    surface_mm: (f64, f64),
) -> Result<Calibration, CalibrationError> {
    let (w, h) = surface_mm;
    let src: Vec<[f64; 2]> = corners.iter().map(|p| [p.x as f64, p.y as f64]).collect();
    let dst = [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]];
    let homography = Homography::from_correspondences(&src, &dst)?;

    let cx = corners.iter().map(|p| p.x as f64).sum::<f64>() / 4.0;
    let cy = corners.iter().map(|p| p.y as f64).sum::<f64>() / 4.0;

    Ok(Calibration {
        frame: ReferenceFrame {
            corners,
            center: [cx, cy],
        },
        homography,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_corners() -> [PxPoint; 4] {
        [
            PxPoint::new(100, 100),
            PxPoint::new(400, 100),
            PxPoint::new(400, 300),
            PxPoint::new(100, 300),
        ]
    }

    #[test]
    fn center_is_corner_centroid() {
        let cal = calibrate(reference_corners(), (70.0, 50.0)).unwrap();
        assert_eq!(cal.frame.center, [250.0, 200.0]);
    }

    #[test]
    fn fractional_center_is_preserved() {
        let corners = [
            PxPoint::new(100, 100),
            PxPoint::new(401, 100),
            PxPoint::new(401, 302),
            PxPoint::new(100, 302),
        ];
        let cal = calibrate(corners, (70.0, 50.0)).unwrap();
        assert_eq!(cal.frame.center, [250.5, 201.0]);
    }

    #[test]
    fn homography_recovers_surface_corners() {
        let cal = calibrate(reference_corners(), (70.0, 50.0)).unwrap();
        let mm = cal.homography.project(PxPoint::new(400, 300));
        assert!((mm.x - 70.0).abs() < 1e-6 && (mm.y - 50.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_corners_fail() {
        let corners = [
            PxPoint::new(0, 0),
            PxPoint::new(100, 100),
            PxPoint::new(200, 200),
            PxPoint::new(300, 300),
        ];
        assert!(calibrate(corners, (70.0, 50.0)).is_err());
    }
}
