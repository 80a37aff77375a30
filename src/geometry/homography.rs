// src/geometry/homography.rs
//! Planar homography estimation (normalized DLT) and projection.
//!
//! The calibration maps captured-frame pixels onto the physical work
//! surface in millimeters. Four corner correspondences determine the
//! transform exactly; we still run the normalized DLT rather than a
//! direct 8x8 solve so degenerate inputs surface as a rank deficiency
//! instead of a blow-up.

use nalgebra::{DMatrix, Matrix3, Vector3};

use super::{MmPoint, PxPoint};

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Collinear or duplicate correspondences; no invertible transform exists.
    DegenerateCorners,
    NumericalFailure(String),
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateCorners => {
                write!(f, "reference corners are degenerate (collinear or coincident)")
            }
            Self::NumericalFailure(msg) => write!(f, "homography estimation failed: {}", msg),
        }
    }
}

impl std::error::Error for CalibrationError {}

/// Pixel -> millimeter projective transform.
///
/// The stored sense is fixed at estimation time and never implicitly
/// inverted; callers that would need mm -> pixel must estimate their own.
#[derive(Debug, Clone, PartialEq)]
pub struct Homography {
    m: Matrix3<f64>,
}

impl Homography {
    /// Estimates H such that `dst ≈ H * src` from >=4 correspondences.
    pub fn from_correspondences(
        src: &[[f64; 2]],
        dst: &[[f64; 2]],
    ) -> Result<Self, CalibrationError> {
        if src.len() < 4 || src.len() != dst.len() {
            return Err(CalibrationError::NumericalFailure(format!(
                "need matched correspondence sets of >=4 points, got {} and {}",
                src.len(),
                dst.len()
            )));
        }

        let (t_src, src_n) = hartley_normalize(src);
        let (t_dst, dst_n) = hartley_normalize(dst);

        // Two rows of the DLT design matrix per correspondence.
        let n = src.len();
        let mut a = DMatrix::zeros(2 * n, 9);
        for (i, (s, d)) in src_n.iter().zip(&dst_n).enumerate() {
            let (sx, sy) = (s[0], s[1]);
            let (dx, dy) = (d[0], d[1]);
            let r = 2 * i;
            a[(r, 3)] = -sx;
            a[(r, 4)] = -sy;
            a[(r, 5)] = -1.0;
            a[(r, 6)] = dy * sx;
            a[(r, 7)] = dy * sy;
            a[(r, 8)] = dy;
            a[(r + 1, 0)] = sx;
            a[(r + 1, 1)] = sy;
            a[(r + 1, 2)] = 1.0;
            a[(r + 1, 6)] = -dx * sx;
            a[(r + 1, 7)] = -dx * sy;
            a[(r + 1, 8)] = -dx;
        }

        // Null vector of A = eigenvector of A^T A with the smallest eigenvalue.
        let ata = a.transpose() * &a;
        let eig = nalgebra::SymmetricEigen::new(ata);
        let mut min_idx = 0;
        for i in 1..9 {
            if eig.eigenvalues[i].abs() < eig.eigenvalues[min_idx].abs() {
                min_idx = i;
            }
        }

        // Collinear or coincident correspondences leave a null space of
        // dimension >1: the second-smallest eigenvalue collapses too.
        let mut magnitudes: Vec<f64> = eig.eigenvalues.iter().map(|v| v.abs()).collect();
        magnitudes.sort_by(|a, b| a.total_cmp(b));
        if magnitudes[1] <= 1e-9 * magnitudes[8].max(1e-12) {
            return Err(CalibrationError::DegenerateCorners);
        }

        let h = Matrix3::from_fn(|r, c| eig.eigenvectors[(3 * r + c, min_idx)]);

        let t_dst_inv = t_dst
            .try_inverse()
            .ok_or_else(|| CalibrationError::NumericalFailure("normalization not invertible".into()))?;
        let mut h = t_dst_inv * h * t_src;

        let scale = h[(2, 2)];
        if scale.abs() > 1e-12 {
            h /= scale;
        }

        if h.iter().any(|v| !v.is_finite()) || h.try_inverse().is_none() {
            return Err(CalibrationError::DegenerateCorners);
        }
        Ok(Homography { m: h })
    }

    /// Homogeneous multiply + de-homogenize. Pixel in, millimeters out.
    pub fn project(&self, p: PxPoint) -> MmPoint {
        let v = self.m * Vector3::new(p.x as f64, p.y as f64, 1.0);
        if v[2].abs() < 1e-15 {
            // off the plane at infinity; cannot happen for a calibrated
            // frame point but keep the guard rather than dividing by zero
            return MmPoint {
                x: f64::NAN,
                y: f64::NAN,
            };
        }
        MmPoint {
            x: v[0] / v[2],
            y: v[1] / v[2],
        }
    }
}

/// Translate the centroid to the origin and scale the mean distance from
/// it to sqrt(2), returning the transform alongside the remapped points.
fn hartley_normalize(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let remapped = pts
        .iter()
        .map(|p| [s * (p[0] - cx), s * (p[1] - cy)])
        .collect();
    (t, remapped)
}
