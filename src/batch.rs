// src/batch.rs
//! Projects planner output into physical coordinates and batches it by
//! quadrant for delivery.
//!
//! The queue concatenates the four quadrant partitions in fixed priority
//! order (Q1, Q2, Q3, Q4), stable within each partition, so the device
//! finishes one spatial region before moving to the next.

use crate::geometry::homography::Homography;
use crate::geometry::quadrant::{classify, Quadrant};
use crate::geometry::{MmPoint, PxPoint};

/// A fill point projected and classified, ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPoint {
    pub pixel: PxPoint,
    pub physical: MmPoint,
    pub quadrant: Quadrant,
}

/// Ordered delivery queue with a monotone cursor.
///
/// Built by [`build_queue`]; after that only the delivery protocol moves
/// the cursor, one step per device acknowledgment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeliveryQueue {
    points: Vec<PlannedPoint>,
    next_index: usize,
}

impl DeliveryQueue {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn points(&self) -> &[PlannedPoint] {
        &self.points
    }

    /// The point the next transmission will carry, if any remain.
    pub fn current(&self) -> Option<&PlannedPoint> {
        self.points.get(self.next_index)
    }

    /// Moves the cursor past the point just transmitted. Saturates at the
    /// queue length; never rewinds.
    pub fn advance(&mut self) {
        if self.next_index < self.points.len() {
            self.next_index += 1;
        }
    }

    /// A fresh cursor over the same points, for re-sending a session's
    /// retained plan from the start.
    pub fn rearmed(&self) -> DeliveryQueue {
        DeliveryQueue {
            points: self.points.clone(),
            next_index: 0,
        }
    }
}

/// Projects and classifies every planner point, then partitions the lot
/// by quadrant in priority order.
pub fn build_queue(points: &[PxPoint], homography: &Homography, center: [f64; 2]) -> DeliveryQueue {
    let planned: Vec<PlannedPoint> = points
        .iter()
        .map(|&pixel| PlannedPoint {
            pixel,
            physical: homography.project(pixel),
            quadrant: classify(pixel, center),
        })
        .collect();

    let mut ordered = Vec::with_capacity(planned.len());
    for quadrant in Quadrant::ALL {
        ordered.extend(planned.iter().filter(|p| p.quadrant == quadrant).cloned());
    }

    DeliveryQueue {
        points: ordered,
        next_index: 0,
    }
}
