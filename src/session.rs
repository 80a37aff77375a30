// src/session.rs
//! Single owner of all mutable session state.
//!
//! Exactly one calibration is active at a time; polygon, plan and queue
//! all hang off it and are discarded together on reset. The operator
//! lifecycle is capture-reference -> add vertices -> generate -> send ->
//! reset, and every operation validates its preconditions rather than
//! assuming the caller ordered them correctly.

use crate::batch::{build_queue, DeliveryQueue, PlannedPoint};
use crate::calibration::{calibrate, Calibration};
use crate::config::Config;
use crate::delivery::{self, DeliveryHandle};
use crate::device::{DeviceChannel, DeviceError};
use crate::geometry::homography::CalibrationError;
use crate::geometry::markers::{order_corners, MarkerError, MarkerSet};
use crate::geometry::quadrant::{classify, Quadrant};
use crate::geometry::{fill, MmPoint, PxPoint};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// An operation needed an active calibration and none exists.
    NotCalibrated,
    /// Fill generation needs at least three polygon vertices.
    PolygonTooSmall { got: usize },
    /// The polygon is append-only until generation locks it; further
    /// clicks are probes, not vertices, until a reset or recapture.
    PolygonLocked,
    /// Sending needs a non-empty generated queue.
    NoPlannedPoints,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCalibrated => write!(f, "no reference frame captured yet"),
            Self::PolygonTooSmall { got } => {
                write!(f, "polygon needs at least 3 vertices, has {}", got)
            }
            Self::PolygonLocked => {
                write!(f, "polygon is locked once points are generated; reset to redraw")
            }
            Self::NoPlannedPoints => write!(f, "no generated points to send"),
        }
    }
}

impl std::error::Error for InputError {}

#[derive(Debug)]
pub enum SessionError {
    Input(InputError),
    Marker(MarkerError),
    Calibration(CalibrationError),
    Device(DeviceError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(e) => e.fmt(f),
            Self::Marker(e) => e.fmt(f),
            Self::Calibration(e) => e.fmt(f),
            Self::Device(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Input(e) => Some(e),
            Self::Marker(e) => Some(e),
            Self::Calibration(e) => Some(e),
            Self::Device(e) => Some(e),
        }
    }
}

impl From<InputError> for SessionError {
    fn from(e: InputError) -> Self {
        Self::Input(e)
    }
}
impl From<MarkerError> for SessionError {
    fn from(e: MarkerError) -> Self {
        Self::Marker(e)
    }
}
impl From<CalibrationError> for SessionError {
    fn from(e: CalibrationError) -> Self {
        Self::Calibration(e)
    }
}
impl From<DeviceError> for SessionError {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

pub struct Session {
    config: Config,
    calibration: Option<Calibration>,
    polygon: Vec<PxPoint>,
    /// Fill points in planner emission order; probing scans these so the
    /// reported point does not depend on the quadrant reordering.
    plan: Vec<PxPoint>,
    queue: Option<DeliveryQueue>,
    delivery: Option<DeliveryHandle>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Session {
            config,
            calibration: None,
            polygon: Vec::new(),
            plan: Vec::new(),
            queue: None,
            delivery: None,
        }
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    pub fn polygon(&self) -> &[PxPoint] {
        &self.polygon
    }

    pub fn planned_points(&self) -> &[PlannedPoint] {
        self.queue.as_ref().map(|q| q.points()).unwrap_or(&[])
    }

    /// Orders the detected marker points, calibrates, and installs the
    /// new reference frame. On success any previous frame, polygon and
    /// plan are replaced; on failure the previous calibration stays
    /// active until a later attempt succeeds.
    pub fn capture_reference(&mut self, markers: &MarkerSet) -> Result<&Calibration, SessionError> {
        let corners = order_corners(markers)?;
        let surface = (self.config.surface.width_mm, self.config.surface.height_mm);
        let calibration = calibrate(corners, surface)?;
        log::info!(
            "Reference captured: corners {:?}, center ({:.1}, {:.1})",
            calibration.frame.corners,
            calibration.frame.center[0],
            calibration.frame.center[1]
        );

        self.polygon.clear();
        self.plan.clear();
        self.queue = None;
        Ok(self.calibration.insert(calibration))
    }

    /// Appends an operator-clicked vertex and reports its quadrant.
    ///
    /// The polygon is append-only until generation locks it; once a
    /// queue exists clicks are probes and further vertices are rejected
    /// until a reset or recapture.
    pub fn add_vertex(&mut self, p: PxPoint) -> Result<Quadrant, SessionError> {
        let cal = self.calibration.as_ref().ok_or(InputError::NotCalibrated)?;
        if self.queue.is_some() {
            return Err(InputError::PolygonLocked.into());
        }
        let quadrant = classify(p, cal.frame.center);
        self.polygon.push(p);
        log::info!("Vertex {} added: {} - {}", self.polygon.len(), p, quadrant);
        Ok(quadrant)
    }

    /// Plans the fill, projects and batches it, and arms the queue.
    pub fn generate(&mut self) -> Result<&DeliveryQueue, SessionError> {
        let cal = self.calibration.as_ref().ok_or(InputError::NotCalibrated)?;
        if self.polygon.len() < 3 {
            return Err(InputError::PolygonTooSmall {
                got: self.polygon.len(),
            }
            .into());
        }

        let pixels = fill::plan_fill(&self.polygon, self.config.surface.spacing_px);
        let queue = build_queue(&pixels, &cal.homography, cal.frame.center);
        log::info!("Generated {} points inside the polygon", queue.len());
        self.plan = pixels;
        Ok(self.queue.insert(queue))
    }

    /// The planned point within the probe radius of `p`, if any: its
    /// physical coordinates and quadrant, for operator inspection.
    ///
    /// Scans in planner emission order, so when the configured spacing
    /// puts two points inside the radius the earlier-planned one wins,
    /// independent of the queue's quadrant grouping.
    pub fn probe(&self, p: PxPoint) -> Option<(PxPoint, MmPoint, Quadrant)> {
        let cal = self.calibration.as_ref()?;
        let radius = self.config.surface.probe_radius_px;
        self.plan
            .iter()
            .find(|pixel| {
                let dx = (pixel.x - p.x) as f64;
                let dy = (pixel.y - p.y) as f64;
                (dx * dx + dy * dy).sqrt() < radius
            })
            .map(|&pixel| {
                (
                    pixel,
                    cal.homography.project(pixel),
                    classify(pixel, cal.frame.center),
                )
            })
    }

    /// Arms the generated queue on `channel` and starts streaming. A
    /// still-running previous delivery is torn down first. If the caller
    /// could not open a channel the queue stays armed and untouched for a
    /// later attempt.
    pub fn start_delivery(
        &mut self,
        channel: Box<dyn DeviceChannel>,
    ) -> Result<(), SessionError> {
        let queue = self.queue.as_ref().ok_or(InputError::NoPlannedPoints)?;
        if queue.is_empty() {
            return Err(InputError::NoPlannedPoints.into());
        }

        if let Some(previous) = self.delivery.take() {
            log::warn!("Restarting delivery; stopping the previous stream");
            previous.shutdown();
        }

        let handle = delivery::start(queue.rearmed(), channel, self.config.angles.clone())?;
        self.delivery = Some(handle);
        Ok(())
    }

    /// Discards the entire session. Delivery teardown (stop listener,
    /// join, close channel) strictly precedes the state clearing so no
    /// stale ack can touch a queue we are about to drop. Safe in any
    /// state, including mid-stream; doubles as delivery cancellation.
    pub fn reset(&mut self) {
        if let Some(delivery) = self.delivery.take() {
            delivery.shutdown();
        }
        self.calibration = None;
        self.polygon.clear();
        self.plan.clear();
        self.queue = None;
        log::info!("Session reset");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(delivery) = self.delivery.take() {
            delivery.shutdown();
        }
    }
}
