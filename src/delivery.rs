// src/delivery.rs
//! Acknowledgment-gated delivery of planned points to the controller.
//!
//! One command goes out per acknowledgment received. Arming a queue sends
//! a single orientation command carrying the *first* point's quadrant
//! angle, then the first coordinate; every `"Done"` line from the
//! controller releases the next coordinate. The single orientation send
//! per queue (rather than one per quadrant group) reproduces the deployed
//! controller's contract.
//!
//! Two threads per armed queue:
//! - the *listener* blocks reading the channel line by line and forwards
//!   each trimmed `"Done"` as an event; it never touches delivery state.
//! - the *worker* is the sole owner of the queue and the write half; it
//!   consumes listener events and the main flow's stop command from one
//!   mpsc channel, so cursor updates race with nothing.
//!
//! There is deliberately no acknowledgment timeout: a stalled controller
//! stalls delivery until the operator resets. The serial read timeout
//! only bounds how long the listener takes to notice its stop flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::batch::DeliveryQueue;
use crate::config::AngleConfig;
use crate::device::{DeviceChannel, DeviceError};

/// Inbound line that releases the next coordinate, compared after trim.
const ACK_TOKEN: &str = "Done";

enum Event {
    Ack,
    Stop,
}

/// Handle to an in-flight delivery. Dropping it (or calling
/// [`DeliveryHandle::shutdown`]) tears both threads down: listener first,
/// then worker, then the channel halves close with them.
pub struct DeliveryHandle {
    events: Sender<Event>,
    stop: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
    worker: Option<JoinHandle<DeliveryQueue>>,
}

impl DeliveryHandle {
    /// Stops the listener, then the worker, and returns how many points
    /// were delivered before teardown. Safe to call in any state,
    /// including mid-stream; joins are bounded by the channel's read
    /// timeout.
    pub fn shutdown(mut self) -> usize {
        self.teardown()
    }

    fn teardown(&mut self) -> usize {
        self.stop.store(true, Ordering::Release);
        if let Some(listener) = self.listener.take() {
            if listener.join().is_err() {
                log::error!("Delivery listener thread panicked");
            }
        }
        // With the listener gone no further acks can arrive; the worker
        // drains anything already queued before it sees Stop.
        let _ = self.events.send(Event::Stop);
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(queue)) => {
                log::info!(
                    "Delivery stopped at {}/{} points",
                    queue.next_index(),
                    queue.len()
                );
                queue.next_index()
            }
            Some(Err(_)) => {
                log::error!("Delivery worker thread panicked");
                0
            }
            None => 0,
        }
    }
}

impl Drop for DeliveryHandle {
    fn drop(&mut self) {
        if self.listener.is_some() || self.worker.is_some() {
            self.teardown();
        }
    }
}

/// Arms `queue` on `channel` and starts streaming.
///
/// The channel must already be open; discovering and opening one is the
/// caller's job, and failing that is its `NoDeviceAvailable`. The first
/// transmissions (orientation + first coordinate) happen on the worker
/// thread; a write failure there is reported and leaves the cursor in
/// place, like any later write failure.
pub fn start(
    queue: DeliveryQueue,
    channel: Box<dyn DeviceChannel>,
    angles: AngleConfig,
) -> Result<DeliveryHandle, DeviceError> {
    let reader = channel.try_clone()?;
    let (events, inbox) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));

    let listener = {
        let events = events.clone();
        let stop = Arc::clone(&stop);
        std::thread::Builder::new()
            .name("ack-listener".into())
            .spawn(move || run_listener(reader, events, stop))
            .map_err(DeviceError::Io)?
    };
    let worker = std::thread::Builder::new()
        .name("delivery-worker".into())
        .spawn(move || run_worker(queue, channel, angles, inbox))
        .map_err(DeviceError::Io)?;

    Ok(DeliveryHandle {
        events,
        stop,
        listener: Some(listener),
        worker: Some(worker),
    })
}

fn run_listener(mut reader: Box<dyn DeviceChannel>, events: Sender<Event>, stop: Arc<AtomicBool>) {
    log::debug!("Ack listener running");
    while !stop.load(Ordering::Acquire) {
        match reader.recv_line() {
            Ok(Some(line)) => {
                let token = line.trim();
                if token == ACK_TOKEN {
                    if events.send(Event::Ack).is_err() {
                        break; // worker gone
                    }
                } else if !token.is_empty() {
                    log::debug!("Ignoring controller line {:?}", token);
                }
            }
            Ok(None) => {} // read timeout tick; re-check the stop flag
            Err(e) => {
                log::error!("Controller read failed, listener exiting: {}", e);
                break;
            }
        }
    }
    log::debug!("Ack listener stopped");
}

fn run_worker(
    mut queue: DeliveryQueue,
    mut channel: Box<dyn DeviceChannel>,
    angles: AngleConfig,
    inbox: Receiver<Event>,
) -> DeliveryQueue {
    if let Some(first) = queue.current() {
        // once per armed queue, before the first coordinate
        let angle = angles.angle_for(first.quadrant);
        let quadrant = first.quadrant;
        match channel.send_line(&format!("ANGLE,{}", angle)) {
            Ok(()) => log::info!("Sent orientation {}° for {}", angle, quadrant),
            Err(e) => log::error!("Failed to send orientation command: {}", e),
        }
        send_current(&mut queue, channel.as_mut());
    } else {
        log::warn!("Delivery armed with an empty queue; nothing to stream");
    }

    loop {
        match inbox.recv() {
            Ok(Event::Ack) => {
                if queue.current().is_some() {
                    send_current(&mut queue, channel.as_mut());
                } else {
                    // ack after exhaustion: a no-op, not an error
                    log::debug!("Ignoring ack: queue exhausted");
                }
            }
            Ok(Event::Stop) | Err(_) => break,
        }
    }
    queue
}

/// Transmits `queue[next_index]` and advances the cursor on success. On a
/// write failure the cursor stays put; the controller's next ack retries
/// the same point, and there is no retry loop of our own.
fn send_current(queue: &mut DeliveryQueue, channel: &mut dyn DeviceChannel) {
    let Some(point) = queue.current().cloned() else {
        return;
    };
    let line = format!("{:.2},{:.2}", point.physical.x, point.physical.y);
    match channel.send_line(&line) {
        Ok(()) => {
            log::info!(
                "Sent point {}/{}: image {} -> real {} - {}",
                queue.next_index() + 1,
                queue.len(),
                point.pixel,
                point.physical,
                point.quadrant
            );
            queue.advance();
            if queue.current().is_none() {
                log::info!("All {} points delivered to controller", queue.len());
            }
        }
        Err(e) => {
            log::error!(
                "Failed to send point {} of {}, delivery halted at this index: {}",
                queue.next_index() + 1,
                queue.len(),
                e
            );
        }
    }
}
