// src/main.rs

// Declare modules
pub mod batch;
pub mod calibration;
pub mod config;
pub mod delivery;
pub mod device;
pub mod geometry;
pub mod session;

use crate::{
    config::CONFIG,
    device::serial::SerialChannel,
    geometry::markers::MarkerSet,
    geometry::PxPoint,
    session::Session,
};

use anyhow::{bail, Context};
use log::{error, info, warn};

use std::io::BufRead;

/// Main entry point for the `graftplan` targeting console.
///
/// The graphical front end, live video and marker segmentation live in
/// their own processes; this binary drives the geometry-and-control core
/// through a line-oriented operator console:
///
/// ```text
/// capture x1,y1 x2,y2 x3,y3 x4,y4   calibrate from 4 detected marker centroids
/// vertex x,y                        append a polygon vertex
/// generate                          plan the fill and batch it by quadrant
/// send                              open the controller port and stream points
/// probe x,y                         inspect the planned point near a click
/// reset                             tear delivery down and clear the session
/// quit
/// ```
fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting graftplan...");
    info!(
        "Surface {}x{} mm, fill pitch {} px, controller at {} baud",
        CONFIG.surface.width_mm,
        CONFIG.surface.height_mm,
        CONFIG.surface.spacing_px,
        CONFIG.serial.baud_rate
    );

    let mut session = Session::new(CONFIG.clone());

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading operator input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if let Err(e) = dispatch(&mut session, line) {
            error!("{:#}", e);
        }
    }

    session.reset();
    info!("graftplan exited.");
    Ok(())
}

fn dispatch(session: &mut Session, line: &str) -> anyhow::Result<()> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match command {
        "capture" => {
            let points = args
                .iter()
                .map(|s| parse_point(s))
                .collect::<anyhow::Result<Vec<PxPoint>>>()?;
            let markers = MarkerSet::new(&points).context("capture needs 4 marker points")?;
            let cal = session
                .capture_reference(&markers)
                .context("capture failed")?;
            info!(
                "Calibrated. Click vertices on the captured frame (center ({:.1}, {:.1}))",
                cal.frame.center[0], cal.frame.center[1]
            );
        }
        "vertex" => {
            let p = parse_point(args.first().context("usage: vertex x,y")?)?;
            session.add_vertex(p).context("vertex rejected")?;
        }
        "generate" => {
            let queue = session.generate().context("generation failed")?;
            if queue.is_empty() {
                warn!("Fill grid produced no interior points; adjust the polygon or spacing");
            }
        }
        "probe" => {
            let p = parse_point(args.first().context("usage: probe x,y")?)?;
            match session.probe(p) {
                Some((pixel, mm, quadrant)) => {
                    info!("Point at image {} -> real {} - {}", pixel, mm, quadrant)
                }
                None => info!("No planned point near {}", p),
            }
        }
        "send" => {
            let channel =
                SerialChannel::open_first_available(&CONFIG.serial).context("opening controller port")?;
            session
                .start_delivery(Box::new(channel))
                .context("starting delivery")?;
            info!("Delivery started");
        }
        "reset" => session.reset(),
        other => bail!("unknown command {:?}", other),
    }
    Ok(())
}

fn parse_point(s: &str) -> anyhow::Result<PxPoint> {
    let (x, y) = s
        .split_once(',')
        .with_context(|| format!("expected x,y but got {:?}", s))?;
    Ok(PxPoint::new(
        x.trim().parse().with_context(|| format!("bad x in {:?}", s))?,
        y.trim().parse().with_context(|| format!("bad y in {:?}", s))?,
    ))
}
