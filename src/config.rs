// src/config.rs

//! Configuration for the targeting pipeline.
//!
//! Structs deserialize from a JSON file with every field optional; any
//! missing field falls back to the defaults below, which reproduce the
//! deployed rig (70x50 mm reference rectangle, 30 px fill pitch, the four
//! actuator angles, 9600 baud controller link).

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::geometry::quadrant::Quadrant;

/// Angle applied when a quadrant has no configured mapping. An explicit
/// fallback rather than a silent dictionary default.
pub const FALLBACK_ANGLE_DEGREES: i32 = 0;

/// Process-wide configuration, loaded once. `GRAFTPLAN_CONFIG` names an
/// optional JSON file; otherwise defaults apply.
pub static CONFIG: Lazy<Config> = Lazy::new(|| match std::env::var("GRAFTPLAN_CONFIG") {
    Ok(path) => Config::load(Path::new(&path)).unwrap_or_else(|e| {
        log::warn!("Failed to load config from {}: {:#}. Using defaults.", path, e);
        Config::default()
    }),
    Err(_) => Config::default(),
});

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Physical reference rectangle and fill grid settings.
    pub surface: SurfaceConfig,
    /// Quadrant-to-actuator-angle mapping.
    pub angles: AngleConfig,
    /// Controller serial link settings.
    pub serial: SerialConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }
}

/// Reference rectangle dimensions and fill spacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Width of the marker rectangle in millimeters.
    pub width_mm: f64,
    /// Height of the marker rectangle in millimeters.
    pub height_mm: f64,
    /// Grid pitch between generated fill points, in pixels.
    pub spacing_px: i32,
    /// Probe radius for click-to-inspect of planned points, in pixels.
    pub probe_radius_px: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            width_mm: 70.0,
            height_mm: 50.0,
            spacing_px: 30,
            probe_radius_px: 10.0,
        }
    }
}

/// Actuator orientation per quadrant, in integer degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleConfig {
    pub degrees: HashMap<Quadrant, i32>,
}

impl AngleConfig {
    /// Looks up the orientation for a quadrant, falling back to
    /// [`FALLBACK_ANGLE_DEGREES`] for unmapped labels.
    pub fn angle_for(&self, quadrant: Quadrant) -> i32 {
        self.degrees
            .get(&quadrant)
            .copied()
            .unwrap_or(FALLBACK_ANGLE_DEGREES)
    }
}

impl Default for AngleConfig {
    fn default() -> Self {
        let degrees = HashMap::from([
            (Quadrant::UpperRight, -150),
            (Quadrant::UpperLeft, -220),
            (Quadrant::LowerLeft, -380),
            (Quadrant::LowerRight, -340),
        ]);
        AngleConfig { degrees }
    }
}

/// Controller serial link settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baud_rate: u32,
    /// Substrings matched against /dev entry names when scanning for the
    /// controller (USB CDC-ACM and USB-serial adapters by default).
    pub port_patterns: Vec<String>,
    /// Read timeout in tenths of a second (termios VTIME). Bounds how
    /// long listener teardown can take; it never times an ack out.
    pub read_timeout_deciseconds: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baud_rate: 9600,
            port_patterns: vec!["ACM".to_string(), "USB".to_string()],
            read_timeout_deciseconds: 10,
        }
    }
}
