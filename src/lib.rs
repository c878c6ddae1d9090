//! Graph-traversal particle animations for an LED strip sculpture.
//!
//! The sculpture is a wireframe of 30 strips, 17 LEDs each, chained into one
//! 510-pixel buffer. Strip ends meet at 20 vertices, three strips per vertex.
//! This crate provides:
//! - The fixed vertex table and the direction/branching rules ([`topology`], [`traversal`])
//! - The frame buffer and the sink that pushes it to hardware ([`frame`])
//! - The graph-driven patterns: comets, fireworks and a PacMan mini-game ([`patterns`])
//! - The render loop and the HTTP control surface ([`render`], [`server`])
//!
//! Shared helpers (strip layout, colors, signal handling) live here.

pub mod frame;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod patterns;
pub mod render;
pub mod server;
pub mod topology;
pub mod traversal;

use std::ops::Add;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Strip layout ───────────────────────────────────────────────────

/// Number of LEDs on one strip (one edge of the wireframe).
pub const STRIP_LENGTH: usize = 17;

/// Number of strips chained on the data line.
pub const STRIP_COUNT: usize = 30;

/// Total number of addressable LEDs.
pub const LED_COUNT: usize = STRIP_LENGTH * STRIP_COUNT;

/// Dimensions of the chained strips.
///
/// The animation core always works on [`StripLayout::default`]; the layout
/// exists so that sinks can map the linear buffer onto other surfaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StripLayout {
    pub strips: usize,
    pub leds_per_strip: usize,
}

impl StripLayout {
    pub fn new(strips: usize, leds_per_strip: usize) -> Self {
        Self {
            strips,
            leds_per_strip,
        }
    }

    /// Total number of LEDs across all strips.
    pub fn led_count(&self) -> usize {
        self.strips * self.leds_per_strip
    }

    /// Strip that LED `index` belongs to.
    pub fn strip_of(&self, index: usize) -> usize {
        index / self.leds_per_strip
    }

    /// Position of LED `index` within its strip.
    pub fn phase_of(&self, index: usize) -> usize {
        index % self.leds_per_strip
    }
}

impl Default for StripLayout {
    fn default() -> Self {
        Self::new(STRIP_COUNT, STRIP_LENGTH)
    }
}

/// Dimensions of an LED matrix panel used as a preview surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    pub rows: u32,
    pub cols: u32,
}

impl PanelConfig {
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    /// Whether every strip fits on its own row of the panel.
    pub fn fits(&self, layout: StripLayout) -> bool {
        self.rows as usize >= layout.strips && self.cols as usize >= layout.leds_per_strip
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self { rows: 64, cols: 64 }
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// An RGB pixel value, decoupled from any hardware crate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from 8-bit hue, saturation and value.
    ///
    /// The hue wheel is split into six sectors of 43 steps each, so `0` is
    /// red, `86` green and `172` blue.
    pub fn from_hsv(hue: u8, saturation: u8, value: u8) -> Self {
        let sector = hue / 43;
        let remainder = (hue - sector * 43) as u16 * 6;
        let (s, v) = (saturation as u16, value as u16);

        let p = (v * (255 - s) / 255) as u8;
        let q = (v * (255 - s * remainder / 255) / 255) as u8;
        let t = (v * (255 - s * (255 - remainder) / 255) / 255) as u8;
        let v = value;

        match sector {
            0 => Self::new(v, t, p), // Red → Yellow
            1 => Self::new(q, v, p), // Yellow → Green
            2 => Self::new(p, v, t), // Green → Cyan
            3 => Self::new(p, q, v), // Cyan → Blue
            4 => Self::new(t, p, v), // Blue → Magenta
            _ => Self::new(v, p, q), // Magenta → Red
        }
    }

    /// Scale every channel by `scale / 256`, rounding towards zero.
    ///
    /// A scale of 255 keeps the color unchanged.
    pub fn scale(self, scale: u8) -> Self {
        let f = scale as u16 + 1;
        Self {
            r: ((self.r as u16 * f) >> 8) as u8,
            g: ((self.g as u16 * f) >> 8) as u8,
            b: ((self.b as u16 * f) >> 8) as u8,
        }
    }

    /// Dim this color towards black by `amount / 256`.
    pub fn fade_to_black_by(self, amount: u8) -> Self {
        self.scale(255 - amount)
    }

    pub fn is_black(&self) -> bool {
        *self == Self::BLACK
    }
}

/// Additive blending: channels saturate at 255 instead of wrapping.
impl Add for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color {
            r: self.r.saturating_add(other.r),
            g: self.g.saturating_add(other.g),
            b: self.b.saturating_add(other.b),
        }
    }
}

// ── Signal handling ────────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets `running` to false.
pub fn setup_signal_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl-C handler");

    running
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────
