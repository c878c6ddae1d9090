//! Graph-driven patterns and the per-tick contract they share.
//!
//! Each pattern owns its entities outright. The renderer keeps one instance of
//! every pattern, calls [`Pattern::activate`] when it becomes the selected one,
//! and then [`Pattern::update`] once per tick.

pub mod comets;
pub mod fireworks;
pub mod pacman;

use crate::frame::FrameBuffer;
use crate::traversal::RandomSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub use comets::Comets;
pub use fireworks::Fireworks;
pub use pacman::PacMan;

/// Which graph pattern owns the tick.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Comets,
    Fireworks,
    #[serde(rename = "pacman")]
    #[value(name = "pacman")]
    PacMan,
}

impl PatternKind {
    pub const ALL: [PatternKind; 3] = [
        PatternKind::Comets,
        PatternKind::Fireworks,
        PatternKind::PacMan,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatternKind::Comets => "comets",
            PatternKind::Fireworks => "fireworks",
            PatternKind::PacMan => "pacman",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Control values read by the active pattern each tick (all 0-255).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct ParameterSnapshot {
    pub hue: u8,
    pub saturation: u8,
    pub brightness: u8,
    pub speed: u8,
}

impl ParameterSnapshot {
    /// Step the hue one notch around the wheel, wrapping 254 back to 0.
    pub fn advance_hue(&mut self) {
        self.hue = ((self.hue as u16 + 1) % 255) as u8;
    }
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            hue: 0,
            saturation: 255,
            brightness: 128,
            speed: 50,
        }
    }
}

/// A controller that animates entities over the wireframe.
pub trait Pattern {
    fn kind(&self) -> PatternKind;

    /// Put the pattern into its starting state. Called whenever the pattern
    /// becomes the selected one.
    fn activate(&mut self, rng: &mut dyn RandomSource);

    /// Called when another pattern takes over.
    fn deactivate(&mut self) {}

    /// Advance one tick, drawing into `frame`.
    ///
    /// Returns how long the loop should hold this frame on top of its regular
    /// tick interval (`Duration::ZERO` for none).
    fn update(
        &mut self,
        frame: &mut FrameBuffer,
        params: &ParameterSnapshot,
        rng: &mut dyn RandomSource,
    ) -> Duration;
}
