//! One firework at a time: three sparks burst out of a vertex along its
//! strips, the sky fades, and a new burst launches somewhere else.

use super::{ParameterSnapshot, Pattern, PatternKind};
use crate::frame::FrameBuffer;
use crate::topology::{EDGES_PER_VERTEX, Topology};
use crate::traversal::{Entity, EntityKind, RandomSource};
use crate::{Color, STRIP_LENGTH};
use std::time::Duration;

const FADE: u8 = 70;

/// Shortest burst, in LEDs travelled per spark.
pub const MIN_SIZE: usize = 3;

/// Cooldown ticks are drawn from `[0, MAX_DELAY)`.
pub const MAX_DELAY: usize = 20;

/// Extra hold on every cooldown tick and on every launch.
const COOLDOWN_HOLD: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstPhase {
    /// Sparks are still travelling outward.
    Building,
    /// Sparks are spent; the buffer fades until the next launch.
    Cooling,
}

pub struct Fireworks {
    topology: Topology,
    vertex: usize,
    counter: usize,
    size: usize,
    delay: usize,
    hue: u8,
    sparks: [Entity; EDGES_PER_VERTEX],
}

impl Fireworks {
    pub fn new(topology: Topology) -> Self {
        let vertex = 0;
        Self {
            topology,
            vertex,
            counter: 0,
            size: MIN_SIZE,
            delay: 0,
            hue: 0,
            sparks: topology
                .edges_of(vertex)
                .map(|led| Entity::at_endpoint(EntityKind::Spark, led, 0)),
        }
    }

    pub fn phase(&self) -> BurstPhase {
        if self.counter < self.size {
            BurstPhase::Building
        } else {
            BurstPhase::Cooling
        }
    }

    pub fn vertex(&self) -> usize {
        self.vertex
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn delay(&self) -> usize {
        self.delay
    }

    pub fn sparks(&self) -> &[Entity] {
        &self.sparks
    }

    /// Start a new burst at a random vertex with a random size, cooldown and hue.
    fn launch(&mut self, rng: &mut dyn RandomSource) {
        self.vertex = rng.range(0, self.topology.vertex_count() as u32) as usize;
        self.size = rng.range(MIN_SIZE as u32, STRIP_LENGTH as u32) as usize;
        self.delay = rng.range(0, MAX_DELAY as u32) as usize;
        self.hue = rng.range(0, 256) as u8;

        let hue = self.hue;
        self.sparks = self
            .topology
            .edges_of(self.vertex)
            .map(|led| Entity::at_endpoint(EntityKind::Spark, led, hue));
        self.counter = 0;

        tracing::debug!(
            "Firework at vertex {} (size {}, delay {}, hue {})",
            self.vertex,
            self.size,
            self.delay,
            self.hue
        );
    }
}

impl Pattern for Fireworks {
    fn kind(&self) -> PatternKind {
        PatternKind::Fireworks
    }

    fn activate(&mut self, rng: &mut dyn RandomSource) {
        self.launch(rng);
    }

    fn update(
        &mut self,
        frame: &mut FrameBuffer,
        params: &ParameterSnapshot,
        rng: &mut dyn RandomSource,
    ) -> Duration {
        let mut hold = match self.phase() {
            BurstPhase::Building => {
                let color = Color::from_hsv(self.hue, params.saturation, params.brightness);
                for spark in &mut self.sparks {
                    frame.set(spark.position, color);
                    spark.advance();
                }
                Duration::ZERO
            }
            BurstPhase::Cooling => COOLDOWN_HOLD,
        };
        self.counter += 1;
        frame.fade_to_black_by(FADE);

        if self.counter > self.size + self.delay {
            self.launch(rng);
            hold += COOLDOWN_HOLD;
        }

        hold
    }
}
