//! Entities that travel along strips, and how they pick a strip at a vertex.

use crate::Color;
use crate::topology::{Direction, EDGES_PER_VERTEX, Topology, direction_after_arrival};
use rand::Rng;
use rand::rngs::StdRng;

// ── Randomness ─────────────────────────────────────────────────────

/// Source of the uniform integer draws the patterns make.
///
/// Injected into every controller so tests can replace it with a scripted
/// sequence.
pub trait RandomSource {
    /// Draw uniformly from `[low, high)`.
    fn range(&mut self, low: u32, high: u32) -> u32;
}

impl RandomSource for StdRng {
    fn range(&mut self, low: u32, high: u32) -> u32 {
        self.gen_range(low..high)
    }
}

// ── Branching ──────────────────────────────────────────────────────

/// Which edges an entity may take when it reaches a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchRule {
    /// Take one of the two other edges.
    NoReversal,
    /// Any of the three edges, including the one just travelled.
    AllowReversal,
}

impl BranchRule {
    /// Half-open range the slot offset is drawn from.
    pub fn offsets(self) -> (u32, u32) {
        match self {
            BranchRule::NoReversal => (1, EDGES_PER_VERTEX as u32),
            BranchRule::AllowReversal => (0, EDGES_PER_VERTEX as u32),
        }
    }
}

/// Pick the endpoint to continue from after arriving at `position`.
///
/// # Panics
/// If `position` is not an edge endpoint. Step counting guarantees arrivals
/// land on endpoints, so anything else is a bug in the caller.
pub fn choose_branch(
    topology: &Topology,
    position: usize,
    rule: BranchRule,
    rng: &mut dyn RandomSource,
) -> usize {
    let Some(slot) = topology.locate(position) else {
        panic!("branch requested at LED {position}, which is not a vertex edge endpoint");
    };
    let (low, high) = rule.offsets();
    let offset = rng.range(low, high) as usize;
    topology.edges_of(slot.vertex)[(slot.edge + offset) % EDGES_PER_VERTEX]
}

// ── Entities ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Comet,
    Spark,
    PacMan,
    Ghost,
}

/// A colored point travelling along the wireframe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entity {
    pub kind: EntityKind,
    /// Current LED index.
    pub position: usize,
    pub direction: Direction,
    /// Steps taken along the current strip.
    pub counter: usize,
    pub hue: u8,
}

impl Entity {
    /// An entity standing on an edge endpoint, ready to travel its strip.
    pub fn at_endpoint(kind: EntityKind, position: usize, hue: u8) -> Self {
        Self {
            kind,
            position,
            direction: direction_after_arrival(position),
            counter: 0,
            hue,
        }
    }

    /// Move one LED along the current strip.
    pub fn advance(&mut self) {
        self.position = self.direction.step(self.position);
        self.counter += 1;
    }

    /// Land on `endpoint`, restarting the step count.
    pub fn jump_to(&mut self, endpoint: usize) {
        self.position = endpoint;
        self.direction = direction_after_arrival(endpoint);
        self.counter = 0;
    }

    /// Continue onto a randomly chosen edge of the vertex at the current position.
    pub fn branch(&mut self, topology: &Topology, rule: BranchRule, rng: &mut dyn RandomSource) {
        let next = choose_branch(topology, self.position, rule, rng);
        self.jump_to(next);
    }

    pub fn color(&self, saturation: u8, value: u8) -> Color {
        Color::from_hsv(self.hue, saturation, value)
    }
}

// ── Test support ───────────────────────────────────────────────────

/// Replays a fixed list of draws, then keeps returning the low bound.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedRandom {
    draws: std::collections::VecDeque<u32>,
}

#[cfg(test)]
impl ScriptedRandom {
    pub(crate) fn new(draws: impl IntoIterator<Item = u32>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedRandom {
    fn range(&mut self, low: u32, high: u32) -> u32 {
        match self.draws.pop_front() {
            Some(v) => {
                assert!(
                    (low..high).contains(&v),
                    "scripted draw {v} outside [{low}, {high})"
                );
                v
            }
            None => low,
        }
    }
}
