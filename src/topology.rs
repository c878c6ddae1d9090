//! The fixed wireframe: which LED indices meet at each vertex.
//!
//! Every strip runs between two vertices. Its first LED (phase 0) and last LED
//! (phase 16) are the strip's edge endpoints, and each vertex lists the three
//! endpoints that touch it. The table was authored by hand against the wiring
//! of the physical sculpture and is never generated or mutated.

use crate::{LED_COUNT, STRIP_LENGTH};
use std::fmt;

/// Number of vertices in the wireframe.
pub const VERTEX_COUNT: usize = 20;

/// Number of strip edges meeting at every vertex.
pub const EDGES_PER_VERTEX: usize = 3;

/// Edge endpoints per vertex, in slot order. Vertices are labelled A..T.
const VERTICES: [[usize; EDGES_PER_VERTEX]; VERTEX_COUNT] = [
    [84, 85, 0],     // A
    [16, 17, 152],   // B
    [101, 102, 339], // C
    [67, 68, 305],   // D
    [50, 51, 254],   // E
    [33, 34, 203],   // F
    [135, 136, 153], // G
    [118, 119, 390], // H
    [322, 323, 340], // I
    [288, 289, 306], // J
    [271, 272, 492], // K
    [237, 238, 255], // L
    [186, 187, 204], // M
    [169, 170, 424], // N
    [373, 374, 391], // O
    [356, 357, 509], // P
    [475, 476, 493], // Q
    [220, 221, 458], // R
    [407, 408, 425], // S
    [441, 442, 459], // T
];

/// Travel direction of an entity along its current strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Towards higher LED indices.
    Forward,
    /// Towards lower LED indices.
    Backward,
}

impl Direction {
    /// Signed LED-index step for this direction.
    pub fn delta(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }

    /// Apply one step to `position`.
    ///
    /// Callers only step inside a strip, so the result stays within the
    /// buffer; leaving it is a broken counter invariant.
    pub fn step(self, position: usize) -> usize {
        position
            .checked_add_signed(self.delta())
            .filter(|&p| p < LED_COUNT)
            .unwrap_or_else(|| panic!("step {:?} from LED {position} leaves the buffer", self))
    }
}

/// Direction to travel after landing on `position` from a vertex jump.
///
/// A strip's first LED leads forward along it; any other endpoint sits at the
/// far end and leads backward.
pub fn direction_after_arrival(position: usize) -> Direction {
    if position % STRIP_LENGTH == 0 {
        Direction::Forward
    } else {
        Direction::Backward
    }
}

/// A vertex and one of its edge slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot {
    pub vertex: usize,
    pub edge: usize,
}

/// Why a vertex table is unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// An endpoint lies outside the LED buffer.
    OutOfRange { vertex: usize, led: usize },
    /// An endpoint is neither the first nor the last LED of its strip.
    NotStripEnd { vertex: usize, led: usize },
    /// The same LED index appears in more than one slot.
    SharedEndpoint { led: usize, first: Slot, second: Slot },
}

impl fmt::Display for TopologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyError::OutOfRange { vertex, led } => {
                write!(f, "vertex {vertex}: LED {led} is outside the {LED_COUNT}-LED buffer")
            }
            TopologyError::NotStripEnd { vertex, led } => {
                write!(f, "vertex {vertex}: LED {led} is not a strip end")
            }
            TopologyError::SharedEndpoint { led, first, second } => write!(
                f,
                "LED {led} is shared by vertex {} slot {} and vertex {} slot {}",
                first.vertex, first.edge, second.vertex, second.edge
            ),
        }
    }
}

impl std::error::Error for TopologyError {}

/// Read-only view of the vertex table.
#[derive(Clone, Copy, Debug)]
pub struct Topology {
    vertices: &'static [[usize; EDGES_PER_VERTEX]],
}

impl Topology {
    /// The sculpture's wireframe.
    pub fn sculpture() -> Self {
        Self {
            vertices: &VERTICES,
        }
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// The three edge endpoints of `vertex`, in slot order.
    pub fn edges_of(&self, vertex: usize) -> [usize; EDGES_PER_VERTEX] {
        self.vertices[vertex]
    }

    /// Iterate over `(vertex, endpoints)` pairs.
    pub fn vertices(&self) -> impl Iterator<Item = (usize, [usize; EDGES_PER_VERTEX])> + '_ {
        self.vertices.iter().copied().enumerate()
    }

    /// Every edge endpoint, vertex by vertex.
    pub fn endpoints(&self) -> impl Iterator<Item = usize> + '_ {
        self.vertices.iter().flatten().copied()
    }

    /// The slot whose endpoint is `led`, if any.
    ///
    /// Scans vertices in order and returns the first match. A validated table
    /// has at most one match, so the scan order never decides anything.
    pub fn locate(&self, led: usize) -> Option<Slot> {
        self.vertices().find_map(|(vertex, edges)| {
            edges
                .iter()
                .position(|&e| e == led)
                .map(|edge| Slot { vertex, edge })
        })
    }

    pub fn is_endpoint(&self, led: usize) -> bool {
        self.locate(led).is_some()
    }

    /// Check that every endpoint is a strip end inside the buffer and that no
    /// LED index is claimed by two slots.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let mut owner: Vec<Option<Slot>> = vec![None; LED_COUNT];

        for (vertex, edges) in self.vertices() {
            for (edge, &led) in edges.iter().enumerate() {
                if led >= LED_COUNT {
                    return Err(TopologyError::OutOfRange { vertex, led });
                }
                let phase = led % STRIP_LENGTH;
                if phase != 0 && phase != STRIP_LENGTH - 1 {
                    return Err(TopologyError::NotStripEnd { vertex, led });
                }
                let slot = Slot { vertex, edge };
                if let Some(first) = owner[led] {
                    return Err(TopologyError::SharedEndpoint {
                        led,
                        first,
                        second: slot,
                    });
                }
                owner[led] = Some(slot);
            }
        }

        Ok(())
    }

    #[cfg(test)]
    fn from_table(vertices: &'static [[usize; EDGES_PER_VERTEX]]) -> Self {
        Self { vertices }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::sculpture()
    }
}
