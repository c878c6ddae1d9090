//! A swarm of comets that roam the wireframe forever, leaving fading tails.

use super::{ParameterSnapshot, Pattern, PatternKind};
use crate::frame::FrameBuffer;
use crate::topology::{Direction, Topology};
use crate::traversal::{BranchRule, Entity, EntityKind, RandomSource};
use crate::{LED_COUNT, STRIP_LENGTH};
use std::time::Duration;

pub const COMET_COUNT: usize = 20;

/// Per-tick fade applied to the whole buffer; sets the tail length.
const TAIL_FADE: u8 = 50;

/// Hue spread across the swarm. Slightly more than one turn of the wheel, so
/// the last comet wraps back near red.
const HUE_SPREAD: usize = 270;

pub struct Comets {
    topology: Topology,
    comets: Vec<Entity>,
}

impl Comets {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            comets: launch_positions(),
        }
    }

    pub fn comets(&self) -> &[Entity] {
        &self.comets
    }
}

/// Comets spaced evenly along the data line, each moving forward.
///
/// A comet's counter starts at its phase within the strip, so its first
/// arrival lands exactly on the strip's last LED.
fn launch_positions() -> Vec<Entity> {
    (0..COMET_COUNT)
        .map(|i| {
            let position = i * LED_COUNT / COMET_COUNT;
            Entity {
                kind: EntityKind::Comet,
                position,
                direction: Direction::Forward,
                counter: position % STRIP_LENGTH,
                hue: ((i * HUE_SPREAD / COMET_COUNT) % 255) as u8,
            }
        })
        .collect()
}

impl Pattern for Comets {
    fn kind(&self) -> PatternKind {
        PatternKind::Comets
    }

    fn activate(&mut self, _rng: &mut dyn RandomSource) {
        self.comets = launch_positions();
    }

    fn update(
        &mut self,
        frame: &mut FrameBuffer,
        params: &ParameterSnapshot,
        rng: &mut dyn RandomSource,
    ) -> Duration {
        let topology = &self.topology;

        for comet in &mut self.comets {
            frame.blend(comet.position, comet.color(params.saturation, params.brightness));

            if comet.counter < STRIP_LENGTH - 1 {
                comet.advance();
            } else {
                comet.branch(topology, BranchRule::NoReversal, rng);
            }
        }

        frame.fade_to_black_by(TAIL_FADE);
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;
    use crate::topology::direction_after_arrival;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn comets() -> Comets {
        Comets::new(Topology::sculpture())
    }

    #[test]
    fn launch_positions_are_evenly_spaced() {
        let comets = comets();
        let positions: Vec<usize> = comets.comets().iter().map(|c| c.position).collect();
        assert_eq!(
            positions,
            vec![
                0, 25, 51, 76, 102, 127, 153, 178, 204, 229, 255, 280, 306, 331, 357, 382, 408,
                433, 459, 484
            ]
        );
        assert!(comets.comets().iter().all(|c| c.direction == Direction::Forward));
    }

    #[test]
    fn launch_hues_spread_over_the_wheel() {
        let comets = comets();
        let hues: Vec<u8> = comets.comets().iter().map(|c| c.hue).collect();
        for (i, hue) in hues.iter().enumerate() {
            assert_eq!(*hue as usize, (i * 270 / 20) % 255);
        }
        assert_eq!(hues[19], 1);
    }

    #[test]
    fn first_arrival_is_on_a_vertex() {
        let topology = Topology::sculpture();
        for comet in comets().comets() {
            let steps = STRIP_LENGTH - 1 - comet.counter;
            assert!(topology.is_endpoint(comet.position + steps), "comet at {}", comet.position);
        }
    }

    #[test]
    fn branches_stay_on_the_wireframe() {
        let topology = Topology::sculpture();
        let mut comets = comets();
        let mut frame = FrameBuffer::new();
        let mut rng = StdRng::seed_from_u64(3);
        let params = ParameterSnapshot::default();

        for _ in 0..400 {
            let before: Vec<Entity> = comets.comets().to_vec();
            comets.update(&mut frame, &params, &mut rng);

            for (old, new) in before.iter().zip(comets.comets()) {
                assert!(new.counter < STRIP_LENGTH);
                if old.counter == STRIP_LENGTH - 1 {
                    assert!(topology.is_endpoint(old.position));
                    assert!(topology.is_endpoint(new.position));
                    assert_ne!(new.position, old.position);
                    assert_eq!(new.direction, direction_after_arrival(new.position));
                    assert_eq!(new.counter, 0);
                }
            }
        }
    }

    #[test]
    fn comets_blend_additively_before_fading() {
        let mut comets = comets();
        let mut frame = FrameBuffer::new();
        frame.set(0, Color::new(10, 10, 10));
        let params = ParameterSnapshot::default();
        let mut rng = StdRng::seed_from_u64(1);

        comets.update(&mut frame, &params, &mut rng);

        let expected = (Color::new(10, 10, 10) + Color::from_hsv(0, 255, 128)).fade_to_black_by(50);
        assert_eq!(frame.get(0), expected);
    }

    #[test]
    fn untouched_pixels_fade_every_tick() {
        let mut comets = comets();
        let mut frame = FrameBuffer::new();
        // Move comet 0 off strip 0 so nothing passes LED 9.
        frame.set(9, Color::new(255, 255, 255));
        comets.comets[0].position = 60;
        comets.comets[0].counter = 9;
        let params = ParameterSnapshot::default();
        let mut rng = StdRng::seed_from_u64(9);

        let mut previous = frame.get(9);
        for _ in 0..5 {
            comets.update(&mut frame, &params, &mut rng);
            let current = frame.get(9);
            assert_eq!(current, previous.fade_to_black_by(50));
            previous = current;
        }
    }

    #[test]
    fn activate_restores_launch_positions() {
        let mut comets = comets();
        let mut frame = FrameBuffer::new();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            comets.update(&mut frame, &ParameterSnapshot::default(), &mut rng);
        }
        comets.activate(&mut rng);
        assert_eq!(comets.comets(), Comets::new(Topology::sculpture()).comets());
    }
}
