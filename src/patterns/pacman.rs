//! PacMan on the wireframe: one pacman, four ghosts, and a red alarm when a
//! ghost catches up.
//!
//! Pacman starts at vertex A and moves every tick; the ghosts start at the
//! opposite vertex T and move every other tick. Both may turn back at a
//! vertex. When a ghost lands on pacman the board resets and the wireframe
//! flashes six times, one flash per tick, before play resumes.

use super::{ParameterSnapshot, Pattern, PatternKind};
use crate::frame::FrameBuffer;
use crate::topology::{EDGES_PER_VERTEX, Topology};
use crate::traversal::{BranchRule, Entity, EntityKind, RandomSource};
use crate::{Color, STRIP_LENGTH};
use serde::Serialize;
use std::time::Duration;

pub const GHOST_COUNT: usize = 4;

/// Number of alarm flashes after a collision.
pub const FLASH_COUNT: u8 = 6;

const PACMAN_HUE: u8 = 40;
const GHOST_HUES: [u8; GHOST_COUNT] = [0, 19, 135, 220];

const PACMAN_HOME: usize = 0;
const GHOST_HOME: usize = 19;

const WIREFRAME_HUE: u8 = 165;
const ALARM_HUE: u8 = 0;

const TICK_HOLD: Duration = Duration::from_millis(70);
const FLASH_HOLD: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Active,
    /// Movement is frozen while the alarm plays.
    Dying { flashes_shown: u8 },
}

pub struct PacMan {
    topology: Topology,
    /// Pacman first, then the ghosts.
    entities: [Entity; 1 + GHOST_COUNT],
    state: GameState,
    tick: u64,
    deaths: u64,
}

impl PacMan {
    pub fn new(topology: Topology) -> Self {
        let pacman = Entity::at_endpoint(
            EntityKind::PacMan,
            topology.edges_of(PACMAN_HOME)[0],
            PACMAN_HUE,
        );
        let ghost_start = topology.edges_of(GHOST_HOME)[0];
        let ghosts = GHOST_HUES.map(|hue| Entity::at_endpoint(EntityKind::Ghost, ghost_start, hue));

        Self {
            topology,
            entities: [pacman, ghosts[0], ghosts[1], ghosts[2], ghosts[3]],
            state: GameState::Active,
            tick: 0,
            deaths: 0,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn pacman(&self) -> &Entity {
        &self.entities[0]
    }

    pub fn ghosts(&self) -> &[Entity] {
        &self.entities[1..]
    }

    /// Collisions since the pattern was created.
    pub fn deaths(&self) -> u64 {
        self.deaths
    }

    /// Put pacman and the ghosts back on random endpoints of their home vertices.
    fn reset(&mut self, rng: &mut dyn RandomSource) {
        let pacman_start = self.home_endpoint(PACMAN_HOME, rng);
        self.entities[0].jump_to(pacman_start);

        for i in 1..=GHOST_COUNT {
            let start = self.home_endpoint(GHOST_HOME, rng);
            self.entities[i].jump_to(start);
        }
        self.tick = 0;
    }

    fn home_endpoint(&self, vertex: usize, rng: &mut dyn RandomSource) -> usize {
        self.topology.edges_of(vertex)[rng.range(0, EDGES_PER_VERTEX as u32) as usize]
    }

    /// Erase, step, redraw, and branch at the end of the strip.
    fn move_entity(
        entity: &mut Entity,
        topology: &Topology,
        frame: &mut FrameBuffer,
        brightness: u8,
        rng: &mut dyn RandomSource,
    ) {
        frame.erase(entity.position);
        entity.advance();
        frame.set(entity.position, entity.color(255, brightness));

        if entity.counter == STRIP_LENGTH - 1 {
            entity.branch(topology, BranchRule::AllowReversal, rng);
        }
    }

    /// One tick of play. Returns true if a ghost caught pacman.
    fn play(&mut self, frame: &mut FrameBuffer, brightness: u8, rng: &mut dyn RandomSource) -> bool {
        let topology = &self.topology;
        let (pacman, ghosts) = self.entities.split_at_mut(1);
        let pacman = &mut pacman[0];

        Self::move_entity(pacman, topology, frame, brightness, rng);

        if self.tick % 2 != 0 {
            return false;
        }

        for ghost in ghosts.iter_mut() {
            frame.erase(ghost.position);
            ghost.advance();
            frame.set(ghost.position, ghost.color(255, brightness));

            if ghost.position == pacman.position {
                return true;
            }

            if ghost.counter == STRIP_LENGTH - 1 {
                ghost.branch(topology, BranchRule::AllowReversal, rng);
            }
        }

        false
    }

    fn die(&mut self, frame: &mut FrameBuffer, rng: &mut dyn RandomSource) {
        for entity in &self.entities {
            frame.erase(entity.position);
        }
        self.deaths += 1;
        tracing::info!(
            "Ghost caught pacman at LED {} (death {})",
            self.pacman().position,
            self.deaths
        );
        self.reset(rng);
        self.state = GameState::Dying { flashes_shown: 0 };
    }

    fn draw_endpoints(&self, frame: &mut FrameBuffer, color: Color) {
        for led in self.topology.endpoints() {
            frame.set(led, color);
        }
    }
}

impl Pattern for PacMan {
    fn kind(&self) -> PatternKind {
        PatternKind::PacMan
    }

    fn activate(&mut self, rng: &mut dyn RandomSource) {
        self.reset(rng);
        self.state = GameState::Active;
    }

    fn deactivate(&mut self) {
        tracing::debug!("PacMan paused after {} deaths", self.deaths);
    }

    fn update(
        &mut self,
        frame: &mut FrameBuffer,
        params: &ParameterSnapshot,
        rng: &mut dyn RandomSource,
    ) -> Duration {
        if let GameState::Dying { flashes_shown } = self.state {
            let shown = flashes_shown + 1;
            let value = if shown % 2 == 1 { params.brightness / 2 } else { 0 };
            self.draw_endpoints(frame, Color::from_hsv(ALARM_HUE, 255, value));

            self.state = if shown >= FLASH_COUNT {
                tracing::debug!("Alarm finished, play resumes");
                GameState::Active
            } else {
                GameState::Dying {
                    flashes_shown: shown,
                }
            };
            return FLASH_HOLD;
        }

        if self.play(frame, params.brightness, rng) {
            self.die(frame, rng);
        } else {
            self.tick += 1;
        }

        self.draw_endpoints(frame, Color::from_hsv(WIREFRAME_HUE, 255, params.brightness / 2));
        TICK_HOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{Direction, direction_after_arrival};
    use crate::traversal::ScriptedRandom;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn pacman() -> PacMan {
        PacMan::new(Topology::sculpture())
    }

    fn place(entity: &mut Entity, position: usize, direction: Direction, counter: usize) {
        entity.position = position;
        entity.direction = direction;
        entity.counter = counter;
    }

    /// A game where ghost 1 reaches pacman on the next even tick.
    fn game_about_to_collide() -> PacMan {
        let mut game = pacman();
        // Pacman walks 35 → 36; ghost 1 walks 37 → 36.
        place(&mut game.entities[0], 35, Direction::Forward, 1);
        place(&mut game.entities[1], 37, Direction::Backward, 3);
        place(&mut game.entities[2], 441, Direction::Backward, 0);
        place(&mut game.entities[3], 442, Direction::Forward, 0);
        place(&mut game.entities[4], 459, Direction::Backward, 0);
        game
    }

    #[test]
    fn activate_places_everyone_on_home_vertices() {
        let topology = Topology::sculpture();
        let mut game = pacman();
        let mut rng = ScriptedRandom::new([2, 0, 1, 2, 1]);
        game.activate(&mut rng);

        assert_eq!(game.pacman().position, 0);
        let ghosts: Vec<usize> = game.ghosts().iter().map(|g| g.position).collect();
        assert_eq!(ghosts, vec![441, 442, 459, 442]);
        for entity in &game.entities {
            assert_eq!(entity.counter, 0);
            assert_eq!(entity.direction, direction_after_arrival(entity.position));
        }
        assert_eq!(topology.locate(game.pacman().position).map(|s| s.vertex), Some(0));
        assert_eq!(game.state(), GameState::Active);
    }

    #[test]
    fn colors_are_fixed_per_entity() {
        let game = pacman();
        let hues: Vec<u8> = game.entities.iter().map(|e| e.hue).collect();
        assert_eq!(hues, vec![40, 0, 19, 135, 220]);
        assert_eq!(game.pacman().kind, EntityKind::PacMan);
        assert!(game.ghosts().iter().all(|g| g.kind == EntityKind::Ghost));
    }

    #[test]
    fn pacman_moves_every_tick_and_ghosts_every_other() {
        let mut game = pacman();
        let mut rng = ScriptedRandom::default();
        game.activate(&mut rng);
        let mut frame = FrameBuffer::new();
        let params = ParameterSnapshot::default();

        let pacman_start = game.pacman().position;
        let ghost_start = game.ghosts()[0].position;

        game.update(&mut frame, &params, &mut rng);
        assert_eq!(game.pacman().position, pacman_start - 1);
        assert_eq!(game.ghosts()[0].position, ghost_start - 1);

        game.update(&mut frame, &params, &mut rng);
        assert_eq!(game.pacman().position, pacman_start - 2);
        assert_eq!(game.ghosts()[0].position, ghost_start - 1);

        game.update(&mut frame, &params, &mut rng);
        assert_eq!(game.ghosts()[0].position, ghost_start - 2);
    }

    #[test]
    fn moving_erases_the_previous_pixel() {
        let mut game = pacman();
        let mut rng = ScriptedRandom::default();
        game.activate(&mut rng);
        let mut frame = FrameBuffer::new();
        let params = ParameterSnapshot::default();

        game.update(&mut frame, &params, &mut rng);
        let first = game.pacman().position;
        assert_eq!(frame.get(first), Color::from_hsv(PACMAN_HUE, 255, 128));

        game.update(&mut frame, &params, &mut rng);
        assert!(frame.get(first).is_black());
        assert_eq!(frame.get(game.pacman().position), Color::from_hsv(PACMAN_HUE, 255, 128));
    }

    #[test]
    fn wireframe_is_drawn_last_every_active_tick() {
        let topology = Topology::sculpture();
        let mut game = pacman();
        let mut rng = StdRng::seed_from_u64(8);
        game.activate(&mut rng);
        let mut frame = FrameBuffer::new();
        let params = ParameterSnapshot::default();
        let wire = Color::from_hsv(WIREFRAME_HUE, 255, 64);

        for _ in 0..40 {
            let hold = game.update(&mut frame, &params, &mut rng);
            if game.state() == GameState::Active && hold == TICK_HOLD {
                assert!(topology.endpoints().all(|led| frame.get(led) == wire));
            }
        }
    }

    #[test]
    fn counters_stay_below_strip_end() {
        let topology = Topology::sculpture();
        let mut game = pacman();
        let mut rng = StdRng::seed_from_u64(21);
        game.activate(&mut rng);
        let mut frame = FrameBuffer::new();
        let params = ParameterSnapshot::default();

        for _ in 0..3000 {
            game.update(&mut frame, &params, &mut rng);
            for entity in &game.entities {
                assert!(entity.counter < STRIP_LENGTH - 1);
                if entity.counter == 0 {
                    assert!(topology.is_endpoint(entity.position));
                    assert_eq!(entity.direction, direction_after_arrival(entity.position));
                }
            }
        }
    }

    #[test]
    fn ghost_landing_on_pacman_starts_dying_in_the_same_tick() {
        let mut game = game_about_to_collide();
        let mut frame = FrameBuffer::new();
        let mut rng = ScriptedRandom::new([1, 0, 1, 2, 0]);
        let params = ParameterSnapshot::default();

        game.update(&mut frame, &params, &mut rng);

        assert_eq!(game.state(), GameState::Dying { flashes_shown: 0 });
        assert_eq!(game.deaths(), 1);
        assert_eq!(game.pacman().position, 85);
        let ghosts: Vec<usize> = game.ghosts().iter().map(|g| g.position).collect();
        assert_eq!(ghosts, vec![441, 442, 459, 441]);
        assert!(game.entities.iter().all(|e| e.counter == 0));
        // The collision pixel was wiped with the rest of the board.
        assert!(frame.get(36).is_black());
    }

    #[test]
    fn collision_plays_six_alternating_flashes_then_resumes() {
        let topology = Topology::sculpture();
        let mut game = game_about_to_collide();
        let mut frame = FrameBuffer::new();
        let mut rng = ScriptedRandom::default();
        let params = ParameterSnapshot {
            brightness: 200,
            ..Default::default()
        };

        game.update(&mut frame, &params, &mut rng);
        let starts: Vec<Entity> = game.entities.to_vec();

        let mut flashes = Vec::new();
        while let GameState::Dying { .. } = game.state() {
            let hold = game.update(&mut frame, &params, &mut rng);
            assert_eq!(hold, FLASH_HOLD);
            let values: Vec<Color> = topology.endpoints().map(|led| frame.get(led)).collect();
            assert!(values.windows(2).all(|w| w[0] == w[1]));
            flashes.push(values[0]);
            // Nobody moves during the alarm.
            assert_eq!(game.entities.to_vec(), starts);
        }

        let on = Color::from_hsv(ALARM_HUE, 255, 100);
        let off = Color::BLACK;
        assert_eq!(flashes, vec![on, off, on, off, on, off]);

        let hold = game.update(&mut frame, &params, &mut rng);
        assert_eq!(hold, TICK_HOLD);
        assert_ne!(game.pacman().position, starts[0].position);
    }

    #[test]
    fn pattern_switch_mid_alarm_restarts_cleanly() {
        let mut game = game_about_to_collide();
        let mut frame = FrameBuffer::new();
        let mut rng = ScriptedRandom::default();
        let params = ParameterSnapshot::default();

        game.update(&mut frame, &params, &mut rng);
        game.update(&mut frame, &params, &mut rng);
        assert_eq!(game.state(), GameState::Dying { flashes_shown: 1 });

        game.deactivate();
        game.activate(&mut rng);
        assert_eq!(game.state(), GameState::Active);
        assert_eq!(game.tick, 0);
    }
}
