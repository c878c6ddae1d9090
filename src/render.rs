//! Render loop: owns the patterns and the frame, applies control commands
//! between ticks.
//!
//! Everything runs on one thread. The HTTP handlers only send
//! [`RenderCommand`] values through an `mpsc` channel; the loop drains the
//! channel at the start of every tick, runs the selected pattern once, and
//! flushes the frame to its [`FrameSink`].

use crate::frame::{FrameBuffer, FrameSink};
use crate::is_running;
use crate::patterns::pacman::GameState;
use crate::patterns::{Comets, Fireworks, PacMan, ParameterSnapshot, Pattern, PatternKind};
use crate::topology::Topology;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Commands ─────────────────────────────────────────────────────────

/// Commands sent from the HTTP server to the render loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderCommand {
    /// Switch to another pattern (restarts it if already selected)
    SetPattern(PatternKind),
    /// Change some of the control parameters
    SetParams(ParameterUpdate),
    /// Turn the display on or off
    SetRunning(bool),
    /// Flip the on/off state
    Toggle,
    /// Blank the frame once
    Clear,
}

/// A partial parameter change; absent fields keep their value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, utoipa::ToSchema)]
pub struct ParameterUpdate {
    #[schema(example = 0, minimum = 0, maximum = 255)]
    pub hue: Option<u8>,
    #[schema(example = 255, minimum = 0, maximum = 255)]
    pub saturation: Option<u8>,
    #[schema(example = 128, minimum = 0, maximum = 255)]
    pub brightness: Option<u8>,
    #[schema(example = 50, minimum = 0, maximum = 255)]
    pub speed: Option<u8>,
}

impl ParameterUpdate {
    pub fn apply_to(&self, params: &mut ParameterSnapshot) {
        if let Some(hue) = self.hue {
            params.hue = hue;
        }
        if let Some(saturation) = self.saturation {
            params.saturation = saturation;
        }
        if let Some(brightness) = self.brightness {
            params.brightness = brightness;
        }
        if let Some(speed) = self.speed {
            params.speed = speed;
        }
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// Snapshot of the render loop that the HTTP server reports.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct DisplayStatus {
    /// Whether patterns are being drawn (false = display blanked)
    pub running: bool,
    /// Selected pattern
    pub pattern: PatternKind,
    /// Current control parameters
    pub params: ParameterSnapshot,
    /// PacMan game state, while PacMan is selected
    pub game: Option<GameState>,
    /// Ticks rendered since startup
    pub frames: u64,
    /// Server version
    pub version: String,
}

impl DisplayStatus {
    pub fn new(pattern: PatternKind, params: ParameterSnapshot) -> Self {
        Self {
            running: true,
            pattern,
            params,
            game: None,
            frames: 0,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// ── Renderer ─────────────────────────────────────────────────────────

/// One instance of every pattern, so switching back resumes cheaply.
struct Patterns {
    comets: Comets,
    fireworks: Fireworks,
    pacman: PacMan,
}

impl Patterns {
    fn new(topology: Topology) -> Self {
        Self {
            comets: Comets::new(topology),
            fireworks: Fireworks::new(topology),
            pacman: PacMan::new(topology),
        }
    }

    fn get_mut(&mut self, kind: PatternKind) -> &mut dyn Pattern {
        match kind {
            PatternKind::Comets => &mut self.comets,
            PatternKind::Fireworks => &mut self.fireworks,
            PatternKind::PacMan => &mut self.pacman,
        }
    }
}

/// Owns the frame, the patterns and the sink; advanced one tick at a time.
pub struct Renderer<S: FrameSink> {
    sink: S,
    frame: FrameBuffer,
    patterns: Patterns,
    selected: PatternKind,
    params: ParameterSnapshot,
    running: bool,
    rng: StdRng,
    frames: u64,
    status: Arc<Mutex<DisplayStatus>>,
}

impl<S: FrameSink> Renderer<S> {
    /// Build a renderer with `pattern` already activated.
    pub fn new(
        sink: S,
        pattern: PatternKind,
        params: ParameterSnapshot,
        rng: StdRng,
        status: Arc<Mutex<DisplayStatus>>,
    ) -> Self {
        let mut renderer = Self {
            sink,
            frame: FrameBuffer::new(),
            patterns: Patterns::new(Topology::sculpture()),
            selected: pattern,
            params,
            running: true,
            rng,
            frames: 0,
            status,
        };
        renderer.patterns.get_mut(pattern).activate(&mut renderer.rng);
        renderer.publish_status();
        renderer
    }

    pub fn selected(&self) -> PatternKind {
        self.selected
    }

    pub fn params(&self) -> ParameterSnapshot {
        self.params
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Apply one control command.
    pub fn apply(&mut self, cmd: RenderCommand) {
        match cmd {
            RenderCommand::SetPattern(kind) => {
                self.patterns.get_mut(self.selected).deactivate();
                self.frame.clear();
                self.patterns.get_mut(kind).activate(&mut self.rng);
                tracing::info!("Pattern: {} → {}", self.selected, kind);
                self.selected = kind;
            }

            RenderCommand::SetParams(update) => {
                update.apply_to(&mut self.params);
                tracing::debug!("Parameters: {:?}", self.params);
            }

            RenderCommand::SetRunning(running) => self.set_running(running),

            RenderCommand::Toggle => self.set_running(!self.running),

            RenderCommand::Clear => {
                self.frame.clear();
                self.sink.flush(&self.frame);
            }
        }
        self.publish_status();
    }

    fn set_running(&mut self, running: bool) {
        if running != self.running {
            tracing::info!("Display {}", if running { "enabled" } else { "disabled" });
        }
        self.running = running;
    }

    /// Run the selected pattern for one tick and flush the frame.
    ///
    /// Returns the extra time the pattern wants this frame held.
    pub fn tick(&mut self) -> Duration {
        let hold = if self.running {
            self.params.advance_hue();
            let params = self.params;
            self.patterns
                .get_mut(self.selected)
                .update(&mut self.frame, &params, &mut self.rng)
        } else {
            self.frame.clear();
            Duration::ZERO
        };

        self.sink.flush(&self.frame);
        self.frames += 1;
        self.publish_status();
        hold
    }

    fn publish_status(&self) {
        let mut s = self.status.lock().unwrap();
        s.running = self.running;
        s.pattern = self.selected;
        s.params = self.params;
        s.game = (self.selected == PatternKind::PacMan).then(|| self.patterns.pacman.state());
        s.frames = self.frames;
    }
}

// ── Render loop ──────────────────────────────────────────────────────

/// Drive `renderer` until Ctrl+C clears `running` or every command sender
/// is dropped.
///
/// Commands are drained with `try_recv()` before each tick, so a pattern
/// switch takes effect on the very next frame.
pub async fn render_loop<S: FrameSink>(
    mut renderer: Renderer<S>,
    rx: Receiver<RenderCommand>,
    running: Arc<AtomicBool>,
    frame_interval: Duration,
) {
    tracing::info!(
        "Render loop started: {} every {}ms",
        renderer.selected(),
        frame_interval.as_millis()
    );

    'render: while is_running(&running) {
        loop {
            match rx.try_recv() {
                Ok(cmd) => renderer.apply(cmd),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::info!("Render loop: channel closed, shutting down.");
                    break 'render;
                }
            }
        }

        let hold = renderer.tick();
        tokio::time::sleep(frame_interval + hold).await;
    }

    renderer.apply(RenderCommand::Clear);
    tracing::info!("Render loop stopped after {} frames", renderer.frames);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RecordingSink;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use std::sync::mpsc;

    fn renderer(pattern: PatternKind) -> (Renderer<RecordingSink>, Arc<Mutex<DisplayStatus>>) {
        let params = ParameterSnapshot::default();
        let status = Arc::new(Mutex::new(DisplayStatus::new(pattern, params)));
        let renderer = Renderer::new(
            RecordingSink::default(),
            pattern,
            params,
            StdRng::seed_from_u64(1),
            status.clone(),
        );
        (renderer, status)
    }

    #[test]
    fn tick_flushes_one_frame() {
        let (mut renderer, status) = renderer(PatternKind::Comets);
        renderer.tick();
        renderer.tick();
        assert_eq!(renderer.sink().frames.len(), 2);
        assert!(renderer.frame().lit_count() > 0);
        assert_eq!(status.lock().unwrap().frames, 2);
    }

    #[test]
    fn tick_drifts_hue() {
        let (mut renderer, _) = renderer(PatternKind::Comets);
        renderer.tick();
        renderer.tick();
        assert_eq!(renderer.params().hue, 2);
    }

    #[test]
    fn disabled_display_flushes_black() {
        let (mut renderer, status) = renderer(PatternKind::Comets);
        renderer.tick();
        renderer.apply(RenderCommand::Toggle);
        renderer.tick();

        assert!(!renderer.is_running());
        assert!(!status.lock().unwrap().running);
        assert_eq!(renderer.sink().frames.last().unwrap().lit_count(), 0);

        renderer.apply(RenderCommand::SetRunning(true));
        renderer.tick();
        assert!(renderer.sink().frames.last().unwrap().lit_count() > 0);
    }

    #[test]
    fn pattern_switch_clears_and_reports_game_state() {
        let (mut renderer, status) = renderer(PatternKind::Comets);
        renderer.tick();
        assert_eq!(status.lock().unwrap().game, None);

        renderer.apply(RenderCommand::SetPattern(PatternKind::PacMan));
        assert_eq!(renderer.frame().lit_count(), 0);
        assert_eq!(renderer.selected(), PatternKind::PacMan);

        let hold = renderer.tick();
        assert_eq!(hold, Duration::from_millis(70));
        let s = status.lock().unwrap();
        assert_eq!(s.pattern, PatternKind::PacMan);
        assert_eq!(s.game, Some(GameState::Active));
    }

    #[test]
    fn set_params_applies_only_given_fields() {
        let (mut renderer, status) = renderer(PatternKind::Fireworks);
        renderer.apply(RenderCommand::SetParams(ParameterUpdate {
            brightness: Some(10),
            speed: Some(200),
            ..Default::default()
        }));

        let params = renderer.params();
        assert_eq!(params.brightness, 10);
        assert_eq!(params.speed, 200);
        assert_eq!(params.saturation, 255);
        assert_eq!(status.lock().unwrap().params, params);
    }

    #[test]
    fn clear_flushes_immediately() {
        let (mut renderer, _) = renderer(PatternKind::Comets);
        renderer.tick();
        renderer.apply(RenderCommand::Clear);
        assert_eq!(renderer.sink().frames.len(), 2);
        assert_eq!(renderer.sink().frames[1].lit_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn render_loop_stops_when_senders_drop() {
        let (renderer, status) = renderer(PatternKind::Fireworks);
        let (tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));

        tx.send(RenderCommand::SetPattern(PatternKind::Comets)).unwrap();
        let handle = tokio::spawn(render_loop(renderer, rx, running, Duration::from_millis(20)));

        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(tx);
        handle.await.unwrap();

        let s = status.lock().unwrap();
        assert_eq!(s.pattern, PatternKind::Comets);
        assert!(s.frames > 0);
    }

    #[tokio::test(start_paused = true)]
    async fn render_loop_stops_when_running_clears() {
        let (renderer, status) = renderer(PatternKind::Comets);
        let (_tx, rx) = mpsc::channel();
        let running = Arc::new(AtomicBool::new(true));

        let handle = tokio::spawn(render_loop(
            renderer,
            rx,
            running.clone(),
            Duration::from_millis(20),
        ));
        tokio::time::sleep(Duration::from_millis(100)).await;
        running.store(false, std::sync::atomic::Ordering::SeqCst);
        handle.await.unwrap();

        assert!(status.lock().unwrap().frames >= 1);
    }
}
