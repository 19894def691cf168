//! Client Session
//!
//! Single-threaded frame driver. One call to [`ClientSession::frame`] runs,
//! strictly in order:
//!
//! 1. drain and merge inbound network messages
//! 2. emit the cadence snapshot (also while dead)
//! 3. simulation tick
//! 4. sound cues, then forward remote-player hits and pickups
//! 5. render

use tracing::{debug, info};

use crate::game::input::InputFrame;
use crate::game::state::GameState;
use crate::game::tick::{tick, SimConfig, TickResult};
use crate::network::protocol::WireMessage;
use crate::network::sync::NetworkSync;
use crate::render::{AssetStore, AudioSink, Frame, RenderConfig, Renderer};

/// Session statistics.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Frames driven
    pub frames: u64,
    /// Inbound messages merged
    pub messages_applied: u64,
    /// Snapshots handed to the transport
    pub snapshots_sent: u64,
    /// Restarts after death
    pub restarts: u32,
}

/// A client: simulation, sync, renderer and audio.
pub struct ClientSession {
    state: GameState,
    sim: SimConfig,
    sync: NetworkSync,
    renderer: Renderer,
    assets: AssetStore,
    audio: Box<dyn AudioSink + Send>,
    pending_switch: bool,
    stats: SessionStats,
}

impl ClientSession {
    /// Create a session.
    pub fn new(
        state: GameState,
        sim: SimConfig,
        sync: NetworkSync,
        render: RenderConfig,
        assets: AssetStore,
        audio: Box<dyn AudioSink + Send>,
    ) -> Self {
        info!(player = %state.player.id, "session created");
        Self {
            state,
            sim,
            sync,
            renderer: Renderer::new(render),
            assets,
            audio,
            pending_switch: false,
            stats: SessionStats::default(),
        }
    }

    /// Drive one frame.
    pub fn frame(&mut self, input: &InputFrame, dt: f64) -> TickResult {
        self.stats.frames += 1;

        // 1. Merge everything that arrived since the last frame
        self.stats.messages_applied += self.sync.drain(&mut self.state) as u64;

        // 2. Cadence snapshot
        if self.sync.maybe_emit_snapshot(&self.state) {
            self.stats.snapshots_sent += 1;
        }

        // 3. Simulate
        let mut input = *input;
        if std::mem::take(&mut self.pending_switch) {
            input.set(InputFrame::FLAG_SWITCH, true);
        }
        let result = tick(&mut self.state, &input, &self.sim, dt);

        // 4. Feedback and forwarding
        for event in &result.events {
            if let Some(cue) = event.sound_cue() {
                self.assets.play(cue, self.audio.as_mut());
            }
        }
        self.sync.forward_events(&self.state, &result.events);

        // 5. Draw
        self.renderer.render_frame(&self.state, &self.assets);

        result
    }

    /// Cycle weapons on the next frame.
    pub fn switch_weapon(&mut self) {
        self.pending_switch = true;
    }

    /// Restart after death: notify the relay and respawn the local player.
    /// Does nothing while alive.
    pub fn restart(&mut self) -> bool {
        if !self.state.is_dead() {
            debug!("restart ignored while alive");
            return false;
        }
        self.sync.send(WireMessage::Restart {
            player_id: Some(self.state.player.id.clone()),
        });
        self.state.restart();
        self.stats.restarts += 1;
        true
    }

    /// Simulation state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Mutable simulation state, for hosts that inject map replacements or damage.
    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Last rendered frame.
    pub fn frame_buffer(&self) -> &Frame {
        self.renderer.frame()
    }

    /// Network sync handle.
    pub fn sync(&self) -> &NetworkSync {
        &self.sync
    }

    /// Asset handles, for the host loader to fill in.
    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    /// Session statistics.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }
}
