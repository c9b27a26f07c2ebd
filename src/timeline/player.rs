use crate::animation::value::Value;
use crate::foundation::core::{Fps, FrameIndex, FrameRange, TIME_EPSILON};
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::scene::build::Scene;
use crate::scene::graph::SceneGraph;
use crate::scene::property::PropKey;
use crate::timeline::sink::{PropertyUpdate, SinkConfig, UpdateSink};
use crate::timeline::step::Extent;
use crate::timeline::task::{Poll, Task};
use std::collections::BTreeMap;

/// Options controlling how a [`Player`] samples its scene.
#[derive(Clone, Debug)]
pub struct PlayerOpts {
    /// Sampling rate for [`Player::render`]. `None` uses the scene's fps.
    pub fps: Option<Fps>,
    /// Emit every property on the first frame, not only those that differ from the build state.
    pub emit_initial_state: bool,
    /// Extra frames sampled after the scene settles.
    pub settle_padding_frames: u64,
}

impl Default for PlayerOpts {
    fn default() -> Self {
        Self {
            fps: None,
            emit_initial_state: true,
            settle_padding_frames: 0,
        }
    }
}

/// Lifecycle of a scene inside a player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayState {
    /// Built; the clock has not moved.
    Built,
    Running,
    /// The script and everything it spawned have finished.
    Complete,
    /// A step raised an error; the scene cannot continue.
    Failed,
}

/// Render statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderStats {
    pub frames: u64,
    pub updates: u64,
    pub duration_secs: f64,
}

/// Drives one scene's script along a single logical clock.
///
/// The player owns the scene exclusively. Time only moves forward; every step starts at the exact
/// logical end of the step before it, however coarse the sampling.
pub struct Player {
    scene: Scene,
    opts: PlayerOpts,
    state: PlayState,
    clock: f64,
    main: Option<Task>,
    detached: Vec<Task>,
    settled_at: f64,
    failure: Option<ChoreoError>,
}

impl Player {
    pub fn new(scene: Scene, opts: PlayerOpts) -> Self {
        Self {
            scene,
            opts,
            state: PlayState::Built,
            clock: 0.0,
            main: None,
            detached: Vec::new(),
            settled_at: 0.0,
            failure: None,
        }
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == PlayState::Complete
    }

    /// Current logical time in seconds.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn graph(&self) -> &SceneGraph {
        self.scene.graph()
    }

    pub fn into_scene(self) -> Scene {
        self.scene
    }

    /// Logical time at which the scene finished. `None` until complete.
    pub fn completed_at(&self) -> Option<f64> {
        self.is_complete().then_some(self.settled_at)
    }

    pub fn extent(&self) -> Extent {
        self.scene.extent()
    }

    pub fn fps(&self) -> Fps {
        self.opts.fps.unwrap_or(self.scene.fps())
    }

    /// Advance the clock to `t` seconds, applying every step whose time has come.
    ///
    /// Steps that start between the current clock and `t` see the scene as it was at their own
    /// start time, so the result does not depend on how often the player is sampled. An error
    /// while running leaves the player [`PlayState::Failed`]; later calls return the same error.
    pub fn advance_to(&mut self, t: f64) -> ChoreoResult<PlayState> {
        self.check_failed()?;
        if !t.is_finite() {
            return Err(ChoreoError::validation("advance_to time must be finite"));
        }
        if t + TIME_EPSILON < self.clock {
            return Err(ChoreoError::validation(format!(
                "advance_to({t}) is before the current clock ({})",
                self.clock
            )));
        }
        let now = t.max(self.clock);
        match self.run_until(now) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::debug!(scene = self.scene.name(), error = %e, "scene failed");
                self.state = PlayState::Failed;
                self.failure = Some(e.replay());
                Err(e)
            }
        }
    }

    fn check_failed(&self) -> ChoreoResult<()> {
        match &self.failure {
            Some(e) => Err(e.replay()),
            None => Ok(()),
        }
    }

    fn run_until(&mut self, now: f64) -> ChoreoResult<PlayState> {
        if self.state == PlayState::Built {
            self.state = PlayState::Running;
            let script = self.scene.script().clone();
            let (graph, detached) = (self.scene.graph_mut(), &mut self.detached);
            self.main = Some(Task::start(&script, 0.0, graph, detached)?);
        }
        if self.state == PlayState::Running {
            while let Some(at) = self.next_boundary().filter(|b| b + TIME_EPSILON < now) {
                self.step(at)?;
            }
            self.step(now)?;
        }

        self.clock = now;
        if self.state == PlayState::Running && self.main.is_none() && self.detached.is_empty() {
            tracing::debug!(scene = self.scene.name(), at = self.settled_at, "scene complete");
            self.state = PlayState::Complete;
        }
        Ok(self.state)
    }

    fn next_boundary(&self) -> Option<f64> {
        self.main
            .iter()
            .chain(&self.detached)
            .filter_map(Task::next_boundary)
            .min_by(f64::total_cmp)
    }

    /// Bring every task to `now`: first write all running tweens, then finish and start steps.
    fn step(&mut self, now: f64) -> ChoreoResult<()> {
        let graph = self.scene.graph_mut();
        for task in self.main.iter().chain(&self.detached) {
            task.sample(now, graph)?;
        }

        if let Some(main) = self.main.as_mut()
            && let Poll::Ready(end) = main.advance(now, graph, &mut self.detached)?
        {
            self.settled_at = self.settled_at.max(end);
            self.main = None;
        }

        // Tasks spawned while advancing land at the end and are advanced in the same pass.
        let mut i = 0;
        while i < self.detached.len() {
            let mut spawned = Vec::new();
            let graph = self.scene.graph_mut();
            match self.detached[i].advance(now, graph, &mut spawned)? {
                Poll::Ready(end) => {
                    self.settled_at = self.settled_at.max(end);
                    self.detached.remove(i);
                }
                Poll::Pending => i += 1,
            }
            self.detached.extend(spawned);
        }
        Ok(())
    }

    /// Run straight to the settle time without sampling.
    pub fn run_to_end(&mut self) -> ChoreoResult<f64> {
        let settle = self.extent().settle;
        self.advance_to(settle.max(self.clock))?;
        self.completed_at().ok_or_else(|| {
            ChoreoError::validation(format!(
                "scene '{}' did not settle at {settle}s",
                self.scene.name()
            ))
        })
    }

    /// Sample the scene at its fps from frame 0 through the frame containing the settle time,
    /// streaming changed property values into `sink`.
    #[tracing::instrument(skip(self, sink), fields(scene = self.scene.name()))]
    pub fn render(&mut self, sink: &mut dyn UpdateSink) -> ChoreoResult<RenderStats> {
        self.check_failed()?;
        if self.state != PlayState::Built {
            return Err(ChoreoError::validation(
                "render requires a player that has not started",
            ));
        }
        let fps = self.fps();
        let settle = self.extent().settle;
        let settle_frame = fps.secs_to_frames_ceil(settle);
        let range = FrameRange::new(
            FrameIndex(0),
            FrameIndex(settle_frame + 1 + self.opts.settle_padding_frames),
        )?;
        let frames = range.len_frames();

        sink.begin(SinkConfig {
            scene: self.scene.name().to_owned(),
            fps,
            frames,
            duration_secs: settle,
        })?;

        let mut last = if self.opts.emit_initial_state {
            Vec::new()
        } else {
            self.resolve_all()?
        };
        let mut stats = RenderStats {
            frames,
            updates: 0,
            duration_secs: settle,
        };

        for frame in range.frames() {
            let time = fps.frame_time_secs(frame);
            // The settle frame absorbs float noise from frame-count rounding.
            let sample = if frame.0 == settle_frame {
                time.max(settle)
            } else {
                time
            };
            self.advance_to(sample)?;

            let current = self.resolve_all()?;
            let mut emitted = 0u64;
            let graph = self.scene.graph();
            for (idx, (id, props)) in graph.node_ids().zip(&current).enumerate() {
                let before = last.get(idx);
                for (prop, value) in props {
                    if before.and_then(|b| b.get(prop)) == Some(value) {
                        continue;
                    }
                    let node = graph.node_name(id);
                    sink.push(&PropertyUpdate {
                        frame,
                        time,
                        node,
                        property: *prop,
                        value: value.clone(),
                    })?;
                    emitted += 1;
                }
            }
            tracing::trace!(frame = frame.0, emitted, "frame");
            stats.updates += emitted;
            last = current;
        }

        sink.end()?;
        if !self.is_complete() {
            return Err(ChoreoError::validation(format!(
                "scene '{}' still running after its settle frame",
                self.scene.name()
            )));
        }
        Ok(stats)
    }

    fn resolve_all(&self) -> ChoreoResult<Vec<BTreeMap<PropKey, Value>>> {
        let graph = self.graph();
        graph.node_ids().map(|id| graph.state(id)).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/player.rs"]
mod tests;
