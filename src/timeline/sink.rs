use crate::animation::value::Value;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ChoreoError, ChoreoResult};
use crate::scene::property::PropKey;
use std::io::Write;
use xxhash_rust::xxh3::Xxh3;

/// Configuration provided to an [`UpdateSink`] before the first update of a scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SinkConfig {
    pub scene: String,
    pub fps: Fps,
    /// Number of frames that will be sampled.
    pub frames: u64,
    /// Seconds until the scene settles.
    pub duration_secs: f64,
}

/// One resolved property value that changed at a frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PropertyUpdate {
    pub frame: FrameIndex,
    pub time: f64,
    pub node: String,
    pub property: PropKey,
    pub value: Value,
}

/// Consumer of the update stream produced by [`crate::Player::render`].
///
/// Ordering contract: `push` is called in non-decreasing frame order; within a frame, updates
/// follow node declaration order and then property order.
pub trait UpdateSink {
    fn begin(&mut self, cfg: SinkConfig) -> ChoreoResult<()>;
    fn push(&mut self, update: &PropertyUpdate) -> ChoreoResult<()>;
    fn end(&mut self) -> ChoreoResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    pub updates: Vec<PropertyUpdate>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Last value emitted for `node.property` at or before `frame`.
    pub fn value_at(&self, node: &str, property: PropKey, frame: FrameIndex) -> Option<&Value> {
        self.updates
            .iter()
            .rev()
            .find(|u| u.frame <= frame && u.node == node && u.property == property)
            .map(|u| &u.value)
    }

    /// Updates emitted at exactly `frame`.
    pub fn frame(&self, frame: FrameIndex) -> impl Iterator<Item = &PropertyUpdate> {
        self.updates.iter().filter(move |u| u.frame == frame)
    }
}

impl UpdateSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ChoreoResult<()> {
        self.cfg = Some(cfg);
        self.updates.clear();
        self.finished = false;
        Ok(())
    }

    fn push(&mut self, update: &PropertyUpdate) -> ChoreoResult<()> {
        self.updates.push(update.clone());
        Ok(())
    }

    fn end(&mut self) -> ChoreoResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes the config as a header line, then one JSON object per update.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line<T: serde::Serialize>(&mut self, v: &T) -> ChoreoResult<()> {
        serde_json::to_writer(&mut self.out, v).map_err(|e| ChoreoError::serde(e.to_string()))?;
        self.out
            .write_all(b"\n")
            .map_err(|e| ChoreoError::Other(e.into()))
    }
}

impl<W: Write> UpdateSink for JsonLinesSink<W> {
    fn begin(&mut self, cfg: SinkConfig) -> ChoreoResult<()> {
        self.line(&cfg)
    }

    fn push(&mut self, update: &PropertyUpdate) -> ChoreoResult<()> {
        self.line(update)
    }

    fn end(&mut self) -> ChoreoResult<()> {
        self.out.flush().map_err(|e| ChoreoError::Other(e.into()))
    }
}

/// Hashes the serialized update stream with xxh3; equal digests mean identical playback.
pub struct DigestSink {
    hasher: Xxh3,
    count: u64,
}

impl Default for DigestSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestSink {
    pub fn new() -> Self {
        Self {
            hasher: Xxh3::new(),
            count: 0,
        }
    }

    pub fn digest(&self) -> u64 {
        self.hasher.digest()
    }

    /// Number of updates hashed since `begin`.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl UpdateSink for DigestSink {
    fn begin(&mut self, cfg: SinkConfig) -> ChoreoResult<()> {
        self.hasher.reset();
        self.count = 0;
        let bytes = serde_json::to_vec(&cfg).map_err(|e| ChoreoError::serde(e.to_string()))?;
        self.hasher.update(&bytes);
        Ok(())
    }

    fn push(&mut self, update: &PropertyUpdate) -> ChoreoResult<()> {
        let bytes = serde_json::to_vec(update).map_err(|e| ChoreoError::serde(e.to_string()))?;
        self.hasher.update(&bytes);
        self.count += 1;
        Ok(())
    }

    fn end(&mut self) -> ChoreoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/sink.rs"]
mod tests;
