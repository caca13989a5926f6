//! Clock-driven playback of a compiled timeline.
//!
//! The host owns the frame loop and the clock: it passes its clock
//! reading (seconds) into [`PlaybackController::start`],
//! [`PlaybackController::update`] and friends. Nothing here spawns
//! threads or blocks.
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SyncConfig;
use crate::error::PlaybackStateError;
use crate::scene::{HostScene, ObjectHandle, VisualState};
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Paused,
    Finished,
    Cancelled,
}

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    /// Playback time of the frame.
    pub time: f64,
    /// Number of objects written.
    pub writes: usize,
    pub state: PlaybackState,
}

/// Only writer of object states during playback.
///
/// Incremental frames write only objects, whose state differs from the
/// last written one. Seeking rewrites everything.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    timeline: Arc<Timeline>,
    state: PlaybackState,
    /// Playback time at the `anchor` clock reading.
    offset: f64,
    anchor: Option<f64>,
    last_now: f64,
    time: f64,
    cache: HashMap<ObjectHandle, VisualState>,
    segment: Option<usize>,
}
impl PlaybackController {
    pub fn new(timeline: Arc<Timeline>, config: &SyncConfig) -> Self {
        let start = -config.lead_in.max(0.0);
        Self {
            timeline,
            state: PlaybackState::Idle,
            offset: start,
            anchor: None,
            last_now: 0.0,
            time: start,
            cache: HashMap::new(),
            segment: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }
    /// Playback time of the last frame.
    pub fn time(&self) -> f64 {
        self.time
    }
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    fn reject(&self, operation: &'static str) -> PlaybackStateError {
        PlaybackStateError {
            operation,
            state: self.state,
        }
    }

    fn transition(&mut self, state: PlaybackState) {
        log::debug!(
            "playback {:?} -> {:?} at {:.3}s",
            self.state,
            state,
            self.time
        );
        self.state = state;
    }

    fn report(&self, writes: usize) -> FrameReport {
        FrameReport {
            time: self.time,
            writes,
            state: self.state,
        }
    }

    /// Begin playback and write the first frame in full.
    pub fn start(
        &mut self,
        now: f64,
        scene: &mut impl HostScene,
    ) -> Result<FrameReport, PlaybackStateError> {
        if self.state != PlaybackState::Idle {
            return Err(self.reject("start"));
        }
        self.anchor = Some(now);
        self.last_now = now;
        self.transition(PlaybackState::Running);
        let writes = self.frame(self.offset, scene, true);
        Ok(self.report(writes))
    }

    /// Freeze the clock. Objects keep their states.
    pub fn pause(&mut self, now: f64) -> Result<f64, PlaybackStateError> {
        if self.state != PlaybackState::Running {
            return Err(self.reject("pause"));
        }
        self.offset = self.time_at(now);
        self.time = self.offset;
        self.anchor = None;
        self.last_now = now;
        self.transition(PlaybackState::Paused);
        Ok(self.time)
    }

    /// Continue from the paused time.
    pub fn resume(&mut self, now: f64) -> Result<(), PlaybackStateError> {
        if self.state != PlaybackState::Paused {
            return Err(self.reject("resume"));
        }
        self.anchor = Some(now);
        self.last_now = now;
        self.transition(PlaybackState::Running);
        Ok(())
    }

    /// Jump to playback time `t` and rewrite every object.
    ///
    /// Running playback continues from `t`. Finished playback becomes
    /// paused, unless `t` is past the end: the final frame is already on
    /// screen then, and nothing is written.
    pub fn seek(
        &mut self,
        t: f64,
        scene: &mut impl HostScene,
    ) -> Result<FrameReport, PlaybackStateError> {
        match self.state {
            PlaybackState::Cancelled => return Err(self.reject("seek")),
            PlaybackState::Running => self.anchor = Some(self.last_now),
            PlaybackState::Finished if t <= self.timeline.end_time() => {
                self.transition(PlaybackState::Paused)
            }
            PlaybackState::Finished => {
                self.offset = t;
                self.time = t;
                return Ok(self.report(0));
            }
            _ => (),
        }
        self.offset = t;
        let writes = self.frame(t, scene, true);
        Ok(self.report(writes))
    }

    /// Stop for good. Already written states stay as they are.
    pub fn cancel(&mut self) -> Result<(), PlaybackStateError> {
        match self.state {
            PlaybackState::Running | PlaybackState::Paused => {
                self.anchor = None;
                self.transition(PlaybackState::Cancelled);
                Ok(())
            }
            _ => Err(self.reject("cancel")),
        }
    }

    /// Per-frame hook. Writes nothing unless running.
    ///
    /// When the clock passes the end of the timeline, the last frame is
    /// written and playback finishes.
    pub fn update(&mut self, now: f64, scene: &mut impl HostScene) -> FrameReport {
        if self.state != PlaybackState::Running {
            return self.report(0);
        }
        let t = self.time_at(now);
        self.last_now = now;
        let writes = self.frame(t, scene, false);
        if t > self.timeline.end_time() {
            self.offset = t;
            self.anchor = None;
            self.transition(PlaybackState::Finished);
        }
        self.report(writes)
    }

    fn time_at(&self, now: f64) -> f64 {
        match self.anchor {
            Some(anchor) => self.offset + (now - anchor),
            None => self.offset,
        }
    }

    fn frame(&mut self, t: f64, scene: &mut impl HostScene, full: bool) -> usize {
        let timeline = self.timeline.clone();
        let segment = timeline.segment_index(t);
        if full {
            self.cache.clear();
        }
        let indexes: Vec<usize> = match !full && self.segment == Some(segment) {
            true => timeline.continuous_in(segment).to_vec(),
            false => (0..timeline.len()).collect(),
        };
        let mut writes = 0;
        for idx in indexes {
            for (handle, state) in timeline.bindings()[idx].object_states(t) {
                if self.cache.get(&handle) == Some(&state) {
                    continue;
                }
                scene.apply(handle, &state);
                self.cache.insert(handle, state);
                writes += 1;
            }
        }
        self.segment = Some(segment);
        self.time = t;
        writes
    }
}
