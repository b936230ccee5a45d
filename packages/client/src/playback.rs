//! Playback Driver
//!
//! The reconciliation engine is the only caller. [`ClockPlayer`] stands in
//! for a real media widget: it keeps a wall clock per loaded track and
//! reports the end of the track once.

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use groove_shared::time::{elapsed_seconds, now_millis};

/// Adapter over a playback engine
#[cfg_attr(test, mockall::automock)]
pub trait PlaybackDriver: Send {
    fn load(&mut self, media_id: &str);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn position(&self) -> f64;
    fn duration(&self) -> f64;
    fn is_playing(&self) -> bool;
    /// `true` exactly once after the loaded track reaches its end.
    fn take_ended(&mut self) -> bool;
}

/// Time source for [`ClockPlayer`]
pub trait Clock: Send {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Hand-advanced clock
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(start_millis: i64) -> Self {
        Self(Arc::new(AtomicI64::new(start_millis)))
    }

    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Simulated player: every track lasts `track_seconds`
pub struct ClockPlayer<C: Clock = SystemClock> {
    clock: C,
    track_seconds: f64,
    media_id: Option<String>,
    /// Position at `anchor_millis`
    position: f64,
    anchor_millis: i64,
    playing: bool,
    ended_reported: bool,
}

impl ClockPlayer<SystemClock> {
    pub fn new(track_seconds: f64) -> Self {
        Self::with_clock(SystemClock, track_seconds)
    }
}

impl<C: Clock> ClockPlayer<C> {
    pub fn with_clock(clock: C, track_seconds: f64) -> Self {
        let anchor_millis = clock.now_millis();
        Self {
            clock,
            track_seconds: track_seconds.max(0.0),
            media_id: None,
            position: 0.0,
            anchor_millis,
            playing: false,
            ended_reported: false,
        }
    }

    pub fn media_id(&self) -> Option<&str> {
        self.media_id.as_deref()
    }

    fn raw_position(&self) -> f64 {
        if self.playing {
            self.position + elapsed_seconds(self.anchor_millis, self.clock.now_millis())
        } else {
            self.position
        }
    }

    fn rebase(&mut self, position: f64) {
        self.position = position.clamp(0.0, self.track_seconds);
        self.anchor_millis = self.clock.now_millis();
    }
}

impl<C: Clock> PlaybackDriver for ClockPlayer<C> {
    fn load(&mut self, media_id: &str) {
        tracing::debug!("Loading '{}'", media_id);
        self.media_id = Some(media_id.to_string());
        self.playing = false;
        self.ended_reported = false;
        self.rebase(0.0);
    }

    fn play(&mut self) {
        if self.media_id.is_none() || self.playing {
            return;
        }
        let position = self.raw_position();
        self.rebase(position);
        self.playing = true;
    }

    fn pause(&mut self) {
        if !self.playing {
            return;
        }
        let position = self.position();
        self.rebase(position);
        self.playing = false;
    }

    fn seek(&mut self, seconds: f64) {
        self.rebase(seconds);
        if self.position < self.track_seconds {
            self.ended_reported = false;
        }
    }

    fn position(&self) -> f64 {
        self.raw_position().min(self.track_seconds)
    }

    fn duration(&self) -> f64 {
        self.track_seconds
    }

    fn is_playing(&self) -> bool {
        self.playing && self.raw_position() < self.track_seconds
    }

    fn take_ended(&mut self) -> bool {
        if self.media_id.is_none() || self.ended_reported {
            return false;
        }
        if self.raw_position() >= self.track_seconds {
            self.ended_reported = true;
            self.playing = false;
            self.rebase(self.track_seconds);
            return true;
        }
        false
    }
}
