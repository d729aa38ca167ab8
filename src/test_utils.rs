//! Shared fixtures for exercising charts and sessions in tests.

use crate::config::STEP_MS;
use crate::core::input::{InputSource, Lane};
use crate::game::note::ChartNote;
use crate::game::session::{State, advance, queue_input_edge};
use rand::RngCore;
use std::cmp::Ordering;

/// RNG stub whose bits are all zero: every probability gate passes and every
/// uniform draw picks the low end, which pins chart generation to one exact
/// outcome.
pub struct ZeroRng;

impl RngCore for ZeroRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }
}

/// Fluent chart fixture builder.
#[derive(Default)]
pub struct ChartBuilder {
    notes: Vec<ChartNote>,
}

impl ChartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(mut self, lane: Lane, time_ms: f32) -> Self {
        self.notes.push(ChartNote::new(lane, time_ms));
        self
    }

    pub fn build(mut self) -> Vec<ChartNote> {
        self.notes.sort_by(|a, b| {
            a.time_ms
                .partial_cmp(&b.time_ms)
                .unwrap_or(Ordering::Equal)
        });
        self.notes
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ScriptEvent {
    pub time_ms: f64,
    pub lane: Lane,
    pub pressed: bool,
}

/// Timestamped press/release script for deterministic input replay.
#[derive(Default)]
pub struct InputScript {
    events: Vec<ScriptEvent>,
}

impl InputScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(mut self, lane: Lane, time_ms: f64) -> Self {
        self.events.push(ScriptEvent {
            time_ms,
            lane,
            pressed: true,
        });
        self
    }

    pub fn release(mut self, lane: Lane, time_ms: f64) -> Self {
        self.events.push(ScriptEvent {
            time_ms,
            lane,
            pressed: false,
        });
        self
    }

    /// Press followed by a release 40ms later.
    pub fn tap(self, lane: Lane, time_ms: f64) -> Self {
        self.press(lane, time_ms).release(lane, time_ms + 40.0)
    }

    /// Events in time order; same-time events keep insertion order.
    pub fn events(mut self) -> Vec<ScriptEvent> {
        self.events.sort_by(|a, b| {
            a.time_ms
                .partial_cmp(&b.time_ms)
                .unwrap_or(Ordering::Equal)
        });
        self.events
    }
}

/// Advance a session by `ms` of wall time, one logical frame at a time.
pub fn drive(state: &mut State, ms: f64) {
    let mut remaining = ms;
    while remaining > 0.0 {
        let dt = remaining.min(STEP_MS);
        advance(state, dt);
        remaining -= dt;
    }
}

/// Replay a script against a session for `total_ms`, queueing each event
/// into the frame it falls on.
pub fn run_script(state: &mut State, script: InputScript, total_ms: f64) {
    let events = script.events();
    let mut index = 0;
    let mut fed = 0.0;

    while fed < total_ms {
        while index < events.len() && events[index].time_ms <= state.elapsed_ms + STEP_MS {
            let event = events[index];
            queue_input_edge(state, InputSource::Keyboard, event.lane, event.pressed);
            index += 1;
        }
        advance(state, STEP_MS);
        fed += STEP_MS;
    }
}
