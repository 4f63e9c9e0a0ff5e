// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Frame pacing around the base platform's frame calls.
//!
//! `begin_frame` pushes the frame budget to the hint session and records the
//! start time; `pre_commit` reports how long the frame's CPU work took. With
//! no valid session both steps are skipped.

use crate::config::DEFAULT_FRAME_INTERVAL_NS;
use crate::hint::{HintSession, InvalidHintSession};

/// `CLOCK_MONOTONIC` in nanoseconds.
pub trait MonotonicClock {
    fn now_ns(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMonotonicClock;

impl MonotonicClock for SystemMonotonicClock {
    fn now_ns(&self) -> i64 {
        // SAFETY: plain C struct; all-zero is valid.
        let mut ts: libc::timespec = unsafe { std::mem::zeroed() };
        // SAFETY: `ts` is a valid out-pointer; CLOCK_MONOTONIC always exists.
        unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        ts.tv_sec as i64 * 1_000_000_000 + ts.tv_nsec as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Idle,
    InFlight { start_ns: i64 },
}

pub struct FramePacer {
    session: Box<dyn HintSession>,
    clock: Box<dyn MonotonicClock>,
    default_interval_ns: i64,
    state: FrameState,
}

impl FramePacer {
    pub fn new(clock: Box<dyn MonotonicClock>, default_interval_ns: i64) -> Self {
        Self {
            session: Box::new(InvalidHintSession),
            clock,
            default_interval_ns,
            state: FrameState::Idle,
        }
    }

    pub fn set_session(&mut self, session: Box<dyn HintSession>) {
        self.session = session;
        self.state = FrameState::Idle;
    }

    pub fn is_active(&self) -> bool {
        self.session.is_valid()
    }

    pub fn is_frame_in_flight(&self) -> bool {
        matches!(self.state, FrameState::InFlight { .. })
    }

    /// Start a frame. Returns the refresh interval to forward to the base
    /// platform: a non-positive interval is replaced by the default only while
    /// a session is active.
    pub fn begin_frame(&mut self, monotonic_clock_ns: i64, refresh_interval_ns: i64) -> i64 {
        if !self.session.is_valid() {
            return refresh_interval_ns;
        }

        let interval = if refresh_interval_ns <= 0 {
            self.default_interval_ns
        } else {
            refresh_interval_ns
        };
        self.state = FrameState::InFlight {
            start_ns: monotonic_clock_ns,
        };
        self.session.update_target_work_duration(interval);
        interval
    }

    /// Report the in-flight frame's duration. Returns what was reported.
    pub fn pre_commit(&mut self) -> Option<i64> {
        let FrameState::InFlight { start_ns } = std::mem::replace(&mut self.state, FrameState::Idle)
        else {
            return None;
        };
        if !self.session.is_valid() {
            return None;
        }

        let actual = self.clock.now_ns().saturating_sub(start_ns).max(0);
        self.session.report_actual_work_duration(actual);
        tracing::trace!(actual_ns = actual, "Reported frame work duration");
        Some(actual)
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(Box::new(SystemMonotonicClock), DEFAULT_FRAME_INTERVAL_NS)
    }
}

impl std::fmt::Debug for FramePacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramePacer")
            .field("active", &self.session.is_valid())
            .field("default_interval_ns", &self.default_interval_ns)
            .field("state", &self.state)
            .finish()
    }
}
