// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bus timing.
//!
//! The master and the wall controllers repeat a fixed sequence of frames
//! that ends with a [`Stat3`](crate::MessageType::Stat3) broadcast. The
//! gap after it is the only moment a command can be sent without colliding
//! with other traffic. When the final frame is missed the gap is detected by
//! silence instead.
//!
//! All times are monotonic milliseconds supplied by the caller.

use crate::config::Timing;

#[derive(Debug, Clone)]
pub struct Scheduler {
    timing: Timing,
    last_frame_at: Option<u64>,
    last_byte_at: Option<u64>,
    last_command_sent_at: Option<u64>,
    last_data_sent_at: Option<u64>,
    last_transmit_at: Option<u64>,
    last_attempt_at: Option<u64>,
}

impl Scheduler {
    #[must_use]
    pub const fn new(timing: Timing) -> Self {
        Self {
            timing,
            last_frame_at: None,
            last_byte_at: None,
            last_command_sent_at: None,
            last_data_sent_at: None,
            last_transmit_at: None,
            last_attempt_at: None,
        }
    }

    #[must_use]
    pub const fn timing(&self) -> &Timing {
        &self.timing
    }

    /// A peer frame ended at `at`.
    pub fn frame_received(&mut self, at: u64) {
        self.last_frame_at = Some(at);
    }

    /// A byte arrived at `at`, the frame it belongs to may still be open.
    pub fn byte_received(&mut self, at: u64) {
        self.last_byte_at = Some(at);
    }

    #[must_use]
    pub const fn last_frame_at(&self) -> Option<u64> {
        self.last_frame_at
    }

    /// A frame was received within the freshness timeout.
    #[must_use]
    pub fn receiving_data(&self, now: u64) -> bool {
        self.last_frame_at
            .is_some_and(|at| now.saturating_sub(at) < self.timing.freshness)
    }

    /// A queued command was transmitted at `at`.
    pub fn command_sent(&mut self, at: u64) {
        self.last_command_sent_at = Some(at);
        self.transmitted(at);
    }

    /// A zone reply carrying a local change was transmitted at `at`.
    pub fn data_sent(&mut self, at: u64) {
        self.last_data_sent_at = Some(at);
        self.transmitted(at);
    }

    /// Any frame was transmitted at `at`.
    pub fn transmitted(&mut self, at: u64) {
        self.last_transmit_at = Some(at);
    }

    /// The frame starting at `started_at` is the echo of our own transmission.
    #[must_use]
    pub fn is_echo(&self, started_at: u64) -> bool {
        self.last_transmit_at.is_some_and(|sent| {
            started_at >= sent && started_at - sent < self.timing.echo_window
        })
    }

    /// Broadcasts must not overwrite local state yet.
    #[must_use]
    pub fn is_debouncing(&self, now: u64) -> bool {
        let last_sent = match (self.last_command_sent_at, self.last_data_sent_at) {
            (Some(a), Some(b)) => a.max(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => return false,
        };
        now.saturating_sub(last_sent) < self.timing.debounce
    }

    /// The final frame of a sequence was received, the bus is free.
    ///
    /// Counts as a transmit attempt for the spacing of quiet windows.
    pub fn sequence_end(&mut self, now: u64) {
        #[cfg(feature = "log")]
        log::trace!("End of sequence at {now} ms");
        self.last_attempt_at = Some(now);
    }

    /// Detect the gap after a sequence from silence.
    ///
    /// Returns `true` at most once per transmit spacing while the bus has
    /// been silent for `quiet_min..=quiet_max`. Silence is measured from the
    /// last byte, including bytes of a frame still in progress.
    pub fn quiet_window(&mut self, now: u64) -> bool {
        let Some(last_activity) = self.last_frame_at.max(self.last_byte_at) else {
            return false;
        };
        let silence = now.saturating_sub(last_activity);
        if silence < self.timing.quiet_min || silence > self.timing.quiet_max {
            return false;
        }
        if self
            .last_attempt_at
            .is_some_and(|at| now.saturating_sub(at) < self.timing.transmit_spacing)
        {
            return false;
        }
        #[cfg(feature = "log")]
        log::trace!("Quiet window after {silence} ms of silence");
        self.last_attempt_at = Some(now);
        true
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Timing::default())
    }
}
