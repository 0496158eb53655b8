// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Controller configuration.
//!
//! Loading it is up to the host, with the `serde` feature it can be
//! deserialized from any format.

use crate::print::PrintOutMode;

/// Bus timing, all values in milliseconds.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Silence that ends a frame.
    pub frame_gap: u64,
    /// Frames starting this soon after our own transmission are our echo.
    pub echo_window: u64,
    /// The bus counts as alive while the last frame is younger than this.
    pub freshness: u64,
    /// Silence after which a command may be sent.
    pub quiet_min: u64,
    /// Silence after which the bus is no longer considered to be in a sequence gap.
    pub quiet_max: u64,
    /// Minimum spacing of transmit attempts in a quiet window.
    pub transmit_spacing: u64,
    /// Broadcasts do not overwrite state this long after we transmitted.
    pub debounce: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            frame_gap: 5,
            echo_window: 50,
            freshness: 3000,
            quiet_min: 500,
            quiet_max: 1000,
            transmit_spacing: 900,
            debounce: 3000,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub timing: Timing,
    pub print_out_mode: PrintOutMode,
    /// Also queue a master override towards the wall controller when the
    /// setpoint of a zone is changed that is not controlled by this node.
    pub impersonate_master: bool,
}
