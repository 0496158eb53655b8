// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending outgoing commands.
//!
//! Every command kind owns a single slot, pushing a command replaces the
//! pending one of the same kind. Only one frame fits into a quiet window of
//! the bus so the slots are drained by a fixed priority:
//!
//! 1. [`OperatingModeCommand`]
//! 2. [`ZoneStateCommand`]
//! 3. [`FanModeCommand`]
//! 4. [`MasterSetpointCommand`]
//! 5. [`ZoneSetpointCustomCommand`]
//! 6. [`MasterToZoneMessage`] overrides, zone 1 to 8

use crate::frame::{
    Command, FanModeCommand, MasterSetpointCommand, MasterToZoneMessage, OperatingModeCommand,
    Zone, ZoneArray, ZoneSetpointCustomCommand, ZoneStateCommand,
};

#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    operating_mode: Option<OperatingModeCommand>,
    zone_state: Option<ZoneStateCommand>,
    fan_mode: Option<FanModeCommand>,
    master_setpoint: Option<MasterSetpointCommand>,
    zone_setpoint_custom: Option<ZoneSetpointCustomCommand>,
    master_to_zone: ZoneArray<Option<MasterToZoneMessage>>,
}

impl CommandQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a command as pending, replacing any pending command of its kind.
    pub fn push(&mut self, command: Command) {
        match command {
            Command::OperatingMode(cmd) => self.operating_mode = Some(cmd),
            Command::ZoneState(cmd) => self.zone_state = Some(cmd),
            Command::FanMode(cmd) => self.fan_mode = Some(cmd),
            Command::MasterSetpoint(cmd) => self.master_setpoint = Some(cmd),
            Command::ZoneSetpointCustom(cmd) => self.zone_setpoint_custom = Some(cmd),
            Command::MasterToZone(msg) => self.master_to_zone[msg.zone] = Some(msg),
        }
    }

    /// The command to transmit next.
    #[must_use]
    pub fn peek(&self) -> Option<Command> {
        self.operating_mode
            .map(Command::OperatingMode)
            .or_else(|| self.zone_state.map(Command::ZoneState))
            .or_else(|| self.fan_mode.map(Command::FanMode))
            .or_else(|| self.master_setpoint.map(Command::MasterSetpoint))
            .or_else(|| self.zone_setpoint_custom.map(Command::ZoneSetpointCustom))
            .or_else(|| {
                self.master_to_zone
                    .iter()
                    .find_map(|(_, msg)| msg.map(Command::MasterToZone))
            })
    }

    /// Remove and return the command to transmit next.
    pub fn pop(&mut self) -> Option<Command> {
        let next = self.peek()?;
        match next {
            Command::OperatingMode(_) => self.operating_mode = None,
            Command::ZoneState(_) => self.zone_state = None,
            Command::FanMode(_) => self.fan_mode = None,
            Command::MasterSetpoint(_) => self.master_setpoint = None,
            Command::ZoneSetpointCustom(_) => self.zone_setpoint_custom = None,
            Command::MasterToZone(msg) => self.master_to_zone[msg.zone] = None,
        }
        Some(next)
    }

    #[must_use]
    pub const fn operating_mode(&self) -> Option<&OperatingModeCommand> {
        self.operating_mode.as_ref()
    }

    #[must_use]
    pub const fn zone_state(&self) -> Option<&ZoneStateCommand> {
        self.zone_state.as_ref()
    }

    #[must_use]
    pub const fn fan_mode(&self) -> Option<&FanModeCommand> {
        self.fan_mode.as_ref()
    }

    #[must_use]
    pub const fn master_setpoint(&self) -> Option<&MasterSetpointCommand> {
        self.master_setpoint.as_ref()
    }

    #[must_use]
    pub const fn zone_setpoint_custom(&self) -> Option<&ZoneSetpointCustomCommand> {
        self.zone_setpoint_custom.as_ref()
    }

    #[must_use]
    pub fn master_to_zone(&self, zone: Zone) -> Option<&MasterToZoneMessage> {
        self.master_to_zone[zone].as_ref()
    }

    /// Drop the pending master override for `zone`.
    pub fn cancel_master_to_zone(&mut self, zone: Zone) {
        self.master_to_zone[zone] = None;
    }

    /// Number of pending commands.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.operating_mode.is_some())
            + usize::from(self.zone_state.is_some())
            + usize::from(self.fan_mode.is_some())
            + usize::from(self.master_setpoint.is_some())
            + usize::from(self.zone_setpoint_custom.is_some())
            + self.pending_overrides()
    }

    /// Number of pending master overrides.
    #[must_use]
    pub fn pending_overrides(&self) -> usize {
        self.master_to_zone
            .iter()
            .filter(|(_, msg)| msg.is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
