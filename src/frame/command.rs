// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

use super::{MasterToZoneMessage, MessageType, ZONE_COUNT, Zone};

/// System fan mode.
///
/// The continuous variants keep the fan running while the compressor idles.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanMode {
    #[default]
    Off,
    Low,
    Medium,
    High,
    /// Speed chosen by the system.
    Esp,
    LowContinuous,
    MediumContinuous,
    HighContinuous,
    EspContinuous,
}

impl FanMode {
    /// Get the [`u8`] value of the current [`FanMode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Esp => 4,
            Self::LowContinuous => 5,
            Self::MediumContinuous => 6,
            Self::HighContinuous => 7,
            Self::EspContinuous => 8,
        }
    }

    /// The speed portion: Off, Low, Medium, High or Esp.
    #[must_use]
    pub const fn speed(self) -> Self {
        match self {
            Self::LowContinuous => Self::Low,
            Self::MediumContinuous => Self::Medium,
            Self::HighContinuous => Self::High,
            Self::EspContinuous => Self::Esp,
            speed => speed,
        }
    }

    #[must_use]
    pub const fn is_continuous(self) -> bool {
        matches!(
            self,
            Self::LowContinuous
                | Self::MediumContinuous
                | Self::HighContinuous
                | Self::EspContinuous
        )
    }

    /// Combine the speed of this mode with a continuous flag.
    ///
    /// [`FanMode::Off`] has no continuous variant.
    #[must_use]
    pub const fn with_continuous(self, continuous: bool) -> Self {
        match (self.speed(), continuous) {
            (Self::Low, true) => Self::LowContinuous,
            (Self::Medium, true) => Self::MediumContinuous,
            (Self::High, true) => Self::HighContinuous,
            (Self::Esp, true) => Self::EspContinuous,
            (speed, _) => speed,
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self.speed() {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Esp => "ESP",
            _ => "Off",
        })?;
        if self.is_continuous() {
            f.write_str(" Continuous")?;
        }
        Ok(())
    }
}

/// System operating mode.
///
/// The `Off*` variants keep the mode to resume when turned on.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatingMode {
    #[default]
    Off,
    OffAuto,
    OffCool,
    OffHeat,
    FanOnly,
    Auto,
    Cool,
    Heat,
}

/// Mode entered when the system is turned on, by current mode.
const TURN_ON: [(OperatingMode, OperatingMode); 8] = [
    (OperatingMode::Off, OperatingMode::FanOnly),
    (OperatingMode::OffAuto, OperatingMode::Auto),
    (OperatingMode::OffCool, OperatingMode::Cool),
    (OperatingMode::OffHeat, OperatingMode::Heat),
    (OperatingMode::FanOnly, OperatingMode::FanOnly),
    (OperatingMode::Auto, OperatingMode::Auto),
    (OperatingMode::Cool, OperatingMode::Cool),
    (OperatingMode::Heat, OperatingMode::Heat),
];

/// Mode entered when the system is turned off, by current mode.
const TURN_OFF: [(OperatingMode, OperatingMode); 8] = [
    (OperatingMode::Off, OperatingMode::Off),
    (OperatingMode::OffAuto, OperatingMode::OffAuto),
    (OperatingMode::OffCool, OperatingMode::OffCool),
    (OperatingMode::OffHeat, OperatingMode::OffHeat),
    (OperatingMode::FanOnly, OperatingMode::Off),
    (OperatingMode::Auto, OperatingMode::OffAuto),
    (OperatingMode::Cool, OperatingMode::OffCool),
    (OperatingMode::Heat, OperatingMode::OffHeat),
];

fn lookup(table: &[(OperatingMode, OperatingMode); 8], mode: OperatingMode) -> OperatingMode {
    table
        .iter()
        .find(|(from, _)| *from == mode)
        .map_or(mode, |(_, to)| *to)
}

impl OperatingMode {
    /// Get the [`u8`] value of the current [`OperatingMode`].
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::Off => 0b0000_0000,
            Self::OffAuto => 0b0000_0100,
            Self::OffCool => 0b0000_0010,
            Self::OffHeat => 0b0000_0001,
            Self::FanOnly => 0b0001_0010,
            Self::Auto => 0b0000_1100,
            Self::Cool => 0b0000_1010,
            Self::Heat => 0b0000_1001,
        }
    }

    /// The system runs in this mode.
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::FanOnly | Self::Auto | Self::Cool | Self::Heat)
    }

    /// Mode after turning the system on.
    #[must_use]
    pub fn turned_on(self) -> Self {
        lookup(&TURN_ON, self)
    }

    /// Mode after turning the system off, remembering the mode to resume.
    #[must_use]
    pub fn turned_off(self) -> Self {
        lookup(&TURN_OFF, self)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "Off",
            Self::OffAuto => "Off-Auto",
            Self::OffCool => "Off-Cool",
            Self::OffHeat => "Off-Heat",
            Self::FanOnly => "Fan Only",
            Self::Auto => "Auto",
            Self::Cool => "Cool",
            Self::Heat => "Heat",
        })
    }
}

/// Set the master setpoint.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterSetpointCommand {
    /// In °C, `16..=30` in 0.5° steps.
    pub temperature: f32,
}

/// Set the system fan mode.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanModeCommand {
    pub fan_mode: FanMode,
}

/// Set the system operating mode.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatingModeCommand {
    pub mode: OperatingMode,
}

/// Turn zones on or off, index 0 is zone 1.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneStateCommand {
    pub zone_on: [bool; ZONE_COUNT],
}

impl ZoneStateCommand {
    #[must_use]
    pub const fn is_on(&self, zone: Zone) -> bool {
        self.zone_on[zone.index()]
    }

    pub fn set(&mut self, zone: Zone, on: bool) {
        self.zone_on[zone.index()] = on;
    }
}

/// Request another node running this protocol engine to change the
/// setpoint of a zone it controls.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneSetpointCustomCommand {
    pub zone: Zone,
    /// In °C, `16..=30` in 0.5° steps.
    pub temperature: f32,
    /// Shift the master setpoint if the zone range does not allow it.
    pub adjust_master: bool,
}

impl fmt::Display for MasterSetpointCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command: Master Setpoint: {:.1}", self.temperature)
    }
}

impl fmt::Display for FanModeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command: Fan Mode: {}", self.fan_mode)
    }
}

impl fmt::Display for OperatingModeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command: Operating Mode: {}", self.mode)
    }
}

impl fmt::Display for ZoneStateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Command: Zones:")?;
        for (i, on) in self.zone_on.iter().enumerate() {
            write!(f, " {}:{}", i + 1, if *on { "On" } else { "Off" })?;
        }
        Ok(())
    }
}

impl fmt::Display for ZoneSetpointCustomCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Command: Zone {}, Setpoint: {:.1}",
            self.zone, self.temperature
        )?;
        if self.adjust_master {
            f.write_str(", Adjust Master")?;
        }
        Ok(())
    }
}

/// An outgoing frame held by the command queue.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    OperatingMode(OperatingModeCommand),
    ZoneState(ZoneStateCommand),
    FanMode(FanModeCommand),
    MasterSetpoint(MasterSetpointCommand),
    ZoneSetpointCustom(ZoneSetpointCustomCommand),
    /// Impersonates the master towards a wall controller.
    MasterToZone(MasterToZoneMessage),
}

impl From<&Command> for MessageType {
    fn from(c: &Command) -> Self {
        match c {
            Command::OperatingMode(_) => Self::OperatingMode,
            Command::ZoneState(_) => Self::ZoneState,
            Command::FanMode(_) => Self::FanMode,
            Command::MasterSetpoint(_) => Self::MasterSetpoint,
            Command::ZoneSetpointCustom(_) => Self::CustomZoneSetpoint,
            Command::MasterToZone(_) => Self::ZoneMasterController,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatingMode(cmd) => fmt::Display::fmt(cmd, f),
            Self::ZoneState(cmd) => fmt::Display::fmt(cmd, f),
            Self::FanMode(cmd) => fmt::Display::fmt(cmd, f),
            Self::MasterSetpoint(cmd) => fmt::Display::fmt(cmd, f),
            Self::ZoneSetpointCustom(cmd) => fmt::Display::fmt(cmd, f),
            Self::MasterToZone(msg) => fmt::Display::fmt(msg, f),
        }
    }
}
