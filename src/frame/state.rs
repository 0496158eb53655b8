// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

use super::{FanMode, OperatingMode, ZONE_COUNT, Zone};

/// Whether the compressor is running and in which direction.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressorMode {
    #[default]
    Unknown,
    Idle,
    Cooling,
    Heating,
}

impl fmt::Display for CompressorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unknown => "Unknown",
            Self::Idle => "Idle",
            Self::Cooling => "Cooling",
            Self::Heating => "Heating",
        })
    }
}

/// System wide state carried by both state broadcasts.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemStatus {
    /// Zone on/off, index 0 is zone 1.
    pub zone_on: [bool; ZONE_COUNT],
    /// Average temperature of the active zones in °C.
    pub temperature: f32,
    /// Master setpoint in °C, it also limits the zone setpoints.
    pub setpoint: f32,
    pub operating_mode: OperatingMode,
    pub compressor_mode: CompressorMode,
    /// Fan mode without the continuous flag.
    pub fan_mode: FanMode,
    /// Speed the fan actually runs at, differs from [`Self::fan_mode`] in ESP mode.
    pub running_fan_mode: FanMode,
    pub continuous_fan: bool,
    pub fan_active: bool,
}

impl SystemStatus {
    /// Mode the system resumes when it is turned on.
    #[must_use]
    pub fn last_operating_mode(&self) -> OperatingMode {
        self.operating_mode.turned_on()
    }

    #[must_use]
    pub const fn is_zone_on(&self, zone: Zone) -> bool {
        self.zone_on[zone.index()]
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Operating Mode: {} - {}, Fan Mode: {}",
            self.operating_mode, self.compressor_mode, self.fan_mode
        )?;
        if self.fan_mode == FanMode::Esp {
            write!(f, "-{}", self.running_fan_mode)?;
        }
        if self.continuous_fan {
            f.write_str(" Continuous")?;
        }
        write!(
            f,
            " - {}, Setpoint: {:.1}, Temperature: {:.1}, Zones:",
            if self.fan_active { "Active" } else { "Idle" },
            self.setpoint,
            self.temperature
        )?;
        for (i, on) in self.zone_on.iter().enumerate() {
            write!(f, " {}:{}", i + 1, if *on { "On" } else { "Off" })?;
        }
        Ok(())
    }
}

/// The richer system status broadcast, 23 bytes.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateMessage {
    pub status: SystemStatus,
    /// Setpoint per zone in °C, index 0 is zone 1.
    pub zone_setpoint: [f32; ZONE_COUNT],
}

impl StateMessage {
    /// Frame length in bytes.
    pub const LEN: usize = 23;

    #[must_use]
    pub const fn zone_setpoint(&self, zone: Zone) -> f32 {
        self.zone_setpoint[zone.index()]
    }
}

impl fmt::Display for StateMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State: {}, Zone Setpoints:", self.status)?;
        for (i, setpoint) in self.zone_setpoint.iter().enumerate() {
            write!(f, " {}:{:.1}", i + 1, setpoint)?;
        }
        Ok(())
    }
}

/// Status broadcast sent by most indoor boards, 18 bytes.
///
/// Authoritative only if no [`StateMessage`] is seen on the bus.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateMessage2 {
    pub status: SystemStatus,
}

impl StateMessage2 {
    /// Frame length in bytes.
    pub const LEN: usize = 18;
}

impl fmt::Display for StateMessage2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "State 2: {}", self.status)
    }
}
