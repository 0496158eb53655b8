// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::{
    fmt,
    ops::{Index, IndexMut},
};

use crate::error::Error;

/// Number of zones a system supports.
pub const ZONE_COUNT: usize = 8;

/// A zone number in `1..=8`.
///
/// Per zone storage is indexed with [`Zone::index`], which is the only
/// place the zone number is turned into an array offset.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Zone(u8);

impl Zone {
    /// Create a new [`Zone`] from its number.
    pub const fn new(number: u8) -> Result<Self, Error> {
        if number >= 1 && number as usize <= ZONE_COUNT {
            Ok(Self(number))
        } else {
            Err(Error::ZoneOutOfRange(number))
        }
    }

    /// Zone from an array offset in `0..8`.
    pub const fn from_index(index: usize) -> Result<Self, Error> {
        if index < ZONE_COUNT {
            Ok(Self(index as u8 + 1))
        } else {
            Err(Error::ZoneOutOfRange(index as u8))
        }
    }

    /// The zone number as used on the bus.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Offset into per zone arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Bit of this zone in a zone bitmap.
    #[must_use]
    pub const fn mask(self) -> u8 {
        1 << self.index()
    }

    /// All zones in ascending order.
    pub fn all() -> impl Iterator<Item = Zone> {
        (1..=ZONE_COUNT as u8).map(Zone)
    }
}

impl TryFrom<u8> for Zone {
    type Error = Error;

    fn try_from(number: u8) -> Result<Self, Error> {
        Self::new(number)
    }
}

impl From<Zone> for u8 {
    fn from(zone: Zone) -> u8 {
        zone.0
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One value per zone, indexed by [`Zone`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneArray<T>([T; ZONE_COUNT]);

impl<T: Copy> ZoneArray<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self([value; ZONE_COUNT])
    }
}

impl<T> ZoneArray<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Zone, &T)> {
        Zone::all().zip(self.0.iter())
    }
}

impl<T: Default + Copy> Default for ZoneArray<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Index<Zone> for ZoneArray<T> {
    type Output = T;

    fn index(&self, zone: Zone) -> &T {
        &self.0[zone.index()]
    }
}

impl<T> IndexMut<Zone> for ZoneArray<T> {
    fn index_mut(&mut self, zone: Zone) -> &mut T {
        &mut self.0[zone.index()]
    }
}

/// Mode a wall controller reports for its zone.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneMode {
    #[default]
    Off,
    On,
    /// Damper forced open.
    Open,
}

impl fmt::Display for ZoneMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "Off",
            Self::On => "On",
            Self::Open => "Open",
        })
    }
}

/// Sub-type of a wall controller message.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneMessageType {
    /// Regular status with the zone temperature.
    #[default]
    Normal,
    /// Carries the temperature calibration offset.
    Config,
    /// Sent by the master to (re)initialise a zone.
    InitZone,
}

/// Wall controller to master status, 5 bytes.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneToMasterMessage {
    pub zone: Zone,
    /// Setpoint in °C, `16..=30` in 0.5° steps.
    pub setpoint: f32,
    /// Zone temperature in °C as the master interprets it.
    ///
    /// Holds the calibration offset (`-3.2..=3.0`) for config messages.
    pub temperature: f32,
    /// Linear sensor reading before the master's thermistor correction.
    pub temperature_pre_adjustment: f32,
    pub mode: ZoneMode,
    pub message_type: ZoneMessageType,
}

impl ZoneToMasterMessage {
    /// Frame length in bytes.
    pub const LEN: usize = 5;

    /// A regular status message.
    #[must_use]
    pub const fn normal(zone: Zone, mode: ZoneMode, setpoint: f32, temperature: f32) -> Self {
        Self {
            zone,
            setpoint,
            temperature,
            temperature_pre_adjustment: temperature,
            mode,
            message_type: ZoneMessageType::Normal,
        }
    }

    /// A config message with the given calibration offset.
    #[must_use]
    pub const fn config(zone: Zone, mode: ZoneMode, setpoint: f32, offset: f32) -> Self {
        Self {
            zone,
            setpoint,
            temperature: offset,
            temperature_pre_adjustment: offset,
            mode,
            message_type: ZoneMessageType::Config,
        }
    }
}

impl fmt::Display for ZoneToMasterMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Zone Wall: {}", self.zone)?;
        match self.message_type {
            ZoneMessageType::Normal => write!(
                f,
                ", Setpoint: {:.1}, Temp: {:.1} (Pre: {:.1}), Mode: {}",
                self.setpoint, self.temperature, self.temperature_pre_adjustment, self.mode
            ),
            ZoneMessageType::Config => write!(
                f,
                ", Config, Setpoint: {:.1}, Temp Offset: {:.1}, Mode: {}",
                self.setpoint, self.temperature, self.mode
            ),
            ZoneMessageType::InitZone => write!(f, ", Init Zone, Mode: {}", self.mode),
        }
    }
}

/// Zone state as classified from a [`MasterToZoneMessage`].
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneOperationMode {
    SystemOff,
    ZoneOff,
    FanOnly,
    Standby,
    Cooling,
    Heating,
}

impl fmt::Display for ZoneOperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SystemOff => "System Off",
            Self::ZoneOff => "Zone Off",
            Self::FanOnly => "Fan Only",
            Self::Standby => "Standby",
            Self::Cooling => "Cooling",
            Self::Heating => "Heating",
        })
    }
}

/// Master to wall controller state, 7 bytes.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterToZoneMessage {
    pub zone: Zone,
    /// Zone temperature in °C as known to the master, 0.1° steps.
    pub temperature: f32,
    /// Lowest setpoint the master currently allows.
    pub min_setpoint: f32,
    /// Highest setpoint the master currently allows.
    pub max_setpoint: f32,
    pub setpoint: f32,
    /// System runs the compressor (heating or cooling).
    pub compressor_mode: bool,
    pub on: bool,
    pub fan_only: bool,
    pub heating: bool,
    /// Set briefly while a zone turns off or all zones balance.
    pub adjusting: bool,
    /// Zone is actively serviced by the compressor.
    pub compressor_active: bool,
    /// Damper position `0..=5`, closed to open.
    pub damper_position: u8,
    /// Bits with unknown meaning, kept as received: byte 2 to 5.
    pub reserved: [u8; 4],
}

impl MasterToZoneMessage {
    /// Frame length in bytes.
    pub const LEN: usize = 7;

    /// Highest damper position.
    pub const DAMPER_OPEN: u8 = 5;

    /// Damper position in percent, positions above open count as open.
    #[must_use]
    pub const fn damper_percent(&self) -> u8 {
        let position = if self.damper_position > Self::DAMPER_OPEN {
            Self::DAMPER_OPEN
        } else {
            self.damper_position
        };
        position * (100 / Self::DAMPER_OPEN)
    }

    /// Classify the zone's current operation.
    #[must_use]
    pub const fn operation_mode(&self) -> ZoneOperationMode {
        if !self.compressor_mode && !self.fan_only {
            ZoneOperationMode::SystemOff
        } else if !self.on {
            ZoneOperationMode::ZoneOff
        } else if self.fan_only {
            ZoneOperationMode::FanOnly
        } else if !self.compressor_active {
            ZoneOperationMode::Standby
        } else if self.heating {
            ZoneOperationMode::Heating
        } else {
            ZoneOperationMode::Cooling
        }
    }
}

impl fmt::Display for MasterToZoneMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Zone Master: {}, {}, Setpoint: {:.1} ({:.1}-{:.1}), Temp: {:.1}, Damper: {}%",
            self.zone,
            self.operation_mode(),
            self.setpoint,
            self.min_setpoint,
            self.max_setpoint,
            self.temperature,
            self.damper_percent(),
        )?;
        if self.adjusting {
            f.write_str(", Adjusting")?;
        }
        Ok(())
    }
}
