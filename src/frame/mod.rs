// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

mod command;
mod state;
mod zone;

pub use self::{command::*, state::*, zone::*};

/// Maximum length of an indoor board message.
pub const INDOOR_BOARD1_MAX_LEN: usize = 50;

/// The type of a bus message, inferred from its first byte.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Command: `0x3A`.
    MasterSetpoint,

    /// Command: `0x3B`.
    FanMode,

    /// Command: `0x3C`.
    OperatingMode,

    /// Command: `0x3D`.
    ZoneState,

    /// Command: `0x3F`, only understood by nodes running this crate.
    CustomZoneSetpoint,

    /// Wall controller to master: `0xC{zone}`.
    ZoneWallController,

    /// Master to wall controller: `0x8{zone}`.
    ZoneMasterController,

    /// Indoor board message of varying length: `0x01`.
    IndoorBoard1,

    /// Infrequent indoor board status, see [`StateMessage2`]: `0x02`.
    IndoorBoard2,

    /// System status, see [`StateMessage`]: `0xA0`.
    Stat1,

    /// `0xFE`.
    Stat2,

    /// Final message of a bus sequence: `0xE0`.
    Stat3,

    /// Anything else.
    Unknown,
}

/// Maps the first byte of a frame onto a [`MessageType`].
///
/// A byte matches if `byte & mask == value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRule {
    pub mask: u8,
    pub value: u8,
    pub message_type: MessageType,
}

const fn exact(value: u8, message_type: MessageType) -> TypeRule {
    TypeRule {
        mask: 0xFF,
        value,
        message_type,
    }
}

const fn nibble(value: u8, message_type: MessageType) -> TypeRule {
    TypeRule {
        mask: 0xF0,
        value,
        message_type,
    }
}

/// Detection rules, evaluated in order. The first match wins.
pub const TYPE_RULES: [TypeRule; 12] = [
    exact(0x3A, MessageType::MasterSetpoint),
    exact(0x3B, MessageType::FanMode),
    exact(0x3C, MessageType::OperatingMode),
    exact(0x3D, MessageType::ZoneState),
    exact(0x3F, MessageType::CustomZoneSetpoint),
    exact(0x01, MessageType::IndoorBoard1),
    exact(0x02, MessageType::IndoorBoard2),
    exact(0xA0, MessageType::Stat1),
    exact(0xFE, MessageType::Stat2),
    exact(0xE0, MessageType::Stat3),
    nibble(0xC0, MessageType::ZoneWallController),
    nibble(0x80, MessageType::ZoneMasterController),
];

impl MessageType {
    /// Detect the message type from the first byte of a frame.
    #[must_use]
    pub fn detect(first_byte: u8) -> Self {
        TYPE_RULES
            .iter()
            .find(|rule| first_byte & rule.mask == rule.value)
            .map_or(Self::Unknown, |rule| rule.message_type)
    }

    /// Fixed length of the message in bytes.
    ///
    /// `None` if the length varies or is not known.
    #[must_use]
    pub const fn frame_len(self) -> Option<usize> {
        match self {
            Self::MasterSetpoint | Self::FanMode | Self::OperatingMode | Self::ZoneState => {
                Some(2)
            }
            Self::CustomZoneSetpoint => Some(3),
            Self::ZoneWallController => Some(5),
            Self::ZoneMasterController => Some(7),
            Self::IndoorBoard2 => Some(18),
            Self::Stat2 => Some(19),
            Self::Stat1 => Some(23),
            Self::Stat3 => Some(32),
            Self::IndoorBoard1 | Self::Unknown => None,
        }
    }

    /// Commands are short, unchecked frames any node may send.
    #[must_use]
    pub const fn is_command(self) -> bool {
        matches!(
            self,
            Self::MasterSetpoint
                | Self::FanMode
                | Self::OperatingMode
                | Self::ZoneState
                | Self::CustomZoneSetpoint
        )
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MasterSetpoint => "Master Setpoint Command",
            Self::FanMode => "Fan Mode Command",
            Self::OperatingMode => "Operating Mode Command",
            Self::ZoneState => "Zone State Command",
            Self::CustomZoneSetpoint => "Zone Setpoint Custom Command",
            Self::ZoneWallController => "Zone Wall",
            Self::ZoneMasterController => "Zone Master",
            Self::IndoorBoard1 => "Indoor Board 1",
            Self::IndoorBoard2 => "Indoor Board 2",
            Self::Stat1 => "Stat 1",
            Self::Stat2 => "Stat 2",
            Self::Stat3 => "Stat 3",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A decoded bus message.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Message {
    MasterSetpoint(MasterSetpointCommand),
    FanMode(FanModeCommand),
    OperatingMode(OperatingModeCommand),
    ZoneState(ZoneStateCommand),
    CustomZoneSetpoint(ZoneSetpointCustomCommand),
    ZoneWall(ZoneToMasterMessage),
    ZoneMaster(MasterToZoneMessage),
    /// Carries a [`StateMessage2`].
    IndoorBoard2(StateMessage2),
    /// Carries a [`StateMessage`].
    Stat1(StateMessage),
    /// Payload not decoded.
    IndoorBoard1,
    /// Payload not decoded.
    Stat2,
    /// Payload not decoded.
    Stat3,
}

impl From<&Message> for MessageType {
    fn from(m: &Message) -> Self {
        use Message as M;

        match m {
            M::MasterSetpoint(_) => Self::MasterSetpoint,
            M::FanMode(_) => Self::FanMode,
            M::OperatingMode(_) => Self::OperatingMode,
            M::ZoneState(_) => Self::ZoneState,
            M::CustomZoneSetpoint(_) => Self::CustomZoneSetpoint,
            M::ZoneWall(_) => Self::ZoneWallController,
            M::ZoneMaster(_) => Self::ZoneMasterController,
            M::IndoorBoard1 => Self::IndoorBoard1,
            M::IndoorBoard2(_) => Self::IndoorBoard2,
            M::Stat1(_) => Self::Stat1,
            M::Stat2 => Self::Stat2,
            M::Stat3 => Self::Stat3,
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Message as M;

        match self {
            M::MasterSetpoint(cmd) => fmt::Display::fmt(cmd, f),
            M::FanMode(cmd) => fmt::Display::fmt(cmd, f),
            M::OperatingMode(cmd) => fmt::Display::fmt(cmd, f),
            M::ZoneState(cmd) => fmt::Display::fmt(cmd, f),
            M::CustomZoneSetpoint(cmd) => fmt::Display::fmt(cmd, f),
            M::ZoneWall(msg) => fmt::Display::fmt(msg, f),
            M::ZoneMaster(msg) => fmt::Display::fmt(msg, f),
            M::IndoorBoard2(msg) => fmt::Display::fmt(msg, f),
            M::Stat1(msg) => fmt::Display::fmt(msg, f),
            M::IndoorBoard1 | M::Stat2 | M::Stat3 => {
                fmt::Display::fmt(&MessageType::from(self), f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_exact_tags() {
        assert_eq!(MessageType::detect(0x3A), MessageType::MasterSetpoint);
        assert_eq!(MessageType::detect(0x3B), MessageType::FanMode);
        assert_eq!(MessageType::detect(0x3C), MessageType::OperatingMode);
        assert_eq!(MessageType::detect(0x3D), MessageType::ZoneState);
        assert_eq!(MessageType::detect(0x3F), MessageType::CustomZoneSetpoint);
        assert_eq!(MessageType::detect(0x01), MessageType::IndoorBoard1);
        assert_eq!(MessageType::detect(0x02), MessageType::IndoorBoard2);
        assert_eq!(MessageType::detect(0xA0), MessageType::Stat1);
        assert_eq!(MessageType::detect(0xFE), MessageType::Stat2);
        assert_eq!(MessageType::detect(0xE0), MessageType::Stat3);
    }

    #[test]
    fn detect_zone_tags() {
        for zone in 0..=0x0F {
            assert_eq!(
                MessageType::detect(0xC0 | zone),
                MessageType::ZoneWallController
            );
            assert_eq!(
                MessageType::detect(0x80 | zone),
                MessageType::ZoneMasterController
            );
        }
    }

    #[test]
    fn detect_unknown_tags() {
        assert_eq!(MessageType::detect(0x00), MessageType::Unknown);
        assert_eq!(MessageType::detect(0x3E), MessageType::Unknown);
        assert_eq!(MessageType::detect(0xA1), MessageType::Unknown);
        assert_eq!(MessageType::detect(0xFF), MessageType::Unknown);
        assert_eq!(MessageType::detect(0x40), MessageType::Unknown);
    }

    #[test]
    fn exact_rules_do_not_overlap_nibble_rules() {
        for rule in TYPE_RULES.iter().filter(|r| r.mask == 0xFF) {
            let shadowed = TYPE_RULES
                .iter()
                .filter(|r| r.mask != 0xFF)
                .any(|r| rule.value & r.mask == r.value);
            assert!(!shadowed, "0x{:02X} matches a nibble rule", rule.value);
        }
    }

    #[test]
    fn fixed_frame_lengths() {
        assert_eq!(MessageType::MasterSetpoint.frame_len(), Some(2));
        assert_eq!(MessageType::CustomZoneSetpoint.frame_len(), Some(3));
        assert_eq!(MessageType::ZoneWallController.frame_len(), Some(5));
        assert_eq!(MessageType::ZoneMasterController.frame_len(), Some(7));
        assert_eq!(MessageType::Stat1.frame_len(), Some(23));
        assert_eq!(MessageType::Stat3.frame_len(), Some(32));
        assert_eq!(MessageType::IndoorBoard1.frame_len(), None);
        assert_eq!(MessageType::Unknown.frame_len(), None);
        assert!(MessageType::ZoneState.is_command());
        assert!(!MessageType::Stat3.is_command());
    }
}
