// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parse and generate bus messages.

use crate::{error::*, frame::*, util::*};
use core::convert::TryFrom;

mod state;
mod zone;

pub use self::zone::verify_checksum;

type Result<T> = core::result::Result<T, Error>;

fn check_frame(bytes: &[u8], message_type: MessageType) -> Result<()> {
    let Some(&tag) = bytes.first() else {
        return Err(Error::BufferSize);
    };
    if MessageType::detect(tag) != message_type {
        return Err(Error::UnknownMessage(tag));
    }
    if let Some(expected) = message_type.frame_len() {
        if bytes.len() != expected {
            return Err(Error::LengthMismatch(expected, bytes.len()));
        }
    }
    Ok(())
}

impl TryFrom<u8> for FanMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        use FanMode::*;

        let mode = match value {
            0 => Off,
            1 => Low,
            2 => Medium,
            3 => High,
            4 => Esp,
            5 => LowContinuous,
            6 => MediumContinuous,
            7 => HighContinuous,
            8 => EspContinuous,
            _ => return Err(Error::FanMode(value)),
        };
        Ok(mode)
    }
}

impl TryFrom<u8> for OperatingMode {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        use OperatingMode::*;

        let mode = match value {
            0b0000_0000 => Off,
            0b0000_0100 => OffAuto,
            0b0000_0010 => OffCool,
            0b0000_0001 => OffHeat,
            0b0001_0010 => FanOnly,
            0b0000_1100 => Auto,
            0b0000_1010 => Cool,
            0b0000_1001 => Heat,
            _ => return Err(Error::OperatingMode(value)),
        };
        Ok(mode)
    }
}

impl TryFrom<&[u8]> for MasterSetpointCommand {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::MasterSetpoint)?;
        Ok(Self {
            temperature: decode_half_degrees(bytes[1]),
        })
    }
}

impl TryFrom<&[u8]> for FanModeCommand {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::FanMode)?;
        Ok(Self {
            fan_mode: FanMode::try_from(bytes[1])?,
        })
    }
}

impl TryFrom<&[u8]> for OperatingModeCommand {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::OperatingMode)?;
        Ok(Self {
            mode: OperatingMode::try_from(bytes[1])?,
        })
    }
}

impl TryFrom<&[u8]> for ZoneStateCommand {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::ZoneState)?;
        Ok(Self {
            zone_on: unpack_flags(bytes[1]),
        })
    }
}

const ADJUST_MASTER_FLAG: u8 = 0b1000_0000;

impl TryFrom<&[u8]> for ZoneSetpointCustomCommand {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::CustomZoneSetpoint)?;
        Ok(Self {
            zone: Zone::new(bytes[1] & 0x0F)?,
            adjust_master: bytes[1] & ADJUST_MASTER_FLAG != 0,
            temperature: decode_half_degrees(bytes[2]),
        })
    }
}

impl Command {
    /// Number of bytes required for the serialized frame.
    #[must_use]
    pub const fn frame_len(&self) -> usize {
        match self {
            Self::OperatingMode(_)
            | Self::ZoneState(_)
            | Self::FanMode(_)
            | Self::MasterSetpoint(_) => 2,
            Self::ZoneSetpointCustom(_) => 3,
            Self::MasterToZone(_) => MasterToZoneMessage::LEN,
        }
    }

    /// Encode the command into `buf`, returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        let len = self.frame_len();
        if buf.len() < len {
            return Err(Error::BufferSize);
        }
        match self {
            Self::OperatingMode(cmd) => {
                buf[0] = 0x3C;
                buf[1] = cmd.mode.value();
            }
            Self::ZoneState(cmd) => {
                buf[0] = 0x3D;
                buf[1] = pack_flags(&cmd.zone_on);
            }
            Self::FanMode(cmd) => {
                buf[0] = 0x3B;
                buf[1] = cmd.fan_mode.value();
            }
            Self::MasterSetpoint(cmd) => {
                buf[0] = 0x3A;
                buf[1] = encode_half_degrees(cmd.temperature);
            }
            Self::ZoneSetpointCustom(cmd) => {
                buf[0] = 0x3F;
                buf[1] = cmd.zone.number() | if cmd.adjust_master { ADJUST_MASTER_FLAG } else { 0 };
                buf[2] = encode_half_degrees(cmd.temperature);
            }
            Self::MasterToZone(msg) => {
                return msg.encode(buf);
            }
        }
        Ok(len)
    }
}

/// Decode a complete frame.
///
/// Unknown tags and frames with an unexpected length are rejected, the
/// verification byte is not checked (see [`verify_checksum`]).
pub fn decode_message(bytes: &[u8]) -> Result<Message> {
    let Some(&tag) = bytes.first() else {
        return Err(Error::BufferSize);
    };

    use MessageType as t;

    let msg = match MessageType::detect(tag) {
        t::Unknown => return Err(Error::UnknownMessage(tag)),
        t::MasterSetpoint => Message::MasterSetpoint(MasterSetpointCommand::try_from(bytes)?),
        t::FanMode => Message::FanMode(FanModeCommand::try_from(bytes)?),
        t::OperatingMode => Message::OperatingMode(OperatingModeCommand::try_from(bytes)?),
        t::ZoneState => Message::ZoneState(ZoneStateCommand::try_from(bytes)?),
        t::CustomZoneSetpoint => {
            Message::CustomZoneSetpoint(ZoneSetpointCustomCommand::try_from(bytes)?)
        }
        t::ZoneWallController => Message::ZoneWall(ZoneToMasterMessage::try_from(bytes)?),
        t::ZoneMasterController => Message::ZoneMaster(MasterToZoneMessage::try_from(bytes)?),
        t::IndoorBoard2 => Message::IndoorBoard2(StateMessage2::try_from(bytes)?),
        t::Stat1 => Message::Stat1(StateMessage::try_from(bytes)?),
        t::IndoorBoard1 => {
            if bytes.len() > INDOOR_BOARD1_MAX_LEN {
                return Err(Error::LengthMismatch(INDOOR_BOARD1_MAX_LEN, bytes.len()));
            }
            Message::IndoorBoard1
        }
        t::Stat2 => {
            check_frame(bytes, t::Stat2)?;
            Message::Stat2
        }
        t::Stat3 => {
            check_frame(bytes, t::Stat3)?;
            Message::Stat3
        }
    };
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_mode_from_u8() {
        assert_eq!(FanMode::try_from(4).unwrap(), FanMode::Esp);
        assert_eq!(FanMode::try_from(8).unwrap(), FanMode::EspContinuous);
        assert_eq!(FanMode::try_from(9).err().unwrap(), Error::FanMode(9));
        for value in 0..=8 {
            assert_eq!(FanMode::try_from(value).unwrap().value(), value);
        }
    }

    #[test]
    fn operating_mode_from_u8() {
        assert_eq!(OperatingMode::try_from(0b1010).unwrap(), OperatingMode::Cool);
        assert_eq!(
            OperatingMode::try_from(0b1_0010).unwrap(),
            OperatingMode::FanOnly
        );
        assert_eq!(
            OperatingMode::try_from(0b1_1111).err().unwrap(),
            Error::OperatingMode(0b1_1111)
        );
    }

    #[test]
    fn encode_commands() {
        let buf = &mut [0; 8];

        let cmd = Command::OperatingMode(OperatingModeCommand {
            mode: OperatingMode::OffAuto,
        });
        assert_eq!(cmd.encode(buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[0x3C, 0b0000_0100]);

        let cmd = Command::FanMode(FanModeCommand {
            fan_mode: FanMode::HighContinuous,
        });
        assert_eq!(cmd.encode(buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[0x3B, 7]);

        let cmd = Command::MasterSetpoint(MasterSetpointCommand { temperature: 22.5 });
        assert_eq!(cmd.encode(buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[0x3A, 45]);

        let mut zones = ZoneStateCommand::default();
        zones.set(Zone::new(1).unwrap(), true);
        zones.set(Zone::new(3).unwrap(), true);
        assert_eq!(Command::ZoneState(zones).encode(buf).unwrap(), 2);
        assert_eq!(&buf[..2], &[0x3D, 0b0000_0101]);

        let cmd = Command::ZoneSetpointCustom(ZoneSetpointCustomCommand {
            zone: Zone::new(5).unwrap(),
            temperature: 19.5,
            adjust_master: true,
        });
        assert_eq!(cmd.encode(buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[0x3F, 0x85, 39]);
    }

    #[test]
    fn encode_command_into_small_buffer() {
        let cmd = Command::MasterSetpoint(MasterSetpointCommand { temperature: 22.5 });
        assert_eq!(cmd.encode(&mut [0; 1]).err().unwrap(), Error::BufferSize);
    }

    #[test]
    fn decode_commands() {
        let msg = decode_message(&[0x3A, 44]).unwrap();
        assert_eq!(
            msg,
            Message::MasterSetpoint(MasterSetpointCommand { temperature: 22.0 })
        );

        let msg = decode_message(&[0x3C, 0b1001]).unwrap();
        assert_eq!(
            msg,
            Message::OperatingMode(OperatingModeCommand {
                mode: OperatingMode::Heat
            })
        );

        let Message::ZoneState(cmd) = decode_message(&[0x3D, 0b1000_0010]).unwrap() else {
            panic!("not a zone state command");
        };
        assert!(cmd.is_on(Zone::new(2).unwrap()));
        assert!(cmd.is_on(Zone::new(8).unwrap()));
        assert!(!cmd.is_on(Zone::new(1).unwrap()));

        let msg = decode_message(&[0x3F, 0x03, 43]).unwrap();
        assert_eq!(
            msg,
            Message::CustomZoneSetpoint(ZoneSetpointCustomCommand {
                zone: Zone::new(3).unwrap(),
                temperature: 21.5,
                adjust_master: false,
            })
        );
    }

    #[test]
    fn decode_invalid_frames() {
        assert_eq!(decode_message(&[]).err().unwrap(), Error::BufferSize);
        assert_eq!(
            decode_message(&[0x55, 0x01]).err().unwrap(),
            Error::UnknownMessage(0x55)
        );
        assert_eq!(
            decode_message(&[0x3A, 44, 0]).err().unwrap(),
            Error::LengthMismatch(2, 3)
        );
        assert_eq!(
            decode_message(&[0x3B, 12]).err().unwrap(),
            Error::FanMode(12)
        );
        assert_eq!(
            decode_message(&[0x3F, 0x09, 43]).err().unwrap(),
            Error::ZoneOutOfRange(9)
        );
        assert_eq!(
            decode_message(&[0xC3, 0x2C, 0x82]).err().unwrap(),
            Error::LengthMismatch(5, 3)
        );
    }

    #[test]
    fn decode_undecoded_broadcasts() {
        let mut stat3 = [0; 32];
        stat3[0] = 0xE0;
        assert_eq!(decode_message(&stat3).unwrap(), Message::Stat3);
        assert_eq!(
            decode_message(&stat3[..20]).err().unwrap(),
            Error::LengthMismatch(32, 20)
        );

        let mut stat2 = [0; 19];
        stat2[0] = 0xFE;
        assert_eq!(decode_message(&stat2).unwrap(), Message::Stat2);

        let mut board = [0; 51];
        board[0] = 0x01;
        assert_eq!(decode_message(&board[..12]).unwrap(), Message::IndoorBoard1);
        assert_eq!(
            decode_message(&board).err().unwrap(),
            Error::LengthMismatch(50, 51)
        );
    }
}
