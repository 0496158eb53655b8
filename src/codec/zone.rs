// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Zone wall and zone master messages.

use super::*;

const ZONE_ON: u8 = 0b1000_0000;
const ZONE_OPEN: u8 = 0b0100_0000;
const CONFIG_FLAG: u8 = 0b0010_0000;
const INIT_FLAG: u8 = 0b0001_0000;
const INIT_PATTERN: u8 = 0b0001_0001;

const COMPRESSOR_MODE: u8 = 0b1000_0000;
const ADJUSTING: u8 = 0b0000_0010;
const DAMPER_MASK: u8 = 0b0001_1100;
const HIGH_BIT: u8 = 0b1000_0000;
const UNKNOWN_BIT2: u8 = 0b0010_0000;
const UNKNOWN_BIT: u8 = 0b0100_0000;
const SETPOINT_MASK: u8 = 0b0011_1111;

/// Check the verification byte of a zone wall or zone master frame.
///
/// Frames of any other type pass unchecked.
pub fn verify_checksum(bytes: &[u8]) -> Result<()> {
    let Some((&actual, prior)) = bytes.split_last() else {
        return Err(Error::BufferSize);
    };
    let expected = match MessageType::detect(bytes[0]) {
        MessageType::ZoneWallController
            if prior.len() > 2 && prior[2] & CONFIG_FLAG == CONFIG_FLAG =>
        {
            config_checksum(prior)?
        }
        MessageType::ZoneWallController | MessageType::ZoneMasterController => checksum(prior)?,
        _ => return Ok(()),
    };
    if expected != actual {
        return Err(Error::Checksum(expected, actual));
    }
    Ok(())
}

impl TryFrom<&[u8]> for ZoneToMasterMessage {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::ZoneWallController)?;
        let zone = Zone::new(bytes[0] & 0x0F)?;
        let setpoint = decode_half_degrees(bytes[1]);

        let flags = bytes[2];
        let mode = if flags & ZONE_ON == 0 {
            ZoneMode::Off
        } else if flags & ZONE_OPEN == 0 {
            ZoneMode::On
        } else {
            ZoneMode::Open
        };

        let (message_type, temperature, temperature_pre_adjustment) =
            if flags & CONFIG_FLAG == CONFIG_FLAG {
                // Calibration offset in 0.1° steps
                let offset = f32::from(bytes[3] as i8) / 10.0;
                (ZoneMessageType::Config, offset, offset)
            } else if flags & INIT_FLAG == INIT_FLAG {
                (ZoneMessageType::InitZone, 0.0, 0.0)
            } else {
                let raw = unpack_raw_temp(flags, bytes[3]);
                (
                    ZoneMessageType::Normal,
                    zone_temp_from_master(raw),
                    sensor_temperature(raw),
                )
            };

        Ok(Self {
            zone,
            setpoint,
            temperature,
            temperature_pre_adjustment,
            mode,
            message_type,
        })
    }
}

impl ZoneToMasterMessage {
    /// Encode the message into `buf`, returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::LEN {
            return Err(Error::BufferSize);
        }
        let mode = match self.mode {
            ZoneMode::Off => 0,
            ZoneMode::On => ZONE_ON,
            ZoneMode::Open => ZONE_ON | ZONE_OPEN,
        };
        buf[0] = 0xC0 | self.zone.number();
        buf[1] = encode_half_degrees(self.setpoint);
        match self.message_type {
            ZoneMessageType::Normal => {
                let (leading, low) = pack_raw_temp(zone_temp_to_master(self.temperature));
                buf[2] = mode | leading;
                buf[3] = low;
                buf[4] = checksum(&buf[..4])?;
            }
            ZoneMessageType::Config => {
                buf[2] = mode | CONFIG_FLAG;
                buf[3] = libm::roundf(self.temperature * 10.0) as i8 as u8;
                buf[4] = config_checksum(&buf[..4])?;
            }
            ZoneMessageType::InitZone => {
                buf[2] = mode | INIT_PATTERN;
                buf[3] = 0;
                buf[4] = checksum(&buf[..4])?;
            }
        }
        Ok(Self::LEN)
    }
}

impl TryFrom<&[u8]> for MasterToZoneMessage {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::ZoneMasterController)?;
        let zone = Zone::new(bytes[0] & 0x0F)?;

        // 9 bit temperature: bit 0 of byte 2 followed by byte 1
        let temperature_raw = u16::from(bytes[1]) | (u16::from(bytes[2] & 0b1) << 8);

        Ok(Self {
            zone,
            temperature: f32::from(temperature_raw) / 10.0,
            min_setpoint: decode_half_degrees(bytes[3] & SETPOINT_MASK),
            max_setpoint: decode_half_degrees(bytes[5] & SETPOINT_MASK),
            setpoint: decode_half_degrees(bytes[4] & SETPOINT_MASK),
            compressor_mode: bytes[2] & COMPRESSOR_MODE != 0,
            on: bytes[2] & ZONE_OPEN != 0,
            fan_only: bytes[4] & HIGH_BIT != 0,
            heating: bytes[3] & HIGH_BIT != 0,
            adjusting: bytes[2] & ADJUSTING != 0,
            compressor_active: bytes[5] & HIGH_BIT != 0,
            damper_position: (bytes[2] & DAMPER_MASK) >> 2,
            reserved: [
                bytes[2] & UNKNOWN_BIT2,
                bytes[3] & UNKNOWN_BIT,
                bytes[4] & UNKNOWN_BIT,
                bytes[5] & UNKNOWN_BIT,
            ],
        })
    }
}

const fn flag(set: bool, bit: u8) -> u8 {
    if set { bit } else { 0 }
}

impl MasterToZoneMessage {
    /// Encode the message into `buf`, returns the number of bytes written.
    ///
    /// Unknown bits are written back from [`Self::reserved`].
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < Self::LEN {
            return Err(Error::BufferSize);
        }
        let temperature_raw = (libm::roundf(self.temperature * 10.0) as u16).min(0x1FF);

        buf[0] = 0x80 | self.zone.number();
        buf[1] = temperature_raw as u8;
        buf[2] = flag(self.compressor_mode, COMPRESSOR_MODE)
            | flag(self.on, ZONE_OPEN)
            | (self.reserved[0] & UNKNOWN_BIT2)
            | ((self.damper_position << 2) & DAMPER_MASK)
            | flag(self.adjusting, ADJUSTING)
            | (temperature_raw >> 8) as u8 & 0b1;
        buf[3] = flag(self.heating, HIGH_BIT)
            | (self.reserved[1] & UNKNOWN_BIT)
            | (encode_half_degrees(self.min_setpoint) & SETPOINT_MASK);
        buf[4] = flag(self.fan_only, HIGH_BIT)
            | (self.reserved[2] & UNKNOWN_BIT)
            | (encode_half_degrees(self.setpoint) & SETPOINT_MASK);
        buf[5] = flag(self.compressor_active, HIGH_BIT)
            | (self.reserved[3] & UNKNOWN_BIT)
            | (encode_half_degrees(self.max_setpoint) & SETPOINT_MASK);
        buf[6] = checksum(&buf[..6])?;
        Ok(Self::LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(number: u8) -> Zone {
        Zone::new(number).unwrap()
    }

    #[test]
    fn encode_normal_wall_message() {
        let msg = ZoneToMasterMessage::normal(zone(3), ZoneMode::On, 22.0, 23.4);
        let buf = &mut [0; 5];
        assert_eq!(msg.encode(buf).unwrap(), 5);
        assert_eq!(
            buf,
            &[
                0xC3, // wall tag, zone 3
                0x2C, // setpoint 22.0
                0x82, // on, leading temperature bits
                0x10, // low temperature byte
                0x7E, // verification byte
            ]
        );
    }

    #[test]
    fn decode_normal_wall_message() {
        let msg = ZoneToMasterMessage::try_from(&[0xC3, 0x2C, 0x82, 0x10, 0x7E][..]).unwrap();
        assert_eq!(msg.zone, zone(3));
        assert_eq!(msg.setpoint, 22.0);
        assert_eq!(msg.temperature, 23.4);
        assert_eq!(msg.temperature_pre_adjustment, 23.4);
        assert_eq!(msg.mode, ZoneMode::On);
        assert_eq!(msg.message_type, ZoneMessageType::Normal);
    }

    #[test]
    fn decode_wall_modes() {
        let mut bytes = [0xC1, 0x2C, 0xC2, 0x10, 0x00];
        let msg = ZoneToMasterMessage::try_from(&bytes[..]).unwrap();
        assert_eq!(msg.mode, ZoneMode::Open);
        bytes[2] = 0x42;
        let msg = ZoneToMasterMessage::try_from(&bytes[..]).unwrap();
        assert_eq!(msg.mode, ZoneMode::Off);
    }

    #[test]
    fn wall_message_with_corrected_temperature() {
        let msg = ZoneToMasterMessage::normal(zone(1), ZoneMode::Off, 20.0, 35.7);
        let buf = &mut [0; 5];
        msg.encode(buf).unwrap();
        let decoded = ZoneToMasterMessage::try_from(&buf[..]).unwrap();
        assert_eq!(decoded.temperature, 35.7);
        assert_eq!(decoded.temperature_pre_adjustment, 35.0);
        assert_eq!(decoded.mode, ZoneMode::Off);
    }

    #[test]
    fn config_wall_message() {
        let msg = ZoneToMasterMessage::config(zone(3), ZoneMode::On, 22.0, -1.5);
        let buf = &mut [0; 5];
        msg.encode(buf).unwrap();
        assert_eq!(buf[2], 0xA0);
        assert_eq!(buf[3], (-15i8) as u8);
        assert_eq!(buf[4], config_checksum(&buf[..4]).unwrap());
        assert!(verify_checksum(buf).is_ok());

        let decoded = ZoneToMasterMessage::try_from(&buf[..]).unwrap();
        assert_eq!(decoded.message_type, ZoneMessageType::Config);
        assert_eq!(decoded.temperature, -1.5);
    }

    #[test]
    fn init_zone_wall_message() {
        let bytes = &[0xC3, 0x2C, 0x91, 0x00, 0x7F];
        let msg = ZoneToMasterMessage::try_from(&bytes[..]).unwrap();
        assert_eq!(msg.message_type, ZoneMessageType::InitZone);
        assert_eq!(msg.mode, ZoneMode::On);
        let buf = &mut [0; 5];
        msg.encode(buf).unwrap();
        assert_eq!(buf, bytes);
    }

    #[test]
    fn reject_wall_zone_out_of_range() {
        let bytes = &[0xC9, 0x2C, 0x82, 0x10, 0x00];
        assert_eq!(
            ZoneToMasterMessage::try_from(&bytes[..]).err().unwrap(),
            Error::ZoneOutOfRange(9)
        );
        let bytes = &[0xC0, 0x2C, 0x82, 0x10, 0x00];
        assert_eq!(
            ZoneToMasterMessage::try_from(&bytes[..]).err().unwrap(),
            Error::ZoneOutOfRange(0)
        );
    }

    #[test]
    fn master_message_round_trip() {
        let bytes = &[
            0x82, // master tag, zone 2
            0xD7, // temperature 21.5, low byte
            0xCC, // compressor mode, on, damper 3
            0x24, // cooling, min setpoint 18.0
            0x30, // setpoint 24.0
            0xB8, // compressor active, max setpoint 28.0
            0xCE, // verification byte
        ];
        let msg = MasterToZoneMessage::try_from(&bytes[..]).unwrap();
        assert_eq!(msg.zone, zone(2));
        assert_eq!(msg.temperature, 21.5);
        assert!(msg.on);
        assert!(msg.compressor_mode);
        assert!(!msg.heating);
        assert!(!msg.fan_only);
        assert!(msg.compressor_active);
        assert_eq!(msg.setpoint, 24.0);
        assert_eq!(msg.min_setpoint, 18.0);
        assert_eq!(msg.max_setpoint, 28.0);
        assert_eq!(msg.damper_position, 3);
        assert_eq!(msg.operation_mode(), ZoneOperationMode::Cooling);

        let buf = &mut [0; 7];
        assert_eq!(msg.encode(buf).unwrap(), 7);
        assert_eq!(buf, bytes);
        assert!(verify_checksum(bytes).is_ok());
    }

    #[test]
    fn master_message_keeps_unknown_bits() {
        let bytes = &[0x82, 0xD7, 0xEC, 0x64, 0x70, 0xF8, 0xEE];
        let msg = MasterToZoneMessage::try_from(&bytes[..]).unwrap();
        assert_eq!(msg.reserved, [0x20, 0x40, 0x40, 0x40]);
        let buf = &mut [0; 7];
        msg.encode(buf).unwrap();
        assert_eq!(buf, bytes);

        let cleared = MasterToZoneMessage {
            reserved: [0; 4],
            ..msg
        };
        cleared.encode(buf).unwrap();
        assert_eq!(&buf[..6], &[0x82, 0xD7, 0xCC, 0x24, 0x30, 0xB8]);
    }

    #[test]
    fn master_message_high_temperature_bit() {
        let msg = MasterToZoneMessage::try_from(&[0x81, 0x04, 0x01, 0x20, 0x28, 0x3C, 0x00][..])
            .unwrap();
        // 0x104 = 260
        assert_eq!(msg.temperature, 26.0);
        assert_eq!(msg.operation_mode(), ZoneOperationMode::SystemOff);
    }

    #[test]
    fn detect_checksum_mismatch() {
        let bytes = &[0xC3, 0x2C, 0x82, 0x10, 0x7F];
        assert_eq!(
            verify_checksum(bytes).err().unwrap(),
            Error::Checksum(0x7E, 0x7F)
        );
        assert!(verify_checksum(&[0x3A, 44]).is_ok());
        assert_eq!(verify_checksum(&[]).err().unwrap(), Error::BufferSize);
    }
}
