// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System status broadcasts.

use super::*;
use byteorder::{BigEndian, ByteOrder};

const CONTINUOUS_FAN: u8 = 0b1000_0000;
const ESP_FAN: u8 = 0b0000_0010;
const FAN_IDLE: u8 = 0b0000_0001;
const FAN_SPEED_MASK: u8 = 0b0011_1100;
const OPERATING_MODE_MASK: u8 = 0b0001_1111;
const COMPRESSOR_MASK: u8 = 0b0110_0000;

fn running_fan_mode(fan: u8) -> FanMode {
    match (fan & FAN_SPEED_MASK) >> 2 {
        0b1000 => FanMode::Low,
        0b0100 => FanMode::Medium,
        0b0010 => FanMode::High,
        _ => FanMode::Off,
    }
}

fn compressor_mode(mode: u8) -> CompressorMode {
    match (mode & COMPRESSOR_MASK) >> 5 {
        0 => CompressorMode::Idle,
        1 => CompressorMode::Heating,
        2 => CompressorMode::Cooling,
        _ => CompressorMode::Unknown,
    }
}

/// Decode the fields both broadcasts share.
fn decode_status(
    mode: u8,
    fan: u8,
    zones: u8,
    setpoint: u8,
    temperature: &[u8],
) -> Result<SystemStatus> {
    let running_fan_mode = running_fan_mode(fan);
    let fan_mode = if fan & ESP_FAN == ESP_FAN {
        FanMode::Esp
    } else {
        running_fan_mode
    };
    Ok(SystemStatus {
        zone_on: unpack_flags(zones),
        temperature: f32::from(BigEndian::read_u16(temperature)) / 10.0,
        setpoint: decode_half_degrees(setpoint),
        operating_mode: OperatingMode::try_from(mode & OPERATING_MODE_MASK)?,
        compressor_mode: compressor_mode(mode),
        fan_mode,
        running_fan_mode,
        continuous_fan: fan & CONTINUOUS_FAN == CONTINUOUS_FAN,
        fan_active: fan & FAN_IDLE == 0,
    })
}

impl TryFrom<&[u8]> for StateMessage {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::Stat1)?;
        let status = decode_status(bytes[13], bytes[15], bytes[11], bytes[14], &bytes[16..18])?;
        let mut zone_setpoint = [0.0; ZONE_COUNT];
        for (setpoint, raw) in zone_setpoint.iter_mut().zip(&bytes[3..3 + ZONE_COUNT]) {
            *setpoint = decode_half_degrees(*raw);
        }
        Ok(Self {
            status,
            zone_setpoint,
        })
    }
}

impl TryFrom<&[u8]> for StateMessage2 {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        check_frame(bytes, MessageType::IndoorBoard2)?;
        let status = decode_status(bytes[3], bytes[5], bytes[6], bytes[4], &bytes[9..11])?;
        Ok(Self { status })
    }
}
