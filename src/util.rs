// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common helpers

use crate::error::Error;

/// Lowest setpoint a zone or the master accepts in °C.
pub const MIN_SETPOINT: f32 = 16.0;

/// Highest setpoint a zone or the master accepts in °C.
pub const MAX_SETPOINT: f32 = 30.0;

/// Offset between the raw sensor value and its 10 bit wire representation.
const RAW_TEMP_OFFSET: i16 = 512;

/// Calculate the verification byte of a zone message.
///
/// `bytes` are all bytes that precede the verification byte. The byte at
/// index 2 is folded in as `b2 - (b2 << 1)`, every other byte is subtracted
/// once, followed by a final `- 1`. All arithmetic wraps at 8 bits.
pub fn checksum(bytes: &[u8]) -> Result<u8, Error> {
    if bytes.len() < 3 {
        return Err(Error::BufferSize);
    }
    let b2 = bytes[2];
    let sum = bytes
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 2)
        .fold(b2.wrapping_sub(b2 << 1), |acc, (_, b)| acc.wrapping_sub(*b));
    Ok(sum.wrapping_sub(1))
}

/// Verification byte of a wall controller config message.
///
/// Config messages skip the zone tag nibble and use the plain byte 2.
pub fn config_checksum(bytes: &[u8]) -> Result<u8, Error> {
    if bytes.len() < 4 {
        return Err(Error::BufferSize);
    }
    Ok(bytes[2]
        .wrapping_sub(bytes[3])
        .wrapping_sub(bytes[1])
        .wrapping_sub(bytes[0] & 0x0F)
        .wrapping_sub(1))
}

fn round10(value: f64) -> f32 {
    libm::round(value * 10.0) as f32 / 10.0
}

/// Convert a raw sensor value into °C the way the master interprets it.
///
/// The master corrects for thermistor characteristics outside of
/// `-58..=81` (`30.8`°C down to `16.9`°C).
pub fn zone_temp_from_master(raw: i16) -> f32 {
    let r = f64::from(raw);
    if raw < -58 {
        round10(0.000_071_24 * r * r - 0.1052 * r + 24.5)
    } else if raw > 81 {
        round10(-0.000_014_57 * r * r - 0.0988 * r + 24.923)
    } else {
        sensor_temperature(raw)
    }
}

/// Convert °C into the raw sensor value the master expects.
pub fn zone_temp_to_master(temperature: f32) -> i16 {
    // Decide the branch in tenths so values produced by the linear branch
    // of `zone_temp_from_master` map back onto it.
    let tenths = libm::round(f64::from(temperature) * 10.0);
    let t = f64::from(temperature);
    let raw = if tenths > 308.0 {
        libm::round(-118.478 * (libm::sqrt(14.3372 + t) - 6.231_95))
    } else if tenths < 169.0 {
        libm::round(261.981 * (libm::sqrt(192.415 - t) - 12.9419))
    } else {
        250.0 - tenths
    };
    raw as i16
}

/// Linear reading of a raw sensor value, before the master's correction.
pub fn sensor_temperature(raw: i16) -> f32 {
    f32::from(250 - raw) / 10.0
}

/// Pack a raw sensor value into its 10 bit wire representation.
///
/// Returns the two leading bits and the low byte.
pub const fn pack_raw_temp(raw: i16) -> (u8, u8) {
    let value = if raw < 0 {
        raw + RAW_TEMP_OFFSET
    } else {
        raw - RAW_TEMP_OFFSET
    };
    (((value >> 8) & 0b11) as u8, value as u8)
}

/// Unpack the 10 bit wire representation into a raw sensor value.
pub const fn unpack_raw_temp(leading: u8, low: u8) -> i16 {
    let leading = leading & 0b11;
    let negative = leading & 0b10 != 0;
    let high = if negative { 0b1111_1100 | leading } else { leading };
    let value = i16::from_be_bytes([high, low]);
    if negative {
        value + RAW_TEMP_OFFSET
    } else {
        value - RAW_TEMP_OFFSET
    }
}

/// Encode a temperature in 0.5°C steps.
pub fn encode_half_degrees(temperature: f32) -> u8 {
    libm::roundf(temperature * 2.0) as u8
}

/// Decode a temperature in 0.5°C steps.
pub fn decode_half_degrees(raw: u8) -> f32 {
    f32::from(raw) / 2.0
}

/// Clamp a setpoint into the range accepted by the bus.
pub fn clamp_setpoint(temperature: f32) -> f32 {
    temperature.clamp(MIN_SETPOINT, MAX_SETPOINT)
}

/// Turn eight flags into a bitmap, index 0 is the least significant bit.
pub fn pack_flags(flags: &[bool; 8]) -> u8 {
    flags
        .iter()
        .enumerate()
        .fold(0, |acc, (i, on)| if *on { acc | (1 << i) } else { acc })
}

/// Unpack a bitmap into eight flags, index 0 is the least significant bit.
pub fn unpack_flags(bits: u8) -> [bool; 8] {
    let mut flags = [false; 8];
    for (i, flag) in flags.iter_mut().enumerate() {
        *flag = bits & (1 << i) != 0;
    }
    flags
}
