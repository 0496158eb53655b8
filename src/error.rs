// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;

/// actron485-core Error
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Invalid buffer size
    BufferSize,
    /// Length Mismatch
    LengthMismatch(usize, usize),
    /// Unknown message type tag
    UnknownMessage(u8),
    /// Invalid verification byte
    Checksum(u8, u8),
    /// Zone number outside of `1..=8`
    ZoneOutOfRange(u8),
    /// Frame exceeds the receive buffer
    FrameTooLong(usize),
    /// Invalid operating mode
    OperatingMode(u8),
    /// Invalid fan mode
    FanMode(u8),
    /// The underlying byte transport failed
    Transport,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;

        match self {
            BufferSize => write!(f, "Invalid buffer size"),
            LengthMismatch(expected, actual) => write!(
                f,
                "Length Mismatch: expected = {expected}, actual = {actual}"
            ),
            UnknownMessage(tag) => write!(f, "Unknown message type: 0x{tag:0>2X}"),
            Checksum(expected, actual) => write!(
                f,
                "Invalid verification byte: expected = 0x{expected:0>2X}, actual = 0x{actual:0>2X}"
            ),
            ZoneOutOfRange(zone) => write!(f, "Zone out of range: {zone}"),
            FrameTooLong(len) => write!(f, "Frame too long: more than {len} bytes"),
            OperatingMode(raw) => write!(f, "Invalid operating mode: 0b{raw:0>8b}"),
            FanMode(raw) => write!(f, "Invalid fan mode: {raw}"),
            Transport => write!(f, "Transport error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
