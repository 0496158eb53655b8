// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use heapless::Vec;

use crate::frame::{
    INDOOR_BOARD1_MAX_LEN, MasterToZoneMessage, MessageType, StateMessage, StateMessage2, Zone,
    ZoneArray, ZoneToMasterMessage,
};

/// The raw bytes of the latest frame of every kind.
#[derive(Debug, Clone)]
pub(super) struct History {
    wall: ZoneArray<[u8; ZoneToMasterMessage::LEN]>,
    master: ZoneArray<[u8; MasterToZoneMessage::LEN]>,
    board1: Vec<u8, INDOOR_BOARD1_MAX_LEN>,
    board2: [u8; StateMessage2::LEN],
    stat1: [u8; StateMessage::LEN],
    stat2: [u8; 19],
    stat3: [u8; 32],
}

fn replace(slot: &mut [u8], bytes: &[u8]) -> bool {
    if *slot == *bytes || slot.len() != bytes.len() {
        return false;
    }
    slot.copy_from_slice(bytes);
    true
}

impl History {
    pub(super) fn new() -> Self {
        Self {
            wall: ZoneArray::new([0; ZoneToMasterMessage::LEN]),
            master: ZoneArray::new([0; MasterToZoneMessage::LEN]),
            board1: Vec::new(),
            board2: [0; StateMessage2::LEN],
            stat1: [0; StateMessage::LEN],
            stat2: [0; 19],
            stat3: [0; 32],
        }
    }

    /// Remember a decoded frame, returns `true` if it differs from the
    /// previous frame of its kind.
    ///
    /// Commands are not remembered and always count as changed.
    pub(super) fn update(&mut self, bytes: &[u8]) -> bool {
        let Some(&tag) = bytes.first() else {
            return false;
        };

        use MessageType as t;

        match MessageType::detect(tag) {
            t::ZoneWallController => match Zone::new(tag & 0x0F) {
                Ok(zone) => replace(&mut self.wall[zone], bytes),
                Err(_) => false,
            },
            t::ZoneMasterController => match Zone::new(tag & 0x0F) {
                Ok(zone) => replace(&mut self.master[zone], bytes),
                Err(_) => false,
            },
            t::IndoorBoard1 => {
                if self.board1.as_slice() == bytes {
                    return false;
                }
                self.board1.clear();
                // Longer frames are rejected by the decoder
                let _ = self.board1.extend_from_slice(bytes);
                true
            }
            t::IndoorBoard2 => replace(&mut self.board2, bytes),
            t::Stat1 => replace(&mut self.stat1, bytes),
            t::Stat2 => replace(&mut self.stat2, bytes),
            t::Stat3 => replace(&mut self.stat3, bytes),
            t::MasterSetpoint
            | t::FanMode
            | t::OperatingMode
            | t::ZoneState
            | t::CustomZoneSetpoint => true,
            t::Unknown => false,
        }
    }
}
