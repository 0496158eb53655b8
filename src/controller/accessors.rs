// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read access to the reported state.

use embedded_hal::digital::OutputPin;

use super::Controller;
use crate::{
    bus::{Bus, Transport},
    config::Config,
    frame::{
        CompressorMode, FanMode, MasterToZoneMessage, OperatingMode, StateMessage, StateMessage2,
        SystemStatus, Zone, ZoneMessageType, ZoneMode, ZoneOperationMode, ZoneToMasterMessage,
    },
    print::PrintSink,
    queue::CommandQueue,
};

impl<T, P, S> Controller<T, P, S>
where
    T: Transport,
    P: OutputPin,
    S: PrintSink,
{
    /// The latest system status, preferring the richer broadcast.
    #[must_use]
    pub fn status(&self) -> Option<&SystemStatus> {
        self.state
            .as_ref()
            .map(|msg| &msg.status)
            .or_else(|| self.state2.as_ref().map(|msg| &msg.status))
    }

    #[must_use]
    pub fn operating_mode(&self) -> OperatingMode {
        self.status()
            .map(|status| status.operating_mode)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn system_on(&self) -> bool {
        self.operating_mode().is_on()
    }

    /// Fan speed including the continuous flag.
    #[must_use]
    pub fn fan_mode(&self) -> FanMode {
        self.status().map_or(FanMode::Off, |status| {
            status.fan_mode.with_continuous(status.continuous_fan)
        })
    }

    #[must_use]
    pub fn fan_speed(&self) -> FanMode {
        self.status().map_or(FanMode::Off, |status| status.fan_mode)
    }

    #[must_use]
    pub fn continuous_fan_mode(&self) -> bool {
        self.status().is_some_and(|status| status.continuous_fan)
    }

    #[must_use]
    pub fn master_setpoint(&self) -> Option<f32> {
        self.status().map(|status| status.setpoint)
    }

    /// Temperature the master controls to.
    #[must_use]
    pub fn master_temperature(&self) -> Option<f32> {
        self.status().map(|status| status.temperature)
    }

    #[must_use]
    pub fn compressor_mode(&self) -> CompressorMode {
        self.status()
            .map(|status| status.compressor_mode)
            .unwrap_or_default()
    }

    /// Neither heating nor cooling.
    #[must_use]
    pub fn is_system_idle(&self) -> bool {
        !matches!(
            self.compressor_mode(),
            CompressorMode::Cooling | CompressorMode::Heating
        )
    }

    #[must_use]
    pub fn is_fan_idle(&self) -> bool {
        !self.status().is_some_and(|status| status.fan_active)
    }

    /// Zone on/off. Controlled zones report the requested mode.
    #[must_use]
    pub fn zone_on(&self, zone: Zone) -> bool {
        let control = &self.zones[zone];
        if control.controlled {
            return control.requested_mode.unwrap_or(control.mode) != ZoneMode::Off;
        }
        match (self.status(), &self.zone_master[zone]) {
            (Some(status), _) => status.is_zone_on(zone),
            (None, Some(msg)) => msg.on,
            (None, None) => false,
        }
    }

    /// Zone setpoint. Controlled zones report the setpoint they send, the
    /// requested one limited to the range the master allows.
    #[must_use]
    pub fn zone_setpoint_temperature(&self, zone: Zone) -> Option<f32> {
        let control = &self.zones[zone];
        if let (true, Some(setpoint)) = (control.controlled, control.setpoint) {
            return Some(match &self.zone_master[zone] {
                Some(msg) => setpoint.min(msg.max_setpoint).max(msg.min_setpoint),
                None => setpoint,
            });
        }
        self.state
            .as_ref()
            .map(|state| state.zone_setpoint(zone))
            .or_else(|| self.zone_master[zone].map(|msg| msg.setpoint))
            .or(control.setpoint)
    }

    /// Zone temperature, as sensed locally for controlled zones.
    #[must_use]
    pub fn zone_current_temperature(&self, zone: Zone) -> Option<f32> {
        let control = &self.zones[zone];
        let master = self.zone_master[zone].map(|msg| msg.temperature);
        if control.controlled {
            return control.temperature.or(master);
        }
        master.or_else(|| {
            self.zone_wall[zone]
                .filter(|msg| msg.message_type == ZoneMessageType::Normal)
                .map(|msg| msg.temperature)
        })
    }

    /// Damper opening in percent.
    #[must_use]
    pub fn zone_damper_position(&self, zone: Zone) -> Option<u8> {
        self.zone_master[zone].map(|msg| msg.damper_percent())
    }

    #[must_use]
    pub fn zone_operation_mode(&self, zone: Zone) -> Option<ZoneOperationMode> {
        self.zone_master[zone].map(|msg| msg.operation_mode())
    }

    /// This node answers the master for `zone`.
    #[must_use]
    pub fn control_zone(&self, zone: Zone) -> bool {
        self.zones[zone].controlled
    }

    /// A frame was received recently.
    #[must_use]
    pub fn receiving_data(&self) -> bool {
        self.scheduler.receiving_data(self.now)
    }

    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub const fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    #[must_use]
    pub const fn state_message(&self) -> Option<&StateMessage> {
        self.state.as_ref()
    }

    #[must_use]
    pub const fn state_message2(&self) -> Option<&StateMessage2> {
        self.state2.as_ref()
    }

    /// Latest message of the wall controller of `zone`, or our own reply.
    #[must_use]
    pub fn zone_wall_message(&self, zone: Zone) -> Option<&ZoneToMasterMessage> {
        self.zone_wall[zone].as_ref()
    }

    #[must_use]
    pub fn zone_master_message(&self, zone: Zone) -> Option<&MasterToZoneMessage> {
        self.zone_master[zone].as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn bus(&self) -> &Bus<T, P> {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut Bus<T, P> {
        &mut self.bus
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{controller, state_frame};
    use super::*;

    fn zone(number: u8) -> Zone {
        Zone::new(number).unwrap()
    }

    #[test]
    fn defaults_without_traffic() {
        let controller = controller();
        assert!(controller.status().is_none());
        assert_eq!(controller.operating_mode(), OperatingMode::Off);
        assert!(!controller.system_on());
        assert_eq!(controller.fan_mode(), FanMode::Off);
        assert_eq!(controller.master_setpoint(), None);
        assert!(controller.is_system_idle());
        assert!(controller.is_fan_idle());
        assert!(!controller.zone_on(zone(1)));
        assert_eq!(controller.zone_setpoint_temperature(zone(1)), None);
        assert_eq!(controller.zone_current_temperature(zone(1)), None);
        assert!(!controller.receiving_data());
    }

    #[test]
    fn status_from_state_broadcast() {
        let mut controller = controller();
        let mut bytes = state_frame(0b0100_1010); // cooling, cool
        bytes[6] = 46;
        bytes[15] = 0b1000_1000; // continuous high, active
        controller.process_frame(&bytes, 1000);

        assert!(controller.system_on());
        assert_eq!(controller.compressor_mode(), CompressorMode::Cooling);
        assert!(!controller.is_system_idle());
        assert_eq!(controller.fan_mode(), FanMode::HighContinuous);
        assert_eq!(controller.fan_speed(), FanMode::High);
        assert!(controller.continuous_fan_mode());
        assert!(!controller.is_fan_idle());
        assert!(controller.zone_on(zone(1)));
        assert!(controller.zone_on(zone(2)));
        assert!(!controller.zone_on(zone(3)));
        assert_eq!(controller.zone_setpoint_temperature(zone(4)), Some(23.0));
    }

    #[test]
    fn state_broadcast_is_preferred() {
        let mut controller = controller();
        #[rustfmt::skip]
        let board: [u8; 18] = [
            0x02, 0x00, 0x00,
            0b0000_1001, // idle, heat
            0x28,        // setpoint 20.0
            0b0000_1000, // high, active
            0b0000_0100, // zone 3 on
            0x00, 0x00,
            0x00, 0xD2,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        controller.process_frame(&board, 1000);
        assert_eq!(controller.operating_mode(), OperatingMode::Heat);
        assert_eq!(controller.master_setpoint(), Some(20.0));
        assert!(controller.zone_on(zone(3)));

        controller.process_frame(&state_frame(OperatingMode::Cool.value()), 1100);
        assert_eq!(controller.operating_mode(), OperatingMode::Cool);
        assert_eq!(controller.master_setpoint(), Some(22.0));
        assert!(controller.state_message2().is_some());
    }

    #[test]
    fn zone_values_from_wall_controller() {
        let mut controller = controller();
        controller.process_frame(&[0xC3, 0x2C, 0x82, 0x10, 0x7E], 1000);
        assert_eq!(controller.zone_current_temperature(zone(3)), Some(23.4));
        assert_eq!(controller.zone_setpoint_temperature(zone(3)), None);
        assert!(controller.zone_master_message(zone(3)).is_none());
        assert_eq!(controller.zone_operation_mode(zone(3)), None);
    }
}
