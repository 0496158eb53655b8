// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write intents.
//!
//! Intents queue commands for the next quiet window, the reported state
//! only changes once the master broadcasts it. Without recent bus traffic
//! the current state is unknown and intents are dropped.

use embedded_hal::digital::OutputPin;

use super::Controller;
use crate::{
    bus::Transport,
    frame::{
        Command, FanMode, FanModeCommand, MasterSetpointCommand, MasterToZoneMessage,
        OperatingMode, OperatingModeCommand, SystemStatus, Zone, ZoneMode,
        ZoneSetpointCustomCommand, ZoneStateCommand,
    },
    print::PrintSink,
    util::clamp_setpoint,
};

impl<T, P, S> Controller<T, P, S>
where
    T: Transport,
    P: OutputPin,
    S: PrintSink,
{
    fn has_context(&self) -> bool {
        let fresh = self.receiving_data();
        if !fresh {
            #[cfg(feature = "log")]
            log::debug!("Ignoring request without recent bus traffic");
        }
        fresh
    }

    /// The reported system status, needed for intents that change part of it.
    fn base_status(&self) -> Option<SystemStatus> {
        let status = self.status().copied();
        if status.is_none() {
            #[cfg(feature = "log")]
            log::debug!("Ignoring request before the first status broadcast");
        }
        status
    }

    pub fn set_operating_mode(&mut self, mode: OperatingMode) {
        if !self.has_context() {
            return;
        }
        self.queue
            .push(Command::OperatingMode(OperatingModeCommand { mode }));
    }

    /// Turn the system on or off, keeping the mode to resume.
    pub fn set_system_on(&mut self, on: bool) {
        if !self.has_context() {
            return;
        }
        let current = match self.queue.operating_mode() {
            Some(cmd) => cmd.mode,
            None => match self.base_status() {
                Some(status) => status.operating_mode,
                None => return,
            },
        };
        let mode = if on {
            current.turned_on()
        } else {
            current.turned_off()
        };
        self.queue
            .push(Command::OperatingMode(OperatingModeCommand { mode }));
    }

    /// Change the fan speed, the continuous flag is kept.
    ///
    /// `speed` must be one of the plain speeds.
    pub fn set_fan_speed(&mut self, speed: FanMode) {
        if speed == FanMode::Off || speed.is_continuous() {
            #[cfg(feature = "log")]
            log::warn!("Invalid fan speed: {speed}");
            return;
        }
        if !self.has_context() {
            return;
        }
        let continuous = match self.queue.fan_mode() {
            Some(cmd) => cmd.fan_mode.is_continuous(),
            None => match self.base_status() {
                Some(status) => status.continuous_fan,
                None => return,
            },
        };
        let fan_mode = speed.with_continuous(continuous);
        self.queue.push(Command::FanMode(FanModeCommand { fan_mode }));
    }

    /// Set speed and continuous flag at once.
    pub fn set_fan_speed_absolute(&mut self, fan_mode: FanMode) {
        if !self.has_context() {
            return;
        }
        self.queue.push(Command::FanMode(FanModeCommand { fan_mode }));
    }

    pub fn set_continuous_fan_mode(&mut self, continuous: bool) {
        if !self.has_context() {
            return;
        }
        let speed = match self.queue.fan_mode() {
            Some(cmd) => cmd.fan_mode.speed(),
            None => match self.base_status() {
                Some(status) => status.fan_mode,
                None => return,
            },
        };
        if speed == FanMode::Off {
            #[cfg(feature = "log")]
            log::warn!("Fan speed unknown, not changing continuous mode");
            return;
        }
        let fan_mode = speed.with_continuous(continuous);
        self.queue.push(Command::FanMode(FanModeCommand { fan_mode }));
    }

    /// Limited to 16 - 30°C.
    pub fn set_master_setpoint(&mut self, temperature: f32) {
        if !self.has_context() {
            return;
        }
        self.queue
            .push(Command::MasterSetpoint(MasterSetpointCommand {
                temperature: clamp_setpoint(temperature),
            }));
    }

    /// Turn a zone on or off.
    ///
    /// Controlled zones request the mode in their next reply, all others
    /// are switched with a zone state command.
    pub fn set_zone_on(&mut self, zone: Zone, on: bool) {
        if !self.has_context() {
            return;
        }
        if self.zones[zone].controlled {
            let control = &mut self.zones[zone];
            control.requested_mode = Some(if on { ZoneMode::On } else { ZoneMode::Off });
            control.changed = true;
            return;
        }
        let mut cmd = match self.queue.zone_state() {
            Some(cmd) => *cmd,
            None => {
                let Some(status) = self.base_status() else {
                    return;
                };
                let mut cmd = ZoneStateCommand {
                    zone_on: status.zone_on,
                };
                // controlled zones keep their requested mode
                for (other, control) in self.zones.iter() {
                    if control.controlled {
                        cmd.set(other, self.zone_on(other));
                    }
                }
                cmd
            }
        };
        cmd.set(zone, on);
        self.queue.push(Command::ZoneState(cmd));
    }

    /// Set the setpoint of a zone.
    ///
    /// With `adjust_master` the master setpoint is shifted by the amount the
    /// temperature lies outside the range the master allows for the zone.
    pub fn set_zone_setpoint_temperature(
        &mut self,
        zone: Zone,
        temperature: f32,
        adjust_master: bool,
    ) {
        if !self.has_context() {
            return;
        }
        self.apply_zone_setpoint(zone, temperature, adjust_master);
    }

    pub(super) fn apply_zone_setpoint(&mut self, zone: Zone, temperature: f32, adjust_master: bool) {
        let temperature = clamp_setpoint(temperature);
        if adjust_master {
            self.shift_master_setpoint(zone, temperature);
        }

        let control = &mut self.zones[zone];
        control.setpoint = Some(temperature);
        if control.controlled {
            control.changed = true;
            return;
        }

        self.queue
            .push(Command::ZoneSetpointCustom(ZoneSetpointCustomCommand {
                zone,
                temperature,
                adjust_master: false,
            }));
        if self.config.impersonate_master {
            if let Some(mut msg) = self.zone_master[zone] {
                msg.setpoint = temperature.min(msg.max_setpoint).max(msg.min_setpoint);
                self.queue.push(Command::MasterToZone(msg));
            }
        }
    }

    fn shift_master_setpoint(&mut self, zone: Zone, temperature: f32) {
        let Some(msg) = self.zone_master[zone] else {
            #[cfg(feature = "log")]
            log::debug!("Range of zone {zone} unknown, master setpoint unchanged");
            return;
        };
        let delta = if temperature > msg.max_setpoint {
            temperature - msg.max_setpoint
        } else if temperature < msg.min_setpoint {
            temperature - msg.min_setpoint
        } else {
            return;
        };
        let current = self
            .queue
            .master_setpoint()
            .map(|cmd| cmd.temperature)
            .or_else(|| self.master_setpoint());
        let Some(current) = current else {
            return;
        };
        self.queue
            .push(Command::MasterSetpoint(MasterSetpointCommand {
                temperature: clamp_setpoint(current + delta),
            }));
    }

    /// Temperature reported for a controlled zone.
    pub fn set_zone_current_temperature(&mut self, zone: Zone, temperature: f32) {
        self.zones[zone].temperature = Some(temperature);
    }

    /// Answer the master's polls for `zone`.
    ///
    /// The zone's own wall controller must be disconnected.
    pub fn set_control_zone(&mut self, zone: Zone, control: bool) {
        let zone_control = &mut self.zones[zone];
        zone_control.controlled = control;
        zone_control.send_config = control;
        if !control {
            zone_control.requested_mode = None;
            zone_control.changed = false;
        }
    }

    /// Send a master message to the wall controller of `msg.zone` in the
    /// next quiet window.
    pub fn set_zone_master_override(&mut self, msg: MasterToZoneMessage) {
        self.queue.push(Command::MasterToZone(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{MASTER_ZONE2, controller, controller_with, stat3_frame, state_frame};
    use crate::{config::Config, print::NoPrint};

    use super::*;

    fn zone(number: u8) -> Zone {
        Zone::new(number).unwrap()
    }

    #[test]
    fn intents_need_recent_traffic() {
        let mut controller = controller();
        controller.set_operating_mode(OperatingMode::Cool);
        controller.set_system_on(true);
        controller.set_fan_speed(FanMode::High);
        controller.set_master_setpoint(24.0);
        controller.set_zone_on(zone(1), true);
        controller.set_zone_setpoint_temperature(zone(1), 24.0, false);
        assert_eq!(controller.pending_commands(), 0);

        controller.process_frame(&state_frame(OperatingMode::Cool.value()), 1000);
        controller.poll(4000);
        controller.set_master_setpoint(24.0);
        assert_eq!(controller.pending_commands(), 0);
        assert_eq!(controller.zone_setpoint_temperature(zone(1)), Some(22.0));
    }

    #[test]
    fn intents_need_a_status_broadcast() {
        let mut controller = controller();
        controller.process_frame(&MASTER_ZONE2, 1000);
        assert!(controller.receiving_data());
        assert!(controller.status().is_none());

        controller.set_system_on(false);
        controller.set_zone_on(zone(1), true);
        controller.set_fan_speed(FanMode::High);
        controller.set_continuous_fan_mode(true);
        assert_eq!(controller.pending_commands(), 0);

        // absolute values need no status
        controller.set_operating_mode(OperatingMode::Cool);
        controller.set_fan_speed_absolute(FanMode::Low);
        assert_eq!(controller.pending_commands(), 2);
    }

    #[test]
    fn pending_command_is_base_without_status() {
        let mut controller = controller();
        controller.process_frame(&MASTER_ZONE2, 1000);
        controller.set_operating_mode(OperatingMode::Heat);
        controller.set_system_on(false);
        assert_eq!(
            controller.queue().operating_mode().unwrap().mode,
            OperatingMode::OffHeat
        );

        controller.set_fan_speed_absolute(FanMode::LowContinuous);
        controller.set_fan_speed(FanMode::High);
        assert_eq!(
            controller.queue().fan_mode().unwrap().fan_mode,
            FanMode::HighContinuous
        );
        controller.set_continuous_fan_mode(false);
        assert_eq!(controller.queue().fan_mode().unwrap().fan_mode, FanMode::High);
    }

    #[test]
    fn zone_state_keeps_unchanged_zones() {
        let mut controller = controller();
        let mut bytes = state_frame(OperatingMode::Cool.value());
        bytes[11] = 0b1000_0100; // zones 3 and 8 on
        controller.process_frame(&bytes, 1000);
        controller.set_zone_on(zone(1), true);
        let cmd = controller.queue().zone_state().unwrap();
        assert!(cmd.is_on(zone(1)));
        assert!(cmd.is_on(zone(3)));
        assert!(cmd.is_on(zone(8)));
        assert!(!cmd.is_on(zone(2)));
    }

    #[test]
    fn zone_simulation_without_traffic() {
        let mut controller = controller();
        controller.set_control_zone(zone(2), true);
        controller.set_zone_current_temperature(zone(2), 21.0);
        assert!(controller.control_zone(zone(2)));
        assert_eq!(controller.zone_current_temperature(zone(2)), Some(21.0));

        let mut msg = MasterToZoneMessage::try_from(&MASTER_ZONE2[..]).unwrap();
        msg.setpoint = 26.0;
        controller.set_zone_master_override(msg);
        assert_eq!(controller.queue().pending_overrides(), 1);
    }

    #[test]
    fn turn_system_off_and_on() {
        let mut controller = controller();
        controller.process_frame(&state_frame(OperatingMode::Auto.value()), 1000);
        controller.set_system_on(false);
        assert_eq!(
            controller.queue().operating_mode().unwrap().mode,
            OperatingMode::OffAuto
        );
        // the pending command is the base for the next change
        controller.set_system_on(true);
        assert_eq!(
            controller.queue().operating_mode().unwrap().mode,
            OperatingMode::Auto
        );
        controller.set_system_on(false);
        controller.process_frame(&stat3_frame(), 1100);
        assert_eq!(controller.bus().transport().written, [vec![0x3C, 0b0000_0100]]);
    }

    #[test]
    fn fan_speed_and_continuous_mode() {
        let mut controller = controller();
        let mut bytes = state_frame(OperatingMode::Cool.value());
        bytes[15] = 0b1001_0000; // continuous medium, active
        controller.process_frame(&bytes, 1000);
        assert_eq!(controller.fan_mode(), FanMode::MediumContinuous);

        controller.set_fan_speed(FanMode::High);
        assert_eq!(
            controller.queue().fan_mode().unwrap().fan_mode,
            FanMode::HighContinuous
        );
        controller.set_continuous_fan_mode(false);
        assert_eq!(controller.queue().fan_mode().unwrap().fan_mode, FanMode::High);

        controller.set_fan_speed(FanMode::Off);
        controller.set_fan_speed(FanMode::LowContinuous);
        assert_eq!(controller.queue().fan_mode().unwrap().fan_mode, FanMode::High);

        controller.set_fan_speed_absolute(FanMode::EspContinuous);
        assert_eq!(
            controller.queue().fan_mode().unwrap().fan_mode,
            FanMode::EspContinuous
        );
        assert_eq!(controller.pending_commands(), 1);
    }

    #[test]
    fn master_setpoint_is_limited() {
        let mut controller = controller();
        controller.process_frame(&state_frame(OperatingMode::Cool.value()), 1000);
        controller.set_master_setpoint(35.0);
        assert_eq!(controller.queue().master_setpoint().unwrap().temperature, 30.0);
        controller.set_master_setpoint(10.0);
        assert_eq!(controller.queue().master_setpoint().unwrap().temperature, 16.0);
    }

    #[test]
    fn switch_zones() {
        let mut controller = controller();
        controller.process_frame(&state_frame(OperatingMode::Cool.value()), 1000);
        controller.set_zone_on(zone(3), true);
        controller.set_zone_on(zone(1), false);
        controller.process_frame(&stat3_frame(), 1100);
        assert_eq!(controller.bus().transport().written, [vec![0x3D, 0b0000_0110]]);
    }

    fn controlled_zone2() -> super::super::tests::TestController {
        let mut controller = controller();
        controller.set_control_zone(zone(2), true);
        controller.process_frame(&state_frame(OperatingMode::Cool.value()), 1000);
        controller.process_frame(&MASTER_ZONE2, 1100);
        controller
    }

    #[test]
    fn zone_setpoint_above_range_raises_master() {
        let mut controller = controlled_zone2();
        controller.set_zone_setpoint_temperature(zone(2), 29.0, true);
        assert_eq!(controller.queue().master_setpoint().unwrap().temperature, 23.0);
        // requested setpoint is kept, the reported one stays in range
        assert_eq!(controller.zones[zone(2)].setpoint, Some(29.0));
        assert_eq!(controller.zone_setpoint_temperature(zone(2)), Some(28.0));
        assert!(controller.queue().zone_setpoint_custom().is_none());
    }

    #[test]
    fn zone_setpoint_below_range_lowers_master() {
        let mut controller = controlled_zone2();
        controller.set_zone_setpoint_temperature(zone(2), 16.0, true);
        assert_eq!(controller.queue().master_setpoint().unwrap().temperature, 20.0);

        // within range
        let mut controller = controlled_zone2();
        controller.set_zone_setpoint_temperature(zone(2), 25.0, true);
        assert!(controller.queue().master_setpoint().is_none());
    }

    #[test]
    fn controlled_zone_setpoint_is_sent_in_reply() {
        let mut controller = controlled_zone2();
        controller.set_zone_setpoint_temperature(zone(2), 29.0, false);
        controller.process_frame(&MASTER_ZONE2, 2000);
        let written = &controller.bus().transport().written;
        let reply = crate::frame::ZoneToMasterMessage::try_from(&written[written.len() - 1][..])
            .unwrap();
        // limited to the zone range
        assert_eq!(reply.setpoint, 28.0);
        assert_eq!(controller.zone_setpoint_temperature(zone(2)), Some(reply.setpoint));

        // the change debounces broadcasts
        controller.process_frame(&state_frame(OperatingMode::Heat.value()), 2500);
        assert_eq!(controller.operating_mode(), OperatingMode::Cool);
    }

    #[test]
    fn setpoint_of_other_zone() {
        let config = Config {
            impersonate_master: true,
            ..Default::default()
        };
        let mut controller = controller_with(config, NoPrint);
        controller.process_frame(&MASTER_ZONE2, 1000);
        controller.set_zone_setpoint_temperature(zone(2), 29.0, false);

        let cmd = controller.queue().zone_setpoint_custom().unwrap();
        assert_eq!(cmd.zone, zone(2));
        assert_eq!(cmd.temperature, 29.0);
        assert!(!cmd.adjust_master);
        let msg = controller.queue().master_to_zone(zone(2)).unwrap();
        assert_eq!(msg.setpoint, 28.0);
        assert_eq!(controller.pending_commands(), 2);
    }

    #[test]
    fn release_zone_control() {
        let mut controller = controlled_zone2();
        assert_eq!(controller.bus().transport().written.len(), 1);
        controller.set_control_zone(zone(2), false);
        controller.process_frame(&MASTER_ZONE2, 2000);
        assert_eq!(controller.bus().transport().written.len(), 1);
        assert!(!controller.control_zone(zone(2)));
    }
}
