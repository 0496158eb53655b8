// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bus participant.
//!
//! A [`Controller`] listens to the bus, keeps the latest state reported by
//! the master, answers the master on behalf of the zones it controls and
//! sends queued commands in the quiet window after every bus sequence.

use embedded_hal::digital::OutputPin;

use crate::{
    bus::{Bus, NoWriteEnable, Transport},
    codec::decode_message,
    config::Config,
    frame::{
        MasterToZoneMessage, Message, StateMessage, StateMessage2, ZoneArray, ZoneMessageType,
        ZoneMode, ZoneToMasterMessage,
    },
    framer::{Frame, Framer},
    print::{LogSink, PrintOutMode, PrintSink},
    queue::CommandQueue,
    scheduler::Scheduler,
};

mod accessors;
mod history;
mod intents;

use self::history::History;

/// Reply of a wall controller to an init request of the master.
const INIT_ZONE_RESPONSE: [u8; 2] = [0x00, 0xCC];

/// What this node knows about a zone it may answer for.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ZoneControl {
    /// Answer the master's polls for this zone.
    controlled: bool,
    /// Requested setpoint, limited to the master's range when sent.
    setpoint: Option<f32>,
    temperature: Option<f32>,
    mode: ZoneMode,
    /// Mode change not yet confirmed by the master.
    requested_mode: Option<ZoneMode>,
    /// The next reply is a config message.
    send_config: bool,
    /// A local change has not been sent to the master yet.
    changed: bool,
}

/// Protocol engine of a single bus node.
///
/// Time is passed in by the caller as monotonic milliseconds. Write
/// intents only queue commands; the reported state changes once the
/// master broadcasts it.
pub struct Controller<T, P = NoWriteEnable, S = LogSink> {
    config: Config,
    bus: Bus<T, P>,
    sink: S,
    framer: Framer,
    scheduler: Scheduler,
    queue: CommandQueue,
    history: History,
    now: u64,
    state: Option<StateMessage>,
    state2: Option<StateMessage2>,
    zone_wall: ZoneArray<Option<ZoneToMasterMessage>>,
    zone_master: ZoneArray<Option<MasterToZoneMessage>>,
    zones: ZoneArray<ZoneControl>,
}

impl<T, P, S> Controller<T, P, S>
where
    T: Transport,
    P: OutputPin,
    S: PrintSink,
{
    pub fn new(config: Config, bus: Bus<T, P>, sink: S) -> Self {
        Self {
            framer: Framer::new(config.timing.frame_gap),
            scheduler: Scheduler::new(config.timing),
            config,
            bus,
            sink,
            queue: CommandQueue::new(),
            history: History::new(),
            now: 0,
            state: None,
            state2: None,
            zone_wall: ZoneArray::default(),
            zone_master: ZoneArray::default(),
            zones: ZoneArray::default(),
        }
    }

    fn advance(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    /// Drive the controller, call this every few milliseconds.
    ///
    /// Reads all available bytes, processes completed frames and sends the
    /// next queued command once the bus is quiet.
    pub fn poll(&mut self, now: u64) {
        self.advance(now);
        while let Some(byte) = self.bus.read() {
            self.scheduler.byte_received(now);
            match self.framer.push(byte, now) {
                Ok(Some(frame)) => self.receive(&frame),
                Ok(None) => {}
                Err(_err) => {
                    #[cfg(feature = "log")]
                    log::warn!("Discarding frame: {_err}");
                }
            }
        }
        if let Some(frame) = self.framer.poll(now) {
            self.receive(&frame);
        }
        if self.scheduler.quiet_window(now) {
            self.send_queued_command();
        }
    }

    /// Process a frame completed by a [`FrameReader`](crate::FrameReader).
    pub fn receive<const N: usize>(&mut self, frame: &Frame<N>) {
        self.advance(frame.received_at());
        self.handle(frame.as_bytes(), frame.started_at(), frame.received_at());
    }

    /// Process a complete frame received at `now`.
    pub fn process_frame(&mut self, bytes: &[u8], now: u64) {
        self.advance(now);
        self.handle(bytes, now, now);
    }

    fn handle(&mut self, bytes: &[u8], started_at: u64, received_at: u64) {
        if self.scheduler.is_echo(started_at) {
            #[cfg(feature = "log")]
            log::trace!("Ignoring echo: {bytes:02X?}");
            return;
        }
        self.scheduler.frame_received(received_at);

        let msg = match decode_message(bytes) {
            Ok(msg) => msg,
            Err(_err) => {
                #[cfg(feature = "log")]
                log::warn!("Discarding {} byte frame: {_err}", bytes.len());
                if self.config.print_out_mode == PrintOutMode::AllMessages {
                    self.sink.print(format_args!("Unknown: {bytes:02X?}"));
                }
                return;
            }
        };
        #[cfg(feature = "log")]
        diagnose(&msg, bytes);

        let changed = self.history.update(bytes);
        self.print(&msg, changed);
        self.dispatch(msg);
    }

    fn print(&mut self, msg: &Message, changed: bool) {
        let show = match self.config.print_out_mode {
            PrintOutMode::StatusOnly => {
                changed && matches!(msg, Message::Stat1(_) | Message::IndoorBoard2(_))
            }
            PrintOutMode::ChangedMessages => changed,
            PrintOutMode::AllMessages => true,
        };
        if show {
            self.sink.print(format_args!("{msg}"));
        }
    }

    fn dispatch(&mut self, msg: Message) {
        let debouncing = self.scheduler.is_debouncing(self.now);
        match msg {
            Message::Stat1(state) if !debouncing => self.state = Some(state),
            Message::IndoorBoard2(state) if !debouncing => self.state2 = Some(state),
            Message::Stat1(_) | Message::IndoorBoard2(_) => {
                #[cfg(feature = "log")]
                log::trace!("Keeping state after recent transmission");
            }
            Message::ZoneMaster(msg) => {
                if !debouncing {
                    self.zone_master[msg.zone] = Some(msg);
                }
                if self.zones[msg.zone].controlled {
                    self.follow_master(&msg);
                    self.reply_to_master(&msg);
                }
            }
            Message::ZoneWall(msg) => self.process_zone_message(msg),
            Message::CustomZoneSetpoint(cmd) => {
                if self.zones[cmd.zone].controlled {
                    #[cfg(feature = "log")]
                    log::debug!("Setpoint request for zone {}: {:.1}", cmd.zone, cmd.temperature);
                    self.apply_zone_setpoint(cmd.zone, cmd.temperature, cmd.adjust_master);
                }
            }
            Message::Stat3 => {
                self.scheduler.sequence_end(self.now);
                self.send_queued_command();
            }
            Message::MasterSetpoint(_)
            | Message::FanMode(_)
            | Message::OperatingMode(_)
            | Message::ZoneState(_)
            | Message::IndoorBoard1
            | Message::Stat2 => {}
        }
    }

    fn process_zone_message(&mut self, msg: ZoneToMasterMessage) {
        if msg.message_type == ZoneMessageType::InitZone {
            if self.zones[msg.zone].controlled {
                self.send_init_response(msg);
            }
            return;
        }
        self.zone_wall[msg.zone] = Some(msg);
    }

    /// Confirm pending mode requests and follow the master's zone on/off.
    fn follow_master(&mut self, msg: &MasterToZoneMessage) {
        let control = &mut self.zones[msg.zone];
        if let Some(requested) = control.requested_mode {
            if (requested != ZoneMode::Off) == msg.on {
                control.mode = requested;
                control.requested_mode = None;
            }
        }
        // The master does not distinguish between on and open
        if msg.on && control.mode == ZoneMode::Off {
            control.mode = ZoneMode::On;
        } else if !msg.on && control.mode != ZoneMode::Off {
            control.mode = ZoneMode::Off;
        }
    }

    /// Answer the master's poll for a zone we control, right after the poll.
    fn reply_to_master(&mut self, msg: &MasterToZoneMessage) {
        let zone = msg.zone;
        let control = self.zones[zone];
        let mode = control.requested_mode.unwrap_or(control.mode);
        let setpoint = control
            .setpoint
            .unwrap_or(msg.setpoint)
            .min(msg.max_setpoint)
            .max(msg.min_setpoint);
        let reply = if control.send_config {
            ZoneToMasterMessage::config(zone, mode, setpoint, 0.0)
        } else {
            let temperature = control.temperature.unwrap_or(msg.temperature);
            ZoneToMasterMessage::normal(zone, mode, setpoint, temperature)
        };

        let mut buf = [0; ZoneToMasterMessage::LEN];
        let sent = reply
            .encode(&mut buf)
            .and_then(|len| self.bus.transmit(&buf[..len]));
        if let Err(_err) = sent {
            #[cfg(feature = "log")]
            log::warn!("Unable to answer for zone {zone}: {_err}");
            return;
        }
        #[cfg(feature = "log")]
        log::debug!("Sent {reply}");

        let control = &mut self.zones[zone];
        control.send_config = false;
        if core::mem::take(&mut control.changed) {
            self.scheduler.data_sent(self.now);
        } else {
            self.scheduler.transmitted(self.now);
        }
        self.zone_wall[zone] = Some(reply);
        if self.config.print_out_mode == PrintOutMode::AllMessages {
            self.sink.print(format_args!("Sent {reply}"));
        }
    }

    fn send_init_response(&mut self, msg: ZoneToMasterMessage) {
        if let Err(_err) = self.bus.transmit(&INIT_ZONE_RESPONSE) {
            #[cfg(feature = "log")]
            log::warn!("Unable to initialise zone {}: {_err}", msg.zone);
            return;
        }
        #[cfg(feature = "log")]
        log::debug!("Zone {} initialised", msg.zone);
        self.zones[msg.zone].send_config = true;
        self.scheduler.transmitted(self.now);
    }

    /// Transmit the most important pending command.
    ///
    /// The command stays queued if the transmission fails.
    fn send_queued_command(&mut self) -> bool {
        let Some(command) = self.queue.peek() else {
            return false;
        };
        let mut buf = [0; MasterToZoneMessage::LEN];
        let sent = command
            .encode(&mut buf)
            .and_then(|len| self.bus.transmit(&buf[..len]));
        if let Err(_err) = sent {
            #[cfg(feature = "log")]
            log::warn!("Unable to send {command}: {_err}");
            return false;
        }
        #[cfg(feature = "log")]
        log::debug!("Sent {command}");
        self.queue.pop();
        self.scheduler.command_sent(self.now);
        if self.config.print_out_mode == PrintOutMode::AllMessages {
            self.sink.print(format_args!("Sent {command}"));
        }
        true
    }
}

/// Log checksum mismatches and frames that do not survive re-encoding.
///
/// Neither rejects the frame.
#[cfg(feature = "log")]
fn diagnose(msg: &Message, bytes: &[u8]) {
    if let Err(err) = crate::codec::verify_checksum(bytes) {
        log::warn!("{}: {err}", crate::frame::MessageType::from(msg));
    }
    let mut buf = [0; MasterToZoneMessage::LEN];
    let encoded = match msg {
        Message::ZoneWall(msg) => msg.encode(&mut buf),
        Message::ZoneMaster(msg) => msg.encode(&mut buf),
        _ => return,
    };
    if let Ok(len) = encoded {
        if buf[..len] != *bytes {
            log::debug!("Re-encoded {:02X?} as {:02X?}", bytes, &buf[..len]);
        }
    }
}
