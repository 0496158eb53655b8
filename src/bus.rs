// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Half-duplex access to the RS485 bus.

use core::{convert::Infallible, fmt};

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::error::Error;

/// Byte transport of the bus, 4800 baud 8N1.
pub trait Transport {
    type Error: fmt::Debug;

    /// Next received byte, if one is available.
    fn read(&mut self) -> Option<u8>;

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Block until all written bytes are on the wire.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    type Error = T::Error;

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        (**self).flush()
    }
}

/// [`Transport`] over an `embedded-io` serial port.
#[derive(Debug)]
pub struct IoTransport<T>(T);

impl<T> IoTransport<T> {
    pub const fn new(io: T) -> Self {
        Self(io)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Transport for IoTransport<T>
where
    T: embedded_io::Read + embedded_io::ReadReady + embedded_io::Write,
{
    type Error = T::Error;

    fn read(&mut self) -> Option<u8> {
        if !self.0.read_ready().ok()? {
            return None;
        }
        let mut byte = [0];
        match self.0.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(bytes)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}

/// [`Transport`] over a `std` serial port.
///
/// The port should be configured with a short read timeout, a timed out
/// read counts as no data.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct StdTransport<T>(T);

#[cfg(feature = "std")]
impl<T> StdTransport<T> {
    pub const fn new(io: T) -> Self {
        Self(io)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

#[cfg(feature = "std")]
impl<T: std::io::Read + std::io::Write> Transport for StdTransport<T> {
    type Error = std::io::Error;

    fn read(&mut self) -> Option<u8> {
        let mut byte = [0];
        match self.0.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            _ => None,
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.write_all(bytes)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.flush()
    }
}

/// Write-enable pin for transceivers that switch direction on their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWriteEnable;

impl ErrorType for NoWriteEnable {
    type Error = Infallible;
}

impl OutputPin for NoWriteEnable {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// The bus transport together with the driver's write-enable pin.
#[derive(Debug)]
pub struct Bus<T, P = NoWriteEnable> {
    transport: T,
    write_enable: P,
}

impl<T: Transport> Bus<T> {
    /// A bus without write-enable pin.
    pub const fn without_write_enable(transport: T) -> Self {
        Self {
            transport,
            write_enable: NoWriteEnable,
        }
    }
}

impl<T: Transport, P: OutputPin> Bus<T, P> {
    /// The write-enable pin must be low, which keeps the driver listening.
    pub const fn new(transport: T, write_enable: P) -> Self {
        Self {
            transport,
            write_enable,
        }
    }

    pub fn read(&mut self) -> Option<u8> {
        self.transport.read()
    }

    /// Write a complete frame.
    ///
    /// Write-enable is held for the whole frame and released after the
    /// transport has been flushed, even if writing failed.
    pub fn transmit(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.write_enable.set_high().map_err(|_err| {
            #[cfg(feature = "log")]
            log::warn!("Unable to assert write enable: {_err:?}");
            Error::Transport
        })?;
        let written = self
            .transport
            .write(bytes)
            .and_then(|()| self.transport.flush());
        let released = self.write_enable.set_low();
        written.map_err(|_err| {
            #[cfg(feature = "log")]
            log::warn!("Unable to transmit {} bytes: {_err:?}", bytes.len());
            Error::Transport
        })?;
        released.map_err(|_err| {
            #[cfg(feature = "log")]
            log::warn!("Unable to release write enable: {_err:?}");
            Error::Transport
        })
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub const fn write_enable(&self) -> &P {
        &self.write_enable
    }

    pub fn into_parts(self) -> (T, P) {
        (self.transport, self.write_enable)
    }
}


#[cfg(test)]
mod tests {
    use super::{mock::*, *};

    #[test]
    fn transmit_toggles_write_enable() {
        let mut bus = Bus::new(MockTransport::default(), MockPin::default());
        bus.transmit(&[0x3C, 0b1010]).unwrap();
        assert_eq!(bus.transport().written, [vec![0x3C, 0b1010]]);
        assert_eq!(bus.transport().flushed, 1);
        assert_eq!(bus.write_enable().levels, [true, false]);
        assert!(!bus.write_enable().is_high());
    }

    #[test]
    fn failed_transmit_releases_write_enable() {
        let transport = MockTransport {
            fail: true,
            ..Default::default()
        };
        let mut bus = Bus::new(transport, MockPin::default());
        assert_eq!(bus.transmit(&[0x3A, 44]).err().unwrap(), Error::Transport);
        assert!(!bus.write_enable().is_high());
        assert_eq!(bus.transport().flushed, 0);
    }

    #[test]
    fn read_from_transport() {
        let mut bus = Bus::without_write_enable(MockTransport::default());
        assert!(bus.read().is_none());
        bus.transport_mut().rx.extend([0xE0, 0x01]);
        assert_eq!(bus.read(), Some(0xE0));
        assert_eq!(bus.read(), Some(0x01));
        let (transport, _) = bus.into_parts();
        assert!(transport.rx.is_empty());
    }
}
