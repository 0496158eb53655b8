// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human readable bus summaries.

use core::fmt;

/// Which received frames are summarised.
#[cfg_attr(all(feature = "defmt", target_os = "none"), derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrintOutMode {
    /// System status broadcasts only.
    #[default]
    StatusOnly,
    /// Any frame whose bytes differ from the previous one of its kind.
    ChangedMessages,
    /// Every frame.
    AllMessages,
}

/// Target for one summary line per frame.
pub trait PrintSink {
    fn print(&mut self, args: fmt::Arguments<'_>);
}

impl<S: PrintSink + ?Sized> PrintSink for &mut S {
    fn print(&mut self, args: fmt::Arguments<'_>) {
        (**self).print(args);
    }
}

/// Forwards summaries to `log::info!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl PrintSink for LogSink {
    fn print(&mut self, args: fmt::Arguments<'_>) {
        #[cfg(feature = "log")]
        log::info!("{args}");
        #[cfg(not(feature = "log"))]
        let _ = args;
    }
}

/// Discards summaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrint;

impl PrintSink for NoPrint {
    fn print(&mut self, _: fmt::Arguments<'_>) {}
}

/// Writes one line per summary into any [`fmt::Write`].
#[derive(Debug, Default)]
pub struct WriteSink<W>(W);

impl<W: fmt::Write> WriteSink<W> {
    pub const fn new(writer: W) -> Self {
        Self(writer)
    }

    pub const fn get_ref(&self) -> &W {
        &self.0
    }

    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: fmt::Write> PrintSink for WriteSink<W> {
    fn print(&mut self, args: fmt::Arguments<'_>) {
        // A full buffer truncates the summary.
        let _ = self.0.write_fmt(args);
        let _ = self.0.write_char('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_sink_appends_lines() {
        let mut sink = WriteSink::new(String::new());
        sink.print(format_args!("Zone {}", 3));
        (&mut sink).print(format_args!("Setpoint: {:.1}", 22.0));
        assert_eq!(sink.get_ref(), "Zone 3\nSetpoint: 22.0\n");
    }

    #[test]
    fn write_sink_into_heapless_string() {
        let mut sink = WriteSink::new(heapless::String::<8>::new());
        sink.print(format_args!("Temperature"));
        // truncated, never panics
        assert!(sink.into_inner().len() <= 8);
    }
}
