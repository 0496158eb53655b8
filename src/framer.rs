// SPDX-FileCopyrightText: Copyright (c) 2024-2025 actron485-core contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Split the incoming byte stream into frames at inter-byte silence.

use heapless::{
    Vec,
    spsc::{Consumer, Producer, Queue},
};

use crate::{error::Error, frame::MessageType};

/// Receive buffer size, large enough for every known message.
pub const DEFAULT_FRAME_CAPACITY: usize = 64;

/// A complete frame as received from the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<const N: usize = DEFAULT_FRAME_CAPACITY> {
    bytes: Vec<u8, N>,
    started_at: u64,
    received_at: u64,
}

impl<const N: usize> Frame<N> {
    /// Copy `bytes` into a frame.
    pub fn new(bytes: &[u8], started_at: u64, received_at: u64) -> Result<Self, Error> {
        let bytes = Vec::from_slice(bytes).map_err(|()| Error::FrameTooLong(N))?;
        Ok(Self {
            bytes,
            started_at,
            received_at,
        })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Arrival time of the first byte in milliseconds.
    #[must_use]
    pub const fn started_at(&self) -> u64 {
        self.started_at
    }

    /// Arrival time of the last byte in milliseconds.
    #[must_use]
    pub const fn received_at(&self) -> u64 {
        self.received_at
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn message_type(&self) -> MessageType {
        self.bytes
            .first()
            .map_or(MessageType::Unknown, |b| MessageType::detect(*b))
    }
}

/// Accumulates bytes until the bus has been silent for the frame gap.
#[derive(Debug)]
pub struct Framer<const N: usize = DEFAULT_FRAME_CAPACITY> {
    buf: Vec<u8, N>,
    gap_ms: u64,
    started_at: u64,
    last_byte_at: Option<u64>,
    // Bytes are dropped until the next gap after an overflow.
    discarding: bool,
}

impl<const N: usize> Framer<N> {
    #[must_use]
    pub const fn new(gap_ms: u64) -> Self {
        Self {
            buf: Vec::new(),
            gap_ms,
            started_at: 0,
            last_byte_at: None,
            discarding: false,
        }
    }

    /// Arrival time of the most recent byte.
    #[must_use]
    pub const fn last_byte_at(&self) -> Option<u64> {
        self.last_byte_at
    }

    /// Number of bytes of the frame in progress.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    fn gap_elapsed(&self, now: u64) -> bool {
        self.last_byte_at
            .is_some_and(|last| now.saturating_sub(last) >= self.gap_ms)
    }

    fn take(&mut self) -> Option<Frame<N>> {
        self.discarding = false;
        if self.buf.is_empty() {
            return None;
        }
        let bytes = core::mem::take(&mut self.buf);
        let received_at = self.last_byte_at.unwrap_or(self.started_at);
        Some(Frame {
            bytes,
            started_at: self.started_at,
            received_at,
        })
    }

    /// Feed one byte received at `now`.
    ///
    /// If the silence before this byte closes the frame in progress, that
    /// frame is returned. A frame that outgrows the buffer is dropped and
    /// reported once as [`Error::FrameTooLong`].
    pub fn push(&mut self, byte: u8, now: u64) -> Result<Option<Frame<N>>, Error> {
        let completed = if self.gap_elapsed(now) {
            self.take()
        } else {
            None
        };
        let first = self.buf.is_empty();
        self.last_byte_at = Some(now);
        if self.discarding {
            return Ok(completed);
        }
        if self.buf.push(byte).is_err() {
            self.buf.clear();
            self.discarding = true;
            return Err(Error::FrameTooLong(N));
        }
        if first {
            self.started_at = now;
        }
        Ok(completed)
    }

    /// Close the frame in progress once the bus has been silent long enough.
    pub fn poll(&mut self, now: u64) -> Option<Frame<N>> {
        if self.gap_elapsed(now) {
            self.take()
        } else {
            None
        }
    }
}

/// Completed frames handed from a reader task to the controller.
pub type FrameQueue<const Q: usize, const N: usize = DEFAULT_FRAME_CAPACITY> =
    Queue<Frame<N>, Q>;

/// Producer half for a dedicated byte reader.
///
/// Owns the [`Framer`] and moves every completed frame into a
/// [`FrameQueue`]. The consumer half feeds them to
/// [`Controller::receive`](crate::Controller::receive).
pub struct FrameReader<'q, const Q: usize, const N: usize = DEFAULT_FRAME_CAPACITY> {
    framer: Framer<N>,
    producer: Producer<'q, Frame<N>, Q>,
}

impl<'q, const Q: usize, const N: usize> FrameReader<'q, Q, N> {
    pub const fn new(framer: Framer<N>, producer: Producer<'q, Frame<N>, Q>) -> Self {
        Self { framer, producer }
    }

    fn forward(&mut self, frame: Option<Frame<N>>) -> Result<(), Error> {
        let Some(frame) = frame else {
            return Ok(());
        };
        self.producer.enqueue(frame).map_err(|frame| {
            #[cfg(feature = "log")]
            log::warn!("Frame queue full, dropping {} byte frame", frame.len());
            let _ = frame;
            Error::BufferSize
        })
    }

    /// Feed one received byte.
    pub fn push(&mut self, byte: u8, now: u64) -> Result<(), Error> {
        let frame = self.framer.push(byte, now)?;
        self.forward(frame)
    }

    /// Close the frame in progress after silence.
    pub fn poll(&mut self, now: u64) -> Result<(), Error> {
        let frame = self.framer.poll(now);
        self.forward(frame)
    }
}

/// Drain queued frames, oldest first.
pub fn drain_frames<const Q: usize, const N: usize>(
    consumer: &mut Consumer<'_, Frame<N>, Q>,
    mut f: impl FnMut(Frame<N>),
) {
    while let Some(frame) = consumer.dequeue() {
        f(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed<const N: usize>(framer: &mut Framer<N>, bytes: &[(u8, u64)]) -> std::vec::Vec<Frame<N>> {
        bytes
            .iter()
            .filter_map(|(b, t)| framer.push(*b, *t).unwrap())
            .collect()
    }

    #[test]
    fn bytes_within_gap_form_one_frame() {
        let mut framer = Framer::<64>::new(5);
        let frames = feed(&mut framer, &[(0x3A, 100), (0x2C, 102), (0x00, 106)]);
        assert!(frames.is_empty());
        assert!(framer.poll(110).is_none());
        let frame = framer.poll(111).unwrap();
        assert_eq!(frame.as_bytes(), &[0x3A, 0x2C, 0x00]);
        assert_eq!(frame.started_at(), 100);
        assert_eq!(frame.received_at(), 106);
        assert_eq!(frame.message_type(), MessageType::MasterSetpoint);
        assert!(framer.poll(200).is_none());
    }

    #[test]
    fn gap_starts_new_frame() {
        let mut framer = Framer::<64>::new(5);
        let frames = feed(
            &mut framer,
            &[(0x3A, 0), (0x2C, 4), (0x3B, 9), (0x02, 10), (0x3C, 20)],
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_bytes(), &[0x3A, 0x2C]);
        assert_eq!(frames[1].as_bytes(), &[0x3B, 0x02]);
        assert_eq!(framer.pending(), 1);
        assert_eq!(framer.last_byte_at(), Some(20));
    }

    #[test]
    fn overflow_discards_until_silence() {
        let mut framer = Framer::<4>::new(5);
        for (i, b) in [1, 2, 3, 4].into_iter().enumerate() {
            assert!(framer.push(b, i as u64).unwrap().is_none());
        }
        assert_eq!(framer.push(5, 4).err().unwrap(), Error::FrameTooLong(4));
        // still discarding
        assert!(framer.push(6, 5).unwrap().is_none());
        assert_eq!(framer.pending(), 0);
        assert!(framer.poll(20).is_none());

        // the next frame after the gap is intact
        assert!(framer.push(0x3A, 30).unwrap().is_none());
        assert!(framer.push(0x2C, 31).unwrap().is_none());
        assert_eq!(framer.poll(40).unwrap().as_bytes(), &[0x3A, 0x2C]);
    }

    #[test]
    fn frame_from_slice() {
        let frame = Frame::<4>::new(&[1, 2, 3], 0, 1).unwrap();
        assert_eq!(frame.len(), 3);
        assert!(!frame.is_empty());
        assert_eq!(frame.message_type(), MessageType::IndoorBoard1);
        assert_eq!(
            Frame::<2>::new(&[1, 2, 3], 0, 1).err().unwrap(),
            Error::FrameTooLong(2)
        );
    }

    #[test]
    fn reader_moves_frames_into_queue() {
        let mut queue: FrameQueue<4, 16> = FrameQueue::new();
        let (producer, mut consumer) = queue.split();
        let mut reader = FrameReader::new(Framer::new(5), producer);

        reader.push(0x3A, 0).unwrap();
        reader.push(0x2C, 1).unwrap();
        reader.push(0x3B, 10).unwrap();
        reader.push(0x01, 11).unwrap();
        reader.poll(20).unwrap();

        let mut frames = std::vec::Vec::new();
        drain_frames(&mut consumer, |frame| frames.push(frame));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_bytes(), &[0x3A, 0x2C]);
        assert_eq!(frames[1].as_bytes(), &[0x3B, 0x01]);
    }

    #[test]
    fn reader_reports_full_queue() {
        // holds a single frame
        let mut queue: FrameQueue<2, 16> = FrameQueue::new();
        let (producer, _consumer) = queue.split();
        let mut reader = FrameReader::new(Framer::new(5), producer);

        reader.push(0x3A, 0).unwrap();
        reader.poll(10).unwrap();
        reader.push(0x3B, 20).unwrap();
        assert_eq!(reader.poll(30).err().unwrap(), Error::BufferSize);
    }
}
