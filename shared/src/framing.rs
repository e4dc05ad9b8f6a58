//! Length-prefixed framing for stream transports. Each frame is a
//! little-endian `u16` payload length followed by the payload.

use std::io::{self, ErrorKind, Write};

use thiserror::Error;

pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// How many bytes a [`FrameQueue`] holds for a peer that stopped reading.
pub const MAX_QUEUED_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The payload length does not fit the `u16` prefix
    #[error("Payload of {len} bytes does not fit in a frame (max {MAX_FRAME_LEN})")]
    TooLarge { len: usize },
    /// The peer has left more than [`MAX_QUEUED_BYTES`] unread
    #[error("Peer is {queued} bytes behind, over the limit of {MAX_QUEUED_BYTES}")]
    Backlog { queued: usize },
}

pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let len = u16::try_from(payload.len()).map_err(|_| FrameError::TooLarge {
        len: payload.len(),
    })?;
    let mut frame = Vec::with_capacity(payload.len() + 2);
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Reassembles frames from bytes as they trickle in.
#[derive(Clone, Debug, Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Pops the oldest complete frame, if one has fully arrived.
    pub fn next_frame(&mut self) -> Option<Box<[u8]>> {
        if self.buffer.len() < 2 {
            return None;
        }
        let len = u16::from_le_bytes([self.buffer[0], self.buffer[1]]) as usize;
        if self.buffer.len() < len + 2 {
            return None;
        }
        let frame: Box<[u8]> = self.buffer[2..len + 2].into();
        self.buffer.drain(..len + 2);
        Some(frame)
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Outgoing frames the stream has not accepted yet. A non-blocking write
/// may take only part of a frame; the rest waits here so the next frame
/// never lands in the middle of it.
#[derive(Clone, Debug, Default)]
pub struct FrameQueue {
    pending: Vec<u8>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `payload` as one frame behind anything still pending.
    pub fn push(&mut self, payload: &[u8]) -> Result<(), FrameError> {
        let frame = encode_frame(payload)?;
        let queued = self.pending.len() + frame.len();
        if queued > MAX_QUEUED_BYTES {
            return Err(FrameError::Backlog { queued });
        }
        self.pending.extend_from_slice(&frame);
        Ok(())
    }

    /// Writes as much as `writer` takes without blocking. Bytes it refuses
    /// stay queued; only a broken stream is an error.
    pub fn flush_into<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let mut written = 0;
        let result = loop {
            if written == self.pending.len() {
                break Ok(());
            }
            match writer.write(&self.pending[written..]) {
                Ok(0) => break Err(io::Error::from(ErrorKind::WriteZero)),
                Ok(count) => written += count,
                Err(error) if error.kind() == ErrorKind::WouldBlock => break Ok(()),
                Err(error) if error.kind() == ErrorKind::Interrupted => continue,
                Err(error) => break Err(error),
            }
        };
        self.pending.drain(..written);
        result
    }

    pub fn queued(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
