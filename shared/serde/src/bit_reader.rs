use crate::SerdeErr;

/// Reads bits back out of a buffer produced by [`crate::BitWriter`].
pub struct BitReader<'b> {
    buffer: &'b [u8],
    state: BitReaderState,
}

#[derive(Copy, Clone)]
struct BitReaderState {
    scratch: u8,
    scratch_index: u8,
    buffer_index: usize,
}

impl<'b> BitReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self {
            buffer,
            state: BitReaderState {
                scratch: 0,
                scratch_index: 0,
                buffer_index: 0,
            },
        }
    }

    /// Number of whole bytes not yet touched by the reader.
    pub fn bytes_remaining(&self) -> usize {
        self.buffer.len() - self.state.buffer_index
    }

    pub fn read_bit(&mut self) -> Result<bool, SerdeErr> {
        if self.state.scratch_index == 0 {
            if self.state.buffer_index == self.buffer.len() {
                return Err(SerdeErr::UnexpectedEnd);
            }

            self.state.scratch = self.buffer[self.state.buffer_index];
            self.state.buffer_index += 1;
            self.state.scratch_index += 8;
        }

        let value = self.state.scratch & 1;
        self.state.scratch >>= 1;
        self.state.scratch_index -= 1;

        Ok(value != 0)
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let mut output = 0;
        for _ in 0..7 {
            if self.read_bit()? {
                output |= 128;
            }
            output >>= 1;
        }
        if self.read_bit()? {
            output |= 128;
        }
        Ok(output)
    }
}
