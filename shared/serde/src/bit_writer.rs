/// Sink for a stream of bits.
pub trait BitWrite {
    fn write_bit(&mut self, bit: bool);
    fn write_byte(&mut self, byte: u8);
    fn count_bits(&mut self, bits: u32);
    fn is_counter(&self) -> bool;
}

/// A growable bit buffer. Packets carry a single message, so there is no
/// MTU-sized backing array to overflow.
pub struct BitWriter {
    scratch: u8,
    scratch_index: u8,
    buffer: Vec<u8>,
    bits_written: u32,
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            scratch: 0,
            scratch_index: 0,
            buffer: Vec::with_capacity(128),
            bits_written: 0,
        }
    }

    fn flush_scratch(&mut self) {
        if self.scratch_index > 0 {
            let byte = (self.scratch << (8 - self.scratch_index)).reverse_bits();
            self.buffer.push(byte);
            self.scratch = 0;
            self.scratch_index = 0;
        }
    }

    /// Consumes the writer, returning the packed bytes.
    pub fn to_bytes(mut self) -> Box<[u8]> {
        self.flush_scratch();
        self.buffer.into_boxed_slice()
    }

    pub fn bits_written(&self) -> u32 {
        self.bits_written
    }
}

impl BitWrite for BitWriter {
    fn write_bit(&mut self, bit: bool) {
        self.scratch <<= 1;

        if bit {
            self.scratch |= 1;
        }

        self.scratch_index += 1;
        self.bits_written += 1;

        if self.scratch_index >= 8 {
            self.buffer.push(self.scratch.reverse_bits());
            self.scratch_index = 0;
            self.scratch = 0;
        }
    }

    fn write_byte(&mut self, byte: u8) {
        let mut temp = byte;
        for _ in 0..8 {
            self.write_bit(temp & 1 != 0);
            temp >>= 1;
        }
    }

    // only counters add bits without writing them
    fn count_bits(&mut self, _: u32) {}

    fn is_counter(&self) -> bool {
        false
    }
}

/// Measures how many bits a value would take, without writing them.
pub struct BitCounter {
    bits: u32,
}

impl Default for BitCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitCounter {
    pub fn new() -> Self {
        Self { bits: 0 }
    }

    pub fn bits_needed(&self) -> u32 {
        self.bits
    }
}

impl BitWrite for BitCounter {
    fn write_bit(&mut self, _: bool) {
        self.bits += 1;
    }

    fn write_byte(&mut self, _: u8) {
        self.bits += 8;
    }

    fn count_bits(&mut self, bits: u32) {
        self.bits += bits;
    }

    fn is_counter(&self) -> bool {
        true
    }
}
