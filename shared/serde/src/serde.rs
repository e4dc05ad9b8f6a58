use crate::{BitCounter, BitReader, BitWrite, SerdeErr};

/// A type that can be written to and read back from a bit stream.
pub trait Serde: Sized + Clone + PartialEq {
    /// Serialize into a bit stream
    fn ser(&self, writer: &mut dyn BitWrite);

    /// Parse from a bit stream
    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr>;

    /// Number of bits this value will occupy once serialized
    fn bit_length(&self) -> u32 {
        let mut counter = BitCounter::new();
        self.ser(&mut counter);
        counter.bits_needed()
    }
}

/// A type whose serialized size never depends on its value.
pub trait ConstBitLength {
    fn const_bit_length() -> u32;
}
