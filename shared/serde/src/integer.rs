use crate::{BitReader, BitWrite, ConstBitLength, Serde, SerdeErr};

pub type UnsignedInteger<const BITS: u8> = SerdeInteger<false, false, BITS>;
pub type SignedInteger<const BITS: u8> = SerdeInteger<true, false, BITS>;
pub type UnsignedVariableInteger<const BITS: u8> = SerdeInteger<false, true, BITS>;
pub type SignedVariableInteger<const BITS: u8> = SerdeInteger<true, true, BITS>;

/// An integer packed into `BITS` bits. Variable integers are written in
/// `BITS`-sized chunks, each preceded by a continuation bit.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub struct SerdeInteger<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> {
    pub(crate) inner: i128,
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> SerdeInteger<SIGNED, VARIABLE, BITS> {
    /// Returns an error when `value` cannot be represented with this encoding.
    pub fn try_new<T: Into<i128>>(value: T) -> Result<Self, SerdeErr> {
        let value: i128 = value.into();
        if BITS == 0 || BITS > 127 || (!SIGNED && value < 0) {
            return Err(SerdeErr::Overflow {
                type_name: "SerdeInteger",
                value,
            });
        }
        if !VARIABLE {
            let max_value: i128 = 2_i128.pow(BITS as u32);
            if value >= max_value || (SIGNED && value <= -max_value) {
                return Err(SerdeErr::Overflow {
                    type_name: "SerdeInteger",
                    value,
                });
            }
        }
        Ok(Self { inner: value })
    }

    pub fn get(&self) -> i128 {
        self.inner
    }

    /// Converts into a concrete integer type, failing if the value does not fit.
    pub fn to<T: TryFrom<i128>>(&self) -> Result<T, SerdeErr> {
        T::try_from(self.inner).map_err(|_| SerdeErr::Overflow {
            type_name: std::any::type_name::<T>(),
            value: self.inner,
        })
    }
}

impl<const SIGNED: bool, const VARIABLE: bool, const BITS: u8> Serde
    for SerdeInteger<SIGNED, VARIABLE, BITS>
{
    fn ser(&self, writer: &mut dyn BitWrite) {
        let negative = self.inner < 0;
        let mut value: u128 = self.inner.unsigned_abs();

        if SIGNED {
            writer.write_bit(negative);
        }

        if VARIABLE {
            loop {
                let proceed = value >= 2_u128.pow(BITS as u32);
                writer.write_bit(proceed);
                for _ in 0..BITS {
                    writer.write_bit(value & 1 != 0);
                    value >>= 1;
                }
                if !proceed {
                    return;
                }
            }
        } else {
            for _ in 0..BITS {
                writer.write_bit(value & 1 != 0);
                value >>= 1;
            }
        }
    }

    fn de(reader: &mut BitReader) -> Result<Self, SerdeErr> {
        let mut negative = false;
        if SIGNED {
            negative = reader.read_bit()?;
        }

        let mut output: u128 = 0;
        let mut shift: u32 = 0;

        if VARIABLE {
            loop {
                let proceed = reader.read_bit()?;
                for _ in 0..BITS {
                    if shift >= 127 {
                        return Err(SerdeErr::Overflow {
                            type_name: "SerdeInteger",
                            value: output as i128,
                        });
                    }
                    if reader.read_bit()? {
                        output |= 1 << shift;
                    }
                    shift += 1;
                }
                if !proceed {
                    break;
                }
            }
        } else {
            for _ in 0..BITS {
                if reader.read_bit()? {
                    output |= 1 << shift;
                }
                shift += 1;
            }
        }

        let magnitude = output as i128;
        Ok(Self {
            inner: if negative { -magnitude } else { magnitude },
        })
    }
}

impl<const SIGNED: bool, const BITS: u8> ConstBitLength for SerdeInteger<SIGNED, false, BITS> {
    fn const_bit_length() -> u32 {
        let mut output = BITS as u32;
        if SIGNED {
            output += 1;
        }
        output
    }
}
