use thiserror::Error;

/// Errors that can occur while reading a value from a bit stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Ran out of bits before the value was complete (truncated or malformed packet)
    #[error("Reached the end of the buffer before the value was fully read")]
    UnexpectedEnd,

    /// An enum tag did not match any known variant
    #[error("Invalid tag {tag} for {type_name}")]
    InvalidTag { type_name: &'static str, tag: u64 },

    /// A string payload was not valid UTF-8
    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,

    /// A length or integer exceeded what the target type can hold
    #[error("Value {value} does not fit in {type_name}")]
    Overflow { type_name: &'static str, value: i128 },
}
