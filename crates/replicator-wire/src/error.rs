//! Wire-level decode errors.

use thiserror::Error;

/// Failure decoding a value from a [`crate::BinaryReader`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of buffer: needed {needed} more byte(s), {available} available")]
    UnexpectedEof { needed: usize, available: usize },

    #[error("invalid discriminant {discriminant} for {type_name}")]
    InvalidDiscriminant {
        type_name: &'static str,
        discriminant: u32,
    },

    #[error("invalid utf-8 in length-prefixed string")]
    InvalidUtf8,

    #[error("length-prefixed value exceeds configured maximum: {len} > {max}")]
    LengthExceedsMax { len: u32, max: u32 },
}
