//! Protocol Layer: framing + checksum.
//!
//! Prinsip desain:
//! - Flat Binary: header fixed 8 byte, payload opaque
//! - Little-Endian: checksum dan length selalu LE di wire
//! - Bounded Reads: payload dirakit per maksimal 1024 byte

mod crc;
mod frame;

pub use crc::{crc32, crc32_bitwise, POLYNOMIAL};
pub use frame::{decode_from, encode_into, HEADER_SIZE, READ_CHUNK};
