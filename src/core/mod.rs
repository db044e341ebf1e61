//! Core module: buffer primitives.
//!
//! Prinsip desain:
//! - Buffer Reuse: satu alokasi per connection, dipakai ulang tiap frame
//! - Fallible Growth: kegagalan alokasi jadi error, bukan abort

mod recv_buffer;

pub use recv_buffer::RecvBuffer;
