//! Iris - Minimal Point-to-Point Framed Transport
//!
//! Arsitektur:
//! - Single Peer: satu koneksi aktif per `Connection`, blocking I/O
//! - Binary Protocol: checksum (4B) + length (4B) + payload, little-endian
//! - CRC-Verified: setiap frame dicek dengan CRC-32 sebelum diserahkan
//! - Buffer Reuse: receive buffer tumbuh sesuai frame, tidak pernah shrink
//!
//! Wire format per frame:
//! ```text
//! ┌──────────────┬──────────────┬─────────────────────┐
//! │ checksum u32 │ length u32   │ payload (length B)  │
//! └──────────────┴──────────────┴─────────────────────┘
//! ```
//!
//! Contoh pemakaian (satu sisi server, satu sisi client):
//! ```no_run
//! use iris::Connection;
//!
//! let mut server = Connection::new()?;
//! server.listen("127.0.0.1", 9999)?;
//!
//! let mut client = Connection::new()?;
//! client.connect("127.0.0.1", 9999)?;
//!
//! let peer = server.accept()?;
//! client.send(b"hello")?;
//! assert_eq!(server.recv()?, b"hello");
//!
//! client.close()?;
//! server.close()?;
//! # Ok::<(), iris::TransportError>(())
//! ```

pub mod core;
pub mod error;
pub mod network;
pub mod protocol;

pub use error::{Result, TransportError};
pub use network::{Connection, State};
