//! Network Layer: connection lifecycle.
//!
//! Blocking I/O, satu peer aktif per connection. Bounded waits
//! (`accept_timeout`/`recv_timeout`) bersifat additive - default-nya tetap
//! blocking tanpa batas.

mod connection;

pub use connection::{Connection, State};
