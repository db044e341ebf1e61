//! Error taxonomy untuk transport.
//!
//! Setiap operasi melaporkan kind yang spesifik - caller yang memutuskan
//! apakah sebuah failure retryable. Tidak ada retry internal.

use std::io;
use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Receive buffer tidak bisa dialokasikan.
    #[error("receive buffer allocation failed")]
    Allocation,

    /// Host string bukan alamat IPv4 numerik.
    #[error("invalid address: {0:?}")]
    AddressInvalid(String),

    #[error("socket creation failed: {0}")]
    SocketCreate(#[source] io::Error),

    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("bind failed: {0}")]
    Bind(#[source] io::Error),

    #[error("listen failed: {0}")]
    Listen(#[source] io::Error),

    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("send failed: {0}")]
    Send(#[source] io::Error),

    #[error("receive failed: {0}")]
    Receive(#[source] io::Error),

    /// Checksum di header tidak cocok dengan CRC payload yang diterima.
    /// Indikasi korupsi atau desynchronization protokol.
    #[error("checksum mismatch: declared {declared:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { declared: u32, computed: u32 },

    /// Peer menutup stream sebelum frame lengkap.
    #[error("connection closed mid-frame ({received}/{expected} payload bytes)")]
    ConnectionClosed { received: usize, expected: usize },

    /// Payload melebihi length field 32-bit.
    #[error("payload too large for frame: {0} bytes")]
    PayloadTooLarge(usize),

    /// Tidak ada peer link aktif (belum connect/accept, atau sudah close).
    #[error("no active peer connection")]
    NotConnected,

    /// Tidak ada listening handle (belum listen, atau sudah close).
    #[error("not listening")]
    NotListening,

    /// Operasi tidak valid setelah close. `Closed` bersifat terminal.
    #[error("connection has been closed")]
    InvalidState,

    /// Bounded wait habis tanpa peer/data yang datang.
    #[error("operation timed out")]
    Timeout,

    /// Teardown best-effort selesai, tapi satu step gagal.
    #[error("close failed: {0}")]
    Close(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
