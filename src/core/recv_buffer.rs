//! Reusable receive buffer.
//!
//! Satu alokasi per connection, di-reuse untuk setiap frame. Growth policy
//! eksplisit: tumbuh lewat `try_reserve` (gagal = [`TransportError::Allocation`],
//! bukan abort), tidak pernah shrink di antara frame, alokasi dilepas saat
//! close.

use crate::error::{Result, TransportError};

/// Initial capacity - satu read chunk, cukup untuk frame kecil tanpa grow.
const INITIAL_CAPACITY: usize = 1024;

/// Growable payload buffer milik satu connection.
///
/// Isinya hanya valid setelah satu receive selesai sukses; `filled()`
/// mengembalikan persis payload dari frame terakhir.
#[derive(Debug)]
pub struct RecvBuffer {
    data: Vec<u8>,
    len: usize,
}

impl RecvBuffer {
    /// Alokasi buffer baru dengan capacity awal.
    pub fn new() -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(INITIAL_CAPACITY)
            .map_err(|_| TransportError::Allocation)?;
        Ok(Self { data, len: 0 })
    }

    /// Siapkan tepat `len` byte yang writable untuk frame berikutnya.
    ///
    /// Alokasi lama di-reuse; hanya tumbuh kalau frame lebih besar dari
    /// kapasitas yang sudah ada.
    pub fn prepare(&mut self, len: usize) -> Result<&mut [u8]> {
        if len > self.data.len() {
            let extra = len - self.data.len();
            self.data
                .try_reserve(extra)
                .map_err(|_| TransportError::Allocation)?;
            self.data.resize(len, 0);
        }
        self.len = len;
        Ok(&mut self.data[..len])
    }

    /// Payload dari frame yang terakhir dirakit.
    #[inline(always)]
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Kapasitas backing allocation saat ini.
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Lepas backing allocation (dipakai di close path).
    pub fn release(&mut self) {
        self.len = 0;
        self.data = Vec::new();
    }
}
