//! Frame codec: checksum + length + payload.
//!
//! Encode menulis ke buffer reuse milik caller, decode membaca dari
//! `std::io::Read` apa pun (socket di produksi, `Cursor` di test).
//! Payload dibaca dalam potongan maksimal [`READ_CHUNK`] byte - partial
//! read adalah hal normal untuk stream transport, bukan error.

use std::io::{self, Read};

use super::crc::crc32;
use crate::core::RecvBuffer;
use crate::error::{Result, TransportError};

/// Header size: checksum(4) + length(4).
pub const HEADER_SIZE: usize = 8;

/// Batas per satu read call saat merakit payload.
pub const READ_CHUNK: usize = 1024;

/// Encode satu frame ke `out` (buffer di-clear dulu, alokasi di-reuse).
///
/// Layout: CRC-32 payload (little-endian), panjang payload (little-endian),
/// lalu payload mentah. `length` hanya menghitung payload, bukan header.
pub fn encode_into(out: &mut Vec<u8>, payload: &[u8]) -> Result<()> {
    let length = u32::try_from(payload.len())
        .map_err(|_| TransportError::PayloadTooLarge(payload.len()))?;
    let checksum = crc32(payload);

    out.clear();
    out.try_reserve(HEADER_SIZE + payload.len())
        .map_err(|_| TransportError::Allocation)?;
    out.extend_from_slice(&checksum.to_le_bytes());
    out.extend_from_slice(&length.to_le_bytes());
    out.extend_from_slice(payload);
    Ok(())
}

/// Decode satu frame dari `src` ke `buf`, return panjang payload.
///
/// Membaca header 8 byte, menumbuhkan `buf` persis sebesar payload, lalu
/// merakit payload lewat bounded reads sampai utuh. EOF di tengah frame
/// berarti peer menutup stream ([`TransportError::ConnectionClosed`]);
/// CRC yang tidak cocok berarti korupsi
/// ([`TransportError::ChecksumMismatch`]).
pub fn decode_from<R: Read>(src: &mut R, buf: &mut RecvBuffer) -> Result<usize> {
    let mut header = [0u8; HEADER_SIZE];
    src.read_exact(&mut header).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => TransportError::ConnectionClosed {
            received: 0,
            expected: HEADER_SIZE,
        },
        _ => TransportError::Receive(e),
    })?;

    let declared = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

    let dst = buf.prepare(length)?;
    let mut received = 0;
    while received < length {
        let want = READ_CHUNK.min(length - received);
        match src.read(&mut dst[received..received + want]) {
            Ok(0) => {
                return Err(TransportError::ConnectionClosed {
                    received,
                    expected: length,
                })
            }
            Ok(n) => received += n,
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Receive(e)),
        }
    }

    let computed = crc32(buf.filled());
    if computed != declared {
        return Err(TransportError::ChecksumMismatch { declared, computed });
    }

    Ok(length)
}
