//! CRC-32 checksum untuk frame integrity.
//!
//! Varian bit-reflected dengan polynomial 0xEDB88320, initial accumulator 0,
//! tanpa final XOR. Sender dan receiver harus bit-exact - itu sebabnya
//! implementasi table-driven di bawah dicek silang terhadap referensi
//! bit-at-a-time di test dan bench.

/// Reflected CRC-32 polynomial.
pub const POLYNOMIAL: u32 = 0xEDB8_8320;

/// Lookup table, dibangun saat compile.
const TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Table-driven CRC-32 (init 0, no final XOR).
#[inline]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &byte in data {
        crc = TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

/// Bit-at-a-time reference implementation. Slow, dependency-free, dan
/// definisi kanonik dari checksum di wire format.
pub fn crc32_bitwise(data: &[u8]) -> u32 {
    let mut crc = 0u32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            crc = (crc >> 1) ^ if crc & 1 != 0 { POLYNOMIAL } else { 0 };
        }
    }
    crc
}
