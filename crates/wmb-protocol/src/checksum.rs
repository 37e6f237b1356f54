//! CRC-16 integrity check.
//!
//! The device uses the non-reflected CRC-16 with polynomial `0x8005`,
//! initial value `0x800D` and no final XOR (catalogued as CRC-16/DDS-110,
//! check value `0x9ECF`). The trailer is appended big-endian.

use crc::{Crc, CRC_16_DDS_110};

use crate::constants::CHECKSUM_SIZE;
use crate::error::ProtocolError;

static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_DDS_110);

/// Compute the checksum of `data`.
pub fn compute(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

/// Append the big-endian checksum of `buf` to `buf`.
pub fn append(buf: &mut Vec<u8>) {
    let crc = compute(buf);
    buf.extend_from_slice(&crc.to_be_bytes());
}

/// Verify the trailing checksum of `frame` and return the bytes it covers.
pub fn verify(frame: &[u8]) -> Result<&[u8], ProtocolError> {
    if frame.len() < CHECKSUM_SIZE {
        return Err(ProtocolError::FrameTooShort {
            expected: CHECKSUM_SIZE,
            actual: frame.len(),
        });
    }

    let (body, trailer) = frame.split_at(frame.len() - CHECKSUM_SIZE);
    let received = u16::from_be_bytes([trailer[0], trailer[1]]);
    let computed = compute(body);

    if computed != received {
        return Err(ProtocolError::ChecksumMismatch { computed, received });
    }

    Ok(body)
}
