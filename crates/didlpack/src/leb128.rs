//! # LEB128
//!
//! Unsigned and signed little-endian base-128 integers, in both machine-width
//! and arbitrary-precision flavours. Each byte carries 7 data bits; the high
//! bit marks continuation.
//!
//! Decoders take the remaining input and return `(value, bytes_consumed)`.

use num_bigint::BigInt;
use num_bigint::BigUint;
use num_bigint::Sign;

use crate::error::Error;
use crate::error::Result;

/// Appends `v` as unsigned LEB128.
pub fn encode_u64(mut v: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Appends `v` as signed LEB128.
pub fn encode_i64(mut v: i64, out: &mut Vec<u8>) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        let done = (v == 0 && byte & 0x40 == 0) || (v == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn decode_u64(input: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in input.iter().enumerate() {
        let low = (byte & 0x7f) as u64;
        if shift >= 64 || (shift == 63 && low > 1) {
            return Err(Error::Leb128Overflow);
        }
        result |= low << shift;
        if byte & 0x80 == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }
    Err(Error::UnexpectedEnd)
}

pub fn decode_i64(input: &[u8]) -> Result<(i64, usize)> {
    let mut result: i64 = 0;
    let mut shift = 0u32;
    for (i, &byte) in input.iter().enumerate() {
        let low = (byte & 0x7f) as i64;
        if shift >= 64 || (shift == 63 && low != 0 && low != 0x7f) {
            return Err(Error::Leb128Overflow);
        }
        result |= low << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                result |= -1i64 << shift;
            }
            return Ok((result, i + 1));
        }
    }
    Err(Error::UnexpectedEnd)
}

/// Appends an arbitrary-precision natural as unsigned LEB128.
pub fn encode_nat(v: &BigUint, out: &mut Vec<u8>) {
    let bytes = v.to_bytes_le();
    let bits = v.bits().max(1);
    let groups = bits.div_ceil(7);
    for g in 0..groups {
        let mut byte = 0u8;
        for b in 0..7 {
            if bit_at(&bytes, g * 7 + b, false) {
                byte |= 1 << b;
            }
        }
        if g + 1 < groups {
            byte |= 0x80;
        }
        out.push(byte);
    }
}

/// Appends an arbitrary-precision integer as signed LEB128.
pub fn encode_int(v: &BigInt, out: &mut Vec<u8>) {
    let bytes = v.to_signed_bytes_le();
    let negative = v.sign() == Sign::Minus;
    let total = bytes.len() as u64 * 8;
    let mut g = 0u64;
    loop {
        let mut byte = 0u8;
        for b in 0..7 {
            if bit_at(&bytes, g * 7 + b, negative) {
                byte |= 1 << b;
            }
        }
        // Done once bit 6 of this group and everything above it is sign.
        let done = (g * 7 + 6..total.max(g * 7 + 7)).all(|i| bit_at(&bytes, i, negative) == negative);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
        g += 1;
    }
}

pub fn decode_nat(input: &[u8]) -> Result<(BigUint, usize)> {
    let (bytes, used) = gather(input, false)?;
    Ok((BigUint::from_bytes_le(&bytes), used))
}

pub fn decode_int(input: &[u8]) -> Result<(BigInt, usize)> {
    let (bytes, used) = gather(input, true)?;
    Ok((BigInt::from_signed_bytes_le(&bytes), used))
}

/// Packs the 7-bit groups of one LEB128 number into little-endian bytes.
/// When `signed`, the final partial byte is sign-extended from bit 6 of the
/// last group.
fn gather(input: &[u8], signed: bool) -> Result<(Vec<u8>, usize)> {
    let mut bytes = Vec::new();
    let mut acc: u32 = 0;
    let mut acc_bits = 0u32;
    for (i, &byte) in input.iter().enumerate() {
        acc |= ((byte & 0x7f) as u32) << acc_bits;
        acc_bits += 7;
        while acc_bits >= 8 {
            bytes.push(acc as u8);
            acc >>= 8;
            acc_bits -= 8;
        }
        if byte & 0x80 == 0 {
            if acc_bits > 0 {
                if signed && byte & 0x40 != 0 {
                    acc |= 0xff << acc_bits;
                }
                bytes.push(acc as u8);
            }
            return Ok((bytes, i + 1));
        }
    }
    Err(Error::UnexpectedEnd)
}

fn bit_at(bytes: &[u8], bit: u64, sign: bool) -> bool {
    let idx = (bit / 8) as usize;
    match bytes.get(idx) {
        Some(b) => (b >> (bit % 8)) & 1 == 1,
        None => sign,
    }
}
