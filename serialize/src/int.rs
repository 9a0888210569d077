// This file is part of midnight-ledger.
// Copyright (C) 2025 Midnight Foundation
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integer wire formats. Signed and small unsigned integers are fixed-width
//! little-endian; `u32`/`u64`/`u128` use a SCALE-style compact encoding via
//! [`ScaleBigInt`], which rejects non-canonical forms.

use crate::de::Deserializable;
use crate::ser::Serializable;
use crate::tagged::Tagged;
use std::io::Read;

macro_rules! via_le_bytes {
    ($ty:ty, $len:expr) => {
        impl Serializable for $ty {
            fn serialize(&self, writer: &mut impl std::io::Write) -> std::io::Result<()> {
                writer.write_all(&self.to_le_bytes()[..])
            }
            fn serialized_size(&self) -> usize {
                $len
            }
        }

        impl Deserializable for $ty {
            fn deserialize(reader: &mut impl Read, _recursion_depth: u32) -> std::io::Result<Self> {
                let mut buf = [0u8; $len];
                reader.read_exact(&mut buf[..])?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        }

        impl Tagged for $ty {
            fn tag() -> std::borrow::Cow<'static, str> {
                std::borrow::Cow::Borrowed(stringify!($ty))
            }
            fn tag_unique_factor() -> String {
                stringify!($ty).into()
            }
        }
    };
}

macro_rules! via_scale {
    ($ty:ty, $n:expr) => {
        impl Serializable for $ty {
            fn serialize(&self, writer: &mut impl std::io::Write) -> std::io::Result<()> {
                ScaleBigInt::from(*self).serialize(writer)
            }
            fn serialized_size(&self) -> usize {
                ScaleBigInt::from(*self).serialized_size()
            }
        }

        impl Deserializable for $ty {
            fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> std::io::Result<Self> {
                <$ty>::try_from(ScaleBigInt::deserialize(reader, recursion_depth)?)
            }
        }

        impl From<$ty> for ScaleBigInt {
            fn from(val: $ty) -> ScaleBigInt {
                let mut res = ScaleBigInt([0u8; SCALE_MAX_BYTES]);
                res.0[..$n].copy_from_slice(&val.to_le_bytes()[..]);
                res
            }
        }

        impl TryFrom<ScaleBigInt> for $ty {
            type Error = std::io::Error;
            fn try_from(val: ScaleBigInt) -> std::io::Result<$ty> {
                if val.0[$n..].iter().any(|b| *b != 0) {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        concat!("out of range for ", stringify!($ty)),
                    ));
                }
                Ok(<$ty>::from_le_bytes(
                    val.0[..$n]
                        .try_into()
                        .expect("slice of known size must coerce to array"),
                ))
            }
        }

        impl Tagged for $ty {
            fn tag() -> std::borrow::Cow<'static, str> {
                std::borrow::Cow::Borrowed(stringify!($ty))
            }
            fn tag_unique_factor() -> String {
                stringify!($ty).into()
            }
        }
    };
}

via_le_bytes!(u8, 1);
via_le_bytes!(u16, 2);
via_le_bytes!(i8, 1);
via_le_bytes!(i16, 2);
via_le_bytes!(i32, 4);
via_le_bytes!(i64, 8);
via_le_bytes!(i128, 16);
via_scale!(u32, 4);
via_scale!(u64, 8);
via_scale!(u128, 16);

const SCALE_MAX_BYTES: usize = 67;

/// A little-endian big integer in the compact SCALE wire format. Large enough
/// for any primitive the ledger uses, including 64-byte field encodings.
pub struct ScaleBigInt(pub [u8; SCALE_MAX_BYTES]);

impl Default for ScaleBigInt {
    fn default() -> Self {
        ScaleBigInt([0u8; SCALE_MAX_BYTES])
    }
}

const SCALE_ONE_BYTE_MARKER: u8 = 0b00;
const SCALE_TWO_BYTE_MARKER: u8 = 0b01;
const SCALE_FOUR_BYTE_MARKER: u8 = 0b10;
const SCALE_N_BYTE_MARKER: u8 = 0b11;

impl Serializable for ScaleBigInt {
    fn serialize(&self, writer: &mut impl std::io::Write) -> std::io::Result<()> {
        let top2bits = |b| (b & 0b1100_0000) >> 6;
        let bot6bits = |b| (b & 0b0011_1111) << 2;
        match self.serialized_size() {
            1 => writer.write_all(&[bot6bits(self.0[0]) | SCALE_ONE_BYTE_MARKER]),
            2 => {
                let b0 = bot6bits(self.0[0]) | SCALE_TWO_BYTE_MARKER;
                let b1 = top2bits(self.0[0]) | bot6bits(self.0[1]);
                writer.write_all(&[b0, b1])
            }
            4 => {
                let b0 = bot6bits(self.0[0]) | SCALE_FOUR_BYTE_MARKER;
                let b1 = top2bits(self.0[0]) | bot6bits(self.0[1]);
                let b2 = top2bits(self.0[1]) | bot6bits(self.0[2]);
                let b3 = top2bits(self.0[2]) | bot6bits(self.0[3]);
                writer.write_all(&[b0, b1, b2, b3])
            }
            n => {
                writer.write_all(&[(n as u8 - 5) << 2 | SCALE_N_BYTE_MARKER])?;
                writer.write_all(&self.0[..n - 1])
            }
        }
    }
    fn serialized_size(&self) -> usize {
        let trailing_zeros = self.0.iter().rev().take_while(|x| **x == 0).count();
        let occupied = SCALE_MAX_BYTES - trailing_zeros;
        let can_squeeze = self.0[occupied.saturating_sub(1)] < 64;
        match (occupied, can_squeeze) {
            (0, _) | (1, true) => 1,
            (1, false) | (2, true) => 2,
            (2, false) | (3, _) | (4, true) => 4,
            (n, _) => n + 1,
        }
    }
}

impl Deserializable for ScaleBigInt {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> std::io::Result<Self> {
        let first = u8::deserialize(reader, recursion_depth)?;
        let mut res = ScaleBigInt([0u8; SCALE_MAX_BYTES]);
        let top6bits = |b| (b & 0b1111_1100) >> 2;
        let bot2bits = |b| (b & 0b0000_0011) << 6;
        let non_canonical = || {
            std::io::Error::new(std::io::ErrorKind::InvalidData, "non-canonical scale encoding")
        };
        match first & 0b11 {
            SCALE_ONE_BYTE_MARKER => res.0[0] = top6bits(first),
            SCALE_TWO_BYTE_MARKER => {
                let second = u8::deserialize(reader, recursion_depth)?;
                if second == 0 {
                    return Err(non_canonical());
                }
                res.0[0] = top6bits(first) | bot2bits(second);
                res.0[1] = top6bits(second);
            }
            SCALE_FOUR_BYTE_MARKER => {
                let second = u8::deserialize(reader, recursion_depth)?;
                let third = u8::deserialize(reader, recursion_depth)?;
                let fourth = u8::deserialize(reader, recursion_depth)?;
                if third == 0 && fourth == 0 {
                    return Err(non_canonical());
                }
                res.0[0] = top6bits(first) | bot2bits(second);
                res.0[1] = top6bits(second) | bot2bits(third);
                res.0[2] = top6bits(third) | bot2bits(fourth);
                res.0[3] = top6bits(fourth);
            }
            SCALE_N_BYTE_MARKER => {
                let n = top6bits(first) as usize + 4;
                reader.read_exact(&mut res.0[..n])?;
                if res.0[n - 1] == 0 {
                    return Err(non_canonical());
                }
            }
            _ => unreachable!(),
        }
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T>(val: T)
    where
        T: Serializable + Deserializable + PartialEq + std::fmt::Debug + Copy,
    {
        let mut bytes = Vec::new();
        val.serialize(&mut bytes).unwrap();
        assert_eq!(bytes.len(), val.serialized_size());
        let back = T::deserialize(&mut &bytes[..], 0).unwrap();
        assert_eq!(back, val);
    }

    #[test]
    fn scale_roundtrips() {
        for val in [0u64, 1, 63, 64, 0x3fff, 0x4000, u32::MAX as u64, u64::MAX] {
            roundtrip(val);
        }
        roundtrip(u128::MAX);
        roundtrip(u32::MAX);
    }

    #[test]
    fn scale_rejects_non_canonical() {
        // Two-byte marker encoding a value that fits one byte.
        let bytes = [SCALE_TWO_BYTE_MARKER | (1 << 2), 0u8];
        assert!(u64::deserialize(&mut &bytes[..], 0).is_err());
    }

    #[test]
    fn u64_out_of_range_for_u32() {
        let mut bytes = Vec::new();
        (u32::MAX as u64 + 1).serialize(&mut bytes).unwrap();
        assert!(u32::deserialize(&mut &bytes[..], 0).is_err());
    }
}
