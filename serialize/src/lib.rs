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

#![deny(unreachable_pub)]
#![deny(warnings)]

//! Binary serialization with embedded type tags, as used for all of
//! Midnight's on-chain data. Serialized blobs are prefixed with
//! `midnight:<type-tag>:` by [`tagged_serialize`], and the tag is checked on
//! [`tagged_deserialize`], so that data is only interpreted as the type it
//! was written as.

mod de;
mod int;
mod macros;
mod ser;
mod tagged;

pub use crate::de::{tagged_deserialize, Deserializable, RECURSION_LIMIT};
pub use crate::int::ScaleBigInt;
pub use crate::ser::{
    tagged_serialize, tagged_serialized_size, Serializable, GLOBAL_TAG,
};
pub use crate::tagged::Tagged;

use std::io::Read;

/// Capacity-limited `Vec::with_capacity`, for use when the length is
/// untrusted input.
pub trait VecExt {
    /// As `Vec::with_capacity`, but never pre-allocating more than 32 MiB.
    fn with_bounded_capacity(n: usize) -> Self;
}

impl<T> VecExt for Vec<T> {
    fn with_bounded_capacity(n: usize) -> Self {
        const MEMORY_LIMIT: usize = 1 << 25;
        let alloc_limit = MEMORY_LIMIT / usize::max(1, std::mem::size_of::<T>());
        Self::with_capacity(usize::min(alloc_limit, n))
    }
}

/// Chunked exact reads into a fresh vector, avoiding huge up-front
/// allocations from adversarial length prefixes.
pub trait ReadExt: Read {
    /// Reads exactly `n` bytes, growing the buffer chunk-wise.
    fn read_exact_to_vec(&mut self, n: usize) -> std::io::Result<Vec<u8>> {
        const CHUNK_SIZE: usize = 4096;
        let mut res = Vec::with_capacity(usize::min(n, CHUNK_SIZE));
        let mut len = 0;
        while n > len {
            let new_len = usize::min(n, len + CHUNK_SIZE);
            res.resize(new_len, 0);
            self.read_exact(&mut res[len..])?;
            len = new_len;
        }
        Ok(res)
    }
}

impl<R: Read> ReadExt for R {}
