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

use crate::coin::{PublicKey, SecretKey};
use crate::contract::ContractAddress;
use base_crypto::hash::BLANK_HASH;
use base_crypto::repr::MemWrite;
use serialize::{tag_enforcement_test, Deserializable, Serializable};
use std::io::{self, Read, Write};
use transient_crypto::curve::Fr;
use transient_crypto::repr::{FieldRepr, FromFieldRepr};

/// The party receiving a shielded coin, bound into its commitment.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Recipient {
    /// A user, via their coin public key.
    User(PublicKey),
    /// A contract, via its address.
    Contract(ContractAddress),
}
tag_enforcement_test!(Recipient);

impl serialize::Tagged for Recipient {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("recipient[v1]")
    }
    fn tag_unique_factor() -> String {
        "[zswap-coin-public-key[v1],contract-address[v2]]".into()
    }
}

impl Serializable for Recipient {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            Recipient::User(pk) => {
                0u8.serialize(writer)?;
                pk.serialize(writer)
            }
            Recipient::Contract(addr) => {
                1u8.serialize(writer)?;
                addr.serialize(writer)
            }
        }
    }
    fn serialized_size(&self) -> usize {
        1 + 32
    }
}

impl Deserializable for Recipient {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        match u8::deserialize(reader, recursion_depth)? {
            0 => Ok(Recipient::User(PublicKey::deserialize(
                reader,
                recursion_depth,
            )?)),
            1 => Ok(Recipient::Contract(ContractAddress::deserialize(
                reader,
                recursion_depth,
            )?)),
            disc => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Incorrect discriminant, expected 0 or 1, got {}", disc),
            )),
        }
    }
}

impl FieldRepr for Recipient {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        match self {
            Recipient::User(pk) => {
                true.field_repr(writer);
                pk.0 .0.field_repr(writer);
                BLANK_HASH.0.field_repr(writer);
            }
            Recipient::Contract(addr) => {
                false.field_repr(writer);
                BLANK_HASH.0.field_repr(writer);
                addr.0 .0.field_repr(writer);
            }
        }
    }
    fn field_size(&self) -> usize {
        <[u8; 32] as FromFieldRepr>::FIELD_SIZE * 2 + 1
    }
}

/// The evidence a spender presents inside a proof to derive a nullifier.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SenderEvidence {
    /// A user, via their coin secret key.
    User(SecretKey),
    /// A contract, via its address.
    Contract(ContractAddress),
}

impl FieldRepr for SenderEvidence {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        match self {
            SenderEvidence::User(sk) => {
                true.field_repr(writer);
                sk.0 .0.field_repr(writer);
                BLANK_HASH.0.field_repr(writer);
            }
            SenderEvidence::Contract(addr) => {
                false.field_repr(writer);
                BLANK_HASH.0.field_repr(writer);
                addr.0 .0.field_repr(writer);
            }
        }
    }
    fn field_size(&self) -> usize {
        <[u8; 32] as FromFieldRepr>::FIELD_SIZE * 2 + 1
    }
}

impl From<&SenderEvidence> for Recipient {
    fn from(se: &SenderEvidence) -> Recipient {
        use SenderEvidence::*;
        match se {
            User(sk) => Recipient::User(sk.public_key()),
            Contract(addr) => Recipient::Contract(*addr),
        }
    }
}
