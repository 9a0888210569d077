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

use crate::contract::ContractAddress;
use crate::hash_newtype;
use crate::transfer::{Recipient, SenderEvidence};
use base_crypto::fab::{Aligned, Alignment, InvalidBuiltinDecode, Value, ValueAtom, ValueSlice};
use base_crypto::hash::{persistent_hash, HashOutput, BLANK_HASH, PERSISTENT_HASH_BYTES};
use base_crypto::repr::{BinaryHashRepr, MemWrite};
use base_crypto::signatures::VerifyingKey;
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use serialize::{serializable_struct, tag_enforcement_test, Deserializable, Serializable};
use std::fmt::{self, Debug, Formatter};
use std::io::{self, Read, Write};
use transient_crypto::curve::Fr;
use transient_crypto::hash::{degrade_to_transient, transient_hash, upgrade_from_transient};
use transient_crypto::repr::{FieldRepr, FromFieldRepr};
use zeroize::Zeroize;

/// The tag revealing a spent coin without revealing which one.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Nullifier(pub HashOutput);
tag_enforcement_test!(Nullifier);
hash_newtype!(Nullifier: "zswap-nullifier[v1]");

impl rand::distributions::Distribution<Nullifier> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Nullifier {
        Nullifier(rng.r#gen())
    }
}

/// The commitment binding a shielded coin to its recipient.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Commitment(pub HashOutput);
tag_enforcement_test!(Commitment);
hash_newtype!(Commitment: "zswap-coin-commitment[v1]");

impl rand::distributions::Distribution<Commitment> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Commitment {
        Commitment(rng.r#gen())
    }
}

/// A coin's uniqueness nonce.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Nonce(pub HashOutput);
tag_enforcement_test!(Nonce);
hash_newtype!(Nonce: "zswap-nonce[v1]");

impl rand::distributions::Distribution<Nonce> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Nonce {
        Nonce(rng.r#gen())
    }
}

/// A shielded coin holder's secret key.
#[derive(Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Zeroize)]
pub struct SecretKey(pub HashOutput);
tag_enforcement_test!(SecretKey);
hash_newtype!(SecretKey: "zswap-coin-secret-key[v1]");

impl Debug for SecretKey {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "<coin secret key>")
    }
}

impl rand::distributions::Distribution<SecretKey> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> SecretKey {
        SecretKey(rng.r#gen())
    }
}

impl SecretKey {
    /// Derives the coin public key for this secret key.
    pub fn public_key(&self) -> PublicKey {
        let mut data = Vec::with_capacity(38);
        self.binary_repr(&mut data);
        data.extend(b"mdn:pk");
        PublicKey(persistent_hash(&data))
    }
}

/// A shielded coin holder's public key.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublicKey(pub HashOutput);
tag_enforcement_test!(PublicKey);
hash_newtype!(PublicKey: "zswap-coin-public-key[v1]");

impl rand::distributions::Distribution<PublicKey> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> PublicKey {
        PublicKey(rng.r#gen())
    }
}

/// The identity of a shielded token.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ShieldedTokenType(pub HashOutput);
tag_enforcement_test!(ShieldedTokenType);
hash_newtype!(ShieldedTokenType: "shielded-token-type[v1]");

impl ShieldedTokenType {
    /// The raw hash underlying this token type.
    pub fn into_inner(&self) -> HashOutput {
        self.0
    }
}

impl rand::distributions::Distribution<ShieldedTokenType> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> ShieldedTokenType {
        ShieldedTokenType(rng.r#gen())
    }
}

/// The identity of an unshielded token.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnshieldedTokenType(pub HashOutput);
tag_enforcement_test!(UnshieldedTokenType);
hash_newtype!(UnshieldedTokenType: "unshielded-token-type[v1]");

impl UnshieldedTokenType {
    /// The raw hash underlying this token type.
    pub fn into_inner(&self) -> HashOutput {
        self.0
    }
}

impl rand::distributions::Distribution<UnshieldedTokenType> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> UnshieldedTokenType {
        UnshieldedTokenType(rng.r#gen())
    }
}

/// The tag byte of [`TokenType::Unshielded`] encodings.
pub const UNSHIELDED_TAG: u8 = 0;
/// The tag byte of [`TokenType::Shielded`] encodings.
pub const SHIELDED_TAG: u8 = 1;
/// The tag byte of [`TokenType::Dust`] encodings.
pub const DUST_TAG: u8 = 2;

/// Any of the three token domains of the ledger.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum TokenType {
    /// A token held in unshielded UTXOs and contract balances.
    Unshielded(UnshieldedTokenType),
    /// A token held in shielded coins.
    Shielded(ShieldedTokenType),
    /// The fee token; generated, never transferred.
    Dust,
}
tag_enforcement_test!(TokenType);

impl serialize::Tagged for TokenType {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("token-type[v1]")
    }
    fn tag_unique_factor() -> String {
        "[unshielded-token-type[v1],shielded-token-type[v1],()]".into()
    }
}

impl Serializable for TokenType {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        match self {
            TokenType::Unshielded(tt) => {
                UNSHIELDED_TAG.serialize(writer)?;
                tt.serialize(writer)
            }
            TokenType::Shielded(tt) => {
                SHIELDED_TAG.serialize(writer)?;
                tt.serialize(writer)
            }
            TokenType::Dust => DUST_TAG.serialize(writer),
        }
    }
    fn serialized_size(&self) -> usize {
        match self {
            TokenType::Dust => 1,
            _ => 1 + PERSISTENT_HASH_BYTES,
        }
    }
}

impl Deserializable for TokenType {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        match u8::deserialize(reader, recursion_depth)? {
            UNSHIELDED_TAG => Ok(TokenType::Unshielded(UnshieldedTokenType::deserialize(
                reader,
                recursion_depth,
            )?)),
            SHIELDED_TAG => Ok(TokenType::Shielded(ShieldedTokenType::deserialize(
                reader,
                recursion_depth,
            )?)),
            DUST_TAG => Ok(TokenType::Dust),
            disc => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Incorrect discriminant, expected 0, 1 or 2, got {}", disc),
            )),
        }
    }
}

impl Aligned for TokenType {
    fn alignment() -> Alignment {
        Alignment::concat([
            &u8::alignment(),
            &<[u8; 32]>::alignment(),
            &<[u8; 32]>::alignment(),
        ])
    }
}

impl From<TokenType> for Value {
    fn from(tt: TokenType) -> Value {
        Value(match tt {
            TokenType::Unshielded(tt) => vec![1u8.into(), tt.into(), ().into()],
            TokenType::Shielded(tt) => vec![0u8.into(), ().into(), tt.into()],
            TokenType::Dust => vec![2u8.into(), ().into(), ().into()],
        })
    }
}

impl TryFrom<&ValueSlice> for TokenType {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueSlice) -> Result<TokenType, InvalidBuiltinDecode> {
        if value.0.len() == 3 {
            let variant: u8 = (&value.0[0]).try_into()?;
            match variant {
                0 => {
                    <()>::try_from(&value.0[1])?;
                    Ok(TokenType::Shielded((&value.0[2]).try_into()?))
                }
                1 => {
                    <()>::try_from(&value.0[2])?;
                    Ok(TokenType::Unshielded((&value.0[1]).try_into()?))
                }
                2 => {
                    <()>::try_from(&value.0[1])?;
                    <()>::try_from(&value.0[2])?;
                    Ok(TokenType::Dust)
                }
                _ => Err(InvalidBuiltinDecode("TokenType")),
            }
        } else {
            Err(InvalidBuiltinDecode("TokenType"))
        }
    }
}

impl Serialize for TokenType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let bytes: Vec<u8> = match self {
            TokenType::Unshielded(data) => std::iter::once(UNSHIELDED_TAG)
                .chain(data.0 .0.iter().copied())
                .collect(),
            TokenType::Shielded(data) => std::iter::once(SHIELDED_TAG)
                .chain(data.0 .0.iter().copied())
                .collect(),
            TokenType::Dust => vec![DUST_TAG],
        };
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for TokenType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TokenTypeVisitor;

        impl serde::de::Visitor<'_> for TokenTypeVisitor {
            type Value = TokenType;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a discriminator and maybe a hash value")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.is_empty() {
                    return Err(E::invalid_length(v.len(), &self));
                }
                let tag = v[0];
                if tag == DUST_TAG {
                    if v.len() != 1 {
                        return Err(E::invalid_length(v.len(), &self));
                    }
                    return Ok(TokenType::Dust);
                }
                if v.len() != 33 {
                    return Err(E::invalid_length(v.len(), &self));
                }
                let mut data = [0u8; 32];
                data.copy_from_slice(&v[1..]);

                match tag {
                    UNSHIELDED_TAG => {
                        Ok(TokenType::Unshielded(UnshieldedTokenType(HashOutput(data))))
                    }
                    SHIELDED_TAG => Ok(TokenType::Shielded(ShieldedTokenType(HashOutput(data)))),
                    _ => Err(E::unknown_variant(&tag.to_string(), &["0", "1", "2"])),
                }
            }
        }

        deserializer.deserialize_bytes(TokenTypeVisitor)
    }
}

impl rand::distributions::Distribution<TokenType> for rand::distributions::Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TokenType {
        let is_shielded: bool = rng.r#gen();
        let value: HashOutput = rng.r#gen();

        if is_shielded {
            TokenType::Shielded(ShieldedTokenType(value))
        } else {
            TokenType::Unshielded(UnshieldedTokenType(value))
        }
    }
}

impl FieldRepr for TokenType {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        match self {
            TokenType::Shielded(raw) => {
                1u8.field_repr(writer);
                raw.0 .0.field_repr(writer);
                BLANK_HASH.0.field_repr(writer);
            }
            TokenType::Unshielded(raw) => {
                0u8.field_repr(writer);
                BLANK_HASH.0.field_repr(writer);
                raw.0 .0.field_repr(writer);
            }
            TokenType::Dust => {
                2u8.field_repr(writer);
                BLANK_HASH.0.field_repr(writer);
                BLANK_HASH.0.field_repr(writer);
            }
        }
    }
    fn field_size(&self) -> usize {
        <[u8; 32] as FromFieldRepr>::FIELD_SIZE * 2 + 1
    }
}

impl BinaryHashRepr for TokenType {
    fn binary_repr<W: MemWrite<u8>>(&self, writer: &mut W) {
        match self {
            TokenType::Unshielded(data) => {
                writer.write(&[UNSHIELDED_TAG]);
                writer.write(&data.0 .0);
            }
            TokenType::Shielded(data) => {
                writer.write(&[SHIELDED_TAG]);
                writer.write(&data.0 .0);
            }
            TokenType::Dust => {
                writer.write(&[DUST_TAG]);
            }
        }
    }

    fn binary_len(&self) -> usize {
        match self {
            TokenType::Dust => 1,
            _ => 1 + PERSISTENT_HASH_BYTES,
        }
    }
}

/// The native token, backing fee generation.
pub const NIGHT: UnshieldedTokenType = UnshieldedTokenType(HashOutput([0u8; 32]));

/// The preimage data of a shielded coin.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Info {
    /// The coin's uniqueness nonce.
    pub nonce: Nonce,
    /// The coin's token type.
    #[serde(rename = "type")]
    pub type_: ShieldedTokenType,
    /// The coin's value, in atomic units.
    pub value: u128,
}
tag_enforcement_test!(Info);

serializable_struct!(Info: "shielded-coin-info[v2]" = "(zswap-nonce[v1],shielded-token-type[v1],u128)" {
    nonce, type_, value,
});

impl BinaryHashRepr for Info {
    fn binary_repr<W: MemWrite<u8>>(&self, writer: &mut W) {
        self.nonce.binary_repr(writer);
        self.type_.0.binary_repr(writer);
        self.value.binary_repr(writer);
    }
    fn binary_len(&self) -> usize {
        self.nonce.binary_len() + self.type_.0.binary_len() + self.value.binary_len()
    }
}

impl FieldRepr for Info {
    fn field_repr<W: MemWrite<Fr>>(&self, writer: &mut W) {
        self.nonce.field_repr(writer);
        self.type_.field_repr(writer);
        self.value.field_repr(writer);
    }
    fn field_size(&self) -> usize {
        self.nonce.field_size() + self.type_.field_size() + 1
    }
}

impl rand::distributions::Distribution<Info> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Info {
        Info {
            nonce: rng.r#gen(),
            type_: rng.r#gen(),
            value: rng.r#gen(),
        }
    }
}

impl Info {
    /// Creates a coin with a fresh random nonce.
    pub fn new<R: Rng + CryptoRng + ?Sized>(
        rng: &mut R,
        value: u128,
        type_: ShieldedTokenType,
    ) -> Self {
        Info {
            nonce: rng.r#gen(),
            value,
            type_,
        }
    }

    /// Derives a successor coin whose nonce evolves deterministically from
    /// this one's.
    pub fn evolve_from(&self, domain_sep: &[u8], value: u128, type_: ShieldedTokenType) -> Self {
        Info {
            nonce: Nonce(upgrade_from_transient(transient_hash(&[
                Fr::from_le_bytes(domain_sep).expect("Domain sep should be in range for field"),
                degrade_to_transient(self.nonce.0),
            ]))),
            value,
            type_,
        }
    }

    /// The coin's commitment towards a recipient.
    pub fn commitment(&self, recipient: &Recipient) -> Commitment {
        let mut data = Vec::with_capacity(119);
        self.binary_repr(&mut data);
        match &recipient {
            Recipient::User(d) => (true, d.0).binary_repr(&mut data),
            Recipient::Contract(d) => (false, d.0).binary_repr(&mut data),
        }
        data.extend(b"mdn:cc");
        Commitment(persistent_hash(&data))
    }

    /// The coin's nullifier against the sender's evidence.
    pub fn nullifier(&self, se: &SenderEvidence) -> Nullifier {
        let mut data = Vec::with_capacity(119);
        self.binary_repr(&mut data);
        match &se {
            SenderEvidence::User(d) => (true, d.0).binary_repr(&mut data),
            SenderEvidence::Contract(d) => (false, d.0).binary_repr(&mut data),
        }
        data.extend(b"mdn:cn");
        Nullifier(persistent_hash(&data))
    }

    /// Qualifies this coin with its commitment tree position.
    pub fn qualify(&self, mt_index: u64) -> QualifiedInfo {
        QualifiedInfo {
            nonce: self.nonce,
            value: self.value,
            type_: self.type_,
            mt_index,
        }
    }
}

/// A [`Info`] additionally qualified with its position in the commitment
/// tree.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedInfo {
    /// The coin's uniqueness nonce.
    pub nonce: Nonce,
    /// The coin's token type.
    #[serde(rename = "type")]
    pub type_: ShieldedTokenType,
    /// The coin's value, in atomic units.
    pub value: u128,
    /// The coin's position in the commitment tree.
    pub mt_index: u64,
}
tag_enforcement_test!(QualifiedInfo);

serializable_struct!(QualifiedInfo: "shielded-qualified-coin-info[v2]" = "(zswap-nonce[v1],shielded-token-type[v1],u128,u64)" {
    nonce, type_, value, mt_index,
});

impl rand::distributions::Distribution<QualifiedInfo> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> QualifiedInfo {
        QualifiedInfo {
            nonce: rng.r#gen(),
            type_: rng.r#gen(),
            value: rng.r#gen(),
            mt_index: rng.r#gen(),
        }
    }
}

impl From<&QualifiedInfo> for Info {
    fn from(qi: &QualifiedInfo) -> Info {
        Info {
            nonce: qi.nonce,
            value: qi.value,
            type_: qi.type_,
        }
    }
}

/// The tag byte of [`PublicAddress::Contract`] encodings.
pub const CONTRACT_TAG: u8 = 0;
/// The tag byte of [`PublicAddress::User`] encodings.
pub const USER_TAG: u8 = 1;

/// An address capable of holding unshielded tokens.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum PublicAddress {
    /// A contract's address.
    Contract(ContractAddress),
    /// A user's address.
    User(UserAddress),
}
tag_enforcement_test!(PublicAddress);

impl serialize::Tagged for PublicAddress {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("public-address[v1]")
    }
    fn tag_unique_factor() -> String {
        "[contract-address[v2],user-address[v1]]".into()
    }
}

impl Serializable for PublicAddress {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        let (tag, raw) = self.into_tagged_tuple();
        tag.serialize(writer)?;
        raw.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        1 + PERSISTENT_HASH_BYTES
    }
}

impl Deserializable for PublicAddress {
    fn deserialize(reader: &mut impl Read, recursion_depth: u32) -> io::Result<Self> {
        let disc = u8::deserialize(reader, recursion_depth)?;
        let raw = HashOutput::deserialize(reader, recursion_depth)?;
        PublicAddress::from_tagged_tuple(disc, raw)
    }
}

impl Serialize for PublicAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let (tag, raw) = self.into_tagged_tuple();
        let mut bytes_with_tag = [0u8; 33];
        bytes_with_tag[0] = tag;
        bytes_with_tag[1..].copy_from_slice(&raw.0);
        serializer.serialize_bytes(&bytes_with_tag)
    }
}

impl<'de> Deserialize<'de> for PublicAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PublicAddressVisitor;

        impl serde::de::Visitor<'_> for PublicAddressVisitor {
            type Value = PublicAddress;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a discriminator and a hash value")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.len() != 33 {
                    return Err(E::invalid_length(v.len(), &self));
                }

                let tag = v[0];
                let mut data = [0u8; 32];
                data.copy_from_slice(&v[1..]);

                PublicAddress::from_tagged_tuple(tag, HashOutput(data))
                    .map_err(|_| E::unknown_variant(&tag.to_string(), &["0", "1"]))
            }
        }

        deserializer.deserialize_bytes(PublicAddressVisitor)
    }
}

impl rand::distributions::Distribution<PublicAddress> for rand::distributions::Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PublicAddress {
        let is_contract: bool = rng.r#gen();
        let value: HashOutput = rng.r#gen();

        if is_contract {
            PublicAddress::Contract(ContractAddress(value))
        } else {
            PublicAddress::User(UserAddress(value))
        }
    }
}

impl Aligned for PublicAddress {
    fn alignment() -> Alignment {
        Alignment::concat([
            &bool::alignment(),
            &<[u8; 32]>::alignment(),
            &<[u8; 32]>::alignment(),
        ])
    }
}

impl From<PublicAddress> for Value {
    fn from(addr: PublicAddress) -> Value {
        Value(match addr {
            PublicAddress::Contract(addr) => vec![true.into(), addr.into(), ().into()],
            PublicAddress::User(addr) => vec![false.into(), ().into(), addr.into()],
        })
    }
}

impl TryFrom<&ValueSlice> for PublicAddress {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueSlice) -> Result<PublicAddress, InvalidBuiltinDecode> {
        if value.0.len() == 3 {
            let is_left: bool = (&value.0[0]).try_into()?;
            if is_left {
                <()>::try_from(&value.0[2])?;
                Ok(PublicAddress::Contract((&value.0[1]).try_into()?))
            } else {
                <()>::try_from(&value.0[1])?;
                Ok(PublicAddress::User((&value.0[2]).try_into()?))
            }
        } else {
            Err(InvalidBuiltinDecode("PublicAddress"))
        }
    }
}

impl PublicAddress {
    /// Splits this address into its tag byte and raw hash.
    pub fn into_tagged_tuple(self) -> (u8, HashOutput) {
        match self {
            PublicAddress::Contract(addr) => (CONTRACT_TAG, addr.0),
            PublicAddress::User(addr) => (USER_TAG, addr.0),
        }
    }

    /// Reassembles an address from its tag byte and raw hash.
    pub fn from_tagged_tuple(disc: u8, hash_output: HashOutput) -> Result<Self, io::Error> {
        Ok(match disc {
            CONTRACT_TAG => PublicAddress::Contract(ContractAddress(hash_output)),
            USER_TAG => PublicAddress::User(UserAddress(hash_output)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Incorrect discriminant, expected 0 or 1, got {}", disc),
            ))?,
        })
    }

    /// The raw hash underlying the address.
    pub fn into_inner(&self) -> &HashOutput {
        match self {
            PublicAddress::Contract(raw) => &raw.0,
            PublicAddress::User(raw) => &raw.0,
        }
    }
}

impl BinaryHashRepr for PublicAddress {
    fn binary_repr<W: MemWrite<u8>>(&self, writer: &mut W) {
        let (tag, raw) = self.into_tagged_tuple();
        writer.write(&[tag]);
        writer.write(&raw.0);
    }
    fn binary_len(&self) -> usize {
        1 + PERSISTENT_HASH_BYTES
    }
}

/// A user's unshielded address; the hash of their verifying key.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserAddress(pub HashOutput);
tag_enforcement_test!(UserAddress);
hash_newtype!(UserAddress: "user-address[v1]");

impl rand::distributions::Distribution<UserAddress> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> UserAddress {
        UserAddress(rng.r#gen())
    }
}

impl From<VerifyingKey> for UserAddress {
    fn from(value: VerifyingKey) -> Self {
        UserAddress(persistent_hash(value.binary_vec().as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn commitments_are_recipient_bound() {
        let mut rng = StdRng::seed_from_u64(0x11);
        let coin = Info::new(&mut rng, 100, rng.r#gen());
        let pk1: PublicKey = rng.r#gen();
        let pk2: PublicKey = rng.r#gen();
        assert_ne!(
            coin.commitment(&Recipient::User(pk1)),
            coin.commitment(&Recipient::User(pk2))
        );
    }

    #[test]
    fn nullifiers_differ_from_commitments() {
        let mut rng = StdRng::seed_from_u64(0x12);
        let coin = Info::new(&mut rng, 5, rng.r#gen());
        let sk: SecretKey = rng.r#gen();
        let nul = coin.nullifier(&SenderEvidence::User(sk));
        let com = coin.commitment(&Recipient::User(sk.public_key()));
        assert_ne!(nul.0, com.0);
    }

    #[test]
    fn evolved_nonces_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(0x13);
        let coin = Info::new(&mut rng, 5, rng.r#gen());
        let a = coin.evolve_from(b"mdn:test", 3, coin.type_);
        let b = coin.evolve_from(b"mdn:test", 3, coin.type_);
        assert_eq!(a, b);
        assert_ne!(a.nonce, coin.nonce);
    }

    #[test]
    fn token_types_roundtrip() {
        let mut rng = StdRng::seed_from_u64(0x14);
        for tt in [
            TokenType::Dust,
            TokenType::Unshielded(NIGHT),
            rng.r#gen::<TokenType>(),
        ] {
            let mut bytes = Vec::new();
            Serializable::serialize(&tt, &mut bytes).unwrap();
            assert_eq!(bytes.len(), tt.serialized_size());
            assert_eq!(TokenType::deserialize(&mut &bytes[..], 0).unwrap(), tt);
        }
    }
}
