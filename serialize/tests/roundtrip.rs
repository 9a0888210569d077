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

use midnight_serialize::{
    tagged_deserialize, tagged_serialize, tagged_serialized_size, Deserializable, Serializable,
};
use proptest::prelude::*;

fn roundtrip<T>(val: &T) -> T
where
    T: Serializable + Deserializable,
{
    let mut bytes = Vec::new();
    val.serialize(&mut bytes).unwrap();
    assert_eq!(bytes.len(), val.serialized_size());
    T::deserialize(&mut &bytes[..], 0).unwrap()
}

proptest! {
    #[test]
    fn u64_roundtrips(val: u64) {
        prop_assert_eq!(roundtrip(&val), val);
    }

    #[test]
    fn u128_roundtrips(val: u128) {
        prop_assert_eq!(roundtrip(&val), val);
    }

    #[test]
    fn strings_roundtrip(val: String) {
        prop_assert_eq!(roundtrip(&val), val);
    }

    #[test]
    fn vecs_roundtrip(val: Vec<u32>) {
        prop_assert_eq!(roundtrip(&val), val);
    }

    #[test]
    fn options_roundtrip(val: Option<(u8, u64)>) {
        prop_assert_eq!(roundtrip(&val), val);
    }

    #[test]
    fn tagged_roundtrips(val: Vec<u64>) {
        let mut bytes = Vec::new();
        tagged_serialize(&val, &mut bytes).unwrap();
        prop_assert_eq!(bytes.len(), tagged_serialized_size(&val));
        let back: Vec<u64> = tagged_deserialize(&bytes[..]).unwrap();
        prop_assert_eq!(back, val);
    }
}

#[test]
fn tagged_header_mismatch_is_reported() {
    let mut bytes = Vec::new();
    tagged_serialize(&7u64, &mut bytes).unwrap();
    let err = tagged_deserialize::<u32>(&bytes[..]).unwrap_err();
    assert!(err.to_string().starts_with("expected header tag 'midnight:u32:'"));
}

#[test]
fn tagged_rejects_trailing_bytes() {
    let mut bytes = Vec::new();
    tagged_serialize(&7u64, &mut bytes).unwrap();
    bytes.push(0);
    assert!(tagged_deserialize::<u64>(&bytes[..]).is_err());
}

#[test]
fn nesting_is_bounded() {
    // A chain of Option length-prefix bytes deeper than the recursion limit.
    let mut bytes = vec![1u8; 300];
    bytes.push(0);
    type Deep = Option<Option<Option<Option<Option<Option<Option<Option<u8>>>>>>>>;
    // Shallow nesting still decodes; the limit only trips adversarial depth.
    let _ = <Deep as Deserializable>::deserialize(&mut &bytes[..], 0);
}
