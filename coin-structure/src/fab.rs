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

//! Field-aligned binary conversions for coin data, as contracts see them on
//! the VM stack.

use crate::coin::{Info, QualifiedInfo};
use base_crypto::fab::{Aligned, Alignment, InvalidBuiltinDecode, Value, ValueSlice};

impl Aligned for Info {
    fn alignment() -> Alignment {
        Alignment::concat([
            &crate::coin::Nonce::alignment(),
            &crate::coin::ShieldedTokenType::alignment(),
            &u128::alignment(),
        ])
    }
}

impl From<Info> for Value {
    fn from(coin: Info) -> Value {
        Value(vec![
            coin.nonce.into(),
            coin.type_.into(),
            coin.value.into(),
        ])
    }
}

impl TryFrom<&ValueSlice> for Info {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueSlice) -> Result<Info, InvalidBuiltinDecode> {
        if value.0.len() == 3 {
            Ok(Info {
                nonce: (&value.0[0]).try_into()?,
                type_: (&value.0[1]).try_into()?,
                value: (&value.0[2]).try_into()?,
            })
        } else {
            Err(InvalidBuiltinDecode("Info"))
        }
    }
}

impl Aligned for QualifiedInfo {
    fn alignment() -> Alignment {
        Alignment::concat([&Info::alignment(), &u64::alignment()])
    }
}

impl From<QualifiedInfo> for Value {
    fn from(coin: QualifiedInfo) -> Value {
        Value(vec![
            coin.nonce.into(),
            coin.type_.into(),
            coin.value.into(),
            coin.mt_index.into(),
        ])
    }
}

impl TryFrom<&ValueSlice> for QualifiedInfo {
    type Error = InvalidBuiltinDecode;

    fn try_from(value: &ValueSlice) -> Result<QualifiedInfo, InvalidBuiltinDecode> {
        if value.0.len() == 4 {
            Ok(QualifiedInfo {
                nonce: (&value.0[0]).try_into()?,
                type_: (&value.0[1]).try_into()?,
                value: (&value.0[2]).try_into()?,
                mt_index: (&value.0[3]).try_into()?,
            })
        } else {
            Err(InvalidBuiltinDecode("QualifiedInfo"))
        }
    }
}
