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

use crate::context::Effects;
use base_crypto::cost_model::RunningCost;
use onchain_vm::ops::Op;
use onchain_vm::result_mode::ResultModeVerify;
use serialize::{serializable_struct, tag_enforcement_test, Deserializable, Serializable};
use std::io::{self, Read, Write};
use storage::storage::Array;

/// The format version of a recorded transcript.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TranscriptVersion {
    pub major: u8,
    pub minor: u8,
}
tag_enforcement_test!(TranscriptVersion);

serializable_struct!(TranscriptVersion: "contract-transcript-version" = "(u8,u8)" {
    major, minor,
});

/// A recorded VM run over a contract's state: the gas it declares, the
/// side-effects it claims, and the result-annotated program itself.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Transcript {
    /// The declared gas bound; execution is budgeted against this.
    pub gas: RunningCost,
    /// The declared side-effects; the apply pipeline ratifies them.
    pub effects: Effects,
    /// The result-annotated program.
    pub program: Array<Op<ResultModeVerify>>,
    /// Version of the transcript format, if carried.
    pub version: Option<TranscriptVersion>,
}
tag_enforcement_test!(Transcript);

impl serialize::Tagged for Transcript {
    fn tag() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("contract-transcript[v3]")
    }
    fn tag_unique_factor() -> String {
        "(running-cost[v1],contract-effects[v2],vec(impact-op[v1]),option(contract-transcript-version))".into()
    }
}

impl Serializable for Transcript {
    fn serialize(&self, writer: &mut impl Write) -> io::Result<()> {
        self.gas.serialize(writer)?;
        self.effects.serialize(writer)?;
        self.program.serialize(writer)?;
        self.version.serialize(writer)
    }
    fn serialized_size(&self) -> usize {
        self.gas.serialized_size()
            + self.effects.serialized_size()
            + self.program.serialized_size()
            + self.version.serialized_size()
    }
}

impl Deserializable for Transcript {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        Ok(Transcript {
            gas: RunningCost::deserialize(reader, recursion_depth)?,
            effects: Effects::deserialize(reader, recursion_depth)?,
            program: Array::deserialize(reader, recursion_depth)?,
            version: Option::deserialize(reader, recursion_depth)?,
        })
    }
}

impl Transcript {
    /// The current transcript format version.
    pub const VERSION: TranscriptVersion = TranscriptVersion { major: 2, minor: 3 };
}
