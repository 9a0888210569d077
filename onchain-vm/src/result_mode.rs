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

use crate::error::OnchainProgramError;
use base_crypto::fab::AlignedValue;
use runtime_state::state::StateValue;
use serde::Serialize;
use serialize::{Deserializable, Serializable, Tagged};
use std::fmt::Debug;

/// How a program's `popeq` results are treated: either *verified* against
/// results recorded ahead of time, or *gathered* during a dry run.
pub trait ResultMode: Clone + Debug + 'static {
    /// The annotation carried by `popeq` operations in this mode.
    type ReadResult: Eq + PartialEq + Clone + Debug + Serializable + Deserializable + Tagged;
    /// What executing emits for the caller to observe.
    type Event;
    /// Handles a `popeq`'s actual value against its annotation.
    fn process_read(
        result: &Self::ReadResult,
        real: &AlignedValue,
    ) -> Result<Option<Self::Event>, OnchainProgramError>;
    /// Handles a `log`'s argument.
    fn process_log(event: &StateValue) -> Option<Self::Event>;
}

/// Replaying a recorded transcript: each `popeq` carries the claimed result,
/// and execution fails if the stack disagrees.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResultModeVerify;

impl ResultMode for ResultModeVerify {
    type ReadResult = AlignedValue;
    type Event = StateValue;
    fn process_read(
        expected: &Self::ReadResult,
        actual: &AlignedValue,
    ) -> Result<Option<Self::Event>, OnchainProgramError> {
        if expected != actual {
            Err(OnchainProgramError::ReadMismatch {
                expected: expected.clone(),
                actual: actual.clone(),
            })
        } else {
            Ok(None)
        }
    }
    fn process_log(event: &StateValue) -> Option<Self::Event> {
        Some(event.clone())
    }
}

/// An observation from a gather-mode run.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "tag", content = "content")]
pub enum GatherEvent {
    /// A value read out with `popeq`.
    Read(AlignedValue),
    /// A value logged with `log`.
    Log(StateValue),
}

/// Recording a program's reads during construction; `popeq`s carry no
/// annotation and their actual values are emitted as events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResultModeGather;

impl ResultMode for ResultModeGather {
    type ReadResult = ();
    type Event = GatherEvent;
    fn process_read(
        (): &Self::ReadResult,
        real: &AlignedValue,
    ) -> Result<Option<Self::Event>, OnchainProgramError> {
        Ok(Some(GatherEvent::Read(real.clone())))
    }
    fn process_log(event: &StateValue) -> Option<Self::Event> {
        Some(GatherEvent::Log(event.clone()))
    }
}
