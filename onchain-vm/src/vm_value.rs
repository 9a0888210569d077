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
use crate::state_value_ext::StateValueExt;
use base_crypto::fab::AlignedValue;
use runtime_state::state::StateValue;
use serialize::Serializable;
use std::fmt::Debug;
use std::ops::BitAnd;
use storage::arena::Sp;

/// Whether a stack value's storage charge has been paid.
///
/// Weak values came in from the context for free and may not be persisted as
/// the result state; strong values were paid for with `pushs` or derive from
/// the charged input state.
#[derive(Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub enum ValueStrength {
    Weak,
    Strong,
}

use ValueStrength::*;

impl BitAnd for ValueStrength {
    type Output = ValueStrength;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Strong, Strong) => Strong,
            _ => Weak,
        }
    }
}

impl Debug for ValueStrength {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Weak => write!(formatter, "#"),
            Strong => Ok(()),
        }
    }
}

/// A value on the VM stack: a state value with its strength.
#[derive(Eq, PartialEq, Clone)]
pub struct VmValue {
    pub strength: ValueStrength,
    pub value: StateValue,
}

impl VmValue {
    pub fn new(strength: ValueStrength, value: StateValue) -> Self {
        VmValue { strength, value }
    }

    pub fn as_cell(&self) -> Result<Sp<AlignedValue>, OnchainProgramError> {
        self.value.as_cell()
    }

    pub(crate) fn as_cell_ref(&self) -> Result<&AlignedValue, OnchainProgramError> {
        self.value.as_cell_ref()
    }

    /// The serialized size of this value as a cell.
    ///
    /// Panics if the underlying value is not a cell.
    pub fn serialized_size_as_cell(&self) -> usize {
        <AlignedValue as Serializable>::serialized_size(
            self.value.as_cell_ref().expect("must be a cell"),
        )
    }

    /// The log size of this value.
    pub fn log_size(&self) -> usize {
        self.value.log_size()
    }
}

impl Debug for VmValue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{:?}{:?}", self.strength, self.value)
    }
}

/// Builds a [`VmValue`] from [`stval!`](runtime_state::stval) syntax, with a
/// leading `#` marking weak values.
#[macro_export]
macro_rules! vmval {
    (# $($val:tt)*) => {
        $crate::vm_value::VmValue {
            strength: $crate::vm_value::ValueStrength::Weak,
            value: runtime_state::stval!($($val)*),
        }
    };
    ($($val:tt)*) => {
        $crate::vm_value::VmValue {
            strength: $crate::vm_value::ValueStrength::Strong,
            value: runtime_state::stval!($($val)*),
        }
    };
}
