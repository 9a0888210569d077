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

//! This crate implements transaction assembly and semantics for Midnight.

#[macro_use]
extern crate tracing;

pub mod construct;
pub mod dust;
pub mod error;
pub mod events;
pub mod semantics;
pub mod structure;
pub mod verify;

#[cfg(any(test, feature = "test-utilities"))]
pub mod test_utilities;
