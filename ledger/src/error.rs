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

//! The error surface of the transaction pipeline. Apart from infrastructure
//! faults, `well_formed` raises [`MalformedTransaction`] before application,
//! and `apply` reports structured failures through
//! [`TransactionInvalid`](crate::error::TransactionInvalid) inside its
//! result, never panicking. User-visible message strings here are stable and
//! tested against.

use crate::dust::{DustGenerationInfo, DustNullifier, DustRegistration, QualifiedDustOutput};
use crate::structure::{ClaimKind, Utxo, UtxoOutput, UtxoSpend};
use base_crypto::cost_model::CostDuration;
use base_crypto::time::Timestamp;
use coin_structure::coin::{Nullifier, TokenType, UserAddress};
use coin_structure::contract::ContractAddress;
use onchain_runtime::context::Effects;
use onchain_runtime::error::TranscriptRejected;
use runtime_state::state::EntryPointBuf;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use transient_crypto::proofs::VerifyingError;

/// A violation of a global conservation invariant; always a bug if reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The total NIGHT in circulation diverged from the fixed supply.
    NightBalance(u128),
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            InvariantViolation::NightBalance(total) => write!(
                f,
                "night balance invariant violated: circulating total {total} diverges from supply"
            ),
        }
    }
}

impl Error for InvariantViolation {}

/// A replay-protection rejection; these are part of the stable error
/// contract, matched on their `Debug` rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionApplicationError {
    IntentTtlExpired(Timestamp, Timestamp),
    IntentTtlTooFarInFuture(Timestamp, Timestamp),
    IntentAlreadyExists,
}

impl Display for TransactionApplicationError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            TransactionApplicationError::IntentTtlExpired(ttl, current_block) => write!(
                f,
                "intent TTL ({ttl:?}) expired (current block time: {current_block:?})"
            ),
            TransactionApplicationError::IntentTtlTooFarInFuture(ttl, max_allowed) => write!(
                f,
                "intent TTL ({ttl:?}) too far in the future (latest allowed: {max_allowed:?})"
            ),
            TransactionApplicationError::IntentAlreadyExists => {
                write!(f, "intent already exists in the replay protection set")
            }
        }
    }
}

impl Error for TransactionApplicationError {}

/// Why an intent could not be constructed or rebound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentConstructionError {
    /// Binding was requested at the reserved guaranteed segment.
    SegmentZero,
    /// The intent was already bound.
    AlreadyBound,
    /// A fallible offer was keyed at the guaranteed segment.
    FallibleOfferAtSegmentZero,
    /// A bound intent was handed to transaction assembly.
    BoundIntentInParts,
}

impl Display for IntentConstructionError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            IntentConstructionError::SegmentZero => write!(f, "Segment ID cannot be 0"),
            IntentConstructionError::AlreadyBound => write!(f, "Intent cannot be bound."),
            IntentConstructionError::FallibleOfferAtSegmentZero => {
                write!(f, "Segment ID cannot be 0 in a fallible offer")
            }
            IntentConstructionError::BoundIntentInParts => {
                write!(f, "Intent offer must be unproven.")
            }
        }
    }
}

impl Error for IntentConstructionError {}

/// Why fees could not be computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeCalculationError {
    /// A single transaction exceeded whole-block limits.
    BlockLimitExceeded,
    /// The transaction takes disproportionately long to reject for its size.
    OutsideTimeToDismiss {
        time_to_dismiss: CostDuration,
        allowed_time_to_dismiss: CostDuration,
        size: u64,
    },
}

impl Display for FeeCalculationError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            FeeCalculationError::BlockLimitExceeded => write!(
                f,
                "transaction exceeds block limits; it can never be applied"
            ),
            FeeCalculationError::OutsideTimeToDismiss {
                time_to_dismiss,
                allowed_time_to_dismiss,
                size,
            } => write!(
                f,
                "transaction of {size} bytes takes {time_to_dismiss:?} to dismiss, above the allowed {allowed_time_to_dismiss:?}"
            ),
        }
    }
}

impl Error for FeeCalculationError {}

/// The balance direction that failed a checked operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceOperation {
    Addition,
    Subtraction,
}

/// Rejections raised by `well_formed` before a transaction may be applied.
#[derive(Debug)]
#[non_exhaustive]
pub enum MalformedTransaction {
    InvalidNetworkId {
        expected: String,
        found: String,
    },
    Zswap(zswap::error::MalformedOffer),
    IntentSegmentIdCollision(u16),
    IntentAtGuaranteedSegmentId,
    IllegallyDeclaredGuaranteed,
    CantMergeTypes,
    InputsNotSorted(Vec<UtxoSpend>),
    OutputsNotSorted(Vec<UtxoOutput>),
    DuplicateInputs(Vec<UtxoSpend>),
    InputsSignaturesLengthMismatch {
        inputs: Vec<UtxoSpend>,
        signatures: usize,
    },
    IntentSignatureVerificationFailure,
    InvalidSchnorrProof,
    InvalidProof(VerifyingError),
    VerifierKeyNotPresent {
        address: ContractAddress,
        operation: EntryPointBuf,
    },
    BindingCommitmentMismatch,
    Unbalanced(TokenType, i128, u16),
    BalanceOverflow,
    TransactionTooLarge {
        tx_size: usize,
        limit: u64,
    },
    FeeCalculation(FeeCalculationError),
    TransactionApplicationError(TransactionApplicationError),
    InvalidCommitteeSignature {
        address: ContractAddress,
        key_id: u32,
    },
    KeyNotInCommittee {
        address: ContractAddress,
        key_id: u32,
    },
    InvalidDustRegistrationSignature {
        registration: DustRegistration<()>,
    },
    MismatchedSegments {
        declared: u16,
        actual: u16,
    },
    EffectsOutsideTransaction(Box<Effects>),
    Transcript(TranscriptRejected),
}

impl Display for MalformedTransaction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use MalformedTransaction::*;
        match self {
            InvalidNetworkId { expected, found } => write!(
                f,
                "invalid network id: expected '{expected}', found '{found}'"
            ),
            Zswap(err) => err.fmt(f),
            IntentSegmentIdCollision(segment_id) => write!(
                f,
                "multiple intents declared for segment id {segment_id} in merge"
            ),
            IntentAtGuaranteedSegmentId | IllegallyDeclaredGuaranteed => {
                write!(f, "intents are not allowed at segment_id: 0")
            }
            CantMergeTypes => write!(f, "attempted to merge transactions of different types"),
            InputsNotSorted(..) => write!(f, "unshielded offer inputs are not sorted"),
            OutputsNotSorted(..) => write!(f, "unshielded offer outputs are not sorted"),
            DuplicateInputs(..) => write!(f, "unshielded offer contains duplicate inputs"),
            InputsSignaturesLengthMismatch { inputs, signatures } => write!(
                f,
                "unshielded offer has {} inputs but {signatures} signatures",
                inputs.len()
            ),
            IntentSignatureVerificationFailure => {
                write!(f, "signature verification of an intent failed")
            }
            InvalidSchnorrProof => {
                write!(f, "binding commitment's proof of exponent knowledge failed")
            }
            InvalidProof(err) => write!(f, "failed to verify proof: {err}"),
            VerifierKeyNotPresent { address, operation } => write!(
                f,
                "no verifier key present for contract {address:?} operation {operation:?}"
            ),
            BindingCommitmentMismatch => write!(
                f,
                "transaction value commitments do not seal to the binding commitment"
            ),
            Unbalanced(token_type, balance, segment) => write!(
                f,
                "transaction is unbalanced in segment {segment}: token {token_type:?} has balance {balance}"
            ),
            BalanceOverflow => write!(f, "balance calculation overflowed"),
            TransactionTooLarge { tx_size, limit } => {
                write!(f, "transaction of {tx_size} bytes exceeds limit of {limit}")
            }
            FeeCalculation(err) => err.fmt(f),
            TransactionApplicationError(err) => err.fmt(f),
            InvalidCommitteeSignature { address, key_id } => write!(
                f,
                "invalid signature from committee member {key_id} for contract {address:?}"
            ),
            KeyNotInCommittee { address, key_id } => write!(
                f,
                "key id {key_id} is not in the maintenance committee of contract {address:?}"
            ),
            InvalidDustRegistrationSignature { registration } => write!(
                f,
                "signature verification of dust registration {registration:?} failed"
            ),
            MismatchedSegments { declared, actual } => write!(
                f,
                "proof declares segment {declared}, but is used in segment {actual}"
            ),
            EffectsOutsideTransaction(effects) => write!(
                f,
                "declared effects are not covered by the enclosing transaction: {effects:?}"
            ),
            Transcript(err) => err.fmt(f),
        }
    }
}

impl Error for MalformedTransaction {}

impl From<zswap::error::MalformedOffer> for MalformedTransaction {
    fn from(err: zswap::error::MalformedOffer) -> Self {
        MalformedTransaction::Zswap(err)
    }
}

impl From<TranscriptRejected> for MalformedTransaction {
    fn from(err: TranscriptRejected) -> Self {
        MalformedTransaction::Transcript(err)
    }
}

/// Why a (segment of a) transaction failed to apply. Reported in the
/// [`TransactionResult`](crate::semantics::TransactionResult), not raised.
#[derive(Debug)]
#[non_exhaustive]
pub enum TransactionInvalid {
    ReplayProtectionViolation(TransactionApplicationError),
    Zswap(zswap::error::TransactionInvalid),
    InputNotInUtxos(Utxo),
    ContractNotPresent(ContractAddress),
    ContractAlreadyDeployed(ContractAddress),
    EffectsMismatch {
        declared: Box<Effects>,
        actual: Box<Effects>,
    },
    Transcript(TranscriptRejected),
    VerifierKeyNotFound(EntryPointBuf),
    VerifierKeyAlreadyPresent(EntryPointBuf),
    ReplayCounterMismatch(ContractAddress),
    BalanceCheckOutOfBounds {
        token_type: TokenType,
        current_balance: u128,
        operation_value: u128,
        operation: BalanceOperation,
    },
    DustDoubleSpend(DustNullifier),
    DustDeregistrationNotRegistered(UserAddress),
    GenerationInfoAlreadyPresent(Box<DustGenerationInfo>),
    InsufficientClaimable {
        requested: u128,
        claimable: u128,
        claimant: UserAddress,
        kind: ClaimKind,
    },
    RewardTooSmall {
        claimed: u128,
        minimum: u128,
    },
    Invariant(InvariantViolation),
}

impl Display for TransactionInvalid {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use TransactionInvalid::*;
        match self {
            ReplayProtectionViolation(err) => {
                write!(f, "replay protection has been violated: {err:?}")
            }
            Zswap(err) => err.fmt(f),
            InputNotInUtxos(utxo) => write!(f, "input missing from utxos set: {:?}", utxo),
            ContractNotPresent(addr) => write!(f, "call to non-existant contract {:?}", addr),
            ContractAlreadyDeployed(addr) => write!(f, "contract already deployed {:?}", addr),
            EffectsMismatch { declared, actual } => write!(
                f,
                "mismatch between declared effects ({declared:?}) and actual effects ({actual:?})"
            ),
            Transcript(err) => err.fmt(f),
            VerifierKeyNotFound(ep) => {
                write!(f, "no verifier key found for operation {ep:?}")
            }
            VerifierKeyAlreadyPresent(ep) => {
                write!(f, "verifier key already present for operation {ep:?}")
            }
            ReplayCounterMismatch(addr) => write!(
                f,
                "maintenance counter mismatch for contract {addr:?}"
            ),
            BalanceCheckOutOfBounds {
                token_type,
                current_balance,
                operation_value,
                operation,
            } => write!(
                f,
                "contract balance {operation:?} of {operation_value} against {current_balance} out of bounds for token {token_type:?}"
            ),
            DustDoubleSpend(nullifier) => {
                write!(f, "double-spend attempt of dust with nullifier {nullifier:?}")
            }
            DustDeregistrationNotRegistered(addr) => write!(
                f,
                "attempted to deregister dust generation for unregistered address {addr:?}"
            ),
            GenerationInfoAlreadyPresent(info) => write!(
                f,
                "dust generation info already present: {info:?}"
            ),
            InsufficientClaimable {
                requested,
                claimable,
                claimant,
                kind,
            } => write!(
                f,
                "{claimant:?} attempted to claim {requested} from {kind}, with only {claimable} claimable"
            ),
            RewardTooSmall { claimed, minimum } => write!(
                f,
                "claimed reward of {claimed} is below the minimum of {minimum}"
            ),
            Invariant(err) => err.fmt(f),
        }
    }
}

impl Error for TransactionInvalid {}

impl From<zswap::error::TransactionInvalid> for TransactionInvalid {
    fn from(err: zswap::error::TransactionInvalid) -> Self {
        TransactionInvalid::Zswap(err)
    }
}

impl From<TranscriptRejected> for TransactionInvalid {
    fn from(err: TranscriptRejected) -> Self {
        TransactionInvalid::Transcript(err)
    }
}

impl From<InvariantViolation> for TransactionInvalid {
    fn from(err: InvariantViolation) -> Self {
        TransactionInvalid::Invariant(err)
    }
}

impl From<GenerationInfoAlreadyPresentError> for TransactionInvalid {
    fn from(err: GenerationInfoAlreadyPresentError) -> Self {
        TransactionInvalid::GenerationInfoAlreadyPresent(Box::new(err.0))
    }
}

/// Why a system transaction was rejected.
#[derive(Debug)]
pub enum SystemTransactionError {
    IllegalPayout {
        claimed_amount: Option<u128>,
        supply: u128,
        bridged_amount: Option<u128>,
        locked: u128,
    },
    InsufficientTreasuryFunds {
        requested: Option<u128>,
        actual: u128,
        token_type: TokenType,
    },
    IllegalReserveDistribution {
        distributed_amount: u128,
        reserve_supply: u128,
    },
    CommitmentAlreadyPresent(coin_structure::coin::Commitment),
    ReplayProtectionFailure(TransactionApplicationError),
    InvalidBasisPoints(u32),
    Invariant(InvariantViolation),
    GenerationInfo(GenerationInfoAlreadyPresentError),
}

impl Display for SystemTransactionError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use SystemTransactionError::*;
        match self {
            IllegalPayout {
                claimed_amount,
                supply,
                bridged_amount,
                locked,
            } => write!(
                f,
                "illegal payout: claimed {claimed_amount:?} of {supply} rewards, bridged {bridged_amount:?} of {locked} locked"
            ),
            InsufficientTreasuryFunds {
                requested,
                actual,
                token_type,
            } => write!(
                f,
                "insufficient treasury funds: requested {requested:?} of {actual} {token_type:?}"
            ),
            IllegalReserveDistribution {
                distributed_amount,
                reserve_supply,
            } => write!(
                f,
                "illegal reserve distribution of {distributed_amount} from {reserve_supply}"
            ),
            CommitmentAlreadyPresent(cm) => {
                write!(f, "faerie-gold attempt with commitment {:?}", cm)
            }
            ReplayProtectionFailure(e) => write!(f, "Replay protection violation: {e}"),
            InvalidBasisPoints(points) => {
                write!(f, "bridge fee of {points} basis points exceeds 10_000")
            }
            Invariant(err) => err.fmt(f),
            GenerationInfo(err) => err.fmt(f),
        }
    }
}

impl Error for SystemTransactionError {}

impl From<InvariantViolation> for SystemTransactionError {
    fn from(err: InvariantViolation) -> Self {
        SystemTransactionError::Invariant(err)
    }
}

impl From<GenerationInfoAlreadyPresentError> for SystemTransactionError {
    fn from(err: GenerationInfoAlreadyPresentError) -> Self {
        SystemTransactionError::GenerationInfo(err)
    }
}

/// A dust generation record was inserted twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationInfoAlreadyPresentError(pub DustGenerationInfo);

impl Display for GenerationInfoAlreadyPresentError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "dust generation info already present: {:?}", self.0)
    }
}

impl Error for GenerationInfoAlreadyPresentError {}

/// Why a local dust spend could not be assembled.
#[derive(Debug)]
pub enum DustSpendError {
    BackingNightNotFound(QualifiedDustOutput),
    DustUtxoNotTracked(QualifiedDustOutput),
    NotEnoughDust { available: u128, required: u128 },
    MerkleTreeNotRehashed(&'static str),
}

impl Display for DustSpendError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use DustSpendError::*;
        match self {
            BackingNightNotFound(utxo) => {
                write!(f, "backing night not tracked for dust output {utxo:?}")
            }
            DustUtxoNotTracked(utxo) => write!(f, "dust output not tracked: {utxo:?}"),
            NotEnoughDust {
                available,
                required,
            } => write!(
                f,
                "not enough dust: {available} available, {required} required"
            ),
            MerkleTreeNotRehashed(name) => {
                write!(f, "the local {name} tree has pending rehashes")
            }
        }
    }
}

impl Error for DustSpendError {}

/// Why a stream of ledger events could not be replayed locally.
#[derive(Debug)]
pub enum EventReplayError {
    NonLinearInsertion {
        expected_next: u64,
        received: u64,
        tree_name: &'static str,
    },
    InvalidUpdate(transient_crypto::merkle_tree::InvalidUpdate),
}

impl Display for EventReplayError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        use EventReplayError::*;
        match self {
            NonLinearInsertion {
                expected_next,
                received,
                tree_name,
            } => write!(
                f,
                "non-linear insertion into the {tree_name} tree: expected index {expected_next}, received {received}"
            ),
            InvalidUpdate(err) => err.fmt(f),
        }
    }
}

impl Error for EventReplayError {}

impl From<transient_crypto::merkle_tree::InvalidUpdate> for EventReplayError {
    fn from(err: transient_crypto::merkle_tree::InvalidUpdate) -> Self {
        EventReplayError::InvalidUpdate(err)
    }
}

/// A block was declared fuller than its limits allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLimitExceeded;

impl Display for BlockLimitExceeded {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "block limits exceeded")
    }
}

impl Error for BlockLimitExceeded {}

/// Why transcript partitioning failed.
#[derive(Debug)]
pub enum PartitionFailure {
    /// The cross-contract call graph was not a forest.
    NonForest,
    /// Executing a candidate split failed.
    Transcript(TranscriptRejected),
}

impl Display for PartitionFailure {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            PartitionFailure::NonForest => {
                write!(f, "call graph was not a forest; cannot partition")
            }
            PartitionFailure::Transcript(err) => err.fmt(f),
        }
    }
}

impl Error for PartitionFailure {}

impl From<TranscriptRejected> for PartitionFailure {
    fn from(err: TranscriptRejected) -> Self {
        PartitionFailure::Transcript(err)
    }
}
