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

//! The scalar types of the fee model: modeled durations, resource vectors,
//! their normalized forms against block limits, and deterministic
//! fixed-point arithmetic for pricing.

use ethnum::I256;
use serde::{Deserialize, Serialize};
use serialize::tag_enforcement_test;
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// A modeled duration, in integer picoseconds.
#[derive(
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Copy,
    Clone,
    Hash,
    Default,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct CostDuration(u64);
tag_enforcement_test!(CostDuration);

serialize::serializable_newtype!(CostDuration: "cost-duration[v1]" = "u64");

impl Debug for CostDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ps", self.0)
    }
}

impl CostDuration {
    /// No cost duration
    pub const ZERO: CostDuration = CostDuration(0);
    /// A second in [`CostDuration`] representation.
    pub const SECOND: CostDuration = CostDuration(1_000_000_000_000);

    /// Initializes this cost duration measurement from raw picoseconds
    pub const fn from_picoseconds(picoseconds: u64) -> CostDuration {
        CostDuration(picoseconds)
    }

    /// The raw picosecond count of this cost duration measurement
    pub const fn into_picoseconds(self) -> u64 {
        self.0
    }

    /// The larger of two durations.
    pub fn max(a: CostDuration, b: CostDuration) -> CostDuration {
        CostDuration(u64::max(a.0, b.0))
    }

    /// Converts into multiples of a base duration, rounding down.
    pub fn into_atomic_units(self, base: u64) -> u64 {
        self.0 / u64::max(1, base)
    }
}

impl Sum for CostDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(CostDuration::ZERO, |a, b| a + b)
    }
}

impl Add for CostDuration {
    type Output = CostDuration;
    fn add(self, rhs: Self) -> CostDuration {
        CostDuration(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for CostDuration {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<u64> for CostDuration {
    type Output = CostDuration;
    fn mul(self, rhs: u64) -> CostDuration {
        CostDuration(self.0.saturating_mul(rhs))
    }
}

impl Mul<usize> for CostDuration {
    type Output = CostDuration;
    fn mul(self, rhs: usize) -> CostDuration {
        self * (rhs as u64)
    }
}

impl Mul<CostDuration> for u64 {
    type Output = CostDuration;
    fn mul(self, rhs: CostDuration) -> CostDuration {
        rhs * self
    }
}

impl Mul<CostDuration> for usize {
    type Output = CostDuration;
    fn mul(self, rhs: CostDuration) -> CostDuration {
        rhs * self
    }
}

impl Mul<f64> for CostDuration {
    type Output = CostDuration;
    fn mul(self, rhs: f64) -> CostDuration {
        CostDuration((self.0 as f64 * rhs).ceil() as u64)
    }
}

impl Div<u64> for CostDuration {
    type Output = CostDuration;
    fn div(self, rhs: u64) -> CostDuration {
        CostDuration(self.0 / u64::max(1, rhs))
    }
}

impl Div for CostDuration {
    type Output = FixedPoint;
    fn div(self, rhs: Self) -> FixedPoint {
        FixedPoint::from_u64_div(self.0, rhs.0)
    }
}

/// The cost during computation, tracking read time, compute time, and bytes
/// written and deleted.
#[derive(
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Copy,
    Clone,
    Default,
    Serialize,
    Deserialize,
)]
pub struct RunningCost {
    /// The time spent reading according to the model
    #[serde(rename = "readTime")]
    pub read_time: CostDuration,
    /// The time spent computing according to the model
    #[serde(rename = "computeTime")]
    pub compute_time: CostDuration,
    /// The bytes written persistently
    #[serde(rename = "bytesWritten")]
    pub bytes_written: u64,
    /// The bytes deleted from persistent storage
    #[serde(rename = "bytesDeleted")]
    pub bytes_deleted: u64,
}
tag_enforcement_test!(RunningCost);

serialize::serializable_struct!(RunningCost: "running-cost[v1]" = "(u64,u64,u64,u64)" {
    read_time, compute_time, bytes_written, bytes_deleted,
});

impl RunningCost {
    /// The empty cost
    pub const ZERO: RunningCost = RunningCost {
        read_time: CostDuration::ZERO,
        compute_time: CostDuration::ZERO,
        bytes_written: 0,
        bytes_deleted: 0,
    };

    /// A pure compute-time cost
    pub const fn compute(time: CostDuration) -> RunningCost {
        RunningCost {
            read_time: CostDuration::ZERO,
            compute_time: time,
            bytes_written: 0,
            bytes_deleted: 0,
        }
    }

    /// The longest time dimension of this cost
    pub fn max_time(&self) -> CostDuration {
        CostDuration::max(self.read_time, self.compute_time)
    }
}

impl Add for RunningCost {
    type Output = RunningCost;
    fn add(self, rhs: Self) -> RunningCost {
        RunningCost {
            read_time: self.read_time + rhs.read_time,
            compute_time: self.compute_time + rhs.compute_time,
            bytes_written: self.bytes_written.saturating_add(rhs.bytes_written),
            bytes_deleted: self.bytes_deleted.saturating_add(rhs.bytes_deleted),
        }
    }
}

impl AddAssign for RunningCost {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<u64> for RunningCost {
    type Output = RunningCost;
    fn mul(self, rhs: u64) -> RunningCost {
        RunningCost {
            read_time: self.read_time * rhs,
            compute_time: self.compute_time * rhs,
            bytes_written: self.bytes_written.saturating_mul(rhs),
            bytes_deleted: self.bytes_deleted.saturating_mul(rhs),
        }
    }
}

impl Mul<usize> for RunningCost {
    type Output = RunningCost;
    fn mul(self, rhs: usize) -> RunningCost {
        self * (rhs as u64)
    }
}

impl Mul<f64> for RunningCost {
    type Output = RunningCost;
    fn mul(self, rhs: f64) -> RunningCost {
        RunningCost {
            read_time: self.read_time * rhs,
            compute_time: self.compute_time * rhs,
            bytes_written: (self.bytes_written as f64 * rhs).ceil() as u64,
            bytes_deleted: (self.bytes_deleted as f64 * rhs).ceil() as u64,
        }
    }
}

impl From<RunningCost> for SyntheticCost {
    fn from(running: RunningCost) -> SyntheticCost {
        SyntheticCost {
            read_time: running.read_time,
            compute_time: running.compute_time,
            block_usage: 0,
            bytes_written: running.bytes_written.saturating_sub(running.bytes_deleted),
            bytes_churned: running.bytes_written,
        }
    }
}

/// The synthetic (modeled) cost of execution, typically over a transaction or
/// block.
#[derive(
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Copy,
    Clone,
    Default,
    Serialize,
    Deserialize,
)]
pub struct SyntheticCost {
    /// The time spent in IO reads
    #[serde(rename = "readTime")]
    pub read_time: CostDuration,
    /// The time spent in single-threaded compute
    #[serde(rename = "computeTime")]
    pub compute_time: CostDuration,
    /// The bytes used of block size capacity
    #[serde(rename = "blockUsage")]
    pub block_usage: u64,
    /// The net bytes written persistently to disk
    #[serde(rename = "bytesWritten")]
    pub bytes_written: u64,
    /// The bytes written temporarily or overwritten
    #[serde(rename = "bytesChurned")]
    pub bytes_churned: u64,
}
tag_enforcement_test!(SyntheticCost);

serialize::serializable_struct!(SyntheticCost: "synthetic-cost[v1]" = "(u64,u64,u64,u64,u64)" {
    read_time, compute_time, block_usage, bytes_written, bytes_churned,
});

impl SyntheticCost {
    /// The empty cost
    pub const ZERO: SyntheticCost = SyntheticCost {
        read_time: CostDuration::ZERO,
        compute_time: CostDuration::ZERO,
        block_usage: 0,
        bytes_written: 0,
        bytes_churned: 0,
    };

    /// The longest time spent in this cost
    pub fn max_time(&self) -> CostDuration {
        CostDuration::max(self.read_time, self.compute_time)
    }

    /// Normalizes the cost against block limits, returning `None` if they
    /// exceed them
    pub fn normalize(self, limits: SyntheticCost) -> Option<NormalizedCost> {
        let res = NormalizedCost {
            read_time: self.read_time / limits.read_time,
            compute_time: self.compute_time / limits.compute_time,
            block_usage: FixedPoint::from_u64_div(self.block_usage, limits.block_usage),
            bytes_written: FixedPoint::from_u64_div(self.bytes_written, limits.bytes_written),
            bytes_churned: FixedPoint::from_u64_div(self.bytes_churned, limits.bytes_churned),
        };
        let vals = [
            &res.read_time,
            &res.compute_time,
            &res.block_usage,
            &res.bytes_written,
            &res.bytes_churned,
        ];
        if vals.into_iter().any(|val| *val > FixedPoint::ONE) {
            None
        } else {
            Some(res)
        }
    }
}

impl Add for SyntheticCost {
    type Output = SyntheticCost;
    fn add(self, rhs: Self) -> SyntheticCost {
        SyntheticCost {
            read_time: self.read_time + rhs.read_time,
            compute_time: self.compute_time + rhs.compute_time,
            block_usage: self.block_usage.saturating_add(rhs.block_usage),
            bytes_written: self.bytes_written.saturating_add(rhs.bytes_written),
            bytes_churned: self.bytes_churned.saturating_add(rhs.bytes_churned),
        }
    }
}

impl AddAssign for SyntheticCost {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul<f64> for SyntheticCost {
    type Output = SyntheticCost;
    fn mul(self, rhs: f64) -> SyntheticCost {
        SyntheticCost {
            compute_time: self.compute_time * rhs,
            read_time: self.read_time * rhs,
            block_usage: (self.block_usage as f64 * rhs).ceil() as u64,
            bytes_written: (self.bytes_written as f64 * rhs).ceil() as u64,
            bytes_churned: (self.bytes_churned as f64 * rhs).ceil() as u64,
        }
    }
}

/// The costs normalized to a block's limit in each dimension
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone)]
pub struct NormalizedCost {
    /// The fraction of a block's read time used
    pub read_time: FixedPoint,
    /// The fraction of a block's compute time used
    pub compute_time: FixedPoint,
    /// The fraction of a block's size used
    pub block_usage: FixedPoint,
    /// The fraction of a block's data write allowance used
    pub bytes_written: FixedPoint,
    /// The fraction of a block's data churn allowance used
    pub bytes_churned: FixedPoint,
}

impl Add for NormalizedCost {
    type Output = NormalizedCost;
    fn add(self, rhs: Self) -> NormalizedCost {
        NormalizedCost {
            read_time: self.read_time + rhs.read_time,
            compute_time: self.compute_time + rhs.compute_time,
            block_usage: self.block_usage + rhs.block_usage,
            bytes_written: self.bytes_written + rhs.bytes_written,
            bytes_churned: self.bytes_churned + rhs.bytes_churned,
        }
    }
}

/// The pricing of the various block operations
///
/// All values are denominated in DUST (*not* atomic units, or SPECKs)
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone)]
pub struct FeePrices {
    /// The price in DUST of a block's full read capacity
    pub read_price: FixedPoint,
    /// The price in DUST of a block's full compute capacity
    pub compute_price: FixedPoint,
    /// The price in DUST of a block's full size capacity
    pub block_usage_price: FixedPoint,
    /// The price in DUST of a block's full write allowance capacity
    pub write_price: FixedPoint,
}
tag_enforcement_test!(FeePrices);

serialize::serializable_struct!(FeePrices: "fee-prices[v1]" = "(i128,i128,i128,i128)" {
    read_price, compute_price, block_usage_price, write_price,
});

impl FeePrices {
    /// Compute an updated cost from a given block fullness. This should be the
    /// sum of the normalized costs of all transactions in a block.
    ///
    /// `min_ratio` specifies a bound that the smallest price will not fall
    /// below, as a ratio of the highest price. It should be `0 < min_ratio < 1`.
    ///
    /// `a` is the `a` parameter from [`price_adjustment_function`].
    pub fn update_from_fullness(
        &self,
        block_fullness: NormalizedCost,
        min_ratio: FixedPoint,
        a: FixedPoint,
    ) -> Self {
        let multiplier = |frac| price_adjustment_function(frac, a) + FixedPoint::ONE;
        let mut updated = FeePrices {
            read_price: self.read_price * multiplier(block_fullness.read_time),
            compute_price: self.compute_price * multiplier(block_fullness.compute_time),
            block_usage_price: self.block_usage_price * multiplier(block_fullness.block_usage),
            write_price: self.write_price
                * multiplier(FixedPoint::max(
                    block_fullness.bytes_written,
                    block_fullness.bytes_churned,
                )),
        };
        let dimensions = [
            &mut updated.read_price,
            &mut updated.compute_price,
            &mut updated.block_usage_price,
            &mut updated.write_price,
        ];
        let most_expensive_dimension = **dimensions
            .iter()
            .max()
            .expect("max of 4 elements must exist");
        // Not MIN_POSITIVE, to ensure prices don't get stuck at a floor the
        // small multiplicative adjustments round away on.
        const MIN_COST: FixedPoint = FixedPoint(100);
        for dim in dimensions.into_iter() {
            *dim = FixedPoint::max(
                FixedPoint::max(*dim, most_expensive_dimension * min_ratio),
                MIN_COST,
            );
        }
        updated
    }

    /// The overall (dust) cost of a synthetic resource cost, given this
    /// resource price object.
    pub fn overall_cost(&self, tx_normalized: &NormalizedCost) -> FixedPoint {
        let read_cost = self.read_price * tx_normalized.read_time;
        let compute_cost = self.compute_price * tx_normalized.compute_time;
        let block_usage_cost = self.block_usage_price * tx_normalized.block_usage;
        let write_cost = self.write_price * tx_normalized.bytes_written;
        let churn_cost = self.write_price * tx_normalized.bytes_churned;
        let utilization_cost =
            FixedPoint::max(read_cost, FixedPoint::max(compute_cost, block_usage_cost));
        utilization_cost + write_cost + churn_cost
    }
}

/// Represents a rational number deterministically. Internally, numbers are
/// represented by an integer `x: i128`, which represents the real
/// `x / (2 ** 64)`.
///
/// Addition and multiplication saturate, and division rounds up, as the
/// maximum should always be rejected when used for cost estimation.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FixedPoint(i128);
tag_enforcement_test!(FixedPoint);

serialize::serializable_newtype!(FixedPoint: "fixed-point[v1]" = "i128");

impl Debug for FixedPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FixedPoint({})", f64::from(*self))
    }
}

impl From<f64> for FixedPoint {
    fn from(float: f64) -> FixedPoint {
        FixedPoint((float * 2f64.powi(64)) as i128)
    }
}

impl From<FixedPoint> for i128 {
    fn from(fp: FixedPoint) -> i128 {
        fp.0 >> 64
    }
}

impl From<FixedPoint> for f64 {
    fn from(fp: FixedPoint) -> f64 {
        fp.0 as f64 / 2f64.powi(64)
    }
}

// NOTE: For reasoning about arith, convention is that:
// - A/B is the 'real' number
// - a/b is the representation
// - Therefore, A = a / (2 ** 64)

impl FixedPoint {
    /// The value of 0.0
    pub const ZERO: FixedPoint = FixedPoint(0);
    /// The value of 1.0
    pub const ONE: FixedPoint = FixedPoint::from_u64_div(1, 1);
    /// The smallest positive fraction representable
    pub const MIN_POSITIVE: FixedPoint = FixedPoint(1);
    /// The maximum representable fixed point number
    pub const MAX: FixedPoint = FixedPoint(i128::MAX);

    pub(crate) const fn from_raw(raw: i128) -> FixedPoint {
        FixedPoint(raw)
    }

    /// The larger of two fixed point values.
    pub fn max(a: FixedPoint, b: FixedPoint) -> FixedPoint {
        FixedPoint(i128::max(a.0, b.0))
    }

    /// Takes a [`FixedPoint`] denominated in a non-base token unit (for
    /// instance, 1.0 representing DUST) to its base unit.
    ///
    /// Rounds up, and returns zero for negatives.
    pub fn into_atomic_units(self, base_unit: u128) -> u128 {
        let raw = I256::from(self.0) * I256::from(base_unit);
        let (res, rem) = raw.div_rem(I256::from(1u128 << 64));
        let res = if rem <= 0 { I256::from(0u32) } else { I256::from(1u32) } + res;
        if res < 0 {
            0
        } else if res > I256::from(u128::MAX) {
            u128::MAX
        } else {
            res.as_u128()
        }
    }

    /// Raises the number to an integer power.
    pub fn powi(self, mut exp: i32) -> Self {
        match exp {
            i32::MIN..=-1 => (FixedPoint::ONE / self).powi(-exp),
            0 => FixedPoint::ONE,
            1..=i32::MAX => {
                let mut acc = FixedPoint::ONE;
                let mut cur = self;
                while exp >= 1 {
                    if exp & 0b1 != 0 {
                        acc = acc * cur;
                    }
                    cur = cur * cur;
                    exp >>= 1;
                }
                acc
            }
        }
    }

    /// Instantiates a fixed point from a/b (rounded up to the nearest 2^-64)
    pub const fn from_u64_div(a: u64, b: u64) -> FixedPoint {
        // C = a / b
        // c / (2 ** 64) = a / b
        // c = a * (2 ** 64) / b
        if b == 0 {
            return FixedPoint(i128::MAX);
        }
        let ashift = (a as u128) << 64;
        let c = ashift.div_ceil(b as u128) as i128;
        FixedPoint(c)
    }

    /// Instantiates a fixed point from a/b (rounded up to the nearest 2^-64)
    pub fn from_u128_div(a: u128, b: u128) -> FixedPoint {
        if b == 0 {
            return FixedPoint(i128::MAX);
        }
        let ashift = I256::from(a) * I256::from(1u128 << 64);
        let (c, rem) = ashift.div_rem(I256::from(b));
        let c = if rem == I256::from(0u32) {
            I256::from(0u32)
        } else {
            I256::from(1u32)
        } + c;
        if c > I256::from(u128::MAX) {
            FixedPoint(i128::MAX)
        } else {
            FixedPoint(c.as_i128())
        }
    }
}

impl Add for FixedPoint {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        FixedPoint(self.0.saturating_add(rhs.0))
    }
}

impl Sub for FixedPoint {
    type Output = FixedPoint;
    fn sub(self, rhs: Self) -> Self::Output {
        FixedPoint(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for FixedPoint {
    type Output = FixedPoint;
    fn neg(self) -> Self::Output {
        FixedPoint(self.0.saturating_neg())
    }
}

impl Mul for FixedPoint {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        // C = A * B
        // (c / (2 ** 64)) = (a / (2 ** 64)) * (b / (2 ** 64)) = (a * b) / (2 ** 128)
        // c = (a * b) / (2 ** 64)
        let ab = I256::from(self.0) * I256::from(rhs.0);
        let c = I256::min(I256::from(i128::MAX), ab >> 64).as_i128();
        FixedPoint(c)
    }
}

impl Mul<CostDuration> for FixedPoint {
    type Output = CostDuration;
    fn mul(self, rhs: CostDuration) -> CostDuration {
        CostDuration::from_picoseconds(
            (self * FixedPoint::from_u64_div(rhs.into_picoseconds(), 1))
                .into_atomic_units(1)
                .try_into()
                .unwrap_or(u64::MAX),
        )
    }
}

impl Div for FixedPoint {
    type Output = Self;
    /// Division rounding up to the nearest 2^-64
    fn div(self, rhs: Self) -> Self::Output {
        if rhs.0 == 0 {
            // Rather max out pricing than panic
            return FixedPoint(i128::MAX);
        }
        let a_abs = self.0.unsigned_abs();
        let b_abs = rhs.0.unsigned_abs();
        let a_sign = self.0.signum();
        let b_sign = rhs.0.signum();
        FixedPoint(FixedPoint::from_u128_div(a_abs, b_abs).0 * a_sign * b_sign)
    }
}

/// The raw price adjustment from block fullness, as specified in the
/// tokenomics documents: the logit `ln(u / (1 - u))` scaled down by `a`,
/// clamped to `u ∈ [0.01, 0.99]` and linearly interpolated between fixed
/// sample points.
pub fn price_adjustment_function(usage: FixedPoint, a: FixedPoint) -> FixedPoint {
    // logit values at 0.05 steps over [0, 1], with the ends clamped to
    // logit(0.01) and logit(0.99).
    const POINTS: &[f64] = &[
        -4.595120, -2.944439, -2.197225, -1.734601, -1.386294, -1.098612, -0.847298, -0.619039,
        -0.405465, -0.200671, 0.0, 0.200671, 0.405465, 0.619039, 0.847298, 1.098612, 1.386294,
        1.734601, 2.197225, 2.944439, 4.595120,
    ];
    let steps = (POINTS.len() - 1) as u64;
    let clamped = FixedPoint::max(FixedPoint::ZERO, usage);
    let clamped = if clamped > FixedPoint::ONE {
        FixedPoint::ONE
    } else {
        clamped
    };
    let scaled = clamped * FixedPoint::from_u64_div(steps, 1);
    let idx = usize::min(i128::from(scaled) as usize, (steps - 1) as usize);
    let frac = scaled - FixedPoint::from_u64_div(idx as u64, 1);
    let lo = FixedPoint::from(POINTS[idx]);
    let hi = FixedPoint::from(POINTS[idx + 1]);
    let interpolated = lo + (hi - lo) * frac;
    interpolated / a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_point_algebra() {
        let half = FixedPoint::from_u64_div(1, 2);
        assert_eq!(half + half, FixedPoint::ONE);
        assert_eq!(half * FixedPoint::from_u64_div(4, 1), FixedPoint::from_u64_div(2, 1));
        assert_eq!(FixedPoint::ONE / half, FixedPoint::from_u64_div(2, 1));
        assert_eq!(half.into_atomic_units(1000), 500);
    }

    #[test]
    fn normalization_rejects_over_limit() {
        let limits = SyntheticCost {
            read_time: CostDuration::SECOND,
            compute_time: CostDuration::SECOND,
            block_usage: 100,
            bytes_written: 100,
            bytes_churned: 100,
        };
        let over = SyntheticCost {
            block_usage: 101,
            ..SyntheticCost::ZERO
        };
        assert!(over.normalize(limits).is_none());
        let under = SyntheticCost {
            block_usage: 50,
            ..SyntheticCost::ZERO
        };
        let norm = under.normalize(limits).unwrap();
        assert_eq!(norm.block_usage, FixedPoint::from_u64_div(1, 2));
    }

    #[test]
    fn price_adjustment_is_monotone() {
        let a = FixedPoint::from_u64_div(100, 1);
        let mut last = price_adjustment_function(FixedPoint::ZERO, a);
        for i in 1..=20u64 {
            let next = price_adjustment_function(FixedPoint::from_u64_div(i, 20), a);
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn gas_addition_saturates() {
        let big = RunningCost {
            bytes_written: u64::MAX,
            ..RunningCost::ZERO
        };
        assert_eq!((big + big).bytes_written, u64::MAX);
    }
}
