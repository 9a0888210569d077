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

//! The container types used throughout ledger state: ordered persistent
//! [`Map`]s and [`HashSet`]s, persistent [`Array`]s, and the TTL-bucketed
//! [`TimeFilterMap`] backing replay protection and historic Merkle roots.

use base_crypto::time::Timestamp;
use rpds::{RedBlackTreeMapSync, RedBlackTreeSetSync, VectorSync};
use serialize::{Deserializable, Serializable, Tagged, VecExt};
use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::io::{Read, Write};

/// An ordered persistent map. Iteration and serialization follow key order,
/// giving every map a canonical form.
#[derive(Clone)]
pub struct Map<K: Ord, V> {
    inner: RedBlackTreeMapSync<K, V>,
}

impl<K: Ord, V> Map<K, V> {
    pub fn new() -> Self {
        Map {
            inner: RedBlackTreeMapSync::new_sync(),
        }
    }

    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        Map {
            inner: self.inner.insert(key, value),
        }
    }

    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        Map {
            inner: self.inner.remove(key),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.inner.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.values()
    }
}

impl<K: Ord, V> Default for Map<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> FromIterator<(K, V)> for Map<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut inner = RedBlackTreeMapSync::new_sync();
        for (k, v) in iter {
            inner.insert_mut(k, v);
        }
        Map { inner }
    }
}

impl<K: Ord + Clone, V: Clone> IntoIterator for Map<K, V> {
    type Item = (K, V);
    type IntoIter = std::vec::IntoIter<(K, V)>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl<K: Ord + PartialEq, V: PartialEq> PartialEq for Map<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K: Ord + Eq, V: Eq> Eq for Map<K, V> {}

impl<K: Ord + Debug, V: Debug> Debug for Map<K, V> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord + Serializable, V: Serializable> Serializable for Map<K, V> {
    fn serialize(&self, writer: &mut impl Write) -> std::io::Result<()> {
        (self.size() as u32).serialize(writer)?;
        for (k, v) in self.iter() {
            k.serialize(writer)?;
            v.serialize(writer)?;
        }
        Ok(())
    }
    fn serialized_size(&self) -> usize {
        self.iter()
            .fold((self.size() as u32).serialized_size(), |acc, (k, v)| {
                acc + k.serialized_size() + v.serialized_size()
            })
    }
}

impl<K: Ord + Clone + Deserializable, V: Clone + Deserializable> Deserializable for Map<K, V> {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> std::io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        let len = u32::deserialize(reader, recursion_depth)?;
        let mut inner = RedBlackTreeMapSync::new_sync();
        for _ in 0..len {
            let k = K::deserialize(reader, recursion_depth)?;
            let v = V::deserialize(reader, recursion_depth)?;
            inner.insert_mut(k, v);
        }
        Ok(Map { inner })
    }
}

impl<K: Ord + Tagged, V: Tagged> Tagged for Map<K, V> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("map({},{})", K::tag(), V::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("map({},{})", K::tag(), V::tag())
    }
}

impl<K: Ord + serde::Serialize, V: serde::Serialize> serde::Serialize for Map<K, V> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, K, V> serde::Deserialize<'de> for Map<K, V>
where
    K: Ord + Clone + serde::Deserialize<'de>,
    V: Clone + serde::Deserialize<'de>,
{
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<(K, V)>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

/// An ordered persistent set.
#[derive(Clone)]
pub struct HashSet<T: Ord> {
    inner: RedBlackTreeSetSync<T>,
}

impl<T: Ord> HashSet<T> {
    pub fn new() -> Self {
        HashSet {
            inner: RedBlackTreeSetSync::new_sync(),
        }
    }

    #[must_use]
    pub fn insert(&self, value: T) -> Self {
        HashSet {
            inner: self.inner.insert(value),
        }
    }

    #[must_use]
    pub fn remove(&self, value: &T) -> Self {
        HashSet {
            inner: self.inner.remove(value),
        }
    }

    pub fn contains(&self, value: &T) -> bool {
        self.inner.contains(value)
    }

    pub fn size(&self) -> usize {
        self.inner.size()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }
}

impl<T: Ord> Default for HashSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + Clone> FromIterator<T> for HashSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut inner = RedBlackTreeSetSync::new_sync();
        for item in iter {
            inner.insert_mut(item);
        }
        HashSet { inner }
    }
}

impl<T: Ord + PartialEq> PartialEq for HashSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Ord + Eq> Eq for HashSet<T> {}

impl<T: Ord + Debug> Debug for HashSet<T> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord + Serializable> Serializable for HashSet<T> {
    fn serialize(&self, writer: &mut impl Write) -> std::io::Result<()> {
        (self.size() as u32).serialize(writer)?;
        for item in self.iter() {
            item.serialize(writer)?;
        }
        Ok(())
    }
    fn serialized_size(&self) -> usize {
        self.iter()
            .fold((self.size() as u32).serialized_size(), |acc, item| {
                acc + item.serialized_size()
            })
    }
}

impl<T: Ord + Clone + Deserializable> Deserializable for HashSet<T> {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> std::io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        let len = u32::deserialize(reader, recursion_depth)?;
        let mut inner = RedBlackTreeSetSync::new_sync();
        for _ in 0..len {
            inner.insert_mut(T::deserialize(reader, recursion_depth)?);
        }
        Ok(HashSet { inner })
    }
}

impl<T: Ord + Tagged> Tagged for HashSet<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("set({})", T::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("set({})", T::tag())
    }
}

/// A persistent sequence.
#[derive(Clone)]
pub struct Array<T> {
    inner: VectorSync<T>,
}

impl<T> Array<T> {
    pub fn new() -> Self {
        Array {
            inner: VectorSync::new_sync(),
        }
    }

    #[must_use]
    pub fn push(&self, value: T) -> Self {
        Array {
            inner: self.inner.push_back(value),
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.inner.get(index)
    }

    /// Replaces the element at `index`, or returns `None` out of bounds.
    #[must_use]
    pub fn set(&self, index: usize, value: T) -> Option<Self> {
        self.inner.set(index, value).map(|inner| Array { inner })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.inner.iter()
    }
}

impl<T> Default for Array<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> FromIterator<T> for Array<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut inner = VectorSync::new_sync();
        for item in iter {
            inner.push_back_mut(item);
        }
        Array { inner }
    }
}

impl<T: Clone> From<Vec<T>> for Array<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: Clone> From<&Array<T>> for Vec<T> {
    fn from(array: &Array<T>) -> Self {
        array.iter().cloned().collect()
    }
}

impl<T: Clone> From<Array<T>> for Vec<T> {
    fn from(array: Array<T>) -> Self {
        array.iter().cloned().collect()
    }
}

impl<T: PartialEq> PartialEq for Array<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T: Eq> Eq for Array<T> {}

impl<T: PartialOrd> PartialOrd for Array<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<T: Ord> Ord for Array<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<T: std::hash::Hash> std::hash::Hash for Array<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self.iter() {
            item.hash(state);
        }
    }
}

impl<T: Debug> Debug for Array<T> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Serializable> Serializable for Array<T> {
    fn serialize(&self, writer: &mut impl Write) -> std::io::Result<()> {
        (self.len() as u32).serialize(writer)?;
        for item in self.iter() {
            item.serialize(writer)?;
        }
        Ok(())
    }
    fn serialized_size(&self) -> usize {
        self.iter()
            .fold((self.len() as u32).serialized_size(), |acc, item| {
                acc + item.serialized_size()
            })
    }
}

impl<T: Clone + Deserializable> Deserializable for Array<T> {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> std::io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        let len = u32::deserialize(reader, recursion_depth)?;
        let mut items = Vec::with_bounded_capacity(len as usize);
        for _ in 0..len {
            items.push(T::deserialize(reader, recursion_depth)?);
        }
        Ok(items.into_iter().collect())
    }
}

impl<T: Tagged> Tagged for Array<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("array({})", T::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("array({})", T::tag())
    }
}

impl<T: serde::Serialize> serde::Serialize for Array<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de, T: Clone + serde::Deserialize<'de>> serde::Deserialize<'de> for Array<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<T>::deserialize(deserializer)?.into())
    }
}

/// A set whose members carry an expiry time, with wholesale pruning of
/// expired buckets.
///
/// Backs replay protection (intent hashes live until their TTL) and the
/// historic Merkle root window. Membership checks are O(log n) through a
/// side index.
#[derive(Clone)]
pub struct TimeFilterMap<T: Ord> {
    buckets: RedBlackTreeMapSync<Timestamp, RedBlackTreeSetSync<T>>,
    members: RedBlackTreeSetSync<T>,
}

impl<T: Ord + Clone> TimeFilterMap<T> {
    pub fn new() -> Self {
        TimeFilterMap {
            buckets: RedBlackTreeMapSync::new_sync(),
            members: RedBlackTreeSetSync::new_sync(),
        }
    }

    /// Inserts `item`, to be retained until a `filter` call with a cutoff
    /// past `expiry`.
    #[must_use]
    pub fn insert(&self, expiry: Timestamp, item: T) -> Self {
        let bucket = self
            .buckets
            .get(&expiry)
            .cloned()
            .unwrap_or_else(RedBlackTreeSetSync::new_sync)
            .insert(item.clone());
        TimeFilterMap {
            buckets: self.buckets.insert(expiry, bucket),
            members: self.members.insert(item),
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn size(&self) -> usize {
        self.members.size()
    }

    /// The member most recently inserted by expiry order.
    pub fn latest(&self) -> Option<&T> {
        self.buckets.last().and_then(|(_, bucket)| bucket.iter().next())
    }

    /// Drops every member whose expiry is strictly before `cutoff`.
    #[must_use]
    pub fn filter(&self, cutoff: Timestamp) -> Self {
        let mut buckets = self.buckets.clone();
        let mut members = self.members.clone();
        for (expiry, bucket) in self.buckets.iter() {
            if *expiry >= cutoff {
                break;
            }
            for item in bucket.iter() {
                members.remove_mut(item);
            }
            buckets.remove_mut(expiry);
        }
        TimeFilterMap { buckets, members }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Timestamp, impl Iterator<Item = &T>)> {
        self.buckets.iter().map(|(t, bucket)| (t, bucket.iter()))
    }
}

impl<T: Ord + Clone> Default for TimeFilterMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord + PartialEq> PartialEq for TimeFilterMap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.buckets == other.buckets
    }
}

impl<T: Ord + Eq> Eq for TimeFilterMap<T> {}

impl<T: Ord + Debug> Debug for TimeFilterMap<T> {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter
            .debug_map()
            .entries(self.buckets.iter().map(|(t, b)| (t, b.iter().collect::<Vec<_>>())))
            .finish()
    }
}

impl<T: Ord + Serializable> Serializable for TimeFilterMap<T> {
    fn serialize(&self, writer: &mut impl Write) -> std::io::Result<()> {
        (self.buckets.size() as u32).serialize(writer)?;
        for (expiry, bucket) in self.buckets.iter() {
            expiry.serialize(writer)?;
            (bucket.size() as u32).serialize(writer)?;
            for item in bucket.iter() {
                item.serialize(writer)?;
            }
        }
        Ok(())
    }
    fn serialized_size(&self) -> usize {
        let mut size = (self.buckets.size() as u32).serialized_size();
        for (expiry, bucket) in self.buckets.iter() {
            size += expiry.serialized_size() + (bucket.size() as u32).serialized_size();
            for item in bucket.iter() {
                size += item.serialized_size();
            }
        }
        size
    }
}

impl<T: Ord + Clone + Deserializable> Deserializable for TimeFilterMap<T> {
    fn deserialize(reader: &mut impl Read, mut recursion_depth: u32) -> std::io::Result<Self> {
        Self::check_rec(&mut recursion_depth)?;
        let buckets = u32::deserialize(reader, recursion_depth)?;
        let mut res = TimeFilterMap::new();
        for _ in 0..buckets {
            let expiry = Timestamp::deserialize(reader, recursion_depth)?;
            let len = u32::deserialize(reader, recursion_depth)?;
            for _ in 0..len {
                res = res.insert(expiry, T::deserialize(reader, recursion_depth)?);
            }
        }
        Ok(res)
    }
}

impl<T: Ord + Tagged> Tagged for TimeFilterMap<T> {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("time-filter-map({})", T::tag()))
    }
    fn tag_unique_factor() -> String {
        format!("time-filter-map({})", T::tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_is_persistent() {
        let m1: Map<u64, u64> = Map::new().insert(1, 10).insert(2, 20);
        let m2 = m1.insert(3, 30);
        assert_eq!(m1.size(), 2);
        assert_eq!(m2.size(), 3);
        assert_eq!(m1.get(&3), None);
        assert_eq!(m2.get(&3), Some(&30));
    }

    #[test]
    fn map_iterates_in_key_order() {
        let m: Map<u64, ()> = [(3, ()), (1, ()), (2, ())].into_iter().collect();
        let keys: Vec<u64> = m.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![1, 2, 3]);
    }

    #[test]
    fn time_filter_map_prunes_expired_buckets() {
        let t = Timestamp::from_secs;
        let tfm = TimeFilterMap::new()
            .insert(t(10), 1u64)
            .insert(t(20), 2)
            .insert(t(20), 3);
        assert!(tfm.contains(&1));
        let pruned = tfm.filter(t(15));
        assert!(!pruned.contains(&1));
        assert!(pruned.contains(&2));
        assert!(pruned.contains(&3));
        assert_eq!(pruned.size(), 2);
    }

    #[test]
    fn array_set_respects_bounds() {
        let arr: Array<u8> = vec![1, 2, 3].into();
        assert!(arr.set(3, 4).is_none());
        let arr2 = arr.set(0, 9).unwrap();
        assert_eq!(Vec::from(&arr2), vec![9, 2, 3]);
        assert_eq!(Vec::from(&arr), vec![1, 2, 3]);
    }
}
