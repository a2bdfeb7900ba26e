//! Backing storage for [`Series`](crate::Series).

use std::collections::BTreeMap;
use std::ops::Bound;

use strand_primitives::Lookup;

/// Ordered key/value storage owned by a series.
///
/// Keys are ordered by `K: Ord`. All methods are called with the series
/// storage lock held; mutating methods additionally run under the series
/// write gate.
pub trait OrderedStore<K, V>: Send + Sync {
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn first(&self) -> Option<(&K, &V)>;

	fn last(&self) -> Option<(&K, &V)>;

	/// Entry nearest to `key` under `lookup`.
	fn find(&self, key: &K, lookup: Lookup) -> Option<(&K, &V)>;

	fn next_after(&self, key: &K) -> Option<(&K, &V)> {
		self.find(key, Lookup::Gt)
	}

	fn previous_before(&self, key: &K) -> Option<(&K, &V)> {
		self.find(key, Lookup::Lt)
	}

	fn get(&self, key: &K) -> Option<&V>;

	/// Inserts or replaces, returning the previous value.
	fn insert(&mut self, key: K, value: V) -> Option<V>;

	fn remove(&mut self, key: &K) -> Option<V>;

	/// Removes every key admitted by `lookup` relative to `key`.
	///
	/// `Eq` removes at most one entry, `Lt`/`Le` remove the head up to the
	/// key, `Gt`/`Ge` remove the tail from the key. Returns the number of
	/// removed entries.
	fn remove_many(&mut self, key: &K, lookup: Lookup) -> usize;

	/// Copies up to `limit` entries strictly after `after` (from the start
	/// when `None`).
	fn range_after(&self, after: Option<&K>, limit: usize) -> Vec<(K, V)>
	where
		K: Clone,
		V: Clone;
}

/// [`OrderedStore`] over a [`BTreeMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BTreeStore<K, V> {
	map: BTreeMap<K, V>,
}

impl<K, V> Default for BTreeStore<K, V> {
	fn default() -> Self {
		Self { map: BTreeMap::new() }
	}
}

impl<K: Ord, V> BTreeStore<K, V> {
	/// Empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

impl<K: Ord, V> FromIterator<(K, V)> for BTreeStore<K, V> {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self {
			map: iter.into_iter().collect(),
		}
	}
}

impl<K, V> OrderedStore<K, V> for BTreeStore<K, V>
where
	K: Ord + Send + Sync,
	V: Send + Sync,
{
	fn len(&self) -> usize {
		self.map.len()
	}

	fn first(&self) -> Option<(&K, &V)> {
		self.map.first_key_value()
	}

	fn last(&self) -> Option<(&K, &V)> {
		self.map.last_key_value()
	}

	fn find(&self, key: &K, lookup: Lookup) -> Option<(&K, &V)> {
		match lookup {
			Lookup::Eq => self.map.get_key_value(key),
			Lookup::Lt => self.map.range(..key).next_back(),
			Lookup::Le => self.map.range(..=key).next_back(),
			Lookup::Ge => self.map.range(key..).next(),
			Lookup::Gt => self.map.range((Bound::Excluded(key), Bound::Unbounded)).next(),
		}
	}

	fn get(&self, key: &K) -> Option<&V> {
		self.map.get(key)
	}

	fn insert(&mut self, key: K, value: V) -> Option<V> {
		self.map.insert(key, value)
	}

	fn remove(&mut self, key: &K) -> Option<V> {
		self.map.remove(key)
	}

	fn remove_many(&mut self, key: &K, lookup: Lookup) -> usize {
		let before = self.map.len();
		match lookup {
			Lookup::Eq => {
				self.map.remove(key);
			}
			Lookup::Lt | Lookup::Le => {
				let mut tail = self.map.split_off(key);
				if lookup == Lookup::Le {
					// split_off keeps `key` in the tail
					tail.remove(key);
				}
				self.map = tail;
			}
			Lookup::Ge | Lookup::Gt => {
				let mut tail = self.map.split_off(key);
				if lookup == Lookup::Gt
					&& let Some((key, value)) = tail.remove_entry(key)
				{
					self.map.insert(key, value);
				}
			}
		}
		before - self.map.len()
	}

	fn range_after(&self, after: Option<&K>, limit: usize) -> Vec<(K, V)>
	where
		K: Clone,
		V: Clone,
	{
		let lower = after.map_or(Bound::Unbounded, Bound::Excluded);
		self.map
			.range((lower, Bound::Unbounded))
			.take(limit)
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;

	fn store() -> BTreeStore<i32, i32> {
		[(1, 10), (3, 30), (5, 50)].into_iter().collect()
	}

	#[rstest]
	#[case(Lookup::Eq, 3, Some(3))]
	#[case(Lookup::Eq, 4, None)]
	#[case(Lookup::Lt, 3, Some(1))]
	#[case(Lookup::Lt, 1, None)]
	#[case(Lookup::Le, 4, Some(3))]
	#[case(Lookup::Le, 0, None)]
	#[case(Lookup::Ge, 4, Some(5))]
	#[case(Lookup::Ge, 6, None)]
	#[case(Lookup::Gt, 3, Some(5))]
	#[case(Lookup::Gt, 5, None)]
	fn find_follows_direction(#[case] lookup: Lookup, #[case] key: i32, #[case] expected: Option<i32>) {
		assert_eq!(store().find(&key, lookup).map(|(k, _)| *k), expected);
	}

	#[rstest]
	#[case(Lookup::Eq, 3, vec![1, 5])]
	#[case(Lookup::Lt, 3, vec![3, 5])]
	#[case(Lookup::Le, 3, vec![5])]
	#[case(Lookup::Ge, 3, vec![1])]
	#[case(Lookup::Gt, 3, vec![1, 3])]
	#[case(Lookup::Gt, 4, vec![1, 3])]
	fn remove_many_keeps_the_rest(#[case] lookup: Lookup, #[case] key: i32, #[case] kept: Vec<i32>) {
		let mut store = store();
		let removed = store.remove_many(&key, lookup);
		assert_eq!(removed, 3 - kept.len());
		assert_eq!(store.map.keys().copied().collect::<Vec<_>>(), kept);
	}

	#[test]
	fn range_after_pages_through() {
		let store = store();
		assert_eq!(store.range_after(None, 2), vec![(1, 10), (3, 30)]);
		assert_eq!(store.range_after(Some(&3), 2), vec![(5, 50)]);
		assert_eq!(store.range_after(Some(&5), 2), vec![]);
	}
}
