use std::collections::BTreeMap;

use proptest::prelude::*;
use strand_series::{Cursor, CursorExt, Lookup, Series};

#[derive(Debug, Clone)]
enum Mutation {
	Set(u8, i32),
	Add(u8, i32),
	Remove(u8),
}

fn mutation() -> impl Strategy<Value = Mutation> {
	prop_oneof![
		(any::<u8>(), any::<i32>()).prop_map(|(k, v)| Mutation::Set(k, v)),
		(any::<u8>(), any::<i32>()).prop_map(|(k, v)| Mutation::Add(k, v)),
		any::<u8>().prop_map(Mutation::Remove),
	]
}

fn entries() -> impl Strategy<Value = BTreeMap<u8, i32>> {
	prop::collection::btree_map(0u8..40, -100i32..100, 0..12)
}

/// Value of the greatest key at or before `key`.
fn held(map: &BTreeMap<u8, i32>, key: u8) -> Option<i32> {
	map.range(..=key).next_back().map(|(_, v)| *v)
}

fn collect<C: Cursor>(mut cursor: C) -> Vec<(C::Key, C::Value)> {
	let mut out = Vec::new();
	while cursor.move_next() {
		out.push(cursor.current());
	}
	out
}

proptest! {
	#[test]
	fn mutations_match_a_map_and_versions_count_changes(ops in prop::collection::vec(mutation(), 0..64)) {
		let series = Series::<u8, i32>::new();
		let mut model = BTreeMap::new();
		let mut expected_version = 0;
		for op in ops {
			let changed = match op {
				Mutation::Set(k, v) => {
					prop_assert_eq!(series.set(k, v).unwrap(), model.insert(k, v));
					true
				}
				Mutation::Add(k, v) => {
					let fresh = !model.contains_key(&k);
					prop_assert_eq!(series.add(k, v).is_ok(), fresh);
					if fresh {
						model.insert(k, v);
					}
					fresh
				}
				Mutation::Remove(k) => {
					let removed = model.remove(&k);
					prop_assert_eq!(series.remove(&k).unwrap(), removed);
					removed.is_some()
				}
			};
			expected_version += u64::from(changed);
			prop_assert_eq!(series.version(), expected_version);
			prop_assert_eq!(series.next_version(), expected_version);
		}
		prop_assert_eq!(series.snapshot(), model.into_iter().collect::<Vec<_>>());
	}

	#[test]
	fn next_then_previous_returns_to_the_same_entry(map in entries()) {
		let series: Series<u8, i32> = map.clone().into_iter().collect();
		let mut cursor = series.cursor();
		let mut position = 0;
		while cursor.move_next() {
			let here = cursor.current();
			let mut probe = cursor.clone();
			if probe.move_next() {
				prop_assert!(probe.move_previous());
				prop_assert_eq!(probe.current(), here);
			}
			position += 1;
		}
		prop_assert_eq!(position, map.len());
	}

	#[test]
	fn find_agrees_with_the_map(map in entries(), key in 0u8..45) {
		let series: Series<u8, i32> = map.clone().into_iter().collect();
		let expected = [
			(Lookup::Eq, map.get_key_value(&key)),
			(Lookup::Lt, map.range(..key).next_back()),
			(Lookup::Le, map.range(..=key).next_back()),
			(Lookup::Ge, map.range(key..).next()),
			(Lookup::Gt, map.range(key + 1..).next()),
		];
		for (lookup, entry) in expected {
			prop_assert_eq!(series.try_find(&key, lookup), entry.map(|(k, v)| (*k, *v)), "{:?}", lookup);
		}
	}

	#[test]
	fn strict_zip_is_the_key_intersection(left in entries(), right in entries()) {
		let a: Series<u8, i32> = left.clone().into_iter().collect();
		let b: Series<u8, i32> = right.clone().into_iter().collect();
		let expected: Vec<_> = left
			.iter()
			.filter_map(|(k, l)| right.get(k).map(|r| (*k, (*l, *r))))
			.collect();
		prop_assert_eq!(collect(a.cursor().zip(b.cursor())), expected);
	}

	#[test]
	fn repeated_left_follows_right_keys(left in entries(), right in entries()) {
		let a: Series<u8, i32> = left.clone().into_iter().collect();
		let b: Series<u8, i32> = right.clone().into_iter().collect();
		let expected: Vec<_> = right
			.iter()
			.filter_map(|(k, r)| held(&left, *k).map(|l| (*k, (l, *r))))
			.collect();
		let zipped = collect(a.cursor().repeat().zip(b.cursor()));
		prop_assert_eq!(&zipped, &expected);

		let mut backward = Vec::new();
		let mut cursor = a.cursor().repeat().zip(b.cursor());
		while cursor.move_previous() {
			backward.push(cursor.current());
		}
		backward.reverse();
		prop_assert_eq!(backward, expected);
	}

	#[test]
	fn both_repeated_cover_the_key_union(left in entries(), right in entries()) {
		let a: Series<u8, i32> = left.clone().into_iter().collect();
		let b: Series<u8, i32> = right.clone().into_iter().collect();
		let keys: std::collections::BTreeSet<u8> = left.keys().chain(right.keys()).copied().collect();
		let expected: Vec<_> = keys
			.into_iter()
			.filter_map(|k| Some((k, (held(&left, k)?, held(&right, k)?))))
			.collect();
		prop_assert_eq!(collect(a.cursor().repeat().zip(b.cursor().repeat())), expected);
	}
}
