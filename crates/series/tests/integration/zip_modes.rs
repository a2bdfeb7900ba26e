use pretty_assertions::assert_eq;
use rstest::rstest;
use strand_series::{Cursor, CursorExt, Lookup};

use crate::common::upper_lower;

#[test]
fn strict_zip_of_disjoint_keys_is_empty() {
	let (upper, lower) = upper_lower();
	let sum = upper.cursor().zip_with(lower.cursor(), |a, b| a + b).into_series();
	assert_eq!(sum.count(), 0);
	assert!(sum.is_empty());
}

#[test]
fn repeat_carries_values_forward() {
	let (upper, lower) = upper_lower();
	let sum = upper.cursor().repeat().zip_with(lower.cursor(), |a, b| a + b).into_series();
	assert_eq!(sum.iter().collect::<Vec<_>>(), vec![(3, 32), (5, 54)]);
	assert_eq!(sum.try_get_value(&3), Some(32));
	assert_eq!(sum.try_get_value(&5), Some(54));
	assert_eq!(sum.try_get_value(&4), None);
}

#[test]
fn repeat_and_fill_cover_the_union() {
	let (upper, lower) = upper_lower();
	let sum = upper.cursor().repeat().zip_with(lower.cursor().fill(42), |a, b| a + b).into_series();
	assert_eq!(sum.iter().collect::<Vec<_>>(), vec![(2, 44), (3, 32), (4, 46), (5, 54)]);
	assert_eq!(sum.first(), Some((2, 44)));
	assert_eq!(sum.last(), Some((5, 54)));

	// point lookups on a continuous result answer between and past keys
	assert_eq!(sum.try_get_value(&6), Some(46));
	assert_eq!(sum.try_get_value(&1), None, "nothing to repeat before the first upper key");
}

#[rstest]
#[case(6, Lookup::Eq, None)]
#[case(6, Lookup::Ge, None)]
#[case(6, Lookup::Le, Some((5, 54)))]
#[case(6, Lookup::Lt, Some((5, 54)))]
#[case(0, Lookup::Eq, None)]
#[case(1, Lookup::Eq, None)]
#[case(0, Lookup::Le, None)]
#[case(0, Lookup::Ge, Some((2, 44)))]
#[case(1, Lookup::Ge, Some((2, 44)))]
#[case(3, Lookup::Eq, Some((3, 32)))]
#[case(4, Lookup::Gt, Some((5, 54)))]
#[case(4, Lookup::Lt, Some((3, 32)))]
fn find_mirrors_cursor_moves(#[case] key: i32, #[case] lookup: Lookup, #[case] expected: Option<(i32, i32)>) {
	let (upper, lower) = upper_lower();
	let sum = upper.cursor().repeat().zip_with(lower.cursor().fill(42), |a, b| a + b).into_series();
	assert_eq!(sum.try_find(&key, lookup), expected);

	let mut cursor = sum.cursor();
	assert_eq!(cursor.move_at(&key, lookup), expected.is_some());
	if let Some(entry) = expected {
		assert_eq!(cursor.current(), entry);
	}
}

#[test]
fn repeat_cursor_moves() {
	let (upper, lower) = upper_lower();
	let mut cursor = upper.cursor().repeat().zip_with(lower.cursor(), |a, b| a + b);

	assert!(!cursor.move_at(&1, Lookup::Eq));
	assert!(cursor.move_at(&1, Lookup::Ge));
	assert_eq!(cursor.current(), (3, 32));

	assert!(cursor.move_next());
	assert_eq!(cursor.current(), (5, 54));
	assert!(!cursor.move_next());

	assert!(cursor.move_previous());
	assert_eq!(cursor.current(), (3, 32));
}

#[test]
fn repeat_fill_cursor_moves() {
	let (upper, lower) = upper_lower();
	let mut cursor = upper.cursor().repeat().zip_with(lower.cursor().fill(42), |a, b| a + b);

	assert!(!cursor.move_at(&1, Lookup::Eq));
	assert!(cursor.move_at(&1, Lookup::Ge));
	assert_eq!(cursor.current(), (2, 44));

	let mut forward = Vec::new();
	while cursor.move_next() {
		forward.push(cursor.current());
	}
	assert_eq!(forward, vec![(3, 32), (4, 46), (5, 54)]);

	let mut backward = Vec::new();
	while cursor.move_previous() {
		backward.push(cursor.current());
	}
	assert_eq!(backward, vec![(4, 46), (3, 32), (2, 44)]);
}

#[test]
fn expression_tree_of_combinators() {
	let (upper, lower) = upper_lower();
	// (lower - repeat(upper)) * 2 > 60
	let wide = lower
		.cursor()
		.zip_with(upper.cursor().repeat(), |l, u| l - u)
		.scalar(strand_series::ArithOp::Multiply, 2)
		.compare(strand_series::CompareOp::Gt, 60)
		.into_series();
	assert_eq!(wide.iter().collect::<Vec<_>>(), vec![(3, false), (5, true)]);
}
