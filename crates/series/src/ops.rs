//! Scalar operator cursors: arithmetic and comparison against a constant.

use std::ops::{Add, Div, Mul, Neg, Rem, Sub};
use std::sync::Arc;

use strand_primitives::{CursorState, Lookup};
use strand_sync::{AsyncCompletable, SubscribeError, SubscriptionSet};

use crate::cursor::Cursor;

/// A per-value operation applied lazily by [`Op`].
pub trait ScalarOp<V>: Clone + Send + Sync {
	type Output: Clone + Send + Sync;

	fn apply(&self, value: V) -> Self::Output;
}

/// Arithmetic operators. `*Reverse` variants put the operand on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
	Add,
	Subtract,
	SubtractReverse,
	Multiply,
	Divide,
	DivideReverse,
	Modulo,
	ModuloReverse,
}

/// Arithmetic against a captured constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scalar<V> {
	op: ArithOp,
	operand: V,
}

impl<V> Scalar<V> {
	pub fn new(op: ArithOp, operand: V) -> Self {
		Self { op, operand }
	}
}

impl<V> ScalarOp<V> for Scalar<V>
where
	V: Add<Output = V> + Sub<Output = V> + Mul<Output = V> + Div<Output = V> + Rem<Output = V> + Clone + Send + Sync,
{
	type Output = V;

	#[inline]
	fn apply(&self, value: V) -> V {
		let operand = self.operand.clone();
		match self.op {
			ArithOp::Add => value + operand,
			ArithOp::Subtract => value - operand,
			ArithOp::SubtractReverse => operand - value,
			ArithOp::Multiply => value * operand,
			ArithOp::Divide => value / operand,
			ArithOp::DivideReverse => operand / value,
			ArithOp::Modulo => value % operand,
			ArithOp::ModuloReverse => operand % value,
		}
	}
}

/// Unary negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Negate;

impl<V: Neg<Output = V> + Clone + Send + Sync> ScalarOp<V> for Negate {
	type Output = V;

	#[inline]
	fn apply(&self, value: V) -> V {
		-value
	}
}

/// Relational operators, evaluated as `value <op> operand`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
}

/// Comparison against a captured constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compare<V> {
	op: CompareOp,
	operand: V,
}

impl<V> Compare<V> {
	pub fn new(op: CompareOp, operand: V) -> Self {
		Self { op, operand }
	}
}

impl<V: PartialOrd + Clone + Send + Sync> ScalarOp<V> for Compare<V> {
	type Output = bool;

	#[inline]
	fn apply(&self, value: V) -> bool {
		let operand = &self.operand;
		match self.op {
			CompareOp::Eq => value == *operand,
			CompareOp::Ne => value != *operand,
			CompareOp::Lt => value < *operand,
			CompareOp::Le => value <= *operand,
			CompareOp::Gt => value > *operand,
			CompareOp::Ge => value >= *operand,
		}
	}
}

impl<V, F, R> ScalarOp<V> for Arc<F>
where
	F: Fn(V) -> R + Send + Sync + ?Sized,
	R: Clone + Send + Sync,
{
	type Output = R;

	fn apply(&self, value: V) -> R {
		(**self)(value)
	}
}

/// Cursor applying a [`ScalarOp`] to every value of its inner cursor.
///
/// Keys, moves and state are the inner cursor's; values are recomputed on
/// every access.
#[derive(Debug, Clone)]
pub struct Op<C, O> {
	inner: C,
	op: O,
}

/// Boolean comparison of every value against a constant.
pub type Comparison<C> = Op<C, Compare<<C as Cursor>::Value>>;

impl<C, O> Op<C, O> {
	pub fn new(inner: C, op: O) -> Self {
		Self { inner, op }
	}

	/// The cursor the operation applies to.
	pub fn inner(&self) -> &C {
		&self.inner
	}
}

impl<C, O> Cursor for Op<C, O>
where
	C: Cursor,
	O: ScalarOp<C::Value>,
{
	type Key = C::Key;
	type Value = O::Output;

	fn state(&self) -> CursorState {
		self.inner.state()
	}

	fn initialize(&self) -> Self {
		Self::new(self.inner.initialize(), self.op.clone())
	}

	fn reset(&mut self) {
		self.inner.reset();
	}

	fn dispose(&mut self) {
		self.inner.dispose();
	}

	fn move_first(&mut self) -> bool {
		self.inner.move_first()
	}

	fn move_last(&mut self) -> bool {
		self.inner.move_last()
	}

	fn move_next(&mut self) -> bool {
		self.inner.move_next()
	}

	fn move_previous(&mut self) -> bool {
		self.inner.move_previous()
	}

	fn move_at(&mut self, key: &Self::Key, lookup: Lookup) -> bool {
		self.inner.move_at(key, lookup)
	}

	fn current_key(&self) -> &Self::Key {
		self.inner.current_key()
	}

	fn current_value(&self) -> Self::Value {
		self.op.apply(self.inner.current_value())
	}

	fn try_get_value(&self, key: &Self::Key) -> Option<Self::Value> {
		self.inner.try_get_value(key).map(|value| self.op.apply(value))
	}

	fn try_find(&self, key: &Self::Key, lookup: Lookup) -> Option<(Self::Key, Self::Value)> {
		self.inner.try_find(key, lookup).map(|(k, value)| (k, self.op.apply(value)))
	}

	fn is_continuous(&self) -> bool {
		self.inner.is_continuous()
	}

	fn is_completed(&self) -> bool {
		self.inner.is_completed()
	}

	fn subscribe(&self, target: &Arc<dyn AsyncCompletable>, subscriptions: &mut SubscriptionSet) -> Result<(), SubscribeError> {
		self.inner.subscribe(target, subscriptions)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	use super::*;
	use crate::{CursorExt, Series};

	#[rstest]
	#[case(ArithOp::Add, 12)]
	#[case(ArithOp::Subtract, 8)]
	#[case(ArithOp::SubtractReverse, -8)]
	#[case(ArithOp::Multiply, 20)]
	#[case(ArithOp::Divide, 5)]
	#[case(ArithOp::DivideReverse, 0)]
	#[case(ArithOp::Modulo, 0)]
	#[case(ArithOp::ModuloReverse, 2)]
	fn arithmetic_against_two(#[case] op: ArithOp, #[case] expected: i64) {
		assert_eq!(Scalar::new(op, 2).apply(10i64), expected);
	}

	#[test]
	fn op_cursor_recomputes_on_access() {
		let series: Series<i32, i64> = [(1, 1), (2, 2)].into_iter().collect();
		let mut cursor = series.cursor().scalar(ArithOp::Multiply, 10).negate();
		assert!(cursor.move_first());
		assert_eq!(cursor.current(), (1, -10));

		series.set(1, 5).unwrap();
		assert_eq!(cursor.try_get_value(&1), Some(-50));
		assert_eq!(cursor.try_find(&3, Lookup::Le), Some((2, -20)));
	}

	#[test]
	fn comparison_yields_bool_values() {
		let series: Series<i32, f64> = [(1, 0.5), (2, 1.5), (3, 2.5)].into_iter().collect();
		let above: Vec<_> = series.cursor().compare(CompareOp::Ge, 1.5).into_series().iter().collect();
		assert_eq!(above, vec![(1, false), (2, true), (3, true)]);
	}

	#[test]
	fn closures_are_scalar_ops() {
		let series: Series<i32, i32> = [(1, 3)].into_iter().collect();
		let square: Arc<dyn Fn(i32) -> i32 + Send + Sync> = Arc::new(|v| v * v);
		assert_eq!(series.cursor().op(square).try_get_value(&1), Some(9));
	}

	#[test]
	fn state_mirrors_inner() {
		let series: Series<i32, i32> = [(1, 3)].into_iter().collect();
		let raw = series.raw_cursor().scalar(ArithOp::Add, 1);
		assert_eq!(raw.state(), CursorState::Uninitialized);
		let mut live = raw.initialize();
		assert_eq!(live.state(), CursorState::Initialized);
		live.move_first();
		assert_eq!(live.state(), CursorState::Moving);
		assert_eq!(raw.state(), CursorState::Uninitialized);
	}
}
