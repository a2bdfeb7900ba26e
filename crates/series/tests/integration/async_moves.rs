use std::time::Duration;

use strand_series::{AsyncCursor, Cursor, CursorError, CursorExt, Series};
use tokio_util::sync::CancellationToken;

use crate::common::upper_lower;

const DEADLINE: Duration = Duration::from_secs(5);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn zip_waits_for_either_side_and_ends_on_completion() {
	let (upper, lower) = upper_lower();
	let mut cursor = upper.cursor().repeat().zip_with(lower.cursor(), |a, b| a + b);
	let cancel = CancellationToken::new();

	assert!(cursor.move_at(&3, strand_series::Lookup::Eq));
	assert_eq!(cursor.move_next_async(&cancel).await, Ok(true));
	assert_eq!(cursor.current(), (5, 54));

	let waiting = tokio::spawn({
		let cancel = cancel.clone();
		async move {
			let moved = cursor.move_next_async(&cancel).await;
			(moved, cursor)
		}
	});
	tokio::time::sleep(Duration::from_millis(20)).await;
	lower.add(6, 60).unwrap();
	let (moved, mut cursor) = tokio::time::timeout(DEADLINE, waiting).await.unwrap().unwrap();
	assert_eq!(moved, Ok(true));
	assert_eq!(cursor.current(), (6, 4 + 60));

	let waiting = tokio::spawn(async move {
		let moved = cursor.move_next_async(&cancel).await;
		(moved, cursor)
	});
	tokio::time::sleep(Duration::from_millis(20)).await;
	upper.complete();
	assert!(!waiting.is_finished(), "one open side keeps the zip alive");
	lower.complete();
	let (moved, mut cursor) = tokio::time::timeout(DEADLINE, waiting).await.unwrap().unwrap();
	assert_eq!(moved, Ok(false));

	assert!(lower.add(7, 70).is_err());
	assert_eq!(cursor.move_next_async(&CancellationToken::new()).await, Ok(false));
	assert_eq!(upper.subscribers() + lower.subscribers(), 0);
}

#[tokio::test]
async fn completed_series_with_pending_data_still_yields_it() {
	let series: Series<i32, i32> = [(1, 1), (2, 2)].into_iter().collect();
	series.complete();
	let mut cursor = series.cursor();
	let cancel = CancellationToken::new();
	assert_eq!(cursor.move_next_async(&cancel).await, Ok(true));
	assert_eq!(cursor.move_next_async(&cancel).await, Ok(true));
	assert_eq!(cursor.move_next_async(&cancel).await, Ok(false));
	assert_eq!(cursor.current(), (2, 2));
}

#[tokio::test]
async fn cancellation_surfaces_and_unsubscribes() {
	let series = Series::<i32, i32>::new();
	let mut cursor = series.cursor();
	let cancel = CancellationToken::new();

	let trigger = cancel.clone();
	let observer = series.clone();
	let canceller = tokio::spawn(async move {
		while observer.subscribers() == 0 {
			tokio::task::yield_now().await;
		}
		trigger.cancel();
	});

	let moved = tokio::time::timeout(DEADLINE, cursor.move_next_async(&cancel)).await.unwrap();
	assert_eq!(moved, Err(CursorError::Cancelled));
	canceller.await.unwrap();
	assert_eq!(series.subscribers(), 0);

	// an already cancelled token never waits
	assert_eq!(cursor.move_next_async(&cancel).await, Err(CursorError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_cursor_streams_every_entry_once() {
	let series = Series::<u32, u32>::new();
	let writer = {
		let series = series.clone();
		tokio::spawn(async move {
			for i in 0..200 {
				series.add_last(i, i * 10).unwrap();
				if i % 16 == 0 {
					tokio::task::yield_now().await;
				}
			}
			series.complete();
		})
	};

	let mut reader = AsyncCursor::new(series.raw_cursor());
	let cancel = CancellationToken::new();
	let mut seen = Vec::new();
	while tokio::time::timeout(DEADLINE, reader.move_next(&cancel)).await.unwrap().unwrap() {
		let (key, value) = reader.current();
		assert_eq!(value, key * 10);
		seen.push(key);
	}
	writer.await.unwrap();

	assert_eq!(seen, (0..200).collect::<Vec<_>>());
	assert_eq!(reader.subscriptions(), 0);
	assert_eq!(series.subscribers(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_waiters_on_one_series() {
	let series = Series::<u32, u32>::new();
	let cancel = CancellationToken::new();
	let readers: Vec<_> = (0..8)
		.map(|_| {
			let mut cursor = series.cursor().map_values(|v| v + 1);
			let cancel = cancel.clone();
			tokio::spawn(async move {
				let mut sum = 0;
				while cursor.move_next_async(&cancel).await.unwrap() {
					sum += cursor.current_value();
				}
				sum
			})
		})
		.collect();

	for i in 0..50 {
		series.add_last(i, i).unwrap();
		tokio::task::yield_now().await;
	}
	series.complete();

	let expected: u32 = (0..50).map(|i| i + 1).sum();
	for reader in readers {
		assert_eq!(tokio::time::timeout(DEADLINE, reader).await.unwrap().unwrap(), expected);
	}
	assert_eq!(series.subscribers(), 0);
}
