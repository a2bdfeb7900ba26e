use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use strand_series::{AppendOption, AsyncCursor, Cursor, Series, SeriesConfig};
use tokio_util::sync::CancellationToken;

const WIDTH: u32 = 16;
const GENERATIONS: u32 = 400;

fn generation(value: u32) -> impl Iterator<Item = (u32, u32)> {
	(0..WIDTH).map(move |key| (key, value))
}

#[test]
fn readers_never_observe_half_written_generations() {
	crate::common::init_tracing();
	let config = SeriesConfig::default().with_snapshot_chunk(3).with_read_retry_limit(8);
	let series = Series::<u32, u32>::with_config(config);
	series.append(generation(0), AppendOption::RejectOnOverlap).unwrap();
	let done = Arc::new(AtomicBool::new(false));

	let readers: Vec<_> = (0..4)
		.map(|_| {
			let series = series.clone();
			let done = Arc::clone(&done);
			thread::spawn(move || {
				let mut checked = 0;
				while !done.load(Ordering::Acquire) {
					let snapshot = series.snapshot();
					assert_eq!(snapshot.len(), WIDTH as usize);
					let value = snapshot[0].1;
					assert!(snapshot.iter().all(|(_, v)| *v == value), "mixed generations in {snapshot:?}");
					assert!(snapshot.iter().map(|(k, _)| *k).eq(0..WIDTH));
					checked += 1;
				}
				checked
			})
		})
		.collect();

	for value in 1..=GENERATIONS {
		series.append(generation(value), AppendOption::DropOldOverlap).unwrap();
		if value % 32 == 0 {
			thread::sleep(Duration::from_millis(1));
		}
	}
	done.store(true, Ordering::Release);

	for reader in readers {
		assert!(reader.join().unwrap() > 0);
	}
	assert_eq!(series.last(), Some((WIDTH - 1, GENERATIONS)));
	assert_eq!(series.version(), u64::from(GENERATIONS) + 1);
}

#[test]
fn cursor_steps_stay_ordered_while_writers_append() {
	let series = Series::<u32, u32>::new();
	let writers: Vec<_> = (0..3)
		.map(|lane| {
			let series = series.clone();
			thread::spawn(move || {
				for i in 0..300 {
					let key = i * 3 + lane;
					series.set(key, key).unwrap();
				}
			})
		})
		.collect();

	let mut cursor = series.cursor();
	let mut last = None;
	let mut seen = 0;
	while seen < 100 {
		if cursor.move_next() {
			let (key, value) = cursor.current();
			assert_eq!(key, value);
			assert!(last.is_none_or(|prev| prev < key));
			last = Some(key);
			seen += 1;
		} else {
			thread::yield_now();
		}
	}

	for writer in writers {
		writer.join().unwrap();
	}
	assert_eq!(series.len(), 900);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn async_consumers_follow_a_blocking_producer() {
	let series = Series::<u64, u64>::new();
	let cancel = CancellationToken::new();

	let consumers: Vec<_> = (0..3)
		.map(|_| {
			let mut reader = AsyncCursor::new(series.raw_cursor());
			let cancel = cancel.clone();
			tokio::spawn(async move {
				let mut keys = Vec::new();
				while reader.move_next(&cancel).await.unwrap() {
					keys.push(reader.current().0);
				}
				keys
			})
		})
		.collect();

	let producer = {
		let series = series.clone();
		tokio::task::spawn_blocking(move || {
			for chunk in (0..1000u64).collect::<Vec<_>>().chunks(50) {
				let entries = chunk.iter().map(|&k| (k, k * k));
				series.append(entries, AppendOption::RejectOnOverlap).unwrap();
			}
			series.complete();
		})
	};

	producer.await.unwrap();
	for consumer in consumers {
		let keys = tokio::time::timeout(Duration::from_secs(10), consumer).await.unwrap().unwrap();
		assert_eq!(keys, (0..1000).collect::<Vec<_>>());
	}
	assert_eq!(series.subscribers(), 0);
}
