//! Concurrent push/get isolation

use ring_buffer::{BufferConfig, ReadStatus, TimeRingBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use stream_model::ElementType;

const CHANNELS: usize = 4;
const RATE: f64 = 1000.0;

fn frames(from: u64, count: usize) -> Vec<u64> {
    (from..from + count as u64)
        .flat_map(|i| std::iter::repeat(i).take(CHANNELS))
        .collect()
}

#[test]
fn test_reads_never_observe_torn_pushes() {
    let buffer = Arc::new(
        TimeRingBuffer::new(BufferConfig {
            capacity_seconds: 0.5,
            sample_rate: RATE,
            channel_count: CHANNELS,
            element_type: ElementType::UInt64,
        })
        .unwrap(),
    );
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let buffer = Arc::clone(&buffer);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut next = 0u64;
            for chunk in [1usize, 7, 64, 333, 3].iter().cycle().take(2000) {
                buffer.push_samples(&frames(next, *chunk)).unwrap();
                next += *chunk as u64;
            }
            done.store(true, Ordering::Release);
            next
        })
    };

    let consumers: Vec<_> = (0..3)
        .map(|c| {
            let buffer = Arc::clone(&buffer);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut out = vec![0u64; 600 * CHANNELS];
                let mut reads = 0usize;
                while !done.load(Ordering::Acquire) {
                    let Some(end) = buffer.end_time() else {
                        continue;
                    };
                    let start = (end - 0.3 - c as f64 * 0.05).max(0.0);
                    let r = buffer.get_into(&mut out, start, 0.3).unwrap();
                    if r.status == ReadStatus::NotAvailable {
                        continue;
                    }
                    for (k, frame) in out[..r.copied * CHANNELS].chunks_exact(CHANNELS).enumerate() {
                        let expected = r.first_index + k as u64;
                        assert!(
                            frame.iter().all(|&v| v == expected),
                            "torn sample at {}: {:?}",
                            expected,
                            frame
                        );
                    }
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    let pushed = producer.join().unwrap();
    for c in consumers {
        c.join().unwrap();
    }
    assert_eq!(buffer.total_pushed(), pushed);
}

#[test]
fn test_concurrent_readers_see_same_window() {
    let buffer = Arc::new(
        TimeRingBuffer::new(BufferConfig {
            capacity_seconds: 1.0,
            sample_rate: RATE,
            channel_count: CHANNELS,
            element_type: ElementType::UInt64,
        })
        .unwrap(),
    );
    buffer.push_samples(&frames(0, 800)).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || {
                let mut out = vec![0u64; 200 * CHANNELS];
                let r = buffer.get_into(&mut out, 0.25, 0.2).unwrap();
                assert_eq!(r.status, ReadStatus::Success);
                out
            })
        })
        .collect();

    let results: Vec<_> = readers.into_iter().map(|r| r.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0], frames(250, 200));
}
