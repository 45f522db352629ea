//! Time-Indexed Ring Buffer Implementation

use crate::read::{ReadResult, ReadStatus};
use crate::BufferError;
use serde::{Deserialize, Serialize};
use stream_model::{Element, ElementType, Stream};
use sync_primitives::ExclusiveLock;
use tracing::{debug, info};

/// Default retained history in seconds
pub const DEFAULT_CAPACITY_SECONDS: f64 = 10.0;

/// Tolerance (in samples) when mapping a time to a sample index, so that
/// e.g. `0.29 s * 100 Hz` lands on sample 29 rather than 28.
const INDEX_EPSILON: f64 = 1e-6;

/// Shape and size of a ring buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Retained history in seconds
    pub capacity_seconds: f64,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Channels per sample
    pub channel_count: usize,
    /// Scalar type of every channel
    pub element_type: ElementType,
}

impl BufferConfig {
    /// Buffer matching the shape of `stream`, retaining `capacity_seconds`
    pub fn for_stream(stream: &Stream, capacity_seconds: f64) -> Self {
        Self {
            capacity_seconds,
            sample_rate: stream.sample_rate(),
            channel_count: stream.channel_count(),
            element_type: stream.element_type(),
        }
    }

    /// Capacity in samples: `capacity_seconds * sample_rate`, rounded up
    pub fn capacity_samples(&self) -> usize {
        let raw = self.capacity_seconds * self.sample_rate;
        let nearest = raw.round();
        if (raw - nearest).abs() < INDEX_EPSILON {
            nearest as usize
        } else {
            raw.ceil() as usize
        }
    }

    fn validate(&self) -> Result<(), BufferError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(BufferError::InvalidConfig(format!(
                "sample rate {} Hz",
                self.sample_rate
            )));
        }
        if self.channel_count == 0 {
            return Err(BufferError::InvalidConfig("zero channels".to_string()));
        }
        if !self.capacity_seconds.is_finite()
            || self.capacity_seconds <= 0.0
            || self.capacity_samples() == 0
        {
            return Err(BufferError::InvalidConfig(format!(
                "capacity of {} s holds no samples at {} Hz",
                self.capacity_seconds, self.sample_rate
            )));
        }
        Ok(())
    }
}

/// Point-in-time statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferStats {
    pub capacity_samples: usize,
    pub retained_samples: usize,
    pub total_pushed: u64,
    pub total_evicted: u64,
    /// Absolute time of the oldest retained sample
    pub start_time: Option<f64>,
    /// Absolute time one sample past the newest
    pub end_time: Option<f64>,
}

/// Mutable state, only touched under the buffer's lock
struct RingState {
    /// `capacity * frame_bytes` bytes, written circularly
    storage: Vec<u8>,
    /// Absolute time of logical sample 0, fixed by the first push
    origin: Option<f64>,
    /// Write cursor: logical samples written so far
    written: u64,
    /// Samples below this index were discarded by `clear`
    floor: u64,
    /// Whether eviction has started (logged once)
    evicting: bool,
}

impl RingState {
    fn retained_start(&self, capacity: usize) -> u64 {
        self.written.saturating_sub(capacity as u64).max(self.floor)
    }
}

/// Single-producer, multi-consumer ring buffer indexed by absolute time.
///
/// Logical sample `i` has time `origin + i / sample_rate`. The write
/// cursor only grows; the physical slot of sample `i` is `i % capacity`.
/// Every `push` and `get` holds the lock exactly for its memory copy.
pub struct TimeRingBuffer {
    config: BufferConfig,
    /// Capacity in samples
    capacity: usize,
    /// Bytes per sample
    frame_bytes: usize,
    state: ExclusiveLock<RingState>,
}

impl TimeRingBuffer {
    /// Create a buffer; fails on zero capacity or an invalid shape
    pub fn new(config: BufferConfig) -> Result<Self, BufferError> {
        config.validate()?;
        let capacity = config.capacity_samples();
        let frame_bytes = config.channel_count * config.element_type.size();

        info!(
            "Creating ring buffer: {} samples ({} s at {} Hz), {}x{}",
            capacity, config.capacity_seconds, config.sample_rate, config.channel_count, config.element_type
        );

        Ok(Self {
            config,
            capacity,
            frame_bytes,
            state: ExclusiveLock::new(RingState {
                storage: vec![0; capacity * frame_bytes],
                origin: None,
                written: 0,
                floor: 0,
                evicting: false,
            }),
        })
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Capacity in samples
    pub fn capacity_samples(&self) -> usize {
        self.capacity
    }

    /// Bytes per sample
    pub fn frame_bytes(&self) -> usize {
        self.frame_bytes
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    /// Append raw interleaved samples. The first push anchors time at 0.0.
    /// Returns the number of samples appended.
    pub fn push(&self, data: &[u8]) -> Result<usize, BufferError> {
        self.push_inner(None, data)
    }

    /// Append raw samples; if this is the first push, sample 0 is stamped
    /// `start_time`. Later pushes always continue at the write cursor.
    pub fn push_at(&self, start_time: f64, data: &[u8]) -> Result<usize, BufferError> {
        if !start_time.is_finite() {
            return Err(BufferError::InvalidQuery(format!("start time {}", start_time)));
        }
        self.push_inner(Some(start_time), data)
    }

    /// Append typed interleaved values
    pub fn push_samples<T: Element>(&self, values: &[T]) -> Result<usize, BufferError> {
        self.check_type::<T>()?;
        self.push_inner(None, bytemuck::cast_slice(values))
    }

    /// Append a whole stream chunk; its start time anchors the first push
    pub fn push_stream(&self, stream: &Stream) -> Result<usize, BufferError> {
        self.check_stream(stream)?;
        self.push_at(stream.start_time(), stream.bytes())
    }

    fn push_inner(&self, start_time: Option<f64>, data: &[u8]) -> Result<usize, BufferError> {
        let fb = self.frame_bytes;
        if data.len() % fb != 0 {
            return Err(BufferError::PartialSample {
                bytes: data.len(),
                frame_bytes: fb,
            });
        }
        let count = data.len() / fb;
        let cap = self.capacity;

        // Samples that would be overwritten within this same push are skipped
        let skip = count.saturating_sub(cap);
        let mut src = &data[skip * fb..];

        let mut state = self.state.acquire();
        if state.origin.is_none() {
            let origin = start_time.unwrap_or(0.0);
            debug!("Ring buffer time origin set to {} s", origin);
            state.origin = Some(origin);
        }

        let mut index = state.written + skip as u64;
        while !src.is_empty() {
            let pos = (index % cap as u64) as usize;
            let n = (cap - pos).min(src.len() / fb);
            state.storage[pos * fb..(pos + n) * fb].copy_from_slice(&src[..n * fb]);
            src = &src[n * fb..];
            index += n as u64;
        }
        state.written += count as u64;

        if !state.evicting && state.written > cap as u64 {
            state.evicting = true;
            debug!("Ring buffer full after {} samples, evicting oldest", state.written);
        }

        Ok(count)
    }

    /// Copy the window `[query_time, query_time + duration)` into `out`.
    ///
    /// The requested sample range is
    /// `[floor(query_time * rate), floor((query_time + duration) * rate))`
    /// relative to the time origin, clamped to the retained range and to
    /// the `out.len() / frame_bytes` samples `out` can hold. Only valid
    /// samples are copied; nothing is padded.
    pub fn get(&self, out: &mut [u8], query_time: f64, duration: f64) -> Result<ReadResult, BufferError> {
        let fb = self.frame_bytes;
        if out.len() % fb != 0 {
            return Err(BufferError::PartialSample {
                bytes: out.len(),
                frame_bytes: fb,
            });
        }
        check_query(query_time, duration)?;
        let max_samples = out.len() / fb;
        let cap = self.capacity as u64;
        let rate = self.config.sample_rate;

        let state = self.state.acquire();
        let Some(origin) = state.origin else {
            return Ok(ReadResult::not_initialized());
        };

        // Widened so that saturated indices of extreme windows cannot overflow
        let req_start = i128::from(index_at(origin, rate, query_time));
        let req_end = i128::from(index_at(origin, rate, query_time + duration)).max(req_start);
        let requested = sample_count(req_end - req_start);

        let kept_start = i128::from(state.retained_start(self.capacity));
        let kept_end = i128::from(state.written);

        let lo = req_start.max(kept_start);
        let hi = req_end.min(kept_end);
        let missing_after = sample_count(req_end - kept_end.max(req_start));

        if lo >= hi {
            let missing_before = requested.saturating_sub(missing_after);
            let status = if requested == 0 {
                ReadStatus::Success
            } else {
                ReadStatus::NotAvailable
            };
            return Ok(ReadResult {
                status,
                requested,
                copied: 0,
                first_index: lo.max(0) as u64,
                start_time: origin + lo as f64 / rate,
                missing_before,
                missing_after,
            });
        }

        let missing_before = sample_count(lo - req_start);
        let copied = sample_count(hi - lo).min(max_samples);

        let mut index = lo as u64;
        let mut dst = &mut out[..copied * fb];
        while !dst.is_empty() {
            let pos = (index % cap) as usize;
            let n = (self.capacity - pos).min(dst.len() / fb);
            let (head, tail) = dst.split_at_mut(n * fb);
            head.copy_from_slice(&state.storage[pos * fb..(pos + n) * fb]);
            dst = tail;
            index += n as u64;
        }
        drop(state);

        let status = if copied == requested {
            ReadStatus::Success
        } else {
            ReadStatus::Partial
        };
        Ok(ReadResult {
            status,
            requested,
            copied,
            first_index: lo as u64,
            start_time: origin + lo as f64 / rate,
            missing_before,
            missing_after,
        })
    }

    /// Typed variant of [`get`](Self::get)
    pub fn get_into<T: Element>(
        &self,
        out: &mut [T],
        query_time: f64,
        duration: f64,
    ) -> Result<ReadResult, BufferError> {
        self.check_type::<T>()?;
        self.get(bytemuck::cast_slice_mut(out), query_time, duration)
    }

    /// Read a window into `out`, resizing it to the copied sample count and
    /// stamping it with the time of its first sample.
    pub fn get_stream(
        &self,
        out: &mut Stream,
        query_time: f64,
        duration: f64,
    ) -> Result<ReadResult, BufferError> {
        self.check_stream(out)?;
        if let Err(e) = check_query(query_time, duration) {
            out.adjust(0);
            return Err(e);
        }
        // Allocate outside the lock; a window never spans more than this
        let span = (duration * self.config.sample_rate).ceil() + 1.0;
        let upper = if span < self.capacity as f64 {
            span as usize
        } else {
            self.capacity
        };
        out.adjust(upper);
        let result = self.get(out.bytes_mut(), query_time, duration);
        match &result {
            Ok(r) => {
                out.adjust(r.copied);
                out.set_start_time(r.start_time);
            }
            Err(_) => {
                out.adjust(0);
            }
        }
        result
    }

    /// Time origin, once established
    pub fn origin(&self) -> Option<f64> {
        self.state.acquire().origin
    }

    /// Whether a push has established the time origin
    pub fn is_initialized(&self) -> bool {
        self.origin().is_some()
    }

    /// Logical index range `[first, end)` currently retained
    pub fn retained_range(&self) -> Option<(u64, u64)> {
        let state = self.state.acquire();
        state.origin?;
        Some((state.retained_start(self.capacity), state.written))
    }

    /// Absolute time one sample past the newest written sample
    pub fn end_time(&self) -> Option<f64> {
        let state = self.state.acquire();
        state
            .origin
            .map(|origin| origin + state.written as f64 / self.config.sample_rate)
    }

    /// Samples pushed since creation
    pub fn total_pushed(&self) -> u64 {
        self.state.acquire().written
    }

    /// Samples overwritten by newer data
    pub fn total_evicted(&self) -> u64 {
        self.state.acquire().written.saturating_sub(self.capacity as u64)
    }

    /// Retained fraction of capacity (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        let state = self.state.acquire();
        let retained = state.written - state.retained_start(self.capacity);
        retained as f64 / self.capacity as f64
    }

    /// Forget all retained samples. The time origin and write cursor are
    /// kept, so later pushes continue the same timeline.
    pub fn clear(&self) {
        let mut state = self.state.acquire();
        state.floor = state.written;
    }

    /// Snapshot of counters and retained time span
    pub fn stats(&self) -> BufferStats {
        let state = self.state.acquire();
        let rate = self.config.sample_rate;
        let first = state.retained_start(self.capacity);
        BufferStats {
            capacity_samples: self.capacity,
            retained_samples: (state.written - first) as usize,
            total_pushed: state.written,
            total_evicted: state.written.saturating_sub(self.capacity as u64),
            start_time: state.origin.map(|o| o + first as f64 / rate),
            end_time: state.origin.map(|o| o + state.written as f64 / rate),
        }
    }

    fn check_type<T: Element>(&self) -> Result<(), BufferError> {
        if T::TYPE != self.config.element_type {
            return Err(BufferError::TypeMismatch {
                expected: self.config.element_type,
                actual: T::TYPE,
            });
        }
        Ok(())
    }

    fn check_stream(&self, stream: &Stream) -> Result<(), BufferError> {
        if stream.element_type() != self.config.element_type {
            return Err(BufferError::TypeMismatch {
                expected: self.config.element_type,
                actual: stream.element_type(),
            });
        }
        if stream.channel_count() != self.config.channel_count {
            return Err(BufferError::ShapeMismatch(format!(
                "stream has {} channels, buffer has {}",
                stream.channel_count(),
                self.config.channel_count
            )));
        }
        if (stream.sample_rate() - self.config.sample_rate).abs() > f64::EPSILON * self.config.sample_rate {
            return Err(BufferError::ShapeMismatch(format!(
                "stream rate {} Hz, buffer rate {} Hz",
                stream.sample_rate(),
                self.config.sample_rate
            )));
        }
        Ok(())
    }
}

fn check_query(query_time: f64, duration: f64) -> Result<(), BufferError> {
    if !query_time.is_finite() || !duration.is_finite() || duration < 0.0 {
        return Err(BufferError::InvalidQuery(format!(
            "time {} duration {}",
            query_time, duration
        )));
    }
    Ok(())
}

/// Non-negative sample span, saturating at `usize::MAX`
fn sample_count(span: i128) -> usize {
    usize::try_from(span.max(0)).unwrap_or(usize::MAX)
}

fn index_at(origin: f64, rate: f64, time: f64) -> i64 {
    ((time - origin) * rate + INDEX_EPSILON).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn mono_f32(capacity_seconds: f64, rate: f64) -> TimeRingBuffer {
        TimeRingBuffer::new(BufferConfig {
            capacity_seconds,
            sample_rate: rate,
            channel_count: 1,
            element_type: ElementType::Float32,
        })
        .unwrap()
    }

    fn ramp(from: usize, to: usize) -> Vec<f32> {
        (from..to).map(|v| v as f32).collect()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let base = BufferConfig {
            capacity_seconds: 1.0,
            sample_rate: 100.0,
            channel_count: 1,
            element_type: ElementType::Float32,
        };
        for bad in [
            BufferConfig { capacity_seconds: 0.0, ..base.clone() },
            BufferConfig { capacity_seconds: 1e-9, ..base.clone() },
            BufferConfig { sample_rate: 0.0, ..base.clone() },
            BufferConfig { sample_rate: f64::INFINITY, ..base.clone() },
            BufferConfig { channel_count: 0, ..base.clone() },
        ] {
            assert!(matches!(
                TimeRingBuffer::new(bad),
                Err(BufferError::InvalidConfig(_))
            ));
        }
        assert_eq!(base.capacity_samples(), 100);
    }

    #[test]
    fn test_not_initialized_before_first_push() {
        let buffer = mono_f32(1.0, 100.0);
        let mut out = [0f32; 10];
        let r = buffer.get_into(&mut out, 0.0, 0.1).unwrap();
        assert_eq!(r.status, ReadStatus::NotInitialized);
        assert_eq!(r.copied, 0);
        assert!(r.is_pending());
        assert!(buffer.retained_range().is_none());
    }

    #[test]
    fn test_window_from_start() {
        // 100 samples at 100 Hz, read the first half second
        let buffer = mono_f32(2.0, 100.0);
        let data = ramp(0, 100);
        buffer.push_samples(&data).unwrap();

        let mut out = vec![0f32; 100];
        let r = buffer.get_into(&mut out, 0.0, 0.5).unwrap();
        assert_eq!(r.status, ReadStatus::Success);
        assert_eq!(r.copied, 50);
        assert_eq!(&out[..50], &data[..50]);
    }

    #[test]
    fn test_eviction_window() {
        // 1 s capacity at 100 Hz, 150 samples pushed: 50..150 retained
        let buffer = mono_f32(1.0, 100.0);
        for chunk in ramp(0, 150).chunks(10) {
            buffer.push_samples(chunk).unwrap();
        }
        assert_eq!(buffer.retained_range(), Some((50, 150)));
        assert_eq!(buffer.total_evicted(), 50);

        let mut out = vec![0f32; 100];
        let old = buffer.get_into(&mut out, 0.0, 0.2).unwrap();
        assert_eq!(old.status, ReadStatus::NotAvailable);
        assert_eq!(old.copied, 0);
        assert!(old.is_evicted());

        let recent = buffer.get_into(&mut out, 1.3, 0.2).unwrap();
        assert_eq!(recent.status, ReadStatus::Success);
        assert_eq!(recent.copied, 20);
        assert_eq!(&out[..20], &ramp(130, 150)[..]);
    }

    #[test]
    fn test_partial_returns_intersection_only() {
        let buffer = mono_f32(1.0, 100.0);
        buffer.push_samples(&ramp(0, 150)).unwrap();

        let mut out = vec![-1f32; 100];
        // Head evicted: [40, 60) with 50.. retained
        let r = buffer.get_into(&mut out, 0.4, 0.2).unwrap();
        assert_eq!(r.status, ReadStatus::Partial);
        assert_eq!((r.requested, r.copied), (20, 10));
        assert_eq!((r.missing_before, r.missing_after), (10, 0));
        assert_eq!(r.first_index, 50);
        assert!((r.start_time - 0.5).abs() < 1e-9);
        assert_eq!(&out[..10], &ramp(50, 60)[..]);
        assert_eq!(out[10], -1.0);

        // Tail not yet written: [140, 160)
        let r = buffer.get_into(&mut out, 1.4, 0.2).unwrap();
        assert_eq!(r.status, ReadStatus::Partial);
        assert_eq!((r.missing_before, r.missing_after, r.copied), (0, 10, 10));
        assert!(r.is_pending());
        assert_eq!(&out[..10], &ramp(140, 150)[..]);
    }

    #[test]
    fn test_future_window_not_available() {
        let buffer = mono_f32(1.0, 100.0);
        buffer.push_samples(&ramp(0, 10)).unwrap();
        let mut out = vec![0f32; 10];
        let r = buffer.get_into(&mut out, 5.0, 0.1).unwrap();
        assert_eq!(r.status, ReadStatus::NotAvailable);
        assert_eq!(r.missing_after, 10);
        assert!(r.is_pending());
    }

    #[test]
    fn test_output_buffer_limits_copy() {
        let buffer = mono_f32(1.0, 100.0);
        buffer.push_samples(&ramp(0, 50)).unwrap();
        let mut out = vec![0f32; 5];
        let r = buffer.get_into(&mut out, 0.0, 0.2).unwrap();
        assert_eq!(r.status, ReadStatus::Partial);
        assert_eq!(r.copied, 5);
        assert_eq!(r.missing_after, 0);
        assert_eq!(out, ramp(0, 5));
    }

    #[test]
    fn test_origin_from_first_stream() {
        let buffer = mono_f32(1.0, 10.0);
        let chunk = Stream::from_slice(&ramp(0, 5), 1, 10.0, 100.0).unwrap();
        buffer.push_stream(&chunk).unwrap();
        // Later start times do not move the timeline
        let chunk = Stream::from_slice(&ramp(5, 10), 1, 10.0, 999.0).unwrap();
        buffer.push_stream(&chunk).unwrap();

        assert_eq!(buffer.origin(), Some(100.0));
        assert!((buffer.end_time().unwrap() - 101.0).abs() < 1e-9);

        let mut out = Stream::empty(1, ElementType::Float32, 10.0).unwrap();
        let r = buffer.get_stream(&mut out, 100.2, 0.5).unwrap();
        assert_eq!(r.status, ReadStatus::Success);
        assert_eq!(out.as_slice::<f32>().unwrap(), &ramp(2, 7)[..]);
        assert!((out.start_time() - 100.2).abs() < 1e-9);
    }

    #[test]
    fn test_shape_checks() {
        let buffer = mono_f32(1.0, 10.0);
        assert!(matches!(
            buffer.push_samples(&[1i32, 2]),
            Err(BufferError::TypeMismatch { .. })
        ));
        assert!(matches!(
            buffer.push(&[0u8; 3]),
            Err(BufferError::PartialSample { .. })
        ));
        let stereo = Stream::new(4, 2, ElementType::Float32, 10.0, 0.0).unwrap();
        assert!(matches!(
            buffer.push_stream(&stereo),
            Err(BufferError::ShapeMismatch(_))
        ));
        let fast = Stream::new(4, 1, ElementType::Float32, 20.0, 0.0).unwrap();
        assert!(matches!(
            buffer.push_stream(&fast),
            Err(BufferError::ShapeMismatch(_))
        ));
        let mut out = [0f32; 2];
        assert!(matches!(
            buffer.get_into(&mut out, 0.0, -1.0),
            Err(BufferError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_multichannel_wraparound() {
        let buffer = TimeRingBuffer::new(BufferConfig {
            capacity_seconds: 0.4,
            sample_rate: 10.0,
            channel_count: 3,
            element_type: ElementType::Int16,
        })
        .unwrap();
        let values: Vec<i16> = (0..30).collect();
        buffer.push_samples(&values[..9]).unwrap();
        buffer.push_samples(&values[9..]).unwrap();

        let mut out = vec![0i16; 12];
        let r = buffer.get_into(&mut out, 0.6, 0.4).unwrap();
        assert_eq!(r.status, ReadStatus::Success);
        assert_eq!(out, values[18..30]);
    }

    #[test]
    fn test_clear_keeps_timeline() {
        let buffer = mono_f32(1.0, 10.0);
        buffer.push_samples(&ramp(0, 5)).unwrap();
        buffer.clear();
        assert_eq!(buffer.fill_ratio(), 0.0);

        buffer.push_samples(&ramp(5, 8)).unwrap();
        let mut out = vec![0f32; 10];
        let r = buffer.get_into(&mut out, 0.0, 1.0).unwrap();
        assert_eq!(r.status, ReadStatus::Partial);
        assert_eq!(r.first_index, 5);
        assert_eq!(&out[..3], &[5.0, 6.0, 7.0]);
    }

    #[test]
    fn test_stats() {
        let buffer = mono_f32(1.0, 10.0);
        buffer.push_samples(&ramp(0, 25)).unwrap();
        let stats = buffer.stats();
        assert_eq!(stats.capacity_samples, 10);
        assert_eq!(stats.retained_samples, 10);
        assert_eq!(stats.total_pushed, 25);
        assert_eq!(stats.total_evicted, 15);
        assert!((stats.start_time.unwrap() - 1.5).abs() < 1e-9);
        assert!((stats.end_time.unwrap() - 2.5).abs() < 1e-9);
        assert_eq!(buffer.fill_ratio(), 1.0);
    }

    #[test]
    fn test_get_stream_unbounded_duration() {
        let buffer = mono_f32(1.0, 100.0);
        buffer.push_samples(&ramp(0, 100)).unwrap();
        let mut out = Stream::empty(1, ElementType::Float32, 100.0).unwrap();

        assert!(matches!(
            buffer.get_stream(&mut out, 0.0, f64::INFINITY),
            Err(BufferError::InvalidQuery(_))
        ));
        assert!(out.is_empty());

        // Huge but finite: everything retained, the rest is in the future
        let r = buffer.get_stream(&mut out, 0.0, 1e30).unwrap();
        assert_eq!(r.status, ReadStatus::Partial);
        assert_eq!(r.copied, 100);
        assert!(r.missing_after > 0);
        assert_eq!(out.as_slice::<f32>().unwrap(), &ramp(0, 100)[..]);
    }

    #[test]
    fn test_extreme_window_saturates() {
        let buffer = mono_f32(1.0, 100.0);
        buffer.push_samples(&ramp(0, 100)).unwrap();
        let mut out = vec![0f32; 100];

        let r = buffer.get_into(&mut out, -1e300, 2e300).unwrap();
        assert_eq!(r.status, ReadStatus::Partial);
        assert_eq!(r.copied, 100);
        assert_eq!(r.first_index, 0);
        assert!(r.missing_before > 0 && r.missing_after > 0);
        assert_eq!(out, ramp(0, 100));
    }

    proptest! {
        #[test]
        fn prop_retained_window_independent_of_chunking(
            total in 1usize..400,
            chunk_a in 1usize..64,
            chunk_b in 1usize..64,
        ) {
            let data = ramp(0, total);
            let a = mono_f32(1.0, 100.0);
            let b = mono_f32(1.0, 100.0);
            for c in data.chunks(chunk_a) { a.push_samples(c).unwrap(); }
            for c in data.chunks(chunk_b) { b.push_samples(c).unwrap(); }

            let mut out_a = vec![0f32; 100];
            let mut out_b = vec![0f32; 100];
            let ra = a.get_into(&mut out_a, 0.0, 10.0).unwrap();
            let rb = b.get_into(&mut out_b, 0.0, 10.0).unwrap();

            let kept = total.min(100);
            prop_assert_eq!(ra.copied, kept);
            prop_assert_eq!(rb.copied, kept);
            prop_assert_eq!(&out_a[..kept], &data[total - kept..]);
            prop_assert_eq!(&out_b[..kept], &data[total - kept..]);
        }

        #[test]
        fn prop_reads_return_only_pushed_samples(
            total in 1usize..300,
            start in 0usize..400,
            len in 0usize..150,
        ) {
            let buffer = mono_f32(1.0, 100.0);
            let data = ramp(0, total);
            for c in data.chunks(7) { buffer.push_samples(c).unwrap(); }

            let mut out = vec![f32::NAN; 200];
            let r = buffer.get_into(&mut out, start as f64 / 100.0, len as f64 / 100.0).unwrap();

            prop_assert_eq!(r.requested, len);
            prop_assert!(r.copied <= len);
            let first = r.first_index as usize;
            for (k, v) in out[..r.copied].iter().enumerate() {
                // Sample value equals its logical index
                prop_assert_eq!(*v, (first + k) as f32);
                prop_assert!(first + k >= start && first + k < start + len);
                prop_assert!(first + k + 100 >= total);
            }
            prop_assert!(out[r.copied..].iter().all(|v| v.is_nan()));
        }

        #[test]
        fn prop_reads_are_idempotent(
            total in 1usize..300,
            start in 0usize..300,
            len in 0usize..120,
        ) {
            let buffer = mono_f32(1.0, 100.0);
            buffer.push_samples(&ramp(0, total)).unwrap();
            let mut first = vec![0f32; 150];
            let mut second = vec![0f32; 150];
            let t = start as f64 / 100.0;
            let d = len as f64 / 100.0;
            let r1 = buffer.get_into(&mut first, t, d).unwrap();
            let r2 = buffer.get_into(&mut second, t, d).unwrap();
            prop_assert_eq!(r1, r2);
            prop_assert_eq!(first, second);
        }
    }
}
