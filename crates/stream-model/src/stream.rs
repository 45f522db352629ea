//! Stream: typed, multi-channel sample container

use crate::{Element, ElementType, StreamError};
use std::fmt;

/// Result of [`Stream::adjust`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    /// Requested length equals the current one
    Unchanged,
    /// Length changed within the existing allocation
    Resized,
    /// Backing storage was reallocated to fit the new length
    Reallocated,
}

/// One chunk of a multi-channel time series.
///
/// Samples are stored interleaved: sample `i`, channel `c` lives at scalar
/// offset `i * channel_count + c`. Storage is an owned arena with explicit
/// `capacity` and `length`; every accessor is bounded by `length`, so stale
/// bytes past the valid prefix are never exposed.
#[derive(Debug, Clone)]
pub struct Stream {
    /// 8-byte words so any element type can be viewed in place
    storage: Vec<u64>,
    /// Allocated sample slots
    capacity: usize,
    /// Valid samples
    length: usize,
    channel_count: usize,
    element_type: ElementType,
    sample_rate: f64,
    start_time: f64,
}

fn words_for(bytes: usize) -> usize {
    bytes.div_ceil(std::mem::size_of::<u64>())
}

fn validate_rate(sample_rate: f64) -> Result<(), StreamError> {
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(StreamError::InvalidRate(sample_rate));
    }
    Ok(())
}

impl Stream {
    /// Allocate a zero-filled stream of `length` samples
    pub fn new(
        length: usize,
        channel_count: usize,
        element_type: ElementType,
        sample_rate: f64,
        start_time: f64,
    ) -> Result<Self, StreamError> {
        validate_rate(sample_rate)?;
        if channel_count == 0 {
            return Err(StreamError::NoChannels);
        }
        let frame_bytes = channel_count * element_type.size();
        Ok(Self {
            storage: vec![0; words_for(length * frame_bytes)],
            capacity: length,
            length,
            channel_count,
            element_type,
            sample_rate,
            start_time,
        })
    }

    /// Allocate an empty stream with no backing storage
    pub fn empty(
        channel_count: usize,
        element_type: ElementType,
        sample_rate: f64,
    ) -> Result<Self, StreamError> {
        Self::new(0, channel_count, element_type, sample_rate, 0.0)
    }

    /// Build a stream from interleaved typed values
    pub fn from_slice<T: Element>(
        values: &[T],
        channel_count: usize,
        sample_rate: f64,
        start_time: f64,
    ) -> Result<Self, StreamError> {
        Self::from_bytes(
            bytemuck::cast_slice(values),
            channel_count,
            T::TYPE,
            sample_rate,
            start_time,
        )
    }

    /// Build a stream from raw interleaved bytes
    pub fn from_bytes(
        bytes: &[u8],
        channel_count: usize,
        element_type: ElementType,
        sample_rate: f64,
        start_time: f64,
    ) -> Result<Self, StreamError> {
        let mut stream = Self::new(0, channel_count, element_type, sample_rate, start_time)?;
        stream.extend_from_bytes(bytes)?;
        Ok(stream)
    }

    /// Valid samples
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the stream holds no valid samples
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Allocated sample slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    /// Bytes per scalar
    pub fn element_size(&self) -> usize {
        self.element_type.size()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Absolute time of sample 0 in seconds
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn set_start_time(&mut self, start_time: f64) {
        self.start_time = start_time;
    }

    /// Bytes per sample across all channels
    pub fn frame_bytes(&self) -> usize {
        self.channel_count * self.element_type.size()
    }

    /// `length * channel_count * element_size`
    pub fn total_bytes(&self) -> usize {
        self.length * self.frame_bytes()
    }

    /// Covered time span in seconds
    pub fn duration(&self) -> f64 {
        self.length as f64 / self.sample_rate
    }

    /// Absolute time one sample past the end
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration()
    }

    /// Valid bytes
    pub fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.storage)[..self.total_bytes()]
    }

    /// Valid bytes, mutable
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        let total = self.total_bytes();
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.storage)[..total]
    }

    /// Bytes of one sample (all channels)
    pub fn sample_bytes(&self, index: usize) -> Option<&[u8]> {
        if index >= self.length {
            return None;
        }
        let fb = self.frame_bytes();
        Some(&self.bytes()[index * fb..(index + 1) * fb])
    }

    /// Typed view of the valid scalars
    pub fn as_slice<T: Element>(&self) -> Result<&[T], StreamError> {
        self.check_type::<T>()?;
        Ok(bytemuck::cast_slice(self.bytes()))
    }

    /// Typed mutable view of the valid scalars
    pub fn as_mut_slice<T: Element>(&mut self) -> Result<&mut [T], StreamError> {
        self.check_type::<T>()?;
        Ok(bytemuck::cast_slice_mut(self.bytes_mut()))
    }

    fn check_type<T: Element>(&self) -> Result<(), StreamError> {
        if T::TYPE != self.element_type {
            return Err(StreamError::TypeMismatch {
                expected: self.element_type,
                actual: T::TYPE,
            });
        }
        Ok(())
    }

    /// Change the number of valid samples.
    ///
    /// Bytes up to `min(old, new)` samples are preserved. Storage is only
    /// reallocated when `length` exceeds the current capacity; samples
    /// exposed by growing inside the allocation are zeroed.
    pub fn adjust(&mut self, length: usize) -> Adjustment {
        if length == self.length {
            return Adjustment::Unchanged;
        }

        let fb = self.frame_bytes();
        if length <= self.capacity {
            if length > self.length {
                let words = bytemuck::cast_slice_mut::<u64, u8>(&mut self.storage);
                words[self.length * fb..length * fb].fill(0);
            }
            self.length = length;
            return Adjustment::Resized;
        }

        let mut storage = vec![0u64; words_for(length * fb)];
        let keep = self.total_bytes();
        bytemuck::cast_slice_mut::<u64, u8>(&mut storage)[..keep].copy_from_slice(self.bytes());
        self.storage = storage;
        self.capacity = length;
        self.length = length;
        Adjustment::Reallocated
    }

    /// Release the backing storage, keeping shape, rate and time
    pub fn reset(&mut self) {
        self.storage = Vec::new();
        self.capacity = 0;
        self.length = 0;
    }

    /// Zero every allocated byte
    pub fn zero(&mut self) {
        self.storage.fill(0);
    }

    /// Append raw interleaved samples
    pub fn extend_from_bytes(&mut self, bytes: &[u8]) -> Result<(), StreamError> {
        let fb = self.frame_bytes();
        if bytes.len() % fb != 0 {
            return Err(StreamError::PartialSample {
                bytes: bytes.len(),
                frame_bytes: fb,
            });
        }
        let offset = self.total_bytes();
        self.adjust(self.length + bytes.len() / fb);
        self.bytes_mut()[offset..].copy_from_slice(bytes);
        Ok(())
    }

    /// Same channel count and element type
    pub fn is_compatible(&self, other: &Stream) -> bool {
        self.channel_count == other.channel_count && self.element_type == other.element_type
    }

    /// Append all samples of `other`, which must share this stream's shape
    pub fn concat(&mut self, other: &Stream) -> Result<(), StreamError> {
        if !self.is_compatible(other) {
            return Err(StreamError::Incompatible(format!(
                "cannot append {}x{} to {}x{}",
                other.channel_count, other.element_type, self.channel_count, self.element_type
            )));
        }
        self.extend_from_bytes(other.bytes())
    }

    /// Sub-stream of samples `[from, to)`, time-stamped at its first sample
    pub fn copy_range(&self, from: usize, to: usize) -> Result<Stream, StreamError> {
        if to > self.length {
            return Err(StreamError::OutOfRange {
                what: "sample",
                index: to,
                len: self.length,
            });
        }
        if from > to {
            return Err(StreamError::OutOfRange {
                what: "sample",
                index: from,
                len: to,
            });
        }
        let fb = self.frame_bytes();
        let start_time = self.start_time + from as f64 / self.sample_rate;
        Stream::from_bytes(
            &self.bytes()[from * fb..to * fb],
            self.channel_count,
            self.element_type,
            self.sample_rate,
            start_time,
        )
    }

    /// New stream holding only `channels`, in the given order.
    /// An empty selection yields a full copy.
    pub fn select_channels(&self, channels: &[usize]) -> Result<Stream, StreamError> {
        if channels.is_empty() {
            return Ok(self.clone());
        }
        if let Some(&bad) = channels.iter().find(|&&c| c >= self.channel_count) {
            return Err(StreamError::OutOfRange {
                what: "channel",
                index: bad,
                len: self.channel_count,
            });
        }

        let es = self.element_size();
        let mut out = Stream::new(
            self.length,
            channels.len(),
            self.element_type,
            self.sample_rate,
            self.start_time,
        )?;
        let out_fb = out.frame_bytes();
        let dst = out.bytes_mut();
        for (i, frame) in self.bytes().chunks_exact(self.frame_bytes()).enumerate() {
            for (k, &c) in channels.iter().enumerate() {
                let d = i * out_fb + k * es;
                dst[d..d + es].copy_from_slice(&frame[c * es..(c + 1) * es]);
            }
        }
        Ok(out)
    }
}

impl PartialEq for Stream {
    /// Equal shape, rate, time and valid bytes; spare capacity is ignored
    fn eq(&self, other: &Self) -> bool {
        self.is_compatible(other)
            && self.sample_rate == other.sample_rate
            && self.start_time == other.start_time
            && self.bytes() == other.bytes()
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rate={} Hz dim={} bytes={} num={} ({}) dur={:.3}s time={:.3}s type={}",
            self.sample_rate,
            self.channel_count,
            self.element_size(),
            self.length,
            self.capacity,
            self.duration(),
            self.start_time,
            self.element_type
        )
    }
}
