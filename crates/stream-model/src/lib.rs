//! Stream & Sample Data Model
//!
//! A [`Stream`] is one chunk of a multi-channel time series: a contiguous,
//! interleaved block of `length * channel_count` scalars of one fixed
//! [`ElementType`], stamped with a sample rate and the absolute time of its
//! first sample. A [`Sample`] bundles several time-aligned streams under a
//! single label for offline dataset work.

mod element;
mod error;
mod sample;
mod stream;

pub use element::{Element, ElementType};
pub use error::StreamError;
pub use sample::{Sample, GARBAGE_CLASS_ID, GARBAGE_USER_ID, INVALID_SCORE};
pub use stream::{Adjustment, Stream};
