//! Labeled multi-stream samples for offline dataset work

use crate::{Adjustment, Stream, StreamError};

/// Class id of samples that belong to no class
pub const GARBAGE_CLASS_ID: u32 = u32::MAX;
/// User id of samples recorded from no known user
pub const GARBAGE_USER_ID: u32 = u32::MAX;
/// Score of samples without a regression target
pub const INVALID_SCORE: f32 = f32::NAN;

/// One labeled observation: parallel streams sharing a start time, label and score
#[derive(Debug, Clone)]
pub struct Sample {
    streams: Vec<Stream>,
    pub user_id: u32,
    pub class_id: u32,
    pub score: f32,
    /// Time of the observation in seconds
    pub time: f64,
}

impl Sample {
    /// Bundle `streams` into a sample. All streams must share one start time.
    pub fn new(
        streams: Vec<Stream>,
        user_id: u32,
        class_id: u32,
        time: f64,
        score: f32,
    ) -> Result<Self, StreamError> {
        if let Some(first) = streams.first() {
            let expected = first.start_time();
            if let Some((index, s)) = streams
                .iter()
                .enumerate()
                .find(|(_, s)| s.start_time() != expected)
            {
                return Err(StreamError::Misaligned {
                    index,
                    time: s.start_time(),
                    expected,
                });
            }
        }
        Ok(Self {
            streams,
            user_id,
            class_id,
            score,
            time,
        })
    }

    /// Unlabeled sample over `streams`, timed at their common start
    pub fn unlabeled(streams: Vec<Stream>) -> Result<Self, StreamError> {
        let time = streams.first().map(Stream::start_time).unwrap_or(0.0);
        Self::new(streams, GARBAGE_USER_ID, GARBAGE_CLASS_ID, time, INVALID_SCORE)
    }

    /// Sample holding `copies` parallel copies of `source`, each of which
    /// may later be shortened or lengthened independently
    pub fn replicate(
        source: &Stream,
        copies: usize,
        user_id: u32,
        class_id: u32,
        score: f32,
    ) -> Self {
        Self {
            streams: vec![source.clone(); copies],
            user_id,
            class_id,
            score,
            time: source.start_time(),
        }
    }

    /// Number of member streams
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }

    pub fn stream(&self, index: usize) -> Option<&Stream> {
        self.streams.get(index)
    }

    /// Whether a regression score is attached
    pub fn has_score(&self) -> bool {
        !self.score.is_nan()
    }

    /// Whether the sample is labeled with a class
    pub fn has_class(&self) -> bool {
        self.class_id != GARBAGE_CLASS_ID
    }

    /// Change the length of one member stream; shape and start time are untouched
    pub fn adjust_stream(&mut self, index: usize, length: usize) -> Result<Adjustment, StreamError> {
        let len = self.streams.len();
        let stream = self.streams.get_mut(index).ok_or(StreamError::OutOfRange {
            what: "stream",
            index,
            len,
        })?;
        Ok(stream.adjust(length))
    }

    /// `n` independent deep copies of this sample
    pub fn duplicate(&self, n: usize) -> Vec<Sample> {
        vec![self.clone(); n]
    }

    /// Common start time of all member streams
    pub fn start_time(&self) -> Option<f64> {
        self.streams.first().map(Stream::start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementType;

    fn stream_at(time: f64, n: usize) -> Stream {
        Stream::new(n, 2, ElementType::Float32, 25.0, time).unwrap()
    }

    #[test]
    fn test_new_rejects_misaligned_streams() {
        let err = Sample::new(vec![stream_at(1.0, 4), stream_at(1.5, 4)], 0, 0, 1.0, 0.5)
            .unwrap_err();
        assert!(matches!(err, StreamError::Misaligned { index: 1, .. }));
    }

    #[test]
    fn test_unlabeled_defaults() {
        let sample = Sample::unlabeled(vec![stream_at(2.0, 1)]).unwrap();
        assert!(!sample.has_class());
        assert!(!sample.has_score());
        assert_eq!(sample.user_id, GARBAGE_USER_ID);
        assert_eq!(sample.time, 2.0);
    }

    #[test]
    fn test_replicate_and_adjust_copies_independently() {
        let source = Stream::from_slice(&[1.0f32, 2.0, 3.0, 4.0], 1, 10.0, 3.0).unwrap();
        let mut sample = Sample::replicate(&source, 3, 7, 1, 0.25);
        assert_eq!(sample.stream_count(), 3);

        sample.adjust_stream(0, 2).unwrap();
        sample.adjust_stream(2, 6).unwrap();

        assert_eq!(sample.stream(0).unwrap().len(), 2);
        assert_eq!(sample.stream(1).unwrap().len(), 4);
        assert_eq!(sample.stream(2).unwrap().len(), 6);
        for s in sample.streams() {
            assert_eq!(s.start_time(), 3.0);
            assert_eq!(s.channel_count(), 1);
            assert_eq!(s.element_type(), ElementType::Float32);
        }
        assert_eq!(
            sample.stream(2).unwrap().as_slice::<f32>().unwrap(),
            &[1.0, 2.0, 3.0, 4.0, 0.0, 0.0]
        );
        assert!(sample.adjust_stream(3, 1).is_err());
    }

    #[test]
    fn test_duplicate_is_deep() {
        let sample = Sample::new(vec![stream_at(0.0, 3)], 1, 2, 0.0, 1.0).unwrap();
        let mut copies = sample.duplicate(2);
        copies[0].adjust_stream(0, 0).unwrap();
        assert_eq!(copies[1].stream(0).unwrap().len(), 3);
        assert_eq!(sample.stream(0).unwrap().len(), 3);
    }
}
