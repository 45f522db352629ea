use pipeline::{Pipeline, PipelineConfig};
use std::time::Duration;

#[test]
fn test_short_run_delivers_whole_windows() {
    let config = PipelineConfig {
        producer_rate_hz: 400.0,
        chunk_size: 4,
        channel_count: 2,
        buffer_capacity_s: 1.0,
        consumer_window_s: 0.1,
        consumer_period_s: 0.05,
        ..Default::default()
    };
    let pipeline = Pipeline::new(config).unwrap();
    let summary = pipeline.run_for(Duration::from_millis(600)).unwrap();

    let c = summary.counters;
    assert!(c.windows_consumed >= 3, "{:?}", c);
    assert_eq!(c.windows_partial, 0);
    // Every delivered window holds exactly 40 samples
    assert_eq!(c.samples_consumed, c.windows_consumed * 40);
    assert_eq!(summary.undelivered, c.samples_pushed - c.samples_consumed);
    assert_eq!(summary.evicted, 0);
    assert_eq!(pipeline.context().monitor().active_count(), 0);
}

#[test]
fn test_invalid_config_fails_before_start() {
    let config = PipelineConfig {
        channel_count: 0,
        ..Default::default()
    };
    assert!(Pipeline::new(config).is_err());
}
