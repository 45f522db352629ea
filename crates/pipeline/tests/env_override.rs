//! Separate test binary: environment variables are process-wide

use pipeline::PipelineConfig;

#[test]
fn test_environment_overrides_file_and_defaults() {
    std::env::set_var("PIPELINE_PRODUCER_RATE_HZ", "100");
    std::env::set_var("PIPELINE_LOG_LEVEL", "debug");

    let config = PipelineConfig::load(None).unwrap();
    assert_eq!(config.producer_rate_hz, 100.0);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.chunk_size, PipelineConfig::default().chunk_size);

    std::env::remove_var("PIPELINE_PRODUCER_RATE_HZ");
    std::env::remove_var("PIPELINE_LOG_LEVEL");
}
