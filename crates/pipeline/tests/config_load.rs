use pipeline::{PipelineConfig, PipelineError};
use std::fs;
use std::path::PathBuf;

fn write_config(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{}-{}.toml", name, std::process::id()));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_file_overrides_defaults() {
    let path = write_config(
        "pipeline-file",
        r#"
producer_rate_hz = 200.0
chunk_size = 20
channel_count = 3
consumer_window_s = 0.5
consumer_period_s = 0.25
"#,
    );

    let config = PipelineConfig::load(Some(path.as_path())).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(config.producer_rate_hz, 200.0);
    assert_eq!(config.chunk_size, 20);
    assert_eq!(config.channel_count, 3);
    assert_eq!(config.consumer_window_s, 0.5);
    // Untouched keys keep their defaults
    assert_eq!(config.buffer_capacity_s, PipelineConfig::default().buffer_capacity_s);
    assert_eq!(config.log_level, "info");
}

#[test]
fn test_missing_file_uses_defaults() {
    let path = std::env::temp_dir().join("pipeline-does-not-exist.toml");
    let config = PipelineConfig::load(Some(path.as_path())).unwrap();
    assert_eq!(config, PipelineConfig::default());
}

#[test]
fn test_invalid_file_value_is_rejected() {
    let path = write_config("pipeline-invalid", "chunk_size = 0\n");
    let result = PipelineConfig::load(Some(path.as_path()));
    fs::remove_file(&path).ok();
    assert!(matches!(result, Err(PipelineError::Config(_))));
}

#[test]
fn test_malformed_file_is_load_error() {
    let path = write_config("pipeline-malformed", "producer_rate_hz = \"fast\"\n");
    let result = PipelineConfig::load(Some(path.as_path()));
    fs::remove_file(&path).ok();
    assert!(matches!(result, Err(PipelineError::Load(_))));
}
