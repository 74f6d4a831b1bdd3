use std::fs;

use harvester_config::{ConfigSource, Error, FeatureConfig, default_enabled, resolve};
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
struct CollectOrdersConfig {
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    attributes: Vec<String>,
}

impl FeatureConfig for CollectOrdersConfig {
    fn enabled(&self) -> bool {
        self.enabled
    }
}

#[test]
fn test_discovered_json_section() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("codegen.config.json"),
        r#"{ "CollectOrders": { "attributes": ["shop::Tracked"] }, "Other": 1 }"#,
    )
    .unwrap();

    let source = ConfigSource::discover(dir.path()).unwrap().unwrap();
    let result = resolve::<CollectOrdersConfig>(&source);

    let config = result.config().unwrap();
    assert!(config.enabled);
    assert_eq!(config.attributes, vec!["shop::Tracked"]);
}

#[test]
fn test_decode_error_renders_with_source() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("codegen.config.json"),
        "{\n  \"CollectOrders\": { \"attributes\": 5 }\n}\n",
    )
    .unwrap();

    let source = ConfigSource::discover(dir.path()).unwrap().unwrap();
    let result = resolve::<CollectOrdersConfig>(&source);

    let error = result.error().unwrap();
    match error.as_ref() {
        Error::Decode { section, .. } => assert_eq!(section, "CollectOrders"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(error.to_string().contains("CollectOrders"));
}

#[test]
fn test_section_without_config_file_is_absent() {
    let source = ConfigSource::new("codegen.config.toml", "[Unrelated]\nenabled = false\n");
    let result = resolve::<CollectOrdersConfig>(&source);

    assert!(result.config().is_none());
    assert!(result.error().is_none());
}
