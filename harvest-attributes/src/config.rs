use harvester_config::{FeatureConfig, default_enabled};
use serde::Deserialize;

/// Config read from the `CollectTypesWithAttributes` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectTypesWithAttributesConfig {
    #[serde(default = "default_enabled", alias = "Enabled")]
    pub enabled: bool,

    /// Attributes to collect, either fully qualified (`serde::Serialize`) or
    /// bare (`Entity`, matched against the last path segment). Empty collects
    /// every attribute.
    #[serde(default, alias = "Attributes")]
    pub attributes: Vec<String>,

    #[serde(default, alias = "collectToCache", alias = "CollectToCache")]
    pub collect_to_cache: bool,

    /// Wrap generated items in `pub mod <namespace>`.
    #[serde(
        default,
        alias = "namespaceForGenerations",
        alias = "NamespaceForGenerations"
    )]
    pub namespace_for_generations: Option<String>,

    /// Leave the accessor functions to a hand-written counterpart.
    #[serde(default, alias = "Partial")]
    pub partial: bool,
}

impl Default for CollectTypesWithAttributesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            attributes: Vec::new(),
            collect_to_cache: false,
            namespace_for_generations: None,
            partial: false,
        }
    }
}

impl CollectTypesWithAttributesConfig {
    /// Whether `attribute` (a resolved path) is one of the configured ones.
    pub fn selects(&self, attribute: &str) -> bool {
        self.attributes
            .iter()
            .any(|configured| attribute_matches(configured, attribute))
    }
}

/// Match a configured attribute name against a resolved path. Bare names
/// match the last segment.
pub(crate) fn attribute_matches(configured: &str, resolved: &str) -> bool {
    let configured = configured.trim_start_matches("::");
    if configured.contains("::") {
        configured == resolved
    } else {
        resolved.rsplit("::").next() == Some(configured)
    }
}

impl FeatureConfig for CollectTypesWithAttributesConfig {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn collect_to_cache(&self) -> bool {
        self.collect_to_cache
    }
}

#[cfg(test)]
mod tests {
    use harvester_config::resolve_text;

    use super::*;

    #[test]
    fn test_section_name() {
        assert_eq!(
            CollectTypesWithAttributesConfig::section_name(),
            "CollectTypesWithAttributes"
        );
    }

    #[test]
    fn test_defaults() {
        let result = resolve_text::<CollectTypesWithAttributesConfig>(
            r#"{"CollectTypesWithAttributes": {}}"#,
        );
        let config = result.config().unwrap();
        assert_eq!(**config, CollectTypesWithAttributesConfig::default());
    }

    #[test]
    fn test_camel_case_aliases() {
        let result = resolve_text::<CollectTypesWithAttributesConfig>(
            r#"{"CollectTypesWithAttributes": {
                "collectToCache": true,
                "namespaceForGenerations": "registry",
                "Partial": true,
                "unknown": 1
            }}"#,
        );
        let config = result.config().unwrap();
        assert!(config.collect_to_cache);
        assert!(config.partial);
        assert_eq!(config.namespace_for_generations.as_deref(), Some("registry"));
    }

    #[test]
    fn test_attribute_matching() {
        assert!(attribute_matches("Entity", "orm::Entity"));
        assert!(attribute_matches("Entity", "Entity"));
        assert!(attribute_matches("orm::Entity", "orm::Entity"));
        assert!(attribute_matches("::orm::Entity", "orm::Entity"));
        assert!(!attribute_matches("orm::Entity", "other::Entity"));
        assert!(!attribute_matches("Entity", "orm::EntityRef"));
    }
}
