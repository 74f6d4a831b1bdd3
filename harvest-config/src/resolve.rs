//! Section lookup and typed decoding.

use std::{fmt, sync::Arc};

use harvester_core::{short_type_name, strip_type_suffix};
use serde::{
    Deserialize, Deserializer,
    de::{DeserializeOwned, IgnoredAny, MapAccess, SeqAccess, Visitor},
};

use crate::{ConfigFormat, ConfigSource, Error, Result, SourceContext};

/// Suffix stripped from a config type name to derive its section name.
pub const CONFIG_SUFFIX: &str = "Config";

/// Serde default for the `enabled` field every feature config carries.
pub fn default_enabled() -> bool {
    true
}

/// A typed, immutable per-feature configuration.
///
/// Implementors are plain serde structs. Field names are matched as written;
/// unknown fields are ignored.
pub trait FeatureConfig: DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Name of the top-level section holding this config.
    ///
    /// Defaults to the type name without its `Config` suffix, so
    /// `CollectTypesWithAttributesConfig` reads the `CollectTypesWithAttributes`
    /// section.
    fn section_name() -> String {
        strip_type_suffix(short_type_name::<Self>(), CONFIG_SUFFIX).to_owned()
    }

    /// Whether the feature is switched on.
    fn enabled(&self) -> bool;

    /// Whether harvested facts are stored in the module's metadata instead of
    /// being turned into consumable artifacts.
    fn collect_to_cache(&self) -> bool {
        false
    }
}

/// The outcome of resolving one feature's config.
///
/// Exactly one of three shapes: loaded, failed, or not configured (neither a
/// config nor an error).
#[derive(Debug)]
pub struct ConfigParseResult<C> {
    config: Option<Arc<C>>,
    error: Option<Arc<Error>>,
}

impl<C> Clone for ConfigParseResult<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            error: self.error.clone(),
        }
    }
}

impl<C> ConfigParseResult<C> {
    /// The section is absent; the feature stays silent.
    pub fn not_configured() -> Self {
        Self {
            config: None,
            error: None,
        }
    }

    pub fn loaded(config: C) -> Self {
        Self {
            config: Some(Arc::new(config)),
            error: None,
        }
    }

    pub fn failed(error: Error) -> Self {
        Self {
            config: None,
            error: Some(Arc::new(error)),
        }
    }

    pub fn config(&self) -> Option<&Arc<C>> {
        self.config.as_ref()
    }

    pub fn error(&self) -> Option<&Arc<Error>> {
        self.error.as_ref()
    }

    /// A config object was decoded.
    pub fn is_loaded(&self) -> bool {
        self.config.is_some()
    }
}

impl<C: FeatureConfig> ConfigParseResult<C> {
    /// A config was decoded and switched on. Implies [`is_loaded`](Self::is_loaded).
    pub fn is_enabled(&self) -> bool {
        self.config.as_ref().is_some_and(|c| c.enabled())
    }
}

/// Resolve `C` from a config source, capturing every failure as data.
pub fn resolve<C: FeatureConfig>(source: &ConfigSource) -> ConfigParseResult<C> {
    let section = C::section_name();
    match parse_section::<C>(source, &section) {
        Ok(Some(config)) => {
            tracing::debug!(
                section = %section,
                enabled = config.enabled(),
                "config section loaded"
            );
            ConfigParseResult::loaded(config)
        }
        Ok(None) => {
            tracing::debug!(section = %section, "config section absent");
            ConfigParseResult::not_configured()
        }
        Err(error) => {
            tracing::warn!(section = %section, error = %error, "config section failed to decode");
            ConfigParseResult::failed(*error)
        }
    }
}

/// Resolve `C` from raw JSON text named `codegen.config.json`.
pub fn resolve_text<C: FeatureConfig>(raw_text: &str) -> ConfigParseResult<C> {
    resolve(&ConfigSource::new("codegen.config.json", raw_text))
}

/// Look up exactly one top-level section and decode it.
///
/// Returns `Ok(None)` when the section is absent.
pub fn parse_section<C: DeserializeOwned>(
    source: &ConfigSource,
    section: &str,
) -> Result<Option<C>> {
    if let Some(message) = source.read_error() {
        return Err(Box::new(Error::Unreadable {
            path: source.path().to_path_buf(),
            message: message.to_owned(),
        }));
    }
    let ctx = SourceContext::new(source.text(), source.filename());
    match source.format() {
        ConfigFormat::Json => parse_json_section(&ctx, section),
        ConfigFormat::Toml => parse_toml_section(&ctx, section),
    }
}

fn parse_json_section<C: DeserializeOwned>(
    ctx: &SourceContext,
    section: &str,
) -> Result<Option<C>> {
    let root: JsonRoot =
        serde_json::from_str(ctx.src()).map_err(|e| ctx.json_parse_error(&e))?;
    let JsonRoot::Sections(entries) = root else {
        return Err(ctx.not_an_object());
    };

    let mut matching = entries
        .into_iter()
        .filter(|(key, _)| key == section)
        .map(|(_, value)| value);
    let Some(value) = matching.next() else {
        return Ok(None);
    };
    let duplicates = matching.count();
    if duplicates > 0 {
        return Err(ctx.duplicate_section(section, duplicates + 1));
    }

    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| ctx.decode_error(section, e.to_string()))
}

fn parse_toml_section<C: DeserializeOwned>(
    ctx: &SourceContext,
    section: &str,
) -> Result<Option<C>> {
    let mut root: toml::Table = toml::from_str(ctx.src()).map_err(|e| ctx.toml_parse_error(&e))?;
    match root.remove(section) {
        None => Ok(None),
        Some(value) => value
            .try_into()
            .map(Some)
            .map_err(|e: toml::de::Error| ctx.decode_error(section, e.message())),
    }
}

/// Top level of a JSON config source, keeping every key in document order so
/// duplicate sections can be detected.
enum JsonRoot {
    Sections(Vec<(String, serde_json::Value)>),
    NotAnObject,
}

impl<'de> Deserialize<'de> for JsonRoot {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RootVisitor;

        impl<'de> Visitor<'de> for RootVisitor {
            type Value = JsonRoot;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object with one section per feature")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<JsonRoot, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(JsonRoot::Sections(entries))
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<JsonRoot, A::Error>
            where
                A: SeqAccess<'de>,
            {
                while seq.next_element::<IgnoredAny>()?.is_some() {}
                Ok(JsonRoot::NotAnObject)
            }

            fn visit_bool<E>(self, _: bool) -> std::result::Result<JsonRoot, E> {
                Ok(JsonRoot::NotAnObject)
            }

            fn visit_i64<E>(self, _: i64) -> std::result::Result<JsonRoot, E> {
                Ok(JsonRoot::NotAnObject)
            }

            fn visit_u64<E>(self, _: u64) -> std::result::Result<JsonRoot, E> {
                Ok(JsonRoot::NotAnObject)
            }

            fn visit_f64<E>(self, _: f64) -> std::result::Result<JsonRoot, E> {
                Ok(JsonRoot::NotAnObject)
            }

            fn visit_str<E>(self, _: &str) -> std::result::Result<JsonRoot, E> {
                Ok(JsonRoot::NotAnObject)
            }

            fn visit_unit<E>(self) -> std::result::Result<JsonRoot, E> {
                Ok(JsonRoot::NotAnObject)
            }
        }

        deserializer.deserialize_any(RootVisitor)
    }
}
