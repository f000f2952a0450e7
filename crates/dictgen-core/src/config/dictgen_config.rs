//! Configuration types for dictgen

use crate::builtins::{SymbolMacro, TemplateMacro, register_builtins};
use crate::entry::EntryPipeline;
use crate::error::DictgenError;
use crate::expand::{DEFAULT_MAX_DEPTH, EchoUnknown, ExpandOptions, RejectUnknown, WrapUnknown};
use crate::hooks::{NormalizeWhitespace, PhoneticTransform, TransformSet};
use crate::registry::{MacroHandler, MacroRegistry, MacroRegistryBuilder};
use crate::result::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("yaml") | Some("yml") => Some(Self::Yaml),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Complete dictgen configuration
///
/// Every section is optional in the file; missing values take their defaults.
///
/// ```toml
/// [engine]
/// maxDepth = 64
/// target = "json"
///
/// [fallback]
/// policy = "wrap"
/// open = "<{name}>"
/// close = "</{name}>"
/// arity = 1
///
/// [phonetic]
/// prefix = "["
/// suffix = "]"
///
/// [macros.gloss]
/// open = "<uf-gloss>"
/// close = "</uf-gloss>"
///
/// [macros.dagger]
/// text = "†"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DictgenConfig {
    /// Expansion engine settings
    #[schemars(description = "Expansion engine settings")]
    pub engine: EngineConfiguration,

    /// Handling of macros without a handler
    #[schemars(description = "How macros without a registered handler are expanded")]
    pub fallback: FallbackConfiguration,

    /// Phonetic transform settings
    #[schemars(description = "Delimiters and derivation of pronunciations")]
    pub phonetic: PhoneticConfiguration,

    /// Pre-pass settings
    #[schemars(description = "Rewrites applied to raw entries before expansion")]
    pub preprocess: PreprocessConfiguration,

    /// User macros, registered after the built-ins
    #[schemars(description = "User-defined template macros keyed by name")]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub macros: BTreeMap<String, MacroDefinition>,
}

/// Expansion engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfiguration {
    #[schemars(description = "Maximum nesting depth of macro invocations")]
    pub max_depth: usize,

    #[schemars(description = "Register the built-in markup macros")]
    pub builtins: bool,

    #[schemars(description = "Backend name selecting `$backend` sections of the dictionary")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// What to do with unknown macros
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Wrap the arguments between the `open` and `close` templates
    Wrap,
    /// Emit the macro name literally
    Echo,
    /// Fail the entry
    Reject,
}

/// Keyword for "every argument present"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AllArguments {
    All,
}

/// Number of arguments a template consumes: a count or `"all"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Arity {
    Fixed(usize),
    All(AllArguments),
}

impl Arity {
    pub fn count(self) -> Option<usize> {
        match self {
            Arity::Fixed(count) => Some(count),
            Arity::All(_) => None,
        }
    }
}

impl Default for Arity {
    fn default() -> Self {
        Arity::Fixed(1)
    }
}

/// Fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FallbackConfiguration {
    #[schemars(description = "Fallback policy: 'wrap', 'echo' or 'reject'")]
    pub policy: FallbackPolicy,

    #[schemars(description = "Opening template for 'wrap'; {name} is replaced by the macro name")]
    pub open: String,

    #[schemars(description = "Closing template for 'wrap'; {name} is replaced by the macro name")]
    pub close: String,

    #[schemars(description = "Arguments consumed by 'wrap': a number or \"all\"")]
    pub arity: Arity,
}

/// Phonetic transform configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PhoneticConfiguration {
    #[schemars(description = "Register the phonetic transform used by \\ipa and the IPA field")]
    pub enabled: bool,

    #[schemars(description = "Text inserted before a pronunciation")]
    pub prefix: String,

    #[schemars(description = "Text inserted after a pronunciation")]
    pub suffix: String,

    #[schemars(description = "Derive the pronunciation from the headword when the entry has none")]
    pub derive_from_headword: bool,
}

/// Pre-pass configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PreprocessConfiguration {
    #[schemars(description = "Collapse whitespace runs and trim every field")]
    pub normalize_whitespace: bool,
}

/// A user template macro
///
/// Either `text` (fixed output) or `open`/`close` (wrapping) must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MacroDefinition {
    #[schemars(description = "Text emitted before the arguments")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<String>,

    #[schemars(description = "Text emitted after the arguments")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<String>,

    #[schemars(description = "Arguments wrapped: a number or \"all\" (default 1)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arity: Option<Arity>,

    #[schemars(description = "Fixed text replacing the macro")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[schemars(description = "Discard one argument after a fixed-text macro")]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub drop_argument: bool,
}

impl MacroDefinition {
    fn handler(&self) -> Arc<dyn MacroHandler> {
        match &self.text {
            Some(text) => {
                let symbol = SymbolMacro::new(text.as_str());
                if self.drop_argument {
                    Arc::new(symbol.dropping_argument())
                } else {
                    Arc::new(symbol)
                }
            }
            None => Arc::new(TemplateMacro::new(
                self.open.clone().unwrap_or_default(),
                self.close.clone().unwrap_or_default(),
                self.arity.unwrap_or_default().count(),
            )),
        }
    }
}

impl Default for EngineConfiguration {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            builtins: true,
            target: None,
        }
    }
}

impl Default for FallbackConfiguration {
    fn default() -> Self {
        Self {
            policy: FallbackPolicy::Wrap,
            open: "<{name}>".to_string(),
            close: "</{name}>".to_string(),
            arity: Arity::default(),
        }
    }
}

impl Default for PhoneticConfiguration {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: "/".to_string(),
            suffix: "/".to_string(),
            derive_from_headword: true,
        }
    }
}

impl Default for PreprocessConfiguration {
    fn default() -> Self {
        Self {
            normalize_whitespace: true,
        }
    }
}

impl DictgenConfig {
    /// Load configuration from file
    ///
    /// The format follows the extension: `.toml`, `.yaml`/`.yml` or `.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DictgenError::io_error(path, e))?;
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            DictgenError::config_error(format!(
                "Unsupported config file extension for '{}' (expected .toml, .yaml, .yml or .json)",
                path.display()
            ))
        })?;
        Self::parse(&content, format)
    }

    /// Parse configuration text in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self> {
        let parsed: std::result::Result<Self, String> = match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(DictgenError::config_error)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DictgenError::serialization_error(e.to_string()))
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.engine.max_depth == 0 {
            return Err(DictgenError::config_error("engine.maxDepth must be at least 1"));
        }

        for (name, definition) in &self.macros {
            if !is_valid_macro_name(name) {
                return Err(DictgenError::config_error(format!(
                    "Invalid macro name '{name}': use ASCII letters and '@', or a single punctuation character"
                )));
            }

            let wraps = definition.open.is_some() || definition.close.is_some();
            match (&definition.text, wraps) {
                (Some(_), true) => {
                    return Err(DictgenError::config_error(format!(
                        "Macro '{name}' sets both 'text' and 'open'/'close'"
                    )));
                }
                (None, false) => {
                    return Err(DictgenError::config_error(format!(
                        "Macro '{name}' needs either 'text' or 'open'/'close'"
                    )));
                }
                _ => {}
            }
            if definition.text.is_none() && definition.drop_argument {
                return Err(DictgenError::config_error(format!(
                    "Macro '{name}': 'dropArgument' only applies to 'text' macros"
                )));
            }
        }

        Ok(())
    }

    /// Built-ins (if enabled) followed by the user macros
    pub fn build_registry(&self) -> MacroRegistry {
        let mut builder = MacroRegistryBuilder::new();
        if self.engine.builtins {
            register_builtins(&mut builder);
        }
        for (name, definition) in &self.macros {
            builder.register_arc(name.as_str(), definition.handler());
        }
        builder.build()
    }

    pub fn build_fallback(&self) -> Arc<dyn MacroHandler> {
        let fallback = &self.fallback;
        match fallback.policy {
            FallbackPolicy::Wrap => Arc::new(WrapUnknown::new(
                fallback.open.as_str(),
                fallback.close.as_str(),
                fallback.arity.count(),
            )),
            FallbackPolicy::Echo => Arc::new(EchoUnknown),
            FallbackPolicy::Reject => Arc::new(RejectUnknown),
        }
    }

    pub fn build_transforms(&self) -> TransformSet {
        let mut transforms = TransformSet::new();
        if self.phonetic.enabled {
            transforms.insert(PhoneticTransform::new(
                self.phonetic.prefix.as_str(),
                self.phonetic.suffix.as_str(),
            ));
        }
        transforms
    }

    /// Validate and assemble an entry pipeline
    pub fn build_pipeline(&self) -> Result<EntryPipeline> {
        self.validate()?;

        let pipeline = EntryPipeline::new(Arc::new(self.build_registry()), self.build_fallback())
            .with_transforms(self.build_transforms())
            .with_options(ExpandOptions {
                max_depth: self.engine.max_depth,
            })
            .derive_pronunciation(self.phonetic.derive_from_headword);

        Ok(if self.preprocess.normalize_whitespace {
            pipeline.with_preprocess(NormalizeWhitespace)
        } else {
            pipeline
        })
    }
}

fn is_valid_macro_name(name: &str) -> bool {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_punctuation() => true,
        (Some(_), _) => name.chars().all(|c| c.is_ascii_alphabetic() || c == '@'),
        (None, _) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::EntryRecord;
    use crate::entry::EntryField;

    #[test]
    fn test_defaults() {
        let config = DictgenConfig::default();
        assert_eq!(config.engine.max_depth, 64);
        assert!(config.engine.builtins);
        assert_eq!(config.fallback.policy, FallbackPolicy::Wrap);
        assert_eq!(config.fallback.arity.count(), Some(1));
        assert_eq!(config.phonetic.prefix, "/");
        assert!(config.preprocess.normalize_whitespace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_sections() {
        let config = DictgenConfig::parse(
            r#"
            [engine]
            maxDepth = 8
            target = "json"

            [fallback]
            policy = "echo"
            arity = "all"

            [macros.gloss]
            open = "<g>"
            close = "</g>"
            arity = 2
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(config.engine.max_depth, 8);
        assert!(config.engine.builtins);
        assert_eq!(config.engine.target.as_deref(), Some("json"));
        assert_eq!(config.fallback.policy, FallbackPolicy::Echo);
        assert_eq!(config.fallback.arity, Arity::All(AllArguments::All));
        assert_eq!(config.macros["gloss"].arity, Some(Arity::Fixed(2)));
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = DictgenConfig::parse("phonetic:\n  prefix: '['\n  suffix: ']'\n", ConfigFormat::Yaml).unwrap();
        assert_eq!(yaml.phonetic.prefix, "[");
        assert!(yaml.phonetic.derive_from_headword);

        let json = DictgenConfig::parse(r#"{"fallback": {"policy": "reject"}}"#, ConfigFormat::Json).unwrap();
        assert_eq!(json.fallback.policy, FallbackPolicy::Reject);
        assert_eq!(json.fallback.open, "<{name}>");
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let err = DictgenConfig::parse("[fallback]\npolicy = \"ignore\"", ConfigFormat::Toml).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_validation() {
        let mut config = DictgenConfig::default();
        config.engine.max_depth = 0;
        assert!(config.validate().is_err());
        assert!(config.build_pipeline().is_err());

        let mut config = DictgenConfig::default();
        config.macros.insert("bad name".to_string(), MacroDefinition {
            text: Some("x".to_string()),
            ..Default::default()
        });
        assert!(config.validate().is_err());

        let mut config = DictgenConfig::default();
        config.macros.insert("empty".to_string(), MacroDefinition::default());
        assert!(config.validate().is_err());

        let mut config = DictgenConfig::default();
        config.macros.insert("/".to_string(), MacroDefinition {
            text: Some("⁄".to_string()),
            ..Default::default()
        });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_user_macros_override_builtins() {
        let mut config = DictgenConfig::default();
        config.macros.insert("textit".to_string(), MacroDefinition {
            open: Some("<i>".to_string()),
            close: Some("</i>".to_string()),
            ..Default::default()
        });
        config.macros.insert("dagger".to_string(), MacroDefinition {
            text: Some("†".to_string()),
            drop_argument: true,
            ..Default::default()
        });

        let registry = config.build_registry();
        assert_eq!(registry.warnings().len(), 1);

        let pipeline = config.build_pipeline().unwrap();
        let entry = pipeline
            .process(EntryRecord::full(
                "chat",
                1,
                vec!["n.".into(), "".into(), "\\textit{a} \\dagger{x}b".into()],
            ))
            .unwrap();
        assert_eq!(entry.field_text(EntryField::Definition), "<i>a</i> †b.");
        assert_eq!(entry.field_text(EntryField::Pronunciation), "/chat/");
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let config = DictgenConfig::default();
        let text = config.to_toml().unwrap();
        assert_eq!(DictgenConfig::parse(&text, ConfigFormat::Toml).unwrap(), config);
    }
}
