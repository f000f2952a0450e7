//! Configuration system for dictgen
//!
//! - TOML, YAML and JSON configuration files, chosen by extension
//! - Auto-discovery by traversing up directories
//! - Strong typing with serde and JSON Schema generation via schemars
//!
//! ## Configuration Discovery
//!
//! When no explicit config path is provided, the search starts in the
//! current directory and moves up the directory tree, trying
//! `.dictgenrc.toml`, `dictgen.toml`, `dictgen.yaml`, `dictgen.yml` and
//! `dictgen.json` in that order. Without any file the defaults apply.
//!
//! ## Example Configuration (dictgen.yaml)
//!
//! ```yaml
//! engine:
//!   maxDepth: 32
//!   target: json
//! fallback:
//!   policy: wrap
//!   open: "<uf-unknown data-macro=\"{name}\">"
//!   close: "</uf-unknown>"
//! preprocess:
//!   normalizeWhitespace: true
//! macros:
//!   gloss:
//!     open: "<uf-gloss>"
//!     close: "</uf-gloss>"
//! ```

mod dictgen_config;
mod loader;

pub use dictgen_config::{
    AllArguments, Arity, ConfigFormat, DictgenConfig, EngineConfiguration, FallbackConfiguration,
    FallbackPolicy, MacroDefinition, PhoneticConfiguration, PreprocessConfiguration,
};
pub use loader::{CONFIG_FILE_NAMES, ConfigLoader};
