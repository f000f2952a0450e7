//! CLI command implementations
//!
//! - Top-level commands (macros) are implemented in this file
//! - commands/expand.rs - Dictionary expansion
//! - commands/config.rs - Configuration management (init, validate, show, schema)

pub mod config;
pub mod expand;

use anyhow::Result;
use colored::Colorize;
use dictgen_core::config::MacroDefinition;
use dictgen_core::{ConfigLoader, DictgenConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Load the explicit config, or discover one from `start_dir` upward
pub fn load_config(config_path: Option<&Path>, start_dir: &Path) -> Result<DictgenConfig> {
    Ok(ConfigLoader::load(config_path, Some(start_dir))?)
}

/// Macros list command implementation
pub fn macros_command(detailed: bool, config_path: Option<PathBuf>) -> Result<()> {
    debug!("Listing registered macros");

    let config = load_config(config_path.as_deref(), Path::new("."))?;
    let registry = config.build_registry();
    for warning in registry.warnings() {
        warn!("{}", warning);
    }

    println!("{}", "Available Macros:".bold());
    println!("=================");

    for name in registry.names() {
        if !detailed {
            println!("  \\{name}");
            continue;
        }

        let origin = match config.macros.get(name) {
            Some(definition) => describe_definition(definition),
            None => "built-in".to_string(),
        };
        println!("  {} {}", format!("{:<12}", format!("\\{name}")).cyan(), origin);
    }

    println!("\nTotal: {} macros", registry.len());
    if !config.engine.builtins {
        println!("Built-in macros are disabled (engine.builtins = false)");
    }

    Ok(())
}

fn describe_definition(definition: &MacroDefinition) -> String {
    match &definition.text {
        Some(text) if definition.drop_argument => format!("user: text {text:?}, drops argument"),
        Some(text) => format!("user: text {text:?}"),
        None => format!(
            "user: wraps {:?} ... {:?}",
            definition.open.as_deref().unwrap_or_default(),
            definition.close.as_deref().unwrap_or_default()
        ),
    }
}
