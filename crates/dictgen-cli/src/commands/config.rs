//! Configuration commands: init, validate, show, schema

use anyhow::{Context, Result, bail};
use dictgen_core::config::{ConfigFormat, MacroDefinition};
use dictgen_core::{ConfigLoader, DictgenConfig};
use schemars::schema_for;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::ConfigFileFormat;
use crate::commands::load_config;

impl From<ConfigFileFormat> for ConfigFormat {
    fn from(format: ConfigFileFormat) -> Self {
        match format {
            ConfigFileFormat::Toml => ConfigFormat::Toml,
            ConfigFileFormat::Yaml => ConfigFormat::Yaml,
            ConfigFileFormat::Json => ConfigFormat::Json,
        }
    }
}

/// Config init command implementation
pub fn init_command(format: ConfigFileFormat, force: bool) -> Result<()> {
    debug!("Initializing configuration file with format: {:?}", format);

    let filename = match format {
        ConfigFileFormat::Toml => "dictgen.toml",
        ConfigFileFormat::Yaml => "dictgen.yaml",
        ConfigFileFormat::Json => "dictgen.json",
    };
    let config_path = PathBuf::from(filename);

    if config_path.exists() && !force {
        bail!("Configuration file '{filename}' already exists. Use --force to overwrite.");
    }

    let content = render_config(&starter_config(), format.into())?;
    fs::write(&config_path, content)
        .with_context(|| format!("Failed to write '{}'", config_path.display()))?;

    println!("✓ Created configuration file: {filename}");
    println!("   Edit the file to add your own macros.");

    Ok(())
}

/// Config validate command implementation
pub fn validate_command(path: Option<PathBuf>) -> Result<()> {
    debug!("Validating configuration file: {:?}", path);

    let resolved = match path {
        Some(path) => Some(path),
        None => ConfigLoader::auto_discover(Path::new("."))?,
    };
    let Some(path) = resolved else {
        println!("No configuration file found; defaults apply");
        return Ok(());
    };

    match ConfigLoader::load_from_file(&path) {
        Ok(config) => {
            // Registry warnings surface during the build
            let registry = config.build_registry();
            println!("✓ Configuration is valid: {}", path.display());
            println!("   Max depth: {}", config.engine.max_depth);
            println!("   Fallback policy: {:?}", config.fallback.policy);
            println!("   User macros: {}", config.macros.len());
            println!("   Registered macros: {}", registry.len());
            for warning in registry.warnings() {
                println!("   warning: {warning}");
            }
            Ok(())
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Config show command implementation
pub fn show_command(config_path: Option<PathBuf>) -> Result<()> {
    debug!("Showing configuration");

    let config = load_config(config_path.as_deref(), Path::new("."))?;
    print!("{}", config.to_toml()?);

    Ok(())
}

/// Config schema command implementation
pub fn schema_command(output: Option<PathBuf>) -> Result<()> {
    info!("Generating JSON Schema for dictgen configuration");

    let schema = schema_for!(DictgenConfig);
    let mut schema_json = serde_json::to_value(schema)?;
    schema_json["title"] = json!("dictgen configuration");
    schema_json["description"] =
        json!("Configuration file schema for dictgen (dictgen.toml, dictgen.yaml, dictgen.json)");

    let rendered = serde_json::to_string_pretty(&schema_json)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, rendered)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            println!("✓ Generated JSON Schema: {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

/// Defaults plus one sample macro of each shape
fn starter_config() -> DictgenConfig {
    let mut config = DictgenConfig::default();
    config.macros.insert(
        "gloss".to_string(),
        MacroDefinition {
            open: Some("<uf-gloss>".to_string()),
            close: Some("</uf-gloss>".to_string()),
            ..MacroDefinition::default()
        },
    );
    config.macros.insert(
        "dagger".to_string(),
        MacroDefinition {
            text: Some("†".to_string()),
            ..MacroDefinition::default()
        },
    );
    config
}

fn render_config(config: &DictgenConfig, format: ConfigFormat) -> Result<String> {
    Ok(match format {
        ConfigFormat::Toml => config.to_toml()?,
        ConfigFormat::Yaml => {
            serde_yaml::to_string(config).context("Failed to serialize YAML")?
        }
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).context("Failed to serialize JSON")?
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_config_round_trips_in_every_format() {
        let config = starter_config();
        assert!(config.validate().is_ok());

        for format in [ConfigFormat::Toml, ConfigFormat::Yaml, ConfigFormat::Json] {
            let rendered = render_config(&config, format).unwrap();
            let parsed = DictgenConfig::parse(&rendered, format).unwrap();
            assert_eq!(parsed, config, "{format:?}");
        }
    }
}
