//! Configuration file discovery and loading

use super::dictgen_config::DictgenConfig;
use crate::error::DictgenError;
use crate::result::Result;
use std::path::{Path, PathBuf};

/// Config file names, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".dictgenrc.toml",
    "dictgen.toml",
    "dictgen.yaml",
    "dictgen.yml",
    "dictgen.json",
];

/// Configuration loader for discovering and loading config files
pub struct ConfigLoader;

impl ConfigLoader {
    /// Auto-discover config file by traversing upward from start_path
    ///
    /// Tries every name of [`CONFIG_FILE_NAMES`] in each directory, moving up
    /// until a config is found or the filesystem root is reached.
    pub fn auto_discover(start_path: &Path) -> Result<Option<PathBuf>> {
        let mut current = start_path
            .canonicalize()
            .map_err(|e| DictgenError::config_error(format!("Invalid path: {e}")))?;

        loop {
            for filename in CONFIG_FILE_NAMES {
                let config_path = current.join(filename);
                if config_path.is_file() {
                    tracing::debug!("Found config: {}", config_path.display());
                    return Ok(Some(config_path));
                }
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load and validate configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<DictgenConfig> {
        let config = DictgenConfig::load(path).map_err(|e| match e {
            DictgenError::ConfigError { message } => DictgenError::config_error(format!(
                "Failed to load config from '{}': {}",
                path.display(),
                message
            )),
            other => other,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Find the config file to use, if any
    ///
    /// An explicit path must exist; otherwise the search starts at
    /// `start_dir` (or the current directory).
    pub fn resolve(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = custom_path {
            if !path.exists() {
                return Err(DictgenError::config_error(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let search_dir = start_dir.unwrap_or_else(|| Path::new("."));
        Self::auto_discover(search_dir)
    }

    /// Load config from path or auto-discover
    ///
    /// Falls back to the defaults when no config file is found.
    pub fn load(custom_path: Option<&Path>, start_dir: Option<&Path>) -> Result<DictgenConfig> {
        match Self::resolve(custom_path, start_dir)? {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(DictgenConfig::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FallbackPolicy;
    use std::fs;
    use tempfile::TempDir;

    fn create_temp_config(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let path = dir.join(filename);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_from_file_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            "dictgen.toml",
            "[engine]\nmaxDepth = 16\n",
        );

        let config = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(config.engine.max_depth, 16);
    }

    #[test]
    fn test_load_from_file_validates() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(
            temp_dir.path(),
            "dictgen.json",
            r#"{"engine": {"maxDepth": 0}}"#,
        );

        let err = ConfigLoader::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("maxDepth"));
    }

    #[test]
    fn test_unsupported_extension() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_temp_config(temp_dir.path(), "dictgen.ini", "x=1");

        let err = ConfigLoader::load_from_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Unsupported config file extension"));
    }

    #[test]
    fn test_auto_discover_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("src/nested");
        fs::create_dir_all(&nested).unwrap();
        create_temp_config(temp_dir.path(), "dictgen.yaml", "fallback:\n  policy: reject\n");

        let found = ConfigLoader::auto_discover(&nested).unwrap().unwrap();
        assert!(found.ends_with("dictgen.yaml"));

        let config = ConfigLoader::load(None, Some(&nested)).unwrap();
        assert_eq!(config.fallback.policy, FallbackPolicy::Reject);
    }

    #[test]
    fn test_dotfile_takes_priority() {
        let temp_dir = TempDir::new().unwrap();
        create_temp_config(temp_dir.path(), "dictgen.json", "{}");
        create_temp_config(temp_dir.path(), ".dictgenrc.toml", "");

        let found = ConfigLoader::auto_discover(temp_dir.path()).unwrap().unwrap();
        assert!(found.ends_with(".dictgenrc.toml"));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Some(Path::new("nonexistent.toml")), None);
        assert!(result.is_err());
    }
}
