//! Configuration file resolution and loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for per-user and system config directories
pub const APP_NAME: &str = "requencer";

/// Config file name inside the application config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Resolve which configuration file to load.
///
/// Priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. Per-user config file (`<config_dir>/requencer/config.toml`)
/// 4. System config file (`/etc/requencer/config.toml`, Linux only)
///
/// Returns `None` when no file applies; callers fall back to built-in defaults.
/// Paths from the CLI or environment are returned even if they do not exist,
/// so a typo surfaces as a read error instead of silently using defaults.
pub fn resolve_config_file(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3/4: Well-known locations
    default_config_locations()
        .into_iter()
        .find(|candidate| candidate.exists())
}

/// Well-known config file locations for the platform, most specific first
pub fn default_config_locations() -> Vec<PathBuf> {
    let mut locations = Vec::new();

    if let Some(dir) = dirs::config_dir() {
        locations.push(dir.join(APP_NAME).join(CONFIG_FILE_NAME));
    }

    if cfg!(target_os = "linux") {
        locations.push(PathBuf::from("/etc").join(APP_NAME).join(CONFIG_FILE_NAME));
    }

    locations
}

/// Read and parse a TOML file into `T`.
///
/// # Errors
/// - `Error::ConfigRead` if the file cannot be read
/// - `Error::Config` if the contents are not valid TOML for `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let toml_str = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = toml::from_str(&toml_str)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {:?}: {}", path, e)))?;

    debug!("Loaded TOML configuration from {:?}", path);
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serial_test::serial;
    use std::io::Write;

    const TEST_ENV_VAR: &str = "REQUENCER_TEST_CONFIG";

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        level: u8,
    }

    #[test]
    #[serial]
    fn test_cli_arg_wins_over_env() {
        std::env::set_var(TEST_ENV_VAR, "/from/env.toml");
        let resolved = resolve_config_file(Some(Path::new("/from/cli.toml")), TEST_ENV_VAR);
        std::env::remove_var(TEST_ENV_VAR);

        assert_eq!(resolved, Some(PathBuf::from("/from/cli.toml")));
    }

    #[test]
    #[serial]
    fn test_env_used_without_cli_arg() {
        std::env::set_var(TEST_ENV_VAR, "/from/env.toml");
        let resolved = resolve_config_file(None, TEST_ENV_VAR);
        std::env::remove_var(TEST_ENV_VAR);

        assert_eq!(resolved, Some(PathBuf::from("/from/env.toml")));
    }

    #[test]
    #[serial]
    fn test_empty_env_is_ignored() {
        std::env::set_var(TEST_ENV_VAR, "");
        let resolved = resolve_config_file(None, TEST_ENV_VAR);
        std::env::remove_var(TEST_ENV_VAR);

        // Falls through to well-known locations, which only count if they exist
        if let Some(path) = resolved {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_default_locations_end_in_config_toml() {
        for location in default_config_locations() {
            assert!(location.ends_with(Path::new(APP_NAME).join(CONFIG_FILE_NAME)));
        }
    }

    #[test]
    fn test_load_toml_parses_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"mixdown\"\nlevel = 3").unwrap();

        let parsed: Sample = load_toml(file.path()).unwrap();
        assert_eq!(
            parsed,
            Sample {
                name: "mixdown".to_string(),
                level: 3
            }
        );
    }

    #[test]
    fn test_load_toml_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        let err = load_toml::<Sample>(&missing).unwrap_err();
        match err {
            Error::ConfigRead { path, .. } => assert_eq!(path, missing),
            other => panic!("Expected ConfigRead, got {:?}", other),
        }
    }

    #[test]
    fn test_load_toml_invalid_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = ").unwrap();

        let err = load_toml::<Sample>(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
