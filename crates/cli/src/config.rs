//! `scribe.toml` configuration file.
//!
//! ```toml
//! [engine]
//! estimate_missing_quality = true
//! assess_quality_on_validate = true
//!
//! [logging]
//! filter = "scribe_calc=debug"
//! json = false
//! ```
//!
//! Every section and key is optional.

use std::path::Path;

use scribe_calc::EngineConfig;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CliConfig {
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LoggingConfig {
    /// `EnvFilter` directive. `RUST_LOG` takes precedence when set.
    pub filter: Option<String>,
    /// Emit log lines as JSON objects instead of human-readable text.
    pub json: bool,
}

/// Read and parse a config file from `path`.
///
/// Returns a human-readable error string on failure.
pub(crate) fn read_config(path: &Path) -> Result<CliConfig, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;

    toml::from_str(&content).map_err(|e| format!("could not parse '{}': {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_takes_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert!(config.engine.estimate_missing_quality);
        assert!(config.logging.filter.is_none());
        assert!(!config.logging.json);
    }

    #[test]
    fn sections_parse() {
        let config: CliConfig = toml::from_str(
            r#"
            [engine]
            estimate_missing_quality = false

            [logging]
            filter = "debug"
            json = true
            "#,
        )
        .unwrap();
        assert!(!config.engine.estimate_missing_quality);
        assert!(config.engine.assess_quality_on_validate);
        assert_eq!(config.logging.filter.as_deref(), Some("debug"));
        assert!(config.logging.json);
    }

    #[test]
    fn unreadable_path_names_the_file() {
        let err = read_config(Path::new("/nonexistent/scribe.toml")).unwrap_err();
        assert!(err.contains("/nonexistent/scribe.toml"));
    }
}
