use crate::core::query::MatchMode;
use crate::engine::MAX_PRECISION;
use crate::utils::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PROMPT: &str = "\n🔢 Enter your math query: ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub color: bool,
    pub match_mode: MatchMode,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Variable for derivative and integral; preferred unknown for solve
    pub variable: String,
    /// Significant digits printed by evaluate
    pub precision: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            color: true,
            match_mode: MatchMode::Keyword,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            variable: crate::core::dispatcher::DEFAULT_VARIABLE.to_string(),
            precision: crate::engine::DEFAULT_PRECISION,
        }
    }
}

impl Config {
    /// Missing files yield the defaults; nothing is written to disk.
    pub fn load_custom(config_path: &Path) -> AppResult<Self> {
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        let variable = &self.engine.variable;
        if variable.is_empty() {
            return Err(AppError::Config("Variable cannot be empty".to_string()));
        }
        if !variable.chars().next().is_some_and(char::is_alphabetic)
            || !variable.chars().all(|c| c.is_alphanumeric() || c == '_')
        {
            return Err(AppError::Config(format!(
                "Variable '{}' is not a valid identifier",
                variable
            )));
        }

        if !(1..=MAX_PRECISION).contains(&self.engine.precision) {
            return Err(AppError::Config(format!(
                "Precision must be between 1 and {}, got {}",
                MAX_PRECISION, self.engine.precision
            )));
        }

        Ok(())
    }

    pub fn to_toml(&self) -> AppResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::System(format!("Failed to serialize config: {}", e)))
    }

    pub fn save_to(&self, config_path: &Path) -> AppResult<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, self.to_toml()?)?;
        Ok(())
    }

    pub fn config_file_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mathhelper")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load_custom(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml("[engine]\nvariable = \"t\"\n").unwrap();
        assert_eq!(config.engine.variable, "t");
        assert_eq!(config.engine.precision, 15);
        assert!(config.general.color);
        assert_eq!(config.general.match_mode, MatchMode::Keyword);
    }

    #[test]
    fn test_match_mode_is_lowercase() {
        let config = Config::from_toml("[general]\nmatch_mode = \"strict\"\n").unwrap();
        assert_eq!(config.general.match_mode, MatchMode::Strict);
        assert!(Config::from_toml("[general]\nmatch_mode = \"fuzzy\"\n").is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        for content in [
            "[engine]\nvariable = \"\"\n",
            "[engine]\nvariable = \"2x\"\n",
            "[engine]\nprecision = 0\n",
            "[engine]\nprecision = 18\n",
        ] {
            assert!(
                matches!(Config::from_toml(content), Err(AppError::Config(_))),
                "accepted: {content}"
            );
        }
    }

    #[test]
    fn test_precision_stops_at_f64_digits() {
        assert_eq!(
            Config::from_toml("[engine]\nprecision = 17\n").unwrap().engine.precision,
            17
        );
        let err = Config::from_toml("[engine]\nprecision = 30\n").unwrap_err();
        assert!(err.to_string().contains("between 1 and 17"), "{err}");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.general.color = false;
        config.engine.precision = 6;
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_custom(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "general = [").unwrap();

        assert!(matches!(Config::load_custom(&path), Err(AppError::Config(_))));
    }
}
