use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classifier::{InputSpec, ScoreMapping, TensorLayout};
use crate::preprocess::{Preprocessing, ResizeFilter};

pub const DEFAULT_CONFIG_PATH: &str = "config/detector.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub input_size: Vec<u32>,
    pub preprocessing: Preprocessing,
    pub resize_filter: ResizeFilter,
    pub layout: TensorLayout,
    pub output: ScoreMapping,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/efficientnetb2-deepfake.pt"),
            input_size: vec![260, 260],
            preprocessing: Preprocessing::EfficientNet,
            resize_filter: ResizeFilter::Triangle,
            layout: TensorLayout::Nchw,
            output: ScoreMapping::Probability,
        }
    }
}

impl ModelConfig {
    /// `input_size` is `[width, height]` and must match the loaded weights.
    pub fn input_spec(&self) -> Result<InputSpec, ConfigError> {
        match self.input_size.as_slice() {
            [width, height] if *width > 0 && *height > 0 => Ok(InputSpec {
                width: *width,
                height: *height,
                preprocessing: self.preprocessing,
                filter: self.resize_filter,
            }),
            other => Err(ConfigError::Invalid(format!(
                "model.input_size must be two non-zero dimensions, got {:?}",
                other
            ))),
        }
    }
}

impl DetectorConfig {
    /// Loads the YAML file named by `DETECTOR_CONFIG` (or the default path),
    /// then applies the `MODEL_PATH` and `PORT` environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("DETECTOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if config_path.exists() {
            log::info!("Loading configuration from {}", config_path.display());
            Self::from_file(&config_path)?
        } else {
            log::info!(
                "No configuration file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_overrides(
            std::env::var("MODEL_PATH").ok(),
            std::env::var("PORT").ok(),
        )?;
        config.model.input_spec()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&config_str)
    }

    pub fn from_yaml_str(config_str: &str) -> Result<Self, ConfigError> {
        let config: DetectorConfig = serde_yaml::from_str(config_str)?;
        config.model.input_spec()?;
        Ok(config)
    }

    pub fn apply_overrides(
        &mut self,
        model_path: Option<String>,
        port: Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(model_path) = model_path {
            self.model.path = PathBuf::from(model_path);
        }
        if let Some(port) = port {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT is not a valid port: {}", port)))?;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_efficientnet_b2() {
        let config = DetectorConfig::default();
        let spec = config.model.input_spec().unwrap();
        assert_eq!((spec.width, spec.height), (260, 260));
        assert_eq!(spec.preprocessing, Preprocessing::EfficientNet);
        assert_eq!(config.model.output, ScoreMapping::Probability);
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn parses_full_document() {
        let config = DetectorConfig::from_yaml_str(
            r#"
server:
  host: 127.0.0.1
  port: 9090
model:
  path: /srv/models/detector.pt
  input_size: [224, 224]
  preprocessing: unit_scale
  resize_filter: lanczos3
  layout: nhwc
  output:
    kind: softmax
    fake_index: 1
"#,
        )
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert_eq!(config.model.path, PathBuf::from("/srv/models/detector.pt"));
        assert_eq!(config.model.layout, TensorLayout::Nhwc);
        assert_eq!(config.model.output, ScoreMapping::Softmax { fake_index: 1 });
        let spec = config.model.input_spec().unwrap();
        assert_eq!((spec.width, spec.height), (224, 224));
        assert_eq!(spec.preprocessing, Preprocessing::UnitScale);
        assert_eq!(spec.filter, ResizeFilter::Lanczos3);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let config =
            DetectorConfig::from_yaml_str(include_str!("../../config/detector.yaml")).unwrap();
        let defaults = DetectorConfig::default();
        assert_eq!(config.model.input_spec().unwrap(), defaults.model.input_spec().unwrap());
        assert_eq!(config.model.path, defaults.model.path);
        assert_eq!(config.model.output, defaults.model.output);
        assert_eq!(config.bind_address(), defaults.bind_address());
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let config = DetectorConfig::from_yaml_str("server:\n  port: 8081\n").unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.model.input_size, vec![260, 260]);
    }

    #[test]
    fn rejects_bad_input_size() {
        let err = DetectorConfig::from_yaml_str("model:\n  input_size: [260]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = DetectorConfig::from_yaml_str("model:\n  input_size: [0, 260]\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_unknown_preprocessing() {
        let err = DetectorConfig::from_yaml_str("model:\n  preprocessing: zscore\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn environment_overrides_win() {
        let mut config = DetectorConfig::default();
        config
            .apply_overrides(Some("/tmp/other.pt".into()), Some("8081".into()))
            .unwrap();
        assert_eq!(config.model.path, PathBuf::from("/tmp/other.pt"));
        assert_eq!(config.server.port, 8081);

        assert!(config.apply_overrides(None, Some("eighty".into())).is_err());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = DetectorConfig::from_file(Path::new("/nonexistent/detector.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
