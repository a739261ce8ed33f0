use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::application::services::DEFAULT_QA_TEMPLATE;
use crate::domain::text_splitter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};

pub const CONFIG_FILE: &str = "config.yaml";
pub const PROMPTS_FILE: &str = "prompts.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

/// Everything the binaries need, loaded from `config.yaml` and `prompts.yaml`.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Loads from `CONFIG_DIR` (default `./config`), then applies env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".into());
        let mut config = Self::from_dir(&dir)?;
        config.config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Missing files fall back to defaults; malformed files are an error.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        Ok(Self {
            config: read_yaml(&dir.join(CONFIG_FILE))?.unwrap_or_default(),
            prompts: read_yaml(&dir.join(PROMPTS_FILE))?.unwrap_or_default(),
        })
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub redis_url: String,
    pub qdrant: QdrantConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub splitter: SplitterConfig,
    pub rag: RagConfig,
    pub worker: WorkerConfig,
    pub upload: UploadConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Overrides file values with `SERVER_HOST`, `SERVER_PORT`, `REDIS_URL`,
    /// `QDRANT_URL`, `WORKER_CONCURRENCY` and `LOG_JSON`.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = parse_env("SERVER_PORT", port)?;
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.redis_url = url;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.qdrant.url = url;
        }
        if let Some(concurrency) = lookup("WORKER_CONCURRENCY") {
            self.worker.concurrency = parse_env("WORKER_CONCURRENCY", concurrency)?;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json = parse_env("LOG_JSON", json)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value,
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            redis_url: "redis://localhost:6379".to_string(),
            qdrant: QdrantConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            splitter: SplitterConfig::default(),
            rag: RagConfig::default(),
            worker: WorkerConfig::default(),
            upload: UploadConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6334".to_string(),
            collection: "pdf_chunks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.2,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: crate::application::services::DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub result_ttl_seconds: u64,
    pub poll_interval_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            result_ttl_seconds: 3600,
            poll_interval_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 200 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub qa: QaPromptConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QaPromptConfig {
    pub system: String,
    pub template: String,
}

impl Default for QaPromptConfig {
    fn default() -> Self {
        Self {
            system: String::new(),
            template: DEFAULT_QA_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_use_gpt35_and_2000_char_chunks() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!((config.llm.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.splitter.chunk_size, 2000);
        assert_eq!(config.splitter.chunk_overlap, 200);
        assert_eq!(config.rag.top_k, 4);
    }

    #[test]
    fn test_missing_dir_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::from_dir(dir.path().join("nope")).unwrap();
        assert_eq!(config.config.server.port, 8080);
        assert!(config.prompts.qa.template.contains("{context}"));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "llm:\n  model: gpt-4o-mini\nsplitter:\n  chunk_size: 500\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join(PROMPTS_FILE),
            "qa:\n  system: Be concise.\n",
        )
        .unwrap();

        let config = AppConfig::from_dir(dir.path()).unwrap();

        assert_eq!(config.config.llm.model, "gpt-4o-mini");
        assert_eq!(config.config.llm.timeout_seconds, 60);
        assert_eq!(config.config.splitter.chunk_size, 500);
        assert_eq!(config.config.splitter.chunk_overlap, 200);
        assert_eq!(config.prompts.qa.system, "Be concise.");
        assert_eq!(config.prompts.qa.template, DEFAULT_QA_TEMPLATE);
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "server: [not, a, map]\n").unwrap();

        let err = AppConfig::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SERVER_PORT", "9000"),
            ("REDIS_URL", "redis://cache:6379"),
            ("LOG_JSON", "true"),
        ]);
        let mut config = Config::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.redis_url, "redis://cache:6379");
        assert!(config.logging.json);
        assert_eq!(config.qdrant.url, "http://localhost:6334");
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == "WORKER_CONCURRENCY").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }
}
