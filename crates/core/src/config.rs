//! Configuration management for Petpal.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Defaults
//! - Config file (`.petpal/config.yaml` or `PETPAL_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! Secrets are never part of the configuration itself; only the *name* of the
//! environment variable holding a secret is configurable.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Generative-model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmSettings {
    /// Provider name ("gemini", "ollama")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Optional custom endpoint URL
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: None,
            api_key_env: "GOOGLE_API_KEY".to_string(),
        }
    }
}

/// Embedding-model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingSettings {
    /// Provider name ("gemini", "ollama", "trigram")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Expected vector dimensions
    pub dimensions: usize,

    /// Optional custom endpoint URL
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Upper bound for one embedding / retrieval round trip
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "embedding-001".to_string(),
            dimensions: 768,
            endpoint: None,
            api_key_env: "GOOGLE_API_KEY".to_string(),
            timeout_secs: 5,
        }
    }
}

/// Vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexSettings {
    /// Backend name ("chroma", "memory")
    pub backend: String,

    /// Index service host
    pub host: String,

    /// Index service port
    pub port: u16,

    /// Collection holding the platform documents
    pub collection: String,

    /// Chroma REST API version: "v2" (Chroma 1.x) or "v1" (0.4/0.5 servers)
    pub api_version: String,

    /// Tenant for the v2 API
    pub tenant: String,

    /// Database for the v2 API
    pub database: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            backend: "chroma".to_string(),
            host: "localhost".to_string(),
            port: 8000,
            collection: "petpal_collection".to_string(),
            api_version: "v2".to_string(),
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
        }
    }
}

impl IndexSettings {
    /// Base URL of the index service.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Query answering settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Number of documents retrieved per question
    pub top_k: usize,

    /// Sampling temperature for the generative model
    pub temperature: f32,

    /// Upper bound for one generation call
    pub generation_timeout_secs: u64,

    /// Optional cap on generated tokens
    pub max_tokens: Option<u32>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            temperature: 0.7,
            generation_timeout_secs: 30,
            max_tokens: None,
        }
    }
}

/// Batch ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestionSettings {
    /// Documents per upsert call
    pub batch_size: usize,

    /// Pause after a successful batch
    pub batch_delay_secs: u64,

    /// Pause after a failed batch
    pub failure_backoff_secs: u64,

    /// Optional extra cap on upsert calls per minute
    pub requests_per_minute: Option<u32>,

    /// Record ingested documents and skip them on incremental runs
    pub checkpoint: bool,
}

impl Default for IngestionSettings {
    fn default() -> Self {
        Self {
            batch_size: 1,
            batch_delay_secs: 10,
            failure_backoff_secs: 60,
            requests_per_minute: None,
            checkpoint: false,
        }
    }
}

/// Relational record source settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// SQLite database path (relative paths resolve against the workspace)
    pub database: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database: PathBuf::from(".petpal/petpal.sqlite3"),
        }
    }
}

/// HTTP boundary settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Socket address to listen on
    pub bind: String,

    /// Name of the environment variable holding the superuser token
    pub admin_token_env: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            admin_token_env: "PETPAL_ADMIN_TOKEN".to_string(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .petpal/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub chat: ChatSettings,
    pub ingestion: IngestionSettings,
    pub store: StoreSettings,
    pub server: ServerSettings,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    index: Option<IndexSettings>,
    chat: Option<ChatSettings>,
    ingestion: Option<IngestionSettings>,
    store: Option<StoreSettings>,
    server: Option<ServerSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            index: IndexSettings::default(),
            chat: ChatSettings::default(),
            ingestion: IngestionSettings::default(),
            store: StoreSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and the
    /// process environment.
    ///
    /// Environment variables:
    /// - `PETPAL_WORKSPACE`, `PETPAL_CONFIG`
    /// - `PETPAL_LLM_PROVIDER`, `PETPAL_LLM_MODEL`, `PETPAL_LLM_ENDPOINT`
    /// - `PETPAL_EMBEDDING_PROVIDER`, `PETPAL_EMBEDDING_MODEL`,
    ///   `PETPAL_EMBEDDING_DIMENSIONS`, `PETPAL_EMBEDDING_TIMEOUT_SECS`, `OLLAMA_URL`
    /// - `PETPAL_INDEX_BACKEND`, `CHROMA_HOST`, `CHROMA_PORT`, `CHROMA_COLLECTION`,
    ///   `CHROMA_API_VERSION`, `CHROMA_TENANT`, `CHROMA_DATABASE`
    /// - `PETPAL_CHAT_TOP_K`, `PETPAL_CHAT_TEMPERATURE`, `PETPAL_GENERATION_TIMEOUT_SECS`
    /// - `PETPAL_BATCH_SIZE`, `PETPAL_BATCH_DELAY_SECS`, `PETPAL_FAILURE_BACKOFF_SECS`,
    ///   `PETPAL_REQUESTS_PER_MINUTE`, `PETPAL_INGEST_CHECKPOINT`
    /// - `PETPAL_DATABASE`, `PETPAL_BIND`
    /// - `RUST_LOG`, `NO_COLOR`
    ///
    /// # Example
    /// ```no_run
    /// use petpal_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Index: {}", config.index.base_url());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Like [`AppConfig::load`], with an explicit workspace and config file
    /// taking precedence over `PETPAL_WORKSPACE` / `PETPAL_CONFIG`.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| std::env::var_os("PETPAL_WORKSPACE").map(PathBuf::from)) {
            config.workspace = workspace;
        }

        if let Some(config_file) = config_file.or_else(|| std::env::var_os("PETPAL_CONFIG").map(PathBuf::from)) {
            config.config_file = Some(config_file);
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.petpal_dir().join("config.yaml"));

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        config.apply_env(|key| std::env::var(key).ok())?;

        config.log_level = std::env::var("RUST_LOG").ok().or(config.log_level);
        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(llm) = file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = file.embedding {
            result.embedding = embedding;
        }
        if let Some(index) = file.index {
            result.index = index;
        }
        if let Some(chat) = file.chat {
            result.chat = chat;
        }
        if let Some(ingestion) = file.ingestion {
            result.ingestion = ingestion;
        }
        if let Some(store) = file.store {
            result.store = store;
        }
        if let Some(server) = file.server {
            result.server = server;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Taking the lookup as a closure keeps this testable without touching
    /// the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PETPAL_LLM_PROVIDER") {
            self.llm.provider = v;
        }
        if let Some(v) = lookup("PETPAL_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = lookup("PETPAL_LLM_ENDPOINT") {
            self.llm.endpoint = Some(v);
        }

        if let Some(v) = lookup("PETPAL_EMBEDDING_PROVIDER") {
            self.embedding.provider = v;
        }
        if let Some(v) = lookup("PETPAL_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Some(v) = lookup("PETPAL_EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = parse_env("PETPAL_EMBEDDING_DIMENSIONS", &v)?;
        }
        if let Some(v) = lookup("PETPAL_EMBEDDING_TIMEOUT_SECS") {
            self.embedding.timeout_secs = parse_env("PETPAL_EMBEDDING_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("OLLAMA_URL") {
            if self.embedding.provider == "ollama" {
                self.embedding.endpoint = Some(v.clone());
            }
            if self.llm.provider == "ollama" && self.llm.endpoint.is_none() {
                self.llm.endpoint = Some(v);
            }
        }

        if let Some(v) = lookup("PETPAL_INDEX_BACKEND") {
            self.index.backend = v;
        }
        if let Some(v) = lookup("CHROMA_HOST") {
            self.index.host = v;
        }
        if let Some(v) = lookup("CHROMA_PORT") {
            self.index.port = parse_env("CHROMA_PORT", &v)?;
        }
        if let Some(v) = lookup("CHROMA_COLLECTION") {
            self.index.collection = v;
        }
        if let Some(v) = lookup("CHROMA_API_VERSION") {
            self.index.api_version = v;
        }
        if let Some(v) = lookup("CHROMA_TENANT") {
            self.index.tenant = v;
        }
        if let Some(v) = lookup("CHROMA_DATABASE") {
            self.index.database = v;
        }

        if let Some(v) = lookup("PETPAL_CHAT_TOP_K") {
            self.chat.top_k = parse_env("PETPAL_CHAT_TOP_K", &v)?;
        }
        if let Some(v) = lookup("PETPAL_CHAT_TEMPERATURE") {
            self.chat.temperature = parse_env("PETPAL_CHAT_TEMPERATURE", &v)?;
        }
        if let Some(v) = lookup("PETPAL_GENERATION_TIMEOUT_SECS") {
            self.chat.generation_timeout_secs = parse_env("PETPAL_GENERATION_TIMEOUT_SECS", &v)?;
        }

        if let Some(v) = lookup("PETPAL_BATCH_SIZE") {
            self.ingestion.batch_size = parse_env("PETPAL_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("PETPAL_BATCH_DELAY_SECS") {
            self.ingestion.batch_delay_secs = parse_env("PETPAL_BATCH_DELAY_SECS", &v)?;
        }
        if let Some(v) = lookup("PETPAL_FAILURE_BACKOFF_SECS") {
            self.ingestion.failure_backoff_secs = parse_env("PETPAL_FAILURE_BACKOFF_SECS", &v)?;
        }
        if let Some(v) = lookup("PETPAL_REQUESTS_PER_MINUTE") {
            self.ingestion.requests_per_minute =
                Some(parse_env("PETPAL_REQUESTS_PER_MINUTE", &v)?);
        }
        if let Some(v) = lookup("PETPAL_INGEST_CHECKPOINT") {
            self.ingestion.checkpoint = matches!(v.as_str(), "1" | "true" | "True" | "TRUE");
        }

        if let Some(v) = lookup("PETPAL_DATABASE") {
            self.store.database = PathBuf::from(v);
        }
        if let Some(v) = lookup("PETPAL_BIND") {
            self.server.bind = v;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .petpal directory.
    pub fn petpal_dir(&self) -> PathBuf {
        self.workspace.join(".petpal")
    }

    /// Ensure the .petpal directory exists.
    pub fn ensure_petpal_dir(&self) -> AppResult<()> {
        let dir = self.petpal_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .petpal directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Resolved path of the relational record source.
    pub fn database_path(&self) -> PathBuf {
        if self.store.database.is_absolute() {
            self.store.database.clone()
        } else {
            self.workspace.join(&self.store.database)
        }
    }

    /// Path of the ingestion checkpoint ledger.
    pub fn ledger_path(&self) -> PathBuf {
        self.petpal_dir().join("ingest_ledger.json")
    }

    /// Resolve the generative-model API key from its environment variable.
    pub fn llm_api_key(&self) -> Option<String> {
        std::env::var(&self.llm.api_key_env).ok()
    }

    /// Resolve the embedding-model API key from its environment variable.
    pub fn embedding_api_key(&self) -> Option<String> {
        std::env::var(&self.embedding.api_key_env).ok()
    }

    /// Resolve the superuser token guarding administrative endpoints.
    pub fn admin_token(&self) -> Option<String> {
        std::env::var(&self.server.admin_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        let llm_providers = ["gemini", "ollama"];
        if !llm_providers.contains(&self.llm.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                llm_providers.join(", ")
            )));
        }

        let embedding_providers = ["gemini", "ollama", "trigram"];
        if !embedding_providers.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                embedding_providers.join(", ")
            )));
        }

        let backends = ["chroma", "memory"];
        if !backends.contains(&self.index.backend.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown index backend: {}. Supported: {}",
                self.index.backend,
                backends.join(", ")
            )));
        }

        let api_versions = ["v1", "v2"];
        if !api_versions.contains(&self.index.api_version.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown Chroma API version: {}. Supported: {}",
                self.index.api_version,
                api_versions.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be at least 1".to_string(),
            ));
        }

        if self.chat.top_k == 0 {
            return Err(AppError::Config("chat.topK must be at least 1".to_string()));
        }

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(AppError::Config(format!(
                "chat.temperature must be within 0.0-2.0, got {}",
                self.chat.temperature
            )));
        }

        if self.chat.generation_timeout_secs == 0 {
            return Err(AppError::Config(
                "chat.generationTimeoutSecs must be at least 1".to_string(),
            ));
        }

        if self.ingestion.batch_size == 0 {
            return Err(AppError::Config(
                "ingestion.batchSize must be at least 1".to_string(),
            ));
        }

        if self.ingestion.requests_per_minute == Some(0) {
            return Err(AppError::Config(
                "ingestion.requestsPerMinute must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_env<T>(key: &str, value: &str) -> AppResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid value for {}: '{}' ({})", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.chat.top_k, 3);
        assert!((config.chat.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.ingestion.batch_size, 1);
        assert_eq!(config.ingestion.batch_delay_secs, 10);
        assert_eq!(config.ingestion.failure_backoff_secs, 60);
        assert!(!config.ingestion.checkpoint);
        assert_eq!(config.index.base_url(), "http://localhost:8000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_petpal_dir() {
        let config = AppConfig::default();
        assert!(config.petpal_dir().ends_with(".petpal"));
        assert!(config.ledger_path().ends_with("ingest_ledger.json"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[
                ("CHROMA_HOST", "chroma_db"),
                ("CHROMA_PORT", "8001"),
                ("CHROMA_API_VERSION", "v1"),
                ("PETPAL_BATCH_SIZE", "5"),
                ("PETPAL_BATCH_DELAY_SECS", "2"),
                ("PETPAL_FAILURE_BACKOFF_SECS", "30"),
                ("PETPAL_REQUESTS_PER_MINUTE", "12"),
                ("PETPAL_INGEST_CHECKPOINT", "true"),
            ]))
            .unwrap();

        assert_eq!(config.index.base_url(), "http://chroma_db:8001");
        assert_eq!(config.index.api_version, "v1");
        assert_eq!(config.index.tenant, "default_tenant");
        assert_eq!(config.ingestion.batch_size, 5);
        assert_eq!(config.ingestion.batch_delay_secs, 2);
        assert_eq!(config.ingestion.failure_backoff_secs, 30);
        assert_eq!(config.ingestion.requests_per_minute, Some(12));
        assert!(config.ingestion.checkpoint);
    }

    #[test]
    fn test_env_override_rejects_bad_number() {
        let mut config = AppConfig::default();
        let result = config.apply_env(lookup_from(&[("CHROMA_PORT", "eight-thousand")]));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_ollama_url_routes_to_ollama_providers() {
        let mut config = AppConfig::default();
        config
            .apply_env(lookup_from(&[
                ("PETPAL_EMBEDDING_PROVIDER", "ollama"),
                ("OLLAMA_URL", "http://ollama:11434"),
            ]))
            .unwrap();

        assert_eq!(
            config.embedding.endpoint.as_deref(),
            Some("http://ollama:11434")
        );
        // LLM stays on gemini, so its endpoint is untouched
        assert_eq!(config.llm.endpoint, None);
    }

    #[test]
    fn test_merge_yaml_partial_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(
            &path,
            "ingestion:\n  batchSize: 4\n  failureBackoffSecs: 90\nindex:\n  backend: memory\nlogging:\n  level: debug\n  color: false\n",
        )
        .unwrap();

        let config = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(config.ingestion.batch_size, 4);
        assert_eq!(config.ingestion.failure_backoff_secs, 90);
        // Unspecified keys in a present section keep their defaults
        assert_eq!(config.ingestion.batch_delay_secs, 10);
        assert_eq!(config.index.backend, "memory");
        assert_eq!(config.index.port, 8000);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.no_color);
    }

    #[test]
    fn test_load_from_explicit_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("petpal.yaml");
        std::fs::write(&path, "index:\n  collection: staging_collection\n").unwrap();

        let config = AppConfig::load_from(Some(temp.path().to_path_buf()), Some(path.clone())).unwrap();
        assert_eq!(config.workspace, temp.path());
        assert_eq!(config.config_file, Some(path));
        assert_eq!(config.index.collection, "staging_collection");
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(matches!(
            AppConfig::load_from(Some(missing), None),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(None, None, None, true, false);

        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_database_path_resolves_against_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/petpal");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/srv/petpal/.petpal/petpal.sqlite3")
        );

        config.store.database = PathBuf::from("/var/lib/petpal.db");
        assert_eq!(config.database_path(), PathBuf::from("/var/lib/petpal.db"));
    }

    #[test]
    fn test_validate_rejects_unknown_backend() {
        let mut config = AppConfig::default();
        config.index.backend = "pinecone".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_batch_and_top_k() {
        let mut config = AppConfig::default();
        config.ingestion.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.chat.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_chroma_api() {
        let mut config = AppConfig::default();
        config.index.api_version = "v3".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_generation_timeout() {
        let mut config = AppConfig::default();
        config.chat.generation_timeout_secs = 0;
        match config.validate() {
            Err(AppError::Config(msg)) => assert!(msg.contains("generationTimeoutSecs")),
            other => panic!("expected config error, got {:?}", other),
        }

        config.chat.generation_timeout_secs = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_temperature() {
        let mut config = AppConfig::default();
        config.chat.temperature = 3.5;
        assert!(config.validate().is_err());
    }
}
