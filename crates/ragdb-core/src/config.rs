//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_INDEX__URI`). Paths in [`Settings`]
//! may use `~` and `${VAR}` and are resolved against a base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::IdStrategy;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> { Self::load_in(Path::new(".")) }

    /// Load `config.toml` and its per-environment overlay from `dir`.
    pub fn load_in(dir: &Path) -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self::from_figment(figment))
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::Config(format!("Failed to get '{key}': {e}")))
    }

    /// Extract and validate the full typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract().map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub corpus: CorpusSettings,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub uploads: UploadSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfiguration("embedding.dim must be positive".into()));
        }
        if self.uploads.embed_concurrency == 0 {
            return Err(Error::InvalidConfiguration("uploads.embed_concurrency must be positive".into()));
        }
        Ok(())
    }

    /// Expand and anchor every path setting at `base`.
    #[must_use]
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        self.corpus.legal_dir = resolve_with_base(base, self.corpus.legal_dir.to_string_lossy());
        self.corpus.finance_dir = resolve_with_base(base, self.corpus.finance_dir.to_string_lossy());
        self.index.uri = resolve_with_base(base, self.index.uri.to_string_lossy());
        self.uploads.registry_path = resolve_with_base(base, self.uploads.registry_path.to_string_lossy());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub legal_dir: PathBuf,
    pub finance_dir: PathBuf,
    pub top_k: usize,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self { legal_dir: PathBuf::from("legal-vector-db"), finance_dir: PathBuf::from("finance-vector-db"), top_k: 15 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    Fake,
    Gemini,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dim: usize,
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Gemini,
            model: "text-embedding-004".to_string(),
            dim: 768,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub uri: PathBuf,
    pub table: String,
}

impl Default for IndexSettings {
    fn default() -> Self { Self { uri: PathBuf::from("data/lancedb"), table: "documents".to_string() } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub registry_path: PathBuf,
    pub top_k: usize,
    pub id_strategy: IdStrategy,
    pub embed_concurrency: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("uploads/files.json"),
            top_k: 5,
            id_strategy: IdStrategy::Random,
            embed_concurrency: 1,
        }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a `PathBuf` without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
