//! Configuration value objects and the layered loader.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`APP_BM25__K1=1.5` sets `bm25.k1`). Every section has defaults, so an empty
//! environment still yields usable [`Settings`]. Provides helpers to expand `~`
//! and `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::length::LengthType;

/// Immutable chunking parameters shared by the recursive, semantic and hybrid chunkers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub length_type: LengthType,
    /// Highest priority first. The empty separator is always the final fallback.
    pub separators: Vec<String>,
    /// Keep each separator attached to the end of the piece it terminates.
    pub keep_separator: bool,
    pub strip_whitespace: bool,
    pub add_start_index: bool,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            length_type: LengthType::Char,
            separators: default_separators(),
            keep_separator: false,
            strip_whitespace: true,
            add_start_index: true,
        }
    }
}

pub fn default_separators() -> Vec<String> {
    ["\n\n", "\n", " ", ""].iter().map(ToString::to_string).collect()
}

impl ChunkConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self { chunk_size, chunk_overlap, ..Self::default() };
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn with_separators<S: Into<String>>(mut self, separators: impl IntoIterator<Item = S>) -> Self {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_keep_separator(mut self, keep: bool) -> Self {
        self.keep_separator = keep;
        self
    }

    #[must_use]
    pub fn with_length_type(mut self, length_type: LengthType) -> Self {
        self.length_type = length_type;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::invalid_config("chunk_size must be greater than 0"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::invalid_config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticConfig {
    pub similarity_threshold: f32,
    /// Runs shorter than this are merged with the following run.
    pub min_chunk_size: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self { similarity_threshold: 0.5, min_chunk_size: 100 }
    }
}

/// Message/slide chunker parameters. Overlap is not configurable there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundarySettings {
    pub chunk_size: usize,
    pub length_type: LengthType,
    pub redact_addresses: bool,
    pub merge_small_units: bool,
}

impl Default for BoundarySettings {
    fn default() -> Self {
        Self { chunk_size: 4000, length_type: LengthType::Token, redact_addresses: true, merge_small_units: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Config {
    /// Term-frequency saturation.
    pub k1: f32,
    /// Length normalization, in `[0, 1]`.
    pub b: f32,
    /// IDF floor as a fraction of the mean IDF.
    pub epsilon: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75, epsilon: 0.25 }
    }
}

impl Bm25Config {
    pub fn validate(&self) -> Result<()> {
        if !(self.k1.is_finite() && self.k1 >= 0.0) {
            return Err(Error::invalid_config(format!("bm25.k1 must be a non-negative number, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::invalid_config(format!("bm25.b must be within [0, 1], got {}", self.b)));
        }
        if !(self.epsilon.is_finite() && self.epsilon >= 0.0) {
            return Err(Error::invalid_config(format!(
                "bm25.epsilon must be a non-negative number, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    #[serde(alias = "dot_product", alias = "ip")]
    Dot,
    /// Negated Euclidean distance between L2-normalized vectors.
    #[serde(alias = "euclidean", alias = "l2")]
    NegEuclidean,
}

impl FromStr for SimilarityMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" | "cos" => Ok(Self::Cosine),
            "dot" | "dot_product" | "ip" => Ok(Self::Dot),
            "neg_euclidean" | "euclidean" | "l2" => Ok(Self::NegEuclidean),
            other => Err(Error::invalid_config(format!("unknown similarity metric '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub metric: SimilarityMetric,
    /// Embed chunks that arrive without a vector (batched with the query).
    pub embed_missing: bool,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self { metric: SimilarityMetric::Cosine, embed_missing: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionKind {
    #[default]
    Weighted,
    Rrf,
}

impl FromStr for FusionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weighted" => Ok(Self::Weighted),
            "rrf" | "reciprocal_rank" => Ok(Self::Rrf),
            other => Err(Error::invalid_config(format!(
                "unknown fusion method '{other}', expected 'weighted' or 'rrf'"
            ))),
        }
    }
}

impl fmt::Display for FusionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weighted => f.write_str("weighted"),
            Self::Rrf => f.write_str("rrf"),
        }
    }
}

/// Validated fusion strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FusionMethod {
    Weighted { lexical_weight: f32, vector_weight: f32 },
    Rrf { k: f32 },
}

impl FusionMethod {
    pub fn weighted(lexical_weight: f32, vector_weight: f32) -> Result<Self> {
        for (name, w) in [("lexical_weight", lexical_weight), ("vector_weight", vector_weight)] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(Error::invalid_config(format!("fusion.{name} must be a non-negative number, got {w}")));
            }
        }
        Ok(Self::Weighted { lexical_weight, vector_weight })
    }

    pub fn rrf(k: f32) -> Result<Self> {
        if !(k.is_finite() && k > 0.0) {
            return Err(Error::invalid_config(format!("fusion.rrf_k must be positive, got {k}")));
        }
        Ok(Self::Rrf { k })
    }

    pub fn from_config(config: &FusionConfig) -> Result<Self> {
        match config.method {
            FusionKind::Weighted => Self::weighted(config.lexical_weight, config.vector_weight),
            FusionKind::Rrf => Self::rrf(config.rrf_k),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub method: FusionKind,
    pub lexical_weight: f32,
    pub vector_weight: f32,
    pub rrf_k: f32,
    /// Each ranker fetches `top_k * candidate_multiplier` before fusion.
    pub candidate_multiplier: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { method: FusionKind::Weighted, lexical_weight: 0.5, vector_weight: 0.5, rrf_k: 60.0, candidate_multiplier: 2 }
    }
}

impl FusionConfig {
    pub fn fusion_method(&self) -> Result<FusionMethod> {
        FusionMethod::from_config(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreNormalization {
    #[default]
    MinMax,
    Sigmoid,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub enabled: bool,
    pub normalization: ScoreNormalization,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub input_dir: String,
    pub extensions: Vec<String>,
    pub embedding_dim: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input_dir: "./data".to_string(),
            extensions: vec!["txt".to_string(), "md".to_string()],
            embedding_dim: 256,
        }
    }
}

/// All sections, each independently defaulted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkConfig,
    pub semantic: SemanticConfig,
    pub boundary: BoundarySettings,
    pub bm25: Bm25Config,
    pub vector: VectorConfig,
    pub fusion: FusionConfig,
    pub rerank: RerankConfig,
    pub data: DataConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.bm25.validate()?;
        self.fusion.fusion_method()?;
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Load a single TOML file layered over the defaults, without env overrides.
    pub fn from_path(path: &Path) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file(path));
        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::invalid_config(format!("Failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::invalid_config(format!("Failed to read settings: {e}")))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
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
