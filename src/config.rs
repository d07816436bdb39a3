//! Configuration for book-chunker
//!
//! All settings have defaults and can be overridden per invocation, either from
//! a JSON file or from the command line.

use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Size bounds and merge strategy
    pub chunking: ChunkingConfig,

    /// Front/back matter exclusion
    pub exclusion: ExclusionConfig,

    /// Where and how chunks are materialized
    pub output: OutputConfig,

    /// Token counting
    pub tokenizer: TokenizerConfig,
}

/// Size bounds applied by the normalizer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Minimum pages per chunk before merging stops
    pub min_pages: u32,

    /// Maximum pages a merged chunk may span
    pub max_pages: u32,

    /// Minimum tokens per chunk before merging stops
    pub min_tokens: usize,

    /// Tokens above which a chunk is split at child boundaries
    pub max_tokens: usize,

    /// Strategy used to grow undersized sections
    pub merge_policy: MergePolicyKind,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_pages: 2,
            max_pages: 25,
            min_tokens: 300,
            max_tokens: 6000,
            merge_policy: MergePolicyKind::GrowingRun,
        }
    }
}

/// Available merge strategies
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicyKind {
    /// Absorb following siblings until the run is large enough, rolling back
    /// when the run overshoots
    #[default]
    GrowingRun,

    /// Fold a single-page section into the adjacent multi-page section
    Pairwise,
}

impl MergePolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergePolicyKind::GrowingRun => "growing-run",
            MergePolicyKind::Pairwise => "pairwise",
        }
    }
}

/// Exclusion of non-content sections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Whether front/back matter is dropped at all
    pub exclude_sections: bool,

    /// Extra regular expressions tested against title and path
    pub custom_exclude_patterns: Vec<String>,

    /// Which secondary heuristic runs alongside the title patterns
    pub policy: ExclusionPolicyKind,

    /// Sections starting on or before this page are content-sniffed
    pub sniff_page_limit: u32,

    /// Pages sampled per sniffed section
    pub sniff_max_pages: u32,

    /// Characters sampled per sniffed section
    pub sniff_sample_chars: usize,

    /// Main content starts no later than the first section past this page
    pub main_content_page_threshold: u32,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            exclude_sections: true,
            custom_exclude_patterns: Vec::new(),
            policy: ExclusionPolicyKind::ContentSniff,
            sniff_page_limit: 50,
            sniff_max_pages: 5,
            sniff_sample_chars: 2000,
            main_content_page_threshold: 30,
        }
    }
}

/// Secondary exclusion heuristics
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ExclusionPolicyKind {
    /// Sniff the text of early sections for front matter signatures
    #[default]
    ContentSniff,

    /// Exclude everything outside the detected main-content window
    MainContentWindow,
}

impl ExclusionPolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionPolicyKind::ContentSniff => "content-sniff",
            ExclusionPolicyKind::MainContentWindow => "main-content-window",
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the JSON report and mini PDFs
    pub output_dir: PathBuf,

    /// Whether a page-range PDF is written per chunk
    pub save_artifacts: bool,

    /// Worker threads used for materialization
    pub workers: usize,

    /// Show a progress bar while materializing
    pub show_progress: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            save_artifacts: true,
            workers: 6,
            show_progress: false,
        }
    }
}

impl OutputConfig {
    /// Directory holding the per-chunk page-range PDFs
    pub fn artifact_dir(&self) -> PathBuf {
        self.output_dir.join("mini_pdfs")
    }
}

/// Token counting settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Path to a HuggingFace `tokenizer.json`; approximate counting when unset
    pub tokenizer_path: Option<PathBuf>,

    /// Tokens per whitespace-separated word for approximate counting
    pub tokens_per_word: f64,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            tokenizer_path: None,
            tokens_per_word: 1.3,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChunkerError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check bounds and patterns before any processing starts
    pub fn validate(&self) -> Result<()> {
        let chunking = &self.chunking;
        if chunking.min_pages > chunking.max_pages {
            return Err(ChunkerError::Config(format!(
                "min_pages ({}) exceeds max_pages ({})",
                chunking.min_pages, chunking.max_pages
            )));
        }
        if chunking.min_tokens > chunking.max_tokens {
            return Err(ChunkerError::Config(format!(
                "min_tokens ({}) exceeds max_tokens ({})",
                chunking.min_tokens, chunking.max_tokens
            )));
        }
        if chunking.max_pages == 0 {
            return Err(ChunkerError::Config("max_pages must be at least 1".to_string()));
        }
        if self.output.workers == 0 {
            return Err(ChunkerError::Config("workers must be at least 1".to_string()));
        }
        if !(self.tokenizer.tokens_per_word > 0.0) {
            return Err(ChunkerError::Config(format!(
                "tokens_per_word must be positive, got {}",
                self.tokenizer.tokens_per_word
            )));
        }
        for pattern in &self.exclusion.custom_exclude_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                ChunkerError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e))
            })?;
        }
        Ok(())
    }
}
