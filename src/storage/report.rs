//! JSON chunk reports
//!
//! One `<book_id>_chunks.json` file per run, holding the chunks together with
//! the run summary and the parameters that produced them.

use crate::api::{ChunkingOutput, ChunkingSummary, PageRangeAnalytics};
use crate::classify::ExcludedSection;
use crate::config::Config;
use crate::error::Result;
use crate::materialize::{Chunk, MaterializationFailure};
use crate::utils::ensure_directory;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Parameters a run was made with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportParameters {
    pub min_pages: u32,
    pub max_pages: u32,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub exclude_sections: bool,
    pub custom_exclude_patterns: Vec<String>,
    pub merge_policy: String,
    pub exclusion_policy: String,
}

impl From<&Config> for ReportParameters {
    fn from(config: &Config) -> Self {
        Self {
            min_pages: config.chunking.min_pages,
            max_pages: config.chunking.max_pages,
            min_tokens: config.chunking.min_tokens,
            max_tokens: config.chunking.max_tokens,
            exclude_sections: config.exclusion.exclude_sections,
            custom_exclude_patterns: config.exclusion.custom_exclude_patterns.clone(),
            merge_policy: config.chunking.merge_policy.as_str().to_string(),
            exclusion_policy: config.exclusion.policy.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub summary: ChunkingSummary,
    pub source_file: Option<String>,
    /// RFC 3339 timestamp
    pub processing_date: String,
    pub parameters: ReportParameters,
    pub excluded_sections: Vec<ExcludedSection>,
    pub failures: Vec<MaterializationFailure>,
    pub page_range_analytics: Option<PageRangeAnalytics>,
}

/// The persisted result of a chunking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkReport {
    pub metadata: ReportMetadata,
    pub chunks: Vec<Chunk>,
}

impl ChunkReport {
    pub fn new(output: &ChunkingOutput, config: &Config, source_file: Option<&Path>) -> Self {
        Self {
            metadata: ReportMetadata {
                summary: output.summary.clone(),
                source_file: source_file.map(|path| path.display().to_string()),
                processing_date: chrono::Utc::now().to_rfc3339(),
                parameters: ReportParameters::from(config),
                excluded_sections: output.excluded.clone(),
                failures: output.failures.clone(),
                page_range_analytics: output.analytics.clone(),
            },
            chunks: output.chunks.clone(),
        }
    }

    /// Report file name for a book
    pub fn file_name(book_id: &str) -> String {
        format!("{}_chunks.json", book_id)
    }

    /// Write the report into `output_dir`, returning its path
    pub fn save<P: AsRef<Path>>(&self, output_dir: P) -> Result<PathBuf> {
        let output_dir = output_dir.as_ref();
        ensure_directory(output_dir)?;

        let path = output_dir.join(Self::file_name(&self.metadata.summary.book_id));
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        log::info!("Saved {} chunks to {}", self.chunks.len(), path.display());
        Ok(path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
