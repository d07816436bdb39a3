//! Front and back matter classification
//!
//! Decides, per section, whether its own prose is content worth chunking.
//! Title/path patterns always run; one secondary policy runs alongside them:
//! either sniffing the text of early sections or excluding everything outside
//! the detected main-content window. Container headings with no prose of
//! their own are always excluded so that page ranges never overlap.

pub mod patterns;

use crate::config::{ExclusionConfig, ExclusionPolicyKind};
use crate::document::{DocumentSource, range_text};
use crate::error::{ChunkerError, Result};
use crate::outline::{ResolvedOutline, Section, SectionOrigin};
use patterns::{BACK_MATTER_PATTERNS, CONTENT_SIGNATURES, DEFAULT_EXCLUDE_PATTERNS, STRUCTURAL_KEYWORDS};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a section was excluded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Title or path matched the contained pattern
    TitlePattern(String),
    /// Early-page text matched the labelled signature
    Content(String),
    /// Outside the main-content window
    OutsideMainContent,
    /// First child starts on the section's own page
    Container,
    /// Untitled pages before the first outline entry
    FrontMatter,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::TitlePattern(pattern) => write!(f, "title pattern: {}", pattern),
            ExclusionReason::Content(label) => write!(f, "content: {}", label),
            ExclusionReason::OutsideMainContent => f.write_str("outside main content window"),
            ExclusionReason::Container => f.write_str("parent with no unique content"),
            ExclusionReason::FrontMatter => f.write_str("untitled front matter"),
        }
    }
}

/// Classification outcome for one section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Exclude(ExclusionReason),
}

impl Verdict {
    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep)
    }
}

/// A section dropped by the classifier, reported in the run output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedSection {
    pub title: String,
    pub path: String,
    pub start_page: u32,
    pub reason: String,
}

/// Title, content and structure based section filter
pub struct ContentClassifier {
    enabled: bool,
    policy: ExclusionPolicyKind,
    title_patterns: Vec<(String, Regex)>,
    back_matter: Vec<Regex>,
    signatures: Vec<(&'static str, Regex)>,
    sniff_page_limit: u32,
    sniff_max_pages: u32,
    sniff_sample_chars: usize,
    main_content_page_threshold: u32,
}

impl ContentClassifier {
    /// Compile the default library plus any caller-supplied patterns
    pub fn new(config: &ExclusionConfig) -> Result<Self> {
        let mut title_patterns = Vec::new();
        let builtin = DEFAULT_EXCLUDE_PATTERNS.iter().map(|p| p.to_string());
        for pattern in builtin.chain(config.custom_exclude_patterns.iter().cloned()) {
            let regex = compile(&pattern, false)?;
            title_patterns.push((pattern, regex));
        }

        let back_matter = BACK_MATTER_PATTERNS
            .iter()
            .map(|pattern| compile(pattern, false))
            .collect::<Result<Vec<_>>>()?;

        let signatures = CONTENT_SIGNATURES
            .iter()
            .map(|&(pattern, label)| compile(pattern, true).map(|regex| (label, regex)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            enabled: config.exclude_sections,
            policy: config.policy,
            title_patterns,
            back_matter,
            signatures,
            sniff_page_limit: config.sniff_page_limit,
            sniff_max_pages: config.sniff_max_pages.max(1),
            sniff_sample_chars: config.sniff_sample_chars,
            main_content_page_threshold: config.main_content_page_threshold,
        })
    }

    pub fn policy(&self) -> ExclusionPolicyKind {
        self.policy
    }

    /// Classify every section of a resolved outline
    pub fn classify<D: DocumentSource + ?Sized>(
        &self,
        outline: &ResolvedOutline,
        source: &D,
    ) -> Result<Vec<Verdict>> {
        let window = match self.policy {
            ExclusionPolicyKind::MainContentWindow if self.enabled => {
                self.main_content_window(&outline.sections)
            }
            _ => None,
        };

        let mut verdicts = Vec::with_capacity(outline.sections.len());
        for (index, section) in outline.sections.iter().enumerate() {
            let verdict = self.classify_section(outline, index, source, window)?;
            if let Verdict::Exclude(reason) = &verdict {
                log::debug!("Excluding '{}' ({})", section.breadcrumb(), reason);
            }
            verdicts.push(verdict);
        }
        Ok(verdicts)
    }

    fn classify_section<D: DocumentSource + ?Sized>(
        &self,
        outline: &ResolvedOutline,
        index: usize,
        source: &D,
        window: Option<(usize, usize)>,
    ) -> Result<Verdict> {
        let section = &outline.sections[index];
        if section.origin == SectionOrigin::FullDocument {
            return Ok(Verdict::Keep);
        }

        if self.enabled {
            if section.origin == SectionOrigin::FrontMatter {
                return Ok(Verdict::Exclude(ExclusionReason::FrontMatter));
            }
            if let Some(pattern) = self.match_title(section) {
                return Ok(Verdict::Exclude(ExclusionReason::TitlePattern(pattern.to_string())));
            }
        }

        if outline.is_container(index) {
            return Ok(Verdict::Exclude(ExclusionReason::Container));
        }

        if !self.enabled {
            return Ok(Verdict::Keep);
        }

        match self.policy {
            ExclusionPolicyKind::ContentSniff => {
                if section.start_page <= self.sniff_page_limit {
                    let end = section
                        .end_page_exclusive
                        .min(section.start_page + self.sniff_max_pages)
                        .max(section.start_page + 1);
                    let text = range_text(source, section.start_page, end)?;
                    if let Some(label) = self.sniff_content(&text) {
                        return Ok(Verdict::Exclude(ExclusionReason::Content(label.to_string())));
                    }
                }
            }
            ExclusionPolicyKind::MainContentWindow => {
                if let Some((first, last)) = window {
                    if index < first || index > last {
                        return Ok(Verdict::Exclude(ExclusionReason::OutsideMainContent));
                    }
                }
            }
        }

        Ok(Verdict::Keep)
    }

    /// First title/path pattern matching the section, if any
    pub fn match_title(&self, section: &Section) -> Option<&str> {
        let haystack = haystack(section);
        self.title_patterns
            .iter()
            .find(|(_, regex)| regex.is_match(&haystack))
            .map(|(pattern, _)| pattern.as_str())
    }

    /// Label of the first front matter signature found in the text sample
    pub fn sniff_content(&self, text: &str) -> Option<&'static str> {
        let sample: String = text
            .chars()
            .take(self.sniff_sample_chars)
            .collect::<String>()
            .to_lowercase();
        self.signatures
            .iter()
            .find(|(_, regex)| regex.is_match(&sample))
            .map(|&(label, _)| label)
    }

    /// Inclusive index range of sections considered main content
    fn main_content_window(&self, sections: &[Section]) -> Option<(usize, usize)> {
        if sections.is_empty() {
            return None;
        }

        let first = sections
            .iter()
            .position(|section| {
                let title = section.title.to_lowercase();
                STRUCTURAL_KEYWORDS.iter().any(|keyword| title.contains(keyword))
                    || section.start_page > self.main_content_page_threshold
            })
            .unwrap_or(0);
        let last = sections
            .iter()
            .rposition(|section| {
                let haystack = haystack(section);
                !self.back_matter.iter().any(|regex| regex.is_match(&haystack))
            })
            .unwrap_or(sections.len() - 1);

        if first > last {
            log::warn!(
                "Main content window is empty (first {} > last {}), not applying it",
                first,
                last
            );
            return None;
        }
        log::info!(
            "Main content window: '{}' .. '{}'",
            sections[first].title,
            sections[last].title
        );
        Some((first, last))
    }
}

/// The title followed by every path segment, one per line
fn haystack(section: &Section) -> String {
    let mut lines = vec![section.title.as_str()];
    lines.extend(section.path.iter().map(String::as_str));
    lines.join("\n").to_lowercase()
}

fn compile(pattern: &str, dot_matches_newline: bool) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .dot_matches_new_line(dot_matches_newline)
        .build()
        .map_err(|e| ChunkerError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e)))
}
