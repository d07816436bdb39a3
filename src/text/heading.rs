//! Heading location within page text
//!
//! Finds where an outline title is printed on its page so that text above the
//! heading can be told apart from the section body.

use crate::error::Result;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// How a heading was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Case-insensitive substring
    Exact,
    /// After collapsing whitespace and compatibility-normalizing
    Normalized,
    /// By the dotted section number in the title, at the start of a line
    Numbered,
}

/// Byte span of a located heading in the original page text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingMatch {
    pub offset: usize,
    pub end: usize,
    pub method: MatchMethod,
}

/// Locates outline titles on page text
#[derive(Debug, Clone)]
pub struct HeadingLocator {
    section_number: Regex,
}

impl HeadingLocator {
    pub fn new() -> Result<Self> {
        let section_number = Regex::new(r"\b(\d+(?:\.\d+)+)\b")?;
        Ok(Self { section_number })
    }

    /// Find `title` on `page_text`, trying progressively looser matches
    pub fn locate(&self, page_text: &str, title: &str) -> Option<HeadingMatch> {
        self.find_folded(page_text, title, false, MatchMethod::Exact)
            .or_else(|| self.find_folded(page_text, title, true, MatchMethod::Normalized))
            .or_else(|| self.find_numbered(page_text, title))
    }

    fn find_folded(
        &self,
        page_text: &str,
        title: &str,
        normalize: bool,
        method: MatchMethod,
    ) -> Option<HeadingMatch> {
        let (needle, _) = fold(title.trim(), normalize);
        let needle = needle.trim();
        if needle.is_empty() {
            return None;
        }

        let (haystack, origin) = fold(page_text, normalize);
        let found = haystack.find(needle)?;
        let folded_end = found + needle.len();

        Some(HeadingMatch {
            offset: origin[found],
            end: origin.get(folded_end).copied().unwrap_or(page_text.len()),
            method,
        })
    }

    fn find_numbered(&self, page_text: &str, title: &str) -> Option<HeadingMatch> {
        let number = self.section_number.captures(title)?.get(1)?.as_str();

        let mut line_start = 0;
        for line in page_text.split_inclusive('\n') {
            let body = line.trim_end_matches(['\n', '\r']);
            let rest = body.trim_start_matches([' ', '\t']);
            if let Some(after) = rest.strip_prefix(number) {
                if after.is_empty() || after.starts_with([' ', '\t']) {
                    let offset = line_start + body.len() - rest.len();
                    return Some(HeadingMatch {
                        offset,
                        end: offset + number.len(),
                        method: MatchMethod::Numbered,
                    });
                }
            }
            line_start += line.len();
        }
        None
    }
}

/// Lower-case `text`, optionally collapsing whitespace and applying NFKC, and
/// record for every output byte the byte offset of its source character
fn fold(text: &str, normalize: bool) -> (String, Vec<usize>) {
    let mut folded = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len());
    let mut in_space = false;

    for (idx, ch) in text.char_indices() {
        if normalize && ch.is_whitespace() {
            if !in_space && !folded.is_empty() {
                folded.push(' ');
                origin.push(idx);
            }
            in_space = true;
            continue;
        }
        in_space = false;

        let expanded: String = if normalize {
            std::iter::once(ch).nfkc().collect()
        } else {
            ch.to_string()
        };
        for lower in expanded.chars().flat_map(char::to_lowercase) {
            let before = folded.len();
            folded.push(lower);
            origin.resize(origin.len() + folded.len() - before, idx);
        }
    }

    (folded, origin)
}
