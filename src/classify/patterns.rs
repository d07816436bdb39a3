//! Pattern library for front and back matter detection

/// Title/path patterns for non-content sections, tested lower-cased with one
/// title per line, so `^` and `$` anchor to a single outline title
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    // Publishing/legal
    r"\b(title|cover|copyright|half-title)\s+page\b",
    r"^(publisher'?s?\s+note|publication\s+data|imprint|colophon|permissions|credits)$",
    // Front matter
    r"\b(preface|foreword|acknowledgment|acknowledgement|dedication)\b",
    r"\babout\s+(the\s+)?(author|editor|contributor)s?\b",
    r"\b(table\s+of\s+)?contents\b",
    r"\blist\s+of\s+(figures?|tables?|illustrations?)\b",
    // Back matter
    r"\b(appendix|appendices|glossary|index)\b",
    r"\b(bibliography|references?|works?\s+cited)\b",
    r"\b(further|recommended)\s+reading\b",
    r"\b(end)?notes?\b$",
    // Marketing/misc
    r"\b(blank|empty)\s+page\b",
    r"^(also|other\s+books)\s+by\b",
    r"^praise\s+for\b|^testimonials?$",
];

/// Patterns marking the end of the main content
pub const BACK_MATTER_PATTERNS: &[&str] = &[
    r"\b(appendix|appendices|glossary|index)\b",
    r"\b(bibliography|references?|works?\s+cited)\b",
    r"\b(further|recommended)\s+reading\b",
    r"\b(end)?notes?\b$",
    r"\babout\s+(the\s+)?(author|editor|contributor)s?\b",
    r"^(colophon|afterword)$",
];

/// Text signatures of front matter pages, with the label reported on a match
pub const CONTENT_SIGNATURES: &[(&str, &str)] = &[
    (r"copyright.*?all rights reserved", "copyright notice"),
    (r"isbn[-\s]?(1[03])?:?\s?\d", "ISBN/publication info"),
    (r"library of congress|cataloging[- ]in[- ]publication", "cataloging data"),
    (r"published by|publisher|printing.*?edition", "publisher info"),
    (r"about the authors?.*?university", "about authors"),
    (r"dedicat(ed|ion).*?to\s+\w+\s+and", "dedication"),
    (r"preface.*?welcome to", "preface content"),
    (r"table of contents.*?chapter", "table of contents"),
];

/// Title keywords that mark the start of the main content
pub const STRUCTURAL_KEYWORDS: &[&str] = &["chapter", "part", "section", "introduction"];
