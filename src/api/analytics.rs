//! Page-range statistics over a finished run

use crate::materialize::Chunk;
use serde::{Deserialize, Serialize};

/// One chunk's page range, as reported in the analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRangeEntry {
    pub chunk_id: String,
    pub title: String,
    pub start_page: u32,
    pub end_page: u32,
    pub size: u32,
}

impl From<&Chunk> for PageRangeEntry {
    fn from(chunk: &Chunk) -> Self {
        Self {
            chunk_id: chunk.chunk_id.clone(),
            title: chunk.title.clone(),
            start_page: chunk.start_page,
            end_page: chunk.end_page,
            size: chunk.page_count,
        }
    }
}

/// Longest and shortest chunks plus the share of single-page chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRangeAnalytics {
    pub total_chunks: usize,
    pub longest: PageRangeEntry,
    pub shortest: PageRangeEntry,
    pub single_page_count: usize,
    pub single_page_percentage: f64,
}

impl PageRangeAnalytics {
    /// `None` for an empty run
    pub fn from_chunks(chunks: &[Chunk]) -> Option<Self> {
        // Ties go to the earliest chunk
        let longest = chunks
            .iter()
            .rev()
            .max_by_key(|chunk| chunk.page_count)?;
        let shortest = chunks.iter().min_by_key(|chunk| chunk.page_count)?;
        let single_page_count = chunks.iter().filter(|chunk| chunk.page_count == 1).count();

        Some(Self {
            total_chunks: chunks.len(),
            longest: longest.into(),
            shortest: shortest.into(),
            single_page_count,
            single_page_percentage: single_page_count as f64 * 100.0 / chunks.len() as f64,
        })
    }

    pub fn log(&self) {
        log::info!(
            "Longest page range: {} pages ({}-{}) '{}'",
            self.longest.size,
            self.longest.start_page,
            self.longest.end_page,
            self.longest.title
        );
        log::info!(
            "Shortest page range: {} pages ({}-{}) '{}'",
            self.shortest.size,
            self.shortest.start_page,
            self.shortest.end_page,
            self.shortest.title
        );
        log::info!(
            "Single-page chunks: {} of {} ({:.2}%)",
            self.single_page_count,
            self.total_chunks,
            self.single_page_percentage
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn chunk(title: &str, start: u32, end: u32) -> Chunk {
        Chunk {
            index: 0,
            chunk_id: format!("b_{}_{}", start, end),
            title: title.to_string(),
            original_titles: vec![title.to_string()],
            path: vec![title.to_string()],
            breadcrumb: title.to_string(),
            depth: 1,
            start_page: start,
            end_page: end,
            text_end_page: end,
            page_count: end - start + 1,
            token_count: 10,
            text: "text".to_string(),
            related_paths: Vec::new(),
            artifact: None,
        }
    }

    #[test]
    fn test_longest_and_shortest() {
        let chunks = vec![
            chunk("A", 1, 1),
            chunk("B", 2, 9),
            chunk("C", 10, 17),
            chunk("D", 18, 18),
        ];
        let analytics = PageRangeAnalytics::from_chunks(&chunks).unwrap();
        assert_eq!(analytics.longest.title, "B");
        assert_eq!(analytics.longest.size, 8);
        assert_eq!(analytics.shortest.title, "A");
        assert_eq!(analytics.single_page_count, 2);
        assert_relative_eq!(analytics.single_page_percentage, 50.0);
    }

    #[test]
    fn test_empty() {
        assert!(PageRangeAnalytics::from_chunks(&[]).is_none());
    }
}
