//! SQLite chunk index for book-chunker
//!
//! This module keeps finished chunks and per-book run summaries in embedded
//! SQLite so they can be listed and looked up after a run.

use crate::api::ChunkingSummary;
use crate::error::{ChunkerError, Result};
use crate::materialize::{ArtifactRef, Chunk};
use crate::storage::schema::*;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

/// A book as recorded in the index
#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    pub book_id: String,
    pub source_file: Option<String>,
    pub total_pages: u32,
    pub chunk_count: usize,
    pub processed_at: String,
    pub summary: ChunkingSummary,
}

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) a database file
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| ChunkerError::Storage(format!("Failed to open database: {}", e)))?;

        let mut db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            ChunkerError::Storage(format!("Failed to create in-memory database: {}", e))
        })?;

        let mut db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize database schema
    fn initialize(&mut self) -> Result<()> {
        // WAL for concurrent readers; in-memory databases report "memory"
        let _: String = self
            .conn
            .query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))
            .map_err(|e| ChunkerError::Storage(format!("Failed to enable WAL mode: {}", e)))?;

        self.conn
            .execute_batch(CREATE_BOOKS_TABLE)
            .map_err(|e| ChunkerError::Storage(format!("Failed to create books table: {}", e)))?;

        self.conn
            .execute_batch(CREATE_CHUNKS_TABLE)
            .map_err(|e| ChunkerError::Storage(format!("Failed to create chunks table: {}", e)))?;

        self.conn.execute_batch(CREATE_METADATA_TABLE).map_err(|e| {
            ChunkerError::Storage(format!("Failed to create metadata table: {}", e))
        })?;

        self.conn
            .execute_batch(CREATE_CHUNKS_INDEXES)
            .map_err(|e| ChunkerError::Storage(format!("Failed to create indexes: {}", e)))?;

        self.conn
            .execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?)",
                params![SCHEMA_VERSION.to_string()],
            )
            .map_err(|e| ChunkerError::Storage(format!("Failed to set schema version: {}", e)))?;

        log::debug!("Database initialized with schema version {}", SCHEMA_VERSION);
        Ok(())
    }

    /// Stored schema version
    pub fn schema_version(&self) -> Result<u32> {
        let value: String = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'schema_version'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| ChunkerError::Storage(format!("Failed to read schema version: {}", e)))?;

        value
            .parse()
            .map_err(|e| ChunkerError::Storage(format!("Invalid schema version '{}': {}", value, e)))
    }

    /// Replace everything stored for a book in one transaction
    pub fn replace_book(&mut self, record: &BookRecord, chunks: &[Chunk]) -> Result<()> {
        let summary = serde_json::to_string(&record.summary)?;

        let tx = self
            .conn
            .transaction()
            .map_err(|e| ChunkerError::Storage(format!("Failed to start transaction: {}", e)))?;

        tx.execute("DELETE FROM chunks WHERE book_id = ?", params![record.book_id])
            .map_err(|e| ChunkerError::Storage(format!("Failed to clear old chunks: {}", e)))?;

        tx.execute(
            r#"
            INSERT OR REPLACE INTO books (book_id, source_file, total_pages, chunk_count, processed_at, summary)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.book_id,
                record.source_file,
                record.total_pages as i64,
                record.chunk_count as i64,
                record.processed_at,
                summary,
            ],
        )
        .map_err(|e| ChunkerError::Storage(format!("Failed to record book: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO chunks (book_id, {}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                    CHUNK_COLUMNS
                ))
                .map_err(|e| ChunkerError::Storage(format!("Failed to prepare statement: {}", e)))?;

            for chunk in chunks {
                stmt.execute(params![
                    record.book_id,
                    chunk.index as i64,
                    chunk.chunk_id,
                    chunk.title,
                    serde_json::to_string(&chunk.original_titles)?,
                    serde_json::to_string(&chunk.path)?,
                    chunk.breadcrumb,
                    chunk.depth as i64,
                    chunk.start_page as i64,
                    chunk.end_page as i64,
                    chunk.text_end_page as i64,
                    chunk.page_count as i64,
                    chunk.token_count as i64,
                    chunk.text,
                    serde_json::to_string(&chunk.related_paths)?,
                    chunk.artifact.as_ref().map(|a| a.name.clone()),
                    chunk.artifact.as_ref().map(|a| a.location.clone()),
                ])
                .map_err(|e| {
                    ChunkerError::Storage(format!("Failed to insert chunk {}: {}", chunk.chunk_id, e))
                })?;
            }
        }

        tx.commit()
            .map_err(|e| ChunkerError::Storage(format!("Failed to commit transaction: {}", e)))?;

        log::info!(
            "Indexed {} chunks for book '{}'",
            chunks.len(),
            record.book_id
        );
        Ok(())
    }

    /// Chunks of a book in chunk order
    pub fn get_chunks_for_book(&self, book_id: &str) -> Result<Vec<Chunk>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM chunks WHERE book_id = ? ORDER BY chunk_index",
                CHUNK_COLUMNS
            ))
            .map_err(|e| ChunkerError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![book_id], row_to_chunk)
            .map_err(|e| ChunkerError::Storage(format!("Failed to query chunks: {}", e)))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(
                row.map_err(|e| ChunkerError::Storage(format!("Failed to process chunk row: {}", e)))?,
            );
        }
        Ok(result)
    }

    /// Get chunk by its identifier
    pub fn get_chunk_by_id(&self, chunk_id: &str) -> Result<Option<Chunk>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM chunks WHERE chunk_id = ?", CHUNK_COLUMNS))
            .map_err(|e| ChunkerError::Storage(format!("Failed to prepare query: {}", e)))?;

        let chunk = stmt
            .query_row(params![chunk_id], row_to_chunk)
            .optional()
            .map_err(|e| ChunkerError::Storage(format!("Failed to query chunk: {}", e)))?;

        Ok(chunk)
    }

    /// Look up a book record
    pub fn get_book(&self, book_id: &str) -> Result<Option<BookRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT book_id, source_file, total_pages, chunk_count, processed_at, summary FROM books WHERE book_id = ?",
                params![book_id],
                raw_book,
            )
            .optional()
            .map_err(|e| ChunkerError::Storage(format!("Failed to query book: {}", e)))?;

        row.map(into_book_record).transpose()
    }

    /// All indexed books, ordered by id
    pub fn list_books(&self) -> Result<Vec<BookRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT book_id, source_file, total_pages, chunk_count, processed_at, summary FROM books ORDER BY book_id",
            )
            .map_err(|e| ChunkerError::Storage(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], raw_book)
            .map_err(|e| ChunkerError::Storage(format!("Failed to list books: {}", e)))?;

        let mut books = Vec::new();
        for row in rows {
            let raw =
                row.map_err(|e| ChunkerError::Storage(format!("Failed to process book row: {}", e)))?;
            books.push(into_book_record(raw)?);
        }
        Ok(books)
    }

    /// Get total chunk count
    pub fn get_chunk_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| ChunkerError::Storage(format!("Failed to count chunks: {}", e)))?;

        Ok(count as usize)
    }

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let chunk_count = self.get_chunk_count()?;

        let book_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))
            .map_err(|e| ChunkerError::Storage(format!("Failed to count books: {}", e)))?;

        let file_size: i64 = self
            .conn
            .query_row(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get(0),
            )
            .map_err(|e| ChunkerError::Storage(format!("Failed to get database size: {}", e)))?;

        Ok(DatabaseStats {
            book_count: book_count as usize,
            chunk_count,
            file_size_bytes: file_size as usize,
        })
    }
}

type RawBook = (String, Option<String>, i64, i64, String, String);

fn raw_book(row: &Row) -> rusqlite::Result<RawBook> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn into_book_record(raw: RawBook) -> Result<BookRecord> {
    let (book_id, source_file, total_pages, chunk_count, processed_at, summary) = raw;
    Ok(BookRecord {
        book_id,
        source_file,
        total_pages: total_pages as u32,
        chunk_count: chunk_count as usize,
        processed_at,
        summary: serde_json::from_str(&summary)?,
    })
}

fn json_column<T: serde::de::DeserializeOwned>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Convert a database row to a Chunk
fn row_to_chunk(row: &Row) -> rusqlite::Result<Chunk> {
    let artifact_name: Option<String> = row.get(14)?;
    let artifact_location: Option<String> = row.get(15)?;

    Ok(Chunk {
        index: row.get::<_, i64>(0)? as usize,
        chunk_id: row.get(1)?,
        title: row.get(2)?,
        original_titles: json_column(row, 3)?,
        path: json_column(row, 4)?,
        breadcrumb: row.get(5)?,
        depth: row.get::<_, i64>(6)? as u32,
        start_page: row.get::<_, i64>(7)? as u32,
        end_page: row.get::<_, i64>(8)? as u32,
        text_end_page: row.get::<_, i64>(9)? as u32,
        page_count: row.get::<_, i64>(10)? as u32,
        token_count: row.get::<_, i64>(11)? as usize,
        text: row.get(12)?,
        related_paths: json_column(row, 13)?,
        artifact: artifact_name
            .zip(artifact_location)
            .map(|(name, location)| ArtifactRef { name, location }),
    })
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub book_count: usize,
    pub chunk_count: usize,
    pub file_size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(book_id: &str, chunks: usize) -> ChunkingSummary {
        ChunkingSummary {
            book_id: book_id.to_string(),
            total_pages: 10,
            original_outline_entry_count: 3,
            excluded_section_count: 1,
            empty_chunk_count: 0,
            failed_chunk_count: 0,
            final_chunk_count: chunks,
            average_pages_per_chunk: 5.0,
            average_tokens_per_chunk: 120.0,
            merge_policy: "growing-run".to_string(),
            exclusion_policy: "content-sniff".to_string(),
            token_counter: "approximate".to_string(),
        }
    }

    fn chunk(book_id: &str, index: usize, start: u32, end: u32) -> Chunk {
        Chunk {
            index,
            chunk_id: format!("{}_{}_{}", book_id, start, end),
            title: format!("Section {}", index),
            original_titles: vec![format!("Section {}", index)],
            path: vec!["Part".to_string(), format!("Section {}", index)],
            breadcrumb: format!("Part > Section {}", index),
            depth: 2,
            start_page: start,
            end_page: end,
            text_end_page: end + 1,
            page_count: end - start + 1,
            token_count: 120,
            text: "some text".to_string(),
            related_paths: vec!["Part > Other".to_string()],
            artifact: Some(ArtifactRef {
                name: format!("{}_{}_{}.pdf", book_id, start, end),
                location: format!("/out/{}_{}_{}.pdf", book_id, start, end),
            }),
        }
    }

    fn record(book_id: &str, chunks: usize) -> BookRecord {
        BookRecord {
            book_id: book_id.to_string(),
            source_file: Some(format!("{}.pdf", book_id)),
            total_pages: 10,
            chunk_count: chunks,
            processed_at: "2024-01-01T00:00:00+00:00".to_string(),
            summary: summary(book_id, chunks),
        }
    }

    #[test]
    fn test_roundtrip_chunks() {
        let mut db = Database::memory().unwrap();
        let chunks = vec![chunk("b", 0, 1, 5), chunk("b", 1, 6, 10)];
        db.replace_book(&record("b", 2), &chunks).unwrap();

        assert_eq!(db.get_chunks_for_book("b").unwrap(), chunks);
        assert_eq!(db.get_chunk_by_id("b_6_10").unwrap(), Some(chunks[1].clone()));
        assert!(db.get_chunk_by_id("missing").unwrap().is_none());
        assert_eq!(db.get_book("b").unwrap(), Some(record("b", 2)));
        assert_eq!(db.schema_version().unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_reindex_replaces_rows() {
        let mut db = Database::memory().unwrap();
        db.replace_book(&record("b", 2), &[chunk("b", 0, 1, 5), chunk("b", 1, 6, 10)])
            .unwrap();
        db.replace_book(&record("other", 1), &[chunk("other", 0, 1, 3)])
            .unwrap();
        db.replace_book(&record("b", 1), &[chunk("b", 0, 1, 10)]).unwrap();

        assert_eq!(db.get_chunks_for_book("b").unwrap().len(), 1);
        assert_eq!(db.get_chunk_count().unwrap(), 2);

        let stats = db.get_stats().unwrap();
        assert_eq!(stats.book_count, 2);
        assert_eq!(stats.chunk_count, 2);

        let books: Vec<String> = db.list_books().unwrap().into_iter().map(|b| b.book_id).collect();
        assert_eq!(books, vec!["b", "other"]);
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.db");
        {
            let mut db = Database::new(&path).unwrap();
            db.replace_book(&record("b", 1), &[chunk("b", 0, 1, 10)]).unwrap();
        }
        let db = Database::new(&path).unwrap();
        assert_eq!(db.get_chunk_count().unwrap(), 1);
    }
}
