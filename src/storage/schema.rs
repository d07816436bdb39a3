//! Database schema definitions

/// Database schema version
pub const SCHEMA_VERSION: u32 = 1;

/// SQL for creating the books table
pub const CREATE_BOOKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS books (
    book_id TEXT PRIMARY KEY,
    source_file TEXT,
    total_pages INTEGER NOT NULL,
    chunk_count INTEGER NOT NULL,
    processed_at TEXT NOT NULL,
    summary TEXT NOT NULL
);
"#;

/// SQL for creating the chunks table
pub const CREATE_CHUNKS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS chunks (
    chunk_id TEXT PRIMARY KEY,
    book_id TEXT NOT NULL REFERENCES books(book_id),
    chunk_index INTEGER NOT NULL,
    title TEXT NOT NULL,
    original_titles TEXT NOT NULL,
    path TEXT NOT NULL,
    breadcrumb TEXT NOT NULL,
    depth INTEGER NOT NULL,
    start_page INTEGER NOT NULL,
    end_page INTEGER NOT NULL,
    text_end_page INTEGER NOT NULL,
    page_count INTEGER NOT NULL,
    token_count INTEGER NOT NULL,
    text TEXT NOT NULL,
    related_paths TEXT NOT NULL,
    artifact_name TEXT,
    artifact_location TEXT
);
"#;

/// SQL for creating the metadata table
pub const CREATE_METADATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// SQL for creating indexes on the chunks table
pub const CREATE_CHUNKS_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_chunks_book ON chunks(book_id, chunk_index);
CREATE INDEX IF NOT EXISTS idx_chunks_pages ON chunks(book_id, start_page);
"#;

/// Column list shared by every chunk query
pub const CHUNK_COLUMNS: &str = "chunk_index, chunk_id, title, original_titles, path, breadcrumb, \
     depth, start_page, end_page, text_end_page, page_count, token_count, text, related_paths, \
     artifact_name, artifact_location";
