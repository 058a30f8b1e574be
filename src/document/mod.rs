pub mod artifact;
pub mod chunk;
pub mod corpus;
pub mod layout;
pub mod normalize;
pub mod pdf;
pub mod ruling;
pub mod strategy;

use serde::{Deserialize, Serialize};

/// One cell as detected; `None` when the detector saw no value.
pub type RawCell = Option<String>;

pub type RawRow = Vec<RawCell>;

/// A tabular region detected on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTable {
    /// 1-based page number.
    pub page: u32,
    pub rows: Vec<RawRow>,
}

impl PageTable {
    pub fn new(page: u32, rows: Vec<RawRow>) -> Self {
        Self { page, rows }
    }

    /// Drops rows whose cells are all missing or whitespace.
    pub fn without_blank_rows(mut self) -> Self {
        self.rows.retain(|row| {
            row.iter()
                .any(|cell| cell.as_deref().is_some_and(|v| !v.trim().is_empty()))
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Filled cells in the widest row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|cell| cell.as_deref().is_some_and(|v| !v.trim().is_empty()))
                    .count()
            })
            .max()
            .unwrap_or(0)
    }
}

/// One table row forced into the canonical `K`-column shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow<const K: usize> {
    pub source_file: String,
    pub page: u32,
    pub row_index: usize,
    pub columns: [String; K],
}

impl<const K: usize> NormalizedRow<K> {
    /// The row as a single line of text: columns joined by one space, trimmed.
    pub fn line(&self) -> String {
        self.columns.join(" ").trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub source_file: String,
    pub page: u32,
    pub chunk_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_id: String,
    pub text: String,
    pub meta: ChunkMeta,
}
