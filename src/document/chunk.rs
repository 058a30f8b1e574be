use std::collections::BTreeMap;

use log::info;
use sha2::{Digest, Sha256};

use super::{Chunk, ChunkMeta, NormalizedRow};
use crate::ChunkConfig;

/// First `len` hex digits of the SHA-256 of the file name.
pub fn doc_id(source_file: &str, len: usize) -> String {
    let digest = format!("{:x}", Sha256::digest(source_file.as_bytes()));
    digest[..len.min(digest.len())].to_string()
}

pub fn chunk_id(doc_id: &str, page: u32, chunk_index: usize) -> String {
    format!("{}:{}:{}", doc_id, page, chunk_index)
}

/// Splits `content` into consecutive slices of at most `chunk_size` characters.
pub fn chunk_document(content: &str, chunk_size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (pos, _) in content.char_indices() {
        if count == chunk_size {
            chunks.push(&content[start..pos]);
            start = pos;
            count = 0;
        }
        count += 1;
    }
    if start < content.len() {
        chunks.push(&content[start..]);
    }
    chunks
}

/// Page text per (source_file, page): each row's line, in row order,
/// joined by newlines and trimmed.
pub fn page_texts<const K: usize>(rows: &[NormalizedRow<K>]) -> BTreeMap<(&str, u32), String> {
    let mut groups: BTreeMap<(&str, u32), Vec<&NormalizedRow<K>>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.source_file.as_str(), row.page))
            .or_default()
            .push(row);
    }

    groups
        .into_iter()
        .map(|(key, mut group)| {
            group.sort_by_key(|row| row.row_index);
            let lines: Vec<String> = group.iter().map(|row| row.line()).collect();
            (key, lines.join("\n").trim().to_string())
        })
        .collect()
}

pub fn chunk_rows<const K: usize>(rows: &[NormalizedRow<K>], config: &ChunkConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut pages = 0;

    for ((source_file, page), text) in page_texts(rows) {
        if text.is_empty() {
            continue;
        }
        pages += 1;
        let doc = doc_id(source_file, config.doc_id_len);
        for (chunk_index, piece) in chunk_document(&text, config.max_len).into_iter().enumerate() {
            chunks.push(Chunk {
                doc_id: doc.clone(),
                chunk_id: chunk_id(&doc, page, chunk_index),
                text: piece.to_string(),
                meta: ChunkMeta {
                    source_file: source_file.to_string(),
                    page,
                    chunk_index,
                },
            });
        }
    }

    info!("Built {} chunks from {} non-empty pages", chunks.len(), pages);
    chunks
}
