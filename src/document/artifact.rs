//! CSV artifacts handed between stages: the flat row table and the chunk table.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Chunk, ChunkMeta, NormalizedRow};
use crate::error::PipelineError;

pub const CHUNK_HEADER: [&str; 4] = ["doc_id", "chunk_id", "text", "meta"];

pub fn row_header<const K: usize>() -> Vec<String> {
    let mut header = vec![
        "source_file".to_string(),
        "page".to_string(),
        "row_index".to_string(),
    ];
    header.extend((0..K).map(|i| format!("col_{}", i)));
    header
}

pub fn ensure_parent(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn require_file(path: &Path) -> Result<(), PipelineError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingInput(path.to_path_buf()))
    }
}

pub fn write_rows<const K: usize>(path: &Path, rows: &[NormalizedRow<K>]) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(row_header::<K>())?;
    for row in rows {
        let mut record = Vec::with_capacity(K + 3);
        record.push(row.source_file.clone());
        record.push(row.page.to_string());
        record.push(row.row_index.to_string());
        record.extend(row.columns.iter().cloned());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_rows<const K: usize>(path: &Path) -> Result<Vec<NormalizedRow<K>>, PipelineError> {
    require_file(path)?;
    let mut reader = csv::Reader::from_path(path)?;

    let expected = row_header::<K>();
    let headers = reader.headers()?.clone();
    if headers.iter().ne(expected.iter().map(String::as_str)) {
        return Err(PipelineError::schema(
            path,
            format!("expected header {:?}, found {:?}", expected, headers),
        ));
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let bad = |field: &str| {
            PipelineError::schema(path, format!("record {}: invalid {}", line + 1, field))
        };
        let page = record
            .get(1)
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|&p| p >= 1)
            .ok_or_else(|| bad("page"))?;
        let row_index = record
            .get(2)
            .and_then(|v| v.parse::<usize>().ok())
            .ok_or_else(|| bad("row_index"))?;
        rows.push(NormalizedRow {
            source_file: record.get(0).unwrap_or_default().to_string(),
            page,
            row_index,
            columns: std::array::from_fn(|i| record.get(i + 3).unwrap_or_default().to_string()),
        });
    }
    Ok(rows)
}

#[derive(Debug, Serialize, Deserialize)]
struct ChunkRecord {
    doc_id: String,
    chunk_id: String,
    text: String,
    meta: String,
}

pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<(), PipelineError> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    // Written explicitly so an empty chunk table still carries its header.
    writer.write_record(CHUNK_HEADER)?;
    for chunk in chunks {
        writer.serialize(ChunkRecord {
            doc_id: chunk.doc_id.clone(),
            chunk_id: chunk.chunk_id.clone(),
            text: chunk.text.clone(),
            meta: serde_json::to_string(&chunk.meta)?,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>, PipelineError> {
    require_file(path)?;
    let mut reader = csv::Reader::from_path(path)?;
    if reader.headers()?.iter().ne(CHUNK_HEADER) {
        return Err(PipelineError::schema(path, "unexpected chunk header"));
    }

    let mut chunks = Vec::new();
    for record in reader.deserialize::<ChunkRecord>() {
        let record = record?;
        let meta: ChunkMeta = serde_json::from_str(&record.meta)?;
        chunks.push(Chunk {
            doc_id: record.doc_id,
            chunk_id: record.chunk_id,
            text: record.text,
            meta,
        });
    }
    Ok(chunks)
}
