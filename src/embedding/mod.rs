//! Hand-off of the chunk table to an embedding service.

pub mod http;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

use crate::document::artifact::{ensure_parent, read_chunks};
use crate::document::ChunkMeta;
use crate::error::PipelineError;

/// Black-box text embedding: one vector per input text, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, PipelineError>;
}

/// One line of the embeddings artifact, keyed by `chunk_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub doc_id: String,
    pub chunk_id: String,
    pub embedding: Vec<f32>,
    pub meta: ChunkMeta,
}

pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Embeds every chunk of the chunk artifact in `text` order and writes one
/// JSON line per chunk. Returns the number of chunks embedded.
pub async fn embed_chunks(
    embedder: &dyn Embedder,
    chunks_csv: &Path,
    out: &Path,
    batch: usize,
    normalize: bool,
) -> Result<usize, PipelineError> {
    let chunks = read_chunks(chunks_csv)?;

    ensure_parent(out)?;
    let mut writer = BufWriter::new(File::create(out)?);
    if chunks.is_empty() {
        info!("No chunks to embed.");
        return Ok(0);
    }

    for (n, group) in chunks.chunks(batch.max(1)).enumerate() {
        let texts: Vec<&str> = group.iter().map(|c| c.text.as_str()).collect();
        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(PipelineError::Embedding(format!(
                "batch {} returned {} vectors for {} texts",
                n,
                vectors.len(),
                texts.len()
            )));
        }

        for (chunk, mut embedding) in group.iter().zip(vectors) {
            if normalize {
                l2_normalize(&mut embedding);
            }
            let record = EmbeddingRecord {
                doc_id: chunk.doc_id.clone(),
                chunk_id: chunk.chunk_id.clone(),
                embedding,
                meta: chunk.meta.clone(),
            };
            serde_json::to_writer(&mut writer, &record)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;

    info!("Embedded {} chunks into {}", chunks.len(), out.display());
    Ok(chunks.len())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::document::artifact::write_chunks;
    use crate::document::Chunk;

    /// Embeds each text as `[len, 0]` and remembers batch sizes.
    #[derive(Default)]
    struct LengthEmbedder {
        batches: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, PipelineError> {
            self.batches.lock().unwrap().push(texts.len());
            Ok(texts.iter().map(|t| vec![t.len() as f32, 0.0]).collect())
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        async fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, PipelineError> {
            Ok(vec![vec![1.0]])
        }
    }

    fn chunk(i: usize, text: &str) -> Chunk {
        Chunk {
            doc_id: "d".into(),
            chunk_id: format!("d:1:{}", i),
            text: text.into(),
            meta: ChunkMeta {
                source_file: "a.pdf".into(),
                page: 1,
                chunk_index: i,
            },
        }
    }

    fn read_records(path: &Path) -> anyhow::Result<Vec<EmbeddingRecord>> {
        let text = std::fs::read_to_string(path)?;
        Ok(text
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<Vec<_>, _>>()?)
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.6, 0.8]);
        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_embeds_in_batches_and_keys_by_chunk_id() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let chunks_csv = dir.path().join("chunks.csv");
        let out = dir.path().join("out").join("embeddings.jsonl");
        write_chunks(&chunks_csv, &[chunk(0, "ab"), chunk(1, "abcd"), chunk(2, "a")])?;

        let embedder = LengthEmbedder::default();
        let count = embed_chunks(&embedder, &chunks_csv, &out, 2, false).await?;
        assert_eq!(count, 3);
        assert_eq!(*embedder.batches.lock().unwrap(), vec![2, 1]);

        let records = read_records(&out)?;
        let ids: Vec<&str> = records.iter().map(|r| r.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["d:1:0", "d:1:1", "d:1:2"]);
        assert_eq!(records[1].embedding, vec![4.0, 0.0]);
        assert_eq!(records[2].meta.chunk_index, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_normalizes_vectors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let chunks_csv = dir.path().join("chunks.csv");
        let out = dir.path().join("embeddings.jsonl");
        write_chunks(&chunks_csv, &[chunk(0, "abc")])?;

        embed_chunks(&LengthEmbedder::default(), &chunks_csv, &out, 8, true).await?;
        assert_eq!(read_records(&out)?[0].embedding, vec![1.0, 0.0]);
        Ok(())
    }

    #[tokio::test]
    async fn test_vector_count_mismatch_fails() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let chunks_csv = dir.path().join("chunks.csv");
        write_chunks(&chunks_csv, &[chunk(0, "a"), chunk(1, "b")])?;

        let result = embed_chunks(&ShortEmbedder, &chunks_csv, &dir.path().join("e.jsonl"), 8, true).await;
        assert!(matches!(result, Err(PipelineError::Embedding(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_chunk_table_clears_previous_embeddings() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let chunks_csv = dir.path().join("chunks.csv");
        let out = dir.path().join("e.jsonl");
        write_chunks(&chunks_csv, &[chunk(0, "old")])?;
        embed_chunks(&LengthEmbedder::default(), &chunks_csv, &out, 8, false).await?;
        assert_eq!(read_records(&out)?.len(), 1);

        write_chunks(&chunks_csv, &[])?;
        assert_eq!(embed_chunks(&ShortEmbedder, &chunks_csv, &out, 8, true).await?, 0);
        assert!(read_records(&out)?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_chunk_table() {
        let result = embed_chunks(
            &ShortEmbedder,
            Path::new("/no/such/chunks.csv"),
            Path::new("/tmp/unused.jsonl"),
            8,
            true,
        )
        .await;
        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    }
}
