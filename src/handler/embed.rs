use anyhow::Context;

use crate::embedding::embed_chunks;
use crate::embedding::http::HttpEmbedder;
use crate::Config;

pub async fn handle_embed(config: &Config) -> anyhow::Result<()> {
    let paths = &config.paths;
    let embedder = HttpEmbedder::from_config(&config.embedding);

    let count = embed_chunks(
        &embedder,
        &paths.chunks_csv,
        &paths.embeddings_jsonl,
        config.embedding.batch,
        config.embedding.normalize,
    )
    .await
    .with_context(|| format!("Embedding stage failed for {}", paths.chunks_csv.display()))?;

    println!("Embedded {} chunks into {}", count, paths.embeddings_jsonl.display());
    Ok(())
}
