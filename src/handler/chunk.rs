use anyhow::Context;

use crate::document::artifact::{read_rows, write_chunks};
use crate::document::chunk::chunk_rows;
use crate::{Config, COLUMN_WIDTH};

pub fn handle_chunk(config: &Config) -> anyhow::Result<()> {
    let paths = &config.paths;
    let rows = read_rows::<COLUMN_WIDTH>(&paths.rows_csv)
        .with_context(|| format!("Cannot load rows from {}", paths.rows_csv.display()))?;

    let chunks = chunk_rows(&rows, &config.chunk);
    write_chunks(&paths.chunks_csv, &chunks)
        .with_context(|| format!("Cannot write chunks to {}", paths.chunks_csv.display()))?;

    println!("Wrote {} chunks to {}", chunks.len(), paths.chunks_csv.display());
    Ok(())
}
