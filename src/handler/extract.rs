use anyhow::Context;

use crate::document::corpus::CorpusBuilder;
use crate::{Config, COLUMN_WIDTH};

pub async fn handle_extract(config: &Config) -> anyhow::Result<()> {
    let paths = &config.paths;
    println!("Extracting tables from {}", paths.pdf_dir.display());

    let rows = CorpusBuilder::from_config(&config.extract)
        .build_artifact::<COLUMN_WIDTH>(&paths.pdf_dir, &paths.rows_csv)
        .await
        .with_context(|| format!("Extraction stage failed for {}", paths.pdf_dir.display()))?;

    println!("Wrote {} rows to {}", rows, paths.rows_csv.display());
    Ok(())
}
