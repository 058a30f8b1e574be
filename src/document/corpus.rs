use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use tokio::task::JoinSet;
use walkdir::WalkDir;

use super::artifact::write_rows;
use super::normalize::{normalize, overflow};
use super::strategy::Extractor;
use super::{NormalizedRow, PageTable};
use crate::error::PipelineError;
use crate::ExtractConfig;

/// PDF files under `dir`, sorted by path.
pub fn list_pdfs(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.is_dir() {
        return Err(PipelineError::MissingInput(dir.to_path_buf()));
    }
    let walker = if recursive {
        WalkDir::new(dir)
    } else {
        WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.file_name().to_string_lossy().to_lowercase().ends_with(".pdf"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    Ok(files)
}

/// `source_file` for a path: its location relative to the corpus directory.
pub fn source_name(dir: &Path, path: &Path) -> String {
    path.strip_prefix(dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Normalizes one file's tables. `row_index` counts rows per page across
/// every table found on that page, in discovery order.
pub fn rows_from_tables<const K: usize>(source_file: &str, tables: &[PageTable]) -> Vec<NormalizedRow<K>> {
    let mut next_index: HashMap<u32, usize> = HashMap::new();
    let mut rows = Vec::new();

    for table in tables {
        let dropped: usize = table.rows.iter().map(|raw| overflow::<K>(raw)).sum();
        if dropped > 0 {
            warn!(
                "{} page {}: table wider than {} columns, {} cell(s) dropped",
                source_file, table.page, K, dropped
            );
        }

        let index = next_index.entry(table.page).or_insert(0);
        for raw in &table.rows {
            rows.push(NormalizedRow {
                source_file: source_file.to_string(),
                page: table.page,
                row_index: *index,
                columns: normalize::<K>(raw),
            });
            *index += 1;
        }
    }
    rows
}

pub struct CorpusBuilder {
    extractor: Arc<Extractor>,
    recursive: bool,
    timeout: Duration,
    workers: usize,
}

impl CorpusBuilder {
    pub fn new(extractor: Extractor, config: &ExtractConfig) -> Self {
        Self {
            extractor: Arc::new(extractor),
            recursive: config.recursive,
            timeout: Duration::from_secs(config.file_timeout_secs),
            workers: config.workers.max(1),
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(Extractor::from_config(config), config)
    }

    /// Extracts and normalizes every PDF in `dir`. A file that fails, panics
    /// or times out contributes no rows; the rest of the corpus still builds.
    pub async fn build<const K: usize>(&self, dir: &Path) -> Result<Vec<NormalizedRow<K>>, PipelineError> {
        let files = list_pdfs(dir, self.recursive)?;
        info!("Found {} PDF file(s) in {}", files.len(), dir.display());

        let mut results: Vec<Vec<NormalizedRow<K>>> = vec![Vec::new(); files.len()];
        let mut pending = files.iter().enumerate();
        let mut running = JoinSet::new();

        loop {
            while running.len() < self.workers {
                let Some((slot, path)) = pending.next() else {
                    break;
                };
                let source_file = source_name(dir, path);
                let task = self.extract_file::<K>(path.clone(), source_file);
                running.spawn(async move { (slot, task.await) });
            }
            let Some(joined) = running.join_next().await else {
                break;
            };
            match joined {
                Ok((slot, rows)) => results[slot] = rows,
                Err(e) => warn!("Extraction task aborted: {}", e),
            }
        }

        let rows: Vec<NormalizedRow<K>> = results.into_iter().flatten().collect();
        info!("Extracted {} row(s) from {} file(s)", rows.len(), files.len());
        Ok(rows)
    }

    /// Builds the corpus and writes it as the row artifact.
    pub async fn build_artifact<const K: usize>(&self, dir: &Path, out: &Path) -> Result<usize, PipelineError> {
        let rows = self.build::<K>(dir).await?;
        write_rows(out, &rows)?;
        info!("Wrote {} rows to {}", rows.len(), out.display());
        Ok(rows.len())
    }

    fn extract_file<const K: usize>(
        &self,
        path: PathBuf,
        source_file: String,
    ) -> impl std::future::Future<Output = Vec<NormalizedRow<K>>> + Send + 'static {
        let extractor = Arc::clone(&self.extractor);
        let timeout = self.timeout;
        async move {
            info!("Parsing {}", source_file);
            let blocking = tokio::task::spawn_blocking(move || extractor.extract(&path));
            match tokio::time::timeout(timeout, blocking).await {
                Ok(Ok(tables)) => rows_from_tables::<K>(&source_file, &tables),
                Ok(Err(e)) => {
                    warn!("Extraction of {} panicked: {}", source_file, e);
                    Vec::new()
                }
                Err(_) => {
                    warn!("Extraction of {} timed out after {:?}", source_file, timeout);
                    Vec::new()
                }
            }
        }
    }
}
