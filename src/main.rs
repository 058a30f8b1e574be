use std::future::Future;
use std::path::{Path, PathBuf};

use clap::Parser;
use dotenv::dotenv;
use handler::Cli;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::error::PipelineError;

mod document;
mod embedding;
mod error;
mod handler;

/// Row width the binary is compiled for.
pub const COLUMN_WIDTH: usize = 10;

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();
    let args = Cli::parse();
    let config = read_config(&args.config)?;
    block_on(handler::handler(args, config))?
}

/// Runs `future` on a fresh runtime and shuts it down without joining
/// blocking threads, so an extraction abandoned after its timeout cannot keep
/// the process alive.
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub extract: ExtractConfig,
    pub chunk: ChunkConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub pdf_dir: PathBuf,
    pub rows_csv: PathBuf,
    pub chunks_csv: PathBuf,
    pub embeddings_jsonl: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pdf_dir: PathBuf::from("pdf_data"),
            rows_csv: PathBuf::from("pdf_data/parsed/parsed.csv"),
            chunks_csv: PathBuf::from("pdf_data/parsed/chunks.csv"),
            embeddings_jsonl: PathBuf::from("pdf_data/parsed/embeddings.jsonl"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ExtractConfig {
    pub column_width: usize,
    pub recursive: bool,
    pub file_timeout_secs: u64,
    pub workers: usize,
    pub layout: LayoutConfig,
    pub ruling: RulingConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            column_width: COLUMN_WIDTH,
            recursive: false,
            file_timeout_secs: 120,
            workers: 1,
            layout: LayoutConfig::default(),
            ruling: RulingConfig::default(),
        }
    }
}

/// Text-alignment table detection. Tables with fewer non-blank rows, or whose
/// widest row has fewer filled cells, are discarded.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    pub min_rows: usize,
    pub min_columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
        }
    }
}

/// Ruling-line table detection. `strict` ignores rectangle edges and builds
/// grids from stroked lines only.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RulingConfig {
    pub strict: bool,
    pub min_rows: usize,
    pub min_columns: usize,
}

impl Default for RulingConfig {
    fn default() -> Self {
        Self {
            strict: false,
            min_rows: 1,
            min_columns: 1,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ChunkConfig {
    pub max_len: usize,
    pub doc_id_len: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_len: 1000,
            doc_id_len: 16,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub url: String,
    pub model: String,
    pub api_key: String,
    pub batch: usize,
    pub normalize: bool,
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openai.com/v1/embeddings".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: String::new(),
            batch: 32,
            normalize: true,
            dimensions: None,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.extract.column_width != COLUMN_WIDTH {
            return Err(PipelineError::Config(format!(
                "column_width {} is not supported by this build (compiled for {})",
                self.extract.column_width, COLUMN_WIDTH
            )));
        }
        if self.extract.workers == 0 {
            return Err(PipelineError::Config("extract.workers must be at least 1".into()));
        }
        if self.chunk.max_len == 0 {
            return Err(PipelineError::Config("chunk.max_len must be at least 1".into()));
        }
        if !(1..=64).contains(&self.chunk.doc_id_len) {
            return Err(PipelineError::Config("chunk.doc_id_len must be within 1..=64".into()));
        }
        if self.embedding.batch == 0 {
            return Err(PipelineError::Config("embedding.batch must be at least 1".into()));
        }
        Ok(())
    }
}

fn read_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(&path.to_string_lossy()).required(false))
        .add_source(
            config::Environment::with_prefix("TABCHUNK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.extract.column_width, 10);
        assert_eq!(config.chunk.max_len, 1000);
    }

    #[test]
    fn test_read_config_file() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("tabchunk.toml");
        std::fs::write(
            &path,
            "[paths]\npdf_dir = \"/data/pdfs\"\n\n[chunk]\nmax_len = 250\n",
        )?;
        let config = read_config(&path)?;
        assert_eq!(config.paths.pdf_dir, PathBuf::from("/data/pdfs"));
        assert_eq!(config.chunk.max_len, 250);
        assert_eq!(config.chunk.doc_id_len, 16);
        assert_eq!(config.extract.layout.min_rows, 2);
        Ok(())
    }

    #[test]
    fn test_missing_config_file_uses_defaults() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let config = read_config(&dir.path().join("absent.toml"))?;
        assert_eq!(config.paths.rows_csv, PathBuf::from("pdf_data/parsed/parsed.csv"));
        Ok(())
    }

    #[test]
    fn test_rejects_foreign_column_width() {
        let mut config = Config::default();
        config.extract.column_width = 12;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_block_on_leaves_blocking_work_behind() -> anyhow::Result<()> {
        use std::time::{Duration, Instant};

        let started = Instant::now();
        let value = block_on(async {
            let _detached = tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(5)));
            7
        })?;
        assert_eq!(value, 7);
        assert!(started.elapsed() < Duration::from_secs(3));
        Ok(())
    }

    #[test]
    fn test_rejects_zero_chunk_len() {
        let mut config = Config::default();
        config.chunk.max_len = 0;
        assert!(config.validate().is_err());
    }
}
