use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::Config;

mod chunk;
mod embed;
mod extract;

#[derive(Parser)]
#[command(name = "tabchunk")]
#[command(about = "Extract PDF tables into rows and regroup them into embedding-ready chunks", version = "0.1")]
pub struct Cli {
    #[arg(short, long, help = "Config file (extension optional)", default_value = "config")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract tables from every PDF in a directory into the row artifact
    Extract {
        #[arg(long, help = "Directory of PDF files")]
        pdf_dir: Option<PathBuf>,

        #[arg(long, help = "Row artifact to write")]
        out: Option<PathBuf>,

        #[arg(short, long, help = "Descend into subdirectories")]
        recursive: bool,
    },

    /// Regroup the row artifact into bounded-length chunks
    Chunk {
        #[arg(long, help = "Row artifact to read")]
        rows: Option<PathBuf>,

        #[arg(long, help = "Chunk artifact to write")]
        out: Option<PathBuf>,

        #[arg(long, help = "Maximum characters per chunk")]
        max_len: Option<usize>,
    },

    /// Send the chunk artifact to the embedding service
    Embed {
        #[arg(long, help = "Chunk artifact to read")]
        chunks: Option<PathBuf>,

        #[arg(long, help = "Embeddings file to write (JSON lines)")]
        out: Option<PathBuf>,
    },

    /// Extract, then chunk
    Run {
        #[arg(long, help = "Directory of PDF files")]
        pdf_dir: Option<PathBuf>,
    },
}

pub async fn handler(args: Cli, mut config: Config) -> anyhow::Result<()> {
    match args.command {
        Command::Extract { pdf_dir, out, recursive } => {
            override_path(&mut config.paths.pdf_dir, pdf_dir);
            override_path(&mut config.paths.rows_csv, out);
            config.extract.recursive |= recursive;
            extract::handle_extract(&config).await
        }
        Command::Chunk { rows, out, max_len } => {
            override_path(&mut config.paths.rows_csv, rows);
            override_path(&mut config.paths.chunks_csv, out);
            if let Some(max_len) = max_len {
                config.chunk.max_len = max_len;
            }
            config.validate()?;
            chunk::handle_chunk(&config)
        }
        Command::Embed { chunks, out } => {
            override_path(&mut config.paths.chunks_csv, chunks);
            override_path(&mut config.paths.embeddings_jsonl, out);
            embed::handle_embed(&config).await
        }
        Command::Run { pdf_dir } => {
            override_path(&mut config.paths.pdf_dir, pdf_dir);
            extract::handle_extract(&config).await?;
            chunk::handle_chunk(&config)
        }
    }
}

fn override_path(target: &mut PathBuf, value: Option<PathBuf>) {
    if let Some(value) = value {
        *target = value;
    }
}
