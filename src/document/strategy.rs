use std::path::Path;

use log::{debug, info, warn};
use pdfplumber::TableSettings;

use super::layout::LayoutStrategy;
use super::pdf::PdfDocument;
use super::ruling::RulingStrategy;
use super::PageTable;
use crate::error::PipelineError;
use crate::ExtractConfig;

/// One way of finding tables in a document.
pub trait TableStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, doc: &PdfDocument) -> Result<Vec<PageTable>, PipelineError>;
}

/// Runs pdfplumber with `settings` over every page and keeps the tables that,
/// once blank rows are gone, have at least `min_rows` rows and `min_columns`
/// filled cells in their widest row.
pub(super) fn detect_with(
    doc: &PdfDocument,
    settings: &TableSettings,
    min_rows: usize,
    min_columns: usize,
) -> Vec<PageTable> {
    doc.pages()
        .iter()
        .flat_map(|page| {
            page.tables(settings)
                .into_iter()
                .map(move |rows| PageTable::new(page.number, rows))
        })
        .map(PageTable::without_blank_rows)
        .filter(|table| table.rows.len() >= min_rows.max(1) && table.width() >= min_columns.max(1))
        .collect()
}

/// Tries each strategy in order and keeps the first non-empty result.
/// Results of different strategies are never merged.
pub struct Extractor {
    strategies: Vec<Box<dyn TableStrategy>>,
}

impl Extractor {
    pub fn new(strategies: Vec<Box<dyn TableStrategy>>) -> Self {
        Self { strategies }
    }

    /// Text alignment first, ruling lines as the fallback.
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(vec![
            Box::new(LayoutStrategy::new(config.layout.clone())),
            Box::new(RulingStrategy::new(config.ruling.clone())),
        ])
    }

    /// Returns every non-empty table, tagged with its page. Engine and
    /// strategy failures are logged and count as "no tables".
    pub fn extract(&self, path: &Path) -> Vec<PageTable> {
        let doc = match PdfDocument::open(path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("{}", e);
                return Vec::new();
            }
        };
        self.extract_document(&doc)
    }

    pub fn extract_document(&self, doc: &PdfDocument) -> Vec<PageTable> {
        debug!("{} has {} page(s)", doc.path().display(), doc.page_count());
        for (i, strategy) in self.strategies.iter().enumerate() {
            if i > 0 {
                info!(
                    "{} found no tables in {}; trying {}",
                    self.strategies[i - 1].name(),
                    doc.path().display(),
                    strategy.name()
                );
            }
            match strategy.detect(doc) {
                Ok(tables) => {
                    let tables: Vec<PageTable> = tables
                        .into_iter()
                        .map(PageTable::without_blank_rows)
                        .filter(|t| !t.is_empty())
                        .collect();
                    if !tables.is_empty() {
                        debug!(
                            "{} found {} table(s) in {}",
                            strategy.name(),
                            tables.len(),
                            doc.path().display()
                        );
                        return tables;
                    }
                }
                Err(e) => warn!("{} failed on {}: {}", strategy.name(), doc.path().display(), e),
            }
        }
        info!("No tables detected in {}", doc.path().display());
        Vec::new()
    }
}
