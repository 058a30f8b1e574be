//! Table detection from drawn rulings: horizontal and vertical edges that
//! cross each other form a grid, and text is dropped into its cells.

use pdfplumber::{Strategy, TableSettings};

use super::pdf::PdfDocument;
use super::strategy::{detect_with, TableStrategy};
use super::PageTable;
use crate::error::PipelineError;
use crate::RulingConfig;

pub struct RulingStrategy {
    config: RulingConfig,
    settings: TableSettings,
}

impl RulingStrategy {
    pub fn new(config: RulingConfig) -> Self {
        let strategy = if config.strict {
            Strategy::LatticeStrict
        } else {
            Strategy::Lattice
        };
        let settings = TableSettings {
            strategy,
            ..TableSettings::default()
        };
        Self { config, settings }
    }
}

impl TableStrategy for RulingStrategy {
    fn name(&self) -> &'static str {
        "ruling"
    }

    fn detect(&self, doc: &PdfDocument) -> Result<Vec<PageTable>, PipelineError> {
        Ok(detect_with(
            doc,
            &self.settings,
            self.config.min_rows,
            self.config.min_columns,
        ))
    }
}
