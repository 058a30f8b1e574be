//! Table detection from text placement alone.
//!
//! Column boundaries come from words that share a left edge, right edge or
//! centre on at least three lines; row boundaries from words sharing a top.

use pdfplumber::{Strategy, TableSettings};

use super::pdf::PdfDocument;
use super::strategy::{detect_with, TableStrategy};
use super::PageTable;
use crate::error::PipelineError;
use crate::LayoutConfig;

pub struct LayoutStrategy {
    config: LayoutConfig,
    settings: TableSettings,
}

impl LayoutStrategy {
    pub fn new(config: LayoutConfig) -> Self {
        let settings = TableSettings {
            strategy: Strategy::Stream,
            ..TableSettings::default()
        };
        Self { config, settings }
    }
}

impl TableStrategy for LayoutStrategy {
    fn name(&self) -> &'static str {
        "layout"
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
