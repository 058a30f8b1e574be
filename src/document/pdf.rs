use std::path::{Path, PathBuf};

use log::warn;
use pdfplumber::{Page, Pdf, TableSettings};

use super::RawRow;
use crate::error::PipelineError;

/// A decoded page, numbered from 1.
pub struct PdfPage {
    pub number: u32,
    page: Page,
}

impl PdfPage {
    /// Every table pdfplumber finds on the page under `settings`, as rows of
    /// optional cell text.
    pub fn tables(&self, settings: &TableSettings) -> Vec<Vec<RawRow>> {
        self.page.extract_tables(settings)
    }
}

pub struct PdfDocument {
    path: PathBuf,
    page_count: usize,
    pages: Vec<PdfPage>,
}

impl PdfDocument {
    /// Opens `path` and decodes each page once. A page that cannot be
    /// interpreted is skipped with a warning and the rest stay usable.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        let pdf = Pdf::open_file(path, None).map_err(|e| PipelineError::ExtractionEngineUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let page_count = pdf.page_count();
        let mut pages = Vec::with_capacity(page_count);
        for (index, page) in pdf.pages_iter().enumerate() {
            let number = index as u32 + 1;
            match page {
                Ok(page) => pages.push(PdfPage { number, page }),
                Err(e) => {
                    let failure = PipelineError::ExtractionFailure {
                        page: number,
                        reason: e.to_string(),
                    };
                    warn!("Skipping page of {}: {}", path.display(), failure);
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            page_count,
            pages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn pages(&self) -> &[PdfPage] {
        &self.pages
    }
}
