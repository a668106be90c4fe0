//! Deterministic rendering of a [`SummaryBlob`] into downloadable PDF/DOCX
//! artifacts (spec.md §4.7), plus the periodic reaper that cleans them up
//! (spec.md §4.8).

pub mod docx;
pub mod pdf;
pub mod reaper;

use std::path::PathBuf;

use uuid::Uuid;

use confab_core::domain::SummaryBlob;
use confab_core::error::{GatewayError, Result};

pub use reaper::ExportReaper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(GatewayError::Validation(format!("unsupported export format: {other}"))),
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

/// `meeting_<meeting_id>.<ext>` (spec.md §6 "Export file naming").
pub fn filename(meeting_id: Uuid, format: ExportFormat) -> String {
    format!("meeting_{meeting_id}.{}", format.extension())
}

pub struct ExportRenderer;

impl ExportRenderer {
    /// Validates the blob, renders it, and writes it under `export_dir`,
    /// overwriting any existing file of the same name (spec.md §4.7).
    ///
    /// Rendering is CPU-bound (font shaping, XML assembly) and blocking, so
    /// it runs on a blocking-pool thread rather than the async runtime.
    pub async fn render(
        export_dir: String,
        font_path: String,
        meeting_id: Uuid,
        summary: SummaryBlob,
        format: ExportFormat,
    ) -> Result<String> {
        // Resolves the self-contradictory `summary == {}` guard from
        // spec.md §9's Open Question as `is_empty(summary)`: a structurally
        // present but empty blob fails the same way a missing one would.
        summary.validate()?;

        let name = filename(meeting_id, format);
        let path = PathBuf::from(&export_dir).join(&name);

        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&export_dir)
                .map_err(|e| GatewayError::Fatal(format!("export dir create failed: {e}")))?;
            match format {
                ExportFormat::Pdf => pdf::render(&path, &font_path, &summary),
                ExportFormat::Docx => docx::render(&path, &summary),
            }
        })
        .await
        .map_err(|e| GatewayError::Fatal(format!("export render task panicked: {e}")))??;

        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_uses_meeting_id_and_extension() {
        let id = Uuid::nil();
        assert_eq!(filename(id, ExportFormat::Pdf), "meeting_00000000-0000-0000-0000-000000000000.pdf");
        assert_eq!(filename(id, ExportFormat::Docx), "meeting_00000000-0000-0000-0000-000000000000.docx");
    }

    #[test]
    fn parse_rejects_unknown_format() {
        assert!(ExportFormat::parse("pptx").is_err());
        assert_eq!(ExportFormat::parse("pdf").unwrap(), ExportFormat::Pdf);
    }
}
