//! Word-processor rendering (spec.md §4.7): a title paragraph, a borderless
//! date/created/director table, one heading+summary section per question
//! separated by a thin rule, a forced page break, then a numbered
//! "Key Takeaways" list.

use std::fs::File;
use std::path::Path;

use docx_rs::{
    AbstractNumbering, AlignmentType, BreakType, Docx, IndentLevel, Level, LevelJc, LevelText,
    NumberFormat, Numbering, NumberingId, Paragraph, Run, Start, Table, TableBorders, TableCell,
    TableRow,
};

use confab_core::domain::SummaryBlob;
use confab_core::error::{GatewayError, Result};

/// `docx-rs` numbering definitions are document-global and referenced by id;
/// this document only ever needs one list (Key Takeaways).
const TAKEAWAYS_NUMBERING_ID: usize = 1;

pub fn render(path: &Path, summary: &SummaryBlob) -> Result<()> {
    let mut docx = Docx::new()
        .add_abstract_numbering(
            AbstractNumbering::new(TAKEAWAYS_NUMBERING_ID).add_level(Level::new(
                0,
                Start::new(1),
                NumberFormat::new("decimal"),
                LevelText::new("%1."),
                LevelJc::new("left"),
            )),
        )
        .add_numbering(Numbering::new(TAKEAWAYS_NUMBERING_ID, TAKEAWAYS_NUMBERING_ID));

    docx = docx.add_paragraph(
        Paragraph::new()
            .add_run(Run::new().add_text(&summary.meeting_title).bold().size(56))
            .align(AlignmentType::Center),
    );
    docx = docx.add_paragraph(
        Paragraph::new()
            .add_run(Run::new().add_text(&summary.meeting_description).italic().size(22))
            .align(AlignmentType::Center),
    );

    docx = docx.add_table(
        Table::new(vec![TableRow::new(vec![
            borderless_cell(format!("Date: {}", summary.date)),
            borderless_cell(format!("Created: {}", summary.time_created)),
            borderless_cell(format!("Director: {}", summary.author)),
        ])])
        .set_borders(TableBorders::new().clear_all()),
    );

    for qa in &summary.questions_analysis {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(&qa.question).bold().size(28)));
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(format!("Responses analyzed: {}", qa.response_count)).italic().size(18)),
        );
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(&qa.summary))
                .align(AlignmentType::Both),
        );
        // Thin rule between questions; docx-rs's paragraph border API is
        // unsettled across versions, so a faint rule of underscores is used
        // instead of a true bottom-border property.
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text("─".repeat(60)).size(12)));
    }

    docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
    docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text("Key Takeaways").bold().size(28)));
    for takeaway in &summary.key_takeaways {
        docx = docx.add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text(takeaway))
                .numbering(NumberingId::new(TAKEAWAYS_NUMBERING_ID), IndentLevel::new(0)),
        );
    }

    let file = File::create(path).map_err(|e| GatewayError::Fatal(format!("docx create failed: {e}")))?;
    docx.build()
        .pack(file)
        .map_err(|e| GatewayError::Fatal(format!("docx pack failed: {e}")))?;
    Ok(())
}

fn borderless_cell(text: String) -> TableCell {
    TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
}
