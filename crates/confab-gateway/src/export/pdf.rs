//! PDF rendering (spec.md §4.7). Page 1 is a title page; one page per
//! question follows; a forced page break precedes "Key Takeaways". Pages 2+
//! carry a header and a footer. The font is embedded from disk rather than a
//! built-in base-14 font so non-Latin text and emoji render correctly.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use confab_core::domain::SummaryBlob;
use confab_core::error::{GatewayError, Result};

const PAGE_WIDTH_MM: f64 = 210.0;
const PAGE_HEIGHT_MM: f64 = 297.0;
const MARGIN_MM: f64 = 20.0;
const BODY_WIDTH_MM: f64 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
/// Rough glyph width at 11pt; good enough to keep lines inside the margins
/// without pulling in a text-shaping dependency.
const CHARS_PER_LINE: usize = 95;
const LINE_HEIGHT_MM: f64 = 5.5;

pub fn render(path: &Path, font_path: &str, summary: &SummaryBlob) -> Result<()> {
    let (doc, title_page, title_layer) = PdfDocument::new(
        format!("Meeting Summary - {}", summary.meeting_title),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Content",
    );

    let font_file = File::open(font_path).map_err(|e| GatewayError::Fatal(format!("font open failed ({font_path}): {e}")))?;
    let font = doc
        .add_external_font(font_file)
        .map_err(|e| GatewayError::Fatal(format!("font embed failed: {e}")))?;

    draw_title_page(&doc.get_page(title_page).get_layer(title_layer), &font, summary);

    let mut page_number = 2;
    for qa in &summary.questions_analysis {
        let (page, layer_index) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Content");
        let layer = doc.get_page(page).get_layer(layer_index);
        draw_header_footer(&layer, &font, page_number);

        let mut y = PAGE_HEIGHT_MM - MARGIN_MM - 15.0;
        layer.use_text(&qa.question, 16.0, Mm(MARGIN_MM), Mm(y), &font);
        y -= 8.0;
        layer.use_text(format!("Total Responses: {}", qa.response_count), 10.0, Mm(MARGIN_MM), Mm(y), &font);
        y -= 10.0;
        y = draw_paragraph(&layer, &font, &qa.summary, y);
        draw_separator(&layer, y - 4.0);

        page_number += 1;
    }

    // Forced page break before Key Takeaways (spec.md §4.7).
    let (takeaways_page, takeaways_layer_index) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Content");
    let layer = doc.get_page(takeaways_page).get_layer(takeaways_layer_index);
    draw_header_footer(&layer, &font, page_number);

    let mut y = PAGE_HEIGHT_MM - MARGIN_MM - 15.0;
    layer.use_text("Key Takeaways", 16.0, Mm(MARGIN_MM), Mm(y), &font);
    y -= 10.0;
    for (i, takeaway) in summary.key_takeaways.iter().enumerate() {
        let line = format!("{}. {}", i + 1, takeaway);
        y = draw_paragraph(&layer, &font, &line, y);
        y -= 4.0;
    }

    let file = File::create(path).map_err(|e| GatewayError::Fatal(format!("pdf create failed: {e}")))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| GatewayError::Fatal(format!("pdf save failed: {e}")))?;
    Ok(())
}

fn draw_title_page(layer: &PdfLayerReference, font: &IndirectFontRef, summary: &SummaryBlob) {
    let center_x = PAGE_WIDTH_MM / 2.0;
    layer.use_text(&summary.meeting_title, 26.0, Mm(center_x - text_half_width(&summary.meeting_title, 26.0)), Mm(200.0), font);
    layer.use_text(
        &summary.meeting_description,
        13.0,
        Mm(center_x - text_half_width(&summary.meeting_description, 13.0)),
        Mm(185.0),
        font,
    );
    layer.use_text(format!("Date: {}", summary.date), 11.0, Mm(MARGIN_MM), Mm(150.0), font);
    layer.use_text(format!("Created: {}", summary.time_created), 11.0, Mm(MARGIN_MM), Mm(142.0), font);
    layer.use_text(format!("Director: {}", summary.author), 11.0, Mm(MARGIN_MM), Mm(134.0), font);
}

fn draw_header_footer(layer: &PdfLayerReference, font: &IndirectFontRef, page_number: usize) {
    layer.use_text("Meeting Summary", 9.0, Mm(MARGIN_MM), Mm(PAGE_HEIGHT_MM - 12.0), font);
    layer.use_text(format!("Page {page_number}"), 9.0, Mm(PAGE_WIDTH_MM - MARGIN_MM - 15.0), Mm(10.0), font);
}

/// Word-wraps `text` at roughly `CHARS_PER_LINE` and prints it justified
/// top-to-bottom starting at `y`; returns the y coordinate after the last line.
fn draw_paragraph(layer: &PdfLayerReference, font: &IndirectFontRef, text: &str, start_y: f64) -> f64 {
    let mut y = start_y;
    for line in wrap_text(text, CHARS_PER_LINE) {
        layer.use_text(line, 11.0, Mm(MARGIN_MM), Mm(y), font);
        y -= LINE_HEIGHT_MM;
    }
    y
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn draw_separator(layer: &PdfLayerReference, y: f64) {
    let line = Line {
        points: vec![
            (Point::new(Mm(MARGIN_MM), Mm(y)), false),
            (Point::new(Mm(MARGIN_MM + BODY_WIDTH_MM), Mm(y)), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

/// Rough half-width estimate for centering a line at a given font size,
/// avoiding a text-measurement dependency.
fn text_half_width(text: &str, font_size: f64) -> f64 {
    let avg_glyph_width_mm = font_size * 0.0052;
    (text.chars().count() as f64 * avg_glyph_width_mm) / 2.0
}
