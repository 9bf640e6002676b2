//! Quiz export: render questions plus a trailing answer key to PDF.
//!
//! Pure function of the question list and a display name — user answers are
//! never consulted, the export carries the canonical key. Layout is a simple
//! top-down cursor on A4 pages: wrap long lines at a fixed width, start a new
//! page once the cursor crosses the break threshold.

use std::io::BufWriter;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfPageIndex};
use tracing::instrument;

use crate::domain::Question;
use crate::error::ExportError;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
/// Cursor position (from the top) past which we start a new page.
const PAGE_BREAK_MM: f32 = 270.0;
const MARGIN_LEFT_MM: f32 = 10.0;
const OPTION_INDENT_MM: f32 = 14.0;
const LINE_HEIGHT_MM: f32 = 7.0;
const OPTION_LINE_HEIGHT_MM: f32 = 6.0;
/// Fixed wrap width in characters (approximates the usable A4 text width).
const WRAP_COLS: usize = 90;

/// Top-down text cursor over a growing PDF document.
struct PageCursor<'a> {
    doc: &'a PdfDocumentReference,
    font: &'a IndirectFontRef,
    page: PdfPageIndex,
    layer: PdfLayerIndex,
    y: f32,
}

impl<'a> PageCursor<'a> {
    fn write_line(&mut self, text: &str, size: f32, x: f32, advance: f32) {
        if self.y > PAGE_BREAK_MM {
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH_MM),
                Mm(PAGE_HEIGHT_MM),
                "quiz layer",
            );
            self.page = page;
            self.layer = layer;
            self.y = 10.0;
        }
        let layer = self.doc.get_page(self.page).get_layer(self.layer);
        layer.use_text(
            text,
            size,
            Mm(x),
            Mm(PAGE_HEIGHT_MM - self.y),
            self.font,
        );
        self.y += advance;
    }

    fn gap(&mut self, mm: f32) {
        self.y += mm;
    }
}

/// Greedy word wrap at a fixed column width. A single overlong word gets its
/// own line rather than being split mid-word.
fn wrap(text: &str, cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= cols {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Render the quiz (questions, options, then the answer key) as PDF bytes.
#[instrument(level = "info", skip(questions), fields(%file_name, count = questions.len()))]
pub fn render(questions: &[Question], file_name: &str) -> Result<Vec<u8>, ExportError> {
    let title = format!("{} quiz with answers:", file_name);
    let (doc, page, layer) =
        PdfDocument::new(title.as_str(), Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "quiz layer");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ExportError::Render(e.to_string()))?;

    let mut cursor = PageCursor { doc: &doc, font: &font, page, layer, y: 10.0 };
    cursor.write_line(&title, 14.0, MARGIN_LEFT_MM, LINE_HEIGHT_MM);
    cursor.gap(3.0);

    for (index, q) in questions.iter().enumerate() {
        for line in wrap(&format!("{}. {}", index + 1, q.question), WRAP_COLS) {
            cursor.write_line(&line, 12.0, MARGIN_LEFT_MM, LINE_HEIGHT_MM);
        }
        for opt in &q.options {
            for line in wrap(&format!("- {}", opt), WRAP_COLS - 4) {
                cursor.write_line(&line, 11.0, OPTION_INDENT_MM, OPTION_LINE_HEIGHT_MM);
            }
        }
        cursor.gap(6.0);
    }

    cursor.gap(10.0);
    cursor.write_line("Answers:", 12.0, MARGIN_LEFT_MM, 8.0);
    for (index, q) in questions.iter().enumerate() {
        for line in wrap(&format!("{}. {}", index + 1, q.answer), WRAP_COLS) {
            cursor.write_line(&line, 11.0, MARGIN_LEFT_MM, OPTION_LINE_HEIGHT_MM);
        }
    }

    let mut bytes = Vec::new();
    doc.save(&mut BufWriter::new(&mut bytes))
        .map_err(|e| ExportError::Render(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(n: usize) -> Question {
        Question {
            question: format!("Question number {n}, which asks about something?"),
            options: vec!["alpha".into(), "beta".into(), "gamma".into(), "delta".into()],
            answer: "beta".into(),
        }
    }

    #[test]
    fn wrap_respects_column_limit() {
        let lines = wrap("one two three four five six", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "one two three four five six");
    }

    #[test]
    fn wrap_keeps_overlong_word_on_its_own_line() {
        let lines = wrap("short pneumonoultramicroscopicsilicovolcanoconiosis tail", 12);
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn render_produces_a_pdf() {
        let qs: Vec<Question> = (0..3).map(question).collect();
        let bytes = render(&qs, "notes.pdf").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn render_survives_enough_questions_to_paginate() {
        let qs: Vec<Question> = (0..40).map(question).collect();
        let bytes = render(&qs, "long").unwrap();
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn render_ignores_empty_input_gracefully() {
        let bytes = render(&[], "empty").unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
