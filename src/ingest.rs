//! Document ingestion: turn an uploaded file into plain text.
//!
//! Format detection is content-first (magic bytes), falling back to the file
//! extension for plain text. Supported: PDF, DOCX, plain text/markdown.
//! Anything else, or a file the parsers choke on, is an `IngestError` and the
//! whole upload fails.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument};

use crate::error::IngestError;

const PDF_MAGIC: &[u8] = b"%PDF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, PartialEq, Eq)]
enum Format {
    Pdf,
    Docx,
    Text,
}

fn sniff(bytes: &[u8], file_name: &str) -> Result<Format, IngestError> {
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(Format::Pdf);
    }
    if bytes.starts_with(ZIP_MAGIC) {
        // DOCX is a zip; whether it actually holds word/document.xml is
        // checked during extraction.
        return Ok(Format::Docx);
    }
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "text" | "md" => Ok(Format::Text),
        "pdf" | "docx" => Err(IngestError::Corrupt(format!(
            "file does not look like a valid .{ext}"
        ))),
        "" => Err(IngestError::Unsupported(" (no file extension)".into())),
        other => Err(IngestError::Unsupported(format!(": .{other}"))),
    }
}

/// Extract plain text from an uploaded file.
#[instrument(level = "info", skip(bytes), fields(%file_name, size = bytes.len()))]
pub fn extract_text(bytes: &[u8], file_name: &str) -> Result<String, IngestError> {
    let format = sniff(bytes, file_name)?;
    debug!(target: "text2quiz_backend", ?format, "Detected upload format");
    let text = match format {
        Format::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| IngestError::Corrupt(e.to_string()))?,
        Format::Docx => extract_docx_text(bytes)?,
        Format::Text => String::from_utf8(bytes.to_vec())
            .map_err(|_| IngestError::Corrupt("file is not valid UTF-8 text".into()))?,
    };
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(text)
}

/// Pull the text runs out of `word/document.xml`, one line per paragraph.
fn extract_docx_text(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IngestError::Corrupt(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| IngestError::Unsupported(": zip archive without word/document.xml".into()))?
        .read_to_string(&mut xml)
        .map_err(|e| IngestError::Corrupt(e.to_string()))?;

    let mut reader = Reader::from_str(&xml);
    let mut out = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                let chunk = t
                    .unescape()
                    .map_err(|e| IngestError::Corrupt(e.to_string()))?;
                out.push_str(&chunk);
            }
            // Paragraph boundaries become newlines.
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => out.push('\n'),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(IngestError::Corrupt(e.to_string())),
        }
    }
    Ok(out)
}
