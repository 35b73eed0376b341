//! Plain-text extraction from rendered outputs, one string per text unit.
//!
//! Only understands the structure this crate's backends write: PDF units are
//! `/P` marked-content sequences, decoded through each font's encoding or
//! ToUnicode map by lopdf; DOCX units are the `w:p`/`w:t` paragraphs of the
//! main part.

use std::io::{Cursor, Read};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::render::pdf::{CONTINUATION_TAG, UNIT_TAG};
use crate::render::RenderError;

/// Outcome of comparing the text of two renderings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parity {
    Identical {
        units: usize,
    },
    Mismatch {
        index: usize,
        pdf: Option<String>,
        docx: Option<String>,
    },
}

/// Compares the unit texts of a PDF and a DOCX rendering of the same model.
pub fn check_parity(pdf: &[u8], docx: &[u8]) -> Result<Parity, RenderError> {
    let pdf_units = pdf_text_units(pdf)?;
    let docx_units = docx_text_units(docx)?;
    let longest = pdf_units.len().max(docx_units.len());
    for index in 0..longest {
        let (left, right) = (pdf_units.get(index), docx_units.get(index));
        if left != right {
            return Ok(Parity::Mismatch {
                index,
                pdf: left.cloned(),
                docx: right.cloned(),
            });
        }
    }
    Ok(Parity::Identical { units: longest })
}

// ────────────────────────────────────────────────────────────────────────────
// PDF
// ────────────────────────────────────────────────────────────────────────────

pub fn pdf_text_units(pdf: &[u8]) -> Result<Vec<String>, RenderError> {
    let doc = Document::load_mem(pdf)?;
    let mut units = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let fonts = doc.get_page_fonts(page_id)?;
        let content = Content::decode(&doc.get_page_content(page_id)?)?;
        collect_units(&content.operations, &mut units, |font, bytes| {
            let encoding = fonts.get(font)?.get_font_encoding(&doc).ok()?;
            Document::decode_text(&encoding, bytes).ok()
        });
    }
    Ok(units)
}

/// Walks one page's operations, appending finished units. A `/Span` sequence
/// continues the previous unit. `decode` turns a shown string into text for
/// the font resource selected by the last `Tf`.
fn collect_units<F>(operations: &[Operation], units: &mut Vec<String>, decode: F)
where
    F: Fn(&[u8], &[u8]) -> Option<String>,
{
    let mut font: Vec<u8> = Vec::new();
    let mut open: Option<(bool, Vec<String>)> = None;

    for op in operations {
        match (op.operator.as_str(), op.operands.as_slice()) {
            ("Tf", [Object::Name(name), ..]) => font.clone_from(name),
            ("BMC", [Object::Name(tag)]) => {
                if tag.as_slice() == UNIT_TAG || tag.as_slice() == CONTINUATION_TAG {
                    open = Some((tag.as_slice() == CONTINUATION_TAG, Vec::new()));
                }
            }
            ("Tj", [Object::String(bytes, _)]) => {
                if let Some((_, fragments)) = open.as_mut() {
                    fragments.push(decode(&font, bytes).unwrap_or_default());
                }
            }
            ("EMC", _) => {
                if let Some((continuation, fragments)) = open.take() {
                    let text = fragments.join(" ");
                    match units.last_mut() {
                        Some(previous) if continuation => {
                            previous.push(' ');
                            previous.push_str(&text);
                        }
                        _ => units.push(text),
                    }
                }
            }
            _ => {}
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// DOCX
// ────────────────────────────────────────────────────────────────────────────

pub fn docx_text_units(docx: &[u8]) -> Result<Vec<String>, RenderError> {
    let mut archive = ZipArchive::new(Cursor::new(docx))?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;

    let mut reader = Reader::from_str(&xml);
    let mut units = Vec::new();
    let mut paragraph: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => paragraph = Some(String::new()),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"p" {
                    units.push(String::new());
                }
            }
            Event::Text(t) => {
                if let (true, Some(text)) = (in_text, paragraph.as_mut()) {
                    text.push_str(&t.unescape()?);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    if let Some(text) = paragraph.take() {
                        units.push(text);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(units)
}
