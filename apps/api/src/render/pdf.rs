//! PDF backend: draws a `DocumentLayout`.
//!
//! Latin text is set in the standard Type1 fonts with WinAnsiEncoding. Units
//! in other scripts use the bundled TrueType face as a Type0/CIDFontType2 font:
//! every distinct character gets its own CID, a CIDToGIDMap points it at the
//! glyph, and the widths and ToUnicode map only cover characters in use.
//!
//! Page content streams are left uncompressed. Every unit is wrapped in a `/P`
//! marked-content sequence (`/Span` for the part of a split unit that continues
//! on a later page) so extraction can recover unit boundaries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::io::Write;

use bytes::Bytes;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::types::{CidFontType, FontFlags, SystemInfo};
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};
use tracing::debug;

use crate::layout::embedded_font::{embedded_font, EmbeddedFont};
use crate::layout::engine::{layout, DocumentLayout, PageLayout, RULE_THICKNESS_PT};
use crate::layout::font_metrics::FontFace;
use crate::layout::page::PageSetup;
use crate::layout::style::StyleSheet;
use crate::render::text::encode_winansi;
use crate::render::{OutputFormat, RenderError, RenderedOutput, Renderer};
use crate::resume::model::DocumentModel;

pub const UNIT_TAG: &[u8] = b"P";
pub const CONTINUATION_TAG: &[u8] = b"Span";

const PRODUCER: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfRenderer {
    pub page: PageSetup,
}

impl Renderer for PdfRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn render(&self, model: &DocumentModel, style: &StyleSheet) -> Result<RenderedOutput, RenderError> {
        let doc = layout(model, style, &self.page);
        let bytes = write_pdf(&doc, style, model.name())?;
        debug!(pages = doc.page_count(), bytes = bytes.len(), "pdf rendered");
        Ok(RenderedOutput {
            format: OutputFormat::Pdf,
            bytes: Bytes::from(bytes),
        })
    }
}

enum FontEncoding {
    WinAnsi,
    /// Two-byte codes; CIDs start at 1 and follow character order.
    Cid(BTreeMap<char, u16>),
}

struct FontResource {
    name: String,
    id: Ref,
    encoding: FontEncoding,
}

impl FontResource {
    fn encode(&self, text: &str) -> Vec<u8> {
        match &self.encoding {
            FontEncoding::WinAnsi => encode_winansi(text),
            FontEncoding::Cid(cids) => text
                .chars()
                .flat_map(|c| cids.get(&c).copied().unwrap_or(0).to_be_bytes())
                .collect(),
        }
    }
}

/// Serializes a laid-out document. `title` goes into the document info dictionary.
pub fn write_pdf(doc: &DocumentLayout, sheet: &StyleSheet, title: Option<&str>) -> Result<Vec<u8>, RenderError> {
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // One resource per face actually used, in a stable order.
    let mut used: BTreeMap<FontFace, BTreeSet<char>> = BTreeMap::new();
    for unit in doc.pages.iter().flat_map(|p| &p.units) {
        let chars = used.entry(unit.face).or_default();
        if unit.face.is_embedded() {
            chars.extend(unit.lines.iter().flat_map(|l| l.text.chars()));
        }
    }
    let mut fonts: BTreeMap<FontFace, FontResource> = BTreeMap::new();
    for (face, chars) in &used {
        let encoding = match embedded_font(face.weight) {
            Some(_) if face.is_embedded() => FontEncoding::Cid(
                chars
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| (c, u16::try_from(i + 1).unwrap_or(u16::MAX)))
                    .collect(),
            ),
            _ => FontEncoding::WinAnsi,
        };
        let name = format!("F{}", fonts.len() + 1);
        fonts.insert(*face, FontResource { name, id: alloc(), encoding });
    }

    let page_ids: Vec<Ref> = doc.pages.iter().map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = doc.pages.iter().map(|_| alloc()).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    let mut info = pdf.document_info(info_id);
    info.producer(TextStr(PRODUCER));
    if let Some(title) = title {
        info.title(TextStr(title));
    }
    info.finish();

    for (face, font) in &fonts {
        match (&font.encoding, embedded_font(face.weight)) {
            (FontEncoding::Cid(cids), Some(program)) => {
                let refs = Type0Refs {
                    cid_font: alloc(),
                    descriptor: alloc(),
                    font_file: alloc(),
                    cid_to_gid: alloc(),
                    to_unicode: alloc(),
                };
                write_type0_font(&mut pdf, font.id, &refs, face, program, cids)?;
            }
            _ => {
                pdf.type1_font(font.id)
                    .base_font(Name(face.base_font_name().as_bytes()))
                    .encoding_predefined(Name(b"WinAnsiEncoding"));
            }
        }
    }

    let (width, height) = (doc.setup.width_pt(), doc.setup.height_pt());
    for (i, page_layout) in doc.pages.iter().enumerate() {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, width, height))
            .parent(pages_id)
            .contents(content_ids[i]);
        {
            let mut resources = page.resources();
            let mut font_dict = resources.fonts();
            for font in fonts.values() {
                font_dict.pair(Name(font.name.as_bytes()), font.id);
            }
        }
        page.finish();

        let content = page_content(page_layout, sheet, &fonts, height);
        pdf.stream(content_ids[i], &content);
    }

    Ok(pdf.finish())
}

struct Type0Refs {
    cid_font: Ref,
    descriptor: Ref,
    font_file: Ref,
    cid_to_gid: Ref,
    to_unicode: Ref,
}

fn write_type0_font(
    pdf: &mut Pdf,
    id: Ref,
    refs: &Type0Refs,
    face: &FontFace,
    program: &EmbeddedFont,
    cids: &BTreeMap<char, u16>,
) -> Result<(), RenderError> {
    let base_font = Name(program.postscript_name.as_bytes());

    pdf.type0_font(id)
        .base_font(base_font)
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(refs.cid_font)
        .to_unicode(refs.to_unicode);

    // Map keys iterate in CID order.
    let widths: Vec<f32> = cids
        .keys()
        .map(|&c| f32::from(program.glyph_width(program.glyph_id(c))))
        .collect();
    let mut cid_font = pdf.cid_font(refs.cid_font);
    cid_font
        .subtype(CidFontType::Type2)
        .base_font(base_font)
        .system_info(SystemInfo {
            registry: Str(b"Adobe"),
            ordering: Str(b"Identity"),
            supplement: 0,
        })
        .font_descriptor(refs.descriptor)
        .default_width(f32::from(program.glyph_width(0)))
        .cid_to_gid_map_stream(refs.cid_to_gid);
    if !widths.is_empty() {
        cid_font.widths().consecutive(1, widths);
    }
    cid_font.finish();

    let (x_min, y_min, x_max, y_max) = program.bbox;
    pdf.font_descriptor(refs.descriptor)
        .name(base_font)
        .flags(FontFlags::NON_SYMBOLIC)
        .bbox(Rect::new(f32::from(x_min), f32::from(y_min), f32::from(x_max), f32::from(y_max)))
        .italic_angle(0.0)
        .ascent(f32::from(program.ascent))
        .descent(f32::from(program.descent))
        .cap_height(f32::from(program.cap_height))
        .stem_v(if face.is_bold() { 140.0 } else { 80.0 })
        .font_file2(refs.font_file);

    let data = program.data();
    pdf.stream(refs.font_file, &deflate(data)?)
        .filter(Filter::FlateDecode)
        .pair(Name(b"Length1"), i32::try_from(data.len()).unwrap_or(i32::MAX));

    // CID 0 stays on .notdef.
    let cid_to_gid: Vec<u8> = std::iter::once(0u16)
        .chain(cids.keys().map(|&c| program.glyph_id(c)))
        .flat_map(u16::to_be_bytes)
        .collect();
    pdf.stream(refs.cid_to_gid, &deflate(&cid_to_gid)?)
        .filter(Filter::FlateDecode);

    pdf.stream(refs.to_unicode, &deflate(to_unicode_cmap(cids).as_bytes())?)
        .filter(Filter::FlateDecode);

    Ok(())
}

/// ToUnicode CMap from our CIDs back to the characters they encode.
fn to_unicode_cmap(cids: &BTreeMap<char, u16>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    let entries: Vec<(&char, &u16)> = cids.iter().collect();
    // At most 100 entries per bfchar block.
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for (c, cid) in chunk {
            let mut units = [0u16; 2];
            let utf16: String = c
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            let _ = writeln!(cmap, "<{cid:04X}> <{utf16}>");
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn page_content(
    page: &PageLayout,
    sheet: &StyleSheet,
    fonts: &BTreeMap<FontFace, FontResource>,
    page_height: f32,
) -> Vec<u8> {
    let mut content = Content::new();

    if !page.rules.is_empty() {
        content.set_line_width(RULE_THICKNESS_PT);
        for rule in &page.rules {
            let y = page_height - rule.y_pt;
            content.move_to(rule.x1_pt, y);
            content.line_to(rule.x2_pt, y);
            content.stroke();
        }
    }

    for unit in &page.units {
        let style = sheet.get(unit.kind);
        let Some(font) = fonts.get(&unit.face) else {
            continue;
        };
        let tag = if unit.continuation { CONTINUATION_TAG } else { UNIT_TAG };
        content.begin_marked_content(Name(tag));
        for line in &unit.lines {
            content
                .begin_text()
                .set_font(Name(font.name.as_bytes()), style.size_pt)
                .set_word_spacing(line.word_spacing_pt)
                .next_line(line.x_pt, page_height - line.baseline_pt)
                .show(Str(&font.encode(&line.text)))
                .end_text();
        }
        content.end_marked_content();
    }

    content.finish()
}
