//! Editable-document backend: a minimal WordprocessingML package.
//!
//! One `w:p` per text unit with best-effort run and paragraph properties taken
//! from the style sheet. Line breaking and pagination are left to the word
//! processor; only the page size and margins are carried over.

use std::io::{Cursor, Write};

use bytes::Bytes;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::layout::engine::{flatten, TextUnit};
use crate::layout::font_metrics::{get_metrics, TextMeasure};
use crate::layout::page::{to_twips, PageSetup};
use crate::layout::style::{Alignment, BlockStyle, StyleSheet};
use crate::render::text::BULLET_MARKER;
use crate::render::{OutputFormat, RenderError, RenderedOutput, Renderer};
use crate::resume::model::{BlockKind, DocumentModel};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

/// Border thickness in eighths of a point.
const BORDER_SIZE: &str = "6";

#[derive(Debug, Clone, Copy, Default)]
pub struct DocxRenderer {
    pub page: PageSetup,
}

impl Renderer for DocxRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Docx
    }

    fn render(&self, model: &DocumentModel, style: &StyleSheet) -> Result<RenderedOutput, RenderError> {
        let units = flatten(model);
        let document = document_xml(&units, style, &self.page)?;
        let core = core_xml(model.name())?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (path, data) in [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("word/document.xml", document.as_slice()),
            ("docProps/core.xml", core.as_slice()),
        ] {
            zip.start_file(path, options)?;
            zip.write_all(data)?;
        }
        let bytes = zip.finish()?.into_inner();

        debug!(units = units.len(), bytes = bytes.len(), "docx rendered");
        Ok(RenderedOutput {
            format: OutputFormat::Docx,
            bytes: Bytes::from(bytes),
        })
    }
}

type XmlWriter = Writer<Vec<u8>>;

fn empty(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
    let mut tag = BytesStart::new(name);
    for attr in attrs {
        tag.push_attribute(*attr);
    }
    writer.write_event(Event::Empty(tag))?;
    Ok(())
}

fn start(writer: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<(), RenderError> {
    let mut tag = BytesStart::new(name);
    for attr in attrs {
        tag.push_attribute(*attr);
    }
    writer.write_event(Event::Start(tag))?;
    Ok(())
}

fn end(writer: &mut XmlWriter, name: &str) -> Result<(), RenderError> {
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn declaration(writer: &mut XmlWriter) -> Result<(), RenderError> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(())
}

/// Builds `word/document.xml`. An empty unit list yields a body holding only
/// the section properties.
pub fn document_xml(units: &[TextUnit], sheet: &StyleSheet, page: &PageSetup) -> Result<Vec<u8>, RenderError> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start(&mut w, "w:document", &[("xmlns:w", W_NS)])?;
    start(&mut w, "w:body", &[])?;

    for unit in units {
        paragraph(&mut w, unit, sheet.get(unit.kind))?;
    }

    start(&mut w, "w:sectPr", &[])?;
    empty(
        &mut w,
        "w:pgSz",
        &[
            ("w:w", to_twips(page.width_pt()).to_string().as_str()),
            ("w:h", to_twips(page.height_pt()).to_string().as_str()),
        ],
    )?;
    empty(
        &mut w,
        "w:pgMar",
        &[
            ("w:top", to_twips(page.margin_top_pt).to_string().as_str()),
            ("w:right", to_twips(page.margin_right_pt).to_string().as_str()),
            ("w:bottom", to_twips(page.margin_bottom_pt).to_string().as_str()),
            ("w:left", to_twips(page.margin_left_pt).to_string().as_str()),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ],
    )?;
    end(&mut w, "w:sectPr")?;

    end(&mut w, "w:body")?;
    end(&mut w, "w:document")?;
    Ok(w.into_inner())
}

fn paragraph(w: &mut XmlWriter, unit: &TextUnit, style: &BlockStyle) -> Result<(), RenderError> {
    start(w, "w:p", &[])?;

    // Paragraph properties, in schema order.
    start(w, "w:pPr", &[])?;
    if unit.keeps_with_next() {
        empty(w, "w:keepNext", &[])?;
    }
    if style.rule_before || style.rule_after {
        let border = [
            ("w:val", "single"),
            ("w:sz", BORDER_SIZE),
            ("w:space", "1"),
            ("w:color", "auto"),
        ];
        start(w, "w:pBdr", &[])?;
        if style.rule_before {
            empty(w, "w:top", &border)?;
        }
        if style.rule_after {
            empty(w, "w:bottom", &border)?;
        }
        end(w, "w:pBdr")?;
    }
    empty(
        w,
        "w:spacing",
        &[
            ("w:before", to_twips(style.spacing_before_pt).to_string().as_str()),
            ("w:after", to_twips(style.spacing_after_pt).to_string().as_str()),
            ("w:line", ((240.0 * style.line_height).round() as i64).to_string().as_str()),
            ("w:lineRule", "auto"),
        ],
    )?;
    let face = unit.face(style);
    if unit.kind == BlockKind::BulletList {
        let marker = get_metrics(&face).measure_pt(BULLET_MARKER, style.size_pt);
        empty(
            w,
            "w:ind",
            &[
                ("w:left", to_twips(style.indent_pt + marker).to_string().as_str()),
                ("w:hanging", to_twips(marker).to_string().as_str()),
            ],
        )?;
    } else if style.indent_pt > 0.0 {
        empty(w, "w:ind", &[("w:left", to_twips(style.indent_pt).to_string().as_str())])?;
    }
    let jc = match style.alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Justify => "both",
    };
    empty(w, "w:jc", &[("w:val", jc)])?;
    end(w, "w:pPr")?;

    if !unit.text.is_empty() {
        start(w, "w:r", &[])?;
        start(w, "w:rPr", &[])?;
        let font = face.office_font_name();
        empty(
            w,
            "w:rFonts",
            &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font)],
        )?;
        if face.is_bold() {
            empty(w, "w:b", &[])?;
        }
        let half_points = ((style.size_pt * 2.0).round() as i64).to_string();
        empty(w, "w:sz", &[("w:val", half_points.as_str())])?;
        empty(w, "w:szCs", &[("w:val", half_points.as_str())])?;
        end(w, "w:rPr")?;

        start(w, "w:t", &[("xml:space", "preserve")])?;
        w.write_event(Event::Text(BytesText::new(&unit.text)))?;
        end(w, "w:t")?;
        end(w, "w:r")?;
    }

    end(w, "w:p")
}

/// `docProps/core.xml` with the résumé name as title.
fn core_xml(title: Option<&str>) -> Result<Vec<u8>, RenderError> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start(
        &mut w,
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ],
    )?;
    if let Some(title) = title {
        start(&mut w, "dc:title", &[])?;
        w.write_event(Event::Text(BytesText::new(title)))?;
        end(&mut w, "dc:title")?;
    }
    start(&mut w, "dc:creator", &[])?;
    w.write_event(Event::Text(BytesText::new(env!("CARGO_PKG_NAME"))))?;
    end(&mut w, "dc:creator")?;
    end(&mut w, "cp:coreProperties")?;
    Ok(w.into_inner())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::layout::page::PageSize;
    use crate::render::extract::docx_text_units;
    use crate::resume::builder::build;
    use crate::resume::normalizer::normalize;

    fn document_part(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    fn render_docx(raw: &str, page: PageSetup) -> Vec<u8> {
        DocxRenderer { page }
            .render(&build(&normalize(raw)), &StyleSheet::default())
            .unwrap()
            .bytes
            .to_vec()
    }

    #[test]
    fn test_package_has_required_parts() {
        let bytes = render_docx("# Jane Smith", PageSetup::default());
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        for part in ["[Content_Types].xml", "_rels/.rels", "word/document.xml", "docProps/core.xml"] {
            assert!(archive.by_name(part).is_ok(), "missing {part}");
        }
    }

    #[test]
    fn test_empty_model_has_only_section_properties() {
        let xml = document_part(&render_docx("", PageSetup::default()));
        assert!(!xml.contains("<w:p>"));
        assert!(xml.contains("<w:body><w:sectPr>"));
        assert!(xml.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));
    }

    #[test]
    fn test_a4_page_size() {
        let xml = document_part(&render_docx("# Jane Smith", PageSetup::with_size(PageSize::A4)));
        assert!(xml.contains(r#"<w:pgSz w:w="11906" w:h="16838"/>"#));
        assert!(xml.contains(r#"w:left="1440""#));
    }

    #[test]
    fn test_scenario_paragraph_properties() {
        let bytes = render_docx(
            "# Jane Smith\n📧 jane@x.com\n## Experience\n**Engineer — Acme**\n- Built system X\n- Improved Y by 20%",
            PageSetup::default(),
        );
        let xml = document_part(&bytes);
        assert_eq!(xml.matches("<w:p>").count(), 6);
        assert!(xml.contains(r#"<w:jc w:val="center"/>"#));
        assert!(xml.contains(r#"<w:sz w:val="48"/>"#));
        assert!(xml.contains(r#"<w:rFonts w:ascii="Times New Roman""#));
        assert_eq!(xml.matches("<w:keepNext/>").count(), 2);
        assert_eq!(xml.matches("<w:bottom ").count(), 2);
        assert!(xml.contains(r#"w:hanging=""#));
        assert_eq!(
            docx_text_units(&bytes).unwrap(),
            vec![
                "Jane Smith",
                "Email: jane@x.com",
                "Experience",
                "Engineer — Acme",
                "• Built system X",
                "• Improved Y by 20%",
            ]
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let bytes = render_docx("## R&D <core>\n- a < b & c", PageSetup::default());
        let xml = document_part(&bytes);
        assert!(xml.contains("R&amp;D &lt;core&gt;"));
        assert_eq!(docx_text_units(&bytes).unwrap(), vec!["R&D <core>", "• a < b & c"]);
    }

    #[test]
    fn test_cyrillic_runs_use_the_bundled_face() {
        let xml = document_part(&render_docx(
            "# Дмитрий Пискарев\n## Опыт\n- Разработал систему\n- Rust",
            PageSetup::default(),
        ));
        assert_eq!(xml.matches(r#"<w:rFonts w:ascii="DejaVu Sans""#).count(), 3);
        assert_eq!(xml.matches(r#"<w:rFonts w:ascii="Times New Roman""#).count(), 1);
        assert!(xml.contains("Разработал систему"));
    }
}

