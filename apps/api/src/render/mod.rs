// Render: output backends behind one trait plus the text extraction used to
// verify that every backend exposes the same text.
// All backends consume the same flattened TextUnits from layout::engine.

pub mod docx;
pub mod extract;
pub mod pdf;
pub mod text;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, debug_span};

use crate::layout::page::PageSetup;
use crate::layout::style::StyleSheet;
use crate::resume::model::DocumentModel;

pub use docx::DocxRenderer;
pub use extract::{check_parity, Parity};
pub use pdf::PdfRenderer;

// ────────────────────────────────────────────────────────────────────────────
// Output formats
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Paginated print-ready output.
    Pdf,
    /// Editable word-processing document (OOXML).
    Docx,
}

impl OutputFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputFormat::Pdf),
            "docx" | "word" => Ok(OutputFormat::Docx),
            other => Err(format!("unknown output format '{other}' (expected pdf or docx)")),
        }
    }
}

/// Finished document bytes.
#[derive(Debug, Clone)]
pub struct RenderedOutput {
    pub format: OutputFormat,
    pub bytes: Bytes,
}

impl RenderedOutput {
    pub fn mime_type(&self) -> &'static str {
        self.format.content_type()
    }

    pub fn file_extension(&self) -> &'static str {
        self.format.extension()
    }
}

/// Writer failures, which cannot occur for in-memory buffers in practice, and
/// read failures when extracting text back out of a rendered file.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),
}

// ────────────────────────────────────────────────────────────────────────────
// Renderer trait
// ────────────────────────────────────────────────────────────────────────────

/// A backend that turns a document model into finished bytes. Total over any
/// model, including the empty one.
pub trait Renderer: Send + Sync {
    fn format(&self) -> OutputFormat;

    fn render(&self, model: &DocumentModel, style: &StyleSheet) -> Result<RenderedOutput, RenderError>;
}

pub fn renderer_for(format: OutputFormat, page: PageSetup) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Pdf => Box::new(PdfRenderer { page }),
        OutputFormat::Docx => Box::new(DocxRenderer { page }),
    }
}

pub fn render(
    model: &DocumentModel,
    style: &StyleSheet,
    format: OutputFormat,
    page: PageSetup,
) -> Result<RenderedOutput, RenderError> {
    let renderer = renderer_for(format, page);
    let _span = debug_span!("render_document", format = %renderer.format(), style = %style.label).entered();
    if model.is_empty() {
        debug!("rendering an empty model");
    }
    renderer.render(model, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::page::PageSize;
    use crate::resume::builder::build;
    use crate::resume::normalizer::normalize;

    const RESUMES: &[&str] = &[
        "# Jane Smith\n📧 jane@x.com\n## Experience\n**Engineer — Acme**\n- Built system X\n- Improved Y by 20%",
        "John Q. Public\njohn@example.org | 📞 +1 555 0100\n\nSUMMARY\nBuilt **fast** things with `Rust`.\n\n## Skills\n* Rust, Go\n* SQL (Postgres)",
        "## Projects\n- [site](https://example.com) — 10k users 🚀\n\n### Lead ≥ 3 years\nParagraph with   odd   spacing\nand a second line.",
        "# Дмитрий Пискарев\n## Опыт\n- Разработал систему\n- Ωμέγα → 中文 ✓",
        "## Skills\n* ---\n+ --\n* - - -\n* Rust | C++ | `a|b`",
        "",
    ];

    #[test]
    fn test_output_format_parse() {
        assert_eq!("PDF".parse::<OutputFormat>(), Ok(OutputFormat::Pdf));
        assert_eq!("docx".parse::<OutputFormat>(), Ok(OutputFormat::Docx));
        assert!("odt".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Pdf.content_type(), "application/pdf");
    }

    #[test]
    fn test_renderer_for_reports_its_format() {
        for format in [OutputFormat::Pdf, OutputFormat::Docx] {
            assert_eq!(renderer_for(format, PageSetup::default()).format(), format);
        }
    }

    #[test]
    fn test_both_backends_render_empty_model() {
        let model = build("");
        for format in [OutputFormat::Pdf, OutputFormat::Docx] {
            let out = render(&model, &StyleSheet::default(), format, PageSetup::default()).unwrap();
            assert_eq!(out.format, format);
            assert_eq!(out.file_extension(), format.extension());
            assert!(!out.bytes.is_empty());
        }
    }

    #[test]
    fn test_cross_format_text_parity() {
        for raw in RESUMES {
            let model = build(&normalize(raw));
            for sheet in [StyleSheet::classic(), StyleSheet::compact()] {
                for size in [PageSize::Letter, PageSize::A4] {
                    let page = PageSetup::with_size(size);
                    let pdf = render(&model, &sheet, OutputFormat::Pdf, page).unwrap();
                    let docx = render(&model, &sheet, OutputFormat::Docx, page).unwrap();
                    let parity = check_parity(&pdf.bytes, &docx.bytes).unwrap();
                    assert!(
                        matches!(parity, Parity::Identical { .. }),
                        "parity mismatch for {raw:?} with {}: {parity:?}",
                        sheet.label
                    );
                }
            }
        }
    }

    #[test]
    fn test_parity_holds_across_page_breaks() {
        let mut raw = String::from("# Jane Smith\n## Experience\n");
        for i in 0..40 {
            raw.push_str(&format!("### Role {i}\n- Led initiative {i} across platform, data and infra teams\n"));
        }
        raw.push_str("## Summary\n");
        raw.push_str(&"A very long paragraph that keeps going. ".repeat(400));
        let model = build(&normalize(&raw));
        let page = PageSetup::default();
        let pdf = render(&model, &StyleSheet::default(), OutputFormat::Pdf, page).unwrap();
        let docx = render(&model, &StyleSheet::default(), OutputFormat::Docx, page).unwrap();
        let parity = check_parity(&pdf.bytes, &docx.bytes).unwrap();
        assert_eq!(
            parity,
            Parity::Identical {
                units: crate::layout::engine::flatten(&model).len()
            }
        );
    }

    #[test]
    fn test_non_latin_text_survives_both_backends() {
        let model = build(&normalize("# Дмитрий Пискарев\n## Опыт\n- Разработал систему"));
        let page = PageSetup::default();
        let expected = vec!["Дмитрий Пискарев", "Опыт", "• Разработал систему"];
        let pdf = render(&model, &StyleSheet::default(), OutputFormat::Pdf, page).unwrap();
        let docx = render(&model, &StyleSheet::default(), OutputFormat::Docx, page).unwrap();
        assert_eq!(extract::pdf_text_units(&pdf.bytes).unwrap(), expected);
        assert_eq!(extract::docx_text_units(&docx.bytes).unwrap(), expected);
    }
}
