//! Style sheets: pure data mapping each block kind to its visual attributes.
//!
//! A sheet is built (or loaded) once at startup, wrapped in an `Arc` and only
//! ever read afterwards, so render calls can share it across threads.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::{FontFace, FontFamily, FontWeight};
use crate::resume::model::BlockKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Justify,
}

fn default_line_height() -> f32 {
    1.4
}

/// Visual attributes for one block kind. Sizes and spacing are in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStyle {
    pub font_family: FontFamily,
    pub weight: FontWeight,
    pub size_pt: f32,
    pub alignment: Alignment,
    pub spacing_before_pt: f32,
    pub spacing_after_pt: f32,
    pub rule_before: bool,
    pub rule_after: bool,
    /// Line advance as a multiple of `size_pt`.
    #[serde(default = "default_line_height")]
    pub line_height: f32,
    /// Left indent; bullets hang their continuation lines past the marker.
    #[serde(default)]
    pub indent_pt: f32,
}

impl BlockStyle {
    fn body(family: FontFamily, size_pt: f32) -> Self {
        Self {
            font_family: family,
            weight: FontWeight::Regular,
            size_pt,
            alignment: Alignment::Left,
            spacing_before_pt: 0.0,
            spacing_after_pt: 0.0,
            rule_before: false,
            rule_after: false,
            line_height: default_line_height(),
            indent_pt: 0.0,
        }
    }

    pub fn face(&self) -> FontFace {
        FontFace::new(self.font_family, self.weight)
    }

    /// Vertical advance of one line of text.
    pub fn leading_pt(&self) -> f32 {
        self.size_pt * self.line_height
    }
}

/// One complete table of block styles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    /// Selector used by callers (`?style=classic`).
    pub label: String,
    pub name: BlockStyle,
    pub contact: BlockStyle,
    pub section_header: BlockStyle,
    pub position: BlockStyle,
    pub bullet: BlockStyle,
    pub paragraph: BlockStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self::classic()
    }
}

impl StyleSheet {
    pub fn get(&self, kind: BlockKind) -> &BlockStyle {
        match kind {
            BlockKind::Name => &self.name,
            BlockKind::Contact => &self.contact,
            BlockKind::SectionHeader => &self.section_header,
            BlockKind::Position => &self.position,
            BlockKind::BulletList => &self.bullet,
            BlockKind::Paragraph => &self.paragraph,
        }
    }

    /// Serif sheet: 24pt centred name, 16pt ruled section headers, 12pt body at
    /// 1.4 line height.
    pub fn classic() -> Self {
        let family = FontFamily::Times;
        Self {
            label: "classic".to_string(),
            name: BlockStyle {
                weight: FontWeight::Bold,
                alignment: Alignment::Center,
                spacing_after_pt: 4.0,
                rule_after: true,
                line_height: 1.2,
                ..BlockStyle::body(family, 24.0)
            },
            contact: BlockStyle {
                alignment: Alignment::Center,
                spacing_after_pt: 6.0,
                ..BlockStyle::body(family, 11.0)
            },
            section_header: BlockStyle {
                weight: FontWeight::Bold,
                spacing_before_pt: 14.0,
                spacing_after_pt: 6.0,
                rule_after: true,
                line_height: 1.2,
                ..BlockStyle::body(family, 16.0)
            },
            position: BlockStyle {
                weight: FontWeight::Bold,
                spacing_before_pt: 8.0,
                spacing_after_pt: 2.0,
                line_height: 1.2,
                ..BlockStyle::body(family, 14.0)
            },
            bullet: BlockStyle {
                spacing_after_pt: 1.0,
                indent_pt: 18.0,
                ..BlockStyle::body(family, 12.0)
            },
            paragraph: BlockStyle {
                alignment: Alignment::Justify,
                spacing_before_pt: 2.0,
                spacing_after_pt: 4.0,
                ..BlockStyle::body(family, 12.0)
            },
        }
    }

    /// Denser sans-serif sheet for résumés that should stay on one page.
    pub fn compact() -> Self {
        let family = FontFamily::Helvetica;
        Self {
            label: "compact".to_string(),
            name: BlockStyle {
                weight: FontWeight::Bold,
                spacing_after_pt: 2.0,
                line_height: 1.15,
                ..BlockStyle::body(family, 18.0)
            },
            contact: BlockStyle {
                spacing_after_pt: 4.0,
                rule_after: true,
                line_height: 1.2,
                ..BlockStyle::body(family, 9.0)
            },
            section_header: BlockStyle {
                weight: FontWeight::Bold,
                spacing_before_pt: 8.0,
                spacing_after_pt: 3.0,
                rule_before: true,
                line_height: 1.15,
                ..BlockStyle::body(family, 11.0)
            },
            position: BlockStyle {
                weight: FontWeight::Bold,
                spacing_before_pt: 4.0,
                line_height: 1.2,
                ..BlockStyle::body(family, 10.0)
            },
            bullet: BlockStyle {
                indent_pt: 12.0,
                line_height: 1.25,
                ..BlockStyle::body(family, 9.5)
            },
            paragraph: BlockStyle {
                spacing_after_pt: 3.0,
                line_height: 1.25,
                ..BlockStyle::body(family, 9.5)
            },
        }
    }

    /// Loads a sheet from a JSON file and validates it.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read style sheet {}", path.display()))?;
        let sheet: StyleSheet = serde_json::from_str(&raw)
            .with_context(|| format!("invalid style sheet JSON in {}", path.display()))?;
        sheet.validate()?;
        Ok(sheet)
    }

    /// Rejects values that would stall or invert the layout cursor.
    pub fn validate(&self) -> Result<()> {
        let styles = [
            ("name", &self.name),
            ("contact", &self.contact),
            ("section_header", &self.section_header),
            ("position", &self.position),
            ("bullet", &self.bullet),
            ("paragraph", &self.paragraph),
        ];
        for (kind, style) in styles {
            if !(style.size_pt > 0.0 && style.size_pt <= 96.0) {
                bail!("{kind}: size_pt must be in (0, 96], got {}", style.size_pt);
            }
            if !(style.line_height >= 1.0 && style.line_height <= 4.0) {
                bail!("{kind}: line_height must be in [1, 4], got {}", style.line_height);
            }
            if style.spacing_before_pt < 0.0 || style.spacing_after_pt < 0.0 || style.indent_pt < 0.0 {
                bail!("{kind}: spacing and indent must not be negative");
            }
        }
        Ok(())
    }
}

/// The named style sheets a process serves, built once at startup.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    sheets: Vec<StyleSheet>,
}

impl StyleCatalog {
    pub fn builtin() -> Self {
        Self {
            sheets: vec![StyleSheet::classic(), StyleSheet::compact()],
        }
    }

    /// Adds a sheet, replacing any existing sheet with the same label.
    pub fn with_sheet(mut self, sheet: StyleSheet) -> Self {
        self.sheets.retain(|s| s.label != sheet.label);
        self.sheets.push(sheet);
        self
    }

    pub fn get(&self, label: &str) -> Option<&StyleSheet> {
        self.sheets.iter().find(|s| s.label.eq_ignore_ascii_case(label))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.label.as_str()).collect()
    }
}
