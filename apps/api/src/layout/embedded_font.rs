//! Bundled TrueType font used for text the base-14 fonts cannot encode.
//!
//! DejaVu Sans covers Latin, Greek, Cyrillic and a good part of the symbol
//! blocks. Characters it lacks still keep their own code in the PDF (and their
//! ToUnicode entry) and are drawn with the missing-glyph box.

use std::collections::HashMap;
use std::sync::LazyLock;

use tracing::warn;
use ttf_parser::{Face, GlyphId};

use crate::layout::font_metrics::{FontWeight, TextMeasure};

static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

static REGULAR: LazyLock<Option<EmbeddedFont>> = LazyLock::new(|| EmbeddedFont::parse(DEJAVU_SANS));
static BOLD: LazyLock<Option<EmbeddedFont>> = LazyLock::new(|| EmbeddedFont::parse(DEJAVU_SANS_BOLD));

/// Parsed font program plus the tables the PDF writer and line breaker need.
/// Widths are in 1/1000 em.
#[derive(Debug)]
pub struct EmbeddedFont {
    data: &'static [u8],
    pub postscript_name: String,
    glyphs: HashMap<char, u16>,
    advances: Vec<u16>,
    pub ascent: i16,
    pub descent: i16,
    pub cap_height: i16,
    pub bbox: (i16, i16, i16, i16),
}

impl EmbeddedFont {
    fn parse(data: &'static [u8]) -> Option<Self> {
        let face = match Face::parse(data, 0) {
            Ok(face) => face,
            Err(e) => {
                warn!(error = %e, "bundled font could not be parsed");
                return None;
            }
        };

        let units = f32::from(face.units_per_em().max(1));
        let scale = |v: i16| (f32::from(v) * 1000.0 / units).round() as i16;

        let glyphs = (0x20..=0xFFFF_u32)
            .filter_map(char::from_u32)
            .filter_map(|c| face.glyph_index(c).map(|g| (c, g.0)))
            .collect();
        let advances = (0..face.number_of_glyphs())
            .map(|g| {
                let advance = face.glyph_hor_advance(GlyphId(g)).unwrap_or(0);
                (f32::from(advance) * 1000.0 / units).round() as u16
            })
            .collect();

        let postscript_name = face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
            .unwrap_or_else(|| "DejaVuSans".to_string());

        let bbox = face.global_bounding_box();
        Some(Self {
            data,
            postscript_name,
            glyphs,
            advances,
            ascent: scale(face.ascender()),
            descent: scale(face.descender()),
            cap_height: scale(face.capital_height().unwrap_or(face.ascender())),
            bbox: (scale(bbox.x_min), scale(bbox.y_min), scale(bbox.x_max), scale(bbox.y_max)),
        })
    }

    /// Raw font program for `FontFile2`.
    pub fn data(&self) -> &'static [u8] {
        self.data
    }

    /// Glyph for a character; 0 (`.notdef`) when the font lacks it.
    pub fn glyph_id(&self, c: char) -> u16 {
        self.glyphs.get(&c).copied().unwrap_or(0)
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    pub fn glyph_width(&self, glyph: u16) -> u16 {
        self.advances.get(usize::from(glyph)).copied().unwrap_or(0)
    }
}

impl TextMeasure for EmbeddedFont {
    fn char_width_em(&self, c: char) -> f32 {
        f32::from(self.glyph_width(self.glyph_id(c))) / 1000.0
    }
}

/// The bundled face for a weight, or `None` if it failed to parse.
pub fn embedded_font(weight: FontWeight) -> Option<&'static EmbeddedFont> {
    match weight {
        FontWeight::Regular => REGULAR.as_ref(),
        FontWeight::Bold => BOLD.as_ref(),
    }
}
