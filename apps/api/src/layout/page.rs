//! Page geometry shared by both backends.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const POINTS_PER_INCH: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    /// US letter, 8.5" × 11".
    Letter,
    /// ISO A4, 210 × 297 mm.
    A4,
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions_pt(&self) -> (f32, f32) {
        match self {
            PageSize::Letter => (612.0, 792.0),
            PageSize::A4 => (595.28, 841.89),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" | "us-letter" => Ok(PageSize::Letter),
            "a4" => Ok(PageSize::A4),
            other => Err(format!("unknown page size '{other}' (expected letter or a4)")),
        }
    }
}

/// Paper size plus margins, all in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub size: PageSize,
    pub margin_top_pt: f32,
    pub margin_bottom_pt: f32,
    pub margin_left_pt: f32,
    pub margin_right_pt: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self::with_size(PageSize::Letter)
    }
}

impl PageSetup {
    /// The given paper size with 1" margins on all sides.
    pub fn with_size(size: PageSize) -> Self {
        Self {
            size,
            margin_top_pt: POINTS_PER_INCH,
            margin_bottom_pt: POINTS_PER_INCH,
            margin_left_pt: POINTS_PER_INCH,
            margin_right_pt: POINTS_PER_INCH,
        }
    }

    pub fn width_pt(&self) -> f32 {
        self.size.dimensions_pt().0
    }

    pub fn height_pt(&self) -> f32 {
        self.size.dimensions_pt().1
    }

    pub fn content_width_pt(&self) -> f32 {
        self.width_pt() - self.margin_left_pt - self.margin_right_pt
    }

    pub fn content_height_pt(&self) -> f32 {
        self.height_pt() - self.margin_top_pt - self.margin_bottom_pt
    }
}

/// Points to twentieths of a point, the unit OOXML page and spacing values use.
pub fn to_twips(pt: f32) -> i64 {
    (pt * 20.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_content_area() {
        let page = PageSetup::default();
        assert_eq!(page.content_width_pt(), 468.0);
        assert_eq!(page.content_height_pt(), 648.0);
    }

    #[test]
    fn test_page_size_parse() {
        assert_eq!("A4".parse::<PageSize>(), Ok(PageSize::A4));
        assert_eq!(" letter ".parse::<PageSize>(), Ok(PageSize::Letter));
        assert!("legal".parse::<PageSize>().is_err());
    }

    #[test]
    fn test_to_twips_matches_word_page_sizes() {
        let a4 = PageSetup::with_size(PageSize::A4);
        assert_eq!(to_twips(a4.width_pt()), 11906);
        assert_eq!(to_twips(a4.height_pt()), 16838);
        assert_eq!(to_twips(PageSetup::default().width_pt()), 12240);
    }
}
