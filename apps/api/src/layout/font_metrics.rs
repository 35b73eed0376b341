//! Static font-metric tables for the PDF base-14 fonts the renderer uses.
//!
//! Character widths are in em units (AFM widths / 1000). Base-14 faces only
//! ever carry WinAnsi-encodable text, so the ASCII tables cover almost
//! everything; the rest of Latin-1 falls back to the face's average width,
//! which is close enough for line breaking. The bundled TrueType face measures
//! from its own `hmtx` table (see `embedded_font`).
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

use crate::layout::embedded_font::embedded_font;

// ────────────────────────────────────────────────────────────────────────────
// Font faces
// ────────────────────────────────────────────────────────────────────────────

/// Font families available to style sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontFamily {
    /// Neo-grotesque sans-serif (Arial in the editable document).
    Helvetica,
    /// Classic serif (Times New Roman in the editable document).
    Times,
    /// Monospace (Courier New in the editable document).
    Courier,
    /// Bundled Unicode sans-serif, embedded into the PDF.
    DejaVuSans,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    Regular,
    Bold,
}

/// A concrete family + weight pair; one PDF font resource each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FontFace {
    pub family: FontFamily,
    pub weight: FontWeight,
}

impl FontFace {
    pub fn new(family: FontFamily, weight: FontWeight) -> Self {
        Self { family, weight }
    }

    pub fn is_bold(&self) -> bool {
        self.weight == FontWeight::Bold
    }

    /// Whether the PDF carries the font program (as opposed to a base-14 font).
    pub fn is_embedded(&self) -> bool {
        self.family == FontFamily::DejaVuSans
    }

    /// PostScript name of the matching standard Type1 font, or of the bundled face.
    pub fn base_font_name(&self) -> &'static str {
        match (self.family, self.weight) {
            (FontFamily::Helvetica, FontWeight::Regular) => "Helvetica",
            (FontFamily::Helvetica, FontWeight::Bold) => "Helvetica-Bold",
            (FontFamily::Times, FontWeight::Regular) => "Times-Roman",
            (FontFamily::Times, FontWeight::Bold) => "Times-Bold",
            (FontFamily::Courier, FontWeight::Regular) => "Courier",
            (FontFamily::Courier, FontWeight::Bold) => "Courier-Bold",
            (FontFamily::DejaVuSans, FontWeight::Regular) => "DejaVuSans",
            (FontFamily::DejaVuSans, FontWeight::Bold) => "DejaVuSans-Bold",
        }
    }

    /// Closest font installed with office suites, for the editable document.
    pub fn office_font_name(&self) -> &'static str {
        match self.family {
            FontFamily::Helvetica => "Arial",
            FontFamily::Times => "Times New Roman",
            FontFamily::Courier => "Courier New",
            FontFamily::DejaVuSans => "DejaVu Sans",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Horizontal advance lookup shared by the static tables and the bundled font.
pub trait TextMeasure: Sync {
    /// Advance of one character in em units.
    fn char_width_em(&self, c: char) -> f32;

    /// Width of a string in points at the given font size.
    fn measure_pt(&self, s: &str, size_pt: f32) -> f32 {
        s.chars().map(|c| self.char_width_em(c)).sum::<f32>() * size_pt
    }

    fn space_width_pt(&self, size_pt: f32) -> f32 {
        self.char_width_em(' ') * size_pt
    }
}

/// Static character-width table for a font face.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for characters outside printable ASCII.
    pub average_char_width: f32,
    pub space_width: f32,
}

impl TextMeasure for FontMetricTable {
    fn char_width_em(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    fn space_width_pt(&self, size_pt: f32) -> f32 {
        self.space_width * size_pt
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each, from the Adobe AFMs)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.54,
    space_width: 0.278,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.58,
    space_width: 0.278,
};

static TIMES_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.250, 0.333, 0.408, 0.500, 0.500, 0.833, 0.778, 0.180, 0.333, 0.333, 0.500, 0.564, 0.250, 0.333, 0.250, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.564, 0.564, 0.564, 0.444, 0.921,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.667, 0.667, 0.722, 0.611, 0.556, 0.722, 0.722, 0.333, 0.389, 0.722, 0.611, 0.889,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.722, 0.556, 0.722, 0.667, 0.556, 0.611, 0.722, 0.722, 0.944, 0.722, 0.722, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.469, 0.500, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.444, 0.500, 0.444, 0.500, 0.444, 0.333, 0.500, 0.500, 0.278, 0.278, 0.500, 0.278, 0.778,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.500, 0.500, 0.500, 0.500, 0.333, 0.389, 0.278, 0.500, 0.500, 0.722, 0.500, 0.500, 0.444,
        // {      |      }      ~
        0.480, 0.200, 0.480, 0.541,
    ],
    average_char_width: 0.47,
    space_width: 0.250,
};

static TIMES_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.250, 0.333, 0.555, 0.500, 0.500, 1.000, 0.833, 0.278, 0.333, 0.333, 0.500, 0.570, 0.250, 0.333, 0.250, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.570, 0.570, 0.570, 0.500, 0.930,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.778, 0.389, 0.500, 0.778, 0.667, 0.944,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.611, 0.778, 0.722, 0.556, 0.667, 0.722, 0.722, 1.000, 0.722, 0.722, 0.667,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.581, 0.500, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.500, 0.556, 0.444, 0.556, 0.444, 0.333, 0.500, 0.556, 0.278, 0.333, 0.556, 0.278, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.500, 0.556, 0.556, 0.444, 0.389, 0.333, 0.556, 0.500, 0.722, 0.500, 0.500, 0.444,
        // {      |      }      ~
        0.394, 0.220, 0.394, 0.520,
    ],
    average_char_width: 0.50,
    space_width: 0.250,
};

/// Courier is monospaced in both weights.
static COURIER_TABLE: FontMetricTable = FontMetricTable {
    widths: [0.600; 95],
    average_char_width: 0.600,
    space_width: 0.600,
};

fn base14_table(face: &FontFace) -> &'static FontMetricTable {
    match (face.family, face.weight) {
        (FontFamily::Helvetica, FontWeight::Regular) => &HELVETICA_TABLE,
        (FontFamily::Helvetica, FontWeight::Bold) => &HELVETICA_BOLD_TABLE,
        (FontFamily::Times, FontWeight::Regular) => &TIMES_TABLE,
        (FontFamily::Times, FontWeight::Bold) => &TIMES_BOLD_TABLE,
        (FontFamily::Courier, _) => &COURIER_TABLE,
        // Metrically close stand-in if the bundled font failed to load.
        (FontFamily::DejaVuSans, FontWeight::Regular) => &HELVETICA_TABLE,
        (FontFamily::DejaVuSans, FontWeight::Bold) => &HELVETICA_BOLD_TABLE,
    }
}

/// Returns the metrics for a font face.
pub fn get_metrics(face: &FontFace) -> &'static dyn TextMeasure {
    if face.is_embedded() {
        if let Some(font) = embedded_font(face.weight) {
            return font;
        }
    }
    base14_table(face)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn helvetica() -> &'static FontMetricTable {
        base14_table(&FontFace::new(FontFamily::Helvetica, FontWeight::Regular))
    }

    #[test]
    fn test_measure_empty_returns_zero() {
        assert_eq!(helvetica().measure_pt("", 1.0), 0.0);
    }

    #[test]
    fn test_measure_single_space() {
        let width = helvetica().measure_pt(" ", 1.0);
        assert!(
            (width - 0.278).abs() < 1e-4,
            "space width should be 0.278, got {width}"
        );
    }

    #[test]
    fn test_measure_ascii_characters() {
        // "Rust" = R(0.722) + u(0.556) + s(0.500) + t(0.278) = 2.056
        let width = helvetica().measure_pt("Rust", 1.0);
        assert!(
            (width - 2.056).abs() < 1e-3,
            "Rust width should be ~2.056, got {width}"
        );
    }

    #[test]
    fn test_measure_non_ascii_falls_back() {
        let metrics = helvetica();
        let width = metrics.measure_pt("é", 1.0);
        assert!(
            (width - metrics.average_char_width).abs() < 1e-4,
            "non-ASCII should use average_char_width"
        );
    }

    #[test]
    fn test_measure_pt_scales_with_size() {
        let metrics = helvetica();
        let at_10 = metrics.measure_pt("Rust", 10.0);
        let at_20 = metrics.measure_pt("Rust", 20.0);
        assert!((at_20 - 2.0 * at_10).abs() < 1e-3);
    }

    #[test]
    fn test_bold_wider_than_regular() {
        let text = "Architected distributed caching layer";
        let regular = get_metrics(&FontFace::new(FontFamily::Times, FontWeight::Regular));
        let bold = get_metrics(&FontFace::new(FontFamily::Times, FontWeight::Bold));
        assert!(bold.measure_pt(text, 12.0) > regular.measure_pt(text, 12.0));
    }

    #[test]
    fn test_courier_is_monospaced() {
        let courier = base14_table(&FontFace::new(FontFamily::Courier, FontWeight::Bold));
        assert_eq!(courier.measure_pt("iiii", 1.0), courier.measure_pt("WWWW", 1.0));
    }

    #[test]
    fn test_base_font_names() {
        assert_eq!(
            FontFace::new(FontFamily::Times, FontWeight::Bold).base_font_name(),
            "Times-Bold"
        );
        assert_eq!(
            FontFace::new(FontFamily::Helvetica, FontWeight::Regular).office_font_name(),
            "Arial"
        );
        assert_eq!(
            FontFace::new(FontFamily::DejaVuSans, FontWeight::Bold).base_font_name(),
            "DejaVuSans-Bold"
        );
    }

    #[test]
    fn test_embedded_face_measures_with_its_own_widths() {
        let face = FontFace::new(FontFamily::DejaVuSans, FontWeight::Regular);
        assert!(face.is_embedded());
        let metrics = get_metrics(&face);
        // Cyrillic letters are not all the same width in a proportional font.
        assert_ne!(metrics.measure_pt("ш", 12.0), metrics.measure_pt("г", 12.0));
        assert!(metrics.space_width_pt(12.0) > 0.0);
    }
}
