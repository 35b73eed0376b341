//! Display text shared by every backend.
//!
//! Both outputs render exactly the strings produced here, which is what keeps
//! the PDF and DOCX text identical. Letters of any script are kept; only
//! pictographs, invisible format characters and controls are removed.

use std::sync::LazyLock;

use regex::Regex;

use crate::resume::model::BlockKind;

/// Prefix of every rendered bullet item.
pub const BULLET_MARKER: &str = "• ";

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*|__(.+?)__").unwrap());

static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Builds the display string for one unit of the given kind.
pub fn display_text(kind: BlockKind, raw: &str) -> String {
    let text = collapse_whitespace(&printable_text(&strip_inline_markdown(raw)));
    match kind {
        BlockKind::BulletList if !text.is_empty() => format!("{BULLET_MARKER}{text}"),
        BlockKind::BulletList => BULLET_MARKER.trim_end().to_string(),
        _ => text,
    }
}

/// `**b**`, `__b__` and `` `c` `` lose their markers; `[t](u)` becomes `t (u)`.
pub fn strip_inline_markdown(text: &str) -> String {
    let text = LINK.replace_all(text, "$1 ($2)");
    let text = STRONG.replace_all(&text, "$1$2");
    CODE.replace_all(&text, "$1").into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Contact glyphs become labels; pictographs, joiners, variation selectors and
/// control characters are dropped. Everything else is kept as written.
pub fn printable_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if let Some(label) = contact_label(c) {
            out.push_str(label);
            out.push(' ');
            continue;
        }
        match c {
            '\t' | '\n' | '\r' => out.push(' '),
            '\u{200B}'..='\u{200D}' | '\u{2060}' | '\u{FE00}'..='\u{FE0F}' | '\u{00AD}' => {}
            '\u{FFFE}' | '\u{FFFF}' => {}
            '★' | '☆' => out.push('*'),
            _ if c.is_control() || is_pictograph(c) => {}
            _ => out.push(c),
        }
    }
    out
}

/// True when every character has a WinAnsi code, so a base-14 font can show it.
pub fn is_winansi(text: &str) -> bool {
    text.chars().all(|c| winansi_byte(c).is_some())
}

fn contact_label(c: char) -> Option<&'static str> {
    let label = match c {
        '📧' | '✉' | '📨' => "Email:",
        '📞' | '☎' => "Phone:",
        '📱' => "Mobile:",
        '🌐' => "Web:",
        '🔗' => "Link:",
        '📍' => "Location:",
        '🏠' => "Address:",
        _ => return None,
    };
    Some(label)
}

fn is_pictograph(c: char) -> bool {
    matches!(c as u32,
        0x2300..=0x23FF      // misc technical
        | 0x25A0..=0x27BF    // shapes, misc symbols, dingbats
        | 0x2B00..=0x2BFF
        | 0x1F000..=0x1FAFF)
}

// ────────────────────────────────────────────────────────────────────────────
// WinAnsi (Windows-1252) code page
// ────────────────────────────────────────────────────────────────────────────

/// Unicode characters at WinAnsi codes 0x80..=0x9F. Undefined slots are `None`.
const WINANSI_HIGH: [Option<char>; 32] = [
    Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
    Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
    None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
    Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
];

/// Single-byte WinAnsi code for a character, if it has one.
pub fn winansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => WINANSI_HIGH
            .iter()
            .position(|slot| *slot == Some(c))
            .map(|i| 0x80 + i as u8),
    }
}

/// Encodes display text for a PDF string operand.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars().map(|c| winansi_byte(c).unwrap_or(b'?')).collect()
}
