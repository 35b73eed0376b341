//! Normalizer: rewrites free-form résumé markdown into the canonical dialect.
//!
//! Every input line is trimmed and run through an ordered rule table (first match
//! wins). The classified stream is then re-spelled with exactly one spelling per
//! line kind:
//!
//! ```text
//! # text      Name
//! ## text     SectionHeader
//! ### text    PositionHeader
//! - text      BulletItem
//! a | b | c   ContactEntry (all contact lines merged, placed right after the name)
//! text        Paragraph
//! ```
//!
//! Normalization never fails. Lines that are not valid UTF-8 are decoded lossily
//! and always become paragraphs. The output is a fixed point:
//! `normalize(&normalize(x)) == normalize(x)`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Joins merged contact entries on the canonical contact line.
pub const CONTACT_SEPARATOR: &str = " | ";

/// Leading glyphs that mark a line as contact information.
pub const CONTACT_GLYPHS: &[char] = &['📧', '✉', '📞', '☎', '📱', '🌐', '🔗', '📍', '🏠'];

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*?)(?:\s+#+)?$").unwrap());

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*+•]\s+(.+)$").unwrap());

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").unwrap());

static NAME_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{Lu}[\p{Ll}'’.-]+\s+\p{Lu}").unwrap());

static NAME_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:Name|PhD)\b").unwrap());

// A dash break must open with `--`: `- ` followed by dashes is how a bullet
// whose payload is dashes gets spelled.
static THEMATIC_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:--[ \t]*(?:-[ \t]*)+|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
});

// ────────────────────────────────────────────────────────────────────────────
// Line kinds
// ────────────────────────────────────────────────────────────────────────────

/// The fixed set of line kinds a résumé line can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Name,
    ContactEntry,
    SectionHeader,
    PositionHeader,
    BulletItem,
    BlankLine,
    Paragraph,
}

/// A classified line with its trimmed payload (markers already stripped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalLine {
    pub kind: LineKind,
    pub text: String,
}

impl CanonicalLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn blank() -> Self {
        Self::new(LineKind::BlankLine, String::new())
    }

    /// Spells the line in the canonical dialect.
    pub fn to_canonical(&self) -> String {
        match self.kind {
            LineKind::Name => format!("# {}", self.text),
            LineKind::SectionHeader => format!("## {}", self.text),
            LineKind::PositionHeader => format!("### {}", self.text),
            LineKind::BulletItem => format!("- {}", self.text),
            LineKind::BlankLine => String::new(),
            LineKind::ContactEntry | LineKind::Paragraph => self.text.clone(),
        }
    }

    /// Reads back one line of canonical text. This is the contract the model
    /// builder relies on: heading level 1 is a name, level 2 a section, deeper
    /// levels a position header.
    ///
    /// No document context is consulted, so a second `# ` line still parses as
    /// `Name`; the builder is responsible for demoting it.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let ctx = RuleContext::default();
        if let Some(caps) = HEADING.captures(line) {
            let text = caps[2].trim();
            if !text.is_empty() {
                let kind = match caps[1].len() {
                    1 => LineKind::Name,
                    2 => LineKind::SectionHeader,
                    _ => LineKind::PositionHeader,
                };
                return Self::new(kind, text);
            }
        }
        classify_line(line, &ctx).1
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rule table
// ────────────────────────────────────────────────────────────────────────────

/// Document-level facts a rule may consult.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleContext {
    /// No non-blank line of any kind has been seen yet.
    pub first_nonblank: bool,
    /// A heading may still become the name: no name emitted yet and nothing
    /// but contact lines precede this line.
    pub name_slot_open: bool,
}

type Rule = fn(&str, &RuleContext) -> Option<CanonicalLine>;

/// Classification rules in precedence order. `Paragraph` is the fallback when
/// none matches.
pub const RULES: &[(&str, Rule)] = &[
    ("structural_noise", rule_structural_noise),
    ("blank", rule_blank),
    ("heading", rule_heading),
    ("bold_position", rule_bold_position),
    ("contact", rule_contact),
    ("bullet", rule_bullet),
];

/// Classifies a single trimmed line. Returns the name of the matching rule
/// (`"paragraph"` for the fallback) alongside the result.
pub fn classify_line(line: &str, ctx: &RuleContext) -> (&'static str, CanonicalLine) {
    RULES
        .iter()
        .find_map(|(name, rule)| rule(line, ctx).map(|classified| (*name, classified)))
        .unwrap_or_else(|| ("paragraph", CanonicalLine::new(LineKind::Paragraph, line)))
}

/// Code fences and thematic breaks carry no résumé content.
fn rule_structural_noise(line: &str, _ctx: &RuleContext) -> Option<CanonicalLine> {
    let is_fence = line.starts_with("```") || line.starts_with("~~~");
    (is_fence || THEMATIC_BREAK.is_match(line)).then(CanonicalLine::blank)
}

fn rule_blank(line: &str, _ctx: &RuleContext) -> Option<CanonicalLine> {
    line.is_empty().then(CanonicalLine::blank)
}

fn rule_heading(line: &str, ctx: &RuleContext) -> Option<CanonicalLine> {
    let caps = HEADING.captures(line)?;
    let level = caps[1].len();
    let text = caps[2].trim();
    if text.is_empty() {
        return None;
    }

    let kind = if level <= 2 && ctx.name_slot_open && (ctx.first_nonblank || is_name_like(text)) {
        LineKind::Name
    } else if level >= 3 {
        LineKind::PositionHeader
    } else {
        LineKind::SectionHeader
    };
    Some(CanonicalLine::new(kind, text))
}

fn rule_bold_position(line: &str, _ctx: &RuleContext) -> Option<CanonicalLine> {
    ["**", "__"].into_iter().find_map(|marker| {
        let inner = line.strip_prefix(marker)?.strip_suffix(marker)?.trim();
        (!inner.is_empty() && !inner.contains(marker))
            .then(|| CanonicalLine::new(LineKind::PositionHeader, inner))
    })
}

fn rule_contact(line: &str, _ctx: &RuleContext) -> Option<CanonicalLine> {
    is_contact(line).then(|| CanonicalLine::new(LineKind::ContactEntry, line))
}

fn rule_bullet(line: &str, _ctx: &RuleContext) -> Option<CanonicalLine> {
    let caps = BULLET.captures(line)?;
    Some(CanonicalLine::new(LineKind::BulletItem, caps[1].trim()))
}

/// Two leading capitalised word tokens, or the literal token `Name` / `PhD`.
///
/// Known to be imprecise: a section title shaped like "Work History" matches.
pub fn is_name_like(text: &str) -> bool {
    NAME_LIKE.is_match(text) || NAME_TOKEN.is_match(text)
}

/// A contact glyph prefix, or an e-mail address anywhere in the line.
pub fn is_contact(line: &str) -> bool {
    line.starts_with(CONTACT_GLYPHS) || EMAIL.is_match(line)
}

// ────────────────────────────────────────────────────────────────────────────
// Normalization
// ────────────────────────────────────────────────────────────────────────────

/// One physical input line.
enum SourceLine<'a> {
    Text(&'a str),
    /// Bytes that were not valid UTF-8, already lossily decoded.
    Undecodable(String),
}

/// Normalizes résumé text into canonical markdown.
pub fn normalize(raw: &str) -> String {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    normalize_lines(raw.split('\n').map(SourceLine::Text))
}

/// Normalizes a byte buffer of unknown encoding. Lines that fail UTF-8
/// decoding are kept as paragraphs of lossily decoded text.
pub fn normalize_bytes(raw: &[u8]) -> String {
    let raw = raw.strip_prefix(b"\xef\xbb\xbf").unwrap_or(raw);
    normalize_lines(raw.split(|b| *b == b'\n').map(|bytes| {
        match std::str::from_utf8(bytes) {
            Ok(text) => SourceLine::Text(text),
            Err(_) => SourceLine::Undecodable(String::from_utf8_lossy(bytes).into_owned()),
        }
    }))
}

fn normalize_lines<'a>(lines: impl Iterator<Item = SourceLine<'a>>) -> String {
    let mut body: Vec<CanonicalLine> = Vec::new();
    let mut contacts: Vec<String> = Vec::new();
    let mut ctx = RuleContext {
        first_nonblank: true,
        name_slot_open: true,
    };

    for source in lines {
        let (rule, classified) = match source {
            SourceLine::Text(text) => classify_line(text.trim(), &ctx),
            SourceLine::Undecodable(text) => {
                let text = text.trim();
                if text.is_empty() {
                    ("blank", CanonicalLine::blank())
                } else {
                    ("undecodable", CanonicalLine::new(LineKind::Paragraph, text))
                }
            }
        };
        trace!(rule, kind = ?classified.kind, "classified line");

        match classified.kind {
            LineKind::BlankLine => {
                body.push(classified);
                continue;
            }
            LineKind::ContactEntry => contacts.push(classified.text),
            _ => {
                ctx.name_slot_open = false;
                body.push(classified);
            }
        }
        ctx.first_nonblank = false;
    }

    if !contacts.is_empty() {
        let at = match body.iter().position(|l| l.kind != LineKind::BlankLine) {
            Some(i) if body[i].kind == LineKind::Name => i + 1,
            _ => 0,
        };
        let merged = CanonicalLine::new(LineKind::ContactEntry, contacts.join(CONTACT_SEPARATOR));
        body.insert(at, CanonicalLine::blank());
        body.insert(at, merged);
    }

    let canonical = assemble(&body);
    debug!(
        lines = body.len(),
        contacts = contacts.len(),
        "normalized résumé text"
    );
    canonical
}

/// Spells the classified stream, collapsing blank runs and dropping leading
/// and trailing blank lines.
fn assemble(body: &[CanonicalLine]) -> String {
    let mut out: Vec<String> = Vec::with_capacity(body.len());
    let mut previous_blank = true;
    for line in body {
        let is_blank = line.kind == LineKind::BlankLine;
        if is_blank && previous_blank {
            continue;
        }
        out.push(line.to_canonical());
        previous_blank = is_blank;
    }
    while out.last().is_some_and(|l| l.is_empty()) {
        out.pop();
    }
    out.join("\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
