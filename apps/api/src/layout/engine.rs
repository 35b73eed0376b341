//! Shared layout engine: flattens a document model into text units, wraps them
//! with the static font metrics and paginates them onto fixed-size pages.
//!
//! Both backends consume the same `TextUnit`s. The PDF backend additionally uses
//! the computed `DocumentLayout`; the DOCX backend leaves line breaking to the
//! word processor.
//!
//! Coordinates in a `DocumentLayout` are in points, measured from the top-left
//! corner of the page.

use serde::Serialize;
use tracing::debug;

use crate::layout::font_metrics::{get_metrics, FontFace, FontFamily, TextMeasure};
use crate::layout::page::PageSetup;
use crate::layout::style::{Alignment, BlockStyle, StyleSheet};
use crate::render::text::{display_text, is_winansi, BULLET_MARKER};
use crate::resume::model::{Block, BlockKind, DocumentModel, SectionChild};
use crate::resume::normalizer::CONTACT_SEPARATOR;

/// Gap between a rule and the text it sits against.
pub const RULE_GAP_PT: f32 = 3.0;
pub const RULE_THICKNESS_PT: f32 = 0.75;

/// Baseline position inside a line box, as a fraction of the font size.
const ASCENT_RATIO: f32 = 0.8;

// ────────────────────────────────────────────────────────────────────────────
// Flattening
// ────────────────────────────────────────────────────────────────────────────

/// One paragraph-equivalent: the unit both backends emit and extraction reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextUnit {
    pub kind: BlockKind,
    pub text: String,
}

impl TextUnit {
    fn new(kind: BlockKind, raw: &str) -> Self {
        Self {
            kind,
            text: display_text(kind, raw),
        }
    }

    /// Headers stay on the same page as the unit that follows them.
    pub fn keeps_with_next(&self) -> bool {
        matches!(self.kind, BlockKind::SectionHeader | BlockKind::Position)
    }

    /// The sheet's face, or the bundled Unicode face of the same weight when a
    /// base-14 font cannot encode the text.
    pub fn face(&self, style: &BlockStyle) -> FontFace {
        let face = style.face();
        if face.is_embedded() || is_winansi(&self.text) {
            face
        } else {
            FontFace::new(FontFamily::DejaVuSans, face.weight)
        }
    }
}

/// Flattens the model in block order; each bullet item is its own unit.
pub fn flatten(model: &DocumentModel) -> Vec<TextUnit> {
    let mut units = Vec::new();
    for block in &model.blocks {
        match block {
            Block::Name(name) => units.push(TextUnit::new(block.kind(), name)),
            Block::Contact(entries) => {
                units.push(TextUnit::new(block.kind(), &entries.join(CONTACT_SEPARATOR)))
            }
            Block::Section(section) => {
                units.push(TextUnit::new(block.kind(), &section.title));
                for child in &section.children {
                    push_child(&mut units, child);
                }
            }
            Block::Position(text) => push_child(&mut units, &SectionChild::Position(text.clone())),
            Block::BulletList(items) => {
                units.extend(items.iter().map(|i| TextUnit::new(block.kind(), i)))
            }
            Block::Paragraph(text) => units.push(TextUnit::new(block.kind(), text)),
        }
    }
    units
}

fn push_child(units: &mut Vec<TextUnit>, child: &SectionChild) {
    match child {
        SectionChild::Position(text) => units.push(TextUnit::new(BlockKind::Position, text)),
        SectionChild::BulletList(items) => {
            units.extend(items.iter().map(|i| TextUnit::new(BlockKind::BulletList, i)))
        }
        SectionChild::Paragraph(text) => units.push(TextUnit::new(BlockKind::Paragraph, text)),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Line wrapping
// ────────────────────────────────────────────────────────────────────────────

/// Greedy word wrap against `max_width_pt`. A word wider than the line keeps a
/// line of its own and overflows it. Always returns at least one line.
pub fn wrap_text(text: &str, metrics: &dyn TextMeasure, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0_f32;
    let space_width = metrics.space_width_pt(size_pt);

    for word in text.split_whitespace() {
        let word_width = metrics.measure_pt(word, size_pt);
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space_width + word_width > max_width_pt {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space_width + word_width;
        }
    }
    lines.push(current);
    lines
}

/// A wrapped line with its horizontal offset from the content-area left edge.
#[derive(Debug, Clone, PartialEq)]
struct WrappedLine {
    text: String,
    offset_pt: f32,
    width_pt: f32,
}

fn wrap_unit(unit: &TextUnit, style: &BlockStyle, content_width_pt: f32) -> Vec<WrappedLine> {
    let metrics = get_metrics(&unit.face(style));
    let size = style.size_pt;

    let hanging = match unit.kind {
        BlockKind::BulletList => unit.text.strip_prefix(BULLET_MARKER),
        _ => None,
    };
    let Some(body) = hanging else {
        let available = content_width_pt - style.indent_pt;
        return wrap_text(&unit.text, metrics, size, available)
            .into_iter()
            .map(|text| WrappedLine {
                width_pt: metrics.measure_pt(&text, size),
                text,
                offset_pt: style.indent_pt,
            })
            .collect();
    };

    let marker_width = metrics.measure_pt(BULLET_MARKER, size);
    let available = content_width_pt - style.indent_pt - marker_width;
    wrap_text(body, metrics, size, available)
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let (text, offset_pt) = if i == 0 {
                (format!("{BULLET_MARKER}{line}"), style.indent_pt)
            } else {
                (line, style.indent_pt + marker_width)
            };
            WrappedLine {
                width_pt: metrics.measure_pt(&text, size),
                text,
                offset_pt,
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Pagination
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedLine {
    pub text: String,
    pub x_pt: f32,
    pub baseline_pt: f32,
    /// Extra space added to each space character (justified lines only).
    pub word_spacing_pt: f32,
}

/// A unit (or the part of it that landed on one page).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedUnit {
    pub unit_index: usize,
    pub kind: BlockKind,
    pub face: FontFace,
    /// True for the fragment of a split unit that continues from an earlier page.
    pub continuation: bool,
    pub lines: Vec<PlacedLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleLine {
    pub x1_pt: f32,
    pub x2_pt: f32,
    pub y_pt: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageLayout {
    pub units: Vec<PlacedUnit>,
    pub rules: Vec<RuleLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub setup: PageSetup,
    /// Never empty: an empty model lays out as one blank page.
    pub pages: Vec<PageLayout>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Running vertical cursor over the content area of the current page.
struct Paginator<'a> {
    setup: &'a PageSetup,
    pages: Vec<PageLayout>,
    /// Distance already consumed below the top margin.
    cursor_pt: f32,
}

impl<'a> Paginator<'a> {
    fn new(setup: &'a PageSetup) -> Self {
        Self {
            setup,
            pages: vec![PageLayout::default()],
            cursor_pt: 0.0,
        }
    }

    fn at_page_top(&self) -> bool {
        self.cursor_pt == 0.0
    }

    fn remaining_pt(&self) -> f32 {
        self.setup.content_height_pt() - self.cursor_pt
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.cursor_pt = 0.0;
    }

    fn page(&mut self) -> &mut PageLayout {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn rule(&mut self) {
        let y_pt = self.setup.margin_top_pt + self.cursor_pt + RULE_GAP_PT;
        let x1_pt = self.setup.margin_left_pt;
        let x2_pt = x1_pt + self.setup.content_width_pt();
        self.page().rules.push(RuleLine { x1_pt, x2_pt, y_pt });
        self.cursor_pt += 2.0 * RULE_GAP_PT;
    }
}

fn rule_height(enabled: bool) -> f32 {
    if enabled {
        2.0 * RULE_GAP_PT
    } else {
        0.0
    }
}

/// Height of a unit from its first line box to the end of its trailing rule,
/// excluding spacing.
fn body_height(style: &BlockStyle, line_count: usize) -> f32 {
    rule_height(style.rule_before) + line_count as f32 * style.leading_pt() + rule_height(style.rule_after)
}

/// Height of the unit at `start` plus every unit chained to it by
/// keep-with-next, ending with the first unit that is not a header. An oversized
/// trailing unit only contributes its first line.
fn keep_group_height(
    start: usize,
    units: &[TextUnit],
    wrapped: &[Vec<WrappedLine>],
    sheet: &StyleSheet,
    page_height_pt: f32,
) -> f32 {
    let mut total = 0.0;
    for j in start..units.len() {
        let style = sheet.get(units[j].kind);
        let body = body_height(style, wrapped[j].len());
        if j > start {
            total += style.spacing_before_pt;
            if body > page_height_pt {
                return total + rule_height(style.rule_before) + style.leading_pt();
            }
        }
        total += body;
        if !units[j].keeps_with_next() {
            break;
        }
        total += style.spacing_after_pt;
    }
    total
}

/// Lays out the model on pages. Total: every unit is placed somewhere.
pub fn layout(model: &DocumentModel, sheet: &StyleSheet, setup: &PageSetup) -> DocumentLayout {
    let units = flatten(model);
    let content_width = setup.content_width_pt();
    let wrapped: Vec<Vec<WrappedLine>> = units
        .iter()
        .map(|u| wrap_unit(u, sheet.get(u.kind), content_width))
        .collect();

    let mut pager = Paginator::new(setup);

    for (index, unit) in units.iter().enumerate() {
        let style = sheet.get(unit.kind);
        let lines = &wrapped[index];
        let leading = style.leading_pt();
        let face = unit.face(style);

        let oversized = body_height(style, lines.len()) > setup.content_height_pt();
        let needed = if oversized {
            rule_height(style.rule_before) + leading
        } else {
            keep_group_height(index, &units, &wrapped, sheet, setup.content_height_pt())
        };

        let mut spacing_before = style.spacing_before_pt;
        if pager.at_page_top() {
            spacing_before = 0.0;
        } else if spacing_before + needed > pager.remaining_pt() {
            debug!(unit = index, page = pager.pages.len() + 1, "unit moved to a new page");
            pager.new_page();
            spacing_before = 0.0;
        }
        pager.cursor_pt += spacing_before;

        if style.rule_before {
            pager.rule();
        }

        let available = content_width - style.indent_pt;
        let mut fragment = PlacedUnit {
            unit_index: index,
            kind: unit.kind,
            face,
            continuation: false,
            lines: Vec::new(),
        };
        let last_line = lines.len().saturating_sub(1);
        for (i, line) in lines.iter().enumerate() {
            // Oversized unit: split line-wise, keeping at least one line per page.
            if !fragment.lines.is_empty() && leading > pager.remaining_pt() {
                let done = std::mem::replace(
                    &mut fragment,
                    PlacedUnit {
                        unit_index: index,
                        kind: unit.kind,
                        face,
                        continuation: true,
                        lines: Vec::new(),
                    },
                );
                pager.page().units.push(done);
                pager.new_page();
            }

            let x_offset = match style.alignment {
                Alignment::Center => ((content_width - line.width_pt) / 2.0).max(0.0),
                Alignment::Left | Alignment::Justify => line.offset_pt,
            };
            let word_spacing_pt = match style.alignment {
                Alignment::Justify if i < last_line => {
                    let spaces = line.text.matches(' ').count();
                    let slack = available - (line.offset_pt - style.indent_pt) - line.width_pt;
                    if spaces > 0 && slack > 0.0 {
                        slack / spaces as f32
                    } else {
                        0.0
                    }
                }
                _ => 0.0,
            };
            fragment.lines.push(PlacedLine {
                text: line.text.clone(),
                x_pt: setup.margin_left_pt + x_offset,
                baseline_pt: setup.margin_top_pt
                    + pager.cursor_pt
                    + (leading - style.size_pt) / 2.0
                    + ASCENT_RATIO * style.size_pt,
                word_spacing_pt,
            });
            pager.cursor_pt += leading;
        }
        pager.page().units.push(fragment);

        if style.rule_after {
            pager.rule();
        }
        pager.cursor_pt += style.spacing_after_pt;
    }

    debug!(units = units.len(), pages = pager.pages.len(), "layout complete");
    DocumentLayout {
        setup: *setup,
        pages: pager.pages,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::FontWeight;
    use crate::layout::page::PageSize;
    use crate::resume::builder::build;
    use crate::resume::normalizer::normalize;

    fn scenario() -> DocumentModel {
        build(&normalize(
            "# Jane Smith\n📧 jane@x.com\n## Experience\n**Engineer — Acme**\n- Built system X\n- Improved Y by 20%",
        ))
    }

    fn long_resume(bullets: usize) -> DocumentModel {
        let mut raw = String::from("# Jane Smith\n📧 jane@x.com\n## Experience\n");
        for i in 0..bullets {
            if i % 8 == 0 {
                raw.push_str(&format!("### Engineer, team {i}\n"));
            }
            raw.push_str(&format!(
                "- Delivered project number {i} which improved throughput across several teams by a measurable margin\n"
            ));
        }
        build(&normalize(&raw))
    }

    fn placed_text(layout: &DocumentLayout) -> Vec<(usize, String)> {
        layout
            .pages
            .iter()
            .flat_map(|p| &p.units)
            .flat_map(|u| u.lines.iter().map(move |l| (u.unit_index, l.text.clone())))
            .collect()
    }

    #[test]
    fn test_flatten_scenario() {
        let units = flatten(&scenario());
        let kinds: Vec<BlockKind> = units.iter().map(|u| u.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Name,
                BlockKind::Contact,
                BlockKind::SectionHeader,
                BlockKind::Position,
                BlockKind::BulletList,
                BlockKind::BulletList,
            ]
        );
        assert_eq!(units[1].text, "Email: jane@x.com");
        assert_eq!(units[3].text, "Engineer — Acme");
        assert_eq!(units[4].text, "• Built system X");
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let metrics = get_metrics(&FontFace::new(FontFamily::Helvetica, FontWeight::Regular));
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let lines = wrap_text(text, metrics, 12.0, 120.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(metrics.measure_pt(line, 12.0) <= 120.0, "line too wide: {line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_text_overlong_word_gets_own_line() {
        let metrics = get_metrics(&FontFace::new(FontFamily::Courier, FontWeight::Regular));
        let lines = wrap_text("a https://example.com/very/long/path b", metrics, 10.0, 60.0);
        assert_eq!(lines, vec!["a", "https://example.com/very/long/path", "b"]);
        assert_eq!(wrap_text("", metrics, 10.0, 60.0), vec![String::new()]);
    }

    #[test]
    fn test_empty_model_is_one_blank_page() {
        let layout = layout(&DocumentModel::default(), &StyleSheet::default(), &PageSetup::default());
        assert_eq!(layout.page_count(), 1);
        assert!(layout.pages[0].units.is_empty());
    }

    #[test]
    fn test_scenario_fits_one_page_with_rules() {
        let layout = layout(&scenario(), &StyleSheet::classic(), &PageSetup::default());
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.pages[0].units.len(), 6);
        // Classic draws a rule under the name and under each section header.
        assert_eq!(layout.pages[0].rules.len(), 2);
        let name = &layout.pages[0].units[0].lines[0];
        assert!(name.x_pt > 72.0, "name should be centred");
    }

    #[test]
    fn test_long_resume_paginates_without_losing_lines() {
        let model = long_resume(60);
        let setup = PageSetup::with_size(PageSize::A4);
        let layout = layout(&model, &StyleSheet::classic(), &setup);
        assert!(layout.page_count() > 1);

        let units = flatten(&model);
        let placed = placed_text(&layout);
        for (index, unit) in units.iter().enumerate() {
            let joined: Vec<String> = placed
                .iter()
                .filter(|(i, _)| *i == index)
                .map(|(_, t)| t.clone())
                .collect();
            assert_eq!(joined.join(" "), unit.text);
        }

        let bottom = setup.height_pt() - setup.margin_bottom_pt;
        for page in &layout.pages {
            for unit in &page.units {
                assert!(!unit.continuation, "no unit here is taller than a page");
                for line in &unit.lines {
                    assert!(line.baseline_pt > setup.margin_top_pt && line.baseline_pt < bottom);
                }
            }
        }
    }

    #[test]
    fn test_header_is_kept_with_next_unit() {
        let model = long_resume(60);
        let layout = layout(&model, &StyleSheet::classic(), &PageSetup::default());
        for page in &layout.pages {
            if let Some(last) = page.units.last() {
                assert!(
                    !matches!(last.kind, BlockKind::SectionHeader | BlockKind::Position),
                    "header stranded at page bottom"
                );
            }
        }
    }

    #[test]
    fn test_oversized_unit_is_split_across_pages() {
        let paragraph = "lorem ipsum dolor sit amet ".repeat(900);
        let model = build(&format!("## Summary\n{paragraph}"));
        let layout = layout(&model, &StyleSheet::classic(), &PageSetup::default());
        assert!(layout.page_count() >= 2);
        let fragments: Vec<&PlacedUnit> = layout
            .pages
            .iter()
            .flat_map(|p| &p.units)
            .filter(|u| u.kind == BlockKind::Paragraph)
            .collect();
        assert!(fragments.len() >= 2);
        assert!(!fragments[0].continuation);
        assert!(fragments[1..].iter().all(|f| f.continuation));
    }

    #[test]
    fn test_justified_lines_get_word_spacing_except_last() {
        let text = "word ".repeat(120);
        let model = build(&format!("## Summary\n{text}"));
        let layout = layout(&model, &StyleSheet::classic(), &PageSetup::default());
        let paragraph = layout.pages[0]
            .units
            .iter()
            .find(|u| u.kind == BlockKind::Paragraph)
            .unwrap();
        let (last, rest) = paragraph.lines.split_last().unwrap();
        assert!(rest.iter().all(|l| l.word_spacing_pt >= 0.0));
        assert!(rest.iter().any(|l| l.word_spacing_pt > 0.0));
        assert_eq!(last.word_spacing_pt, 0.0);
    }

    #[test]
    fn test_bullet_continuation_lines_hang_past_marker() {
        let model = build(&format!("- {}", "alpha beta gamma delta ".repeat(12)));
        let layout = layout(&model, &StyleSheet::classic(), &PageSetup::default());
        let bullet = &layout.pages[0].units[0];
        assert!(bullet.lines.len() > 1);
        assert!(bullet.lines[0].text.starts_with(BULLET_MARKER));
        assert!(bullet.lines[1].x_pt > bullet.lines[0].x_pt);
    }

    #[test]
    fn test_non_latin_units_switch_to_the_bundled_face() {
        let model = build(&normalize(
            "# Дмитрий Пискарев\n## Experience\n- Разработал систему\n- Built X",
        ));
        let sheet = StyleSheet::classic();
        let layout = layout(&model, &sheet, &PageSetup::default());
        let faces: Vec<(String, FontFace)> = layout.pages[0]
            .units
            .iter()
            .map(|u| (u.lines[0].text.clone(), u.face))
            .collect();
        assert_eq!(faces[0].1, FontFace::new(FontFamily::DejaVuSans, FontWeight::Bold));
        assert_eq!(faces[1].1, sheet.section_header.face());
        assert_eq!(faces[2].0, "• Разработал систему");
        assert_eq!(faces[2].1, FontFace::new(FontFamily::DejaVuSans, FontWeight::Regular));
        assert_eq!(faces[3].1, sheet.bullet.face());
    }
}
