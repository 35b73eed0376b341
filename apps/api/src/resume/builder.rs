//! Document model builder. Groups canonical lines into typed blocks.
//!
//! A small state machine: `Cursor` says where position headers, bullet lists
//! and paragraphs attach (top level, or the section at a given block index), and
//! `PendingRun` accumulates consecutive bullet or paragraph lines until a line of
//! another kind flushes them.
//!
//! Blank lines end a paragraph run but never split a bullet run.

use tracing::debug;

use crate::resume::model::{Block, DocumentModel, SectionBlock, SectionChild};
use crate::resume::normalizer::{CanonicalLine, LineKind, CONTACT_SEPARATOR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    NoSection,
    InSection(usize),
}

#[derive(Debug, Default)]
enum PendingRun {
    #[default]
    None,
    Bullets(Vec<String>),
    Paragraph(Vec<String>),
}

struct ModelBuilder {
    blocks: Vec<Block>,
    cursor: Cursor,
    pending: PendingRun,
}

/// Builds the document model from canonical markdown. Total over any input;
/// the empty string yields an empty model.
pub fn build(canonical: &str) -> DocumentModel {
    let mut builder = ModelBuilder::new();
    for line in canonical.lines() {
        builder.push_line(CanonicalLine::parse(line));
    }
    let model = builder.finish();
    debug!(
        blocks = model.blocks.len(),
        contact_entries = model.contact().map_or(0, <[String]>::len),
        bullets = model.bullet_count(),
        "built document model"
    );
    model
}

impl ModelBuilder {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            cursor: Cursor::NoSection,
            pending: PendingRun::None,
        }
    }

    fn push_line(&mut self, line: CanonicalLine) {
        match line.kind {
            LineKind::Name => {
                self.flush();
                if self.blocks.is_empty() {
                    self.blocks.push(Block::Name(line.text));
                } else {
                    // Only the very first block may be the name.
                    self.open_section(line.text);
                }
            }
            LineKind::ContactEntry => {
                self.flush();
                self.add_contact(&line.text);
            }
            LineKind::SectionHeader => {
                self.flush();
                self.open_section(line.text);
            }
            LineKind::PositionHeader => {
                self.flush();
                self.attach(SectionChild::Position(line.text));
            }
            LineKind::BulletItem => {
                if matches!(self.pending, PendingRun::Paragraph(_)) {
                    self.flush();
                }
                match &mut self.pending {
                    PendingRun::Bullets(items) => items.push(line.text),
                    _ => self.pending = PendingRun::Bullets(vec![line.text]),
                }
            }
            LineKind::Paragraph => {
                if matches!(self.pending, PendingRun::Bullets(_)) {
                    self.flush();
                }
                match &mut self.pending {
                    PendingRun::Paragraph(parts) => parts.push(line.text),
                    _ => self.pending = PendingRun::Paragraph(vec![line.text]),
                }
            }
            LineKind::BlankLine => {
                if matches!(self.pending, PendingRun::Paragraph(_)) {
                    self.flush();
                }
            }
        }
    }

    fn open_section(&mut self, title: String) {
        self.blocks.push(Block::Section(SectionBlock {
            title,
            children: Vec::new(),
        }));
        self.cursor = Cursor::InSection(self.blocks.len() - 1);
    }

    /// Keeps a single contact block, directly after the name (or first).
    fn add_contact(&mut self, line: &str) {
        let entries = line
            .split(CONTACT_SEPARATOR)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        if let Some(Block::Contact(existing)) = self
            .blocks
            .iter_mut()
            .take(2)
            .find(|b| matches!(b, Block::Contact(_)))
        {
            existing.extend(entries);
            return;
        }

        let at = usize::from(matches!(self.blocks.first(), Some(Block::Name(_))));
        self.blocks.insert(at, Block::Contact(entries.collect()));
        if let Cursor::InSection(index) = self.cursor {
            if index >= at {
                self.cursor = Cursor::InSection(index + 1);
            }
        }
    }

    fn attach(&mut self, child: SectionChild) {
        match self.cursor {
            Cursor::NoSection => self.blocks.push(child.into_block()),
            Cursor::InSection(index) => match self.blocks.get_mut(index) {
                Some(Block::Section(section)) => section.children.push(child),
                _ => self.blocks.push(child.into_block()),
            },
        }
    }

    fn flush(&mut self) {
        match std::mem::take(&mut self.pending) {
            PendingRun::None => {}
            PendingRun::Bullets(items) => self.attach(SectionChild::BulletList(items)),
            PendingRun::Paragraph(parts) => self.attach(SectionChild::Paragraph(parts.join(" "))),
        }
    }

    fn finish(mut self) -> DocumentModel {
        self.flush();
        DocumentModel {
            blocks: self.blocks,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resume::model::BlockKind;
    use crate::resume::normalizer::normalize;

    fn s(text: &str) -> String {
        text.to_string()
    }

    fn bullet_lines(canonical: &str) -> usize {
        canonical
            .lines()
            .filter(|l| CanonicalLine::parse(l).kind == LineKind::BulletItem)
            .count()
    }

    #[test]
    fn test_build_empty() {
        assert!(build("").is_empty());
        assert!(build("\n\n").is_empty());
    }

    #[test]
    fn test_build_scenario() {
        let raw = "# Jane Smith\n📧 jane@x.com\n## Experience\n**Engineer — Acme**\n- Built system X\n- Improved Y by 20%";
        let model = build(&normalize(raw));
        let expected = vec![
            Block::Name(s("Jane Smith")),
            Block::Contact(vec![s("📧 jane@x.com")]),
            Block::Section(SectionBlock {
                title: s("Experience"),
                children: vec![
                    SectionChild::Position(s("Engineer — Acme")),
                    SectionChild::BulletList(vec![s("Built system X"), s("Improved Y by 20%")]),
                ],
            }),
        ];
        assert_eq!(model.blocks, expected);
    }

    #[test]
    fn test_build_splits_contact_entries() {
        let model = build("# Jane Smith\n📧 jane@x.com | 📞 555 0100\n");
        assert_eq!(
            model.blocks[1],
            Block::Contact(vec![s("📧 jane@x.com"), s("📞 555 0100")])
        );
    }

    #[test]
    fn test_blank_lines_do_not_split_bullets() {
        let model = build("## Skills\n- Rust\n\n- Go\n\n\n- SQL");
        let Block::Section(section) = &model.blocks[0] else {
            panic!("expected section");
        };
        assert_eq!(
            section.children,
            vec![SectionChild::BulletList(vec![s("Rust"), s("Go"), s("SQL")])]
        );
    }

    #[test]
    fn test_non_bullet_line_splits_bullets() {
        let model = build("- a\nbetween\n- b");
        assert_eq!(
            model.blocks,
            vec![
                Block::BulletList(vec![s("a")]),
                Block::Paragraph(s("between")),
                Block::BulletList(vec![s("b")]),
            ]
        );
    }

    #[test]
    fn test_paragraph_lines_join_and_blank_separates() {
        let model = build("## Summary\nFirst line\nsecond line\n\nAnother paragraph");
        let Block::Section(section) = &model.blocks[0] else {
            panic!("expected section");
        };
        assert_eq!(
            section.children,
            vec![
                SectionChild::Paragraph(s("First line second line")),
                SectionChild::Paragraph(s("Another paragraph")),
            ]
        );
    }

    #[test]
    fn test_blocks_before_first_section_are_top_level() {
        let model = build("### Freelance\nSome intro\n## Experience\n### Engineer");
        assert_eq!(model.blocks[0], Block::Position(s("Freelance")));
        assert_eq!(model.blocks[1], Block::Paragraph(s("Some intro")));
        assert_eq!(model.blocks[2].kind(), BlockKind::SectionHeader);
        assert_eq!(model.blocks.len(), 3);
    }

    #[test]
    fn test_second_name_line_is_demoted() {
        let model = build("# Jane Smith\n# Other\n- x");
        assert_eq!(model.blocks[0], Block::Name(s("Jane Smith")));
        assert_eq!(
            model.blocks[1],
            Block::Section(SectionBlock {
                title: s("Other"),
                children: vec![SectionChild::BulletList(vec![s("x")])],
            })
        );
    }

    #[test]
    fn test_late_contact_line_is_moved_up_and_cursor_follows() {
        let model = build("# Jane Smith\n## Skills\n📧 jane@x.com\n- Rust");
        assert_eq!(model.blocks[1], Block::Contact(vec![s("📧 jane@x.com")]));
        let Block::Section(section) = &model.blocks[2] else {
            panic!("expected section");
        };
        assert_eq!(section.children, vec![SectionChild::BulletList(vec![s("Rust")])]);
    }

    #[test]
    fn test_name_first_and_unique_for_messy_inputs() {
        let inputs = [
            "# Jane Doe\n# John Roe\n## Work History\n- a",
            "text\n# Jane Smith\n📧 a@b.com",
            "📧 a@b.com\n# Jane Smith\n## Education\n- BSc",
            "- stray\n## Jane Smith\n# Name",
        ];
        for input in inputs {
            let model = build(&normalize(input));
            let names = model
                .blocks
                .iter()
                .filter(|b| b.kind() == BlockKind::Name)
                .count();
            assert!(names <= 1, "multiple names for {input:?}");
            if names == 1 {
                assert_eq!(model.blocks[0].kind(), BlockKind::Name, "input {input:?}");
            }
        }
    }

    #[test]
    fn test_contact_immediately_follows_name() {
        let model = build(&normalize("## Jane Smith\nSummary\n📧 jane@x.com\n📞 555"));
        assert_eq!(model.blocks[0].kind(), BlockKind::Name);
        assert_eq!(
            model.blocks[1],
            Block::Contact(vec![s("📧 jane@x.com"), s("📞 555")])
        );
    }

    #[test]
    fn test_bullet_count_preserved() {
        let raw = "# Jane Smith\n## Experience\n**Eng**\n- a\n- b\n\n- c\ntext\n- d\n## Skills\n* e\n+ f";
        let canonical = normalize(raw);
        let model = build(&canonical);
        assert_eq!(model.bullet_count(), bullet_lines(&canonical));
        assert_eq!(model.bullet_count(), 6);
    }

    #[test]
    fn test_bare_pipe_stays_inside_contact_entry() {
        let model = build(&normalize("# Jane Smith\n🌐 site.dev|blog\n📧 jane@x.com | 📞 555"));
        assert_eq!(
            model.contact(),
            Some([s("🌐 site.dev|blog"), s("📧 jane@x.com"), s("📞 555")].as_slice())
        );
    }

    #[test]
    fn test_adversarial_bullet_payloads_survive() {
        let raw = "# Jane Smith\n## Skills\n* ---\n+ --\n* - - -\n* Rust\n- ***bold***\n- # not a heading";
        let once = normalize(raw);
        let model = build(&once);
        assert_eq!(model.bullet_count(), 6);
        assert_eq!(build(&normalize(&once)), model);
        let Some(Block::Section(section)) = model.blocks.get(1) else {
            panic!("expected the skills section, got {:?}", model.blocks);
        };
        assert_eq!(
            section.children,
            vec![SectionChild::BulletList(vec![
                s("---"),
                s("--"),
                s("- - -"),
                s("Rust"),
                s("***bold***"),
                s("# not a heading"),
            ])]
        );
    }

    #[test]
    fn test_non_ascii_payloads_are_kept_verbatim() {
        let model = build(&normalize("# Дмитрий Пискарев\n## Опыт\n### Инженер — Яндекс\n- Разработал систему\n- 负责 API 设计\nΣύνοψη κειμένου"));
        assert_eq!(model.name(), Some("Дмитрий Пискарев"));
        let Some(Block::Section(section)) = model.blocks.get(1) else {
            panic!("expected a section, got {:?}", model.blocks);
        };
        assert_eq!(section.title, "Опыт");
        assert_eq!(
            section.children,
            vec![
                SectionChild::Position(s("Инженер — Яндекс")),
                SectionChild::BulletList(vec![s("Разработал систему"), s("负责 API 设计")]),
                SectionChild::Paragraph(s("Σύνοψη κειμένου")),
            ]
        );
    }
}
