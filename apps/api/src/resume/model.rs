//! Typed document model produced by the builder and consumed by the renderers.

use serde::{Deserialize, Serialize};

/// Style lookup key: one per kind of paragraph-equivalent unit a block renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Name,
    Contact,
    SectionHeader,
    Position,
    BulletList,
    Paragraph,
}

/// A child of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SectionChild {
    Position(String),
    BulletList(Vec<String>),
    Paragraph(String),
}

impl SectionChild {
    /// Lifts the child to a top-level block (used before any section is open).
    pub fn into_block(self) -> Block {
        match self {
            SectionChild::Position(text) => Block::Position(text),
            SectionChild::BulletList(items) => Block::BulletList(items),
            SectionChild::Paragraph(text) => Block::Paragraph(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionBlock {
    pub title: String,
    pub children: Vec<SectionChild>,
}

/// One classified unit of résumé content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Block {
    Name(String),
    Contact(Vec<String>),
    Section(SectionBlock),
    /// Floating position header, only before the first section.
    Position(String),
    BulletList(Vec<String>),
    Paragraph(String),
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Name(_) => BlockKind::Name,
            Block::Contact(_) => BlockKind::Contact,
            Block::Section(_) => BlockKind::SectionHeader,
            Block::Position(_) => BlockKind::Position,
            Block::BulletList(_) => BlockKind::BulletList,
            Block::Paragraph(_) => BlockKind::Paragraph,
        }
    }
}

/// Ordered block sequence for one résumé. Rebuilt per request, never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentModel {
    pub blocks: Vec<Block>,
}

/// Block counts reported alongside the model by the HTTP surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelStats {
    pub blocks: usize,
    pub sections: usize,
    pub positions: usize,
    pub bullets: usize,
    pub paragraphs: usize,
    pub contact_entries: usize,
}

impl DocumentModel {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn name(&self) -> Option<&str> {
        match self.blocks.first() {
            Some(Block::Name(name)) => Some(name),
            _ => None,
        }
    }

    pub fn contact(&self) -> Option<&[String]> {
        self.blocks.iter().take(2).find_map(|b| match b {
            Block::Contact(entries) => Some(entries.as_slice()),
            _ => None,
        })
    }

    /// Total items across every bullet list, nested or top level.
    pub fn bullet_count(&self) -> usize {
        self.stats().bullets
    }

    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats {
            blocks: self.blocks.len(),
            ..ModelStats::default()
        };
        for block in &self.blocks {
            match block {
                Block::Name(_) => {}
                Block::Contact(entries) => stats.contact_entries += entries.len(),
                Block::Section(section) => {
                    stats.sections += 1;
                    for child in &section.children {
                        match child {
                            SectionChild::Position(_) => stats.positions += 1,
                            SectionChild::BulletList(items) => stats.bullets += items.len(),
                            SectionChild::Paragraph(_) => stats.paragraphs += 1,
                        }
                    }
                }
                Block::Position(_) => stats.positions += 1,
                Block::BulletList(items) => stats.bullets += items.len(),
                Block::Paragraph(_) => stats.paragraphs += 1,
            }
        }
        stats
    }
}
