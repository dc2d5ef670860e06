use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

/// In-memory view of a WordprocessingML document.
///
/// A document loaded from disk always carries at least one section; the
/// reader rejects packages whose body yields none.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub sections: Vec<Section>,
    pub protection: Protection,
    pub watermark: Option<Watermark>,
    pub root: Preserved<RootMarkup>,
    pub package: Preserved<SourcePackage>,
}

/// Markup carried over from the package a document was read from, so a
/// save keeps what the model does not interpret. It never takes part in
/// comparisons: equal content means equal documents.
#[derive(Debug, Clone)]
pub struct Preserved<T>(Option<T>);

impl<T> Preserved<T> {
    pub fn new(value: T) -> Self {
        Self(Some(value))
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.0.as_mut()
    }

    pub fn take(&mut self) -> Option<T> {
        self.0.take()
    }
}

impl<T> Default for Preserved<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> PartialEq for Preserved<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// An element kept exactly as it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct RawXml {
    /// Local name, without prefix.
    pub name: String,
    pub xml: String,
    /// Points into the package through a relationship (`r:id`, `r:embed`).
    pub linked: bool,
}

/// Start and end tag of a source element, attributes included.
#[derive(Debug, Clone, PartialEq)]
pub struct Tags {
    pub open: String,
    pub close: String,
}

/// The package a document was read from, and the package-level values it
/// held at the time. Parts the writer does not regenerate are copied from
/// `bytes` unchanged.
#[derive(Debug, Clone)]
pub struct SourcePackage {
    pub bytes: Arc<[u8]>,
    pub protection: Protection,
    pub watermark: Option<Watermark>,
    pub watermark_location: Option<PartSpan>,
}

/// Byte range of an element inside a package part.
#[derive(Debug, Clone)]
pub struct PartSpan {
    pub part: String,
    pub start: usize,
    pub end: usize,
}

/// Namespace declarations and the elements ahead of `w:body` in the main
/// part.
#[derive(Debug, Clone, Default)]
pub struct RootMarkup {
    pub namespaces: Vec<(Option<String>, String)>,
    /// Prefixes listed in `mc:Ignorable`.
    pub ignorable: Vec<String>,
    pub leading: Vec<String>,
}

impl RootMarkup {
    fn absorb(&mut self, other: RootMarkup) {
        for (prefix, uri) in other.namespaces {
            if prefix.is_some() && !self.namespaces.iter().any(|(known, _)| *known == prefix) {
                self.namespaces.push((prefix, uri));
            }
        }
        for prefix in other.ignorable {
            if !self.ignorable.contains(&prefix) {
                self.ignorable.push(prefix);
            }
        }
    }
}

impl Document {
    /// A blank document with one empty section.
    pub fn blank() -> Self {
        Self {
            sections: vec![Section::default()],
            protection: Protection::default(),
            watermark: None,
            root: Preserved::default(),
            package: Preserved::default(),
        }
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Appends every section of `other` after the existing ones. Protection
    /// and watermark of `self` win. Markup of `other` that points into its
    /// own package (images, links, header references) is dropped.
    pub fn append_document(&mut self, mut other: Document) {
        for section in &mut other.sections {
            section.detach();
        }
        if let Some(theirs) = other.root.take() {
            match self.root.get_mut() {
                Some(ours) => ours.absorb(theirs),
                None => {
                    self.root = Preserved::new(RootMarkup {
                        leading: Vec::new(),
                        ..theirs
                    })
                }
            }
        }
        self.sections.extend(other.sections);
    }

    /// Replaces every match of `pattern` in body and table-cell paragraphs.
    /// With `whole_word`, a match counts only when neither neighbour is a
    /// word character. Returns the number of replacements made.
    pub fn replace_text(&mut self, pattern: &Regex, replacement: &str, whole_word: bool) -> usize {
        let mut count = 0;
        for section in &mut self.sections {
            for block in &mut section.blocks {
                match block {
                    Block::Paragraph(paragraph) => {
                        count += paragraph.replace_text(pattern, replacement, whole_word);
                    }
                    Block::Table(table) => {
                        for row in &mut table.rows {
                            for cell in &mut row.cells {
                                for paragraph in &mut cell.paragraphs {
                                    count += paragraph.replace_text(pattern, replacement, whole_word);
                                }
                            }
                        }
                    }
                    Block::Raw(_) => {}
                }
            }
        }
        count
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    pub blocks: Vec<Block>,
    pub properties: Preserved<SectionProperties>,
}

/// `w:sectPr` as read: page size, margins, columns, header and footer
/// references.
#[derive(Debug, Clone)]
pub struct SectionProperties {
    pub tags: Tags,
    pub children: Vec<RawXml>,
    /// Relationship id of the default header, if the section has one.
    pub default_header: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
    /// Body content the model does not interpret, such as content controls.
    Raw(RawXml),
}

impl Section {
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs().count()
    }

    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.paragraphs().nth(index)
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut Paragraph> {
        let position = self.paragraph_position(index)?;
        match &mut self.blocks[position] {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.tables().nth(index)
    }

    pub fn table_mut(&mut self, index: usize) -> Option<&mut Table> {
        let position = self.table_position(index)?;
        match &mut self.blocks[position] {
            Block::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Inserts `paragraph` so that it becomes paragraph number `at`, or
    /// appends it when `at` is `None` or equals the current count.
    /// Returns the paragraph index it ended up at.
    pub fn insert_paragraph(&mut self, at: Option<usize>, paragraph: Paragraph) -> usize {
        let count = self.paragraph_count();
        match at.and_then(|index| self.paragraph_position(index)) {
            Some(position) => {
                self.blocks.insert(position, Block::Paragraph(paragraph));
                at.unwrap_or(count)
            }
            None => {
                self.blocks.push(Block::Paragraph(paragraph));
                count
            }
        }
    }

    pub fn remove_paragraph(&mut self, index: usize) -> Option<Paragraph> {
        let position = self.paragraph_position(index)?;
        match self.blocks.remove(position) {
            Block::Paragraph(paragraph) => Some(paragraph),
            _ => None,
        }
    }

    /// Places `table` right after paragraph `after_paragraph`, or at the end
    /// of the section. Returns the table index it ended up at.
    pub fn insert_table(&mut self, after_paragraph: Option<usize>, table: Table) -> usize {
        let position = after_paragraph
            .and_then(|index| self.paragraph_position(index))
            .map(|position| position + 1)
            .unwrap_or(self.blocks.len());
        let table_index = self.blocks[..position]
            .iter()
            .filter(|block| matches!(block, Block::Table(_)))
            .count();
        self.blocks.insert(position, Block::Table(table));
        table_index
    }

    pub fn remove_table(&mut self, index: usize) -> Option<Table> {
        let position = self.table_position(index)?;
        match self.blocks.remove(position) {
            Block::Table(table) => Some(table),
            _ => None,
        }
    }

    fn detach(&mut self) {
        if let Some(properties) = self.properties.get_mut() {
            properties.children.retain(|child| !child.linked);
            properties.default_header = None;
        }
        self.blocks
            .retain(|block| !matches!(block, Block::Raw(raw) if raw.linked));
        for block in &mut self.blocks {
            match block {
                Block::Paragraph(paragraph) => paragraph.detach(),
                Block::Table(table) => table.detach(),
                Block::Raw(_) => {}
            }
        }
    }

    fn paragraph_position(&self, index: usize) -> Option<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| matches!(block, Block::Paragraph(_)))
            .nth(index)
            .map(|(position, _)| position)
    }

    fn table_position(&self, index: usize) -> Option<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, block)| matches!(block, Block::Table(_)))
            .nth(index)
            .map(|(position, _)| position)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: Option<String>,
    pub format: ParagraphFormat,
    pub source: Preserved<ParagraphSource>,
}

/// A paragraph's markup as read, with the values it carried then, so the
/// writer re-emits only what was edited.
#[derive(Debug, Clone)]
pub struct ParagraphSource {
    pub tags: Tags,
    /// Children of `w:pPr`, minus any `w:sectPr`.
    pub properties: Vec<RawXml>,
    /// Runs, hyperlinks, bookmarks and the rest of the paragraph body.
    pub content: Vec<RawXml>,
    /// `w:rPr` of the first run, reused when the text is rewritten.
    pub run_properties: Option<String>,
    pub text: String,
    pub style: Option<String>,
    pub format: ParagraphFormat,
}

impl Paragraph {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn detach(&mut self) {
        if let Some(source) = self.source.get_mut() {
            source.properties.retain(|property| !property.linked);
            if source.content.iter().any(|item| item.linked) {
                source.content.clear();
                source.text.clear();
            }
        }
    }

    fn replace_text(&mut self, pattern: &Regex, replacement: &str, whole_word: bool) -> usize {
        let mut replaced = String::with_capacity(self.text.len());
        let mut copied = 0;
        let mut count = 0;
        for found in pattern.find_iter(&self.text) {
            if whole_word && !stands_alone(&self.text, found.start(), found.end()) {
                continue;
            }
            replaced.push_str(&self.text[copied..found.start()]);
            replaced.push_str(replacement);
            copied = found.end();
            count += 1;
        }
        if count > 0 {
            replaced.push_str(&self.text[copied..]);
            self.text = replaced;
        }
        count
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// `text[start..end]` is not glued to a word character on either side.
fn stands_alone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}

/// Paragraph layout in points. `line_spacing` follows the "12 pt is one
/// line" convention when the rule is `Multiple`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParagraphFormat {
    pub alignment: Alignment,
    pub first_line_indent: f64,
    pub left_indent: f64,
    pub right_indent: f64,
    pub line_spacing: f64,
    pub line_spacing_rule: LineSpacingRule,
    pub before_spacing: f64,
    pub after_spacing: f64,
}

pub const SINGLE_LINE_SPACING: f64 = 12.0;

impl Default for ParagraphFormat {
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            first_line_indent: 0.0,
            left_indent: 0.0,
            right_indent: 0.0,
            line_spacing: SINGLE_LINE_SPACING,
            line_spacing_rule: LineSpacingRule::Multiple,
            before_spacing: 0.0,
            after_spacing: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub const NAMES: [&'static str; 4] = ["left", "center", "right", "justify"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineSpacingRule {
    AtLeast,
    Exactly,
    Multiple,
}

impl LineSpacingRule {
    pub const NAMES: [&'static str; 3] = ["at_least", "exactly", "multiple"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "at_least" => Some(LineSpacingRule::AtLeast),
            "exactly" => Some(LineSpacingRule::Exactly),
            "multiple" => Some(LineSpacingRule::Multiple),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineSpacingRule::AtLeast => "at_least",
            LineSpacingRule::Exactly => "exactly",
            LineSpacingRule::Multiple => "multiple",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub style: Option<String>,
    pub rows: Vec<Row>,
    pub source: Preserved<TableSource>,
}

#[derive(Debug, Clone)]
pub struct TableSource {
    pub tags: Tags,
    pub properties: Option<String>,
    pub grid: Option<String>,
    /// Style name as read; `properties` is reused while it still matches.
    pub style: Option<String>,
}

impl Table {
    /// A `rows` x `columns` grid where every cell holds one empty paragraph.
    pub fn new(rows: usize, columns: usize) -> Self {
        let rows = (0..rows)
            .map(|_| Row {
                cells: (0..columns)
                    .map(|_| Cell {
                        paragraphs: vec![Paragraph::default()],
                        ..Cell::default()
                    })
                    .collect(),
                ..Row::default()
            })
            .collect();
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column extent, read from the first row. Tables are treated as
    /// rectangular.
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|row| row.cells.len()).unwrap_or(0)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row)?.cells.get(column)
    }

    pub fn cell_mut(&mut self, row: usize, column: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row)?.cells.get_mut(column)
    }

    fn detach(&mut self) {
        for row in &mut self.rows {
            if let Some(source) = row.source.get_mut() {
                source.leading.retain(|item| !item.linked);
            }
            for cell in &mut row.cells {
                if let Some(source) = cell.source.get_mut() {
                    source.extra.retain(|(_, item)| !item.linked);
                }
                for paragraph in &mut cell.paragraphs {
                    paragraph.detach();
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub source: Preserved<RowSource>,
}

#[derive(Debug, Clone)]
pub struct RowSource {
    pub tags: Tags,
    /// Row children other than cells, `w:trPr` included.
    pub leading: Vec<RawXml>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub paragraphs: Vec<Paragraph>,
    pub source: Preserved<CellSource>,
}

#[derive(Debug, Clone)]
pub struct CellSource {
    pub tags: Tags,
    pub properties: Option<String>,
    /// Non-paragraph children (nested tables, content controls), each with
    /// the number of paragraphs that preceded it.
    pub extra: Vec<(usize, RawXml)>,
}

impl Cell {
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|paragraph| paragraph.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Sets the first paragraph's text, creating the paragraph when the
    /// cell has none. Returns the text it replaced.
    pub fn set_text(&mut self, text: impl Into<String>) -> String {
        match self.paragraphs.first_mut() {
            Some(paragraph) => std::mem::replace(&mut paragraph.text, text.into()),
            None => {
                self.paragraphs.push(Paragraph::with_text(text));
                String::new()
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Protection {
    pub level: ProtectionLevel,
    pub password: Option<PasswordHash>,
}

impl Protection {
    pub fn is_protected(&self) -> bool {
        self.level != ProtectionLevel::None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProtectionLevel {
    #[default]
    None,
    ReadOnly,
    FormFilling,
    Comments,
    Revisions,
}

impl ProtectionLevel {
    pub const NAMES: [&'static str; 5] =
        ["none", "read_only", "form_filling", "comments", "revisions"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(ProtectionLevel::None),
            "read_only" => Some(ProtectionLevel::ReadOnly),
            "form_filling" => Some(ProtectionLevel::FormFilling),
            "comments" => Some(ProtectionLevel::Comments),
            "revisions" => Some(ProtectionLevel::Revisions),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectionLevel::None => "none",
            ProtectionLevel::ReadOnly => "read_only",
            ProtectionLevel::FormFilling => "form_filling",
            ProtectionLevel::Comments => "comments",
            ProtectionLevel::Revisions => "revisions",
        }
    }

    /// Value of `w:edit` on `w:documentProtection`.
    pub fn edit_value(&self) -> &'static str {
        match self {
            ProtectionLevel::None => "none",
            ProtectionLevel::ReadOnly => "readOnly",
            ProtectionLevel::FormFilling => "forms",
            ProtectionLevel::Comments => "comments",
            ProtectionLevel::Revisions => "trackedChanges",
        }
    }

    pub fn from_edit_value(value: &str) -> Option<Self> {
        match value {
            "none" => Some(ProtectionLevel::None),
            "readOnly" => Some(ProtectionLevel::ReadOnly),
            "forms" => Some(ProtectionLevel::FormFilling),
            "comments" => Some(ProtectionLevel::Comments),
            "trackedChanges" => Some(ProtectionLevel::Revisions),
            _ => None,
        }
    }
}

/// Salted, iterated password hash as stored in `w:documentProtection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub algorithm_name: String,
    pub hash_value: String,
    pub salt_value: String,
    pub spin_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub font_size: u32,
    /// Fill colour as six uppercase hex digits, no leading `#`.
    pub color: String,
    pub layout: WatermarkLayout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkLayout {
    Diagonal,
    Horizontal,
}

impl WatermarkLayout {
    pub const NAMES: [&'static str; 2] = ["diagonal", "horizontal"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "diagonal" => Some(WatermarkLayout::Diagonal),
            "horizontal" => Some(WatermarkLayout::Horizontal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WatermarkLayout::Diagonal => "diagonal",
            WatermarkLayout::Horizontal => "horizontal",
        }
    }
}
