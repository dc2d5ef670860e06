use std::collections::HashSet;
use std::io::{Cursor, Write};

use roxmltree::Node;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::model::{
    Alignment, Block, Cell, Document, LineSpacingRule, Paragraph, ParagraphFormat,
    ParagraphSource, Protection, Row, RootMarkup, Section, SourcePackage, Table, Watermark,
    WatermarkLayout,
};
use super::reader::{closing_tag_start, is_w, read_part};
use super::{
    DOCUMENT_PART, EngineError, MC_NS, PackageKind, R_NS, SETTINGS_PART, STYLES_PART,
    TWIPS_PER_POINT, W_NS, XML_DECLARATION, styles,
};

const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const PACKAGE_RELS_PART: &str = "_rels/.rels";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
/// Parts that only belong in a macro-enabled package.
const MACRO_PARTS: &[&str] = &[
    "word/vbaProject.bin",
    "word/vbaData.xml",
    "word/_rels/vbaProject.bin.rels",
];

const PACKAGE_RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_STYLES: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_SETTINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
const REL_HEADER: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/header";
const REL_VBA_PROJECT: &str = "http://schemas.microsoft.com/office/2006/relationships/vbaProject";
const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const CT_XML: &str = "application/xml";
const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const CT_SETTINGS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
const CT_HEADER: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml";
const CT_VBA_PROJECT: &str = "application/vnd.ms-office.vbaProject";

const VML_NS: &str = "urn:schemas-microsoft-com:vml";
const OFFICE_NS: &str = "urn:schemas-microsoft-com:office:office";
const WORD10_NS: &str = "urn:schemas-microsoft-com:office:word";

/// Usable text width of an A4 page with one-inch margins, in twips.
const TEXT_WIDTH_TWIPS: usize = 9026;
const SECTION_PROPERTIES: &str = r#"<w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/>"#;
pub(crate) const TABLE_BORDERS: &str = r#"<w:tblBorders><w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/></w:tblBorders>"#;

/// Schema order of `w:pPr` children. Unknown names sort last.
const PARAGRAPH_PROPERTY_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap", "jc",
    "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId", "cnfStyle",
    "rPr", "sectPr", "pPrChange",
];

/// `w:settings` children that must precede `w:documentProtection`.
const SETTINGS_BEFORE_PROTECTION: &[&str] = &[
    "writeProtection", "view", "zoom", "removePersonalInformation", "removeDateAndTime",
    "doNotDisplayPageBoundaries", "displayBackgroundShape", "printPostScriptOverText",
    "printFractionalCharacterWidth", "printFormsData", "embedTrueTypeFonts", "embedSystemFonts",
    "saveSubsetFonts", "saveFormsData", "mirrorMargins", "alignBordersAndEdges",
    "bordersDoNotSurroundHeader", "bordersDoNotSurroundFooter", "gutterAtTop",
    "hideSpellingErrors", "hideGrammaticalErrors", "activeWritingStyle", "proofState",
    "formsDesign", "attachedTemplate", "linkStyles", "stylePaneFormatFilter",
    "stylePaneSortMethod", "documentType", "mailMerge", "revisionView", "trackRevisions",
    "doNotTrackMoves", "doNotTrackFormatting",
];

/// Builds the package for `document`. Parts the model covers are
/// regenerated; everything else in the source package is copied as is.
pub fn write_document(document: &Document, kind: PackageKind) -> Result<Vec<u8>, EngineError> {
    let source = document.package.get();
    let mut package = PackageEditor::open(source)?;

    package.content_types.set_override(DOCUMENT_PART, kind.main_content_type());
    if !kind.is_macro() {
        package.drop_macros();
    }

    let required = new_table_styles(document);
    match package.source_part(STYLES_PART)? {
        Some(xml) => {
            if let Some(merged) = merge_table_styles(&xml, &required)? {
                package.put(STYLES_PART, merged);
            }
        }
        None => package.put(STYLES_PART, styles::styles_xml()),
    }
    package.rels.ensure(REL_STYLES, "styles.xml");
    package.content_types.ensure_override(STYLES_PART, CT_STYLES);

    let protection_changed = source.is_none_or(|source| source.protection != document.protection);
    match package.source_part(SETTINGS_PART)? {
        Some(xml) if protection_changed => {
            let patched = patch_settings(&xml, &document.protection)?
                .unwrap_or_else(|| settings_xml(&document.protection));
            package.put(SETTINGS_PART, patched);
        }
        Some(_) => {}
        None => package.put(SETTINGS_PART, settings_xml(&document.protection)),
    }
    package.rels.ensure(REL_SETTINGS, "settings.xml");
    package.content_types.ensure_override(SETTINGS_PART, CT_SETTINGS);

    let watermark_changed =
        source.map_or(document.watermark.is_some(), |source| source.watermark != document.watermark);
    let new_header = if watermark_changed {
        place_watermark(&mut package, document, source)?
    } else {
        None
    };

    package.put(DOCUMENT_PART, main_part_xml(document, new_header.as_deref()));
    package.finish()
}

/// Puts the document's watermark into a header. Returns the relationship
/// id of a header part created for it, which every section must reference.
fn place_watermark(
    package: &mut PackageEditor,
    document: &Document,
    source: Option<&SourcePackage>,
) -> Result<Option<String>, EngineError> {
    let run = document.watermark.as_ref().map(watermark_run);

    if let Some(location) = source.and_then(|source| source.watermark_location.as_ref())
        && let Some(xml) = package.source_part(&location.part)?
        && location.end <= xml.len()
        && xml.is_char_boundary(location.start)
        && xml.is_char_boundary(location.end)
    {
        let replacement = run.unwrap_or_default();
        let patched = format!("{}{replacement}{}", &xml[..location.start], &xml[location.end..]);
        package.put(&location.part, patched);
        return Ok(None);
    }

    let Some(run) = run else {
        return Ok(None);
    };
    let paragraph = watermark_paragraph(&run);

    let existing_header = document
        .sections
        .first()
        .and_then(|section| section.properties.get())
        .and_then(|properties| properties.default_header.as_deref())
        .and_then(|id| package.rels.target_of(id))
        .map(part_name);
    if let Some(name) = existing_header
        && let Some(xml) = package.source_part(&name)?
    {
        let at = {
            let doc = roxmltree::Document::parse(&xml)?;
            closing_tag_start(&xml, &doc.root_element())
        };
        if let Some(at) = at {
            package.put(&name, format!("{}{paragraph}{}", &xml[..at], &xml[at..]));
            return Ok(None);
        }
    }

    let name = package.fresh_part_name("word/header", ".xml");
    let id = package
        .rels
        .add(REL_HEADER, name.trim_start_matches("word/"));
    package.content_types.ensure_override(&name, CT_HEADER);
    package.put(&name, header_xml(&paragraph));
    Ok(Some(id))
}

fn part_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Package part name for a relationship target of the main part.
fn part_name(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{target}"),
    }
}

/// The source package plus the parts regenerated for this save.
struct PackageEditor<'a> {
    source: Option<ZipArchive<Cursor<&'a [u8]>>>,
    existing: HashSet<String>,
    rels: Relationships,
    content_types: ContentTypes,
    parts: Vec<(String, String)>,
    dropped: HashSet<String>,
}

impl<'a> PackageEditor<'a> {
    fn open(source: Option<&'a SourcePackage>) -> Result<Self, EngineError> {
        let source = source
            .map(|package| ZipArchive::new(Cursor::new(&package.bytes[..])))
            .transpose()?;
        let existing = source
            .as_ref()
            .map(|archive| archive.file_names().map(str::to_string).collect())
            .unwrap_or_default();
        let mut editor = Self {
            source,
            existing,
            rels: Relationships::default(),
            content_types: ContentTypes::default(),
            parts: Vec::new(),
            dropped: HashSet::new(),
        };
        if let Some(xml) = editor.source_part(DOCUMENT_RELS_PART)? {
            editor.rels = Relationships::parse(&xml)?;
        }
        if let Some(xml) = editor.source_part(CONTENT_TYPES_PART)? {
            editor.content_types = ContentTypes::parse(&xml)?;
        }
        if !editor.existing.contains(PACKAGE_RELS_PART) {
            editor.put(PACKAGE_RELS_PART, package_rels_xml());
        }
        Ok(editor)
    }

    fn source_part(&mut self, name: &str) -> Result<Option<String>, EngineError> {
        match self.source.as_mut() {
            Some(archive) => read_part(archive, name),
            None => Ok(None),
        }
    }

    fn put(&mut self, name: &str, xml: String) {
        match self.parts.iter_mut().find(|(existing, _)| existing == name) {
            Some(part) => part.1 = xml,
            None => self.parts.push((name.to_string(), xml)),
        }
    }

    fn fresh_part_name(&self, stem: &str, extension: &str) -> String {
        let mut number = 1;
        loop {
            let name = format!("{stem}{number}{extension}");
            if !self.existing.contains(&name) && !self.parts.iter().any(|(taken, _)| *taken == name) {
                return name;
            }
            number += 1;
        }
    }

    fn drop_macros(&mut self) {
        for part in MACRO_PARTS {
            if self.existing.contains(*part) {
                self.dropped.insert(part.to_string());
            }
            self.content_types.remove_override(part);
        }
        self.content_types.remove_defaults_of(CT_VBA_PROJECT);
        self.rels.remove_type(REL_VBA_PROJECT);
    }

    fn finish(mut self) -> Result<Vec<u8>, EngineError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        writer.start_file(CONTENT_TYPES_PART, part_options())?;
        writer.write_all(self.content_types.to_xml().as_bytes())?;
        writer.start_file(DOCUMENT_RELS_PART, part_options())?;
        writer.write_all(self.rels.to_xml().as_bytes())?;
        for (name, xml) in &self.parts {
            writer.start_file(name.as_str(), part_options())?;
            writer.write_all(xml.as_bytes())?;
        }

        if let Some(archive) = self.source.as_mut() {
            for index in 0..archive.len() {
                let file = archive.by_index_raw(index)?;
                let name = file.name();
                let regenerated = name == CONTENT_TYPES_PART
                    || name == DOCUMENT_RELS_PART
                    || self.dropped.contains(name)
                    || self.parts.iter().any(|(written, _)| written == name);
                if !regenerated {
                    writer.raw_copy_file(file)?;
                }
            }
        }
        Ok(writer.finish()?.into_inner())
    }
}

#[derive(Debug)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
    external: bool,
}

/// The main part's relationship list.
#[derive(Debug, Default)]
struct Relationships(Vec<Relationship>);

impl Relationships {
    fn parse(xml: &str) -> Result<Self, EngineError> {
        let doc = roxmltree::Document::parse(xml)?;
        let list = doc
            .root_element()
            .children()
            .filter(|child| child.is_element() && child.tag_name().name() == "Relationship")
            .map(|child| Relationship {
                id: child.attribute("Id").unwrap_or_default().to_string(),
                kind: child.attribute("Type").unwrap_or_default().to_string(),
                target: child.attribute("Target").unwrap_or_default().to_string(),
                external: child.attribute("TargetMode") == Some("External"),
            })
            .collect();
        Ok(Self(list))
    }

    fn ensure(&mut self, kind: &str, target: &str) {
        if !self.0.iter().any(|relationship| relationship.kind == kind) {
            self.add(kind, target);
        }
    }

    fn add(&mut self, kind: &str, target: &str) -> String {
        let mut number = self.0.len() + 1;
        let id = loop {
            let id = format!("rId{number}");
            if !self.0.iter().any(|relationship| relationship.id == id) {
                break id;
            }
            number += 1;
        };
        self.0.push(Relationship {
            id: id.clone(),
            kind: kind.to_string(),
            target: target.to_string(),
            external: false,
        });
        id
    }

    fn target_of(&self, id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|relationship| relationship.id == id && !relationship.external)
            .map(|relationship| relationship.target.as_str())
    }

    fn remove_type(&mut self, kind: &str) {
        self.0.retain(|relationship| relationship.kind != kind);
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(&format!(r#"<Relationships xmlns="{PACKAGE_RELS_NS}">"#));
        for relationship in &self.0 {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape(&relationship.id),
                escape(&relationship.kind),
                escape(&relationship.target),
            ));
            if relationship.external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// `[Content_Types].xml`: defaults by extension, overrides by part name.
#[derive(Debug)]
struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self {
            defaults: vec![
                ("rels".to_string(), CT_RELATIONSHIPS.to_string()),
                ("xml".to_string(), CT_XML.to_string()),
            ],
            overrides: Vec::new(),
        }
    }
}

impl ContentTypes {
    fn parse(xml: &str) -> Result<Self, EngineError> {
        let doc = roxmltree::Document::parse(xml)?;
        let mut types = Self {
            defaults: Vec::new(),
            overrides: Vec::new(),
        };
        for child in doc.root_element().children().filter(Node::is_element) {
            let content_type = child.attribute("ContentType").unwrap_or_default().to_string();
            match child.tag_name().name() {
                "Default" => types.defaults.push((
                    child.attribute("Extension").unwrap_or_default().to_string(),
                    content_type,
                )),
                "Override" => types.overrides.push((
                    child.attribute("PartName").unwrap_or_default().to_string(),
                    content_type,
                )),
                _ => {}
            }
        }
        Ok(types)
    }

    fn position(&self, part: &str) -> Option<usize> {
        let wanted = format!("/{part}");
        self.overrides
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(&wanted))
    }

    fn set_override(&mut self, part: &str, content_type: &str) {
        match self.position(part) {
            Some(index) => self.overrides[index].1 = content_type.to_string(),
            None => self
                .overrides
                .push((format!("/{part}"), content_type.to_string())),
        }
    }

    fn ensure_override(&mut self, part: &str, content_type: &str) {
        if self.position(part).is_none() {
            self.set_override(part, content_type);
        }
    }

    fn remove_override(&mut self, part: &str) {
        if let Some(index) = self.position(part) {
            self.overrides.remove(index);
        }
    }

    fn remove_defaults_of(&mut self, content_type: &str) {
        self.defaults.retain(|(_, kind)| kind != content_type);
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(XML_DECLARATION);
        xml.push_str(&format!(r#"<Types xmlns="{CONTENT_TYPES_NS}">"#));
        for (extension, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(extension),
                escape(content_type)
            ));
        }
        for (part, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part),
                escape(content_type)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(ch),
            ch if (ch as u32) < 0x20 => {}
            ch => out.push(ch),
        }
    }
    out
}

fn twips(points: f64) -> i64 {
    (points * TWIPS_PER_POINT).round() as i64
}

fn package_rels_xml() -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(r#"<Relationships xmlns="{PACKAGE_RELS_NS}">"#));
    xml.push_str(&format!(
        r#"<Relationship Id="rId1" Type="{REL_OFFICE_DOCUMENT}" Target="word/document.xml"/>"#
    ));
    xml.push_str("</Relationships>");
    xml
}

/// Built-in table styles used by tables created since the document was
/// read.
fn new_table_styles(document: &Document) -> Vec<&'static str> {
    let mut ids = Vec::new();
    for table in document.sections.iter().flat_map(Section::tables) {
        if table.source.get().is_none()
            && let Some(id) = table.style.as_deref().and_then(styles::table_style_id)
            && !ids.contains(&id)
        {
            ids.push(id);
        }
    }
    ids
}

/// Adds definitions for the `required` table styles an existing styles part
/// lacks. `None` means the part needs no change.
fn merge_table_styles(xml: &str, required: &[&str]) -> Result<Option<String>, EngineError> {
    if required.is_empty() {
        return Ok(None);
    }
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    let present: HashSet<&str> = root
        .children()
        .filter(|child| is_w(child, "style"))
        .filter_map(|style| style.attribute((W_NS, "styleId")))
        .collect();
    let mut missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|id| !present.contains(id))
        .collect();
    if missing.is_empty() {
        return Ok(None);
    }
    if !present.contains(styles::BASE_TABLE_STYLE_ID) {
        missing.insert(0, styles::BASE_TABLE_STYLE_ID);
    }
    let Some(at) = closing_tag_start(xml, &root) else {
        return Ok(None);
    };

    let declare = root.lookup_prefix(W_NS) != Some("w");
    let mut inserted = String::new();
    for definition in missing.into_iter().filter_map(styles::style_definition) {
        if declare {
            inserted.push_str(&definition.replacen("<w:style ", &format!(r#"<w:style xmlns:w="{W_NS}" "#), 1));
        } else {
            inserted.push_str(&definition);
        }
    }
    Ok(Some(format!("{}{inserted}{}", &xml[..at], &xml[at..])))
}

fn protection_element(prefix: &str, protection: &Protection) -> String {
    if !protection.is_protected() {
        return String::new();
    }
    let mut xml = format!(
        r#"<{prefix}:documentProtection {prefix}:edit="{}" {prefix}:enforcement="1""#,
        protection.level.edit_value()
    );
    if let Some(password) = &protection.password {
        xml.push_str(&format!(
            r#" {prefix}:algorithmName="{}" {prefix}:hashValue="{}" {prefix}:saltValue="{}" {prefix}:spinCount="{}""#,
            escape(&password.algorithm_name),
            escape(&password.hash_value),
            escape(&password.salt_value),
            password.spin_count,
        ));
    }
    xml.push_str("/>");
    xml
}

/// Rewrites only `w:documentProtection` of an existing settings part.
/// `None` when the part cannot be patched in place.
fn patch_settings(xml: &str, protection: &Protection) -> Result<Option<String>, EngineError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    let Some(prefix) = root.lookup_prefix(W_NS).filter(|prefix| !prefix.is_empty()) else {
        return Ok(None);
    };
    let element = protection_element(prefix, protection);

    if let Some(existing) = root.children().find(|child| is_w(child, "documentProtection")) {
        let range = existing.range();
        return Ok(Some(format!("{}{element}{}", &xml[..range.start], &xml[range.end..])));
    }
    if element.is_empty() {
        return Ok(Some(xml.to_string()));
    }
    let at = root
        .children()
        .filter(Node::is_element)
        .find(|child| !SETTINGS_BEFORE_PROTECTION.contains(&child.tag_name().name()))
        .map(|child| child.range().start)
        .or_else(|| closing_tag_start(xml, &root));
    Ok(at.map(|at| format!("{}{element}{}", &xml[..at], &xml[at..])))
}

fn settings_xml(protection: &Protection) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(r#"<w:settings xmlns:w="{W_NS}">"#));
    xml.push_str(&protection_element("w", protection));
    xml.push_str(r#"<w:defaultTabStop w:val="720"/><w:characterSpacingControl w:val="doNotCompress"/>"#);
    xml.push_str("</w:settings>");
    xml
}

/// The main document part on its own, for callers that only need the
/// markup.
pub fn document_xml(document: &Document) -> String {
    main_part_xml(document, None)
}

/// Every section but the last ends with an empty marker paragraph carrying
/// its `w:sectPr`. `new_header` is referenced as the default header of
/// sections that have none.
fn main_part_xml(document: &Document, new_header: Option<&str>) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&root_open_tag(document.root.get()));
    if let Some(root) = document.root.get() {
        for element in &root.leading {
            xml.push_str(element);
        }
    }
    xml.push_str("<w:body>");
    let last = document.sections.len().saturating_sub(1);
    for (index, section) in document.sections.iter().enumerate() {
        write_section(&mut xml, section);
        let properties = section_properties_xml(section, new_header);
        if index < last {
            xml.push_str(&format!("<w:p><w:pPr>{properties}</w:pPr></w:p>"));
        } else {
            xml.push_str(&properties);
        }
    }
    if document.sections.is_empty() {
        xml.push_str(&section_properties_xml(&Section::default(), new_header));
    }
    xml.push_str("</w:body></w:document>");
    xml
}

fn root_open_tag(root: Option<&RootMarkup>) -> String {
    let mut namespaces: Vec<(Option<&str>, &str)> = root
        .map(|root| {
            root.namespaces
                .iter()
                .map(|(prefix, uri)| (prefix.as_deref(), uri.as_str()))
                .collect()
        })
        .unwrap_or_default();
    for (prefix, uri) in [("w", W_NS), ("r", R_NS)] {
        if !namespaces.iter().any(|(known, _)| *known == Some(prefix)) {
            namespaces.push((Some(prefix), uri));
        }
    }

    let mut tag = String::from("<w:document");
    for (prefix, uri) in &namespaces {
        match prefix {
            Some(prefix) => tag.push_str(&format!(r#" xmlns:{prefix}="{}""#, escape(uri))),
            None => tag.push_str(&format!(r#" xmlns="{}""#, escape(uri))),
        }
    }
    let compatibility = namespaces
        .iter()
        .find(|(_, uri)| *uri == MC_NS)
        .and_then(|(prefix, _)| *prefix);
    if let (Some(mc), Some(root)) = (compatibility, root) {
        let ignorable: Vec<&str> = root
            .ignorable
            .iter()
            .map(String::as_str)
            .filter(|prefix| namespaces.iter().any(|(known, _)| *known == Some(*prefix)))
            .collect();
        if !ignorable.is_empty() {
            tag.push_str(&format!(r#" {mc}:Ignorable="{}""#, ignorable.join(" ")));
        }
    }
    tag.push('>');
    tag
}

fn section_properties_xml(section: &Section, new_header: Option<&str>) -> String {
    let reference = |needed: bool| {
        new_header
            .filter(|_| needed)
            .map(|id| format!(r#"<w:headerReference w:type="default" r:id="{id}"/>"#))
            .unwrap_or_default()
    };
    match section.properties.get() {
        Some(properties) => {
            let mut xml = properties.tags.open.clone();
            xml.push_str(&reference(properties.default_header.is_none()));
            for child in &properties.children {
                xml.push_str(&child.xml);
            }
            xml.push_str(&properties.tags.close);
            xml
        }
        None => format!("<w:sectPr>{}{SECTION_PROPERTIES}</w:sectPr>", reference(true)),
    }
}

fn write_section(xml: &mut String, section: &Section) {
    for block in &section.blocks {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(xml, paragraph),
            Block::Table(table) => write_table(xml, table),
            Block::Raw(raw) => xml.push_str(&raw.xml),
        }
    }
}

fn write_paragraph(xml: &mut String, paragraph: &Paragraph) {
    let Some(source) = paragraph.source.get() else {
        xml.push_str("<w:p>");
        let properties: String = generated_properties(paragraph)
            .into_iter()
            .map(|(_, element)| element)
            .collect();
        if !properties.is_empty() {
            xml.push_str(&format!("<w:pPr>{properties}</w:pPr>"));
        }
        if !paragraph.text.is_empty() {
            write_run(xml, &paragraph.text, None);
        }
        xml.push_str("</w:p>");
        return;
    };

    xml.push_str(&source.tags.open);
    let properties = edited_properties(paragraph, source);
    if !properties.is_empty() {
        xml.push_str(&format!("<w:pPr>{properties}</w:pPr>"));
    }
    if paragraph.text == source.text {
        for item in &source.content {
            xml.push_str(&item.xml);
        }
    } else if !paragraph.text.is_empty() {
        write_run(xml, &paragraph.text, source.run_properties.as_deref());
    }
    xml.push_str(&source.tags.close);
}

/// Source `w:pPr` children, with those the model edited regenerated.
fn edited_properties(paragraph: &Paragraph, source: &ParagraphSource) -> String {
    let now = &paragraph.format;
    let then = &source.format;
    let edited = |name: &str| match name {
        "pStyle" => paragraph.style != source.style,
        "spacing" => {
            now.before_spacing != then.before_spacing
                || now.after_spacing != then.after_spacing
                || now.line_spacing != then.line_spacing
                || now.line_spacing_rule != then.line_spacing_rule
        }
        "ind" => {
            now.left_indent != then.left_indent
                || now.right_indent != then.right_indent
                || now.first_line_indent != then.first_line_indent
        }
        "jc" => now.alignment != then.alignment,
        _ => false,
    };

    let mut children: Vec<(&str, String)> = source
        .properties
        .iter()
        .filter(|property| !edited(&property.name))
        .map(|property| (property.name.as_str(), property.xml.clone()))
        .collect();
    children.extend(
        generated_properties(paragraph)
            .into_iter()
            .filter(|(name, _)| edited(name)),
    );
    children.sort_by_key(|(name, _)| {
        PARAGRAPH_PROPERTY_ORDER
            .iter()
            .position(|known| known == name)
            .unwrap_or(PARAGRAPH_PROPERTY_ORDER.len())
    });
    children.into_iter().map(|(_, element)| element).collect()
}

/// The `w:pPr` children the model controls, by local name.
fn generated_properties(paragraph: &Paragraph) -> Vec<(&'static str, String)> {
    let mut properties = Vec::new();
    if let Some(style) = &paragraph.style {
        properties.push(("pStyle", format!(r#"<w:pStyle w:val="{}"/>"#, escape(style))));
    }
    let format = &paragraph.format;
    let defaults = ParagraphFormat::default();

    let spacing_changed = format.before_spacing != defaults.before_spacing
        || format.after_spacing != defaults.after_spacing
        || format.line_spacing != defaults.line_spacing
        || format.line_spacing_rule != defaults.line_spacing_rule;
    if spacing_changed {
        let rule = match format.line_spacing_rule {
            LineSpacingRule::AtLeast => "atLeast",
            LineSpacingRule::Exactly => "exact",
            LineSpacingRule::Multiple => "auto",
        };
        properties.push((
            "spacing",
            format!(
                r#"<w:spacing w:before="{}" w:after="{}" w:line="{}" w:lineRule="{rule}"/>"#,
                twips(format.before_spacing),
                twips(format.after_spacing),
                twips(format.line_spacing),
            ),
        ));
    }

    let indent_changed = format.left_indent != 0.0
        || format.right_indent != 0.0
        || format.first_line_indent != 0.0;
    if indent_changed {
        let first_line = if format.first_line_indent < 0.0 {
            format!(r#" w:hanging="{}""#, twips(-format.first_line_indent))
        } else {
            format!(r#" w:firstLine="{}""#, twips(format.first_line_indent))
        };
        properties.push((
            "ind",
            format!(
                r#"<w:ind w:left="{}" w:right="{}"{first_line}/>"#,
                twips(format.left_indent),
                twips(format.right_indent),
            ),
        ));
    }

    let justification = match format.alignment {
        Alignment::Left => None,
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
        Alignment::Justify => Some("both"),
    };
    if let Some(value) = justification {
        properties.push(("jc", format!(r#"<w:jc w:val="{value}"/>"#)));
    }
    properties
}

fn write_run(xml: &mut String, text: &str, run_properties: Option<&str>) {
    xml.push_str("<w:r>");
    if let Some(run_properties) = run_properties {
        xml.push_str(run_properties);
    }
    let mut pending = String::new();
    for ch in text.chars() {
        match ch {
            '\t' => {
                flush(xml, &mut pending);
                xml.push_str("<w:tab/>");
            }
            '\n' => {
                flush(xml, &mut pending);
                xml.push_str("<w:br/>");
            }
            '\r' => {}
            ch => pending.push(ch),
        }
    }
    flush(xml, &mut pending);
    xml.push_str("</w:r>");
}

fn flush(xml: &mut String, pending: &mut String) {
    if !pending.is_empty() {
        xml.push_str(r#"<w:t xml:space="preserve">"#);
        xml.push_str(&escape(pending));
        xml.push_str("</w:t>");
        pending.clear();
    }
}

fn table_style_element(table: &Table) -> String {
    match table.style.as_deref() {
        Some(style) => {
            let id = styles::table_style_id(style)
                .map(str::to_string)
                .unwrap_or_else(|| escape(style));
            format!(r#"<w:tblStyle w:val="{id}"/>"#)
        }
        None => String::new(),
    }
}

/// Swaps the `w:tblStyle` of a source `w:tblPr`, keeping its other
/// children.
fn restyle_table_properties(properties: &str, style: &str) -> String {
    if let Some(start) = properties.find("<w:tblStyle")
        && let Some(length) = properties[start..].find("/>")
    {
        let end = start + length + 2;
        return format!("{}{style}{}", &properties[..start], &properties[end..]);
    }
    if let Some(open) = properties.strip_suffix("/>") {
        return format!("{}>{style}</w:tblPr>", open.trim_end());
    }
    match properties.find('>') {
        Some(end) => format!("{}{style}{}", &properties[..=end], &properties[end + 1..]),
        None => properties.to_string(),
    }
}

fn write_table(xml: &mut String, table: &Table) {
    let columns = table
        .rows
        .iter()
        .map(|row| row.cells.len())
        .max()
        .unwrap_or(0)
        .max(1);
    let column_width = TEXT_WIDTH_TWIPS / columns;
    let source = table.source.get();

    match source {
        Some(source) => {
            xml.push_str(&source.tags.open);
            match &source.properties {
                Some(properties) if table.style == source.style => xml.push_str(properties),
                Some(properties) => {
                    xml.push_str(&restyle_table_properties(properties, &table_style_element(table)))
                }
                None => {
                    xml.push_str(&format!("<w:tblPr>{}</w:tblPr>", table_style_element(table)))
                }
            }
        }
        None => {
            xml.push_str("<w:tbl><w:tblPr>");
            xml.push_str(&table_style_element(table));
            xml.push_str(r#"<w:tblW w:w="0" w:type="auto"/>"#);
            if table.style.is_none() {
                xml.push_str(TABLE_BORDERS);
            }
            xml.push_str(r#"<w:tblLook w:val="04A0"/></w:tblPr>"#);
        }
    }
    match source.and_then(|source| source.grid.as_deref()) {
        Some(grid) => xml.push_str(grid),
        None => {
            xml.push_str("<w:tblGrid>");
            for _ in 0..columns {
                xml.push_str(&format!(r#"<w:gridCol w:w="{column_width}"/>"#));
            }
            xml.push_str("</w:tblGrid>");
        }
    }

    for row in &table.rows {
        write_row(xml, row, column_width);
    }
    xml.push_str(source.map_or("</w:tbl>", |source| source.tags.close.as_str()));
}

fn write_row(xml: &mut String, row: &Row, column_width: usize) {
    let source = row.source.get();
    match source {
        Some(source) => {
            xml.push_str(&source.tags.open);
            for item in &source.leading {
                xml.push_str(&item.xml);
            }
        }
        None => xml.push_str("<w:tr>"),
    }
    for cell in &row.cells {
        write_cell(xml, cell, column_width);
    }
    xml.push_str(source.map_or("</w:tr>", |source| source.tags.close.as_str()));
}

fn write_cell(xml: &mut String, cell: &Cell, column_width: usize) {
    let source = cell.source.get();
    match source {
        Some(source) => {
            xml.push_str(&source.tags.open);
            if let Some(properties) = &source.properties {
                xml.push_str(properties);
            }
        }
        None => xml.push_str(&format!(
            r#"<w:tc><w:tcPr><w:tcW w:w="{column_width}" w:type="dxa"/></w:tcPr>"#
        )),
    }

    // A cell must end with a paragraph.
    let mut ends_with_paragraph = false;
    let mut extra = source
        .map(|source| source.extra.as_slice())
        .unwrap_or_default()
        .iter()
        .peekable();
    for (index, paragraph) in cell.paragraphs.iter().enumerate() {
        while let Some((_, item)) = extra.next_if(|(at, _)| *at <= index) {
            xml.push_str(&item.xml);
        }
        write_paragraph(xml, paragraph);
        ends_with_paragraph = true;
    }
    for (_, item) in extra {
        xml.push_str(&item.xml);
        ends_with_paragraph = false;
    }
    if !ends_with_paragraph {
        xml.push_str("<w:p/>");
    }
    xml.push_str(source.map_or("</w:tc>", |source| source.tags.close.as_str()));
}

/// A watermark run that declares its own namespaces, so it can go into any
/// header part.
fn watermark_run(watermark: &Watermark) -> String {
    let rotation = match watermark.layout {
        WatermarkLayout::Diagonal => 315,
        WatermarkLayout::Horizontal => 0,
    };
    let mut xml = format!(
        r#"<w:r xmlns:w="{W_NS}" xmlns:v="{VML_NS}" xmlns:o="{OFFICE_NS}" xmlns:w10="{WORD10_NS}"><w:pict>"#
    );
    xml.push_str(r#"<v:shapetype id="_x0000_t136" coordsize="21600,21600" o:spt="136" adj="10800"><v:path textpathok="t" o:connecttype="custom"/><v:textpath on="t" fitshape="t"/><o:lock v:ext="edit" text="t" shapetype="t"/></v:shapetype>"#);
    xml.push_str(&format!(
        r##"<v:shape id="PowerPlusWaterMarkObject1" o:spid="_x0000_s2049" type="#_x0000_t136" style="position:absolute;margin-left:0;margin-top:0;width:468pt;height:117pt;rotation:{rotation};z-index:-251657216;mso-position-horizontal:center;mso-position-horizontal-relative:margin;mso-position-vertical:center;mso-position-vertical-relative:margin" o:allowincell="f" fillcolor="#{color}" stroked="f"><v:fill opacity=".5"/><v:textpath style="font-family:&quot;Calibri&quot;;font-size:{size}pt" string="{text}"/><w10:wrap anchorx="margin" anchory="margin"/></v:shape>"##,
        color = escape(&watermark.color),
        size = watermark.font_size,
        text = escape(&watermark.text),
    ));
    xml.push_str("</w:pict></w:r>");
    xml
}

fn watermark_paragraph(run: &str) -> String {
    format!(r#"<w:p xmlns:w="{W_NS}"><w:pPr><w:pStyle w:val="Header"/></w:pPr>{run}</w:p>"#)
}

fn header_xml(paragraph: &str) -> String {
    let mut xml = String::from(XML_DECLARATION);
    xml.push_str(&format!(
        r#"<w:hdr xmlns:w="{W_NS}" xmlns:r="{R_NS}" xmlns:v="{VML_NS}" xmlns:o="{OFFICE_NS}" xmlns:w10="{WORD10_NS}">"#
    ));
    xml.push_str(paragraph);
    xml.push_str("</w:hdr>");
    xml
}

#[cfg(test)]
mod tests {
    use super::super::model::{PasswordHash, ProtectionLevel};
    use super::super::reader::read_document;
    use super::*;
    use std::io::Read;

    const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really an image";

    fn round_trip(document: &Document) -> Document {
        let bytes = write_document(document, PackageKind::Document).expect("write");
        read_document(&bytes).expect("read")
    }

    fn package(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(body).expect("write part");
        }
        writer.finish().expect("finish").into_inner()
    }

    fn part(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip");
        let mut file = archive.by_name(name).ok()?;
        let mut body = Vec::new();
        file.read_to_end(&mut body).expect("read part");
        Some(body)
    }

    fn part_text(bytes: &[u8], name: &str) -> String {
        String::from_utf8(part(bytes, name).unwrap_or_default()).expect("utf-8")
    }

    fn main_part(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}" xmlns:mc="{MC_NS}" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml" mc:Ignorable="w14"><w:body>{body}</w:body></w:document>"#
        )
    }

    /// A package shaped like one saved by Word: formatted runs, an image,
    /// a footer, a content control and Letter-sized pages.
    fn word_package() -> Vec<u8> {
        let document = main_part(concat!(
            r#"<w:p w14:paraId="1A2B3C4D"><w:r><w:t>Cover</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:keepNext/><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/></w:rPr><w:t>Quarterly numbers</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:rPr><w:i/></w:rPr><w:t>Chart</w:t></w:r><w:r><w:drawing><a:blip xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" r:embed="rIdImage"/></w:drawing></w:r></w:p>"#,
            r#"<w:sdt><w:sdtPr><w:alias w:val="Owner"/></w:sdtPr><w:sdtContent><w:p><w:r><w:t>Finance</w:t></w:r></w:p></w:sdtContent></w:sdt>"#,
            r#"<w:sectPr><w:footerReference w:type="default" r:id="rIdFooter"/><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr>"#,
        ));
        let rels = concat!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
            r#"<Relationship Id="rIdImage" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>"#,
            r#"<Relationship Id="rIdFooter" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>"#,
            r#"<Relationship Id="rIdLink" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>"#,
            "</Relationships>"
        );
        let types = concat!(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Default Extension="png" ContentType="image/png"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
            r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
            r#"<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#,
            "</Types>"
        );
        let styles = format!(
            r#"<w:styles xmlns:w="{W_NS}"><w:style w:type="paragraph" w:styleId="Custom"><w:name w:val="Custom"/></w:style></w:styles>"#
        );
        let footer = format!(r#"<w:ftr xmlns:w="{W_NS}"><w:p><w:r><w:t>Page footer</w:t></w:r></w:p></w:ftr>"#);
        package(&[
            ("[Content_Types].xml", types.as_bytes()),
            ("_rels/.rels", package_rels_xml().as_bytes()),
            ("word/document.xml", document.as_bytes()),
            ("word/_rels/document.xml.rels", rels.as_bytes()),
            ("word/styles.xml", styles.as_bytes()),
            ("word/footer1.xml", footer.as_bytes()),
            ("word/media/image1.png", IMAGE_BYTES),
        ])
    }

    #[test]
    fn escape_handles_markup_and_controls() {
        assert_eq!(escape("a<b>&\"c'\u{1}"), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn blank_document_round_trips_with_one_section() {
        let document = Document::blank();
        assert_eq!(round_trip(&document), document);
    }

    #[test]
    fn content_survives_round_trip() {
        let mut document = Document::blank();
        let mut styled = Paragraph::with_text("Title & <more>\twith tab\nand break");
        styled.format = ParagraphFormat {
            alignment: Alignment::Center,
            first_line_indent: -9.0,
            left_indent: 36.0,
            right_indent: 12.5,
            line_spacing: 18.0,
            line_spacing_rule: LineSpacingRule::AtLeast,
            before_spacing: 6.0,
            after_spacing: 3.0,
        };
        let mut table = Table::new(2, 3);
        table.style = Some("Table Grid".to_string());
        if let Some(cell) = table.cell_mut(1, 2) {
            cell.set_text("corner");
        }
        document.sections[0].blocks = vec![
            Block::Paragraph(styled),
            Block::Table(table),
            Block::Paragraph(Paragraph::default()),
        ];
        let mut second = Section::default();
        second.blocks.push(Block::Paragraph(Paragraph::with_text("second section")));
        document.sections.push(second);
        document.protection = Protection {
            level: ProtectionLevel::ReadOnly,
            password: Some(PasswordHash::with_salt("pw", b"0123456789abcdef", 5)),
        };
        document.watermark = Some(Watermark {
            text: "DRAFT \"1\"".to_string(),
            font_size: 65,
            color: "FF0000".to_string(),
            layout: WatermarkLayout::Diagonal,
        });

        assert_eq!(round_trip(&document), document);
    }

    #[test]
    fn horizontal_watermark_round_trips() {
        let mut document = Document::blank();
        document.watermark = Some(Watermark {
            text: "Confidential".to_string(),
            font_size: 40,
            color: "0000FF".to_string(),
            layout: WatermarkLayout::Horizontal,
        });
        assert_eq!(round_trip(&document).watermark, document.watermark);
    }

    #[test]
    fn template_kind_sets_main_content_type() {
        let bytes = write_document(&Document::blank(), PackageKind::Template).expect("write");
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("zip");
        let mut types = String::new();
        std::io::Read::read_to_string(
            &mut archive.by_name("[Content_Types].xml").expect("part"),
            &mut types,
        )
        .expect("read");
        assert!(types.contains("wordprocessingml.template.main+xml"));
    }

    #[test]
    fn editing_one_paragraph_keeps_the_rest_of_the_package() {
        let source = word_package();
        let mut document = read_document(&source).expect("read");
        assert_eq!(document.sections[0].paragraph_count(), 3);
        if let Some(paragraph) = document.sections[0].paragraph_mut(1) {
            paragraph.text = "Annual numbers".to_string();
        }

        let saved = write_document(&document, PackageKind::Document).expect("write");
        for name in ["word/media/image1.png", "word/footer1.xml", "word/styles.xml", "_rels/.rels"] {
            assert_eq!(part(&saved, name), part(&source, name), "{name} changed");
        }

        let main = part_text(&saved, DOCUMENT_PART);
        assert!(main.contains(r#"<w:r><w:rPr><w:b/><w:rFonts w:ascii="Arial" w:hAnsi="Arial"/></w:rPr><w:t xml:space="preserve">Annual numbers</w:t></w:r>"#));
        assert!(main.contains(r#"<w:pPr><w:keepNext/><w:jc w:val="center"/></w:pPr>"#));
        assert!(main.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));
        assert!(main.contains(r#"<w:footerReference w:type="default" r:id="rIdFooter"/>"#));
        assert!(main.contains(r#"r:embed="rIdImage""#));
        assert!(main.contains(r#"<w:p w14:paraId="1A2B3C4D">"#));
        assert!(main.contains(r#"mc:Ignorable="w14""#));
        assert!(main.contains("<w:alias w:val=\"Owner\"/>"));

        let rels = part_text(&saved, DOCUMENT_RELS_PART);
        assert!(rels.contains(r#"Id="rIdImage""#));
        assert!(rels.contains(r#"TargetMode="External""#));
        assert!(part_text(&saved, CONTENT_TYPES_PART).contains(r#"Extension="png""#));

        let reread = read_document(&saved).expect("reread");
        let texts: Vec<&str> = reread.sections[0].paragraphs().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["Cover", "Annual numbers", "Chart"]);
    }

    #[test]
    fn unedited_documents_keep_their_main_part_markup() {
        let source = word_package();
        let document = read_document(&source).expect("read");
        let saved = write_document(&document, PackageKind::Document).expect("write");
        let main = part_text(&saved, DOCUMENT_PART);
        assert!(main.contains(r#"<w:r><w:rPr><w:i/></w:rPr><w:t>Chart</w:t></w:r>"#));
        assert!(main.contains(r#"<w:r><w:t>Finance</w:t></w:r>"#));
        assert_eq!(read_document(&saved).expect("reread"), document);
    }

    #[test]
    fn restyled_paragraph_keeps_unrelated_properties() {
        let mut document = read_document(&word_package()).expect("read");
        if let Some(paragraph) = document.sections[0].paragraph_mut(1) {
            paragraph.style = Some("Heading1".to_string());
            paragraph.format.alignment = Alignment::Right;
        }
        let saved = write_document(&document, PackageKind::Document).expect("write");
        let main = part_text(&saved, DOCUMENT_PART);
        assert!(main.contains(
            r#"<w:pPr><w:pStyle w:val="Heading1"/><w:keepNext/><w:jc w:val="right"/></w:pPr>"#
        ));
        assert!(main.contains("Quarterly numbers"));
    }

    #[test]
    fn merged_content_drops_links_into_the_other_package() {
        let mut document = Document::blank();
        document.append_document(read_document(&word_package()).expect("read"));
        let saved = write_document(&document, PackageKind::Document).expect("write");

        let main = part_text(&saved, DOCUMENT_PART);
        assert!(!main.contains("rIdImage"));
        assert!(!main.contains("rIdFooter"));
        assert!(main.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));
        assert!(main.contains(r#"<w:r><w:rPr><w:i/></w:rPr><w:t xml:space="preserve">Chart</w:t></w:r>"#));
        assert!(part(&saved, "word/media/image1.png").is_none());

        let reread = read_document(&saved).expect("reread");
        assert_eq!(reread.sections.len(), 2);
        assert_eq!(reread.sections[1].paragraph_count(), 3);
    }

    #[test]
    fn macro_parts_only_survive_in_macro_packages() {
        let document = main_part(r#"<w:p><w:r><w:t>macro host</w:t></w:r></w:p><w:sectPr/>"#);
        let rels = concat!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId9" Type="http://schemas.microsoft.com/office/2006/relationships/vbaProject" Target="vbaProject.bin"/>"#,
            "</Relationships>"
        );
        let types = concat!(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="bin" ContentType="application/vnd.ms-office.vbaProject"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.ms-word.document.macroEnabled.main+xml"/>"#,
            "</Types>"
        );
        let source = package(&[
            ("[Content_Types].xml", types.as_bytes()),
            ("word/document.xml", document.as_bytes()),
            ("word/_rels/document.xml.rels", rels.as_bytes()),
            ("word/vbaProject.bin", &b"vba"[..]),
        ]);
        let document = read_document(&source).expect("read");

        let macro_enabled = write_document(&document, PackageKind::MacroDocument).expect("write");
        assert_eq!(part(&macro_enabled, "word/vbaProject.bin").as_deref(), Some(&b"vba"[..]));
        assert!(part_text(&macro_enabled, DOCUMENT_RELS_PART).contains("vbaProject"));

        let plain = write_document(&document, PackageKind::Document).expect("write");
        assert!(part(&plain, "word/vbaProject.bin").is_none());
        assert!(!part_text(&plain, DOCUMENT_RELS_PART).contains("vbaProject"));
        let types = part_text(&plain, CONTENT_TYPES_PART);
        assert!(!types.contains("vbaProject"));
        assert!(types.contains("wordprocessingml.document.main+xml"));
        assert!(part(&plain, PACKAGE_RELS_PART).is_some());
    }

    #[test]
    fn protection_is_patched_into_existing_settings() {
        let settings = format!(
            r#"<w:settings xmlns:w="{W_NS}"><w:zoom w:percent="120"/><w:defaultTabStop w:val="708"/></w:settings>"#
        );
        let source = package(&[
            ("word/document.xml", main_part("<w:sectPr/>").as_bytes()),
            ("word/settings.xml", settings.as_bytes()),
        ]);
        let mut document = read_document(&source).expect("read");
        document.protection = Protection {
            level: ProtectionLevel::ReadOnly,
            password: None,
        };
        let protected = write_document(&document, PackageKind::Document).expect("write");
        assert_eq!(
            part_text(&protected, SETTINGS_PART),
            format!(
                r#"<w:settings xmlns:w="{W_NS}"><w:zoom w:percent="120"/><w:documentProtection w:edit="readOnly" w:enforcement="1"/><w:defaultTabStop w:val="708"/></w:settings>"#
            )
        );

        let mut reread = read_document(&protected).expect("reread");
        assert_eq!(reread.protection.level, ProtectionLevel::ReadOnly);
        reread.protection = Protection::default();
        let unprotected = write_document(&reread, PackageKind::Document).expect("write");
        assert_eq!(part_text(&unprotected, SETTINGS_PART), settings);
    }

    #[test]
    fn watermark_joins_an_existing_default_header() {
        let header = format!(
            r#"<w:hdr xmlns:w="{W_NS}"><w:p><w:r><w:t>Acme Corp</w:t></w:r></w:p></w:hdr>"#
        );
        let rels = concat!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rIdHead" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#,
            "</Relationships>"
        );
        let body = r#"<w:p><w:r><w:t>body</w:t></w:r></w:p><w:sectPr><w:headerReference w:type="default" r:id="rIdHead"/></w:sectPr>"#;
        let source = package(&[
            ("word/document.xml", main_part(body).as_bytes()),
            ("word/_rels/document.xml.rels", rels.as_bytes()),
            ("word/header1.xml", header.as_bytes()),
        ]);

        let mut document = read_document(&source).expect("read");
        let watermark = Watermark {
            text: "SECRET".to_string(),
            font_size: 54,
            color: "C0C0C0".to_string(),
            layout: WatermarkLayout::Diagonal,
        };
        document.watermark = Some(watermark.clone());
        let marked = write_document(&document, PackageKind::Document).expect("write");
        let header_xml = part_text(&marked, "word/header1.xml");
        assert!(header_xml.contains("Acme Corp"));
        assert!(header_xml.contains("PowerPlusWaterMarkObject"));
        assert!(part(&marked, "word/header2.xml").is_none());
        assert_eq!(part_text(&marked, DOCUMENT_PART).matches("headerReference").count(), 1);

        let mut reread = read_document(&marked).expect("reread");
        assert_eq!(reread.watermark, Some(watermark));
        reread.watermark = None;
        let cleared = write_document(&reread, PackageKind::Document).expect("write");
        let header_xml = part_text(&cleared, "word/header1.xml");
        assert!(header_xml.contains("Acme Corp"));
        assert!(!header_xml.contains("PowerPlusWaterMarkObject"));
        assert_eq!(read_document(&cleared).expect("reread").watermark, None);
    }

    #[test]
    fn new_tables_bring_their_style_into_an_existing_styles_part() {
        let source = word_package();
        let mut document = read_document(&source).expect("read");
        let mut table = Table::new(1, 1);
        table.style = Some("Light List".to_string());
        document.sections[0].insert_table(None, table);

        let saved = write_document(&document, PackageKind::Document).expect("write");
        let styles_xml = part_text(&saved, STYLES_PART);
        assert!(styles_xml.contains(r#"w:styleId="Custom""#));
        assert!(styles_xml.contains(r#"w:styleId="LightList""#));
        assert!(styles_xml.contains(r#"w:styleId="TableNormal""#));

        let unchanged = write_document(&read_document(&saved).expect("reread"), PackageKind::Document)
            .expect("write");
        assert_eq!(part_text(&unchanged, STYLES_PART), styles_xml);
    }
}
