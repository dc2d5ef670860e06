use std::io::{Cursor, Read};
use std::ops::Range;
use std::sync::Arc;

use regex::Regex;
use roxmltree::Node;
use zip::ZipArchive;

use super::model::{
    Alignment, Block, Cell, CellSource, Document, LineSpacingRule, Paragraph, ParagraphFormat,
    ParagraphSource, PartSpan, PasswordHash, Preserved, Protection, ProtectionLevel, RawXml,
    RootMarkup, Row, RowSource, Section, SectionProperties, SourcePackage, Table, TableSource,
    Tags, Watermark, WatermarkLayout,
};
use super::styles;
use super::{DOCUMENT_PART, EngineError, MC_NS, R_NS, SETTINGS_PART, TWIPS_PER_POINT, W_NS};

const WATERMARK_SHAPE_PREFIX: &str = "PowerPlusWaterMarkObject";
/// Paragraph children that carry no content of their own.
const MARKER_CONTENT: &[&str] = &["bookmarkStart", "bookmarkEnd", "proofErr", "permStart", "permEnd"];

pub fn read_document(bytes: &[u8]) -> Result<Document, EngineError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let document_xml = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| EngineError::MissingPart(DOCUMENT_PART.to_string()))?;
    let (root, sections) = parse_main_part(&document_xml)?;

    let protection = match read_part(&mut archive, SETTINGS_PART)? {
        Some(xml) => parse_protection(&xml)?,
        None => Protection::default(),
    };

    let mut header_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("word/header") && name.ends_with(".xml"))
        .map(str::to_string)
        .collect();
    header_names.sort();
    let mut watermark = None;
    let mut watermark_location = None;
    for name in header_names {
        if let Some(xml) = read_part(&mut archive, &name)?
            && let Some((found, span)) = parse_watermark(&xml)?
        {
            watermark = Some(found);
            watermark_location = span.map(|span| PartSpan {
                part: name,
                start: span.start,
                end: span.end,
            });
            break;
        }
    }

    Ok(Document {
        sections,
        protection: protection.clone(),
        watermark: watermark.clone(),
        root: Preserved::new(root),
        package: Preserved::new(SourcePackage {
            bytes: Arc::from(bytes),
            protection,
            watermark,
            watermark_location,
        }),
    })
}

pub(super) fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, EngineError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

pub(super) fn is_w(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name && node.tag_name().namespace() == Some(W_NS)
}

fn w_child<'a, 'input>(node: &Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_w(child, name))
}

fn w_attr<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((W_NS, name))
}

fn w_attr_f64(node: &Node, name: &str) -> Option<f64> {
    w_attr(node, name).and_then(|value| value.trim().parse::<f64>().ok())
}

fn slice(xml: &str, node: &Node) -> String {
    xml[node.range()].to_string()
}

fn raw(xml: &str, node: &Node) -> RawXml {
    let linked = node.descendants().any(|descendant| {
        descendant.is_element()
            && descendant
                .attributes()
                .any(|attribute| attribute.namespace() == Some(R_NS))
    });
    RawXml {
        name: node.tag_name().name().to_string(),
        xml: slice(xml, node),
        linked,
    }
}

/// Splits an element into its start tag and a matching end tag. A
/// self-closing element gets an explicit pair.
fn tags(xml: &str, node: &Node) -> Tags {
    let element = &xml[node.range()];
    let mut quote = None;
    let mut open_end = element.len();
    for (index, ch) in element.char_indices() {
        match (quote, ch) {
            (Some(q), ch) if ch == q => quote = None,
            (None, '"' | '\'') => quote = Some(ch),
            (None, '>') => {
                open_end = index + 1;
                break;
            }
            _ => {}
        }
    }
    let start = &element[..open_end];
    let qualified = start[1..]
        .split(|ch: char| ch.is_whitespace() || ch == '/' || ch == '>')
        .next()
        .unwrap_or_default();
    let open = match start.strip_suffix("/>") {
        Some(body) => format!("{}>", body.trim_end()),
        None => start.to_string(),
    };
    Tags {
        open,
        close: format!("</{qualified}>"),
    }
}

/// Where the end tag of `node` starts, or `None` when it is self-closing.
pub(super) fn closing_tag_start(xml: &str, node: &Node) -> Option<usize> {
    let element = &xml[..node.range().end];
    if element.ends_with("/>") {
        return None;
    }
    element.rfind("</")
}

fn parse_main_part(xml: &str) -> Result<(RootMarkup, Vec<Section>), EngineError> {
    let doc = roxmltree::Document::parse(xml)?;
    let root = doc.root_element();
    let body = w_child(&root, "body")
        .ok_or_else(|| EngineError::Malformed("document part has no body".to_string()))?;

    let markup = RootMarkup {
        namespaces: root
            .namespaces()
            .filter(|namespace| namespace.name() != Some("xml"))
            .map(|namespace| {
                (
                    namespace.name().map(str::to_string),
                    namespace.uri().to_string(),
                )
            })
            .collect(),
        ignorable: root
            .attribute((MC_NS, "Ignorable"))
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        leading: root
            .children()
            .filter(Node::is_element)
            .take_while(|child| !is_w(child, "body"))
            .map(|child| slice(xml, &child))
            .collect(),
    };

    let mut sections = Vec::new();
    let mut current = Section::default();
    let mut has_final_section = false;

    for child in body.children().filter(Node::is_element) {
        if is_w(&child, "p") {
            let section_properties = w_child(&child, "pPr").and_then(|ppr| w_child(&ppr, "sectPr"));
            let paragraph = parse_paragraph(xml, &child);
            // A section break carried by an empty paragraph is only a marker.
            let marker = section_properties.is_some()
                && paragraph.text.is_empty()
                && paragraph.source.get().is_some_and(|source| {
                    source
                        .content
                        .iter()
                        .all(|item| MARKER_CONTENT.contains(&item.name.as_str()))
                });
            if !marker {
                current.blocks.push(Block::Paragraph(paragraph));
            }
            if let Some(properties) = section_properties {
                current.properties = Preserved::new(parse_section_properties(xml, &properties));
                sections.push(std::mem::take(&mut current));
            }
        } else if is_w(&child, "tbl") {
            current.blocks.push(Block::Table(parse_table(xml, &child)));
        } else if is_w(&child, "sectPr") {
            current.properties = Preserved::new(parse_section_properties(xml, &child));
            has_final_section = true;
        } else {
            current.blocks.push(Block::Raw(raw(xml, &child)));
        }
    }

    if has_final_section || !current.blocks.is_empty() {
        sections.push(current);
    }
    Ok((markup, sections))
}

fn parse_section_properties(xml: &str, node: &Node) -> SectionProperties {
    let default_header = node
        .children()
        .filter(|child| is_w(child, "headerReference"))
        .find(|reference| w_attr(reference, "type").is_none_or(|kind| kind == "default"))
        .and_then(|reference| reference.attribute((R_NS, "id")))
        .map(str::to_string);
    SectionProperties {
        tags: tags(xml, node),
        children: node
            .children()
            .filter(Node::is_element)
            .map(|child| raw(xml, &child))
            .collect(),
        default_header,
    }
}

fn parse_paragraph(xml: &str, node: &Node) -> Paragraph {
    let mut text = String::new();
    collect_text(node, &mut text);

    let ppr = w_child(node, "pPr");
    let style = ppr
        .and_then(|ppr| w_child(&ppr, "pStyle"))
        .and_then(|style| w_attr(&style, "val"))
        .map(str::to_string);
    let format = ppr.map(|ppr| parse_format(&ppr)).unwrap_or_default();
    let properties = ppr
        .map(|ppr| {
            ppr.children()
                .filter(|child| child.is_element() && !is_w(child, "sectPr"))
                .map(|child| raw(xml, &child))
                .collect()
        })
        .unwrap_or_default();
    let content = node
        .children()
        .filter(|child| child.is_element() && !is_w(child, "pPr"))
        .map(|child| raw(xml, &child))
        .collect();
    let run_properties = node
        .descendants()
        .find(|descendant| is_w(descendant, "r"))
        .and_then(|run| w_child(&run, "rPr"))
        .map(|rpr| slice(xml, &rpr));

    Paragraph {
        text: text.clone(),
        style: style.clone(),
        format,
        source: Preserved::new(ParagraphSource {
            tags: tags(xml, node),
            properties,
            content,
            run_properties,
            text,
            style,
            format,
        }),
    }
}

fn collect_text(node: &Node, out: &mut String) {
    for child in node.children().filter(Node::is_element) {
        if child.tag_name().namespace() != Some(W_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => out.push_str(child.text().unwrap_or("")),
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            "pPr" | "rPr" | "del" | "delText" | "instrText" | "tbl" => {}
            _ => collect_text(&child, out),
        }
    }
}

fn parse_format(ppr: &Node) -> ParagraphFormat {
    let mut format = ParagraphFormat::default();

    if let Some(jc) = w_child(ppr, "jc").and_then(|jc| w_attr(&jc, "val")) {
        format.alignment = match jc {
            "center" => Alignment::Center,
            "right" | "end" => Alignment::Right,
            "both" | "distribute" => Alignment::Justify,
            _ => Alignment::Left,
        };
    }

    if let Some(ind) = w_child(ppr, "ind") {
        let left = w_attr_f64(&ind, "left").or_else(|| w_attr_f64(&ind, "start"));
        let right = w_attr_f64(&ind, "right").or_else(|| w_attr_f64(&ind, "end"));
        format.left_indent = left.unwrap_or(0.0) / TWIPS_PER_POINT;
        format.right_indent = right.unwrap_or(0.0) / TWIPS_PER_POINT;
        format.first_line_indent = match (w_attr_f64(&ind, "firstLine"), w_attr_f64(&ind, "hanging")) {
            (Some(first_line), _) => first_line / TWIPS_PER_POINT,
            (None, Some(hanging)) => -hanging / TWIPS_PER_POINT,
            (None, None) => 0.0,
        };
    }

    if let Some(spacing) = w_child(ppr, "spacing") {
        if let Some(before) = w_attr_f64(&spacing, "before") {
            format.before_spacing = before / TWIPS_PER_POINT;
        }
        if let Some(after) = w_attr_f64(&spacing, "after") {
            format.after_spacing = after / TWIPS_PER_POINT;
        }
        if let Some(line) = w_attr_f64(&spacing, "line") {
            format.line_spacing = line / TWIPS_PER_POINT;
            format.line_spacing_rule = match w_attr(&spacing, "lineRule") {
                Some("exact") => LineSpacingRule::Exactly,
                Some("atLeast") => LineSpacingRule::AtLeast,
                _ => LineSpacingRule::Multiple,
            };
        }
    }

    format
}

fn parse_table(xml: &str, node: &Node) -> Table {
    let tblpr = w_child(node, "tblPr");
    let style = tblpr
        .and_then(|tblpr| w_child(&tblpr, "tblStyle"))
        .and_then(|style| w_attr(&style, "val"))
        .map(|id| {
            styles::table_style_name(id)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string())
        });

    let rows = node
        .children()
        .filter(|child| is_w(child, "tr"))
        .map(|tr| parse_row(xml, &tr))
        .collect();

    Table {
        style: style.clone(),
        rows,
        source: Preserved::new(TableSource {
            tags: tags(xml, node),
            properties: tblpr.map(|tblpr| slice(xml, &tblpr)),
            grid: w_child(node, "tblGrid").map(|grid| slice(xml, &grid)),
            style,
        }),
    }
}

fn parse_row(xml: &str, node: &Node) -> Row {
    let mut cells = Vec::new();
    let mut leading = Vec::new();
    for child in node.children().filter(Node::is_element) {
        if is_w(&child, "tc") {
            cells.push(parse_cell(xml, &child));
        } else {
            leading.push(raw(xml, &child));
        }
    }
    Row {
        cells,
        source: Preserved::new(RowSource {
            tags: tags(xml, node),
            leading,
        }),
    }
}

fn parse_cell(xml: &str, node: &Node) -> Cell {
    let mut paragraphs = Vec::new();
    let mut properties = None;
    let mut extra = Vec::new();
    for child in node.children().filter(Node::is_element) {
        if is_w(&child, "tcPr") {
            properties = Some(slice(xml, &child));
        } else if is_w(&child, "p") {
            paragraphs.push(parse_paragraph(xml, &child));
        } else {
            extra.push((paragraphs.len(), raw(xml, &child)));
        }
    }
    Cell {
        paragraphs,
        source: Preserved::new(CellSource {
            tags: tags(xml, node),
            properties,
            extra,
        }),
    }
}

fn parse_protection(xml: &str) -> Result<Protection, EngineError> {
    let doc = roxmltree::Document::parse(xml)?;
    let Some(node) = doc
        .root_element()
        .children()
        .find(|child| is_w(child, "documentProtection"))
    else {
        return Ok(Protection::default());
    };

    let enforced = matches!(w_attr(&node, "enforcement"), Some("1" | "true" | "on"));
    let level = w_attr(&node, "edit")
        .and_then(ProtectionLevel::from_edit_value)
        .unwrap_or(ProtectionLevel::None);
    if !enforced || level == ProtectionLevel::None {
        return Ok(Protection::default());
    }

    let password = match (
        w_attr(&node, "algorithmName"),
        w_attr(&node, "hashValue"),
        w_attr(&node, "saltValue"),
    ) {
        (Some(algorithm), Some(hash), Some(salt)) => Some(PasswordHash {
            algorithm_name: algorithm.to_string(),
            hash_value: hash.to_string(),
            salt_value: salt.to_string(),
            spin_count: w_attr(&node, "spinCount")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0),
        }),
        _ => None,
    };

    Ok(Protection { level, password })
}

/// Finds a watermark shape in a header part, with the byte range of the
/// run holding it.
fn parse_watermark(xml: &str) -> Result<Option<(Watermark, Option<Range<usize>>)>, EngineError> {
    let doc = roxmltree::Document::parse(xml)?;
    let Some(shape) = doc.descendants().find(|node| {
        node.is_element()
            && node.tag_name().name() == "shape"
            && node
                .attribute("id")
                .is_some_and(|id| id.starts_with(WATERMARK_SHAPE_PREFIX))
    }) else {
        return Ok(None);
    };
    let Some(textpath) = shape
        .children()
        .find(|child| child.is_element() && child.tag_name().name() == "textpath")
    else {
        return Ok(None);
    };

    let shape_style = shape.attribute("style").unwrap_or("");
    let layout = match style_value(shape_style, "rotation") {
        Some(rotation) if rotation != "0" => WatermarkLayout::Diagonal,
        _ => WatermarkLayout::Horizontal,
    };
    let font_size = style_value(textpath.attribute("style").unwrap_or(""), "font-size")
        .and_then(|size| size.trim_end_matches("pt").trim().parse::<f64>().ok())
        .map(|size| size.round() as u32)
        .unwrap_or(0);
    let color = shape
        .attribute("fillcolor")
        .unwrap_or("#808080")
        .trim_start_matches('#')
        .to_ascii_uppercase();

    let span = shape
        .ancestors()
        .find(|ancestor| is_w(ancestor, "r"))
        .map(|run| run.range());

    Ok(Some((
        Watermark {
            text: textpath.attribute("string").unwrap_or("").to_string(),
            font_size,
            color,
            layout,
        },
        span,
    )))
}

/// Looks up `key` in a CSS-like `a:b;c:d` style string.
fn style_value<'a>(style: &'a str, key: &str) -> Option<&'a str> {
    let pattern = Regex::new(&format!(r"(?:^|;)\s*{}\s*:\s*([^;]+)", regex::escape(key))).ok()?;
    pattern
        .captures(style)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(body.as_bytes()).expect("write part");
        }
        writer.finish().expect("finish").into_inner()
    }

    fn body(inner: &str) -> String {
        format!(
            r#"<w:document xmlns:w="{W_NS}"><w:body>{inner}</w:body></w:document>"#
        )
    }

    #[test]
    fn empty_body_has_no_sections() {
        let bytes = package(&[(DOCUMENT_PART, &body(""))]);
        let document = read_document(&bytes).expect("document");
        assert!(document.sections.is_empty());
    }

    #[test]
    fn reads_text_runs_tabs_and_breaks() {
        let xml = body(
            r#"<w:p><w:r><w:t>Hello</w:t><w:tab/><w:t xml:space="preserve"> big</w:t></w:r>
               <w:del><w:r><w:delText>gone</w:delText></w:r></w:del>
               <w:hyperlink><w:r><w:br/><w:t>world</w:t></w:r></w:hyperlink></w:p><w:sectPr/>"#,
        );
        let document = read_document(&package(&[(DOCUMENT_PART, &xml)])).expect("document");
        assert_eq!(document.sections.len(), 1);
        let paragraph = document.sections[0].paragraph(0).expect("paragraph");
        assert_eq!(paragraph.text, "Hello\t big\nworld");
    }

    #[test]
    fn section_marker_paragraphs_split_sections() {
        let xml = body(
            r#"<w:p><w:r><w:t>one</w:t></w:r></w:p>
               <w:p><w:pPr><w:sectPr/></w:pPr></w:p>
               <w:p><w:r><w:t>two</w:t></w:r></w:p><w:sectPr/>"#,
        );
        let document = read_document(&package(&[(DOCUMENT_PART, &xml)])).expect("document");
        assert_eq!(document.sections.len(), 2);
        assert_eq!(document.sections[0].paragraph_count(), 1);
        assert_eq!(document.sections[1].paragraph(0).map(|p| p.text.as_str()), Some("two"));
    }

    #[test]
    fn reads_paragraph_format() {
        let xml = body(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/>
                 <w:spacing w:before="120" w:after="240" w:line="360" w:lineRule="auto"/>
                 <w:ind w:left="720" w:right="360" w:hanging="180"/><w:jc w:val="both"/></w:pPr>
               <w:r><w:t>x</w:t></w:r></w:p><w:sectPr/>"#,
        );
        let document = read_document(&package(&[(DOCUMENT_PART, &xml)])).expect("document");
        let paragraph = document.sections[0].paragraph(0).expect("paragraph");
        assert_eq!(paragraph.style.as_deref(), Some("Heading1"));
        let format = paragraph.format;
        assert_eq!(format.alignment, Alignment::Justify);
        assert_eq!(format.left_indent, 36.0);
        assert_eq!(format.right_indent, 18.0);
        assert_eq!(format.first_line_indent, -9.0);
        assert_eq!(format.before_spacing, 6.0);
        assert_eq!(format.after_spacing, 12.0);
        assert_eq!(format.line_spacing, 18.0);
        assert_eq!(format.line_spacing_rule, LineSpacingRule::Multiple);
    }

    #[test]
    fn reads_tables_and_protection() {
        let xml = body(
            r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/></w:tblPr>
                 <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc/></w:tr>
               </w:tbl><w:sectPr/>"#,
        );
        let settings = format!(
            r#"<w:settings xmlns:w="{W_NS}"><w:documentProtection w:edit="forms" w:enforcement="1"/></w:settings>"#
        );
        let bytes = package(&[(DOCUMENT_PART, &xml), (SETTINGS_PART, &settings)]);
        let document = read_document(&bytes).expect("document");
        let table = document.sections[0].table(0).expect("table");
        assert_eq!(table.style.as_deref(), Some("Table Grid"));
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.cell(0, 0).map(Cell::text).as_deref(), Some("a"));
        assert!(table.cell(0, 1).expect("cell").paragraphs.is_empty());
        assert_eq!(document.protection.level, ProtectionLevel::FormFilling);
        assert!(document.protection.password.is_none());
    }

    #[test]
    fn missing_document_part_is_an_error() {
        let bytes = package(&[("word/styles.xml", "<x/>")]);
        assert!(matches!(
            read_document(&bytes),
            Err(EngineError::MissingPart(_))
        ));
    }

    #[test]
    fn style_value_picks_the_named_key() {
        let style = "position:absolute;rotation:315;width:468pt";
        assert_eq!(style_value(style, "rotation"), Some("315"));
        assert_eq!(style_value(style, "height"), None);
    }

    #[test]
    fn tags_pair_self_closing_elements() {
        let xml = r#"<a:b xmlns:a="urn:x" c="1>2"/>"#;
        let doc = roxmltree::Document::parse(xml).expect("xml");
        let tags = tags(xml, &doc.root_element());
        assert_eq!(tags.open, r#"<a:b xmlns:a="urn:x" c="1>2">"#);
        assert_eq!(tags.close, "</a:b>");
        assert_eq!(closing_tag_start(xml, &doc.root_element()), None);
    }

    #[test]
    fn unmodeled_markup_is_kept_as_written() {
        let xml = format!(
            r#"<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>
               <w:p w:rsidR="00AB"><w:pPr><w:keepNext/><w:pStyle w:val="Title"/></w:pPr><w:bookmarkStart w:id="0" w:name="top"/><w:r><w:rPr><w:b/></w:rPr><w:t>Bold</w:t></w:r><w:hyperlink r:id="rId7"><w:r><w:t> link</w:t></w:r></w:hyperlink></w:p>
               <w:sdt><w:sdtContent><w:p><w:r><w:t>inside</w:t></w:r></w:p></w:sdtContent></w:sdt>
               <w:p><w:pPr><w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:headerReference w:type="default" r:id="rId3"/></w:sectPr></w:pPr><w:bookmarkEnd w:id="0"/></w:p>
               <w:sectPr/></w:body></w:document>"#
        );
        let document = read_document(&package(&[(DOCUMENT_PART, &xml)])).expect("document");
        assert_eq!(document.sections.len(), 2);
        let first = &document.sections[0];
        assert_eq!(first.blocks.len(), 2);

        let paragraph = first.paragraph(0).expect("paragraph");
        assert_eq!(paragraph.text, "Bold link");
        assert_eq!(paragraph.style.as_deref(), Some("Title"));
        let source = paragraph.source.get().expect("source");
        assert_eq!(source.tags.open, r#"<w:p w:rsidR="00AB">"#);
        assert_eq!(source.run_properties.as_deref(), Some("<w:rPr><w:b/></w:rPr>"));
        let names: Vec<&str> = source.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["keepNext", "pStyle"]);
        let linked: Vec<bool> = source.content.iter().map(|item| item.linked).collect();
        assert_eq!(linked, [false, false, true]);

        match &first.blocks[1] {
            Block::Raw(raw) => {
                assert_eq!(raw.name, "sdt");
                assert!(raw.xml.starts_with("<w:sdt>") && raw.xml.ends_with("</w:sdt>"));
            }
            other => panic!("expected raw content control, got {other:?}"),
        }

        let properties = first.properties.get().expect("section properties");
        assert_eq!(properties.default_header.as_deref(), Some("rId3"));
        assert_eq!(properties.children[0].xml, r#"<w:pgSz w:w="12240" w:h="15840"/>"#);
        assert!(document.sections[1].properties.get().is_some());
    }

    #[test]
    fn source_package_is_remembered() {
        let settings = format!(
            r#"<w:settings xmlns:w="{W_NS}"><w:documentProtection w:edit="comments" w:enforcement="1"/></w:settings>"#
        );
        let bytes = package(&[(DOCUMENT_PART, &body("<w:sectPr/>")), (SETTINGS_PART, &settings)]);
        let document = read_document(&bytes).expect("document");
        let source = document.package.get().expect("package");
        assert_eq!(&source.bytes[..], &bytes[..]);
        assert_eq!(source.protection, document.protection);
        assert_eq!(source.protection.level, ProtectionLevel::Comments);
        assert!(source.watermark_location.is_none());
    }
}
