//! Renders a [`Document`] into the flat formats `convert_document` offers.

use std::fmt::Write as _;
use std::path::Path;

use super::model::{Alignment, Block, Document, Paragraph, Section, Table};
use super::{EngineError, PackageKind, writer};

/// Conversion targets the exporter can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Docx,
    Txt,
    Markdown,
    Html,
    Rtf,
    Xml,
}

impl Target {
    pub const NAMES: [&'static str; 6] = ["docx", "txt", "md", "html", "rtf", "xml"];

    /// Accepts a format name with or without a leading dot.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().trim_start_matches('.').to_ascii_lowercase();
        match value.as_str() {
            "docx" => Some(Target::Docx),
            "txt" => Some(Target::Txt),
            "md" => Some(Target::Markdown),
            "html" => Some(Target::Html),
            "rtf" => Some(Target::Rtf),
            "xml" => Some(Target::Xml),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Target::Docx => "docx",
            Target::Txt => "txt",
            Target::Markdown => "md",
            Target::Html => "html",
            Target::Rtf => "rtf",
            Target::Xml => "xml",
        }
    }
}

pub fn render(document: &Document, target: Target) -> Result<Vec<u8>, EngineError> {
    let text = match target {
        Target::Docx => return super::to_bytes(document, PackageKind::Document),
        Target::Txt => to_plain_text(document),
        Target::Markdown => to_markdown(document),
        Target::Html => to_html(document),
        Target::Rtf => to_rtf(document),
        Target::Xml => writer::document_xml(document),
    };
    Ok(text.into_bytes())
}

/// Renders and writes `document` to `path`, replacing any existing file.
pub fn export(document: &Document, target: Target, path: &Path) -> Result<(), EngineError> {
    let bytes = render(document, target)?;
    super::write_atomically(path, &bytes)
}

pub fn to_plain_text(document: &Document) -> String {
    let sections: Vec<String> = document
        .sections
        .iter()
        .map(|section| {
            let mut lines = Vec::new();
            for block in &section.blocks {
                match block {
                    Block::Paragraph(paragraph) => lines.push(paragraph.text.clone()),
                    Block::Table(table) => {
                        for row in &table.rows {
                            let cells: Vec<String> = row
                                .cells
                                .iter()
                                .map(|cell| cell.text().replace('\n', " "))
                                .collect();
                            lines.push(cells.join("\t"));
                        }
                    }
                    Block::Raw(_) => {}
                }
            }
            lines.join("\n")
        })
        .collect();
    let mut text = sections.join("\n\n");
    text.push('\n');
    text
}

pub fn to_markdown(document: &Document) -> String {
    let mut blocks = Vec::new();
    for section in &document.sections {
        for block in &section.blocks {
            match block {
                Block::Paragraph(paragraph) if paragraph.text.trim().is_empty() => {}
                Block::Paragraph(paragraph) => blocks.push(markdown_escape(&paragraph.text)),
                Block::Table(table) => {
                    if let Some(rendered) = markdown_table(table) {
                        blocks.push(rendered);
                    }
                }
                Block::Raw(_) => {}
            }
        }
    }
    let mut text = blocks.join("\n\n");
    text.push('\n');
    text
}

fn markdown_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '`' | '*' | '_' | '[' | ']' | '#' | '|' | '<' | '>') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.replace('\n', "  \n")
}

fn markdown_table(table: &Table) -> Option<String> {
    let columns = table.column_count();
    if columns == 0 {
        return None;
    }
    let row_line = |cells: Vec<String>| format!("| {} |", cells.join(" | "));
    let cells_of = |index: usize| -> Vec<String> {
        (0..columns)
            .map(|column| {
                table
                    .cell(index, column)
                    .map(|cell| markdown_escape(&cell.text().replace('\n', " ")))
                    .unwrap_or_default()
            })
            .collect()
    };

    let mut lines = vec![row_line(cells_of(0))];
    lines.push(row_line(vec!["---".to_string(); columns]));
    for index in 1..table.row_count() {
        lines.push(row_line(cells_of(index)));
    }
    Some(lines.join("\n"))
}

pub fn to_html(document: &Document) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Document</title>\n</head>\n<body>\n",
    );
    for (index, section) in document.sections.iter().enumerate() {
        if index > 0 {
            html.push_str("<hr>\n");
        }
        html_section(&mut html, section);
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn html_section(html: &mut String, section: &Section) {
    for block in &section.blocks {
        match block {
            Block::Paragraph(paragraph) => html_paragraph(html, paragraph),
            Block::Table(table) => {
                html.push_str("<table border=\"1\">\n");
                for row in &table.rows {
                    html.push_str("<tr>");
                    for cell in &row.cells {
                        let text = html_escape(&cell.text()).replace('\n', "<br>");
                        let _ = write!(html, "<td>{text}</td>");
                    }
                    html.push_str("</tr>\n");
                }
                html.push_str("</table>\n");
            }
            Block::Raw(_) => {}
        }
    }
}

fn html_paragraph(html: &mut String, paragraph: &Paragraph) {
    let text = html_escape(&paragraph.text).replace('\n', "<br>");
    let _ = match paragraph.format.alignment {
        Alignment::Left => writeln!(html, "<p>{text}</p>"),
        other => writeln!(html, "<p style=\"text-align:{}\">{text}</p>", other.as_str()),
    };
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn to_rtf(document: &Document) -> String {
    let mut rtf = String::from("{\\rtf1\\ansi\\deff0{\\fonttbl{\\f0 Calibri;}}\n");
    for (index, section) in document.sections.iter().enumerate() {
        if index > 0 {
            rtf.push_str("\\sect\n");
        }
        for block in &section.blocks {
            match block {
                Block::Paragraph(paragraph) => {
                    let _ = writeln!(
                        rtf,
                        "\\pard{} {}\\par",
                        rtf_alignment(paragraph.format.alignment),
                        rtf_escape(&paragraph.text)
                    );
                }
                Block::Table(table) => rtf_table(&mut rtf, table),
                Block::Raw(_) => {}
            }
        }
    }
    rtf.push_str("}\n");
    rtf
}

fn rtf_alignment(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "\\ql",
        Alignment::Center => "\\qc",
        Alignment::Right => "\\qr",
        Alignment::Justify => "\\qj",
    }
}

fn rtf_table(rtf: &mut String, table: &Table) {
    let columns = table.column_count().max(1);
    let width = 9026 / columns;
    for row in &table.rows {
        rtf.push_str("\\trowd");
        for column in 1..=row.cells.len() {
            let _ = write!(rtf, "\\cellx{}", width * column);
        }
        rtf.push('\n');
        for cell in &row.cells {
            let _ = write!(rtf, "\\pard\\intbl {}\\cell ", rtf_escape(&cell.text()));
        }
        rtf.push_str("\\row\n");
    }
}

fn rtf_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\n' => escaped.push_str("\\line "),
            '\t' => escaped.push_str("\\tab "),
            ch if ch.is_ascii() => escaped.push(ch),
            ch => {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    let _ = write!(escaped, "\\u{}?", *unit as i16);
                }
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        let mut document = Document::blank();
        let section = &mut document.sections[0];
        let mut title = Paragraph::with_text("Q3 <Report> & *notes*");
        title.format.alignment = Alignment::Center;
        section.blocks.push(Block::Paragraph(title));
        let mut table = Table::new(2, 2);
        table.rows[0].cells[0].set_text("Name");
        table.rows[0].cells[1].set_text("Total");
        table.rows[1].cells[0].set_text("Café");
        table.rows[1].cells[1].set_text("42");
        section.blocks.push(Block::Table(table));
        document
            .sections
            .push(Section {
                blocks: vec![Block::Paragraph(Paragraph::with_text("Appendix"))],
                ..Section::default()
            });
        document
    }

    #[test]
    fn parses_targets() {
        assert_eq!(Target::parse(".MD"), Some(Target::Markdown));
        assert_eq!(Target::parse("html"), Some(Target::Html));
        assert_eq!(Target::parse("pdf"), None);
        assert_eq!(Target::Rtf.extension(), "rtf");
    }

    #[test]
    fn plain_text_separates_sections_and_cells() {
        let text = to_plain_text(&sample());
        assert_eq!(text, "Q3 <Report> & *notes*\nName\tTotal\nCafé\t42\n\nAppendix\n");
    }

    #[test]
    fn markdown_uses_first_row_as_header() {
        let markdown = to_markdown(&sample());
        assert!(markdown.contains("Q3 \\<Report\\> & \\*notes\\*"));
        assert!(markdown.contains("| Name | Total |\n| --- | --- |\n| Café | 42 |"));
    }

    #[test]
    fn html_escapes_and_aligns() {
        let html = to_html(&sample());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<p style=\"text-align:center\">Q3 &lt;Report&gt; &amp; *notes*</p>"));
        assert!(html.contains("<td>Café</td>"));
    }

    #[test]
    fn rtf_escapes_non_ascii_and_breaks_sections() {
        let rtf = to_rtf(&sample());
        assert!(rtf.starts_with("{\\rtf1"));
        assert!(rtf.contains("\\pard\\qc Q3"));
        assert!(rtf.contains("Caf\\u233?"));
        assert!(rtf.contains("\\sect\n"));
        assert!(rtf.contains("\\row"));
    }

    #[test]
    fn xml_target_is_the_main_part() {
        let bytes = render(&sample(), Target::Xml).expect("render");
        let xml = String::from_utf8(bytes).expect("utf8");
        assert!(xml.contains("<w:document"));
        assert!(xml.contains("Appendix"));
    }
}
