//! Built-in style catalogue written to `word/styles.xml`, or merged into
//! an existing one.

/// Table styles the writer knows how to declare, as (display name, style id).
const TABLE_STYLES: &[(&str, &str)] = &[
    ("Table Grid", "TableGrid"),
    ("Light Shading", "LightShading"),
    ("Light List", "LightList"),
    ("Light Grid", "LightGrid"),
    ("Medium Shading 1", "MediumShading1"),
    ("Medium Shading 2", "MediumShading2"),
    ("Medium List 1", "MediumList1"),
    ("Medium Grid 1", "MediumGrid1"),
    ("Dark List", "DarkList"),
    ("Colorful List", "ColorfulList"),
];

/// Resolves a table style by display name or id, ignoring case and spaces.
/// Returns the canonical display name.
pub fn resolve_table_style(name: &str) -> Option<&'static str> {
    let wanted = normalize(name);
    TABLE_STYLES
        .iter()
        .find(|(display, id)| normalize(display) == wanted || normalize(id) == wanted)
        .map(|(display, _)| *display)
}

pub fn table_style_id(name: &str) -> Option<&'static str> {
    let display = resolve_table_style(name)?;
    TABLE_STYLES
        .iter()
        .find(|(candidate, _)| *candidate == display)
        .map(|(_, id)| *id)
}

pub fn table_style_name(id: &str) -> Option<&'static str> {
    TABLE_STYLES
        .iter()
        .find(|(_, candidate)| *candidate == id)
        .map(|(display, _)| *display)
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Style every built-in table style derives from.
pub const BASE_TABLE_STYLE_ID: &str = "TableNormal";

const BASE_TABLE_STYLE: &str = r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>"#;

/// The `w:style` element for a built-in table style id.
pub fn style_definition(id: &str) -> Option<String> {
    if id == BASE_TABLE_STYLE_ID {
        return Some(BASE_TABLE_STYLE.to_string());
    }
    let display = table_style_name(id)?;
    Some(format!(
        r#"<w:style w:type="table" w:styleId="{id}"><w:name w:val="{display}"/><w:basedOn w:val="{BASE_TABLE_STYLE_ID}"/><w:tblPr>{borders}</w:tblPr></w:style>"#,
        borders = super::writer::TABLE_BORDERS,
    ))
}

pub fn styles_xml() -> String {
    let mut xml = String::new();
    xml.push_str(super::XML_DECLARATION);
    xml.push_str(&format!(r#"<w:styles xmlns:w="{}">"#, super::W_NS));
    xml.push_str(
        r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault><w:pPrDefault/></w:docDefaults>"#,
    );
    xml.push_str(
        r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    );
    xml.push_str(
        r#"<w:style w:type="paragraph" w:styleId="Header"><w:name w:val="header"/><w:basedOn w:val="Normal"/></w:style>"#,
    );
    xml.push_str(BASE_TABLE_STYLE);
    for (_, id) in TABLE_STYLES {
        if let Some(definition) = style_definition(id) {
            xml.push_str(&definition);
        }
    }
    xml.push_str("</w:styles>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_by_name_or_id() {
        assert_eq!(resolve_table_style("table grid"), Some("Table Grid"));
        assert_eq!(resolve_table_style("MediumShading1"), Some("Medium Shading 1"));
        assert_eq!(table_style_id("Light List"), Some("LightList"));
        assert_eq!(table_style_name("DarkList"), Some("Dark List"));
        assert_eq!(resolve_table_style("Fancy Purple"), None);
    }

    #[test]
    fn definitions_exist_for_known_ids_only() {
        let grid = style_definition("TableGrid").expect("grid");
        assert!(grid.contains(r#"w:styleId="TableGrid""#));
        assert!(grid.contains(r#"<w:basedOn w:val="TableNormal"/>"#));
        assert!(style_definition(BASE_TABLE_STYLE_ID).is_some());
        assert!(style_definition("Custom").is_none());
    }
}
