use crate::assembler::AssemblerError;
use crate::error::TablefindError;
use crate::helpers::xml::XmlWriter;
use crate::table::StyleInfo;
use std::io::Write;

const DEFAULT_FONT_NAME: &str = "Calibri";
const DEFAULT_FONT_SIZE: f64 = 11.0;

/// Normalizes a color to the `AARRGGBB` notation of spreadsheet styles.
/// Accepts `RRGGBB`, `#RRGGBB` and `AARRGGBB`.
pub(crate) fn to_argb(color: &str) -> Result<String, TablefindError> {
    let hex = color.trim().trim_start_matches('#');
    if !hex.chars().all(|character| character.is_ascii_hexdigit()) {
        Err(AssemblerError::InvalidColor(color.to_owned()))?
    }
    match hex.len() {
        6 => Ok(format!("FF{}", hex.to_ascii_uppercase())),
        8 => Ok(hex.to_ascii_uppercase()),
        _ => Err(AssemblerError::InvalidColor(color.to_owned()))?,
    }
}

/// Collects the distinct styles used by a workbook and assigns each a cell format index.
/// Index 0 is the default format.
#[derive(Debug, Default)]
pub(crate) struct StyleRegistry {
    styles: Vec<StyleInfo>,
}

impl StyleRegistry {
    /// Returns the cell format index of `style`, registering it on first use.
    /// Colors are validated on registration.
    pub(crate) fn index(&mut self, style: Option<&StyleInfo>) -> Result<usize, TablefindError> {
        let style = match style {
            Some(style) if !style.is_empty() => style,
            _ => return Ok(0),
        };
        if let Some(position) = self.styles.iter().position(|known| known == style) {
            return Ok(position + 1);
        }
        for color in [&style.font_color, &style.background_color].into_iter().flatten() {
            to_argb(color)?;
        }
        self.styles.push(style.clone());
        Ok(self.styles.len())
    }

    /// Renders `xl/styles.xml`: one font and one fill per registered style.
    pub(crate) fn write<W: Write>(&self, writer: &mut XmlWriter<W>) -> Result<(), TablefindError> {
        let count = |value: usize| value.to_string();
        writer.start(
            "styleSheet",
            &[("xmlns", "http://schemas.openxmlformats.org/spreadsheetml/2006/main")],
        )?;

        writer.start("fonts", &[("count", count(self.styles.len() + 1).as_str())])?;
        write_font(writer, &StyleInfo::default())?;
        for style in &self.styles {
            write_font(writer, style)?;
        }
        writer.end("fonts")?;

        let filled = self
            .styles
            .iter()
            .filter(|style| style.background_color.is_some())
            .count();
        writer.start("fills", &[("count", count(filled + 2).as_str())])?;
        write_pattern_fill(writer, "none", None)?;
        write_pattern_fill(writer, "gray125", None)?;
        for style in &self.styles {
            if let Some(color) = &style.background_color {
                write_pattern_fill(writer, "solid", Some(to_argb(color)?.as_str()))?;
            }
        }
        writer.end("fills")?;

        writer.start("borders", &[("count", "1")])?;
        writer.start("border", &[])?;
        for side in ["left", "right", "top", "bottom", "diagonal"] {
            writer.empty(side, &[])?;
        }
        writer.end("border")?;
        writer.end("borders")?;

        writer.start("cellStyleXfs", &[("count", "1")])?;
        writer.empty(
            "xf",
            &[("numFmtId", "0"), ("fontId", "0"), ("fillId", "0"), ("borderId", "0")],
        )?;
        writer.end("cellStyleXfs")?;

        writer.start("cellXfs", &[("count", count(self.styles.len() + 1).as_str())])?;
        writer.empty(
            "xf",
            &[
                ("numFmtId", "0"),
                ("fontId", "0"),
                ("fillId", "0"),
                ("borderId", "0"),
                ("xfId", "0"),
            ],
        )?;
        let mut fill_id = 2usize;
        for (index, style) in self.styles.iter().enumerate() {
            let font_id = count(index + 1);
            let fill = if style.background_color.is_some() {
                fill_id += 1;
                fill_id - 1
            } else {
                0
            };
            let fill = count(fill);
            let mut attributes = vec![
                ("numFmtId", "0"),
                ("fontId", font_id.as_str()),
                ("fillId", fill.as_str()),
                ("borderId", "0"),
                ("xfId", "0"),
                ("applyFont", "1"),
            ];
            if style.background_color.is_some() {
                attributes.push(("applyFill", "1"));
            }
            writer.empty("xf", &attributes)?;
        }
        writer.end("cellXfs")?;

        writer.start("cellStyles", &[("count", "1")])?;
        writer.empty("cellStyle", &[("name", "Normal"), ("xfId", "0"), ("builtinId", "0")])?;
        writer.end("cellStyles")?;

        writer.end("styleSheet")
    }
}

/// Font children must follow the schema order: b, i, u, sz, color, name.
fn write_font<W: Write>(
    writer: &mut XmlWriter<W>,
    style: &StyleInfo,
) -> Result<(), TablefindError> {
    writer.start("font", &[])?;
    if style.bold {
        writer.empty("b", &[])?;
    }
    if style.italic {
        writer.empty("i", &[])?;
    }
    if style.underline {
        writer.empty("u", &[])?;
    }
    let size = style.font_size.unwrap_or(DEFAULT_FONT_SIZE).to_string();
    writer.empty("sz", &[("val", size.as_str())])?;
    match &style.font_color {
        Some(color) => writer.empty("color", &[("rgb", to_argb(color)?.as_str())])?,
        None => writer.empty("color", &[("theme", "1")])?,
    }
    let name = style.font_name.as_deref().unwrap_or(DEFAULT_FONT_NAME);
    writer.empty("name", &[("val", name)])?;
    writer.end("font")
}

fn write_pattern_fill<W: Write>(
    writer: &mut XmlWriter<W>,
    pattern: &str,
    color: Option<&str>,
) -> Result<(), TablefindError> {
    writer.start("fill", &[])?;
    match color {
        Some(color) => {
            writer.start("patternFill", &[("patternType", pattern)])?;
            writer.empty("fgColor", &[("rgb", color)])?;
            writer.empty("bgColor", &[("indexed", "64")])?;
            writer.end("patternFill")?;
        }
        None => writer.empty("patternFill", &[("patternType", pattern)])?,
    }
    writer.end("fill")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> StyleInfo {
        StyleInfo {
            bold: true,
            ..StyleInfo::default()
        }
    }

    #[test]
    fn normalize_colors() {
        assert_eq!(to_argb("ff0000").unwrap(), "FFFF0000");
        assert_eq!(to_argb("#00ff00").unwrap(), "FF00FF00");
        assert_eq!(to_argb("800000FF").unwrap(), "800000FF");
        assert!(to_argb("red").is_err());
        assert!(to_argb("#FFF").is_err());
    }

    #[test]
    fn deduplicate_styles() {
        let mut registry = StyleRegistry::default();

        assert_eq!(registry.index(None).unwrap(), 0);
        assert_eq!(registry.index(Some(&StyleInfo::default())).unwrap(), 0);
        assert_eq!(registry.index(Some(&bold())).unwrap(), 1);
        assert_eq!(registry.index(Some(&bold())).unwrap(), 1);
        let filled = StyleInfo {
            background_color: Some("FFFF00".to_owned()),
            ..StyleInfo::default()
        };
        assert_eq!(registry.index(Some(&filled)).unwrap(), 2);
    }

    #[test]
    fn reject_invalid_color_on_registration() {
        let mut registry = StyleRegistry::default();
        let style = StyleInfo {
            font_color: Some("blue".to_owned()),
            ..StyleInfo::default()
        };

        assert!(matches!(
            registry.index(Some(&style)),
            Err(TablefindError::AssemblerError(AssemblerError::InvalidColor(_)))
        ));
    }

    #[test]
    fn render_fonts_and_fills() {
        let mut registry = StyleRegistry::default();
        registry.index(Some(&bold())).unwrap();
        registry
            .index(Some(&StyleInfo {
                font_name: Some("Arial".to_owned()),
                font_size: Some(9.5),
                background_color: Some("#C0C0C0".to_owned()),
                italic: true,
                ..StyleInfo::default()
            }))
            .unwrap();
        let mut writer = XmlWriter::new(Vec::new());

        registry.write(&mut writer).unwrap();

        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert!(xml.contains(r#"<fonts count="3">"#));
        assert!(xml.contains(
            r#"<font><b/><sz val="11"/><color theme="1"/><name val="Calibri"/></font>"#
        ));
        assert!(xml.contains(
            r#"<font><i/><sz val="9.5"/><color theme="1"/><name val="Arial"/></font>"#
        ));
        assert!(xml.contains(r#"<fills count="3">"#));
        assert!(xml.contains(r#"<fgColor rgb="FFC0C0C0"/>"#));
        assert!(xml.contains(concat!(
            r#"<xf numFmtId="0" fontId="2" fillId="2" borderId="0" xfId="0" "#,
            r#"applyFont="1" applyFill="1"/>"#
        )));
        assert!(xml.contains(r#"<cellXfs count="3">"#));
    }
}
