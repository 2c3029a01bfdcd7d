use crate::assembler::styles::StyleRegistry;
use crate::error::TablefindError;
use crate::helpers::xml::XmlWriter;
use crate::table::StyleInfo;
use crate::workbook::reference::CellReference;
use crate::workbook::Sheet;
use crate::workbook::TablePlacement;
use std::collections::BTreeMap;
use std::io::Write;

/// Narrowest and widest column width, in characters.
const MIN_COLUMN_WIDTH: usize = 8;
const MAX_COLUMN_WIDTH: usize = 80;

/// A cell ready to be written: text and cell format index.
struct CellData<'a> {
    text: &'a str,
    style: usize,
}

/// Cells of a worksheet grouped by row then column, as the sheet XML requires.
#[derive(Default)]
struct Grid<'a> {
    rows: BTreeMap<u32, BTreeMap<u32, CellData<'a>>>,
    widths: BTreeMap<u32, usize>,
}

impl<'a> Grid<'a> {
    fn put(&mut self, row: u32, column: u32, text: &'a str, style: usize) {
        if text.is_empty() && style == 0 {
            return;
        }
        let width = self.widths.entry(column).or_default();
        *width = (*width).max(text.chars().count());
        self.rows.entry(row).or_default().insert(column, CellData { text, style });
    }
}

/// Returns the first style present, from the most to the least specific level.
fn cascade<'s>(levels: &[Option<&'s StyleInfo>]) -> Option<&'s StyleInfo> {
    levels.iter().flatten().copied().next()
}

/// Places the header row and the data rows of one table on the grid.
fn place<'a>(
    grid: &mut Grid<'a>,
    styles: &mut StyleRegistry,
    placement: &'a TablePlacement,
    sheet_style: Option<&'a StyleInfo>,
) -> Result<(), TablefindError> {
    let table = placement.table.as_ref();
    let table_style = table.style.as_ref();
    let CellReference { column, row } = placement.start;

    for (offset, header) in table.headers.iter().enumerate() {
        let style = styles.index(cascade(&[header.style.as_ref(), table_style, sheet_style]))?;
        grid.put(row, column + offset as u32, &header.text, style);
    }
    for (row_offset, data) in table.rows.iter().enumerate() {
        let row = row + 1 + row_offset as u32;
        for (offset, cell) in data.cells.iter().enumerate() {
            let style = styles.index(cascade(&[
                cell.style.as_ref(),
                data.style.as_ref(),
                table_style,
                sheet_style,
            ]))?;
            grid.put(row, column + offset as u32, &cell.text, style);
        }
    }
    Ok(())
}

/// Renders `xl/worksheets/sheetN.xml` for a laid out sheet.
pub(crate) fn write_sheet<W: Write>(
    writer: &mut XmlWriter<W>,
    sheet: &Sheet,
    styles: &mut StyleRegistry,
) -> Result<(), TablefindError> {
    let mut grid = Grid::default();
    for placement in &sheet.placements {
        place(&mut grid, styles, placement, sheet.style.as_ref())?;
    }

    writer.start(
        "worksheet",
        &[
            ("xmlns", "http://schemas.openxmlformats.org/spreadsheetml/2006/main"),
            ("xmlns:r", "http://schemas.openxmlformats.org/officeDocument/2006/relationships"),
        ],
    )?;
    let dimension = match (grid.rows.keys().last(), grid.widths.keys().last()) {
        (Some(row), Some(column)) => format!("A1:{}", CellReference { column: *column, row: *row }),
        _ => "A1".to_owned(),
    };
    writer.empty("dimension", &[("ref", dimension.as_str())])?;

    if !grid.widths.is_empty() {
        writer.start("cols", &[])?;
        for (column, characters) in &grid.widths {
            let index = column.to_string();
            let width = (characters + 2).clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH).to_string();
            writer.empty(
                "col",
                &[
                    ("min", index.as_str()),
                    ("max", index.as_str()),
                    ("width", width.as_str()),
                    ("customWidth", "1"),
                ],
            )?;
        }
        writer.end("cols")?;
    }

    writer.start("sheetData", &[])?;
    for (row, cells) in &grid.rows {
        writer.start("row", &[("r", row.to_string().as_str())])?;
        for (column, cell) in cells {
            let reference = CellReference { column: *column, row: *row }.to_string();
            let style = cell.style.to_string();
            let mut attributes = vec![("r", reference.as_str()), ("t", "inlineStr")];
            if cell.style != 0 {
                attributes.push(("s", style.as_str()));
            }
            writer.start("c", &attributes)?;
            writer.start("is", &[])?;
            writer.text_element("t", &[("xml:space", "preserve")], cell.text)?;
            writer.end("is")?;
            writer.end("c")?;
        }
        writer.end("row")?;
    }
    writer.end("sheetData")?;
    writer.end("worksheet")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::table;
    use crate::table::TableRecord;
    use std::sync::Arc;

    fn cell(reference: &str, text: &str) -> String {
        format!(
            r#"<c r="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            reference, text
        )
    }

    fn render(sheet: &Sheet, styles: &mut StyleRegistry) -> String {
        let mut writer = XmlWriter::new(Vec::new());
        write_sheet(&mut writer, sheet, styles).unwrap();
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    fn sheet_with(tables: Vec<(TableRecord, &str)>) -> Sheet {
        let mut sheet = Sheet::new("Data");
        for (record, start) in tables {
            let start = CellReference::try_from(start).unwrap();
            sheet
                .placements
                .push(TablePlacement::new(Arc::new(record), start).unwrap());
        }
        sheet
    }

    #[test]
    fn write_headers_above_rows() {
        let sheet = sheet_with(vec![(table("Sales", 2, 1), "A1"), (table("Staff", 1, 1), "A6")]);

        let xml = render(&sheet, &mut StyleRegistry::default());

        assert!(xml.contains(r#"<dimension ref="A1:B7"/>"#));
        let header = format!(
            r#"<row r="1">{}{}</row>"#,
            cell("A1", "Column 1"),
            cell("B1", "Column 2")
        );
        assert!(xml.contains(&header));
        assert!(xml.contains(&cell("B2", "R1C2")));
        assert!(xml.contains(r#"<row r="6">"#));
        assert!(xml.contains(&cell("A7", "R1C1")));
        assert!(!xml.contains(r#"<row r="3">"#));
    }

    #[test]
    fn extra_row_cells_are_written() {
        let mut record = table("Irregular", 1, 1);
        record.rows[0].cells.push(crate::table::TableCell {
            text: "extra".to_owned(),
            ..Default::default()
        });

        let xml = render(&sheet_with(vec![(record, "A1")]), &mut StyleRegistry::default());

        assert!(xml.contains(&cell("B2", "extra")));
    }

    #[test]
    fn size_columns_to_content() {
        let mut record = table("Wide", 2, 1);
        record.rows[0].cells[1].text = "a fairly long piece of cell text".to_owned();

        let xml = render(&sheet_with(vec![(record, "A1")]), &mut StyleRegistry::default());

        assert!(xml.contains(r#"<col min="1" max="1" width="10" customWidth="1"/>"#));
        assert!(xml.contains(r#"<col min="2" max="2" width="34" customWidth="1"/>"#));
    }

    #[test]
    fn style_cascade_prefers_most_specific_level() {
        let red = StyleInfo {
            font_color: Some("FF0000".to_owned()),
            ..StyleInfo::default()
        };
        let bold = StyleInfo {
            bold: true,
            ..StyleInfo::default()
        };
        let mut record = table("Styled", 2, 1);
        record.style = Some(bold.clone());
        record.rows[0].cells[0].style = Some(red.clone());
        let mut sheet = sheet_with(vec![(record, "A1")]);
        sheet.style = Some(StyleInfo {
            italic: true,
            ..StyleInfo::default()
        });
        let mut styles = StyleRegistry::default();

        let xml = render(&sheet, &mut styles);

        // headers and the unstyled cell fall back to the table style
        assert!(xml.contains(r#"<c r="A1" t="inlineStr" s="1">"#));
        assert!(xml.contains(r#"<c r="A2" t="inlineStr" s="2">"#));
        assert!(xml.contains(r#"<c r="B2" t="inlineStr" s="1">"#));
        assert_eq!(styles.index(Some(&bold)).unwrap(), 1);
        assert_eq!(styles.index(Some(&red)).unwrap(), 2);
    }

    #[test]
    fn empty_sheet_has_no_rows() {
        let xml = render(&Sheet::new("Empty"), &mut StyleRegistry::default());

        assert!(xml.contains(r#"<dimension ref="A1"/>"#));
        assert!(xml.contains("<sheetData></sheetData>"));
        assert!(!xml.contains("<cols>"));
    }
}
