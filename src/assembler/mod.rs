//! # Workbook Assembler
//!
//! Renders a finalized [`WorkbookStructure`] into an Office Open XML spreadsheet (`.xlsx`).
//! The package is a ZIP archive of XML parts:
//!
//! - `[Content_Types].xml` and `_rels/.rels` describing the package
//! - `docProps/core.xml` with the creation time
//! - `xl/workbook.xml` listing the sheets in order, with its relationships
//! - `xl/styles.xml` holding every distinct cell style
//! - `xl/worksheets/sheetN.xml` per sheet, cells written as inline strings
//!
//! The file is written to a temporary sibling first and only moved to its destination once
//! the whole package has been produced.
mod styles;
mod worksheet;

use crate::error::ResultMessage;
use crate::error::TablefindError;
use crate::helpers::file_writer::write_atomically;
use crate::helpers::xml::XmlWriter;
use crate::helpers::zip::ZipHelper;
use crate::workbook::Sheet;
use crate::workbook::WorkbookStructure;
use chrono::SecondsFormat;
use chrono::Utc;
use std::borrow::Cow;
use std::io::Seek;
use std::io::Write;
use std::path::Path;
use styles::StyleRegistry;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use zip::ZipWriter;

/// Name of the blank sheet written when a structure has no sheet at all.
pub const PLACEHOLDER_SHEET_NAME: &str = "Sheet1";

const SPREADSHEET_NAMESPACE: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIP_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELATIONSHIP_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";
const DOCUMENT_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const CORE_PROPERTIES_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const WORKSHEET_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const STYLES_RELATIONSHIP_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// Errors raised while rendering a workbook.
#[derive(Error, Debug)]
pub enum AssemblerError {
    #[error("Workbook structure must be laid out before it is assembled")]
    NotFinalized,

    #[error("Unsupported color '{0}', expected RRGGBB, #RRGGBB or AARRGGBB")]
    InvalidColor(String),
}

/// Writes `workbook` as an `.xlsx` file at `destination`, replacing any existing file.
///
/// # Errors
/// Provisional structures, unsupported style colors and I/O failures. On error the
/// destination is left untouched.
pub fn assemble(workbook: &WorkbookStructure, destination: &Path) -> Result<(), TablefindError> {
    if !workbook.is_finalized() {
        Err(AssemblerError::NotFinalized)?
    }
    let sheets = match workbook.sheets.is_empty() {
        true => Cow::Owned(vec![Sheet::new(PLACEHOLDER_SHEET_NAME)]),
        false => Cow::Borrowed(workbook.sheets.as_slice()),
    };

    write_atomically(destination, |file| {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
        write_package(&mut zip, &sheets)?;
        let buffer = zip.finish()?.into_inner();
        file.write_all(&buffer)?;
        Ok(())
    })
    .with_prefix(&format!("Write workbook '{}'", destination.display()))?;

    info!(
        path = %destination.display(),
        sheets = sheets.len(),
        tables = workbook.table_count(),
        "assembled workbook"
    );
    Ok(())
}

/// Writes every part of the package. Worksheets are rendered before the styles part
/// because rendering registers the styles they use.
fn write_package<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    sheets: &[Sheet],
) -> Result<(), TablefindError> {
    zip.xml_part("[Content_Types].xml", |writer| write_content_types(writer, sheets.len()))?;
    zip.xml_part("_rels/.rels", |writer| write_package_relationships(writer))?;
    zip.xml_part("docProps/core.xml", |writer| write_core_properties(writer))?;
    zip.xml_part("xl/workbook.xml", |writer| write_workbook(writer, sheets))?;
    zip.xml_part("xl/_rels/workbook.xml.rels", |writer| {
        write_workbook_relationships(writer, sheets.len())
    })?;

    let mut styles = StyleRegistry::default();
    for (index, sheet) in sheets.iter().enumerate() {
        let name = format!("xl/worksheets/sheet{}.xml", index + 1);
        debug!(
            sheet = %sheet.name,
            part = %name,
            tables = sheet.placements.len(),
            "writing worksheet"
        );
        zip.xml_part(&name, |writer| worksheet::write_sheet(writer, sheet, &mut styles))
            .with_prefix(&format!("Write sheet '{}'", sheet.name))?;
    }
    zip.xml_part("xl/styles.xml", |writer| styles.write(writer))
}

fn write_content_types<W: Write>(
    writer: &mut XmlWriter<W>,
    sheet_count: usize,
) -> Result<(), TablefindError> {
    writer.start(
        "Types",
        &[("xmlns", "http://schemas.openxmlformats.org/package/2006/content-types")],
    )?;
    writer.empty(
        "Default",
        &[
            ("Extension", "rels"),
            ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
        ],
    )?;
    writer.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    writer.empty(
        "Override",
        &[
            ("PartName", "/xl/workbook.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
            ),
        ],
    )?;
    for index in 1..=sheet_count {
        let part = format!("/xl/worksheets/sheet{}.xml", index);
        writer.empty(
            "Override",
            &[
                ("PartName", part.as_str()),
                (
                    "ContentType",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml",
                ),
            ],
        )?;
    }
    writer.empty(
        "Override",
        &[
            ("PartName", "/xl/styles.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
            ),
        ],
    )?;
    writer.empty(
        "Override",
        &[
            ("PartName", "/docProps/core.xml"),
            ("ContentType", "application/vnd.openxmlformats-package.core-properties+xml"),
        ],
    )?;
    writer.end("Types")
}

fn write_package_relationships<W: Write>(writer: &mut XmlWriter<W>) -> Result<(), TablefindError> {
    writer.start("Relationships", &[("xmlns", PACKAGE_RELATIONSHIP_NAMESPACE)])?;
    writer.empty(
        "Relationship",
        &[
            ("Id", "rId1"),
            ("Type", DOCUMENT_RELATIONSHIP_TYPE),
            ("Target", "xl/workbook.xml"),
        ],
    )?;
    writer.empty(
        "Relationship",
        &[
            ("Id", "rId2"),
            ("Type", CORE_PROPERTIES_RELATIONSHIP_TYPE),
            ("Target", "docProps/core.xml"),
        ],
    )?;
    writer.end("Relationships")
}

fn write_core_properties<W: Write>(writer: &mut XmlWriter<W>) -> Result<(), TablefindError> {
    let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    writer.start(
        "cp:coreProperties",
        &[
            ("xmlns:cp", "http://schemas.openxmlformats.org/package/2006/metadata/core-properties"),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    writer.text_element("dc:creator", &[], env!("CARGO_PKG_NAME"))?;
    writer.text_element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
    writer.text_element("dcterms:modified", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
    writer.end("cp:coreProperties")
}

fn write_workbook<W: Write>(
    writer: &mut XmlWriter<W>,
    sheets: &[Sheet],
) -> Result<(), TablefindError> {
    writer.start(
        "workbook",
        &[("xmlns", SPREADSHEET_NAMESPACE), ("xmlns:r", RELATIONSHIP_NAMESPACE)],
    )?;
    writer.start("sheets", &[])?;
    for (index, sheet) in sheets.iter().enumerate() {
        let sheet_id = (index + 1).to_string();
        let relationship = format!("rId{}", index + 1);
        writer.empty(
            "sheet",
            &[
                ("name", sheet.name.as_str()),
                ("sheetId", sheet_id.as_str()),
                ("r:id", relationship.as_str()),
            ],
        )?;
    }
    writer.end("sheets")?;
    writer.end("workbook")
}

/// Worksheets take `rId1..=rIdN`, the styles part follows them.
fn write_workbook_relationships<W: Write>(
    writer: &mut XmlWriter<W>,
    sheet_count: usize,
) -> Result<(), TablefindError> {
    writer.start("Relationships", &[("xmlns", PACKAGE_RELATIONSHIP_NAMESPACE)])?;
    for index in 1..=sheet_count {
        let id = format!("rId{}", index);
        let target = format!("worksheets/sheet{}.xml", index);
        writer.empty(
            "Relationship",
            &[
                ("Id", id.as_str()),
                ("Type", WORKSHEET_RELATIONSHIP_TYPE),
                ("Target", target.as_str()),
            ],
        )?;
    }
    let id = format!("rId{}", sheet_count + 1);
    writer.empty(
        "Relationship",
        &[("Id", id.as_str()), ("Type", STYLES_RELATIONSHIP_TYPE), ("Target", "styles.xml")],
    )?;
    writer.end("Relationships")
}
