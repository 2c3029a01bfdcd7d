//! ZIP archive helper utilities for Excel (.xlsx) packages
//! Provides convenient methods for writing XML parts into ZIP archives

use crate::error::TablefindError;
use crate::helpers::xml::XmlWriter;
use std::io::Seek;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

/// Helper trait for ZIP archive operations with specialized writer creation
pub(crate) trait ZipHelper<W: Write + Seek> {
    /// Starts a deflated entry (path separator agnostic) and renders an XML document into it.
    /// The XML declaration is written before `render` is invoked.
    fn xml_part<F>(&mut self, name: &str, render: F) -> Result<(), TablefindError>
    where
        F: FnOnce(&mut XmlWriter<&mut ZipWriter<W>>) -> Result<(), TablefindError>;
}

impl<W: Write + Seek> ZipHelper<W> for ZipWriter<W> {
    fn xml_part<F>(&mut self, name: &str, render: F) -> Result<(), TablefindError>
    where
        F: FnOnce(&mut XmlWriter<&mut ZipWriter<W>>) -> Result<(), TablefindError>,
    {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.start_file(name.replace('\\', "/"), options)?;
        let mut writer = XmlWriter::new(self);
        writer.declaration()?;
        render(&mut writer)?;
        writer.finish()?;
        Ok(())
    }
}
