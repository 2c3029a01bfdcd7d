use crate::error::TablefindError;
use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Writes a file through a temporary sibling and renames it into place only when `write` succeeds,
/// so a failed build never leaves a truncated document at `destination`.
///
/// # Arguments
/// * `destination` - Final path of the file
/// * `write` - Callback producing the file content
pub(crate) fn write_atomically<F>(destination: &Path, write: F) -> Result<(), TablefindError>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<(), TablefindError>,
{
    let directory = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temporary = NamedTempFile::new_in(directory)?;
    debug!(temporary = %temporary.path().display(), "writing temporary file");
    {
        let mut writer = BufWriter::new(temporary.as_file());
        write(&mut writer)?;
        writer.flush()?;
    }
    temporary.as_file().sync_all()?;
    temporary.persist(destination)?;
    Ok(())
}
