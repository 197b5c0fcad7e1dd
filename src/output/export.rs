//! Link export for downstream downloaders
//!
//! Un-exported download links are appended to a plain text sink, one per
//! line, and only then marked as extracted. A crash between the two steps
//! leaves the links un-marked, so the next export writes them again.

use crate::storage::Store;
use crate::HarvestError;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Appends every un-exported link to `path` and marks it extracted
///
/// # Arguments
///
/// * `store` - Store holding the media records
/// * `path` - Sink file, created if missing
///
/// # Returns
///
/// * `Ok(usize)` - Number of links written
/// * `Err(HarvestError)` - Reading the store, writing the sink or marking failed
pub fn export_links<S: Store + ?Sized>(store: &mut S, path: &Path) -> Result<usize, HarvestError> {
    let links = store
        .select_unextracted_links()
        .map_err(|e| HarvestError::store("select unextracted links", e))?;

    if links.is_empty() {
        tracing::info!("No new links to export");
        return Ok(0);
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    for link in &links {
        writeln!(writer, "{}", link)?;
    }
    writer.flush()?;
    writer.get_ref().sync_all()?;

    let marked = store
        .mark_extracted(&links)
        .map_err(|e| HarvestError::store("mark extracted", e))?;

    tracing::info!(
        "Exported {} links to {} ({} marked)",
        links.len(),
        path.display(),
        marked
    );
    Ok(links.len())
}
