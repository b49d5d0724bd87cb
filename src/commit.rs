use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::catalog::file::{self, CatalogFile};
use crate::config::MergeOptions;
use crate::error::CatalogError;

/// A merged catalog that has not been written yet
pub struct Pending {
    /// Already in the shape of the main file
    pub catalog: CatalogFile,
    /// Tracks the merge added; nothing is written when this is 0
    pub added: usize,
    /// Merge report text, written next to the output
    pub report: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Committed {
    pub backup: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

/// Backs up `main_path`, then writes the merged catalog to `output` and the
/// report next to it.
///
/// The main file is only ever written after its backup succeeded, so a
/// failed backup leaves it untouched. Returns `None` without touching the
/// filesystem when the merge added nothing.
pub fn commit(
    main_path: &Path,
    output: &Path,
    pending: &Pending,
    options: &MergeOptions,
    now: DateTime<Utc>,
) -> Result<Option<Committed>, CatalogError> {
    if pending.added == 0 {
        return Ok(None);
    }

    let backup = if options.create_backup {
        let backup = file::create_backup(main_path, options.backup_path.as_deref(), now)?;
        info!("Backup written to {}", backup.display());
        Some(backup)
    } else {
        warn!("Skipping backup of {}", main_path.display());
        None
    };

    pending.catalog.save(output)?;
    info!(
        "Merged catalog written to {} ({} tracks, {} new)",
        output.display(),
        pending.catalog.tracks().len(),
        pending.added,
    );

    let report = match &pending.report {
        Some(text) => {
            let path = file::report_path_for(output);
            file::write_text(&path, text)?;
            info!("Merge report written to {}", path.display());
            Some(path)
        }
        None => None,
    };

    Ok(Some(Committed { backup, report }))
}
