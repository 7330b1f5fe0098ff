//! Zero mode: strip IDs from a source tree for re-allocation.
//!
//! Rewrites every populated ID field back to `Id(0)`. The registry is
//! deliberately not touched; a following `update` run re-allocates
//! against the existing list. Requires an explicit non-empty source
//! tree argument as a rail against accidental whole-tree wipes.

use std::path::PathBuf;

use log::debug;

use crate::error::{IdError, Result};
use crate::scan::{scan_text, scan_tree};
use crate::update::splice;

/// Outcome of a zero run.
#[derive(Debug, Default)]
pub struct ZeroReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub sites_zeroed: usize,
    pub dry_run: bool,
}

/// Set every nonzero call-site ID under `roots` to zero.
pub fn zero_tree(roots: &[PathBuf], dry_run: bool) -> Result<ZeroReport> {
    if roots.is_empty() {
        return Err(IdError::EmptySourceTree);
    }
    let mut report = ZeroReport {
        dry_run,
        ..ZeroReport::default()
    };

    for path in scan_tree(roots)? {
        let text = std::fs::read_to_string(&path)?;
        report.files_scanned += 1;

        let rewrites: Vec<_> = scan_text(&path, &text)
            .into_iter()
            .filter(|site| site.id != 0)
            .map(|site| (site.id_span, "0".to_string()))
            .collect();
        if rewrites.is_empty() {
            continue;
        }
        report.sites_zeroed += rewrites.len();
        report.files_changed += 1;
        if dry_run {
            debug!("dry-run: would zero {} sites in {}", rewrites.len(), path.display());
        } else {
            std::fs::write(&path, splice(&text, &rewrites))?;
        }
    }
    Ok(report)
}
