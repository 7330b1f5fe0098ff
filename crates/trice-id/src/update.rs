//! The allocation engine: assign IDs across a source tree.
//!
//! A batch, non-interactive pass: enumerate source files, parse every
//! trace call site, allocate IDs for the absent/zero ones, rewrite the
//! call sites in place, and leave the updated registry ready to
//! persist. Dry-run performs the same work in memory and reports the
//! intended changes without touching any file.
//!
//! An interrupted run leaves each already-written file complete; the
//! registry only moves on disk at its own persist step, so the durable
//! state is always that of the last fully completed step.

use std::ops::Range;
use std::path::PathBuf;

use log::{debug, warn};

use crate::error::Result;
use crate::param::infer_spec;
use crate::registry::IdRegistry;
use crate::scan::{scan_text, scan_tree};

/// One intended call-site rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    /// File holding the call site.
    pub path: PathBuf,
    /// ID currently written there (0 for unallocated).
    pub old_id: u32,
    /// ID the engine assigned.
    pub new_id: u32,
}

/// Outcome of one allocation engine run.
#[derive(Debug, Default)]
pub struct UpdateReport {
    pub files_scanned: usize,
    pub sites_found: usize,
    /// Call-site rewrites performed (or planned, under dry-run).
    pub changes: Vec<PlannedChange>,
    /// Sites whose nonzero ID collided with a different format string.
    pub conflicts: usize,
    /// Sites skipped because macro and format string disagree.
    pub skipped: usize,
    pub files_rewritten: usize,
    pub dry_run: bool,
}

/// Run the allocation engine over `roots`, updating `registry` in
/// memory and source files on disk.
///
/// With `dry_run` no file is written; the registry still accumulates
/// the would-be entries so the caller can report them, but must not be
/// persisted afterwards.
pub fn update_tree(roots: &[PathBuf], registry: &mut IdRegistry, dry_run: bool) -> Result<UpdateReport> {
    let mut report = UpdateReport {
        dry_run,
        ..UpdateReport::default()
    };

    for path in scan_tree(roots)? {
        let text = std::fs::read_to_string(&path)?;
        let sites = scan_text(&path, &text);
        report.files_scanned += 1;
        report.sites_found += sites.len();

        let mut rewrites: Vec<(Range<usize>, String)> = Vec::new();
        for site in &sites {
            let spec = match infer_spec(&site.macro_name, &site.fmt) {
                Ok(spec) => spec,
                Err(e) => {
                    warn!("{}: skipping call site: {e}", path.display());
                    report.skipped += 1;
                    continue;
                }
            };
            let candidate = (site.id != 0).then_some(site.id);
            let new_id = registry.allocate(
                candidate,
                &site.fmt,
                spec,
                Some(path.display().to_string()),
            )?;
            if new_id != site.id {
                if site.id != 0 {
                    report.conflicts += 1;
                }
                rewrites.push((site.id_span.clone(), new_id.to_string()));
                report.changes.push(PlannedChange {
                    path: path.clone(),
                    old_id: site.id,
                    new_id,
                });
            }
        }

        if !rewrites.is_empty() {
            report.files_rewritten += 1;
            if dry_run {
                debug!("dry-run: would rewrite {}", path.display());
            } else {
                std::fs::write(&path, splice(&text, &rewrites))?;
            }
        }
    }
    Ok(report)
}

/// Replace each byte span with its replacement text. Spans must be
/// non-overlapping and in ascending order, which the scanner
/// guarantees.
pub(crate) fn splice(text: &str, rewrites: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for (span, replacement) in rewrites {
        out.push_str(&text[cursor..span.start]);
        out.push_str(replacement);
        cursor = span.end;
    }
    out.push_str(&text[cursor..]);
    out
}
